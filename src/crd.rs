// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for VPC subnet management.
//!
//! This module defines the Kubernetes Custom Resource Definitions used by
//! netweave to manage fabric subnets declaratively.
//!
//! # Resource Types
//!
//! - [`Subnet`] - A single subnet with a fixed identity on the fabric
//! - [`SubnetSet`] - A pool of subnets allocated lazily as workloads attach
//!
//! Both kinds implement [`SubnetSource`], the capability set the resource
//! builder dispatches on (UID, namespace, name, kind tag, normalized spec
//! fields). New kinds plug in by implementing the trait and teaching the
//! builder their kind tag.
//!
//! # Example: Declaring a Subnet
//!
//! ```rust,no_run
//! use netweave::crd::{AccessMode, SubnetSpec};
//!
//! let spec = SubnetSpec {
//!     ipv4_subnet_size: Some(64),
//!     access_mode: Some(AccessMode::Private),
//!     ip_addresses: vec![],
//!     dhcp_config: None,
//!     advanced_config: None,
//! };
//! ```

use crate::constants::DEFAULT_IPV4_SUBNET_SIZE;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Access mode of a subnet: reachable only from within the VPC, or routed
/// externally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Accessible only from within the VPC (the default)
    #[default]
    Private,
    /// Routed and reachable from outside the VPC
    Public,
}

impl AccessMode {
    /// The wire value sent to the fabric.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::Private => "private",
            AccessMode::Public => "public",
        }
    }
}

/// DHCP configuration for a subnet.
///
/// Immutable after creation: the fabric rejects changes to DHCP settings on
/// an existing subnet, so the change detector never compares these fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DhcpConfigSpec {
    /// Whether the fabric runs a DHCP server for this subnet
    #[serde(default)]
    pub enable_dhcp: bool,

    /// Policy path of a DHCP relay profile to attach instead of a local server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_relay_config_path: Option<String>,

    /// Size of the IPv4 DHCP pool carved out of the subnet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_v4_pool_size: Option<i64>,

    /// Size of the IPv6 DHCP pool carved out of the subnet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_v6_pool_size: Option<i64>,

    /// DNS servers handed out by DHCP
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_client_config: Option<DnsClientConfigSpec>,
}

/// DNS servers advertised to DHCP clients.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DnsClientConfigSpec {
    /// DNS server IPs, in preference order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_server_ips: Vec<String>,
}

/// Advanced subnet options. Unlike the addressing fields these are mutable
/// and participate in change detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedConfigSpec {
    /// Static IP allocation settings
    #[serde(default)]
    pub static_ip_allocation: StaticIpAllocationSpec,
}

/// Whether addresses in the subnet are handed out through explicit
/// allocations rather than DHCP leases.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaticIpAllocationSpec {
    /// Enable the static IP allocation pool
    #[serde(default)]
    pub enable: bool,
}

/// Specification for a single subnet.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "netweave.dev",
    version = "v1alpha1",
    kind = "Subnet",
    namespaced,
    status = "SubnetStatus",
    shortname = "snet",
    doc = "A single VPC subnet realized on the network-virtualization fabric"
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSpec {
    /// Size of the subnet in addresses, based on estimated workload count.
    /// Defaults to 64. Immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_subnet_size: Option<i64>,

    /// Access mode of the subnet. Defaults to private. Immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,

    /// Explicit CIDRs to use instead of fabric-chosen addressing. Immutable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,

    /// DHCP configuration. Immutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_config: Option<DhcpConfigSpec>,

    /// Advanced options (static IP allocation). Mutable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_config: Option<AdvancedConfigSpec>,
}

/// Observed state of a [`Subnet`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetStatus {
    /// Ready condition reflecting the last attempted reconcile
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// CIDRs realized by the fabric
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,

    /// Fabric policy path of the subnet
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,
}

/// Specification for a set of lazily allocated subnets.
///
/// A `SubnetSet` does not create any fabric subnet until capacity is
/// requested; children are then created on demand with the set's sizing and
/// access mode.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "netweave.dev",
    version = "v1alpha1",
    kind = "SubnetSet",
    namespaced,
    status = "SubnetSetStatus",
    shortname = "snetset",
    doc = "A pool of VPC subnets allocated on demand"
)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSetSpec {
    /// Size of each child subnet in addresses. Defaults to 64.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_subnet_size: Option<i64>,

    /// Access mode applied to every child subnet. Defaults to private.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,
}

/// Observed state of a [`SubnetSet`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetSetStatus {
    /// Ready condition reflecting the last attempted reconcile
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Summaries of the fabric subnets currently owned by this set
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subnets: Vec<SubnetInfo>,
}

/// Summary of one fabric subnet owned by a [`SubnetSet`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubnetInfo {
    /// Fabric subnet ID
    pub id: String,

    /// Fabric policy path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_path: Option<String>,

    /// CIDRs realized by the fabric
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,
}

/// A Kubernetes status condition.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// The aspect being reported, e.g. "Ready"
    pub r#type: String,

    /// "True", "False", or "Unknown"
    pub status: String,

    /// Programmatic identifier (CamelCase)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable explanation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// RFC3339 timestamp of the last status flip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Normalized spec fields the resource builder consumes, with defaults
/// already applied.
#[derive(Clone, Debug, PartialEq)]
pub struct SubnetAttributes {
    /// Address count for the subnet
    pub ipv4_subnet_size: i64,
    /// Access mode
    pub access_mode: AccessMode,
    /// Explicit CIDRs, empty when the fabric chooses addressing
    pub ip_addresses: Vec<String>,
    /// DHCP settings
    pub dhcp_config: Option<DhcpConfigSpec>,
    /// Advanced settings
    pub advanced_config: Option<AdvancedConfigSpec>,
}

/// Capability set shared by every CR kind that maps to fabric subnets.
///
/// The builder and service dispatch on [`SubnetSource::kind_tag`] rather
/// than inspecting concrete types, so adding a kind means implementing this
/// trait and extending the builder's tag match.
pub trait SubnetSource: Send + Sync {
    /// Lowercase kind tag recorded on fabric subnets (`subnet` / `subnetset`)
    fn kind_tag(&self) -> &'static str;

    /// UID of the owning CR; empty when the object has not been persisted
    fn cr_uid(&self) -> String;

    /// Namespace of the owning CR
    fn cr_namespace(&self) -> String;

    /// Name of the owning CR
    fn cr_name(&self) -> String;

    /// Normalized spec fields with defaults applied
    fn attributes(&self) -> SubnetAttributes;
}

impl SubnetSource for Subnet {
    fn kind_tag(&self) -> &'static str {
        "subnet"
    }

    fn cr_uid(&self) -> String {
        self.uid().unwrap_or_default()
    }

    fn cr_namespace(&self) -> String {
        self.namespace().unwrap_or_default()
    }

    fn cr_name(&self) -> String {
        self.name_any()
    }

    fn attributes(&self) -> SubnetAttributes {
        SubnetAttributes {
            ipv4_subnet_size: self.spec.ipv4_subnet_size.unwrap_or(DEFAULT_IPV4_SUBNET_SIZE),
            access_mode: self.spec.access_mode.unwrap_or_default(),
            ip_addresses: self.spec.ip_addresses.clone(),
            dhcp_config: self.spec.dhcp_config.clone(),
            advanced_config: self.spec.advanced_config.clone(),
        }
    }
}

impl SubnetSource for SubnetSet {
    fn kind_tag(&self) -> &'static str {
        "subnetset"
    }

    fn cr_uid(&self) -> String {
        self.uid().unwrap_or_default()
    }

    fn cr_namespace(&self) -> String {
        self.namespace().unwrap_or_default()
    }

    fn cr_name(&self) -> String {
        self.name_any()
    }

    fn attributes(&self) -> SubnetAttributes {
        SubnetAttributes {
            ipv4_subnet_size: self.spec.ipv4_subnet_size.unwrap_or(DEFAULT_IPV4_SUBNET_SIZE),
            access_mode: self.spec.access_mode.unwrap_or_default(),
            // A set never pins addresses; children are fabric-addressed
            ip_addresses: Vec::new(),
            dhcp_config: None,
            advanced_config: None,
        }
    }
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
