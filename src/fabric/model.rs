// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Wire model for the fabric API.
//!
//! These types mirror the fabric's JSON representation (snake_case fields).
//! [`FabricSubnet`] is both the patch payload and the cached entry in the
//! subnet store; the `Child*`/[`OrgRoot`] types form the hierarchical patch
//! envelope that makes a create/update/delete a single atomic call.

use crate::constants::TAG_SCOPE_SUBNET_CR_UID;
use crate::fabric_errors::SubnetError;
use serde::{Deserialize, Serialize};

/// A scope/value pair attached to a fabric resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// Tag namespace, e.g. `nw-op/subnet_cr_uid`
    pub scope: String,
    /// Tag value
    pub tag: String,
}

impl Tag {
    /// Convenience constructor.
    #[must_use]
    pub fn new(scope: &str, tag: &str) -> Self {
        Self {
            scope: scope.to_string(),
            tag: tag.to_string(),
        }
    }
}

/// DHCP configuration as the fabric stores it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DhcpConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_dhcp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_relay_config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_v4_pool_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_v6_pool_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_client_config: Option<DnsClientConfig>,
}

/// DNS servers handed to DHCP clients.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DnsClientConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dns_server_ips: Vec<String>,
}

/// Advanced subnet options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubnetAdvancedConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_ip_allocation: Option<StaticIpAllocation>,
}

/// Static IP allocation toggle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticIpAllocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
}

/// The fabric's native subnet object.
///
/// `path` is rendered by the fabric after a successful write and is never
/// set by the builder; `marked_for_delete` carries deletion intent through
/// the hierarchical patch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FabricSubnet {
    /// Opaque fabric ID, derived from the owning CR's UID
    pub id: String,

    /// Fabric resource type (`VpcSubnet`); required by the patch envelope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,

    /// Human-readable name (`{namespace}-{name}` of the owning CR)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// `private` or `public`; immutable on the fabric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<String>,

    /// Requested address count; immutable on the fabric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_subnet_size: Option<i64>,

    /// CIDRs: requested explicitly, or rendered by the fabric; immutable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ip_addresses: Vec<String>,

    /// DHCP settings; immutable on the fabric
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dhcp_config: Option<DhcpConfig>,

    /// Advanced settings; mutable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_config: Option<SubnetAdvancedConfig>,

    /// Display tags; exactly one carries the owner UID
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    /// Fabric-rendered policy path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Deletion intent marker for hierarchical patches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_for_delete: Option<bool>,
}

impl FabricSubnet {
    /// UID of the owning CR, read from the join-key tag.
    #[must_use]
    pub fn owner_uid(&self) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.scope == TAG_SCOPE_SUBNET_CR_UID)
            .map(|t| t.tag.as_str())
    }

    /// Whether this subnet carries deletion intent.
    #[must_use]
    pub fn is_marked_for_delete(&self) -> bool {
        self.marked_for_delete.unwrap_or(false)
    }

    /// The rendered policy path, or an error when the fabric has not
    /// supplied one yet.
    pub fn rendered_path(&self) -> Result<&str, SubnetError> {
        self.path
            .as_deref()
            .ok_or(SubnetError::MissingRenderedField {
                subnet_id: self.id.clone(),
                field: "path",
            })
    }
}

/// Leaf node of the hierarchical patch: one subnet plus deletion intent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildSubnet {
    pub id: String,
    pub resource_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marked_for_delete: Option<bool>,
    pub subnet: FabricSubnet,
}

/// Middle node: a reference to the structural parent (the Domain keyed by
/// cluster identity) carrying the subnet children.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChildResourceReference {
    pub id: String,
    pub resource_type: String,
    pub target_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildSubnet>,
}

/// Root of the hierarchical patch. The outermost layer carries no ID.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrgRoot {
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildResourceReference>,
}

/// One entry from the realization-state API.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealizedEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// Usage counters of a subnet's static IP pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolUsage {
    /// Leases currently held
    #[serde(default)]
    pub allocated_ip_allocations: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ip_allocations: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_ip_allocations: Option<i64>,
}

/// A single static IP pool under a subnet.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IpPool {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool_usage: Option<PoolUsage>,
}

/// One address lease drawn from a subnet's pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IpAllocation {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_ip: Option<String>,
}

/// Paged list envelope used by every fabric list endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResult<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Org/project/VPC coordinates addressing the fabric's VPC-scoped sub-APIs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VpcLocator {
    pub org: String,
    pub project: String,
    pub vpc: String,
}

impl VpcLocator {
    /// Parse a locator out of a fabric policy path of the form
    /// `/orgs/{org}/projects/{project}/vpcs/{vpc}/...`.
    ///
    /// # Errors
    ///
    /// Returns [`SubnetError::MalformedPath`] when the path does not have
    /// the expected shape.
    pub fn from_path(path: &str) -> Result<Self, SubnetError> {
        let parts: Vec<&str> = path.split('/').collect();
        let malformed = || SubnetError::MalformedPath {
            path: path.to_string(),
        };
        if parts.len() < 7
            || parts.first() != Some(&"")
            || parts[1] != "orgs"
            || parts[3] != "projects"
            || parts[5] != "vpcs"
        {
            return Err(malformed());
        }
        if parts[2].is_empty() || parts[4].is_empty() || parts[6].is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            org: parts[2].to_string(),
            project: parts[4].to_string(),
            vpc: parts[6].to_string(),
        })
    }

    /// Policy path of a subnet under this VPC.
    #[must_use]
    pub fn subnet_path(&self, subnet_id: &str) -> String {
        format!(
            "/orgs/{}/projects/{}/vpcs/{}/subnets/{}",
            self.org, self.project, self.vpc, subnet_id
        )
    }
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod model_tests;
