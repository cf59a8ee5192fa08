// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Mapping from declared specs to the fabric's subnet representation.
//!
//! The builder dispatches on the source's kind tag:
//!
//! - `subnet` — the fabric ID is derived deterministically from the CR UID,
//!   so a Subnet maps to exactly one fabric subnet across reconciles
//! - `subnetset` — children share one owner, so each new child gets a
//!   random ID suffix; existing children are rebuilt around their cached ID
//!
//! Any other tag is an [`SubnetError::UnsupportedKind`] programming error,
//! never a panic.

use crate::config::OperatorConfig;
use crate::constants::{
    TAG_SCOPE_CLUSTER, TAG_SCOPE_NAMESPACE, TAG_SCOPE_SUBNET_CR_NAME, TAG_SCOPE_SUBNET_CR_TYPE,
    TAG_SCOPE_SUBNET_CR_UID,
};
use crate::crd::{AdvancedConfigSpec, DhcpConfigSpec, SubnetSet, SubnetSource};
use crate::fabric::model::{
    DhcpConfig, DnsClientConfig, FabricSubnet, StaticIpAllocation, SubnetAdvancedConfig, Tag,
};
use crate::fabric_errors::SubnetError;
use rand::RngCore;

/// Build the desired fabric subnet for a spec object.
///
/// # Errors
///
/// Returns [`SubnetError::UnsupportedKind`] for a kind tag the builder does
/// not recognize.
pub fn build_subnet(
    source: &dyn SubnetSource,
    config: &OperatorConfig,
) -> Result<FabricSubnet, SubnetError> {
    let uid = source.cr_uid();
    let id = match source.kind_tag() {
        "subnet" => format!("subnet_{uid}"),
        "subnetset" => new_child_id(&uid),
        other => {
            return Err(SubnetError::UnsupportedKind {
                kind: other.to_string(),
            })
        }
    };
    Ok(build_with_id(source, id, config))
}

/// Rebuild an existing `SubnetSet` child around its cached identity:
/// mutable fields (display name, tags) come from the current set, every
/// immutable field stays frozen to the cached value.
#[must_use]
pub fn rebuild_child(
    set: &SubnetSet,
    cached: &FabricSubnet,
    config: &OperatorConfig,
) -> FabricSubnet {
    let mut desired = cached.clone();
    desired.display_name = Some(display_name(set));
    desired.tags = build_basic_tags(set, config);
    desired.marked_for_delete = None;
    desired
}

fn build_with_id(source: &dyn SubnetSource, id: String, config: &OperatorConfig) -> FabricSubnet {
    let attrs = source.attributes();
    FabricSubnet {
        id,
        resource_type: None,
        display_name: Some(display_name(source)),
        access_mode: Some(attrs.access_mode.as_str().to_string()),
        ipv4_subnet_size: Some(attrs.ipv4_subnet_size),
        ip_addresses: attrs.ip_addresses,
        dhcp_config: attrs.dhcp_config.map(build_dhcp_config),
        advanced_config: attrs.advanced_config.map(build_advanced_config),
        tags: build_basic_tags(source, config),
        path: None,
        marked_for_delete: None,
    }
}

fn display_name(source: &dyn SubnetSource) -> String {
    format!("{}-{}", source.cr_namespace(), source.cr_name())
}

fn build_dhcp_config(spec: DhcpConfigSpec) -> DhcpConfig {
    DhcpConfig {
        enable_dhcp: Some(spec.enable_dhcp),
        dhcp_relay_config_path: spec.dhcp_relay_config_path,
        dhcp_v4_pool_size: spec.dhcp_v4_pool_size,
        dhcp_v6_pool_size: spec.dhcp_v6_pool_size,
        dns_client_config: spec.dns_client_config.map(|dns| DnsClientConfig {
            dns_server_ips: dns.dns_server_ips,
        }),
    }
}

fn build_advanced_config(spec: AdvancedConfigSpec) -> SubnetAdvancedConfig {
    SubnetAdvancedConfig {
        static_ip_allocation: Some(StaticIpAllocation {
            enable: Some(spec.static_ip_allocation.enable),
        }),
    }
}

/// The display tags stamped on every fabric subnet this operator creates.
/// Exactly one tag carries the owner UID: it is the join key the store
/// index and garbage collection rely on.
#[must_use]
pub fn build_basic_tags(source: &dyn SubnetSource, config: &OperatorConfig) -> Vec<Tag> {
    vec![
        Tag::new(TAG_SCOPE_CLUSTER, &config.cluster),
        Tag::new(TAG_SCOPE_NAMESPACE, &source.cr_namespace()),
        Tag::new(TAG_SCOPE_SUBNET_CR_NAME, &source.cr_name()),
        Tag::new(TAG_SCOPE_SUBNET_CR_UID, &source.cr_uid()),
        Tag::new(TAG_SCOPE_SUBNET_CR_TYPE, source.kind_tag()),
    ]
}

/// Fabric ID for a new `SubnetSet` child: owner UID plus a random suffix,
/// since many children share one owner.
fn new_child_id(uid: &str) -> String {
    format!("subnet_{uid}_{:08x}", rand::rng().next_u32())
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod builder_tests;
