// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Hierarchical change-set builder.
//!
//! The fabric's org-root patch API accepts an entire intent hierarchy in
//! one call. The operator always writes subnets through it: the leaf subnet
//! is wrapped in a reference to its structural parent (the Domain keyed by
//! cluster identity), which is wrapped in the org root. One call then
//! atomically creates, updates, or deletes the subnet and its parent chain,
//! so other readers never observe partial intermediate state — the fabric
//! has no multi-object transaction API to fall back on.
//!
//! Deletion reuses the same shape with the leaf's deletion marker set.

use crate::constants::RESOURCE_TYPE_SUBNET;
use crate::fabric::model::{ChildResourceReference, ChildSubnet, FabricSubnet, OrgRoot};

/// Resource type of the leaf wrapper node.
pub const CHILD_SUBNET_TYPE: &str = "ChildVpcSubnet";

/// Resource type of the parent-reference wrapper node.
pub const CHILD_RESOURCE_REFERENCE_TYPE: &str = "ChildResourceReference";

/// Target type of the structural parent; the Domain ID is the cluster.
pub const DOMAIN_TARGET_TYPE: &str = "Domain";

/// Resource type of the hierarchy root. The outermost layer carries no ID.
pub const ORG_ROOT_TYPE: &str = "OrgRoot";

/// Wrap a subnet into the full org-root patch hierarchy.
#[must_use]
pub fn wrap_hierarchy(subnet: FabricSubnet, cluster: &str) -> OrgRoot {
    let domain = wrap_resource_reference(wrap_subnet(subnet), cluster);
    OrgRoot {
        resource_type: ORG_ROOT_TYPE.to_string(),
        children: vec![domain],
    }
}

/// Wrap the leaf subnet, lifting its ID and deletion marker into the
/// wrapper node. The patch endpoint needs the explicit resource type to
/// identify the payload.
fn wrap_subnet(mut subnet: FabricSubnet) -> ChildSubnet {
    subnet.resource_type = Some(RESOURCE_TYPE_SUBNET.to_string());
    ChildSubnet {
        id: subnet.id.clone(),
        resource_type: CHILD_SUBNET_TYPE.to_string(),
        marked_for_delete: subnet.marked_for_delete,
        subnet,
    }
}

/// Wrap subnet children in a reference to their Domain, keyed by cluster
/// identity.
fn wrap_resource_reference(child: ChildSubnet, cluster: &str) -> ChildResourceReference {
    ChildResourceReference {
        id: cluster.to_string(),
        resource_type: CHILD_RESOURCE_REFERENCE_TYPE.to_string(),
        target_type: DOMAIN_TARGET_TYPE.to_string(),
        children: vec![child],
    }
}

#[cfg(test)]
#[path = "wrap_tests.rs"]
mod wrap_tests;
