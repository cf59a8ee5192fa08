// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Change detection for fabric subnets.
//!
//! Decides whether a freshly built desired subnet differs from the cached
//! one enough to warrant a fabric write. Only mutable, fabric-independent
//! fields participate: ID, display name, tags, and advanced config.
//! Addressing (size, access mode, CIDRs) and DHCP config are immutable on
//! the fabric — comparing them would either produce spurious no-op writes
//! (fabric-rendered values never match the spec) or mask real changes.
//!
//! Equality is computed as a SHA-256 content hash over a canonical JSON
//! projection, with tags sorted so fabric-side reordering never reads as a
//! change.

use crate::fabric::model::{FabricSubnet, SubnetAdvancedConfig, Tag};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// The comparable subset of a fabric subnet.
#[derive(Serialize)]
struct ComparableSubnet<'a> {
    id: &'a str,
    display_name: Option<&'a str>,
    tags: Vec<&'a Tag>,
    advanced_config: Option<&'a SubnetAdvancedConfig>,
}

/// Content hash of the mutable projection of a subnet.
#[must_use]
pub fn fingerprint(subnet: &FabricSubnet) -> [u8; 32] {
    let mut tags: Vec<&Tag> = subnet.tags.iter().collect();
    tags.sort();

    let projection = ComparableSubnet {
        id: &subnet.id,
        display_name: subnet.display_name.as_deref(),
        tags,
        advanced_config: subnet.advanced_config.as_ref(),
    };

    // Plain data; serialization cannot fail
    let canonical =
        serde_json::to_vec(&projection).expect("comparable projection serializes to JSON");
    Sha256::digest(&canonical).into()
}

/// Whether the desired subnet differs from the cached one in any mutable,
/// fabric-independent field.
#[must_use]
pub fn subnet_changed(cached: &FabricSubnet, desired: &FabricSubnet) -> bool {
    fingerprint(cached) != fingerprint(desired)
}

#[cfg(test)]
#[path = "compare_tests.rs"]
mod compare_tests;
