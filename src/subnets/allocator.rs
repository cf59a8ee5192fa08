// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lazy subnet allocation for `SubnetSet` resources.
//!
//! A `SubnetSet` creates nothing up front. When capacity is requested (a
//! workload attaching to the set), the allocator scans the cached children
//! for spare headroom and only synthesizes a new child when every existing
//! one is full. First match in cache iteration order wins; there is no
//! best-fit ranking.

use crate::constants::RESERVED_ADDRESS_COUNT;
use crate::crd::{SubnetSet, SubnetSource};
use crate::fabric::model::FabricSubnet;
use crate::fabric_errors::SubnetError;
use crate::subnets::{builder, SubnetService};
use tracing::{debug, info};

impl SubnetService {
    /// Return a fabric subnet owned by `set` with spare address capacity,
    /// creating one on demand when none qualifies.
    ///
    /// Headroom is the subnet's capacity (its own size, or the address
    /// count of its CIDRs once the fabric has rendered them) minus the
    /// currently allocated count; a subnet qualifies when headroom exceeds
    /// the reserved margin. A newly created child is returned only after
    /// the fabric reports it realized.
    ///
    /// # Errors
    ///
    /// Returns a [`SubnetError`] when a capacity/usage query fails or the
    /// create-on-demand pipeline fails.
    pub async fn get_available_subnet(
        &self,
        set: &SubnetSet,
    ) -> Result<FabricSubnet, SubnetError> {
        let uid = set.cr_uid();
        let configured_size = set.attributes().ipv4_subnet_size;

        for child in self.store().get_by_index(&uid) {
            let capacity = subnet_capacity(&child, configured_size)?;
            let allocated = self.pool_usage(&child).await?.allocated_ip_allocations;
            let headroom = capacity - allocated;
            if headroom > RESERVED_ADDRESS_COUNT {
                debug!(
                    subnet_id = %child.id,
                    capacity,
                    allocated,
                    "reusing owned subnet with spare capacity"
                );
                return Ok(child);
            }
        }

        info!(uid, "no owned subnet has spare capacity, creating a new one");
        let desired = builder::build_subnet(set, self.config())?;
        self.apply(desired).await
    }
}

/// Address capacity of a subnet: the sum of its CIDR sizes when addresses
/// are known, otherwise its configured size.
///
/// # Errors
///
/// Returns [`SubnetError::InvalidCidr`] when an address entry cannot be
/// parsed.
pub fn subnet_capacity(subnet: &FabricSubnet, configured_size: i64) -> Result<i64, SubnetError> {
    if subnet.ip_addresses.is_empty() {
        return Ok(subnet.ipv4_subnet_size.unwrap_or(configured_size));
    }
    let mut total = 0i64;
    for cidr in &subnet.ip_addresses {
        total += cidr_address_count(cidr)?;
    }
    Ok(total)
}

/// Number of addresses covered by an IPv4 CIDR.
///
/// # Errors
///
/// Returns [`SubnetError::InvalidCidr`] for anything that is not
/// `a.b.c.d/prefix` with a prefix of at most 32.
pub fn cidr_address_count(cidr: &str) -> Result<i64, SubnetError> {
    let invalid = || SubnetError::InvalidCidr {
        cidr: cidr.to_string(),
    };
    let (address, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
    if address.parse::<std::net::Ipv4Addr>().is_err() {
        return Err(invalid());
    }
    let prefix: u32 = prefix.parse().map_err(|_| invalid())?;
    if prefix > 32 {
        return Err(invalid());
    }
    Ok(1i64 << (32 - prefix))
}

#[cfg(test)]
#[path = "allocator_tests.rs"]
mod allocator_tests;
