// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory store of fabric subnets.
//!
//! The store is the operator's authoritative cache of fabric state. Every
//! entry is held under two access paths: the primary key (fabric subnet ID)
//! and a secondary index keyed by the owning CR's UID, read from the
//! join-key tag. All map and index mutations happen under a single
//! exclusive lock, so concurrent reconciles of different objects can share
//! one store safely.
//!
//! State enters the store only through [`SubnetStore::operate`] (and the
//! startup priming list): the store reflects subnets this operator created
//! or observed, not arbitrary fabric state.

use crate::fabric::model::FabricSubnet;
use std::collections::{BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Default)]
struct Inner {
    by_id: HashMap<String, FabricSubnet>,
    by_owner: HashMap<String, BTreeSet<String>>,
}

/// Thread-safe map of fabric subnets with an owner-UID secondary index.
#[derive(Default)]
pub struct SubnetStore {
    inner: RwLock<Inner>,
}

impl SubnetStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a subnet, keeping the owner index consistent.
    pub fn add(&self, subnet: FabricSubnet) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        // An overwrite may change the owner tag; unlink the stale index
        // entry first.
        let old_uid = inner
            .by_id
            .get(&subnet.id)
            .and_then(|previous| previous.owner_uid().map(str::to_string));
        if let Some(old_uid) = old_uid {
            if let Some(ids) = inner.by_owner.get_mut(&old_uid) {
                ids.remove(&subnet.id);
                if ids.is_empty() {
                    inner.by_owner.remove(&old_uid);
                }
            }
        }

        if let Some(uid) = subnet.owner_uid().map(str::to_string) {
            inner
                .by_owner
                .entry(uid)
                .or_default()
                .insert(subnet.id.clone());
        }
        inner.by_id.insert(subnet.id.clone(), subnet);
    }

    /// Remove a subnet by ID, unlinking it from the owner index.
    pub fn delete(&self, id: &str) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(removed) = inner.by_id.remove(id) {
            if let Some(uid) = removed.owner_uid().map(str::to_string) {
                if let Some(ids) = inner.by_owner.get_mut(&uid) {
                    ids.remove(id);
                    if ids.is_empty() {
                        inner.by_owner.remove(&uid);
                    }
                }
            }
        }
    }

    /// Look up a subnet by fabric ID.
    #[must_use]
    pub fn get_by_key(&self, id: &str) -> Option<FabricSubnet> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_id.get(id).cloned()
    }

    /// All subnets owned by a CR UID, in stable (ID) order.
    #[must_use]
    pub fn get_by_index(&self, uid: &str) -> Vec<FabricSubnet> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .by_owner
            .get(uid)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Funnel for fabric-confirmed state: delete when the subnet carries a
    /// deletion marker, upsert otherwise.
    pub fn operate(&self, subnet: &FabricSubnet) {
        if subnet.is_marked_for_delete() {
            self.delete(&subnet.id);
            debug!(subnet_id = %subnet.id, "subnet deleted from store");
        } else {
            self.add(subnet.clone());
            debug!(subnet_id = %subnet.id, "subnet added to store");
        }
    }

    /// Number of cached subnets.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.by_id.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
