// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Subnet service: the reconciliation core shared by both controllers.
//!
//! [`SubnetService`] owns the fabric client and the subnet store, and
//! implements the write pipeline every reconcile goes through:
//!
//! 1. build the desired fabric subnet ([`builder`])
//! 2. ask the change detector whether a write is needed ([`compare`])
//! 3. wrap the subnet into a hierarchical patch ([`wrap`]) and send it
//! 4. wait until the fabric reports the change realized ([`waiter`])
//! 5. re-read the subnet (the fabric renders `path` and addressing) and
//!    funnel it into the store ([`store`])
//!
//! Deletion runs the same pipeline in reverse: allocations are drained and
//! the pool polled to zero before the delete patch is issued, and the store
//! entry is removed only once the deletion marker has been sent.
//!
//! The service is constructed exactly once per process and shared by the
//! `Subnet` and `SubnetSet` controllers: a set's status is derived from the
//! subnets it owns in the same store.

pub mod allocator;
pub mod builder;
pub mod compare;
pub mod store;
pub mod waiter;
pub mod wrap;

use crate::config::OperatorConfig;
use crate::constants::ENFORCE_REVISION_CHECK;
use crate::crd::{SubnetInfo, SubnetSet, SubnetSource};
use crate::fabric::client::FabricApi;
use crate::fabric::model::FabricSubnet;
use crate::fabric_errors::SubnetError;
use self::store::SubnetStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Shared service reconciling fabric subnets for `Subnet` and `SubnetSet`
/// resources.
pub struct SubnetService {
    config: OperatorConfig,
    fabric: Arc<dyn FabricApi>,
    store: SubnetStore,
}

impl SubnetService {
    /// Build the service and prime the store from the fabric.
    ///
    /// Lists every subnet under the configured VPC and caches the ones this
    /// operator owns (those carrying the owner-UID tag). Reconciliation must
    /// not start before this completes.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`SubnetError`] when the initial list fails;
    /// the caller treats this as a fatal initialization error.
    pub async fn new(
        config: OperatorConfig,
        fabric: Arc<dyn FabricApi>,
    ) -> Result<Self, SubnetError> {
        let store = SubnetStore::new();
        let existing = fabric.list_subnets(&config.locator()).await?;
        let mut adopted = 0usize;
        for subnet in existing {
            if subnet.owner_uid().is_some() {
                store.add(subnet);
                adopted += 1;
            }
        }
        info!(adopted, "subnet store primed from fabric");
        Ok(Self {
            config,
            fabric,
            store,
        })
    }

    /// The shared subnet store.
    #[must_use]
    pub fn store(&self) -> &SubnetStore {
        &self.store
    }

    /// The operator configuration this service was built with.
    #[must_use]
    pub fn config(&self) -> &OperatorConfig {
        &self.config
    }

    /// Create or update the fabric subnet for a `Subnet` resource.
    ///
    /// Idempotent: when the cached subnet already matches the desired state
    /// no fabric call is made and the cached entry is returned.
    ///
    /// # Errors
    ///
    /// Returns a [`SubnetError`] on build, patch, or realization failure.
    pub async fn create_or_update(
        &self,
        source: &dyn SubnetSource,
    ) -> Result<FabricSubnet, SubnetError> {
        let desired = builder::build_subnet(source, &self.config)?;
        self.apply(desired).await
    }

    /// Run one desired subnet through the compare → patch → realize → cache
    /// pipeline.
    pub(crate) async fn apply(&self, desired: FabricSubnet) -> Result<FabricSubnet, SubnetError> {
        if let Some(cached) = self.store.get_by_key(&desired.id) {
            if !compare::subnet_changed(&cached, &desired) {
                debug!(subnet_id = %desired.id, "subnet not changed, skip updating");
                return Ok(cached);
            }
        }

        let org_root = wrap::wrap_hierarchy(desired.clone(), &self.config.cluster);
        self.fabric
            .patch_org_root(&org_root, ENFORCE_REVISION_CHECK)
            .await?;

        let locator = self.config.locator();
        let intent_path = locator.subnet_path(&desired.id);
        self.wait_realized(&desired.id, &intent_path).await?;

        // The fabric renders path/addressing after the patch; re-read before
        // caching so the store holds the authoritative object.
        let fresh = self.fabric.get_subnet(&locator, &desired.id).await?;
        self.store.operate(&fresh);
        info!(subnet_id = %fresh.id, "successfully updated fabric subnet");
        Ok(fresh)
    }

    /// Delete every fabric subnet owned by `uid`.
    ///
    /// A missing store entry is benign: the subnet was never created or was
    /// already cleaned up.
    ///
    /// # Errors
    ///
    /// Returns a [`SubnetError`] when the drain or the delete patch fails;
    /// subnets already deleted stay deleted and the remainder is retried on
    /// the next reconcile.
    pub async fn delete_owned(&self, uid: &str) -> Result<(), SubnetError> {
        let owned = self.store.get_by_index(uid);
        if owned.is_empty() {
            info!(uid, "no fabric subnet in store for owner, skip deleting");
            return Ok(());
        }
        for subnet in owned {
            self.delete_fabric_subnet(subnet).await?;
        }
        Ok(())
    }

    /// Drain dependents, send the delete patch, and drop the cache entry.
    async fn delete_fabric_subnet(&self, cached: FabricSubnet) -> Result<(), SubnetError> {
        self.drain_ip_allocations(&cached).await?;

        // Freeze the leaf to its last-known state; only deletion intent
        // changes. The fabric ignores immutable fields on delete.
        let mut leaf = cached;
        leaf.marked_for_delete = Some(true);

        let org_root = wrap::wrap_hierarchy(leaf.clone(), &self.config.cluster);
        self.fabric
            .patch_org_root(&org_root, ENFORCE_REVISION_CHECK)
            .await?;
        self.store.operate(&leaf);
        info!(subnet_id = %leaf.id, "successfully deleted fabric subnet");
        Ok(())
    }

    /// Realized addressing and path for the (single) subnet owned by `uid`,
    /// read back from the store.
    ///
    /// # Errors
    ///
    /// Returns [`SubnetError::StoreInconsistency`] when the store holds no
    /// entry for the owner: the cache and the fabric have diverged and the
    /// condition must not be papered over.
    pub fn realized_state(&self, uid: &str) -> Result<(Vec<String>, String), SubnetError> {
        let owned = self.store.get_by_index(uid);
        let subnet = owned
            .first()
            .ok_or_else(|| SubnetError::StoreInconsistency {
                uid: uid.to_string(),
            })?;
        Ok((
            subnet.ip_addresses.clone(),
            subnet.rendered_path()?.to_string(),
        ))
    }

    /// Status summaries for every subnet owned by a `SubnetSet`.
    #[must_use]
    pub fn owned_subnet_infos(&self, uid: &str) -> Vec<SubnetInfo> {
        self.store
            .get_by_index(uid)
            .into_iter()
            .map(|subnet| SubnetInfo {
                id: subnet.id.clone(),
                resource_path: subnet.path.clone(),
                ip_addresses: subnet.ip_addresses.clone(),
            })
            .collect()
    }

    /// Refresh the mutable fields (display name, tags) of every existing
    /// child of a `SubnetSet`, repairing drift through the normal pipeline.
    ///
    /// Children are only created lazily; this never adds one.
    ///
    /// # Errors
    ///
    /// Returns the first [`SubnetError`] hit while re-applying a child.
    pub async fn sync_children(&self, set: &SubnetSet) -> Result<Vec<FabricSubnet>, SubnetError> {
        let uid = set.cr_uid();
        let mut synced = Vec::new();
        for child in self.store.get_by_index(&uid) {
            let desired = builder::rebuild_child(set, &child, &self.config);
            synced.push(self.apply(desired).await?);
        }
        Ok(synced)
    }
}
