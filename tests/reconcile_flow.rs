// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Service-level reconciliation scenarios against an in-memory fabric.
//!
//! These tests drive the shared `SubnetService` through the same pipeline
//! the reconcilers use: build, change detection, hierarchical patch,
//! realization wait, store update, and the delete path with its
//! allocation drain.

mod common;

use common::{rendered_path, test_config, test_subnet, test_subnetset, MockFabric};
use netweave::constants::{TAG_SCOPE_SUBNET_CR_NAME, TAG_SCOPE_SUBNET_CR_UID};
use netweave::fabric::model::{FabricSubnet, Tag};
use netweave::fabric_errors::SubnetError;
use netweave::subnets::SubnetService;
use std::sync::Arc;

async fn service_with(fabric: Arc<MockFabric>) -> SubnetService {
    SubnetService::new(test_config(), fabric)
        .await
        .expect("service initialization should succeed")
}

/// A fabric subnet owned by `uid`, as the store would cache it.
fn owned_subnet(id: &str, uid: &str) -> FabricSubnet {
    FabricSubnet {
        id: id.to_string(),
        display_name: Some(format!("prod-{uid}")),
        access_mode: Some("private".to_string()),
        ipv4_subnet_size: Some(64),
        tags: vec![Tag::new(TAG_SCOPE_SUBNET_CR_UID, uid)],
        path: Some(rendered_path(id)),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_scenario() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric.clone()).await;
    let subnet = test_subnet("web-tier", "u1");

    let created = service
        .create_or_update(&subnet)
        .await
        .expect("create should succeed");

    // One write, realized, cached under the owner index
    assert_eq!(fabric.patch_count(), 1);
    assert_eq!(created.id, "subnet_u1");
    assert_eq!(created.owner_uid(), Some("u1"));
    assert!(created.path.is_some(), "fabric rendered the path");
    assert!(!created.ip_addresses.is_empty(), "fabric rendered addressing");

    let indexed = service.store().get_by_index("u1");
    assert_eq!(indexed.len(), 1, "exactly one entry under the owner index");
    assert_eq!(indexed[0].id, "subnet_u1");

    let (ips, path) = service.realized_state("u1").expect("realized state");
    assert_eq!(ips, created.ip_addresses);
    assert_eq!(path, rendered_path("subnet_u1"));
}

#[tokio::test]
async fn test_unchanged_subnet_issues_zero_writes() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric.clone()).await;
    let subnet = test_subnet("web-tier", "u1");

    service.create_or_update(&subnet).await.unwrap();
    let after_first = fabric.patch_count();

    // Same spec, same cache entry: the comparator must short-circuit
    service.create_or_update(&subnet).await.unwrap();

    assert_eq!(
        fabric.patch_count(),
        after_first,
        "re-reconciling an unchanged spec must not touch the fabric"
    );
}

#[tokio::test]
async fn test_mutable_field_change_issues_write() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric.clone()).await;

    service
        .create_or_update(&test_subnet("web-tier", "u1"))
        .await
        .unwrap();

    // Renaming the CR changes a display tag (mutable), so a write follows
    let renamed = test_subnet("web-tier-v2", "u1");
    service.create_or_update(&renamed).await.unwrap();

    assert_eq!(fabric.patch_count(), 2);
    let cached = service.store().get_by_key("subnet_u1").unwrap();
    let name_tag = cached
        .tags
        .iter()
        .find(|t| t.scope == TAG_SCOPE_SUBNET_CR_NAME)
        .unwrap();
    assert_eq!(name_tag.tag, "web-tier-v2");
}

#[tokio::test(start_paused = true)]
async fn test_deletion_drains_allocations_before_delete_patch() {
    let fabric = Arc::new(MockFabric::with_subnets(vec![owned_subnet(
        "subnet_u1",
        "u1",
    )]));
    // Two leases held; pool reports usage 2 -> 1 -> 0 across polls
    fabric.set_allocations("subnet_u1", &["alloc-1", "alloc-2"]);
    fabric.set_pool_usage("subnet_u1", vec![2, 1, 0]);
    let service = service_with(fabric.clone()).await;

    service.delete_owned("u1").await.expect("delete succeeds");

    // Allocations were released
    assert!(fabric.allocations("subnet_u1").is_empty());
    // The only patch is the delete, and it carries the deletion marker
    let patches = fabric.patches();
    assert_eq!(patches.len(), 1, "delete patch issued after the drain");
    let leaf = &patches[0].children[0].children[0];
    assert_eq!(leaf.marked_for_delete, Some(true));
    // Fabric and store both dropped the subnet
    assert!(fabric.subnet("subnet_u1").is_none());
    assert!(service.store().get_by_index("u1").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_drain_deadline_fails_when_pool_never_empties() {
    let fabric = Arc::new(MockFabric::with_subnets(vec![owned_subnet(
        "subnet_u1",
        "u1",
    )]));
    // Usage never reaches zero
    fabric.set_pool_usage("subnet_u1", vec![1]);
    let service = service_with(fabric.clone()).await;

    let result = service.delete_owned("u1").await;

    assert!(matches!(
        result,
        Err(SubnetError::PoolDrainTimeout { .. })
    ));
    assert_eq!(fabric.patch_count(), 0, "no delete patch while the pool is in use");
    assert_eq!(
        service.store().get_by_index("u1").len(),
        1,
        "store entry kept until the delete actually happens"
    );
}

#[tokio::test]
async fn test_delete_without_store_entry_is_benign() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric.clone()).await;

    service
        .delete_owned("ghost")
        .await
        .expect("deleting an unknown owner is a no-op");

    assert_eq!(fabric.patch_count(), 0);
}

#[tokio::test]
async fn test_restriction_error_is_terminal() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric.clone()).await;
    fabric.set_restriction("public access mode not allowed in this project");

    let error = service
        .create_or_update(&test_subnet("web-tier", "u1"))
        .await
        .expect_err("restricted patch must fail");

    assert!(error.is_restriction());
    assert!(!error.is_transient());
    assert!(
        error.to_string().contains("public access mode not allowed"),
        "verbatim fabric text surfaces to the operator"
    );
    assert!(service.store().get_by_index("u1").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_realize_timeout_is_retryable() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric.clone()).await;
    fabric.set_realizes(false);

    let error = service
        .create_or_update(&test_subnet("web-tier", "u1"))
        .await
        .expect_err("unrealized subnet must time out");

    assert!(matches!(error, SubnetError::RealizeTimeout { .. }));
    assert!(error.is_transient());
    assert!(
        service.store().get_by_key("subnet_u1").is_none(),
        "unrealized subnets never enter the store"
    );
}

#[tokio::test]
async fn test_store_priming_adopts_only_owned_subnets() {
    let foreign = FabricSubnet {
        id: "foreign-subnet".to_string(),
        ..Default::default()
    };
    let fabric = Arc::new(MockFabric::with_subnets(vec![
        owned_subnet("subnet_u1", "u1"),
        foreign,
    ]));

    let service = service_with(fabric).await;

    assert_eq!(service.store().len(), 1, "unowned fabric state is not cached");
    assert!(service.store().get_by_key("subnet_u1").is_some());
}

#[tokio::test]
async fn test_realized_state_surfaces_cache_divergence() {
    let fabric = Arc::new(MockFabric::new());
    let service = service_with(fabric).await;

    assert!(matches!(
        service.realized_state("u-missing"),
        Err(SubnetError::StoreInconsistency { .. })
    ));
}

#[tokio::test]
async fn test_lazy_allocation_returns_first_subnet_with_headroom() {
    let fabric = Arc::new(MockFabric::with_subnets(vec![
        owned_subnet("subnet_set1_aa", "set1"),
        owned_subnet("subnet_set1_bb", "set1"),
    ]));
    // First child full (64 of 64), second untouched
    fabric.set_pool_usage("subnet_set1_aa", vec![64]);
    fabric.set_pool_usage("subnet_set1_bb", vec![0]);
    let service = service_with(fabric.clone()).await;
    let set = test_subnetset("pods", "set1");

    let chosen = service
        .get_available_subnet(&set)
        .await
        .expect("allocation succeeds");

    assert_eq!(chosen.id, "subnet_set1_bb");
    assert_eq!(fabric.patch_count(), 0, "no create while capacity remains");
}

#[tokio::test]
async fn test_lazy_allocation_creates_child_when_all_full() {
    let fabric = Arc::new(MockFabric::with_subnets(vec![
        owned_subnet("subnet_set1_aa", "set1"),
        owned_subnet("subnet_set1_bb", "set1"),
    ]));
    fabric.set_pool_usage("subnet_set1_aa", vec![64]);
    // 62 of 64 leaves headroom of 2, below the reserved margin of 4
    fabric.set_pool_usage("subnet_set1_bb", vec![62]);
    let service = service_with(fabric.clone()).await;
    let set = test_subnetset("pods", "set1");

    let created = service
        .get_available_subnet(&set)
        .await
        .expect("on-demand create succeeds");

    assert_eq!(fabric.patch_count(), 1, "a new child was created");
    assert!(created.id.starts_with("subnet_set1_"));
    assert_ne!(created.id, "subnet_set1_aa");
    assert_ne!(created.id, "subnet_set1_bb");
    assert!(created.path.is_some(), "returned only after realization");
    assert_eq!(
        service.store().get_by_index("set1").len(),
        3,
        "the new child joined the owner index"
    );
}

#[tokio::test]
async fn test_sync_children_repairs_tag_drift() {
    let mut drifted = owned_subnet("subnet_set1_aa", "set1");
    drifted.tags = vec![Tag::new(TAG_SCOPE_SUBNET_CR_UID, "set1")];
    let fabric = Arc::new(MockFabric::with_subnets(vec![drifted]));
    let service = service_with(fabric.clone()).await;
    let set = test_subnetset("pods", "set1");

    let synced = service.sync_children(&set).await.expect("sync succeeds");

    assert_eq!(synced.len(), 1);
    assert_eq!(fabric.patch_count(), 1, "drifted child was repaired");
    let name_tag = synced[0]
        .tags
        .iter()
        .find(|t| t.scope == TAG_SCOPE_SUBNET_CR_NAME)
        .expect("display tags restored");
    assert_eq!(name_tag.tag, "pods");

    // A second sync finds nothing to repair
    service.sync_children(&set).await.unwrap();
    assert_eq!(fabric.patch_count(), 1, "second sync is a no-op");
}

#[tokio::test(start_paused = true)]
async fn test_subnetset_delete_drains_every_child() {
    let fabric = Arc::new(MockFabric::with_subnets(vec![
        owned_subnet("subnet_set1_aa", "set1"),
        owned_subnet("subnet_set1_bb", "set1"),
    ]));
    fabric.set_allocations("subnet_set1_aa", &["alloc-1"]);
    fabric.set_pool_usage("subnet_set1_aa", vec![1, 0]);
    let service = service_with(fabric.clone()).await;

    service.delete_owned("set1").await.expect("delete succeeds");

    assert_eq!(fabric.patch_count(), 2, "one delete patch per child");
    assert!(service.store().get_by_index("set1").is_empty());
    assert!(fabric.subnet("subnet_set1_aa").is_none());
    assert!(fabric.subnet("subnet_set1_bb").is_none());
}
