// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `SubnetSet` reconciliation logic.
//!
//! A `SubnetSet` owns zero or more fabric subnets that are created lazily
//! through the allocator, never eagerly here. Reconciling a set repairs
//! mutable-field drift on its existing children and refreshes the status
//! summaries; deletion removes every owned fabric subnet (draining each
//! one's allocations first) before the finalizer is released.

use crate::constants::SUBNET_FINALIZER;
use crate::context::Context;
use crate::crd::{SubnetSet, SubnetSource};
use crate::reconcilers::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use crate::reconcilers::status::{SubnetSetStatusUpdater, REASON_ALL_SUBNETS_READY};
use anyhow::Result;
use kube::Resource;
use std::sync::Arc;
use tracing::{info, warn};

/// Reconcile a `SubnetSet` resource against the fabric.
///
/// # Errors
///
/// Returns an error for retryable failures; restriction errors mark the
/// status Failed and return `Ok` so no retry is scheduled.
pub async fn reconcile_subnetset(ctx: Arc<Context>, set: SubnetSet) -> Result<()> {
    let namespace = set.cr_namespace();
    let name = set.cr_name();
    info!("Reconciling SubnetSet: {}/{}", namespace, name);

    if set.meta().deletion_timestamp.is_some() {
        return delete_subnetset(ctx, set).await;
    }

    ensure_finalizer(&ctx.client, &set, SUBNET_FINALIZER).await?;

    let mut status = SubnetSetStatusUpdater::new(&set);
    match ctx.service.sync_children(&set).await {
        Ok(children) => {
            status.set_subnets(ctx.service.owned_subnet_infos(&set.cr_uid()));
            status.set_condition(
                "True",
                REASON_ALL_SUBNETS_READY,
                &format!("All {} owned subnets are ready", children.len()),
            );
            status.apply(&ctx.client).await?;
            Ok(())
        }
        Err(error) if error.is_restriction() => {
            warn!(
                subnetset = %format!("{namespace}/{name}"),
                %error,
                "fabric restricted a subnet of the set, not retrying"
            );
            status.set_condition("False", error.status_reason(), &error.to_string());
            status.apply(&ctx.client).await?;
            Ok(())
        }
        Err(error) => {
            warn!(
                subnetset = %format!("{namespace}/{name}"),
                %error,
                "operate failed, would retry exponentially"
            );
            status.set_condition("False", error.status_reason(), &error.to_string());
            status.apply(&ctx.client).await?;
            Err(error.into())
        }
    }
}

/// Delete every fabric subnet owned by a deleted `SubnetSet`, then release
/// its finalizer.
///
/// # Errors
///
/// Returns an error when cleanup fails; the finalizer stays in place and
/// deletion is retried on redelivery.
pub async fn delete_subnetset(ctx: Arc<Context>, set: SubnetSet) -> Result<()> {
    let namespace = set.cr_namespace();
    let name = set.cr_name();

    if !has_finalizer(&set, SUBNET_FINALIZER) {
        info!(
            "SubnetSet {}/{} has no finalizer, nothing to clean up",
            namespace, name
        );
        return Ok(());
    }

    match ctx.service.delete_owned(&set.cr_uid()).await {
        Ok(()) => {
            remove_finalizer(&ctx.client, &set, SUBNET_FINALIZER).await?;
            info!("Deleted SubnetSet {}/{}", namespace, name);
            Ok(())
        }
        Err(error) => {
            warn!(
                subnetset = %format!("{namespace}/{name}"),
                %error,
                "deletion failed, would retry exponentially"
            );
            let mut status = SubnetSetStatusUpdater::new(&set);
            status.set_condition("False", error.status_reason(), &error.to_string());
            status.apply(&ctx.client).await?;
            Err(error.into())
        }
    }
}
