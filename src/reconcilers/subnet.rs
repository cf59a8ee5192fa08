// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `Subnet` reconciliation logic.
//!
//! Drives one `Subnet` resource through the lifecycle: finalizer first,
//! then build → compare → patch → realize → cache, then status. Deletion
//! drains dependent IP allocations before the fabric delete and removes the
//! finalizer only after cleanup succeeded.

use crate::constants::SUBNET_FINALIZER;
use crate::context::Context;
use crate::crd::{Subnet, SubnetSource};
use crate::reconcilers::finalizers::{ensure_finalizer, has_finalizer, remove_finalizer};
use crate::reconcilers::status::{SubnetStatusUpdater, REASON_FABRIC_ACCEPTED};
use anyhow::Result;
use kube::Resource;
use std::sync::Arc;
use tracing::{info, warn};

/// Reconcile a `Subnet` resource against the fabric.
///
/// Re-running on an already-synced object with no relevant field changes
/// performs zero fabric writes.
///
/// # Errors
///
/// Returns an error for retryable failures (the controller redelivers with
/// backoff). Fabric restriction errors are terminal: the status is set to
/// Failed and `Ok` is returned so no retry is scheduled.
pub async fn reconcile_subnet(ctx: Arc<Context>, subnet: Subnet) -> Result<()> {
    let namespace = subnet.cr_namespace();
    let name = subnet.cr_name();
    info!("Reconciling Subnet: {}/{}", namespace, name);

    if subnet.meta().deletion_timestamp.is_some() {
        return delete_subnet(ctx, subnet).await;
    }

    // Persist the finalizer before any fabric work so the delete branch is
    // guaranteed to run.
    ensure_finalizer(&ctx.client, &subnet, SUBNET_FINALIZER).await?;

    let outcome = match ctx.service.create_or_update(&subnet).await {
        Ok(_) => ctx.service.realized_state(&subnet.cr_uid()),
        Err(error) => Err(error),
    };

    let mut status = SubnetStatusUpdater::new(&subnet);
    match outcome {
        Ok((ip_addresses, resource_path)) => {
            status.set_realized(ip_addresses, resource_path);
            status.set_condition(
                "True",
                REASON_FABRIC_ACCEPTED,
                "Fabric accepted the subnet change",
            );
            status.apply(&ctx.client).await?;
            Ok(())
        }
        Err(error) if error.is_restriction() => {
            // Policy rejection: retrying cannot succeed without a spec change
            warn!(
                subnet = %format!("{namespace}/{name}"),
                %error,
                "fabric restricted the subnet configuration, not retrying"
            );
            status.set_condition("False", error.status_reason(), &error.to_string());
            status.apply(&ctx.client).await?;
            Ok(())
        }
        Err(error) => {
            warn!(
                subnet = %format!("{namespace}/{name}"),
                %error,
                "operate failed, would retry exponentially"
            );
            status.set_condition("False", error.status_reason(), &error.to_string());
            status.apply(&ctx.client).await?;
            Err(error.into())
        }
    }
}

/// Clean up the fabric side of a deleted `Subnet` and release its
/// finalizer.
///
/// A missing finalizer means the object was already cleaned up or never
/// fully finalized; that is a benign race and no fabric action is taken.
///
/// # Errors
///
/// Returns an error when cleanup fails; the finalizer stays in place and
/// deletion is retried on redelivery.
pub async fn delete_subnet(ctx: Arc<Context>, subnet: Subnet) -> Result<()> {
    let namespace = subnet.cr_namespace();
    let name = subnet.cr_name();

    if !has_finalizer(&subnet, SUBNET_FINALIZER) {
        info!(
            "Subnet {}/{} has no finalizer, nothing to clean up",
            namespace, name
        );
        return Ok(());
    }

    match ctx.service.delete_owned(&subnet.cr_uid()).await {
        Ok(()) => {
            remove_finalizer(&ctx.client, &subnet, SUBNET_FINALIZER).await?;
            info!("Deleted Subnet {}/{}", namespace, name);
            Ok(())
        }
        Err(error) => {
            warn!(
                subnet = %format!("{namespace}/{name}"),
                %error,
                "deletion failed, would retry exponentially"
            );
            let mut status = SubnetStatusUpdater::new(&subnet);
            status.set_condition("False", error.status_reason(), &error.to_string());
            status.apply(&ctx.client).await?;
            Err(error.into())
        }
    }
}
