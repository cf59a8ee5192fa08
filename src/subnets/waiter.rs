// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Realization and allocation-drain waiters.
//!
//! Both waiters are cooperative polling tasks with explicit deadlines: the
//! poll loop runs inside `tokio::time::timeout`, so expiry cancels the loop
//! promptly and no polling outlives the owning reconcile. Each waiter
//! blocks only the reconcile worker that invoked it.

use crate::constants::{
    POOL_DRAIN_POLL_INTERVAL_SECS, REALIZED_ENTITY_TYPE, REALIZED_STATE,
    REALIZE_POLL_INTERVAL_SECS, STATIC_IP_POOL_ID,
};
use crate::fabric::model::{FabricSubnet, PoolUsage, VpcLocator};
use crate::fabric_errors::SubnetError;
use crate::subnets::SubnetService;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

impl SubnetService {
    /// Poll the realization API until the subnet's switch reports
    /// `REALIZED`, or fail once the configured deadline elapses.
    ///
    /// A failed status query counts as "not yet realized" and the loop
    /// keeps polling; only the deadline terminates it.
    pub(crate) async fn wait_realized(
        &self,
        subnet_id: &str,
        intent_path: &str,
    ) -> Result<(), SubnetError> {
        let deadline = self.config.realize_timeout();
        let locator = VpcLocator::from_path(intent_path)?;

        let poll = async {
            loop {
                if self.subnet_realized(&locator, intent_path).await {
                    return;
                }
                sleep(Duration::from_secs(REALIZE_POLL_INTERVAL_SECS)).await;
            }
        };

        if timeout(deadline, poll).await.is_err() {
            warn!(
                subnet_id,
                timeout_secs = deadline.as_secs(),
                "timeout waiting for subnet to be realized"
            );
            return Err(SubnetError::RealizeTimeout {
                subnet_id: subnet_id.to_string(),
                timeout_secs: deadline.as_secs(),
            });
        }
        Ok(())
    }

    async fn subnet_realized(&self, locator: &VpcLocator, intent_path: &str) -> bool {
        match self.fabric.list_realized_entities(locator, intent_path).await {
            Ok(entities) => entities.iter().any(|entity| {
                entity.entity_type.as_deref() == Some(REALIZED_ENTITY_TYPE)
                    && entity.state.as_deref() == Some(REALIZED_STATE)
            }),
            Err(error) => {
                debug!(%error, intent_path, "realization check failed, treating as not realized");
                false
            }
        }
    }

    /// Release every IP allocation under the subnet's static pool, then
    /// block until the pool's allocated count reaches zero.
    ///
    /// This runs before every delete patch: the fabric refuses to remove a
    /// subnet whose pool is still in use.
    pub(crate) async fn drain_ip_allocations(
        &self,
        subnet: &FabricSubnet,
    ) -> Result<(), SubnetError> {
        let locator = VpcLocator::from_path(subnet.rendered_path()?)?;

        let allocations = self
            .fabric
            .list_ip_allocations(&locator, &subnet.id, STATIC_IP_POOL_ID)
            .await?;
        for allocation in &allocations {
            self.fabric
                .delete_ip_allocation(&locator, &subnet.id, STATIC_IP_POOL_ID, &allocation.id)
                .await?;
        }
        if !allocations.is_empty() {
            info!(
                subnet_id = %subnet.id,
                released = allocations.len(),
                "all IP allocations have been deleted"
            );
        }

        match self.config.pool_drain_timeout() {
            Some(deadline) => timeout(deadline, self.await_pool_drained(&locator, &subnet.id))
                .await
                .map_err(|_| SubnetError::PoolDrainTimeout {
                    subnet_id: subnet.id.clone(),
                    timeout_secs: deadline.as_secs(),
                })?,
            None => self.await_pool_drained(&locator, &subnet.id).await,
        }
    }

    async fn await_pool_drained(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
    ) -> Result<(), SubnetError> {
        loop {
            let usage = self
                .fabric
                .get_pool_usage(locator, subnet_id, STATIC_IP_POOL_ID)
                .await?;
            if usage.allocated_ip_allocations <= 0 {
                return Ok(());
            }
            info!(
                subnet_id,
                held = usage.allocated_ip_allocations,
                "waiting for IP allocations to be released"
            );
            sleep(Duration::from_secs(POOL_DRAIN_POLL_INTERVAL_SECS)).await;
        }
    }

    /// Current usage of the subnet's static pool.
    ///
    /// # Errors
    ///
    /// Returns a [`SubnetError`] when the subnet has no rendered path yet or
    /// the fabric query fails.
    pub async fn pool_usage(&self, subnet: &FabricSubnet) -> Result<PoolUsage, SubnetError> {
        let locator = VpcLocator::from_path(subnet.rendered_path()?)?;
        Ok(self
            .fabric
            .get_pool_usage(&locator, &subnet.id, STATIC_IP_POOL_ID)
            .await?)
    }
}
