// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers for `Subnet` and `SubnetSet` resources.
//!
//! Status changes are collected in memory and applied in a single patch,
//! and only when the content actually changed: in kube-rs a status update
//! triggers an "object updated" event, so unconditional updates would spin
//! the reconcile loop.
//!
//! The status always reflects the last *attempted* outcome, including the
//! verbatim fabric error text, so operators can diagnose without log
//! access.

use crate::crd::{Condition, Subnet, SubnetInfo, SubnetSet, SubnetSetStatus, SubnetStatus};
use anyhow::Result;
use chrono::Utc;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::debug;

/// The condition type both kinds report.
pub const CONDITION_READY: &str = "Ready";

/// Reason set when the fabric accepted a create/update.
pub const REASON_FABRIC_ACCEPTED: &str = "FabricAcceptedChange";

/// Reason set when every subnet owned by a set reconciled cleanly.
pub const REASON_ALL_SUBNETS_READY: &str = "AllSubnetsReady";

/// Create a new condition with the current timestamp.
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Compare two condition lists semantically, ignoring transition times.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    if current.len() != new.len() {
        return false;
    }
    for new_cond in new {
        match current.iter().find(|c| c.r#type == new_cond.r#type) {
            None => return false,
            Some(curr_cond) => {
                if curr_cond.status != new_cond.status
                    || curr_cond.reason != new_cond.reason
                    || curr_cond.message != new_cond.message
                {
                    return false;
                }
            }
        }
    }
    true
}

/// Update or add a condition in place, preserving the transition time when
/// the status value did not flip.
pub fn update_condition_in_memory(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };
        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Collects status changes for a `Subnet` and applies them in one call.
pub struct SubnetStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<SubnetStatus>,
    new_status: SubnetStatus,
}

impl SubnetStatusUpdater {
    /// Start from the resource's current status.
    #[must_use]
    pub fn new(subnet: &Subnet) -> Self {
        let current_status = subnet.status.clone();
        let new_status = current_status.clone().unwrap_or_default();
        Self {
            namespace: subnet.namespace().unwrap_or_default(),
            name: subnet.name_any(),
            current_status,
            new_status,
        }
    }

    /// Set the Ready condition (in memory).
    pub fn set_condition(&mut self, status: &str, reason: &str, message: &str) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            CONDITION_READY,
            status,
            reason,
            message,
        );
    }

    /// Record the fabric-realized addressing and path (in memory).
    pub fn set_realized(&mut self, ip_addresses: Vec<String>, resource_path: String) {
        self.new_status.ip_addresses = ip_addresses;
        self.new_status.resource_path = Some(resource_path);
    }

    /// Whether the collected status differs from the resource's current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.ip_addresses != self.new_status.ip_addresses
                    || current.resource_path != self.new_status.resource_path
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// Apply the collected changes with a single status patch, skipping the
    /// call entirely when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                "Subnet {}/{} status unchanged, skipping update",
                self.namespace, self.name
            );
            return Ok(());
        }
        let api: Api<Subnet> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.new_status });
        api.patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// Collects status changes for a `SubnetSet` and applies them in one call.
pub struct SubnetSetStatusUpdater {
    namespace: String,
    name: String,
    current_status: Option<SubnetSetStatus>,
    new_status: SubnetSetStatus,
}

impl SubnetSetStatusUpdater {
    /// Start from the resource's current status.
    #[must_use]
    pub fn new(set: &SubnetSet) -> Self {
        let current_status = set.status.clone();
        let new_status = current_status.clone().unwrap_or_default();
        Self {
            namespace: set.namespace().unwrap_or_default(),
            name: set.name_any(),
            current_status,
            new_status,
        }
    }

    /// Set the Ready condition (in memory).
    pub fn set_condition(&mut self, status: &str, reason: &str, message: &str) {
        update_condition_in_memory(
            &mut self.new_status.conditions,
            CONDITION_READY,
            status,
            reason,
            message,
        );
    }

    /// Replace the owned-subnet summaries (in memory).
    pub fn set_subnets(&mut self, subnets: Vec<SubnetInfo>) {
        self.new_status.subnets = subnets;
    }

    /// Whether the collected status differs from the resource's current one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.subnets != self.new_status.subnets
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    /// Apply the collected changes with a single status patch, skipping the
    /// call entirely when nothing changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the Kubernetes API call fails.
    pub async fn apply(&self, client: &Client) -> Result<()> {
        if !self.has_changes() {
            debug!(
                "SubnetSet {}/{} status unchanged, skipping update",
                self.namespace, self.name
            );
            return Ok(());
        }
        let api: Api<SubnetSet> = Api::namespaced(client.clone(), &self.namespace);
        let patch = json!({ "status": self.new_status });
        api.patch_status(&self.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
