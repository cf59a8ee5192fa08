// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration.
//!
//! All knobs live in one [`OperatorConfig`] value parsed from CLI flags and
//! environment variables, and are passed explicitly into constructors.
//! Nothing in this crate reads configuration from ambient global state.

use crate::constants::{
    DEFAULT_POOL_DRAIN_TIMEOUT_SECS, DEFAULT_REALIZE_TIMEOUT_SECS, METRICS_SERVER_PORT,
};
use crate::fabric::model::VpcLocator;
use clap::Parser;
use std::time::Duration;

/// Configuration for the netweave operator.
#[derive(Parser, Debug, Clone)]
#[command(name = "netweave", about = "VPC Subnet Operator for Kubernetes")]
pub struct OperatorConfig {
    /// Cluster identity tagged onto every fabric subnet and used as the
    /// Domain ID in hierarchical patches
    #[arg(long, env = "NETWEAVE_CLUSTER")]
    pub cluster: String,

    /// Fabric organization the managed VPC belongs to
    #[arg(long, env = "NETWEAVE_ORG", default_value = "default")]
    pub org: String,

    /// Fabric project the managed VPC belongs to
    #[arg(long, env = "NETWEAVE_PROJECT")]
    pub project: String,

    /// VPC whose subnets this operator manages
    #[arg(long, env = "NETWEAVE_VPC")]
    pub vpc: String,

    /// Base URL of the fabric API, e.g. `https://fabric.example:443`
    #[arg(long, env = "NETWEAVE_FABRIC_ENDPOINT")]
    pub fabric_endpoint: String,

    /// Username for fabric basic authentication
    #[arg(long, env = "NETWEAVE_FABRIC_USERNAME")]
    pub fabric_username: Option<String>,

    /// Password for fabric basic authentication
    #[arg(long, env = "NETWEAVE_FABRIC_PASSWORD", hide_env_values = true)]
    pub fabric_password: Option<String>,

    /// Per-request timeout for fabric calls, in seconds
    #[arg(long, env = "NETWEAVE_FABRIC_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    pub fabric_request_timeout_secs: u64,

    /// Deadline for a patched subnet to reach the REALIZED state, in seconds
    #[arg(long, env = "NETWEAVE_REALIZE_TIMEOUT_SECS", default_value_t = DEFAULT_REALIZE_TIMEOUT_SECS)]
    pub realize_timeout_secs: u64,

    /// Deadline for the IP-allocation drain before a subnet delete, in
    /// seconds; 0 waits indefinitely
    #[arg(long, env = "NETWEAVE_POOL_DRAIN_TIMEOUT_SECS", default_value_t = DEFAULT_POOL_DRAIN_TIMEOUT_SECS)]
    pub pool_drain_timeout_secs: u64,

    /// Port the Prometheus metrics endpoint listens on
    #[arg(long, env = "NETWEAVE_METRICS_PORT", default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,
}

impl OperatorConfig {
    /// Locator for the VPC this operator manages.
    #[must_use]
    pub fn locator(&self) -> VpcLocator {
        VpcLocator {
            org: self.org.clone(),
            project: self.project.clone(),
            vpc: self.vpc.clone(),
        }
    }

    /// Realization deadline as a [`Duration`].
    #[must_use]
    pub fn realize_timeout(&self) -> Duration {
        Duration::from_secs(self.realize_timeout_secs)
    }

    /// Allocation-drain deadline; `None` means wait indefinitely.
    #[must_use]
    pub fn pool_drain_timeout(&self) -> Option<Duration> {
        if self.pool_drain_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.pool_drain_timeout_secs))
        }
    }

    /// Basic-auth credentials for the fabric, when configured.
    #[must_use]
    pub fn fabric_credentials(&self) -> Option<(String, String)> {
        match (&self.fabric_username, &self.fabric_password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
