// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for both controllers.
//!
//! One `Arc<Context>` is built at startup and handed to the `Subnet` and
//! `SubnetSet` controllers. The subnet service inside it is deliberately
//! shared: a `SubnetSet`'s status is derived from the subnets it owns in
//! the same store, so both reconcilers must see one cache.

use crate::config::OperatorConfig;
use crate::subnets::SubnetService;
use kube::Client;
use std::sync::Arc;

/// Shared context passed to all controllers.
#[derive(Clone)]
pub struct Context {
    /// Kubernetes client for spec and status operations
    pub client: Client,

    /// The process-wide subnet service (fabric client + store)
    pub service: Arc<SubnetService>,

    /// Operator configuration
    pub config: OperatorConfig,
}

impl Context {
    /// Bundle the shared pieces into a context.
    #[must_use]
    pub fn new(client: Client, service: Arc<SubnetService>, config: OperatorConfig) -> Self {
        Self {
            client,
            service,
            config,
        }
    }
}
