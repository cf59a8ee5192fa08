// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes reconciliation controllers for subnet resources.
//!
//! Each reconciler drives one spec object through the standard controller
//! pattern:
//!
//! 1. **Watch** - resource changes arrive via the Kubernetes API
//! 2. **Reconcile** - compare desired state (spec) with fabric state
//! 3. **Update** - patch the fabric through the shared subnet service
//! 4. **Status** - report the attempted outcome back to Kubernetes
//!
//! The state machine per object is: finalizer added before any fabric work;
//! create/update goes through change detection so redundant fabric writes
//! never happen; errors set Ready/False and retry via backoff except fabric
//! restriction errors, which are terminal; deletion drains dependents, then
//! deletes, then releases the finalizer.
//!
//! # Available Reconcilers
//!
//! - [`reconcile_subnet`] / [`delete_subnet`] - single subnets
//! - [`reconcile_subnetset`] / [`delete_subnetset`] - lazily allocated sets

pub mod finalizers;
pub mod status;
pub mod subnet;
pub mod subnetset;

pub use subnet::{delete_subnet, reconcile_subnet};
pub use subnetset::{delete_subnetset, reconcile_subnetset};
