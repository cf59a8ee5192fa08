// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # netweave - VPC Subnet Operator for Kubernetes
//!
//! netweave reconciles declarative `Subnet` and `SubnetSet` resources
//! against a network-virtualization fabric, keeping an in-memory cache of
//! fabric state in sync with both the declared specs and the fabric's
//! actual state.
//!
//! ## Overview
//!
//! The operator drives each resource through create/update/delete with
//! exactly-once-effective semantics over an eventually consistent fabric:
//!
//! - A change detector prevents redundant fabric writes
//! - Every write is a single hierarchical patch, so partial intermediate
//!   states are never visible to other readers
//! - A realization waiter confirms changes took durable effect before the
//!   cache and status are updated
//! - Deletion releases dependent IP allocations and drains the pool before
//!   removing the subnet
//! - `SubnetSet` children are allocated lazily, on demand
//!
//! ## Modules
//!
//! - [`crd`] - Custom Resource Definitions for subnet resources
//! - [`fabric`] - fabric wire model and the narrow API client
//! - [`subnets`] - the shared subnet service: store, change detection,
//!   builders, waiters, lazy allocator
//! - [`reconcilers`] - reconciliation logic per resource type
//! - [`context`] - shared context handed to all controllers
//! - [`config`] - operator configuration
//! - [`metrics`] - Prometheus metrics and the `/metrics` endpoint

pub mod config;
pub mod constants;
pub mod context;
pub mod crd;
pub mod fabric;
pub mod fabric_errors;
pub mod metrics;
pub mod reconcilers;
pub mod subnets;
