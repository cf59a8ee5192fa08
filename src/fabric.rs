// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fabric API boundary.
//!
//! The network-virtualization fabric is an external system reached over
//! HTTPS. This module holds everything that crosses that boundary:
//!
//! - [`model`] - the fabric's wire representation of subnets, the
//!   hierarchical patch envelope, realization entries, and IP pool types
//! - [`client`] - the narrow command interface ([`client::FabricApi`]:
//!   patch, get, list, delete) and its HTTP implementation
//!
//! Everything above this module treats fabric calls as possibly failing
//! with a transient error (retried upstream) or a terminal restriction
//! error (surfaced as a Failed status, never retried).

pub mod client;
pub mod model;

pub use client::{FabricApi, HttpFabricClient};
pub use model::{FabricSubnet, OrgRoot, VpcLocator};
