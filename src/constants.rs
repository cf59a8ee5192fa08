// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the netweave operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group for all netweave CRDs
pub const API_GROUP: &str = "netweave.dev";

/// API version for all netweave CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "netweave.dev/v1alpha1";

/// Kind name for the `Subnet` resource
pub const KIND_SUBNET: &str = "Subnet";

/// Kind name for the `SubnetSet` resource
pub const KIND_SUBNET_SET: &str = "SubnetSet";

/// Finalizer placed on both `Subnet` and `SubnetSet` resources.
///
/// Guarantees fabric-side cleanup runs before the resource disappears
/// from the API server.
pub const SUBNET_FINALIZER: &str = "subnet.netweave.dev/finalizer";

// ============================================================================
// Fabric Tag Scopes
// ============================================================================

/// Tag scope carrying the cluster identity
pub const TAG_SCOPE_CLUSTER: &str = "nw-op/cluster";

/// Tag scope carrying the owning resource's namespace
pub const TAG_SCOPE_NAMESPACE: &str = "nw-op/namespace";

/// Tag scope carrying the owning resource's name
pub const TAG_SCOPE_SUBNET_CR_NAME: &str = "nw-op/subnet_cr_name";

/// Tag scope carrying the owning resource's UID.
///
/// This is the sole join key between spec objects and fabric subnets:
/// exactly one tag with this scope exists on every fabric subnet the
/// operator creates, and the store's secondary index is built from it.
pub const TAG_SCOPE_SUBNET_CR_UID: &str = "nw-op/subnet_cr_uid";

/// Tag scope recording which CR kind (`subnet` or `subnetset`) owns the
/// fabric subnet
pub const TAG_SCOPE_SUBNET_CR_TYPE: &str = "nw-op/subnet_cr_type";

// ============================================================================
// Fabric Resource Types
// ============================================================================

/// Fabric resource type for a VPC subnet
pub const RESOURCE_TYPE_SUBNET: &str = "VpcSubnet";

/// Entity type reported by the realization API once the switch backing a
/// subnet exists
pub const REALIZED_ENTITY_TYPE: &str = "RealizedLogicalSwitch";

/// Realization state meaning the change is durably effective
pub const REALIZED_STATE: &str = "REALIZED";

/// Default static IPv4 pool under every fabric subnet
pub const STATIC_IP_POOL_ID: &str = "static-ipv4-default";

/// Revision check flag sent with hierarchical patches. Disabled: the
/// operator is the only writer for its own subnets.
pub const ENFORCE_REVISION_CHECK: bool = false;

// ============================================================================
// Waiter Cadence
// ============================================================================

/// Interval between realization-status polls
pub const REALIZE_POLL_INTERVAL_SECS: u64 = 1;

/// Default overall deadline for a subnet to reach `REALIZED`
pub const DEFAULT_REALIZE_TIMEOUT_SECS: u64 = 120;

/// Interval between IP-pool usage polls while draining allocations
pub const POOL_DRAIN_POLL_INTERVAL_SECS: u64 = 5;

/// Default deadline for the allocation drain; `0` disables the bound
pub const DEFAULT_POOL_DRAIN_TIMEOUT_SECS: u64 = 600;

// ============================================================================
// Subnet Sizing
// ============================================================================

/// Default address count for a subnet when the spec omits it
pub const DEFAULT_IPV4_SUBNET_SIZE: i64 = 64;

/// Addresses held back from every subnet (network, gateway, DHCP server,
/// broadcast); a subnet only counts as available when headroom exceeds this
pub const RESERVED_ADDRESS_COUNT: i64 = 4;

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Requeue duration for resources that reconciled cleanly (5 minutes)
pub const SYNCED_REQUEUE_DURATION_SECS: u64 = 300;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
