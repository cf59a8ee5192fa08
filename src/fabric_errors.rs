// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fabric and subnet-service error types for netweave.
//!
//! This module provides specialized error types for:
//! - Fabric HTTP API operations (hierarchical patches, reads, deletes)
//! - Subnet service operations (realization waits, allocation drains,
//!   store consistency, kind dispatch)
//!
//! The reconciler is the only layer that turns these into retry decisions
//! and user-visible status; everything below returns them typed.

use thiserror::Error;

/// Errors returned by the fabric transport.
///
/// Every fabric call can fail with one of these. Transient variants are
/// retried through the controller's backoff; [`FabricError::Restriction`]
/// is terminal and must never be retried, since retrying cannot succeed
/// without a spec change.
#[derive(Error, Debug, Clone)]
pub enum FabricError {
    /// The fabric endpoint could not be reached (connect failure, DNS, TLS)
    #[error("connection to fabric at {endpoint} failed: {reason}")]
    ConnectionFailed {
        /// Endpoint the client tried to reach
        endpoint: String,
        /// Underlying transport failure
        reason: String,
    },

    /// A request exceeded the client timeout
    #[error("fabric request to {endpoint} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// Endpoint the request was sent to
        endpoint: String,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// The fabric refused the requested configuration on policy grounds
    /// (HTTP 403). Terminal: the same request will keep failing.
    #[error("fabric rejected the request: {message}")]
    Restriction {
        /// Verbatim fabric error text
        message: String,
    },

    /// Any other non-2xx response from the fabric
    #[error("fabric API error (HTTP {status_code}): {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Response body or error message
        message: String,
    },

    /// The response body could not be decoded into the expected model
    #[error("failed to decode fabric response from {endpoint}: {reason}")]
    Decode {
        /// Endpoint that returned the undecodable body
        endpoint: String,
        /// Decoder failure
        reason: String,
    },
}

impl FabricError {
    /// Returns true if this error is transient and the operation should be
    /// retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::RequestTimeout { .. } => true,
            Self::Api { status_code, .. } => *status_code == 429 || *status_code >= 500,
            Self::Restriction { .. } | Self::Decode { .. } => false,
        }
    }

    /// Returns true if the fabric rejected the configuration on policy
    /// grounds. Restriction failures are surfaced as a Failed status and
    /// never retried.
    #[must_use]
    pub fn is_restriction(&self) -> bool {
        matches!(self, Self::Restriction { .. })
    }

    /// Status reason code used in the Ready condition.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } => "FabricUnreachable",
            Self::RequestTimeout { .. } => "FabricRequestTimeout",
            Self::Restriction { .. } => "ConfigurationRestricted",
            Self::Api { .. } => "FabricApiError",
            Self::Decode { .. } => "FabricResponseInvalid",
        }
    }
}

/// Errors returned by the subnet service layer.
#[derive(Error, Debug, Clone)]
pub enum SubnetError {
    /// A fabric call failed
    #[error(transparent)]
    Backend(#[from] FabricError),

    /// The subnet did not reach `REALIZED` before the deadline
    #[error("subnet {subnet_id} was not realized within {timeout_secs}s")]
    RealizeTimeout {
        /// Fabric subnet ID
        subnet_id: String,
        /// Deadline that elapsed
        timeout_secs: u64,
    },

    /// IP allocations were still held after the drain deadline
    #[error("IP pool of subnet {subnet_id} did not drain within {timeout_secs}s")]
    PoolDrainTimeout {
        /// Fabric subnet ID
        subnet_id: String,
        /// Deadline that elapsed
        timeout_secs: u64,
    },

    /// The store was expected to hold an entry for this owner and did not.
    /// Indicates the cache and the fabric have diverged; never ignored.
    #[error("no cached fabric subnet for owner UID {uid}")]
    StoreInconsistency {
        /// Owner UID whose index lookup came back empty
        uid: String,
    },

    /// The builder was handed a spec kind it does not recognize
    #[error("unsupported resource kind '{kind}'")]
    UnsupportedKind {
        /// The unrecognized kind tag
        kind: String,
    },

    /// A fabric policy path did not have the expected
    /// `/orgs/{{org}}/projects/{{project}}/vpcs/{{vpc}}/...` shape
    #[error("malformed fabric resource path '{path}'")]
    MalformedPath {
        /// The path that failed to parse
        path: String,
    },

    /// A CIDR in the subnet's address list could not be parsed
    #[error("invalid CIDR '{cidr}' in subnet address list")]
    InvalidCidr {
        /// The offending CIDR string
        cidr: String,
    },

    /// A fabric subnet is missing a field the fabric is supposed to render
    /// (e.g. `path` after a successful write)
    #[error("fabric subnet {subnet_id} is missing rendered field '{field}'")]
    MissingRenderedField {
        /// Fabric subnet ID
        subnet_id: String,
        /// Name of the absent field
        field: &'static str,
    },
}

impl SubnetError {
    /// Returns true if the operation should be retried via backoff.
    ///
    /// Realization timeouts are retryable: the change was accepted, the
    /// fabric just has not finished applying it. Restriction errors are
    /// terminal. Everything else is retried so a divergent cache or a
    /// flaky fabric heals on redelivery.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Backend(err) => err.is_transient(),
            Self::RealizeTimeout { .. }
            | Self::PoolDrainTimeout { .. }
            | Self::StoreInconsistency { .. } => true,
            Self::UnsupportedKind { .. }
            | Self::MalformedPath { .. }
            | Self::InvalidCidr { .. }
            | Self::MissingRenderedField { .. } => false,
        }
    }

    /// Returns true if this wraps a fabric policy restriction.
    #[must_use]
    pub fn is_restriction(&self) -> bool {
        matches!(self, Self::Backend(err) if err.is_restriction())
    }

    /// Status reason code used in the Ready condition.
    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        match self {
            Self::Backend(err) => err.status_reason(),
            Self::RealizeTimeout { .. } => "RealizationTimeout",
            Self::PoolDrainTimeout { .. } => "AllocationDrainTimeout",
            Self::StoreInconsistency { .. } => "CacheInconsistent",
            Self::UnsupportedKind { .. } => "UnsupportedKind",
            Self::MalformedPath { .. } => "MalformedResourcePath",
            Self::InvalidCidr { .. } => "InvalidAddressList",
            Self::MissingRenderedField { .. } => "FabricResponseInvalid",
        }
    }
}

#[cfg(test)]
#[path = "fabric_errors_tests.rs"]
mod fabric_errors_tests;
