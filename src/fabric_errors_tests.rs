// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `fabric_errors.rs`

#[cfg(test)]
mod tests {
    use crate::fabric_errors::{FabricError, SubnetError};

    fn restriction() -> FabricError {
        FabricError::Restriction {
            message: "public access mode not allowed in this project".to_string(),
        }
    }

    #[test]
    fn test_connection_failures_are_transient() {
        let err = FabricError::ConnectionFailed {
            endpoint: "https://fabric.example:443".to_string(),
            reason: "connection refused".to_string(),
        };
        assert!(err.is_transient());
        assert!(!err.is_restriction());
    }

    #[test]
    fn test_timeouts_are_transient() {
        let err = FabricError::RequestTimeout {
            endpoint: "https://fabric.example:443".to_string(),
            timeout_ms: 30_000,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_restriction_is_terminal() {
        let err = restriction();
        assert!(!err.is_transient());
        assert!(err.is_restriction());
        assert_eq!(err.status_reason(), "ConfigurationRestricted");
    }

    #[test]
    fn test_api_status_code_classification() {
        let rate_limited = FabricError::Api {
            status_code: 429,
            message: "slow down".to_string(),
        };
        let server_error = FabricError::Api {
            status_code: 503,
            message: "maintenance".to_string(),
        };
        let bad_request = FabricError::Api {
            status_code: 400,
            message: "unknown field".to_string(),
        };

        assert!(rate_limited.is_transient());
        assert!(server_error.is_transient());
        assert!(!bad_request.is_transient());
    }

    #[test]
    fn test_subnet_error_inherits_backend_classification() {
        let terminal = SubnetError::Backend(restriction());
        assert!(!terminal.is_transient());
        assert!(terminal.is_restriction());

        let transient = SubnetError::Backend(FabricError::Api {
            status_code: 500,
            message: "internal".to_string(),
        });
        assert!(transient.is_transient());
        assert!(!transient.is_restriction());
    }

    #[test]
    fn test_realize_timeout_is_retryable() {
        let err = SubnetError::RealizeTimeout {
            subnet_id: "subnet_u1".to_string(),
            timeout_secs: 120,
        };
        assert!(err.is_transient());
        assert_eq!(err.status_reason(), "RealizationTimeout");
    }

    #[test]
    fn test_store_inconsistency_is_surfaced_and_retryable() {
        let err = SubnetError::StoreInconsistency {
            uid: "u-1234".to_string(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status_reason(), "CacheInconsistent");
    }

    #[test]
    fn test_unsupported_kind_is_terminal() {
        let err = SubnetError::UnsupportedKind {
            kind: "gatewayset".to_string(),
        };
        assert!(!err.is_transient());
        assert_eq!(err.status_reason(), "UnsupportedKind");
    }

    #[test]
    fn test_error_messages_carry_diagnostics() {
        let err = SubnetError::PoolDrainTimeout {
            subnet_id: "subnet_u1_ab12cd34".to_string(),
            timeout_secs: 600,
        };
        let text = err.to_string();
        assert!(text.contains("subnet_u1_ab12cd34"));
        assert!(text.contains("600"));
    }
}
