// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `finalizers.rs`

#[cfg(test)]
mod tests {
    use crate::constants::SUBNET_FINALIZER;
    use crate::crd::{Subnet, SubnetSpec};
    use crate::reconcilers::finalizers::has_finalizer;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn subnet_with_finalizers(finalizers: Option<Vec<String>>) -> Subnet {
        Subnet {
            metadata: ObjectMeta {
                name: Some("web-tier".to_string()),
                namespace: Some("prod".to_string()),
                finalizers,
                ..Default::default()
            },
            spec: SubnetSpec::default(),
            status: None,
        }
    }

    #[test]
    fn test_has_finalizer_absent_on_fresh_resource() {
        let subnet = subnet_with_finalizers(None);
        assert!(!has_finalizer(&subnet, SUBNET_FINALIZER));
    }

    #[test]
    fn test_has_finalizer_present() {
        let subnet = subnet_with_finalizers(Some(vec![SUBNET_FINALIZER.to_string()]));
        assert!(has_finalizer(&subnet, SUBNET_FINALIZER));
    }

    #[test]
    fn test_has_finalizer_ignores_foreign_finalizers() {
        let subnet = subnet_with_finalizers(Some(vec![
            "other.example.com/finalizer".to_string(),
        ]));
        assert!(!has_finalizer(&subnet, SUBNET_FINALIZER));
    }

    #[test]
    fn test_has_finalizer_finds_ours_among_many() {
        let subnet = subnet_with_finalizers(Some(vec![
            "other.example.com/finalizer".to_string(),
            SUBNET_FINALIZER.to_string(),
        ]));
        assert!(has_finalizer(&subnet, SUBNET_FINALIZER));
    }
}
