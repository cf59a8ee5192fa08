// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `subnets/compare.rs`

#[cfg(test)]
mod tests {
    use crate::constants::{TAG_SCOPE_CLUSTER, TAG_SCOPE_SUBNET_CR_UID};
    use crate::fabric::model::{
        DhcpConfig, FabricSubnet, StaticIpAllocation, SubnetAdvancedConfig, Tag,
    };
    use crate::subnets::compare::subnet_changed;

    fn base_subnet() -> FabricSubnet {
        FabricSubnet {
            id: "subnet_u1".to_string(),
            display_name: Some("prod-web-tier".to_string()),
            access_mode: Some("private".to_string()),
            ip_addresses: vec!["10.0.0.0/26".to_string()],
            tags: vec![
                Tag::new(TAG_SCOPE_CLUSTER, "k8scl-one"),
                Tag::new(TAG_SCOPE_SUBNET_CR_UID, "u1"),
            ],
            path: Some("/orgs/o/projects/p/vpcs/v/subnets/subnet_u1".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_subnets_are_unchanged() {
        assert!(!subnet_changed(&base_subnet(), &base_subnet()));
    }

    #[test]
    fn test_tag_change_is_detected() {
        let cached = base_subnet();
        let mut desired = base_subnet();
        desired.tags.push(Tag::new("nw-op/namespace", "prod"));

        assert!(subnet_changed(&cached, &desired));
    }

    #[test]
    fn test_display_name_change_is_detected() {
        let cached = base_subnet();
        let mut desired = base_subnet();
        desired.display_name = Some("prod-web-tier-v2".to_string());

        assert!(subnet_changed(&cached, &desired));
    }

    #[test]
    fn test_advanced_config_change_is_detected() {
        let cached = base_subnet();
        let mut desired = base_subnet();
        desired.advanced_config = Some(SubnetAdvancedConfig {
            static_ip_allocation: Some(StaticIpAllocation { enable: Some(true) }),
        });

        assert!(subnet_changed(&cached, &desired));
    }

    #[test]
    fn test_immutable_fields_are_excluded() {
        let cached = base_subnet();

        // Mutating only immutable / fabric-rendered fields must not read as
        // a change: the fabric rejects or ignores writes to them.
        let mut desired = base_subnet();
        desired.ip_addresses = vec!["192.168.0.0/24".to_string()];
        desired.access_mode = Some("public".to_string());
        desired.ipv4_subnet_size = Some(128);
        desired.dhcp_config = Some(DhcpConfig {
            enable_dhcp: Some(true),
            ..Default::default()
        });
        desired.path = None;

        assert!(!subnet_changed(&cached, &desired));
    }

    #[test]
    fn test_tag_order_is_normalized() {
        let cached = base_subnet();
        let mut desired = base_subnet();
        desired.tags.reverse();

        assert!(
            !subnet_changed(&cached, &desired),
            "fabric-side tag reordering must not trigger a write"
        );
    }
}
