// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common test utilities: an in-memory fabric and resource fixtures.

// Not every test binary exercises every helper
#![allow(dead_code)]

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use netweave::config::OperatorConfig;
use netweave::constants::{REALIZED_ENTITY_TYPE, REALIZED_STATE};
use netweave::crd::{AccessMode, Subnet, SubnetSet, SubnetSetSpec, SubnetSpec};
use netweave::fabric::client::FabricApi;
use netweave::fabric::model::{
    FabricSubnet, IpAllocation, OrgRoot, PoolUsage, RealizedEntity, VpcLocator,
};
use netweave::fabric_errors::FabricError;
use std::collections::HashMap;
use std::sync::Mutex;

pub const TEST_ORG: &str = "acme";
pub const TEST_PROJECT: &str = "proj-1";
pub const TEST_VPC: &str = "vpc-1";

/// Operator configuration pointed at the in-memory fabric.
pub fn test_config() -> OperatorConfig {
    OperatorConfig {
        cluster: "k8scl-one".to_string(),
        org: TEST_ORG.to_string(),
        project: TEST_PROJECT.to_string(),
        vpc: TEST_VPC.to_string(),
        fabric_endpoint: "https://fabric.invalid:443".to_string(),
        fabric_username: None,
        fabric_password: None,
        fabric_request_timeout_secs: 30,
        realize_timeout_secs: 120,
        pool_drain_timeout_secs: 600,
        metrics_port: 8080,
    }
}

/// A `Subnet` fixture with the given name and UID.
pub fn test_subnet(name: &str, uid: &str) -> Subnet {
    Subnet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("prod".to_string()),
            uid: Some(uid.to_string()),
            ..Default::default()
        },
        spec: SubnetSpec {
            ipv4_subnet_size: Some(64),
            access_mode: Some(AccessMode::Private),
            ip_addresses: vec![],
            dhcp_config: None,
            advanced_config: None,
        },
        status: None,
    }
}

/// A `SubnetSet` fixture with the given name and UID.
pub fn test_subnetset(name: &str, uid: &str) -> SubnetSet {
    SubnetSet {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("prod".to_string()),
            uid: Some(uid.to_string()),
            ..Default::default()
        },
        spec: SubnetSetSpec {
            ipv4_subnet_size: Some(64),
            access_mode: Some(AccessMode::Private),
        },
        status: None,
    }
}

/// The policy path the mock fabric renders for a subnet ID.
pub fn rendered_path(subnet_id: &str) -> String {
    format!("/orgs/{TEST_ORG}/projects/{TEST_PROJECT}/vpcs/{TEST_VPC}/subnets/{subnet_id}")
}

#[derive(Default)]
struct MockState {
    /// Fabric-side subnets by ID
    subnets: HashMap<String, FabricSubnet>,
    /// Every org-root patch received, in order
    patches: Vec<OrgRoot>,
    /// Pool-usage readings per subnet, consumed front to back; the final
    /// reading repeats
    pool_usage: HashMap<String, Vec<i64>>,
    /// Allocations currently held per subnet
    allocations: HashMap<String, Vec<IpAllocation>>,
    /// When set, every patch is refused with this restriction message
    restriction: Option<String>,
    /// When false, the realization API never reports REALIZED
    realizes: bool,
}

/// In-memory [`FabricApi`] implementation.
///
/// Applies hierarchical patches to an internal subnet map, rendering `path`
/// and addressing the way the real fabric does, and records every patch so
/// tests can assert on write counts and ordering.
#[derive(Default)]
pub struct MockFabric {
    state: Mutex<MockState>,
}

impl MockFabric {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                realizes: true,
                ..Default::default()
            }),
        }
    }

    /// A fabric pre-seeded with existing subnets (paths rendered).
    pub fn with_subnets(subnets: Vec<FabricSubnet>) -> Self {
        let fabric = Self::new();
        {
            let mut state = fabric.state.lock().unwrap();
            for mut subnet in subnets {
                if subnet.path.is_none() {
                    subnet.path = Some(rendered_path(&subnet.id));
                }
                state.subnets.insert(subnet.id.clone(), subnet);
            }
        }
        fabric
    }

    pub fn patch_count(&self) -> usize {
        self.state.lock().unwrap().patches.len()
    }

    pub fn patches(&self) -> Vec<OrgRoot> {
        self.state.lock().unwrap().patches.clone()
    }

    pub fn subnet(&self, id: &str) -> Option<FabricSubnet> {
        self.state.lock().unwrap().subnets.get(id).cloned()
    }

    pub fn set_restriction(&self, message: &str) {
        self.state.lock().unwrap().restriction = Some(message.to_string());
    }

    pub fn set_realizes(&self, realizes: bool) {
        self.state.lock().unwrap().realizes = realizes;
    }

    /// Queue pool-usage readings for a subnet; the last one repeats.
    pub fn set_pool_usage(&self, subnet_id: &str, readings: Vec<i64>) {
        self.state
            .lock()
            .unwrap()
            .pool_usage
            .insert(subnet_id.to_string(), readings);
    }

    pub fn set_allocations(&self, subnet_id: &str, ids: &[&str]) {
        let allocations = ids
            .iter()
            .map(|id| IpAllocation {
                id: (*id).to_string(),
                allocation_ip: None,
            })
            .collect();
        self.state
            .lock()
            .unwrap()
            .allocations
            .insert(subnet_id.to_string(), allocations);
    }

    pub fn allocations(&self, subnet_id: &str) -> Vec<IpAllocation> {
        self.state
            .lock()
            .unwrap()
            .allocations
            .get(subnet_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl FabricApi for MockFabric {
    async fn patch_org_root(
        &self,
        org_root: &OrgRoot,
        _enforce_revision_check: bool,
    ) -> Result<(), FabricError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.restriction {
            return Err(FabricError::Restriction {
                message: message.clone(),
            });
        }
        state.patches.push(org_root.clone());
        for domain in &org_root.children {
            for child in &domain.children {
                if child.marked_for_delete.unwrap_or(false) {
                    state.subnets.remove(&child.id);
                } else {
                    let mut subnet = child.subnet.clone();
                    // The fabric renders path and addressing
                    if subnet.path.is_none() {
                        subnet.path = Some(rendered_path(&subnet.id));
                    }
                    if subnet.ip_addresses.is_empty() {
                        subnet.ip_addresses = vec!["10.0.0.0/26".to_string()];
                    }
                    state.subnets.insert(subnet.id.clone(), subnet);
                }
            }
        }
        Ok(())
    }

    async fn get_subnet(
        &self,
        _locator: &VpcLocator,
        subnet_id: &str,
    ) -> Result<FabricSubnet, FabricError> {
        self.state
            .lock()
            .unwrap()
            .subnets
            .get(subnet_id)
            .cloned()
            .ok_or_else(|| FabricError::Api {
                status_code: 404,
                message: format!("subnet {subnet_id} not found"),
            })
    }

    async fn list_subnets(&self, _locator: &VpcLocator) -> Result<Vec<FabricSubnet>, FabricError> {
        let state = self.state.lock().unwrap();
        let mut subnets: Vec<FabricSubnet> = state.subnets.values().cloned().collect();
        subnets.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(subnets)
    }

    async fn list_realized_entities(
        &self,
        _locator: &VpcLocator,
        _intent_path: &str,
    ) -> Result<Vec<RealizedEntity>, FabricError> {
        let state = self.state.lock().unwrap();
        if state.realizes {
            Ok(vec![RealizedEntity {
                id: Some("rls-1".to_string()),
                entity_type: Some(REALIZED_ENTITY_TYPE.to_string()),
                state: Some(REALIZED_STATE.to_string()),
            }])
        } else {
            Ok(vec![])
        }
    }

    async fn get_pool_usage(
        &self,
        _locator: &VpcLocator,
        subnet_id: &str,
        _pool_id: &str,
    ) -> Result<PoolUsage, FabricError> {
        let mut state = self.state.lock().unwrap();
        let allocated = match state.pool_usage.get_mut(subnet_id) {
            Some(readings) if readings.len() > 1 => readings.remove(0),
            Some(readings) if readings.len() == 1 => readings[0],
            _ => 0,
        };
        Ok(PoolUsage {
            allocated_ip_allocations: allocated,
            total_ip_allocations: None,
            free_ip_allocations: None,
        })
    }

    async fn list_ip_allocations(
        &self,
        _locator: &VpcLocator,
        subnet_id: &str,
        _pool_id: &str,
    ) -> Result<Vec<IpAllocation>, FabricError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .allocations
            .get(subnet_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_ip_allocation(
        &self,
        _locator: &VpcLocator,
        subnet_id: &str,
        _pool_id: &str,
        allocation_id: &str,
    ) -> Result<(), FabricError> {
        let mut state = self.state.lock().unwrap();
        if let Some(allocations) = state.allocations.get_mut(subnet_id) {
            allocations.retain(|a| a.id != allocation_id);
        }
        Ok(())
    }
}
