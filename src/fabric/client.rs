// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fabric API client.
//!
//! [`FabricApi`] is the narrow command interface the rest of the crate is
//! written against: hierarchical patch, subnet get/list, realization list,
//! pool usage, and IP allocation list/delete. [`HttpFabricClient`] is the
//! production implementation; tests substitute an in-memory one.

use crate::config::OperatorConfig;
use crate::fabric::model::{
    FabricSubnet, IpAllocation, IpPool, ListResult, OrgRoot, PoolUsage, RealizedEntity, VpcLocator,
};
use crate::fabric_errors::FabricError;
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

/// Narrow command interface to the fabric.
///
/// Every call can fail with a transient error (retried upstream via the
/// controller's backoff) or a terminal policy/restriction error (no retry).
#[async_trait]
pub trait FabricApi: Send + Sync {
    /// Apply a hierarchical patch at the org root. One call atomically
    /// creates, updates, or deletes the subnet together with its parents.
    async fn patch_org_root(
        &self,
        org_root: &OrgRoot,
        enforce_revision_check: bool,
    ) -> Result<(), FabricError>;

    /// Fetch a single subnet, including fabric-rendered fields.
    async fn get_subnet(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
    ) -> Result<FabricSubnet, FabricError>;

    /// List every subnet under the VPC.
    async fn list_subnets(&self, locator: &VpcLocator) -> Result<Vec<FabricSubnet>, FabricError>;

    /// List realization entries for an intent path.
    async fn list_realized_entities(
        &self,
        locator: &VpcLocator,
        intent_path: &str,
    ) -> Result<Vec<RealizedEntity>, FabricError>;

    /// Read the usage counters of a subnet's static IP pool.
    async fn get_pool_usage(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
        pool_id: &str,
    ) -> Result<PoolUsage, FabricError>;

    /// List the address leases held under a subnet's pool.
    async fn list_ip_allocations(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
        pool_id: &str,
    ) -> Result<Vec<IpAllocation>, FabricError>;

    /// Release one address lease.
    async fn delete_ip_allocation(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
        pool_id: &str,
        allocation_id: &str,
    ) -> Result<(), FabricError>;
}

/// HTTPS implementation of [`FabricApi`].
#[derive(Clone)]
pub struct HttpFabricClient {
    base_url: String,
    http: reqwest::Client,
    credentials: Option<(String, String)>,
    request_timeout_ms: u64,
}

impl HttpFabricClient {
    /// Build a client from operator configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FabricError::ConnectionFailed`] when the underlying HTTP
    /// client cannot be constructed.
    pub fn new(config: &OperatorConfig) -> Result<Self, FabricError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.fabric_request_timeout_secs,
            ))
            .build()
            .map_err(|e| FabricError::ConnectionFailed {
                endpoint: config.fabric_endpoint.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            base_url: config.fabric_endpoint.trim_end_matches('/').to_string(),
            http,
            credentials: config.fabric_credentials(),
            request_timeout_ms: config.fabric_request_timeout_secs * 1000,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn subnets_url(&self, locator: &VpcLocator) -> String {
        self.url(&format!(
            "/api/v1/orgs/{}/projects/{}/vpcs/{}/subnets",
            locator.org, locator.project, locator.vpc
        ))
    }

    fn pool_url(&self, locator: &VpcLocator, subnet_id: &str, pool_id: &str) -> String {
        format!(
            "{}/{subnet_id}/ip-pools/{pool_id}",
            self.subnets_url(locator)
        )
    }

    /// Send a request and map transport/status failures onto the error
    /// taxonomy. 403 responses become terminal restriction errors; every
    /// other non-2xx becomes an API error classified by status code.
    async fn execute(
        &self,
        endpoint: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, FabricError> {
        let builder = match &self.credentials {
            Some((user, pass)) => builder.basic_auth(user, Some(pass)),
            None => builder,
        };

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                FabricError::RequestTimeout {
                    endpoint: endpoint.to_string(),
                    timeout_ms: self.request_timeout_ms,
                }
            } else {
                FabricError::ConnectionFailed {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        if status == StatusCode::FORBIDDEN {
            Err(FabricError::Restriction { message })
        } else {
            Err(FabricError::Api {
                status_code: status.as_u16(),
                message,
            })
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, FabricError> {
        response.json().await.map_err(|e| FabricError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl FabricApi for HttpFabricClient {
    async fn patch_org_root(
        &self,
        org_root: &OrgRoot,
        enforce_revision_check: bool,
    ) -> Result<(), FabricError> {
        let endpoint = self.url("/api/v1/org-root");
        debug!(endpoint = %endpoint, "patching org root");
        self.execute(
            &endpoint,
            self.http
                .patch(&endpoint)
                .query(&[("enforce_revision_check", enforce_revision_check)])
                .json(org_root),
        )
        .await?;
        Ok(())
    }

    async fn get_subnet(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
    ) -> Result<FabricSubnet, FabricError> {
        let endpoint = format!("{}/{subnet_id}", self.subnets_url(locator));
        let response = self.execute(&endpoint, self.http.get(&endpoint)).await?;
        Self::decode(&endpoint, response).await
    }

    async fn list_subnets(&self, locator: &VpcLocator) -> Result<Vec<FabricSubnet>, FabricError> {
        let endpoint = self.subnets_url(locator);
        let response = self.execute(&endpoint, self.http.get(&endpoint)).await?;
        let list: ListResult<FabricSubnet> = Self::decode(&endpoint, response).await?;
        Ok(list.results)
    }

    async fn list_realized_entities(
        &self,
        locator: &VpcLocator,
        intent_path: &str,
    ) -> Result<Vec<RealizedEntity>, FabricError> {
        let endpoint = self.url(&format!(
            "/api/v1/orgs/{}/projects/{}/realized-state/entities",
            locator.org, locator.project
        ));
        let response = self
            .execute(
                &endpoint,
                self.http
                    .get(&endpoint)
                    .query(&[("intent_path", intent_path)]),
            )
            .await?;
        let list: ListResult<RealizedEntity> = Self::decode(&endpoint, response).await?;
        Ok(list.results)
    }

    async fn get_pool_usage(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
        pool_id: &str,
    ) -> Result<PoolUsage, FabricError> {
        let endpoint = self.pool_url(locator, subnet_id, pool_id);
        let response = self.execute(&endpoint, self.http.get(&endpoint)).await?;
        let pool: IpPool = Self::decode(&endpoint, response).await?;
        pool.pool_usage.ok_or_else(|| FabricError::Decode {
            endpoint,
            reason: "ip-pool response is missing pool_usage".to_string(),
        })
    }

    async fn list_ip_allocations(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
        pool_id: &str,
    ) -> Result<Vec<IpAllocation>, FabricError> {
        let endpoint = format!(
            "{}/ip-allocations",
            self.pool_url(locator, subnet_id, pool_id)
        );
        let response = self.execute(&endpoint, self.http.get(&endpoint)).await?;
        let list: ListResult<IpAllocation> = Self::decode(&endpoint, response).await?;
        Ok(list.results)
    }

    async fn delete_ip_allocation(
        &self,
        locator: &VpcLocator,
        subnet_id: &str,
        pool_id: &str,
        allocation_id: &str,
    ) -> Result<(), FabricError> {
        let endpoint = format!(
            "{}/ip-allocations/{allocation_id}",
            self.pool_url(locator, subnet_id, pool_id)
        );
        self.execute(&endpoint, self.http.delete(&endpoint)).await?;
        Ok(())
    }
}
