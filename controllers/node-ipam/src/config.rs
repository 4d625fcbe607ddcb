//! Controller configuration from environment variables.

use crate::error::ControllerError;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use paravirtual_cloud::{ProviderConfig, cluster_owner_reference, ip_pool_name};
use std::env;

pub const ENV_CLUSTER_NAME: &str = "CLUSTER_NAME";
pub const ENV_CLUSTER_UID: &str = "CLUSTER_UID";
pub const ENV_CLUSTER_OWNER_API_VERSION: &str = "CLUSTER_OWNER_API_VERSION";
pub const ENV_CLUSTER_OWNER_KIND: &str = "CLUSTER_OWNER_KIND";

const DEFAULT_OWNER_API_VERSION: &str = "cluster.x-k8s.io/v1beta1";
const DEFAULT_OWNER_KIND: &str = "Cluster";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    pub provider: ProviderConfig,
    pub cluster_name: String,
    pub cluster_uid: String,
    pub owner_api_version: String,
    pub owner_kind: String,
}

impl ControllerConfig {
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                ControllerError::InvalidConfig(format!("{} environment variable is required", key))
            })
        };

        let provider = ProviderConfig::from_lookup(&lookup)
            .map_err(|e| ControllerError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            provider,
            cluster_name: required(ENV_CLUSTER_NAME)?,
            cluster_uid: required(ENV_CLUSTER_UID)?,
            owner_api_version: get(ENV_CLUSTER_OWNER_API_VERSION)
                .unwrap_or_else(|| DEFAULT_OWNER_API_VERSION.to_string()),
            owner_kind: get(ENV_CLUSTER_OWNER_KIND).unwrap_or_else(|| DEFAULT_OWNER_KIND.to_string()),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.provider.supervisor_namespace
    }

    pub fn pool_name(&self) -> String {
        ip_pool_name(&self.cluster_name)
    }

    /// Owner reference set on the pool when it is created.
    pub fn owner_reference(&self) -> OwnerReference {
        cluster_owner_reference(
            &self.owner_api_version,
            &self.owner_kind,
            &self.cluster_name,
            &self.cluster_uid,
        )
    }
}
