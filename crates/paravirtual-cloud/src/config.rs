//! Provider configuration from the process environment.

use crate::error::CloudProviderError;
use std::env;

pub const ENV_SUPERVISOR_NAMESPACE: &str = "SUPERVISOR_NAMESPACE";
pub const ENV_SUPERVISOR_KUBECONFIG: &str = "SUPERVISOR_KUBECONFIG";

/// Where the supervisor resources live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Namespace holding the cluster's VirtualMachines and IPPool
    pub supervisor_namespace: String,
    /// Kubeconfig for the supervisor; in-cluster/default config when `None`
    pub supervisor_kubeconfig: Option<String>,
}

impl ProviderConfig {
    pub fn from_env() -> Result<Self, CloudProviderError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parse from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CloudProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let supervisor_namespace = get(ENV_SUPERVISOR_NAMESPACE).ok_or_else(|| {
            CloudProviderError::InvalidConfig(format!(
                "{} environment variable is required",
                ENV_SUPERVISOR_NAMESPACE
            ))
        })?;

        Ok(Self {
            supervisor_namespace,
            supervisor_kubeconfig: get(ENV_SUPERVISOR_KUBECONFIG),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_namespace_required() {
        let err = ProviderConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, CloudProviderError::InvalidConfig(_)));

        let err = ProviderConfig::from_lookup(lookup(&[(ENV_SUPERVISOR_NAMESPACE, "")])).unwrap_err();
        assert!(matches!(err, CloudProviderError::InvalidConfig(_)));
    }

    #[test]
    fn test_kubeconfig_optional() {
        let config = ProviderConfig::from_lookup(lookup(&[(ENV_SUPERVISOR_NAMESPACE, "ns1")])).unwrap();
        assert_eq!(config.supervisor_namespace, "ns1");
        assert_eq!(config.supervisor_kubeconfig, None);

        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_SUPERVISOR_NAMESPACE, "ns1"),
            (ENV_SUPERVISOR_KUBECONFIG, "/etc/supervisor/kubeconfig"),
        ]))
        .unwrap();
        assert_eq!(
            config.supervisor_kubeconfig.as_deref(),
            Some("/etc/supervisor/kubeconfig")
        );
    }
}
