//! Instances
//!
//! Node lifecycle facts derived from the backing VirtualMachine: existence,
//! instance ID, shutdown state and addresses.

use crate::error::CloudProviderError;
use crate::resolver::VmResolver;
use crds::{PowerState, VirtualMachine};
use k8s_openapi::api::core::v1::NodeAddress;
use tracing::debug;

pub const ADDRESS_TYPE_INTERNAL_IP: &str = "InternalIP";
pub const ADDRESS_TYPE_HOSTNAME: &str = "Hostname";

/// Instance queries for the paravirtual provider.
#[derive(Clone)]
pub struct Instances {
    resolver: VmResolver,
}

/// InternalIP from `primaryIP4`, then a Hostname slot whenever a host is set.
/// The Hostname address is always empty.
fn node_addresses_for(vm: &VirtualMachine) -> Vec<NodeAddress> {
    let mut addresses = Vec::new();
    let Some(status) = vm.status.as_ref() else {
        return addresses;
    };

    if let Some(network) = status.network.as_ref()
        && !network.primary_ip4.is_empty()
    {
        addresses.push(NodeAddress {
            type_: ADDRESS_TYPE_INTERNAL_IP.to_string(),
            address: network.primary_ip4.clone(),
        });
    }
    if !status.host.is_empty() {
        addresses.push(NodeAddress {
            type_: ADDRESS_TYPE_HOSTNAME.to_string(),
            address: String::new(),
        });
    }
    addresses
}

impl Instances {
    pub fn new(resolver: VmResolver) -> Self {
        Self { resolver }
    }

    pub async fn node_addresses(&self, node_name: &str) -> Result<Vec<NodeAddress>, CloudProviderError> {
        let vm = self
            .resolver
            .resolve_by_node_name(node_name)
            .await
            .map_err(CloudProviderError::fold_empty_bios_uuid)?;
        Ok(node_addresses_for(&vm))
    }

    pub async fn node_addresses_by_provider_id(&self, provider_id: &str) -> Result<Vec<NodeAddress>, CloudProviderError> {
        let vm = self.resolver.resolve_by_provider_id(provider_id).await?;
        Ok(node_addresses_for(&vm))
    }

    /// BIOS UUID of the VM backing `node_name`. The only query that reports
    /// an unprovisioned VM as `EmptyBiosUuid` rather than `InstanceNotFound`.
    pub async fn instance_id(&self, node_name: &str) -> Result<String, CloudProviderError> {
        let vm = self.resolver.resolve_by_node_name(node_name).await?;
        Ok(vm.bios_uuid().to_string())
    }

    /// The paravirtual provider has no instance types.
    pub async fn instance_type(&self, _node_name: &str) -> Result<String, CloudProviderError> {
        Ok(String::new())
    }

    pub async fn instance_type_by_provider_id(&self, _provider_id: &str) -> Result<String, CloudProviderError> {
        Ok(String::new())
    }

    /// Node names are VM names.
    pub fn current_node_name(&self, hostname: &str) -> String {
        hostname.to_string()
    }

    /// Whether a provisioned VM backs `provider_id`. Not-found is `Ok(false)`;
    /// upstream failures and malformed IDs are errors.
    pub async fn instance_exists_by_provider_id(&self, provider_id: &str) -> Result<bool, CloudProviderError> {
        match self.resolver.resolve_by_provider_id(provider_id).await {
            Ok(_) => Ok(true),
            Err(CloudProviderError::InstanceNotFound | CloudProviderError::EmptyBiosUuid(_)) => {
                debug!("Instance {} does not exist", provider_id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// By-name counterpart of `instance_exists_by_provider_id`.
    pub async fn instance_exists(&self, node_name: &str) -> Result<bool, CloudProviderError> {
        match self.resolver.resolve_by_node_name(node_name).await {
            Ok(_) => Ok(true),
            Err(CloudProviderError::InstanceNotFound | CloudProviderError::EmptyBiosUuid(_)) => {
                debug!("Instance for node {} does not exist", node_name);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the VM is powered off. A missing VM is an error, not `false`.
    pub async fn instance_shutdown_by_provider_id(&self, provider_id: &str) -> Result<bool, CloudProviderError> {
        let vm = self.resolver.resolve_by_provider_id(provider_id).await?;
        Ok(vm.power_state() == PowerState::PoweredOff)
    }
}
