//! VM identity resolution
//!
//! Maps a node name or provider ID to the VirtualMachine backing it. The
//! watch cache is consulted first when it has synced; the supervisor API is
//! only read on a cache miss.

use crate::cache::WatchCache;
use crate::error::CloudProviderError;
use crate::provider_id::ProviderId;
use crds::VirtualMachine;
use paravirtual_client::VirtualMachineClientTrait;
use std::sync::Arc;
use tracing::debug;

/// Resolves node identities to VirtualMachines in one supervisor namespace.
#[derive(Clone)]
pub struct VmResolver {
    namespace: String,
    client: Arc<dyn VirtualMachineClientTrait>,
    cache: Option<WatchCache<VirtualMachine>>,
}

impl VmResolver {
    pub fn new(
        namespace: impl Into<String>,
        client: Arc<dyn VirtualMachineClientTrait>,
        cache: Option<WatchCache<VirtualMachine>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            client,
            cache,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn synced_cache(&self) -> Option<&WatchCache<VirtualMachine>> {
        self.cache.as_ref().filter(|cache| cache.has_synced())
    }

    /// Resolve by node name (== VM name).
    ///
    /// Fails with `InstanceNotFound` when no VM has that name and with
    /// `EmptyBiosUuid` when the VM exists but is not provisioned yet.
    pub async fn resolve_by_node_name(&self, node_name: &str) -> Result<VirtualMachine, CloudProviderError> {
        // An unprovisioned cached VM may be stale, so it is re-read live
        let cached = self
            .synced_cache()
            .and_then(|cache| cache.get_namespaced(&self.namespace, node_name))
            .filter(|vm| !vm.bios_uuid().is_empty());

        let vm = match cached {
            Some(vm) => (*vm).clone(),
            None => {
                debug!("VM {}/{} not cached or unprovisioned, reading from supervisor", self.namespace, node_name);
                match self.client.get_virtual_machine(&self.namespace, node_name).await {
                    Ok(vm) => vm,
                    Err(e) if e.is_not_found() => {
                        debug!("VM {}/{} not found", self.namespace, node_name);
                        return Err(CloudProviderError::InstanceNotFound);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        if vm.bios_uuid().is_empty() {
            debug!("VM {}/{} has no BIOS UUID yet", self.namespace, node_name);
            return Err(CloudProviderError::EmptyBiosUuid(node_name.to_string()));
        }
        Ok(vm)
    }

    /// Resolve by provider ID, matching the UUID against `status.biosUUID`.
    ///
    /// A malformed provider ID is `InvalidProviderId`; no matching VM is
    /// `InstanceNotFound`.
    pub async fn resolve_by_provider_id(&self, provider_id: &str) -> Result<VirtualMachine, CloudProviderError> {
        let provider_id = ProviderId::parse(provider_id)?;
        let uuid = provider_id.bios_uuid();

        if let Some(cache) = self.synced_cache() {
            let hit = cache
                .list_namespaced(&self.namespace)
                .into_iter()
                .find(|vm| vm.bios_uuid() == uuid);
            if let Some(vm) = hit {
                return Ok((*vm).clone());
            }
            debug!("No cached VM in {} with BIOS UUID {}, listing from supervisor", self.namespace, uuid);
        }

        let vms = self.client.list_virtual_machines(&self.namespace, None).await?;
        match vms.into_iter().find(|vm| vm.bios_uuid() == uuid) {
            Some(vm) => Ok(vm),
            None => {
                debug!("No VM in {} with BIOS UUID {}", self.namespace, uuid);
                Err(CloudProviderError::InstanceNotFound)
            }
        }
    }
}
