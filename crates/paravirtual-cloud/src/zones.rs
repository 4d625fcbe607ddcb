//! Zones
//!
//! The failure domain of a node is the zone label on its VirtualMachine.
//! Region is not modelled by the supervisor and is always empty.

use crate::error::CloudProviderError;
use crate::resolver::VmResolver;
use crds::VirtualMachine;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zone {
    pub failure_domain: String,
    pub region: String,
}

impl Zone {
    fn for_vm(vm: &VirtualMachine) -> Self {
        Self {
            failure_domain: vm.zone().unwrap_or_default().to_string(),
            region: String::new(),
        }
    }
}

#[derive(Clone)]
pub struct Zones {
    resolver: VmResolver,
}

impl Zones {
    pub fn new(resolver: VmResolver) -> Self {
        Self { resolver }
    }

    /// Zone of the machine this process runs on; not answerable from the
    /// supervisor.
    pub async fn get_zone(&self) -> Result<Zone, CloudProviderError> {
        Err(CloudProviderError::NotImplemented("GetZone"))
    }

    pub async fn get_zone_by_provider_id(&self, provider_id: &str) -> Result<Zone, CloudProviderError> {
        let vm = self.resolver.resolve_by_provider_id(provider_id).await?;
        let zone = Zone::for_vm(&vm);
        debug!("Zone for {}: {:?}", provider_id, zone);
        Ok(zone)
    }

    pub async fn get_zone_by_node_name(&self, node_name: &str) -> Result<Zone, CloudProviderError> {
        let vm = self
            .resolver
            .resolve_by_node_name(node_name)
            .await
            .map_err(CloudProviderError::fold_empty_bios_uuid)?;
        let zone = Zone::for_vm(&vm);
        debug!("Zone for node {}: {:?}", node_name, zone);
        Ok(zone)
    }
}
