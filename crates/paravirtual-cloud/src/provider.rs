//! Paravirtual cloud provider facade.

use crate::cache::{CacheRunner, WatchCache, watch_cache};
use crate::config::ProviderConfig;
use crate::error::{CacheError, CloudProviderError};
use crate::instances::Instances;
use crate::resolver::VmResolver;
use crate::zones::Zones;
use crds::VirtualMachine;
use kube::api::Api;
use kube::runtime::watcher;
use paravirtual_client::{SupervisorClient, VirtualMachineClientTrait};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

pub const PROVIDER_NAME: &str = "vsphere-paravirtual";

pub struct ParavirtualCloud {
    namespace: String,
    vm_cache: Option<WatchCache<VirtualMachine>>,
    vm_cache_runner: Option<CacheRunner<VirtualMachine>>,
    instances: Instances,
    zones: Zones,
}

impl ParavirtualCloud {
    /// Connect to the supervisor described by `config` and set up the VM cache.
    /// Call `start` to begin watching.
    pub async fn new(config: &ProviderConfig) -> Result<Self, CloudProviderError> {
        let client = SupervisorClient::from_kubeconfig(config.supervisor_kubeconfig.as_deref()).await?;
        let api: Api<VirtualMachine> = Api::namespaced(client.kube_client(), &config.supervisor_namespace);
        let (cache, runner) = watch_cache(api, watcher::Config::default());

        let mut cloud = Self::with_client(&config.supervisor_namespace, Arc::new(client), Some(cache));
        cloud.vm_cache_runner = Some(runner);
        Ok(cloud)
    }

    /// Build from an existing client and optional cache, without a watch.
    pub fn with_client(
        namespace: &str,
        client: Arc<dyn VirtualMachineClientTrait>,
        vm_cache: Option<WatchCache<VirtualMachine>>,
    ) -> Self {
        let resolver = VmResolver::new(namespace, client, vm_cache.clone());
        Self {
            namespace: namespace.to_string(),
            vm_cache,
            vm_cache_runner: None,
            instances: Instances::new(resolver.clone()),
            zones: Zones::new(resolver),
        }
    }

    /// Spawn the VM watch; it stops when `shutdown` resolves.
    ///
    /// Returns `None` if there is no watch to run or it was already started.
    pub fn start<F>(&mut self, shutdown: F) -> Option<JoinHandle<Result<(), CacheError>>>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let runner = self.vm_cache_runner.take()?;
        info!("Starting VirtualMachine watch in supervisor namespace {}", self.namespace);
        Some(tokio::spawn(runner.run(shutdown)))
    }

    /// Block until the VM cache has synced. Returns immediately without a cache.
    pub async fn wait_for_cache_sync(&self) -> Result<(), CacheError> {
        match &self.vm_cache {
            Some(cache) => cache.wait_for_sync().await,
            None => Ok(()),
        }
    }

    pub fn instances(&self) -> &Instances {
        &self.instances
    }

    pub fn zones(&self) -> &Zones {
        &self.zones
    }

    pub fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }

    pub fn has_cluster_id(&self) -> bool {
        true
    }
}
