//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the watchers, the
//! IPPool cache and the single worker together for the Node IPAM Controller.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;
use crate::worker::Worker;
use crds::IPPool;
use k8s_openapi::api::core::v1::Node;
use kube::{Api, Client};
use kube_runtime::watcher;
use paravirtual_client::SupervisorClient;
use paravirtual_cloud::{CacheError, IPPoolManager, watch_cache};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

/// Main controller for node subnet management.
pub struct Controller {
    node_watcher: JoinHandle<Result<(), ControllerError>>,
    ip_pool_watcher: JoinHandle<Result<(), ControllerError>>,
    ip_pool_cache: JoinHandle<Result<(), CacheError>>,
    worker: JoinHandle<()>,
    cache_shutdown: oneshot::Sender<()>,
}

impl Controller {
    /// Creates a new controller instance and starts its background tasks.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Node IPAM Controller");

        // Workload cluster for Nodes, supervisor for IPPools
        let kube_client = Client::try_default().await?;
        let supervisor =
            SupervisorClient::from_kubeconfig(config.provider.supervisor_kubeconfig.as_deref()).await?;

        let node_api: Api<Node> = Api::all(kube_client);
        let pool_api: Api<IPPool> = Api::namespaced(supervisor.kube_client(), config.namespace());

        let (pool_cache, pool_cache_runner) = watch_cache(
            pool_api.clone(),
            watcher::Config::default().fields(&format!("metadata.name={}", config.pool_name())),
        );
        let (cache_shutdown, cache_shutdown_rx) = oneshot::channel::<()>();
        let ip_pool_cache = tokio::spawn(pool_cache_runner.run(async move {
            let _ = cache_shutdown_rx.await;
        }));

        let manager = IPPoolManager::new(Arc::new(supervisor)).with_cache(pool_cache);
        info!("Waiting for IPPool cache to sync");
        manager.wait_for_cache_sync().await?;

        let reconciler = Arc::new(Reconciler::new(&config, manager, Arc::new(node_api.clone())));

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(Worker::new(reconciler, events_rx).run());

        let node_watcher_instance = Watcher::new(events_tx.clone());
        let node_watcher = tokio::spawn(async move { node_watcher_instance.watch_nodes(node_api).await });

        let pool_name = config.pool_name();
        let ip_pool_watcher_instance = Watcher::new(events_tx);
        let ip_pool_watcher = tokio::spawn(async move {
            ip_pool_watcher_instance.watch_ip_pools(pool_api, &pool_name).await
        });

        Ok(Self {
            node_watcher,
            ip_pool_watcher,
            ip_pool_cache,
            worker,
            cache_shutdown,
        })
    }

    /// Runs the controller until a watcher exits or the process is interrupted.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Node IPAM Controller running");

        let result = tokio::select! {
            result = &mut self.node_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("Node watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("Node watcher error: {}", e)))
            }
            result = &mut self.ip_pool_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("IPPool watcher panicked: {}", e)))?
                    .map_err(|e| ControllerError::Watch(format!("IPPool watcher error: {}", e)))
            }
            result = &mut self.ip_pool_cache => {
                result.map_err(|e| ControllerError::Watch(format!("IPPool cache panicked: {}", e)))?
                    .map_err(ControllerError::from)
            }
            _ = &mut self.worker => {
                Err(ControllerError::Watch("worker exited".to_string()))
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received interrupt, shutting down");
                Ok(())
            }
        };

        let _ = self.cache_shutdown.send(());
        self.node_watcher.abort();
        self.ip_pool_watcher.abort();
        self.worker.abort();
        result
    }
}
