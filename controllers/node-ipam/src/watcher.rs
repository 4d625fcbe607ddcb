//! Kubernetes resource watchers.
//!
//! Node events come from the workload cluster, IPPool events from the
//! supervisor. Both are turned into `NodeEvent`s for the worker; nothing is
//! reconciled here.

use crate::error::ControllerError;
use crate::worker::NodeEvent;
use crds::IPPool;
use futures::TryStreamExt;
use k8s_openapi::api::core::v1::Node;
use kube::{Api, ResourceExt};
use kube_runtime::watcher;
use paravirtual_cloud::diff_ip_pool_subnets;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Map a Node watch event to a worker event.
pub fn node_event(event: watcher::Event<Node>) -> Option<NodeEvent> {
    match event {
        watcher::Event::Apply(node) | watcher::Event::InitApply(node) => Some(NodeEvent::Upsert(node)),
        watcher::Event::Delete(node) => Some(NodeEvent::Remove(node.name_any())),
        watcher::Event::Init | watcher::Event::InitDone => None,
    }
}

/// Last seen snapshot of each pool, for detecting realized-subnet changes.
#[derive(Default)]
pub struct PoolSnapshots {
    pools: HashMap<String, IPPool>,
}

impl PoolSnapshots {
    /// Record `pool` and return a `PoolChanged` event if its realized subnets
    /// differ from the previous snapshot. A first sighting counts as a change
    /// when anything is already realized.
    pub fn observe(&mut self, pool: IPPool) -> Option<NodeEvent> {
        let name = pool.name_any();
        let changed = match self.pools.get(&name) {
            Some(previous) => diff_ip_pool_subnets(previous, &pool),
            None => !pool.realized_subnets().is_empty(),
        };
        self.pools.insert(name, pool.clone());
        changed.then_some(NodeEvent::PoolChanged(pool))
    }

    pub fn forget(&mut self, name: &str) {
        self.pools.remove(name);
    }
}

/// Watches the resources that drive node subnet requests.
pub struct Watcher {
    events: UnboundedSender<NodeEvent>,
}

impl Watcher {
    pub fn new(events: UnboundedSender<NodeEvent>) -> Self {
        Self { events }
    }

    fn send(&self, event: NodeEvent) -> Result<(), ControllerError> {
        self.events
            .send(event)
            .map_err(|_| ControllerError::Watch("worker queue closed".to_string()))
    }

    /// Starts watching Nodes in the workload cluster.
    pub async fn watch_nodes(&self, node_api: Api<Node>) -> Result<(), ControllerError> {
        info!("Starting Node watcher");

        let mut stream = Box::pin(watcher(node_api, watcher::Config::default()));

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("Node watcher stream error: {}", e)))?
        {
            match &event {
                watcher::Event::Init => info!("Node watcher initialized"),
                watcher::Event::InitDone => info!("Node watcher initialization complete"),
                watcher::Event::Delete(node) => info!("Node deleted: {}", node.name_any()),
                watcher::Event::Apply(node) | watcher::Event::InitApply(node) => {
                    debug!("Node applied: {}", node.name_any())
                }
            }
            if let Some(event) = node_event(event) {
                self.send(event)?;
            }
        }

        Ok(())
    }

    /// Starts watching the cluster's IPPool in the supervisor namespace.
    pub async fn watch_ip_pools(&self, pool_api: Api<IPPool>, pool_name: &str) -> Result<(), ControllerError> {
        info!("Starting IPPool watcher for {}", pool_name);

        let config = watcher::Config::default().fields(&format!("metadata.name={}", pool_name));
        let mut stream = Box::pin(watcher(pool_api, config));
        let mut snapshots = PoolSnapshots::default();

        while let Some(event) = stream
            .try_next()
            .await
            .map_err(|e| ControllerError::Watch(format!("IPPool watcher stream error: {}", e)))?
        {
            match event {
                watcher::Event::Apply(pool) | watcher::Event::InitApply(pool) => {
                    debug!("IPPool applied: {}", pool.name_any());
                    if let Some(event) = snapshots.observe(pool) {
                        info!("Realized subnets changed in IPPool {}", pool_name);
                        self.send(event)?;
                    }
                }
                watcher::Event::Delete(pool) => {
                    warn!("IPPool deleted: {}", pool.name_any());
                    snapshots.forget(&pool.name_any());
                }
                watcher::Event::Init => debug!("IPPool watcher initialized"),
                watcher::Event::InitDone => debug!("IPPool watcher initialization complete"),
            }
        }

        Ok(())
    }
}
