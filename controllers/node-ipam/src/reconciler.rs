//! Reconciliation logic for node subnet requests.
//!
//! Node added or updated: make sure the cluster's IPPool has a request for it.
//! Node deleted: drop its request. Pool realized: copy each node's CIDR into
//! `spec.podCIDR(s)` if the node has none yet.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::worker::NodeEvent;
use crds::IPPool;
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, Patch, PatchParams};
use kube::ResourceExt;
use paravirtual_cloud::{IPPoolManager, get_ip_pool_subnets};
use std::sync::Arc;
use tracing::{debug, info};

/// Node operations the reconciler needs from the workload cluster.
#[async_trait::async_trait]
pub trait NodeClientTrait: Send + Sync {
    async fn get_node(&self, name: &str) -> Result<Option<Node>, ControllerError>;

    /// Set `spec.podCIDR` and `spec.podCIDRs` to `cidr`
    async fn patch_pod_cidr(&self, name: &str, cidr: &str) -> Result<(), ControllerError>;
}

#[async_trait::async_trait]
impl NodeClientTrait for Api<Node> {
    async fn get_node(&self, name: &str) -> Result<Option<Node>, ControllerError> {
        Ok(self.get_opt(name).await?)
    }

    async fn patch_pod_cidr(&self, name: &str, cidr: &str) -> Result<(), ControllerError> {
        let patch = serde_json::json!({
            "spec": {
                "podCIDR": cidr,
                "podCIDRs": [cidr],
            }
        });
        self.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

fn node_pod_cidr_set(node: &Node) -> bool {
    node.spec.as_ref().is_some_and(|spec| {
        spec.pod_cidr.as_deref().is_some_and(|cidr| !cidr.is_empty())
            || spec.pod_cidrs.as_ref().is_some_and(|cidrs| !cidrs.is_empty())
    })
}

/// Reconciles node subnet requests.
pub struct Reconciler {
    manager: IPPoolManager,
    nodes: Arc<dyn NodeClientTrait>,
    namespace: String,
    cluster_name: String,
    owner_ref: OwnerReference,
}

impl Reconciler {
    pub fn new(config: &ControllerConfig, manager: IPPoolManager, nodes: Arc<dyn NodeClientTrait>) -> Self {
        Self {
            manager,
            nodes,
            namespace: config.namespace().to_string(),
            cluster_name: config.cluster_name.clone(),
            owner_ref: config.owner_reference(),
        }
    }

    pub async fn handle(&self, event: &NodeEvent) -> Result<(), ControllerError> {
        match event {
            NodeEvent::Upsert(node) => self.reconcile_node(node).await,
            NodeEvent::Remove(name) => self.reconcile_node_removal(name).await,
            NodeEvent::PoolChanged(pool) => self.reconcile_realized_subnets(pool).await,
        }
    }

    /// Pool to add `node_name`'s request to.
    ///
    /// A cached pool that lacks the request is safe to write from, since a
    /// stale copy fails the version check and is re-read. A cached pool that
    /// already has the request may predate its removal, so it is read live.
    async fn pool_for_node(&self, node_name: &str) -> Result<IPPool, ControllerError> {
        let key = format!("{}/{}", self.namespace, paravirtual_cloud::ip_pool_name(&self.cluster_name));
        match self.manager.get_ip_pool_from_cache(&key)? {
            Some(pool) if !pool.has_subnet_request(node_name) => return Ok(pool),
            Some(_) => debug!("Cached IPPool already lists {}, reading it live", node_name),
            None => {}
        }
        Ok(self
            .manager
            .get_or_create_ip_pool(&self.namespace, &self.cluster_name, &self.owner_ref)
            .await?)
    }

    /// Ensure the node has a subnet request.
    pub async fn reconcile_node(&self, node: &Node) -> Result<(), ControllerError> {
        let name = node.name_any();
        debug!("Reconciling Node {}", name);

        let pool = self.pool_for_node(&name).await?;
        if self
            .manager
            .add_subnet_to_ip_pool(node, &pool, &self.owner_ref)
            .await?
            .is_none()
        {
            debug!("Node {} needs no IPPool change", name);
        }
        Ok(())
    }

    /// Drop the node's subnet request, if the pool has one.
    pub async fn reconcile_node_removal(&self, name: &str) -> Result<(), ControllerError> {
        let pool = match self.manager.get_ip_pool(&self.namespace, &self.cluster_name).await {
            Ok(pool) => pool,
            Err(paravirtual_cloud::IPPoolError::Client(e)) if e.is_not_found() => {
                debug!("No IPPool for cluster {}, nothing to remove for {}", self.cluster_name, name);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if !pool.has_subnet_request(name) {
            debug!("IPPool has no subnet request for {}", name);
            return Ok(());
        }
        self.manager.delete_subnet_from_ip_pool(name, &pool).await?;
        Ok(())
    }

    /// Assign realized CIDRs to nodes that have none.
    pub async fn reconcile_realized_subnets(&self, pool: &IPPool) -> Result<(), ControllerError> {
        for (name, cidr) in get_ip_pool_subnets(pool) {
            if cidr.is_empty() {
                continue;
            }
            let Some(node) = self.nodes.get_node(&name).await? else {
                debug!("Realized subnet {} has no node", name);
                continue;
            };
            if node_pod_cidr_set(&node) {
                debug!("Node {} already has a pod CIDR", name);
                continue;
            }

            self.nodes.patch_pod_cidr(&name, &cidr).await?;
            info!("Assigned pod CIDR {} to Node {}", cidr, name);
        }
        Ok(())
    }
}
