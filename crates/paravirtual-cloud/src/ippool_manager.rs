//! IPPool manager
//!
//! Keeps exactly one subnet request per node in the cluster's IPPool. The
//! NSX allocator realizes requests into `status.subnets` asynchronously.
//!
//! Writes are read-modify-write on a copy of the pool. A `Conflict` from the
//! API server means another writer got in first: the pool is re-read, the
//! same idempotent mutation is re-applied and the write retried, up to
//! `MAX_UPDATE_ATTEMPTS` times.

use crate::cache::WatchCache;
use crate::error::{CacheError, IPPoolError};
use crds::{IPPool, IPPoolSpec, SubnetRequest};
use k8s_openapi::api::core::v1::Node;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::ResourceExt;
use paravirtual_client::IPPoolClientTrait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Suffix appended to the cluster name to form the pool name.
pub const IPPOOL_NAME_SUFFIX: &str = "-ippool";

/// Attempts per write before giving up on conflicts.
pub const MAX_UPDATE_ATTEMPTS: u32 = 3;

/// Name of the IPPool owned by `cluster_name`.
pub fn ip_pool_name(cluster_name: &str) -> String {
    format!("{}{}", cluster_name, IPPOOL_NAME_SUFFIX)
}

/// Owner reference linking a pool to its cluster object.
pub fn cluster_owner_reference(api_version: &str, kind: &str, name: &str, uid: &str) -> OwnerReference {
    OwnerReference {
        api_version: api_version.to_string(),
        kind: kind.to_string(),
        name: name.to_string(),
        uid: uid.to_string(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

/// Realized subnets of `pool`, keyed by subnet (node) name.
pub fn get_ip_pool_subnets(pool: &IPPool) -> BTreeMap<String, String> {
    pool.realized_subnets()
        .iter()
        .map(|subnet| (subnet.name.clone(), subnet.cidr.clone()))
        .collect()
}

/// Whether the realized subnets differ between two snapshots.
///
/// Order-sensitive: the same subnets in a different order count as a change.
pub fn diff_ip_pool_subnets(old: &IPPool, current: &IPPool) -> bool {
    old.realized_subnets() != current.realized_subnets()
}

/// Whether the node already has pod-network allocation.
fn node_has_pod_cidr(node: &Node) -> bool {
    node.spec.as_ref().is_some_and(|spec| {
        spec.pod_cidr.as_deref().is_some_and(|cidr| !cidr.is_empty())
            || spec.pod_cidrs.as_ref().is_some_and(|cidrs| !cidrs.is_empty())
    })
}

/// Add a request for `node_name` unless one exists. Returns whether the pool changed.
fn apply_add_subnet(pool: &mut IPPool, node_name: &str, has_pod_cidr: bool, owner_ref: &OwnerReference) -> bool {
    if pool.has_subnet_request(node_name) {
        return false;
    }

    let mut changed = false;
    if !has_pod_cidr {
        pool.spec.subnets.push(SubnetRequest::for_node(node_name));
        changed = true;
    }
    if pool.owner_references().is_empty() {
        pool.owner_references_mut().push(owner_ref.clone());
        changed = true;
    }
    changed
}

fn apply_delete_subnet(pool: &mut IPPool, subnet_name: &str) {
    pool.spec.subnets.retain(|subnet| subnet.name != subnet_name);
}

/// Manages node subnet requests in IPPools.
#[derive(Clone)]
pub struct IPPoolManager {
    client: Arc<dyn IPPoolClientTrait>,
    cache: Option<WatchCache<IPPool>>,
}

impl IPPoolManager {
    pub fn new(client: Arc<dyn IPPoolClientTrait>) -> Self {
        Self { client, cache: None }
    }

    /// Serve `get_ip_pool_from_cache` from `cache`.
    pub fn with_cache(mut self, cache: WatchCache<IPPool>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Whether the pool cache has synced. Always true without a cache.
    pub fn has_synced(&self) -> bool {
        self.cache.as_ref().is_none_or(|cache| cache.has_synced())
    }

    /// Block until the pool cache has synced.
    pub async fn wait_for_cache_sync(&self) -> Result<(), CacheError> {
        match &self.cache {
            Some(cache) => cache.wait_for_sync().await,
            None => Ok(()),
        }
    }

    /// Look up a pool by `namespace/name` key in the cache.
    ///
    /// `Ok(None)` when the key is not cached or no cache is configured.
    pub fn get_ip_pool_from_cache(&self, key: &str) -> Result<Option<IPPool>, IPPoolError> {
        let (namespace, name) = key
            .split_once('/')
            .filter(|(namespace, name)| !namespace.is_empty() && !name.is_empty() && !name.contains('/'))
            .ok_or_else(|| IPPoolError::InvalidKey(key.to_string()))?;

        Ok(self
            .cache
            .as_ref()
            .and_then(|cache| cache.get_namespaced(namespace, name))
            .map(|pool| (*pool).clone()))
    }

    pub async fn get_ip_pool(&self, namespace: &str, cluster_name: &str) -> Result<IPPool, IPPoolError> {
        Ok(self.client.get_ip_pool(namespace, &ip_pool_name(cluster_name)).await?)
    }

    /// Create an empty pool for the cluster, owned by `owner_ref`.
    pub async fn create_ip_pool(
        &self,
        namespace: &str,
        cluster_name: &str,
        owner_ref: &OwnerReference,
    ) -> Result<IPPool, IPPoolError> {
        let pool = IPPool {
            metadata: ObjectMeta {
                name: Some(ip_pool_name(cluster_name)),
                namespace: Some(namespace.to_string()),
                owner_references: Some(vec![owner_ref.clone()]),
                ..Default::default()
            },
            spec: IPPoolSpec { subnets: Vec::new() },
            status: None,
        };

        let created = self.client.create_ip_pool(&pool).await?;
        info!("Created IPPool {}/{}", namespace, created.name_any());
        Ok(created)
    }

    /// Get the cluster's pool, creating it on first demand.
    pub async fn get_or_create_ip_pool(
        &self,
        namespace: &str,
        cluster_name: &str,
        owner_ref: &OwnerReference,
    ) -> Result<IPPool, IPPoolError> {
        match self.get_ip_pool(namespace, cluster_name).await {
            Ok(pool) => Ok(pool),
            Err(IPPoolError::Client(e)) if e.is_not_found() => {
                debug!("IPPool for cluster {} not found in {}, creating", cluster_name, namespace);
                match self.create_ip_pool(namespace, cluster_name, owner_ref).await {
                    Ok(pool) => Ok(pool),
                    // Lost a creation race; the winner's pool is the one to use
                    Err(IPPoolError::Client(e)) if e.is_conflict() => {
                        self.get_ip_pool(namespace, cluster_name).await
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Ensure `node` has a subnet request in `pool`.
    ///
    /// Returns `Some(written pool)` when a write happened and `None` when the
    /// pool already satisfied the request. A node that already has a pod CIDR
    /// gets no new request, but a missing owner reference is still filled in.
    pub async fn add_subnet_to_ip_pool(
        &self,
        node: &Node,
        pool: &IPPool,
        owner_ref: &OwnerReference,
    ) -> Result<Option<IPPool>, IPPoolError> {
        let node_name = node.name_any();
        let has_pod_cidr = node_has_pod_cidr(node);
        if has_pod_cidr {
            debug!("Node {} already has a pod CIDR, not requesting a subnet", node_name);
        }

        let (written, changed) = self
            .update_with_retry(pool, |pool| apply_add_subnet(pool, &node_name, has_pod_cidr, owner_ref))
            .await?;

        if changed {
            info!("Added subnet request for node {} to IPPool {}", node_name, written.name_any());
            Ok(Some(written))
        } else {
            Ok(None)
        }
    }

    /// Remove the request named `subnet_name` from `pool`. Always writes.
    pub async fn delete_subnet_from_ip_pool(&self, subnet_name: &str, pool: &IPPool) -> Result<IPPool, IPPoolError> {
        let (written, _) = self
            .update_with_retry(pool, |pool| {
                apply_delete_subnet(pool, subnet_name);
                true
            })
            .await?;

        info!("Removed subnet request {} from IPPool {}", subnet_name, written.name_any());
        Ok(written)
    }

    /// Apply `mutate` to a copy of `pool` and write it when it reports a change,
    /// re-reading and re-applying on conflict.
    ///
    /// Returns the latest pool and whether it was written.
    async fn update_with_retry<F>(&self, pool: &IPPool, mut mutate: F) -> Result<(IPPool, bool), IPPoolError>
    where
        F: FnMut(&mut IPPool) -> bool,
    {
        let namespace = pool
            .namespace()
            .ok_or_else(|| IPPoolError::MissingMetadata("IPPool has no namespace".to_string()))?;
        let name = pool
            .metadata
            .name
            .clone()
            .ok_or_else(|| IPPoolError::MissingMetadata("IPPool has no name".to_string()))?;

        let mut current = pool.clone();
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            if !mutate(&mut current) {
                return Ok((current, false));
            }

            match self.client.update_ip_pool(&current).await {
                Ok(written) => return Ok((written, true)),
                Err(e) if e.is_conflict() && attempt < MAX_UPDATE_ATTEMPTS => {
                    warn!(
                        "Conflict updating IPPool {}/{} (attempt {}/{}), re-reading",
                        namespace, name, attempt, MAX_UPDATE_ATTEMPTS
                    );
                    current = self.client.get_ip_pool(&namespace, &name).await?;
                }
                Err(e) if e.is_conflict() => break,
                Err(e) => return Err(e.into()),
            }
        }

        Err(IPPoolError::ConflictRetriesExhausted {
            pool: format!("{}/{}", namespace, name),
            attempts: MAX_UPDATE_ATTEMPTS,
        })
    }
}
