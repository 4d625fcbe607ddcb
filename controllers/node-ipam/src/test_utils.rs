//! Test utilities for unit testing the reconciler and worker
//!
//! This module provides an in-memory Node client and helpers for creating
//! test data.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::{NodeClientTrait, Reconciler};
use crds::{IPPool, IPPoolSpec, IPPoolStatus, SubnetRequest, SubnetResult};
use k8s_openapi::api::core::v1::{Node, NodeSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use paravirtual_client::MockSupervisorClient;
use paravirtual_cloud::{IPPoolManager, ProviderConfig, WatchCache};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const TEST_NAMESPACE: &str = "test-cluster-ns";
pub const TEST_CLUSTER_NAME: &str = "test-cluster";
pub const TEST_POOL_NAME: &str = "test-cluster-ippool";

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        provider: ProviderConfig {
            supervisor_namespace: TEST_NAMESPACE.to_string(),
            supervisor_kubeconfig: None,
        },
        cluster_name: TEST_CLUSTER_NAME.to_string(),
        cluster_uid: "cluster-uid-1".to_string(),
        owner_api_version: "cluster.x-k8s.io/v1beta1".to_string(),
        owner_kind: "Cluster".to_string(),
    }
}

pub fn create_test_node(name: &str, pod_cidr: Option<&str>) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        spec: Some(NodeSpec {
            pod_cidr: pod_cidr.map(str::to_string),
            pod_cidrs: pod_cidr.map(|cidr| vec![cidr.to_string()]),
            ..Default::default()
        }),
        status: None,
    }
}

pub fn create_test_ip_pool(requests: &[&str], realized: &[(&str, &str)]) -> IPPool {
    IPPool {
        metadata: ObjectMeta {
            name: Some(TEST_POOL_NAME.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: IPPoolSpec {
            subnets: requests.iter().map(|name| SubnetRequest::for_node(name)).collect(),
        },
        status: Some(IPPoolStatus {
            subnets: realized
                .iter()
                .map(|(name, cidr)| SubnetResult {
                    name: name.to_string(),
                    cidr: cidr.to_string(),
                })
                .collect(),
            conditions: Vec::new(),
        }),
    }
}

/// In-memory Node client that records pod CIDR patches
#[derive(Clone, Default)]
pub struct MockNodeClient {
    nodes: Arc<Mutex<HashMap<String, Node>>>,
    patches: Arc<Mutex<Vec<(String, String)>>>,
    fail_patch: Arc<Mutex<Option<String>>>,
}

impl MockNodeClient {
    pub fn add_node(&self, node: Node) {
        let name = node.metadata.name.clone().unwrap_or_default();
        self.nodes.lock().unwrap().insert(name, node);
    }

    /// (node name, cidr) pairs patched so far
    pub fn patches(&self) -> Vec<(String, String)> {
        self.patches.lock().unwrap().clone()
    }

    pub fn fail_patches(&self, message: &str) {
        *self.fail_patch.lock().unwrap() = Some(message.to_string());
    }
}

#[async_trait::async_trait]
impl NodeClientTrait for MockNodeClient {
    async fn get_node(&self, name: &str) -> Result<Option<Node>, ControllerError> {
        Ok(self.nodes.lock().unwrap().get(name).cloned())
    }

    async fn patch_pod_cidr(&self, name: &str, cidr: &str) -> Result<(), ControllerError> {
        if let Some(message) = self.fail_patch.lock().unwrap().clone() {
            return Err(ControllerError::Watch(message));
        }
        self.patches
            .lock()
            .unwrap()
            .push((name.to_string(), cidr.to_string()));
        if let Some(node) = self.nodes.lock().unwrap().get_mut(name)
            && let Some(spec) = node.spec.as_mut()
        {
            spec.pod_cidr = Some(cidr.to_string());
            spec.pod_cidrs = Some(vec![cidr.to_string()]);
        }
        Ok(())
    }
}

pub fn create_test_reconciler(supervisor: &MockSupervisorClient, nodes: &MockNodeClient) -> Reconciler {
    let manager = IPPoolManager::new(Arc::new(supervisor.clone()));
    Reconciler::new(&test_config(), manager, Arc::new(nodes.clone()))
}

/// Reconciler whose manager serves pool lookups from `cache`
pub fn create_test_reconciler_with_cache(
    supervisor: &MockSupervisorClient,
    nodes: &MockNodeClient,
    cache: WatchCache<IPPool>,
) -> Reconciler {
    let manager = IPPoolManager::new(Arc::new(supervisor.clone())).with_cache(cache);
    Reconciler::new(&test_config(), manager, Arc::new(nodes.clone()))
}
