//! Supervisor API client
//!
//! Thin typed wrapper over `kube::Api` for the VirtualMachine and IPPool
//! resources in a supervisor namespace.

use crate::client_trait::{IPPoolClientTrait, VirtualMachineClientTrait};
use crate::error::ClientError;
use crds::{IPPool, VirtualMachine};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

/// Supervisor API client
#[derive(Clone)]
pub struct SupervisorClient {
    client: Client,
}

impl SupervisorClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from a kubeconfig file, or from the default
    /// (in-cluster or `KUBECONFIG`) configuration when `kubeconfig` is `None`.
    pub async fn from_kubeconfig(kubeconfig: Option<&str>) -> Result<Self, ClientError> {
        let client = match kubeconfig {
            Some(path) => {
                let kubeconfig = kube::config::Kubeconfig::read_from(path).map_err(|e| {
                    ClientError::InvalidRequest(format!("failed to read kubeconfig {}: {}", path, e))
                })?;
                let config = kube::Config::from_custom_kubeconfig(kubeconfig, &Default::default())
                    .await
                    .map_err(|e| {
                        ClientError::InvalidRequest(format!("invalid kubeconfig {}: {}", path, e))
                    })?;
                Client::try_from(config)?
            }
            None => Client::try_default().await?,
        };
        Ok(Self { client })
    }

    /// Underlying kube client, for watchers built on the same connection
    pub fn kube_client(&self) -> Client {
        self.client.clone()
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    async fn get<K>(&self, namespace: &str, name: &str) -> Result<K, ClientError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        debug!(namespace = %namespace, name = %name, kind = %K::kind(&()), "GET");
        Ok(self.api::<K>(namespace).get(name).await?)
    }

    async fn list<K>(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<K>, ClientError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        debug!(namespace = %namespace, kind = %K::kind(&()), selector = ?label_selector, "LIST");
        Ok(self.api::<K>(namespace).list(&params).await?.items)
    }

    async fn create<K>(&self, obj: &K) -> Result<K, ClientError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
    {
        let (namespace, name) = object_key(obj)?;
        debug!(namespace = %namespace, name = %name, kind = %K::kind(&()), "CREATE");
        Ok(self.api::<K>(&namespace).create(&PostParams::default(), obj).await?)
    }

    async fn replace<K>(&self, obj: &K) -> Result<K, ClientError>
    where
        K: Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
    {
        let (namespace, name) = object_key(obj)?;
        debug!(
            namespace = %namespace,
            name = %name,
            kind = %K::kind(&()),
            resource_version = ?obj.meta().resource_version,
            "REPLACE"
        );
        Ok(self
            .api::<K>(&namespace)
            .replace(&name, &PostParams::default(), obj)
            .await?)
    }
}

/// Namespace and name of an object about to be written.
fn object_key<K: Resource>(obj: &K) -> Result<(String, String), ClientError> {
    let namespace = obj
        .namespace()
        .ok_or_else(|| ClientError::InvalidRequest("object has no namespace".to_string()))?;
    let name = obj
        .meta()
        .name
        .clone()
        .ok_or_else(|| ClientError::InvalidRequest("object has no name".to_string()))?;
    Ok((namespace, name))
}

#[async_trait::async_trait]
impl VirtualMachineClientTrait for SupervisorClient {
    async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClientError> {
        self.get(namespace, name).await
    }

    async fn list_virtual_machines(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<VirtualMachine>, ClientError> {
        self.list(namespace, label_selector).await
    }

    async fn create_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError> {
        self.create(vm).await
    }

    async fn update_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError> {
        self.replace(vm).await
    }

    async fn delete_virtual_machine(&self, namespace: &str, name: &str) -> Result<(), ClientError> {
        debug!(namespace = %namespace, name = %name, "DELETE VirtualMachine");
        self.api::<VirtualMachine>(namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IPPoolClientTrait for SupervisorClient {
    async fn get_ip_pool(&self, namespace: &str, name: &str) -> Result<IPPool, ClientError> {
        self.get(namespace, name).await
    }

    async fn list_ip_pools(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<IPPool>, ClientError> {
        self.list(namespace, label_selector).await
    }

    async fn create_ip_pool(&self, pool: &IPPool) -> Result<IPPool, ClientError> {
        self.create(pool).await
    }

    async fn update_ip_pool(&self, pool: &IPPool) -> Result<IPPool, ClientError> {
        self.replace(pool).await
    }
}
