//! Client traits for mocking
//!
//! These traits abstract the supervisor API so the cloud provider can be unit
//! tested against an in-memory store. `SupervisorClient` implements both.

use crate::error::ClientError;
use crds::{IPPool, VirtualMachine};

/// VirtualMachine operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait VirtualMachineClientTrait: Send + Sync {
    async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClientError>;

    /// List VMs in `namespace`, optionally filtered by a label selector
    async fn list_virtual_machines(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<VirtualMachine>, ClientError>;

    async fn create_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError>;

    /// Replace the VM; a stale `resourceVersion` yields `ClientError::Conflict`
    async fn update_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError>;

    async fn delete_virtual_machine(&self, namespace: &str, name: &str) -> Result<(), ClientError>;
}

/// IPPool operations
#[async_trait::async_trait]
pub trait IPPoolClientTrait: Send + Sync {
    async fn get_ip_pool(&self, namespace: &str, name: &str) -> Result<IPPool, ClientError>;

    /// List pools in `namespace`, optionally filtered by a label selector
    async fn list_ip_pools(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<IPPool>, ClientError>;

    async fn create_ip_pool(&self, pool: &IPPool) -> Result<IPPool, ClientError>;

    /// Replace the pool; a stale `resourceVersion` yields `ClientError::Conflict`
    async fn update_ip_pool(&self, pool: &IPPool) -> Result<IPPool, ClientError>;
}
