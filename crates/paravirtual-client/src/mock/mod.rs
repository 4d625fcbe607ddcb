//! Mock supervisor client for unit testing
//!
//! This module provides an in-memory implementation of both client traits
//! that can be used in unit tests without a running API server.
//!
//! The mock is organized by resource:
//! - `store.rs` - generic object store with resourceVersion bookkeeping
//! - `virtual_machine.rs` - VirtualMachine operations
//! - `ip_pool.rs` - IPPool operations

mod ip_pool;
mod store;
mod virtual_machine;

use crate::client_trait::{IPPoolClientTrait, VirtualMachineClientTrait};
use crate::error::ClientError;
use crds::{IPPool, VirtualMachine};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub(crate) use store::ObjectStore;

/// Client operations that can be counted and made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    GetVirtualMachine,
    ListVirtualMachines,
    CreateVirtualMachine,
    UpdateVirtualMachine,
    DeleteVirtualMachine,
    GetIPPool,
    ListIPPools,
    CreateIPPool,
    UpdateIPPool,
}

#[derive(Debug, Clone)]
enum InjectedFailure {
    /// Fail every call with `ClientError::Api`
    Api(String),
    /// Fail the next `n` calls with `ClientError::Conflict`
    Conflict(usize),
}

/// Mock supervisor client for testing
///
/// Stores objects in memory, bumps `resourceVersion` on every write and
/// rejects updates carrying a stale version, like the API server does.
#[derive(Clone, Default)]
pub struct MockSupervisorClient {
    pub(crate) virtual_machines: ObjectStore<VirtualMachine>,
    pub(crate) ip_pools: ObjectStore<IPPool>,
    failures: Arc<Mutex<HashMap<MockOperation, InjectedFailure>>>,
    calls: Arc<Mutex<HashMap<MockOperation, usize>>>,
}

impl MockSupervisorClient {
    /// Create a new, empty mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a VirtualMachine to the mock store (for test setup)
    pub fn add_virtual_machine(&self, vm: VirtualMachine) {
        self.virtual_machines.seed(vm);
    }

    /// Add an IPPool to the mock store (for test setup)
    pub fn add_ip_pool(&self, pool: IPPool) {
        self.ip_pools.seed(pool);
    }

    /// Current stored copy of a pool, bypassing failure injection and counters
    pub fn stored_ip_pool(&self, namespace: &str, name: &str) -> Option<IPPool> {
        self.ip_pools.peek(namespace, name)
    }

    /// Current stored copy of a VM, bypassing failure injection and counters
    pub fn stored_virtual_machine(&self, namespace: &str, name: &str) -> Option<VirtualMachine> {
        self.virtual_machines.peek(namespace, name)
    }

    /// Make every subsequent `op` call fail with `ClientError::Api(message)`
    pub fn fail_on(&self, op: MockOperation, message: impl Into<String>) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, InjectedFailure::Api(message.into()));
    }

    /// Make the next `times` calls of `op` fail with `ClientError::Conflict`
    pub fn conflict_on(&self, op: MockOperation, times: usize) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, InjectedFailure::Conflict(times));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Number of times `op` was invoked, including failed calls
    pub fn call_count(&self, op: MockOperation) -> usize {
        self.calls.lock().unwrap().get(&op).copied().unwrap_or(0)
    }

    /// Record a call and return the injected failure for it, if any
    pub(crate) fn begin(&self, op: MockOperation) -> Result<(), ClientError> {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;

        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(&op) {
            Some(InjectedFailure::Api(message)) => Err(ClientError::Api(message.clone())),
            Some(InjectedFailure::Conflict(remaining)) => {
                *remaining -= 1;
                if *remaining == 0 {
                    failures.remove(&op);
                }
                Err(ClientError::Conflict(format!("injected conflict on {:?}", op)))
            }
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl VirtualMachineClientTrait for MockSupervisorClient {
    async fn get_virtual_machine(&self, namespace: &str, name: &str) -> Result<VirtualMachine, ClientError> {
        virtual_machine::get_virtual_machine(self, namespace, name).await
    }

    async fn list_virtual_machines(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<VirtualMachine>, ClientError> {
        virtual_machine::list_virtual_machines(self, namespace, label_selector).await
    }

    async fn create_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError> {
        virtual_machine::create_virtual_machine(self, vm).await
    }

    async fn update_virtual_machine(&self, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError> {
        virtual_machine::update_virtual_machine(self, vm).await
    }

    async fn delete_virtual_machine(&self, namespace: &str, name: &str) -> Result<(), ClientError> {
        virtual_machine::delete_virtual_machine(self, namespace, name).await
    }
}

#[async_trait::async_trait]
impl IPPoolClientTrait for MockSupervisorClient {
    async fn get_ip_pool(&self, namespace: &str, name: &str) -> Result<IPPool, ClientError> {
        ip_pool::get_ip_pool(self, namespace, name).await
    }

    async fn list_ip_pools(&self, namespace: &str, label_selector: Option<&str>) -> Result<Vec<IPPool>, ClientError> {
        ip_pool::list_ip_pools(self, namespace, label_selector).await
    }

    async fn create_ip_pool(&self, pool: &IPPool) -> Result<IPPool, ClientError> {
        ip_pool::create_ip_pool(self, pool).await
    }

    async fn update_ip_pool(&self, pool: &IPPool) -> Result<IPPool, ClientError> {
        ip_pool::update_ip_pool(self, pool).await
    }
}
