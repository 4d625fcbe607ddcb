//! VirtualMachine operations for MockSupervisorClient

use super::{MockOperation, MockSupervisorClient};
use crate::error::ClientError;
use crds::VirtualMachine;

pub async fn get_virtual_machine(client: &MockSupervisorClient, namespace: &str, name: &str) -> Result<VirtualMachine, ClientError> {
    client.begin(MockOperation::GetVirtualMachine)?;
    client.virtual_machines.get(namespace, name)
}

pub async fn list_virtual_machines(client: &MockSupervisorClient, namespace: &str, label_selector: Option<&str>) -> Result<Vec<VirtualMachine>, ClientError> {
    client.begin(MockOperation::ListVirtualMachines)?;
    Ok(client.virtual_machines.list(namespace, label_selector))
}

pub async fn create_virtual_machine(client: &MockSupervisorClient, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError> {
    client.begin(MockOperation::CreateVirtualMachine)?;
    client.virtual_machines.create(vm)
}

pub async fn update_virtual_machine(client: &MockSupervisorClient, vm: &VirtualMachine) -> Result<VirtualMachine, ClientError> {
    client.begin(MockOperation::UpdateVirtualMachine)?;
    client.virtual_machines.update(vm)
}

pub async fn delete_virtual_machine(client: &MockSupervisorClient, namespace: &str, name: &str) -> Result<(), ClientError> {
    client.begin(MockOperation::DeleteVirtualMachine)?;
    client.virtual_machines.delete(namespace, name)
}
