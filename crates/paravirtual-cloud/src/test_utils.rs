//! Test utilities for unit testing the cloud provider
//!
//! Fixture builders for VirtualMachines, IPPools and Nodes, plus helpers that
//! wire them into mock-backed resolvers and managers.

use crate::cache::WatchCache;
use crate::instances::Instances;
use crate::ippool_manager::{IPPoolManager, cluster_owner_reference, ip_pool_name};
use crate::resolver::VmResolver;
use crate::zones::Zones;
use crds::*;
use k8s_openapi::api::core::v1::{Node, NodeSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use paravirtual_client::MockSupervisorClient;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TEST_NAMESPACE: &str = "test-cluster-ns";
pub const TEST_CLUSTER_NAME: &str = "test-cluster";
pub const TEST_VM_NAME: &str = "test-vm";
pub const TEST_VM_UUID: &str = "1bbf49a7-fbce-4502-bb4c-4c3544cacc9e";

pub fn test_provider_id() -> String {
    format!("vsphere://{}", TEST_VM_UUID)
}

/// VM with only a BIOS UUID set in status
pub fn create_test_vm(name: &str, namespace: &str, bios_uuid: &str) -> VirtualMachine {
    VirtualMachine {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec: VirtualMachineSpec::default(),
        status: Some(VirtualMachineStatus {
            bios_uuid: bios_uuid.to_string(),
            ..Default::default()
        }),
    }
}

/// VM with host "test-host" and primary IPv4 "1.2.3.4"
pub fn create_test_vm_with_ip_and_host(name: &str, namespace: &str, bios_uuid: &str) -> VirtualMachine {
    let mut vm = create_test_vm(name, namespace, bios_uuid);
    if let Some(status) = vm.status.as_mut() {
        status.host = "test-host".to_string();
        status.network = Some(VirtualMachineNetworkStatus {
            primary_ip4: "1.2.3.4".to_string(),
            ..Default::default()
        });
    }
    vm
}

pub fn with_power_state(mut vm: VirtualMachine, power_state: PowerState) -> VirtualMachine {
    if let Some(status) = vm.status.as_mut() {
        status.power_state = power_state;
    }
    vm
}

pub fn with_zone(mut vm: VirtualMachine, zone: &str) -> VirtualMachine {
    vm.metadata
        .labels
        .get_or_insert_with(BTreeMap::new)
        .insert(ZONE_LABEL.to_string(), zone.to_string());
    vm
}

pub fn test_owner_reference() -> OwnerReference {
    cluster_owner_reference("cluster.x-k8s.io/v1beta1", "Cluster", TEST_CLUSTER_NAME, "cluster-uid-1")
}

/// Pool named after `TEST_CLUSTER_NAME` with the given requests and realized subnets
pub fn create_test_ip_pool(requests: &[&str], realized: &[(&str, &str)]) -> IPPool {
    IPPool {
        metadata: ObjectMeta {
            name: Some(ip_pool_name(TEST_CLUSTER_NAME)),
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

/// Mock client seeded with `vms`, no cache
pub fn mock_with_vms(vms: Vec<VirtualMachine>) -> MockSupervisorClient {
    let mock = MockSupervisorClient::new();
    for vm in vms {
        mock.add_virtual_machine(vm);
    }
    mock
}

pub fn create_test_instances(mock: &MockSupervisorClient, cache: Option<WatchCache<VirtualMachine>>) -> Instances {
    Instances::new(VmResolver::new(TEST_NAMESPACE, Arc::new(mock.clone()), cache))
}

pub fn create_test_zones(mock: &MockSupervisorClient) -> Zones {
    Zones::new(VmResolver::new(TEST_NAMESPACE, Arc::new(mock.clone()), None))
}

pub fn create_test_manager(mock: &MockSupervisorClient) -> IPPoolManager {
    IPPoolManager::new(Arc::new(mock.clone()))
}
