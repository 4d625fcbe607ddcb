//! Integration tests for the supervisor client
//!
//! These tests require a supervisor cluster with the VM Operator and NSX
//! CRDs installed. Set SUPERVISOR_NAMESPACE (and optionally
//! SUPERVISOR_KUBECONFIG) to run.

use paravirtual_client::{IPPoolClientTrait, SupervisorClient, VirtualMachineClientTrait};

async fn client() -> (SupervisorClient, String) {
    let namespace = std::env::var("SUPERVISOR_NAMESPACE")
        .expect("SUPERVISOR_NAMESPACE environment variable must be set");
    let kubeconfig = std::env::var("SUPERVISOR_KUBECONFIG").ok();

    let client = SupervisorClient::from_kubeconfig(kubeconfig.as_deref())
        .await
        .expect("Failed to create client");
    (client, namespace)
}

#[tokio::test]
#[ignore] // Requires a supervisor cluster
async fn test_list_virtual_machines() {
    let (client, namespace) = client().await;

    let vms = client
        .list_virtual_machines(&namespace, None)
        .await
        .expect("Failed to list virtual machines");

    println!("Found {} virtual machines", vms.len());
}

#[tokio::test]
#[ignore]
async fn test_list_ip_pools() {
    let (client, namespace) = client().await;

    let pools = client
        .list_ip_pools(&namespace, None)
        .await
        .expect("Failed to list IP pools");

    println!("Found {} IP pools", pools.len());
}

#[tokio::test]
#[ignore]
async fn test_get_missing_virtual_machine_is_not_found() {
    let (client, namespace) = client().await;

    let err = client
        .get_virtual_machine(&namespace, "does-not-exist-0f3c")
        .await
        .expect_err("VM should not exist");

    assert!(err.is_not_found(), "expected NotFound, got {err:?}");
}
