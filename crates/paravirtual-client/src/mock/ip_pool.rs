//! IPPool operations for MockSupervisorClient

use super::{MockOperation, MockSupervisorClient};
use crate::error::ClientError;
use crds::IPPool;

pub async fn get_ip_pool(client: &MockSupervisorClient, namespace: &str, name: &str) -> Result<IPPool, ClientError> {
    client.begin(MockOperation::GetIPPool)?;
    client.ip_pools.get(namespace, name)
}

pub async fn list_ip_pools(client: &MockSupervisorClient, namespace: &str, label_selector: Option<&str>) -> Result<Vec<IPPool>, ClientError> {
    client.begin(MockOperation::ListIPPools)?;
    Ok(client.ip_pools.list(namespace, label_selector))
}

pub async fn create_ip_pool(client: &MockSupervisorClient, pool: &IPPool) -> Result<IPPool, ClientError> {
    client.begin(MockOperation::CreateIPPool)?;
    client.ip_pools.create(pool)
}

pub async fn update_ip_pool(client: &MockSupervisorClient, pool: &IPPool) -> Result<IPPool, ClientError> {
    client.begin(MockOperation::UpdateIPPool)?;
    client.ip_pools.update(pool)
}
