//! Node IPAM Controller
//!
//! Gives every workload-cluster Node a pod subnet from the cluster's NSX
//! IPPool in the supervisor:
//! - Node added: a subnet request for it is added to the IPPool
//! - Node deleted: its subnet request is removed
//! - IPPool realized: the allocated CIDR is written to the Node's podCIDR

mod backoff;
mod config;
mod controller;
mod error;
mod reconciler;
mod watcher;
mod worker;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod reconciler_test;
#[cfg(test)]
mod watcher_test;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Node IPAM Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Supervisor namespace: {}", config.namespace());
    info!(
        "  Supervisor kubeconfig: {}",
        config.provider.supervisor_kubeconfig.as_deref().unwrap_or("in-cluster")
    );
    info!("  Cluster: {} ({})", config.cluster_name, config.cluster_uid);
    info!("  IPPool: {}", config.pool_name());

    // Initialize and run controller
    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
