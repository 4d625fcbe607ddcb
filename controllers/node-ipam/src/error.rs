//! Controller-specific error types.
//!
//! This module defines error types specific to the Node IPAM Controller
//! that are not covered by upstream library errors.

use kube::Error as KubeError;
use paravirtual_client::ClientError;
use paravirtual_cloud::{CacheError, IPPoolError};
use thiserror::Error;

/// Errors that can occur in the Node IPAM Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Workload cluster API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Supervisor API error
    #[error("Supervisor error: {0}")]
    Client(#[from] ClientError),

    /// IPPool update failed
    #[error("IPPool error: {0}")]
    IPPool(#[from] IPPoolError),

    /// Watch cache failed
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
