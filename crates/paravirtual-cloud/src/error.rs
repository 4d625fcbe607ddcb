//! Cloud provider error types.
//!
//! `CloudProviderError::InstanceNotFound` is the sentinel callers use to decide
//! a node is gone. Upstream failures are wrapped in `Client` and must never
//! compare equal to it.

use paravirtual_client::ClientError;
use thiserror::Error;

/// Errors returned by the instance and zone queries.
#[derive(Debug, Error)]
pub enum CloudProviderError {
    /// No provisioned VM backs the queried node
    #[error("instance not found")]
    InstanceNotFound,

    /// The VM exists but has no BIOS UUID yet
    #[error("discovered VM {0} has an empty BIOS UUID")]
    EmptyBiosUuid(String),

    /// Provider ID is not of the form `vsphere://<uuid>`
    #[error("invalid provider ID: {0}")]
    InvalidProviderId(String),

    /// Query the paravirtual provider does not support
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Supervisor API failure other than not-found
    #[error("supervisor API error: {0}")]
    Client(#[from] ClientError),
}

impl CloudProviderError {
    /// True for the not-found sentinel only.
    pub fn is_instance_not_found(&self) -> bool {
        matches!(self, CloudProviderError::InstanceNotFound)
    }

    /// Report an unprovisioned VM as missing.
    pub(crate) fn fold_empty_bios_uuid(self) -> Self {
        match self {
            CloudProviderError::EmptyBiosUuid(_) => CloudProviderError::InstanceNotFound,
            other => other,
        }
    }
}

/// Errors returned by the IPPool manager.
#[derive(Debug, Error)]
pub enum IPPoolError {
    /// Cache key is not `namespace/name`
    #[error("invalid cache key: {0}")]
    InvalidKey(String),

    /// Object lacks metadata required for the operation
    #[error("missing metadata: {0}")]
    MissingMetadata(String),

    /// Every compare-and-swap attempt hit a conflict
    #[error("IPPool {pool} still conflicting after {attempts} attempts")]
    ConflictRetriesExhausted { pool: String, attempts: u32 },

    /// Supervisor API failure
    #[error("supervisor API error: {0}")]
    Client(#[from] ClientError),
}

/// Errors returned by the watch cache runner.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The watch stream ended with an error that backoff could not absorb
    #[error("watch failed: {0}")]
    Watch(String),

    /// The store writer went away before the cache synced
    #[error("watch cache writer dropped before initial sync")]
    WriterDropped,
}
