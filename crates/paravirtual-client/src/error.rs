//! Supervisor client errors

use thiserror::Error;

/// Errors that can occur when talking to the supervisor API server
#[derive(Debug, Error)]
pub enum ClientError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because the object changed since it was read
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid request (e.g., missing namespace or name)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// API server returned an error
    #[error("API error: {0}")]
    Api(String),

    /// Kubernetes client error (transport, auth, decode)
    #[error("Kubernetes error: {0}")]
    Kube(#[source] kube::Error),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Conflict(_))
    }
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => ClientError::NotFound(resp.message),
            kube::Error::Api(resp) if resp.code == 409 => ClientError::Conflict(resp.message),
            other => ClientError::Kube(other),
        }
    }
}
