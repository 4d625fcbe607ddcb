//! Provider IDs of the form `vsphere://<BiosUUID>`.

use crate::error::CloudProviderError;
use std::fmt;

/// Scheme prefix of every provider ID this provider issues.
pub const PROVIDER_PREFIX: &str = "vsphere://";

/// A parsed provider ID. The UUID is kept verbatim and compared
/// case-sensitively against `status.biosUUID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProviderId(String);

impl ProviderId {
    /// Parse `vsphere://<uuid>`. A missing prefix or an empty UUID is a
    /// format error, never a not-found.
    pub fn parse(provider_id: &str) -> Result<Self, CloudProviderError> {
        let uuid = provider_id.strip_prefix(PROVIDER_PREFIX).ok_or_else(|| {
            CloudProviderError::InvalidProviderId(format!(
                "{:?} does not start with {}",
                provider_id, PROVIDER_PREFIX
            ))
        })?;
        if uuid.is_empty() {
            return Err(CloudProviderError::InvalidProviderId(format!(
                "{:?} has an empty UUID",
                provider_id
            )));
        }
        Ok(Self(uuid.to_string()))
    }

    pub fn from_bios_uuid(bios_uuid: impl Into<String>) -> Self {
        Self(bios_uuid.into())
    }

    pub fn bios_uuid(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", PROVIDER_PREFIX, self.0)
    }
}
