//! VirtualMachine CRD
//!
//! Mirror of the VM Operator resource. Only the fields the cloud provider
//! reads are modelled; unknown fields are ignored on deserialization.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label holding the failure-domain name of a VM.
pub const ZONE_LABEL: &str = "topology.kubernetes.io/zone";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "vmoperator.vmware.com",
    version = "v1alpha2",
    kind = "VirtualMachine",
    plural = "virtualmachines",
    shortname = "vm",
    namespaced,
    status = "VirtualMachineStatus",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class_name: String,

    /// Desired power state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_state: Option<PowerState>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineStatus {
    /// BIOS UUID of the VM, empty until the VM is provisioned
    #[serde(default, rename = "biosUUID")]
    pub bios_uuid: String,

    /// Observed power state
    #[serde(default)]
    pub power_state: PowerState,

    /// Hypervisor host running the VM
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<VirtualMachineNetworkStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
pub struct VirtualMachineNetworkStatus {
    #[serde(default, rename = "primaryIP4", skip_serializing_if = "String::is_empty")]
    pub primary_ip4: String,

    #[serde(default, rename = "primaryIP6", skip_serializing_if = "String::is_empty")]
    pub primary_ip6: String,
}

impl VirtualMachine {
    /// BIOS UUID from status, empty when the VM has no status yet.
    pub fn bios_uuid(&self) -> &str {
        self.status
            .as_ref()
            .map(|status| status.bios_uuid.as_str())
            .unwrap_or_default()
    }

    /// Observed power state, `Unknown` when the VM has no status yet.
    pub fn power_state(&self) -> PowerState {
        self.status
            .as_ref()
            .map(|status| status.power_state)
            .unwrap_or_default()
    }

    /// Value of the zone label, if set.
    pub fn zone(&self) -> Option<&str> {
        self.metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(ZONE_LABEL))
            .map(String::as_str)
    }
}
