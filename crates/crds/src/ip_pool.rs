//! IPPool CRD
//!
//! One pool per workload cluster namespace. The cloud provider owns
//! `spec.subnets` (one request per node); the NSX allocator owns
//! `status.subnets` and fills in the realized CIDRs asynchronously.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default address family for node subnet requests.
pub const IP_FAMILY_DEFAULT: IPFamily = IPFamily::IPv4;

/// Default prefix length for node subnet requests.
pub const PREFIX_LENGTH_DEFAULT: i32 = 24;

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "nsx.vmware.com",
    version = "v1alpha1",
    kind = "IPPool",
    plural = "ippools",
    namespaced,
    status = "IPPoolStatus",
    derive = "Default"
)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolSpec {
    /// Subnet requests, at most one per node name
    #[serde(default)]
    pub subnets: Vec<SubnetRequest>,
}

/// A request for one node's pod subnet.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetRequest {
    /// Subnet name, equal to the node name
    pub name: String,

    /// Address family of the requested subnet
    #[serde(default)]
    pub ip_family: IPFamily,

    /// Prefix length of the requested subnet
    pub prefix_length: i32,
}

impl SubnetRequest {
    /// Request with the default family and prefix length for `node_name`.
    pub fn for_node(node_name: &str) -> Self {
        Self {
            name: node_name.to_string(),
            ip_family: IP_FAMILY_DEFAULT,
            prefix_length: PREFIX_LENGTH_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum IPFamily {
    #[default]
    #[serde(rename = "ipv4")]
    IPv4,

    #[serde(rename = "ipv6")]
    IPv6,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolStatus {
    /// Realized subnets, written by the allocator
    #[serde(default)]
    pub subnets: Vec<SubnetResult>,

    /// Allocator conditions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<IPPoolCondition>,
}

/// A subnet the allocator has realized.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubnetResult {
    /// Subnet name (node name)
    pub name: String,

    /// Realized CIDR, e.g. "172.26.0.0/24"
    pub cidr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IPPoolCondition {
    #[serde(rename = "type")]
    pub type_: String,

    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<chrono::DateTime<chrono::Utc>>,
}

impl IPPool {
    /// Realized subnets from status, empty when the allocator has not reported yet.
    pub fn realized_subnets(&self) -> &[SubnetResult] {
        self.status
            .as_ref()
            .map(|status| status.subnets.as_slice())
            .unwrap_or_default()
    }

    /// Whether a subnet request for `node_name` is already present in spec.
    pub fn has_subnet_request(&self, node_name: &str) -> bool {
        self.spec.subnets.iter().any(|sub| sub.name == node_name)
    }
}
