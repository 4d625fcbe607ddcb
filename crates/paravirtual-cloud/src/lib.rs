//! Paravirtual Cloud Provider
//!
//! Treats VM Operator VirtualMachines in a supervisor namespace as the
//! backing instances of a workload cluster's nodes, and manages the per-node
//! subnet requests in the cluster's NSX IPPool.
//!
//! - `cache`: watch-fed local mirror of supervisor resources
//! - `resolver`: node name / provider ID to VirtualMachine
//! - `instances`, `zones`: node lifecycle facts derived from the VM
//! - `ippool_manager`: per-node subnet requests in the cluster IPPool
//! - `provider`: the facade tying it together

pub mod cache;
pub mod config;
pub mod error;
pub mod instances;
pub mod ippool_manager;
pub mod provider;
pub mod provider_id;
pub mod resolver;
pub mod zones;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod cache_test;

pub use cache::{CacheRunner, WatchCache, watch_cache};
pub use config::ProviderConfig;
pub use error::{CacheError, CloudProviderError, IPPoolError};
pub use instances::Instances;
pub use ippool_manager::{
    IPPoolManager, cluster_owner_reference, diff_ip_pool_subnets, get_ip_pool_subnets, ip_pool_name,
};
pub use provider::ParavirtualCloud;
pub use provider_id::{PROVIDER_PREFIX, ProviderId};
pub use resolver::VmResolver;
pub use zones::{Zone, Zones};
