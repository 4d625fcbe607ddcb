//! Paravirtual CRD Definitions
//!
//! Supervisor-side custom resources consumed by the paravirtual cloud
//! provider: VM Operator virtual machines and NSX IP pools.

pub mod ip_pool;
pub mod virtual_machine;

pub use ip_pool::*;
pub use virtual_machine::*;
