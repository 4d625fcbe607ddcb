//! Supervisor Cluster Client
//!
//! Typed access to the two supervisor resources the paravirtual cloud
//! provider reads and writes: VM Operator `VirtualMachine` objects and NSX
//! `IPPool` objects.
//!
//! # Example
//!
//! ```no_run
//! use paravirtual_client::{IPPoolClientTrait, SupervisorClient, VirtualMachineClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kube_client = kube::Client::try_default().await?;
//! let client = SupervisorClient::new(kube_client);
//!
//! // Look up the VM backing a node
//! let vm = client.get_virtual_machine("ns1", "node-1").await?;
//!
//! // List every IPPool in the namespace
//! let pools = client.list_ip_pools("ns1", None).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod client_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::SupervisorClient;
pub use client_trait::{IPPoolClientTrait, VirtualMachineClientTrait};
pub use error::ClientError;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockOperation, MockSupervisorClient};
