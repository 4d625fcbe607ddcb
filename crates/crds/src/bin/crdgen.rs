//! Prints the CRD manifests for the supervisor resources as a YAML stream.
//!
//! Used to seed test clusters; the real CRDs are installed by the supervisor.

use crds::{IPPool, VirtualMachine};
use kube::CustomResourceExt;

fn main() -> Result<(), serde_yaml::Error> {
    let crds = [IPPool::crd(), VirtualMachine::crd()];
    for crd in crds {
        println!("---");
        print!("{}", serde_yaml::to_string(&crd)?);
    }
    Ok(())
}
