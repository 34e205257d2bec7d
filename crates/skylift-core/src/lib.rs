//! Core domain types and traits for the skylift deploy client.
//!
//! This crate contains:
//! - Application identifiers (`env/app`)
//! - Cluster definitions and the cluster registry
//! - Deployment specs, results and wire payloads
//! - The `SpecProvider` and `DeployClient` traits implemented by API clients

pub mod cluster;
pub mod deployer;
pub mod error;
pub mod id;

pub use cluster::{Cluster, ClusterRegistry};
pub use error::{Error, Result};
pub use id::ApplicationRef;
