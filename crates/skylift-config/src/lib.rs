//! KDL configuration parsing for the skylift deploy client.
//!
//! This crate handles:
//! - Locating the client configuration file
//! - Parsing the affiliation, API cluster and cluster registry

pub mod client;
pub mod error;

pub use client::{CONFIG_ENV, ClientConfig, default_config_path, load_client_config, parse_client_config};
pub use error::{ConfigError, ConfigResult};
