//! CLI command implementations.

pub mod deploy;
pub mod list;

use crate::Format;
use anyhow::{Context, Result};
use skylift_config::{ClientConfig, default_config_path, load_client_config};
use skylift_deployer::ApiClient;
use std::path::PathBuf;
use tracing::debug;

/// Options that apply to every command.
pub struct Global {
    pub config: Option<PathBuf>,
    pub affiliation: Option<String>,
    pub token: Option<String>,
    pub format: Format,
}

impl Global {
    /// Load the client configuration, applying command-line overrides.
    pub fn load_config(&self) -> Result<ClientConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        debug!(path = %path.display(), "Loading configuration");

        let config = load_client_config(&path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        Ok(match &self.affiliation {
            Some(affiliation) => config.with_affiliation(affiliation),
            None => config,
        })
    }

    /// Client for the configuration store on the API cluster.
    pub fn api_client(&self, config: &ClientConfig) -> ApiClient {
        let token = self
            .token
            .clone()
            .or_else(|| config.api_cluster.token.clone());
        ApiClient::new(config.api_cluster.url.clone(), token, &config.affiliation)
    }
}
