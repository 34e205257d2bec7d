//! Client configuration parsing.
//!
//! ```kdl
//! affiliation "paas"
//! api-cluster "utv"
//! token "default-token"
//! cluster "utv" url="https://api-utv.example.com" token="t1" reachable=#true
//! cluster "prod" url="https://api-prod.example.com" reachable=#false
//! ```

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use skylift_core::{Cluster, ClusterRegistry};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "SKYLIFT_CONFIG";

/// Per-user client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Configuration store namespace deployed from.
    pub affiliation: String,
    /// Cluster whose API serves the configuration store.
    pub api_cluster: Cluster,
    /// Fallback token for clusters without one of their own.
    pub token: Option<String>,
    pub clusters: ClusterRegistry,
}

impl ClientConfig {
    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = affiliation.into();
        self
    }
}

/// Default location: `<config dir>/skylift/config.kdl`.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("skylift").join("config.kdl"))
        .ok_or(ConfigError::NoConfigDir(CONFIG_ENV))
}

/// Read and parse a configuration file.
pub fn load_client_config(path: &Path) -> ConfigResult<ClientConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_client_config(&content)
}

/// Parse a client configuration from KDL text.
pub fn parse_client_config(kdl: &str) -> ConfigResult<ClientConfig> {
    let doc: KdlDocument = kdl.parse()?;

    let mut affiliation = None;
    let mut api_cluster_name = None;
    let mut token = None;
    let mut clusters = Vec::new();

    for node in doc.nodes() {
        match node.name().value() {
            "affiliation" => {
                affiliation = Some(
                    get_first_string_arg(node)
                        .ok_or_else(|| ConfigError::MissingField("affiliation name".to_string()))?,
                );
            }
            "api-cluster" => {
                api_cluster_name = Some(
                    get_first_string_arg(node)
                        .ok_or_else(|| ConfigError::MissingField("api-cluster name".to_string()))?,
                );
            }
            "token" => {
                token = get_first_string_arg(node);
            }
            "cluster" => {
                clusters.push(parse_cluster(node)?);
            }
            _ => {} // Ignore unknown nodes
        }
    }

    let affiliation = affiliation
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ConfigError::MissingField("affiliation".to_string()))?;

    if clusters.is_empty() {
        return Err(ConfigError::MissingField("cluster".to_string()));
    }

    let mut seen = HashSet::new();
    for cluster in &clusters {
        if !seen.insert(cluster.name.as_str()) {
            return Err(ConfigError::Duplicate(format!("cluster '{}'", cluster.name)));
        }
    }

    if let Some(default_token) = &token {
        for cluster in clusters.iter_mut().filter(|c| c.token.is_none()) {
            cluster.token = Some(default_token.clone());
        }
    }

    let api_cluster = match api_cluster_name {
        Some(name) => clusters
            .iter()
            .find(|c| c.name == name)
            .cloned()
            .ok_or_else(|| {
                ConfigError::InvalidReference(format!("api-cluster names unknown cluster '{}'", name))
            })?,
        None => clusters
            .iter()
            .find(|c| c.reachable)
            .cloned()
            .ok_or_else(|| ConfigError::MissingField("api-cluster (no reachable cluster)".to_string()))?,
    };

    Ok(ClientConfig {
        affiliation,
        api_cluster,
        token,
        clusters: clusters.into_iter().collect(),
    })
}

fn parse_cluster(node: &KdlNode) -> ConfigResult<Cluster> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("cluster name".to_string()))?;

    let raw_url = get_string_prop(node, "url")
        .ok_or_else(|| ConfigError::MissingField(format!("url for cluster '{}'", name)))?;
    let url = Url::parse(&raw_url).map_err(|e| ConfigError::InvalidValue {
        field: format!("url for cluster '{}'", name),
        message: e.to_string(),
    })?;

    Ok(Cluster {
        name,
        url,
        token: get_string_prop(node, "token"),
        reachable: get_bool_prop(node, "reachable").unwrap_or(true),
    })
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn get_bool_prop(node: &KdlNode, name: &str) -> Option<bool> {
    node.get(name).and_then(|v| v.as_bool())
}
