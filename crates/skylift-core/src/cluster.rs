//! Cluster definitions.
//!
//! Clusters are read from client configuration; the deploy pipeline only
//! ever looks them up by name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// A remote cluster hosting the deployment API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    /// Base endpoint of the deployment API on this cluster.
    pub url: Url,
    /// Token used when no override token is supplied.
    pub token: Option<String>,
    /// Determined outside the pipeline, e.g. by a network probe.
    pub reachable: bool,
}

impl Cluster {
    pub fn new(name: impl Into<String>, url: Url) -> Self {
        Self {
            name: name.into(),
            url,
            token: None,
            reachable: true,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }
}

/// Read-only lookup of clusters by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterRegistry {
    clusters: BTreeMap<String, Cluster>,
}

impl ClusterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Cluster> {
        self.clusters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clusters.contains_key(name)
    }

    /// Clusters ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

impl FromIterator<Cluster> for ClusterRegistry {
    fn from_iter<I: IntoIterator<Item = Cluster>>(iter: I) -> Self {
        Self {
            clusters: iter.into_iter().map(|c| (c.name.clone(), c)).collect(),
        }
    }
}
