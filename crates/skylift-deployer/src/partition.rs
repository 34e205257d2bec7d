//! Grouping of deployment specs by destination.

use derive_more::Display;
use serde_json::Value;
use skylift_core::deployer::{DeployPayload, DeploymentSpec, RedeployPayload};
use skylift_core::{Cluster, ClusterRegistry, Error, Result};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use tracing::debug;

/// Where a group of applications is deployed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[display("{cluster}/{namespace}")]
pub struct Destination {
    pub cluster: String,
    pub namespace: String,
}

impl Destination {
    pub fn new(cluster: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            namespace: namespace.into(),
        }
    }

    pub fn of(spec: &DeploymentSpec) -> Self {
        Self::new(&spec.cluster, &spec.namespace)
    }
}

/// Applications sharing one destination, dispatched as one unit.
#[derive(Debug, Clone)]
pub struct Partition {
    pub destination: Destination,
    pub cluster: Cluster,
    pub override_token: Option<String>,
    /// In the order the specs were encountered.
    pub specs: Vec<DeploymentSpec>,
}

impl Partition {
    fn new(destination: Destination, cluster: Cluster, override_token: Option<String>) -> Self {
        Self {
            destination,
            cluster,
            override_token,
            specs: Vec::new(),
        }
    }

    /// The override token if one was given, otherwise the cluster's own.
    pub fn token(&self) -> Option<&str> {
        self.override_token
            .as_deref()
            .or(self.cluster.token.as_deref())
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Deploy payload scoped to this partition's applications.
    pub fn deploy_payload(&self, overrides: &BTreeMap<String, Value>) -> DeployPayload {
        DeployPayload {
            application_ids: self.specs.iter().map(DeploymentSpec::id).collect(),
            overrides: overrides.clone(),
        }
    }

    /// Redeploy payload scoped to this partition's applications.
    pub fn redeploy_payload(&self) -> RedeployPayload {
        RedeployPayload {
            application_deployment_refs: self
                .specs
                .iter()
                .map(DeploymentSpec::deployment_ref)
                .collect(),
        }
    }
}

/// Group specs by (cluster, namespace), ordered by destination.
///
/// Fails with a `Configuration` error when a spec names a cluster the
/// registry does not know.
pub fn partition(
    specs: Vec<DeploymentSpec>,
    registry: &ClusterRegistry,
    override_token: Option<&str>,
) -> Result<Vec<Partition>> {
    let mut partitions: BTreeMap<Destination, Partition> = BTreeMap::new();

    for spec in specs {
        let destination = Destination::of(&spec);
        let partition = match partitions.entry(destination) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let cluster = registry.get(&spec.cluster).ok_or_else(|| {
                    Error::Configuration(format!(
                        "no such cluster '{}' (needed by {})",
                        spec.cluster,
                        spec.id()
                    ))
                })?;
                debug!(destination = %entry.key(), "New partition");
                let partition = Partition::new(
                    entry.key().clone(),
                    cluster.clone(),
                    override_token.map(String::from),
                );
                entry.insert(partition)
            }
        };
        partition.specs.push(spec);
    }

    Ok(partitions.into_values().collect())
}
