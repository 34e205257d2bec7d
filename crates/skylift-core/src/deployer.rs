//! Deployment specs, results and the traits implemented by API clients.
//!
//! The remote deployment API is reached through two seams: `SpecProvider`
//! answers questions about the configuration store, `DeployClient` performs
//! deploys and redeploys against one cluster.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::{ApplicationRef, Result};

/// Deploy id reported when no deployment was registered for an application.
pub const NO_DEPLOY_ID: &str = "-";

/// Resolved deployment metadata for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    /// Name of the cluster the application runs on.
    pub cluster: String,
    #[serde(rename = "envName")]
    pub environment: String,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    /// Every other field the configuration store returned.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl DeploymentSpec {
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        cluster: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let environment = environment.into();
        Self {
            cluster: cluster.into(),
            namespace: environment.clone(),
            environment,
            name: name.into(),
            version: version.into(),
            fields: Map::new(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The `env/app` identifier this spec was fetched for.
    pub fn id(&self) -> ApplicationRef {
        ApplicationRef::new(&self.environment, &self.name)
    }

    pub fn deployment_ref(&self) -> ApplicationDeploymentRef {
        ApplicationDeploymentRef::new(&self.namespace, &self.name)
    }
}

/// A running application deployment, addressed by namespace and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationDeploymentRef {
    pub namespace: String,
    pub name: String,
}

impl ApplicationDeploymentRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Outcome of deploying one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub success: bool,
    /// Empty on success.
    #[serde(default)]
    pub reason: String,
    pub application_name: String,
    pub namespace: String,
    pub cluster: String,
    #[serde(default = "no_deploy_id")]
    pub deploy_id: String,
}

fn no_deploy_id() -> String {
    NO_DEPLOY_ID.to_string()
}

impl DeployResult {
    /// A failed result fabricated locally for an application that never reached the remote API.
    pub fn failed(spec: &DeploymentSpec, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            reason: reason.into(),
            application_name: spec.name.clone(),
            namespace: spec.namespace.clone(),
            cluster: spec.cluster.clone(),
            deploy_id: no_deploy_id(),
        }
    }

    pub fn has_deploy_id(&self) -> bool {
        !self.deploy_id.is_empty() && self.deploy_id != NO_DEPLOY_ID
    }
}

/// Outcome of redeploying one application deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeployResult {
    pub success: bool,
    #[serde(default)]
    pub reason: String,
    pub application_ref: ApplicationDeploymentRef,
}

impl RedeployResult {
    /// Redeploys report no deploy id, so the sentinel is used.
    pub fn into_deploy_result(self, cluster: &str) -> DeployResult {
        DeployResult {
            success: self.success,
            reason: self.reason,
            application_name: self.application_ref.name,
            namespace: self.application_ref.namespace,
            cluster: cluster.to_string(),
            deploy_id: no_deploy_id(),
        }
    }
}

/// Everything one redeploy call reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeployResults {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub results: Vec<RedeployResult>,
}

/// Body of a deploy call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPayload {
    pub application_ids: Vec<ApplicationRef>,
    /// Override documents keyed by configuration file name.
    pub overrides: BTreeMap<String, Value>,
}

/// Body of a redeploy call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeployPayload {
    pub application_deployment_refs: Vec<ApplicationDeploymentRef>,
}

/// Read access to the configuration store.
#[async_trait]
pub trait SpecProvider: Send + Sync {
    /// Every application identifier known to the store.
    async fn application_refs(&self) -> Result<Vec<ApplicationRef>>;

    /// Deployment specs for the given identifiers.
    async fn deployment_specs(&self, ids: &[ApplicationRef]) -> Result<Vec<DeploymentSpec>>;
}

/// Deploy operations against a single cluster.
#[async_trait]
pub trait DeployClient: Send + Sync {
    /// Deploy applications from their stored configuration.
    async fn deploy(&self, payload: &DeployPayload) -> Result<Vec<DeployResult>>;

    /// Redeploy running application deployments without changing configuration.
    async fn redeploy(&self, payload: &RedeployPayload) -> Result<RedeployResults>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_keeps_extra_fields() {
        let spec: DeploymentSpec = serde_json::from_value(json!({
            "cluster": "east",
            "envName": "dev",
            "namespace": "paas-dev",
            "name": "flubber",
            "version": "1",
            "management": { "path": "actuator" }
        }))
        .unwrap();

        assert_eq!(spec.id(), ApplicationRef::new("dev", "flubber"));
        assert_eq!(spec.namespace, "paas-dev");
        assert_eq!(spec.fields["management"]["path"], "actuator");
        assert!(!spec.fields.contains_key("cluster"));
    }

    #[test]
    fn test_deploy_payload_wire_shape() {
        let mut overrides = BTreeMap::new();
        overrides.insert("dev/flubber.json".to_string(), json!({ "version": "2" }));
        let payload = DeployPayload {
            application_ids: vec![ApplicationRef::new("dev", "flubber")],
            overrides,
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "applicationIds": ["dev/flubber"],
                "overrides": { "dev/flubber.json": { "version": "2" } }
            })
        );
    }

    #[test]
    fn test_redeploy_payload_wire_shape() {
        let payload = RedeployPayload {
            application_deployment_refs: vec![ApplicationDeploymentRef::new("paas-dev", "flubber")],
        };

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "applicationDeploymentRefs": [{ "namespace": "paas-dev", "name": "flubber" }]
            })
        );
    }

    #[test]
    fn test_failed_result_uses_sentinel() {
        let spec = DeploymentSpec::new("flubber", "dev", "east", "1");
        let result = DeployResult::failed(&spec, "boom");

        assert!(!result.success);
        assert_eq!(result.reason, "boom");
        assert_eq!(result.deploy_id, NO_DEPLOY_ID);
        assert!(!result.has_deploy_id());
    }

    #[test]
    fn test_deploy_result_without_id_defaults_to_sentinel() {
        let result: DeployResult = serde_json::from_value(json!({
            "success": false,
            "reason": "quota exceeded",
            "applicationName": "flubber",
            "namespace": "paas-dev",
            "cluster": "east"
        }))
        .unwrap();

        assert_eq!(result.deploy_id, NO_DEPLOY_ID);
    }

    #[test]
    fn test_redeploy_result_conversion() {
        let result = RedeployResult {
            success: true,
            reason: String::new(),
            application_ref: ApplicationDeploymentRef::new("paas-dev", "flubber"),
        }
        .into_deploy_result("east");

        assert!(result.success);
        assert_eq!(result.application_name, "flubber");
        assert_eq!(result.cluster, "east");
        assert_eq!(result.deploy_id, NO_DEPLOY_ID);
    }
}
