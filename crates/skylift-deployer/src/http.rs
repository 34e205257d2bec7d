//! HTTP client for the remote deployment API.

use crate::dispatch::ClientProvider;
use crate::partition::Partition;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use skylift_core::deployer::{
    DeployClient, DeployPayload, DeployResult, DeploymentSpec, RedeployPayload, RedeployResult,
    RedeployResults, SpecProvider,
};
use skylift_core::{ApplicationRef, Error, Result};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

/// Client for one API base URL within one affiliation.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    affiliation: String,
}

impl ApiClient {
    pub fn new(base_url: Url, token: Option<String>, affiliation: impl Into<String>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url, token, affiliation)
    }

    /// Share a connection pool with other clients.
    pub fn with_http_client(
        http: reqwest::Client,
        base_url: Url,
        token: Option<String>,
        affiliation: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url,
            token,
            affiliation: affiliation.into(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                Error::Configuration(format!("'{}' cannot be used as an API base url", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and unwrap the envelope.
    ///
    /// With `allow_failed_items`, a `success:false` envelope that still carries
    /// items is returned as is; those items describe per-application failures.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        allow_failed_items: bool,
    ) -> Result<ApiResponse<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&body)
                .ok()
                .map(|r| r.message)
                .filter(|m| !m.is_empty())
                .unwrap_or(body);
            return Err(Error::Transport(format!("{}: {}", status, message)));
        }

        let envelope: ApiResponse<T> = serde_json::from_str(&body)
            .map_err(|e| Error::Transport(format!("unexpected response: {}", e)))?;

        if !envelope.success && !(allow_failed_items && !envelope.items.is_empty()) {
            let message = if envelope.message.is_empty() {
                "remote reported failure".to_string()
            } else {
                envelope.message
            };
            return Err(Error::Transport(message));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl SpecProvider for ApiClient {
    async fn application_refs(&self) -> Result<Vec<ApplicationRef>> {
        let url = self.endpoint(&["v1", "auroraconfig", &self.affiliation, "filenames"])?;
        let response: ApiResponse<String> =
            self.send(self.request(reqwest::Method::GET, url), false).await?;

        let mut refs: Vec<ApplicationRef> = response
            .items
            .iter()
            .filter_map(|f| ApplicationRef::from_file_name(f))
            .collect();
        refs.sort_by_key(|r| r.to_string());
        refs.dedup();
        debug!(affiliation = %self.affiliation, count = refs.len(), "Fetched application identifiers");
        Ok(refs)
    }

    async fn deployment_specs(&self, ids: &[ApplicationRef]) -> Result<Vec<DeploymentSpec>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.endpoint(&["v1", "deployspec", &self.affiliation])?;
        let query: Vec<(&str, String)> = ids.iter().map(|id| ("adr", id.to_string())).collect();
        let response: ApiResponse<DeploymentSpec> = self
            .send(self.request(reqwest::Method::GET, url).query(&query), false)
            .await?;

        debug!(requested = ids.len(), received = response.items.len(), "Fetched deployment specs");
        Ok(response.items)
    }
}

#[async_trait]
impl DeployClient for ApiClient {
    async fn deploy(&self, payload: &DeployPayload) -> Result<Vec<DeployResult>> {
        let url = self.endpoint(&["v1", "apply", &self.affiliation])?;
        let response: ApiResponse<DeployResult> = self
            .send(self.request(reqwest::Method::PUT, url).json(payload), true)
            .await?;
        Ok(response.items)
    }

    async fn redeploy(&self, payload: &RedeployPayload) -> Result<RedeployResults> {
        let url = self.endpoint(&["v1", "applicationdeployment", "redeploy"])?;
        let response: ApiResponse<RedeployResult> = self
            .send(self.request(reqwest::Method::POST, url).json(payload), true)
            .await?;
        Ok(RedeployResults {
            success: response.success,
            message: response.message,
            results: response.items,
        })
    }
}

/// Builds an `ApiClient` per partition from its cluster url and token.
#[derive(Clone)]
pub struct HttpClientProvider {
    http: reqwest::Client,
    affiliation: String,
}

impl HttpClientProvider {
    pub fn new(affiliation: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            affiliation: affiliation.into(),
        }
    }
}

impl ClientProvider for HttpClientProvider {
    fn client_for(&self, partition: &Partition) -> Result<Arc<dyn DeployClient>> {
        Ok(Arc::new(ApiClient::with_http_client(
            self.http.clone(),
            partition.cluster.url.clone(),
            partition.token().map(String::from),
            &self.affiliation,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(Url::parse(base).unwrap(), Some("t".to_string()), "paas")
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = client("https://api.example.com").endpoint(&["v1", "apply", "paas"]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/apply/paas");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://example.com/boober/")
            .endpoint(&["v1", "deployspec", "paas"])
            .unwrap();
        assert_eq!(url.as_str(), "https://example.com/boober/v1/deployspec/paas");
    }

    #[test]
    fn test_endpoint_escapes_segments() {
        let url = ApiClient::new(Url::parse("https://api.example.com").unwrap(), None, "a b")
            .endpoint(&["v1", "apply", "a b"])
            .unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/apply/a%20b");
    }

    #[test]
    fn test_envelope_without_items() {
        let envelope: ApiResponse<String> =
            serde_json::from_value(json!({ "success": false, "message": "nope" })).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.message, "nope");
        assert!(envelope.items.is_empty());
    }
}
