//! HTTP client for the crawl control plane's status API

use super::{ControlPlaneProbe, ProbeError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControlPlaneOptions {
    pub host: String,
    pub port: u16,
    pub api_key: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Paused,
    PauseRequested,
    #[serde(other)]
    Undefined,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "RUNNING"),
            RunStatus::Paused => write!(f, "PAUSED"),
            RunStatus::PauseRequested => write!(f, "PAUSE_REQUESTED"),
            RunStatus::Undefined => write!(f, "UNDEFINED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerStatus {
    pub run_status: RunStatus,
    #[serde(default)]
    pub queue_size: i64,
}

#[derive(Debug, Deserialize)]
struct ExecutionsResponse {
    #[serde(default)]
    ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SeedsResponse {
    #[serde(default)]
    seeds: Vec<String>,
}

/// Client for the control plane's JSON status endpoints. The request
/// timeout is bound into the underlying client, so every call observes
/// the configured deadline.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ControlPlaneClient {
    pub fn new(options: ControlPlaneOptions) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()?;
        Ok(Self {
            base_url: format!("http://{}:{}", options.host, options.port),
            api_key: options.api_key,
            client,
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }
        request
    }
}

#[async_trait::async_trait]
impl ControlPlaneProbe for ControlPlaneClient {
    async fn get_status(&self) -> Result<CrawlerStatus, ProbeError> {
        let status = self
            .get("/api/v1/status")
            .send()
            .await?
            .error_for_status()?
            .json::<CrawlerStatus>()
            .await?;
        Ok(status)
    }

    async fn list_job_executions(&self) -> Result<Vec<String>, ProbeError> {
        let response = self
            .get("/api/v1/executions")
            .query(&[("state", "RUNNING")])
            .send()
            .await?
            .error_for_status()?
            .json::<ExecutionsResponse>()
            .await?;
        Ok(response.ids)
    }

    async fn list_running_seeds(&self, limit: u32) -> Result<Vec<String>, ProbeError> {
        let response = self
            .get("/api/v1/seeds/running")
            .query(&[("limit", limit.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<SeedsResponse>()
            .await?;
        Ok(response.seeds)
    }
}
