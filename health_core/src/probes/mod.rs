//! Backend probe adapters
//!
//! Each backend the service observes is wrapped in a narrow capability
//! trait so the engine can be assembled against test doubles. The
//! concrete clients are thin request/response adapters; they carry no
//! retry or caching logic of their own.

pub mod control_plane;
pub mod metrics;
pub mod relational;
pub mod web;

pub use control_plane::{ControlPlaneClient, ControlPlaneOptions, CrawlerStatus, RunStatus};
pub use metrics::{MetricsClient, MetricsOptions};
pub use relational::RelationalClient;
pub use web::WebClient;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Status queries against the crawl control plane.
#[async_trait::async_trait]
pub trait ControlPlaneProbe: Send + Sync {
    /// Current run state and frontier queue size.
    async fn get_status(&self) -> Result<CrawlerStatus, ProbeError>;

    /// Identifiers of crawl job executions currently running.
    async fn list_job_executions(&self) -> Result<Vec<String>, ProbeError>;

    /// Names of seeds currently being fetched, at most `limit`.
    async fn list_running_seeds(&self, limit: u32) -> Result<Vec<String>, ProbeError>;
}

/// Activity queries against the metrics backend.
#[async_trait::async_trait]
pub trait MetricsProbe: Send + Sync {
    /// Whether the crawler produced page traffic recently.
    async fn is_activity(&self) -> Result<bool, ProbeError>;
}

/// State queries against the relational store.
#[async_trait::async_trait]
pub trait RelationalProbe: Send + Sync {
    /// Whether harvesting is administratively paused.
    async fn check_is_paused(&self) -> Result<bool, ProbeError>;
}

/// Reachability queries against plain web endpoints.
#[async_trait::async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// HEAD-requests `url`, returning the status code and status line.
    async fn check_reachable(&self, url: &str) -> Result<(u16, String), ProbeError>;
}
