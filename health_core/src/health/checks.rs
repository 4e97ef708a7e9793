//! Check units and the default component registry
//!
//! A probe check performs one bounded backend call, records what it saw
//! into the run snapshot, and returns a [`CheckResult`]. A derived check
//! performs no I/O; it computes its verdict from the completed snapshot
//! after every probe check has run.

use super::model::CheckResult;
use super::snapshot::RunSnapshot;
use super::status::Status;
use crate::probes::{
    ControlPlaneProbe, MetricsProbe, ProbeError, ReachabilityProbe, RelationalProbe,
};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::warn;

pub const COMPONENT_VERSION: &str = "crawler:version";
pub const COMPONENT_STATUS: &str = "crawler:status";
pub const COMPONENT_EXECUTIONS: &str = "crawler:executions";
pub const COMPONENT_FETCHING: &str = "crawler:fetching";
pub const COMPONENT_ACTIVITY: &str = "crawler:activity";
pub const COMPONENT_PAUSED: &str = "crawler:paused";
pub const COMPONENT_DASHBOARD: &str = "crawler:dashboard";
pub const COMPONENT_HARVEST: &str = "crawler:harvest";

const TYPE_HARVESTER: &str = "harvester";
const TYPE_DATASTORE: &str = "datastore";
const TYPE_WEB: &str = "web";

/// A probe-backed check. Must return within the deadline the coordinator
/// imposes and must capture ordinary backend failures into the result
/// rather than panicking.
#[async_trait::async_trait]
pub trait Check: Send + Sync {
    async fn run(&self, snapshot: &mut RunSnapshot) -> CheckResult;
}

/// A check computed purely from the snapshot, after all probe checks of
/// the run have completed.
pub trait DerivedCheck: Send + Sync {
    fn evaluate(&self, snapshot: &RunSnapshot) -> CheckResult;
}

pub enum CheckKind {
    Probe(Box<dyn Check>),
    Derived(Box<dyn DerivedCheck>),
}

/// A named, ordered group of checks reported together under one key.
pub struct Component {
    id: String,
    checks: Vec<CheckKind>,
}

impl Component {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            checks: Vec::new(),
        }
    }

    pub fn with_check<C: Check + 'static>(mut self, check: C) -> Self {
        self.checks.push(CheckKind::Probe(Box::new(check)));
        self
    }

    pub fn with_derived_check<C: DerivedCheck + 'static>(mut self, check: C) -> Self {
        self.checks.push(CheckKind::Derived(Box::new(check)));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn checks(&self) -> &[CheckKind] {
        &self.checks
    }
}

/// The backends the default registry is assembled against.
#[derive(Clone)]
pub struct ProbeSet {
    pub control_plane: Arc<dyn ControlPlaneProbe>,
    pub metrics: Arc<dyn MetricsProbe>,
    pub relational: Arc<dyn RelationalProbe>,
    pub web: Arc<dyn ReachabilityProbe>,
}

#[derive(Debug, Clone)]
pub struct RegistryOptions {
    pub versions_path: PathBuf,
    pub dashboard_url: String,
    pub seed_page_size: u32,
}

/// Builds the default component registry. Probe checks that feed the
/// snapshot are registered strictly before the derived harvest check
/// that reads it.
pub fn standard_components(probes: ProbeSet, options: RegistryOptions) -> Vec<Component> {
    vec![
        Component::new(COMPONENT_VERSION).with_check(VersionCheck::new(options.versions_path)),
        Component::new(COMPONENT_STATUS).with_check(StatusCheck {
            control_plane: probes.control_plane.clone(),
        }),
        Component::new(COMPONENT_EXECUTIONS).with_check(ExecutionsCheck {
            control_plane: probes.control_plane.clone(),
        }),
        Component::new(COMPONENT_FETCHING).with_check(FetchingCheck {
            control_plane: probes.control_plane,
            limit: options.seed_page_size,
        }),
        Component::new(COMPONENT_ACTIVITY).with_check(ActivityCheck {
            metrics: probes.metrics,
        }),
        Component::new(COMPONENT_PAUSED).with_check(PausedCheck {
            relational: probes.relational,
        }),
        Component::new(COMPONENT_DASHBOARD).with_check(ReachabilityCheck {
            web: probes.web,
            url: options.dashboard_url,
        }),
        Component::new(COMPONENT_HARVEST).with_derived_check(HarvestCheck),
    ]
}

/// Reads the deployed component versions from a local file.
///
/// The file changes only on redeploy, so the result is computed at most
/// once per engine lifetime and the cached result is returned on every
/// later run, original timestamp included. A failed first read is cached
/// permanently as well; there is no retry for the life of the engine.
pub struct VersionCheck {
    versions_path: PathBuf,
    cached: OnceCell<CheckResult>,
}

impl VersionCheck {
    pub fn new(versions_path: PathBuf) -> Self {
        Self {
            versions_path,
            cached: OnceCell::new(),
        }
    }

    async fn read_versions(&self) -> CheckResult {
        let parsed = tokio::fs::read_to_string(&self.versions_path)
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                serde_json::from_str::<serde_json::Value>(&raw).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(versions) => CheckResult::new(Status::Pass).with_value(versions),
            Err(e) => {
                warn!(
                    "failed to read versions file {}: {}",
                    self.versions_path.display(),
                    e
                );
                CheckResult::new(Status::Warning).with_error(e)
            }
        }
    }
}

#[async_trait::async_trait]
impl Check for VersionCheck {
    async fn run(&self, _snapshot: &mut RunSnapshot) -> CheckResult {
        self.cached
            .get_or_init(|| self.read_versions())
            .await
            .clone()
    }
}

/// Control-plane run state and frontier queue size.
pub struct StatusCheck {
    pub control_plane: Arc<dyn ControlPlaneProbe>,
}

#[async_trait::async_trait]
impl Check for StatusCheck {
    async fn run(&self, snapshot: &mut RunSnapshot) -> CheckResult {
        match self.control_plane.get_status().await {
            Ok(status) => {
                snapshot.run_status = Some(status.run_status);
                snapshot.queue_size = Some(status.queue_size);
                CheckResult::new(Status::Pass)
                    .with_component_type(TYPE_HARVESTER)
                    .with_value(json!({
                        "runStatus": status.run_status.to_string(),
                        "queueSize": status.queue_size,
                    }))
            }
            Err(e) => probe_failure(TYPE_HARVESTER, "control plane status", e),
        }
    }
}

/// Identifiers of currently running crawl job executions.
pub struct ExecutionsCheck {
    pub control_plane: Arc<dyn ControlPlaneProbe>,
}

#[async_trait::async_trait]
impl Check for ExecutionsCheck {
    async fn run(&self, snapshot: &mut RunSnapshot) -> CheckResult {
        match self.control_plane.list_job_executions().await {
            Ok(ids) => {
                snapshot.running_jobs = Some(ids.clone());
                CheckResult::new(Status::Pass)
                    .with_component_type(TYPE_HARVESTER)
                    .with_value(json!(ids))
            }
            Err(e) => probe_failure(TYPE_HARVESTER, "job executions", e),
        }
    }
}

/// Names of seeds currently being fetched.
pub struct FetchingCheck {
    pub control_plane: Arc<dyn ControlPlaneProbe>,
    pub limit: u32,
}

#[async_trait::async_trait]
impl Check for FetchingCheck {
    async fn run(&self, snapshot: &mut RunSnapshot) -> CheckResult {
        match self.control_plane.list_running_seeds(self.limit).await {
            Ok(seeds) => {
                snapshot.fetching_seeds = Some(seeds.clone());
                CheckResult::new(Status::Pass)
                    .with_component_type(TYPE_HARVESTER)
                    .with_value(json!(seeds))
            }
            Err(e) => probe_failure(TYPE_HARVESTER, "running seeds", e),
        }
    }
}

/// Recent page traffic according to the metrics backend.
pub struct ActivityCheck {
    pub metrics: Arc<dyn MetricsProbe>,
}

#[async_trait::async_trait]
impl Check for ActivityCheck {
    async fn run(&self, snapshot: &mut RunSnapshot) -> CheckResult {
        match self.metrics.is_activity().await {
            Ok(active) => {
                snapshot.is_active = Some(active);
                CheckResult::new(Status::Pass)
                    .with_component_type(TYPE_HARVESTER)
                    .with_value(json!(active))
            }
            Err(e) => probe_failure(TYPE_HARVESTER, "activity", e),
        }
    }
}

/// Operator pause flag from the relational store.
pub struct PausedCheck {
    pub relational: Arc<dyn RelationalProbe>,
}

#[async_trait::async_trait]
impl Check for PausedCheck {
    async fn run(&self, snapshot: &mut RunSnapshot) -> CheckResult {
        match self.relational.check_is_paused().await {
            Ok(paused) => {
                snapshot.is_paused = Some(paused);
                CheckResult::new(Status::Pass)
                    .with_component_type(TYPE_DATASTORE)
                    .with_value(json!(paused))
            }
            Err(e) => probe_failure(TYPE_DATASTORE, "pause flag", e),
        }
    }
}

/// HEAD reachability of the dashboard.
pub struct ReachabilityCheck {
    pub web: Arc<dyn ReachabilityProbe>,
    pub url: String,
}

/// Maps a response code to a verdict: server errors are failures, client
/// errors a warning, anything below 400 a pass.
fn reachability_status(status_code: u16) -> Status {
    if status_code < 400 {
        Status::Pass
    } else if status_code >= 500 {
        Status::Fail
    } else {
        Status::Warning
    }
}

#[async_trait::async_trait]
impl Check for ReachabilityCheck {
    async fn run(&self, _snapshot: &mut RunSnapshot) -> CheckResult {
        let result = match self.web.check_reachable(&self.url).await {
            Ok((status_code, status_line)) => {
                let status = reachability_status(status_code);
                let mut result = CheckResult::new(status)
                    .with_component_type(TYPE_WEB)
                    .with_value(json!(status_line.clone()));
                if status != Status::Pass {
                    result = result.with_error(status_line);
                }
                result
            }
            Err(e) => {
                warn!("dashboard probe failed for {}: {}", self.url, e);
                CheckResult::new(Status::Fail)
                    .with_component_type(TYPE_WEB)
                    .with_error(e)
            }
        };
        result.with_endpoints(vec![self.url.clone()])
    }
}

/// Derived harvest verdict, computed from slots written by the status,
/// executions, activity, and paused checks earlier in the same run.
pub struct HarvestCheck;

impl DerivedCheck for HarvestCheck {
    fn evaluate(&self, snapshot: &RunSnapshot) -> CheckResult {
        let paused = snapshot.is_paused();
        let active = snapshot.is_active();
        let jobs_running = !snapshot.running_jobs().is_empty();

        if paused && active {
            CheckResult::new(Status::Warning)
                .with_component_type(TYPE_HARVESTER)
                .with_description("harvesting is paused but activity continues")
        } else if !paused && jobs_running && !active {
            CheckResult::new(Status::Fail)
                .with_component_type(TYPE_HARVESTER)
                .with_description("jobs are running but no pages are being harvested")
        } else {
            CheckResult::new(Status::Pass).with_component_type(TYPE_HARVESTER)
        }
    }
}

fn probe_failure(component_type: &str, what: &str, error: ProbeError) -> CheckResult {
    warn!("{} probe failed: {}", what, error);
    CheckResult::new(Status::Warning)
        .with_component_type(component_type)
        .with_error(error)
}
