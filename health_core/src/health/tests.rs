use super::checks::{
    ProbeSet, RegistryOptions, COMPONENT_ACTIVITY, COMPONENT_DASHBOARD, COMPONENT_EXECUTIONS,
    COMPONENT_FETCHING, COMPONENT_HARVEST, COMPONENT_PAUSED, COMPONENT_STATUS, COMPONENT_VERSION,
};
use super::model::ComponentResult;
use super::runner::{HealthChecker, RunOptions};
use super::status::{MergePolicy, Status};
use crate::probes::{
    ControlPlaneProbe, CrawlerStatus, MetricsProbe, ProbeError, ReachabilityProbe,
    RelationalProbe, RunStatus,
};
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct MockControlPlane {
    run_status: RunStatus,
    queue_size: i64,
    executions: Vec<String>,
    seeds: Vec<String>,
    fail: bool,
}

impl Default for MockControlPlane {
    fn default() -> Self {
        Self {
            run_status: RunStatus::Running,
            queue_size: 0,
            executions: Vec::new(),
            seeds: Vec::new(),
            fail: false,
        }
    }
}

#[async_trait::async_trait]
impl ControlPlaneProbe for MockControlPlane {
    async fn get_status(&self) -> Result<CrawlerStatus, ProbeError> {
        if self.fail {
            return Err(ProbeError::UnexpectedResponse("control plane down".to_string()));
        }
        Ok(CrawlerStatus {
            run_status: self.run_status,
            queue_size: self.queue_size,
        })
    }

    async fn list_job_executions(&self) -> Result<Vec<String>, ProbeError> {
        if self.fail {
            return Err(ProbeError::UnexpectedResponse("control plane down".to_string()));
        }
        Ok(self.executions.clone())
    }

    async fn list_running_seeds(&self, limit: u32) -> Result<Vec<String>, ProbeError> {
        if self.fail {
            return Err(ProbeError::UnexpectedResponse("control plane down".to_string()));
        }
        Ok(self.seeds.iter().take(limit as usize).cloned().collect())
    }
}

struct MockMetrics {
    active: bool,
    fail: bool,
}

#[async_trait::async_trait]
impl MetricsProbe for MockMetrics {
    async fn is_activity(&self) -> Result<bool, ProbeError> {
        if self.fail {
            return Err(ProbeError::UnexpectedResponse("metrics down".to_string()));
        }
        Ok(self.active)
    }
}

struct MockRelational {
    paused: bool,
    fail: bool,
}

#[async_trait::async_trait]
impl RelationalProbe for MockRelational {
    async fn check_is_paused(&self) -> Result<bool, ProbeError> {
        if self.fail {
            return Err(ProbeError::UnexpectedResponse("database down".to_string()));
        }
        Ok(self.paused)
    }
}

struct MockWeb {
    status_code: u16,
    fail: bool,
}

impl Default for MockWeb {
    fn default() -> Self {
        Self {
            status_code: 200,
            fail: false,
        }
    }
}

#[async_trait::async_trait]
impl ReachabilityProbe for MockWeb {
    async fn check_reachable(&self, _url: &str) -> Result<(u16, String), ProbeError> {
        if self.fail {
            return Err(ProbeError::UnexpectedResponse("connection refused".to_string()));
        }
        Ok((self.status_code, format!("{} mock", self.status_code)))
    }
}

/// Relational probe that sleeps before answering and hands out a
/// different pause flag on every call.
struct SlowTogglingRelational {
    calls: AtomicUsize,
    delay: Duration,
}

#[async_trait::async_trait]
impl RelationalProbe for SlowTogglingRelational {
    async fn check_is_paused(&self) -> Result<bool, ProbeError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(call % 2 == 0)
    }
}

struct NeverReturnsMetrics;

#[async_trait::async_trait]
impl MetricsProbe for NeverReturnsMetrics {
    async fn is_activity(&self) -> Result<bool, ProbeError> {
        std::future::pending::<()>().await;
        unreachable!()
    }
}

struct ProbeSetBuilder {
    control_plane: Arc<dyn ControlPlaneProbe>,
    metrics: Arc<dyn MetricsProbe>,
    relational: Arc<dyn RelationalProbe>,
    web: Arc<dyn ReachabilityProbe>,
}

impl Default for ProbeSetBuilder {
    fn default() -> Self {
        Self {
            control_plane: Arc::new(MockControlPlane::default()),
            metrics: Arc::new(MockMetrics {
                active: false,
                fail: false,
            }),
            relational: Arc::new(MockRelational {
                paused: false,
                fail: false,
            }),
            web: Arc::new(MockWeb::default()),
        }
    }
}

impl ProbeSetBuilder {
    fn control_plane(mut self, probe: impl ControlPlaneProbe + 'static) -> Self {
        self.control_plane = Arc::new(probe);
        self
    }

    fn metrics(mut self, probe: impl MetricsProbe + 'static) -> Self {
        self.metrics = Arc::new(probe);
        self
    }

    fn relational(mut self, probe: impl RelationalProbe + 'static) -> Self {
        self.relational = Arc::new(probe);
        self
    }

    fn web(mut self, probe: impl ReachabilityProbe + 'static) -> Self {
        self.web = Arc::new(probe);
        self
    }

    fn build(self) -> ProbeSet {
        ProbeSet {
            control_plane: self.control_plane,
            metrics: self.metrics,
            relational: self.relational,
            web: self.web,
        }
    }
}

fn registry_options(versions_path: std::path::PathBuf) -> RegistryOptions {
    RegistryOptions {
        versions_path,
        dashboard_url: "http://dashboard.test".to_string(),
        seed_page_size: 5,
    }
}

fn checker(probes: ProbeSet) -> HealthChecker {
    checker_with_options(probes, RunOptions::default())
}

fn checker_with_options(probes: ProbeSet, options: RunOptions) -> HealthChecker {
    HealthChecker::standard(
        probes,
        registry_options(std::path::PathBuf::from("/nonexistent/versions.json")),
        options,
    )
}

async fn run_collect(checker: &HealthChecker) -> Vec<ComponentResult> {
    let mut collected = Vec::new();
    checker.run_checks(|component| collected.push(component)).await;
    collected
}

fn component<'a>(results: &'a [ComponentResult], name: &str) -> &'a ComponentResult {
    results
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("component '{}' missing from run", name))
}

#[test]
fn merge_returns_least_severe_defined_status() {
    let statuses = vec![Status::Fail, Status::Warning, Status::Pass];
    assert_eq!(
        Status::merge(MergePolicy::Optimistic, statuses),
        Status::Pass
    );

    let statuses = vec![Status::Fail, Status::Warning];
    assert_eq!(
        Status::merge(MergePolicy::Optimistic, statuses),
        Status::Warning
    );

    let statuses = vec![Status::Fail, Status::Undefined];
    assert_eq!(Status::merge(MergePolicy::Optimistic, statuses), Status::Fail);
}

#[test]
fn merge_of_single_warning_is_warning() {
    assert_eq!(
        Status::merge(MergePolicy::Optimistic, vec![Status::Warning]),
        Status::Warning
    );
}

#[test]
fn merge_ignores_undefined_entirely() {
    let statuses = vec![Status::Undefined, Status::Pass, Status::Undefined];
    assert_eq!(
        Status::merge(MergePolicy::Optimistic, statuses),
        Status::Pass
    );

    let statuses = vec![Status::Undefined, Status::Fail];
    assert_eq!(Status::merge(MergePolicy::Optimistic, statuses), Status::Fail);
}

#[test]
fn merge_of_all_undefined_defaults_to_pass() {
    let statuses = vec![Status::Undefined, Status::Undefined];
    assert_eq!(
        Status::merge(MergePolicy::Optimistic, statuses),
        Status::Pass
    );
    assert_eq!(Status::merge(MergePolicy::Optimistic, vec![]), Status::Pass);
}

#[test]
fn worst_case_merge_returns_most_severe() {
    let statuses = vec![Status::Pass, Status::Warning, Status::Fail, Status::Undefined];
    assert_eq!(Status::merge(MergePolicy::WorstCase, statuses), Status::Fail);

    let statuses = vec![Status::Pass, Status::Warning];
    assert_eq!(
        Status::merge(MergePolicy::WorstCase, statuses),
        Status::Warning
    );

    assert_eq!(Status::merge(MergePolicy::WorstCase, vec![]), Status::Pass);
}

#[tokio::test]
async fn run_visits_components_in_registration_order() {
    let checker = checker(ProbeSetBuilder::default().build());
    let results = run_collect(&checker).await;

    let names: Vec<&str> = results.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            COMPONENT_VERSION,
            COMPONENT_STATUS,
            COMPONENT_EXECUTIONS,
            COMPONENT_FETCHING,
            COMPONENT_ACTIVITY,
            COMPONENT_PAUSED,
            COMPONENT_DASHBOARD,
            COMPONENT_HARVEST,
        ]
    );
}

#[tokio::test]
async fn harvest_warns_when_paused_but_active() {
    let probes = ProbeSetBuilder::default()
        .relational(MockRelational {
            paused: true,
            fail: false,
        })
        .metrics(MockMetrics {
            active: true,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let harvest = &component(&results, COMPONENT_HARVEST).results[0];
    assert_eq!(harvest.status, Status::Warning);
}

#[tokio::test]
async fn harvest_passes_when_paused_and_quiescent() {
    let probes = ProbeSetBuilder::default()
        .relational(MockRelational {
            paused: true,
            fail: false,
        })
        .metrics(MockMetrics {
            active: false,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let harvest = &component(&results, COMPONENT_HARVEST).results[0];
    assert_eq!(harvest.status, Status::Pass);
}

#[tokio::test]
async fn harvest_fails_when_jobs_exist_but_nothing_happens() {
    let probes = ProbeSetBuilder::default()
        .control_plane(MockControlPlane {
            executions: vec!["job1".to_string()],
            ..MockControlPlane::default()
        })
        .relational(MockRelational {
            paused: false,
            fail: false,
        })
        .metrics(MockMetrics {
            active: false,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let harvest = &component(&results, COMPONENT_HARVEST).results[0];
    assert_eq!(harvest.status, Status::Fail);
    assert!(harvest.description.is_some());
}

#[tokio::test]
async fn harvest_passes_when_idle_and_active() {
    let probes = ProbeSetBuilder::default()
        .metrics(MockMetrics {
            active: true,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let harvest = &component(&results, COMPONENT_HARVEST).results[0];
    assert_eq!(harvest.status, Status::Pass);
}

#[tokio::test]
async fn failing_probe_degrades_only_its_own_component() {
    let probes = ProbeSetBuilder::default()
        .control_plane(MockControlPlane {
            fail: true,
            ..MockControlPlane::default()
        })
        .metrics(MockMetrics {
            active: true,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    // Every component still reported, in order.
    assert_eq!(results.len(), 8);

    let status = &component(&results, COMPONENT_STATUS).results[0];
    assert_eq!(status.status, Status::Warning);
    assert!(status.error.is_some());

    let activity = &component(&results, COMPONENT_ACTIVITY).results[0];
    assert_eq!(activity.status, Status::Pass);
    assert_eq!(activity.value, Some(serde_json::json!(true)));
}

#[tokio::test]
async fn every_captured_error_comes_with_a_degraded_status() {
    let probes = ProbeSetBuilder::default()
        .control_plane(MockControlPlane {
            fail: true,
            ..MockControlPlane::default()
        })
        .metrics(MockMetrics {
            active: false,
            fail: true,
        })
        .relational(MockRelational {
            paused: false,
            fail: true,
        })
        .web(MockWeb {
            status_code: 0,
            fail: true,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    for component in &results {
        for result in &component.results {
            if result.error.is_some() {
                assert_ne!(
                    result.status,
                    Status::Pass,
                    "component '{}' captured an error but passed",
                    component.name
                );
            }
        }
    }
}

#[tokio::test]
async fn dashboard_server_error_is_a_failure() {
    let probes = ProbeSetBuilder::default()
        .web(MockWeb {
            status_code: 503,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let dashboard = &component(&results, COMPONENT_DASHBOARD).results[0];
    assert_eq!(dashboard.status, Status::Fail);
    assert_eq!(
        dashboard.endpoints,
        vec!["http://dashboard.test".to_string()]
    );
    assert!(dashboard.error.as_deref().unwrap().contains("503"));
}

#[tokio::test]
async fn dashboard_client_error_is_a_warning() {
    let probes = ProbeSetBuilder::default()
        .web(MockWeb {
            status_code: 404,
            fail: false,
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let dashboard = &component(&results, COMPONENT_DASHBOARD).results[0];
    assert_eq!(dashboard.status, Status::Warning);
}

#[tokio::test]
async fn slow_check_times_out_without_stalling_the_run() {
    let probes = ProbeSetBuilder::default()
        .metrics(NeverReturnsMetrics)
        .build();
    let options = RunOptions {
        check_timeout: Duration::from_millis(50),
        run_timeout: Duration::from_secs(2),
    };
    let checker = checker_with_options(probes, options);

    let started = std::time::Instant::now();
    let results = run_collect(&checker).await;
    assert!(
        started.elapsed() < Duration::from_secs(1),
        "run blocked on a hung check"
    );

    let activity = &component(&results, COMPONENT_ACTIVITY).results[0];
    assert_eq!(activity.status, Status::Warning);
    assert!(activity.error.as_deref().unwrap().contains("timed out"));

    // Later components still ran.
    let dashboard = &component(&results, COMPONENT_DASHBOARD).results[0];
    assert_eq!(dashboard.status, Status::Pass);
}

#[tokio::test]
async fn memoized_version_check_returns_the_first_result_forever() {
    let mut versions_file = tempfile::NamedTempFile::new().unwrap();
    write!(versions_file, r#"{{"controller":"2.1.0","frontier":"1.4.2"}}"#).unwrap();

    let checker = HealthChecker::standard(
        ProbeSetBuilder::default().build(),
        registry_options(versions_file.path().to_path_buf()),
        RunOptions::default(),
    );

    let first = run_collect(&checker).await;
    let first_version = component(&first, COMPONENT_VERSION).results[0].clone();
    assert_eq!(first_version.status, Status::Pass);
    assert_eq!(
        first_version.value,
        Some(serde_json::json!({"controller":"2.1.0","frontier":"1.4.2"}))
    );

    // Remove the file: the cached result must be served unchanged,
    // original timestamp included.
    drop(versions_file);
    for _ in 0..3 {
        let again = run_collect(&checker).await;
        assert_eq!(component(&again, COMPONENT_VERSION).results[0], first_version);
    }
}

#[tokio::test]
async fn memoized_version_check_caches_a_failed_first_attempt() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("versions.json");

    let checker = HealthChecker::standard(
        ProbeSetBuilder::default().build(),
        registry_options(path.clone()),
        RunOptions::default(),
    );

    let first = run_collect(&checker).await;
    let first_version = component(&first, COMPONENT_VERSION).results[0].clone();
    assert_eq!(first_version.status, Status::Warning);
    assert!(first_version.error.is_some());

    // The file appearing later must not be picked up; the failure is
    // cached for the engine's lifetime.
    std::fs::write(&path, r#"{"controller":"2.1.0"}"#).unwrap();
    let again = run_collect(&checker).await;
    assert_eq!(component(&again, COMPONENT_VERSION).results[0], first_version);
}

#[tokio::test]
async fn concurrent_runs_do_not_share_snapshot_state() {
    let probes = ProbeSetBuilder::default()
        .relational(SlowTogglingRelational {
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(30),
        })
        .metrics(MockMetrics {
            active: true,
            fail: false,
        })
        .build();
    let checker = Arc::new(checker(probes));

    let (first, second) = tokio::join!(run_collect(&checker), run_collect(&checker));

    for results in [&first, &second] {
        let paused = component(results, COMPONENT_PAUSED).results[0]
            .value
            .clone()
            .and_then(|v| v.as_bool())
            .unwrap();
        let harvest = &component(results, COMPONENT_HARVEST).results[0];
        // paused && active must warn; !paused && active must pass. Either
        // way the harvest verdict must match the paused flag observed by
        // the same run, never the concurrent one.
        let expected = if paused { Status::Warning } else { Status::Pass };
        assert_eq!(harvest.status, expected);
    }

    let first_paused = component(&first, COMPONENT_PAUSED).results[0].value.clone();
    let second_paused = component(&second, COMPONENT_PAUSED).results[0].value.clone();
    assert_ne!(first_paused, second_paused, "both runs saw the same toggled flag");
}

#[tokio::test]
async fn fetching_check_honors_the_page_limit() {
    let probes = ProbeSetBuilder::default()
        .control_plane(MockControlPlane {
            seeds: (0..10).map(|i| format!("seed{}", i)).collect(),
            ..MockControlPlane::default()
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let fetching = &component(&results, COMPONENT_FETCHING).results[0];
    let seeds = fetching.value.as_ref().unwrap().as_array().unwrap();
    assert_eq!(seeds.len(), 5);
}

#[tokio::test]
async fn status_check_reports_run_state_and_queue_size() {
    let probes = ProbeSetBuilder::default()
        .control_plane(MockControlPlane {
            run_status: RunStatus::Paused,
            queue_size: 17,
            ..MockControlPlane::default()
        })
        .build();
    let results = run_collect(&checker(probes)).await;

    let status = &component(&results, COMPONENT_STATUS).results[0];
    assert_eq!(status.status, Status::Pass);
    assert_eq!(
        status.value,
        Some(serde_json::json!({"runStatus": "PAUSED", "queueSize": 17}))
    );
}
