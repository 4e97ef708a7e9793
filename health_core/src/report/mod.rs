//! Health report wire model
//!
//! The report follows the draft-inadarei-api-health-check JSON shape:
//! one mandatory top-level `status`, plus a `checks` map from component
//! identifier to an ordered list of check objects. Omitted optional
//! fields are absent from the payload, never null. The engine's ordinal
//! status is translated to the `up`/`warn`/`down` vocabulary here and
//! nowhere else.

use crate::health::{CheckResult, ComponentResult, MergePolicy, Status};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Version of the health-check report format itself, carried in the
/// report's `version` field. The build version goes to `releaseId`.
pub const REPORT_VERSION: &str = "1";

/// Boundary vocabulary for statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Up,
    Warn,
    Down,
}

impl From<Status> for ReportStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Pass => ReportStatus::Up,
            Status::Warning => ReportStatus::Warn,
            Status::Fail => ReportStatus::Down,
            // An undefined verdict is reported as a warning rather than
            // invented health.
            Status::Undefined => ReportStatus::Warn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Check {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub component_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_unit: Option<String>,
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affected_endpoints: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub time: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<CheckResult> for Check {
    fn from(result: CheckResult) -> Self {
        Self {
            component_id: result.id,
            component_type: result.component_type,
            observed_value: result.value,
            observed_unit: result.unit,
            status: result.status.into(),
            affected_endpoints: result.endpoints,
            time: result.time.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            output: result.error.unwrap_or_default(),
            links: result.links,
            description: result.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: ReportStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub release_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<BTreeMap<String, Vec<Check>>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub service_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Health {
    /// Minimal healthy report, used by the liveness endpoint.
    pub fn up() -> Self {
        Self {
            status: ReportStatus::Up,
            version: String::new(),
            release_id: String::new(),
            notes: Vec::new(),
            output: String::new(),
            checks: None,
            links: Vec::new(),
            service_id: String::new(),
            description: String::new(),
        }
    }
}

/// Static report metadata, fixed at startup.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub release_id: String,
    pub service_id: String,
    pub description: String,
    pub merge_policy: MergePolicy,
}

/// Observer-side fold of one run: converts every component's results to
/// wire checks and accumulates the overall status under the configured
/// merge policy.
pub struct ReportCollector {
    config: ReportConfig,
    overall: Option<Status>,
    checks: BTreeMap<String, Vec<Check>>,
}

impl ReportCollector {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            overall: None,
            checks: BTreeMap::new(),
        }
    }

    pub fn observe(&mut self, component: ComponentResult) {
        for result in &component.results {
            if result.status == Status::Undefined {
                continue;
            }
            self.overall = Some(match (self.config.merge_policy, self.overall) {
                (_, None) => result.status,
                (MergePolicy::Optimistic, Some(current)) => current.min(result.status),
                (MergePolicy::WorstCase, Some(current)) => current.max(result.status),
            });
        }
        self.checks.insert(
            component.name,
            component.results.into_iter().map(Check::from).collect(),
        );
    }

    pub fn finish(self) -> Health {
        Health {
            status: self.overall.unwrap_or(Status::Pass).into(),
            version: REPORT_VERSION.to_string(),
            release_id: self.config.release_id,
            notes: Vec::new(),
            output: String::new(),
            checks: Some(self.checks),
            links: Vec::new(),
            service_id: self.config.service_id,
            description: self.config.description,
        }
    }
}
