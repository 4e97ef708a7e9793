//! Outcome types produced by a single evaluation pass

use super::status::Status;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One check's outcome: a status plus whatever the check observed.
///
/// Instances are immutable once handed to the run observer; ownership
/// passes to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub id: String,
    pub component_type: String,
    pub value: Option<serde_json::Value>,
    pub unit: Option<String>,
    pub status: Status,
    pub endpoints: Vec<String>,
    pub links: Vec<String>,
    pub time: DateTime<Utc>,
    pub description: Option<String>,
    pub error: Option<String>,
}

impl CheckResult {
    pub fn new(status: Status) -> Self {
        Self {
            id: String::new(),
            component_type: String::new(),
            value: None,
            unit: None,
            status,
            endpoints: Vec::new(),
            links: Vec::new(),
            time: Utc::now(),
            description: None,
            error: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_component_type(mut self, component_type: impl Into<String>) -> Self {
        self.component_type = component_type.into();
        self
    }

    pub fn with_value(mut self, value: serde_json::Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Captures an error into the result. A result carrying an error must
    /// not report `Pass`.
    pub fn with_error(mut self, error: impl std::fmt::Display) -> Self {
        debug_assert_ne!(self.status, Status::Pass, "a passing result cannot carry an error");
        self.error = Some(error.to_string());
        self
    }
}

/// The ordered results of one component's checks for a single run,
/// tagged with the component's name.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentResult {
    pub name: String,
    pub results: Vec<CheckResult>,
}
