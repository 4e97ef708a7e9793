//! Run coordinator for one evaluation pass

use super::checks::{CheckKind, Component, ProbeSet, RegistryOptions};
use super::model::{CheckResult, ComponentResult};
use super::snapshot::RunSnapshot;
use super::status::Status;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Deadline for each individual probe check. Kept well below typical
    /// HTTP client timeouts so the aggregator stays responsive when a
    /// backend hangs.
    pub check_timeout: Duration,
    /// Deadline for the whole pass.
    pub run_timeout: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(3),
            run_timeout: Duration::from_secs(10),
        }
    }
}

/// Executes all registered components' checks for one evaluation pass.
///
/// Components and their check lists are fixed at construction and never
/// mutated afterward. The coordinator performs no network I/O of its own;
/// it sequences check invocations, bounds each probe check with a
/// deadline, and isolates failures so a bad check degrades only its own
/// result. Dropping the `run_checks` future (client disconnect, process
/// shutdown) cancels the check in flight and stops issuing further
/// checks.
pub struct HealthChecker {
    components: Vec<Component>,
    options: RunOptions,
}

impl HealthChecker {
    pub fn new(options: RunOptions) -> Self {
        Self {
            components: Vec::new(),
            options,
        }
    }

    /// Engine with the default component registry wired to the given
    /// backends.
    pub fn standard(probes: ProbeSet, registry: RegistryOptions, options: RunOptions) -> Self {
        let mut checker = Self::new(options);
        for component in super::checks::standard_components(probes, registry) {
            checker = checker.add_component(component);
        }
        checker
    }

    pub fn add_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Runs one evaluation pass and feeds each component's results to the
    /// observer, in registration order.
    ///
    /// The pass runs in two phases: every probe check first, in
    /// registration order, each bounded by its own deadline; then every
    /// derived check against the completed snapshot. A probe that
    /// overruns its deadline yields a `Warning` result with a captured
    /// timeout error; it never aborts sibling checks or later components.
    pub async fn run_checks<F>(&self, mut observer: F)
    where
        F: FnMut(ComponentResult),
    {
        let run_deadline = Instant::now() + self.options.run_timeout;
        let mut snapshot = RunSnapshot::default();

        // Phase 1: probe checks fill the snapshot; derived slots stay
        // empty until the snapshot is complete.
        let mut collected: Vec<Vec<Option<CheckResult>>> = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let mut results: Vec<Option<CheckResult>> = Vec::with_capacity(component.checks().len());
            for check in component.checks() {
                match check {
                    CheckKind::Probe(check) => {
                        let deadline = run_deadline.min(Instant::now() + self.options.check_timeout);
                        let result = match timeout_at(deadline, check.run(&mut snapshot)).await {
                            Ok(result) => result,
                            Err(_) => {
                                warn!("check in component '{}' timed out", component.id());
                                CheckResult::new(Status::Warning)
                                    .with_error(format!(
                                        "check timed out after {:?}",
                                        self.options.check_timeout
                                    ))
                            }
                        };
                        results.push(Some(result));
                    }
                    CheckKind::Derived(_) => results.push(None),
                }
            }
            collected.push(results);
        }

        // Phase 2: derived checks observe the completed snapshot.
        for (component, results) in self.components.iter().zip(collected.iter_mut()) {
            for (check, slot) in component.checks().iter().zip(results.iter_mut()) {
                if let CheckKind::Derived(check) = check {
                    if slot.is_none() {
                        *slot = Some(check.evaluate(&snapshot));
                    }
                }
            }
        }

        for (component, results) in self.components.iter().zip(collected) {
            debug!("component '{}' evaluated", component.id());
            observer(ComponentResult {
                name: component.id().to_string(),
                results: results.into_iter().flatten().collect(),
            });
        }
    }
}
