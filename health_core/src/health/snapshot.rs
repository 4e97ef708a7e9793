//! Cross-check state shared within a single evaluation pass

use crate::probes::RunStatus;

/// Values captured by probe checks and read by derived checks in the same
/// run. A fresh snapshot is created for every `run_checks` call, so
/// concurrent runs never observe each other's values.
///
/// A slot is `None` when its writer check did not complete; readers treat
/// that as the zero value for the slot.
#[derive(Debug, Clone, Default)]
pub struct RunSnapshot {
    pub run_status: Option<RunStatus>,
    pub queue_size: Option<i64>,
    pub running_jobs: Option<Vec<String>>,
    pub fetching_seeds: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_paused: Option<bool>,
}

impl RunSnapshot {
    pub fn running_jobs(&self) -> &[String] {
        self.running_jobs.as_deref().unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused.unwrap_or(false)
    }
}
