//! Check status ordinals and the status-merge rule

use serde::{Deserialize, Serialize};

/// Severity of a single check outcome, ordered from least to most severe.
///
/// `Undefined` marks a check whose verdict could not be established; it is
/// excluded from merging entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Status {
    Undefined,
    Pass,
    Warning,
    Fail,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Undefined => write!(f, "undefined"),
            Status::Pass => write!(f, "pass"),
            Status::Warning => write!(f, "warning"),
            Status::Fail => write!(f, "fail"),
        }
    }
}

/// How per-check statuses fold into one overall status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The historical rule: the overall status is the least severe
    /// non-`Undefined` status observed. A report where one backend passes
    /// and another fails therefore reads as passing. Kept as the default
    /// on purpose; switch to [`MergePolicy::WorstCase`] to opt out.
    #[default]
    Optimistic,
    /// Conventional health-check semantics: most severe non-`Undefined`
    /// status wins.
    WorstCase,
}

impl Status {
    /// Folds a sequence of statuses into one overall status.
    ///
    /// `Undefined` never contributes; a sequence with no defined status
    /// yields `Pass`.
    pub fn merge<I>(policy: MergePolicy, statuses: I) -> Status
    where
        I: IntoIterator<Item = Status>,
    {
        let defined = statuses.into_iter().filter(|s| *s != Status::Undefined);
        let merged = match policy {
            MergePolicy::Optimistic => defined.min(),
            MergePolicy::WorstCase => defined.max(),
        };
        merged.unwrap_or(Status::Pass)
    }
}
