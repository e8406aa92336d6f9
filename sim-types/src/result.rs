//! Per-scenario result records.
//!
//! Every record here is created once and never mutated after it is handed
//! out by the runner. JSON field names are camelCase so artifacts can be
//! consumed by the same dashboards that read the report.

use serde::{Deserialize, Serialize};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Outcome of a single step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    /// Step name, as declared by the scenario author.
    pub name: String,
    /// True if the action completed without error.
    pub passed: bool,
    /// Wall time spent in the action.
    pub duration_ms: u64,
    /// Error message when the action failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Severity of a scenario log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Informational.
    Info,
    /// Something unexpected that did not fail the scenario.
    Warn,
    /// Something failed.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A free-form log line captured while a scenario runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationLog {
    /// Severity.
    pub level: LogLevel,
    /// Message text.
    pub message: String,
    /// When the line was recorded.
    pub timestamp_ms: u64,
}

/// A recorded boolean check.
///
/// `passed` mirrors `condition`. Both exist because failed assertions are kept
/// for post-hoc inspection rather than thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    /// The evaluated condition.
    pub condition: bool,
    /// What was checked.
    pub message: String,
    /// Whether the check held.
    pub passed: bool,
    /// The author expects this check to come out false; it is reported but
    /// does not fail the scenario.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expected_failure: bool,
}

impl AssertionResult {
    /// Record an ordinary assertion.
    pub fn new(condition: bool, message: impl Into<String>) -> Self {
        Self {
            condition,
            message: message.into(),
            passed: condition,
            expected_failure: false,
        }
    }

    /// Record an assertion whose false outcome is expected by the author.
    pub fn expected_denial(condition: bool, message: impl Into<String>) -> Self {
        Self {
            expected_failure: true,
            ..Self::new(condition, message)
        }
    }

    /// True if this assertion should fail its scenario.
    pub fn fails_scenario(&self) -> bool {
        !self.passed && !self.expected_failure
    }
}

/// Terminal record for one scenario run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Scenario name.
    pub scenario_name: String,
    /// Every step passed and no assertion failed.
    pub passed: bool,
    /// Wall time for the whole scenario.
    pub duration_ms: u64,
    /// One entry per step, in declaration order.
    pub steps: Vec<StepResult>,
    /// Log lines captured during the run.
    pub logs: Vec<SimulationLog>,
    /// Assertions captured during the run.
    pub assertions: Vec<AssertionResult>,
    /// First step error, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SimulationResult {
    /// Number of log lines at `level`.
    pub fn log_count(&self, level: LogLevel) -> usize {
        self.logs.iter().filter(|log| log.level == level).count()
    }

    /// Number of assertions that held.
    pub fn assertions_passed(&self) -> usize {
        self.assertions.iter().filter(|a| a.passed).count()
    }

    /// Number of assertions that did not hold (expected denials included).
    pub fn assertions_failed(&self) -> usize {
        self.assertions.iter().filter(|a| !a.passed).count()
    }

    /// Number of steps that failed.
    pub fn steps_failed(&self) -> usize {
        self.steps.iter().filter(|s| !s.passed).count()
    }
}

/// Aggregate counts across every scenario executed since the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Scenarios executed.
    pub total_scenarios: usize,
    /// Scenarios that passed.
    pub passed_scenarios: usize,
    /// Scenarios that failed.
    pub failed_scenarios: usize,
    /// Steps executed.
    pub total_steps: usize,
    /// Steps that passed.
    pub passed_steps: usize,
    /// Steps that failed.
    pub failed_steps: usize,
    /// Assertions recorded.
    pub total_assertions: usize,
    /// Assertions that held.
    pub passed_assertions: usize,
    /// Assertions that did not hold.
    pub failed_assertions: usize,
    /// Sum of scenario durations.
    pub total_duration_ms: u64,
}

impl RunSummary {
    /// Reduce a list of results into aggregate counts.
    pub fn from_results(results: &[SimulationResult]) -> Self {
        results.iter().fold(Self::default(), |mut acc, result| {
            acc.total_scenarios += 1;
            if result.passed {
                acc.passed_scenarios += 1;
            } else {
                acc.failed_scenarios += 1;
            }

            let failed_steps = result.steps_failed();
            acc.total_steps += result.steps.len();
            acc.failed_steps += failed_steps;
            acc.passed_steps += result.steps.len() - failed_steps;

            acc.total_assertions += result.assertions.len();
            acc.passed_assertions += result.assertions_passed();
            acc.failed_assertions += result.assertions_failed();

            acc.total_duration_ms += result.duration_ms;
            acc
        })
    }

    /// True if every scenario passed (vacuously true for an empty run).
    pub fn all_passed(&self) -> bool {
        self.failed_scenarios == 0
    }
}
