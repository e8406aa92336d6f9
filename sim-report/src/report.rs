//! Reduction of scenario results into a launch report.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sim_types::{LogLevel, SimulationResult};

/// Overall counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Scenarios in the report.
    pub total_scenarios: usize,
    /// Scenarios that passed.
    pub passed_scenarios: usize,
    /// Scenarios that failed.
    pub failed_scenarios: usize,
    /// Sum of scenario durations.
    pub total_duration_ms: u64,
    /// Every scenario passed.
    pub passed: bool,
}

/// Assertion counts for one scenario.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionCounts {
    /// Assertions recorded.
    pub total: usize,
    /// Assertions that held.
    pub passed: usize,
    /// Assertions that did not hold, expected denials included.
    pub failed: usize,
    /// Failed assertions the author expected.
    pub expected_failures: usize,
}

/// One scenario reduced to counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: String,
    /// Scenario passed.
    pub passed: bool,
    /// Scenario wall time.
    pub duration_ms: u64,
    /// Steps executed.
    pub steps: usize,
    /// Steps that failed.
    pub failed_steps: usize,
    /// Error log lines.
    pub errors: usize,
    /// Warning log lines.
    pub warnings: usize,
    /// Assertion counts.
    pub assertions: AssertionCounts,
    /// First step error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&SimulationResult> for ScenarioReport {
    fn from(result: &SimulationResult) -> Self {
        Self {
            name: result.scenario_name.clone(),
            passed: result.passed,
            duration_ms: result.duration_ms,
            steps: result.steps.len(),
            failed_steps: result.steps_failed(),
            errors: result.log_count(LogLevel::Error),
            warnings: result.log_count(LogLevel::Warn),
            assertions: AssertionCounts {
                total: result.assertions.len(),
                passed: result.assertions_passed(),
                failed: result.assertions_failed(),
                expected_failures: result
                    .assertions
                    .iter()
                    .filter(|a| !a.passed && a.expected_failure)
                    .count(),
            },
            error: result.error.clone(),
        }
    }
}

/// A launch report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// RFC 3339 build time.
    pub timestamp: String,
    /// Overall counts.
    pub summary: ReportSummary,
    /// Per-scenario breakdown, in execution order.
    pub scenarios: Vec<ScenarioReport>,
}

impl Report {
    /// Encode as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Build a report stamped with the current time.
pub fn build_report(results: &[SimulationResult]) -> Report {
    build_report_at(results, Utc::now())
}

/// Build a report stamped with `timestamp`.
///
/// The output depends only on the arguments.
pub fn build_report_at(results: &[SimulationResult], timestamp: DateTime<Utc>) -> Report {
    let scenarios: Vec<ScenarioReport> = results.iter().map(ScenarioReport::from).collect();
    let passed_scenarios = scenarios.iter().filter(|s| s.passed).count();

    Report {
        timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        summary: ReportSummary {
            total_scenarios: scenarios.len(),
            passed_scenarios,
            failed_scenarios: scenarios.len() - passed_scenarios,
            total_duration_ms: scenarios.iter().map(|s| s.duration_ms).sum(),
            passed: passed_scenarios == scenarios.len(),
        },
        scenarios,
    }
}
