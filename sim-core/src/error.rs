//! Error types for sim-core.

use thiserror::Error;

/// Errors returned by the scenario runner itself.
///
/// Step failures and failed assertions are not errors; they are recorded in
/// the [`SimulationResult`](sim_types::SimulationResult).
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A scenario was started while another one was still running.
    #[error("cannot start {requested:?}: scenario {running:?} is still running")]
    ScenarioInProgress {
        /// Scenario currently running.
        running: String,
        /// Scenario that was requested.
        requested: String,
    },
}
