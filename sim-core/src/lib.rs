//! # sim-core
//!
//! Scenario execution and structural fault injection for launchsim.
//!
//! - [`runner`] executes named steps in order, captures per-step outcomes,
//!   log lines and assertions, and keeps the history of every scenario run
//!   since the last reset.
//! - [`corruption`] turns a well-formed [`RoomDocument`](sim_types::RoomDocument)
//!   into one that violates exactly one structural rule.
//!
//! Neither module touches the environment; network, device and accessibility
//! perturbations live in `sim-env`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod corruption;
mod error;
pub mod runner;

pub use corruption::{
    apply_random_corruption, apply_random_corruption_with, corruptors, CorruptedRoom, Corruptor,
    Dimension,
};
pub use error::RunnerError;
pub use runner::{RunnerOptions, ScenarioRunner, Step, StepFuture};
