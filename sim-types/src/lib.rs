//! # sim-types
//!
//! Data model shared by every launchsim crate.
//!
//! - [`StepResult`], [`SimulationLog`], [`AssertionResult`], [`SimulationResult`] - per-scenario records
//! - [`RunSummary`] - aggregate over every executed scenario
//! - [`RoomDocument`] - the content document the corruption engine targets
//! - [`validate_room`] - structural rules a loader enforces on a room
//! - [`TierId`], [`MockIdentity`] - subscription tiers and stand-in identities
//! - [`DocumentError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod document;
mod error;
pub mod fixture;
mod result;
pub mod rules;
mod tier;

pub use document::{BilingualText, EntryCopy, RoomDocument, RoomEntry};
pub use error::DocumentError;
pub use result::{
    now_ms, AssertionResult, LogLevel, RunSummary, SimulationLog, SimulationResult, StepResult,
};
pub use rules::{
    autofix_room, validate_room, Rule, RuleViolation, ValidationMode, ValidationOptions,
    ValidationReport,
};
pub use tier::{can_access, MockIdentity, SubscriptionRecord, TierId, TierSelector};
