//! # sim-report
//!
//! Turns scenario results into launch reports.
//!
//! - [`build_report`] reduces a list of [`SimulationResult`](sim_types::SimulationResult)s
//!   into a [`Report`]: overall summary plus one [`ScenarioReport`] per scenario
//! - [`render_html`] and [`render_text`] present a report without changing it
//! - [`write_artifacts`] writes the JSON and HTML files

#![warn(missing_docs)]
#![warn(clippy::all)]

mod artifacts;
mod error;
mod render;
mod report;

pub use artifacts::{write_artifacts, ArtifactPaths};
pub use error::ReportError;
pub use render::{render_html, render_text};
pub use report::{
    build_report, build_report_at, AssertionCounts, Report, ReportSummary, ScenarioReport,
};
