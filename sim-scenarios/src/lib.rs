//! # sim-scenarios
//!
//! Launch scenarios for launchsim and the subject-under-test they drive.
//!
//! - [`subject`] - bundled room catalog, the loader that fetches and
//!   validates rooms through the host, mock tier identities, audio probe
//!   and repeated-load stress check
//! - [`scenarios`] - Content Load All, Tier Boundary Check, Corrupted Document
//!   Boot and the device journeys
//! - [`run_all`] / [`run_devices`] - sequential run-all entry points
//!
//! ```no_run
//! use launchsim_scenarios::{run_all, ScenarioContext};
//! use sim_core::ScenarioRunner;
//! use sim_env::NetworkSettings;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let ctx = ScenarioContext::with_fixtures(ScenarioRunner::default(), NetworkSettings::default())?;
//! let results = run_all(&ctx).await?;
//! println!("{} scenarios", results.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod registry;
pub mod scenarios;
pub mod subject;

pub use error::LoadError;
pub use registry::{run_all, run_devices};
pub use scenarios::device_journeys::DEFAULT_SMOKE_DEVICES;
pub use scenarios::ScenarioContext;
pub use subject::audio::{audio_probe, audio_stress, AudioProbeReport, StressOptions};
pub use subject::loader::{CatalogLoader, LoadOutcome, RoomLoader};
pub use subject::tiers::{MockTierProvider, TierProvider};
