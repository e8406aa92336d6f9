//! Launch scenarios.
//!
//! | Module | Scenario | Exercises |
//! |--------|----------|-----------|
//! | `content_load` | Content Load All | loader, audio probe, storage cache |
//! | `tier_boundary` | Tier Boundary Check | tier provider, access rule |
//! | `corrupted_boot` | Corrupted Document Boot | corruption engine, validator |
//! | `device_journeys` | iPhone SE / Low-End Android / Device Smoke | device manager, all simulators |
//!
//! Every scenario takes a [`ScenarioContext`] and records exactly one result
//! on its runner.

use sim_core::ScenarioRunner;
use sim_env::{Host, NetworkSettings};
use sim_types::DocumentError;
use std::sync::Arc;

use crate::subject::catalog::fixture_origin;
use crate::subject::loader::{CatalogLoader, RoomLoader};
use crate::subject::tiers::{MockTierProvider, TierProvider};

pub mod content_load;
pub mod corrupted_boot;
pub mod device_journeys;
pub mod tier_boundary;

/// Room every journey loads.
pub(crate) const JOURNEY_ROOM: &str = "morning_focus_vip1";

/// Everything a scenario needs, passed explicitly.
///
/// Cloning is cheap; every field is a shared handle.
#[derive(Clone)]
pub struct ScenarioContext {
    /// Records results, logs and assertions.
    pub runner: ScenarioRunner,
    /// Environment the simulators perturb.
    pub host: Host,
    /// Room loader under test.
    pub loader: Arc<dyn RoomLoader>,
    /// Identity provider under test.
    pub tiers: Arc<dyn TierProvider>,
}

impl ScenarioContext {
    /// Bind the bundled loader and tier provider to `host`, and route host
    /// warnings into `runner`.
    pub fn new(runner: ScenarioRunner, host: Host) -> Self {
        host.attach_runner(runner.clone());
        Self {
            loader: Arc::new(CatalogLoader::new(host.clone())),
            tiers: Arc::new(MockTierProvider),
            runner,
            host,
        }
    }

    /// A context whose host serves the bundled content catalog.
    pub fn with_fixtures(
        runner: ScenarioRunner,
        settings: NetworkSettings,
    ) -> Result<Self, DocumentError> {
        let origin = fixture_origin()?;
        let host = Host::with_settings(Arc::new(origin), settings);
        Ok(Self::new(runner, host))
    }
}

impl std::fmt::Debug for ScenarioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenarioContext")
            .field("runner", &self.runner)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}
