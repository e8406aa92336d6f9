//! The host capability object.
//!
//! Everything a simulator perturbs lives here instead of in process globals:
//! the network primitive, persistent key-value storage, the reported viewport,
//! injected style markers and live regions. A [`Host`] is a cheap `Clone`
//! handle; scenarios capture it the same way they capture the runner.

use parking_lot::{Mutex, MutexGuard};
use sim_core::ScenarioRunner;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{HostError, NetworkError};
use crate::network::{FetchRequest, FetchResponse, Fetcher};

/// Reported viewport and input characteristics.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// CSS pixel width.
    pub width: u32,
    /// CSS pixel height.
    pub height: u32,
    /// Device pixel ratio.
    pub pixel_ratio: f32,
    /// User agent string.
    pub user_agent: String,
    /// Touch input available.
    pub touch: bool,
    /// Hover-capable pointer available.
    pub hover: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 800,
            pixel_ratio: 1.0,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) launchsim".into(),
            touch: false,
            hover: true,
        }
    }
}

/// Width and height of a simulated viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSize {
    /// CSS pixel width.
    pub width: u32,
    /// CSS pixel height.
    pub height: u32,
}

/// Currently active perturbations. Equal to `Default` when nothing is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvironmentState {
    /// Id of the outermost applied network profile.
    pub network_profile: Option<String>,
    /// Added latency per request, summed over stacked profiles.
    pub network_latency_ms: u64,
    /// Every request fails.
    pub offline: bool,
    /// Id of the applied device preset.
    pub device: Option<String>,
    /// Simulated viewport size.
    pub viewport: Option<ViewportSize>,
    /// CPU slowdown multiplier of the applied preset.
    pub cpu_slowdown: Option<u32>,
    /// Storage was wiped to simulate a cold start.
    pub cold_start: bool,
    /// Storage reads and writes fail.
    pub storage_broken: bool,
}

/// Latency and loss tuning applied by the network simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    /// Multiplier on every profile's latency and transfer time.
    pub latency_scale: f64,
    /// Seed for packet loss. `None` draws from entropy.
    pub seed: Option<u64>,
}

/// Largest latency multiplier the network simulator applies.
pub const MAX_LATENCY_SCALE: f64 = 1000.0;

impl NetworkSettings {
    /// `latency_scale` clamped to `0.0..=MAX_LATENCY_SCALE`. NaN counts as 0.
    pub fn effective_latency_scale(&self) -> f64 {
        if self.latency_scale.is_nan() {
            0.0
        } else {
            self.latency_scale.clamp(0.0, MAX_LATENCY_SCALE)
        }
    }

    /// Scale a simulated delay by the effective latency scale.
    pub fn scale(&self, duration: Duration) -> Duration {
        duration.mul_f64(self.effective_latency_scale())
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            latency_scale: 1.0,
            seed: None,
        }
    }
}

/// Everything observable about the host, for before/after comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct HostSnapshot {
    /// Active perturbations.
    pub environment: EnvironmentState,
    /// Reported viewport.
    pub viewport: Viewport,
    /// Injected style markers.
    pub styles: BTreeMap<String, String>,
    /// Live regions and their announcements.
    pub live_regions: BTreeMap<String, Vec<String>>,
    /// Storage contents.
    pub storage: BTreeMap<String, String>,
    /// Identity of the current network primitive.
    pub network_identity: usize,
}

pub(crate) struct HostInner {
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) settings: NetworkSettings,
    pub(crate) storage: BTreeMap<String, String>,
    pub(crate) viewport: Viewport,
    pub(crate) resize_allowed: bool,
    pub(crate) styles: BTreeMap<String, String>,
    pub(crate) live_regions: BTreeMap<String, Vec<String>>,
    pub(crate) env: EnvironmentState,
    pub(crate) original_fetcher: Option<Arc<dyn Fetcher>>,
    pub(crate) original_viewport: Option<Viewport>,
    pub(crate) saved_storage: Option<BTreeMap<String, String>>,
    runner: Option<ScenarioRunner>,
}

/// Capability handle over the simulated host.
#[derive(Clone)]
pub struct Host {
    inner: Arc<Mutex<HostInner>>,
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Host")
            .field("environment", &inner.env)
            .field("viewport", &inner.viewport)
            .finish_non_exhaustive()
    }
}

pub(crate) fn fetcher_identity(fetcher: &Arc<dyn Fetcher>) -> usize {
    Arc::as_ptr(fetcher) as *const () as usize
}

impl Host {
    /// Create a host whose network primitive is `fetcher`.
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_settings(fetcher, NetworkSettings::default())
    }

    /// Create a host with explicit network tuning.
    pub fn with_settings(fetcher: Arc<dyn Fetcher>, settings: NetworkSettings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HostInner {
                fetcher,
                settings,
                storage: BTreeMap::new(),
                viewport: Viewport::default(),
                resize_allowed: true,
                styles: BTreeMap::new(),
                live_regions: BTreeMap::new(),
                env: EnvironmentState::default(),
                original_fetcher: None,
                original_viewport: None,
                saved_storage: None,
                runner: None,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, HostInner> {
        self.inner.lock()
    }

    /// Send simulator warnings to `runner`'s scenario log as well as `tracing`.
    pub fn attach_runner(&self, runner: ScenarioRunner) {
        self.inner.lock().runner = Some(runner);
    }

    /// Report a perturbation that could not be applied.
    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        let runner = self.inner.lock().runner.clone();
        if let Some(runner) = runner {
            runner.warn(message);
        }
    }

    /// Report a perturbation that could not be undone. With a runner attached
    /// this is a failed assertion in the running scenario.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        let runner = self.inner.lock().runner.clone();
        if let Some(runner) = runner {
            runner.assert(false, message);
        }
    }

    /// The current network primitive.
    pub fn fetcher(&self) -> Arc<dyn Fetcher> {
        Arc::clone(&self.inner.lock().fetcher)
    }

    /// Issue a request through the current network primitive.
    pub async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        let fetcher = self.fetcher();
        fetcher.fetch(request).await
    }

    /// Network tuning used when a profile is applied.
    pub fn network_settings(&self) -> NetworkSettings {
        self.inner.lock().settings.clone()
    }

    /// Read a storage key.
    pub fn storage_get(&self, key: &str) -> Result<Option<String>, HostError> {
        let inner = self.inner.lock();
        if inner.env.storage_broken {
            return Err(HostError::StorageUnavailable { key: key.into() });
        }
        Ok(inner.storage.get(key).cloned())
    }

    /// Write a storage key.
    pub fn storage_set(&self, key: &str, value: impl Into<String>) -> Result<(), HostError> {
        let mut inner = self.inner.lock();
        if inner.env.storage_broken {
            return Err(HostError::StorageUnavailable { key: key.into() });
        }
        inner.storage.insert(key.into(), value.into());
        Ok(())
    }

    /// Number of keys in storage, ignoring the broken flag.
    pub fn storage_len(&self) -> usize {
        self.inner.lock().storage.len()
    }

    /// Allow or refuse future viewport resizes.
    pub fn set_resize_allowed(&self, allowed: bool) {
        self.inner.lock().resize_allowed = allowed;
    }

    /// The reported viewport.
    pub fn viewport(&self) -> Viewport {
        self.inner.lock().viewport.clone()
    }

    /// Active perturbations.
    pub fn environment(&self) -> EnvironmentState {
        self.inner.lock().env.clone()
    }

    /// True if a style marker with this id is injected.
    pub fn has_style(&self, id: &str) -> bool {
        self.inner.lock().styles.contains_key(id)
    }

    /// Announcements written to a live region, or `None` if it does not exist.
    pub fn live_region(&self, id: &str) -> Option<Vec<String>> {
        self.inner.lock().live_regions.get(id).cloned()
    }

    /// Capture everything observable about the host.
    pub fn snapshot(&self) -> HostSnapshot {
        let inner = self.inner.lock();
        HostSnapshot {
            environment: inner.env.clone(),
            viewport: inner.viewport.clone(),
            styles: inner.styles.clone(),
            live_regions: inner.live_regions.clone(),
            storage: inner.storage.clone(),
            network_identity: fetcher_identity(&inner.fetcher),
        }
    }

    /// Undo every perturbation: accessibility, then network, then device.
    ///
    /// Every reset runs even if an earlier one fails; failures are returned.
    pub fn restore_all(&self) -> Vec<crate::DeviceError> {
        crate::accessibility::reset_accessibility(self);
        crate::network::reset_network(self);
        crate::device::reset_device(self).err().into_iter().collect()
    }

    pub(crate) fn resize(inner: &mut HostInner, width: u32, height: u32) -> Result<(), HostError> {
        if !inner.resize_allowed {
            return Err(HostError::ResizeRefused { width, height });
        }
        inner.viewport.width = width;
        inner.viewport.height = height;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::StaticFetcher;

    fn host() -> Host {
        Host::new(Arc::new(StaticFetcher::default()))
    }

    #[test]
    fn storage_round_trip() {
        let host = host();
        host.storage_set("room:a", "{}").unwrap();
        assert_eq!(host.storage_get("room:a").unwrap().as_deref(), Some("{}"));
        assert_eq!(host.storage_get("room:b").unwrap(), None);
    }

    #[test]
    fn broken_storage_fails() {
        let host = host();
        host.lock().env.storage_broken = true;
        assert!(matches!(
            host.storage_set("k", "v"),
            Err(HostError::StorageUnavailable { .. })
        ));
        assert!(host.storage_get("k").is_err());
    }

    #[test]
    fn refused_resize_leaves_viewport() {
        let host = host();
        host.set_resize_allowed(false);
        let mut inner = host.lock();
        assert!(Host::resize(&mut inner, 10, 10).is_err());
        assert_eq!(inner.viewport.width, 1280);
    }

    #[test]
    fn clones_share_state() {
        let a = host();
        let b = a.clone();
        a.storage_set("k", "v").unwrap();
        assert_eq!(b.storage_len(), 1);
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn latency_scale_is_clamped() {
        let settings = |latency_scale| NetworkSettings {
            latency_scale,
            seed: None,
        };
        let second = Duration::from_secs(1);
        assert_eq!(settings(0.5).scale(second), Duration::from_millis(500));
        assert_eq!(settings(-1.0).scale(second), Duration::ZERO);
        assert_eq!(settings(f64::NAN).scale(second), Duration::ZERO);
        assert_eq!(
            settings(f64::INFINITY).scale(second),
            Duration::from_secs(MAX_LATENCY_SCALE as u64)
        );
    }

    #[tokio::test]
    async fn warnings_reach_attached_runner() {
        let host = host();
        let runner = ScenarioRunner::default();
        host.attach_runner(runner.clone());

        let h = host.clone();
        let result = runner
            .run_scenario(
                "warn",
                vec![sim_core::Step::sync("w", move || {
                    h.warn("resize refused");
                    Ok(())
                })],
            )
            .await
            .unwrap();

        assert_eq!(result.logs[0].level, sim_types::LogLevel::Warn);
        assert_eq!(result.logs[0].message, "resize refused");
        assert!(result.passed);
    }
}
