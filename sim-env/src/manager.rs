//! Runs a scenario function on a simulated device.
//!
//! Perturbations are applied device first, then network, then accessibility,
//! and torn down in reverse order once the scenario function has finished,
//! whether it returned `Ok`, returned `Err`, panicked or was dropped mid-run by
//! a step timeout. Teardown failures never replace the scenario's own outcome;
//! they are recorded as failed assertions in the running scenario and on the
//! batch [`DeviceOutcome`].

use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tokio::time::Instant;

use crate::accessibility::{apply_accessibility, AccessibilityMode};
use crate::device::{apply_device_preset, device_preset, simulate_cold_start};
use crate::error::DeviceError;
use crate::host::Host;
use crate::network::{apply_network_profile, network_profile};

/// What to apply on top of the device preset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceRunOptions {
    /// Network profile id. Falls back to the preset's own profile.
    pub network_profile: Option<String>,
    /// Accessibility modes to enable.
    pub accessibility: Vec<AccessibilityMode>,
    /// Wipe storage before the scenario starts.
    pub cold_start: bool,
}

impl DeviceRunOptions {
    /// Use network profile `id`.
    pub fn network(mut self, id: impl Into<String>) -> Self {
        self.network_profile = Some(id.into());
        self
    }

    /// Enable accessibility `modes`.
    pub fn accessibility(mut self, modes: impl IntoIterator<Item = AccessibilityMode>) -> Self {
        self.accessibility.extend(modes);
        self
    }

    /// Start from empty storage.
    pub fn cold_start(mut self) -> Self {
        self.cold_start = true;
        self
    }
}

/// Outcome of one device in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceOutcome<T> {
    /// Value returned by the scenario function.
    pub result: Option<T>,
    /// Error or panic message.
    pub error: Option<String>,
    /// Resets that failed after the scenario function finished.
    pub teardown_failures: Vec<String>,
    /// Wall time including setup and teardown.
    pub duration_ms: u64,
}

impl<T> DeviceOutcome<T> {
    /// True if the scenario function returned `Ok` and the host was restored.
    pub fn passed(&self) -> bool {
        self.error.is_none() && self.teardown_failures.is_empty()
    }
}

type GuardedOutcome<T> = (std::thread::Result<anyhow::Result<T>>, Vec<DeviceError>);

/// Tears the device down if the run is dropped before reaching teardown.
struct TeardownGuard<'a> {
    host: &'a Host,
    device_id: &'a str,
    armed: bool,
}

impl TeardownGuard<'_> {
    fn finish(mut self) -> Vec<DeviceError> {
        self.armed = false;
        teardown(self.host, self.device_id)
    }
}

impl Drop for TeardownGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(device = self.device_id, "Device run cancelled; tearing down");
            teardown(self.host, self.device_id);
        }
    }
}

/// Run `scenario` with `device_id` emulated on `host`.
///
/// Unknown device or network ids fail before anything is applied. Otherwise
/// the scenario's result is returned unchanged after teardown, and a panic in
/// the scenario is resumed after teardown. Dropping the returned future
/// mid-run still tears the device down.
pub async fn run_on_device<F, Fut, T>(
    host: &Host,
    device_id: &str,
    options: &DeviceRunOptions,
    scenario: F,
) -> anyhow::Result<T>
where
    F: FnOnce(Host) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let (outcome, _failures) = run_guarded(host, device_id, options, scenario).await?;
    match outcome {
        Ok(result) => result,
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

async fn run_guarded<F, Fut, T>(
    host: &Host,
    device_id: &str,
    options: &DeviceRunOptions,
    scenario: F,
) -> anyhow::Result<GuardedOutcome<T>>
where
    F: FnOnce(Host) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let preset = device_preset(device_id)?;
    let profile = match options.network_profile.as_deref().or(preset.network_profile) {
        Some(id) => Some(network_profile(id)?),
        None => None,
    };
    tracing::info!(
        device = device_id,
        network = profile.map(|p| p.id).unwrap_or("native"),
        accessibility = ?options.accessibility,
        "Running on device"
    );

    let guard = TeardownGuard {
        host,
        device_id,
        armed: true,
    };
    apply_device_preset(host, preset);
    if options.cold_start {
        simulate_cold_start(host);
    }
    if let Some(profile) = profile {
        apply_network_profile(host, profile);
    }
    if !options.accessibility.is_empty() {
        apply_accessibility(host, &options.accessibility);
    }

    let scoped = host.clone();
    let outcome = AssertUnwindSafe(async move { scenario(scoped).await })
        .catch_unwind()
        .await;

    let failures = guard.finish();
    Ok((outcome, failures))
}

fn teardown(host: &Host, device_id: &str) -> Vec<DeviceError> {
    let failures = host.restore_all();
    for failure in &failures {
        host.fail(format!("Teardown on {device_id} failed: {failure}"));
    }
    failures
}

/// Run `scenario` on each device in turn.
///
/// Devices run one after another, never concurrently. A failure or panic on
/// one device is recorded and the next device still runs.
pub async fn run_on_multiple_devices<I, S, F, Fut, T>(
    host: &Host,
    device_ids: I,
    options: &DeviceRunOptions,
    mut scenario: F,
) -> BTreeMap<String, DeviceOutcome<T>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: FnMut(Host) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut outcomes = BTreeMap::new();
    for device_id in device_ids {
        let device_id = device_id.as_ref();
        let started = Instant::now();
        let (result, error, failures) =
            match run_guarded(host, device_id, options, &mut scenario).await {
                Ok((Ok(Ok(value)), failures)) => (Some(value), None, failures),
                Ok((Ok(Err(e)), failures)) => (None, Some(format!("{e:#}")), failures),
                Ok((Err(panic), failures)) => (
                    None,
                    Some(format!("scenario panicked: {}", panic_message(panic.as_ref()))),
                    failures,
                ),
                Err(e) => (None, Some(format!("{e:#}")), Vec::new()),
            };
        let outcome = DeviceOutcome {
            result,
            error,
            teardown_failures: failures.iter().map(ToString::to_string).collect(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        match &outcome.error {
            None if outcome.passed() => tracing::info!(device = device_id, "Device run passed"),
            None => tracing::warn!(
                device = device_id,
                "Device run left the host modified: {:?}",
                outcome.teardown_failures
            ),
            Some(e) => tracing::warn!(device = device_id, "Device run failed: {}", e),
        }
        outcomes.insert(device_id.to_string(), outcome);
    }
    outcomes
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
