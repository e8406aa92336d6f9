//! # sim-env
//!
//! Reversible environment perturbations for launchsim.
//!
//! The ambient resources an app depends on (network primitive, key-value
//! storage, viewport, injected styles) live in a [`Host`] capability object
//! that scenarios receive explicitly. Three simulators perturb it, each with
//! an apply/reset pair:
//!
//! - [`network`] - latency, throughput, packet loss and offline mode
//! - [`device`] - viewport, touch, CPU slowdown, cold start, broken storage
//! - [`accessibility`] - screen reader live region, large text, high
//!   contrast, keyboard focus, reduced motion
//!
//! [`run_on_device`] composes all three around a scenario function and
//! guarantees teardown.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod accessibility;
pub mod device;
mod error;
mod host;
mod manager;
pub mod network;

pub use accessibility::{announce, apply_accessibility, reset_accessibility, AccessibilityMode};
pub use device::{
    apply_device_preset, device_preset, device_presets, reset_device, simulate_cold_start,
    simulate_storage_broken, DevicePreset,
};
pub use error::{DeviceError, HostError, NetworkError};
pub use host::{
    EnvironmentState, Host, HostSnapshot, NetworkSettings, Viewport, ViewportSize, MAX_LATENCY_SCALE,
};
pub use manager::{run_on_device, run_on_multiple_devices, DeviceOutcome, DeviceRunOptions};
pub use network::{
    apply_network_profile, network_profile, network_profiles, reset_network, FetchRequest,
    FetchResponse, Fetcher, NetworkProfile, StaticFetcher,
};
