//! Journeys that run under an emulated device.

use sim_core::{RunnerError, Step};
use sim_env::accessibility::is_enabled;
use sim_env::{
    announce, apply_network_profile, device_preset, network_profile, reset_network,
    run_on_device, run_on_multiple_devices, AccessibilityMode, DeviceRunOptions,
    EnvironmentState, FetchRequest,
};
use sim_types::{SimulationResult, ValidationOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::{ScenarioContext, JOURNEY_ROOM};
use crate::error::LoadError;
use crate::subject::audio::audio_probe;
use crate::subject::catalog::room_url;
use crate::subject::loader::CatalogLoader;

/// iPhone SE journey name.
pub const IPHONE_SE_SLOW_3G: &str = "iPhone SE Slow 3G Journey";

/// Low-end Android journey name.
pub const LOW_END_ANDROID_OFFLINE: &str = "Low-End Android Offline Recovery";

/// Multi-device smoke journey name.
pub const DEVICE_SMOKE: &str = "Device Smoke";

/// Devices the smoke journey runs on when none are configured.
pub const DEFAULT_SMOKE_DEVICES: [&str; 2] = ["iphone_se", "low_end_android"];

/// Room that is never loaded before the offline phase.
const UNCACHED_ROOM: &str = "calm_breathing_free";

/// Load a room on an iPhone SE over slow 3G with screen reader and large text
/// enabled, then check the environment was restored.
pub async fn iphone_se_slow_3g(ctx: &ScenarioContext) -> Result<SimulationResult, RunnerError> {
    let steps = vec![Step::new("Load a room on iPhone SE over slow 3G", {
        let ctx = ctx.clone();
        move || async move {
            let original = ctx.host.fetcher();
            let options = DeviceRunOptions::default()
                .network("slow_3g")
                .accessibility([AccessibilityMode::ScreenReader, AccessibilityMode::LargeText]);

            let journey = ctx.clone();
            run_on_device(&ctx.host, "iphone_se", &options, |host| async move {
                let ctx = journey;
                let runner = &ctx.runner;
                let viewport = host.viewport();
                runner.assert(viewport.width == 375, format!("viewport is {} wide", viewport.width));
                runner.assert(viewport.touch && !viewport.hover, "touch without hover");
                runner.assert(
                    is_enabled(&host, AccessibilityMode::LargeText),
                    "large text is enabled",
                );

                let floor = host
                    .network_settings()
                    .scale(Duration::from_millis(network_profile("slow_3g")?.latency_ms));
                let started = Instant::now();
                let outcome = ctx
                    .loader
                    .load_and_validate(JOURNEY_ROOM, &ValidationOptions::strict())
                    .await?;
                let elapsed = started.elapsed();
                runner.assert(outcome.is_valid(), format!("{JOURNEY_ROOM} loads on iPhone SE"));
                runner.assert(
                    elapsed >= floor,
                    format!("load took {}ms under slow 3G", elapsed.as_millis()),
                );

                runner.assert(
                    announce(&host, format!("{JOURNEY_ROOM} ready")),
                    "screen reader announcement written",
                );

                let audio = audio_probe(&host, &outcome.cleaned_document).await;
                for warning in &audio.warnings {
                    runner.warn(warning.clone());
                }
                runner.assert(
                    audio.passed(),
                    format!("{}/{} audio files load", audio.successful_loads, audio.total_loads()),
                );
                Ok(())
            })
            .await?;

            ctx.runner.assert(
                Arc::ptr_eq(&original, &ctx.host.fetcher()),
                "network primitive restored",
            );
            ctx.runner.assert(
                ctx.host.environment() == EnvironmentState::default(),
                "environment back to baseline",
            );
            Ok(())
        }
    })
    .expect("room loads and plays, environment restored")];

    ctx.runner.run_scenario(IPHONE_SE_SLOW_3G, steps).await
}

/// Cold start a low-end Android handset, load a room, lose the connection,
/// read the room from cache and recover on fast 3G.
pub async fn low_end_android_offline_recovery(
    ctx: &ScenarioContext,
) -> Result<SimulationResult, RunnerError> {
    let steps = vec![Step::new("Cold start, go offline and recover", {
        let ctx = ctx.clone();
        move || async move {
            let original = ctx.host.fetcher();
            let storage_before = ctx.host.storage_len();
            let options = DeviceRunOptions::default().cold_start();

            let journey = ctx.clone();
            run_on_device(&ctx.host, "low_end_android", &options, |host| async move {
                let ctx = journey;
                let runner = &ctx.runner;
                let strict = ValidationOptions::strict();
                runner.assert(
                    host.storage_len() == 0 && host.environment().cold_start,
                    "cold start wiped storage",
                );

                let online = ctx.loader.load_and_validate(JOURNEY_ROOM, &strict).await?;
                runner.assert(
                    online.is_valid() && !online.from_cache,
                    format!("{JOURNEY_ROOM} loads over slow 3G"),
                );
                runner.assert(
                    host.storage_get(&CatalogLoader::cache_key(JOURNEY_ROOM))?.is_some(),
                    format!("{JOURNEY_ROOM} cached"),
                );

                apply_network_profile(&host, network_profile("offline")?);
                runner.assert(
                    host.fetch(FetchRequest::get(room_url(JOURNEY_ROOM))).await.is_err(),
                    "fetch fails while offline",
                );
                let cached = ctx.loader.load_and_validate(JOURNEY_ROOM, &strict).await?;
                runner.assert(
                    cached.from_cache && cached.is_valid(),
                    format!("{JOURNEY_ROOM} served from cache while offline"),
                );
                let uncached = ctx.loader.load_and_validate(UNCACHED_ROOM, &strict).await;
                runner.assert(
                    matches!(uncached, Err(LoadError::Network { .. })),
                    format!("{UNCACHED_ROOM} unavailable while offline"),
                );

                reset_network(&host);
                apply_network_profile(&host, network_profile("fast_3g")?);
                let recovered = ctx.loader.load_and_validate(UNCACHED_ROOM, &strict).await?;
                runner.assert(
                    recovered.is_valid() && !recovered.from_cache,
                    format!("{UNCACHED_ROOM} loads after recovering on fast 3G"),
                );
                Ok(())
            })
            .await?;

            ctx.runner.assert(
                Arc::ptr_eq(&original, &ctx.host.fetcher()),
                "network primitive restored",
            );
            ctx.runner.assert(
                ctx.host.storage_len() == storage_before,
                "storage from before the cold start restored",
            );
            ctx.runner.assert(
                ctx.host.environment() == EnvironmentState::default(),
                "environment back to baseline",
            );
            Ok(())
        }
    })
    .expect("offline reads hit the cache and the connection recovers")];

    ctx.runner.run_scenario(LOW_END_ANDROID_OFFLINE, steps).await
}

/// Load one room on each of `devices`, one device at a time.
pub async fn device_smoke(
    ctx: &ScenarioContext,
    devices: &[String],
) -> Result<SimulationResult, RunnerError> {
    let steps = vec![Step::new("Load a room on every device", {
        let ctx = ctx.clone();
        let devices = devices.to_vec();
        move || async move {
            let outcomes = run_on_multiple_devices(
                &ctx.host,
                &devices,
                &DeviceRunOptions::default(),
                |host| {
                    let loader = Arc::clone(&ctx.loader);
                    async move {
                        let outcome = loader
                            .load_and_validate(JOURNEY_ROOM, &ValidationOptions::strict())
                            .await?;
                        anyhow::ensure!(
                            outcome.is_valid(),
                            "{JOURNEY_ROOM} invalid: {:?}",
                            outcome.errors
                        );
                        Ok(host.viewport().width)
                    }
                },
            )
            .await;

            for (device, outcome) in &outcomes {
                match (&outcome.error, outcome.result) {
                    (Some(error), _) => {
                        ctx.runner.assert(false, format!("{device}: {error}"));
                    }
                    (None, width) => {
                        let expected = device_preset(device).map(|p| p.width).ok();
                        ctx.runner.assert(
                            width.is_some() && width == expected,
                            format!("{device} loads {JOURNEY_ROOM} at its own width"),
                        );
                    }
                }
                ctx.runner
                    .info(format!("{device} finished in {}ms", outcome.duration_ms));
            }
            Ok(())
        }
    })];

    ctx.runner.run_scenario(DEVICE_SMOKE, steps).await
}
