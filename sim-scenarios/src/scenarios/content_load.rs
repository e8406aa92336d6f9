//! Content Load All: every bundled room loads, validates, caches and plays.

use parking_lot::Mutex;
use sim_core::{RunnerError, Step};
use sim_types::{RoomDocument, SimulationResult, ValidationOptions};
use std::sync::Arc;

use super::{ScenarioContext, JOURNEY_ROOM};
use crate::subject::audio::{audio_probe, audio_stress, StressOptions};
use crate::subject::catalog::fixture_room_ids;
use crate::subject::loader::CatalogLoader;

/// Scenario name.
pub const NAME: &str = "Content Load All";

/// Load every bundled room through the host, probe its audio, stress-load one
/// room's audio and confirm the raw bodies were cached.
pub async fn content_load_all(ctx: &ScenarioContext) -> Result<SimulationResult, RunnerError> {
    let loaded: Arc<Mutex<Vec<RoomDocument>>> = Arc::default();

    let steps = vec![
        Step::new("Load every room with strict validation", {
            let ctx = ctx.clone();
            let loaded = Arc::clone(&loaded);
            move || async move {
                let strict = ValidationOptions::strict();
                for id in fixture_room_ids() {
                    let outcome = ctx.loader.load_and_validate(id, &strict).await?;
                    ctx.runner.assert(
                        outcome.is_valid(),
                        format!("{id} passes strict validation"),
                    );
                    for error in &outcome.errors {
                        ctx.runner.error(format!("{id}: {error}"));
                    }
                    for warning in &outcome.warnings {
                        ctx.runner.warn(format!("{id}: {warning}"));
                    }
                    loaded.lock().push(outcome.cleaned_document);
                }
                ctx.runner
                    .info(format!("Loaded {} rooms", loaded.lock().len()));
                Ok(())
            }
        })
        .expect("every room loads without errors"),
        Step::new("Probe audio for every room", {
            let ctx = ctx.clone();
            let loaded = Arc::clone(&loaded);
            move || async move {
                let rooms = loaded.lock().clone();
                for room in &rooms {
                    let report = audio_probe(&ctx.host, room).await;
                    for warning in &report.warnings {
                        ctx.runner.warn(warning.clone());
                    }
                    for error in &report.errors {
                        ctx.runner.error(error.clone());
                    }
                    ctx.runner.assert(
                        report.passed(),
                        format!(
                            "{}: {}/{} audio files load",
                            room.id,
                            report.successful_loads,
                            report.total_loads()
                        ),
                    );
                    ctx.runner.info(format!(
                        "{}: audio avg {}ms, max {}ms",
                        room.id, report.avg_load_ms, report.max_load_ms
                    ));
                }
                Ok(())
            }
        })
        .expect("every audio file loads and a missing file does not"),
        Step::new("Stress-load audio", {
            let ctx = ctx.clone();
            let loaded = Arc::clone(&loaded);
            move || async move {
                let room = loaded
                    .lock()
                    .iter()
                    .find(|r| r.id == JOURNEY_ROOM)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("{JOURNEY_ROOM} was not loaded"))?;
                let options = StressOptions::default();
                let report = audio_stress(&ctx.host, &room, &options).await;
                for warning in &report.warnings {
                    ctx.runner.warn(warning.clone());
                }
                for error in &report.errors {
                    ctx.runner.error(error.clone());
                }
                ctx.runner.assert(
                    report.passed(),
                    format!(
                        "{}/{} repeated loads of {JOURNEY_ROOM} succeed",
                        report.successful_loads, options.loads
                    ),
                );
                ctx.runner.info(format!(
                    "Stress: avg {}ms, max {}ms",
                    report.avg_load_ms, report.max_load_ms
                ));
                Ok(())
            }
        })
        .expect("repeated audio loads all succeed"),
        Step::sync("Every room is cached", {
            let ctx = ctx.clone();
            move || {
                for id in fixture_room_ids() {
                    let cached = ctx.host.storage_get(&CatalogLoader::cache_key(id))?;
                    ctx.runner
                        .assert(cached.is_some(), format!("{id} is cached in storage"));
                }
                Ok(())
            }
        }),
    ];

    ctx.runner.run_scenario(NAME, steps).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::ScenarioRunner;
    use sim_env::{simulate_storage_broken, NetworkSettings};

    fn context() -> ScenarioContext {
        ScenarioContext::with_fixtures(ScenarioRunner::default(), NetworkSettings::default())
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn passes_on_bundled_catalog() {
        let ctx = context();
        let result = content_load_all(&ctx).await.unwrap();

        assert!(result.passed, "{:?}", result.assertions);
        assert_eq!(result.steps.len(), 4);
        assert_eq!(result.assertions_failed(), 0);
        assert!(result
            .assertions
            .iter()
            .any(|a| a.message == format!("100/100 repeated loads of {JOURNEY_ROOM} succeed")));
    }

    #[tokio::test(start_paused = true)]
    async fn broken_storage_fails_cache_step_only() {
        let ctx = context();
        simulate_storage_broken(&ctx.host);
        let result = content_load_all(&ctx).await.unwrap();

        assert!(!result.passed);
        assert!(result.steps[0].passed);
        assert!(result.steps[1].passed);
        assert!(result.steps[2].passed);
        assert!(!result.steps[3].passed);
    }
}
