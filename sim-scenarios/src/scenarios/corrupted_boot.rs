//! Corrupted Document Boot: the loader must reject every structurally broken
//! room and never fall over on one.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sim_core::corruption::{apply_random_corruption_with, corruptors};
use sim_core::{RunnerError, Step};
use sim_types::{SimulationResult, ValidationOptions};

use super::ScenarioContext;
use crate::error::LoadError;
use crate::subject::catalog::{fixture_room, fixture_rooms};

/// Scenario name.
pub const NAME: &str = "Corrupted Document Boot";

/// Random corruptions tried on top of the exhaustive pass.
const RANDOM_ROUNDS: usize = 20;

const MALFORMED_BODIES: [&str; 4] = ["", "{not json", r#"{"id": 42, "tier": "free"}"#, "[]"];

/// Feed corrupted rooms to the validator and check each is rejected for the
/// rule its corruptor targets.
pub async fn corrupted_document_boot(
    ctx: &ScenarioContext,
) -> Result<SimulationResult, RunnerError> {
    let steps = vec![
        Step::sync("Bundled rooms are valid before corruption", {
            let ctx = ctx.clone();
            move || {
                let strict = ValidationOptions::strict();
                for room in fixture_rooms() {
                    let outcome = ctx.loader.validate_json(&room.id, &room.to_json()?, &strict)?;
                    ctx.runner
                        .assert(outcome.is_valid(), format!("{} is a valid baseline", room.id));
                }
                Ok(())
            }
        }),
        Step::sync("Every corruptor is rejected for its rule", {
            let ctx = ctx.clone();
            move || {
                let strict = ValidationOptions::strict();
                let mut rng = StdRng::seed_from_u64(0x5eed);
                let mut rejected = 0;
                for room in fixture_rooms() {
                    for corruptor in corruptors() {
                        let corrupted = corruptor.apply(&room, &mut rng);
                        let outcome =
                            ctx.loader.validate_json(&room.id, &corrupted.to_json()?, &strict)?;
                        let caught = outcome.error_rules.contains(&corruptor.targets);
                        ctx.runner.assert(
                            caught,
                            format!(
                                "{} on {} is rejected for {:?}",
                                corruptor.name, room.id, corruptor.targets
                            ),
                        );
                        if caught {
                            rejected += 1;
                        }
                    }
                }
                ctx.runner.info(format!("{rejected} corrupted rooms rejected"));
                Ok(())
            }
        })
        .expect("every corruption is caught by the rule it targets"),
        Step::sync("Random corruptions are rejected", {
            let ctx = ctx.clone();
            move || {
                let strict = ValidationOptions::strict();
                let rooms = fixture_rooms();
                let mut rng = rand::thread_rng();
                for round in 0..RANDOM_ROUNDS {
                    let room = &rooms[round % rooms.len()];
                    let corrupted = apply_random_corruption_with(room, &mut rng);
                    let outcome =
                        ctx.loader.validate_json(&room.id, &corrupted.room.to_json()?, &strict)?;
                    ctx.runner.assert(
                        !outcome.is_valid(),
                        format!(
                            "round {round}: {} on {} is rejected",
                            corrupted.strategy.name, room.id
                        ),
                    );
                }
                Ok(())
            }
        }),
        Step::sync("Malformed JSON is an error, not a crash", {
            let ctx = ctx.clone();
            move || {
                let strict = ValidationOptions::strict();
                for body in MALFORMED_BODIES {
                    let rejected = matches!(
                        ctx.loader.validate_json("malformed", body, &strict),
                        Err(LoadError::Malformed { .. })
                    );
                    ctx.runner
                        .assert(rejected, format!("{body:?} is rejected as malformed"));
                }
                Ok(())
            }
        }),
        Step::sync("Autofix repairs padded copy", {
            let ctx = ctx.clone();
            move || {
                let room = fixture_room("calm_breathing_free")
                    .ok_or_else(|| anyhow::anyhow!("calm_breathing_free is not bundled"))?;
                let mut padded = room.clone();
                for entry in &mut padded.entries {
                    entry.copy.en = entry.copy.en.as_ref().map(|c| format!("  {c}\n"));
                }

                let strict = ValidationOptions::strict();
                let outcome = ctx.loader.validate_json(&room.id, &padded.to_json()?, &strict)?;
                ctx.runner.assert(outcome.autofixed, "padded copy is autofixed");
                ctx.runner.assert(outcome.is_valid(), "autofixed room is valid");
                ctx.runner.assert(
                    outcome.cleaned_document == room,
                    "autofix restores the original copy",
                );
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
    use sim_env::NetworkSettings;

    #[tokio::test]
    async fn validator_catches_everything() {
        let ctx = ScenarioContext::with_fixtures(ScenarioRunner::default(), NetworkSettings::default())
            .unwrap();
        let result = corrupted_document_boot(&ctx).await.unwrap();

        assert!(result.passed, "{:?}", result.error);
        assert_eq!(result.assertions_failed(), 0);
        let exhaustive = fixture_rooms().len() * corruptors().len();
        assert!(result.assertions.len() >= exhaustive + RANDOM_ROUNDS);
    }
}
