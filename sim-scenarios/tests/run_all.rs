//! End-to-end run of every launch scenario against the bundled catalog.

use launchsim_scenarios::{run_all, run_devices, ScenarioContext, DEFAULT_SMOKE_DEVICES};
use sim_core::ScenarioRunner;
use sim_env::{EnvironmentState, NetworkSettings};

fn context() -> ScenarioContext {
    let settings = NetworkSettings {
        latency_scale: 1.0,
        seed: Some(42),
    };
    ScenarioContext::with_fixtures(ScenarioRunner::default(), settings).unwrap()
}

#[tokio::test(start_paused = true)]
async fn run_all_passes_on_bundled_catalog() {
    let ctx = context();
    let results = run_all(&ctx).await.unwrap();

    let names: Vec<_> = results.iter().map(|r| r.scenario_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "Content Load All",
            "Tier Boundary Check",
            "Corrupted Document Boot",
            "iPhone SE Slow 3G Journey",
            "Low-End Android Offline Recovery",
        ]
    );
    for result in &results {
        assert!(result.passed, "{}: {:?}", result.scenario_name, result.error);
    }

    let summary = ctx.runner.summary();
    assert!(summary.all_passed());
    assert_eq!(summary.total_scenarios, 5);
    assert_eq!(ctx.host.environment(), EnvironmentState::default());
}

#[tokio::test(start_paused = true)]
async fn expected_denial_is_recorded_not_fatal() {
    let ctx = context();
    let results = run_all(&ctx).await.unwrap();

    let tiers = results
        .iter()
        .find(|r| r.scenario_name == "Tier Boundary Check")
        .unwrap();
    assert!(tiers.passed);
    assert!(tiers
        .assertions
        .iter()
        .any(|a| !a.passed && a.expected_failure));
}

#[tokio::test(start_paused = true)]
async fn run_all_resets_previous_history() {
    let ctx = context();
    run_all(&ctx).await.unwrap();
    let second = run_all(&ctx).await.unwrap();

    assert_eq!(second.len(), 5);
    assert_eq!(ctx.runner.results().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn run_devices_runs_journeys_and_smoke() {
    let ctx = context();
    let devices: Vec<String> = DEFAULT_SMOKE_DEVICES.iter().map(|d| d.to_string()).collect();
    let results = run_devices(&ctx, &devices).await.unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[2].scenario_name, "Device Smoke");
    assert!(results.iter().all(|r| r.passed));
}
