//! Run-all entry points.
//!
//! Scenarios run one after another on the context's runner. A failed
//! scenario never stops the ones after it; only a runner that is already
//! busy does.

use sim_core::RunnerError;
use sim_types::SimulationResult;

use crate::scenarios::content_load::content_load_all;
use crate::scenarios::corrupted_boot::corrupted_document_boot;
use crate::scenarios::device_journeys::{
    device_smoke, iphone_se_slow_3g, low_end_android_offline_recovery,
};
use crate::scenarios::tier_boundary::tier_boundary_check;
use crate::scenarios::ScenarioContext;

/// Reset the runner and run every launch scenario.
///
/// Returns the results in execution order.
pub async fn run_all(ctx: &ScenarioContext) -> Result<Vec<SimulationResult>, RunnerError> {
    ctx.runner.reset();
    tracing::info!("Running launch scenarios");

    content_load_all(ctx).await?;
    tier_boundary_check(ctx).await?;
    corrupted_document_boot(ctx).await?;
    iphone_se_slow_3g(ctx).await?;
    low_end_android_offline_recovery(ctx).await?;

    Ok(ctx.runner.results())
}

/// Reset the runner and run the device journeys, then the smoke journey on
/// each of `devices`.
pub async fn run_devices(
    ctx: &ScenarioContext,
    devices: &[String],
) -> Result<Vec<SimulationResult>, RunnerError> {
    ctx.runner.reset();
    tracing::info!(devices = ?devices, "Running device scenarios");

    iphone_se_slow_3g(ctx).await?;
    low_end_android_offline_recovery(ctx).await?;
    device_smoke(ctx, devices).await?;

    Ok(ctx.runner.results())
}
