//! Run scenarios and write the launch report.

use anyhow::{Context, Result};
use sim_core::ScenarioRunner;
use sim_report::{build_report, render_text, write_artifacts};
use sim_scenarios::ScenarioContext;
use std::path::Path;

use crate::config::Config;

/// Which scenario set to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    /// Every launch scenario.
    All,
    /// Device journeys plus the smoke journey.
    Devices,
}

impl Suite {
    fn report_stem(self) -> &'static str {
        match self {
            Suite::All => "launch-report",
            Suite::Devices => "device-report",
        }
    }
}

/// Run `suite`, print the summary, write artifacts to `output_dir`.
///
/// Returns true if every scenario passed.
pub async fn run(suite: Suite, config: &Config, output_dir: &Path, html: bool) -> Result<bool> {
    let runner = ScenarioRunner::new(config.runner_options());
    let ctx = ScenarioContext::with_fixtures(runner, config.network_settings())
        .context("Failed to build the content catalog")?;

    let results = match suite {
        Suite::All => sim_scenarios::run_all(&ctx).await,
        Suite::Devices => sim_scenarios::run_devices(&ctx, &config.devices.journeys).await,
    }
    .context("Scenario run aborted")?;

    let report = build_report(&results);
    print!("{}", render_text(&report));

    let paths = write_artifacts(&report, output_dir, suite.report_stem(), html)
        .context("Failed to write report")?;
    println!();
    println!("JSON report: {}", paths.json.display());
    if let Some(html) = &paths.html {
        println!("HTML report: {}", html.display());
    }

    Ok(report.summary.passed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.network.latency_scale = 0.0;
        config.network.seed = Some(3);
        config
    }

    #[tokio::test]
    async fn run_all_writes_launch_report() {
        let dir = tempfile::tempdir().unwrap();
        let passed = run(Suite::All, &fast_config(), dir.path(), true).await.unwrap();

        assert!(passed);
        assert!(dir.path().join("launch-report.json").exists());
        assert!(dir.path().join("launch-report.html").exists());
    }

    #[tokio::test]
    async fn run_devices_honors_no_html() {
        let dir = tempfile::tempdir().unwrap();
        let passed = run(Suite::Devices, &fast_config(), dir.path(), false)
            .await
            .unwrap();

        assert!(passed);
        assert!(dir.path().join("device-report.json").exists());
        assert!(!dir.path().join("device-report.html").exists());
    }
}
