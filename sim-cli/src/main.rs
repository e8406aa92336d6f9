//! # launchsim
//!
//! Runs launch scenarios against simulated content, network, device and
//! accessibility conditions, and writes a launch report.
//!
//! ## Commands
//!
//! - `run-all`: Run every launch scenario
//! - `run-devices`: Run the device journeys and the multi-device smoke journey
//! - `devices`: List device presets and network profiles
//!
//! ## Example
//!
//! ```bash
//! # Full launch check, reports in ./simulation-reports
//! launchsim run-all
//!
//! # Device journeys only, JSON report only
//! launchsim --config ci.toml run-devices --no-html
//! ```
//!
//! The process exits with status 0 only if every scenario passed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::run::Suite;
use commands::{devices, run};
use config::Config;

/// Launch simulation harness.
#[derive(Parser, Debug)]
#[command(name = "launchsim")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = "launchsim.toml")]
    config: PathBuf,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every launch scenario
    RunAll {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the device journeys
    RunDevices {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// List device presets and network profiles
    Devices,
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Report directory (overrides the config file)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Skip the HTML report
    #[arg(long)]
    no_html: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load_or_default(&cli.config).context("Failed to load configuration")?;

    let (suite, output) = match cli.command {
        Commands::RunAll { output } => (Suite::All, output),
        Commands::RunDevices { output } => (Suite::Devices, output),
        Commands::Devices => {
            devices::run();
            return Ok(ExitCode::SUCCESS);
        }
    };

    let output_dir = output
        .output_dir
        .unwrap_or_else(|| config.report.output_dir.clone());
    let html = config.report.write_html && !output.no_html;

    let passed = run::run(suite, &config, &output_dir, html).await?;
    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Install the fmt subscriber. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_all_flags() {
        let cli = Cli::parse_from([
            "launchsim",
            "--config",
            "ci.toml",
            "run-all",
            "--output-dir",
            "out",
            "--no-html",
        ]);
        assert_eq!(cli.config, PathBuf::from("ci.toml"));
        match cli.command {
            Commands::RunAll { output } => {
                assert_eq!(output.output_dir, Some(PathBuf::from("out")));
                assert!(output.no_html);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_defaults_to_launchsim_toml() {
        let cli = Cli::parse_from(["launchsim", "devices"]);
        assert_eq!(cli.config, PathBuf::from("launchsim.toml"));
        assert!(!cli.verbose);
    }
}
