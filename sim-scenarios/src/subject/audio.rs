//! Audio load probe and repeated-load stress check.

use sim_env::{FetchRequest, Host, NetworkError};
use sim_types::RoomDocument;
use std::time::Duration;
use tokio::time::Instant;

use crate::subject::catalog::audio_url;

/// Loads slower than this are reported as warnings.
pub const SLOW_LOAD: Duration = Duration::from_secs(5);

/// Loads still pending after this are abandoned.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// File that must never load.
const MISSING_FILE: &str = "non_existent_file.mp3";

/// Outcome of probing a room's audio files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioProbeReport {
    /// Files that loaded.
    pub successful_loads: usize,
    /// Files that failed or timed out.
    pub failed_loads: usize,
    /// Mean load time of successful loads.
    pub avg_load_ms: u64,
    /// Slowest successful load.
    pub max_load_ms: u64,
    /// Slow loads.
    pub warnings: Vec<String>,
    /// Failed loads, and a missing file that unexpectedly loaded.
    pub errors: Vec<String>,
}

impl AudioProbeReport {
    /// Total files probed, excluding the missing-file check.
    pub fn total_loads(&self) -> usize {
        self.successful_loads + self.failed_loads
    }

    /// True if there are no errors.
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Repeated-load stress settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StressOptions {
    /// Sequential loads, cycling through the room's entries.
    pub loads: usize,
    /// Warn if all loads together take longer than this.
    pub budget: Duration,
}

impl Default for StressOptions {
    fn default() -> Self {
        Self {
            loads: 100,
            budget: Duration::from_secs(10),
        }
    }
}

enum LoadFailure {
    Network(NetworkError),
    TimedOut,
}

async fn load_audio(host: &Host, file: &str) -> Result<Duration, LoadFailure> {
    let started = Instant::now();
    let load = tokio::time::timeout(LOAD_TIMEOUT, host.fetch(FetchRequest::head(audio_url(file))));
    match load.await {
        Ok(Ok(_)) => Ok(started.elapsed()),
        Ok(Err(e)) => Err(LoadFailure::Network(e)),
        Err(_) => Err(LoadFailure::TimedOut),
    }
}

fn record_times(report: &mut AudioProbeReport, load_times: &[u64]) {
    if !load_times.is_empty() {
        report.avg_load_ms = load_times.iter().sum::<u64>() / load_times.len() as u64;
        report.max_load_ms = load_times.iter().copied().max().unwrap_or(0);
    }
}

/// Probe every audio file in `room` through the host's network primitive,
/// then check that a file that does not exist fails to load.
pub async fn audio_probe(host: &Host, room: &RoomDocument) -> AudioProbeReport {
    let mut report = AudioProbeReport::default();
    let mut load_times = Vec::new();

    for file in room.audio_files() {
        match load_audio(host, file).await {
            Ok(elapsed) => {
                if elapsed > SLOW_LOAD {
                    report.warnings.push(format!(
                        "Slow audio load: {file} took {}ms",
                        elapsed.as_millis()
                    ));
                }
                load_times.push(elapsed.as_millis() as u64);
                report.successful_loads += 1;
            }
            Err(LoadFailure::Network(e)) => {
                report.failed_loads += 1;
                report.errors.push(format!("Failed to load audio: {file} - {e}"));
            }
            Err(LoadFailure::TimedOut) => {
                report.failed_loads += 1;
                report.errors.push(format!("Timeout loading {file}"));
            }
        }
    }

    if load_audio(host, MISSING_FILE).await.is_ok() {
        report
            .errors
            .push("Should have failed to load non-existent audio file".into());
    }

    record_times(&mut report, &load_times);
    report
}

/// Load `room`'s audio `options.loads` times in a row and warn if the run as
/// a whole exceeds `options.budget`. Entries without audio are skipped.
pub async fn audio_stress(host: &Host, room: &RoomDocument, options: &StressOptions) -> AudioProbeReport {
    let mut report = AudioProbeReport::default();
    if room.entries.is_empty() {
        report.errors.push("No entries to test".into());
        return report;
    }

    let started = Instant::now();
    let mut load_times = Vec::with_capacity(options.loads);
    for i in 0..options.loads {
        let Some(file) = room.entries[i % room.entries.len()].audio.as_deref() else {
            continue;
        };
        match load_audio(host, file).await {
            Ok(elapsed) => {
                load_times.push(elapsed.as_millis() as u64);
                report.successful_loads += 1;
            }
            Err(LoadFailure::Network(e)) => {
                report.failed_loads += 1;
                report.errors.push(format!("Load {} failed: {e}", i + 1));
            }
            Err(LoadFailure::TimedOut) => {
                report.failed_loads += 1;
                report.errors.push(format!("Load {} timed out", i + 1));
            }
        }
    }

    let total = started.elapsed();
    if total > options.budget {
        report.warnings.push(format!(
            "{} loads took {}ms (target: {}ms)",
            options.loads,
            total.as_millis(),
            options.budget.as_millis()
        ));
    }
    record_times(&mut report, &load_times);
    report
}
