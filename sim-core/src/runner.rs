//! Scenario runner.
//!
//! A scenario is an ordered list of [`Step`]s. The runner executes them one at
//! a time, in declaration order, and never short-circuits: a failing step is
//! recorded and the next step still runs, so trailing cleanup steps always get
//! their turn.
//!
//! # State machine
//!
//! ```text
//! Idle ──run_scenario──► Running(name) ──last step──► Idle
//! ```
//!
//! [`ScenarioRunner`] is a cheap handle over shared state. Step actions clone
//! it to record assertions and log lines while they run.
//!
//! # Example
//!
//! ```ignore
//! let runner = ScenarioRunner::new(RunnerOptions::default());
//! let r = runner.clone();
//! let result = runner
//!     .run_scenario("smoke", vec![
//!         Step::sync("check", move || {
//!             r.assert(1 + 1 == 2, "arithmetic still works");
//!             Ok(())
//!         }),
//!     ])
//!     .await?;
//! assert!(result.passed);
//! ```

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use parking_lot::Mutex;
use sim_types::{
    now_ms, AssertionResult, LogLevel, RunSummary, SimulationLog, SimulationResult, StepResult,
};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::RunnerError;

/// Future returned by a step action.
pub type StepFuture = BoxFuture<'static, anyhow::Result<()>>;

type StepAction = Box<dyn FnOnce() -> StepFuture + Send>;

/// One named unit of work inside a scenario.
pub struct Step {
    name: String,
    expected_result: Option<String>,
    timeout: Option<Duration>,
    action: StepAction,
}

impl Step {
    /// Create a step from an async action.
    pub fn new<F, Fut>(name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            expected_result: None,
            timeout: None,
            action: Box::new(move || action().boxed()),
        }
    }

    /// Create a step from a synchronous action.
    pub fn sync<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self::new(name, move || std::future::ready(action()))
    }

    /// Describe what the step is expected to produce.
    pub fn expect(mut self, expected: impl Into<String>) -> Self {
        self.expected_result = Some(expected.into());
        self
    }

    /// Fail the step if it has not finished within `limit`.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected result, if the author gave one.
    pub fn expected_result(&self) -> Option<&str> {
        self.expected_result.as_deref()
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("expected_result", &self.expected_result)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Runner behaviour switches.
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Mirror scenario log lines to `tracing`. Has no effect on pass/fail.
    pub mirror_to_console: bool,
    /// Deadline applied to steps that do not set their own. `None` means a
    /// hung step stalls the scenario.
    pub default_step_timeout: Option<Duration>,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            mirror_to_console: cfg!(debug_assertions),
            default_step_timeout: None,
        }
    }
}

#[derive(Debug)]
struct ActiveScenario {
    name: String,
    logs: Vec<SimulationLog>,
    assertions: Vec<AssertionResult>,
}

#[derive(Debug, Default)]
struct RunnerState {
    options: RunnerOptions,
    active: Option<ActiveScenario>,
    results: Vec<SimulationResult>,
}

/// Executes scenarios and keeps their results.
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    inner: Arc<Mutex<RunnerState>>,
}

impl ScenarioRunner {
    /// Create an idle runner with an empty history.
    pub fn new(options: RunnerOptions) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RunnerState {
                options,
                ..Default::default()
            })),
        }
    }

    /// Run `steps` in order and record one [`SimulationResult`].
    ///
    /// Fails only if another scenario is already running on this runner.
    pub async fn run_scenario(
        &self,
        name: impl Into<String>,
        steps: Vec<Step>,
    ) -> Result<SimulationResult, RunnerError> {
        let name = name.into();
        let default_timeout = {
            let mut state = self.inner.lock();
            if let Some(active) = &state.active {
                return Err(RunnerError::ScenarioInProgress {
                    running: active.name.clone(),
                    requested: name,
                });
            }
            state.active = Some(ActiveScenario {
                name: name.clone(),
                logs: Vec::new(),
                assertions: Vec::new(),
            });
            state.options.default_step_timeout
        };

        let slot = ActiveSlot {
            runner: self,
            armed: true,
        };
        tracing::info!(scenario = %name, steps = steps.len(), "Scenario started");
        let started = Instant::now();

        let mut step_results = Vec::with_capacity(steps.len());
        for step in steps {
            let result = self.run_step(step, default_timeout).await;
            step_results.push(result);
        }

        let duration_ms = started.elapsed().as_millis() as u64;
        slot.disarm();
        let result = {
            let mut state = self.inner.lock();
            let active = state.active.take().unwrap_or_else(|| ActiveScenario {
                name: name.clone(),
                logs: Vec::new(),
                assertions: Vec::new(),
            });

            let steps_ok = step_results.iter().all(|s| s.passed);
            let assertions_ok = !active.assertions.iter().any(|a| a.fails_scenario());
            let error = step_results.iter().find_map(|s| s.error.clone());

            let result = SimulationResult {
                scenario_name: name,
                passed: steps_ok && assertions_ok,
                duration_ms,
                steps: step_results,
                logs: active.logs,
                assertions: active.assertions,
                error,
            };
            state.results.push(result.clone());
            result
        };

        tracing::info!(
            scenario = %result.scenario_name,
            passed = result.passed,
            duration_ms = result.duration_ms,
            "Scenario finished"
        );
        Ok(result)
    }

    async fn run_step(&self, step: Step, default_timeout: Option<Duration>) -> StepResult {
        let Step {
            name,
            expected_result,
            timeout,
            action,
        } = step;
        let limit = timeout.or(default_timeout);
        let started = Instant::now();

        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(action)) {
            Ok(future) => {
                let guarded = AssertUnwindSafe(future).catch_unwind();
                match limit {
                    Some(limit) => match tokio::time::timeout(limit, guarded).await {
                        Ok(outcome) => outcome,
                        Err(_) => Ok(Err(anyhow::anyhow!(
                            "step timed out after {} ms",
                            limit.as_millis()
                        ))),
                    },
                    None => guarded.await,
                }
            }
            Err(panic) => Err(panic),
        };

        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(format!("{e:#}")),
            Err(panic) => Some(format!("step panicked: {}", panic_message(panic.as_ref()))),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match &error {
            None => match &expected_result {
                Some(expected) => self.info(format!("Step '{name}' passed: {expected}")),
                None => self.info(format!("Step '{name}' passed")),
            },
            Some(e) => self.error(format!("Step '{name}' failed: {e}")),
        }

        StepResult {
            passed: error.is_none(),
            name,
            duration_ms,
            error,
        }
    }

    /// Record an assertion in the running scenario. Never panics.
    pub fn assert(&self, condition: bool, message: impl Into<String>) {
        self.record_assertion(AssertionResult::new(condition, message));
    }

    /// Record a check whose false outcome the author expects, such as a free
    /// identity being denied a VIP room. A false outcome is logged as a
    /// warning and does not fail the scenario.
    pub fn assert_expected_denial(&self, condition: bool, message: impl Into<String>) {
        let assertion = AssertionResult::expected_denial(condition, message);
        if !assertion.passed {
            self.warn(format!("Expected denial: {}", assertion.message));
        }
        self.record_assertion(assertion);
    }

    fn record_assertion(&self, assertion: AssertionResult) {
        let mut state = self.inner.lock();
        let mirror = state.options.mirror_to_console;
        match state.active.as_mut() {
            Some(active) => {
                if mirror && assertion.fails_scenario() {
                    tracing::warn!(scenario = %active.name, "Assertion failed: {}", assertion.message);
                }
                active.assertions.push(assertion);
            }
            None => {
                tracing::debug!("Assertion outside a scenario dropped: {}", assertion.message);
            }
        }
    }

    /// Append an info line to the running scenario's log.
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    /// Append a warning to the running scenario's log.
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    /// Append an error line to the running scenario's log.
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Append a line at `level` to the running scenario's log.
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        let mut state = self.inner.lock();
        let mirror = state.options.mirror_to_console;
        let Some(active) = state.active.as_mut() else {
            tracing::debug!("Log line outside a scenario dropped: {}", message);
            return;
        };

        if mirror {
            match level {
                LogLevel::Info => tracing::info!(scenario = %active.name, "{}", message),
                LogLevel::Warn => tracing::warn!(scenario = %active.name, "{}", message),
                LogLevel::Error => tracing::error!(scenario = %active.name, "{}", message),
            }
        }

        active.logs.push(SimulationLog {
            level,
            message,
            timestamp_ms: now_ms(),
        });
    }

    /// True while a scenario is executing.
    pub fn is_running(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    /// Every result recorded since the last reset, in execution order.
    pub fn results(&self) -> Vec<SimulationResult> {
        self.inner.lock().results.clone()
    }

    /// Aggregate counts over the recorded history.
    pub fn summary(&self) -> RunSummary {
        RunSummary::from_results(&self.inner.lock().results)
    }

    /// Clear the recorded history.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.results.clear();
        state.active = None;
    }
}

/// Returns the runner to idle if `run_scenario` is dropped mid-run.
struct ActiveSlot<'a> {
    runner: &'a ScenarioRunner,
    armed: bool,
}

impl ActiveSlot<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for ActiveSlot<'_> {
    fn drop(&mut self) {
        if self.armed {
            if let Some(active) = self.runner.inner.lock().active.take() {
                tracing::warn!(scenario = %active.name, "Scenario cancelled before finishing");
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn quiet_runner() -> ScenarioRunner {
        ScenarioRunner::new(RunnerOptions {
            mirror_to_console: false,
            default_step_timeout: None,
        })
    }

    #[tokio::test]
    async fn one_result_per_step_in_order() {
        let runner = quiet_runner();
        let steps = vec![
            Step::sync("first", || Ok(())),
            Step::sync("second", || anyhow::bail!("broken")),
            Step::sync("third", || Ok(())),
        ];

        let result = runner.run_scenario("ordering", steps).await.unwrap();

        let names: Vec<_> = result.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
        assert!(result.steps[0].passed);
        assert!(!result.steps[1].passed);
        assert!(result.steps[2].passed);
        assert!(!result.passed);
        assert_eq!(result.error.as_deref(), Some("broken"));
    }

    #[tokio::test]
    async fn failing_step_does_not_skip_cleanup() {
        let runner = quiet_runner();
        let cleaned = Arc::new(AtomicUsize::new(0));
        let c = cleaned.clone();

        let result = runner
            .run_scenario(
                "cleanup",
                vec![
                    Step::sync("explode", || anyhow::bail!("boom")),
                    Step::sync("cleanup", move || {
                        c.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                ],
            )
            .await
            .unwrap();

        assert_eq!(cleaned.load(Ordering::SeqCst), 1);
        assert_eq!(result.steps.len(), 2);
    }

    #[tokio::test]
    async fn panicking_step_is_recorded() {
        let runner = quiet_runner();
        let result = runner
            .run_scenario(
                "panic",
                vec![
                    Step::new("async panic", || async {
                        if true {
                            panic!("async kaboom");
                        }
                        Ok(())
                    }),
                    Step::sync("after", || Ok(())),
                ],
            )
            .await
            .unwrap();

        assert!(!result.steps[0].passed);
        assert!(result.steps[0]
            .error
            .as_deref()
            .unwrap()
            .contains("async kaboom"));
        assert!(result.steps[1].passed);
    }

    #[tokio::test]
    async fn failed_assertion_fails_scenario_without_throwing() {
        let runner = quiet_runner();
        let r = runner.clone();
        let reached = Arc::new(AtomicUsize::new(0));
        let reached2 = reached.clone();

        let result = runner
            .run_scenario(
                "assertions",
                vec![Step::sync("check", move || {
                    r.assert(false, "forced failure");
                    r.assert(true, "fine");
                    reached2.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })],
            )
            .await
            .unwrap();

        assert_eq!(reached.load(Ordering::SeqCst), 1);
        assert!(result.steps[0].passed);
        assert!(!result.passed);
        assert_eq!(result.assertions.len(), 2);
        assert!(!result.assertions[0].passed);
        assert!(result.assertions[1].passed);
    }

    #[tokio::test]
    async fn expected_denial_keeps_scenario_green() {
        let runner = quiet_runner();
        let r = runner.clone();

        let result = runner
            .run_scenario(
                "denial",
                vec![Step::sync("probe", move || {
                    r.assert_expected_denial(false, "free tier blocked");
                    Ok(())
                })],
            )
            .await
            .unwrap();

        assert!(result.passed);
        assert!(!result.assertions[0].passed);
        assert!(result.assertions[0].expected_failure);
        assert_eq!(result.log_count(LogLevel::Warn), 1);
    }

    #[tokio::test]
    async fn logs_are_scoped_to_their_scenario() {
        let runner = quiet_runner();
        let r1 = runner.clone();
        let r2 = runner.clone();

        let first = runner
            .run_scenario(
                "one",
                vec![Step::sync("log", move || {
                    r1.warn("only in one");
                    Ok(())
                })],
            )
            .await
            .unwrap();
        let second = runner
            .run_scenario(
                "two",
                vec![Step::sync("log", move || {
                    r2.error("only in two");
                    Ok(())
                })],
            )
            .await
            .unwrap();

        assert!(first.logs.iter().any(|l| l.message == "only in one"));
        assert!(!second.logs.iter().any(|l| l.message == "only in one"));
        assert_eq!(second.log_count(LogLevel::Error), 1);
    }

    #[tokio::test]
    async fn nested_scenario_is_rejected() {
        let runner = quiet_runner();
        let inner = runner.clone();
        let nested_error = Arc::new(Mutex::new(None));
        let slot = nested_error.clone();

        runner
            .run_scenario(
                "outer",
                vec![Step::new("nest", move || async move {
                    let err = inner.run_scenario("inner", vec![]).await.err();
                    *slot.lock() = err.map(|e| e.to_string());
                    Ok(())
                })],
            )
            .await
            .unwrap();

        let message = nested_error.lock().clone().unwrap();
        assert!(message.contains("outer"));
        assert!(!runner.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn step_timeout_fails_only_that_step() {
        let runner = quiet_runner();
        let result = runner
            .run_scenario(
                "timeout",
                vec![
                    Step::new("hang", || async {
                        tokio::time::sleep(Duration::from_secs(3600)).await;
                        Ok(())
                    })
                    .timeout(Duration::from_millis(250)),
                    Step::sync("next", || Ok(())),
                ],
            )
            .await
            .unwrap();

        assert!(!result.steps[0].passed);
        assert_eq!(
            result.steps[0].error.as_deref(),
            Some("step timed out after 250 ms")
        );
        assert!(result.steps[1].passed);
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_scenario_returns_runner_to_idle() {
        let runner = quiet_runner();
        let hung = runner.run_scenario(
            "hung",
            vec![Step::new("wait forever", || async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            })],
        );
        assert!(tokio::time::timeout(Duration::from_millis(100), hung)
            .await
            .is_err());

        assert!(!runner.is_running());
        let next = runner
            .run_scenario("next", vec![Step::sync("ok", || Ok(()))])
            .await
            .unwrap();
        assert!(next.passed);
        assert_eq!(runner.results().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn durations_follow_the_clock() {
        let runner = quiet_runner();
        let result = runner
            .run_scenario(
                "slow",
                vec![Step::new("wait", || async {
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    Ok(())
                })],
            )
            .await
            .unwrap();

        assert!(result.steps[0].duration_ms >= 400);
        assert!(result.duration_ms >= result.steps[0].duration_ms);
    }

    #[tokio::test]
    async fn summary_and_reset() {
        let runner = quiet_runner();
        runner
            .run_scenario("ok", vec![Step::sync("a", || Ok(()))])
            .await
            .unwrap();
        runner
            .run_scenario("bad", vec![Step::sync("b", || anyhow::bail!("no"))])
            .await
            .unwrap();

        let summary = runner.summary();
        assert_eq!(summary.total_scenarios, 2);
        assert_eq!(summary.failed_scenarios, 1);
        assert_eq!(summary.failed_steps, 1);
        assert_eq!(runner.results().len(), 2);

        runner.reset();
        assert!(runner.results().is_empty());
        assert_eq!(runner.summary().total_scenarios, 0);
    }

    #[test]
    fn logging_while_idle_is_dropped() {
        let runner = quiet_runner();
        runner.info("nobody listening");
        runner.assert(false, "nobody listening");
        assert!(!runner.is_running());
        assert!(runner.results().is_empty());
    }
}
