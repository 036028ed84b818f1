//! Run result aggregation

use crate::description::Description;
use crate::notification::{Failure, RunListener};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Default)]
struct ResultState {
    run_count: AtomicUsize,
    ignore_count: AtomicUsize,
    failures: Mutex<Vec<Failure>>,
    assumption_failures: Mutex<Vec<Failure>>,
    run_time_ms: AtomicU64,
    started_at: Mutex<Option<Instant>>,
}

/// Outcome of one run.
///
/// Only the listener returned by [`RunResult::create_listener`] mutates the
/// counters; once the run is over the value is read-only.
#[derive(Clone, Default)]
pub struct RunResult {
    state: Arc<ResultState>,
}

impl RunResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener that feeds this result; register it first on the notifier
    pub fn create_listener(&self) -> Arc<dyn RunListener> {
        Arc::new(ResultListener {
            state: self.state.clone(),
        })
    }

    /// Number of tests started
    pub fn run_count(&self) -> usize {
        self.state.run_count.load(Ordering::SeqCst)
    }

    pub fn failure_count(&self) -> usize {
        lock(&self.state.failures).len()
    }

    pub fn failures(&self) -> Vec<Failure> {
        lock(&self.state.failures).clone()
    }

    pub fn ignore_count(&self) -> usize {
        self.state.ignore_count.load(Ordering::SeqCst)
    }

    pub fn assumption_failure_count(&self) -> usize {
        lock(&self.state.assumption_failures).len()
    }

    pub fn assumption_failures(&self) -> Vec<Failure> {
        lock(&self.state.assumption_failures).clone()
    }

    /// Wall-clock time between run started and run finished
    pub fn run_time(&self) -> Duration {
        Duration::from_millis(self.state.run_time_ms.load(Ordering::SeqCst))
    }

    /// True iff no test failed; ignores and assumption failures don't count
    pub fn was_successful(&self) -> bool {
        self.failure_count() == 0
    }

    /// Serializable snapshot of the counters and failures
    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            run_count: self.run_count(),
            failure_count: self.failure_count(),
            ignore_count: self.ignore_count(),
            assumption_failure_count: self.assumption_failure_count(),
            run_time_ms: self.run_time().as_millis() as u64,
            successful: self.was_successful(),
            failures: self
                .failures()
                .iter()
                .map(|f| FailureSummary {
                    test: f.test_header().to_string(),
                    message: f.message(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for RunResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunResult")
            .field("run_count", &self.run_count())
            .field("failure_count", &self.failure_count())
            .field("ignore_count", &self.ignore_count())
            .field("assumption_failure_count", &self.assumption_failure_count())
            .field("run_time", &self.run_time())
            .finish()
    }
}

/// Serializable view of a [`RunResult`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSummary {
    pub run_count: usize,
    pub failure_count: usize,
    pub ignore_count: usize,
    pub assumption_failure_count: usize,
    pub run_time_ms: u64,
    pub successful: bool,
    pub failures: Vec<FailureSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub test: String,
    pub message: String,
}

struct ResultListener {
    state: Arc<ResultState>,
}

impl RunListener for ResultListener {
    fn test_run_started(&self, _description: &Description) -> anyhow::Result<()> {
        let state = &self.state;
        state.run_count.store(0, Ordering::SeqCst);
        state.ignore_count.store(0, Ordering::SeqCst);
        state.run_time_ms.store(0, Ordering::SeqCst);
        lock(&state.failures).clear();
        lock(&state.assumption_failures).clear();
        *lock(&state.started_at) = Some(Instant::now());
        Ok(())
    }

    fn test_run_finished(&self, _result: &RunResult) -> anyhow::Result<()> {
        if let Some(started) = *lock(&self.state.started_at) {
            let elapsed = started.elapsed().as_millis() as u64;
            self.state.run_time_ms.store(elapsed, Ordering::SeqCst);
        }
        Ok(())
    }

    fn test_started(&self, _description: &Description) -> anyhow::Result<()> {
        self.state.run_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn test_failure(&self, failure: &Failure) -> anyhow::Result<()> {
        lock(&self.state.failures).push(failure.clone());
        Ok(())
    }

    fn test_assumption_failure(&self, failure: &Failure) -> anyhow::Result<()> {
        lock(&self.state.assumption_failures).push(failure.clone());
        Ok(())
    }

    fn test_ignored(&self, _description: &Description) -> anyhow::Result<()> {
        self.state.ignore_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TestError;
    use crate::notification::RunNotifier;

    fn drive(result: &RunResult, script: impl FnOnce(&RunNotifier)) {
        let notifier = RunNotifier::new();
        notifier.add_first_listener(result.create_listener());
        notifier.fire_test_run_started(&Description::empty());
        script(&notifier);
        notifier.fire_test_run_finished(result);
    }

    #[test]
    fn test_ignores_and_assumptions_do_not_affect_success() {
        let result = RunResult::new();
        drive(&result, |n| {
            for i in 0..5 {
                n.run_test(&Description::test("U", &format!("t{}", i)), || Ok(()));
            }
            n.fire_test_ignored(&Description::test("U", "skipped1"));
            n.fire_test_ignored(&Description::test("U", "skipped2"));
            n.run_test(&Description::test("U", "offline"), || {
                Err(TestError::AssumptionViolated("no network".into()))
            });
        });

        assert_eq!(result.run_count(), 6);
        assert_eq!(result.ignore_count(), 2);
        assert_eq!(result.assumption_failure_count(), 1);
        assert_eq!(result.failure_count(), 0);
        assert!(result.was_successful());
    }

    #[test]
    fn test_failure_recorded_with_description() {
        let result = RunResult::new();
        drive(&result, |n| {
            n.run_test(&Description::test("U", "bad"), || {
                Err(TestError::Assertion("1 != 2".into()))
            });
        });

        assert!(!result.was_successful());
        let failures = result.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].test_header(), "bad(U)");
        assert_eq!(failures[0].message(), "1 != 2");
    }

    #[test]
    fn test_run_started_resets_counters() {
        let result = RunResult::new();
        drive(&result, |n| {
            n.run_test(&Description::test("U", "bad"), || {
                Err(TestError::Assertion("x".into()))
            });
        });
        drive(&result, |n| n.run_test(&Description::test("U", "ok"), || Ok(())));

        assert_eq!(result.run_count(), 1);
        assert!(result.was_successful());
    }

    #[test]
    fn test_summary_serializes() {
        let result = RunResult::new();
        drive(&result, |n| {
            n.run_test(&Description::test("U", "bad"), || {
                Err(TestError::Assertion("nope".into()))
            });
        });

        let json = serde_json::to_value(result.summary()).unwrap();
        assert_eq!(json["run_count"], 1);
        assert_eq!(json["successful"], false);
        assert_eq!(json["failures"][0]["test"], "bad(U)");
        assert_eq!(json["failures"][0]["message"], "nope");
    }
}
