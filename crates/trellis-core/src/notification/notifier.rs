//! RunNotifier - synchronous fan-out of run events

use crate::description::Description;
use crate::error::{panic_message, TestError};
use crate::notification::failure::Failure;
use crate::notification::listener::{RunEvent, RunListener};
use crate::result::RunResult;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

/// Registry of listeners for one run.
///
/// Listeners are notified in registration order. Each fire operation works
/// on a snapshot of the registry, so a listener removed mid-dispatch still
/// lets the remaining listeners see the current event exactly once.
#[derive(Default)]
pub struct RunNotifier {
    listeners: RwLock<Vec<Arc<dyn RunListener>>>,
}

impl RunNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener
    pub fn add_listener(&self, listener: Arc<dyn RunListener>) {
        self.write().push(listener);
    }

    /// Insert a listener ahead of every other one
    pub fn add_first_listener(&self, listener: Arc<dyn RunListener>) {
        self.write().insert(0, listener);
    }

    /// Remove a listener by identity
    pub fn remove_listener(&self, listener: &Arc<dyn RunListener>) {
        self.write().retain(|l| !same_listener(l, listener));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn fire_test_run_started(&self, description: &Description) {
        self.dispatch("test_run_started", |l| l.test_run_started(description));
    }

    pub fn fire_test_run_finished(&self, result: &RunResult) {
        self.dispatch("test_run_finished", |l| l.test_run_finished(result));
    }

    pub fn fire_test_suite_started(&self, description: &Description) {
        self.dispatch("test_suite_started", |l| l.test_suite_started(description));
    }

    pub fn fire_test_suite_finished(&self, description: &Description) {
        self.dispatch("test_suite_finished", |l| l.test_suite_finished(description));
    }

    pub fn fire_test_started(&self, description: &Description) {
        self.dispatch("test_started", |l| l.test_started(description));
    }

    pub fn fire_test_finished(&self, description: &Description) {
        self.dispatch("test_finished", |l| l.test_finished(description));
    }

    pub fn fire_test_failure(&self, failure: &Failure) {
        self.dispatch("test_failure", |l| l.test_failure(failure));
    }

    pub fn fire_test_assumption_failed(&self, failure: &Failure) {
        self.dispatch("test_assumption_failure", |l| l.test_assumption_failure(failure));
    }

    pub fn fire_test_ignored(&self, description: &Description) {
        self.dispatch("test_ignored", |l| l.test_ignored(description));
    }

    /// Fire a previously recorded event
    pub fn replay(&self, event: &RunEvent) {
        match event {
            RunEvent::SuiteStarted(d) => self.fire_test_suite_started(d),
            RunEvent::SuiteFinished(d) => self.fire_test_suite_finished(d),
            RunEvent::Started(d) => self.fire_test_started(d),
            RunEvent::Finished(d) => self.fire_test_finished(d),
            RunEvent::Failure(f) => self.fire_test_failure(f),
            RunEvent::AssumptionFailure(f) => self.fire_test_assumption_failed(f),
            RunEvent::Ignored(d) => self.fire_test_ignored(d),
        }
    }

    /// Run one test body, reporting its outcome between started and finished
    pub fn run_test<F>(&self, description: &Description, body: F)
    where
        F: FnOnce() -> Result<(), TestError>,
    {
        self.fire_test_started(description);
        match panic::catch_unwind(AssertUnwindSafe(body)) {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_assumption() => {
                self.fire_test_assumption_failed(&Failure::new(description.clone(), err));
            }
            Ok(Err(err)) => self.fire_test_failure(&Failure::new(description.clone(), err)),
            Err(payload) => self.fire_test_failure(&Failure::new(
                description.clone(),
                TestError::Panicked(panic_message(payload)),
            )),
        }
        self.fire_test_finished(description);
    }

    fn dispatch<F>(&self, event: &'static str, notify: F)
    where
        F: Fn(&dyn RunListener) -> anyhow::Result<()>,
    {
        let snapshot: Vec<Arc<dyn RunListener>> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for listener in &snapshot {
            let error = match panic::catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref()))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => panic_message(payload),
            };
            tracing::warn!(
                target: "trellis::notification",
                event,
                error = %error,
                "Listener failed; removing it for the rest of the run"
            );
            self.remove_listener(listener);
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Arc<dyn RunListener>>> {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn same_listener(a: &Arc<dyn RunListener>, b: &Arc<dyn RunListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl std::fmt::Debug for RunNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
