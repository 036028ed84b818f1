//! Core - the facade that runs requests and collects their results

use crate::computer::Computer;
use crate::error::{panic_message, InitializationError, RequestError, TestError};
use crate::notification::{Failure, RunListener, RunNotifier};
use crate::request::Request;
use crate::result::RunResult;
use crate::runner::{ErrorReportingRunner, Runner};
use crate::unit::TestUnit;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Owns a notifier and runs test trees against it.
///
/// Listeners added here see every run made through this `Core`. Each run
/// also registers a fresh result collector ahead of them, which is removed
/// again when the run ends.
#[derive(Debug, Default)]
pub struct Core {
    notifier: RunNotifier,
}

impl Core {
    pub fn new() -> Self {
        Self::default()
    }

    /// Version of the runtime
    pub fn version() -> &'static str {
        crate::VERSION
    }

    pub fn add_listener(&self, listener: Arc<dyn RunListener>) {
        self.notifier.add_listener(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn RunListener>) {
        self.notifier.remove_listener(listener);
    }

    /// Run a batch of units serially
    pub fn run(&self, units: &[TestUnit]) -> RunResult {
        self.run_with(&Computer::serial(), units)
    }

    /// Run a batch of units composed by `computer`
    pub fn run_with(&self, computer: &Computer, units: &[TestUnit]) -> RunResult {
        let request = Request::classes(computer, units);
        match self.run_request(&request) {
            Ok(result) => result,
            Err(error) => self.run_runner(&ErrorReportingRunner::for_units(
                units,
                InitializationError::new(error.to_string()),
            )),
        }
    }

    /// Build the request's runner tree and run it.
    ///
    /// Fails only when the tree cannot be built, e.g. an ordering that
    /// drops or duplicates tests.
    pub fn run_request(&self, request: &Request) -> Result<RunResult, RequestError> {
        let runner = request.runner()?;
        Ok(self.run_runner(runner.as_ref()))
    }

    /// Run an already built tree
    pub fn run_runner(&self, runner: &dyn Runner) -> RunResult {
        let result = RunResult::new();
        let _collector = Registration::first(&self.notifier, result.create_listener());

        let description = runner.description();
        tracing::info!(
            target: "trellis::core",
            root = %description,
            tests = description.test_count(),
            listeners = self.notifier.listener_count(),
            "Run started"
        );
        self.notifier.fire_test_run_started(&description);

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| runner.run(&self.notifier))) {
            let message = panic_message(payload);
            tracing::warn!(target: "trellis::core", error = %message, "Runner panicked");
            self.notifier
                .fire_test_failure(&Failure::new(description.clone(), TestError::Panicked(message)));
        }

        self.notifier.fire_test_run_finished(&result);
        tracing::info!(
            target: "trellis::core",
            run = result.run_count(),
            failures = result.failure_count(),
            ignored = result.ignore_count(),
            elapsed_ms = result.run_time().as_millis() as u64,
            "Run finished"
        );
        result
    }

    /// Run units once with no extra listeners
    pub fn run_units(units: &[TestUnit]) -> RunResult {
        Self::new().run(units)
    }
}

/// Keeps a listener registered for the lifetime of the value
struct Registration<'a> {
    notifier: &'a RunNotifier,
    listener: Arc<dyn RunListener>,
}

impl<'a> Registration<'a> {
    fn first(notifier: &'a RunNotifier, listener: Arc<dyn RunListener>) -> Self {
        notifier.add_first_listener(listener.clone());
        Self { notifier, listener }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.notifier.remove_listener(&self.listener);
    }
}
