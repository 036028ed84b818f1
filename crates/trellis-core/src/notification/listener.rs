//! Run listeners and the events they observe

use crate::description::Description;
use crate::notification::failure::Failure;
use crate::result::RunResult;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Observer of run lifecycle events.
///
/// Every callback defaults to doing nothing. Returning an error (or
/// panicking) removes the listener from the notifier for the rest of the
/// run; the run itself carries on.
pub trait RunListener: Send + Sync {
    fn test_run_started(&self, _description: &Description) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_run_finished(&self, _result: &RunResult) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_suite_started(&self, _description: &Description) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_suite_finished(&self, _description: &Description) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_started(&self, _description: &Description) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_finished(&self, _description: &Description) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_failure(&self, _failure: &Failure) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_assumption_failure(&self, _failure: &Failure) -> anyhow::Result<()> {
        Ok(())
    }

    fn test_ignored(&self, _description: &Description) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A test-level event, as recorded for later replay
#[derive(Clone)]
pub enum RunEvent {
    SuiteStarted(Description),
    SuiteFinished(Description),
    Started(Description),
    Finished(Description),
    Failure(Failure),
    AssumptionFailure(Failure),
    Ignored(Description),
}

impl RunEvent {
    /// Description the event refers to
    pub fn description(&self) -> &Description {
        match self {
            RunEvent::SuiteStarted(d)
            | RunEvent::SuiteFinished(d)
            | RunEvent::Started(d)
            | RunEvent::Finished(d)
            | RunEvent::Ignored(d) => d,
            RunEvent::Failure(f) | RunEvent::AssumptionFailure(f) => f.description(),
        }
    }
}

impl fmt::Debug for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            RunEvent::SuiteStarted(_) => "SuiteStarted",
            RunEvent::SuiteFinished(_) => "SuiteFinished",
            RunEvent::Started(_) => "Started",
            RunEvent::Finished(_) => "Finished",
            RunEvent::Failure(_) => "Failure",
            RunEvent::AssumptionFailure(_) => "AssumptionFailure",
            RunEvent::Ignored(_) => "Ignored",
        };
        write!(f, "{}({})", kind, self.description().display_name())
    }
}

/// Listener that buffers test-level events in arrival order
#[derive(Default)]
pub struct EventRecorder {
    events: Mutex<Vec<RunEvent>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: RunEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }

    /// Copy of the events recorded so far
    pub fn events(&self) -> Vec<RunEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<RunEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl RunListener for EventRecorder {
    fn test_suite_started(&self, description: &Description) -> anyhow::Result<()> {
        self.push(RunEvent::SuiteStarted(description.clone()))
    }

    fn test_suite_finished(&self, description: &Description) -> anyhow::Result<()> {
        self.push(RunEvent::SuiteFinished(description.clone()))
    }

    fn test_started(&self, description: &Description) -> anyhow::Result<()> {
        self.push(RunEvent::Started(description.clone()))
    }

    fn test_finished(&self, description: &Description) -> anyhow::Result<()> {
        self.push(RunEvent::Finished(description.clone()))
    }

    fn test_failure(&self, failure: &Failure) -> anyhow::Result<()> {
        self.push(RunEvent::Failure(failure.clone()))
    }

    fn test_assumption_failure(&self, failure: &Failure) -> anyhow::Result<()> {
        self.push(RunEvent::AssumptionFailure(failure.clone()))
    }

    fn test_ignored(&self, description: &Description) -> anyhow::Result<()> {
        self.push(RunEvent::Ignored(description.clone()))
    }
}
