//! Error types shared across the runner pipeline

use std::any::Any;
use thiserror::Error;

/// A test unit could not be turned into a runner.
///
/// Carries every individual cause so a batch of units fails with one
/// combined error instead of the first one encountered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", render_causes(.causes))]
pub struct InitializationError {
    causes: Vec<String>,
}

impl InitializationError {
    /// Create an error with a single cause
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            causes: vec![message.into()],
        }
    }

    /// Create an error scoped to a named unit
    pub fn for_unit(unit: &str, message: impl std::fmt::Display) -> Self {
        Self::new(format!("unit '{}': {}", unit, message))
    }

    /// Flatten several errors into one, keeping cause order
    pub fn merge<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = InitializationError>,
    {
        Self {
            causes: errors.into_iter().flat_map(|e| e.causes).collect(),
        }
    }

    /// Individual cause messages
    pub fn causes(&self) -> &[String] {
        &self.causes
    }
}

fn render_causes(causes: &[String]) -> String {
    match causes {
        [] => "initialization failed".to_string(),
        [single] => single.clone(),
        many => format!("{} initialization errors: {}", many.len(), many.join("; ")),
    }
}

/// Why a single test did not pass
#[derive(Error, Debug)]
pub enum TestError {
    #[error("{0}")]
    Assertion(String),

    /// A precondition of the test was not met; never counts as a failure
    #[error("assumption violated: {0}")]
    AssumptionViolated(String),

    #[error("panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Initialization(#[from] InitializationError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TestError {
    /// Check whether this error is an assumption violation
    pub fn is_assumption(&self) -> bool {
        matches!(self, TestError::AssumptionViolated(_))
    }
}

/// Fail the test with `message` unless `condition` holds
pub fn assert_that(condition: bool, message: impl Into<String>) -> Result<(), TestError> {
    if condition {
        Ok(())
    } else {
        Err(TestError::Assertion(message.into()))
    }
}

/// Skip the rest of the test unless `condition` holds
pub fn assume_that(condition: bool, message: impl Into<String>) -> Result<(), TestError> {
    if condition {
        Ok(())
    } else {
        Err(TestError::AssumptionViolated(message.into()))
    }
}

/// A filter removed every test from a runner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no tests remain after applying filter: {0}")]
pub struct NoTestsRemainError(pub String);

/// An ordering returned something other than a permutation of its input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("ordering '{ordering}' is not a permutation: {reason}")]
pub struct InvalidOrderingError {
    pub ordering: String,
    pub reason: String,
}

/// A filter spec string could not be resolved to a filter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not create filter from '{spec}': {reason}")]
pub struct FilterNotCreatedError {
    pub spec: String,
    pub reason: String,
}

/// Errors raised while materializing a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error(transparent)]
    InvalidOrdering(#[from] InvalidOrderingError),
}

/// Render a panic payload as text
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
