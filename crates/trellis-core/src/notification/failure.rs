//! Failure - a test description paired with what went wrong

use crate::description::Description;
use crate::error::TestError;
use std::error::Error as _;
use std::fmt;
use std::sync::Arc;

/// A recorded test failure. Immutable once created.
#[derive(Clone)]
pub struct Failure {
    description: Description,
    error: Arc<TestError>,
}

impl Failure {
    pub fn new(description: Description, error: TestError) -> Self {
        Self {
            description,
            error: Arc::new(error),
        }
    }

    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn error(&self) -> &TestError {
        &self.error
    }

    /// Display name of the failing test
    pub fn test_header(&self) -> &str {
        self.description.display_name()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// The error followed by each of its sources, one per line
    pub fn trace(&self) -> String {
        let mut lines = vec![self.error.to_string()];
        let mut source = self.error.source();
        while let Some(cause) = source {
            lines.push(format!("caused by: {}", cause));
            source = cause.source();
        }
        lines.join("\n")
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("test", &self.test_header())
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.test_header(), self.error)
    }
}
