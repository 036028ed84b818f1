//! Trellis Core - test discovery, composition and execution
//!
//! This library turns a set of test units into a runnable tree:
//! - A chain of runner strategies picks how each unit runs
//! - Suites compose runners into a tree with memoised descriptions
//! - Requests filter, sort and reorder the tree before it runs
//! - A notifier streams lifecycle events to listeners
//! - A result collector aggregates the outcome
//!
//! # Example
//!
//! ```
//! use trellis_core::{assert_that, Core, TestUnit};
//!
//! let unit = TestUnit::builder("CalcTest")
//!     .test("adds", || assert_that(1 + 1 == 2, "1 + 1 should be 2"))
//!     .build();
//!
//! let result = Core::run_units(&[unit]);
//! assert!(result.was_successful());
//! assert_eq!(result.run_count(), 1);
//! ```

/// Trellis runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod builder;
pub mod computer;
pub mod core;
pub mod description;
pub mod error;
pub mod manipulation;
pub mod notification;
pub mod request;
pub mod result;
pub mod runner;
pub mod unit;

// Re-export commonly used types
pub use builder::{AllDefaultPossibilities, BuildContext, RunnerBuilder, RunnerRegistry};
pub use computer::Computer;
pub use crate::core::Core;
pub use description::{Description, DescriptionKind};
pub use error::{
    assert_that, assume_that, FilterNotCreatedError, InitializationError, InvalidOrderingError,
    NoTestsRemainError, RequestError, TestError,
};
pub use manipulation::{Filter, FilterFactories, Orderer, Ordering, Sorter};
pub use notification::{Failure, RunEvent, RunListener, RunNotifier};
pub use request::Request;
pub use result::{ResultSummary, RunResult};
pub use runner::{Execution, Runner, Suite};
pub use unit::{LegacyTest, TestMethod, TestUnit, UnitStyle};
