//! Plan-driven test running for the CLI
//!
//! Discovers plan files, builds test units from them, and reports
//! progress on the console.

pub mod catalog;
pub mod discovery;
pub mod reporter;
pub mod runner;

pub use catalog::Catalog;
pub use reporter::ConsoleReporter;
pub use runner::{RunOptions, TestRunner};
