//! Run notifications: listeners, the notifier that drives them, and failures

pub mod failure;
pub mod listener;
pub mod notifier;

pub use failure::Failure;
pub use listener::{EventRecorder, RunEvent, RunListener};
pub use notifier::RunNotifier;
