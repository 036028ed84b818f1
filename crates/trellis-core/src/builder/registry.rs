//! Named runner strategies a unit can declare with `run_with`

use super::BuildContext;
use crate::error::InitializationError;
use crate::runner::{ClassRunner, LegacyRunner, Runner, Suite};
use crate::unit::TestUnit;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Strategy name for suites built from declared members
pub const SUITE: &str = "suite";
/// Strategy name for the default per-method runner
pub const DEFAULT: &str = "default";
/// Strategy name for the legacy adapter
pub const LEGACY: &str = "legacy";

/// Creates a runner for a unit that explicitly asked for it
pub trait RunnerFactory: Send + Sync {
    fn create(
        &self,
        unit: &TestUnit,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Box<dyn Runner>, InitializationError>;
}

impl<F> RunnerFactory for F
where
    F: Fn(&TestUnit, &mut BuildContext<'_>) -> Result<Box<dyn Runner>, InitializationError>
        + Send
        + Sync,
{
    fn create(
        &self,
        unit: &TestUnit,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Box<dyn Runner>, InitializationError> {
        self(unit, ctx)
    }
}

/// Lookup table from strategy name to factory
#[derive(Clone)]
pub struct RunnerRegistry {
    factories: BTreeMap<String, Arc<dyn RunnerFactory>>,
}

impl Default for RunnerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerRegistry {
    /// Registry holding the built-in strategies
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(SUITE, suite_from_members);
        registry.register(DEFAULT, |unit: &TestUnit, _: &mut BuildContext<'_>| {
            Ok(Box::new(ClassRunner::new(unit.clone())?) as Box<dyn Runner>)
        });
        registry.register(LEGACY, |unit: &TestUnit, _: &mut BuildContext<'_>| {
            Ok(Box::new(LegacyRunner::for_unit(unit)?) as Box<dyn Runner>)
        });
        registry
    }

    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Add or replace a strategy
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: RunnerFactory + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn RunnerFactory>> {
        self.factories.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for RunnerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

fn suite_from_members(
    unit: &TestUnit,
    ctx: &mut BuildContext<'_>,
) -> Result<Box<dyn Runner>, InitializationError> {
    let members = unit.members().ok_or_else(|| {
        InitializationError::for_unit(unit.name(), "uses the suite runner but declares no members")
    })?;
    Ok(Box::new(Suite::from_units(ctx, Some(unit), &members)?))
}
