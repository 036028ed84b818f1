//! The individual strategies of the default chain

use super::{BuildContext, RunnerBuilder, RunnerRegistry};
use crate::error::{panic_message, InitializationError};
use crate::runner::{ClassRunner, IgnoredRunner, LegacyRunner, Runner, Suite};
use crate::unit::{LegacyTest, TestUnit, UnitStyle};
use std::panic::{self, AssertUnwindSafe};

/// Units marked ignored never run
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoredBuilder;

impl RunnerBuilder for IgnoredBuilder {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        _ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        Ok(unit
            .is_ignored()
            .then(|| Box::new(IgnoredRunner::new(unit.clone())) as Box<dyn Runner>))
    }
}

/// Honors a unit's `run_with` declaration
#[derive(Debug, Default, Clone)]
pub struct AnnotatedBuilder {
    registry: RunnerRegistry,
}

impl AnnotatedBuilder {
    pub fn new(registry: RunnerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RunnerRegistry {
        &self.registry
    }
}

impl RunnerBuilder for AnnotatedBuilder {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        let Some(strategy) = unit.run_with() else {
            return Ok(None);
        };
        if strategy == unit.name() {
            return Err(InitializationError::new(format!(
                "unit '{}' declares itself as its own runner",
                unit.name()
            )));
        }
        let factory = self.registry.get(strategy).ok_or_else(|| {
            InitializationError::for_unit(unit.name(), format!("unknown runner strategy '{}'", strategy))
        })?;
        factory.create(unit, ctx).map(Some)
    }
}

/// Builds runners from a unit's legacy suite factory
#[derive(Debug, Default, Clone, Copy)]
pub struct SuiteMethodBuilder;

impl RunnerBuilder for SuiteMethodBuilder {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        let Some(factory) = unit.suite_factory() else {
            return Ok(None);
        };
        let test = match panic::catch_unwind(AssertUnwindSafe(|| factory())) {
            Ok(Ok(test)) => test,
            Ok(Err(error)) => {
                return Err(InitializationError::for_unit(
                    unit.name(),
                    format!("suite factory failed: {}", error),
                ))
            }
            Err(payload) => {
                return Err(InitializationError::for_unit(
                    unit.name(),
                    format!("suite factory panicked: {}", panic_message(payload)),
                ))
            }
        };
        adapt(test, unit, ctx).map(Some)
    }
}

/// Turn a legacy tree into runners; adapted modern units re-enter the chain
fn adapt(
    test: LegacyTest,
    owner: &TestUnit,
    ctx: &mut BuildContext<'_>,
) -> Result<Box<dyn Runner>, InitializationError> {
    if !test.contains_units() {
        return Ok(Box::new(LegacyRunner::new(test)?));
    }
    match test {
        LegacyTest::Unit(unit) => {
            let mut runners = ctx.runners(Some(owner), std::slice::from_ref(&unit))?;
            runners
                .pop()
                .ok_or_else(|| InitializationError::for_unit(unit.name(), "no runner strategy applies"))
        }
        LegacyTest::Suite { name, tests } => {
            let children = tests
                .into_iter()
                .map(|child| adapt(child, owner, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Box::new(Suite::new(name, children)))
        }
        case @ LegacyTest::Case { .. } => Ok(Box::new(LegacyRunner::new(case)?)),
    }
}

/// Never applies; stands in for a disabled strategy
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBuilder;

impl RunnerBuilder for NullBuilder {
    fn runner_for_unit(
        &self,
        _unit: &TestUnit,
        _ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        Ok(None)
    }
}

/// Units following the older convention
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyBuilder;

impl RunnerBuilder for LegacyBuilder {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        _ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        if unit.style() != UnitStyle::Legacy {
            return Ok(None);
        }
        Ok(Some(Box::new(LegacyRunner::for_unit(unit)?)))
    }
}

/// Fallback: run every method of the unit
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBuilder;

impl RunnerBuilder for DefaultBuilder {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        _ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        Ok(Some(Box::new(ClassRunner::new(unit.clone())?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::AllDefaultPossibilities;
    use crate::error::TestError;

    fn build(builder: &dyn RunnerBuilder, unit: &TestUnit) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        let chain = AllDefaultPossibilities::new();
        let mut ctx = BuildContext::new(&chain);
        builder.runner_for_unit(unit, &mut ctx)
    }

    #[test]
    fn test_strategies_decline_units_they_do_not_handle() {
        let plain = TestUnit::builder("Plain").test("a", || Ok(())).build();
        assert!(build(&IgnoredBuilder, &plain).unwrap().is_none());
        assert!(build(&AnnotatedBuilder::default(), &plain).unwrap().is_none());
        assert!(build(&SuiteMethodBuilder, &plain).unwrap().is_none());
        assert!(build(&LegacyBuilder, &plain).unwrap().is_none());
        assert!(build(&NullBuilder, &plain).unwrap().is_none());
        assert!(build(&DefaultBuilder, &plain).unwrap().is_some());
    }

    #[test]
    fn test_self_named_runner_rejected() {
        let unit = TestUnit::builder("Odd").run_with("Odd").build();
        let err = build(&AnnotatedBuilder::default(), &unit).err().unwrap();
        assert_eq!(err.to_string(), "unit 'Odd' declares itself as its own runner");
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let unit = TestUnit::builder("U").run_with("theories").build();
        let err = build(&AnnotatedBuilder::default(), &unit).err().unwrap();
        assert_eq!(err.to_string(), "unit 'U': unknown runner strategy 'theories'");
    }

    #[test]
    fn test_suite_factory_failure_and_panic() {
        let failing = TestUnit::builder("F")
            .suite_factory(|| Err(TestError::Assertion("db down".into())))
            .build();
        let err = build(&SuiteMethodBuilder, &failing).err().unwrap();
        assert_eq!(err.to_string(), "unit 'F': suite factory failed: db down");

        let panicking = TestUnit::builder("P").suite_factory(|| panic!("boom")).build();
        let err = build(&SuiteMethodBuilder, &panicking).err().unwrap();
        assert_eq!(err.to_string(), "unit 'P': suite factory panicked: boom");
    }

    #[test]
    fn test_suite_factory_adapts_modern_units() {
        let modern = TestUnit::builder("Modern").test("a", || Ok(())).test("b", || Ok(())).build();
        let unit = TestUnit::builder("Mixed")
            .suite_factory(move || {
                Ok(LegacyTest::suite(
                    "Mixed",
                    vec![
                        LegacyTest::case("Old", "testOld", || Ok(())),
                        LegacyTest::Unit(modern.clone()),
                    ],
                ))
            })
            .build();

        let runner = build(&SuiteMethodBuilder, &unit).unwrap().unwrap();
        let description = runner.description();
        assert_eq!(description.test_count(), 3);
        assert_eq!(description.children()[1].display_name(), "Modern");
    }

    #[test]
    fn test_suite_factory_returning_itself_is_caught() {
        fn selfish() -> TestUnit {
            TestUnit::builder("Selfish")
                .suite_factory(|| Ok(LegacyTest::Unit(selfish())))
                .build()
        }

        let chain = AllDefaultPossibilities::new();
        let mut ctx = BuildContext::new(&chain);
        let err = ctx.runners(None, &[selfish()]).err().unwrap();
        assert!(err
            .to_string()
            .contains("unit 'Selfish' (possibly indirectly) contains itself"));
    }
}
