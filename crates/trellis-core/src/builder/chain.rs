//! AllDefaultPossibilities - the default strategy chain

use super::{
    AnnotatedBuilder, BuildContext, DefaultBuilder, IgnoredBuilder, LegacyBuilder, NullBuilder,
    RunnerBuilder, RunnerRegistry, SuiteMethodBuilder,
};
use crate::error::InitializationError;
use crate::runner::Runner;
use crate::unit::TestUnit;

/// Asks each strategy in turn: ignored, declared runner, legacy suite
/// factory, legacy style, then the default runner.
#[derive(Debug, Clone)]
pub struct AllDefaultPossibilities {
    annotated: AnnotatedBuilder,
    suite_methods: bool,
}

impl Default for AllDefaultPossibilities {
    fn default() -> Self {
        Self::new()
    }
}

impl AllDefaultPossibilities {
    pub fn new() -> Self {
        Self {
            annotated: AnnotatedBuilder::default(),
            suite_methods: true,
        }
    }

    /// Disable legacy suite factories; units declaring one fall through
    pub fn with_suite_methods(mut self, enabled: bool) -> Self {
        self.suite_methods = enabled;
        self
    }

    /// Resolve `run_with` declarations through a custom registry
    pub fn with_registry(mut self, registry: RunnerRegistry) -> Self {
        self.annotated = AnnotatedBuilder::new(registry);
        self
    }

    pub fn registry(&self) -> &RunnerRegistry {
        self.annotated.registry()
    }

    fn suite_method_builder(&self) -> &dyn RunnerBuilder {
        if self.suite_methods {
            &SuiteMethodBuilder
        } else {
            &NullBuilder
        }
    }
}

impl RunnerBuilder for AllDefaultPossibilities {
    fn runner_for_unit(
        &self,
        unit: &TestUnit,
        ctx: &mut BuildContext<'_>,
    ) -> Result<Option<Box<dyn Runner>>, InitializationError> {
        let chain: [(&str, &dyn RunnerBuilder); 5] = [
            ("ignored", &IgnoredBuilder),
            ("annotated", &self.annotated),
            ("suite-method", self.suite_method_builder()),
            ("legacy", &LegacyBuilder),
            ("default", &DefaultBuilder),
        ];

        for (strategy, builder) in chain {
            if let Some(runner) = builder.runner_for_unit(unit, ctx)? {
                tracing::debug!(
                    target: "trellis::builder",
                    unit = unit.name(),
                    strategy,
                    depth = ctx.depth(),
                    "Selected runner strategy"
                );
                return Ok(Some(runner));
            }
        }
        Ok(None)
    }
}
