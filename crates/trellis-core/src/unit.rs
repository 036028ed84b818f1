//! Test-unit descriptors
//!
//! A [`TestUnit`] is the opaque handle the builder chain inspects. Its
//! metadata (ignored, custom runner, legacy suite factory, style) is fixed
//! when the unit is built; nothing here introspects code at run time.

use crate::description::Description;
use crate::error::TestError;
use std::fmt;
use std::sync::Arc;

/// Body of a single test
pub type TestBody = Arc<dyn Fn() -> Result<(), TestError> + Send + Sync>;

/// Zero-argument factory producing a legacy test collection
pub type SuiteFactory = Arc<dyn Fn() -> Result<LegacyTest, TestError> + Send + Sync>;

/// Lazily resolved list of member units
pub type MemberList = Arc<dyn Fn() -> Vec<TestUnit> + Send + Sync>;

/// Which test-definition convention a unit follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitStyle {
    #[default]
    Modern,
    Legacy,
}

/// A single test inside a unit
#[derive(Clone)]
pub struct TestMethod {
    name: String,
    body: TestBody,
    ignored: Option<String>,
    categories: Vec<String>,
}

impl TestMethod {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Result<(), TestError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
            ignored: None,
            categories: Vec::new(),
        }
    }

    /// A parameterized instance, named `name[params]`
    pub fn parameterized<F>(name: &str, params: impl fmt::Display, body: F) -> Self
    where
        F: Fn() -> Result<(), TestError> + Send + Sync + 'static,
    {
        Self::new(format!("{}[{}]", name, params), body)
    }

    pub fn ignore(mut self, reason: impl Into<String>) -> Self {
        self.ignored = Some(reason.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &TestBody {
        &self.body
    }

    pub fn ignored(&self) -> Option<&str> {
        self.ignored.as_deref()
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored.is_some()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Describe this method as a test of `unit`
    pub fn describe(&self, unit: &TestUnit) -> Description {
        let mut categories = unit.categories().to_vec();
        for category in &self.categories {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }
        Description::test_with_categories(unit.name(), &self.name, categories)
    }
}

impl fmt::Debug for TestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestMethod")
            .field("name", &self.name)
            .field("ignored", &self.ignored)
            .finish()
    }
}

/// A test in the older definition convention
#[derive(Clone)]
pub enum LegacyTest {
    Case {
        unit: String,
        name: String,
        body: TestBody,
        ignored: Option<String>,
        categories: Vec<String>,
    },
    Suite {
        name: String,
        tests: Vec<LegacyTest>,
    },
    /// A modern unit adapted into a legacy collection
    Unit(TestUnit),
}

impl LegacyTest {
    pub fn case<F>(unit: impl Into<String>, name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Result<(), TestError> + Send + Sync + 'static,
    {
        LegacyTest::Case {
            unit: unit.into(),
            name: name.into(),
            body: Arc::new(body),
            ignored: None,
            categories: Vec::new(),
        }
    }

    /// A legacy case running `method` of `unit`, keeping its ignore reason
    /// and the merged unit and method categories
    pub fn from_method(unit: &TestUnit, method: &TestMethod) -> Self {
        LegacyTest::Case {
            unit: unit.name().to_string(),
            name: method.name().to_string(),
            body: method.body().clone(),
            ignored: method.ignored().map(String::from),
            categories: method.describe(unit).categories().to_vec(),
        }
    }

    pub fn suite(name: impl Into<String>, tests: Vec<LegacyTest>) -> Self {
        LegacyTest::Suite {
            name: name.into(),
            tests,
        }
    }

    /// Check whether any adapted modern unit appears in this tree
    pub fn contains_units(&self) -> bool {
        match self {
            LegacyTest::Case { .. } => false,
            LegacyTest::Suite { tests, .. } => tests.iter().any(LegacyTest::contains_units),
            LegacyTest::Unit(_) => true,
        }
    }
}

impl fmt::Debug for LegacyTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LegacyTest::Case { unit, name, .. } => write!(f, "Case({}({}))", name, unit),
            LegacyTest::Suite { name, tests } => {
                f.debug_struct("Suite").field("name", name).field("tests", tests).finish()
            }
            LegacyTest::Unit(unit) => write!(f, "Unit({})", unit.name()),
        }
    }
}

struct UnitSpec {
    name: String,
    ignored: Option<String>,
    run_with: Option<String>,
    suite_factory: Option<SuiteFactory>,
    style: UnitStyle,
    methods: Vec<TestMethod>,
    members: Option<MemberList>,
    categories: Vec<String>,
}

/// Immutable handle to a unit that may contain tests
#[derive(Clone)]
pub struct TestUnit(Arc<UnitSpec>);

impl TestUnit {
    pub fn builder(name: impl Into<String>) -> TestUnitBuilder {
        TestUnitBuilder::new(name)
    }

    /// Identity of the unit
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn ignored(&self) -> Option<&str> {
        self.0.ignored.as_deref()
    }

    pub fn is_ignored(&self) -> bool {
        self.0.ignored.is_some()
    }

    /// Name of the custom runner strategy this unit declares
    pub fn run_with(&self) -> Option<&str> {
        self.0.run_with.as_deref()
    }

    pub fn suite_factory(&self) -> Option<&SuiteFactory> {
        self.0.suite_factory.as_ref()
    }

    pub fn style(&self) -> UnitStyle {
        self.0.style
    }

    pub fn methods(&self) -> &[TestMethod] {
        &self.0.methods
    }

    pub fn categories(&self) -> &[String] {
        &self.0.categories
    }

    /// Resolve declared suite members, if any were declared
    pub fn members(&self) -> Option<Vec<TestUnit>> {
        self.0.members.as_ref().map(|resolve| resolve())
    }

    /// Describe the unit as a suite of its methods
    pub fn describe(&self) -> Description {
        Description::suite(
            self.name(),
            self.methods().iter().map(|m| m.describe(self)).collect(),
        )
    }
}

impl PartialEq for TestUnit {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for TestUnit {}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUnit")
            .field("name", &self.0.name)
            .field("ignored", &self.0.ignored)
            .field("run_with", &self.0.run_with)
            .field("suite_factory", &self.0.suite_factory.is_some())
            .field("style", &self.0.style)
            .field("methods", &self.0.methods)
            .finish()
    }
}

/// Builder for [`TestUnit`]
pub struct TestUnitBuilder {
    spec: UnitSpec,
}

impl TestUnitBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            spec: UnitSpec {
                name: name.into(),
                ignored: None,
                run_with: None,
                suite_factory: None,
                style: UnitStyle::Modern,
                methods: Vec::new(),
                members: None,
                categories: Vec::new(),
            },
        }
    }

    /// Add a test method
    pub fn test<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn() -> Result<(), TestError> + Send + Sync + 'static,
    {
        self.method(TestMethod::new(name, body))
    }

    pub fn method(mut self, method: TestMethod) -> Self {
        self.spec.methods.push(method);
        self
    }

    /// Mark the whole unit as ignored
    pub fn ignore(mut self, reason: impl Into<String>) -> Self {
        self.spec.ignored = Some(reason.into());
        self
    }

    /// Declare a custom runner strategy by name
    pub fn run_with(mut self, strategy: impl Into<String>) -> Self {
        self.spec.run_with = Some(strategy.into());
        self
    }

    /// Declare a legacy static suite factory
    pub fn suite_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<LegacyTest, TestError> + Send + Sync + 'static,
    {
        self.spec.suite_factory = Some(Arc::new(factory));
        self
    }

    /// Follow the older test-definition convention
    pub fn legacy(mut self) -> Self {
        self.spec.style = UnitStyle::Legacy;
        self
    }

    /// Declare suite members, resolved when the runner is built
    pub fn members<F>(mut self, resolve: F) -> Self
    where
        F: Fn() -> Vec<TestUnit> + Send + Sync + 'static,
    {
        self.spec.members = Some(Arc::new(resolve));
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.spec.categories.push(category.into());
        self
    }

    pub fn build(self) -> TestUnit {
        TestUnit(Arc::new(self.spec))
    }
}
