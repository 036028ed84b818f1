//! Catalog - turn discovered plans into runnable test units
//!
//! Units refer to each other by name (`members`, `suite`). Those
//! references are resolved when the runner tree is built, through a weak
//! handle back into the catalog, so a plan may reference a unit declared
//! later or in another file, and a unit may even contain itself (which the
//! builder chain then reports as an initialization error).

use crate::testing::discovery::{Discovery, Outcome, PlanError, PlanFile, TestPlan, UnitPlan};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use trellis_core::{InitializationError, LegacyTest, TestError, TestMethod, TestUnit};

/// Units declared across all plan files, in declaration order
#[derive(Debug)]
pub struct Catalog {
    table: Arc<UnitTable>,
    errors: Vec<PlanError>,
}

#[derive(Debug, Default)]
struct UnitTable {
    units: Vec<TestUnit>,
    index: HashMap<String, usize>,
}

impl UnitTable {
    fn get(&self, name: &str) -> Option<&TestUnit> {
        self.index.get(name).map(|&i| &self.units[i])
    }
}

impl Catalog {
    /// Discover and build every unit under `root`
    pub fn discover(root: &Path) -> Self {
        Self::from_discovery(Discovery::discover(root))
    }

    pub fn from_discovery(discovery: Discovery) -> Self {
        let mut errors = discovery.errors;
        let plans = unique_units(&discovery.plans, &mut errors);

        for plan in &plans {
            for reference in plan.references() {
                if !plans.iter().any(|p| p.name == reference) {
                    errors.push(PlanError::UnknownReference {
                        unit: plan.name.clone(),
                        reference: reference.to_string(),
                    });
                }
            }
        }

        let table = Arc::new_cyclic(|weak: &Weak<UnitTable>| {
            let units: Vec<TestUnit> = plans.iter().map(|plan| build_unit(plan, weak)).collect();
            let index = units
                .iter()
                .enumerate()
                .map(|(i, unit)| (unit.name().to_string(), i))
                .collect();
            UnitTable { units, index }
        });

        Self { table, errors }
    }

    /// Build a catalog from in-memory plans
    pub fn from_plans(plans: Vec<PlanFile>) -> Self {
        Self::from_discovery(Discovery {
            plans: plans
                .into_iter()
                .enumerate()
                .map(|(i, plan)| (PathBuf::from(format!("plan-{}", i)), plan))
                .collect(),
            errors: Vec::new(),
        })
    }

    pub fn units(&self) -> &[TestUnit] {
        &self.table.units
    }

    pub fn get(&self, name: &str) -> Option<TestUnit> {
        self.table.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.table.units.is_empty()
    }

    /// Plan files that failed to load, duplicates and dangling references
    pub fn errors(&self) -> &[PlanError] {
        &self.errors
    }

    /// All plan problems as one error, if there are any
    pub fn initialization_error(&self) -> Option<InitializationError> {
        if self.errors.is_empty() {
            return None;
        }
        Some(InitializationError::merge(
            self.errors.iter().map(|e| InitializationError::new(e.to_string())),
        ))
    }

    /// Look up units by name; no names selects everything.
    ///
    /// Every unknown name is reported, not just the first.
    pub fn select(&self, names: &[String]) -> Result<Vec<TestUnit>, InitializationError> {
        if names.is_empty() {
            return Ok(self.table.units.clone());
        }

        let mut selected = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.get(name) {
                Some(unit) => selected.push(unit),
                None => missing.push(InitializationError::new(format!("unknown unit '{}'", name))),
            }
        }

        if missing.is_empty() {
            Ok(selected)
        } else {
            Err(InitializationError::merge(missing))
        }
    }
}

/// Drop later declarations of an already declared name
fn unique_units<'a>(plans: &'a [(PathBuf, PlanFile)], errors: &mut Vec<PlanError>) -> Vec<&'a UnitPlan> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();
    let mut units = Vec::new();
    for (path, plan) in plans {
        for unit in &plan.units {
            match seen.get(unit.name.as_str()) {
                Some(first) => errors.push(PlanError::DuplicateUnit {
                    name: unit.name.clone(),
                    first: first.to_path_buf(),
                    second: path.clone(),
                }),
                None => {
                    seen.insert(unit.name.as_str(), path.as_path());
                    units.push(unit);
                }
            }
        }
    }
    units
}

fn build_unit(plan: &UnitPlan, table: &Weak<UnitTable>) -> TestUnit {
    let mut builder = TestUnit::builder(plan.name.as_str());

    if let Some(reason) = &plan.ignore {
        builder = builder.ignore(reason.as_str());
    }
    if let Some(strategy) = &plan.run_with {
        builder = builder.run_with(strategy.as_str());
    }
    if plan.legacy {
        builder = builder.legacy();
    }
    for category in &plan.categories {
        builder = builder.category(category.as_str());
    }

    if let Some(members) = &plan.members {
        let names = members.clone();
        let table = table.clone();
        builder = builder.members(move || resolve(&table, &names));
    }

    if let Some(suite) = &plan.suite {
        let names = suite.clone();
        let table = table.clone();
        let owner = plan.name.clone();
        builder = builder.suite_factory(move || {
            let tests = resolve(&table, &names).into_iter().map(LegacyTest::Unit).collect();
            Ok(LegacyTest::suite(owner.clone(), tests))
        });
    }

    for test in &plan.tests {
        builder = builder.method(scripted_method(test));
    }

    builder.build()
}

fn resolve(table: &Weak<UnitTable>, names: &[String]) -> Vec<TestUnit> {
    let Some(table) = table.upgrade() else {
        return Vec::new();
    };
    names
        .iter()
        .filter_map(|name| table.get(name).cloned())
        .collect()
}

fn scripted_method(test: &TestPlan) -> TestMethod {
    let outcome = test.outcome;
    let message = test.message.clone();
    let mut method = TestMethod::new(test.name.as_str(), move || {
        replay(outcome, message.as_deref())
    });

    if let Some(reason) = &test.ignore {
        method = method.ignore(reason.as_str());
    }
    for category in &test.categories {
        method = method.category(category.as_str());
    }
    method
}

/// Produce the scripted outcome of a test
fn replay(outcome: Outcome, message: Option<&str>) -> Result<(), TestError> {
    match outcome {
        Outcome::Pass => Ok(()),
        Outcome::Fail => Err(TestError::Assertion(
            message.unwrap_or("scripted failure").to_string(),
        )),
        Outcome::Assume => Err(TestError::AssumptionViolated(
            message.unwrap_or("scripted assumption").to_string(),
        )),
        Outcome::Panic => panic!("{}", message.unwrap_or("scripted panic")),
    }
}
