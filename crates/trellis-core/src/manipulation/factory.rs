//! Filter specs - building filters from `[!]provider=args` strings

use crate::error::FilterNotCreatedError;
use crate::manipulation::filter::{exclude, CategoryFilter, Filter, MatchDescription, NameFilter};
use crate::description::Description;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Creates a filter from the argument part of a spec
pub trait FilterFactory: Send + Sync {
    fn create_filter(&self, args: &str) -> Result<Arc<dyn Filter>, String>;
}

impl<F> FilterFactory for F
where
    F: Fn(&str) -> Result<Arc<dyn Filter>, String> + Send + Sync,
{
    fn create_filter(&self, args: &str) -> Result<Arc<dyn Filter>, String> {
        self(args)
    }
}

/// Registry of filter providers keyed by name
pub struct FilterFactories {
    providers: BTreeMap<String, Box<dyn FilterFactory>>,
}

impl Default for FilterFactories {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterFactories {
    /// Registry with the built-in `category`, `name` and `method` providers
    pub fn new() -> Self {
        let mut factories = Self {
            providers: BTreeMap::new(),
        };
        factories.register("category", |args: &str| {
            let categories: Vec<&str> = args
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            if categories.is_empty() {
                return Err("no categories given".to_string());
            }
            Ok(Arc::new(CategoryFilter::include(categories)) as Arc<dyn Filter>)
        });
        factories.register("name", |args: &str| {
            Ok(Arc::new(NameFilter::new(args)) as Arc<dyn Filter>)
        });
        factories.register("method", |args: &str| {
            let (method, unit) = split_test_name(args)
                .ok_or_else(|| format!("expected 'method(Unit)', got '{}'", args))?;
            Ok(Arc::new(MatchDescription::new(Description::test(unit, method))) as Arc<dyn Filter>)
        });
        factories
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: FilterFactory + 'static,
    {
        self.providers.insert(name.into(), Box::new(factory));
    }

    /// Parse a spec such as `category=fast`, `!category=slow` or `name=parse`
    pub fn create_from_spec(&self, spec: &str) -> Result<Arc<dyn Filter>, FilterNotCreatedError> {
        let not_created = |reason: String| FilterNotCreatedError {
            spec: spec.to_string(),
            reason,
        };

        let (negated, body) = match spec.trim().strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, spec.trim()),
        };
        let (provider, args) = body
            .split_once('=')
            .ok_or_else(|| not_created("expected 'provider=args'".to_string()))?;
        let provider = provider.trim();
        let args = args.trim();
        if args.is_empty() {
            return Err(not_created(format!("provider '{}' needs arguments", provider)));
        }

        let factory = self
            .providers
            .get(provider)
            .ok_or_else(|| not_created(format!("unknown filter provider '{}'", provider)))?;
        let filter = factory.create_filter(args).map_err(not_created)?;

        Ok(if negated { exclude(filter) } else { filter })
    }
}

fn split_test_name(name: &str) -> Option<(&str, &str)> {
    let open = name.rfind('(')?;
    let unit = name[open + 1..].strip_suffix(')')?;
    let method = &name[..open];
    if method.is_empty() || unit.is_empty() {
        return None;
    }
    Some((method, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("category=fast", "categories [fast]")]
    #[case("category= fast , db ", "categories [fast, db]")]
    #[case("!category=slow", "not (categories [slow])")]
    #[case("name=parse", "name contains 'parse'")]
    #[case("method=add(CalcTest)", "Method add(CalcTest)")]
    fn test_builtin_specs(#[case] spec: &str, #[case] described: &str) {
        let filter = FilterFactories::new().create_from_spec(spec).unwrap();
        assert_eq!(filter.describe(), described);
    }

    #[rstest]
    #[case("category", "expected 'provider=args'")]
    #[case("category=", "provider 'category' needs arguments")]
    #[case("tag=fast", "unknown filter provider 'tag'")]
    #[case("method=add", "expected 'method(Unit)', got 'add'")]
    fn test_bad_specs(#[case] spec: &str, #[case] reason: &str) {
        let err = FilterFactories::new().create_from_spec(spec).err().unwrap();
        assert_eq!(err.spec, spec);
        assert_eq!(err.reason, reason);
    }

    #[test]
    fn test_custom_provider() {
        let mut factories = FilterFactories::new();
        factories.register("exact", |args: &str| {
            Ok(Arc::new(NameFilter::new(format!("{}(", args))) as Arc<dyn Filter>)
        });
        let filter = factories.create_from_spec("exact=add").unwrap();
        assert!(filter.should_run(&Description::test("CalcTest", "add")));
        assert!(!filter.should_run(&Description::test("CalcTest", "add_many")));
    }
}
