//! Filters - predicates that prune a runner tree

use crate::description::Description;
use std::sync::Arc;

/// Predicate over descriptions.
///
/// For a suite description, `should_run` answers whether any test beneath
/// it should run; runners use that to drop whole subtrees.
pub trait Filter: Send + Sync {
    fn should_run(&self, description: &Description) -> bool;

    /// Human-readable description of the filter
    fn describe(&self) -> String;
}

/// True if `test_matches` holds for the description or any test beneath it
fn any_test(description: &Description, test_matches: &dyn Fn(&Description) -> bool) -> bool {
    if description.is_test() {
        return test_matches(description);
    }
    description
        .children()
        .iter()
        .any(|child| any_test(child, test_matches))
}

/// Lets every test run
#[derive(Debug, Clone, Copy, Default)]
pub struct AllTests;

impl Filter for AllTests {
    fn should_run(&self, _description: &Description) -> bool {
        true
    }

    fn describe(&self) -> String {
        "all tests".to_string()
    }
}

/// Runs only the test equal to a desired description
#[derive(Debug, Clone)]
pub struct MatchDescription {
    desired: Description,
}

impl MatchDescription {
    pub fn new(desired: Description) -> Self {
        Self { desired }
    }
}

impl Filter for MatchDescription {
    fn should_run(&self, description: &Description) -> bool {
        any_test(description, &|test| *test == self.desired)
    }

    fn describe(&self) -> String {
        format!("Method {}", self.desired.display_name())
    }
}

/// Runs tests whose display name contains a substring
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
}

impl NameFilter {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

impl Filter for NameFilter {
    fn should_run(&self, description: &Description) -> bool {
        any_test(description, &|test| test.display_name().contains(&self.pattern))
    }

    fn describe(&self) -> String {
        format!("name contains '{}'", self.pattern)
    }
}

/// Runs tests tagged with at least one included category
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    included: Vec<String>,
}

impl CategoryFilter {
    pub fn include<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            included: categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl Filter for CategoryFilter {
    fn should_run(&self, description: &Description) -> bool {
        any_test(description, &|test| {
            test.categories().iter().any(|c| self.included.contains(c))
        })
    }

    fn describe(&self) -> String {
        format!("categories [{}]", self.included.join(", "))
    }
}

/// Runs the tests another filter rejects
pub struct Exclude {
    inner: Arc<dyn Filter>,
}

impl Filter for Exclude {
    fn should_run(&self, description: &Description) -> bool {
        any_test(description, &|test| !self.inner.should_run(test))
    }

    fn describe(&self) -> String {
        format!("not ({})", self.inner.describe())
    }
}

/// Runs tests accepted by both filters
pub struct Intersection {
    first: Arc<dyn Filter>,
    second: Arc<dyn Filter>,
}

impl Filter for Intersection {
    fn should_run(&self, description: &Description) -> bool {
        any_test(description, &|test| {
            self.first.should_run(test) && self.second.should_run(test)
        })
    }

    fn describe(&self) -> String {
        format!("{} and {}", self.first.describe(), self.second.describe())
    }
}

/// Negate a filter at the test level
pub fn exclude(filter: Arc<dyn Filter>) -> Arc<dyn Filter> {
    Arc::new(Exclude { inner: filter })
}

/// AND-compose two filters
pub fn intersect(first: Arc<dyn Filter>, second: Arc<dyn Filter>) -> Arc<dyn Filter> {
    Arc::new(Intersection { first, second })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tree() -> Description {
        Description::suite(
            "root",
            vec![
                Description::suite(
                    "A",
                    vec![
                        Description::test_with_categories("A", "fast_one", vec!["fast".into()]),
                        Description::test_with_categories("A", "slow_one", vec!["slow".into()]),
                    ],
                ),
                Description::suite(
                    "B",
                    vec![Description::test_with_categories("B", "slow_two", vec!["slow".into()])],
                ),
            ],
        )
    }

    #[rstest]
    #[case("fast_one(A)", true)]
    #[case("A", true)]
    #[case("B", false)]
    #[case("root", true)]
    fn test_category_filter_matches_suites_with_matching_tests(
        #[case] name: &str,
        #[case] expected: bool,
    ) {
        let filter = CategoryFilter::include(["fast"]);
        let node = find(&tree(), name).unwrap();
        assert_eq!(filter.should_run(&node), expected);
    }

    #[test]
    fn test_exclude_negates_per_test() {
        let filter = exclude(Arc::new(CategoryFilter::include(["slow"])));
        let t = tree();
        assert!(filter.should_run(&find(&t, "A").unwrap()));
        assert!(!filter.should_run(&find(&t, "B").unwrap()));
        assert_eq!(filter.describe(), "not (categories [slow])");
    }

    #[test]
    fn test_intersection_requires_both_on_same_test() {
        let filter = intersect(
            Arc::new(NameFilter::new("one")),
            Arc::new(CategoryFilter::include(["slow"])),
        );
        let t = tree();
        assert!(filter.should_run(&find(&t, "slow_one(A)").unwrap()));
        assert!(!filter.should_run(&find(&t, "fast_one(A)").unwrap()));
        assert!(!filter.should_run(&find(&t, "B").unwrap()));
    }

    #[test]
    fn test_match_description_selects_single_test() {
        let filter = MatchDescription::new(Description::test("B", "slow_two"));
        let t = tree();
        assert!(filter.should_run(&t));
        assert!(!filter.should_run(&find(&t, "A").unwrap()));
        assert_eq!(filter.describe(), "Method slow_two(B)");
    }

    fn find(node: &Description, name: &str) -> Option<Description> {
        if node.display_name() == name {
            return Some(node.clone());
        }
        node.children().iter().find_map(|c| find(c, name))
    }
}
