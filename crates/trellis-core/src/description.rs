//! Description - identity tree of suites and tests

use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Display name of the description returned by [`Description::empty`]
pub const EMPTY_NAME: &str = "No Tests";

/// Whether a description node is a suite or a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionKind {
    Suite,
    Test,
}

#[derive(Debug)]
struct Node {
    display_name: String,
    unique_id: String,
    kind: DescriptionKind,
    children: Vec<Description>,
    categories: Vec<String>,
}

/// Identifies a runnable unit: a suite or an individual test.
///
/// Descriptions are immutable and cheap to clone. Two descriptions are
/// equal when their unique ids are equal; a test's id includes the unit
/// it belongs to, so `add(CalcTest)` and `add(OtherTest)` differ.
#[derive(Clone)]
pub struct Description(Arc<Node>);

impl Description {
    /// Describe a suite with the given children
    pub fn suite(name: impl Into<String>, children: Vec<Description>) -> Self {
        let name = name.into();
        Self(Arc::new(Node {
            unique_id: name.clone(),
            display_name: name,
            kind: DescriptionKind::Suite,
            children,
            categories: Vec::new(),
        }))
    }

    /// Describe a single test `method` inside `unit`
    pub fn test(unit: &str, method: &str) -> Self {
        Self::test_with_categories(unit, method, Vec::new())
    }

    /// Describe a single test carrying category tags
    pub fn test_with_categories(unit: &str, method: &str, categories: Vec<String>) -> Self {
        let name = format!("{}({})", method, unit);
        Self(Arc::new(Node {
            unique_id: name.clone(),
            display_name: name,
            kind: DescriptionKind::Test,
            children: Vec::new(),
            categories,
        }))
    }

    /// The description of a suite that runs nothing
    pub fn empty() -> Self {
        Self::suite(EMPTY_NAME, Vec::new())
    }

    /// Human-readable name
    pub fn display_name(&self) -> &str {
        &self.0.display_name
    }

    /// Identity used for equality and hashing
    pub fn unique_id(&self) -> &str {
        &self.0.unique_id
    }

    pub fn kind(&self) -> DescriptionKind {
        self.0.kind
    }

    pub fn is_suite(&self) -> bool {
        self.0.kind == DescriptionKind::Suite
    }

    pub fn is_test(&self) -> bool {
        self.0.kind == DescriptionKind::Test
    }

    /// True for a suite without children
    pub fn is_empty(&self) -> bool {
        self.is_suite() && self.0.children.is_empty()
    }

    pub fn children(&self) -> &[Description] {
        &self.0.children
    }

    pub fn categories(&self) -> &[String] {
        &self.0.categories
    }

    /// Number of test leaves beneath (or at) this node
    pub fn test_count(&self) -> usize {
        match self.0.kind {
            DescriptionKind::Test => 1,
            DescriptionKind::Suite => self.0.children.iter().map(Description::test_count).sum(),
        }
    }

    /// Method part of a test name, e.g. `add` for `add(CalcTest)`
    pub fn method_name(&self) -> Option<&str> {
        if !self.is_test() {
            return None;
        }
        let name = self.display_name();
        name.rfind('(').map(|open| &name[..open])
    }

    /// Unit part of a test name, or the suite name itself
    pub fn unit_name(&self) -> &str {
        let name = self.display_name();
        if self.is_test() {
            if let (Some(open), true) = (name.rfind('('), name.ends_with(')')) {
                return &name[open + 1..name.len() - 1];
            }
        }
        name
    }

    /// All test leaves in depth-first order
    pub fn tests(&self) -> Vec<Description> {
        let mut out = Vec::new();
        self.collect_tests(&mut out);
        out
    }

    fn collect_tests(&self, out: &mut Vec<Description>) {
        if self.is_test() {
            out.push(self.clone());
        }
        for child in self.children() {
            child.collect_tests(out);
        }
    }

    /// Check whether two handles point at the same node
    pub fn ptr_eq(a: &Description, b: &Description) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Render the tree with two-space indentation per level
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.display_name());
        out.push('\n');
        for child in self.children() {
            child.render_into(out, depth + 1);
        }
    }
}

impl PartialEq for Description {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id() == other.unique_id()
    }
}

impl Eq for Description {}

impl Hash for Description {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.unique_id().hash(state);
    }
}

impl fmt::Debug for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Description");
        s.field("name", &self.display_name()).field("kind", &self.kind());
        if !self.children().is_empty() {
            s.field("children", &self.children());
        }
        s.finish()
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Description {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Description", 3)?;
        s.serialize_field("name", self.display_name())?;
        s.serialize_field("kind", &self.kind())?;
        s.serialize_field("children", self.children())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_same_method_in_different_units_differs() {
        let a = Description::test("CalcTest", "add");
        let b = Description::test("OtherTest", "add");
        let c = Description::test("CalcTest", "add");

        assert_ne!(a, b);
        assert_eq!(a, c);
        assert!(!Description::ptr_eq(&a, &c));

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_names_split_into_method_and_unit() {
        let d = Description::test("CalcTest", "add[1, 2]");
        assert_eq!(d.method_name(), Some("add[1, 2]"));
        assert_eq!(d.unit_name(), "CalcTest");

        let suite = Description::suite("CalcTest", vec![d]);
        assert_eq!(suite.method_name(), None);
        assert_eq!(suite.unit_name(), "CalcTest");
    }

    #[test]
    fn test_count_ignores_empty_suites() {
        let tree = Description::suite(
            "root",
            vec![
                Description::suite(
                    "A",
                    vec![Description::test("A", "one"), Description::test("A", "two")],
                ),
                Description::empty(),
                Description::test("B", "three"),
            ],
        );

        assert_eq!(tree.test_count(), 3);
        assert_eq!(tree.tests().len(), 3);
        assert!(Description::empty().is_empty());
    }

    #[test]
    fn test_render_tree_indents_children() {
        let tree = Description::suite("A", vec![Description::test("A", "one")]);
        assert_eq!(tree.render_tree(), "A\n  one(A)\n");
    }
}
