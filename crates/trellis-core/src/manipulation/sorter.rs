//! Sorter - comparator-driven reordering of siblings

use crate::description::Description;
use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::Arc;

type Comparator = Arc<dyn Fn(&Description, &Description) -> CmpOrdering + Send + Sync>;

/// Total order over descriptions, applied to every sibling group
#[derive(Clone)]
pub struct Sorter {
    name: String,
    compare: Comparator,
}

impl Sorter {
    pub fn new<F>(name: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&Description, &Description) -> CmpOrdering + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compare: Arc::new(compare),
        }
    }

    /// Ascending by display name
    pub fn by_name() -> Self {
        Self::new("name", |a, b| a.display_name().cmp(b.display_name()))
    }

    /// Descending by display name
    pub fn reverse_name() -> Self {
        Self::new("reverse name", |a, b| b.display_name().cmp(a.display_name()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn compare(&self, a: &Description, b: &Description) -> CmpOrdering {
        (self.compare)(a, b)
    }

    /// Stable sort of `items` by the description each one maps to
    pub fn sort_by_description<T, F>(&self, items: &mut [T], describe: F)
    where
        F: Fn(&T) -> Description,
    {
        items.sort_by(|a, b| self.compare(&describe(a), &describe(b)));
    }
}

impl fmt::Debug for Sorter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sorter").field("name", &self.name).finish()
    }
}
