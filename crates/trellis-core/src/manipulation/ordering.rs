//! Orderings - permutation strategies over sibling descriptions

use crate::description::Description;
use crate::error::InvalidOrderingError;
use crate::manipulation::sorter::Sorter;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;

/// Reorders a group of sibling descriptions.
///
/// Implementations must return a permutation of their input. The
/// [`Orderer`] checks this and rejects anything else.
pub trait Ordering: Send + Sync {
    fn order_items(&self, descriptions: &[Description]) -> Vec<Description>;

    fn name(&self) -> String;
}

impl Ordering for Sorter {
    fn order_items(&self, descriptions: &[Description]) -> Vec<Description> {
        let mut sorted = descriptions.to_vec();
        sorted.sort_by(|a, b| self.compare(a, b));
        sorted
    }

    fn name(&self) -> String {
        format!("sorted by {}", Sorter::name(self))
    }
}

/// Deterministic shuffle driven by a seed
#[derive(Debug, Clone, Copy)]
pub struct Shuffled {
    seed: u64,
}

impl Shuffled {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Ordering for Shuffled {
    fn order_items(&self, descriptions: &[Description]) -> Vec<Description> {
        let mut shuffled = descriptions.to_vec();
        let mut rng = StdRng::seed_from_u64(self.seed);
        shuffled.shuffle(&mut rng);
        shuffled
    }

    fn name(&self) -> String {
        format!("shuffled (seed {})", self.seed)
    }
}

/// Reverses declaration order
#[derive(Debug, Clone, Copy, Default)]
pub struct Reversed;

impl Ordering for Reversed {
    fn order_items(&self, descriptions: &[Description]) -> Vec<Description> {
        descriptions.iter().rev().cloned().collect()
    }

    fn name(&self) -> String {
        "reversed".to_string()
    }
}

/// Puts listed names first, in list order; everything else keeps its place after them.
///
/// A name matches a description's display name, or its method name for a test.
#[derive(Debug, Clone)]
pub struct Declared {
    names: Vec<String>,
}

impl Declared {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    fn rank(&self, description: &Description) -> usize {
        self.names
            .iter()
            .position(|name| {
                description.display_name() == name || description.method_name() == Some(name)
            })
            .unwrap_or(self.names.len())
    }
}

impl Ordering for Declared {
    fn order_items(&self, descriptions: &[Description]) -> Vec<Description> {
        let mut ordered = descriptions.to_vec();
        ordered.sort_by_key(|d| self.rank(d));
        ordered
    }

    fn name(&self) -> String {
        format!("declared [{}]", self.names.join(", "))
    }
}

/// Applies an [`Ordering`] and enforces that it only permutes
#[derive(Clone)]
pub struct Orderer {
    ordering: Arc<dyn Ordering>,
}

impl Orderer {
    pub fn new(ordering: Arc<dyn Ordering>) -> Self {
        Self { ordering }
    }

    pub fn name(&self) -> String {
        self.ordering.name()
    }

    /// Order descriptions, failing if the result is not a permutation
    pub fn order(&self, descriptions: &[Description]) -> Result<Vec<Description>, InvalidOrderingError> {
        let ordered = self.ordering.order_items(descriptions);
        check_permutation(descriptions, &ordered).map_err(|reason| InvalidOrderingError {
            ordering: self.ordering.name(),
            reason,
        })?;
        Ok(ordered)
    }

    /// Order items by the description each maps to.
    ///
    /// Items sharing a description stay together in their original
    /// relative order.
    pub fn order_by_description<T, F>(
        &self,
        items: Vec<T>,
        describe: F,
    ) -> Result<Vec<T>, InvalidOrderingError>
    where
        F: Fn(&T) -> Description,
    {
        let mut keys = Vec::new();
        let mut groups: HashMap<String, Vec<T>> = HashMap::new();
        for item in items {
            let description = describe(&item);
            let id = description.unique_id().to_string();
            groups
                .entry(id)
                .or_insert_with(|| {
                    keys.push(description.clone());
                    Vec::new()
                })
                .push(item);
        }

        let ordered = self.order(&keys)?;
        let mut out = Vec::new();
        for description in ordered {
            if let Some(group) = groups.remove(description.unique_id()) {
                out.extend(group);
            }
        }
        Ok(out)
    }
}

fn check_permutation(input: &[Description], ordered: &[Description]) -> Result<(), String> {
    if input.len() != ordered.len() {
        return Err(format!(
            "returned {} items for {} inputs",
            ordered.len(),
            input.len()
        ));
    }

    let mut balance: HashMap<&str, isize> = HashMap::new();
    for d in input {
        *balance.entry(d.unique_id()).or_default() += 1;
    }
    for d in ordered {
        *balance.entry(d.unique_id()).or_default() -= 1;
    }

    let mut offenders: Vec<(&str, isize)> = balance.into_iter().filter(|(_, n)| *n != 0).collect();
    offenders.sort();
    match offenders.first() {
        None => Ok(()),
        Some((id, n)) if *n > 0 => Err(format!("dropped '{}'", id)),
        Some((id, _)) => Err(format!("added '{}'", id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn tests(names: &[&str]) -> Vec<Description> {
        names.iter().map(|n| Description::test("U", n)).collect()
    }

    fn names(descriptions: &[Description]) -> Vec<String> {
        descriptions.iter().map(|d| d.display_name().to_string()).collect()
    }

    struct Dropper;

    impl Ordering for Dropper {
        fn order_items(&self, descriptions: &[Description]) -> Vec<Description> {
            descriptions.iter().skip(1).cloned().collect()
        }

        fn name(&self) -> String {
            "dropper".into()
        }
    }

    struct Swapper;

    impl Ordering for Swapper {
        fn order_items(&self, descriptions: &[Description]) -> Vec<Description> {
            let mut out = descriptions.to_vec();
            if let Some(first) = out.first_mut() {
                *first = Description::test("U", "intruder");
            }
            out
        }

        fn name(&self) -> String {
            "swapper".into()
        }
    }

    #[test]
    fn test_sorter_is_an_ordering() {
        let orderer = Orderer::new(Arc::new(Sorter::by_name()));
        let ordered = orderer.order(&tests(&["c", "a", "b"])).unwrap();
        assert_eq!(names(&ordered), vec!["a(U)", "b(U)", "c(U)"]);
    }

    #[test]
    fn test_declared_puts_listed_first() {
        let orderer = Orderer::new(Arc::new(Declared::new(["c", "a"])));
        let ordered = orderer.order(&tests(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(names(&ordered), vec!["c(U)", "a(U)", "b(U)", "d(U)"]);
    }

    #[test]
    fn test_dropping_ordering_rejected() {
        let err = Orderer::new(Arc::new(Dropper))
            .order(&tests(&["a", "b"]))
            .unwrap_err();
        assert_eq!(err.ordering, "dropper");
        assert!(err.reason.contains("returned 1 items for 2 inputs"));
    }

    #[test]
    fn test_substituting_ordering_rejected() {
        let err = Orderer::new(Arc::new(Swapper))
            .order(&tests(&["a", "b"]))
            .unwrap_err();
        assert_eq!(err.reason, "added 'intruder(U)'");
    }

    #[test]
    fn test_order_by_description_keeps_groups_together() {
        let orderer = Orderer::new(Arc::new(Reversed));
        let items = vec![("A", 1), ("B", 2), ("A", 3)];
        let ordered = orderer
            .order_by_description(items, |(unit, _)| Description::suite(*unit, vec![]))
            .unwrap();
        assert_eq!(ordered, vec![("B", 2), ("A", 1), ("A", 3)]);
    }

    #[test]
    fn test_shuffle_is_deterministic_per_seed() {
        let input = tests(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let first = Shuffled::new(7).order_items(&input);
        let second = Shuffled::new(7).order_items(&input);
        assert_eq!(names(&first), names(&second));
    }

    proptest! {
        #[test]
        fn prop_shuffle_is_a_permutation(
            seed in any::<u64>(),
            raw in proptest::collection::vec("[a-z]{1,6}", 0..24),
        ) {
            let input: Vec<Description> = raw.iter().map(|n| Description::test("U", n)).collect();
            let ordered = Orderer::new(Arc::new(Shuffled::new(seed))).order(&input).unwrap();

            let mut before = names(&input);
            let mut after = names(&ordered);
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }
    }
}
