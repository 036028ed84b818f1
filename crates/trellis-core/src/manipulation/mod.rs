//! Tree manipulation: filtering, sorting and ordering runner children

pub mod factory;
pub mod filter;
pub mod ordering;
pub mod sorter;

pub use factory::{FilterFactories, FilterFactory};
pub use filter::{exclude, intersect, AllTests, CategoryFilter, Filter, MatchDescription, NameFilter};
pub use ordering::{Declared, Orderer, Ordering, Reversed, Shuffled};
pub use sorter::Sorter;
