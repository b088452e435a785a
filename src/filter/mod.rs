//! Predicate-based catalog filtering.
//!
//! A [`FilterSpec`] maps attribute names to [`Predicate`]s. Binding it to a
//! schema resolves every name once; predicates naming unknown attributes or
//! carrying operands of the wrong type are skipped with a warning rather
//! than aborting the pass. Remaining predicates are ANDed; [`Predicate::OneOf`]
//! is the only disjunction.
//!
//! Adding a predicate for a new attribute can only shrink the result.

mod evaluator;
mod types;

pub use evaluator::{
    BoundFilter, BoundPredicate, FilterEvaluator, FilterOutcome, FilterSummary, PredicateImpact,
};
pub use types::{Comparison, FilterSpec, Predicate};
