//! Multi-attribute weighted scoring.
//!
//! [`CompositeScorer`] turns a candidate subset and a [`WeightMap`] into a
//! [`ScoredSet`]: every row gets a composite score in `[0, 100]` built from
//! min-max normalized attribute values. Ordinal risk attributes are mapped
//! onto a favorability scale first, so lower risk scores higher.
//!
//! Scoring never reorders rows. Ranking ([`ScoredSet::rank`]) and score
//! statistics ([`ScoredSet::distribution`]) are separate operations.

mod config;
mod scorer;
mod stats;
mod types;

pub use config::ScorerConfig;
pub use scorer::{normalize, CompositeScorer, NormalizationRange, ScoreOutcome};
pub use stats::ScoreDistribution;
pub use types::{AppliedWeight, RankedProject, ScoredRecord, ScoredSet, WeightMap};
