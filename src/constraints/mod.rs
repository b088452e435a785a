//! Portfolio post-processing rules.
//!
//! - [`RiskCapRule`]: at most `max_unfavorable` records at or above an
//!   unfavorable risk level; excess records with the lowest composite score
//!   are removed.
//! - [`DiversityRule`]: minimum number of distinct values of a categorical
//!   attribute. Advisory only; a shortfall produces a warning.

mod config;
mod processor;

pub use config::{ConstraintConfig, DiversityRule, RiskCapRule};
pub use processor::ConstraintProcessor;
