//! Budget-constrained project portfolio selection.
//!
//! Picks the subset of candidate projects that maximizes aggregate weighted
//! benefit under a budget:
//!
//! - **Catalog**: fixed-schema columnar table of project records with
//!   numeric, categorical, ordinal-risk, and date attributes.
//! - **Filter**: tagged predicates (`Threshold`, `Equals`, `OneOf`) bound
//!   against the schema once and ANDed over the catalog.
//! - **Scoring**: min-max normalization and weighted aggregation into a
//!   composite score in `[0, 100]`, with ranking and distribution statistics.
//! - **Optimizer**: LP relaxation of the 0/1 knapsack with threshold
//!   inclusion and a deterministic greedy-by-efficiency fallback.
//! - **Constraints**: risk cap and diversity check on a selected portfolio.
//! - **Pipeline**: one request through all stages, with structured failures
//!   and a textual explanation.
//!
//! # Architecture
//!
//! Data flows strictly forward; no stage mutates its input. Every stage
//! absorbs per-field problems as [`error::StageWarning`]s (logged through
//! `tracing` and returned to the caller) and reserves
//! [`error::PortfolioError`] for inputs the caller must fix.

pub mod catalog;
pub mod constraints;
pub mod error;
pub mod filter;
pub mod optimizer;
pub mod pipeline;
pub mod scoring;
