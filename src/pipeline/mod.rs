//! Request-level orchestration.
//!
//! [`Pipeline::run`] takes a [`PipelineRequest`] through every stage and
//! returns either a [`PipelineOutcome`] or a [`PipelineFailure`] whose
//! [`FailureKind`] tells the caller what went wrong.
//!
//! Free-text queries go through a [`QueryParser`]; explanations come from a
//! [`SelectionExplainer`] ([`TemplateExplainer`] by default).

mod config;
mod interfaces;
mod runner;
mod types;

pub use config::PipelineConfig;
pub use interfaces::{ClauseParser, QueryParser, SelectionExplainer, TemplateExplainer};
pub use runner::Pipeline;
pub use types::{
    FailureKind, FilterQuery, PipelineFailure, PipelineOutcome, PipelineRequest, PortfolioSummary,
};
