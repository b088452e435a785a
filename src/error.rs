//! Error and warning types shared by every stage.
//!
//! Two tiers exist:
//!
//! - [`StageWarning`]: per-field problems (unknown attribute, uncoercible
//!   value, solver failure, ...) that a stage absorbs. They are logged where
//!   they occur and collected on the stage output so callers can inspect them.
//! - [`PortfolioError`]: construction and input errors that the caller must
//!   fix (malformed schema, invalid record, negative budget, bad config).

use serde::Serialize;

/// Stage that emitted a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Filter,
    Scoring,
    Optimizer,
    Constraints,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Filter => "filter",
            Stage::Scoring => "scoring",
            Stage::Optimizer => "optimizer",
            Stage::Constraints => "constraints",
        };
        f.write_str(name)
    }
}

/// A non-fatal problem absorbed by a stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageWarning {
    /// Referenced attribute is not part of the schema.
    MissingAttribute { stage: Stage, attribute: String },

    /// Value or predicate is not comparable with the attribute's type.
    TypeCoercion {
        stage: Stage,
        attribute: String,
        detail: String,
    },

    /// Weight entry is negative or not finite.
    InvalidWeight { attribute: String, weight: f64 },

    /// No usable weight entry; the default attribute scored alone.
    DefaultScoreFallback { attribute: String },

    /// The LP backend failed; greedy selection was used instead.
    SolverFailure { solver: String, reason: String },

    /// No LP variable crossed the inclusion threshold.
    BelowThreshold { threshold: f64 },

    /// Records dropped to restore `total cost <= budget`.
    BudgetRepair { removed: Vec<String> },

    /// Fewer distinct values than required on a diversity attribute.
    DiversityShortfall {
        attribute: String,
        distinct: usize,
        required: usize,
    },

    /// Unfavorable-risk records pruned by a risk cap.
    RiskCapPruned { attribute: String, removed: Vec<String> },
}

impl std::fmt::Display for StageWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageWarning::MissingAttribute { stage, attribute } => {
                write!(f, "{stage}: attribute '{attribute}' not found in schema, skipped")
            }
            StageWarning::TypeCoercion {
                stage,
                attribute,
                detail,
            } => write!(f, "{stage}: attribute '{attribute}' skipped: {detail}"),
            StageWarning::InvalidWeight { attribute, weight } => {
                write!(f, "scoring: weight {weight} for '{attribute}' is not a non-negative number")
            }
            StageWarning::DefaultScoreFallback { attribute } => {
                write!(f, "scoring: no valid weights, scored by '{attribute}' only")
            }
            StageWarning::SolverFailure { solver, reason } => {
                write!(f, "optimizer: {solver} failed ({reason}), used greedy selection")
            }
            StageWarning::BelowThreshold { threshold } => write!(
                f,
                "optimizer: no LP variable above {threshold}, used greedy selection"
            ),
            StageWarning::BudgetRepair { removed } => write!(
                f,
                "optimizer: removed {} record(s) to stay within budget",
                removed.len()
            ),
            StageWarning::DiversityShortfall {
                attribute,
                distinct,
                required,
            } => write!(
                f,
                "constraints: only {distinct} distinct '{attribute}' value(s), minimum {required}"
            ),
            StageWarning::RiskCapPruned { attribute, removed } => write!(
                f,
                "constraints: removed {} unfavorable '{attribute}' record(s)",
                removed.len()
            ),
        }
    }
}

/// Errors returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum PortfolioError {
    #[error("duplicate attribute: {0}")]
    DuplicateAttribute(String),

    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("attribute '{attribute}' must be {expected}")]
    AttributeKind {
        attribute: String,
        expected: &'static str,
    },

    #[error("schema has no {0} attribute")]
    MissingDesignation(&'static str),

    #[error("invalid record '{id}': {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("budget must be a finite non-negative number, got {0}")]
    InvalidBudget(f64),

    #[error("invalid scores: {0}")]
    InvalidScores(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("failed to parse query: {0}")]
    QueryParse(String),
}

/// Result alias used across the crate.
pub type PortfolioResult<T> = Result<T, PortfolioError>;
