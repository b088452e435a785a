//! Pipeline request, outcome, and failure types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{AttributeKind, RiskLevel, Value};
use crate::constraints::ConstraintConfig;
use crate::error::StageWarning;
use crate::filter::{FilterSpec, FilterSummary};
use crate::optimizer::{OptimizationMode, SelectionResult};
use crate::scoring::{AppliedWeight, ScoreDistribution, WeightMap};

/// How the caller describes the candidate set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterQuery {
    Structured(FilterSpec),
    /// Free text, turned into a [`FilterSpec`] by a
    /// [`QueryParser`](super::QueryParser).
    Text(String),
}

/// One pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub query: FilterQuery,
    #[serde(default)]
    pub weights: Option<WeightMap>,
    pub budget: f64,
    #[serde(default)]
    pub mode: OptimizationMode,
    #[serde(default)]
    pub constraints: Option<ConstraintConfig>,
}

impl PipelineRequest {
    pub fn new(query: FilterQuery, budget: f64) -> Self {
        Self {
            query,
            weights: None,
            budget,
            mode: OptimizationMode::default(),
            constraints: None,
        }
    }

    pub fn structured(filters: FilterSpec, budget: f64) -> Self {
        Self::new(FilterQuery::Structured(filters), budget)
    }

    pub fn text(query: impl Into<String>, budget: f64) -> Self {
        Self::new(FilterQuery::Text(query.into()), budget)
    }

    pub fn with_weights(mut self, weights: WeightMap) -> Self {
        self.weights = Some(weights);
        self
    }

    pub fn with_mode(mut self, mode: OptimizationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintConfig) -> Self {
        self.constraints = Some(constraints);
        self
    }
}

/// Aggregates describing a selected portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_projects: usize,
    pub total_cost: f64,
    /// Mean composite score; 0 for an empty portfolio.
    pub mean_score: f64,
    /// Mean of the schema's default score attribute, if any record has it.
    pub mean_default_score: Option<f64>,
    /// Sum of finite values per numeric attribute.
    pub numeric_totals: BTreeMap<String, f64>,
    /// Mean of finite values per numeric attribute.
    pub numeric_means: BTreeMap<String, f64>,
    /// Distinct values per categorical attribute.
    pub distinct_values: BTreeMap<String, usize>,
    /// Record count per value, per categorical attribute.
    pub value_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// Record count per level, per risk attribute.
    pub risk_distribution: BTreeMap<String, BTreeMap<RiskLevel, usize>>,
}

impl PortfolioSummary {
    pub fn from_selection(selection: &SelectionResult) -> Self {
        let schema = selection.schema();
        let n = selection.len();
        let mean = |sum: f64, count: usize| if count == 0 { 0.0 } else { sum / count as f64 };

        let mut numeric_totals = BTreeMap::new();
        let mut numeric_means = BTreeMap::new();
        let mut distinct_values = BTreeMap::new();
        let mut value_counts = BTreeMap::new();
        let mut risk_distribution = BTreeMap::new();
        for (id, def) in schema.iter() {
            match def.kind {
                AttributeKind::Numeric => {
                    let finite: Vec<f64> = selection
                        .selected
                        .iter()
                        .filter_map(|p| p.record.get(id).and_then(Value::as_number))
                        .filter(|x| x.is_finite())
                        .collect();
                    if finite.is_empty() {
                        continue;
                    }
                    let sum: f64 = finite.iter().sum();
                    numeric_totals.insert(def.name.clone(), sum);
                    numeric_means.insert(def.name.clone(), mean(sum, finite.len()));
                }
                AttributeKind::Categorical => {
                    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                    for value in selection
                        .selected
                        .iter()
                        .filter_map(|p| p.record.get(id).and_then(Value::as_text))
                    {
                        *counts.entry(value.to_string()).or_insert(0) += 1;
                    }
                    distinct_values.insert(def.name.clone(), counts.len());
                    value_counts.insert(def.name.clone(), counts);
                }
                AttributeKind::Risk => {
                    let mut counts = BTreeMap::new();
                    for level in selection
                        .selected
                        .iter()
                        .filter_map(|p| p.record.get(id).and_then(Value::as_risk))
                    {
                        *counts.entry(level).or_insert(0) += 1;
                    }
                    risk_distribution.insert(def.name.clone(), counts);
                }
                AttributeKind::Date => {}
            }
        }

        let default_id = schema.default_score();
        let defaults: Vec<f64> = selection
            .selected
            .iter()
            .filter_map(|p| p.record.get(default_id))
            .filter_map(|v| v.as_number().or_else(|| v.as_risk().map(RiskLevel::favorability)))
            .collect();

        Self {
            total_projects: n,
            total_cost: selection.diagnostics.total_cost,
            mean_score: mean(selection.diagnostics.total_score, n),
            mean_default_score: (!defaults.is_empty())
                .then(|| mean(defaults.iter().sum(), defaults.len())),
            numeric_totals,
            numeric_means,
            distinct_values,
            value_counts,
            risk_distribution,
        }
    }

    /// The `n` most frequent values of a categorical attribute, by count
    /// descending then value ascending.
    pub fn top_values(&self, attribute: &str, n: usize) -> Vec<(&str, usize)> {
        let Some(counts) = self.value_counts.get(attribute) else {
            return Vec::new();
        };
        let mut ranked: Vec<(&str, usize)> =
            counts.iter().map(|(v, &c)| (v.as_str(), c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Filters actually applied (after text parsing).
    pub filters: FilterSpec,
    pub filtered_count: usize,
    pub scored_count: usize,
    pub weights: Vec<AppliedWeight>,
    pub selection: SelectionResult,
    pub filter_summary: FilterSummary,
    pub score_distribution: Option<ScoreDistribution>,
    pub portfolio_summary: PortfolioSummary,
    /// Warnings from every stage, in stage order.
    pub warnings: Vec<StageWarning>,
    pub explanation: String,
}

/// Category of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The filter left no candidates.
    NoMatches,
    /// No candidate fits the budget.
    BudgetInfeasible,
    /// Candidates fit but the final portfolio is empty.
    EmptySelection,
    /// Bad budget, missing or failing query parser.
    InvalidRequest,
}

/// A failed run, with whatever was learned before it stopped.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct PipelineFailure {
    pub kind: FailureKind,
    pub message: String,
    pub filtered_count: usize,
    pub warnings: Vec<StageWarning>,
}

impl PipelineFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            filtered_count: 0,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn with_context(mut self, filtered_count: usize, warnings: Vec<StageWarning>) -> Self {
        self.filtered_count = filtered_count;
        self.warnings = warnings;
        self
    }
}
