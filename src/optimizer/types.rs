//! Optimizer inputs and selection results.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{ProjectRecord, Schema};
use crate::error::StageWarning;

/// Optimization direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationMode {
    /// Maximize aggregate composite score.
    #[default]
    MaximizeScore,
    /// Treat the composite score as an inverse-risk proxy and minimize it.
    MinimizeRisk,
}

impl OptimizationMode {
    /// Multiplier applied to composite scores to form the objective.
    pub fn sign(self) -> f64 {
        match self {
            OptimizationMode::MaximizeScore => 1.0,
            OptimizationMode::MinimizeRisk => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OptimizationMode::MaximizeScore => "maximize_score",
            OptimizationMode::MinimizeRisk => "minimize_risk",
        }
    }
}

impl std::fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OptimizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "maximize_score" => Ok(OptimizationMode::MaximizeScore),
            "minimize_risk" => Ok(OptimizationMode::MinimizeRisk),
            other => Err(format!("unknown optimization mode '{other}'")),
        }
    }
}

/// Why the greedy fallback ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackTrigger {
    /// The LP solver returned an error.
    SolverFailure,
    /// The LP solved but no variable crossed the inclusion threshold.
    BelowThreshold,
    /// Restoring the budget emptied the LP selection.
    RepairEmptied,
}

/// Algorithm that produced a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum SelectionPath {
    /// Nothing was solved (empty input, zero budget, or nothing affordable).
    Skipped,
    /// LP relaxation thresholded at the inclusion threshold.
    LpThreshold,
    /// Greedy by efficiency ratio.
    Greedy { trigger: FallbackTrigger },
}

/// Why a selection is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum EmptyReason {
    /// The scored subset had no records.
    NoCandidates,
    /// The budget is zero.
    ZeroBudget,
    /// Even the cheapest candidate costs more than the budget.
    BudgetInfeasible { cheapest: f64 },
    /// Every record was removed (by the optimizer or post-processing).
    NothingSelected,
}

/// A chosen record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedProject {
    /// Row of the record in the scored set.
    pub position: usize,
    pub record: ProjectRecord,
    pub cost: f64,
    /// Composite score in `[0, 100]`.
    pub score: f64,
    /// Continuous LP value in `[0, 1]`; 1 for greedy picks.
    pub selection_weight: f64,
}

/// Aggregate figures for a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SelectionDiagnostics {
    pub total_cost: f64,
    pub total_score: f64,
    /// `total_cost / budget`; 0 for a zero budget.
    pub budget_utilization: f64,
    pub selected_count: usize,
}

impl SelectionDiagnostics {
    pub fn compute(selected: &[SelectedProject], budget: f64) -> Self {
        let total_cost: f64 = selected.iter().map(|p| p.cost).sum();
        let total_score: f64 = selected.iter().map(|p| p.score).sum();
        Self {
            total_cost,
            total_score,
            budget_utilization: if budget > 0.0 { total_cost / budget } else { 0.0 },
            selected_count: selected.len(),
        }
    }
}

/// Portfolio chosen by the optimizer, with diagnostics.
///
/// Records appear in scored-set order.
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    #[serde(skip)]
    pub(crate) schema: Arc<Schema>,
    pub budget: f64,
    pub mode: OptimizationMode,
    pub selected: Vec<SelectedProject>,
    #[serde(flatten)]
    pub path: SelectionPath,
    pub empty_reason: Option<EmptyReason>,
    pub diagnostics: SelectionDiagnostics,
    pub warnings: Vec<StageWarning>,
}

impl SelectionResult {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.selected.iter().map(|p| p.record.id.as_str()).collect()
    }

    pub fn total_cost(&self) -> f64 {
        self.diagnostics.total_cost
    }

    /// Keeps only the records for which `keep` returns true and refreshes
    /// the diagnostics.
    pub(crate) fn retain<F: FnMut(&SelectedProject) -> bool>(&mut self, keep: F) {
        self.selected.retain(keep);
        self.diagnostics = SelectionDiagnostics::compute(&self.selected, self.budget);
        if self.selected.is_empty() && self.empty_reason.is_none() {
            self.empty_reason = Some(EmptyReason::NothingSelected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, cost: f64, score: f64) -> SelectedProject {
        SelectedProject {
            position: 0,
            record: ProjectRecord {
                id: id.into(),
                values: vec![],
            },
            cost,
            score,
            selection_weight: 1.0,
        }
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("minimize_risk".parse(), Ok(OptimizationMode::MinimizeRisk));
        assert_eq!(OptimizationMode::default(), OptimizationMode::MaximizeScore);
        assert!("maximize".parse::<OptimizationMode>().is_err());
    }

    #[test]
    fn test_mode_sign() {
        assert_eq!(OptimizationMode::MaximizeScore.sign(), 1.0);
        assert_eq!(OptimizationMode::MinimizeRisk.sign(), -1.0);
    }

    #[test]
    fn test_diagnostics() {
        let d = SelectionDiagnostics::compute(&[project("a", 60.0, 70.0), project("b", 20.0, 10.0)], 100.0);
        assert_eq!(d.selected_count, 2);
        assert!((d.total_cost - 80.0).abs() < 1e-10);
        assert!((d.total_score - 80.0).abs() < 1e-10);
        assert!((d.budget_utilization - 0.8).abs() < 1e-10);
    }

    #[test]
    fn test_zero_budget_utilization() {
        let d = SelectionDiagnostics::compute(&[], 0.0);
        assert_eq!(d.budget_utilization, 0.0);
    }
}
