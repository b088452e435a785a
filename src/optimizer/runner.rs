//! Portfolio optimizer runner.

use tracing::{debug, info, warn};

use super::config::OptimizerConfig;
use super::greedy::greedy_by_efficiency;
use super::lp::{KnapsackRelaxation, LpError, LpSolver, SimplexSolver};
use super::types::{
    EmptyReason, FallbackTrigger, OptimizationMode, SelectedProject, SelectionDiagnostics,
    SelectionPath, SelectionResult,
};
use crate::error::{PortfolioError, PortfolioResult, StageWarning};
use crate::scoring::ScoredSet;

/// Rows chosen by one selection path, with their selection weights.
struct Picks {
    rows: Vec<usize>,
    weights: Vec<f64>,
    path: SelectionPath,
}

impl Picks {
    fn skipped() -> Self {
        Self {
            rows: Vec::new(),
            weights: Vec::new(),
            path: SelectionPath::Skipped,
        }
    }

    fn cost(&self, costs: &[f64]) -> f64 {
        self.rows.iter().map(|&r| costs[r]).sum()
    }
}

/// Budget-constrained portfolio selection.
///
/// Solves the LP relaxation, keeps variables above the inclusion threshold
/// and falls back to greedy-by-efficiency when the solver fails or nothing
/// crosses the threshold.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_portfolio::catalog::{Catalog, Schema, Value};
/// use u_portfolio::optimizer::{OptimizationMode, OptimizerConfig, PortfolioOptimizer};
/// use u_portfolio::scoring::ScoredSet;
///
/// let schema = Arc::new(
///     Schema::builder()
///         .numeric("cost")
///         .cost_attribute("cost")
///         .default_score_attribute("cost")
///         .build()
///         .unwrap(),
/// );
/// let mut builder = Catalog::builder(schema);
/// builder.push("A", vec![Value::from(100.0)]).unwrap();
/// builder.push("B", vec![Value::from(50.0)]).unwrap();
/// builder.push("C", vec![Value::from(60.0)]).unwrap();
/// let scored = ScoredSet::new(builder.build(), vec![90.0, 40.0, 70.0]).unwrap();
///
/// let mut optimizer = PortfolioOptimizer::new(OptimizerConfig::default());
/// let result = optimizer
///     .optimize(&scored, 110.0, OptimizationMode::MaximizeScore)
///     .unwrap();
/// assert!(result.total_cost() <= 110.0);
/// assert!(optimizer.last_diagnostics().is_some());
/// ```
pub struct PortfolioOptimizer {
    config: OptimizerConfig,
    solver: Box<dyn LpSolver>,
    last: Option<SelectionDiagnostics>,
}

impl PortfolioOptimizer {
    /// Creates an optimizer backed by [`SimplexSolver`].
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            solver: Box::new(SimplexSolver),
            last: None,
        }
    }

    /// Replaces the LP backend.
    pub fn with_solver(mut self, solver: impl LpSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Diagnostics of the most recent [`optimize`](Self::optimize) call.
    pub fn last_diagnostics(&self) -> Option<&SelectionDiagnostics> {
        self.last.as_ref()
    }

    /// Selects a portfolio from `scored` whose total cost stays within
    /// `budget`.
    ///
    /// Fails only for a negative or non-finite budget. An empty result
    /// carries an [`EmptyReason`].
    pub fn optimize(
        &mut self,
        scored: &ScoredSet,
        budget: f64,
        mode: OptimizationMode,
    ) -> PortfolioResult<SelectionResult> {
        if !budget.is_finite() || budget < 0.0 {
            return Err(PortfolioError::InvalidBudget(budget));
        }

        let catalog = scored.catalog();
        let costs = catalog.costs();
        let mut warnings = Vec::new();

        let cheapest = costs.iter().copied().fold(f64::INFINITY, f64::min);
        let (picks, empty_reason) = if scored.is_empty() {
            (Picks::skipped(), Some(EmptyReason::NoCandidates))
        } else if budget == 0.0 {
            (Picks::skipped(), Some(EmptyReason::ZeroBudget))
        } else if cheapest > budget {
            debug!(cheapest, budget, "no candidate fits the budget");
            (Picks::skipped(), Some(EmptyReason::BudgetInfeasible { cheapest }))
        } else {
            let objective: Vec<f64> = scored.scores().iter().map(|s| s * mode.sign()).collect();
            let picks = self.select(scored, &objective, budget, &mut warnings);
            let reason = picks.rows.is_empty().then_some(EmptyReason::NothingSelected);
            (picks, reason)
        };

        let selected: Vec<SelectedProject> = picks
            .rows
            .iter()
            .zip(&picks.weights)
            .map(|(&row, &weight)| SelectedProject {
                position: row,
                record: catalog.record(row),
                cost: costs[row],
                score: scored.score(row),
                selection_weight: weight,
            })
            .collect();
        let diagnostics = SelectionDiagnostics::compute(&selected, budget);

        info!(
            path = ?picks.path,
            mode = %mode,
            candidates = scored.len(),
            selected = diagnostics.selected_count,
            total_cost = diagnostics.total_cost,
            budget,
            "portfolio optimized"
        );

        self.last = Some(diagnostics.clone());
        Ok(SelectionResult {
            schema: catalog.schema_arc(),
            budget,
            mode,
            selected,
            path: picks.path,
            empty_reason,
            diagnostics,
            warnings,
        })
    }

    /// LP threshold path with greedy fallback. Picks come back in row order.
    fn select(
        &self,
        scored: &ScoredSet,
        objective: &[f64],
        budget: f64,
        warnings: &mut Vec<StageWarning>,
    ) -> Picks {
        let costs = scored.catalog().costs();
        let problem = KnapsackRelaxation {
            objective,
            costs,
            budget,
        };
        let threshold = self.config.inclusion_threshold;

        let outcome = self.solver.solve(&problem).and_then(|solution| {
            if solution.values.len() == problem.len() {
                Ok(solution)
            } else {
                Err(LpError::Numerical(format!(
                    "{} values for {} variables",
                    solution.values.len(),
                    problem.len()
                )))
            }
        });
        let trigger = match outcome {
            Ok(solution) => {
                let (rows, weights): (Vec<usize>, Vec<f64>) = solution
                    .values
                    .iter()
                    .enumerate()
                    .filter(|(_, x)| **x > threshold)
                    .map(|(row, x)| (row, *x))
                    .unzip();
                debug!(
                    solver = self.solver.name(),
                    objective = solution.objective,
                    included = rows.len(),
                    "LP relaxation solved"
                );
                if rows.is_empty() {
                    warn!(threshold, "no LP variable crossed the inclusion threshold");
                    warnings.push(StageWarning::BelowThreshold { threshold });
                    FallbackTrigger::BelowThreshold
                } else {
                    let mut picks = Picks {
                        rows,
                        weights,
                        path: SelectionPath::LpThreshold,
                    };
                    enforce_budget(&mut picks, scored, budget, warnings);
                    if !picks.rows.is_empty() {
                        return picks;
                    }
                    FallbackTrigger::RepairEmptied
                }
            }
            Err(e) => {
                warn!(solver = self.solver.name(), error = %e, "LP solve failed, using greedy selection");
                warnings.push(StageWarning::SolverFailure {
                    solver: self.solver.name().to_string(),
                    reason: e.to_string(),
                });
                FallbackTrigger::SolverFailure
            }
        };

        let mut rows = greedy_by_efficiency(costs, objective, budget);
        rows.sort_unstable();
        let mut picks = Picks {
            weights: vec![1.0; rows.len()],
            rows,
            path: SelectionPath::Greedy { trigger },
        };
        enforce_budget(&mut picks, scored, budget, warnings);
        picks
    }
}

/// Drops picks until their cost fits the budget: lowest selection weight
/// first, then lowest score, then latest row.
fn enforce_budget(
    picks: &mut Picks,
    scored: &ScoredSet,
    budget: f64,
    warnings: &mut Vec<StageWarning>,
) {
    let costs = scored.catalog().costs();
    if picks.cost(costs) <= budget {
        return;
    }

    let mut order: Vec<usize> = (0..picks.rows.len()).collect();
    order.sort_by(|&a, &b| {
        let (ra, rb) = (picks.rows[a], picks.rows[b]);
        picks.weights[a]
            .total_cmp(&picks.weights[b])
            .then(scored.score(ra).total_cmp(&scored.score(rb)))
            .then(rb.cmp(&ra))
    });

    let mut keep = vec![true; picks.rows.len()];
    let mut removed = Vec::new();
    let mut removed_weights = Vec::new();
    for i in order {
        let spent: f64 = picks
            .rows
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(r, _)| costs[*r])
            .sum();
        if spent <= budget {
            break;
        }
        keep[i] = false;
        removed.push(scored.catalog().id(picks.rows[i]).to_string());
        removed_weights.push(picks.weights[i]);
    }

    let mut flags = keep.iter();
    picks.rows.retain(|_| flags.next().copied().unwrap_or(false));
    let mut flags = keep.iter();
    picks.weights.retain(|_| flags.next().copied().unwrap_or(false));

    if is_fractional_trim(&removed_weights) {
        debug!(removed = %removed[0], budget, "dropped fractional LP pick to fit budget");
    } else {
        warn!(removed = removed.len(), budget, "selection exceeded budget, records removed");
    }
    warnings.push(StageWarning::BudgetRepair { removed });
}

/// A basic LP solution has at most one fractional variable. Rounding it up
/// past the threshold overspends by that one record, which is expected.
fn is_fractional_trim(removed_weights: &[f64]) -> bool {
    matches!(removed_weights, [w] if *w < 1.0)
}
