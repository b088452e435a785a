//! LP relaxation of the budgeted selection problem.
//!
//! The relaxation is: maximize `Σ sᵢ·xᵢ` subject to `Σ cᵢ·xᵢ ≤ budget`,
//! `0 ≤ xᵢ ≤ 1`. Solvers are pluggable through [`LpSolver`].

use std::sync::Arc;

use minilp::{ComparisonOp, LinearExpr, OptimizationDirection, Problem, Variable};

/// Continuous knapsack problem handed to an [`LpSolver`].
#[derive(Debug, Clone, Copy)]
pub struct KnapsackRelaxation<'a> {
    /// Objective coefficient per item (already sign-adjusted for the mode).
    pub objective: &'a [f64],
    /// Non-negative cost per item.
    pub costs: &'a [f64],
    /// Strictly positive budget.
    pub budget: f64,
}

impl KnapsackRelaxation<'_> {
    pub fn len(&self) -> usize {
        self.objective.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objective.is_empty()
    }

    fn check(&self) -> Result<(), LpError> {
        if self.objective.len() != self.costs.len() {
            return Err(LpError::Numerical(format!(
                "{} objective coefficients but {} costs",
                self.objective.len(),
                self.costs.len()
            )));
        }
        if !(self.budget.is_finite() && self.budget > 0.0) {
            return Err(LpError::Numerical(format!("budget {} is not positive", self.budget)));
        }
        if self.objective.iter().chain(self.costs).any(|v| !v.is_finite()) {
            return Err(LpError::Numerical("non-finite coefficient".into()));
        }
        Ok(())
    }
}

/// Solution of a relaxation.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    /// `xᵢ` per item, clamped to `[0, 1]`.
    pub values: Vec<f64>,
    /// Objective value in the caller's units.
    pub objective: f64,
}

/// Why a relaxation could not be solved.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LpError {
    #[error("problem is infeasible")]
    Infeasible,

    #[error("problem is unbounded")]
    Unbounded,

    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl From<minilp::Error> for LpError {
    fn from(e: minilp::Error) -> Self {
        match e {
            minilp::Error::Infeasible => LpError::Infeasible,
            minilp::Error::Unbounded => LpError::Unbounded,
        }
    }
}

/// A backend able to solve [`KnapsackRelaxation`]s.
pub trait LpSolver: Send + Sync {
    /// Short name used in warnings and logs.
    fn name(&self) -> &str;

    fn solve(&self, problem: &KnapsackRelaxation<'_>) -> Result<LpSolution, LpError>;
}

impl<S: LpSolver + ?Sized> LpSolver for Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn solve(&self, problem: &KnapsackRelaxation<'_>) -> Result<LpSolution, LpError> {
        (**self).solve(problem)
    }
}

/// Objective coefficients are divided by this before the solve.
const OBJECTIVE_SCALE: f64 = 100.0;

/// Dense simplex backend built on `minilp`.
///
/// Costs are expressed as budget fractions and scores as fractions of 100 so
/// the tableau stays well conditioned for investment-sized costs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimplexSolver;

impl LpSolver for SimplexSolver {
    fn name(&self) -> &str {
        "simplex"
    }

    fn solve(&self, problem: &KnapsackRelaxation<'_>) -> Result<LpSolution, LpError> {
        problem.check()?;

        let mut lp = Problem::new(OptimizationDirection::Maximize);
        let vars: Vec<Variable> = problem
            .objective
            .iter()
            .map(|&s| lp.add_var(s / OBJECTIVE_SCALE, (0.0, 1.0)))
            .collect();

        let mut budget_row = LinearExpr::empty();
        let mut terms = 0usize;
        for (&var, &cost) in vars.iter().zip(problem.costs) {
            if cost > 0.0 {
                budget_row.add(var, cost / problem.budget);
                terms += 1;
            }
        }
        // all-free items leave nothing to constrain
        if terms > 0 {
            lp.add_constraint(budget_row, ComparisonOp::Le, 1.0);
        }

        let solution = lp.solve()?;
        let values: Vec<f64> = vars
            .iter()
            .map(|&v| solution[v])
            .map(|x| if x.is_finite() { x.clamp(0.0, 1.0) } else { f64::NAN })
            .collect();
        if values.iter().any(|x| x.is_nan()) {
            return Err(LpError::Numerical("solver returned a non-finite value".into()));
        }
        let objective = problem
            .objective
            .iter()
            .zip(&values)
            .map(|(s, x)| s * x)
            .sum();
        Ok(LpSolution { values, objective })
    }
}
