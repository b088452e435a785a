//! Budget-constrained portfolio selection.
//!
//! [`PortfolioOptimizer`] chooses records from a [`ScoredSet`](crate::scoring::ScoredSet)
//! so that total cost stays within a budget while aggregate composite score
//! is as high as possible (or as low as possible in
//! [`OptimizationMode::MinimizeRisk`]).
//!
//! # Algorithm
//!
//! 1. Solve the LP relaxation of the 0/1 knapsack through an [`LpSolver`]
//!    (default [`SimplexSolver`]).
//! 2. Keep records whose LP value exceeds the inclusion threshold; their
//!    LP value is kept as the selection weight.
//! 3. If the solver fails or nothing crosses the threshold, use
//!    [`greedy_by_efficiency`] instead.
//! 4. Whatever the path, records are dropped until the budget holds.
//!
//! A basic LP solution has at most one fractional variable. When it lands
//! above the threshold the kept set overspends by that one record, so a
//! [`BudgetRepair`](crate::error::StageWarning::BudgetRepair) removing a
//! single fractional pick is routine on the LP path and is only logged at
//! `debug`. Larger repairs are logged at `warn`.
//!
//! # References
//!
//! - Dantzig (1957), "Discrete-Variable Extremum Problems"
//! - Martello & Toth (1990), "Knapsack Problems: Algorithms and Computer
//!   Implementations"

mod config;
mod greedy;
mod lp;
mod runner;
mod types;

pub use config::OptimizerConfig;
pub use greedy::{efficiency, greedy_by_efficiency};
pub use lp::{KnapsackRelaxation, LpError, LpSolution, LpSolver, SimplexSolver};
pub use runner::PortfolioOptimizer;
pub use types::{
    EmptyReason, FallbackTrigger, OptimizationMode, SelectedProject, SelectionDiagnostics,
    SelectionPath, SelectionResult,
};
