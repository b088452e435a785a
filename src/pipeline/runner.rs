//! End-to-end request execution.

use std::sync::Arc;

use tracing::{debug, info};

use super::config::PipelineConfig;
use super::interfaces::{QueryParser, SelectionExplainer, TemplateExplainer};
use super::types::{
    FailureKind, FilterQuery, PipelineFailure, PipelineOutcome, PipelineRequest, PortfolioSummary,
};
use crate::catalog::Catalog;
use crate::constraints::ConstraintProcessor;
use crate::error::{PortfolioError, PortfolioResult, StageWarning};
use crate::filter::{FilterEvaluator, FilterSpec};
use crate::optimizer::{EmptyReason, LpSolver, PortfolioOptimizer, SimplexSolver};
use crate::scoring::{CompositeScorer, WeightMap};

/// Runs filter → score → optimize → post-process → explain over a shared
/// catalog.
///
/// A `Pipeline` is immutable and `Send + Sync`; concurrent runs share the
/// catalog and each gets its own optimizer.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_portfolio::catalog::{Catalog, Schema, Value};
/// use u_portfolio::filter::{Comparison, FilterSpec, Predicate};
/// use u_portfolio::pipeline::{Pipeline, PipelineConfig, PipelineRequest};
///
/// let schema = Arc::new(
///     Schema::builder()
///         .numeric("cost")
///         .numeric("impact")
///         .cost_attribute("cost")
///         .default_score_attribute("impact")
///         .build()
///         .unwrap(),
/// );
/// let mut b = Catalog::builder(schema);
/// b.push("a", vec![Value::from(40.0), Value::from(7.0)]).unwrap();
/// b.push("b", vec![Value::from(70.0), Value::from(9.0)]).unwrap();
/// b.push("c", vec![Value::from(30.0), Value::from(2.0)]).unwrap();
///
/// let pipeline = Pipeline::new(Arc::new(b.build()), PipelineConfig::default()).unwrap();
/// let request = PipelineRequest::structured(
///     FilterSpec::new().with("impact", Predicate::threshold(Comparison::Ge, 5.0)),
///     100.0,
/// );
/// let outcome = pipeline.run(&request).unwrap();
/// assert_eq!(outcome.filtered_count, 2);
/// assert!(outcome.selection.total_cost() <= 100.0);
/// ```
pub struct Pipeline {
    catalog: Arc<Catalog>,
    config: PipelineConfig,
    scorer: CompositeScorer,
    solver: Arc<dyn LpSolver>,
    parser: Option<Box<dyn QueryParser>>,
    explainer: Box<dyn SelectionExplainer>,
}

impl Pipeline {
    /// Creates a pipeline after validating `config`.
    pub fn new(catalog: Arc<Catalog>, config: PipelineConfig) -> PortfolioResult<Self> {
        config.validate().map_err(PortfolioError::InvalidConfig)?;
        Ok(Self {
            catalog,
            scorer: CompositeScorer::new(config.scoring.clone()),
            config,
            solver: Arc::new(SimplexSolver),
            parser: None,
            explainer: Box::new(TemplateExplainer),
        })
    }

    /// Enables [`FilterQuery::Text`] requests.
    pub fn with_parser(mut self, parser: impl QueryParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    pub fn with_explainer(mut self, explainer: impl SelectionExplainer + 'static) -> Self {
        self.explainer = Box::new(explainer);
        self
    }

    pub fn with_solver(mut self, solver: impl LpSolver + 'static) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Executes one request.
    pub fn run(&self, request: &PipelineRequest) -> Result<PipelineOutcome, PipelineFailure> {
        if !request.budget.is_finite() || request.budget < 0.0 {
            return Err(PipelineFailure::new(
                FailureKind::InvalidRequest,
                PortfolioError::InvalidBudget(request.budget).to_string(),
            ));
        }
        let filters = self.resolve_query(&request.query)?;

        let filtered = FilterEvaluator::apply(&self.catalog, &filters);
        let mut warnings: Vec<StageWarning> = filtered.warnings;
        let filtered_count = filtered.subset.len();
        if filtered_count == 0 {
            return Err(PipelineFailure::new(
                FailureKind::NoMatches,
                "No projects match the specified criteria",
            )
            .with_context(0, warnings));
        }

        let empty = WeightMap::new();
        let weights = request
            .weights
            .as_ref()
            .or(self.config.default_weights.as_ref())
            .unwrap_or(&empty);
        let scoring = self.scorer.score(&filtered.subset, weights);
        warnings.extend(scoring.warnings);
        let scored = scoring.scored;

        let mut optimizer =
            PortfolioOptimizer::new(self.config.optimizer.clone()).with_solver(Arc::clone(&self.solver));
        let selection = match optimizer.optimize(&scored, request.budget, request.mode) {
            Ok(selection) => selection,
            Err(e) => {
                return Err(PipelineFailure::new(FailureKind::InvalidRequest, e.to_string())
                    .with_context(filtered_count, warnings))
            }
        };

        let rules = request.constraints.as_ref().unwrap_or(&self.config.constraints);
        let selection = ConstraintProcessor::apply(selection, rules);
        warnings.extend(selection.warnings.iter().cloned());

        if selection.is_empty() {
            let failure = match selection.empty_reason {
                Some(EmptyReason::BudgetInfeasible { cheapest }) => PipelineFailure::new(
                    FailureKind::BudgetInfeasible,
                    format!(
                        "No projects could be selected within budget constraints: \
                         cheapest candidate costs {cheapest}, budget is {}",
                        request.budget
                    ),
                ),
                _ => PipelineFailure::new(
                    FailureKind::EmptySelection,
                    "No projects could be selected within budget constraints",
                ),
            };
            debug!(kind = ?failure.kind, filtered = filtered_count, "pipeline produced no selection");
            return Err(failure.with_context(filtered_count, warnings));
        }

        let portfolio_summary = PortfolioSummary::from_selection(&selection);
        let explanation = self.explainer.explain(&selection, &filters);

        info!(
            filtered = filtered_count,
            selected = selection.len(),
            total_cost = selection.total_cost(),
            budget = request.budget,
            warnings = warnings.len(),
            "pipeline run complete"
        );

        Ok(PipelineOutcome {
            filters,
            filtered_count,
            scored_count: scored.len(),
            weights: scoring.weights,
            score_distribution: scored.distribution(),
            selection,
            filter_summary: filtered.summary,
            portfolio_summary,
            warnings,
            explanation,
        })
    }

    fn resolve_query(&self, query: &FilterQuery) -> Result<FilterSpec, PipelineFailure> {
        match query {
            FilterQuery::Structured(spec) => Ok(spec.clone()),
            FilterQuery::Text(text) => {
                let Some(parser) = &self.parser else {
                    return Err(PipelineFailure::new(
                        FailureKind::InvalidRequest,
                        "text query given but no query parser is configured",
                    ));
                };
                parser
                    .parse(text)
                    .map_err(|e| PipelineFailure::new(FailureKind::InvalidRequest, e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RiskLevel, Schema, Value};
    use crate::constraints::{ConstraintConfig, RiskCapRule};
    use crate::filter::{Comparison, Predicate};
    use crate::optimizer::{KnapsackRelaxation, LpError, LpSolution, OptimizationMode};
    use crate::pipeline::ClauseParser;

    fn catalog() -> Arc<Catalog> {
        let schema = Arc::new(
            Schema::builder()
                .numeric("cost")
                .numeric("impact")
                .categorical("sector")
                .risk("risk")
                .cost_attribute("cost")
                .default_score_attribute("impact")
                .build()
                .unwrap(),
        );
        let mut b = Catalog::builder(schema);
        let rows = [
            ("p1", 40.0, 7.0, "Energy", RiskLevel::High),
            ("p2", 70.0, 9.0, "Water", RiskLevel::Low),
            ("p3", 30.0, 2.0, "Energy", RiskLevel::High),
            ("p4", 25.0, 6.0, "Health", RiskLevel::Medium),
        ];
        for (id, cost, impact, sector, risk) in rows {
            b.push(
                id,
                vec![
                    Value::from(cost),
                    Value::from(impact),
                    Value::from(sector),
                    Value::from(risk),
                ],
            )
            .unwrap();
        }
        Arc::new(b.build())
    }

    struct FailingSolver;

    impl LpSolver for FailingSolver {
        fn name(&self) -> &str {
            "failing"
        }

        fn solve(&self, _: &KnapsackRelaxation<'_>) -> Result<LpSolution, LpError> {
            Err(LpError::Unbounded)
        }
    }

    #[test]
    fn test_run_structured() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let request = PipelineRequest::structured(
            FilterSpec::new().with("impact", Predicate::threshold(Comparison::Ge, 5.0)),
            1000.0,
        );
        let outcome = pipeline.run(&request).unwrap();
        assert_eq!(outcome.filtered_count, 3);
        assert_eq!(outcome.scored_count, 3);
        let ids = outcome.selection.ids();
        assert!(ids.contains(&"p1") && ids.contains(&"p2"));
        assert_eq!(outcome.portfolio_summary.total_projects, ids.len());
        assert_eq!(outcome.score_distribution.as_ref().unwrap().count, 3);
        assert_eq!(outcome.filter_summary.original_count, 4);
        assert!(outcome.explanation.starts_with("Selected "));
        assert!(outcome.explanation.contains("impact >= 5"));
    }

    #[test]
    fn test_no_matches() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let request = PipelineRequest::structured(
            FilterSpec::new().with("sector", Predicate::equals("Mining")),
            1000.0,
        );
        let failure = pipeline.run(&request).unwrap_err();
        assert_eq!(failure.kind, FailureKind::NoMatches);
        assert_eq!(failure.filtered_count, 0);
    }

    #[test]
    fn test_budget_infeasible() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let request = PipelineRequest::structured(FilterSpec::new(), 10.0);
        let failure = pipeline.run(&request).unwrap_err();
        assert_eq!(failure.kind, FailureKind::BudgetInfeasible);
        assert_eq!(failure.filtered_count, 4);
        assert!(failure.message.contains("25"));
    }

    #[test]
    fn test_zero_budget_is_empty_selection() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let failure = pipeline
            .run(&PipelineRequest::structured(FilterSpec::new(), 0.0))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::EmptySelection);
    }

    #[test]
    fn test_invalid_budget() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let failure = pipeline
            .run(&PipelineRequest::structured(FilterSpec::new(), -5.0))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidRequest);
    }

    #[test]
    fn test_text_query_requires_parser() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let request = PipelineRequest::text("sector = Energy", 1000.0);
        let failure = pipeline.run(&request).unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidRequest);

        let pipeline = pipeline.with_parser(ClauseParser);
        let outcome = pipeline.run(&request).unwrap();
        assert_eq!(outcome.filtered_count, 2);
        assert_eq!(outcome.filters.get("sector"), Some(&Predicate::equals("Energy")));
    }

    #[test]
    fn test_parser_error_is_invalid_request() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default())
            .unwrap()
            .with_parser(ClauseParser);
        let failure = pipeline
            .run(&PipelineRequest::text("impact >= lots", 1000.0))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::InvalidRequest);
    }

    #[test]
    fn test_warnings_collected_across_stages() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default())
            .unwrap()
            .with_solver(FailingSolver);
        let request = PipelineRequest::structured(
            FilterSpec::new().with("colour", Predicate::equals("green")),
            1000.0,
        )
        .with_weights(WeightMap::new().with("nonexistent", 1.0));
        let outcome = pipeline.run(&request).unwrap();
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, StageWarning::MissingAttribute { .. })));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, StageWarning::DefaultScoreFallback { .. })));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, StageWarning::SolverFailure { .. })));
        assert_eq!(outcome.selection.len(), 4);
    }

    #[test]
    fn test_request_constraints_override_config() {
        let config = PipelineConfig::default().with_constraints(
            ConstraintConfig::default().with_risk_cap(RiskCapRule::new("risk", 0)),
        );
        // greedy keeps zero-score records, so every record is a candidate
        let pipeline = Pipeline::new(catalog(), config).unwrap().with_solver(FailingSolver);

        let outcome = pipeline
            .run(&PipelineRequest::structured(FilterSpec::new(), 1000.0))
            .unwrap();
        assert_eq!(outcome.selection.ids(), vec!["p2", "p4"]);

        let outcome = pipeline
            .run(
                &PipelineRequest::structured(FilterSpec::new(), 1000.0)
                    .with_constraints(ConstraintConfig::default()),
            )
            .unwrap();
        assert_eq!(outcome.selection.len(), 4);
    }

    #[test]
    fn test_minimize_risk_mode() {
        let pipeline = Pipeline::new(catalog(), PipelineConfig::default()).unwrap();
        let outcome = pipeline
            .run(
                &PipelineRequest::structured(FilterSpec::new(), 60.0)
                    .with_mode(OptimizationMode::MinimizeRisk),
            )
            .unwrap();
        assert!(outcome.selection.total_cost() <= 60.0);
        assert_eq!(outcome.selection.mode, OptimizationMode::MinimizeRisk);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.optimizer.inclusion_threshold = 2.0;
        assert!(matches!(
            Pipeline::new(catalog(), config),
            Err(PortfolioError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_pipeline_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
