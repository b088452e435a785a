use std::sync::Arc;

use proptest::prelude::*;
use u_portfolio::catalog::{Catalog, RiskLevel, Schema, Value};
use u_portfolio::filter::{Comparison, FilterEvaluator, FilterSpec, Predicate};
use u_portfolio::optimizer::{
    greedy_by_efficiency, OptimizationMode, OptimizerConfig, PortfolioOptimizer,
};
use u_portfolio::scoring::{CompositeScorer, ScoredSet, WeightMap};

const TAGS: [&str; 3] = ["Energy", "Water", "Health"];

fn schema() -> Arc<Schema> {
    Arc::new(
        Schema::builder()
            .numeric("cost")
            .numeric("impact")
            .categorical("tag")
            .risk("risk")
            .cost_attribute("cost")
            .default_score_attribute("impact")
            .build()
            .unwrap(),
    )
}

fn catalog(rows: &[(f64, f64, usize, usize)]) -> Catalog {
    let mut b = Catalog::builder(schema());
    for (i, &(cost, impact, tag, risk)) in rows.iter().enumerate() {
        b.push(
            format!("P{i}"),
            vec![
                Value::from(cost),
                Value::from(impact),
                Value::from(TAGS[tag]),
                Value::from(RiskLevel::ALL[risk]),
            ],
        )
        .unwrap();
    }
    b.build()
}

fn rows() -> impl Strategy<Value = Vec<(f64, f64, usize, usize)>> {
    prop::collection::vec((1.0f64..100.0, 0.0f64..50.0, 0usize..3, 0usize..3), 0..25)
}

fn scored(items: &[(f64, f64)]) -> ScoredSet {
    let mut b = Catalog::builder(schema());
    for (i, &(cost, _)) in items.iter().enumerate() {
        b.push(
            format!("P{i}"),
            vec![
                Value::from(cost),
                Value::from(0.0),
                Value::from("Energy"),
                Value::from(RiskLevel::Low),
            ],
        )
        .unwrap();
    }
    ScoredSet::new(b.build(), items.iter().map(|&(_, s)| s).collect()).unwrap()
}

fn items() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((1.0f64..100.0, 0.0f64..=100.0), 1..20)
}

proptest! {
    #[test]
    fn filter_result_is_ordered_subset(rows in rows(), min in 0.0f64..50.0) {
        let cat = catalog(&rows);
        let spec = FilterSpec::new().with("impact", Predicate::threshold(Comparison::Ge, min));
        let out = FilterEvaluator::apply(&cat, &spec);
        let mut cursor = cat.ids().iter();
        for id in out.subset.ids() {
            prop_assert!(cursor.any(|c| c == id), "{} missing or out of order", id);
        }
        prop_assert_eq!(out.summary.filtered_count, out.subset.len());
    }

    #[test]
    fn adding_predicate_never_grows_result(rows in rows(), min in 0.0f64..50.0, tag in 0usize..3) {
        let cat = catalog(&rows);
        let base = FilterSpec::new().with("impact", Predicate::threshold(Comparison::Ge, min));
        let narrowed = base.clone().with("tag", Predicate::equals(TAGS[tag]));
        let wide = FilterEvaluator::apply(&cat, &base).subset;
        let narrow = FilterEvaluator::apply(&cat, &narrowed).subset;
        prop_assert!(narrow.len() <= wide.len());
        for id in narrow.ids() {
            prop_assert!(wide.ids().contains(id));
        }
    }

    #[test]
    fn scores_in_range_and_deterministic(
        rows in rows(),
        w_impact in 0.0f64..5.0,
        w_cost in 0.0f64..5.0,
        w_risk in 0.0f64..5.0,
    ) {
        let cat = catalog(&rows);
        let weights = WeightMap::new()
            .with("impact", w_impact)
            .with("cost", w_cost)
            .with("risk", w_risk);
        let scorer = CompositeScorer::default();
        let first = scorer.score(&cat, &weights);
        let second = scorer.score(&cat, &weights);
        prop_assert_eq!(first.scored.scores(), second.scored.scores());
        prop_assert_eq!(first.scored.len(), cat.len());
        for &s in first.scored.scores() {
            prop_assert!((0.0..=100.0).contains(&s), "score {} out of range", s);
        }
    }

    #[test]
    fn optimizer_respects_budget(items in items(), budget in 0.0f64..600.0) {
        let set = scored(&items);
        let mut opt = PortfolioOptimizer::new(OptimizerConfig::default());
        let result = opt.optimize(&set, budget, OptimizationMode::MaximizeScore).unwrap();
        prop_assert!(result.total_cost() <= budget, "{} > {}", result.total_cost(), budget);
        for p in &result.selected {
            prop_assert!((0.0..=1.0).contains(&p.selection_weight));
        }
        let mut opt = PortfolioOptimizer::new(OptimizerConfig::default());
        let risk = opt.optimize(&set, budget, OptimizationMode::MinimizeRisk).unwrap();
        prop_assert!(risk.total_cost() <= budget);
    }

    #[test]
    fn zero_budget_selects_nothing(items in items()) {
        let mut opt = PortfolioOptimizer::new(OptimizerConfig::default());
        let result = opt.optimize(&scored(&items), 0.0, OptimizationMode::MaximizeScore).unwrap();
        prop_assert!(result.is_empty());
    }

    #[test]
    fn ample_budget_attains_total_score(items in items()) {
        let set = scored(&items);
        let total_cost: f64 = items.iter().map(|&(c, _)| c).sum();
        let total_score: f64 = items.iter().map(|&(_, s)| s).sum();
        let mut opt = PortfolioOptimizer::new(OptimizerConfig::default());
        let result = opt.optimize(&set, total_cost + 1.0, OptimizationMode::MaximizeScore).unwrap();
        prop_assert!((result.diagnostics.total_score - total_score).abs() < 1e-6);
    }

    #[test]
    fn greedy_feasible_and_deterministic(items in items(), budget in 1.0f64..300.0) {
        let costs: Vec<f64> = items.iter().map(|&(c, _)| c).collect();
        let scores: Vec<f64> = items.iter().map(|&(_, s)| s).collect();
        let picked = greedy_by_efficiency(&costs, &scores, budget);
        prop_assert_eq!(&picked, &greedy_by_efficiency(&costs, &scores, budget));
        let spent: f64 = picked.iter().map(|&i| costs[i]).sum();
        prop_assert!(spent <= budget + 1e-9);
        let cheapest = costs.iter().copied().fold(f64::INFINITY, f64::min);
        if cheapest <= budget {
            prop_assert!(!picked.is_empty());
        }
    }
}
