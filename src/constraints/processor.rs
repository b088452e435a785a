//! Constraint post-processor.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::config::{ConstraintConfig, DiversityRule, RiskCapRule};
use crate::catalog::{AttributeId, AttributeKind, Schema};
use crate::error::{Stage, StageWarning};
use crate::optimizer::SelectionResult;

/// Applies [`ConstraintConfig`] rules to an optimized selection.
///
/// Only removes records; the budget is never re-checked. The risk cap runs
/// before the diversity check so the diversity warning describes the final
/// portfolio.
pub struct ConstraintProcessor;

impl ConstraintProcessor {
    pub fn apply(mut selection: SelectionResult, rules: &ConstraintConfig) -> SelectionResult {
        if let Some(rule) = &rules.risk_cap {
            let warnings = Self::apply_risk_cap(&mut selection, rule);
            selection.warnings.extend(warnings);
        }
        if let Some(rule) = &rules.diversity {
            if let Some(w) = Self::check_diversity(&selection, rule) {
                selection.warnings.push(w);
            }
        }
        selection
    }

    fn apply_risk_cap(selection: &mut SelectionResult, rule: &RiskCapRule) -> Vec<StageWarning> {
        let attribute = match resolve(selection.schema(), &rule.attribute, AttributeKind::Risk) {
            Ok(id) => id,
            Err(w) => return vec![w],
        };

        let mut flagged: Vec<usize> = selection
            .selected
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                p.record
                    .get(attribute)
                    .and_then(|v| v.as_risk())
                    .is_some_and(|level| level.is_at_least(rule.unfavorable))
            })
            .map(|(i, _)| i)
            .collect();

        debug!(
            attribute = %rule.attribute,
            unfavorable = flagged.len(),
            cap = rule.max_unfavorable,
            "risk cap evaluated"
        );
        if flagged.len() <= rule.max_unfavorable {
            return Vec::new();
        }

        // lowest score first; on ties the later record goes first
        let selected = &selection.selected;
        flagged.sort_by(|&a, &b| {
            selected[a]
                .score
                .total_cmp(&selected[b].score)
                .then(selected[b].position.cmp(&selected[a].position))
        });
        let excess = flagged.len() - rule.max_unfavorable;
        let drop: BTreeSet<usize> = flagged[..excess]
            .iter()
            .map(|&i| selected[i].position)
            .collect();
        let removed: Vec<String> = flagged[..excess]
            .iter()
            .map(|&i| selected[i].record.id.clone())
            .collect();

        selection.retain(|p| !drop.contains(&p.position));
        warn!(
            attribute = %rule.attribute,
            removed = removed.len(),
            "risk cap exceeded, lowest-scoring records removed"
        );
        vec![StageWarning::RiskCapPruned {
            attribute: rule.attribute.clone(),
            removed,
        }]
    }

    fn check_diversity(selection: &SelectionResult, rule: &DiversityRule) -> Option<StageWarning> {
        let attribute = match resolve(selection.schema(), &rule.attribute, AttributeKind::Categorical) {
            Ok(id) => id,
            Err(w) => return Some(w),
        };
        if selection.is_empty() {
            return None;
        }

        let distinct: BTreeSet<&str> = selection
            .selected
            .iter()
            .filter_map(|p| p.record.get(attribute).and_then(|v| v.as_text()))
            .collect();
        if distinct.len() >= rule.min_distinct {
            return None;
        }

        warn!(
            attribute = %rule.attribute,
            distinct = distinct.len(),
            required = rule.min_distinct,
            "portfolio below diversity minimum"
        );
        Some(StageWarning::DiversityShortfall {
            attribute: rule.attribute.clone(),
            distinct: distinct.len(),
            required: rule.min_distinct,
        })
    }
}

fn resolve(schema: &Schema, name: &str, kind: AttributeKind) -> Result<AttributeId, StageWarning> {
    let Some(id) = schema.resolve(name) else {
        warn!(attribute = name, "constraint attribute not in schema, rule skipped");
        return Err(StageWarning::MissingAttribute {
            stage: Stage::Constraints,
            attribute: name.to_string(),
        });
    };
    if schema.kind(id) != kind {
        warn!(attribute = name, expected = %kind, "constraint attribute has the wrong type, rule skipped");
        return Err(StageWarning::TypeCoercion {
            stage: Stage::Constraints,
            attribute: name.to_string(),
            detail: format!("expected a {kind} attribute, found {}", schema.kind(id)),
        });
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, RiskLevel, Value};
    use crate::optimizer::{
        EmptyReason, LpError, LpSolution, LpSolver, KnapsackRelaxation, OptimizationMode,
        OptimizerConfig, PortfolioOptimizer,
    };
    use crate::scoring::ScoredSet;
    use std::sync::Arc;

    /// Selects everything the optimizer is given.
    struct TakeAll;

    impl LpSolver for TakeAll {
        fn name(&self) -> &str {
            "take-all"
        }

        fn solve(&self, problem: &KnapsackRelaxation<'_>) -> Result<LpSolution, LpError> {
            Ok(LpSolution {
                values: vec![1.0; problem.len()],
                objective: problem.objective.iter().sum(),
            })
        }
    }

    fn selection(rows: &[(&str, &str, RiskLevel, f64)]) -> SelectionResult {
        let schema = Arc::new(
            Schema::builder()
                .numeric("cost")
                .categorical("sector")
                .risk("risk")
                .cost_attribute("cost")
                .default_score_attribute("cost")
                .build()
                .unwrap(),
        );
        let mut b = Catalog::builder(schema);
        for (id, sector, risk, _) in rows {
            b.push(*id, vec![Value::from(1.0), Value::from(*sector), Value::from(*risk)])
                .unwrap();
        }
        let scores = rows.iter().map(|r| r.3).collect();
        let scored = ScoredSet::new(b.build(), scores).unwrap();
        PortfolioOptimizer::new(OptimizerConfig::default())
            .with_solver(TakeAll)
            .optimize(&scored, rows.len() as f64, OptimizationMode::MaximizeScore)
            .unwrap()
    }

    #[test]
    fn test_risk_cap_removes_lowest_unfavorable() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::High, 80.0),
            ("p2", "Energy", RiskLevel::Low, 10.0),
            ("p3", "Water", RiskLevel::High, 30.0),
            ("p4", "Water", RiskLevel::Medium, 20.0),
            ("p5", "Health", RiskLevel::High, 50.0),
        ]);
        let rules = ConstraintConfig::default().with_risk_cap(RiskCapRule::new("risk", 1));
        let out = ConstraintProcessor::apply(sel, &rules);
        assert_eq!(out.ids(), vec!["p1", "p2", "p4"]);
        assert_eq!(out.diagnostics.selected_count, 3);
        assert!((out.diagnostics.total_score - 110.0).abs() < 1e-10);
        match out.warnings.last() {
            Some(StageWarning::RiskCapPruned { removed, .. }) => {
                assert_eq!(removed, &vec!["p3".to_string(), "p5".to_string()]);
            }
            other => panic!("unexpected warning {other:?}"),
        }
    }

    #[test]
    fn test_risk_cap_tie_removes_later_first() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::High, 40.0),
            ("p2", "Water", RiskLevel::High, 40.0),
        ]);
        let rules = ConstraintConfig::default().with_risk_cap(RiskCapRule::new("risk", 1));
        let out = ConstraintProcessor::apply(sel, &rules);
        assert_eq!(out.ids(), vec!["p1"]);
    }

    #[test]
    fn test_risk_cap_medium_threshold() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::Medium, 40.0),
            ("p2", "Water", RiskLevel::High, 60.0),
            ("p3", "Water", RiskLevel::Low, 10.0),
        ]);
        let rule = RiskCapRule::new("risk", 1).with_unfavorable(RiskLevel::Medium);
        let out = ConstraintProcessor::apply(sel, &ConstraintConfig::default().with_risk_cap(rule));
        assert_eq!(out.ids(), vec!["p2", "p3"]);
    }

    #[test]
    fn test_risk_cap_within_limit_untouched() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::High, 40.0),
            ("p2", "Water", RiskLevel::Low, 60.0),
        ]);
        let rules = ConstraintConfig::default().with_risk_cap(RiskCapRule::new("risk", 1));
        let out = ConstraintProcessor::apply(sel, &rules);
        assert_eq!(out.len(), 2);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_risk_cap_zero_can_empty_portfolio() {
        let sel = selection(&[("p1", "Energy", RiskLevel::High, 40.0)]);
        let rules = ConstraintConfig::default().with_risk_cap(RiskCapRule::new("risk", 0));
        let out = ConstraintProcessor::apply(sel, &rules);
        assert!(out.is_empty());
        assert_eq!(out.empty_reason, Some(EmptyReason::NothingSelected));
        assert_eq!(out.diagnostics.total_cost, 0.0);
    }

    #[test]
    fn test_diversity_warns_only() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::Low, 40.0),
            ("p2", "Water", RiskLevel::Low, 60.0),
            ("p3", "Energy", RiskLevel::Low, 50.0),
        ]);
        let rules = ConstraintConfig::default().with_diversity(DiversityRule::new("sector", 3));
        let out = ConstraintProcessor::apply(sel, &rules);
        assert_eq!(out.ids(), vec!["p1", "p2", "p3"]);
        assert_eq!(
            out.warnings,
            vec![StageWarning::DiversityShortfall {
                attribute: "sector".into(),
                distinct: 2,
                required: 3,
            }]
        );
    }

    #[test]
    fn test_diversity_satisfied() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::Low, 40.0),
            ("p2", "Water", RiskLevel::Low, 60.0),
        ]);
        let rules = ConstraintConfig::default().with_diversity(DiversityRule::new("sector", 2));
        assert!(ConstraintProcessor::apply(sel, &rules).warnings.is_empty());
    }

    #[test]
    fn test_unknown_and_mistyped_attributes_skip_rule() {
        let sel = selection(&[
            ("p1", "Energy", RiskLevel::High, 40.0),
            ("p2", "Water", RiskLevel::High, 60.0),
        ]);
        let rules = ConstraintConfig::default()
            .with_risk_cap(RiskCapRule::new("sector", 0))
            .with_diversity(DiversityRule::new("Region", 5));
        let out = ConstraintProcessor::apply(sel, &rules);
        assert_eq!(out.len(), 2);
        assert!(matches!(out.warnings[0], StageWarning::TypeCoercion { .. }));
        assert!(matches!(out.warnings[1], StageWarning::MissingAttribute { .. }));
    }
}
