//! Multi-attribute composite scorer.
//!
//! # Algorithm
//!
//! 1. Keep weight entries naming a numeric or risk attribute with a finite,
//!    non-negative weight; warn about the rest
//! 2. With no usable entry, score by the default attribute alone
//! 3. Map risk levels onto the favorability scale
//! 4. Min-max normalize each attribute across the subset (all-equal → 1)
//! 5. `composite = 100 * Σ(norm_i * w_i) / Σ w_i`

use serde::Serialize;
use tracing::{debug, warn};

use super::config::ScorerConfig;
use super::types::{AppliedWeight, ScoredSet, WeightMap};
use crate::catalog::{AttributeId, Catalog, Schema};
use crate::error::{Stage, StageWarning};

/// Output of [`CompositeScorer::score`].
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub scored: ScoredSet,
    /// Weights that took part, re-normalized to sum 1.
    pub weights: Vec<AppliedWeight>,
    pub warnings: Vec<StageWarning>,
}

/// Per-attribute normalization bounds, reported for transparency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationRange {
    pub attribute: String,
    pub min: f64,
    pub max: f64,
}

/// Min-max normalizes `values` into `[0, 1]`.
///
/// Non-finite values are treated as 0. When every value is identical each
/// entry becomes 1, so a uniform attribute neither fails nor penalizes.
///
/// ```
/// use u_portfolio::scoring::normalize;
///
/// assert_eq!(normalize(&[2.0, 4.0, 6.0]), vec![0.0, 0.5, 1.0]);
/// assert_eq!(normalize(&[3.0, 3.0]), vec![1.0, 1.0]);
/// ```
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let clean = finite_or_zero(values);
    let (min, max) = bounds(&clean);
    if max > min {
        let span = max - min;
        clean.iter().map(|v| (v - min) / span).collect()
    } else {
        vec![1.0; clean.len()]
    }
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Computes composite benefit scores for a candidate subset.
#[derive(Debug, Clone, Default)]
pub struct CompositeScorer {
    config: ScorerConfig,
}

impl CompositeScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Scores every row of `subset`; never reorders rows and never fails.
    ///
    /// Normalization bounds come from `subset` itself, not the full catalog.
    pub fn score(&self, subset: &Catalog, weights: &WeightMap) -> ScoreOutcome {
        let schema = subset.schema();
        let mut warnings = Vec::new();

        let mut valid: Vec<(AttributeId, f64)> = Vec::with_capacity(weights.len());
        for (name, weight) in weights.iter() {
            let Some(id) = schema.resolve(name) else {
                warn!(attribute = name, "scoring attribute not found in schema");
                warnings.push(StageWarning::MissingAttribute {
                    stage: Stage::Scoring,
                    attribute: name.to_string(),
                });
                continue;
            };
            let kind = schema.kind(id);
            if !kind.is_scorable() {
                warn!(attribute = name, %kind, "scoring attribute is not numeric or risk");
                warnings.push(StageWarning::TypeCoercion {
                    stage: Stage::Scoring,
                    attribute: name.to_string(),
                    detail: format!("{kind} attributes cannot be scored"),
                });
                continue;
            }
            if !weight.is_finite() || weight < 0.0 {
                warn!(attribute = name, weight, "invalid scoring weight");
                warnings.push(StageWarning::InvalidWeight {
                    attribute: name.to_string(),
                    weight,
                });
                continue;
            }
            valid.push((id, weight));
        }

        if valid.is_empty() {
            let fallback = self.default_attribute(schema, &mut warnings);
            warn!(
                attribute = schema.name(fallback),
                "no valid scoring weights, using default attribute"
            );
            warnings.push(StageWarning::DefaultScoreFallback {
                attribute: schema.name(fallback).to_string(),
            });
            valid.push((fallback, 1.0));
        }

        let total: f64 = valid.iter().map(|(_, w)| w).sum();
        let shares: Vec<f64> = if total > 0.0 {
            valid.iter().map(|(_, w)| w / total).collect()
        } else {
            vec![1.0 / valid.len() as f64; valid.len()]
        };

        let mut composite = vec![0.0; subset.len()];
        for ((id, _), share) in valid.iter().zip(&shares) {
            let normalized = normalize(&attribute_values(subset, *id));
            for (c, n) in composite.iter_mut().zip(normalized) {
                *c += n * share;
            }
        }
        for c in composite.iter_mut() {
            *c = (*c * 100.0).clamp(0.0, 100.0);
        }

        let applied: Vec<AppliedWeight> = valid
            .iter()
            .zip(&shares)
            .map(|((id, _), share)| AppliedWeight {
                attribute: schema.name(*id).to_string(),
                weight: *share,
            })
            .collect();

        debug!(
            records = subset.len(),
            attributes = applied.len(),
            skipped = warnings.len(),
            "composite scores computed"
        );

        ScoreOutcome {
            scored: ScoredSet::from_parts(subset.clone(), composite),
            weights: applied,
            warnings,
        }
    }

    /// Raw bounds of every usable weight attribute over `subset`.
    pub fn ranges(&self, subset: &Catalog, weights: &WeightMap) -> Vec<NormalizationRange> {
        let schema = subset.schema();
        weights
            .iter()
            .filter_map(|(name, _)| schema.resolve(name))
            .filter(|&id| schema.kind(id).is_scorable())
            .map(|id| {
                let (min, max) = bounds(&finite_or_zero(&attribute_values(subset, id)));
                NormalizationRange {
                    attribute: schema.name(id).to_string(),
                    min,
                    max,
                }
            })
            .collect()
    }

    fn default_attribute(&self, schema: &Schema, warnings: &mut Vec<StageWarning>) -> AttributeId {
        let Some(name) = &self.config.default_attribute else {
            return schema.default_score();
        };
        match schema.resolve(name) {
            Some(id) if schema.kind(id).is_scorable() => id,
            Some(_) => {
                warnings.push(StageWarning::TypeCoercion {
                    stage: Stage::Scoring,
                    attribute: name.clone(),
                    detail: "configured default attribute is not scorable".into(),
                });
                schema.default_score()
            }
            None => {
                warnings.push(StageWarning::MissingAttribute {
                    stage: Stage::Scoring,
                    attribute: name.clone(),
                });
                schema.default_score()
            }
        }
    }
}

fn finite_or_zero(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .map(|&v| if v.is_finite() { v } else { 0.0 })
        .collect()
}

/// Numeric view of a scorable attribute; risk levels become favorability.
fn attribute_values(catalog: &Catalog, id: AttributeId) -> Vec<f64> {
    if let Some(values) = catalog.numeric(id) {
        return values.to_vec();
    }
    if let Some(levels) = catalog.risk(id) {
        return levels.iter().map(|r| r.favorability()).collect();
    }
    vec![0.0; catalog.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Schema, Value};
    use std::sync::Arc;

    fn catalog() -> Catalog {
        let schema = Arc::new(
            Schema::builder()
                .numeric("cost")
                .numeric("esg")
                .numeric("jobs")
                .categorical("sector")
                .risk("risk")
                .cost_attribute("cost")
                .default_score_attribute("esg")
                .build()
                .unwrap(),
        );
        let mut b = Catalog::builder(schema);
        let rows = [
            ("A", 100.0, 20.0, 10.0, "Energy", "High"),
            ("B", 100.0, 60.0, 30.0, "Water", "Medium"),
            ("C", 100.0, 100.0, 20.0, "Energy", "Low"),
        ];
        for (id, cost, esg, jobs, sector, risk) in rows {
            b.push(
                id,
                vec![
                    Value::from(cost),
                    Value::from(esg),
                    Value::from(jobs),
                    Value::from(sector),
                    Value::from(risk),
                ],
            )
            .unwrap();
        }
        b.build()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_attribute() {
        let out = CompositeScorer::default().score(&catalog(), &WeightMap::new().with("esg", 1.0));
        let s = out.scored.scores();
        assert!(approx(s[0], 0.0));
        assert!(approx(s[1], 50.0));
        assert!(approx(s[2], 100.0));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_weights_renormalized() {
        // esg norm: 0, .5, 1; jobs norm: 0, 1, .5
        let weights = WeightMap::new().with("esg", 3.0).with("jobs", 1.0);
        let out = CompositeScorer::default().score(&catalog(), &weights);
        let s = out.scored.scores();
        assert!(approx(s[0], 0.0));
        assert!(approx(s[1], 100.0 * (0.5 * 0.75 + 1.0 * 0.25)));
        assert!(approx(s[2], 100.0 * (1.0 * 0.75 + 0.5 * 0.25)));
        let total: f64 = out.weights.iter().map(|w| w.weight).sum();
        assert!(approx(total, 1.0));
    }

    #[test]
    fn test_risk_mapped_favorably() {
        let out = CompositeScorer::default().score(&catalog(), &WeightMap::new().with("risk", 1.0));
        let s = out.scored.scores();
        // High -> 0, Medium -> 50, Low -> 100
        assert!(approx(s[0], 0.0));
        assert!(approx(s[1], 50.0));
        assert!(approx(s[2], 100.0));
    }

    #[test]
    fn test_degenerate_column_scores_full() {
        let out = CompositeScorer::default().score(&catalog(), &WeightMap::new().with("cost", 1.0));
        assert!(out.scored.scores().iter().all(|&s| approx(s, 100.0)));
    }

    #[test]
    fn test_missing_attributes_fall_back_to_default() {
        let weights = WeightMap::new().with("colour", 1.0).with("sector", 2.0);
        let out = CompositeScorer::default().score(&catalog(), &weights);
        assert_eq!(out.weights.len(), 1);
        assert_eq!(out.weights[0].attribute, "esg");
        assert!(out
            .warnings
            .iter()
            .any(|w| matches!(w, StageWarning::DefaultScoreFallback { attribute } if attribute == "esg")));
        assert!(approx(out.scored.scores()[2], 100.0));
    }

    #[test]
    fn test_configured_default_attribute() {
        let scorer = CompositeScorer::new(ScorerConfig::default().with_default_attribute("jobs"));
        let out = scorer.score(&catalog(), &WeightMap::new());
        assert_eq!(out.weights[0].attribute, "jobs");
        assert!(approx(out.scored.scores()[1], 100.0));
    }

    #[test]
    fn test_invalid_weight_discarded() {
        let weights = WeightMap::new().with("esg", -1.0).with("jobs", 1.0);
        let out = CompositeScorer::default().score(&catalog(), &weights);
        assert_eq!(out.weights.len(), 1);
        assert!(matches!(out.warnings[0], StageWarning::InvalidWeight { .. }));
    }

    #[test]
    fn test_all_zero_weights_equal_share() {
        let weights = WeightMap::new().with("esg", 0.0).with("jobs", 0.0);
        let out = CompositeScorer::default().score(&catalog(), &weights);
        assert!(out.weights.iter().all(|w| approx(w.weight, 0.5)));
    }

    #[test]
    fn test_deterministic_and_in_range() {
        let weights = WeightMap::new().with("esg", 0.4).with("jobs", 0.3).with("risk", 0.3);
        let scorer = CompositeScorer::default();
        let a = scorer.score(&catalog(), &weights);
        let b = scorer.score(&catalog(), &weights);
        assert_eq!(a.scored.scores(), b.scored.scores());
        assert!(a.scored.scores().iter().all(|s| (0.0..=100.0).contains(s)));
    }

    #[test]
    fn test_normalization_uses_subset() {
        let cat = catalog();
        let subset = cat.take(&[0, 1]);
        let out = CompositeScorer::default().score(&subset, &WeightMap::new().with("esg", 1.0));
        // within {20, 60}: 20 -> 0, 60 -> 100
        assert!(approx(out.scored.scores()[1], 100.0));
    }

    #[test]
    fn test_non_finite_values_count_as_zero() {
        assert_eq!(normalize(&[f64::NAN, 5.0, 10.0]), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_empty_subset() {
        let cat = catalog().take(&[]);
        let out = CompositeScorer::default().score(&cat, &WeightMap::new().with("esg", 1.0));
        assert!(out.scored.is_empty());
    }

    #[test]
    fn test_ranges() {
        let ranges = CompositeScorer::default().ranges(&catalog(), &WeightMap::new().with("esg", 1.0));
        assert_eq!(
            ranges,
            vec![NormalizationRange {
                attribute: "esg".into(),
                min: 20.0,
                max: 100.0
            }]
        );
    }
}
