//! Predicate binding and conjunctive evaluation.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use super::types::{Comparison, FilterSpec, Predicate};
use crate::catalog::{AttributeId, AttributeKind, Catalog, Column, Schema, Value};
use crate::error::{Stage, StageWarning};

/// A predicate whose attribute and operand were validated against a schema.
#[derive(Debug, Clone)]
pub struct BoundPredicate {
    attribute: AttributeId,
    name: String,
    test: Test,
}

#[derive(Debug, Clone)]
enum Test {
    Threshold(Comparison, f64),
    Equals(Value),
    OneOf(Vec<Value>),
}

impl BoundPredicate {
    pub fn attribute(&self) -> AttributeId {
        self.attribute
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluates the predicate against every row.
    pub fn matches(&self, catalog: &Catalog) -> Vec<bool> {
        let column = catalog.column(self.attribute);
        match (&self.test, column) {
            (Test::Threshold(op, rhs), Column::Numeric(values)) => {
                values.iter().map(|&v| op.holds(v, *rhs)).collect()
            }
            // Binding only admits thresholds on numeric attributes.
            (Test::Threshold(..), _) => vec![false; catalog.len()],
            (Test::Equals(target), _) => (0..catalog.len())
                .map(|row| cell_equals(column, row, target))
                .collect(),
            (Test::OneOf(targets), _) => (0..catalog.len())
                .map(|row| targets.iter().any(|t| cell_equals(column, row, t)))
                .collect(),
        }
    }
}

fn cell_equals(column: &Column, row: usize, target: &Value) -> bool {
    match (column, target) {
        (Column::Numeric(v), Value::Number(n)) => v[row] == *n,
        (Column::Categorical(v), Value::Text(s)) => v[row] == *s,
        (Column::Risk(v), Value::Risk(r)) => v[row] == *r,
        (Column::Date(v), Value::Date(d)) => v[row] == *d,
        _ => false,
    }
}

/// A [`FilterSpec`] resolved against a schema.
///
/// Predicates that could not be bound were dropped and are reported in
/// `warnings`.
#[derive(Debug, Clone, Default)]
pub struct BoundFilter {
    /// Predicates in the source spec, bound or not.
    pub requested: usize,
    pub predicates: Vec<BoundPredicate>,
    pub warnings: Vec<StageWarning>,
}

impl FilterSpec {
    /// Resolves attribute names and coerces operands once, up front.
    ///
    /// Unknown attributes and type mismatches skip only the offending
    /// predicate.
    pub fn bind(&self, schema: &Schema) -> BoundFilter {
        let mut bound = BoundFilter {
            requested: self.len(),
            ..BoundFilter::default()
        };

        for (name, predicate) in self.iter() {
            let Some(attribute) = schema.resolve(name) else {
                warn!(attribute = name, "filter attribute not found in schema, skipping");
                bound.warnings.push(StageWarning::MissingAttribute {
                    stage: Stage::Filter,
                    attribute: name.to_string(),
                });
                continue;
            };
            let kind = schema.kind(attribute);

            match bind_test(predicate, kind) {
                Ok(test) => bound.predicates.push(BoundPredicate {
                    attribute,
                    name: name.to_string(),
                    test,
                }),
                Err(detail) => {
                    warn!(attribute = name, %detail, "filter predicate type mismatch, skipping");
                    bound.warnings.push(StageWarning::TypeCoercion {
                        stage: Stage::Filter,
                        attribute: name.to_string(),
                        detail,
                    });
                }
            }
        }

        bound
    }
}

fn bind_test(predicate: &Predicate, kind: AttributeKind) -> Result<Test, String> {
    match predicate {
        Predicate::Threshold { op, value } => {
            if kind != AttributeKind::Numeric {
                return Err(format!("threshold '{op} {value}' on {kind} attribute"));
            }
            if !value.is_finite() {
                return Err(format!("threshold value {value} is not finite"));
            }
            Ok(Test::Threshold(*op, *value))
        }
        Predicate::Equals(value) => value
            .coerce_to(kind)
            .map(Test::Equals)
            .ok_or_else(|| format!("'{value}' is not comparable with {kind} values")),
        Predicate::OneOf(values) => values
            .iter()
            .map(|v| {
                v.coerce_to(kind)
                    .ok_or_else(|| format!("'{v}' is not comparable with {kind} values"))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Test::OneOf),
    }
}

/// Records surviving one predicate applied alone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredicateImpact {
    pub attribute: String,
    pub remaining: usize,
}

/// Counts before and after filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSummary {
    pub original_count: usize,
    pub filtered_count: usize,
    /// Share of the catalog removed, in percent.
    pub reduction_percent: f64,
    /// Predicates in the request, including skipped ones.
    pub requested_predicates: usize,
    /// Predicates that were bound and applied.
    pub active_predicates: usize,
    /// The predicate that alone leaves the fewest records.
    pub most_restrictive: Option<PredicateImpact>,
}

/// Output of [`FilterEvaluator::apply`].
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    /// Fresh copy of the matching rows, in catalog order.
    pub subset: Catalog,
    pub warnings: Vec<StageWarning>,
    pub summary: FilterSummary,
}

/// Applies a [`FilterSpec`] to a catalog.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Returns the records satisfying every bindable predicate.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use u_portfolio::catalog::{Catalog, Schema, Value};
    /// use u_portfolio::filter::{Comparison, FilterEvaluator, FilterSpec, Predicate};
    ///
    /// let schema = Arc::new(
    ///     Schema::builder()
    ///         .numeric("cost")
    ///         .categorical("sector")
    ///         .cost_attribute("cost")
    ///         .default_score_attribute("cost")
    ///         .build()
    ///         .unwrap(),
    /// );
    /// let mut b = Catalog::builder(schema);
    /// b.push("a", vec![Value::from(10.0), Value::from("Energy")]).unwrap();
    /// b.push("b", vec![Value::from(20.0), Value::from("Water")]).unwrap();
    /// let catalog = b.build();
    ///
    /// let spec = FilterSpec::new()
    ///     .with("cost", Predicate::threshold(Comparison::Ge, 15.0))
    ///     .with("colour", Predicate::equals("red")); // unknown: skipped
    /// let out = FilterEvaluator::apply(&catalog, &spec);
    /// assert_eq!(out.subset.ids(), &["b".to_string()]);
    /// assert_eq!(out.warnings.len(), 1);
    /// ```
    pub fn apply(catalog: &Catalog, spec: &FilterSpec) -> FilterOutcome {
        let bound = spec.bind(catalog.schema());
        Self::apply_bound(catalog, bound)
    }

    /// Evaluates an already-bound filter.
    pub fn apply_bound(catalog: &Catalog, bound: BoundFilter) -> FilterOutcome {
        let n = catalog.len();

        #[cfg(feature = "parallel")]
        let masks: Vec<Vec<bool>> = bound
            .predicates
            .par_iter()
            .map(|p| p.matches(catalog))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let masks: Vec<Vec<bool>> = bound.predicates.iter().map(|p| p.matches(catalog)).collect();

        let rows: Vec<usize> = (0..n)
            .filter(|&row| masks.iter().all(|mask| mask[row]))
            .collect();

        let most_restrictive = bound
            .predicates
            .iter()
            .zip(&masks)
            .map(|(p, mask)| PredicateImpact {
                attribute: p.name.clone(),
                remaining: mask.iter().filter(|&&hit| hit).count(),
            })
            .min_by_key(|impact| impact.remaining);

        let summary = FilterSummary {
            original_count: n,
            filtered_count: rows.len(),
            reduction_percent: if n == 0 {
                0.0
            } else {
                (1.0 - rows.len() as f64 / n as f64) * 100.0
            },
            requested_predicates: bound.requested,
            active_predicates: bound.predicates.len(),
            most_restrictive,
        };

        debug!(
            original = n,
            filtered = rows.len(),
            predicates = bound.predicates.len(),
            skipped = bound.warnings.len(),
            "filter applied"
        );

        FilterOutcome {
            subset: catalog.take(&rows),
            warnings: bound.warnings,
            summary,
        }
    }
}
