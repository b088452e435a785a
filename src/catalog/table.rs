//! Columnar project catalog.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::schema::{AttributeId, AttributeKind, Schema};
use super::value::{RiskLevel, Value};
use crate::error::{PortfolioError, PortfolioResult};

/// Typed storage for one attribute.
#[derive(Debug, Clone)]
pub(crate) enum Column {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
    Risk(Vec<RiskLevel>),
    Date(Vec<NaiveDate>),
}

impl Column {
    fn with_capacity(kind: AttributeKind, n: usize) -> Self {
        match kind {
            AttributeKind::Numeric => Column::Numeric(Vec::with_capacity(n)),
            AttributeKind::Categorical => Column::Categorical(Vec::with_capacity(n)),
            AttributeKind::Risk => Column::Risk(Vec::with_capacity(n)),
            AttributeKind::Date => Column::Date(Vec::with_capacity(n)),
        }
    }

    fn value(&self, row: usize) -> Value {
        match self {
            Column::Numeric(v) => Value::Number(v[row]),
            Column::Categorical(v) => Value::Text(v[row].clone()),
            Column::Risk(v) => Value::Risk(v[row]),
            Column::Date(v) => Value::Date(v[row]),
        }
    }

    fn take(&self, rows: &[usize]) -> Self {
        match self {
            Column::Numeric(v) => Column::Numeric(rows.iter().map(|&r| v[r]).collect()),
            Column::Categorical(v) => {
                Column::Categorical(rows.iter().map(|&r| v[r].clone()).collect())
            }
            Column::Risk(v) => Column::Risk(rows.iter().map(|&r| v[r]).collect()),
            Column::Date(v) => Column::Date(rows.iter().map(|&r| v[r]).collect()),
        }
    }

    /// Appends an already-coerced value. Caller guarantees the variant matches.
    fn push(&mut self, value: Value) {
        match (self, value) {
            (Column::Numeric(v), Value::Number(n)) => v.push(n),
            (Column::Categorical(v), Value::Text(s)) => v.push(s),
            (Column::Risk(v), Value::Risk(r)) => v.push(r),
            (Column::Date(v), Value::Date(d)) => v.push(d),
            _ => unreachable!("value coerced to column kind before push"),
        }
    }
}

/// A materialized catalog row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectRecord {
    /// Project identifier.
    pub id: String,
    /// Values in schema declaration order.
    pub values: Vec<Value>,
}

impl ProjectRecord {
    pub fn get(&self, attribute: AttributeId) -> Option<&Value> {
        self.values.get(attribute.index())
    }
}

/// Fixed-schema columnar table of project records.
///
/// Read-only once built. Every stage that narrows a catalog produces a new
/// one through [`Catalog::take`].
#[derive(Debug, Clone)]
pub struct Catalog {
    schema: Arc<Schema>,
    ids: Vec<String>,
    columns: Vec<Column>,
}

impl Catalog {
    /// Creates an empty catalog for the schema.
    pub fn empty(schema: Arc<Schema>) -> Self {
        let columns = schema
            .iter()
            .map(|(_, def)| Column::with_capacity(def.kind, 0))
            .collect();
        Self {
            schema,
            ids: Vec::new(),
            columns,
        }
    }

    pub fn builder(schema: Arc<Schema>) -> CatalogBuilder {
        CatalogBuilder::new(schema)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_arc(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, row: usize) -> &str {
        &self.ids[row]
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn value(&self, row: usize, attribute: AttributeId) -> Value {
        self.columns[attribute.index()].value(row)
    }

    pub(crate) fn column(&self, attribute: AttributeId) -> &Column {
        &self.columns[attribute.index()]
    }

    /// Numeric column values, or `None` if the attribute is not numeric.
    pub fn numeric(&self, attribute: AttributeId) -> Option<&[f64]> {
        match &self.columns[attribute.index()] {
            Column::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn categorical(&self, attribute: AttributeId) -> Option<&[String]> {
        match &self.columns[attribute.index()] {
            Column::Categorical(v) => Some(v),
            _ => None,
        }
    }

    pub fn risk(&self, attribute: AttributeId) -> Option<&[RiskLevel]> {
        match &self.columns[attribute.index()] {
            Column::Risk(v) => Some(v),
            _ => None,
        }
    }

    /// Cost of every row.
    pub fn costs(&self) -> &[f64] {
        match &self.columns[self.schema.cost().index()] {
            Column::Numeric(v) => v,
            _ => unreachable!("schema guarantees a numeric cost attribute"),
        }
    }

    pub fn record(&self, row: usize) -> ProjectRecord {
        ProjectRecord {
            id: self.ids[row].clone(),
            values: self.columns.iter().map(|c| c.value(row)).collect(),
        }
    }

    pub fn records(&self) -> impl Iterator<Item = ProjectRecord> + '_ {
        (0..self.len()).map(|row| self.record(row))
    }

    /// Copies the given rows, in the given order, into a new catalog.
    pub fn take(&self, rows: &[usize]) -> Catalog {
        Catalog {
            schema: Arc::clone(&self.schema),
            ids: rows.iter().map(|&r| self.ids[r].clone()).collect(),
            columns: self.columns.iter().map(|c| c.take(rows)).collect(),
        }
    }

    /// Sum of all costs.
    pub fn total_cost(&self) -> f64 {
        self.costs().iter().sum()
    }
}

/// Row-by-row catalog construction with type validation.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use u_portfolio::catalog::{Catalog, RiskLevel, Schema, Value};
///
/// let schema = Arc::new(
///     Schema::builder()
///         .numeric("cost")
///         .numeric("impact")
///         .risk("risk")
///         .cost_attribute("cost")
///         .default_score_attribute("impact")
///         .build()
///         .unwrap(),
/// );
///
/// let mut builder = Catalog::builder(schema);
/// builder
///     .push("P1", vec![Value::from(100.0), Value::from(7.5), Value::from("low")])
///     .unwrap();
/// let catalog = builder.build();
/// assert_eq!(catalog.len(), 1);
/// assert_eq!(catalog.costs(), &[100.0]);
/// ```
#[derive(Debug)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            catalog: Catalog::empty(schema),
        }
    }

    /// Appends a record, coercing values to their attribute kinds.
    ///
    /// Rejects records with the wrong number of values, uncoercible values,
    /// or a cost that is negative or not finite.
    pub fn push(&mut self, id: impl Into<String>, values: Vec<Value>) -> PortfolioResult<&mut Self> {
        let id = id.into();
        let schema = Arc::clone(&self.catalog.schema);
        if values.len() != schema.len() {
            return Err(PortfolioError::InvalidRecord {
                id,
                reason: format!("expected {} values, got {}", schema.len(), values.len()),
            });
        }

        let mut coerced = Vec::with_capacity(values.len());
        for ((attr, def), value) in schema.iter().zip(values.iter()) {
            let v = value
                .coerce_to(def.kind)
                .ok_or_else(|| PortfolioError::InvalidRecord {
                    id: id.clone(),
                    reason: format!("'{}' is not a valid {} value for '{}'", value, def.kind, def.name),
                })?;
            if attr == schema.cost() {
                let cost = v.as_number().unwrap_or(f64::NAN);
                if !cost.is_finite() || cost < 0.0 {
                    return Err(PortfolioError::InvalidRecord {
                        id,
                        reason: format!("cost must be finite and non-negative, got {cost}"),
                    });
                }
            }
            coerced.push(v);
        }

        for (column, v) in self.catalog.columns.iter_mut().zip(coerced) {
            column.push(v);
        }
        self.catalog.ids.push(id);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    pub fn build(self) -> Catalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::builder()
                .numeric("cost")
                .numeric("impact")
                .categorical("sector")
                .risk("risk")
                .date("start")
                .cost_attribute("cost")
                .default_score_attribute("impact")
                .build()
                .unwrap(),
        )
    }

    fn row(cost: f64, impact: f64, sector: &str, risk: &str) -> Vec<Value> {
        vec![
            Value::from(cost),
            Value::from(impact),
            Value::from(sector),
            Value::from(risk),
            Value::from("2023-01-15"),
        ]
    }

    fn sample() -> Catalog {
        let mut b = Catalog::builder(schema());
        b.push("A", row(100.0, 5.0, "Energy", "Low")).unwrap();
        b.push("B", row(50.0, 3.0, "Water", "High")).unwrap();
        b.push("C", row(75.0, 9.0, "Energy", "Medium")).unwrap();
        b.build()
    }

    #[test]
    fn test_build_and_access() {
        let cat = sample();
        assert_eq!(cat.len(), 3);
        assert_eq!(cat.costs(), &[100.0, 50.0, 75.0]);
        let risk = cat.schema().resolve("risk").unwrap();
        assert_eq!(
            cat.risk(risk).unwrap(),
            &[RiskLevel::Low, RiskLevel::High, RiskLevel::Medium]
        );
        assert!((cat.total_cost() - 225.0).abs() < 1e-10);
    }

    #[test]
    fn test_take_copies_rows_in_order() {
        let cat = sample();
        let sub = cat.take(&[2, 0]);
        assert_eq!(sub.ids(), &["C".to_string(), "A".to_string()]);
        assert_eq!(sub.costs(), &[75.0, 100.0]);
        // source untouched
        assert_eq!(cat.len(), 3);
    }

    #[test]
    fn test_record_materializes_values() {
        let cat = sample();
        let rec = cat.record(1);
        assert_eq!(rec.id, "B");
        let sector = cat.schema().resolve("sector").unwrap();
        assert_eq!(rec.get(sector), Some(&Value::Text("Water".into())));
    }

    #[test]
    fn test_rejects_negative_cost() {
        let mut b = Catalog::builder(schema());
        let err = b.push("X", row(-1.0, 1.0, "Energy", "Low")).unwrap_err();
        assert!(matches!(err, PortfolioError::InvalidRecord { .. }));
        assert!(b.is_empty());
    }

    #[test]
    fn test_rejects_bad_risk_label() {
        let mut b = Catalog::builder(schema());
        assert!(b.push("X", row(1.0, 1.0, "Energy", "Severe")).is_err());
    }

    #[test]
    fn test_rejects_wrong_arity() {
        let mut b = Catalog::builder(schema());
        assert!(b.push("X", vec![Value::from(1.0)]).is_err());
    }

    #[test]
    fn test_empty_catalog() {
        let cat = Catalog::empty(schema());
        assert!(cat.is_empty());
        assert!(cat.costs().is_empty());
    }
}
