//! Filter predicates and the filter specification.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Value;
use crate::error::{PortfolioError, PortfolioResult};

/// Comparison operator of a threshold predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
}

impl Comparison {
    /// Evaluates `lhs <op> rhs`. Always false when either side is NaN.
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Ge => lhs >= rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Lt => lhs < rhs,
            Comparison::Eq => lhs == rhs,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Eq => "==",
        }
    }
}

impl std::fmt::Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single attribute-scoped test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Numeric comparison against a constant.
    Threshold { op: Comparison, value: f64 },
    /// Exact match.
    Equals(Value),
    /// Membership in a set of accepted values.
    OneOf(Vec<Value>),
}

impl Predicate {
    pub fn threshold(op: Comparison, value: f64) -> Self {
        Predicate::Threshold { op, value }
    }

    pub fn equals(value: impl Into<Value>) -> Self {
        Predicate::Equals(value.into())
    }

    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Predicate::OneOf(values.into_iter().map(Into::into).collect())
    }

    /// Parses the compact string form produced by query parsers.
    ///
    /// - `">=50"`, `"<=3.5"`, `">0"`, `"<10"`: numeric thresholds
    /// - `"==7"`: numeric equality; `"==Energy"`: exact text match
    /// - anything else: exact text match on the whole string
    ///
    /// # Examples
    ///
    /// ```
    /// use u_portfolio::filter::{Comparison, Predicate};
    ///
    /// assert_eq!(
    ///     Predicate::parse(">= 70").unwrap(),
    ///     Predicate::threshold(Comparison::Ge, 70.0)
    /// );
    /// assert_eq!(Predicate::parse("Energy").unwrap(), Predicate::equals("Energy"));
    /// assert!(Predicate::parse(">abc").is_err());
    /// ```
    pub fn parse(expr: &str) -> PortfolioResult<Self> {
        let expr = expr.trim();
        // Two-character operators first so ">=" is not read as ">".
        for (prefix, op) in [
            (">=", Comparison::Ge),
            ("<=", Comparison::Le),
            (">", Comparison::Gt),
            ("<", Comparison::Lt),
        ] {
            if let Some(rest) = expr.strip_prefix(prefix) {
                let value = rest.trim().parse::<f64>().map_err(|_| {
                    PortfolioError::QueryParse(format!("'{expr}': threshold is not a number"))
                })?;
                return Ok(Predicate::threshold(op, value));
            }
        }
        if let Some(rest) = expr.strip_prefix("==") {
            let rest = rest.trim();
            return Ok(match rest.parse::<f64>() {
                Ok(n) => Predicate::threshold(Comparison::Eq, n),
                Err(_) => Predicate::equals(rest),
            });
        }
        Ok(Predicate::equals(expr))
    }
}

/// Attribute name to predicate mapping; predicates are ANDed.
///
/// Names are plain strings here and are validated against a schema when
/// the filter is bound. Inserting a second predicate for the same
/// attribute replaces the first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    predicates: BTreeMap<String, Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a predicate (builder style).
    pub fn with(mut self, attribute: impl Into<String>, predicate: Predicate) -> Self {
        self.insert(attribute, predicate);
        self
    }

    /// Adds a predicate, returning the one it replaced.
    pub fn insert(&mut self, attribute: impl Into<String>, predicate: Predicate) -> Option<Predicate> {
        self.predicates.insert(attribute.into(), predicate)
    }

    pub fn get(&self, attribute: &str) -> Option<&Predicate> {
        self.predicates.get(attribute)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Iterates predicates in attribute-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.predicates.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a spec from the string forms accepted by [`Predicate::parse`].
    pub fn from_expressions<I, K, V>(entries: I) -> PortfolioResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut spec = FilterSpec::new();
        for (attribute, expr) in entries {
            spec.insert(attribute, Predicate::parse(expr.as_ref())?);
        }
        Ok(spec)
    }
}

impl FromIterator<(String, Predicate)> for FilterSpec {
    fn from_iter<T: IntoIterator<Item = (String, Predicate)>>(iter: T) -> Self {
        Self {
            predicates: iter.into_iter().collect(),
        }
    }
}
