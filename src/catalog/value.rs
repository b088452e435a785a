//! Attribute values and ordinal risk levels.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::schema::AttributeKind;

/// Ordinal risk category.
///
/// Ordered by severity: `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// All levels, least severe first.
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Position on the favorability scale used for scoring.
    ///
    /// More favorable (less risky) levels map to higher values:
    /// `Low = 3`, `Medium = 2`, `High = 1`.
    pub fn favorability(self) -> f64 {
        match self {
            RiskLevel::Low => 3.0,
            RiskLevel::Medium => 2.0,
            RiskLevel::High => 1.0,
        }
    }

    /// Whether this level is at least as severe as `other`.
    pub fn is_at_least(self, other: RiskLevel) -> bool {
        self >= other
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "med" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("unknown risk level '{other}'")),
        }
    }
}

/// A single attribute value.
///
/// Deserializes untagged, so JSON numbers become [`Value::Number`] and
/// strings become [`Value::Text`]; text is coerced to risk levels and
/// dates when bound against an attribute of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Risk(RiskLevel),
    Date(NaiveDate),
}

impl Value {
    /// Converts this value to the representation stored for `kind`.
    ///
    /// Returns `None` when the value cannot be compared with that kind,
    /// e.g. a non-numeric string against a numeric attribute.
    pub fn coerce_to(&self, kind: AttributeKind) -> Option<Value> {
        match (kind, self) {
            (AttributeKind::Numeric, Value::Number(n)) => Some(Value::Number(*n)),
            (AttributeKind::Numeric, Value::Text(s)) => {
                s.trim().parse::<f64>().ok().map(Value::Number)
            }
            (AttributeKind::Categorical, Value::Text(s)) => Some(Value::Text(s.clone())),
            (AttributeKind::Categorical, Value::Risk(r)) => Some(Value::Text(r.to_string())),
            (AttributeKind::Risk, Value::Risk(r)) => Some(Value::Risk(*r)),
            (AttributeKind::Risk, Value::Text(s)) => s.parse::<RiskLevel>().ok().map(Value::Risk),
            (AttributeKind::Date, Value::Date(d)) => Some(Value::Date(*d)),
            (AttributeKind::Date, Value::Text(s)) => {
                s.trim().parse::<NaiveDate>().ok().map(Value::Date)
            }
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_risk(&self) -> Option<RiskLevel> {
        match self {
            Value::Risk(r) => Some(*r),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Risk(r) => write!(f, "{r}"),
            Value::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<RiskLevel> for Value {
    fn from(r: RiskLevel) -> Self {
        Value::Risk(r)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}
