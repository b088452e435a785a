//! Post-processing rule configuration.

use serde::{Deserialize, Serialize};

use crate::catalog::RiskLevel;

/// Warns when a portfolio spans too few distinct values of a categorical
/// attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiversityRule {
    pub attribute: String,
    pub min_distinct: usize,
}

impl DiversityRule {
    pub fn new(attribute: impl Into<String>, min_distinct: usize) -> Self {
        Self {
            attribute: attribute.into(),
            min_distinct,
        }
    }
}

/// Caps how many records at or above an unfavorable risk level a portfolio
/// may hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCapRule {
    pub attribute: String,
    pub max_unfavorable: usize,
    /// Levels at least this severe count against the cap.
    #[serde(default = "default_unfavorable")]
    pub unfavorable: RiskLevel,
}

fn default_unfavorable() -> RiskLevel {
    RiskLevel::High
}

impl RiskCapRule {
    /// Creates a cap counting `High` records.
    pub fn new(attribute: impl Into<String>, max_unfavorable: usize) -> Self {
        Self {
            attribute: attribute.into(),
            max_unfavorable,
            unfavorable: default_unfavorable(),
        }
    }

    pub fn with_unfavorable(mut self, level: RiskLevel) -> Self {
        self.unfavorable = level;
        self
    }
}

/// Rules applied after optimization. Absent rules are skipped.
///
/// # Examples
///
/// ```
/// use u_portfolio::constraints::{ConstraintConfig, DiversityRule, RiskCapRule};
///
/// let rules = ConstraintConfig::default()
///     .with_diversity(DiversityRule::new("Sector", 3))
///     .with_risk_cap(RiskCapRule::new("Financial_Risk_Level", 1));
/// assert!(rules.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintConfig {
    pub diversity: Option<DiversityRule>,
    pub risk_cap: Option<RiskCapRule>,
}

impl ConstraintConfig {
    pub fn with_diversity(mut self, rule: DiversityRule) -> Self {
        self.diversity = Some(rule);
        self
    }

    pub fn with_risk_cap(mut self, rule: RiskCapRule) -> Self {
        self.risk_cap = Some(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.diversity.is_none() && self.risk_cap.is_none()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(rule) = &self.diversity {
            if rule.attribute.trim().is_empty() {
                return Err("diversity attribute must not be empty".into());
            }
        }
        if let Some(rule) = &self.risk_cap {
            if rule.attribute.trim().is_empty() {
                return Err("risk_cap attribute must not be empty".into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let config = ConstraintConfig::default();
        assert!(config.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_risk_cap_defaults_to_high() {
        let rule = RiskCapRule::new("Financial_Risk_Level", 2);
        assert_eq!(rule.unfavorable, RiskLevel::High);
        let rule = rule.with_unfavorable(RiskLevel::Medium);
        assert_eq!(rule.unfavorable, RiskLevel::Medium);
    }

    #[test]
    fn test_validate_blank_attribute() {
        let config = ConstraintConfig::default().with_diversity(DiversityRule::new(" ", 2));
        assert!(config.validate().is_err());
    }
}
