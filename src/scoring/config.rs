//! Scorer configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the composite scorer.
///
/// # Examples
///
/// ```
/// use u_portfolio::scoring::ScorerConfig;
///
/// let config = ScorerConfig::default().with_default_attribute("Impact_Potential_Score");
/// assert_eq!(config.default_attribute.as_deref(), Some("Impact_Potential_Score"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorerConfig {
    /// Attribute scored alone when no weight entry is usable.
    ///
    /// `None` uses the schema's designated default score attribute.
    pub default_attribute: Option<String>,
}

impl ScorerConfig {
    pub fn with_default_attribute(mut self, name: impl Into<String>) -> Self {
        self.default_attribute = Some(name.into());
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(name) = &self.default_attribute {
            if name.trim().is_empty() {
                return Err("default_attribute must not be empty".into());
            }
        }
        Ok(())
    }
}
