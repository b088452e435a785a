//! Optimizer configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the portfolio optimizer.
///
/// # Examples
///
/// ```
/// use u_portfolio::optimizer::OptimizerConfig;
///
/// let config = OptimizerConfig::default().with_inclusion_threshold(0.6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// LP variables strictly above this value are selected. In `(0, 1)`.
    pub inclusion_threshold: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            inclusion_threshold: 0.5,
        }
    }
}

impl OptimizerConfig {
    pub fn with_inclusion_threshold(mut self, threshold: f64) -> Self {
        self.inclusion_threshold = threshold;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let t = self.inclusion_threshold;
        if !(t > 0.0 && t < 1.0) {
            return Err(format!(
                "inclusion_threshold must be in (0, 1), got {}",
                self.inclusion_threshold
            ));
        }
        Ok(())
    }
}
