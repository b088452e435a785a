//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::catalog::esg;
use crate::constraints::ConstraintConfig;
use crate::error::{PortfolioError, PortfolioResult};
use crate::optimizer::OptimizerConfig;
use crate::scoring::{ScorerConfig, WeightMap};

/// Configuration shared by every run of a [`Pipeline`](super::Pipeline).
///
/// Request fields (weights, constraints) override the defaults held here.
///
/// # Examples
///
/// ```
/// use u_portfolio::pipeline::PipelineConfig;
///
/// let config = PipelineConfig::from_toml(
///     r#"
///     [optimizer]
///     inclusion_threshold = 0.6
///
///     [constraints.diversity]
///     attribute = "Sector"
///     min_distinct = 3
///
///     [default_weights]
///     Overall_ESG_Score = 0.7
///     Expected_ROI_Percent = 0.3
///     "#,
/// )
/// .unwrap();
/// assert_eq!(config.optimizer.inclusion_threshold, 0.6);
/// assert_eq!(config.constraints.diversity.unwrap().min_distinct, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub scoring: ScorerConfig,
    pub optimizer: OptimizerConfig,
    /// Rules used when a request carries none.
    pub constraints: ConstraintConfig,
    /// Weights used when a request carries none. `None` scores by the
    /// default attribute.
    pub default_weights: Option<WeightMap>,
}

impl PipelineConfig {
    /// Defaults for the standard ESG dataset: the ESG weight map plus the
    /// sector-diversity and financial-risk rules.
    pub fn esg() -> Self {
        Self {
            default_weights: Some(esg::default_weights()),
            constraints: esg::default_constraints(),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document. Missing sections take defaults.
    pub fn from_toml(content: &str) -> PortfolioResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate().map_err(PortfolioError::InvalidConfig)?;
        Ok(config)
    }

    pub fn with_scoring(mut self, scoring: ScorerConfig) -> Self {
        self.scoring = scoring;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintConfig) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_default_weights(mut self, weights: WeightMap) -> Self {
        self.default_weights = Some(weights);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.scoring.validate()?;
        self.optimizer.validate()?;
        self.constraints.validate()?;
        if let Some(weights) = &self.default_weights {
            if let Some((name, w)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
                return Err(format!("default weight for '{name}' must be non-negative, got {w}"));
            }
        }
        Ok(())
    }
}
