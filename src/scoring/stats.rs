//! Composite score distribution.

use serde::Serialize;
use statrs::statistics::{Data, Distribution, Max, Median, Min};

use super::types::ScoredSet;

/// Summary statistics of composite scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreDistribution {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0 for fewer than two scores.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub q25: f64,
    pub q75: f64,
}

impl ScoreDistribution {
    /// Computes the distribution of `scores`. `None` when empty.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let mut sorted = scores.to_vec();
        sorted.sort_by(f64::total_cmp);
        let q25 = linear_quantile(&sorted, 0.25);
        let q75 = linear_quantile(&sorted, 0.75);
        let data = Data::new(sorted);
        Some(Self {
            count: scores.len(),
            mean: data.mean().unwrap_or(0.0),
            median: data.median(),
            std_dev: data.std_dev().filter(|s| s.is_finite()).unwrap_or(0.0),
            min: data.min(),
            max: data.max(),
            q25,
            q75,
        })
    }
}

/// Quantile of ascending `sorted` data by linear interpolation between the
/// two closest ranks, `h = (n - 1) * p`.
fn linear_quantile(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return f64::NAN;
    };
    let h = last as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

impl ScoredSet {
    /// Distribution of this set's composite scores.
    pub fn distribution(&self) -> Option<ScoreDistribution> {
        ScoreDistribution::from_scores(self.scores())
    }
}
