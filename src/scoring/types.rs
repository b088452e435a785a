//! Scoring inputs and outputs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, ProjectRecord};
use crate::error::{PortfolioError, PortfolioResult};

/// Attribute name to non-negative weight.
///
/// Weights need not sum to 1; the scorer re-normalizes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMap {
    weights: BTreeMap<String, f64>,
}

impl WeightMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a weight (builder style).
    pub fn with(mut self, attribute: impl Into<String>, weight: f64) -> Self {
        self.weights.insert(attribute.into(), weight);
        self
    }

    pub fn insert(&mut self, attribute: impl Into<String>, weight: f64) -> Option<f64> {
        self.weights.insert(attribute.into(), weight)
    }

    pub fn get(&self, attribute: &str) -> Option<f64> {
        self.weights.get(attribute).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Iterates entries in attribute-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for WeightMap {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self {
            weights: iter.into_iter().collect(),
        }
    }
}

/// A weight that took part in scoring, after re-normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedWeight {
    pub attribute: String,
    /// Share of the total weight, in `[0, 1]`.
    pub weight: f64,
}

/// A project record with its composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub record: ProjectRecord,
    /// Composite score in `[0, 100]`.
    pub score: f64,
}

/// Position of a record in a descending-score ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedProject {
    /// 1-based rank.
    pub rank: usize,
    /// Row of the record in the scored set.
    pub position: usize,
    pub id: String,
    pub score: f64,
}

/// A candidate subset with one composite score per row.
///
/// Rows keep the order of the subset they were scored from.
#[derive(Debug, Clone)]
pub struct ScoredSet {
    catalog: Catalog,
    scores: Vec<f64>,
}

impl ScoredSet {
    /// Pairs a catalog with externally computed scores.
    ///
    /// Fails if the lengths differ or a score is outside `[0, 100]`.
    pub fn new(catalog: Catalog, scores: Vec<f64>) -> PortfolioResult<Self> {
        if catalog.len() != scores.len() {
            return Err(PortfolioError::InvalidScores(format!(
                "{} records but {} scores",
                catalog.len(),
                scores.len()
            )));
        }
        if let Some((row, s)) = scores
            .iter()
            .enumerate()
            .find(|(_, s)| !(0.0..=100.0).contains(*s))
        {
            return Err(PortfolioError::InvalidScores(format!(
                "score {s} of '{}' is outside [0, 100]",
                catalog.id(row)
            )));
        }
        Ok(Self { catalog, scores })
    }

    pub(crate) fn from_parts(catalog: Catalog, scores: Vec<f64>) -> Self {
        debug_assert_eq!(catalog.len(), scores.len());
        Self { catalog, scores }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn score(&self, row: usize) -> f64 {
        self.scores[row]
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn record(&self, row: usize) -> ScoredRecord {
        ScoredRecord {
            record: self.catalog.record(row),
            score: self.scores[row],
        }
    }

    pub fn records(&self) -> impl Iterator<Item = ScoredRecord> + '_ {
        (0..self.len()).map(|row| self.record(row))
    }

    /// Ranks rows by score, highest first.
    ///
    /// Ties keep subset order, so equal scores are ranked in catalog order.
    pub fn rank(&self) -> Vec<RankedProject> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.scores[b].total_cmp(&self.scores[a]));
        order
            .into_iter()
            .enumerate()
            .map(|(i, row)| RankedProject {
                rank: i + 1,
                position: row,
                id: self.catalog.id(row).to_string(),
                score: self.scores[row],
            })
            .collect()
    }

    /// The `n` best-ranked rows.
    pub fn top(&self, n: usize) -> Vec<RankedProject> {
        let mut ranked = self.rank();
        ranked.truncate(n);
        ranked
    }
}
