//! Catalog schema: attribute names, semantic types, and designations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};

/// Semantic type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Real-valued measurement (cost, impact metric, score).
    Numeric,
    /// Free-form category label (sector, region, status).
    Categorical,
    /// Ordinal risk category, see [`RiskLevel`](super::RiskLevel).
    Risk,
    /// Calendar date.
    Date,
}

impl AttributeKind {
    /// Whether values of this kind can feed composite scoring.
    pub fn is_scorable(self) -> bool {
        matches!(self, AttributeKind::Numeric | AttributeKind::Risk)
    }
}

impl std::fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttributeKind::Numeric => "numeric",
            AttributeKind::Categorical => "categorical",
            AttributeKind::Risk => "risk",
            AttributeKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// A named, typed attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    pub name: String,
    pub kind: AttributeKind,
}

/// Index of an attribute within a [`Schema`].
///
/// Only obtainable through [`Schema::resolve`], so holding one means the
/// name was validated against the schema it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(usize);

impl AttributeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Fixed catalog schema.
///
/// # Examples
///
/// ```
/// use u_portfolio::catalog::{AttributeKind, Schema};
///
/// let schema = Schema::builder()
///     .numeric("cost")
///     .numeric("impact")
///     .categorical("sector")
///     .risk("risk")
///     .cost_attribute("cost")
///     .default_score_attribute("impact")
///     .build()
///     .unwrap();
///
/// let id = schema.resolve("sector").unwrap();
/// assert_eq!(schema.kind(id), AttributeKind::Categorical);
/// assert!(schema.resolve("colour").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    attributes: Vec<AttributeDef>,
    by_name: HashMap<String, usize>,
    cost: AttributeId,
    default_score: AttributeId,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Looks up an attribute by name.
    pub fn resolve(&self, name: &str) -> Option<AttributeId> {
        self.by_name.get(name).copied().map(AttributeId)
    }

    pub fn attribute(&self, id: AttributeId) -> &AttributeDef {
        &self.attributes[id.0]
    }

    pub fn name(&self, id: AttributeId) -> &str {
        &self.attributes[id.0].name
    }

    pub fn kind(&self, id: AttributeId) -> AttributeKind {
        self.attributes[id.0].kind
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Iterates attributes in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, &AttributeDef)> {
        self.attributes
            .iter()
            .enumerate()
            .map(|(i, def)| (AttributeId(i), def))
    }

    /// Attributes of the given kind, in declaration order.
    pub fn attributes_of(&self, kind: AttributeKind) -> Vec<AttributeId> {
        self.iter()
            .filter(|(_, def)| def.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// The monetary cost attribute (numeric, values >= 0).
    pub fn cost(&self) -> AttributeId {
        self.cost
    }

    /// The attribute scored alone when no weight entry is usable.
    pub fn default_score(&self) -> AttributeId {
        self.default_score
    }
}

/// Builder for [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    attributes: Vec<AttributeDef>,
    cost: Option<String>,
    default_score: Option<String>,
}

impl SchemaBuilder {
    /// Adds an attribute of the given kind.
    pub fn attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        self.attributes.push(AttributeDef {
            name: name.into(),
            kind,
        });
        self
    }

    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Numeric)
    }

    pub fn categorical(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Categorical)
    }

    pub fn risk(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Risk)
    }

    pub fn date(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Date)
    }

    /// Designates the cost attribute. Must name a numeric attribute.
    pub fn cost_attribute(mut self, name: impl Into<String>) -> Self {
        self.cost = Some(name.into());
        self
    }

    /// Designates the fallback score attribute. Must be numeric or risk.
    pub fn default_score_attribute(mut self, name: impl Into<String>) -> Self {
        self.default_score = Some(name.into());
        self
    }

    /// Validates names and designations.
    pub fn build(self) -> PortfolioResult<Schema> {
        let mut by_name = HashMap::with_capacity(self.attributes.len());
        for (i, def) in self.attributes.iter().enumerate() {
            if by_name.insert(def.name.clone(), i).is_some() {
                return Err(PortfolioError::DuplicateAttribute(def.name.clone()));
            }
        }

        let cost_name = self.cost.ok_or(PortfolioError::MissingDesignation("cost"))?;
        let cost = *by_name
            .get(&cost_name)
            .ok_or_else(|| PortfolioError::UnknownAttribute(cost_name.clone()))?;
        if self.attributes[cost].kind != AttributeKind::Numeric {
            return Err(PortfolioError::AttributeKind {
                attribute: cost_name,
                expected: "numeric",
            });
        }

        let score_name = self
            .default_score
            .ok_or(PortfolioError::MissingDesignation("default score"))?;
        let default_score = *by_name
            .get(&score_name)
            .ok_or_else(|| PortfolioError::UnknownAttribute(score_name.clone()))?;
        if !self.attributes[default_score].kind.is_scorable() {
            return Err(PortfolioError::AttributeKind {
                attribute: score_name,
                expected: "numeric or risk",
            });
        }

        Ok(Schema {
            attributes: self.attributes,
            by_name,
            cost: AttributeId(cost),
            default_score: AttributeId(default_score),
        })
    }
}
