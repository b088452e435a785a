//! Project catalog: schema, typed values, and columnar storage.
//!
//! # Key Components
//!
//! - [`Schema`]: attribute names and semantic types, plus the designated
//!   cost and fallback-score attributes
//! - [`AttributeId`]: a name already validated against a schema
//! - [`Value`], [`RiskLevel`]: typed attribute values
//! - [`Catalog`]: read-only columnar table built through [`CatalogBuilder`]
//!
//! # Design
//!
//! Each attribute is stored as one typed column, so comparisons and
//! normalization are defined per column type instead of per record.
//! Catalogs are never mutated after construction; narrowing a catalog
//! ([`Catalog::take`]) copies rows into a new one.

pub mod esg;
mod schema;
mod table;
mod value;

pub use schema::{AttributeDef, AttributeId, AttributeKind, Schema, SchemaBuilder};
pub(crate) use table::Column;
pub use table::{Catalog, CatalogBuilder, ProjectRecord};
pub use value::{RiskLevel, Value};
