//! Model representation
//!
//! The typed, immutable in-memory form of one authored model definition.
//! Construction guarantees structural validity (well-formed enum variants,
//! required metadata present); semantic validity across the corpus is the
//! validator's job.

pub mod audit;

pub use audit::{parse_audits, Audit, ParsedAudits};

use crate::model_name::ModelName;
use crate::table_name::TableName;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Medallion layer tag for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Raw ingested data
    Bronze,
    /// Cleansed and conformed data
    Silver,
    /// Aggregated, consumption-ready data
    Gold,
    /// Reusable inline expression
    Cte,
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Layer::Bronze => write!(f, "bronze"),
            Layer::Silver => write!(f, "silver"),
            Layer::Gold => write!(f, "gold"),
            Layer::Cte => write!(f, "cte"),
        }
    }
}

/// Materialization kind of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ModelKind {
    /// Physical table
    Table,
    /// View
    View,
    /// Inline expression spliced into consumers
    Cte,
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelKind::Table => write!(f, "TABLE"),
            ModelKind::View => write!(f, "VIEW"),
            ModelKind::Cte => write!(f, "CTE"),
        }
    }
}

/// How often the model is expected to refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl std::fmt::Display for RefreshFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshFrequency::Hourly => write!(f, "hourly"),
            RefreshFrequency::Daily => write!(f, "daily"),
            RefreshFrequency::Weekly => write!(f, "weekly"),
            RefreshFrequency::Monthly => write!(f, "monthly"),
        }
    }
}

/// SQL join type for a declared relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    FullOuter,
}

impl JoinType {
    /// The SQL keyword form (`FULL OUTER`, not `FULL_OUTER`).
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER",
            JoinType::Left => "LEFT",
            JoinType::Right => "RIGHT",
            JoinType::FullOuter => "FULL OUTER",
        }
    }
}

/// Cardinality of a declared relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// One output column of a model.
///
/// An empty `expression` is an identity mapping of the same-named column from
/// `reference_table`; anything else is a raw SQL scalar or aggregate fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Output column name
    pub name: String,

    /// Table the column is sourced from
    pub reference_table: TableName,

    /// SQL fragment; empty means identity mapping
    #[serde(default)]
    pub expression: String,

    /// Column description
    #[serde(default)]
    pub description: String,

    /// Declared data type (dialect-level spelling)
    #[serde(default)]
    pub data_type: String,
}

impl ColumnSpec {
    /// `true` when the column is a plain identity mapping.
    pub fn is_identity(&self) -> bool {
        self.expression.trim().is_empty()
    }
}

/// One WHERE predicate scoped to a source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhereClause {
    /// Table the predicate refers to (drives alias qualification)
    pub reference_table: TableName,

    /// Raw SQL predicate
    pub condition: String,
}

/// A declared foreign-key relationship; each one produces a JOIN clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Column on this model
    pub local_column: String,

    /// Referenced table
    pub references_table: TableName,

    /// Referenced column
    pub references_column: String,

    /// Declared cardinality
    pub relationship_type: RelationshipType,

    /// SQL join type to emit
    pub join_type: JoinType,
}

/// A secondary index request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Indexed columns
    pub columns: Vec<String>,

    /// Index type (dialect-level spelling, e.g. `btree`)
    #[serde(rename = "type")]
    pub index_type: String,
}

/// Physical layout hints for materialized models.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Optimization {
    /// Partition columns
    #[serde(default)]
    pub partitioned_by: Vec<String>,

    /// Clustering columns
    #[serde(default)]
    pub clustered_by: Vec<String>,

    /// Secondary indexes
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl Optimization {
    /// `true` when no hint is set (treated the same as an absent section).
    pub fn is_empty(&self) -> bool {
        self.partitioned_by.is_empty() && self.clustered_by.is_empty() && self.indexes.is_empty()
    }
}

/// A fully-loaded model definition.
///
/// Frozen after validation; the generator, fingerprinter, and planner only
/// read it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    /// Unique model name
    pub name: ModelName,

    /// Human description
    pub description: String,

    /// Medallion layer
    pub layer: Layer,

    /// Materialization kind
    pub kind: ModelKind,

    /// Owning team or person
    pub owner: String,

    /// Tags, authored order, first occurrence wins
    pub tags: Vec<String>,

    /// Business domain
    pub domain: String,

    /// Refresh cadence
    pub refresh_frequency: RefreshFrequency,

    /// Primary source table, if any
    pub base_table: Option<TableName>,

    /// Upstream models and external tables, authored order, first occurrence wins
    pub depends_on: Vec<String>,

    /// Output columns in authored order
    pub columns: Vec<ColumnSpec>,

    /// WHERE predicates in authored order
    pub filters: Vec<WhereClause>,

    /// Names of CTE-kind models inlined into this model
    pub cte_refs: Vec<ModelName>,

    /// GROUP BY output column names
    pub group_by: Vec<String>,

    /// HAVING predicates
    pub having: Vec<String>,

    /// Data-quality audits
    pub audits: Vec<Audit>,

    /// Columns whose combination identifies a row
    pub grain: Vec<String>,

    /// Declared foreign keys (JOIN sources)
    pub relationships: Vec<ForeignKey>,

    /// Physical layout hints; absent for CTE models
    pub optimization: Option<Optimization>,

    /// Definition file the model came from (diagnostics only)
    #[serde(skip)]
    pub path: PathBuf,
}

impl Model {
    /// Assemble a model from its parsed file shape plus coerced audits.
    pub fn from_file_shape(file: ModelFile, audits: Vec<Audit>, path: PathBuf) -> Self {
        let meta = file.model;
        let optimization = file.optimization.filter(|o| !o.is_empty());
        Self {
            name: ModelName::new(meta.name),
            description: meta.description,
            layer: meta.layer,
            kind: meta.kind,
            owner: meta.owner,
            tags: dedup_preserving(meta.tags),
            domain: meta.domain,
            refresh_frequency: meta.refresh_frequency,
            base_table: file.source.base_table,
            depends_on: dedup_preserving(file.source.depends_on_tables),
            columns: file.transformations.columns,
            filters: file.filters.where_conditions,
            cte_refs: file.ctes.into_names().into_iter().map(ModelName::new).collect(),
            group_by: file.aggregations.group_by,
            having: file.aggregations.having,
            audits,
            grain: file.grain,
            relationships: file.relationships.foreign_keys,
            optimization,
            path,
        }
    }

    /// Output column names in authored order.
    pub fn output_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up an output column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `true` for inline-expression models.
    pub fn is_cte(&self) -> bool {
        self.kind == ModelKind::Cte
    }

    /// `true` for models that produce a database object.
    pub fn is_materialized(&self) -> bool {
        matches!(self.kind, ModelKind::Table | ModelKind::View)
    }

    /// The table this model reads from first: `base_table` if set, else the
    /// first dependency.
    pub fn primary_source(&self) -> Option<&str> {
        self.base_table
            .as_deref()
            .or_else(|| self.depends_on.first().map(String::as_str))
    }

    /// The table a given output column is sourced from, defaulting to the
    /// primary source when the column is not declared.
    pub fn source_table_for_column(&self, column: &str) -> Option<&str> {
        self.column(column)
            .map(|c| c.reference_table.as_str())
            .or_else(|| self.primary_source())
    }
}

/// Drop duplicate entries while preserving first-occurrence order.
fn dedup_preserving(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

// ---------------------------------------------------------------------------
// File shapes: the serde view of a definition file after partial-file merge.
// The loader normalizes the audits section separately (shorthand coercion).
// ---------------------------------------------------------------------------

/// Top-level shape of a merged definition file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelFile {
    /// `model:` metadata section (required)
    pub model: MetaSection,

    /// `source:` section
    #[serde(default)]
    pub source: SourceSection,

    /// `transformations:` section
    #[serde(default)]
    pub transformations: TransformationsSection,

    /// `filters:` section
    #[serde(default)]
    pub filters: FiltersSection,

    /// `ctes:` section (bare list or nested list)
    #[serde(default)]
    pub ctes: CtesSection,

    /// `aggregations:` section
    #[serde(default)]
    pub aggregations: AggregationsSection,

    /// `grain:` top-level list
    #[serde(default)]
    pub grain: Vec<String>,

    /// `relationships:` section
    #[serde(default)]
    pub relationships: RelationshipsSection,

    /// `optimization:` section
    #[serde(default)]
    pub optimization: Option<Optimization>,
}

/// `model:` metadata section.
#[derive(Debug, Clone, Deserialize)]
pub struct MetaSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub layer: Layer,
    pub kind: ModelKind,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_refresh_frequency")]
    pub refresh_frequency: RefreshFrequency,
}

fn default_refresh_frequency() -> RefreshFrequency {
    RefreshFrequency::Daily
}

/// `source:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceSection {
    #[serde(default)]
    pub base_table: Option<TableName>,
    #[serde(default)]
    pub depends_on_tables: Vec<String>,
}

/// `transformations:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransformationsSection {
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

/// `filters:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FiltersSection {
    #[serde(default)]
    pub where_conditions: Vec<WhereClause>,
}

/// `ctes:` section. The source corpus authored this both as a bare list and
/// as a nested `ctes:` list; the canonical form is a flat list of names.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CtesSection {
    /// `ctes: [a, b]`
    Flat(Vec<String>),
    /// `ctes: {ctes: [a, b]}`
    Nested {
        #[serde(default)]
        ctes: Vec<String>,
    },
}

impl CtesSection {
    /// Normalize to the flat name list.
    pub fn into_names(self) -> Vec<String> {
        match self {
            CtesSection::Flat(names) => names,
            CtesSection::Nested { ctes } => ctes,
        }
    }
}

impl Default for CtesSection {
    fn default() -> Self {
        CtesSection::Flat(Vec::new())
    }
}

/// `aggregations:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AggregationsSection {
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub having: Vec<String>,
}

/// `relationships:` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationshipsSection {
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
