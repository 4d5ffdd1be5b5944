//! Model fingerprints for change detection.
//!
//! Three orthogonal 64-bit hashes per model, each over a canonical JSON
//! serialization of a projection of the IR: what data the model yields
//! (logic), what shape it has (schema), and how it is described (metadata).
//! The construction is SHA-256 truncated to 16 hex characters, which is
//! stable across runs and platforms.

use crate::error::CoreResult;
use crate::model::{ForeignKey, Model, WhereClause};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// The three fingerprints of one model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fingerprints {
    /// Hash over the value-producing subset of the model
    pub logic_hash: String,

    /// Hash over the output shape (names and types)
    pub schema_hash: String,

    /// Hash over descriptive, non-semantic attributes
    pub metadata_hash: String,
}

/// Compute all three fingerprints for a model.
pub fn fingerprint(model: &Model) -> CoreResult<Fingerprints> {
    Ok(Fingerprints {
        logic_hash: hash64(&LogicProjection::of(model))?,
        schema_hash: hash64(&SchemaProjection::of(model))?,
        metadata_hash: hash64(&MetadataProjection::of(model))?,
    })
}

/// Hash a serializable value to 16 hex characters (64 bits).
///
/// Canonical form: JSON with struct fields in declaration order and authored
/// order preserved for sequences, so identical content always produces
/// identical bytes.
pub fn hash64<T: Serialize>(value: &T) -> CoreResult<String> {
    let json = serde_json::to_string(value)?;
    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..16].to_string())
}

/// Logic projection: columns (name, source, expression), filters, ctes,
/// aggregations, relationships, and the base table.
#[derive(Serialize)]
struct LogicProjection<'a> {
    columns: Vec<LogicColumn<'a>>,
    filters: &'a [WhereClause],
    ctes: Vec<&'a str>,
    group_by: &'a [String],
    having: &'a [String],
    relationships: &'a [ForeignKey],
    base_table: Option<&'a str>,
}

#[derive(Serialize)]
struct LogicColumn<'a> {
    name: &'a str,
    reference_table: &'a str,
    expression: &'a str,
}

impl<'a> LogicProjection<'a> {
    fn of(model: &'a Model) -> Self {
        Self {
            columns: model
                .columns
                .iter()
                .map(|c| LogicColumn {
                    name: &c.name,
                    reference_table: c.reference_table.as_str(),
                    expression: &c.expression,
                })
                .collect(),
            filters: &model.filters,
            ctes: model.cte_refs.iter().map(|c| c.as_str()).collect(),
            group_by: &model.group_by,
            having: &model.having,
            relationships: &model.relationships,
            base_table: model.base_table.as_deref(),
        }
    }
}

/// Schema projection: output column names and types. Columns are nullable
/// unless a future contract layer says otherwise, so nullability is a
/// constant `true` in the projection.
#[derive(Serialize)]
struct SchemaProjection<'a> {
    columns: Vec<SchemaColumn<'a>>,
}

#[derive(Serialize)]
struct SchemaColumn<'a> {
    name: &'a str,
    data_type: &'a str,
    nullable: bool,
}

impl<'a> SchemaProjection<'a> {
    fn of(model: &'a Model) -> Self {
        Self {
            columns: model
                .columns
                .iter()
                .map(|c| SchemaColumn {
                    name: &c.name,
                    data_type: &c.data_type,
                    nullable: true,
                })
                .collect(),
        }
    }
}

/// Metadata projection: descriptive attributes that never change the data.
#[derive(Serialize)]
struct MetadataProjection<'a> {
    description: &'a str,
    owner: &'a str,
    tags: &'a [String],
    domain: &'a str,
    refresh_frequency: String,
    layer: String,
    kind: String,
}

impl<'a> MetadataProjection<'a> {
    fn of(model: &'a Model) -> Self {
        Self {
            description: &model.description,
            owner: &model.owner,
            tags: &model.tags,
            domain: &model.domain,
            refresh_frequency: model.refresh_frequency.to_string(),
            layer: model.layer.to_string(),
            kind: model.kind.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "fingerprint_test.rs"]
mod tests;
