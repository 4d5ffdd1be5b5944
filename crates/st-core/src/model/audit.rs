//! Data-quality audit definitions and parsing.
//!
//! Audits are authored either in the canonical list form
//! (`audits: [{type: NOT_NULL, columns: [...]}, ...]`) or via legacy
//! shorthands (`not_null: [A, B]`, `accepted_values: {col: [..]}`). Both are
//! coerced to the same tagged variant list at load time.

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// A single data-quality audit attached to a model.
///
/// Emission dispatches on the variant tag; there is no runtime rule lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Audit {
    /// Listed columns must never be null.
    NotNull {
        /// Columns checked by the audit
        columns: Vec<String>,
    },
    /// Listed columns must be strictly positive (and non-null).
    PositiveValues {
        /// Columns checked by the audit
        columns: Vec<String>,
    },
    /// The combination of listed columns must be unique across rows.
    UniqueCombination {
        /// Columns forming the unique key
        columns: Vec<String>,
    },
    /// Each column's value must come from its allowed literal list.
    AcceptedValues {
        /// Ordered column -> allowed literals mapping
        values: Vec<(String, Vec<String>)>,
    },
}

impl Audit {
    /// All columns the audit touches, in authored order.
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Audit::NotNull { columns }
            | Audit::PositiveValues { columns }
            | Audit::UniqueCombination { columns } => {
                columns.iter().map(String::as_str).collect()
            }
            Audit::AcceptedValues { values } => values.iter().map(|(c, _)| c.as_str()).collect(),
        }
    }

    /// The textual audit tag as it appears in definition files.
    pub fn type_name(&self) -> &'static str {
        match self {
            Audit::NotNull { .. } => "NOT_NULL",
            Audit::PositiveValues { .. } => "POSITIVE_VALUES",
            Audit::UniqueCombination { .. } => "UNIQUE_COMBINATION",
            Audit::AcceptedValues { .. } => "ACCEPTED_VALUES",
        }
    }

    /// `true` for audits that only make sense over numeric columns.
    pub fn requires_numeric_columns(&self) -> bool {
        matches!(self, Audit::PositiveValues { .. })
    }
}

impl std::fmt::Display for Audit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Outcome of parsing an `audits:` section.
#[derive(Debug, Default)]
pub struct ParsedAudits {
    /// Canonical audit list in authored order
    pub audits: Vec<Audit>,
    /// Non-fatal issues (unknown fields inside the section)
    pub warnings: Vec<String>,
}

/// Parse the `audits:` section of a definition file.
///
/// Accepts the canonical `audits:` list, the legacy per-type shorthands, or a
/// bare list of canonical items. Returns an error string (the file fails, the
/// corpus continues) on malformed entries.
pub fn parse_audits(value: &Value) -> Result<ParsedAudits, String> {
    let mut parsed = ParsedAudits::default();

    match value {
        Value::Sequence(items) => {
            for item in items {
                parsed.audits.push(parse_canonical_audit(item)?);
            }
        }
        Value::Mapping(map) => {
            for (key, val) in map {
                let key = key
                    .as_str()
                    .ok_or_else(|| "audit section keys must be strings".to_string())?;
                match key {
                    "audits" => {
                        let items = val
                            .as_sequence()
                            .ok_or_else(|| "'audits' must be a list".to_string())?;
                        for item in items {
                            parsed.audits.push(parse_canonical_audit(item)?);
                        }
                    }
                    "not_null" => parsed
                        .audits
                        .push(Audit::NotNull { columns: string_list(val, key)? }),
                    "positive_values" => parsed
                        .audits
                        .push(Audit::PositiveValues { columns: string_list(val, key)? }),
                    "unique_combination" => parsed
                        .audits
                        .push(Audit::UniqueCombination { columns: string_list(val, key)? }),
                    "accepted_values" => {
                        let map = val.as_mapping().ok_or_else(|| {
                            "'accepted_values' shorthand must map column -> literals".to_string()
                        })?;
                        let mut values = Vec::new();
                        for (col, literals) in map {
                            let col = col
                                .as_str()
                                .ok_or_else(|| "accepted_values columns must be strings".to_string())?;
                            values.push((col.to_string(), literal_list(literals)?));
                        }
                        parsed.audits.push(Audit::AcceptedValues { values });
                    }
                    other => parsed
                        .warnings
                        .push(format!("unknown field '{}' in audits section", other)),
                }
            }
        }
        Value::Null => {}
        _ => return Err("audits section must be a mapping or a list".to_string()),
    }

    Ok(parsed)
}

/// Parse one canonical `{type, columns, values?}` audit item.
fn parse_canonical_audit(item: &Value) -> Result<Audit, String> {
    let map = item
        .as_mapping()
        .ok_or_else(|| "audit entries must be mappings".to_string())?;

    let audit_type = map
        .get(Value::from("type"))
        .and_then(Value::as_str)
        .ok_or_else(|| "audit entry missing 'type'".to_string())?;

    let columns = match map.get(Value::from("columns")) {
        Some(v) => string_list(v, "columns")?,
        None => Vec::new(),
    };

    match audit_type {
        "NOT_NULL" => Ok(Audit::NotNull { columns }),
        "POSITIVE_VALUES" => Ok(Audit::PositiveValues { columns }),
        "UNIQUE_COMBINATION" => Ok(Audit::UniqueCombination { columns }),
        "ACCEPTED_VALUES" => {
            let values = match map.get(Value::from("values")) {
                Some(Value::Sequence(literals)) => {
                    // Flat literal list attaches to the single listed column
                    if columns.len() != 1 {
                        return Err(format!(
                            "ACCEPTED_VALUES with a flat value list needs exactly one column, got {}",
                            columns.len()
                        ));
                    }
                    let literals = literal_list(&Value::Sequence(literals.clone()))?;
                    vec![(columns[0].clone(), literals)]
                }
                Some(Value::Mapping(per_column)) => {
                    let mut values = Vec::new();
                    for (col, literals) in per_column {
                        let col = col
                            .as_str()
                            .ok_or_else(|| "accepted_values columns must be strings".to_string())?;
                        values.push((col.to_string(), literal_list(literals)?));
                    }
                    values
                }
                _ => columns.iter().map(|c| (c.clone(), Vec::new())).collect(),
            };
            Ok(Audit::AcceptedValues { values })
        }
        other => Err(format!("unknown audit type '{}'", other)),
    }
}

/// Coerce a YAML value into a list of strings.
fn string_list(value: &Value, field: &str) -> Result<Vec<String>, String> {
    let items = value
        .as_sequence()
        .ok_or_else(|| format!("'{}' must be a list", field))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(String::from)
                .ok_or_else(|| format!("'{}' entries must be strings", field))
        })
        .collect()
}

/// Coerce a YAML value into a list of SQL literals, stringifying scalars.
fn literal_list(value: &Value) -> Result<Vec<String>, String> {
    let items = value
        .as_sequence()
        .ok_or_else(|| "allowed values must be a list".to_string())?;
    items
        .iter()
        .map(|v| match v {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err("allowed values must be scalars".to_string()),
        })
        .collect()
}

#[cfg(test)]
#[path = "audit_test.rs"]
mod tests;
