//! Audit statement emission.
//!
//! Each audit becomes one standalone validation query returned alongside the
//! model's main artifact. Keys are `<model>.<index>` with a 1-based index so
//! state diffs stay stable when audits are appended.

use st_core::model::{Audit, Model};

use crate::dialect::Dialect;

/// One emitted audit statement.
#[derive(Debug, Clone)]
pub struct AuditStatement {
    /// Stable key: `<model>.<index>`, 1-based
    pub key: String,

    /// Parent model name
    pub model: String,

    /// Audit tag (`NOT_NULL`, ...)
    pub audit_type: &'static str,

    /// The validation query; zero rows / zero count means the audit passes
    pub sql: String,
}

/// Emit the audit statements for one model, in authored order.
pub fn generate_audits(model: &Model, dialect: &dyn Dialect) -> Vec<AuditStatement> {
    let table = format!("{}.{}", model.layer, model.name);

    model
        .audits
        .iter()
        .enumerate()
        .map(|(i, audit)| {
            let sql = match audit {
                Audit::NotNull { columns } => {
                    dialect.not_null_audit(&table, model.name.as_str(), columns)
                }
                Audit::PositiveValues { columns } => {
                    dialect.positive_values_audit(&table, model.name.as_str(), columns)
                }
                Audit::UniqueCombination { columns } => {
                    dialect.unique_combination_audit(&table, model.name.as_str(), columns)
                }
                Audit::AcceptedValues { values } => {
                    dialect.accepted_values_audit(&table, model.name.as_str(), values)
                }
            };
            AuditStatement {
                key: format!("{}.{}", model.name, i + 1),
                model: model.name.to_string(),
                audit_type: audit.type_name(),
                sql,
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "audit_test.rs"]
mod tests;
