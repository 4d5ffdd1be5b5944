//! SQL dialect abstraction.
//!
//! A dialect supplies identifier quoting, the DDL preludes, the shape of
//! partitioning/clustering clauses, the recognized-function allowlist, audit
//! statement templates, and placeholder macro expansion. The generator core
//! never matches on a concrete dialect; adding one means implementing this
//! trait.

use st_core::model::Optimization;
use st_core::DialectKind;

/// Escape a SQL string literal value by doubling single quotes.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Trait for SQL dialect implementations.
pub trait Dialect: Send + Sync {
    /// The dialect name (matches the selector string).
    fn name(&self) -> &'static str;

    /// Quote an identifier for this dialect.
    fn quote_ident(&self, ident: &str) -> String;

    /// DDL prelude for a TABLE model, ending in `AS`.
    fn create_table_prelude(
        &self,
        schema: &str,
        table: &str,
        optimization: Option<&Optimization>,
    ) -> String;

    /// DDL prelude for a VIEW model, ending in `AS`.
    fn create_view_prelude(&self, schema: &str, table: &str) -> String;

    /// Functions this dialect recognizes beyond the shared built-ins.
    /// Used by expression analysis so dialect functions are not mistaken
    /// for column references.
    fn functions(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether the dialect supports a placeholder macro (name without `@`).
    fn supports_macro(&self, name: &str) -> bool;

    /// Expand a placeholder macro invocation (`args` is the raw text between
    /// the parentheses). Returns `None` when the macro is unsupported.
    fn expand_macro(&self, name: &str, args: &str) -> Option<String>;

    // -- Audit statement templates -----------------------------------------
    // Shared defaults; a dialect can override any template wholesale.

    /// Count of rows where any listed column is null; expected 0.
    fn not_null_audit(&self, table: &str, model: &str, columns: &[String]) -> String {
        let conditions: Vec<String> = columns.iter().map(|c| format!("{} IS NULL", c)).collect();
        audit_count_query(model, "NOT_NULL", &columns.join(", "), table, &conditions.join(" OR "))
    }

    /// Count of rows where any listed column is non-positive or null;
    /// expected 0.
    fn positive_values_audit(&self, table: &str, model: &str, columns: &[String]) -> String {
        let conditions: Vec<String> = columns
            .iter()
            .map(|c| format!("{} <= 0 OR {} IS NULL", c, c))
            .collect();
        audit_count_query(
            model,
            "POSITIVE_VALUES",
            &columns.join(", "),
            table,
            &conditions.join(" OR "),
        )
    }

    /// Count of duplicate groups over the listed columns; expected 0.
    fn unique_combination_audit(&self, table: &str, model: &str, columns: &[String]) -> String {
        let cols = columns.join(", ");
        format!(
            "SELECT\n  '{model}' AS model_name,\n  'UNIQUE_COMBINATION' AS audit_type,\n  '{cols}' AS columns_checked,\n  COUNT(*) AS failed_rows\nFROM (\n  SELECT {cols}\n  FROM {table}\n  GROUP BY {cols}\n  HAVING COUNT(*) > 1\n) duplicate_groups\nHAVING COUNT(*) > 0",
            model = model,
            cols = cols,
            table = table,
        )
    }

    /// Count of rows whose column value falls outside the allowed literal
    /// set; expected 0.
    fn accepted_values_audit(
        &self,
        table: &str,
        model: &str,
        values: &[(String, Vec<String>)],
    ) -> String {
        let columns: Vec<&str> = values.iter().map(|(c, _)| c.as_str()).collect();
        let conditions: Vec<String> = values
            .iter()
            .map(|(column, literals)| {
                let list: Vec<String> = literals
                    .iter()
                    .map(|v| format!("'{}'", escape_sql_string(v)))
                    .collect();
                format!("{} NOT IN ({})", column, list.join(", "))
            })
            .collect();
        audit_count_query(
            model,
            "ACCEPTED_VALUES",
            &columns.join(", "),
            table,
            &conditions.join(" OR "),
        )
    }
}

/// The shared `SELECT ... COUNT(*) ... HAVING COUNT(*) > 0` audit shape.
fn audit_count_query(
    model: &str,
    audit_type: &str,
    columns_checked: &str,
    table: &str,
    condition: &str,
) -> String {
    format!(
        "SELECT\n  '{model}' AS model_name,\n  '{audit_type}' AS audit_type,\n  '{columns}' AS columns_checked,\n  COUNT(*) AS failed_rows\nFROM {table}\nWHERE {condition}\nHAVING COUNT(*) > 0",
        model = model,
        audit_type = audit_type,
        columns = columns_checked,
        table = table,
        condition = condition,
    )
}

/// Resolve a validated dialect selector to an implementation.
pub fn dialect_for(kind: DialectKind) -> Box<dyn Dialect> {
    match kind {
        DialectKind::Postgres => Box::new(PostgresDialect),
        DialectKind::Spark => Box::new(SparkDialect),
    }
}

/// Postgres-flavored dialect.
///
/// CREATE TABLE AS has no inline partitioning clause, so optimization hints
/// do not surface in the prelude. `@newpk()` maps to `gen_random_uuid()`;
/// `@Feature` has no Postgres equivalent and is rejected.
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn create_table_prelude(
        &self,
        schema: &str,
        table: &str,
        _optimization: Option<&Optimization>,
    ) -> String {
        format!("CREATE TABLE {}.{} AS", schema, table)
    }

    fn create_view_prelude(&self, schema: &str, table: &str) -> String {
        format!("CREATE OR REPLACE VIEW {}.{} AS", schema, table)
    }

    fn functions(&self) -> &'static [&'static str] {
        &["GEN_RANDOM_UUID", "TO_CHAR", "TO_DATE", "DATE_PART", "AGE", "STRING_AGG"]
    }

    fn supports_macro(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("newpk")
    }

    fn expand_macro(&self, name: &str, _args: &str) -> Option<String> {
        if name.eq_ignore_ascii_case("newpk") {
            Some("gen_random_uuid()".to_string())
        } else {
            None
        }
    }
}

/// Spark SQL (Delta) dialect.
pub struct SparkDialect;

impl Dialect for SparkDialect {
    fn name(&self) -> &'static str {
        "spark"
    }

    fn quote_ident(&self, ident: &str) -> String {
        format!("`{}`", ident.replace('`', "``"))
    }

    fn create_table_prelude(
        &self,
        schema: &str,
        table: &str,
        optimization: Option<&Optimization>,
    ) -> String {
        let mut prelude = format!("CREATE TABLE {}.{}", schema, table);
        if let Some(opt) = optimization {
            if !opt.partitioned_by.is_empty() {
                prelude.push_str("\nUSING DELTA");
                prelude.push_str(&format!(
                    "\nPARTITIONED BY ({})",
                    opt.partitioned_by.join(", ")
                ));
            }
            if !opt.clustered_by.is_empty() {
                prelude.push_str(&format!(
                    "\nCLUSTERED BY ({})",
                    opt.clustered_by.join(", ")
                ));
            }
        }
        prelude.push_str("\nAS");
        prelude
    }

    fn create_view_prelude(&self, schema: &str, table: &str) -> String {
        format!("CREATE VIEW {}.{} AS", schema, table)
    }

    fn functions(&self) -> &'static [&'static str] {
        &["UUID", "FEATURE", "DATE_FORMAT", "COLLECT_LIST", "COLLECT_SET", "EXPLODE"]
    }

    fn supports_macro(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case("newpk") || name.eq_ignore_ascii_case("feature")
    }

    fn expand_macro(&self, name: &str, args: &str) -> Option<String> {
        if name.eq_ignore_ascii_case("newpk") {
            Some("uuid()".to_string())
        } else if name.eq_ignore_ascii_case("feature") {
            Some(format!("feature({})", args))
        } else {
            None
        }
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
