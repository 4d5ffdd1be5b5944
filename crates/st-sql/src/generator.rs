//! Per-model SQL assembly.
//!
//! Each TABLE/VIEW model becomes one artifact: dialect DDL prelude, a WITH
//! list holding the flattened transitive CTE closure (dependencies first), a
//! SELECT list from the column specs, FROM/JOIN clauses, and the WHERE /
//! GROUP BY / HAVING tail. CTE-kind models render the same SELECT body with
//! no prelude so a parent can splice them.
//!
//! Output is byte-identical for identical input: every ordering here is
//! either authored order or resolver order.

use std::collections::{BTreeMap, BTreeSet};

use st_core::model::{ColumnSpec, Model, ModelKind};
use st_core::{DependencyGraph, ModelName};

use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};

/// Generates SQL artifacts for a validated corpus.
pub struct SqlGenerator<'a> {
    models: &'a BTreeMap<ModelName, Model>,
    dialect: Box<dyn Dialect>,
    topo_positions: BTreeMap<ModelName, usize>,
}

impl<'a> SqlGenerator<'a> {
    /// Create a generator over the frozen IR and its resolved graph.
    pub fn new(
        models: &'a BTreeMap<ModelName, Model>,
        dag: &DependencyGraph,
        dialect: Box<dyn Dialect>,
    ) -> Self {
        Self {
            models,
            dialect,
            topo_positions: dag.topo_positions(),
        }
    }

    /// Generate artifacts for every materializable model.
    pub fn generate_all(&self) -> SqlResult<BTreeMap<ModelName, String>> {
        let mut artifacts = BTreeMap::new();
        for (name, model) in self.models {
            if model.is_materialized() {
                artifacts.insert(name.clone(), self.generate(name)?);
            }
        }
        Ok(artifacts)
    }

    /// Generate the artifact for one model.
    pub fn generate(&self, name: &str) -> SqlResult<String> {
        let model = self.models.get(name).ok_or_else(|| SqlError::ModelNotFound {
            name: name.to_string(),
        })?;

        match model.kind {
            ModelKind::Cte => self.render_select(model),
            ModelKind::Table | ModelKind::View => self.render_materialized(model),
        }
    }

    fn render_materialized(&self, model: &Model) -> SqlResult<String> {
        let schema = model.layer.to_string();
        let prelude = match model.kind {
            ModelKind::Table => self.dialect.create_table_prelude(
                &schema,
                model.name.as_str(),
                model.optimization.as_ref(),
            ),
            ModelKind::View => self
                .dialect
                .create_view_prelude(&schema, model.name.as_str()),
            ModelKind::Cte => unreachable!("CTE models have no DDL prelude"),
        };

        let mut out = prelude;
        out.push('\n');

        let closure = self.cte_closure(model)?;
        if !closure.is_empty() {
            let rendered: Vec<String> = closure
                .iter()
                .map(|cte| {
                    let body = self.render_select(cte)?;
                    Ok(format!("{} AS (\n{}\n)", cte.name, indent(&body)))
                })
                .collect::<SqlResult<_>>()?;
            out.push_str("WITH ");
            out.push_str(&rendered.join(",\n"));
            out.push('\n');
        }

        out.push_str(&self.render_select(model)?);
        Ok(out)
    }

    /// Transitive CTE closure of a model, resolver order (dependencies of a
    /// CTE precede it, so nested CTEs land innermost-first in the WITH list).
    fn cte_closure(&self, model: &Model) -> SqlResult<Vec<&'a Model>> {
        let mut seen: BTreeSet<&str> = BTreeSet::new();
        let mut stack: Vec<&ModelName> = model.cte_refs.iter().collect();
        let mut members: Vec<&'a Model> = Vec::new();

        while let Some(name) = stack.pop() {
            if !seen.insert(name.as_str()) {
                continue;
            }
            let cte = self
                .models
                .get(name.as_str())
                .ok_or_else(|| SqlError::ModelNotFound {
                    name: name.to_string(),
                })?;
            members.push(cte);
            stack.extend(cte.cte_refs.iter());
        }

        members.sort_by_key(|cte| self.topo_positions.get(&cte.name).copied());
        Ok(members)
    }

    /// Render the SELECT body of a model (shared by CTE splicing and
    /// materialized artifacts).
    fn render_select(&self, model: &Model) -> SqlResult<String> {
        let aliases = self.alias_map(model)?;
        let primary = model
            .primary_source()
            .ok_or_else(|| SqlError::MissingSource {
                model: model.name.to_string(),
            })?;

        let mut lines = vec!["SELECT".to_string()];
        for (i, column) in model.columns.iter().enumerate() {
            let expr = self.render_expression(model, &aliases, column)?;
            let comma = if i + 1 < model.columns.len() { "," } else { "" };
            lines.push(format!("  {} AS {}{}", expr, column.name, comma));
        }

        lines.push(format!("FROM {} T", primary));

        for fk in &model.relationships {
            let ref_alias = self.alias_of(model, &aliases, fk.references_table.as_str())?;
            let local_table = model
                .source_table_for_column(&fk.local_column)
                .unwrap_or(primary);
            let local_alias = self.alias_of(model, &aliases, local_table)?;
            lines.push(format!(
                "{} JOIN {} {} ON {}.{} = {}.{}",
                fk.join_type.sql_keyword(),
                fk.references_table,
                ref_alias,
                local_alias,
                fk.local_column,
                ref_alias,
                fk.references_column,
            ));
        }

        if !model.filters.is_empty() {
            lines.push("WHERE".to_string());
            for (i, filter) in model.filters.iter().enumerate() {
                let condition = self.expand_macros(model, &filter.condition)?;
                let condition = substitute_aliases(&condition, &aliases);
                let suffix = if i + 1 < model.filters.len() { " AND" } else { "" };
                lines.push(format!("  {}{}", condition, suffix));
            }
        }

        if !model.group_by.is_empty() {
            lines.push(format!("GROUP BY {}", model.group_by.join(", ")));
        }
        if !model.having.is_empty() {
            let rendered: Vec<String> = model
                .having
                .iter()
                .map(|h| self.expand_macros(model, h))
                .collect::<SqlResult<_>>()?;
            lines.push(format!("HAVING {}", rendered.join(" AND ")));
        }

        Ok(lines.join("\n"))
    }

    /// The alias map (see [`st_core::alias`]) is computed once per model and
    /// is the single source of truth for column qualification.
    fn alias_map(&self, model: &Model) -> SqlResult<BTreeMap<String, String>> {
        st_core::alias::alias_map(model).ok_or_else(|| SqlError::MissingSource {
            model: model.name.to_string(),
        })
    }

    fn alias_of(
        &self,
        model: &Model,
        aliases: &BTreeMap<String, String>,
        table: &str,
    ) -> SqlResult<String> {
        aliases
            .get(table)
            .cloned()
            .ok_or_else(|| SqlError::MissingAlias {
                model: model.name.to_string(),
                table: table.to_string(),
            })
    }

    /// Render one column expression.
    ///
    /// Empty expression: identity mapping, `<alias>.<name>`. A lone bareword
    /// qualifies the same way. Anything else is emitted verbatim after macro
    /// expansion and table-name -> alias substitution.
    fn render_expression(
        &self,
        model: &Model,
        aliases: &BTreeMap<String, String>,
        column: &ColumnSpec,
    ) -> SqlResult<String> {
        let alias = self.alias_of(model, aliases, column.reference_table.as_str())?;

        if column.is_identity() {
            return Ok(format!("{}.{}", alias, column.name));
        }

        let expanded = self.expand_macros(model, column.expression.trim())?;
        if is_bareword(&expanded) {
            return Ok(format!("{}.{}", alias, expanded));
        }
        Ok(substitute_aliases(&expanded, aliases))
    }

    /// Expand `@name(args)` placeholder invocations through the dialect.
    fn expand_macros(&self, model: &Model, fragment: &str) -> SqlResult<String> {
        if !fragment.contains('@') {
            return Ok(fragment.to_string());
        }

        let chars: Vec<char> = fragment.chars().collect();
        let mut out = String::with_capacity(fragment.len());
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '\'' => {
                    // Copy string literals untouched
                    let end = find_literal_end(&chars, i);
                    out.extend(&chars[i..end]);
                    i = end;
                }
                '@' => {
                    let name_start = i + 1;
                    let mut j = name_start;
                    while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                        j += 1;
                    }
                    let name: String = chars[name_start..j].iter().collect();
                    if name.is_empty() || chars.get(j) != Some(&'(') {
                        return Err(SqlError::MalformedMacro {
                            model: model.name.to_string(),
                            fragment: fragment.to_string(),
                        });
                    }
                    let close = find_closing_paren(&chars, j).ok_or_else(|| {
                        SqlError::MalformedMacro {
                            model: model.name.to_string(),
                            fragment: fragment.to_string(),
                        }
                    })?;
                    let args: String = chars[j + 1..close].iter().collect();
                    let expansion = self
                        .dialect
                        .expand_macro(&name, &args)
                        .ok_or_else(|| SqlError::UnsupportedMacro {
                            name: name.clone(),
                            dialect: self.dialect.name().to_string(),
                        })?;
                    out.push_str(&expansion);
                    i = close + 1;
                }
                c => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        Ok(out)
    }
}

/// Replace `table.` prefixes with `alias.` at word boundaries, longest
/// table names first so qualified externals don't get clipped.
fn substitute_aliases(fragment: &str, aliases: &BTreeMap<String, String>) -> String {
    let mut tables: Vec<(&String, &String)> = aliases.iter().collect();
    tables.sort_by_key(|(table, _)| std::cmp::Reverse(table.len()));

    let mut result = fragment.to_string();
    for (table, alias) in tables {
        let pattern = format!("{}.", table);
        let replacement = format!("{}.", alias);
        result = replace_at_boundaries(&result, &pattern, &replacement);
    }
    result
}

/// Replace `pattern` with `replacement` wherever the preceding character is
/// not part of an identifier or qualified name.
fn replace_at_boundaries(haystack: &str, pattern: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(pos) = rest.find(pattern) {
        let boundary = pos == 0
            || rest[..pos]
                .chars()
                .next_back()
                .is_some_and(|c| !c.is_alphanumeric() && c != '_' && c != '.');
        out.push_str(&rest[..pos]);
        if boundary {
            out.push_str(replacement);
        } else {
            out.push_str(pattern);
        }
        rest = &rest[pos + pattern.len()..];
    }
    out.push_str(rest);
    out
}

/// `true` for a lone identifier (no operators, no qualification, no call).
fn is_bareword(fragment: &str) -> bool {
    let mut chars = fragment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Indent every line by two spaces.
fn indent(body: &str) -> String {
    body.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn find_literal_end(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    i
}

fn find_closing_paren(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
