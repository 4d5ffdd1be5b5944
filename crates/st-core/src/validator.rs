//! Cross-model and cross-column validation.
//!
//! Runs every invariant across the whole corpus without short-circuiting and
//! accumulates diagnostics. Error-severity diagnostics block generation;
//! warnings do not.

use crate::diagnostics::Diagnostic;
use crate::expr;
use crate::model::{Audit, Model, ModelKind};
use crate::model_name::ModelName;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Data types accepted by numeric-only audits (prefix match so that
/// parametrized spellings like `DECIMAL(18,2)` qualify).
const NUMERIC_TYPE_PREFIXES: &[&str] = &[
    "INT", "BIGINT", "SMALLINT", "TINYINT", "DECIMAL", "NUMERIC", "FLOAT", "DOUBLE", "REAL",
];

/// Validate the whole corpus, returning diagnostics sorted by model name
/// then field path.
pub fn validate(models: &BTreeMap<ModelName, Model>) -> Vec<Diagnostic> {
    let mut ctx = Context::new(models);

    for model in models.values() {
        ctx.check_dependencies(model);
        ctx.check_reference_tables(model);
        ctx.check_cte_refs(model);
        ctx.check_output_membership(model);
        ctx.check_aggregations(model);
        ctx.check_audits(model);
        ctx.check_column_expressions(model);
        ctx.check_optimization(model);
    }

    let mut diagnostics = ctx.diagnostics;
    crate::diagnostics::sort_diagnostics(&mut diagnostics);
    diagnostics
}

struct Context<'a> {
    models: &'a BTreeMap<ModelName, Model>,
    /// Output columns per corpus model, for cross-checks
    output_columns: BTreeMap<&'a str, BTreeSet<&'a str>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Context<'a> {
    fn new(models: &'a BTreeMap<ModelName, Model>) -> Self {
        let output_columns = models
            .iter()
            .map(|(name, model)| {
                (
                    name.as_str(),
                    model.columns.iter().map(|c| c.name.as_str()).collect(),
                )
            })
            .collect();
        Self {
            models,
            output_columns,
            diagnostics: Vec::new(),
        }
    }

    fn error(&mut self, model: &Model, path: String, message: String) {
        self.diagnostics
            .push(Diagnostic::error(model.name.as_str(), path, message));
    }

    fn warning(&mut self, model: &Model, path: String, message: String) {
        self.diagnostics
            .push(Diagnostic::warning(model.name.as_str(), path, message));
    }

    /// `true` for schema-qualified names that live outside the corpus.
    fn is_external(name: &str) -> bool {
        name.contains('.')
    }

    /// Every dependency must be a corpus model or an external table; no
    /// self-references.
    fn check_dependencies(&mut self, model: &Model) {
        for (i, dep) in model.depends_on.iter().enumerate() {
            let path = format!("source.depends_on_tables[{}]", i);
            if dep == model.name.as_str() {
                self.error(model, path, "model depends on itself".to_string());
                continue;
            }
            if !self.models.contains_key(dep.as_str()) && !Self::is_external(dep) {
                let suggestion = suggest_similar(dep, self.models.keys().map(|k| k.as_str()));
                self.error(
                    model,
                    path,
                    with_suggestion(format!("dependency '{}' not found", dep), suggestion),
                );
            }
        }
    }

    /// Tables named by columns, filters, and relationships must be reachable
    /// through `depends_on` or `base_table`.
    fn check_reference_tables(&mut self, model: &Model) {
        let valid = self.valid_reference_tables(model);

        for (i, column) in model.columns.iter().enumerate() {
            self.check_reference(
                model,
                &valid,
                column.reference_table.as_str(),
                format!("columns[{}].reference_table", i),
            );
        }
        for (i, filter) in model.filters.iter().enumerate() {
            self.check_reference(
                model,
                &valid,
                filter.reference_table.as_str(),
                format!("filters[{}].reference_table", i),
            );
        }
        for (i, fk) in model.relationships.iter().enumerate() {
            self.check_reference(
                model,
                &valid,
                fk.references_table.as_str(),
                format!("relationships[{}].references_table", i),
            );
        }
    }

    fn valid_reference_tables<'m>(&self, model: &'m Model) -> HashSet<&'m str> {
        let mut valid: HashSet<&str> = model.depends_on.iter().map(String::as_str).collect();
        if let Some(base) = model.base_table.as_deref() {
            valid.insert(base);
        }
        valid
    }

    fn check_reference(
        &mut self,
        model: &Model,
        valid: &HashSet<&str>,
        table: &str,
        path: String,
    ) {
        if valid.contains(table) {
            return;
        }
        let suggestion = suggest_similar(table, valid.iter().copied());
        self.error(
            model,
            path,
            with_suggestion(
                format!(
                    "table '{}' is not the base table and not listed in depends_on_tables",
                    table
                ),
                suggestion,
            ),
        );
    }

    /// Every `cte_refs` member must be a CTE-kind corpus model listed in
    /// `depends_on`.
    fn check_cte_refs(&mut self, model: &Model) {
        for (i, cte) in model.cte_refs.iter().enumerate() {
            let path = format!("ctes[{}]", i);
            match self.models.get(cte.as_str()) {
                None => {
                    self.error(model, path, format!("CTE model '{}' not found", cte));
                }
                Some(target) if target.kind != ModelKind::Cte => {
                    let kind = target.kind;
                    self.error(
                        model,
                        path,
                        format!("'{}' is referenced as a CTE but has kind {}", cte, kind),
                    );
                }
                Some(_) => {
                    if !model.depends_on.iter().any(|d| d == cte.as_str()) {
                        self.error(
                            model,
                            path,
                            format!("CTE '{}' must be listed in depends_on_tables", cte),
                        );
                    }
                }
            }
        }
    }

    /// Grain, audit columns, and relationship local columns must name output
    /// columns.
    fn check_output_membership(&mut self, model: &Model) {
        let outputs: BTreeSet<&str> = model.columns.iter().map(|c| c.name.as_str()).collect();

        for (i, grain_col) in model.grain.iter().enumerate() {
            if !outputs.contains(grain_col.as_str()) {
                let suggestion = suggest_similar(grain_col, outputs.iter().copied());
                self.error(
                    model,
                    format!("grain[{}]", i),
                    with_suggestion(
                        format!("grain column '{}' is not an output column", grain_col),
                        suggestion,
                    ),
                );
            }
        }

        for (i, audit) in model.audits.iter().enumerate() {
            for column in audit.columns() {
                if !outputs.contains(column) {
                    self.error(
                        model,
                        format!("audits[{}].columns", i),
                        format!(
                            "{} audit references '{}' which is not an output column",
                            audit.type_name(),
                            column
                        ),
                    );
                }
            }
        }

        for (i, fk) in model.relationships.iter().enumerate() {
            if !outputs.contains(fk.local_column.as_str()) {
                self.error(
                    model,
                    format!("relationships[{}].local_column", i),
                    format!(
                        "local column '{}' is not an output column",
                        fk.local_column
                    ),
                );
            }
        }
    }

    /// Aggregate columns require a GROUP BY covering every non-aggregate
    /// output; HAVING may reference only outputs or declared aggregates.
    fn check_aggregations(&mut self, model: &Model) {
        let outputs: BTreeSet<&str> = model.columns.iter().map(|c| c.name.as_str()).collect();

        for (i, group_col) in model.group_by.iter().enumerate() {
            if !outputs.contains(group_col.as_str()) {
                self.error(
                    model,
                    format!("aggregations.group_by[{}]", i),
                    format!("group_by column '{}' is not an output column", group_col),
                );
            }
        }

        let aggregate_exprs: Vec<&str> = model
            .columns
            .iter()
            .filter(|c| !c.is_identity() && expr::is_aggregate_expression(&c.expression))
            .map(|c| c.expression.as_str())
            .collect();

        if !aggregate_exprs.is_empty() {
            if model.group_by.is_empty() {
                self.error(
                    model,
                    "aggregations.group_by".to_string(),
                    "model has aggregate columns but group_by is empty".to_string(),
                );
            } else {
                for column in &model.columns {
                    let is_aggregate =
                        !column.is_identity() && expr::is_aggregate_expression(&column.expression);
                    if !is_aggregate && !model.group_by.iter().any(|g| g == &column.name) {
                        self.error(
                            model,
                            "aggregations.group_by".to_string(),
                            format!(
                                "non-aggregate column '{}' must appear in group_by",
                                column.name
                            ),
                        );
                    }
                }
            }
        }

        for (i, predicate) in model.having.iter().enumerate() {
            // Strip declared aggregate expressions, then every remaining
            // identifier must be an output column.
            let mut remainder = predicate.clone();
            for agg in &aggregate_exprs {
                remainder = remainder.replace(*agg, "");
            }
            let info = expr::analyze(&remainder);
            for column in &info.referenced_columns {
                if !outputs.contains(column.as_str()) {
                    self.error(
                        model,
                        format!("aggregations.having[{}]", i),
                        format!(
                            "having predicate references '{}', which is neither an output column nor a declared aggregate expression",
                            column
                        ),
                    );
                }
            }
        }
    }

    /// Audit-specific rules: non-empty literal lists, numeric column types.
    fn check_audits(&mut self, model: &Model) {
        for (i, audit) in model.audits.iter().enumerate() {
            if let Audit::AcceptedValues { values } = audit {
                for (column, literals) in values {
                    if literals.is_empty() {
                        self.error(
                            model,
                            format!("audits[{}].values", i),
                            format!("ACCEPTED_VALUES for '{}' allows no literals", column),
                        );
                    }
                }
            }

            if audit.requires_numeric_columns() {
                for column in audit.columns() {
                    let Some(spec) = model.column(column) else {
                        continue;
                    };
                    if spec.data_type.is_empty() {
                        continue;
                    }
                    let upper = spec.data_type.to_ascii_uppercase();
                    let numeric = NUMERIC_TYPE_PREFIXES
                        .iter()
                        .any(|p| upper.starts_with(p));
                    if !numeric {
                        self.warning(
                            model,
                            format!("audits[{}].columns", i),
                            format!(
                                "{} audit on '{}' with non-numeric type {}",
                                audit.type_name(),
                                column,
                                spec.data_type
                            ),
                        );
                    }
                }
            }
        }
    }

    /// Cross-check expression column references against the referenced
    /// model's outputs; warn on unknown columns and unknown aliases.
    fn check_column_expressions(&mut self, model: &Model) {
        let mut warned_external: BTreeSet<String> = BTreeSet::new();
        let allowed_qualifiers = self.allowed_qualifiers(model);

        for (i, column) in model.columns.iter().enumerate() {
            let table = column.reference_table.as_str();

            if Self::is_external(table) {
                if warned_external.insert(table.to_string()) {
                    self.warning(
                        model,
                        format!("columns[{}].reference_table", i),
                        format!(
                            "external table '{}' is not exposed by any model; columns cannot be cross-checked",
                            table
                        ),
                    );
                }
                continue;
            }

            let Some(available) = self.output_columns.get(table).cloned() else {
                // Unresolvable reference already reported as an error
                continue;
            };

            let referenced: Vec<String> = if column.is_identity() {
                vec![column.name.clone()]
            } else {
                expr::analyze(&column.expression)
                    .referenced_columns
                    .into_iter()
                    .collect()
            };

            for reference in referenced {
                if !available.contains(reference.as_str()) {
                    let mut list: Vec<&str> = available.iter().copied().collect();
                    list.sort();
                    let suggestion = suggest_similar(&reference, list.iter().copied());
                    self.warning(
                        model,
                        format!("columns[{}].expression", i),
                        with_suggestion(
                            format!(
                                "column {} not present in {}; available: [{}]",
                                reference,
                                table,
                                list.join(", ")
                            ),
                            suggestion,
                        ),
                    );
                }
            }

            if !column.is_identity() {
                let info = expr::analyze(&column.expression);
                for qualifier in info.qualifiers {
                    if !allowed_qualifiers.contains(qualifier.as_str()) {
                        self.warning(
                            model,
                            format!("columns[{}].expression", i),
                            format!(
                                "alias '{}' is not introduced by the base table or a foreign key",
                                qualifier
                            ),
                        );
                    }
                }
            }
        }
    }

    /// Qualifiers an expression may legitimately use: any dependency or base
    /// table (including each dot segment of external names), any table a
    /// foreign key joins in, and the short aliases the generator assigns
    /// to those tables (`T`, `A`, ...).
    fn allowed_qualifiers(&self, model: &Model) -> BTreeSet<String> {
        let mut allowed = BTreeSet::new();
        let mut add = |name: &str| {
            allowed.insert(name.to_string());
            for segment in name.split('.') {
                allowed.insert(segment.to_string());
            }
        };
        for dep in &model.depends_on {
            add(dep);
        }
        if let Some(base) = model.base_table.as_deref() {
            add(base);
        }
        for fk in &model.relationships {
            add(fk.references_table.as_str());
        }
        if let Some(aliases) = crate::alias::alias_map(model) {
            for alias in aliases.values() {
                allowed.insert(alias.clone());
            }
        }
        allowed
    }

    /// CTE-kind models cannot carry physical layout hints.
    fn check_optimization(&mut self, model: &Model) {
        if model.kind == ModelKind::Cte && model.optimization.is_some() {
            self.error(
                model,
                "optimization".to_string(),
                "CTE models cannot declare optimization hints".to_string(),
            );
        }
    }
}

/// Append a `did you mean` hint when a close candidate exists.
fn with_suggestion(message: String, suggestion: Option<String>) -> String {
    match suggestion {
        Some(s) => format!("{}; did you mean '{}'?", message, s),
        None => message,
    }
}

/// Pick the closest candidate to `target`: case-insensitive match, then
/// substring containment, then positional character overlap above 60%.
fn suggest_similar<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    let target_lower = target.to_lowercase();
    let mut best: Option<(f64, &str)> = None;

    for candidate in candidates {
        let candidate_lower = candidate.to_lowercase();
        if candidate_lower == target_lower {
            return Some(candidate.to_string());
        }
        if candidate_lower.contains(&target_lower) || target_lower.contains(&candidate_lower) {
            return Some(candidate.to_string());
        }
        let common = target_lower
            .chars()
            .zip(candidate_lower.chars())
            .filter(|(a, b)| a == b)
            .count();
        let score = common as f64 / target_lower.len().max(candidate_lower.len()) as f64;
        if score > 0.6 && best.map_or(true, |(s, _)| score > s) {
            best = Some((score, candidate));
        }
    }

    best.map(|(_, c)| c.to_string())
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
