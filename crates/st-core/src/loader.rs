//! Definition file discovery, partial-file merging, and typed parsing.
//!
//! Emits a name -> Model mapping plus accumulated diagnostics. A malformed
//! file fails with a diagnostic while the rest of the corpus keeps loading.

use crate::diagnostics::Diagnostic;
use crate::error::{CoreError, CoreResult};
use crate::merge::merge_documents;
use crate::model::{parse_audits, Audit, Model, ModelFile};
use crate::model_name::ModelName;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Non-model files ignored during discovery.
const SKIP_FILES: &[&str] = &[
    "config.yaml",
    "config.yml",
    "settings.yaml",
    "settings.yml",
];

/// Recognized top-level sections of a definition file.
const KNOWN_SECTIONS: &[&str] = &[
    "model",
    "source",
    "transformations",
    "filters",
    "ctes",
    "aggregations",
    "audits",
    "grain",
    "relationships",
    "optimization",
];

/// Known fields per section, used for unknown-field warnings.
/// The `audits` section checks its own fields during coercion.
const SECTION_FIELDS: &[(&str, &[&str])] = &[
    (
        "model",
        &[
            "name",
            "description",
            "layer",
            "kind",
            "owner",
            "tags",
            "domain",
            "refresh_frequency",
        ],
    ),
    ("source", &["base_table", "depends_on_tables"]),
    ("transformations", &["columns"]),
    ("filters", &["where_conditions"]),
    ("ctes", &["ctes"]),
    ("aggregations", &["group_by", "having"]),
    ("relationships", &["foreign_keys"]),
    ("optimization", &["partitioned_by", "clustered_by", "indexes"]),
];

/// Result of loading a model root.
#[derive(Debug)]
pub struct LoadResult {
    /// Successfully loaded models, keyed by name
    pub models: BTreeMap<ModelName, Model>,

    /// Accumulated load diagnostics (file errors and unknown-field warnings)
    pub diagnostics: Vec<Diagnostic>,
}

/// Load every model definition under `root`.
pub fn load_models(root: &Path) -> CoreResult<LoadResult> {
    if !root.is_dir() {
        return Err(CoreError::RootNotFound {
            path: root.display().to_string(),
        });
    }

    let mut files = Vec::new();
    discover_files(root, &mut files)?;

    let mut result = LoadResult {
        models: BTreeMap::new(),
        diagnostics: Vec::new(),
    };

    for (group_key, mut group) in group_partials(files) {
        group.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        load_group(&group_key, &group, &mut result);
    }

    Ok(result)
}

/// Recursively collect definition files, skipping hidden entries and
/// well-known non-model files.
fn discover_files(dir: &Path, files: &mut Vec<PathBuf>) -> CoreResult<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }
        if path.is_dir() {
            discover_files(&path, files)?;
            continue;
        }
        if !path
            .extension()
            .is_some_and(|e| e == "yml" || e == "yaml")
        {
            continue;
        }
        if SKIP_FILES.contains(&file_name.to_ascii_lowercase().as_str()) {
            log::debug!("Skipping non-model file: {}", path.display());
            continue;
        }
        files.push(path);
    }
    Ok(())
}

/// Group files by directory + stem modulo a `.partN` suffix.
fn group_partials(files: Vec<PathBuf>) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for path in files {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let base = base_stem(stem);
        let key = path
            .parent()
            .map(|p| p.join(base))
            .unwrap_or_else(|| PathBuf::from(base));
        groups.entry(key).or_default().push(path);
    }
    groups
}

/// Strip a trailing `.partN` (N numeric) from a file stem.
fn base_stem(stem: &str) -> &str {
    if let Some((base, part)) = stem.rsplit_once('.') {
        if let Some(digits) = part.strip_prefix("part") {
            if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                return base;
            }
        }
    }
    stem
}

/// Merge and parse one stem group into a model, accumulating diagnostics.
fn load_group(group_key: &Path, group: &[PathBuf], result: &mut LoadResult) {
    let group_name = group_key
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string();

    let mut doc = Value::Null;
    for path in group {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                result.diagnostics.push(Diagnostic::error(
                    &group_name,
                    "",
                    format!("cannot read {}: {}", path.display(), e),
                ));
                return;
            }
        };
        let value: Value = match serde_yaml::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                result.diagnostics.push(Diagnostic::error(
                    &group_name,
                    "",
                    format!("invalid YAML in {}: {}", path.display(), e),
                ));
                return;
            }
        };
        doc = merge_documents(doc, value);
    }

    let Value::Mapping(mut map) = doc else {
        result.diagnostics.push(Diagnostic::error(
            &group_name,
            "",
            "definition file must be a mapping of sections",
        ));
        return;
    };

    // Unknown top-level section fails the file; the corpus continues.
    for key in map.keys() {
        let Some(section) = key.as_str() else {
            result
                .diagnostics
                .push(Diagnostic::error(&group_name, "", "section keys must be strings"));
            return;
        };
        if !KNOWN_SECTIONS.contains(&section) {
            result.diagnostics.push(Diagnostic::error(
                &group_name,
                section,
                format!("unknown top-level section '{}'", section),
            ));
            return;
        }
    }

    let model_name = map
        .get(Value::from("model"))
        .and_then(|m| m.as_mapping())
        .and_then(|m| m.get(Value::from("name")))
        .and_then(Value::as_str)
        .map(String::from)
        .unwrap_or_else(|| group_name.clone());

    warn_unknown_fields(&map, &model_name, &mut result.diagnostics);

    let audits = match map.remove(Value::from("audits")) {
        Some(section) => match parse_audits(&section) {
            Ok(parsed) => {
                for warning in parsed.warnings {
                    result
                        .diagnostics
                        .push(Diagnostic::warning(&model_name, "audits", warning));
                }
                parsed.audits
            }
            Err(message) => {
                result
                    .diagnostics
                    .push(Diagnostic::error(&model_name, "audits", message));
                return;
            }
        },
        None => Vec::<Audit>::new(),
    };

    let file: ModelFile = match serde_yaml::from_value(Value::Mapping(map)) {
        Ok(f) => f,
        Err(e) => {
            result
                .diagnostics
                .push(Diagnostic::error(&model_name, "", e.to_string()));
            return;
        }
    };

    let source_path = group.first().cloned().unwrap_or_default();
    let model = Model::from_file_shape(file, audits, source_path);

    if let Some(existing) = result.models.get(model.name.as_str()) {
        result.diagnostics.push(Diagnostic::error(
            model.name.as_str(),
            "model.name",
            format!(
                "duplicate model name (also defined in {})",
                existing.path.display()
            ),
        ));
        return;
    }
    result.models.insert(model.name.clone(), model);
}

/// Warn on fields inside a section that the format does not recognize.
fn warn_unknown_fields(
    map: &serde_yaml::Mapping,
    model_name: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for (section, known) in SECTION_FIELDS {
        let Some(value) = map.get(Value::from(*section)) else {
            continue;
        };
        let Some(section_map) = value.as_mapping() else {
            // Bare-list sections (ctes, grain) have no fields to check
            continue;
        };
        for key in section_map.keys() {
            let Some(field) = key.as_str() else { continue };
            if !known.contains(&field) {
                diagnostics.push(Diagnostic::warning(
                    model_name,
                    format!("{}.{}", section, field),
                    format!("unknown field '{}' in '{}' section", field, section),
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
