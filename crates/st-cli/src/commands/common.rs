//! Shared command plumbing: the load -> validate -> resolve pipeline and
//! exit-code mapping.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::ExitCode;

use st_core::diagnostics::{error_count, has_errors, Severity};
use st_core::{CoreError, DependencyGraph, Diagnostic, Model, ModelName};

use crate::cli::GlobalArgs;

/// A loaded, validated, resolved corpus.
pub struct LoadedCorpus {
    /// Frozen model IR
    pub models: BTreeMap<ModelName, Model>,

    /// Resolved dependency graph
    pub dag: DependencyGraph,

    /// Every load and validation diagnostic, reporting order
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the front half of the pipeline: load, validate, resolve.
///
/// Diagnostics are printed to stderr in deterministic order. Error-severity
/// diagnostics halt the pipeline before resolution; a dependency cycle
/// surfaces as [`CoreError::CircularDependency`].
pub fn load_corpus(root: &Path, strict: bool) -> Result<LoadedCorpus> {
    let loaded = st_core::load_models(root)?;
    let mut diagnostics = loaded.diagnostics;
    diagnostics.extend(st_core::validator::validate(&loaded.models));
    st_core::diagnostics::sort_diagnostics(&mut diagnostics);

    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }

    let blocking = if strict {
        diagnostics.len()
    } else {
        error_count(&diagnostics)
    };
    if strict && !diagnostics.is_empty() || has_errors(&diagnostics) {
        return Err(CoreError::ValidationFailed { count: blocking }.into());
    }

    let dag = DependencyGraph::build(&loaded.models)?;

    Ok(LoadedCorpus {
        models: loaded.models,
        dag,
        diagnostics,
    })
}

/// Convenience wrapper using the global `--root`.
pub fn load_corpus_from(global: &GlobalArgs) -> Result<LoadedCorpus> {
    load_corpus(&global.root, false)
}

/// Count warnings in a diagnostic list.
pub fn warning_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count()
}

/// Map a failed run to the documented exit codes:
/// 1 validation, 2 cycle, 3 snapshot conflict, 4 I/O, 5 unknown dialect.
pub fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    if let Some(core) = error.downcast_ref::<CoreError>() {
        let code = match core {
            CoreError::ValidationFailed { .. } => 1,
            CoreError::CircularDependency { .. } => 2,
            CoreError::SnapshotExists { .. }
            | CoreError::SnapshotMalformed { .. }
            | CoreError::StateLocked { .. } => 3,
            CoreError::RootNotFound { .. }
            | CoreError::Io(_)
            | CoreError::IoWithPath { .. }
            | CoreError::YamlParse(_)
            | CoreError::Json(_) => 4,
            CoreError::UnknownDialect { .. } | CoreError::UnknownApplyMode { .. } => 5,
        };
        return ExitCode::from(code);
    }
    if error.downcast_ref::<st_sql::SqlError>().is_some() {
        return ExitCode::from(1);
    }
    if error.downcast_ref::<std::io::Error>().is_some() {
        return ExitCode::from(4);
    }
    ExitCode::from(1)
}
