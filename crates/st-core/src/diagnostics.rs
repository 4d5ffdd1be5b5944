//! Diagnostic records accumulated by the loader and validator.
//!
//! Both stages collect every issue they find instead of stopping at the
//! first; the pipeline halts before generation only if any error-severity
//! diagnostic exists.

use serde::Serialize;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Generation proceeds
    Warning,
    /// Blocks generation
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single load or validation issue.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    /// Issue severity
    pub severity: Severity,

    /// Model the issue belongs to (or the file name for load issues)
    pub model: String,

    /// Offending field path, e.g. `columns[3].reference_table`; empty when
    /// the issue is not tied to a field
    pub path: String,

    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(model: impl Into<String>, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            model: model.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a warning diagnostic.
    pub fn warning(
        model: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            model: model.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.path.is_empty() {
            write!(f, "[{}] {}: {}", self.severity, self.model, self.message)
        } else {
            write!(
                f,
                "[{}] {}: {}: {}",
                self.severity, self.model, self.path, self.message
            )
        }
    }
}

/// Sort diagnostics into the deterministic reporting order:
/// model name, then field path, then severity (errors first).
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.model
            .cmp(&b.model)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| b.severity.cmp(&a.severity))
    });
}

/// `true` if any diagnostic is error severity.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.severity == Severity::Error)
}

/// Count of error-severity diagnostics.
pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_model_then_path() {
        let mut diags = vec![
            Diagnostic::warning("b_model", "columns[0]", "w"),
            Diagnostic::error("a_model", "grain[1]", "e"),
            Diagnostic::error("a_model", "columns[2]", "e"),
        ];
        sort_diagnostics(&mut diags);
        assert_eq!(diags[0].model, "a_model");
        assert_eq!(diags[0].path, "columns[2]");
        assert_eq!(diags[1].path, "grain[1]");
        assert_eq!(diags[2].model, "b_model");
    }

    #[test]
    fn test_has_errors() {
        let diags = vec![Diagnostic::warning("m", "", "w")];
        assert!(!has_errors(&diags));
        let diags = vec![
            Diagnostic::warning("m", "", "w"),
            Diagnostic::error("m", "", "e"),
        ];
        assert!(has_errors(&diags));
        assert_eq!(error_count(&diags), 1);
    }

    #[test]
    fn test_display_includes_path() {
        let d = Diagnostic::error("m", "columns[3].reference_table", "not found");
        assert_eq!(
            d.to_string(),
            "[ERROR] m: columns[3].reference_table: not found"
        );
    }
}
