//! Invocation settings.
//!
//! A frozen record built once by the enclosing shell. Dialect and apply-mode
//! strings are parsed and rejected here, before any pipeline stage runs.

use crate::error::CoreError;
use crate::plan::ApplyMode;
use std::path::PathBuf;

/// Target SQL dialect selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectKind {
    /// Postgres-flavored SQL
    Postgres,
    /// Spark SQL (Delta)
    Spark,
}

impl std::str::FromStr for DialectKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(DialectKind::Postgres),
            "spark" => Ok(DialectKind::Spark),
            other => Err(CoreError::UnknownDialect {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialectKind::Postgres => write!(f, "postgres"),
            DialectKind::Spark => write!(f, "spark"),
        }
    }
}

/// Frozen per-invocation settings.
///
/// Built once by the shell; fields a command does not use keep the
/// defaults from [`Settings::new`].
#[derive(Debug, Clone)]
pub struct Settings {
    /// Model definition root
    pub root: PathBuf,

    /// Directory for emitted SQL artifacts
    pub out_dir: PathBuf,

    /// Target dialect
    pub dialect: DialectKind,

    /// Environment name for state operations
    pub env: String,

    /// How `apply` commits
    pub mode: ApplyMode,

    /// Base directory for per-environment state files
    pub state_dir: PathBuf,
}

impl Settings {
    /// Record with every field at its default for the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            out_dir: PathBuf::from("target/sql"),
            dialect: DialectKind::Postgres,
            env: "dev".to_string(),
            mode: ApplyMode::DryRun,
            state_dir: PathBuf::from(".strata/state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_parsing() {
        assert_eq!("postgres".parse::<DialectKind>().unwrap(), DialectKind::Postgres);
        assert_eq!("spark".parse::<DialectKind>().unwrap(), DialectKind::Spark);
        assert_eq!("SPARK".parse::<DialectKind>().unwrap(), DialectKind::Spark);
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = "duckdb".parse::<DialectKind>().unwrap_err();
        assert!(matches!(err, CoreError::UnknownDialect { .. }));
    }

    #[test]
    fn test_dialect_display() {
        assert_eq!(DialectKind::Postgres.to_string(), "postgres");
        assert_eq!(DialectKind::Spark.to_string(), "spark");
    }
}
