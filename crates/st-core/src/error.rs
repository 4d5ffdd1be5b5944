//! Error types for st-core

use thiserror::Error;

/// Core error type for Strata
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Model root directory not found
    #[error("[E001] Model root not found: {path}")]
    RootNotFound { path: String },

    /// E002: Validation produced error-severity diagnostics
    #[error("[E002] Validation failed with {count} error(s)")]
    ValidationFailed { count: usize },

    /// E003: Circular dependency detected
    #[error("[E003] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// E004: Snapshot already exists for the environment
    #[error("[E004] Snapshot for environment '{env}' already exists at {path}")]
    SnapshotExists { env: String, path: String },

    /// E005: Snapshot file is malformed; refusing to overwrite
    #[error("[E005] Malformed snapshot at {path}: {message}")]
    SnapshotMalformed { path: String, message: String },

    /// E006: Another process holds the state lock
    #[error("[E006] State for environment '{env}' is locked by another process ({path})")]
    StateLocked { env: String, path: String },

    /// E007: IO error
    #[error("[E007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E008: IO error with file path context
    #[error("[E008] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E009: YAML parse error
    #[error("[E009] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// E010: Unknown SQL dialect requested
    #[error("[E010] Unknown dialect '{name}' (expected one of: postgres, spark)")]
    UnknownDialect { name: String },

    /// E011: Unknown apply mode requested
    #[error("[E011] Unknown apply mode '{name}' (expected one of: dry-run, auto, confirm)")]
    UnknownApplyMode { name: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
