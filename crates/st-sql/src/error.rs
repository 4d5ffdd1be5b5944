//! Error types for st-sql

use thiserror::Error;

/// SQL generation error type.
///
/// Generation fails fast: any of these aborts the stage. Several variants
/// indicate an internal inconsistency that validation should have caught.
#[derive(Error, Debug)]
pub enum SqlError {
    /// G001: Model requested for generation is not in the corpus
    #[error("[G001] Model not found: {name}")]
    ModelNotFound { name: String },

    /// G002: Model has neither a base table nor dependencies
    #[error("[G002] Model '{model}' has no base table and no dependencies; nothing to select from")]
    MissingSource { model: String },

    /// G003: No alias was computed for a referenced table
    #[error("[G003] Model '{model}': no alias for table '{table}' (compiler bug)")]
    MissingAlias { model: String, table: String },

    /// G004: Placeholder macro is not supported by the dialect
    #[error("[G004] Macro '@{name}' is not supported by the {dialect} dialect")]
    UnsupportedMacro { name: String, dialect: String },

    /// G005: Malformed placeholder macro invocation
    #[error("[G005] Model '{model}': malformed macro invocation in '{fragment}'")]
    MalformedMacro { model: String, fragment: String },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
