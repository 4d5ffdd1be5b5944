//! st-sql - SQL generation layer for Strata
//!
//! This crate turns validated model IR into dialect-specific SQL: one
//! artifact per materializable model, plus standalone audit statements.

pub mod audit;
pub mod dialect;
pub mod error;
pub mod generator;

pub use audit::{generate_audits, AuditStatement};
pub use dialect::{dialect_for, escape_sql_string, Dialect, PostgresDialect, SparkDialect};
pub use error::{SqlError, SqlResult};
pub use generator::SqlGenerator;
