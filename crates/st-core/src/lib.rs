//! st-core - Core library for Strata
//!
//! This crate provides the model IR, definition-file loading and merging,
//! corpus validation, dependency resolution, expression analysis, model
//! fingerprints, and the per-environment state store and planner.

pub mod alias;
pub mod dag;
pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod fingerprint;
pub mod lineage;
pub mod loader;
pub mod merge;
pub mod model;
mod model_name;
mod newtype_string;
pub mod plan;
pub mod settings;
pub mod state;
mod table_name;
pub mod validator;

pub use dag::DependencyGraph;
pub use diagnostics::{Diagnostic, Severity};
pub use error::{CoreError, CoreResult};
pub use loader::{load_models, LoadResult};
pub use model::Model;
pub use model_name::ModelName;
pub use plan::{ApplyMode, ApplyOutcome, Change, ChangeKind, Plan, Planner};
pub use settings::{DialectKind, Settings};
pub use state::{Snapshot, StateStore};
pub use table_name::TableName;
