//! Per-environment deployment state.
//!
//! A snapshot mirrors the validated IR at apply time: one record per model
//! with its columns, dependencies, and the three fingerprints. Snapshots are
//! stored as JSON at `<state_dir>/<env>.state`, written atomically, and
//! guarded by an advisory lock file during apply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::fingerprint;
use crate::model::{Layer, Model, ModelKind};
use crate::model_name::ModelName;

/// A persisted snapshot of one environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When this snapshot was written
    pub updated_at: DateTime<Utc>,

    /// One record per model, keyed by name
    pub models: BTreeMap<ModelName, ModelRecord>,
}

/// Snapshot record for a single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Model name
    pub name: ModelName,

    /// Medallion layer
    pub layer: Layer,

    /// Materialization kind
    pub kind: ModelKind,

    /// Upstream models and external tables
    pub dependencies: Vec<String>,

    /// Output columns
    pub columns: Vec<ColumnRecord>,

    /// Fingerprint over the value-producing subset
    pub logic_hash: String,

    /// Fingerprint over the output shape
    pub schema_hash: String,

    /// Fingerprint over descriptive attributes
    pub metadata_hash: String,
}

/// Snapshot record for a single output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRecord {
    /// Column name
    pub name: String,

    /// Column description
    #[serde(default)]
    pub description: String,

    /// Whether the column may be null
    pub nullable: bool,

    /// Declared data type
    #[serde(rename = "type")]
    pub data_type: String,
}

impl Snapshot {
    /// Capture the current IR as a snapshot.
    pub fn capture(models: &BTreeMap<ModelName, Model>) -> CoreResult<Self> {
        let mut records = BTreeMap::new();
        for (name, model) in models {
            records.insert(name.clone(), ModelRecord::capture(model)?);
        }
        Ok(Self {
            updated_at: Utc::now(),
            models: records,
        })
    }

    /// Name -> dependency list view, for graph reconstruction.
    pub fn dependency_lists(&self) -> BTreeMap<String, Vec<String>> {
        self.models
            .iter()
            .map(|(name, record)| (name.to_string(), record.dependencies.clone()))
            .collect()
    }
}

impl ModelRecord {
    /// Capture one model's record, fingerprints included.
    pub fn capture(model: &Model) -> CoreResult<Self> {
        let prints = fingerprint::fingerprint(model)?;
        Ok(Self {
            name: model.name.clone(),
            layer: model.layer,
            kind: model.kind,
            dependencies: model.depends_on.clone(),
            columns: model
                .columns
                .iter()
                .map(|c| ColumnRecord {
                    name: c.name.clone(),
                    description: c.description.clone(),
                    nullable: true,
                    data_type: c.data_type.clone(),
                })
                .collect(),
            logic_hash: prints.logic_hash,
            schema_hash: prints.schema_hash,
            metadata_hash: prints.metadata_hash,
        })
    }
}

/// Filesystem-backed store of environment snapshots.
#[derive(Debug, Clone)]
pub struct StateStore {
    base_dir: PathBuf,
}

impl StateStore {
    /// Create a store rooted at `base_dir` (created lazily on save).
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Path of the snapshot file for an environment.
    pub fn state_path(&self, env: &str) -> PathBuf {
        self.base_dir.join(format!("{}.state", env))
    }

    fn lock_path(&self, env: &str) -> PathBuf {
        self.base_dir.join(format!("{}.state.lock", env))
    }

    /// `true` if a snapshot exists for the environment.
    pub fn exists(&self, env: &str) -> bool {
        self.state_path(env).exists()
    }

    /// Load the snapshot for an environment, `None` if absent.
    ///
    /// A malformed snapshot is a fatal error; it is never overwritten.
    pub fn load(&self, env: &str) -> CoreResult<Option<Snapshot>> {
        let path = self.state_path(env);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let snapshot =
            serde_json::from_str(&content).map_err(|e| CoreError::SnapshotMalformed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(snapshot))
    }

    /// Save a snapshot atomically.
    ///
    /// Uses write-to-temp-then-rename so a partial write can never leave the
    /// file corrupt. The temp name includes the PID to avoid races between
    /// concurrent processes.
    pub fn save(&self, env: &str, snapshot: &Snapshot) -> CoreResult<()> {
        let path = self.state_path(env);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let temp_path = path.with_extension(format!("state.{}.tmp", std::process::id()));
        let json = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&temp_path, &json).map_err(|e| CoreError::IoWithPath {
            path: temp_path.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&temp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }
        })?;
        Ok(())
    }

    /// Take the advisory lock for an environment, failing fast if another
    /// process holds it. The lock releases on drop.
    pub fn lock(&self, env: &str) -> CoreResult<StateLock> {
        let path = self.lock_path(env);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(StateLock { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(CoreError::StateLocked {
                    env: env.to_string(),
                    path: path.display().to_string(),
                })
            }
            Err(e) => Err(CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }
}

/// Held advisory lock; the lock file is removed on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    /// Path of the lock file (for error reporting).
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
