//! Deployment planning: diffing the current IR against an environment
//! snapshot and producing an ordered list of changes.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::dag::DependencyGraph;
use crate::error::{CoreError, CoreResult};
use crate::model::Model;
use crate::model_name::ModelName;
use crate::state::{ModelRecord, Snapshot, StateStore};

/// What must happen to one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    /// Present now, absent before
    Add,
    /// Absent now, present before
    DropRemove,
    /// Logic or schema fingerprint moved (or an upstream was rebuilt)
    Replace,
    /// Only the metadata fingerprint moved
    AlterMeta,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeKind::Add => write!(f, "ADD"),
            ChangeKind::DropRemove => write!(f, "DROP"),
            ChangeKind::Replace => write!(f, "REPLACE"),
            ChangeKind::AlterMeta => write!(f, "ALTER_META"),
        }
    }
}

/// One entry of an execution plan.
#[derive(Debug, Clone, Serialize)]
pub struct Change {
    /// Affected model
    pub model: ModelName,

    /// What happens to it
    pub kind: ChangeKind,

    /// `false` when the change only cascades from an upstream rebuild
    pub directly_modified: bool,

    /// Human-readable cause ("logic changed", "upstream 'x' rebuilt", ...)
    pub reason: String,
}

/// An ordered execution plan for one environment.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    /// Target environment
    pub environment: String,

    /// Changes in application order
    pub changes: Vec<Change>,
}

impl Plan {
    /// `true` when nothing has to change.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Entries of a given kind, in plan order.
    pub fn of_kind(&self, kind: ChangeKind) -> Vec<&Change> {
        self.changes.iter().filter(|c| c.kind == kind).collect()
    }

    /// Render the plan as a display tree with a numbered execution order.
    pub fn format_tree(&self) -> String {
        let mut out = Vec::new();
        out.push(format!("Summary of changes for {}:", self.environment));

        if self.is_empty() {
            out.push("  No changes.".to_string());
            return out.join("\n");
        }

        out.push("Models:".to_string());

        let modified: Vec<&Change> = self
            .changes
            .iter()
            .filter(|c| c.directly_modified && matches!(c.kind, ChangeKind::Replace | ChangeKind::AlterMeta))
            .collect();
        let added = self.of_kind(ChangeKind::Add);
        let dropped = self.of_kind(ChangeKind::DropRemove);
        let cascaded: Vec<&Change> = self
            .changes
            .iter()
            .filter(|c| !c.directly_modified)
            .collect();

        let mut section = |title: &str, entries: &[&Change], last: bool| {
            if entries.is_empty() {
                return;
            }
            out.push(format!("{}── {}:", if last { "└" } else { "├" }, title));
            let indent = if last { "    " } else { "│   " };
            for (i, change) in entries.iter().enumerate() {
                let branch = if i + 1 == entries.len() { "└" } else { "├" };
                out.push(format!(
                    "{}{}── {} ({})",
                    indent, branch, change.model, change.reason
                ));
            }
        };

        section("Modified", &modified, false);
        section("New", &added, false);
        section("Deleted", &dropped, false);
        section("Indirectly Modified", &cascaded, true);

        out.push(String::new());
        out.push(format!(
            "Directly Modified: {} models",
            modified.len() + added.len()
        ));
        out.push(format!("Indirectly Modified: {} models", cascaded.len()));

        out.push(String::new());
        out.push("Execution Plan:".to_string());
        for (i, change) in self.changes.iter().enumerate() {
            out.push(format!("{:2}. {} [{}]", i + 1, change.model, change.kind));
        }

        out.join("\n")
    }
}

/// How `apply` commits a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Compute the plan, never write
    DryRun,
    /// Write unconditionally
    Auto,
    /// Emit the plan for external confirmation, write on ack
    Confirm,
}

impl std::str::FromStr for ApplyMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dry-run" | "dry_run" => Ok(ApplyMode::DryRun),
            "auto" => Ok(ApplyMode::Auto),
            "confirm" => Ok(ApplyMode::Confirm),
            other => Err(CoreError::UnknownApplyMode {
                name: other.to_string(),
            }),
        }
    }
}

/// Result of an `apply` call.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Dry run: plan computed, nothing written
    DryRun(Plan),
    /// Confirm mode without an ack: caller must confirm and re-apply
    NeedsConfirmation(Plan),
    /// Snapshot written
    Applied(Plan),
}

/// Plans and applies deployment state for a validated corpus.
pub struct Planner<'a> {
    models: &'a BTreeMap<ModelName, Model>,
    dag: &'a DependencyGraph,
    store: StateStore,
}

impl<'a> Planner<'a> {
    /// Create a planner over the frozen IR and its resolved graph.
    pub fn new(
        models: &'a BTreeMap<ModelName, Model>,
        dag: &'a DependencyGraph,
        store: StateStore,
    ) -> Self {
        Self { models, dag, store }
    }

    /// Snapshot the current IR; fails if the environment already has one.
    pub fn init(&self, env: &str) -> CoreResult<Snapshot> {
        if self.store.exists(env) {
            return Err(CoreError::SnapshotExists {
                env: env.to_string(),
                path: self.store.state_path(env).display().to_string(),
            });
        }
        let _lock = self.store.lock(env)?;
        let snapshot = Snapshot::capture(self.models)?;
        self.store.save(env, &snapshot)?;
        Ok(snapshot)
    }

    /// Load the environment's snapshot, if any.
    pub fn show(&self, env: &str) -> CoreResult<Option<Snapshot>> {
        self.store.load(env)
    }

    /// Diff the current IR against the environment snapshot.
    ///
    /// An absent snapshot is treated as empty, so every model plans as Add.
    pub fn plan(&self, env: &str) -> CoreResult<Plan> {
        let snapshot = self.store.load(env)?;
        let previous = snapshot.map(|s| s.models).unwrap_or_default();
        self.diff(env, &previous)
    }

    /// Apply a freshly computed plan according to `mode`.
    ///
    /// `confirmed` is the external ack for [`ApplyMode::Confirm`]; the other
    /// modes ignore it. A failed write leaves the previous snapshot intact
    /// (saves are atomic).
    pub fn apply(&self, env: &str, mode: ApplyMode, confirmed: bool) -> CoreResult<ApplyOutcome> {
        let plan = self.plan(env)?;
        match mode {
            ApplyMode::DryRun => Ok(ApplyOutcome::DryRun(plan)),
            ApplyMode::Confirm if !confirmed => Ok(ApplyOutcome::NeedsConfirmation(plan)),
            ApplyMode::Auto | ApplyMode::Confirm => {
                let _lock = self.store.lock(env)?;
                let snapshot = Snapshot::capture(self.models)?;
                self.store.save(env, &snapshot)?;
                Ok(ApplyOutcome::Applied(plan))
            }
        }
    }

    /// Compute the ordered change list against a previous record set.
    fn diff(&self, env: &str, previous: &BTreeMap<ModelName, ModelRecord>) -> CoreResult<Plan> {
        let mut changes_by_model: BTreeMap<ModelName, Change> = BTreeMap::new();

        for (name, model) in self.models {
            let current = ModelRecord::capture(model)?;
            let change = match previous.get(name) {
                None => Some(Change {
                    model: name.clone(),
                    kind: ChangeKind::Add,
                    directly_modified: true,
                    reason: "new model".to_string(),
                }),
                Some(prev) => {
                    let logic_moved = prev.logic_hash != current.logic_hash;
                    let schema_moved = prev.schema_hash != current.schema_hash;
                    if logic_moved || schema_moved {
                        let reason = match (logic_moved, schema_moved) {
                            (true, true) => "logic and schema changed",
                            (true, false) => "logic changed",
                            _ => "schema changed",
                        };
                        Some(Change {
                            model: name.clone(),
                            kind: ChangeKind::Replace,
                            directly_modified: true,
                            reason: reason.to_string(),
                        })
                    } else if prev.metadata_hash != current.metadata_hash {
                        Some(Change {
                            model: name.clone(),
                            kind: ChangeKind::AlterMeta,
                            directly_modified: true,
                            reason: "metadata changed".to_string(),
                        })
                    } else {
                        None
                    }
                }
            };
            if let Some(change) = change {
                changes_by_model.insert(name.clone(), change);
            }
        }

        // Rebuilds cascade: every transitive dependent of an added or
        // replaced model is itself replaced. A metadata-only change on a
        // dependent is upgraded to the cascaded replace.
        let rebuild_roots: Vec<ModelName> = changes_by_model
            .values()
            .filter(|c| matches!(c.kind, ChangeKind::Add | ChangeKind::Replace))
            .map(|c| c.model.clone())
            .collect();
        for root in &rebuild_roots {
            for dependent in self.dag.descendants(root) {
                let dependent = ModelName::new(dependent);
                if changes_by_model
                    .get(&dependent)
                    .is_some_and(|c| matches!(c.kind, ChangeKind::Add | ChangeKind::Replace))
                {
                    continue;
                }
                changes_by_model.insert(
                    dependent.clone(),
                    Change {
                        model: dependent,
                        kind: ChangeKind::Replace,
                        directly_modified: false,
                        reason: format!("upstream '{}' rebuilt", root),
                    },
                );
            }
        }

        let positions = self.dag.topo_positions();
        let position = |name: &ModelName| positions.get(name).copied().unwrap_or(usize::MAX);

        let mut rebuilds: Vec<Change> = Vec::new();
        let mut meta: Vec<Change> = Vec::new();
        for change in changes_by_model.into_values() {
            match change.kind {
                ChangeKind::AlterMeta => meta.push(change),
                _ => rebuilds.push(change),
            }
        }
        rebuilds.sort_by_key(|c| position(&c.model));
        meta.sort_by_key(|c| position(&c.model));

        // Drops run dependents-first, ordered by the previous snapshot's
        // graph (the current graph no longer contains those models).
        let current_names: BTreeSet<&str> =
            self.models.keys().map(|k| k.as_str()).collect();
        let dropped: BTreeSet<&ModelName> = previous
            .keys()
            .filter(|name| !current_names.contains(name.as_str()))
            .collect();
        let mut drops: Vec<Change> = Vec::new();
        if !dropped.is_empty() {
            let old_lists: BTreeMap<String, Vec<String>> = previous
                .iter()
                .map(|(name, record)| (name.to_string(), record.dependencies.clone()))
                .collect();
            let old_dag = DependencyGraph::from_dependency_lists(&old_lists)?;
            for name in old_dag.reverse_topological_order() {
                if dropped.contains(&name) {
                    drops.push(Change {
                        model: name,
                        kind: ChangeKind::DropRemove,
                        directly_modified: true,
                        reason: "model removed".to_string(),
                    });
                }
            }
        }

        let mut changes = rebuilds;
        changes.append(&mut meta);
        changes.append(&mut drops);

        Ok(Plan {
            environment: env.to_string(),
            changes,
        })
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
