//! Dependency-graph export for downstream lineage rendering.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dag::DependencyGraph;
use crate::model::Model;
use crate::model_name::ModelName;

/// A node in the flat export.
#[derive(Debug, Serialize)]
pub struct GraphNode {
    pub name: String,
    pub layer: String,
    pub kind: String,
}

/// A dependency edge (`from` feeds `to`).
#[derive(Debug, Serialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Flat nodes-and-edges document.
#[derive(Debug, Serialize)]
pub struct GraphDocument {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// One model entry in the hierarchical export.
#[derive(Debug, Serialize)]
pub struct HierarchicalEntry {
    pub name: String,
    pub kind: String,
    pub dependencies: Vec<String>,
    pub columns: Vec<String>,
}

/// Basic statistics over the dependency graph.
#[derive(Debug, Serialize)]
pub struct GraphStats {
    pub total_models: usize,
    pub total_dependencies: usize,
    pub source_models: Vec<String>,
    pub leaf_models: Vec<String>,
}

/// Build the flat nodes-and-edges document. Nodes sort by name; edges sort
/// by (from, to); external tables appear as edge endpoints only.
pub fn export_nodes_edges(
    models: &BTreeMap<ModelName, Model>,
    dag: &DependencyGraph,
) -> GraphDocument {
    let nodes = models
        .values()
        .map(|m| GraphNode {
            name: m.name.to_string(),
            layer: m.layer.to_string(),
            kind: m.kind.to_string(),
        })
        .collect();

    let mut edges: Vec<GraphEdge> = models
        .values()
        .flat_map(|m| {
            m.depends_on.iter().map(|dep| GraphEdge {
                from: dep.clone(),
                to: m.name.to_string(),
            })
        })
        .collect();
    edges.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));

    debug_assert!(edges.len() >= dag.edge_count());
    GraphDocument { nodes, edges }
}

/// Build the layer -> models document.
pub fn export_hierarchical(
    models: &BTreeMap<ModelName, Model>,
) -> BTreeMap<String, Vec<HierarchicalEntry>> {
    let mut layers: BTreeMap<String, Vec<HierarchicalEntry>> = BTreeMap::new();
    for model in models.values() {
        layers
            .entry(model.layer.to_string())
            .or_default()
            .push(HierarchicalEntry {
                name: model.name.to_string(),
                kind: model.kind.to_string(),
                dependencies: model.depends_on.clone(),
                columns: model.columns.iter().map(|c| c.name.clone()).collect(),
            });
    }
    layers
}

/// Render the corpus as a Graphviz digraph with layer-colored nodes.
pub fn export_dot(models: &BTreeMap<ModelName, Model>) -> String {
    let mut lines = vec![
        "digraph dependencies {".to_string(),
        "  rankdir=LR;".to_string(),
        "  node [shape=box];".to_string(),
    ];

    for model in models.values() {
        let color = match model.layer {
            crate::model::Layer::Bronze => "lightblue",
            crate::model::Layer::Silver => "lightgreen",
            crate::model::Layer::Gold => "lightyellow",
            crate::model::Layer::Cte => "lightgray",
        };
        lines.push(format!(
            "  \"{}\" [fillcolor={}, style=filled, label=\"{}\\n({})\"];",
            model.name, color, model.name, model.layer
        ));
    }

    for model in models.values() {
        for dep in &model.depends_on {
            lines.push(format!("  \"{}\" -> \"{}\";", dep, model.name));
        }
    }

    lines.push("}".to_string());
    lines.join("\n")
}

/// Compute graph statistics over corpus models (external tables excluded).
pub fn graph_stats(models: &BTreeMap<ModelName, Model>, dag: &DependencyGraph) -> GraphStats {
    let mut source_models = Vec::new();
    let mut leaf_models = Vec::new();
    for name in models.keys() {
        if dag.dependencies(name).is_empty() {
            source_models.push(name.to_string());
        }
        if dag.dependents(name).is_empty() {
            leaf_models.push(name.to_string());
        }
    }
    GraphStats {
        total_models: models.len(),
        total_dependencies: dag.edge_count(),
        source_models,
        leaf_models,
    }
}

#[cfg(test)]
#[path = "lineage_test.rs"]
mod tests;
