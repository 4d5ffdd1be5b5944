//! Dependency graph building, cycle detection, and deterministic ordering.

use crate::error::{CoreError, CoreResult};
use crate::model::Model;
use crate::model_name::ModelName;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A directed acyclic graph of model dependencies.
///
/// Edges run from dependency to dependent so topological order yields
/// dependencies first. Only models present in the corpus become nodes;
/// external tables are not part of the graph.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<ModelName, ()>,
    node_map: HashMap<ModelName, NodeIndex>,
}

impl DependencyGraph {
    /// Build and validate the graph for a loaded corpus.
    pub fn build(models: &BTreeMap<ModelName, Model>) -> CoreResult<Self> {
        let deps: BTreeMap<String, Vec<String>> = models
            .iter()
            .map(|(name, model)| (name.to_string(), model.depends_on.clone()))
            .collect();
        Self::from_dependency_lists(&deps)
    }

    /// Build and validate the graph from raw name -> dependencies lists
    /// (used for snapshot-side ordering where no IR exists).
    pub fn from_dependency_lists(deps: &BTreeMap<String, Vec<String>>) -> CoreResult<Self> {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::new();

        for name in deps.keys() {
            let model_name = ModelName::new(name.clone());
            let idx = graph.add_node(model_name.clone());
            node_map.insert(model_name, idx);
        }

        for (name, dependencies) in deps {
            let to = node_map[name.as_str()];
            for dep in dependencies {
                if let Some(&from) = node_map.get(dep.as_str()) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let dag = Self { graph, node_map };
        if let Some(cycle) = dag.find_cycle() {
            return Err(CoreError::CircularDependency {
                cycle: cycle.join(" -> "),
            });
        }
        Ok(dag)
    }

    /// Find one cycle, if any, as an alphabetically sorted member list.
    ///
    /// Detection is Tarjan SCC: any component with more than one member is a
    /// cycle, as is a self-loop. When several cycles exist, the one whose
    /// smallest member sorts first is reported.
    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = Vec::new();

        for component in tarjan_scc(&self.graph) {
            if component.len() > 1 {
                let mut members: Vec<String> = component
                    .iter()
                    .map(|&idx| self.graph[idx].to_string())
                    .collect();
                members.sort();
                cycles.push(members);
            }
        }

        for idx in self.graph.node_indices() {
            if self.graph.find_edge(idx, idx).is_some() {
                cycles.push(vec![self.graph[idx].to_string()]);
            }
        }

        cycles.sort();
        cycles.into_iter().next()
    }

    /// Models in topological order, dependencies first. Ties between
    /// independent models break toward the lexicographically smaller name.
    pub fn topological_order(&self) -> Vec<ModelName> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                (
                    idx,
                    self.graph
                        .edges_directed(idx, petgraph::Direction::Incoming)
                        .count(),
                )
            })
            .collect();

        let mut frontier: BTreeSet<ModelName> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&idx, _)| self.graph[idx].clone())
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(name) = frontier.pop_first() {
            let idx = self.node_map[name.as_str()];
            order.push(name);
            for edge in self.graph.edges_directed(idx, petgraph::Direction::Outgoing) {
                let target = edge.target();
                let degree = in_degree.get_mut(&target).expect("known node");
                *degree -= 1;
                if *degree == 0 {
                    frontier.insert(self.graph[target].clone());
                }
            }
        }

        debug_assert_eq!(order.len(), self.graph.node_count(), "graph validated acyclic");
        order
    }

    /// Models in reverse topological order, dependents first.
    pub fn reverse_topological_order(&self) -> Vec<ModelName> {
        let mut order = self.topological_order();
        order.reverse();
        order
    }

    /// Map from model name to its position in the topological order.
    pub fn topo_positions(&self) -> BTreeMap<ModelName, usize> {
        self.topological_order()
            .into_iter()
            .enumerate()
            .map(|(pos, name)| (name, pos))
            .collect()
    }

    /// Direct dependencies of a model, sorted.
    pub fn dependencies(&self, model: &str) -> Vec<String> {
        self.neighbors(model, petgraph::Direction::Incoming)
    }

    /// Direct dependents of a model, sorted.
    pub fn dependents(&self, model: &str) -> Vec<String> {
        self.neighbors(model, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, model: &str, direction: petgraph::Direction) -> Vec<String> {
        let Some(&idx) = self.node_map.get(model) else {
            return Vec::new();
        };
        let mut result: Vec<String> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| {
                let other = match direction {
                    petgraph::Direction::Incoming => e.source(),
                    petgraph::Direction::Outgoing => e.target(),
                };
                self.graph[other].to_string()
            })
            .collect();
        result.sort();
        result.dedup();
        result
    }

    /// All transitive dependents of a model, sorted.
    pub fn descendants(&self, model: &str) -> Vec<String> {
        self.walk(model, petgraph::Direction::Outgoing)
    }

    /// All transitive dependencies of a model, sorted.
    pub fn ancestors(&self, model: &str) -> Vec<String> {
        self.walk(model, petgraph::Direction::Incoming)
    }

    fn walk(&self, model: &str, direction: petgraph::Direction) -> Vec<String> {
        let Some(&start) = self.node_map.get(model) else {
            return Vec::new();
        };
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            for edge in self.graph.edges_directed(idx, direction) {
                let other = match direction {
                    petgraph::Direction::Incoming => edge.source(),
                    petgraph::Direction::Outgoing => edge.target(),
                };
                if visited.insert(self.graph[other].to_string()) {
                    stack.push(other);
                }
            }
        }
        visited.into_iter().collect()
    }

    /// `true` if the model is a node in the graph.
    pub fn contains(&self, model: &str) -> bool {
        self.node_map.contains_key(model)
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of model nodes.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
