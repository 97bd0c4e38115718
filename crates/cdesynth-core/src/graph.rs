use std::collections::{BTreeSet, HashMap};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Summary of graph structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Directed graph over variable names, keyed by first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    adjacency: IndexMap<String, IndexSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a node exists without adding edges.
    pub fn add_node(&mut self, node: &str) {
        if !self.adjacency.contains_key(node) {
            self.adjacency.insert(node.to_string(), IndexSet::new());
        }
    }

    /// Add an edge `from -> to`, creating both nodes if needed.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(from);
        self.add_node(to);
        if let Some(targets) = self.adjacency.get_mut(from) {
            targets.insert(to.to_string());
        }
    }

    pub fn contains(&self, node: &str) -> bool {
        self.adjacency.contains_key(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &String> {
        self.adjacency.keys()
    }

    pub fn successors(&self, node: &str) -> impl Iterator<Item = &String> {
        self.adjacency.get(node).into_iter().flatten()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&String, &String)> {
        self.adjacency
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.adjacency.len(),
            edges: self.adjacency.values().map(IndexSet::len).sum(),
        }
    }

    /// Topological order of the nodes (Kahn's algorithm).
    ///
    /// Among nodes that are ready at the same time, the one inserted first wins,
    /// so the order is stable for a given insertion sequence. On a cycle, the
    /// nodes that could not be ordered are returned as the error.
    pub fn topo_order(&self) -> Result<Vec<String>, Vec<String>> {
        let position: HashMap<&str, usize> = self
            .adjacency
            .keys()
            .enumerate()
            .map(|(index, node)| (node.as_str(), index))
            .collect();

        let mut indegree: Vec<usize> = vec![0; self.adjacency.len()];
        for targets in self.adjacency.values() {
            for target in targets {
                if let Some(index) = position.get(target.as_str()) {
                    indegree[*index] += 1;
                }
            }
        }

        let mut ready: BTreeSet<usize> = indegree
            .iter()
            .enumerate()
            .filter_map(|(index, count)| if *count == 0 { Some(index) } else { None })
            .collect();

        let mut order = Vec::with_capacity(self.adjacency.len());
        while let Some(index) = ready.pop_first() {
            let Some((node, targets)) = self.adjacency.get_index(index) else {
                continue;
            };
            order.push(node.clone());

            for target in targets {
                if let Some(target_index) = position.get(target.as_str()) {
                    let count = &mut indegree[*target_index];
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(*target_index);
                    }
                }
            }
        }

        if order.len() == self.adjacency.len() {
            Ok(order)
        } else {
            let cycle_nodes = self
                .adjacency
                .keys()
                .zip(indegree)
                .filter_map(|(node, count)| if count > 0 { Some(node.clone()) } else { None })
                .collect();
            Err(cycle_nodes)
        }
    }
}
