use cdesynth_core::{DependencyGraph, GraphSummary};

use crate::errors::PlanError;
use crate::registry::{BoundRelationship, NO_DEPENDENCY};

/// Relationships in the order they must run, plus the graph they were ordered by.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    steps: Vec<BoundRelationship>,
    graph: DependencyGraph,
}

impl ExecutionPlan {
    pub fn steps(&self) -> &[BoundRelationship] {
        &self.steps
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn summary(&self) -> GraphSummary {
        self.graph.summary()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Relationship names in execution order, duplicates included.
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.name().to_string()).collect()
    }

    pub fn into_steps(self) -> Vec<BoundRelationship> {
        self.steps
    }
}

/// Variable graph with an edge from every dependency to every modified
/// variable of each relationship.
pub fn build_graph(relationships: &[BoundRelationship]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();

    if relationships
        .iter()
        .any(|relationship| relationship.dependencies().contains(NO_DEPENDENCY))
    {
        graph.add_node(NO_DEPENDENCY);
    }

    for relationship in relationships {
        for dependency in relationship.dependencies() {
            graph.add_node(dependency);
        }
        for dependency in relationship.dependencies() {
            for modified in relationship.modifies() {
                if dependency == modified {
                    continue;
                }
                graph.add_edge(dependency, modified);
            }
        }
    }

    graph
}

/// Order relationships so each runs after every relationship that modifies
/// one of its dependencies.
///
/// Variables are walked in topological order; at each variable every
/// relationship depending on it is scheduled, in configuration order. A
/// relationship with several dependencies is therefore scheduled once per
/// dependency.
pub fn plan_relationships(
    relationships: Vec<BoundRelationship>,
) -> Result<ExecutionPlan, PlanError> {
    let graph = build_graph(&relationships);
    let order = graph
        .topo_order()
        .map_err(|variables| PlanError::CyclicDependency { variables })?;

    let mut steps = Vec::new();
    for variable in &order {
        for relationship in &relationships {
            if relationship.dependencies().contains(variable) {
                steps.push(relationship.clone());
            }
        }
    }

    let summary = graph.summary();
    tracing::debug!(
        relationships = relationships.len(),
        steps = steps.len(),
        nodes = summary.nodes,
        edges = summary.edges,
        "relationship plan computed"
    );

    Ok(ExecutionPlan { steps, graph })
}
