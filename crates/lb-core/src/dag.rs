//! DAG building and deterministic topological sorting

use crate::error::{CoreError, CoreResult};
use crate::model_name::ModelName;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// A directed acyclic graph of model dependencies.
///
/// Nodes are added in declaration order; ties in the topological order
/// are broken by that order so runs are reproducible.
#[derive(Debug, Default)]
pub struct ModelDag {
    /// Edges point from dependency to dependent
    graph: DiGraph<ModelName, ()>,

    /// Map from model name to node index
    node_map: HashMap<ModelName, NodeIndex>,
}

impl ModelDag {
    /// Create a new empty DAG
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model to the DAG
    pub fn add_model(&mut self, name: &str) -> CoreResult<NodeIndex> {
        if let Some(&idx) = self.node_map.get(name) {
            return Ok(idx);
        }
        let model_name = ModelName::try_new(name).ok_or_else(|| CoreError::EmptyName {
            context: "model name in DAG".into(),
        })?;
        let idx = self.graph.add_node(model_name.clone());
        self.node_map.insert(model_name, idx);
        Ok(idx)
    }

    /// Add a dependency edge (`from` depends on `to`)
    pub fn add_dependency(&mut self, from: &str, to: &str) -> CoreResult<()> {
        let from_idx = self.add_model(from)?;
        let to_idx = self.add_model(to)?;
        if self.graph.find_edge(to_idx, from_idx).is_none() {
            self.graph.add_edge(to_idx, from_idx, ());
        }
        Ok(())
    }

    /// Build the DAG from `(model, dependencies)` pairs in declaration order.
    ///
    /// Dependencies naming something that is not a model are ignored;
    /// those are warehouse relations outside the project.
    pub fn build<'a, I, D>(models: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: IntoIterator<Item = &'a str>,
    {
        let entries: Vec<(&str, Vec<&str>)> = models
            .into_iter()
            .map(|(name, deps)| (name, deps.into_iter().collect()))
            .collect();

        let mut dag = Self::new();
        for (name, _) in &entries {
            dag.add_model(name)?;
        }
        for (name, deps) in &entries {
            for dep in deps {
                if dag.node_map.contains_key(*dep) {
                    dag.add_dependency(name, dep)?;
                }
            }
        }

        dag.validate()?;
        Ok(dag)
    }

    /// Validate the DAG has no cycles
    pub fn validate(&self) -> CoreResult<()> {
        match self.find_cycle() {
            Some(cycle) => Err(CoreError::CircularDependency { cycle }),
            None => Ok(()),
        }
    }

    /// Depth-first search for a back edge; returns the cycle as `a -> b -> a`
    fn find_cycle(&self) -> Option<String> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            OnStack,
            Done,
        }

        let mut marks = vec![Mark::New; self.graph.node_count()];
        let mut stack: Vec<NodeIndex> = Vec::new();

        fn visit(
            dag: &ModelDag,
            idx: NodeIndex,
            marks: &mut [Mark],
            stack: &mut Vec<NodeIndex>,
        ) -> Option<String> {
            marks[idx.index()] = Mark::OnStack;
            stack.push(idx);

            let mut targets: Vec<NodeIndex> = dag.graph.edges(idx).map(|e| e.target()).collect();
            targets.sort();
            for target in targets {
                match marks[target.index()] {
                    Mark::OnStack => {
                        let start = stack.iter().position(|&n| n == target).unwrap_or(0);
                        let mut path: Vec<String> = stack[start..]
                            .iter()
                            .map(|&n| dag.graph[n].to_string())
                            .collect();
                        path.push(dag.graph[target].to_string());
                        return Some(path.join(" -> "));
                    }
                    Mark::New => {
                        if let Some(cycle) = visit(dag, target, marks, stack) {
                            return Some(cycle);
                        }
                    }
                    Mark::Done => {}
                }
            }

            stack.pop();
            marks[idx.index()] = Mark::Done;
            None
        }

        for idx in self.graph.node_indices() {
            if marks[idx.index()] == Mark::New {
                if let Some(cycle) = visit(self, idx, &mut marks, &mut stack) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Models in topological order (dependencies first), ties broken by declaration order
    pub fn topological_order(&self) -> CoreResult<Vec<ModelName>> {
        let mut in_degree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<NodeIndex>> = self
            .graph
            .node_indices()
            .filter(|idx| in_degree[idx.index()] == 0)
            .map(Reverse)
            .collect();

        let mut order = Vec::with_capacity(self.graph.node_count());
        while let Some(Reverse(idx)) = ready.pop() {
            order.push(self.graph[idx].clone());
            for edge in self.graph.edges(idx) {
                let target = edge.target();
                in_degree[target.index()] -= 1;
                if in_degree[target.index()] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }

        if order.len() != self.graph.node_count() {
            let cycle = self
                .find_cycle()
                .unwrap_or_else(|| "unknown cycle".to_string());
            return Err(CoreError::CircularDependency { cycle });
        }
        Ok(order)
    }

    /// Direct dependencies of a model, in declaration order
    pub fn dependencies(&self, model: &str) -> Vec<ModelName> {
        self.neighbors(model, Direction::Incoming)
    }

    /// Direct dependents of a model, in declaration order
    pub fn dependents(&self, model: &str) -> Vec<ModelName> {
        self.neighbors(model, Direction::Outgoing)
    }

    fn neighbors(&self, model: &str, direction: Direction) -> Vec<ModelName> {
        let Some(&idx) = self.node_map.get(model) else {
            return Vec::new();
        };
        let mut indices: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        indices.sort();
        indices.dedup();
        indices.into_iter().map(|i| self.graph[i].clone()).collect()
    }

    /// All transitive dependents of a model
    pub fn descendants(&self, model: &str) -> HashSet<ModelName> {
        let mut result = HashSet::new();
        let Some(&start) = self.node_map.get(model) else {
            return result;
        };
        let mut stack = vec![start];
        let mut visited = HashSet::new();
        while let Some(idx) = stack.pop() {
            for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if visited.insert(next) {
                    result.insert(self.graph[next].clone());
                    stack.push(next);
                }
            }
        }
        result
    }

    /// Whether the DAG contains a model
    pub fn contains(&self, model: &str) -> bool {
        self.node_map.contains_key(model)
    }

    /// Number of models
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the DAG has no models
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
#[path = "dag_test.rs"]
mod tests;
