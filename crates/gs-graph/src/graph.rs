//! Attribute-level dataflow graph.

use gs_core::AttrRef;
use petgraph::algo::astar;
use petgraph::graphmap::DiGraphMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{ConfigError, ConfigResult};
use crate::model::ModelSpec;

/// Directed edge from a readable attribute to an input attribute.
///
/// A time-shifted edge delivers the producer's value from the previous tick,
/// which is what allows feedback loops without same-tick cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: AttrRef,
    pub to: AttrRef,
    pub time_shifted: bool,
}

impl Edge {
    pub fn new(from: AttrRef, to: AttrRef, time_shifted: bool) -> Self {
        Self {
            from,
            to,
            time_shifted,
        }
    }
}

/// Registration for out-of-band writes from `source` into `dest`'s inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncRequest {
    pub source: String,
    pub dest: String,
    /// `(source_attr, dest_attr)` pairs.
    pub pairs: Vec<(String, String)>,
}

/// Models and edges, both kept in declaration order.
///
/// Declaration order is load-bearing: it breaks ties in the execution
/// order and decides which of several edges into the same input wins.
#[derive(Debug, Clone, Default)]
pub struct DataflowGraph {
    models: Vec<ModelSpec>,
    edges: Vec<Edge>,
}

impl DataflowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn models(&self) -> &[ModelSpec] {
        &self.models
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn model(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn model_index(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|m| m.name == name)
    }

    pub(crate) fn model_mut(&mut self, name: &str) -> Option<&mut ModelSpec> {
        self.models.iter_mut().find(|m| m.name == name)
    }

    pub(crate) fn push_model(&mut self, spec: ModelSpec) {
        self.models.push(spec);
    }

    /// Remove a model and every edge touching it. Returns the removed spec.
    pub(crate) fn remove_model(&mut self, name: &str) -> Option<ModelSpec> {
        let idx = self.model_index(name)?;
        self.edges
            .retain(|e| e.from.model != name && e.to.model != name);
        Some(self.models.remove(idx))
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    /// Remove all edges between two endpoints; returns how many were removed.
    pub(crate) fn remove_edges(&mut self, from: &AttrRef, to: &AttrRef) -> usize {
        let before = self.edges.len();
        self.edges.retain(|e| !(&e.from == from && &e.to == to));
        before - self.edges.len()
    }

    /// Edges feeding `model`, in declaration order.
    pub fn incoming<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.to.model == model)
    }

    /// Edges leaving `model`, in declaration order.
    pub fn outgoing<'a>(&'a self, model: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.from.model == model)
    }

    /// Shortest model-level path `from -> ... -> to`, if any.
    ///
    /// With `include_shifted = false` only same-tick (non-time-shifted) edges
    /// are followed.
    pub fn path_between(&self, from: &str, to: &str, include_shifted: bool) -> Option<Vec<String>> {
        let mut g: DiGraphMap<&str, ()> = DiGraphMap::new();
        for m in &self.models {
            g.add_node(m.name.as_str());
        }
        for e in &self.edges {
            if include_shifted || !e.time_shifted {
                g.add_edge(e.from.model.as_str(), e.to.model.as_str(), ());
            }
        }
        if !g.contains_node(from) || !g.contains_node(to) {
            return None;
        }
        astar(&g, from, |n| n == to, |_| 1u32, |_| 0u32)
            .map(|(_, path)| path.into_iter().map(str::to_string).collect())
    }

    /// Deterministic topological order of model indices over same-tick edges.
    ///
    /// Kahn's algorithm with a min-heap on declaration index, so independent
    /// models keep their declaration order.
    pub fn execution_order(&self) -> ConfigResult<Vec<usize>> {
        let n = self.models.len();
        let mut in_degree = vec![0usize; n];
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); n];

        for e in self.edges.iter().filter(|e| !e.time_shifted) {
            let (Some(from), Some(to)) =
                (self.model_index(&e.from.model), self.model_index(&e.to.model))
            else {
                continue;
            };
            // Parallel edges between the same models count once
            if !adj[from].contains(&to) {
                adj[from].push(to);
                in_degree[to] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(i)) = ready.pop() {
            order.push(i);
            for &j in &adj[i] {
                in_degree[j] -= 1;
                if in_degree[j] == 0 {
                    ready.push(Reverse(j));
                }
            }
        }

        if order.len() != n {
            let path = (0..n)
                .filter(|i| in_degree[*i] > 0)
                .map(|i| self.models[i].name.clone())
                .collect();
            return Err(ConfigError::CyclicDependency { path });
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ModelSpec {
        ModelSpec::time_based(name, "test", 60)
            .with_input("in", 0.0)
            .with_output("out")
    }

    fn edge(from: &str, to: &str, shifted: bool) -> Edge {
        Edge::new(AttrRef::new(from, "out"), AttrRef::new(to, "in"), shifted)
    }

    #[test]
    fn order_follows_edges_then_declaration() {
        let mut g = DataflowGraph::new();
        for name in ["c", "a", "b"] {
            g.push_model(spec(name));
        }
        // a -> c
        g.push_edge(edge("a", "c", false));
        let order = g.execution_order().unwrap();
        let names: Vec<&str> = order.iter().map(|&i| g.models()[i].name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn shifted_edges_do_not_constrain_order() {
        let mut g = DataflowGraph::new();
        g.push_model(spec("ctrl"));
        g.push_model(spec("bat"));
        g.push_edge(edge("bat", "ctrl", false));
        g.push_edge(edge("ctrl", "bat", true));
        let order = g.execution_order().unwrap();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn same_tick_cycle_is_reported() {
        let mut g = DataflowGraph::new();
        g.push_model(spec("a"));
        g.push_model(spec("b"));
        g.push_edge(edge("a", "b", false));
        g.push_edge(edge("b", "a", false));
        let err = g.execution_order().unwrap_err();
        assert!(matches!(err, ConfigError::CyclicDependency { .. }));
    }

    #[test]
    fn path_between_respects_shift_filter() {
        let mut g = DataflowGraph::new();
        g.push_model(spec("a"));
        g.push_model(spec("b"));
        g.push_edge(edge("a", "b", true));
        assert_eq!(
            g.path_between("a", "b", true),
            Some(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(g.path_between("a", "b", false), None);
    }

    #[test]
    fn remove_model_cascades_edges() {
        let mut g = DataflowGraph::new();
        g.push_model(spec("a"));
        g.push_model(spec("b"));
        g.push_model(spec("c"));
        g.push_edge(edge("a", "b", false));
        g.push_edge(edge("b", "c", false));
        g.remove_model("b").unwrap();
        assert!(g.edges().is_empty());
        assert_eq!(g.models().len(), 2);
    }
}
