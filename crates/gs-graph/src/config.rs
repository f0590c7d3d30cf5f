//! Frozen scenario snapshot.

use gs_core::{AttrRef, SimTime, TimeBounds};

use crate::builder::ScenarioBuilder;
use crate::graph::{AsyncRequest, DataflowGraph, Edge};
use crate::model::ModelSpec;

/// A validated, immutable scenario: the only thing a scheduler accepts.
///
/// Produced by [`ScenarioBuilder::freeze`]. The execution order over
/// same-tick edges is computed once here.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub(crate) name: String,
    pub(crate) bounds: TimeBounds,
    pub(crate) graph: DataflowGraph,
    pub(crate) async_requests: Vec<AsyncRequest>,
    pub(crate) monitor: Vec<AttrRef>,
    pub(crate) execution_order: Vec<usize>,
}

impl ScenarioConfig {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &TimeBounds {
        &self.bounds
    }

    pub fn resolution(&self) -> SimTime {
        self.bounds.resolution
    }

    /// Scenario length in seconds; ticks run while `T < duration`.
    pub fn duration(&self) -> SimTime {
        self.bounds.duration()
    }

    pub fn graph(&self) -> &DataflowGraph {
        &self.graph
    }

    /// Models in declaration order.
    pub fn models(&self) -> &[ModelSpec] {
        self.graph.models()
    }

    /// Edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        self.graph.edges()
    }

    pub fn model(&self, name: &str) -> Option<&ModelSpec> {
        self.graph.model(name)
    }

    pub fn async_requests(&self) -> &[AsyncRequest] {
        &self.async_requests
    }

    pub fn monitored(&self) -> &[AttrRef] {
        &self.monitor
    }

    /// Model indices in dependency order over non-time-shifted edges.
    pub fn execution_order(&self) -> &[usize] {
        &self.execution_order
    }

    /// An unfrozen builder holding a copy of this scenario.
    ///
    /// Used to derive concrete variants; the original stays untouched.
    pub fn to_builder(&self) -> ScenarioBuilder {
        ScenarioBuilder::from_parts(
            self.name.clone(),
            self.bounds,
            self.graph.clone(),
            self.async_requests.clone(),
            self.monitor.clone(),
        )
    }
}
