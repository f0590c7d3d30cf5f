//! Incremental scenario builder.

use gs_core::{AttrMap, AttrRef, TimeBounds, Value};
use tracing::debug;

use crate::config::ScenarioConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::graph::{AsyncRequest, DataflowGraph, Edge};
use crate::model::ModelSpec;
use crate::validate;

/// Mutable construction API for a scenario.
///
/// Use `add_model` and `add_connection` to build up the dataflow graph,
/// then call `freeze()` to validate it into an immutable `ScenarioConfig`.
/// Once frozen, every mutating call fails with `ConfigError::FrozenScenario`.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    name: String,
    bounds: TimeBounds,
    graph: DataflowGraph,
    async_requests: Vec<AsyncRequest>,
    monitor: Vec<AttrRef>,
    frozen: bool,
}

impl ScenarioBuilder {
    /// Create an empty scenario.
    pub fn new(name: impl Into<String>, bounds: TimeBounds) -> Self {
        Self::from_parts(
            name.into(),
            bounds,
            DataflowGraph::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    /// Create an empty scenario from `"YYYY-MM-DD HH:MM:SS"` bounds.
    pub fn parse(
        name: impl Into<String>,
        start: &str,
        end: &str,
        resolution: u64,
    ) -> ConfigResult<Self> {
        Ok(Self::new(name, TimeBounds::parse(start, end, resolution)?))
    }

    pub(crate) fn from_parts(
        name: String,
        bounds: TimeBounds,
        graph: DataflowGraph,
        async_requests: Vec<AsyncRequest>,
        monitor: Vec<AttrRef>,
    ) -> Self {
        Self {
            name,
            bounds,
            graph,
            async_requests,
            monitor,
            frozen: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bounds(&self) -> &TimeBounds {
        &self.bounds
    }

    pub fn graph(&self) -> &DataflowGraph {
        &self.graph
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_mutable(&self, action: &'static str) -> ConfigResult<()> {
        if self.frozen {
            return Err(ConfigError::FrozenScenario { action });
        }
        Ok(())
    }

    /// Add a model. Names must be unique and the declaration self-consistent.
    pub fn add_model(&mut self, spec: ModelSpec) -> ConfigResult<()> {
        self.ensure_mutable("add a model")?;
        if self.graph.model(&spec.name).is_some() {
            return Err(ConfigError::DuplicateModel { name: spec.name });
        }
        validate::validate_spec(&spec, self.bounds.resolution)?;
        debug!(model = %spec.name, kind = %spec.kind, "model added");
        self.graph.push_model(spec);
        Ok(())
    }

    /// Remove a model together with every edge, async request and monitor
    /// entry that references it.
    pub fn remove_model(&mut self, name: &str) -> ConfigResult<ModelSpec> {
        self.ensure_mutable("remove a model")?;
        let spec = self
            .graph
            .remove_model(name)
            .ok_or_else(|| ConfigError::UnknownModel {
                name: name.to_string(),
            })?;
        self.async_requests
            .retain(|r| r.source != name && r.dest != name);
        self.monitor.retain(|m| m.model != name);
        debug!(model = %name, "model removed");
        Ok(spec)
    }

    /// Connect a readable attribute (output or state) to an input.
    ///
    /// A same-tick edge is rejected if its target model already reaches its
    /// source model through any existing edge, so the edge that closes a
    /// feedback loop has to be the time-shifted one.
    ///
    /// Reachability follows time-shifted edges too, which makes the check
    /// order dependent: adding the same-tick edge before the shifted back
    /// edge is accepted. [`freeze`](Self::freeze) only requires the
    /// same-tick subgraph to be acyclic, and graphs copied through
    /// `ScenarioConfig::to_builder` are only held to that weaker rule.
    pub fn add_connection(
        &mut self,
        from: AttrRef,
        to: AttrRef,
        time_shifted: bool,
    ) -> ConfigResult<()> {
        self.ensure_mutable("add a connection")?;
        validate::validate_edge_endpoints(&self.graph, &from, &to)?;

        if self.graph.edges().iter().any(|e| e.from == from && e.to == to) {
            return Err(ConfigError::InvalidEdge {
                from: from.to_string(),
                to: to.to_string(),
                what: "already connected".to_string(),
            });
        }

        if !time_shifted {
            if from.model == to.model {
                return Err(ConfigError::CyclicDependency {
                    path: vec![from.model.clone(), to.model.clone()],
                });
            }
            if let Some(mut path) = self.graph.path_between(&to.model, &from.model, true) {
                path.push(to.model.clone());
                return Err(ConfigError::CyclicDependency { path });
            }
        }

        debug!(%from, %to, time_shifted, "connection added");
        self.graph.push_edge(Edge::new(from, to, time_shifted));
        Ok(())
    }

    /// Remove every edge between two endpoints.
    pub fn remove_connection(&mut self, from: &AttrRef, to: &AttrRef) -> ConfigResult<()> {
        self.ensure_mutable("remove a connection")?;
        if self.graph.remove_edges(from, to) == 0 {
            return Err(ConfigError::InvalidEdge {
                from: from.to_string(),
                to: to.to_string(),
                what: "no such connection".to_string(),
            });
        }
        Ok(())
    }

    /// Set a single parameter on a model.
    pub fn set_model_param(
        &mut self,
        model: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> ConfigResult<()> {
        self.ensure_mutable("set a model parameter")?;
        let spec = self.spec_mut(model)?;
        spec.parameters.insert(key.into(), value.into());
        Ok(())
    }

    /// Set the initial value of a declared state.
    pub fn set_model_state(
        &mut self,
        model: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> ConfigResult<()> {
        self.ensure_mutable("set a model state")?;
        let spec = self.spec_mut(model)?;
        let Some(slot) = spec.states.get_mut(key) else {
            return Err(ConfigError::InvalidSpec {
                model: model.to_string(),
                what: format!("'{}' is not a declared state", key),
            });
        };
        *slot = value.into();
        Ok(())
    }

    /// Merge a set of parameters into a model's declaration.
    pub fn set_model_parameters(&mut self, model: &str, parameters: AttrMap) -> ConfigResult<()> {
        self.ensure_mutable("set model parameters")?;
        let spec = self.spec_mut(model)?;
        spec.parameters.extend(parameters);
        Ok(())
    }

    /// Register out-of-band writes from `source` into `dest`.
    ///
    /// Idempotent: registering the same pair twice is a no-op, and repeated
    /// calls for the same `(source, dest)` merge their pairs.
    pub fn register_async<I, S>(&mut self, source: &str, dest: &str, pairs: I) -> ConfigResult<()>
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        self.ensure_mutable("register an async request")?;
        let request = AsyncRequest {
            source: source.to_string(),
            dest: dest.to_string(),
            pairs: pairs
                .into_iter()
                .map(|(a, b)| (a.into(), b.into()))
                .collect(),
        };
        validate::validate_async(&self.graph, &request)?;

        match self
            .async_requests
            .iter_mut()
            .find(|r| r.source == request.source && r.dest == request.dest)
        {
            Some(existing) => {
                for pair in request.pairs {
                    if !existing.pairs.contains(&pair) {
                        existing.pairs.push(pair);
                    }
                }
            }
            None => self.async_requests.push(request),
        }
        Ok(())
    }

    /// Record `attr` in the run's output time series.
    pub fn monitor(&mut self, attr: AttrRef) -> ConfigResult<()> {
        self.ensure_mutable("add a monitor")?;
        validate::validate_monitor(&self.graph, &attr)?;
        if !self.monitor.contains(&attr) {
            self.monitor.push(attr);
        }
        Ok(())
    }

    /// Validate the whole scenario and return an immutable snapshot.
    ///
    /// After this call the builder rejects all further mutation.
    pub fn freeze(&mut self) -> ConfigResult<ScenarioConfig> {
        self.ensure_mutable("freeze twice")?;
        validate::validate_bounds(&self.bounds)?;
        for spec in self.graph.models() {
            validate::validate_spec(spec, self.bounds.resolution)?;
        }
        for edge in self.graph.edges() {
            validate::validate_edge_endpoints(&self.graph, &edge.from, &edge.to)?;
        }
        for request in &self.async_requests {
            validate::validate_async(&self.graph, request)?;
        }
        for attr in &self.monitor {
            validate::validate_monitor(&self.graph, attr)?;
        }
        let execution_order = self.graph.execution_order()?;

        self.frozen = true;
        Ok(ScenarioConfig {
            name: self.name.clone(),
            bounds: self.bounds,
            graph: self.graph.clone(),
            async_requests: self.async_requests.clone(),
            monitor: self.monitor.clone(),
            execution_order,
        })
    }

    fn spec_mut(&mut self, model: &str) -> ConfigResult<&mut ModelSpec> {
        self.graph
            .model_mut(model)
            .ok_or_else(|| ConfigError::UnknownModel {
                name: model.to_string(),
            })
    }
}
