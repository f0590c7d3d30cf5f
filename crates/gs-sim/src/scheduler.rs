//! Tick-driven co-simulation scheduler.
//!
//! One scheduler executes one frozen [`ScenarioConfig`] with one
//! [`ComponentRegistry`]. Within a tick, ready models step strictly
//! sequentially in the frozen execution order; data moves along edges as
//! soon as a producer has stepped, and async writes are applied in a single
//! drain phase after every ready model has stepped.

use std::collections::{BTreeMap, HashMap};

use gs_core::{AttrMap, SimTime, Value, align_up};
use gs_graph::{Discipline, ModelSpec, ScenarioConfig};
use tracing::{debug, info, instrument, trace};

use crate::channel::AsyncChannel;
use crate::error::{SimError, SimResult, StepError};
use crate::model::StepContext;
use crate::monitor::{MonitorLog, MonitorRow};
use crate::registry::ComponentRegistry;

/// Scheduling state of one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Waiting for its next due time or a trigger.
    Idle,
    /// Ready to step in the current tick.
    Due,
    /// Inside its `step` call.
    Stepping,
    /// The run has ended.
    Done,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Executed tick times, ascending.
    pub ticks: Vec<SimTime>,
    /// Total number of model steps.
    pub steps: usize,
}

#[derive(Debug)]
struct Slot {
    state: ModelState,
    next_due: Option<SimTime>,
    trigger_due: Option<SimTime>,
    /// Outputs and states after the last step.
    latest: AttrMap,
    /// `latest` as it was when the current tick began.
    previous: AttrMap,
    /// Async values waiting for the next step.
    inbox: AttrMap,
    last_inputs: AttrMap,
    steps: usize,
}

impl Slot {
    fn new(spec: &ModelSpec) -> Self {
        let next_due = match spec.discipline {
            Discipline::TimeBased { .. } | Discipline::Hybrid { .. } => Some(0),
            Discipline::EventBased => None,
        };
        Self {
            state: ModelState::Idle,
            next_due,
            trigger_due: None,
            latest: spec.initial_outputs(),
            previous: AttrMap::new(),
            inbox: AttrMap::new(),
            last_inputs: spec.inputs.clone(),
            steps: 0,
        }
    }

    fn is_ready(&self, now: SimTime) -> bool {
        self.next_due == Some(now) || self.trigger_due == Some(now)
    }

    fn next_event(&self) -> Option<SimTime> {
        match (self.next_due, self.trigger_due) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn trigger_at(&mut self, t: SimTime) {
        self.trigger_due = Some(self.trigger_due.map_or(t, |cur| cur.min(t)));
    }
}

/// An edge resolved to model indices.
#[derive(Debug, Clone, Copy)]
struct Link {
    edge: usize,
    from: usize,
    to: usize,
}

/// Executes a frozen scenario against a registry of live models.
#[derive(Debug)]
pub struct Scheduler {
    config: ScenarioConfig,
    registry: ComponentRegistry,
    index: HashMap<String, usize>,
    slots: Vec<Slot>,
    links: Vec<Link>,
    channel: AsyncChannel,
    monitor: MonitorLog,
    started: bool,
}

impl Scheduler {
    /// Pair a frozen scenario with its model instances.
    ///
    /// Every declared model needs exactly one instance, and every instance
    /// must be declared.
    pub fn new(config: ScenarioConfig, registry: ComponentRegistry) -> SimResult<Self> {
        for spec in config.models() {
            if !registry.contains(&spec.name) {
                return Err(SimError::MissingModel {
                    name: spec.name.clone(),
                });
            }
        }
        if let Some(extra) = registry.names().find(|n| config.model(n).is_none()) {
            return Err(SimError::UndeclaredModel {
                name: extra.to_string(),
            });
        }

        let index: HashMap<String, usize> = config
            .models()
            .iter()
            .enumerate()
            .map(|(i, m)| (m.name.clone(), i))
            .collect();
        let links = config
            .edges()
            .iter()
            .enumerate()
            .filter_map(|(edge, e)| {
                Some(Link {
                    edge,
                    from: *index.get(&e.from.model)?,
                    to: *index.get(&e.to.model)?,
                })
            })
            .collect();
        let slots = config.models().iter().map(Slot::new).collect();
        let channel = AsyncChannel::from_requests(config.async_requests());
        let monitor = MonitorLog::new(config.monitored().to_vec());

        Ok(Self {
            config,
            registry,
            index,
            slots,
            links,
            channel,
            monitor,
            started: false,
        })
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Model names in the order they are visited within a tick.
    pub fn execution_order(&self) -> Vec<&str> {
        self.config
            .execution_order()
            .iter()
            .map(|&i| self.config.models()[i].name.as_str())
            .collect()
    }

    pub fn state(&self, name: &str) -> Option<ModelState> {
        self.index.get(name).map(|&i| self.slots[i].state)
    }

    /// Latest recorded outputs and states of a model.
    pub fn outputs_of(&self, name: &str) -> Option<&AttrMap> {
        self.index.get(name).map(|&i| &self.slots[i].latest)
    }

    pub fn step_counts(&self) -> BTreeMap<String, usize> {
        self.config
            .models()
            .iter()
            .zip(&self.slots)
            .map(|(m, s)| (m.name.clone(), s.steps))
            .collect()
    }

    pub fn monitor_log(&self) -> &MonitorLog {
        &self.monitor
    }

    pub fn into_monitor_log(self) -> MonitorLog {
        self.monitor
    }

    /// Run the scenario to completion.
    ///
    /// Ticks run while `T < duration`, jumping to the earliest pending due
    /// time. The first step error aborts the run.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        if self.started {
            return Err(SimError::AlreadyRun {
                scenario: self.config.name().to_string(),
            });
        }
        self.started = true;

        let duration = self.config.duration();
        info!(
            scenario = self.config.name(),
            models = self.slots.len(),
            duration,
            "run start"
        );

        let mut ticks = Vec::new();
        while let Some(now) = self.next_tick() {
            if now >= duration {
                break;
            }
            self.tick(now)?;
            ticks.push(now);
        }

        for slot in &mut self.slots {
            slot.state = ModelState::Done;
        }
        let steps = self.slots.iter().map(|s| s.steps).sum();
        info!(
            scenario = self.config.name(),
            ticks = ticks.len(),
            steps,
            "run complete"
        );
        Ok(RunSummary { ticks, steps })
    }

    fn next_tick(&self) -> Option<SimTime> {
        self.slots.iter().filter_map(Slot::next_event).min()
    }

    #[instrument(level = "debug", skip(self), fields(scenario = %self.config.name()))]
    fn tick(&mut self, now: SimTime) -> SimResult<()> {
        for slot in &mut self.slots {
            slot.previous = slot.latest.clone();
            if slot.is_ready(now) {
                slot.state = ModelState::Due;
            }
        }

        let order = self.config.execution_order().to_vec();
        let mut stepped = 0usize;
        for idx in order {
            // Same-tick triggers can make a model ready after the tick began.
            if self.slots[idx].is_ready(now) {
                self.step_model(idx, now)?;
                stepped += 1;
            }
        }

        self.drain_async(now);
        self.record(now);
        debug!(stepped, "tick complete");
        Ok(())
    }

    fn step_model(&mut self, idx: usize, now: SimTime) -> SimResult<()> {
        let resolution = self.config.resolution();
        let duration = self.config.duration();
        let prior_due = self.slots[idx].next_due;
        let inputs = self.gather_inputs(idx);
        let max_advance = self.max_advance(idx, duration);

        let spec = &self.config.models()[idx];
        let name = spec.name.as_str();
        let discipline = spec.discipline;
        self.slots[idx].state = ModelState::Stepping;
        trace!(model = name, time = now, "step");

        let model = self
            .registry
            .get_mut(name)
            .ok_or_else(|| SimError::MissingModel {
                name: name.to_string(),
            })?;

        let mut ctx = StepContext::new(now, &inputs, max_advance, spec.step_size());
        let returned = model.step(&mut ctx).map_err(|e| {
            let err = StepError::new(name, now, e.to_string());
            match e.attr() {
                Some(attr) => err.with_attr(attr),
                None => err,
            }
        })?;
        let published = ctx.take_published();

        if let Some(next) = returned {
            if next <= now {
                return Err(StepError::new(
                    name,
                    now,
                    format!("non-monotonic next time {next}"),
                )
                .into());
            }
        }

        let outputs = model.outputs();
        if let Some(bad) = outputs.keys().find(|k| !spec.is_readable(k)) {
            return Err(StepError::new(name, now, "undeclared output")
                .with_attr(bad.as_str())
                .into());
        }

        self.channel.forward_outputs(name, &outputs);
        for (dest, attr, value) in published {
            self.channel
                .publish(name, &dest, &attr, value)
                .map_err(|e| StepError::new(name, now, e.to_string()).with_attr(attr.as_str()))?;
        }

        let changed: Vec<String> = {
            let slot = &mut self.slots[idx];
            let mut changed = Vec::new();
            for (k, v) in outputs {
                if slot.latest.get(&k) != Some(&v) {
                    changed.push(k.clone());
                }
                slot.latest.insert(k, v);
            }
            changed
        };
        self.raise_triggers(idx, &changed, now);

        let scheduled = match discipline {
            Discipline::TimeBased { step_size } => {
                returned.or_else(|| now.checked_add(step_size))
            }
            // An off-grid trigger step leaves the fixed schedule in place.
            Discipline::Hybrid { step_size } => returned.or_else(|| match prior_due {
                Some(due) if due > now => Some(due),
                _ => now.checked_add(step_size),
            }),
            Discipline::EventBased => returned,
        };
        // Anything at or past the end of the run will never be due.
        let next_due = scheduled
            .and_then(|t| align_up(t, resolution))
            .filter(|&t| t < duration);

        let slot = &mut self.slots[idx];
        slot.next_due = next_due;
        if slot.trigger_due.is_some_and(|t| t <= now) {
            slot.trigger_due = None;
        }
        slot.last_inputs = inputs;
        slot.steps += 1;
        slot.state = ModelState::Idle;
        Ok(())
    }

    /// Declared defaults, then edges in declaration order, then async values.
    fn gather_inputs(&mut self, idx: usize) -> AttrMap {
        let mut inputs = self.config.models()[idx].inputs.clone();
        let edges = self.config.edges();
        for link in self.links.iter().filter(|l| l.to == idx) {
            let edge = &edges[link.edge];
            let source = &self.slots[link.from];
            let buffer = if edge.time_shifted {
                &source.previous
            } else {
                &source.latest
            };
            if let Some(value) = buffer.get(&edge.from.attr).filter(|v| !v.is_null()) {
                inputs.insert(edge.to.attr.clone(), value.clone());
            }
        }
        inputs.extend(std::mem::take(&mut self.slots[idx].inbox));
        inputs
    }

    /// Earliest next due time among the model's producers.
    fn max_advance(&self, idx: usize, duration: SimTime) -> SimTime {
        self.links
            .iter()
            .filter(|l| l.to == idx && l.from != idx)
            .filter_map(|l| self.slots[l.from].next_due)
            .fold(duration, SimTime::min)
    }

    fn raise_triggers(&mut self, idx: usize, changed: &[String], now: SimTime) {
        if changed.is_empty() {
            return;
        }
        let resolution = self.config.resolution();
        let models = self.config.models();
        let edges = self.config.edges();
        let producer = &models[idx];
        for link in self.links.iter().filter(|l| l.from == idx) {
            let edge = &edges[link.edge];
            if !changed.contains(&edge.from.attr) {
                continue;
            }
            let consumer = &models[link.to];
            if !consumer.discipline.reacts_to_triggers() {
                continue;
            }
            if consumer.is_trigger(&edge.to.attr) || producer.is_trigger(&edge.from.attr) {
                let at = if edge.time_shifted {
                    now + resolution
                } else {
                    now
                };
                trace!(from = %edge.from, to = %edge.to, at, "trigger");
                self.slots[link.to].trigger_at(at);
            }
        }
    }

    /// Move pending async writes into inboxes for the next step.
    fn drain_async(&mut self, now: SimTime) {
        let next = now + self.config.resolution();
        for (dest, attr, value) in self.channel.drain() {
            let Some(&idx) = self.index.get(&dest) else {
                continue;
            };
            let spec = &self.config.models()[idx];
            if spec.discipline.reacts_to_triggers() && spec.is_trigger(&attr) {
                self.slots[idx].trigger_at(next);
            }
            self.slots[idx].inbox.insert(attr, value);
        }
        for slot in &mut self.slots {
            if slot.trigger_due.is_some_and(|t| t <= now) {
                slot.trigger_due = None;
            }
        }
    }

    fn record(&mut self, now: SimTime) {
        if self.monitor.columns().is_empty() {
            return;
        }
        let values = self
            .monitor
            .columns()
            .iter()
            .map(|col| {
                let Some(&idx) = self.index.get(&col.model) else {
                    return Value::Null;
                };
                let slot = &self.slots[idx];
                let source = if self.config.models()[idx].has_input(&col.attr) {
                    &slot.last_inputs
                } else {
                    &slot.latest
                };
                source.get(&col.attr).cloned().unwrap_or_default()
            })
            .collect();
        self.monitor.push(MonitorRow { time: now, values });
    }
}
