//! Declared component contracts.
//!
//! Every model states its attribute sets up front. Edges, async mappings
//! and monitor entries are validated against these declarations when the
//! scenario is built, never at call time.

use gs_core::{AttrMap, SimTime, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a model is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Discipline {
    /// Steps every `step_size` seconds from t = 0.
    TimeBased { step_size: SimTime },
    /// Steps only when a trigger attribute changes (or at self-scheduled times).
    EventBased,
    /// Both: a fixed schedule plus trigger-driven extra steps.
    Hybrid { step_size: SimTime },
}

impl Discipline {
    pub fn step_size(&self) -> Option<SimTime> {
        match self {
            Discipline::TimeBased { step_size } | Discipline::Hybrid { step_size } => {
                Some(*step_size)
            }
            Discipline::EventBased => None,
        }
    }

    /// Whether trigger attributes can make this model due.
    pub fn reacts_to_triggers(&self) -> bool {
        !matches!(self, Discipline::TimeBased { .. })
    }
}

/// Which declared set an attribute belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKind {
    Input,
    Output,
    State,
}

/// Declaration of a single model (component) in a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub name: String,
    /// Model type, resolved to an implementation by the model factory.
    pub kind: String,
    /// Input names with their initial values (`Null` = none).
    pub inputs: AttrMap,
    /// Output names with optional initial values.
    pub outputs: AttrMap,
    /// State names with initial values. States may feed edges like outputs.
    pub states: AttrMap,
    pub parameters: AttrMap,
    pub triggers: BTreeSet<String>,
    pub discipline: Discipline,
    /// Opaque data source handed to the model (e.g. a CSV path).
    pub scenario_data: Option<String>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, kind: impl Into<String>, discipline: Discipline) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            inputs: AttrMap::new(),
            outputs: AttrMap::new(),
            states: AttrMap::new(),
            parameters: AttrMap::new(),
            triggers: BTreeSet::new(),
            discipline,
            scenario_data: None,
        }
    }

    pub fn time_based(name: impl Into<String>, kind: impl Into<String>, step_size: SimTime) -> Self {
        Self::new(name, kind, Discipline::TimeBased { step_size })
    }

    pub fn event_based(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::new(name, kind, Discipline::EventBased)
    }

    pub fn hybrid(name: impl Into<String>, kind: impl Into<String>, step_size: SimTime) -> Self {
        Self::new(name, kind, Discipline::Hybrid { step_size })
    }

    pub fn with_input(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), initial.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), Value::Null);
        self
    }

    pub fn with_state(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.states.insert(name.into(), initial.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_trigger(mut self, name: impl Into<String>) -> Self {
        self.triggers.insert(name.into());
        self
    }

    pub fn with_scenario_data(mut self, data: impl Into<String>) -> Self {
        self.scenario_data = Some(data.into());
        self
    }

    /// Look up which declared set `attr` belongs to.
    pub fn attr_kind(&self, attr: &str) -> Option<AttrKind> {
        if self.inputs.contains_key(attr) {
            Some(AttrKind::Input)
        } else if self.outputs.contains_key(attr) {
            Some(AttrKind::Output)
        } else if self.states.contains_key(attr) {
            Some(AttrKind::State)
        } else {
            None
        }
    }

    pub fn has_input(&self, attr: &str) -> bool {
        self.inputs.contains_key(attr)
    }

    /// Outputs and states are both readable by downstream models.
    pub fn is_readable(&self, attr: &str) -> bool {
        self.outputs.contains_key(attr) || self.states.contains_key(attr)
    }

    pub fn is_trigger(&self, attr: &str) -> bool {
        self.triggers.contains(attr)
    }

    pub fn step_size(&self) -> Option<SimTime> {
        self.discipline.step_size()
    }

    /// Initial readable values: declared states plus non-null output initials.
    pub fn initial_outputs(&self) -> AttrMap {
        self.states
            .iter()
            .chain(self.outputs.iter())
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
