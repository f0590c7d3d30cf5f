//! Constant source.

use gs_core::{AttrMap, SimTime, Value};
use gs_graph::ModelSpec;
use gs_sim::{Model, ModelResult, StepContext};

use crate::error::{FactoryError, FactoryResult};

/// Emits fixed values on every declared output.
///
/// Each output takes the parameter of the same name, falling back to the
/// `value` parameter.
#[derive(Debug, Clone)]
pub struct Constant {
    values: AttrMap,
}

impl Constant {
    pub fn new(values: AttrMap) -> Self {
        Self { values }
    }

    pub fn from_spec(spec: &ModelSpec) -> FactoryResult<Self> {
        let fallback = spec.parameters.get("value").filter(|v| !v.is_null());
        let mut values = AttrMap::new();
        for output in spec.outputs.keys() {
            let value = spec
                .parameters
                .get(output)
                .filter(|v| !v.is_null())
                .or(fallback)
                .ok_or_else(|| FactoryError::InvalidParameter {
                    model: spec.name.clone(),
                    key: output.clone(),
                    what: "no value for output (set it or 'value')".to_string(),
                })?;
            values.insert(output.clone(), value.clone());
        }
        Ok(Self::new(values))
    }

    pub fn value(&self, output: &str) -> Option<&Value> {
        self.values.get(output)
    }
}

impl Model for Constant {
    fn step(&mut self, _ctx: &mut StepContext<'_>) -> ModelResult<Option<SimTime>> {
        Ok(None)
    }

    fn outputs(&self) -> AttrMap {
        self.values.clone()
    }
}
