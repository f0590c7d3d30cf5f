//! Parameter helpers shared by the reference models.

use gs_core::{AttrMap, Value};
use gs_graph::ModelSpec;

use crate::error::{FactoryError, FactoryResult};

fn invalid(spec: &ModelSpec, key: &str, what: impl Into<String>) -> FactoryError {
    FactoryError::InvalidParameter {
        model: spec.name.clone(),
        key: key.to_string(),
        what: what.into(),
    }
}

/// Numeric parameter, `None` if absent or null.
pub(crate) fn param_f64(spec: &ModelSpec, key: &str) -> FactoryResult<Option<f64>> {
    match spec.parameters.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(spec, key, format!("expected a number, got '{}'", v))),
    }
}

pub(crate) fn param_or(spec: &ModelSpec, key: &str, default: f64) -> FactoryResult<f64> {
    Ok(param_f64(spec, key)?.unwrap_or(default))
}

pub(crate) fn require_param(spec: &ModelSpec, key: &str) -> FactoryResult<f64> {
    param_f64(spec, key)?.ok_or_else(|| invalid(spec, key, "required"))
}

/// Fails unless `value` lies in `range`.
pub(crate) fn check_range(
    spec: &ModelSpec,
    key: &str,
    value: f64,
    range: std::ops::RangeInclusive<f64>,
) -> FactoryResult<f64> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(invalid(
            spec,
            key,
            format!(
                "{} is outside [{}, {}]",
                value,
                range.start(),
                range.end()
            ),
        ))
    }
}

/// Step length in hours for models that integrate over time.
pub(crate) fn step_hours(spec: &ModelSpec) -> FactoryResult<f64> {
    spec.step_size()
        .map(|s| s as f64 / 3600.0)
        .ok_or_else(|| FactoryError::Unsupported {
            model: spec.name.clone(),
            what: format!("type '{}' needs a step_size", spec.kind),
        })
}

/// Declared readable attributes (outputs and states), in key order.
pub(crate) fn readable(spec: &ModelSpec) -> Vec<String> {
    spec.outputs
        .keys()
        .chain(spec.states.keys())
        .cloned()
        .collect()
}

/// Keep only the entries of `values` whose key is in `keys`.
pub(crate) fn select(keys: &[String], values: impl IntoIterator<Item = (String, Value)>) -> AttrMap {
    values
        .into_iter()
        .filter(|(k, _)| keys.contains(k))
        .collect()
}
