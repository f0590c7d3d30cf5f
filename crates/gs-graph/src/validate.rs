//! Scenario validation logic.

use gs_core::{AttrRef, TimeBounds};
use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::graph::{AsyncRequest, DataflowGraph};
use crate::model::{Discipline, ModelSpec};

/// Validate a single model declaration against the scenario resolution.
pub(crate) fn validate_spec(spec: &ModelSpec, resolution: u64) -> ConfigResult<()> {
    let invalid = |what: String| ConfigError::InvalidSpec {
        model: spec.name.clone(),
        what,
    };

    if spec.name.is_empty() {
        return Err(invalid("model name must not be empty".to_string()));
    }
    if spec.name.contains('.') {
        return Err(invalid("model name must not contain '.'".to_string()));
    }
    if spec.kind.is_empty() {
        return Err(invalid("model type must not be empty".to_string()));
    }

    // Attribute names are unique across inputs, outputs and states
    let mut seen = HashSet::new();
    for name in spec
        .inputs
        .keys()
        .chain(spec.outputs.keys())
        .chain(spec.states.keys())
    {
        if name.is_empty() {
            return Err(invalid("attribute names must not be empty".to_string()));
        }
        if !seen.insert(name.as_str()) {
            return Err(invalid(format!("attribute '{}' declared more than once", name)));
        }
    }

    for trigger in &spec.triggers {
        if !spec.inputs.contains_key(trigger) && !spec.outputs.contains_key(trigger) {
            return Err(invalid(format!(
                "trigger '{}' is not a declared input or output",
                trigger
            )));
        }
    }

    match spec.discipline {
        Discipline::TimeBased { step_size } | Discipline::Hybrid { step_size } => {
            if step_size == 0 {
                return Err(invalid("step_size must be positive".to_string()));
            }
            if resolution > 0 && step_size % resolution != 0 {
                return Err(invalid(format!(
                    "step_size {}s is not a multiple of the resolution {}s",
                    step_size, resolution
                )));
            }
        }
        Discipline::EventBased => {}
    }

    if spec.discipline.reacts_to_triggers() && spec.triggers.is_empty() {
        return Err(invalid(
            "event-based and hybrid models must declare at least one trigger".to_string(),
        ));
    }

    Ok(())
}

pub(crate) fn validate_bounds(bounds: &TimeBounds) -> ConfigResult<()> {
    if bounds.end <= bounds.start {
        return Err(ConfigError::InvalidTimeBounds {
            what: format!(
                "end_time {} must be after start_time {}",
                bounds.end, bounds.start
            ),
        });
    }
    if bounds.resolution == 0 {
        return Err(ConfigError::InvalidTimeBounds {
            what: "resolution must be positive".to_string(),
        });
    }
    Ok(())
}

/// Check that `from` is a readable attr and `to` an input, on existing models.
pub(crate) fn validate_edge_endpoints(
    graph: &DataflowGraph,
    from: &AttrRef,
    to: &AttrRef,
) -> ConfigResult<()> {
    let invalid = |what: String| ConfigError::InvalidEdge {
        from: from.to_string(),
        to: to.to_string(),
        what,
    };

    let src = graph
        .model(&from.model)
        .ok_or_else(|| ConfigError::UnknownModel {
            name: from.model.clone(),
        })?;
    let dst = graph
        .model(&to.model)
        .ok_or_else(|| ConfigError::UnknownModel {
            name: to.model.clone(),
        })?;

    if !src.is_readable(&from.attr) {
        return Err(invalid(format!(
            "'{}' is not a declared output or state of '{}'",
            from.attr, from.model
        )));
    }
    if !dst.has_input(&to.attr) {
        return Err(invalid(format!(
            "'{}' is not a declared input of '{}'",
            to.attr, to.model
        )));
    }
    Ok(())
}

pub(crate) fn validate_async(graph: &DataflowGraph, request: &AsyncRequest) -> ConfigResult<()> {
    for (src_attr, dst_attr) in &request.pairs {
        validate_edge_endpoints(
            graph,
            &AttrRef::new(&request.source, src_attr),
            &AttrRef::new(&request.dest, dst_attr),
        )?;
    }
    Ok(())
}

pub(crate) fn validate_monitor(graph: &DataflowGraph, attr: &AttrRef) -> ConfigResult<()> {
    let spec = graph
        .model(&attr.model)
        .ok_or_else(|| ConfigError::UnknownModel {
            name: attr.model.clone(),
        })?;
    if spec.attr_kind(&attr.attr).is_none() {
        return Err(ConfigError::InvalidSpec {
            model: attr.model.clone(),
            what: format!("monitored attribute '{}' is not declared", attr.attr),
        });
    }
    Ok(())
}
