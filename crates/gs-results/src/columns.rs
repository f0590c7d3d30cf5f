//! Output column naming.
//!
//! A monitored `model.attr` becomes `<type>-<instance>.<type>_<index>-<attr>`:
//! `<instance>` counts simulator processes (always 0, every model runs in
//! this one) and `<index>` is the model's ordinal among models of the same
//! type, in declaration order.

use gs_core::AttrRef;
use gs_graph::ScenarioConfig;

use crate::{ResultsError, ResultsResult};

pub fn column_name(config: &ScenarioConfig, attr: &AttrRef) -> ResultsResult<String> {
    let spec = config
        .model(&attr.model)
        .ok_or_else(|| ResultsError::UnknownModel {
            name: attr.model.clone(),
        })?;
    let index = config
        .models()
        .iter()
        .filter(|m| m.kind == spec.kind)
        .position(|m| m.name == spec.name)
        .unwrap_or_default();
    Ok(format!(
        "{kind}-0.{kind}_{index}-{attr}",
        kind = spec.kind,
        attr = attr.attr
    ))
}

/// Header row: `time` followed by one column per monitored attribute.
pub fn column_names(config: &ScenarioConfig) -> ResultsResult<Vec<String>> {
    let mut names = vec!["time".to_string()];
    for attr in config.monitored() {
        names.push(column_name(config, attr)?);
    }
    Ok(names)
}
