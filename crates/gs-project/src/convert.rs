//! Scenario file -> `ScenarioBuilder`.

use std::path::Path;

use gs_core::AttrRef;
use gs_graph::{Discipline, ModelSpec, ScenarioBuilder};
use tracing::debug;

use crate::ProjectResult;
use crate::schema::{DisciplineDef, ModelDef, ScenarioFile};

/// Model declaration with defaults applied.
///
/// Relative `scenario_data` paths are resolved against `base_dir`.
pub fn model_spec(def: &ModelDef, resolution: u64, base_dir: Option<&Path>) -> ModelSpec {
    let step_size = def.step_size.unwrap_or(resolution);
    let discipline = match def.discipline {
        DisciplineDef::TimeBased => Discipline::TimeBased { step_size },
        DisciplineDef::EventBased => Discipline::EventBased,
        DisciplineDef::Hybrid => Discipline::Hybrid { step_size },
    };

    let mut spec = ModelSpec::new(def.name.clone(), def.kind.clone(), discipline);
    spec.inputs = def.inputs.to_map();
    spec.outputs = def.outputs.to_map();
    spec.states = def.states.clone();
    spec.parameters = def.parameters.clone();
    spec.triggers = def.triggers.iter().cloned().collect();
    spec.scenario_data = def.scenario_data.as_ref().map(|data| {
        let path = Path::new(data);
        match base_dir {
            Some(base) if path.is_relative() => base.join(path).to_string_lossy().into_owned(),
            _ => data.clone(),
        }
    });
    spec
}

/// Build an unfrozen scenario from a parsed file.
///
/// Connections are added in declaration order: each model's `connect`
/// list in model order, then the top-level `connections`.
pub fn to_builder(file: &ScenarioFile, base_dir: Option<&Path>) -> ProjectResult<ScenarioBuilder> {
    let def = &file.scenario;
    let mut builder =
        ScenarioBuilder::parse(&def.name, &def.start_time, &def.end_time, def.resolution)?;

    for model in &file.models {
        builder.add_model(model_spec(model, def.resolution, base_dir))?;
    }

    for model in &file.models {
        for conn in &model.connect {
            let from = AttrRef::new(model.name.clone(), conn.from.clone());
            builder.add_connection(from, conn.to.parse()?, conn.time_shifted)?;
        }
    }
    for conn in &file.connections {
        builder.add_connection(conn.from.parse()?, conn.to.parse()?, conn.time_shifted)?;
    }

    for request in &file.async_requests {
        builder.register_async(
            &request.source,
            &request.dest,
            request.attrs.iter().map(|(a, b)| (a.clone(), b.clone())),
        )?;
    }
    for reference in &file.monitor {
        builder.monitor(reference.parse()?)?;
    }

    debug!(
        scenario = %def.name,
        models = file.models.len(),
        "scenario file converted"
    );
    Ok(builder)
}
