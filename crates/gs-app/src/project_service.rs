//! Scenario loading and validation.

use std::path::Path;

use gs_batch::{ExpansionMode, expand};
use gs_graph::ScenarioConfig;
use gs_models::{FactoryError, ModelFactory};
use gs_project::ScenarioFile;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Shape of a validated scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub name: String,
    pub models: usize,
    pub edges: usize,
    pub async_requests: usize,
    pub monitored: usize,
    pub ticks: u64,
    /// Number of variants the batch section would expand to.
    pub variants: usize,
}

/// Expansion mode selected by the file's `batch` section.
pub(crate) fn expansion_mode(file: &ScenarioFile) -> ExpansionMode {
    ExpansionMode::from_align(file.batch.as_ref().is_some_and(|b| b.align_parameters))
}

/// Load and freeze a scenario file.
pub fn load_scenario(path: &Path) -> AppResult<(ScenarioFile, ScenarioConfig)> {
    if !path.exists() {
        return Err(AppError::ScenarioNotFound {
            path: path.to_path_buf(),
        });
    }
    let (file, mut builder) = gs_project::load_builder(path)?;
    let config = builder.freeze()?;
    debug!(scenario = config.name(), path = %path.display(), "scenario loaded");
    Ok((file, config))
}

/// Check a scenario file end to end without running it.
///
/// Beyond loading and freezing, every model type must be known to the
/// factory and the batch expansion must succeed.
pub fn validate_scenario(path: &Path, factory: &ModelFactory) -> AppResult<ScenarioSummary> {
    let (file, config) = load_scenario(path)?;

    for spec in config.models() {
        if !factory.supports(&spec.kind) {
            return Err(FactoryError::UnknownType {
                model: spec.name.clone(),
                kind: spec.kind.clone(),
            }
            .into());
        }
    }
    let variants = expand(&config, expansion_mode(&file))?;

    Ok(ScenarioSummary {
        name: config.name().to_string(),
        models: config.models().len(),
        edges: config.edges().len(),
        async_requests: config.async_requests().len(),
        monitored: config.monitored().len(),
        ticks: config.bounds().tick_count(),
        variants: variants.len(),
    })
}
