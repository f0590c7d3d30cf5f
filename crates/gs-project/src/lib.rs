//! gs-project: scenario file format, validation and conversion.

pub mod convert;
pub mod schema;
pub mod validate;

pub use convert::{model_spec, to_builder};
pub use schema::*;
pub use validate::{ValidationError, validate_scenario};

use std::path::Path;

use gs_core::CoreError;
use gs_graph::{ConfigError, ScenarioBuilder};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid reference: {0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Parse and validate a scenario from YAML text.
pub fn from_yaml_str(content: &str) -> ProjectResult<ScenarioFile> {
    let file: ScenarioFile = serde_yaml::from_str(content)?;
    validate_scenario(&file)?;
    Ok(file)
}

pub fn load_yaml(path: &Path) -> ProjectResult<ScenarioFile> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, file: &ScenarioFile) -> ProjectResult<()> {
    validate_scenario(file)?;
    let content = serde_yaml::to_string(file)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load a scenario file and convert it into an unfrozen builder.
///
/// Relative scenario data paths resolve against the file's directory.
pub fn load_builder(path: &Path) -> ProjectResult<(ScenarioFile, ScenarioBuilder)> {
    let file = load_yaml(path)?;
    let builder = to_builder(&file, path.parent())?;
    Ok((file, builder))
}
