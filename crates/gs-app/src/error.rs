//! Error types for the gs-app service layer.

use std::path::PathBuf;

/// Application error wrapping the backend crates behind one interface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Scenario file not found: {path}")]
    ScenarioNotFound { path: PathBuf },

    #[error("Scenario configuration error: {0}")]
    Config(String),

    #[error("Model construction failed: {0}")]
    Factory(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Batch error: {0}")]
    Batch(String),

    #[error("{failed} variant(s) failed and {abandoned} were abandoned; first failure: {first}")]
    VariantsFailed {
        failed: usize,
        abandoned: usize,
        first: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for gs-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<gs_project::ProjectError> for AppError {
    fn from(err: gs_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<gs_graph::ConfigError> for AppError {
    fn from(err: gs_graph::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<gs_models::FactoryError> for AppError {
    fn from(err: gs_models::FactoryError) -> Self {
        AppError::Factory(err.to_string())
    }
}

impl From<gs_sim::SimError> for AppError {
    fn from(err: gs_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<gs_results::ResultsError> for AppError {
    fn from(err: gs_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}

impl From<gs_batch::BatchError> for AppError {
    fn from(err: gs_batch::BatchError) -> Self {
        AppError::Batch(err.to_string())
    }
}
