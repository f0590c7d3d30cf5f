//! Error types for simulation runs.

use gs_core::SimTime;
use gs_graph::ConfigError;
use thiserror::Error;

/// Errors a model implementation reports from `step`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Missing input '{attr}'")]
    MissingInput { attr: String },

    #[error("Invalid value for '{attr}': {what}")]
    InvalidValue { attr: String, what: String },

    #[error("Invalid parameter '{key}': {what}")]
    InvalidParameter { key: String, what: String },

    #[error("{message}")]
    Failed { message: String },
}

impl ModelError {
    /// The attribute or parameter the error is about, if any.
    pub fn attr(&self) -> Option<&str> {
        match self {
            ModelError::MissingInput { attr } | ModelError::InvalidValue { attr, .. } => {
                Some(attr)
            }
            ModelError::InvalidParameter { key, .. } => Some(key),
            ModelError::Failed { .. } => None,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;

/// A fatal failure while stepping one model.
///
/// Carries enough context (model, tick, attribute) to report the failure
/// without the run's internal state.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Model '{model}' failed at t={time}s{}: {cause}", attr_suffix(.attr))]
pub struct StepError {
    pub model: String,
    pub time: SimTime,
    pub attr: Option<String>,
    pub cause: String,
}

fn attr_suffix(attr: &Option<String>) -> String {
    attr.as_ref()
        .map(|a| format!(" (attr '{}')", a))
        .unwrap_or_default()
}

impl StepError {
    pub fn new(model: impl Into<String>, time: SimTime, cause: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            time,
            attr: None,
            cause: cause.into(),
        }
    }

    pub fn with_attr(mut self, attr: impl Into<String>) -> Self {
        self.attr = Some(attr.into());
        self
    }
}

/// Errors encountered while setting up or running a scheduler.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Step failed: {0}")]
    Step(#[from] StepError),

    #[error("No model instance registered for '{name}'")]
    MissingModel { name: String },

    #[error("Model instance '{name}' is not declared in the scenario")]
    UndeclaredModel { name: String },

    #[error("Scheduler for '{scenario}' has already run")]
    AlreadyRun { scenario: String },
}

pub type SimResult<T> = Result<T, SimError>;
