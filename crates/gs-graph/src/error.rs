//! Scenario construction and validation errors.

use gs_core::CoreError;
use thiserror::Error;

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building or freezing a scenario.
///
/// These only ever surface at build/freeze time, never in the middle of a run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Duplicate model: '{name}'")]
    DuplicateModel { name: String },

    #[error("Unknown model: '{name}'")]
    UnknownModel { name: String },

    #[error("Invalid spec for model '{model}': {what}")]
    InvalidSpec { model: String, what: String },

    #[error("Invalid connection {from} -> {to}: {what}")]
    InvalidEdge {
        from: String,
        to: String,
        what: String,
    },

    #[error("Cyclic dependency without a time-shifted edge: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("Mismatched list lengths in aligned mode: {fields:?} have lengths {lengths:?}")]
    MismatchedListLength {
        fields: Vec<String>,
        lengths: Vec<usize>,
    },

    #[error("Invalid time bounds: {what}")]
    InvalidTimeBounds { what: String },

    #[error("Scenario is frozen; cannot {action}")]
    FrozenScenario { action: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),
}
