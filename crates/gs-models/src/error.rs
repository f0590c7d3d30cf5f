//! Error types for model construction.

use thiserror::Error;

/// Errors raised while turning a `ModelSpec` into a live model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FactoryError {
    #[error("Unknown model type '{kind}' for model '{model}'")]
    UnknownType { model: String, kind: String },

    #[error("Model '{model}': invalid parameter '{key}': {what}")]
    InvalidParameter {
        model: String,
        key: String,
        what: String,
    },

    #[error("Model '{model}': cannot load scenario data '{path}': {message}")]
    Data {
        model: String,
        path: String,
        message: String,
    },

    #[error("Model '{model}': {what}")]
    Unsupported { model: String, what: String },
}

pub type FactoryResult<T> = Result<T, FactoryError>;
