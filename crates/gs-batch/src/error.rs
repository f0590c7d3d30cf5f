//! Error types for batch execution.

use gs_graph::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Variant expansion failed: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {message}")]
    Pool { message: String },
}

pub type BatchResult<T> = Result<T, BatchError>;
