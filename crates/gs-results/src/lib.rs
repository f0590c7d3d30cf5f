//! gs-results: per-variant output time series.

pub mod columns;
pub mod export;
pub mod types;

pub use columns::{column_name, column_names};
pub use export::{export_csv, variant_path, write_csv};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Monitored model not in scenario: {name}")]
    UnknownModel { name: String },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
