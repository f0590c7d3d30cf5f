use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid timestamp '{value}' (expected YYYY-MM-DD HH:MM:SS): {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("Invalid attribute reference '{value}' (expected <model>.<attr>)")]
    InvalidAttrRef { value: String },
}
