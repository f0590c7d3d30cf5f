//! Run summaries reported to callers.

use std::path::PathBuf;

use gs_core::AttrMap;
use serde::{Deserialize, Serialize};

/// What one finished (or failed) scenario run produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub scenario: String,
    /// Variant id in batch mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<usize>,
    /// Values chosen for expanded list fields, keyed `model.field`.
    #[serde(default, skip_serializing_if = "AttrMap::is_empty")]
    pub assignments: AttrMap,
    pub ticks: usize,
    pub steps: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl RunRecord {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
