//! Scenario file schema.

use gs_core::AttrMap;
use serde::{Deserialize, Serialize};

/// Default tick resolution in seconds.
pub const DEFAULT_RESOLUTION: u64 = 60;

fn default_resolution() -> u64 {
    DEFAULT_RESOLUTION
}

fn is_false(v: &bool) -> bool {
    !*v
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioFile {
    pub scenario: ScenarioDef,
    #[serde(default)]
    pub models: Vec<ModelDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
    #[serde(default)]
    pub async_requests: Vec<AsyncRequestDef>,
    #[serde(default)]
    pub monitor: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScenarioDef {
    pub name: String,
    /// `"YYYY-MM-DD HH:MM:SS"`
    pub start_time: String,
    pub end_time: String,
    #[serde(default = "default_resolution")]
    pub resolution: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Defaults to the scenario resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<u64>,
    #[serde(default)]
    pub discipline: DisciplineDef,
    #[serde(default)]
    pub inputs: AttrDecl,
    #[serde(default)]
    pub outputs: AttrDecl,
    #[serde(default)]
    pub parameters: AttrMap,
    #[serde(default)]
    pub states: AttrMap,
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_data: Option<String>,
    /// Outgoing connections declared on the producing model.
    #[serde(default)]
    pub connect: Vec<LocalConnectionDef>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisciplineDef {
    #[default]
    TimeBased,
    EventBased,
    Hybrid,
}

/// Attribute declaration: either bare names or names with initial values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AttrDecl {
    Names(Vec<String>),
    Values(AttrMap),
}

impl Default for AttrDecl {
    fn default() -> Self {
        AttrDecl::Names(Vec::new())
    }
}

impl AttrDecl {
    /// Names map to `Null` initial values.
    pub fn to_map(&self) -> AttrMap {
        match self {
            AttrDecl::Names(names) => names
                .iter()
                .map(|n| (n.clone(), gs_core::Value::Null))
                .collect(),
            AttrDecl::Values(map) => map.clone(),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            AttrDecl::Names(names) => names.iter().map(String::as_str).collect(),
            AttrDecl::Values(map) => map.keys().map(String::as_str).collect(),
        }
    }
}

/// `from`/`to` are `"<model>.<attr>"` references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub time_shifted: bool,
}

/// `from` is an attribute of the declaring model; `to` is `"<model>.<attr>"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalConnectionDef {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub time_shifted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AsyncRequestDef {
    pub source: String,
    pub dest: String,
    /// `[source_attr, dest_attr]` pairs.
    pub attrs: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchDef {
    /// Zip list-valued fields instead of taking their product.
    #[serde(default)]
    pub align_parameters: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}
