//! gs-graph: scenario/graph layer for gridsim.
//!
//! Provides:
//! - Declared component contracts (`ModelSpec`, `Discipline`)
//! - The attribute-level dataflow graph with time-shifted edges
//! - An incremental scenario builder with cycle checks
//! - Frozen, validated `ScenarioConfig` snapshots
//!
//! # Example
//!
//! ```
//! use gs_graph::{ModelSpec, ScenarioBuilder};
//!
//! let mut builder =
//!     ScenarioBuilder::parse("demo", "2012-01-01 00:00:00", "2012-01-01 01:00:00", 900).unwrap();
//! builder
//!     .add_model(ModelSpec::time_based("pv", "constant", 900).with_output("p"))
//!     .unwrap();
//! builder
//!     .add_model(ModelSpec::time_based("battery", "battery", 900).with_input("p_set", 0.0))
//!     .unwrap();
//! builder
//!     .add_connection("pv.p".parse().unwrap(), "battery.p_set".parse().unwrap(), false)
//!     .unwrap();
//! let config = builder.freeze().unwrap();
//!
//! assert_eq!(config.models().len(), 2);
//! assert_eq!(config.edges().len(), 1);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod model;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::ScenarioBuilder;
pub use config::ScenarioConfig;
pub use error::{ConfigError, ConfigResult};
pub use graph::{AsyncRequest, DataflowGraph, Edge};
pub use model::{AttrKind, Discipline, ModelSpec};
