//! gs-models: reference component simulators for gridsim.
//!
//! Provides thin adapters for common energy-system components:
//! - `Constant` sources
//! - `Profile` time series read from CSV scenario data
//! - `Battery` storage with SOC and power limits
//! - `Controller` steering a battery towards a target net load
//!
//! The `ModelFactory` maps a declared model type to a constructor and
//! builds the per-run `ComponentRegistry` for a frozen scenario.
//!
//! # Example
//!
//! ```
//! use gs_graph::{ModelSpec, ScenarioBuilder};
//! use gs_models::ModelFactory;
//!
//! let mut builder = ScenarioBuilder::parse(
//!     "demo",
//!     "2012-01-01 00:00:00",
//!     "2012-01-01 01:00:00",
//!     900,
//! )
//! .unwrap();
//! builder
//!     .add_model(
//!         ModelSpec::time_based("load", "constant", 900)
//!             .with_output("p")
//!             .with_param("value", 3.0),
//!     )
//!     .unwrap();
//! let config = builder.freeze().unwrap();
//!
//! let registry = ModelFactory::with_builtins().build_registry(&config).unwrap();
//! assert_eq!(registry.len(), 1);
//! ```

pub mod battery;
mod common;
pub mod constant;
pub mod controller;
pub mod error;
pub mod factory;
pub mod profile;

// Re-exports
pub use battery::Battery;
pub use constant::Constant;
pub use controller::Controller;
pub use error::{FactoryError, FactoryResult};
pub use factory::ModelFactory;
pub use profile::Profile;
