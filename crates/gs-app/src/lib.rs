//! Shared application service layer for gridsim.
//!
//! Both CLI entry points go through here: load a scenario file, build its
//! models, run the scheduler and persist the monitored series, for a single
//! scenario or a batch of expanded variants.

pub mod error;
pub mod progress;
pub mod project_service;
pub mod run_service;

pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage};
pub use project_service::{ScenarioSummary, load_scenario, validate_scenario};
pub use run_service::{RunOptions, run_config, run_parallel, run_scenario};
