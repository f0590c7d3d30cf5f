//! Discrete-time co-simulation engine for gridsim.
//!
//! Provides:
//! - The `Model` contract every component simulator implements
//! - A per-run `ComponentRegistry` of live model instances
//! - The `AsyncChannel` for out-of-band, last-write-wins writes
//! - The tick-driven `Scheduler` and its monitor log

pub mod channel;
pub mod error;
pub mod model;
pub mod monitor;
pub mod registry;
pub mod scheduler;

// Re-exports for public API
pub use channel::{AsyncChannel, ChannelError};
pub use error::{ModelError, ModelResult, SimError, SimResult, StepError};
pub use model::{Model, StepContext};
pub use monitor::{MonitorLog, MonitorRow};
pub use registry::ComponentRegistry;
pub use scheduler::{ModelState, RunSummary, Scheduler};
