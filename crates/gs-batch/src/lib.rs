//! gs-batch: scenario variant expansion and share-nothing batch execution.
//!
//! List-valued parameters and states of a frozen scenario are expanded into
//! concrete variants, either as a cartesian product or zipped positionally.
//! Variants are split into contiguous blocks, one per worker; each worker
//! runs its block sequentially and never touches another worker's state.

pub mod error;
pub mod expand;
pub mod partition;
pub mod runner;

pub use error::{BatchError, BatchResult};
pub use expand::{ExpansionMode, FieldKind, ListField, ScenarioVariant, expand, list_fields};
pub use partition::partition;
pub use runner::{BatchReport, BatchRunner, VariantFailure};
