//! gs-core: shared vocabulary for gridsim.
//!
//! Contains:
//! - value (dynamically typed attribute values exchanged between models)
//! - time (simulated clock, scenario bounds, timestamp parsing)
//! - attr (`"<model>.<attr>"` references)
//! - error (shared error types)

pub mod attr;
pub mod error;
pub mod time;
pub mod value;

pub use attr::AttrRef;
pub use error::{CoreError, CoreResult};
pub use time::{SimTime, TIME_FORMAT, TimeBounds, align_up, format_timestamp, parse_timestamp};
pub use value::{AttrMap, Value};
