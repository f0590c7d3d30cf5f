//! Simulated time.
//!
//! The scheduler counts whole seconds from the scenario start. Wall-clock
//! timestamps only appear at the edges: scenario declaration and output.

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{CoreError, CoreResult};

/// Seconds since the scenario start.
pub type SimTime = u64;

/// Timestamp format used by scenario files and output time columns.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `"YYYY-MM-DD HH:MM:SS"` timestamp.
pub fn parse_timestamp(value: &str) -> CoreResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIME_FORMAT).map_err(|e| {
        CoreError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIME_FORMAT).to_string()
}

/// Round `t` up to the next multiple of `resolution`.
///
/// `None` when the aligned time does not fit in a `SimTime`.
pub fn align_up(t: SimTime, resolution: SimTime) -> Option<SimTime> {
    if resolution == 0 {
        return Some(t);
    }
    t.div_ceil(resolution).checked_mul(resolution)
}

/// Start/end of a scenario plus the tick resolution.
///
/// Construction does not validate; the scenario builder checks the bounds
/// at freeze time so the error carries scenario context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Tick length in seconds.
    pub resolution: SimTime,
}

impl TimeBounds {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, resolution: SimTime) -> Self {
        Self {
            start,
            end,
            resolution,
        }
    }

    /// Parse both bounds from scenario-file strings.
    pub fn parse(start: &str, end: &str, resolution: SimTime) -> CoreResult<Self> {
        Ok(Self::new(
            parse_timestamp(start)?,
            parse_timestamp(end)?,
            resolution,
        ))
    }

    /// Scenario length in seconds (0 if `end <= start`).
    pub fn duration(&self) -> SimTime {
        let secs = (self.end - self.start).num_seconds();
        if secs > 0 { secs as SimTime } else { 0 }
    }

    /// Number of ticks on the resolution grid in `[0, duration)`.
    pub fn tick_count(&self) -> u64 {
        if self.resolution == 0 {
            return 0;
        }
        self.duration().div_ceil(self.resolution)
    }

    /// Wall-clock timestamp of a simulated time.
    pub fn timestamp_at(&self, t: SimTime) -> NaiveDateTime {
        self.start + TimeDelta::seconds(t as i64)
    }
}
