//! Recorded values of monitored attributes, one row per executed tick.

use gs_core::{AttrRef, SimTime, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorRow {
    pub time: SimTime,
    /// One value per monitored column, `Null` if not yet produced.
    pub values: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorLog {
    columns: Vec<AttrRef>,
    rows: Vec<MonitorRow>,
}

impl MonitorLog {
    pub fn new(columns: Vec<AttrRef>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[AttrRef] {
        &self.columns
    }

    pub fn rows(&self) -> &[MonitorRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(crate) fn push(&mut self, row: MonitorRow) {
        debug_assert_eq!(row.values.len(), self.columns.len());
        self.rows.push(row);
    }

    /// `(time, value)` pairs for one monitored attribute.
    pub fn series(&self, attr: &AttrRef) -> Option<Vec<(SimTime, &Value)>> {
        let col = self.columns.iter().position(|c| c == attr)?;
        Some(
            self.rows
                .iter()
                .map(|row| (row.time, &row.values[col]))
                .collect(),
        )
    }
}
