//! Time series source read from CSV scenario data.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use gs_core::{AttrMap, SimTime, Value};
use gs_graph::ModelSpec;
use gs_sim::{Model, ModelResult, StepContext};

use crate::common::param_or;
use crate::error::{FactoryError, FactoryResult};

/// Replays a piecewise-constant time series.
///
/// The CSV has a `time` column (seconds since scenario start, ascending)
/// and one column per declared output. At time `t` each output holds the
/// value of the last row with `time <= t`; before the first row, the first
/// row's value. Numeric values are multiplied by the `scale` parameter.
#[derive(Debug, Clone)]
pub struct Profile {
    times: Vec<SimTime>,
    /// `columns[i][row]`, aligned with `names`.
    columns: Vec<Vec<f64>>,
    names: Vec<String>,
    current: AttrMap,
}

impl Profile {
    /// Load the CSV named by the model's `scenario_data`.
    pub fn from_spec(spec: &ModelSpec) -> FactoryResult<Self> {
        let path = spec
            .scenario_data
            .as_deref()
            .ok_or_else(|| FactoryError::Unsupported {
                model: spec.name.clone(),
                what: "profile needs scenario_data".to_string(),
            })?;
        let file = File::open(Path::new(path)).map_err(|e| data_error(spec, path, e))?;
        Self::from_reader(spec, path, file)
    }

    /// Parse CSV from any reader; `origin` is only used in error messages.
    pub fn from_reader(spec: &ModelSpec, origin: &str, reader: impl Read) -> FactoryResult<Self> {
        let scale = param_or(spec, "scale", 1.0)?;
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| data_error(spec, origin, e))?
            .clone();

        let time_col = headers
            .iter()
            .position(|h| h == "time")
            .ok_or_else(|| data_error(spec, origin, "missing 'time' column"))?;
        let names: Vec<String> = spec.outputs.keys().cloned().collect();
        let col_index = names
            .iter()
            .map(|name| {
                headers
                    .iter()
                    .position(|h| h == name.as_str())
                    .ok_or_else(|| data_error(spec, origin, format!("missing column '{}'", name)))
            })
            .collect::<FactoryResult<Vec<_>>>()?;

        let mut times = Vec::new();
        let mut columns = vec![Vec::new(); names.len()];
        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| data_error(spec, origin, e))?;
            let cell = |idx: usize| record.get(idx).unwrap_or_default();
            let time: SimTime = cell(time_col).parse().map_err(|_| {
                data_error(
                    spec,
                    origin,
                    format!("row {}: bad time '{}'", row + 1, cell(time_col)),
                )
            })?;
            if times.last().is_some_and(|&prev| time <= prev) {
                return Err(data_error(
                    spec,
                    origin,
                    format!("row {}: time {} is not ascending", row + 1, time),
                ));
            }
            times.push(time);
            for (col, &idx) in col_index.iter().enumerate() {
                let value: f64 = cell(idx).parse().map_err(|_| {
                    data_error(
                        spec,
                        origin,
                        format!("row {}: bad value '{}' for '{}'", row + 1, cell(idx), names[col]),
                    )
                })?;
                columns[col].push(value * scale);
            }
        }
        if times.is_empty() {
            return Err(data_error(spec, origin, "no rows"));
        }

        Ok(Self {
            times,
            columns,
            names,
            current: AttrMap::new(),
        })
    }

    fn row_at(&self, t: SimTime) -> usize {
        self.times.partition_point(|&rt| rt <= t).saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}

fn data_error(spec: &ModelSpec, path: &str, message: impl ToString) -> FactoryError {
    FactoryError::Data {
        model: spec.name.clone(),
        path: path.to_string(),
        message: message.to_string(),
    }
}

impl Model for Profile {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Option<SimTime>> {
        let row = self.row_at(ctx.time);
        self.current = self
            .names
            .iter()
            .zip(&self.columns)
            .map(|(name, col)| (name.clone(), Value::Float(col[row])))
            .collect();
        Ok(None)
    }

    fn outputs(&self) -> AttrMap {
        self.current.clone()
    }
}
