//! Threshold controller steering a battery towards a target net load.

use gs_core::{AttrMap, SimTime, Value};
use gs_graph::ModelSpec;
use gs_sim::{Model, ModelResult, StepContext};

use crate::common::{check_range, param_f64, param_or, readable, select};
use crate::error::FactoryResult;

/// Net load without the battery, kW (consumption minus generation).
pub const NET_LOAD: &str = "net_load";
/// Battery state of charge, fraction.
pub const SOC: &str = "soc";
/// Output: battery power setpoint, kW (positive = charge).
pub const SETPOINT: &str = "flow2b";

/// Computes a battery setpoint so that `net_load + setpoint` tracks
/// `target_kw`, stopping at the SOC band `[soc_min, soc_max]`.
///
/// The setpoint usually reaches the battery through an async request or a
/// time-shifted edge, so it takes effect on the battery's next step.
#[derive(Debug, Clone)]
pub struct Controller {
    pub target_kw: f64,
    pub soc_min: f64,
    pub soc_max: f64,
    pub max_kw: Option<f64>,
    setpoint_kw: f64,
    readable: Vec<String>,
}

impl Controller {
    pub fn from_spec(spec: &ModelSpec) -> FactoryResult<Self> {
        let soc_min = check_range(spec, "soc_min", param_or(spec, "soc_min", 0.1)?, 0.0..=1.0)?;
        let soc_max = check_range(spec, "soc_max", param_or(spec, "soc_max", 0.9)?, soc_min..=1.0)?;
        let max_kw = match param_f64(spec, "max_kw")? {
            Some(kw) => Some(check_range(spec, "max_kw", kw, 0.0..=f64::MAX)?),
            None => None,
        };
        Ok(Self {
            target_kw: param_or(spec, "target_kw", 0.0)?,
            soc_min,
            soc_max,
            max_kw,
            setpoint_kw: 0.0,
            readable: readable(spec),
        })
    }

    /// Setpoint for a given net load and (optionally known) SOC.
    pub fn setpoint(&self, net_load_kw: f64, soc: Option<f64>) -> f64 {
        let mut kw = self.target_kw - net_load_kw;
        if let Some(max) = self.max_kw {
            kw = kw.clamp(-max, max);
        }
        match soc {
            Some(soc) if kw > 0.0 && soc >= self.soc_max => 0.0,
            Some(soc) if kw < 0.0 && soc <= self.soc_min => 0.0,
            _ => kw,
        }
    }
}

impl Model for Controller {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Option<SimTime>> {
        let net_load = ctx.input_f64(NET_LOAD)?;
        let soc = ctx.input(SOC).and_then(Value::as_f64);
        self.setpoint_kw = self.setpoint(net_load, soc);
        Ok(None)
    }

    fn outputs(&self) -> AttrMap {
        select(
            &self.readable,
            [(SETPOINT.to_string(), Value::Float(self.setpoint_kw))],
        )
    }
}
