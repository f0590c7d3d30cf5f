//! Battery storage with SOC tracking.

use gs_core::{AttrMap, SimTime, Value};
use gs_graph::ModelSpec;
use gs_sim::{Model, ModelError, ModelResult, StepContext};
use tracing::trace;

use crate::common::{check_range, param_f64, param_or, readable, require_param, select, step_hours};
use crate::error::FactoryResult;

/// Input carrying the power setpoint in kW.
pub const SETPOINT: &str = "p_set";

/// Battery energy storage.
///
/// Power convention: positive = charging (load), negative = discharging.
/// The setpoint is limited by the power ratings and by the energy the SOC
/// allows within one step; `p` reports the power actually applied.
#[derive(Debug, Clone)]
pub struct Battery {
    pub capacity_kwh: f64,
    /// State of charge as a fraction (0..1).
    pub soc: f64,
    pub max_charge_kw: f64,
    pub max_discharge_kw: f64,
    pub eta_c: f64,
    pub eta_d: f64,
    dt_hours: f64,
    power_kw: f64,
    readable: Vec<String>,
}

impl Battery {
    /// Parameters: `capacity_kwh` (required), `max_charge_kw`,
    /// `max_discharge_kw` (default: one full capacity per hour), `eta_c`,
    /// `eta_d` (default 1.0). Initial SOC comes from the `soc` state,
    /// falling back to the `soc` parameter and then 0.5.
    pub fn from_spec(spec: &ModelSpec) -> FactoryResult<Self> {
        let capacity_kwh = check_range(
            spec,
            "capacity_kwh",
            require_param(spec, "capacity_kwh")?,
            f64::MIN_POSITIVE..=f64::MAX,
        )?;
        let soc = match spec.states.get("soc").and_then(Value::as_f64) {
            Some(soc) => soc,
            None => param_f64(spec, "soc")?.unwrap_or(0.5),
        };
        let max_charge_kw = param_or(spec, "max_charge_kw", capacity_kwh)?;
        let max_discharge_kw = param_or(spec, "max_discharge_kw", capacity_kwh)?;
        let eta_c = param_or(spec, "eta_c", 1.0)?;
        let eta_d = param_or(spec, "eta_d", 1.0)?;

        Ok(Self {
            capacity_kwh,
            soc: check_range(spec, "soc", soc, 0.0..=1.0)?,
            max_charge_kw: check_range(spec, "max_charge_kw", max_charge_kw, 0.0..=f64::MAX)?,
            max_discharge_kw: check_range(
                spec,
                "max_discharge_kw",
                max_discharge_kw,
                0.0..=f64::MAX,
            )?,
            eta_c: check_range(spec, "eta_c", eta_c, f64::MIN_POSITIVE..=1.0)?,
            eta_d: check_range(spec, "eta_d", eta_d, f64::MIN_POSITIVE..=1.0)?,
            dt_hours: step_hours(spec)?,
            power_kw: 0.0,
            readable: readable(spec),
        })
    }

    /// Apply a setpoint for one step and return the actual power.
    pub fn apply(&mut self, setpoint_kw: f64) -> f64 {
        let cmd_kw = if setpoint_kw >= 0.0 {
            setpoint_kw.min(self.max_charge_kw)
        } else {
            setpoint_kw.max(-self.max_discharge_kw)
        };

        let actual_kw = if cmd_kw > 0.0 {
            let headroom_kwh = (1.0 - self.soc) * self.capacity_kwh / self.eta_c;
            let actual = cmd_kw.min((headroom_kwh / self.dt_hours).max(0.0));
            self.soc += actual * self.dt_hours * self.eta_c / self.capacity_kwh;
            actual
        } else if cmd_kw < 0.0 {
            let available_kwh = self.soc * self.capacity_kwh * self.eta_d;
            let actual = (-cmd_kw).min((available_kwh / self.dt_hours).max(0.0));
            self.soc -= actual * self.dt_hours / (self.capacity_kwh * self.eta_d);
            -actual
        } else {
            0.0
        };

        self.soc = self.soc.clamp(0.0, 1.0);
        self.power_kw = actual_kw;
        actual_kw
    }
}

impl Model for Battery {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Option<SimTime>> {
        let setpoint = match ctx.input(SETPOINT) {
            None => 0.0,
            Some(v) => v.as_f64().ok_or_else(|| ModelError::InvalidValue {
                attr: SETPOINT.to_string(),
                what: format!("expected kW, got '{}'", v),
            })?,
        };
        if !setpoint.is_finite() {
            return Err(ModelError::InvalidValue {
                attr: SETPOINT.to_string(),
                what: "setpoint is not finite".to_string(),
            });
        }
        let actual = self.apply(setpoint);
        trace!(time = ctx.time, setpoint, actual, soc = self.soc, "battery step");
        Ok(None)
    }

    fn outputs(&self) -> AttrMap {
        select(
            &self.readable,
            [
                ("soc".to_string(), Value::Float(self.soc)),
                ("p".to_string(), Value::Float(self.power_kw)),
            ],
        )
    }
}
