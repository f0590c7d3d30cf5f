//! The contract every component simulator implements.

use gs_core::{AttrMap, SimTime, Value};

use crate::error::{ModelError, ModelResult};

/// A component simulator driven by the scheduler.
///
/// The scheduler only ever calls these two methods. Everything else a model
/// needs (parameters, initial states, triggers, discipline) is declared up
/// front in its `ModelSpec` and handed to the constructor.
///
/// Implementations need not be reentrant: within a run a model is stepped
/// strictly sequentially.
pub trait Model {
    /// Advance the model to `ctx.time` using `ctx.inputs`.
    ///
    /// Returns the next time the model wants to be stepped. `None` means
    /// "use my declared schedule" for time-based models and "wait for a
    /// trigger" for event-based ones. A returned time must lie strictly
    /// after `ctx.time`.
    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Option<SimTime>>;

    /// Current values of the model's outputs and states.
    ///
    /// Keys must be declared outputs or states.
    fn outputs(&self) -> AttrMap;
}

/// Everything a model sees during one step.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Current simulated time (seconds since scenario start).
    pub time: SimTime,
    /// Gathered inputs for this step.
    pub inputs: &'a AttrMap,
    /// Latest time the model may advance to before its producers step again.
    pub max_advance: SimTime,
    step_size: Option<SimTime>,
    published: Vec<(String, String, Value)>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        time: SimTime,
        inputs: &'a AttrMap,
        max_advance: SimTime,
        step_size: Option<SimTime>,
    ) -> Self {
        Self {
            time,
            inputs,
            max_advance,
            step_size,
            published: Vec::new(),
        }
    }

    pub fn input(&self, attr: &str) -> Option<&Value> {
        self.inputs.get(attr).filter(|v| !v.is_null())
    }

    /// Numeric input, or `MissingInput` if absent or non-numeric.
    pub fn input_f64(&self, attr: &str) -> ModelResult<f64> {
        self.input(attr)
            .and_then(Value::as_f64)
            .ok_or_else(|| ModelError::MissingInput {
                attr: attr.to_string(),
            })
    }

    /// Declared step size for time-based and hybrid models.
    pub fn step_size(&self) -> Option<SimTime> {
        self.step_size
    }

    /// Next time on the declared schedule, if there is one.
    pub fn next_scheduled(&self) -> Option<SimTime> {
        self.step_size.and_then(|s| self.time.checked_add(s))
    }

    /// Write directly into another model's input via the async channel.
    ///
    /// The write is delivered at `dest`'s next step, never in the current
    /// tick. Publishing the same `(dest, attr)` again overwrites the value.
    pub fn publish(&mut self, dest: impl Into<String>, attr: impl Into<String>, value: impl Into<Value>) {
        self.published.push((dest.into(), attr.into(), value.into()));
    }

    pub(crate) fn take_published(&mut self) -> Vec<(String, String, Value)> {
        std::mem::take(&mut self.published)
    }
}
