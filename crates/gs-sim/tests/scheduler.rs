//! End-to-end scheduler behaviour with small scripted models.

use std::cell::RefCell;
use std::rc::Rc;

use gs_core::{AttrMap, AttrRef, SimTime, Value};
use gs_graph::{ModelSpec, ScenarioBuilder, ScenarioConfig};
use gs_sim::{
    ComponentRegistry, Model, ModelError, ModelResult, ModelState, Scheduler, SimError,
    StepContext,
};

type Log = Rc<RefCell<Vec<(SimTime, String, AttrMap)>>>;

/// Records every step and emits scripted outputs.
struct Scripted {
    name: String,
    log: Log,
    out: Box<dyn Fn(SimTime) -> AttrMap>,
    next: Box<dyn Fn(SimTime) -> Option<SimTime>>,
    publish: Vec<(String, String, Value)>,
    fail_at: Option<(SimTime, ModelError)>,
    current: AttrMap,
}

impl Scripted {
    fn new(name: &str, log: &Log) -> Self {
        Self {
            name: name.to_string(),
            log: Rc::clone(log),
            out: Box::new(|_| AttrMap::new()),
            next: Box::new(|_| None),
            publish: Vec::new(),
            fail_at: None,
            current: AttrMap::new(),
        }
    }

    /// Output `attr` = current time in seconds.
    fn emit_time(mut self, attr: &'static str) -> Self {
        self.out = Box::new(move |t| {
            let mut m = AttrMap::new();
            m.insert(attr.to_string(), Value::Float(t as f64));
            m
        });
        self
    }

    fn emit(mut self, f: impl Fn(SimTime) -> AttrMap + 'static) -> Self {
        self.out = Box::new(f);
        self
    }

    fn next(mut self, f: impl Fn(SimTime) -> Option<SimTime> + 'static) -> Self {
        self.next = Box::new(f);
        self
    }

    fn publish(mut self, dest: &str, attr: &str, value: f64) -> Self {
        self.publish
            .push((dest.to_string(), attr.to_string(), Value::Float(value)));
        self
    }

    fn fail_at(mut self, t: SimTime, err: ModelError) -> Self {
        self.fail_at = Some((t, err));
        self
    }
}

impl Model for Scripted {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> ModelResult<Option<SimTime>> {
        self.log
            .borrow_mut()
            .push((ctx.time, self.name.clone(), ctx.inputs.clone()));
        if let Some((t, err)) = &self.fail_at {
            if *t == ctx.time {
                return Err(err.clone());
            }
        }
        for (dest, attr, value) in &self.publish {
            ctx.publish(dest.as_str(), attr.as_str(), value.clone());
        }
        self.current = (self.out)(ctx.time);
        Ok((self.next)(ctx.time))
    }

    fn outputs(&self) -> AttrMap {
        self.current.clone()
    }
}

fn attr(s: &str) -> AttrRef {
    s.parse().unwrap()
}

fn hour() -> ScenarioBuilder {
    ScenarioBuilder::parse("test", "2012-01-01 00:00:00", "2012-01-01 01:00:00", 900).unwrap()
}

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn steps_of(log: &Log, name: &str) -> Vec<SimTime> {
    log.borrow()
        .iter()
        .filter(|(_, n, _)| n == name)
        .map(|(t, _, _)| *t)
        .collect()
}

fn inputs_of(log: &Log, name: &str, input: &str) -> Vec<Value> {
    log.borrow()
        .iter()
        .filter(|(_, n, _)| n == name)
        .map(|(_, _, inputs)| inputs.get(input).cloned().unwrap_or_default())
        .collect()
}

fn run(config: ScenarioConfig, registry: ComponentRegistry) -> Result<Scheduler, SimError> {
    let mut scheduler = Scheduler::new(config, registry)?;
    scheduler.run()?;
    Ok(scheduler)
}

#[test]
fn one_hour_at_900s_runs_four_ticks() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new().with("pv", Scripted::new("pv", &log).emit_time("p"));
    let mut scheduler = Scheduler::new(config, registry).unwrap();
    assert_eq!(scheduler.state("pv"), Some(ModelState::Idle));

    let summary = scheduler.run().unwrap();
    assert_eq!(summary.ticks, vec![0, 900, 1800, 2700]);
    assert_eq!(summary.steps, 4);
    assert_eq!(scheduler.state("pv"), Some(ModelState::Done));
    assert_eq!(
        scheduler.outputs_of("pv").unwrap().get("p"),
        Some(&Value::Float(2700.0))
    );
}

#[test]
fn time_based_models_step_on_their_own_grid() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("slow", "pv", 1800).with_output("p"))
        .unwrap();
    b.add_model(ModelSpec::time_based("fast", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with("slow", Scripted::new("slow", &log))
        .with("fast", Scripted::new("fast", &log));
    let scheduler = run(config, registry).unwrap();

    assert_eq!(steps_of(&log, "slow"), vec![0, 1800]);
    assert_eq!(steps_of(&log, "fast"), vec![0, 900, 1800, 2700]);
    assert_eq!(scheduler.step_counts()["slow"], 2);
}

#[test]
fn returned_next_time_is_aligned_to_the_tick_grid() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("m", "x", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    // 1000 s rounds up to the 1800 s tick
    let registry = ComponentRegistry::new()
        .with("m", Scripted::new("m", &log).next(|t| Some(t + 1000)));
    run(config, registry).unwrap();
    assert_eq!(steps_of(&log, "m"), vec![0, 1800]);
}

#[test]
fn time_shifted_edge_reads_previous_tick() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("consumer", "c", 900).with_input("x", -1.0))
        .unwrap();
    b.add_model(ModelSpec::time_based("producer", "p", 900).with_output("t"))
        .unwrap();
    b.add_connection(attr("producer.t"), attr("consumer.x"), true)
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with("consumer", Scripted::new("consumer", &log))
        .with("producer", Scripted::new("producer", &log).emit_time("t"));
    run(config, registry).unwrap();

    assert_eq!(
        inputs_of(&log, "consumer", "x"),
        vec![
            Value::Float(-1.0),
            Value::Float(0.0),
            Value::Float(900.0),
            Value::Float(1800.0)
        ]
    );
}

#[test]
fn same_tick_edge_reads_current_value_after_producer_steps() {
    let log = log();
    let mut b = hour();
    // Declared consumer-first: the execution order must still put producers first
    b.add_model(ModelSpec::time_based("c", "c", 900).with_input("x", Value::Null))
        .unwrap();
    b.add_model(
        ModelSpec::time_based("b", "b", 900)
            .with_input("x", Value::Null)
            .with_output("t"),
    )
    .unwrap();
    b.add_model(ModelSpec::time_based("a", "a", 900).with_output("t"))
        .unwrap();
    b.add_connection(attr("a.t"), attr("b.x"), false).unwrap();
    b.add_connection(attr("b.t"), attr("c.x"), false).unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with("a", Scripted::new("a", &log).emit_time("t"))
        .with("b", Scripted::new("b", &log).emit_time("t"))
        .with("c", Scripted::new("c", &log));
    let scheduler = run(config, registry).unwrap();

    assert_eq!(scheduler.execution_order(), vec!["a", "b", "c"]);
    let order: Vec<String> = log
        .borrow()
        .iter()
        .filter(|(t, _, _)| *t == 900)
        .map(|(_, n, _)| n.clone())
        .collect();
    assert_eq!(order, vec!["a", "b", "c"]);
    assert_eq!(inputs_of(&log, "c", "x")[1], Value::Float(900.0));
}

#[test]
fn last_declared_edge_wins() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("p1", "p", 900).with_output("v"))
        .unwrap();
    b.add_model(ModelSpec::time_based("p2", "p", 900).with_output("v"))
        .unwrap();
    b.add_model(ModelSpec::time_based("c", "c", 900).with_input("x", 0.0))
        .unwrap();
    b.add_connection(attr("p2.v"), attr("c.x"), false).unwrap();
    b.add_connection(attr("p1.v"), attr("c.x"), false).unwrap();
    let config = b.freeze().unwrap();

    let constant = |v: f64| {
        move |_: SimTime| {
            let mut m = AttrMap::new();
            m.insert("v".to_string(), Value::Float(v));
            m
        }
    };
    let registry = ComponentRegistry::new()
        .with("p1", Scripted::new("p1", &log).emit(constant(1.0)))
        .with("p2", Scripted::new("p2", &log).emit(constant(2.0)))
        .with("c", Scripted::new("c", &log));
    run(config, registry).unwrap();

    assert!(
        inputs_of(&log, "c", "x")
            .iter()
            .all(|v| *v == Value::Float(1.0))
    );
}

fn controller_battery(b: &mut ScenarioBuilder) {
    b.add_model(ModelSpec::time_based("ctrl", "controller", 900).with_output("flow"))
        .unwrap();
    b.add_model(ModelSpec::time_based("battery", "battery", 900).with_input("p_set", 0.0))
        .unwrap();
    b.register_async("ctrl", "battery", [("flow", "p_set")])
        .unwrap();
}

#[test]
fn async_publish_twice_delivers_second_value_next_step() {
    let log = log();
    let mut b = hour();
    controller_battery(&mut b);
    b.monitor(attr("battery.p_set")).unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with(
            "ctrl",
            Scripted::new("ctrl", &log)
                .publish("battery", "p_set", 1.0)
                .publish("battery", "p_set", 2.0),
        )
        .with("battery", Scripted::new("battery", &log));
    let scheduler = run(config, registry).unwrap();

    // Never visible in the tick it was published
    assert_eq!(
        inputs_of(&log, "battery", "p_set"),
        vec![
            Value::Float(0.0),
            Value::Float(2.0),
            Value::Float(2.0),
            Value::Float(2.0)
        ]
    );
    let series = scheduler
        .monitor_log()
        .series(&attr("battery.p_set"))
        .unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series[1], (900, &Value::Float(2.0)));
}

#[test]
fn async_write_overrides_dataflow_value() {
    let log = log();
    let mut b = hour();
    controller_battery(&mut b);
    b.add_model(ModelSpec::time_based("grid", "grid", 900).with_output("p"))
        .unwrap();
    b.add_connection(attr("grid.p"), attr("battery.p_set"), false)
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with(
            "ctrl",
            Scripted::new("ctrl", &log).emit(|t| {
                let mut m = AttrMap::new();
                m.insert("flow".to_string(), Value::Float(-(t as f64)));
                m
            }),
        )
        .with("battery", Scripted::new("battery", &log))
        .with("grid", Scripted::new("grid", &log).emit_time("p"));
    run(config, registry).unwrap();

    let seen = inputs_of(&log, "battery", "p_set");
    assert_eq!(seen[0], Value::Float(0.0));
    // Forwarded controller output from the previous tick beats the edge
    assert_eq!(seen[1], Value::Float(-0.0));
    assert_eq!(seen[2], Value::Float(-900.0));
}

#[test]
fn unregistered_publish_is_a_step_error() {
    let log = log();
    let mut b = hour();
    controller_battery(&mut b);
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with("ctrl", Scripted::new("ctrl", &log).publish("battery", "soc", 1.0))
        .with("battery", Scripted::new("battery", &log));
    match run(config, registry).unwrap_err() {
        SimError::Step(err) => {
            assert_eq!(err.model, "ctrl");
            assert_eq!(err.time, 0);
            assert_eq!(err.attr.as_deref(), Some("soc"));
        }
        other => panic!("expected step error, got {other:?}"),
    }
}

#[test]
fn model_failure_aborts_with_context() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("battery", "battery", 900).with_output("soc"))
        .unwrap();
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with(
            "battery",
            Scripted::new("battery", &log).fail_at(
                900,
                ModelError::InvalidValue {
                    attr: "soc".into(),
                    what: "above capacity".into(),
                },
            ),
        )
        .with("pv", Scripted::new("pv", &log));
    let err = run(config, registry).unwrap_err();
    let SimError::Step(step) = err else {
        panic!("expected step error");
    };
    assert_eq!(step.model, "battery");
    assert_eq!(step.time, 900);
    assert_eq!(step.attr.as_deref(), Some("soc"));
    assert!(step.to_string().contains("above capacity"));

    // No partial continuation: nothing stepped after the failure
    assert_eq!(steps_of(&log, "pv"), vec![0]);
}

#[test]
fn undeclared_output_is_a_step_error() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new().with("pv", Scripted::new("pv", &log).emit_time("q"));
    let err = run(config, registry).unwrap_err();
    assert!(matches!(
        err,
        SimError::Step(ref s) if s.attr.as_deref() == Some("q") && s.time == 0
    ));
}

#[test]
fn non_monotonic_next_time_is_a_step_error() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new().with("pv", Scripted::new("pv", &log).next(Some));
    let err = run(config, registry).unwrap_err();
    assert!(err.to_string().contains("non-monotonic"));
}

#[test]
fn event_based_model_steps_only_on_trigger_change() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("sensor", "sensor", 900).with_output("level"))
        .unwrap();
    b.add_model(
        ModelSpec::event_based("alarm", "alarm")
            .with_input("level", Value::Null)
            .with_trigger("level"),
    )
    .unwrap();
    b.add_connection(attr("sensor.level"), attr("alarm.level"), false)
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with(
            "sensor",
            Scripted::new("sensor", &log).emit(|t| {
                let mut m = AttrMap::new();
                m.insert("level".into(), Value::Int(if t >= 1800 { 1 } else { 0 }));
                m
            }),
        )
        .with("alarm", Scripted::new("alarm", &log));
    run(config, registry).unwrap();

    assert_eq!(steps_of(&log, "alarm"), vec![0, 1800]);
    assert_eq!(
        inputs_of(&log, "alarm", "level"),
        vec![Value::Int(0), Value::Int(1)]
    );
}

#[test]
fn event_based_model_can_self_schedule() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("sensor", "sensor", 900).with_output("level"))
        .unwrap();
    b.add_model(
        ModelSpec::event_based("alarm", "alarm")
            .with_input("level", Value::Null)
            .with_trigger("level"),
    )
    .unwrap();
    b.add_connection(attr("sensor.level"), attr("alarm.level"), false)
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with(
            "sensor",
            Scripted::new("sensor", &log).emit(|_| {
                let mut m = AttrMap::new();
                m.insert("level".into(), Value::Int(0));
                m
            }),
        )
        .with(
            "alarm",
            Scripted::new("alarm", &log).next(|t| (t == 0).then_some(2700)),
        );
    run(config, registry).unwrap();

    assert_eq!(steps_of(&log, "alarm"), vec![0, 2700]);
}

#[test]
fn next_time_past_the_end_stops_the_model() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("far", "far", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new().with(
        "far",
        Scripted::new("far", &log).next(|_| Some(SimTime::MAX)),
    );
    let mut scheduler = Scheduler::new(config, registry).unwrap();
    let summary = scheduler.run().unwrap();

    assert_eq!(summary.ticks, vec![0]);
    assert_eq!(steps_of(&log, "far"), vec![0]);
    assert_eq!(scheduler.state("far"), Some(ModelState::Done));
}

#[test]
fn huge_step_size_does_not_wrap_the_clock() {
    let log = log();
    let mut b = hour();
    let huge = (SimTime::MAX / 900) * 900;
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    b.add_model(ModelSpec::time_based("rare", "rare", huge).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with("pv", Scripted::new("pv", &log))
        .with(
            "rare",
            Scripted::new("rare", &log).next(|t| (t == 0).then_some(900)),
        );
    run(config, registry).unwrap();
    assert_eq!(steps_of(&log, "rare"), vec![0, 900]);
    assert_eq!(steps_of(&log, "pv"), vec![0, 900, 1800, 2700]);
}

#[test]
fn hybrid_trigger_step_keeps_the_fixed_schedule() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("sensor", "sensor", 900).with_output("level"))
        .unwrap();
    b.add_model(
        ModelSpec::hybrid("h", "h", 1800)
            .with_input("level", Value::Null)
            .with_trigger("level"),
    )
    .unwrap();
    b.add_connection(attr("sensor.level"), attr("h.level"), false)
        .unwrap();
    let config = b.freeze().unwrap();

    let registry = ComponentRegistry::new()
        .with(
            "sensor",
            Scripted::new("sensor", &log).emit(|t| {
                let mut m = AttrMap::new();
                m.insert("level".into(), Value::Int(if t >= 900 { 1 } else { 0 }));
                m
            }),
        )
        .with("h", Scripted::new("h", &log));
    run(config, registry).unwrap();

    // 900 is the trigger step; 1800 stays on the declared grid
    assert_eq!(steps_of(&log, "h"), vec![0, 900, 1800]);
}

#[test]
fn registry_must_match_declared_models() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();

    let err = Scheduler::new(config.clone(), ComponentRegistry::new()).unwrap_err();
    assert_eq!(err, SimError::MissingModel { name: "pv".into() });

    let registry = ComponentRegistry::new()
        .with("pv", Scripted::new("pv", &log))
        .with("ghost", Scripted::new("ghost", &log));
    let err = Scheduler::new(config, registry).unwrap_err();
    assert_eq!(
        err,
        SimError::UndeclaredModel {
            name: "ghost".into()
        }
    );
}

#[test]
fn scheduler_runs_once() {
    let log = log();
    let mut b = hour();
    b.add_model(ModelSpec::time_based("pv", "pv", 900).with_output("p"))
        .unwrap();
    let config = b.freeze().unwrap();
    let mut scheduler =
        Scheduler::new(config, ComponentRegistry::new().with("pv", Scripted::new("pv", &log)))
            .unwrap();
    scheduler.run().unwrap();
    assert!(matches!(scheduler.run(), Err(SimError::AlreadyRun { .. })));
}
