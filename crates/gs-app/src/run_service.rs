//! Single and batch scenario execution.

use std::path::{Path, PathBuf};
use std::time::Instant;

use gs_batch::{BatchRunner, ScenarioVariant, expand};
use gs_graph::ScenarioConfig;
use gs_models::ModelFactory;
use gs_results::{RunRecord, export_csv, variant_path};
use gs_sim::Scheduler;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::progress::{RunProgressEvent, RunStage};
use crate::project_service::{expansion_mode, load_scenario};

/// Options shared by single and batch runs.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// CSV destination. Batch runs write `<stem>_<id>.<ext>` next to it.
    /// `None` runs without persisting the monitored series.
    pub output: Option<PathBuf>,
    /// Overrides the scenario's `batch.workers`.
    pub workers: Option<usize>,
}

type ProgressCallback<'a> = Option<&'a mut dyn FnMut(RunProgressEvent)>;

fn emit_progress(
    progress_cb: &mut ProgressCallback<'_>,
    stage: RunStage,
    started: Instant,
    message: Option<String>,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(RunProgressEvent::stage(
            stage,
            started.elapsed().as_secs_f64(),
            message,
        ));
    }
}

/// Build models for a frozen scenario, run it to completion and optionally
/// export the monitored series.
pub fn run_config(
    config: &ScenarioConfig,
    factory: &ModelFactory,
    output: Option<&Path>,
) -> AppResult<RunRecord> {
    let registry = factory.build_registry(config)?;
    let mut scheduler = Scheduler::new(config.clone(), registry)?;
    let summary = scheduler.run()?;

    if let Some(path) = output {
        export_csv(config, scheduler.monitor_log(), path)?;
    }

    Ok(RunRecord {
        scenario: config.name().to_string(),
        variant: None,
        assignments: Default::default(),
        ticks: summary.ticks.len(),
        steps: summary.steps,
        output: output.map(Path::to_path_buf),
    })
}

/// Run one scenario file as written.
///
/// List-valued parameters are handed to the models unexpanded; use
/// [`run_parallel`] to sweep them.
pub fn run_scenario(
    path: &Path,
    factory: &ModelFactory,
    options: &RunOptions,
    mut progress_cb: ProgressCallback<'_>,
) -> AppResult<RunRecord> {
    let started = Instant::now();
    emit_progress(&mut progress_cb, RunStage::LoadingScenario, started, None);
    let (_, config) = load_scenario(path)?;

    emit_progress(
        &mut progress_cb,
        RunStage::Simulating,
        started,
        Some(format!("{} ticks", config.bounds().tick_count())),
    );
    let record = run_config(&config, factory, options.output.as_deref())?;

    emit_progress(&mut progress_cb, RunStage::Completed, started, None);
    info!(
        scenario = %record.scenario,
        ticks = record.ticks,
        steps = record.steps,
        elapsed_s = started.elapsed().as_secs_f64(),
        "run complete"
    );
    Ok(record)
}

fn run_variant(
    variant: &ScenarioVariant,
    factory: &ModelFactory,
    base: Option<&Path>,
) -> AppResult<RunRecord> {
    let output = base.map(|b| variant_path(b, variant.id)).transpose()?;
    let result = run_config(&variant.config, factory, output.as_deref());
    if result.is_err() {
        if let Some(path) = &output {
            // Partial output of a failed variant must not look like a result
            let _ = std::fs::remove_file(path);
        }
    }
    let mut record = result?;
    record.variant = Some(variant.id);
    record.assignments = variant.assignments.clone();
    Ok(record)
}

/// Expand a scenario file into variants and run them across workers.
///
/// Worker count comes from `options`, then the file's `batch.workers`, then
/// the available parallelism. Any failed or abandoned variant turns the
/// whole batch into an error after every other block has finished.
pub fn run_parallel(
    path: &Path,
    factory: &ModelFactory,
    options: &RunOptions,
    mut progress_cb: ProgressCallback<'_>,
) -> AppResult<Vec<RunRecord>> {
    let started = Instant::now();
    emit_progress(&mut progress_cb, RunStage::LoadingScenario, started, None);
    let (file, config) = load_scenario(path)?;

    emit_progress(&mut progress_cb, RunStage::ExpandingVariants, started, None);
    let variants = expand(&config, expansion_mode(&file))?;

    let runner = match options
        .workers
        .or_else(|| file.batch.as_ref().and_then(|b| b.workers))
    {
        Some(workers) => BatchRunner::new(workers),
        None => BatchRunner::with_available_parallelism(),
    };
    emit_progress(
        &mut progress_cb,
        RunStage::RunningBatch,
        started,
        Some(format!(
            "{} variants on {} workers",
            variants.len(),
            runner.workers()
        )),
    );

    let base = options.output.as_deref();
    let report = runner.run(&variants, |variant| run_variant(variant, factory, base))?;

    if !report.is_success() {
        for failure in &report.failed {
            warn!(variant = failure.id, worker = failure.worker, error = %failure.message, "variant failed");
        }
        let first = report
            .failed
            .first()
            .map(|f| format!("variant {}: {}", f.id, f.message))
            .unwrap_or_default();
        return Err(AppError::VariantsFailed {
            failed: report.failed.len(),
            abandoned: report.abandoned.len(),
            first,
        });
    }

    emit_progress(&mut progress_cb, RunStage::Completed, started, None);
    info!(
        scenario = config.name(),
        variants = report.completed.len(),
        elapsed_s = started.elapsed().as_secs_f64(),
        "batch complete"
    );
    Ok(report.completed.into_iter().map(|(_, record)| record).collect())
}
