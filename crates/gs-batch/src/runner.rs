//! Share-nothing batch execution over a rayon pool.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{BatchError, BatchResult};
use crate::expand::ScenarioVariant;
use crate::partition::partition;

/// A variant whose job returned an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFailure {
    pub id: usize,
    pub worker: usize,
    pub message: String,
}

/// Outcome of a batch, merged in block order.
#[derive(Debug, Clone)]
pub struct BatchReport<T> {
    /// `(variant id, job output)` in id order.
    pub completed: Vec<(usize, T)>,
    pub failed: Vec<VariantFailure>,
    /// Variants skipped because an earlier variant in the same block failed.
    pub abandoned: Vec<usize>,
}

impl<T> BatchReport<T> {
    fn empty() -> Self {
        Self {
            completed: Vec::new(),
            failed: Vec::new(),
            abandoned: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.abandoned.is_empty()
    }

    pub fn total(&self) -> usize {
        self.completed.len() + self.failed.len() + self.abandoned.len()
    }

    fn merge(&mut self, other: BatchReport<T>) {
        self.completed.extend(other.completed);
        self.failed.extend(other.failed);
        self.abandoned.extend(other.abandoned);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Runs variants in contiguous blocks, one block per worker thread.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    workers: usize,
}

impl BatchRunner {
    /// A worker count of zero is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn with_available_parallelism() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run `job` once per variant.
    ///
    /// Blocks run in parallel, each sequentially in id order. A failing or
    /// panicking variant stops its own block only; the remaining variants of
    /// that block are reported as abandoned while other blocks carry on.
    pub fn run<T, E, F>(&self, variants: &[ScenarioVariant], job: F) -> BatchResult<BatchReport<T>>
    where
        T: Send,
        E: Display,
        F: Fn(&ScenarioVariant) -> Result<T, E> + Sync,
    {
        let blocks = partition(variants.len(), self.workers);
        if blocks.is_empty() {
            return Ok(BatchReport::empty());
        }
        info!(
            variants = variants.len(),
            workers = blocks.len(),
            "starting batch"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(blocks.len())
            .thread_name(|i| format!("gs-batch-{i}"))
            .build()
            .map_err(|e| BatchError::Pool {
                message: e.to_string(),
            })?;

        let run_block = |(worker, range): (usize, std::ops::Range<usize>)| {
            let mut report = BatchReport::empty();
            let mut ids = range;
            for id in ids.by_ref() {
                let variant = &variants[id];
                let message = match panic::catch_unwind(AssertUnwindSafe(|| job(variant))) {
                    Ok(Ok(out)) => {
                        report.completed.push((variant.id, out));
                        continue;
                    }
                    Ok(Err(e)) => e.to_string(),
                    Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
                };
                warn!(worker, variant = variant.id, error = %message, "variant failed, abandoning block");
                report.failed.push(VariantFailure {
                    id: variant.id,
                    worker,
                    message,
                });
                break;
            }
            report
                .abandoned
                .extend(ids.map(|id| variants[id].id));
            report
        };

        let reports: Vec<BatchReport<T>> =
            pool.install(|| blocks.into_par_iter().enumerate().map(run_block).collect());

        let mut merged = BatchReport::empty();
        for report in reports {
            merged.merge(report);
        }
        info!(
            completed = merged.completed.len(),
            failed = merged.failed.len(),
            abandoned = merged.abandoned.len(),
            "batch finished"
        );
        Ok(merged)
    }
}
