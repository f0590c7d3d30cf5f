//! Contiguous work blocks.

use std::ops::Range;

/// Split `0..n` into contiguous blocks of `ceil(n / workers)` items.
///
/// Yields at most `workers` blocks; the last may be shorter. A worker count
/// of zero is treated as one.
pub fn partition(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let size = n.div_ceil(workers.max(1));
    (0..n)
        .step_by(size)
        .map(|start| start..(start + size).min(n))
        .collect()
}
