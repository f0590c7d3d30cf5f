//! CSV export of monitored time series.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gs_core::format_timestamp;
use gs_graph::ScenarioConfig;
use gs_sim::MonitorLog;

use crate::columns::column_names;
use crate::{ResultsError, ResultsResult};

/// Write a run's monitor log to a CSV file.
///
/// A file that fails halfway is removed rather than left looking valid.
pub fn export_csv(config: &ScenarioConfig, log: &MonitorLog, path: &Path) -> ResultsResult<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(path)?;
    let result = write_csv(config, log, io::BufWriter::new(file));
    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}

/// Write a run's monitor log as CSV to any writer.
///
/// One row per executed tick; the `time` column holds wall-clock timestamps.
pub fn write_csv(config: &ScenarioConfig, log: &MonitorLog, writer: impl Write) -> ResultsResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(column_names(config)?)?;

    let bounds = config.bounds();
    for row in log.rows() {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(format_timestamp(bounds.timestamp_at(row.time)));
        record.extend(row.values.iter().map(|v| v.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// `<base>_<variant>.<ext>` next to `base`.
pub fn variant_path(base: &Path, variant: usize) -> ResultsResult<PathBuf> {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ResultsError::InvalidPath {
            message: format!("'{}' has no file name", base.display()),
        })?;
    let name = match base.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}_{}.{}", stem, variant, ext),
        None => format!("{}_{}", stem, variant),
    };
    Ok(base.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_paths() {
        assert_eq!(
            variant_path(Path::new("out/results.csv"), 3).unwrap(),
            PathBuf::from("out/results_3.csv")
        );
        assert_eq!(
            variant_path(Path::new("results"), 0).unwrap(),
            PathBuf::from("results_0")
        );
        assert!(variant_path(Path::new("/"), 0).is_err());
    }
}
