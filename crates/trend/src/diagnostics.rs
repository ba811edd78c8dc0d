//! Optional JSON file with per-region fit statistics and failures.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::driver::{DriverReport, RegionFailure, RegionSummary};
use crate::error::DriverError;

#[derive(Serialize)]
struct DiagnosticsFile<'a> {
    succeeded: usize,
    failed: usize,
    elapsed_s: f64,
    regions: &'a [RegionSummary],
    failures: &'a [RegionFailure],
}

/// Writes the run diagnostics of `report` as pretty-printed JSON.
///
/// Non-finite numbers (an R-hat that could not be computed) become `null`.
///
/// # Errors
///
/// Returns [`DriverError::Diagnostics`] if the file cannot be written.
pub fn write_diagnostics(path: &Path, report: &DriverReport) -> Result<(), DriverError> {
    let err = |reason: String| DriverError::Diagnostics {
        path: path.to_path_buf(),
        reason,
    };
    let body = DiagnosticsFile {
        succeeded: report.summaries().len(),
        failed: report.failures().len(),
        elapsed_s: report.elapsed().as_secs_f64(),
        regions: report.summaries(),
        failures: report.failures(),
    };

    let file = File::create(path).map_err(|e| err(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &body).map_err(|e| err(e.to_string()))?;
    writer.flush().map_err(|e| err(e.to_string()))?;

    info!(path = %path.display(), "diagnostics written");
    Ok(())
}
