//! Export the batch report as JSON.
//!
//! The export is meant to be easy to consume in notebooks or downstream scripts.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::AppError;
use crate::report::BatchReport;

/// Write the batch report (processed + skipped objects) to a JSON file.
pub fn write_report_json(path: &Path, report: &BatchReport) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::new(2, format!("Failed to create '{}': {e}", parent.display()))
        })?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
    Ok(())
}
