//! Object manifest ingest.
//!
//! The manifest is a CSV with one row per object:
//!
//! - `name` (required)
//! - a period column (required; name configurable, default `period`)
//! - an external epoch column (optional; default `jd_min`)
//!
//! A bad period cell is not a manifest error: the object is kept and later
//! skipped with `InvalidPeriod`, so it shows up in the batch report.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::domain::{ColumnNames, ObjectRecord};
use crate::error::AppError;
use crate::io::table::{
    RowError, build_header_map, csv_reader, get_optional, normalize_header_name, parse_opt_f64,
};

/// Parsed manifest: unique objects in ascending name order.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub objects: Vec<ObjectRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    /// Rows dropped because their name was already seen.
    pub duplicates: usize,
    pub has_epoch_column: bool,
}

/// Load a manifest file.
pub fn load_manifest(path: &Path, columns: &ColumnNames, epoch_offset: f64) -> Result<Manifest, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open manifest '{}': {e}", path.display()))
    })?;
    read_manifest(file, columns, epoch_offset)
}

/// Parse a manifest from any reader.
pub fn read_manifest<R: Read>(
    reader: R,
    columns: &ColumnNames,
    epoch_offset: f64,
) -> Result<Manifest, AppError> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read manifest headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    if !header_map.contains_key("name") {
        return Err(AppError::new(
            2,
            "Manifest must contain a column named `name` (case-insensitive).",
        ));
    }
    if !header_map.contains_key(&normalize_header_name(&columns.period)) {
        return Err(AppError::new(
            2,
            format!("Manifest must contain a period column named `{}`.", columns.period),
        ));
    }
    let has_epoch_column = header_map.contains_key(&normalize_header_name(&columns.epoch));
    if !has_epoch_column {
        tracing::info!(
            column = %columns.epoch,
            "manifest has no epoch column; every object takes the fitted path"
        );
    }

    let mut by_name: BTreeMap<String, ObjectRecord> = BTreeMap::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut duplicates = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    id: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let Some(name) = get_optional(&record, &header_map, "name") else {
            row_errors.push(RowError {
                line,
                id: None,
                message: "Missing `name` value.".to_string(),
            });
            continue;
        };

        if by_name.contains_key(name) {
            duplicates += 1;
            tracing::debug!(object = %name, line, "duplicate manifest row ignored");
            continue;
        }

        let period_raw = get_optional(&record, &header_map, &columns.period).unwrap_or("");
        // Keep NaN/inf so the period check can say "not finite" rather than "missing".
        let period = period_raw.parse::<f64>().ok();
        let epoch = parse_opt_f64(get_optional(&record, &header_map, &columns.epoch))
            .map(|e| e - epoch_offset);

        by_name.insert(
            name.to_string(),
            ObjectRecord {
                name: name.to_string(),
                period_raw: period_raw.to_string(),
                period,
                epoch,
                line,
            },
        );
    }

    if by_name.is_empty() {
        return Err(AppError::new(3, "Manifest contains no usable object rows."));
    }

    Ok(Manifest {
        objects: by_name.into_values().collect(),
        row_errors,
        rows_read,
        duplicates,
        has_epoch_column,
    })
}
