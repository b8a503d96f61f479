//! Per-object light-curve discovery and ingest.
//!
//! The curves directory is scanned once per batch. An object's curve is the
//! first file (by file name) whose name contains the object name.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::domain::{ColumnNames, Sample, TimeSeries};
use crate::error::{AppError, SkipReason};
use crate::io::table::{RowError, build_header_map, csv_reader, get_optional, normalize_header_name, parse_opt_f64};

/// Sorted listing of the files in the curves directory.
#[derive(Debug, Clone, Default)]
pub struct CurveIndex {
    files: Vec<PathBuf>,
}

impl CurveIndex {
    /// List regular files in `dir`. A missing/unreadable directory is batch-fatal.
    pub fn scan(dir: &Path) -> Result<Self, AppError> {
        let entries = fs::read_dir(dir).map_err(|e| {
            AppError::new(2, format!("Light curve directory '{}' not readable: {e}", dir.display()))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                AppError::new(2, format!("Failed to list '{}': {e}", dir.display()))
            })?;
            let path = entry.path();
            if path.is_file() {
                files.push(path);
            }
        }
        Ok(Self::from_paths(files))
    }

    pub fn from_paths(mut files: Vec<PathBuf>) -> Self {
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Files whose name contains `object` as a literal substring.
    pub fn candidates(&self, object: &str) -> Vec<&Path> {
        self.files
            .iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains(object))
            })
            .map(PathBuf::as_path)
            .collect()
    }

    /// Resolve the curve file for `object`, warning when the match is ambiguous.
    pub fn locate(&self, object: &str) -> Result<&Path, SkipReason> {
        let candidates = self.candidates(object);
        match candidates.as_slice() {
            [] => Err(SkipReason::CurveNotFound),
            [only] => Ok(*only),
            [first, ..] => {
                tracing::warn!(
                    object = %object,
                    matches = candidates.len(),
                    using = %first.display(),
                    "more than one light curve file matches; using the first"
                );
                Ok(*first)
            }
        }
    }
}

/// A parsed light curve plus ingest diagnostics.
#[derive(Debug, Clone)]
pub struct LightCurve {
    pub series: TimeSeries,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load one light-curve file. Every failure is object-scoped.
pub fn load_light_curve(path: &Path, columns: &ColumnNames) -> Result<LightCurve, SkipReason> {
    let file = File::open(path)
        .map_err(|e| SkipReason::CurveUnreadable(format!("{}: {e}", path.display())))?;
    read_light_curve(file, columns).map_err(SkipReason::CurveUnreadable)
}

/// Parse `(time, flux)` rows from any reader.
///
/// Rows with a missing or non-finite time/flux are skipped and recorded.
pub fn read_light_curve<R: Read>(reader: R, columns: &ColumnNames) -> Result<LightCurve, String> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read headers: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);

    for column in [&columns.time, &columns.flux] {
        if !header_map.contains_key(&normalize_header_name(column)) {
            return Err(format!("missing column `{column}`"));
        }
    }

    let mut samples = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

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

        let time = parse_opt_f64(get_optional(&record, &header_map, &columns.time));
        let flux = parse_opt_f64(get_optional(&record, &header_map, &columns.flux));
        match (time, flux) {
            (Some(t), Some(f)) => samples.push(Sample::new(t, f)),
            (None, _) => row_errors.push(RowError {
                line,
                id: None,
                message: format!("Missing/invalid `{}` value.", columns.time),
            }),
            (_, None) => row_errors.push(RowError {
                line,
                id: None,
                message: format!("Missing/invalid `{}` value.", columns.flux),
            }),
        }
    }

    Ok(LightCurve {
        series: TimeSeries::new(samples),
        row_errors,
        rows_read,
    })
}
