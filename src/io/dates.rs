//! Calendar timestamp → Julian Date conversion for raw light-curve exports.
//!
//! Input files carry `time` (ISO-8601 calendar timestamps) and `flux`; output
//! files carry `jd,flux`. The timestamp is converted as written, with no
//! time-scale change (a TDB timestamp yields a TDB Julian Date).

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::AppError;
use crate::io::table::{RowError, build_header_map, csv_reader, get_optional, parse_opt_f64};

/// Julian Date of the Unix epoch (1970-01-01T00:00:00).
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const MICROS_PER_DAY: f64 = 86_400_000_000.0;

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a calendar timestamp (date-only values are taken at midnight).
pub fn parse_calendar(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn julian_date(dt: NaiveDateTime) -> f64 {
    dt.and_utc().timestamp_micros() as f64 / MICROS_PER_DAY + UNIX_EPOCH_JD
}

/// Summary of one converted file.
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows_written: usize,
    pub row_errors: Vec<RowError>,
}

/// Convert one `time,flux` table into `jd,flux`.
pub fn convert_table<R: Read, W: Write>(reader: R, writer: W) -> Result<(usize, Vec<RowError>), String> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| format!("failed to read headers: {e}"))?
        .clone();
    let header_map = build_header_map(&headers);
    for column in ["time", "flux"] {
        if !header_map.contains_key(column) {
            return Err(format!("missing column `{column}`"));
        }
    }

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(["jd", "flux"]).map_err(|e| e.to_string())?;

    let mut rows_written = 0usize;
    let mut row_errors = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
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

        let time = get_optional(&record, &header_map, "time").and_then(parse_calendar);
        let flux = parse_opt_f64(get_optional(&record, &header_map, "flux"));
        let (Some(time), Some(flux)) = (time, flux) else {
            row_errors.push(RowError {
                line,
                id: None,
                message: "Missing/invalid `time` or `flux` value.".to_string(),
            });
            continue;
        };

        out.write_record([julian_date(time).to_string(), flux.to_string()])
            .map_err(|e| e.to_string())?;
        rows_written += 1;
    }
    out.flush().map_err(|e| e.to_string())?;

    Ok((rows_written, row_errors))
}

/// Convert every `*.csv` in `input_dir` into `output_dir` (same file names).
///
/// A file that cannot be converted is logged and skipped, and no output file
/// is left for it. A missing input directory, or an output directory that is
/// the input directory, is fatal.
pub fn convert_directory(input_dir: &Path, output_dir: &Path) -> Result<Vec<ConvertedFile>, AppError> {
    let entries = fs::read_dir(input_dir).map_err(|e| {
        AppError::new(2, format!("Input directory '{}' not readable: {e}", input_dir.display()))
    })?;
    fs::create_dir_all(output_dir).map_err(|e| {
        AppError::new(2, format!("Failed to create '{}': {e}", output_dir.display()))
    })?;
    if same_directory(input_dir, output_dir)? {
        return Err(AppError::new(
            2,
            format!(
                "Output directory '{}' must differ from the input directory.",
                output_dir.display()
            ),
        ));
    }

    let mut inputs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    inputs.sort();

    let mut converted = Vec::new();
    for input in inputs {
        let Some(file_name) = input.file_name() else {
            continue;
        };
        let output = output_dir.join(file_name);

        // Output is only written once the whole table converted.
        let result = File::open(&input)
            .map_err(|e| e.to_string())
            .and_then(|src| {
                let mut buf = Vec::new();
                let converted = convert_table(src, &mut buf)?;
                fs::write(&output, &buf)
                    .map_err(|e| format!("write '{}': {e}", output.display()))?;
                Ok(converted)
            });

        match result {
            Ok((rows_written, row_errors)) => {
                tracing::info!(
                    input = %input.display(),
                    rows = rows_written,
                    bad_rows = row_errors.len(),
                    "converted to julian dates"
                );
                converted.push(ConvertedFile {
                    input,
                    output,
                    rows_written,
                    row_errors,
                });
            }
            Err(e) => tracing::warn!(input = %input.display(), error = %e, "conversion failed"),
        }
    }

    Ok(converted)
}

fn same_directory(a: &Path, b: &Path) -> Result<bool, AppError> {
    let canonical = |p: &Path| {
        fs::canonicalize(p)
            .map_err(|e| AppError::new(2, format!("Failed to resolve '{}': {e}", p.display())))
    };
    Ok(canonical(a)? == canonical(b)?)
}
