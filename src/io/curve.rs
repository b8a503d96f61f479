//! Read/write folded curve CSV files.
//!
//! Layout:
//!
//! ```text
//! # object: V1010 Oph
//! # period: 0.661
//! # epoch0: 8765.4321
//! # epoch_source: fitted
//! phase,normalized_flux[,time,flux]
//! ...
//! ```
//!
//! `period` and `epoch0` live in the metadata block, never in table columns.
//! Floats use Rust's shortest round-trip formatting, so identical curves give
//! byte-identical files.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{EpochSource, OutputCurve};
use crate::error::AppError;
use crate::io::table::{build_header_map, csv_reader, get_optional, parse_opt_f64};

/// A curve file read back from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedCurve {
    pub object: Option<String>,
    pub period: f64,
    pub epoch0: f64,
    pub epoch_source: Option<EpochSource>,
    /// `(phase, normalized_flux)` in file order.
    pub points: Vec<(f64, f64)>,
}

/// `<prefix>_<sanitized name>_<source>_epoch.csv`
pub fn output_file_name(prefix: &str, object: &str, source: EpochSource) -> String {
    format!("{prefix}_{}_{}_epoch.csv", sanitize_name(object), source.label())
}

/// Keep ASCII alphanumerics, `-`, `_` and `.`; everything else becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Serialize a curve (metadata block + table) into `writer`.
pub fn render_curve_csv<W: Write>(
    writer: W,
    object: &str,
    curve: &OutputCurve,
    with_raw: bool,
) -> Result<(), String> {
    let mut writer = writer;
    writeln!(writer, "# object: {object}").map_err(|e| e.to_string())?;
    writeln!(writer, "# period: {}", curve.period).map_err(|e| e.to_string())?;
    writeln!(writer, "# epoch0: {}", curve.epoch.value).map_err(|e| e.to_string())?;
    writeln!(writer, "# epoch_source: {}", curve.epoch.source.label()).map_err(|e| e.to_string())?;

    let mut csv = csv::Writer::from_writer(writer);
    let header: &[&str] = if with_raw {
        &["phase", "normalized_flux", "time", "flux"]
    } else {
        &["phase", "normalized_flux"]
    };
    csv.write_record(header).map_err(|e| e.to_string())?;

    for s in &curve.samples {
        let mut row = vec![s.phase.to_string(), s.normalized_flux.to_string()];
        if with_raw {
            row.push(s.time.to_string());
            row.push(s.flux.to_string());
        }
        csv.write_record(&row).map_err(|e| e.to_string())?;
    }
    csv.flush().map_err(|e| e.to_string())?;
    Ok(())
}

/// Write `curve` into `dir`, returning the file path.
pub fn write_curve_csv(
    dir: &Path,
    prefix: &str,
    object: &str,
    curve: &OutputCurve,
    with_raw: bool,
) -> Result<PathBuf, String> {
    fs::create_dir_all(dir).map_err(|e| format!("create '{}': {e}", dir.display()))?;
    let path = dir.join(output_file_name(prefix, object, curve.epoch.source));
    let file = File::create(&path).map_err(|e| format!("create '{}': {e}", path.display()))?;
    render_curve_csv(BufWriter::new(file), object, curve, with_raw)
        .map_err(|e| format!("write '{}': {e}", path.display()))?;
    Ok(path)
}

/// Read a curve CSV file.
pub fn read_curve_csv(path: &Path) -> Result<SavedCurve, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open curve CSV '{}': {e}", path.display())))?;
    parse_curve_csv(file)
        .map_err(|e| AppError::new(2, format!("Invalid curve CSV '{}': {e}", path.display())))
}

/// Parse the curve format from any reader.
pub fn parse_curve_csv<R: Read>(reader: R) -> Result<SavedCurve, String> {
    let mut text = String::new();
    BufReader::new(reader)
        .read_to_string(&mut text)
        .map_err(|e| e.to_string())?;

    let mut object = None;
    let mut period = None;
    let mut epoch0 = None;
    let mut epoch_source = None;

    for line in text.as_bytes().lines() {
        let line = line.map_err(|e| e.to_string())?;
        let Some(meta) = line.strip_prefix('#') else {
            break;
        };
        let Some((key, value)) = meta.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "object" => object = Some(value.to_string()),
            "period" => period = parse_opt_f64(Some(value)),
            "epoch0" => epoch0 = parse_opt_f64(Some(value)),
            "epoch_source" => epoch_source = EpochSource::parse(value),
            _ => {}
        }
    }

    let period = period.ok_or("missing `# period:` metadata")?;
    let epoch0 = epoch0.ok_or("missing `# epoch0:` metadata")?;

    let mut reader = csv_reader(text.as_bytes());
    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let header_map = build_header_map(&headers);
    if !(header_map.contains_key("phase") && header_map.contains_key("normalized_flux")) {
        return Err("expected `phase` and `normalized_flux` columns".to_string());
    }

    let mut points = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| e.to_string())?;
        let phase = parse_opt_f64(get_optional(&record, &header_map, "phase"));
        let flux = parse_opt_f64(get_optional(&record, &header_map, "normalized_flux"));
        match (phase, flux) {
            (Some(p), Some(f)) => points.push((p, f)),
            _ => return Err(format!("bad value in data row {}", idx + 1)),
        }
    }

    Ok(SavedCurve {
        object,
        period,
        epoch0,
        epoch_source,
        points,
    })
}
