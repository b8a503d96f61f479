//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory while estimating epochs and folding
//! - exported to CSV/JSON
//! - reloaded later for plotting

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::FoldError;

/// One photometric observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub flux: f64,
}

impl Sample {
    pub fn new(time: f64, flux: f64) -> Self {
        Self { time, flux }
    }

    pub fn is_finite(&self) -> bool {
        self.time.is_finite() && self.flux.is_finite()
    }
}

/// Light curve of a single object, in input order (not necessarily time-sorted).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Build from parallel `time` / `flux` slices (extra values in the longer slice are ignored).
    pub fn from_columns(time: &[f64], flux: &[f64]) -> Self {
        Self {
            samples: time
                .iter()
                .zip(flux)
                .map(|(&t, &f)| Sample::new(t, f))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(min, max)` flux, or `None` for an empty series.
    pub fn flux_range(&self) -> Option<(f64, f64)> {
        if self.samples.is_empty() {
            return None;
        }
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for s in &self.samples {
            lo = lo.min(s.flux);
            hi = hi.max(s.flux);
        }
        Some((lo, hi))
    }

    /// Index of the first non-finite sample, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.samples.iter().position(|s| !s.is_finite())
    }
}

/// Orbital period in days, validated finite and `> 0`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Period(f64);

impl Period {
    pub fn new(days: f64) -> Result<Self, FoldError> {
        if !days.is_finite() {
            return Err(FoldError::InvalidPeriod(format!("{days} is not finite")));
        }
        if days <= 0.0 {
            return Err(FoldError::InvalidPeriod(format!("{days} is not positive")));
        }
        Ok(Self(days))
    }

    /// Validate a possibly-missing manifest cell. `raw` is echoed in the error.
    pub fn from_cell(value: Option<f64>, raw: &str) -> Result<Self, FoldError> {
        match value {
            Some(v) => Self::new(v),
            None if raw.trim().is_empty() => Err(FoldError::InvalidPeriod("missing".to_string())),
            None => Err(FoldError::InvalidPeriod(format!("'{}' is not numeric", raw.trim()))),
        }
    }

    pub fn days(self) -> f64 {
        self.0
    }
}

/// Where a reference epoch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpochSource {
    /// Supplied by an external catalog (manifest column).
    External,
    /// Located by fitting a peak model to the eclipse dip.
    Fitted,
}

impl EpochSource {
    pub fn label(self) -> &'static str {
        match self {
            EpochSource::External => "external",
            EpochSource::Fitted => "fitted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "external" => Some(EpochSource::External),
            "fitted" => Some(EpochSource::Fitted),
            _ => None,
        }
    }
}

/// Fitted peak parameters kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeakFit {
    pub amplitude: f64,
    pub location: f64,
    pub width: f64,
    pub sse: f64,
    pub iterations: usize,
    /// Number of samples inside the fit window.
    pub n_window: usize,
}

/// A time of minimum light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    pub value: f64,
    pub source: EpochSource,
    /// Present only for `EpochSource::Fitted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fit: Option<PeakFit>,
}

impl Epoch {
    pub fn external(value: f64) -> Self {
        Self {
            value,
            source: EpochSource::External,
            fit: None,
        }
    }

    pub fn fitted(fit: PeakFit) -> Self {
        Self {
            value: fit.location,
            source: EpochSource::Fitted,
            fit: Some(fit),
        }
    }
}

/// One row of the output curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoldedSample {
    /// In `[0, 1)`.
    pub phase: f64,
    /// In `[0, 1]`.
    pub normalized_flux: f64,
    pub time: f64,
    pub flux: f64,
}

/// Folded, normalized light curve plus its `(period, epoch)` metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputCurve {
    pub period: f64,
    pub epoch: Epoch,
    /// Sorted by ascending phase (stable).
    pub samples: Vec<FoldedSample>,
}

impl OutputCurve {
    pub fn phases(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.phase).collect()
    }

    pub fn normalized_fluxes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.normalized_flux).collect()
    }
}

/// One manifest row: an object with its period and optional catalog epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub name: String,
    /// Raw period cell, kept for error messages.
    pub period_raw: String,
    /// `None` when the cell was empty or non-numeric.
    pub period: Option<f64>,
    /// External epoch, already shifted by the configured offset.
    pub epoch: Option<f64>,
    /// 1-based line in the manifest file.
    pub line: usize,
}

/// Tuning for the fitted-epoch path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochFitOptions {
    /// Half-width of the fit window, as a fraction of the period.
    pub window_fraction: f64,
    /// Levenberg–Marquardt iteration budget.
    pub max_iterations: usize,
}

impl Default for EpochFitOptions {
    fn default() -> Self {
        Self {
            window_fraction: 0.2,
            max_iterations: 200,
        }
    }
}

/// Column names used when reading the manifest and the light curves.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnNames {
    pub period: String,
    pub epoch: String,
    pub time: String,
    pub flux: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            period: "period".to_string(),
            epoch: "jd_min".to_string(),
            time: "jd".to_string(),
            flux: "flux".to_string(),
        }
    }
}

/// Fully resolved configuration for a `fold` / `estimate` run.
#[derive(Debug, Clone)]
pub struct FoldConfig {
    pub manifest_path: PathBuf,
    pub curves_dir: PathBuf,
    pub out_dir: PathBuf,
    pub columns: ColumnNames,
    /// Subtracted from every external epoch.
    pub epoch_offset: f64,
    pub fit: EpochFitOptions,
    /// Worker threads; 1 runs sequentially.
    pub jobs: usize,
    pub write_raw: bool,
    pub file_prefix: String,
    pub report_path: Option<PathBuf>,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}
