//! Synthetic eclipsing-binary light curves.
//!
//! Each object gets a random period, epoch, primary eclipse (Gaussian dip) and
//! an optional shallower secondary eclipse at phase 0.5, sampled at a fixed
//! cadence over one observing span with white noise. Generation is fully
//! determined by the seed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Sample, TimeSeries};
use crate::error::AppError;
use crate::fold::fold_phase;

/// Reduced Julian Date (`JD − 2450000`) of the first sample.
const SPAN_START: f64 = 8_700.0;

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub count: usize,
    pub seed: u64,
    /// Share of objects whose true epoch is written to the manifest.
    pub known_epoch_fraction: f64,
    /// Days covered by each light curve.
    pub span_days: f64,
    /// Days between samples.
    pub cadence: f64,
    /// Gaussian noise sigma, in flux units (baseline = 1).
    pub noise: f64,
    pub period_min: f64,
    pub period_max: f64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            count: 10,
            seed: 42,
            known_epoch_fraction: 0.5,
            span_days: 27.0,
            cadence: 0.01,
            noise: 0.002,
            period_min: 0.4,
            period_max: 4.0,
        }
    }
}

/// Eclipse geometry of one synthetic object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Eclipses {
    pub period: f64,
    pub epoch: f64,
    pub primary_depth: f64,
    pub secondary_depth: f64,
    /// Gaussian sigma of each eclipse, in days.
    pub width: f64,
}

impl Eclipses {
    /// Noise-free flux at `t`.
    pub fn flux(&self, t: f64) -> f64 {
        let phase = fold_phase(t, self.epoch, self.period);
        let d1 = phase.min(1.0 - phase) * self.period;
        let d2 = (phase - 0.5).abs() * self.period;
        1.0 - self.primary_depth * gauss(d1, self.width) - self.secondary_depth * gauss(d2, self.width)
    }
}

fn gauss(d: f64, sigma: f64) -> f64 {
    let z = d / sigma;
    (-0.5 * z * z).exp()
}

#[derive(Debug, Clone)]
pub struct SynthObject {
    pub name: String,
    pub eclipses: Eclipses,
    /// Whether the manifest carries the true epoch.
    pub epoch_known: bool,
    pub series: TimeSeries,
}

/// Generate `config.count` objects.
pub fn generate_objects(config: &SynthConfig) -> Result<Vec<SynthObject>, AppError> {
    if !(config.cadence.is_finite() && config.cadence > 0.0) {
        return Err(AppError::new(2, "Cadence must be > 0."));
    }
    if !(config.span_days.is_finite() && config.span_days > config.cadence) {
        return Err(AppError::new(2, "Span must exceed the cadence."));
    }
    if !(config.period_min > 0.0 && config.period_max > config.period_min) {
        return Err(AppError::new(2, "Invalid period range for synthetic objects."));
    }
    if !(0.0..=1.0).contains(&config.known_epoch_fraction) {
        return Err(AppError::new(2, "Known-epoch fraction must be within [0, 1]."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, config.noise.max(0.0))
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let n_samples = (config.span_days / config.cadence).floor() as usize;
    let mut objects = Vec::with_capacity(config.count);

    for i in 0..config.count {
        let period = rng.gen_range(config.period_min..config.period_max);
        let epoch = SPAN_START + rng.gen_range(0.0..period);
        let primary_depth = rng.gen_range(0.2..0.6);
        let secondary_depth = primary_depth * rng.gen_range(0.0..0.5);
        let width = period * rng.gen_range(0.03..0.06);
        let eclipses = Eclipses {
            period,
            epoch,
            primary_depth,
            secondary_depth,
            width,
        };

        let samples = (0..n_samples)
            .map(|k| {
                let t = SPAN_START + k as f64 * config.cadence;
                Sample::new(t, eclipses.flux(t) + noise.sample(&mut rng))
            })
            .collect();

        objects.push(SynthObject {
            name: format!("SYN-{:04}", i + 1),
            eclipses,
            epoch_known: rng.gen_bool(config.known_epoch_fraction),
            series: TimeSeries::new(samples),
        });
    }

    Ok(objects)
}

/// Paths produced by [`write_dataset`].
#[derive(Debug, Clone)]
pub struct SynthDataset {
    pub manifest: PathBuf,
    pub curves_dir: PathBuf,
}

/// Write `objects.csv` (name, period, jd_min) and `curves/lc_<name>.csv` (jd, flux).
pub fn write_dataset(out_dir: &Path, objects: &[SynthObject]) -> Result<SynthDataset, AppError> {
    let curves_dir = out_dir.join("curves");
    fs::create_dir_all(&curves_dir).map_err(|e| {
        AppError::new(2, format!("Failed to create '{}': {e}", curves_dir.display()))
    })?;

    let manifest = out_dir.join("objects.csv");
    let file = File::create(&manifest)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", manifest.display())))?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    writer
        .write_record(["name", "period", "jd_min"])
        .map_err(|e| AppError::new(2, format!("Failed to write manifest: {e}")))?;

    for obj in objects {
        let epoch = if obj.epoch_known {
            obj.eclipses.epoch.to_string()
        } else {
            String::new()
        };
        writer
            .write_record([obj.name.clone(), obj.eclipses.period.to_string(), epoch])
            .map_err(|e| AppError::new(2, format!("Failed to write manifest: {e}")))?;

        let path = curves_dir.join(format!("lc_{}.csv", obj.name));
        write_series(&path, &obj.series)
            .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write manifest: {e}")))?;

    Ok(SynthDataset {
        manifest,
        curves_dir,
    })
}

fn write_series(path: &Path, series: &TimeSeries) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "jd,flux")?;
    for s in &series.samples {
        writeln!(out, "{},{}", s.time, s.flux)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EpochFitOptions, Period};
    use crate::epoch::fit_epoch;

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let config = SynthConfig {
            count: 3,
            ..SynthConfig::default()
        };
        let a = generate_objects(&config).unwrap();
        let b = generate_objects(&config).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.name, y.name);
            assert_eq!(x.eclipses, y.eclipses);
            assert_eq!(x.series, y.series);
        }
    }

    #[test]
    fn eclipse_minimum_sits_at_the_epoch() {
        let e = Eclipses {
            period: 2.0,
            epoch: 10.0,
            primary_depth: 0.4,
            secondary_depth: 0.1,
            width: 0.08,
        };
        assert!((e.flux(10.0) - 0.6).abs() < 1e-9);
        assert!((e.flux(12.0) - 0.6).abs() < 1e-9);
        assert!((e.flux(11.0) - 0.9).abs() < 1e-9);
        assert!((e.flux(10.5) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn fitted_epoch_matches_truth_modulo_period() {
        let config = SynthConfig {
            count: 4,
            seed: 7,
            ..SynthConfig::default()
        };
        for obj in generate_objects(&config).unwrap() {
            let period = Period::new(obj.eclipses.period).unwrap();
            let fit = fit_epoch(&obj.series, period, &EpochFitOptions::default()).unwrap();
            let phase = fold_phase(fit.location, obj.eclipses.epoch, obj.eclipses.period);
            let off = phase.min(1.0 - phase);
            assert!(off < 0.01, "{}: phase offset {off}", obj.name);
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let config = SynthConfig {
            known_epoch_fraction: 1.5,
            ..SynthConfig::default()
        };
        assert_eq!(generate_objects(&config).unwrap_err().exit_code(), 2);
    }
}
