//! Shared batch pipeline used by the `fold` and `estimate` commands.
//!
//! Per object:
//! period check -> curve lookup -> curve ingest -> epoch estimate -> fold -> write
//!
//! Every per-object failure becomes a skipped [`ObjectOutcome`]; only manifest
//! and directory problems abort the batch.

use rayon::prelude::*;

use crate::domain::{EpochFitOptions, FoldConfig, ObjectRecord, OutputCurve, Period, TimeSeries};
use crate::epoch::estimate_epoch;
use crate::error::{AppError, FoldError, SkipReason};
use crate::fold::fold_curve;
use crate::io::curve::write_curve_csv;
use crate::io::lightcurve::{CurveIndex, load_light_curve};
use crate::io::manifest::load_manifest;
use crate::report::{BatchReport, ObjectOutcome, ProcessedObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Estimate, fold and write one curve file per object.
    Fold,
    /// Estimate epochs only; nothing is written.
    EstimateOnly,
}

/// Estimate the epoch of one series and fold it.
pub fn process_series(
    series: &TimeSeries,
    period: Period,
    external_epoch: Option<f64>,
    opts: &EpochFitOptions,
) -> Result<OutputCurve, FoldError> {
    let epoch = estimate_epoch(series, period, external_epoch, opts)?;
    fold_curve(series, period, epoch)
}

/// Run the whole manifest.
pub fn run_batch(config: &FoldConfig, mode: RunMode) -> Result<BatchReport, AppError> {
    let manifest = load_manifest(&config.manifest_path, &config.columns, config.epoch_offset)?;
    for e in &manifest.row_errors {
        tracing::warn!(line = e.line, id = ?e.id, "manifest row skipped: {}", e.message);
    }
    let index = CurveIndex::scan(&config.curves_dir)?;
    tracing::info!(
        objects = manifest.objects.len(),
        curve_files = index.len(),
        jobs = config.jobs,
        "starting batch"
    );

    let outcomes: Vec<ObjectOutcome> = if config.jobs > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.jobs)
            .build()
            .map_err(|e| AppError::new(4, format!("Failed to start worker pool: {e}")))?;
        pool.install(|| {
            manifest
                .objects
                .par_iter()
                .map(|record| process_object(record, &index, config, mode))
                .collect()
        })
    } else {
        manifest
            .objects
            .iter()
            .map(|record| process_object(record, &index, config, mode))
            .collect()
    };

    Ok(BatchReport {
        manifest: config.manifest_path.clone(),
        manifest_rows: manifest.rows_read,
        duplicates: manifest.duplicates,
        manifest_row_errors: manifest.row_errors,
        outcomes,
    })
}

/// Run one manifest object and log its outcome.
pub fn process_object(
    record: &ObjectRecord,
    index: &CurveIndex,
    config: &FoldConfig,
    mode: RunMode,
) -> ObjectOutcome {
    let result = run_object(record, index, config, mode);
    match &result {
        Ok(p) => tracing::info!(
            object = %record.name,
            epoch = p.epoch.value,
            source = p.epoch.source.label(),
            samples = p.n_samples,
            "processed"
        ),
        Err(reason) => tracing::warn!(
            object = %record.name,
            line = record.line,
            reason = reason.kind(),
            "skipped: {reason}"
        ),
    }
    ObjectOutcome {
        name: record.name.clone(),
        result,
    }
}

fn run_object(
    record: &ObjectRecord,
    index: &CurveIndex,
    config: &FoldConfig,
    mode: RunMode,
) -> Result<ProcessedObject, SkipReason> {
    let period = Period::from_cell(record.period, &record.period_raw)?;
    let path = index.locate(&record.name)?;
    let light_curve = load_light_curve(path, &config.columns)?;
    if !light_curve.row_errors.is_empty() {
        tracing::warn!(
            object = %record.name,
            file = %path.display(),
            bad_rows = light_curve.row_errors.len(),
            rows = light_curve.rows_read,
            "light curve rows skipped"
        );
    }
    let series = &light_curve.series;

    let (epoch, curve, output) = match mode {
        RunMode::EstimateOnly => {
            let epoch = estimate_epoch(series, period, record.epoch, &config.fit)?;
            (epoch, None, None)
        }
        RunMode::Fold => {
            let curve = process_series(series, period, record.epoch, &config.fit)?;
            let output = write_curve_csv(
                &config.out_dir,
                &config.file_prefix,
                &record.name,
                &curve,
                config.write_raw,
            )
            .map_err(SkipReason::WriteFailed)?;
            tracing::debug!(object = %record.name, output = %output.display(), "curve written");
            (curve.epoch, Some(curve), Some(output))
        }
    };

    Ok(ProcessedObject {
        period: period.days(),
        epoch,
        n_samples: series.len(),
        skipped_rows: light_curve.row_errors.len(),
        curve_file: Some(path.to_path_buf()),
        output,
        curve,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::data::{Eclipses, SynthConfig, generate_objects, write_dataset};
    use crate::domain::{ColumnNames, EpochSource};
    use crate::fold::fold_phase;

    fn temp_dir(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!("lcfold-{tag}-{}-{nanos}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config(manifest: &Path, curves: &Path, out: &Path, jobs: usize) -> FoldConfig {
        FoldConfig {
            manifest_path: manifest.to_path_buf(),
            curves_dir: curves.to_path_buf(),
            out_dir: out.to_path_buf(),
            columns: ColumnNames::default(),
            epoch_offset: 0.0,
            fit: EpochFitOptions::default(),
            jobs,
            write_raw: false,
            file_prefix: "lc".to_string(),
            report_path: None,
            plot: false,
            plot_width: 80,
            plot_height: 20,
        }
    }

    fn write_dip_curve(path: &Path, flat: bool) {
        let eclipses = Eclipses {
            period: 1.0,
            epoch: 0.3,
            primary_depth: 0.3,
            secondary_depth: 0.0,
            width: 0.05,
        };
        let mut text = String::from("jd,flux\n");
        for k in 0..500 {
            let t = k as f64 * 0.01;
            let flux = if flat { 1.0 } else { eclipses.flux(t) };
            text.push_str(&format!("{t},{flux}\n"));
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn batch_skips_bad_objects_and_keeps_going() {
        let root = temp_dir("skips");
        let curves = root.join("curves");
        fs::create_dir_all(&curves).unwrap();
        write_dip_curve(&curves.join("ALPHA.csv"), false);
        write_dip_curve(&curves.join("DELTA.csv"), true);
        let manifest = root.join("objects.csv");
        fs::write(
            &manifest,
            "name,period,jd_min\nDELTA,1.0,\nCHARLIE,2.0,5.0\nBRAVO,-1,\nALPHA,1.0,\nALPHA,9.0,\n",
        )
        .unwrap();

        let out = root.join("out");
        let report = run_batch(&config(&manifest, &curves, &out, 1), RunMode::Fold).unwrap();

        let names: Vec<&str> = report.outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["ALPHA", "BRAVO", "CHARLIE", "DELTA"]);
        assert_eq!(report.duplicates, 1);

        let kinds: Vec<&str> = report.skipped().map(|(_, r)| r.kind()).collect();
        assert_eq!(kinds, vec!["InvalidPeriod", "CurveNotFound", "DegenerateSeries"]);

        let (name, alpha) = report.processed().next().unwrap();
        assert_eq!(name, "ALPHA");
        assert_eq!(alpha.epoch.source, EpochSource::Fitted);
        let phase = fold_phase(alpha.epoch.value, 0.3, 1.0);
        assert!(phase.min(1.0 - phase) < 1e-3, "phase offset {phase}");
        let output = alpha.output.as_ref().unwrap();
        assert!(output.ends_with("lc_ALPHA_fitted_epoch.csv"));
        assert!(output.exists());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn estimate_mode_writes_nothing() {
        let root = temp_dir("estimate");
        let curves = root.join("curves");
        fs::create_dir_all(&curves).unwrap();
        write_dip_curve(&curves.join("ALPHA.csv"), false);
        let manifest = root.join("objects.csv");
        fs::write(&manifest, "name,period,jd_min\nALPHA,1.0,0.25\n").unwrap();

        let out = root.join("out");
        let report = run_batch(&config(&manifest, &curves, &out, 1), RunMode::EstimateOnly).unwrap();
        let (_, alpha) = report.processed().next().unwrap();
        assert_eq!(alpha.epoch.source, EpochSource::External);
        assert_eq!(alpha.epoch.value, 0.25);
        assert!(alpha.output.is_none());
        assert!(!out.exists());

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn parallel_run_matches_sequential_byte_for_byte() {
        let root = temp_dir("parallel");
        let objects = generate_objects(&SynthConfig {
            count: 6,
            seed: 11,
            ..SynthConfig::default()
        })
        .unwrap();
        let dataset = write_dataset(&root, &objects).unwrap();

        let seq = run_batch(
            &config(&dataset.manifest, &dataset.curves_dir, &root.join("seq"), 1),
            RunMode::Fold,
        )
        .unwrap();
        let par = run_batch(
            &config(&dataset.manifest, &dataset.curves_dir, &root.join("par"), 3),
            RunMode::Fold,
        )
        .unwrap();

        assert_eq!(seq.processed_count(), 6);
        assert_eq!(par.processed_count(), 6);
        for ((_, a), (_, b)) in seq.processed().zip(par.processed()) {
            let a = fs::read(a.output.as_ref().unwrap()).unwrap();
            let b = fs::read(b.output.as_ref().unwrap()).unwrap();
            assert_eq!(a, b);
        }

        for (obj, (name, p)) in objects.iter().zip(seq.processed()) {
            assert_eq!(obj.name, name);
            let expected = if obj.epoch_known {
                EpochSource::External
            } else {
                EpochSource::Fitted
            };
            assert_eq!(p.epoch.source, expected);
            let phase = fold_phase(p.epoch.value, obj.eclipses.epoch, obj.eclipses.period);
            assert!(phase.min(1.0 - phase) < 0.01, "{name}: phase offset {phase}");
        }

        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn missing_manifest_is_fatal() {
        let root = temp_dir("missing");
        let err = run_batch(
            &config(&root.join("nope.csv"), &root, &root.join("out"), 1),
            RunMode::Fold,
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        fs::remove_dir_all(&root).ok();
    }
}
