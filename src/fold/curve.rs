//! Output curve construction: fold, normalize, stable-sort by phase.

use crate::domain::{Epoch, FoldedSample, OutputCurve, Period, TimeSeries};
use crate::error::FoldError;
use crate::fold::normalize::FluxScale;
use crate::fold::phase::fold_phase;

/// Build the output curve for one object.
///
/// Pure: identical inputs give an identical curve. Rows with equal phase keep
/// their input order.
pub fn fold_curve(series: &TimeSeries, period: Period, epoch: Epoch) -> Result<OutputCurve, FoldError> {
    if series.is_empty() {
        return Err(FoldError::insufficient_data(1, 0));
    }
    if !epoch.value.is_finite() {
        return Err(FoldError::InvalidEpoch(epoch.value));
    }
    if let Some(index) = series.first_non_finite() {
        return Err(FoldError::NonFiniteSample { index });
    }

    let scale = FluxScale::from_series(series)?;
    let p = period.days();

    let mut samples: Vec<FoldedSample> = series
        .samples
        .iter()
        .map(|s| FoldedSample {
            phase: fold_phase(s.time, epoch.value, p),
            normalized_flux: scale.apply(s.flux),
            time: s.time,
            flux: s.flux,
        })
        .collect();

    // `sort_by` is stable.
    samples.sort_by(|a, b| a.phase.total_cmp(&b.phase));

    Ok(OutputCurve {
        period: p,
        epoch,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_series() -> TimeSeries {
        TimeSeries::from_columns(&[0.0, 0.25, 0.5, 0.75, 1.0], &[1.0, 0.6, 0.2, 0.6, 1.0])
    }

    #[test]
    fn reference_example_end_to_end() {
        let curve = fold_curve(
            &reference_series(),
            Period::new(1.0).unwrap(),
            Epoch::external(0.5),
        )
        .unwrap();

        assert_eq!(curve.phases(), vec![0.0, 0.25, 0.5, 0.5, 0.75]);
        let expected_flux = [0.0, 0.5, 1.0, 1.0, 0.5];
        for (got, want) in curve.normalized_fluxes().iter().zip(expected_flux) {
            assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
        }
        // Equal-phase rows keep input order: t=0.0 before t=1.0.
        assert_eq!(curve.samples[2].time, 0.0);
        assert_eq!(curve.samples[3].time, 1.0);
        assert_eq!(curve.period, 1.0);
        assert_eq!(curve.epoch.value, 0.5);
    }

    #[test]
    fn normalization_hits_both_bounds_and_sort_holds() {
        let time: Vec<f64> = (0..97).map(|i| 2_458_000.0 + i as f64 * 0.173).collect();
        let flux: Vec<f64> = time.iter().map(|t| 1000.0 + 37.0 * (t * 3.1).sin()).collect();
        let series = TimeSeries::from_columns(&time, &flux);
        let curve = fold_curve(&series, Period::new(1.234).unwrap(), Epoch::external(2_458_000.4)).unwrap();

        let nf = curve.normalized_fluxes();
        let lo = nf.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = nf.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(lo, 0.0);
        assert_eq!(hi, 1.0);

        let phases = curve.phases();
        assert!(phases.windows(2).all(|w| w[0] <= w[1]));
        assert!(phases.iter().all(|p| (0.0..1.0).contains(p)));
        assert_eq!(curve.samples.len(), series.len());
    }

    #[test]
    fn folding_is_deterministic() {
        let series = reference_series();
        let period = Period::new(0.37).unwrap();
        let a = fold_curve(&series, period, Epoch::external(0.11)).unwrap();
        let b = fold_curve(&series, period, Epoch::external(0.11)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn constant_flux_is_rejected() {
        let series = TimeSeries::from_columns(&[0.0, 1.0, 2.0], &[5.0, 5.0, 5.0]);
        let err = fold_curve(&series, Period::new(1.0).unwrap(), Epoch::external(0.0)).unwrap_err();
        assert!(matches!(err, FoldError::DegenerateSeries(_)));
    }

    #[test]
    fn single_sample_is_rejected() {
        let series = TimeSeries::from_columns(&[3.0], &[1.0]);
        let err = fold_curve(&series, Period::new(1.0).unwrap(), Epoch::external(3.0)).unwrap_err();
        assert!(matches!(err, FoldError::DegenerateSeries(_)));
    }

    #[test]
    fn non_finite_epoch_is_rejected() {
        let err = fold_curve(
            &reference_series(),
            Period::new(1.0).unwrap(),
            Epoch::external(f64::INFINITY),
        )
        .unwrap_err();
        assert_eq!(err, FoldError::InvalidEpoch(f64::INFINITY));
    }

    #[test]
    fn input_is_left_untouched() {
        let series = reference_series();
        let before = series.clone();
        let _ = fold_curve(&series, Period::new(1.0).unwrap(), Epoch::external(0.5)).unwrap();
        assert_eq!(series, before);
    }
}
