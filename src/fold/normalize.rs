//! Min–max flux normalization.
//!
//! One affine map per object: `(f − min) / (max − min)`, with `min`/`max`
//! taken over the whole series. The extremes map to exactly `0` and `1`.

use crate::domain::TimeSeries;
use crate::error::FoldError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxScale {
    pub min: f64,
    pub max: f64,
}

impl FluxScale {
    /// Measure the flux range of `series`.
    ///
    /// Fewer than two samples, or a constant flux, is `DegenerateSeries`.
    pub fn from_series(series: &TimeSeries) -> Result<Self, FoldError> {
        if series.len() < 2 {
            return Err(FoldError::DegenerateSeries(format!(
                "{} sample(s), need at least 2",
                series.len()
            )));
        }
        let (min, max) = series
            .flux_range()
            .ok_or_else(|| FoldError::insufficient_data(2, 0))?;
        if !(max > min) {
            return Err(FoldError::DegenerateSeries(format!(
                "zero flux range (min = max = {min})"
            )));
        }
        Ok(Self { min, max })
    }

    pub fn apply(&self, flux: f64) -> f64 {
        (flux - self.min) / (self.max - self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes_map_exactly_to_unit_bounds() {
        let series = TimeSeries::from_columns(&[0.0, 1.0, 2.0, 3.0], &[13.7, 9.1, 11.05, 10.2]);
        let scale = FluxScale::from_series(&series).unwrap();
        assert_eq!(scale.apply(9.1), 0.0);
        assert_eq!(scale.apply(13.7), 1.0);
        let mid = scale.apply(11.05);
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn constant_flux_is_degenerate() {
        let series = TimeSeries::from_columns(&[0.0, 1.0, 2.0], &[5.0, 5.0, 5.0]);
        assert!(matches!(
            FluxScale::from_series(&series),
            Err(FoldError::DegenerateSeries(_))
        ));
    }

    #[test]
    fn single_sample_is_degenerate() {
        let series = TimeSeries::from_columns(&[4.2], &[1.0]);
        assert!(matches!(
            FluxScale::from_series(&series),
            Err(FoldError::DegenerateSeries(_))
        ));
    }
}
