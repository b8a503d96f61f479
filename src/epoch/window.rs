//! Eclipse window selection.
//!
//! The dip is turned into a positive peak by inverting the flux around the
//! series baseline (median flux). The window is centered on the sample of
//! maximum inverted flux and spans `± window_fraction · P` in time.

use crate::domain::{Period, TimeSeries};
use crate::error::FoldError;
use crate::math::{argmax, median};

/// Samples selected for the peak fit.
#[derive(Debug, Clone, PartialEq)]
pub struct EclipseWindow {
    /// Time of the deepest sample; the fit runs in `t − center` coordinates.
    pub center: f64,
    /// Window half-width in time units.
    pub half_width: f64,
    /// Median flux of the whole series.
    pub baseline: f64,
    /// Times of windowed samples, input order.
    pub times: Vec<f64>,
    /// `baseline − flux` of windowed samples.
    pub inverted: Vec<f64>,
}

impl EclipseWindow {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Largest inverted flux in the window and its time.
    pub fn peak(&self) -> Option<(f64, f64)> {
        argmax(&self.inverted).map(|i| (self.times[i], self.inverted[i]))
    }
}

/// Pick the fit window for `series`.
pub fn select_window(
    series: &TimeSeries,
    period: Period,
    window_fraction: f64,
) -> Result<EclipseWindow, FoldError> {
    if series.is_empty() {
        return Err(FoldError::insufficient_data(1, 0));
    }
    if let Some(index) = series.first_non_finite() {
        return Err(FoldError::NonFiniteSample { index });
    }

    let fluxes: Vec<f64> = series.samples.iter().map(|s| s.flux).collect();
    let (lo, hi) = series
        .flux_range()
        .ok_or_else(|| FoldError::insufficient_data(1, 0))?;
    if hi <= lo {
        return Err(FoldError::DegenerateSeries(format!(
            "constant flux {lo} over {} samples",
            series.len()
        )));
    }

    let baseline = median(&fluxes).ok_or_else(|| FoldError::insufficient_data(1, 0))?;
    let inverted_all: Vec<f64> = fluxes.iter().map(|f| baseline - f).collect();
    let deepest = argmax(&inverted_all).ok_or_else(|| FoldError::insufficient_data(1, 0))?;
    let center = series.samples[deepest].time;
    let half_width = window_fraction * period.days();

    let mut times = Vec::new();
    let mut inverted = Vec::new();
    for (s, &y) in series.samples.iter().zip(&inverted_all) {
        if (s.time - center).abs() <= half_width {
            times.push(s.time);
            inverted.push(y);
        }
    }

    Ok(EclipseWindow {
        center,
        half_width,
        baseline,
        times,
        inverted,
    })
}
