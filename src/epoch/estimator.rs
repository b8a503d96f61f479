//! Reference-epoch estimation for one object.
//!
//! Two mutually exclusive paths:
//!
//! - a finite external epoch (catalog) is returned unchanged, no fit runs
//! - otherwise a Gaussian peak is fitted to the inverted flux inside the
//!   eclipse window and its location becomes the epoch
//!
//! The fit runs in window-centered time (`t − center`) so the location
//! parameter stays O(window) even for full Julian dates.

use nalgebra::{DMatrix, DVector};

use crate::domain::{Epoch, EpochFitOptions, PeakFit, Period, TimeSeries};
use crate::epoch::window::{EclipseWindow, select_window};
use crate::error::FoldError;
use crate::math::{LeastSquaresProblem, LmOptions, minimize};
use crate::models::{AMPLITUDE, LOCATION, PEAK_PARAMS, WIDTH, fill_jacobian_row, predict};

/// The model has three free parameters.
const MIN_WINDOW_SAMPLES: usize = PEAK_PARAMS;

/// Starting peak width, as a fraction of the period.
const INITIAL_WIDTH_FRACTION: f64 = 0.2;

/// Fitted widths below this fraction of the period count as a collapse.
const MIN_WIDTH_FRACTION: f64 = 1e-9;

/// Windowed samples in centered coordinates.
struct PeakProblem {
    t: Vec<f64>,
    y: Vec<f64>,
}

impl PeakProblem {
    fn from_window(window: &EclipseWindow) -> Self {
        Self {
            t: window.times.iter().map(|t| t - window.center).collect(),
            y: window.inverted.clone(),
        }
    }
}

impl LeastSquaresProblem for PeakProblem {
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64> {
        let p = params.as_slice();
        DVector::from_iterator(
            self.t.len(),
            self.t.iter().zip(&self.y).map(|(&t, &y)| y - predict(p, t)),
        )
    }

    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64> {
        let p = params.as_slice();
        let mut j = DMatrix::<f64>::zeros(self.t.len(), PEAK_PARAMS);
        let mut row = [0.0; PEAK_PARAMS];
        for (i, &t) in self.t.iter().enumerate() {
            fill_jacobian_row(p, t, &mut row);
            for (k, v) in row.iter().enumerate() {
                j[(i, k)] = *v;
            }
        }
        j
    }
}

/// Starting point `[A, μ, σ]` in window-centered time: the window's peak
/// inverted flux, the time of that peak, and `0.2 · P`.
pub fn initial_guess(window: &EclipseWindow, period: Period) -> Option<DVector<f64>> {
    let (t_peak, amplitude) = window.peak()?;
    let mut initial = DVector::<f64>::zeros(PEAK_PARAMS);
    initial[AMPLITUDE] = amplitude;
    initial[LOCATION] = t_peak - window.center;
    initial[WIDTH] = INITIAL_WIDTH_FRACTION * period.days();
    Some(initial)
}

/// Produce the reference epoch for one object.
///
/// `external` wins whenever it is finite; the series is then not inspected.
pub fn estimate_epoch(
    series: &TimeSeries,
    period: Period,
    external: Option<f64>,
    opts: &EpochFitOptions,
) -> Result<Epoch, FoldError> {
    if let Some(value) = external.filter(|v| v.is_finite()) {
        return Ok(Epoch::external(value));
    }
    fit_epoch(series, period, opts).map(Epoch::fitted)
}

/// Fit the eclipse peak and return its parameters (location in series time).
pub fn fit_epoch(
    series: &TimeSeries,
    period: Period,
    opts: &EpochFitOptions,
) -> Result<PeakFit, FoldError> {
    let window = select_window(series, period, opts.window_fraction)?;
    if window.len() < MIN_WINDOW_SAMPLES {
        return Err(FoldError::insufficient_data(MIN_WINDOW_SAMPLES, window.len()));
    }

    let initial = initial_guess(&window, period)
        .ok_or_else(|| FoldError::insufficient_data(MIN_WINDOW_SAMPLES, 0))?;

    tracing::debug!(
        center = window.center,
        n_window = window.len(),
        amplitude = initial[AMPLITUDE],
        "fitting eclipse peak"
    );

    let problem = PeakProblem::from_window(&window);
    let lm_opts = LmOptions {
        max_iterations: opts.max_iterations,
        ..LmOptions::default()
    };
    let report = minimize(&problem, initial, &lm_opts)
        .map_err(|e| FoldError::divergence(e.iterations(), e.to_string()))?;

    let amplitude = report.params[AMPLITUDE];
    let location = report.params[LOCATION] + window.center;
    // The model is even in σ.
    let width = report.params[WIDTH].abs();

    if !(amplitude.is_finite() && location.is_finite() && width.is_finite()) {
        return Err(FoldError::divergence(
            report.iterations,
            "non-finite fitted parameters",
        ));
    }
    if width < MIN_WIDTH_FRACTION * period.days() {
        return Err(FoldError::divergence(
            report.iterations,
            format!("peak width collapsed to {width:e}"),
        ));
    }
    if amplitude <= 0.0 {
        return Err(FoldError::divergence(
            report.iterations,
            format!("fitted a bump, not a dip (amplitude {amplitude:e})"),
        ));
    }

    Ok(PeakFit {
        amplitude,
        location,
        width,
        sse: report.sse,
        iterations: report.iterations,
        n_window: window.len(),
    })
}
