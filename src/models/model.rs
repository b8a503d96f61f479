//! Gaussian peak model used to locate an eclipse minimum.
//!
//! ```text
//! f(t) = A · exp(−(t − μ)² / (2σ²))
//! ```
//!
//! Parameters are packed as `[A, μ, σ]`. The fitter relies on two primitive
//! operations:
//! - predict `f(t)` (residuals, plots)
//! - fill one Jacobian row `∂f/∂[A, μ, σ]` at `t`

/// Number of free parameters.
pub const PEAK_PARAMS: usize = 3;

pub const AMPLITUDE: usize = 0;
pub const LOCATION: usize = 1;
pub const WIDTH: usize = 2;

/// Evaluate the peak at `t`.
pub fn predict(params: &[f64], t: f64) -> f64 {
    let (a, mu, sigma) = (params[AMPLITUDE], params[LOCATION], params[WIDTH]);
    let z = (t - mu) / sigma;
    a * (-0.5 * z * z).exp()
}

/// Fill `∂f/∂[A, μ, σ]` at `t`.
///
/// # Panics
/// Panics if `params` or `out` are shorter than [`PEAK_PARAMS`].
pub fn fill_jacobian_row(params: &[f64], t: f64, out: &mut [f64]) {
    let (a, mu, sigma) = (params[AMPLITUDE], params[LOCATION], params[WIDTH]);
    let d = t - mu;
    let z = d / sigma;
    let e = (-0.5 * z * z).exp();

    out[AMPLITUDE] = e;
    out[LOCATION] = a * e * d / (sigma * sigma);
    out[WIDTH] = a * e * d * d / (sigma * sigma * sigma);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_value_at_location_is_amplitude() {
        let p = [2.5, 10.0, 0.3];
        assert!((predict(&p, 10.0) - 2.5).abs() < 1e-15);
        // One sigma away: A · e^{-1/2}.
        assert!((predict(&p, 10.3) - 2.5 * (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let p = [1.7, 0.4, 0.25];
        let t = 0.55;
        let mut row = [0.0; PEAK_PARAMS];
        fill_jacobian_row(&p, t, &mut row);

        let h = 1e-6;
        for k in 0..PEAK_PARAMS {
            let mut hi = p;
            let mut lo = p;
            hi[k] += h;
            lo[k] -= h;
            let numeric = (predict(&hi, t) - predict(&lo, t)) / (2.0 * h);
            assert!(
                (numeric - row[k]).abs() < 1e-6,
                "param {k}: analytic={} numeric={numeric}",
                row[k]
            );
        }
    }
}
