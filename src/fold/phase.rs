//! Phase folding.
//!
//! `phase = ((t − epoch₀) / P) mod 1`, folded into `[0, 1)`:
//!
//! - `%` keeps the sign of the dividend, so negative remainders get `+ 1`
//! - `-1e-17 + 1.0` rounds to exactly `1.0`; that case maps to `0.0`

/// Fold one timestamp. `period` must be finite and `> 0`.
pub fn fold_phase(time: f64, epoch: f64, period: f64) -> f64 {
    let cycles = (time - epoch) / period;
    let mut phase = cycles % 1.0;
    if phase < 0.0 {
        phase += 1.0;
    }
    if phase >= 1.0 { 0.0 } else { phase }
}
