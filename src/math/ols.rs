//! Linear least-squares solves used by the nonlinear fitter.
//!
//! Every Levenberg–Marquardt iteration reduces to a small linear problem:
//!
//! ```text
//! minimize ‖J δ − r‖² + λ ‖D δ‖²
//! ```
//!
//! where `J` is the model Jacobian, `r` the residual vector and `D` the
//! Marquardt scaling (`sqrt(diag(JᵀJ))`). We stack it as an augmented tall
//! system `[J; √λ D] δ = [r; 0]` and solve with SVD (no `JᵀJ` is formed).

use nalgebra::{DMatrix, DVector};

/// Floor for Marquardt scaling entries (a parameter the model ignores).
const MIN_SCALE: f64 = 1e-12;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve one damped Gauss–Newton step.
///
/// `jacobian` is `n × p`, `residuals` has length `n`. Returns the parameter
/// increment `δ` (length `p`).
pub fn solve_damped_step(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let (n, p) = jacobian.shape();
    if residuals.len() != n || p == 0 {
        return None;
    }

    let sqrt_lambda = lambda.max(0.0).sqrt();
    let mut a = DMatrix::<f64>::zeros(n + p, p);
    let mut b = DVector::<f64>::zeros(n + p);

    a.view_mut((0, 0), (n, p)).copy_from(jacobian);
    b.rows_mut(0, n).copy_from(residuals);

    for j in 0..p {
        let scale = jacobian.column(j).norm().max(MIN_SCALE);
        a[(n + j, j)] = sqrt_lambda * scale;
    }

    solve_least_squares(&a, &b)
}
