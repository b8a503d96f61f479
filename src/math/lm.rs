//! Levenberg–Marquardt nonlinear least squares.
//!
//! Minimizes `Σ r_i(p)²` where `r = y − f(p)`. The problem supplies residuals
//! and the Jacobian of the model `f` (not of `r`), so a linearized step solves
//! `J δ ≈ r`.
//!
//! The iteration count is hard-bounded; exceeding it is reported as
//! [`LmFailure::MaxIterations`] and never blocks. Saturated damping counts as
//! convergence only after at least one accepted step.

use nalgebra::{DMatrix, DVector};

use crate::math::ols::solve_damped_step;

/// Damping above this means no descent direction is left at working precision.
const LAMBDA_MAX: f64 = 1e16;
const LAMBDA_MIN: f64 = 1e-15;

/// A least-squares problem with an analytic Jacobian.
pub trait LeastSquaresProblem {
    /// `y − f(params)`, one entry per observation.
    fn residuals(&self, params: &DVector<f64>) -> DVector<f64>;

    /// `∂f/∂params`, shape `n_obs × n_params`.
    fn jacobian(&self, params: &DVector<f64>) -> DMatrix<f64>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LmOptions {
    pub max_iterations: usize,
    /// Relative SSE reduction below which we stop.
    pub ftol: f64,
    /// Relative step size below which we stop.
    pub xtol: f64,
    /// Max-norm of `Jᵀr` below which we stop.
    pub gtol: f64,
    pub initial_lambda: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-14,
            initial_lambda: 1e-3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LmReport {
    pub params: DVector<f64>,
    pub sse: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LmFailure {
    /// Budget exhausted before any stopping criterion held.
    MaxIterations { iterations: usize, sse: f64 },
    /// Residuals or parameters became NaN/infinite.
    NonFinite { iterations: usize },
    /// The damped step could not be solved.
    Singular { iterations: usize },
    /// Damping hit its cap before any step reduced the SSE.
    Stalled { iterations: usize },
}

impl LmFailure {
    pub fn iterations(&self) -> usize {
        match self {
            LmFailure::MaxIterations { iterations, .. }
            | LmFailure::NonFinite { iterations }
            | LmFailure::Singular { iterations }
            | LmFailure::Stalled { iterations } => *iterations,
        }
    }
}

impl std::fmt::Display for LmFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LmFailure::MaxIterations { iterations, sse } => {
                write!(f, "no convergence within {iterations} iterations (sse={sse:.3e})")
            }
            LmFailure::NonFinite { .. } => write!(f, "non-finite residuals or parameters"),
            LmFailure::Singular { .. } => write!(f, "singular damped system"),
            LmFailure::Stalled { .. } => write!(f, "no step reduced the residuals"),
        }
    }
}

/// Run Levenberg–Marquardt from `initial`.
pub fn minimize<P: LeastSquaresProblem>(
    problem: &P,
    initial: DVector<f64>,
    opts: &LmOptions,
) -> Result<LmReport, LmFailure> {
    let mut params = initial;
    let mut residuals = problem.residuals(&params);
    let mut sse = residuals.norm_squared();
    if !sse.is_finite() || params.iter().any(|v| !v.is_finite()) {
        return Err(LmFailure::NonFinite { iterations: 0 });
    }

    let mut lambda = opts.initial_lambda;
    let mut any_accepted = false;

    for iteration in 1..=opts.max_iterations {
        let jacobian = problem.jacobian(&params);
        if jacobian.iter().any(|v| !v.is_finite()) {
            return Err(LmFailure::NonFinite { iterations: iteration });
        }

        let gradient = jacobian.transpose() * &residuals;
        if gradient.amax() <= opts.gtol {
            return Ok(LmReport {
                params,
                sse,
                iterations: iteration - 1,
            });
        }

        // Raise damping until the step reduces SSE.
        loop {
            let step = solve_damped_step(&jacobian, &residuals, lambda)
                .ok_or(LmFailure::Singular { iterations: iteration })?;
            let candidate = &params + &step;
            let candidate_residuals = problem.residuals(&candidate);
            let candidate_sse = candidate_residuals.norm_squared();

            if candidate_sse.is_finite() && candidate_sse < sse {
                let reduction = sse - candidate_sse;
                let small_step = step.norm() <= opts.xtol * (params.norm() + opts.xtol);
                let small_reduction = reduction <= opts.ftol * sse;

                tracing::trace!(iteration, lambda, sse = candidate_sse, "lm step accepted");

                params = candidate;
                residuals = candidate_residuals;
                sse = candidate_sse;
                lambda = (lambda / 10.0).max(LAMBDA_MIN);
                any_accepted = true;

                if small_step || small_reduction {
                    return Ok(LmReport {
                        params,
                        sse,
                        iterations: iteration,
                    });
                }
                break;
            }

            lambda *= 10.0;
            if lambda > LAMBDA_MAX {
                if !any_accepted {
                    return Err(LmFailure::Stalled { iterations: iteration });
                }
                return Ok(LmReport {
                    params,
                    sse,
                    iterations: iteration,
                });
            }
        }
    }

    Err(LmFailure::MaxIterations {
        iterations: opts.max_iterations,
        sse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `y = a · exp(b · x)`.
    struct ExpDecay {
        x: Vec<f64>,
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for ExpDecay {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(
                self.x.len(),
                self.x.iter().zip(&self.y).map(|(&x, &y)| y - p[0] * (p[1] * x).exp()),
            )
        }

        fn jacobian(&self, p: &DVector<f64>) -> DMatrix<f64> {
            let mut j = DMatrix::zeros(self.x.len(), 2);
            for (i, &x) in self.x.iter().enumerate() {
                let e = (p[1] * x).exp();
                j[(i, 0)] = e;
                j[(i, 1)] = p[0] * x * e;
            }
            j
        }
    }

    fn exp_problem() -> ExpDecay {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y = x.iter().map(|&x| 3.0 * (-0.7 * x).exp()).collect();
        ExpDecay { x, y }
    }

    #[test]
    fn recovers_exponential_parameters() {
        let problem = exp_problem();
        let report = minimize(
            &problem,
            DVector::from_row_slice(&[1.0, -0.1]),
            &LmOptions::default(),
        )
        .unwrap();

        assert!((report.params[0] - 3.0).abs() < 1e-6, "{:?}", report.params);
        assert!((report.params[1] + 0.7).abs() < 1e-6, "{:?}", report.params);
        assert!(report.sse < 1e-12);
    }

    #[test]
    fn exhausted_budget_is_a_failure() {
        let problem = exp_problem();
        let opts = LmOptions {
            max_iterations: 1,
            ..LmOptions::default()
        };
        let err = minimize(&problem, DVector::from_row_slice(&[1.0, -0.1]), &opts).unwrap_err();
        assert!(matches!(err, LmFailure::MaxIterations { iterations: 1, .. }));
    }

    /// Constant model whose Jacobian has the wrong sign, so every step goes uphill.
    struct Uphill {
        y: Vec<f64>,
    }

    impl LeastSquaresProblem for Uphill {
        fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
            DVector::from_iterator(self.y.len(), self.y.iter().map(|&y| y - p[0]))
        }

        fn jacobian(&self, _p: &DVector<f64>) -> DMatrix<f64> {
            DMatrix::from_element(self.y.len(), 1, -1.0)
        }
    }

    #[test]
    fn damping_cap_without_progress_is_a_failure() {
        let problem = Uphill {
            y: vec![1.0, 2.0, 3.0],
        };
        let err = minimize(&problem, DVector::from_row_slice(&[0.0]), &LmOptions::default())
            .unwrap_err();
        assert_eq!(err, LmFailure::Stalled { iterations: 1 });
    }

    #[test]
    fn constant_model_converges_to_the_mean() {
        struct Constant {
            y: Vec<f64>,
        }

        impl LeastSquaresProblem for Constant {
            fn residuals(&self, p: &DVector<f64>) -> DVector<f64> {
                DVector::from_iterator(self.y.len(), self.y.iter().map(|&y| y - p[0]))
            }

            fn jacobian(&self, _p: &DVector<f64>) -> DMatrix<f64> {
                DMatrix::from_element(self.y.len(), 1, 1.0)
            }
        }

        let problem = Constant {
            y: vec![1.0, 2.0, 3.0],
        };
        let report =
            minimize(&problem, DVector::from_row_slice(&[0.0]), &LmOptions::default()).unwrap();
        assert!(report.iterations >= 1);
        assert!((report.params[0] - 2.0).abs() < 1e-6, "{:?}", report.params);
    }

    #[test]
    fn non_finite_start_is_rejected() {
        let problem = exp_problem();
        let err = minimize(
            &problem,
            DVector::from_row_slice(&[f64::NAN, -0.1]),
            &LmOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, LmFailure::NonFinite { iterations: 0 });
    }
}
