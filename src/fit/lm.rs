//! Damped least-squares (Levenberg–Marquardt) core for 4-parameter models.

use log::warn;
use nalgebra::{Matrix4, Vector4};

use super::{r_squared, FitResult};

/// A 4-parameter scalar model with analytic gradient.
pub(crate) trait Model4 {
    /// Model value and gradient with respect to the parameters at `x`.
    fn eval(&self, x: f64, p: &Vector4<f64>) -> (f64, Vector4<f64>);

    /// Clamp parameters back into their valid domain after a step.
    fn constrain(&self, _p: &mut Vector4<f64>) {}
}

const MAX_LAMBDA: f64 = 1e12;
const SSR_TOLERANCE: f64 = 1e-12;
const STEP_TOLERANCE: f64 = 1e-10;

/// Minimize the sum of squared residuals from `init`, returning the fit
/// outcome. The iteration cap is the only timeout: exhausting it without
/// meeting the convergence criterion reports `converged == false`.
pub(crate) fn minimize<M: Model4>(
    model: &M,
    x: &[f64],
    y: &[f64],
    init: Vector4<f64>,
    max_iters: usize,
) -> FitResult {
    debug_assert_eq!(x.len(), y.len());
    let n = x.len();
    if n < 4 {
        return FitResult::failed(init.iter().copied().collect(), n);
    }

    let mut params = init;
    model.constrain(&mut params);
    let mut ssr = sum_squared(model, x, y, &params);
    let mut lambda = 1e-3;
    let mut converged = false;

    for _ in 0..max_iters {
        // accumulate the normal equations JᵀJ and Jᵀr
        let mut jtj = Matrix4::<f64>::zeros();
        let mut jtr = Vector4::<f64>::zeros();
        for i in 0..n {
            let (f, grad) = model.eval(x[i], &params);
            let r = y[i] - f;
            jtj += grad * grad.transpose();
            jtr += grad * r;
        }

        // damped step: (JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr
        let mut accepted = false;
        let mut saw_valid_step = false;
        while lambda <= MAX_LAMBDA {
            let mut damped = jtj;
            for k in 0..4 {
                damped[(k, k)] += lambda * jtj[(k, k)].max(1e-12);
            }
            let step = match damped.lu().solve(&jtr) {
                Some(s) if s.iter().all(|v| v.is_finite()) => s,
                _ => {
                    lambda *= 10.0;
                    continue;
                }
            };
            saw_valid_step = true;
            let mut trial = params + step;
            model.constrain(&mut trial);
            let trial_ssr = sum_squared(model, x, y, &trial);
            if trial_ssr.is_finite() && trial_ssr < ssr {
                let improvement = (ssr - trial_ssr) / ssr.max(1e-300);
                params = trial;
                ssr = trial_ssr;
                lambda = (lambda * 0.1).max(1e-12);
                accepted = true;
                if improvement < SSR_TOLERANCE || step.norm() < STEP_TOLERANCE {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
        }
        if !accepted {
            // no damping level improved the residual: we are either sitting
            // at a local minimum or the normal equations are degenerate
            converged = saw_valid_step && ssr.is_finite();
            if !converged {
                warn!("LM solver stalled with singular normal equations");
            }
            break;
        }
        if converged {
            break;
        }
    }

    let residuals: Vec<f64> = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| yi - model.eval(xi, &params).0)
        .collect();
    let r2 = r_squared(y, &residuals);
    FitResult {
        params: params.iter().copied().collect(),
        residuals,
        r_squared: r2,
        converged,
    }
}

fn sum_squared<M: Model4>(model: &M, x: &[f64], y: &[f64], p: &Vector4<f64>) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - model.eval(xi, p).0;
            r * r
        })
        .sum()
}
