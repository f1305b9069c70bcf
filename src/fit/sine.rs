//! Levenberg–Marquardt sinusoid fit for center-of-rotation sweeps.

use nalgebra::Vector4;

use super::lm::{minimize, Model4};
use super::FitResult;

/// `a + b · sin(c·x + d)` with params `[offset, amplitude, frequency, phase]`.
struct Sine;

const MAX_ITERS: usize = 300;

impl Model4 for Sine {
    fn eval(&self, x: f64, p: &Vector4<f64>) -> (f64, Vector4<f64>) {
        let (a, b, c, d) = (p[0], p[1], p[2], p[3]);
        let arg = c * x + d;
        let s = arg.sin();
        let cosv = arg.cos();
        let value = a + b * s;
        let grad = Vector4::new(1.0, s, b * x * cosv, b * cosv);
        (value, grad)
    }
}

/// Fit a 4-parameter sinusoid starting from a caller-supplied guess.
///
/// The center-of-rotation sweep knows its approximate frequency (2π divided
/// by the number of views) and seeds the offset with the first centroid, so
/// the initial guess comes from the caller rather than from the data.
pub fn fit_sine(x: &[f64], y: &[f64], init: [f64; 4]) -> FitResult {
    let n = x.len().min(y.len());
    if n < 4 {
        return FitResult::failed(init.to_vec(), n);
    }
    let init = Vector4::new(init[0], init[1], init[2], init[3]);
    minimize(&Sine, &x[..n], &y[..n], init, MAX_ITERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_free_sinusoid_round_trip() {
        let n = 64usize;
        let freq = 2.0 * std::f64::consts::PI / n as f64;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = x
            .iter()
            .map(|&xi| 32.0 + 5.0 * (freq * xi + 0.3).sin())
            .collect();
        let fit = fit_sine(&x, &y, [y[0], 1.0, freq, 0.0]);
        assert!(fit.converged, "sine fit failed: {:?}", fit.params);
        assert!((fit.params[0] - 32.0).abs() < 1e-6);
        assert!((fit.params[1].abs() - 5.0).abs() < 1e-6);
        assert!(fit.sum_squared_residuals() < 1e-9);
    }

    #[test]
    fn too_few_views_fail() {
        let fit = fit_sine(&[0.0, 1.0], &[1.0, 2.0], [0.0, 1.0, 1.0, 0.0]);
        assert!(!fit.converged);
        assert!(fit.sum_squared_residuals().is_nan());
    }
}
