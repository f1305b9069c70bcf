//! Levenberg–Marquardt Gaussian fit.

use nalgebra::Vector4;

use super::lm::{minimize, Model4};
use super::{FitResult, FWHM_PER_SIGMA, FWTM_PER_SIGMA};

/// `a + b · exp(−(x − c)² / (2σ²))` with params `[a, b, c, σ]`.
struct Gaussian;

const MIN_SIGMA: f64 = 1e-6;
const MAX_ITERS: usize = 200;

impl Model4 for Gaussian {
    fn eval(&self, x: f64, p: &Vector4<f64>) -> (f64, Vector4<f64>) {
        let (a, b, c, sigma) = (p[0], p[1], p[2], p[3]);
        let t = x - c;
        let s2 = sigma * sigma;
        let e = (-t * t / (2.0 * s2)).exp();
        let value = a + b * e;
        let grad = Vector4::new(1.0, e, b * e * t / s2, b * e * t * t / (s2 * sigma));
        (value, grad)
    }

    fn constrain(&self, p: &mut Vector4<f64>) {
        // width is a scale parameter; the model is even in σ
        p[3] = p[3].abs().max(MIN_SIGMA);
    }
}

/// Fit a 4-parameter Gaussian to the segment samples.
///
/// Initial guess: baseline = min(y), amplitude = max(y) − min(y),
/// center = argmax(y), width = a quarter of the x span. Segments shorter
/// than four samples cannot constrain four parameters and fail outright.
pub fn fit_gaussian(x: &[f64], y: &[f64]) -> FitResult {
    let n = x.len().min(y.len());
    if n < 4 {
        return FitResult::failed(vec![f64::NAN; 4], n);
    }
    let (mut y_min, mut y_max, mut argmax) = (y[0], y[0], 0usize);
    for (i, &v) in y.iter().enumerate().take(n) {
        if v < y_min {
            y_min = v;
        }
        if v > y_max {
            y_max = v;
            argmax = i;
        }
    }
    let span = (x[n - 1] - x[0]).abs();
    let init = Vector4::new(
        y_min,
        y_max - y_min,
        x[argmax],
        (0.25 * span).max(MIN_SIGMA),
    );
    minimize(&Gaussian, &x[..n], &y[..n], init, MAX_ITERS)
}

/// Fitted peak center, in the same units as the fit's x values.
#[inline]
pub fn peak_position(fit: &FitResult) -> f64 {
    fit.params[2]
}

/// FWHM and FWTM in millimetres from a converged Gaussian fit.
#[inline]
pub fn resolution_mm(fit: &FitResult, pixel_pitch: f64) -> (f64, f64) {
    let sigma = fit.params[3];
    (
        sigma * FWHM_PER_SIGMA * pixel_pitch,
        sigma * FWTM_PER_SIGMA * pixel_pitch,
    )
}
