//! Ordinary least-squares straight-line fit.

use super::{r_squared, FitResult};

/// Fit `y = intercept + slope · x`, params `[intercept, slope]`.
///
/// Fails (without panicking) when fewer than two points are given or the x
/// values carry no spread.
pub fn fit_linear(x: &[f64], y: &[f64]) -> FitResult {
    let n = x.len().min(y.len());
    if n < 2 {
        return FitResult::failed(vec![f64::NAN; 2], n);
    }
    let nf = n as f64;
    let mean_x = x[..n].iter().sum::<f64>() / nf;
    let mean_y = y[..n].iter().sum::<f64>() / nf;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        sxx += dx * dx;
        sxy += dx * (y[i] - mean_y);
    }
    if sxx <= 0.0 {
        return FitResult::failed(vec![f64::NAN; 2], n);
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let residuals: Vec<f64> = (0..n).map(|i| y[i] - (intercept + slope * x[i])).collect();
    let r2 = r_squared(&y[..n], &residuals);
    FitResult {
        params: vec![intercept, slope],
        residuals,
        r_squared: r2,
        converged: true,
    }
}
