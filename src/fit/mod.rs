//! Least-squares model fitting.
//!
//! - [`fit_gaussian`]: 4-parameter Gaussian (baseline, amplitude, center,
//!   width) via Levenberg–Marquardt.
//! - [`fit_linear`]: ordinary least-squares straight line.
//! - [`fit_sine`]: 4-parameter sinusoid for center-of-rotation sweeps.
//!
//! Failure is data, not control flow: a fit that cannot converge returns
//! `converged == false` and possibly NaN residuals, which aggregation must
//! check before use. Nothing in this module panics on bad input.

mod lm;

pub mod gaussian;
pub mod linear;
pub mod sine;

pub use self::gaussian::{fit_gaussian, peak_position, resolution_mm};
pub use self::linear::fit_linear;
pub use self::sine::fit_sine;

use serde::Serialize;

/// FWHM of a unit-σ Gaussian: 2·√(2 ln 2).
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;
/// FWTM of a unit-σ Gaussian: 2·√(2 ln 10).
pub const FWTM_PER_SIGMA: f64 = 4.291_932_052_578_694;

/// Outcome of a least-squares fit.
///
/// Gaussian fits have exactly 4 params `[baseline, amplitude, center, σ]`;
/// linear fits have 2 `[intercept, slope]`; sine fits have 4
/// `[offset, amplitude, frequency, phase]`.
#[derive(Clone, Debug, Serialize)]
pub struct FitResult {
    pub params: Vec<f64>,
    pub residuals: Vec<f64>,
    pub r_squared: f64,
    pub converged: bool,
}

impl FitResult {
    /// Sum of squared residuals. May be NaN for a failed fit; callers must
    /// not treat NaN as zero.
    pub fn sum_squared_residuals(&self) -> f64 {
        self.residuals.iter().map(|r| r * r).sum()
    }

    /// Whether the fit converged to finite residuals and can enter an
    /// aggregate metric.
    pub fn is_usable(&self) -> bool {
        self.converged && self.sum_squared_residuals().is_finite()
    }

    /// A failed fit over `n` points: no convergence, NaN residuals.
    pub(crate) fn failed(params: Vec<f64>, n: usize) -> Self {
        Self {
            params,
            residuals: vec![f64::NAN; n],
            r_squared: f64::NAN,
            converged: false,
        }
    }
}

/// Coefficient of determination against the mean model, 0 when the data has
/// no variance to explain.
pub(crate) fn r_squared(y: &[f64], residuals: &[f64]) -> f64 {
    let n = y.len();
    if n == 0 {
        return 0.0;
    }
    let mean = y.iter().sum::<f64>() / n as f64;
    let sst: f64 = y.iter().map(|v| (v - mean) * (v - mean)).sum();
    if sst <= 0.0 {
        return 0.0;
    }
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();
    1.0 - ssr / sst
}
