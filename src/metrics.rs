//! Aggregation of fit and pixel statistics into reported QC metrics.
//!
//! Everything here is a pure reduction over already-computed inputs.
//! Non-converged or NaN fits never enter an aggregate silently: they are
//! skipped and counted, so reports can show how many segments were dropped.

use serde::Serialize;

use crate::fit::{gaussian, FitResult};
use crate::geom::{Point2D, Region};
use crate::image::ImageF32;
use crate::stats;

/// Worst/mean spatial resolution over the converged segment fits.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ResolutionSummary {
    pub worst_fwhm_mm: f64,
    pub worst_fwtm_mm: f64,
    pub mean_fwhm_mm: f64,
    pub mean_fwtm_mm: f64,
    /// Number of fits that entered the aggregate.
    pub fitted_segments: usize,
    /// Non-converged or NaN fits excluded from the aggregate.
    pub skipped_segments: usize,
}

/// Reduce per-segment Gaussian fits to worst and mean FWHM/FWTM.
pub fn resolution_summary(fits: &[FitResult], pixel_pitch: f64) -> ResolutionSummary {
    let mut summary = ResolutionSummary::default();
    let mut sum_fwhm = 0.0;
    let mut sum_fwtm = 0.0;
    for fit in fits {
        if !fit.is_usable() {
            summary.skipped_segments += 1;
            continue;
        }
        let (fwhm, fwtm) = gaussian::resolution_mm(fit, pixel_pitch);
        summary.worst_fwhm_mm = summary.worst_fwhm_mm.max(fwhm);
        summary.worst_fwtm_mm = summary.worst_fwtm_mm.max(fwtm);
        sum_fwhm += fwhm;
        sum_fwtm += fwtm;
        summary.fitted_segments += 1;
    }
    if summary.fitted_segments > 0 {
        summary.mean_fwhm_mm = sum_fwhm / summary.fitted_segments as f64;
        summary.mean_fwtm_mm = sum_fwtm / summary.fitted_segments as f64;
    }
    summary
}

/// Absolute and differential linearity over pooled linear-fit residuals.
#[derive(Clone, Debug, Default, Serialize)]
pub struct LinearityMetrics {
    /// Largest absolute residual, mm.
    pub absolute_mm: f64,
    /// Standard deviation of the residuals, mm.
    pub differential_mm: f64,
}

pub fn linearity_from_residuals(residuals: &[f64]) -> LinearityMetrics {
    let absolute = residuals.iter().fold(0.0f64, |acc, r| acc.max(r.abs()));
    LinearityMetrics {
        absolute_mm: absolute,
        differential_mm: stats::std_dev(residuals),
    }
}

/// Pixel statistics inside a region, with extrema locations for overlays.
#[derive(Clone, Debug, Serialize)]
pub struct RegionStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub min_at: Point2D,
    pub max_at: Point2D,
    pub pixel_count: usize,
}

/// Two-pass statistics over all pixels whose centers lie inside the region.
pub fn region_stats(pixels: &ImageF32, region: &impl Region) -> RegionStats {
    let b = region.bounds();
    let x0 = (b.x.floor().max(0.0)) as usize;
    let y0 = (b.y.floor().max(0.0)) as usize;
    let x1 = ((b.x + b.width).ceil().min(pixels.w as f64)).max(0.0) as usize;
    let y1 = ((b.y + b.height).ceil().min(pixels.h as f64)).max(0.0) as usize;

    let mut values = Vec::new();
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut min_at = Point2D::default();
    let mut max_at = Point2D::default();
    for y in y0..y1 {
        for x in x0..x1 {
            if !region.contains(x as f64, y as f64) {
                continue;
            }
            let v = pixels.get(x, y) as f64;
            if v < min {
                min = v;
                min_at = Point2D::new(x as f64, y as f64);
            }
            if v > max {
                max = v;
                max_at = Point2D::new(x as f64, y as f64);
            }
            values.push(v);
        }
    }
    if values.is_empty() {
        return RegionStats {
            mean: 0.0,
            std_dev: 0.0,
            min: 0.0,
            max: 0.0,
            min_at,
            max_at,
            pixel_count: 0,
        };
    }
    RegionStats {
        mean: stats::mean(&values),
        std_dev: stats::std_dev(&values),
        min,
        max,
        min_at,
        max_at,
        pixel_count: values.len(),
    }
}

/// Integral and differential uniformity of a region, in percent.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UniformityMetrics {
    pub integral_pct: f64,
    pub differential_pct: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub min_at: Point2D,
    pub max_at: Point2D,
}

/// Half-width of the differential uniformity sliding window (±2 pixels).
const DU_WINDOW: i64 = 2;

/// NEMA uniformity over a region: integral = contrast of the global pixel
/// extrema, differential = the worst contrast seen by a ±2-pixel window
/// slid across every row and column inside the region.
pub fn uniformity(pixels: &ImageF32, region: &impl Region) -> UniformityMetrics {
    let gstats = region_stats(pixels, region);
    if gstats.pixel_count == 0 {
        return UniformityMetrics::default();
    }

    let b = region.bounds();
    let x0 = (b.x.floor().max(0.0)) as i64;
    let y0 = (b.y.floor().max(0.0)) as i64;
    let x1 = ((b.x + b.width).ceil().min(pixels.w as f64)).max(0.0) as i64;
    let y1 = ((b.y + b.height).ceil().min(pixels.h as f64)).max(0.0) as i64;

    let mut du = 0.0f64;
    for y in y0..y1 {
        for x in x0..x1 {
            if !region.contains(x as f64, y as f64) {
                continue;
            }
            let center = pixels.get(x as usize, y as usize) as f64;

            let mut local_min = center;
            let mut local_max = center;
            for k in -DU_WINDOW..=DU_WINDOW {
                let sx = (x + k).clamp(0, pixels.w as i64 - 1);
                if region.contains(sx as f64, y as f64) {
                    let v = pixels.get(sx as usize, y as usize) as f64;
                    local_min = local_min.min(v);
                    local_max = local_max.max(v);
                }
            }
            du = du.max(stats::contrast(local_min, local_max));

            let mut local_min = center;
            let mut local_max = center;
            for k in -DU_WINDOW..=DU_WINDOW {
                let sy = (y + k).clamp(0, pixels.h as i64 - 1);
                if region.contains(x as f64, sy as f64) {
                    let v = pixels.get(x as usize, sy as usize) as f64;
                    local_min = local_min.min(v);
                    local_max = local_max.max(v);
                }
            }
            du = du.max(stats::contrast(local_min, local_max));
        }
    }

    UniformityMetrics {
        integral_pct: stats::contrast(gstats.min, gstats.max),
        differential_pct: du,
        min: gstats.min,
        max: gstats.max,
        mean: gstats.mean,
        min_at: gstats.min_at,
        max_at: gstats.max_at,
    }
}

/// Invert a quadrant-bar MTF to FWHM/FWTM through the bar width.
///
/// Uses `FWHM = w · √((16 ln 2 / π²) · ln(1/MTF))`. An MTF outside (0, 1]
/// has no real solution and propagates NaN for the caller to check.
pub fn bar_resolution_from_mtf(mtf: f64, bar_width_mm: f64) -> (f64, f64) {
    let pi2 = std::f64::consts::PI * std::f64::consts::PI;
    let log_term = (1.0 / mtf).ln();
    let fwhm = bar_width_mm * (16.0 * std::f64::consts::LN_2 / pi2 * log_term).sqrt();
    let fwtm = bar_width_mm * (16.0 * std::f64::consts::LN_10 / pi2 * log_term).sqrt();
    (fwhm, fwtm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::fit_linear;
    use crate::geom::Rect;

    #[test]
    fn linearity_matches_reference_least_squares() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 2.0, 3.05, 3.9];
        let fit = fit_linear(&x, &y);
        let m = linearity_from_residuals(&fit.residuals);
        // reference residuals: [-0.025, 0.0, 0.075, -0.05]
        assert!((m.absolute_mm - 0.075).abs() < 1e-6);
        let expected_sd = crate::stats::std_dev(&[-0.025, 0.0, 0.075, -0.05]);
        assert!((m.differential_mm - expected_sd).abs() < 1e-6);
    }

    #[test]
    fn skipped_fits_are_counted_not_propagated() {
        let good = crate::fit::fit_gaussian(
            &(0..12).map(|i| i as f64).collect::<Vec<_>>(),
            &(0..12)
                .map(|i| 100.0 * (-((i as f64 - 6.0) * (i as f64 - 6.0)) / 8.0).exp())
                .collect::<Vec<_>>(),
        );
        let bad = crate::fit::fit_gaussian(&[0.0, 1.0], &[1.0, 2.0]);
        let summary = resolution_summary(&[good, bad], 1.0);
        assert_eq!(summary.fitted_segments, 1);
        assert_eq!(summary.skipped_segments, 1);
        assert!(summary.worst_fwhm_mm.is_finite() && summary.worst_fwhm_mm > 0.0);
    }

    #[test]
    fn flat_field_is_perfectly_uniform() {
        let img = ImageF32::from_vec(16, 16, vec![50.0; 256]);
        let roi = Rect::new(2.0, 2.0, 11.0, 11.0);
        let u = uniformity(&img, &roi);
        assert_eq!(u.integral_pct, 0.0);
        assert_eq!(u.differential_pct, 0.0);
        assert_eq!(u.mean, 50.0);
    }

    #[test]
    fn single_cold_pixel_drives_both_uniformities() {
        let mut img = ImageF32::from_vec(16, 16, vec![100.0; 256]);
        img.set(8, 8, 80.0);
        let roi = Rect::new(2.0, 2.0, 11.0, 11.0);
        let u = uniformity(&img, &roi);
        let expected = crate::stats::contrast(80.0, 100.0);
        assert!((u.integral_pct - expected).abs() < 1e-9);
        assert!((u.differential_pct - expected).abs() < 1e-9);
        assert_eq!(u.min_at, Point2D::new(8.0, 8.0));
    }

    #[test]
    fn mtf_inversion_round_trip() {
        // a perfect bar pattern (MTF = 1) resolves to zero width
        let (fwhm, fwtm) = bar_resolution_from_mtf(1.0, 3.18);
        assert!(fwhm.abs() < 1e-12 && fwtm.abs() < 1e-12);
        // degraded modulation broadens the PSF estimate
        let (fwhm, fwtm) = bar_resolution_from_mtf(0.5, 3.18);
        assert!(fwhm > 0.0 && fwtm > fwhm);
        // out-of-range MTF propagates NaN, no panic
        assert!(bar_resolution_from_mtf(-0.2, 3.18).0.is_nan());
    }
}
