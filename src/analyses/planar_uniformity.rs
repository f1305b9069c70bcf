//! NEMA planar uniformity over the UFOV and CFOV.
//!
//! The flood image is re-binned by block summing to ≈6 mm pixels, the
//! field-of-view polygons are scaled to the re-binned grid and pulled in by
//! one pixel to avoid edge effects, and the image is smoothed with the NEMA
//! nine-point kernel before the contrast scan. Reported min/max/mean pixel
//! values come from the unsmoothed re-binned image.

use serde::Serialize;

use super::{AnalysisError, CFOV_CUTOFF, DEFAULT_THRESHOLD_FRACTION, UFOV_CUTOFF};
use crate::boundary::extract_boundary;
use crate::image::ImageF32;
use crate::metrics::{region_stats, uniformity};

/// NEMA nine-point smoothing kernel.
const SMOOTHING_KERNEL: [f32; 9] = [1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0];

/// Uniformity of one field of view.
#[derive(Clone, Debug, Serialize)]
pub struct FovUniformity {
    /// Integral uniformity (global contrast of the smoothed image), percent.
    pub integral_pct: f64,
    /// Differential uniformity (worst ±2-pixel window contrast), percent.
    pub differential_pct: f64,
    /// Mean pixel value of the unsmoothed re-binned image.
    pub mean: f64,
    /// Maximum pixel value of the unsmoothed re-binned image.
    pub max: f64,
    /// Minimum pixel value of the unsmoothed re-binned image.
    pub min: f64,
}

/// Planar uniformity metrics for both fields of view.
#[derive(Clone, Debug, Serialize)]
pub struct PlanarUniformityMetrics {
    pub ufov: FovUniformity,
    pub cfov: FovUniformity,
    /// Block size used for the coarse re-bin.
    pub shrink_factor: usize,
}

/// Run the planar uniformity analysis on a flood-field image.
pub fn planar_uniformity(pixels: &ImageF32) -> Result<PlanarUniformityMetrics, AnalysisError> {
    // re-bin toward a 64-row image, i.e. ≈6 mm pixels for common detectors
    let shrink_factor = ((pixels.h as f64 / 64.0).round() as usize).max(1);
    let threshold = DEFAULT_THRESHOLD_FRACTION as f32 * pixels.max_value();

    let ufov = fov_uniformity(pixels, threshold, UFOV_CUTOFF, shrink_factor)?;
    let cfov = fov_uniformity(pixels, threshold, CFOV_CUTOFF, shrink_factor)?;

    Ok(PlanarUniformityMetrics {
        ufov,
        cfov,
        shrink_factor,
    })
}

fn fov_uniformity(
    pixels: &ImageF32,
    threshold: f32,
    cutoff: f64,
    shrink_factor: usize,
) -> Result<FovUniformity, AnalysisError> {
    let fov = extract_boundary(pixels, threshold, cutoff)?;

    let rebinned = pixels.block_sum_shrink(shrink_factor);
    let coarse_fov = fov
        .scaled(1.0 / shrink_factor as f64)
        .offset(-1.0)
        .ok_or(crate::boundary::BoundaryError::RegionTooSmall)?;

    let raw = region_stats(&rebinned, &coarse_fov);
    let smoothed = rebinned.convolve3x3(&SMOOTHING_KERNEL);
    let u = uniformity(&smoothed, &coarse_fov);

    Ok(FovUniformity {
        integral_pct: u.integral_pct,
        differential_pct: u.differential_pct,
        mean: raw.mean,
        max: raw.max,
        min: raw.min,
    })
}
