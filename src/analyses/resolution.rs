//! Two-bar spatial resolution and pixel-size calibration.
//!
//! A two-line-source phantom is sampled into a band profile perpendicular
//! to the bars, split at the midpoint between the two tallest peaks, and
//! each side is fitted with a Gaussian. The distance between the fitted
//! centers calibrates the pixel size against the known physical bar
//! separation; the fitted widths give FWHM/FWTM in millimetres of that
//! measured pixel size.

use serde::Serialize;

use super::{AnalysisError, NEMA_BAND_WIDTH, UFOV_CUTOFF};
use crate::boundary::extract_boundary;
use crate::fit::{fit_gaussian, gaussian};
use crate::geom::{Rect, Region};
use crate::image::{Calibration, ImageF32};
use crate::peaks::middle_of_two_tallest;
use crate::profile::{sample, Axis, Band};

/// Inputs for a single-axis two-bar measurement.
#[derive(Clone, Copy, Debug)]
pub struct ResolutionInput<'a> {
    pub pixels: &'a ImageF32,
    /// Region enclosing both bars.
    pub roi: Rect,
    /// Profile axis: `Row` for vertical bars, `Column` for horizontal bars.
    pub axis: Axis,
    pub calibration: Calibration,
    /// Known physical distance between the two line sources, mm.
    pub known_distance_mm: f64,
    /// Slit band width in pixels (NEMA default: [`NEMA_BAND_WIDTH`]).
    pub band_width: usize,
}

impl<'a> ResolutionInput<'a> {
    pub fn new(
        pixels: &'a ImageF32,
        roi: Rect,
        axis: Axis,
        calibration: Calibration,
        known_distance_mm: f64,
    ) -> Self {
        Self {
            pixels,
            roi,
            axis,
            calibration,
            known_distance_mm,
            band_width: NEMA_BAND_WIDTH,
        }
    }
}

/// Measured pixel size and spatial resolution along one axis.
#[derive(Clone, Debug, Serialize)]
pub struct ResolutionMetrics {
    /// Pixel size measured from the bar separation, mm.
    pub pixel_size_mm: f64,
    /// Pixel size claimed by the image calibration, mm.
    pub header_pixel_size_mm: f64,
    /// Relative difference between measured and header pixel size, percent.
    pub difference_pct: f64,
    /// Mean FWHM of the two bars, mm.
    pub fwhm_mm: f64,
    /// Mean FWTM of the two bars, mm.
    pub fwtm_mm: f64,
    /// Whether both Gaussian fits converged to finite residuals.
    pub converged: bool,
    /// Goodness of fit per bar.
    pub r_squared: [f64; 2],
}

/// Measure pixel size and resolution from a two-bar profile.
pub fn spatial_resolution(input: &ResolutionInput<'_>) -> Result<ResolutionMetrics, AnalysisError> {
    let header_pixel_size_mm = match input.axis {
        Axis::Row => input.calibration.pixel_width,
        Axis::Column => input.calibration.pixel_height,
    };

    // fit in bin-index space; physical scale enters via the measured size
    let profile = sample(
        input.pixels,
        &input.roi,
        input.axis,
        Band::Centered(input.band_width),
        1.0,
    )?;
    let mid = middle_of_two_tallest(&profile)?;

    let (left, right) = split_at(&profile.values, mid);
    let fit_left = fit_gaussian(&left.0, &left.1);
    let fit_right = fit_gaussian(&right.0, &right.1);

    let centers_gap = gaussian::peak_position(&fit_right) - gaussian::peak_position(&fit_left);
    let pixel_size_mm = input.known_distance_mm / centers_gap;

    let (fwhm_l, fwtm_l) = gaussian::resolution_mm(&fit_left, pixel_size_mm);
    let (fwhm_r, fwtm_r) = gaussian::resolution_mm(&fit_right, pixel_size_mm);

    Ok(ResolutionMetrics {
        pixel_size_mm,
        header_pixel_size_mm,
        difference_pct: (pixel_size_mm - header_pixel_size_mm) * 100.0 / pixel_size_mm,
        fwhm_mm: 0.5 * (fwhm_l + fwhm_r),
        fwtm_mm: 0.5 * (fwtm_l + fwtm_r),
        converged: fit_left.is_usable() && fit_right.is_usable(),
        r_squared: [fit_left.r_squared, fit_right.r_squared],
    })
}

fn split_at(values: &[f64], mid: usize) -> ((Vec<f64>, Vec<f64>), (Vec<f64>, Vec<f64>)) {
    let left_x: Vec<f64> = (0..mid).map(|i| i as f64).collect();
    let left_y = values[..mid].to_vec();
    let right_x: Vec<f64> = (mid..values.len()).map(|i| i as f64).collect();
    let right_y = values[mid..].to_vec();
    ((left_x, left_y), (right_x, right_y))
}

/// Both-axis metrics of the four-bar phantom.
#[derive(Clone, Debug, Serialize)]
pub struct FourBarMetrics {
    pub x: ResolutionMetrics,
    pub y: ResolutionMetrics,
    /// Percent difference of the FWHM between the axes.
    pub fwhm_difference_pct: f64,
    /// Percent difference of the measured pixel sizes between the axes.
    pub pixel_size_difference_pct: f64,
}

/// Four-bar phantom: locate the field of view automatically, then measure
/// pixel size and resolution along both axes of its (padded) bounding box.
pub fn four_bar(
    pixels: &ImageF32,
    calibration: Calibration,
    known_distance_mm: f64,
) -> Result<FourBarMetrics, AnalysisError> {
    let threshold = super::DEFAULT_THRESHOLD_FRACTION as f32 * pixels.max_value();
    let fov = extract_boundary(pixels, threshold, UFOV_CUTOFF)?;
    let bb = fov.bounds();
    // pad so the profile tails clear the bars, then clip to the image
    let padded = bb.inflate(bb.width / 4.0);
    let x0 = padded.x.max(0.0);
    let y0 = padded.y.max(0.0);
    let roi = Rect::new(
        x0,
        y0,
        (padded.width).min(pixels.w as f64 - x0),
        (padded.height).min(pixels.h as f64 - y0),
    );

    let x = spatial_resolution(&ResolutionInput::new(
        pixels,
        roi,
        Axis::Row,
        calibration,
        known_distance_mm,
    ))?;
    let y = spatial_resolution(&ResolutionInput::new(
        pixels,
        roi,
        Axis::Column,
        calibration,
        known_distance_mm,
    ))?;

    Ok(FourBarMetrics {
        fwhm_difference_pct: (1.0 - x.fwhm_mm / y.fwhm_mm) * 100.0,
        pixel_size_difference_pct: (1.0 - x.pixel_size_mm / y.pixel_size_mm) * 100.0,
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two vertical Gaussian bars centered at the given columns.
    fn two_bar_image(w: usize, h: usize, c1: f64, c2: f64, sigma: f64) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let g = |c: f64| {
                    let t = x as f64 - c;
                    (-t * t / (2.0 * sigma * sigma)).exp()
                };
                img.set(x, y, (1000.0 * (g(c1) + g(c2))) as f32);
            }
        }
        img
    }

    #[test]
    fn pixel_size_from_known_separation() {
        // bars 50 px apart, true pitch 2 mm → separation 100 mm
        let img = two_bar_image(128, 64, 39.0, 89.0, 2.5);
        let input = ResolutionInput::new(
            &img,
            Rect::new(0.0, 0.0, 128.0, 64.0),
            Axis::Row,
            Calibration {
                pixel_width: 2.0,
                pixel_height: 2.0,
            },
            100.0,
        );
        let m = spatial_resolution(&input).unwrap();
        assert!(m.converged);
        assert!(
            (m.pixel_size_mm - 2.0).abs() / 2.0 < 0.01,
            "pixel size {} not within 1% of 2 mm",
            m.pixel_size_mm
        );
        // injected blur: FWHM = 2.3548 · σ · pitch
        let expected_fwhm = 2.5 * crate::fit::FWHM_PER_SIGMA * 2.0;
        assert!(
            (m.fwhm_mm - expected_fwhm).abs() / expected_fwhm < 0.05,
            "fwhm {} vs expected {}",
            m.fwhm_mm,
            expected_fwhm
        );
        assert!((m.difference_pct).abs() < 1.0);
    }

    #[test]
    fn single_bar_is_rejected() {
        let img = two_bar_image(64, 32, 32.0, 32.0, 2.0);
        let input = ResolutionInput::new(
            &img,
            Rect::new(0.0, 0.0, 64.0, 32.0),
            Axis::Row,
            Calibration::default(),
            100.0,
        );
        assert!(matches!(
            spatial_resolution(&input),
            Err(AnalysisError::Peaks(_))
        ));
    }
}
