//! Quadrant bar phantom: MTF and resolution per bar quadrant.
//!
//! The field of view is split into four sectors about its centroid. Within
//! each sector the bar pattern is re-detected on the mean-minus-pixel
//! difference image (bars are colder than the flood level), and the MTF is
//! computed from the mean and standard deviation of the original pixels
//! inside the detected bar region. Ordering the four MTF values ascending
//! pairs them with the known bar widths, finest bars first, from which
//! FWHM/FWTM follow.
//!
//! Reference: Hander et al., Rapid objective measurement of gamma camera
//! resolution. Medical Physics 24(2), 1997.

use serde::Serialize;

use super::{AnalysisError, DEFAULT_THRESHOLD_FRACTION, UFOV_CUTOFF};
use crate::boundary::{extract_boundary, hull_at_cutoff};
use crate::geom::{BoundaryPolygon, Point2D, Region};
use crate::image::ImageF32;
use crate::metrics::{bar_resolution_from_mtf, region_stats};
use crate::stats;

/// Inputs for the quadrant-bar analysis.
#[derive(Clone, Copy, Debug)]
pub struct BarQuadrantInput<'a> {
    pub pixels: &'a ImageF32,
    /// Physical bar widths of the four quadrants, mm, ascending.
    pub bar_widths_mm: [f64; 4],
}

impl<'a> BarQuadrantInput<'a> {
    /// Standard quadrant phantom bar widths.
    pub fn new(pixels: &'a ImageF32) -> Self {
        Self {
            pixels,
            bar_widths_mm: [2.12, 2.54, 3.18, 4.23],
        }
    }
}

/// Per-quadrant bar measurement.
#[derive(Clone, Debug, Serialize)]
pub struct QuadrantBar {
    /// Original quadrant index (1..=4, counterclockwise from +x).
    pub quadrant: usize,
    pub bar_width_mm: f64,
    pub mtf: f64,
    pub fwhm_mm: f64,
    pub fwtm_mm: f64,
    /// Centroid of the detected bar region, for overlays.
    pub center: Point2D,
}

/// All four quadrants, ordered by ascending MTF (finest bars first).
#[derive(Clone, Debug, Serialize)]
pub struct BarQuadrantMetrics {
    pub bars: Vec<QuadrantBar>,
}

/// Run the quadrant-bar analysis.
pub fn bar_quadrant(input: &BarQuadrantInput<'_>) -> Result<BarQuadrantMetrics, AnalysisError> {
    let pixels = input.pixels;
    let threshold = DEFAULT_THRESHOLD_FRACTION as f32 * pixels.max_value();
    let fov = extract_boundary(pixels, threshold, UFOV_CUTOFF)?;
    let flood_mean = region_stats(pixels, &fov).mean;

    let mut measured: Vec<(usize, f64, Point2D)> = Vec::with_capacity(4);
    for quadrant in 1..=4usize {
        let sector = quadrant_hull(&fov, quadrant)?;
        let bars = detect_bars(pixels, &sector, flood_mean as f32)?;
        let s = region_stats(pixels, &bars);
        measured.push((quadrant, stats::mtf(s.mean, s.std_dev), bars.centroid()));
    }

    // ascending MTF pairs with ascending bar width: the finest bars
    // modulate least
    measured.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let bars = measured
        .into_iter()
        .zip(input.bar_widths_mm)
        .map(|((quadrant, mtf, center), width)| {
            let (fwhm_mm, fwtm_mm) = bar_resolution_from_mtf(mtf, width);
            QuadrantBar {
                quadrant,
                bar_width_mm: width,
                mtf,
                fwhm_mm,
                fwtm_mm,
                center,
            }
        })
        .collect();

    Ok(BarQuadrantMetrics { bars })
}

/// Convex hull of the FOV pixels whose polar angle about the FOV centroid
/// falls in the quadrant's 90° sector.
fn quadrant_hull(
    fov: &BoundaryPolygon,
    quadrant: usize,
) -> Result<BoundaryPolygon, AnalysisError> {
    let middle = fov.centroid();
    let b = fov.bounds();
    let lo = (quadrant - 1) as f64 * 90.0;
    let hi = quadrant as f64 * 90.0;

    let x0 = b.x.floor() as i64;
    let y0 = b.y.floor() as i64;
    let x1 = (b.x + b.width).ceil() as i64;
    let y1 = (b.y + b.height).ceil() as i64;
    let mut points = Vec::new();
    for y in y0..=y1 {
        for x in x0..=x1 {
            let (xf, yf) = (x as f64, y as f64);
            if !fov.contains(xf, yf) {
                continue;
            }
            let angle = middle.polar_angle_to(&Point2D::new(xf, yf)).to_degrees();
            if angle >= lo && angle <= hi {
                points.push(Point2D::new(xf, yf));
            }
        }
    }
    Ok(hull_at_cutoff(&points, 1.0)?)
}

/// Re-detect the bar pattern inside a sector on the inverted difference
/// image (flood mean minus pixel, clamped at zero), thresholded at half its
/// maximum. The bar stripes are disconnected, so the region is the convex
/// hull of every above-threshold pixel rather than a single traced contour.
fn detect_bars(
    pixels: &ImageF32,
    sector: &BoundaryPolygon,
    flood_mean: f32,
) -> Result<BoundaryPolygon, AnalysisError> {
    let b = sector.bounds();
    let x0 = b.x.floor().max(0.0) as usize;
    let y0 = b.y.floor().max(0.0) as usize;
    let x1 = ((b.x + b.width).ceil().min(pixels.w as f64)).max(0.0) as usize;
    let y1 = ((b.y + b.height).ceil().min(pixels.h as f64)).max(0.0) as usize;

    let mut diff = Vec::new();
    let mut max = 0.0f32;
    for y in y0..y1 {
        for x in x0..x1 {
            if !sector.contains(x as f64, y as f64) {
                continue;
            }
            let v = (flood_mean - pixels.get(x, y)).max(0.0);
            if v > 0.0 {
                diff.push((x, y, v));
                max = max.max(v);
            }
        }
    }
    let points: Vec<Point2D> = diff
        .into_iter()
        .filter(|&(_, _, v)| v >= 0.5 * max)
        .map(|(x, y, _)| Point2D::new(x as f64, y as f64))
        .collect();
    Ok(hull_at_cutoff(&points, 1.0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flood disc with vertical bar stripes of a given period per quadrant.
    fn quadrant_phantom(size: usize) -> ImageF32 {
        let mut img = ImageF32::new(size, size);
        let c = size as f64 / 2.0;
        let radius = size as f64 * 0.45;
        // stripe periods per quadrant index 1..=4 (finer = lower MTF after
        // the blur below)
        let periods = [2usize, 4, 6, 8];
        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 - c;
                let dy = y as f64 - c;
                if (dx * dx + dy * dy).sqrt() > radius {
                    continue;
                }
                let angle = dy.atan2(dx).to_degrees();
                let angle = if angle < 0.0 { angle + 360.0 } else { angle };
                let q = (angle / 90.0).floor().min(3.0) as usize;
                let period = periods[q];
                let bar = (x / period) % 2 == 0;
                img.set(x, y, if bar { 40.0 } else { 100.0 });
            }
        }
        // mild smoothing so fine stripes lose modulation
        img.convolve3x3(&[1.0; 9])
    }

    #[test]
    fn quadrants_are_ordered_by_mtf() {
        let img = quadrant_phantom(160);
        let m = bar_quadrant(&BarQuadrantInput::new(&img)).unwrap();
        assert_eq!(m.bars.len(), 4);
        for pair in m.bars.windows(2) {
            assert!(
                pair[0].mtf <= pair[1].mtf || pair[0].mtf.is_nan() || pair[1].mtf.is_nan(),
                "bars not ordered by MTF"
            );
        }
        // widths stay in their canonical ascending order
        let widths: Vec<f64> = m.bars.iter().map(|b| b.bar_width_mm).collect();
        assert_eq!(widths, vec![2.12, 2.54, 3.18, 4.23]);
    }
}
