//! Tomographic uniformity and sphere contrast.
//!
//! Uniformity scans 360 radial rays from the reconstructed slice center:
//! the worst ray contrast against the region mean is the ring (differential)
//! figure, and the accumulated radial profile compares its innermost and
//! outermost bins for the centre/border (integral) figure.
//!
//! Contrast works on a difference matrix against the background level taken
//! from a uniformity slice; spheres appear as 2D local maxima above a 2σ
//! tolerance and are scored with the guarded contrast formula at their
//! detected centers.

use serde::Serialize;

use super::{AnalysisError, DEFAULT_THRESHOLD_FRACTION};
use crate::boundary::{extract_boundary, BoundaryError};
use crate::geom::{Point2D, Region};
use crate::image::ImageF32;
use crate::metrics::region_stats;
use crate::stats;

/// Cutoff used for tomographic fields of view (slightly tighter than the
/// planar UFOV to stay clear of reconstruction ring artifacts).
const TOMO_CUTOFF: f64 = 0.9;

/// Number of radial bins compared at the center and at the border.
const RADIAL_COMPARE_BINS: usize = 5;

/// Tomographic uniformity of a slice range.
#[derive(Clone, Debug, Serialize)]
pub struct TomoUniformityMetrics {
    /// Worst contrast between the region mean and any single ray's
    /// extremum, percent.
    pub max_ring_contrast_pct: f64,
    /// Contrast between the accumulated central and border radial bins,
    /// percent.
    pub centre_border_contrast_pct: f64,
    /// Inclusive slice range that was averaged.
    pub frames: (usize, usize),
}

/// Average the slice range and scan it radially.
pub fn tomographic_uniformity(
    slices: &[ImageF32],
    frames: (usize, usize),
) -> Result<TomoUniformityMetrics, AnalysisError> {
    let (first, last) = frames;
    if slices.is_empty() || first > last || last >= slices.len() {
        return Err(AnalysisError::InvalidInput(format!(
            "invalid frame range {first}..={last} for {} slices",
            slices.len()
        )));
    }
    let mean_image = mean_of(&slices[first..=last]);
    let threshold = DEFAULT_THRESHOLD_FRACTION as f32 * mean_image.max_value();
    let fov = extract_boundary(&mean_image, threshold, TOMO_CUTOFF)?
        .offset(-1.0)
        .ok_or(BoundaryError::RegionTooSmall)?;
    let mean = region_stats(&mean_image, &fov).mean;

    let cx = mean_image.w as f64 / 2.0;
    let cy = mean_image.h as f64 / 2.0;
    let mut accumulated = vec![0.0f64; mean_image.w];
    let mut min_radius = mean_image.w;
    let mut ring_contrast = 0.0f64;

    for i in 0..360usize {
        let angle = 2.0 * std::f64::consts::PI * i as f64 / 360.0;
        let (dx, dy) = (angle.cos(), angle.sin());

        // ray length: first step that leaves the region
        let mut len = 0usize;
        while len < mean_image.w {
            let x = cx + len as f64 * dx;
            let y = cy + len as f64 * dy;
            if !fov.contains(x, y) {
                break;
            }
            len += 1;
        }
        if len == 0 {
            continue;
        }
        min_radius = min_radius.min(len);

        let mut ray_min = f64::INFINITY;
        let mut ray_max = f64::NEG_INFINITY;
        for j in 0..len {
            let x = (cx + j as f64 * dx) as usize;
            let y = (cy + j as f64 * dy) as usize;
            let v = mean_image.get(x.min(mean_image.w - 1), y.min(mean_image.h - 1)) as f64;
            ray_min = ray_min.min(v);
            ray_max = ray_max.max(v);
            accumulated[j] += v;
        }
        ring_contrast = ring_contrast
            .max(stats::contrast(mean, ray_min))
            .max(stats::contrast(mean, ray_max));
    }

    if min_radius == mean_image.w || min_radius == 0 {
        return Err(AnalysisError::InvalidInput(
            "slice center lies outside the field of view".into(),
        ));
    }

    let bins = RADIAL_COMPARE_BINS.min(min_radius / 2).max(1);
    let centre: f64 = accumulated[..bins].iter().sum();
    let border: f64 = accumulated[min_radius - bins..min_radius].iter().sum();

    Ok(TomoUniformityMetrics {
        max_ring_contrast_pct: ring_contrast,
        centre_border_contrast_pct: stats::contrast(centre, border),
        frames,
    })
}

fn mean_of(slices: &[ImageF32]) -> ImageF32 {
    let mut out = ImageF32::new(slices[0].w, slices[0].h);
    for slice in slices {
        for (o, v) in out.data.iter_mut().zip(&slice.data) {
            *o += v;
        }
    }
    let n = slices.len() as f32;
    for o in out.data.iter_mut() {
        *o /= n;
    }
    out
}

/// Inputs for the sphere-contrast analysis.
#[derive(Clone, Copy, Debug)]
pub struct TomoContrastInput<'a> {
    pub slices: &'a [ImageF32],
    /// Slice providing the background level and noise tolerance.
    pub uniformity_frame: usize,
    /// Slice holding the spheres.
    pub contrast_frame: usize,
    /// Whether the spheres are cold (colder than background) or hot.
    pub cold_spheres: bool,
    /// Expected sphere centers; when given, detections are kept only within
    /// a search radius of an expected center (the manual variant).
    pub expected_centers: Option<&'a [Point2D]>,
}

/// One detected sphere.
#[derive(Clone, Debug, Serialize)]
pub struct SphereContrast {
    pub center: Point2D,
    /// Pixel value of the contrast slice at the detected center.
    pub value: f64,
    /// Contrast against the background mean, percent.
    pub contrast_pct: f64,
}

/// Sphere-contrast metrics.
#[derive(Clone, Debug, Serialize)]
pub struct TomoContrastMetrics {
    /// Background mean from the uniformity slice.
    pub background_mean: f64,
    /// Detection tolerance (2σ of the uniformity slice).
    pub tolerance: f64,
    pub spheres: Vec<SphereContrast>,
}

/// Detected-maxima minimum separation in pixels (automatic variant).
const MIN_PEAK_SEPARATION: f64 = 4.0;

/// Detect spheres and score their contrast.
pub fn tomographic_contrast(
    input: &TomoContrastInput<'_>,
) -> Result<TomoContrastMetrics, AnalysisError> {
    let n = input.slices.len();
    if input.uniformity_frame >= n || input.contrast_frame >= n {
        return Err(AnalysisError::InvalidInput(format!(
            "frame out of range for {n} slices"
        )));
    }

    let unif_slice = &input.slices[input.uniformity_frame];
    let threshold = DEFAULT_THRESHOLD_FRACTION as f32 * unif_slice.max_value();
    let fov = extract_boundary(unif_slice, threshold, TOMO_CUTOFF)?;
    let bg = region_stats(unif_slice, &fov);
    let background_mean = bg.mean;
    let tolerance = 2.0 * bg.std_dev;

    // difference matrix: spheres become the brightest structures
    let slice = &input.slices[input.contrast_frame];
    let mut diff = ImageF32::new(slice.w, slice.h);
    for y in 0..slice.h {
        for x in 0..slice.w {
            if !fov.contains(x as f64, y as f64) {
                continue;
            }
            let v = slice.get(x, y) as f64;
            let d = if input.cold_spheres {
                background_mean - v
            } else {
                v - background_mean
            };
            diff.set(x, y, d.max(0.0) as f32);
        }
    }

    let mut maxima = local_maxima(&diff, tolerance as f32, MIN_PEAK_SEPARATION);

    // manual variant: one detection per expected center, strongest within
    // the search radius
    if let Some(expected) = input.expected_centers {
        let feret = feret_diameter(&fov);
        let search_radius = feret / expected.len().max(1) as f64;
        maxima = expected
            .iter()
            .filter_map(|e| {
                maxima
                    .iter()
                    .find(|m| e.distance(m) < search_radius)
                    .copied()
            })
            .collect();
    }

    let spheres = maxima
        .into_iter()
        .map(|center| {
            let value = slice.get(center.x as usize, center.y as usize) as f64;
            SphereContrast {
                center,
                value,
                contrast_pct: stats::contrast(background_mean, value),
            }
        })
        .collect();

    Ok(TomoContrastMetrics {
        background_mean,
        tolerance,
        spheres,
    })
}

/// Strict 8-neighbor local maxima above `tolerance`, strongest first, with
/// greedy suppression inside `min_separation`.
fn local_maxima(image: &ImageF32, tolerance: f32, min_separation: f64) -> Vec<Point2D> {
    let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
    for y in 1..image.h.saturating_sub(1) {
        for x in 1..image.w.saturating_sub(1) {
            let v = image.get(x, y);
            if v < tolerance || v <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'scan: for dy in -1i64..=1 {
                for dx in -1i64..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nv = image.get((x as i64 + dx) as usize, (y as i64 + dy) as usize);
                    if nv > v {
                        is_max = false;
                        break 'scan;
                    }
                }
            }
            if is_max {
                candidates.push((v, x, y));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<Point2D> = Vec::new();
    for (_, x, y) in candidates {
        let p = Point2D::new(x as f64, y as f64);
        if kept.iter().all(|k| k.distance(&p) >= min_separation) {
            kept.push(p);
        }
    }
    kept
}

/// Longest distance between two polygon vertices.
fn feret_diameter(fov: &crate::geom::BoundaryPolygon) -> f64 {
    let vs = fov.vertices();
    let mut best = 0.0f64;
    for (i, a) in vs.iter().enumerate() {
        for b in &vs[i + 1..] {
            best = best.max(a.distance(b));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder_slice(size: usize, radius: f64, level: f32) -> ImageF32 {
        let mut img = ImageF32::new(size, size);
        let c = size as f64 / 2.0;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f64 - c;
                let dy = y as f64 - c;
                if (dx * dx + dy * dy).sqrt() <= radius {
                    img.set(x, y, level);
                }
            }
        }
        img
    }

    /// Paraboloid intensity bump/dip: full `delta` at the center, fading to
    /// zero at the rim, so the sphere has a unique interior extremum.
    fn add_sphere(img: &mut ImageF32, cx: usize, cy: usize, r: usize, delta: f32) {
        for y in cy.saturating_sub(r)..=(cy + r).min(img.h - 1) {
            for x in cx.saturating_sub(r)..=(cx + r).min(img.w - 1) {
                let dx = x as f64 - cx as f64;
                let dy = y as f64 - cy as f64;
                let d2 = (dx * dx + dy * dy) / (r as f64 * r as f64);
                if d2 <= 1.0 {
                    let v = img.get(x, y) + delta * (1.0 - d2) as f32;
                    img.set(x, y, v);
                }
            }
        }
    }

    #[test]
    fn uniform_cylinder_scores_near_zero() {
        let slices = vec![cylinder_slice(64, 28.0, 100.0); 3];
        let m = tomographic_uniformity(&slices, (0, 2)).unwrap();
        assert!(m.max_ring_contrast_pct < 5.0);
        assert!(m.centre_border_contrast_pct < 5.0);
    }

    #[test]
    fn frame_range_is_validated() {
        let slices = vec![cylinder_slice(32, 12.0, 10.0)];
        assert!(matches!(
            tomographic_uniformity(&slices, (0, 3)),
            Err(AnalysisError::InvalidInput(_))
        ));
    }

    #[test]
    fn cold_spheres_are_detected_and_scored() {
        let unif = cylinder_slice(96, 42.0, 100.0);
        let mut spheres = cylinder_slice(96, 42.0, 100.0);
        add_sphere(&mut spheres, 36, 48, 4, -60.0);
        add_sphere(&mut spheres, 62, 48, 4, -30.0);
        let input = TomoContrastInput {
            slices: &[unif, spheres],
            uniformity_frame: 0,
            contrast_frame: 1,
            cold_spheres: true,
            expected_centers: None,
        };
        let m = tomographic_contrast(&input).unwrap();
        assert_eq!(m.spheres.len(), 2, "expected both spheres: {:?}", m.spheres);
        // the deeper sphere scores higher and sorts first
        assert!(m.spheres[0].contrast_pct > m.spheres[1].contrast_pct);
        let expected = stats::contrast(100.0, 40.0);
        assert!((m.spheres[0].contrast_pct - expected).abs() < 1.0);
    }

    #[test]
    fn manual_matching_filters_detections() {
        let unif = cylinder_slice(96, 42.0, 100.0);
        let mut spheres = cylinder_slice(96, 42.0, 100.0);
        add_sphere(&mut spheres, 36, 48, 4, -60.0);
        add_sphere(&mut spheres, 62, 48, 4, -30.0);
        let expected = [Point2D::new(36.0, 48.0)];
        let input = TomoContrastInput {
            slices: &[unif, spheres],
            uniformity_frame: 0,
            contrast_frame: 1,
            cold_spheres: true,
            expected_centers: Some(&expected),
        };
        let m = tomographic_contrast(&input).unwrap();
        assert_eq!(m.spheres.len(), 1);
        assert!((m.spheres[0].center.x - 36.0).abs() < 3.0);
    }
}
