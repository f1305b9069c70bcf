//! Field-of-view boundary extraction.
//!
//! Turns a calibrated intensity image into a convex analysis region:
//!
//! - Threshold the image into a binary mask (absolute threshold, typically
//!   10% of the image maximum, chosen by the caller).
//! - Trace the mask's outer contour with a Moore-neighbor walk in a
//!   consistent winding order.
//! - Take the Graham-scan convex hull of the contour.
//! - Offset the hull by `m = (cutoff − 1) · max(bb_h, bb_w) / 2` pixels, so
//!   a cutoff of 0.95 yields the UFOV and 0.75 carves the CFOV out of it.
//!
//! Failures are reported per region, never panicked: an all-background mask
//! is [`BoundaryError::EmptyRegion`], a contour with fewer than three points
//! is [`BoundaryError::DegeneratePolygon`], and an offset that would collapse
//! the polygon is [`BoundaryError::RegionTooSmall`].

use crate::geom::{convex_hull, BoundaryPolygon, Point2D, Region};
use crate::image::ImageF32;

/// Errors raised while deriving a region polygon from pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryError {
    /// No pixel reached the threshold.
    EmptyRegion,
    /// The traced contour does not span a polygon (fewer than 3 points, or
    /// all points collinear).
    DegeneratePolygon,
    /// Shrinking to the requested cutoff collapsed the polygon.
    RegionTooSmall,
}

impl std::fmt::Display for BoundaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRegion => write!(f, "no pixel reached the boundary threshold"),
            Self::DegeneratePolygon => write!(f, "contour does not span a polygon"),
            Self::RegionTooSmall => write!(f, "cutoff collapses the region polygon"),
        }
    }
}

impl std::error::Error for BoundaryError {}

/// Extract the field-of-view polygon for a given threshold and cutoff.
///
/// `cutoff` is the linear-dimension fraction of the full hull the caller
/// wants, in `(0, 1]`; values below 1 shrink the hull toward its interior.
pub fn extract_boundary(
    pixels: &ImageF32,
    min_threshold: f32,
    cutoff: f64,
) -> Result<BoundaryPolygon, BoundaryError> {
    let mask = Mask::threshold(pixels, min_threshold);
    let contour = mask.trace_outer_contour().ok_or(BoundaryError::EmptyRegion)?;
    hull_at_cutoff(&contour, cutoff)
}

/// Convex hull of an already-collected point set, offset to `cutoff`.
///
/// Shared by the quadrant-bar analysis, which builds its point sets from
/// polar partitions rather than a threshold mask.
pub fn hull_at_cutoff(
    points: &[Point2D],
    cutoff: f64,
) -> Result<BoundaryPolygon, BoundaryError> {
    let hull = convex_hull(points);
    let polygon =
        BoundaryPolygon::from_vertices(hull).ok_or(BoundaryError::DegeneratePolygon)?;
    let bb = polygon.bounds();
    let margin = (cutoff - 1.0) * bb.height.max(bb.width) / 2.0;
    polygon.offset(margin).ok_or(BoundaryError::RegionTooSmall)
}

/// Binary pixel mask with bounds-checked access.
struct Mask {
    w: usize,
    h: usize,
    bits: Vec<bool>,
}

impl Mask {
    fn threshold(pixels: &ImageF32, min_threshold: f32) -> Self {
        let mut bits = vec![false; pixels.w * pixels.h];
        for y in 0..pixels.h {
            let row = pixels.row(y);
            for (x, &v) in row.iter().enumerate() {
                bits[y * pixels.w + x] = v >= min_threshold;
            }
        }
        Self {
            w: pixels.w,
            h: pixels.h,
            bits,
        }
    }

    #[inline]
    fn get(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.w as i64 || y >= self.h as i64 {
            return false;
        }
        self.bits[y as usize * self.w + x as usize]
    }

    /// First mask pixel in raster order, i.e. the top-most, left-most one.
    fn first_set(&self) -> Option<(i64, i64)> {
        self.bits
            .iter()
            .position(|&b| b)
            .map(|i| ((i % self.w) as i64, (i / self.w) as i64))
    }

    /// Moore-neighbor boundary walk around the component that contains the
    /// raster-first mask pixel. Returns the ordered contour pixel centers,
    /// or `None` for an empty mask.
    fn trace_outer_contour(&self) -> Option<Vec<Point2D>> {
        // Clockwise ring in screen coordinates (y grows downward):
        // W, NW, N, NE, E, SE, S, SW.
        const RING: [(i64, i64); 8] = [
            (-1, 0),
            (-1, -1),
            (0, -1),
            (1, -1),
            (1, 0),
            (1, 1),
            (0, 1),
            (-1, 1),
        ];

        let start = self.first_set()?;
        let mut contour = vec![Point2D::new(start.0 as f64, start.1 as f64)];
        // The raster-first pixel was entered from the west.
        let mut cur = start;
        let mut backtrack = (start.0 - 1, start.1);
        let cap = 4 * self.w * self.h + 8;

        loop {
            let entry = RING
                .iter()
                .position(|&(dx, dy)| (cur.0 + dx, cur.1 + dy) == backtrack)
                .unwrap_or(0);
            let mut advanced = false;
            for k in 1..=8 {
                let idx = (entry + k) % 8;
                let cand = (cur.0 + RING[idx].0, cur.1 + RING[idx].1);
                if self.get(cand.0, cand.1) {
                    // backtrack becomes the empty cell checked just before
                    let prev_idx = (entry + k - 1) % 8;
                    backtrack = (cur.0 + RING[prev_idx].0, cur.1 + RING[prev_idx].1);
                    cur = cand;
                    advanced = true;
                    break;
                }
            }
            if !advanced {
                // isolated pixel
                break;
            }
            if cur == start {
                break;
            }
            contour.push(Point2D::new(cur.0 as f64, cur.1 as f64));
            if contour.len() > cap {
                break;
            }
        }
        Some(contour)
    }
}
