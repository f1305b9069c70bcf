//! Convex region polygon and axis-aligned rectangle.

use serde::Serialize;

use super::point::{cross, Point2D};
use super::Region;

/// Axis-aligned rectangle in pixel coordinates (base corner + extent).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Grow (positive margin) or shrink the rectangle uniformly on all sides.
    pub fn inflate(&self, margin: f64) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            width: (self.width + 2.0 * margin).max(0.0),
            height: (self.height + 2.0 * margin).max(0.0),
        }
    }
}

impl Region for Rect {
    fn bounds(&self) -> Rect {
        *self
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Convex, non-self-intersecting polygon bounding an analysis region.
///
/// Vertices are stored in counterclockwise order. Produced by the boundary
/// extractor; consumed by the profile sampler and the metric aggregators for
/// containment tests.
#[derive(Clone, Debug, Serialize)]
pub struct BoundaryPolygon {
    vertices: Vec<Point2D>,
}

/// Containment slack for points sitting exactly on an edge.
const EDGE_EPS: f64 = 1e-7;

impl BoundaryPolygon {
    /// Build a polygon from at least three vertices, normalizing the winding
    /// to counterclockwise. Returns `None` for degenerate input (fewer than
    /// three vertices or zero signed area).
    pub fn from_vertices(mut vertices: Vec<Point2D>) -> Option<Self> {
        if vertices.len() < 3 {
            return None;
        }
        let signed = signed_area(&vertices);
        if signed == 0.0 {
            return None;
        }
        if signed < 0.0 {
            vertices.reverse();
        }
        Some(Self { vertices })
    }

    /// Vertices in counterclockwise order.
    pub fn vertices(&self) -> &[Point2D] {
        &self.vertices
    }

    /// Enclosed area (shoelace formula).
    pub fn area(&self) -> f64 {
        signed_area(&self.vertices).abs()
    }

    /// Vertex-average centroid.
    pub fn centroid(&self) -> Point2D {
        let n = self.vertices.len() as f64;
        let (sx, sy) = self
            .vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point2D::new(sx / n, sy / n)
    }

    /// Scale every vertex about the origin, e.g. to follow an image rebin.
    pub fn scaled(&self, factor: f64) -> BoundaryPolygon {
        BoundaryPolygon {
            vertices: self
                .vertices
                .iter()
                .map(|p| Point2D::new(p.x * factor, p.y * factor))
                .collect(),
        }
    }

    /// Offset every edge outward by `margin` pixels (negative shrinks) and
    /// rebuild the vertex set from consecutive edge intersections.
    ///
    /// Returns `None` when the offset would collapse the polygon or invert
    /// its winding, which callers surface as a region-too-small failure.
    pub fn offset(&self, margin: f64) -> Option<BoundaryPolygon> {
        if margin == 0.0 {
            return Some(self.clone());
        }
        let n = self.vertices.len();
        // Each edge p→q of a CCW polygon keeps the interior on its left; the
        // outward normal is the right-hand normal (dy, -dx).
        let mut lines: Vec<(f64, f64, f64)> = Vec::with_capacity(n);
        for i in 0..n {
            let p = self.vertices[i];
            let q = self.vertices[(i + 1) % n];
            let dx = q.x - p.x;
            let dy = q.y - p.y;
            let len = (dx * dx + dy * dy).sqrt();
            if len <= f64::EPSILON {
                continue;
            }
            let nx = dy / len;
            let ny = -dx / len;
            // line through the shifted edge in normal form ax + by = c
            let ox = p.x + margin * nx;
            let oy = p.y + margin * ny;
            lines.push((nx, ny, nx * ox + ny * oy));
        }
        if lines.len() < 3 {
            return None;
        }
        let m = lines.len();
        let mut vertices = Vec::with_capacity(m);
        for i in 0..m {
            let (a1, b1, c1) = lines[i];
            let (a2, b2, c2) = lines[(i + 1) % m];
            let det = a1 * b2 - a2 * b1;
            if det.abs() <= f64::EPSILON {
                return None;
            }
            let x = (c1 * b2 - c2 * b1) / det;
            let y = (a1 * c2 - a2 * c1) / det;
            if !x.is_finite() || !y.is_finite() {
                return None;
            }
            vertices.push(Point2D::new(x, y));
        }
        // A shrink past the inradius flips the winding; reject it instead of
        // returning an inverted polygon.
        if signed_area(&vertices) <= 0.0 {
            return None;
        }
        Some(BoundaryPolygon { vertices })
    }
}

impl Region for BoundaryPolygon {
    fn bounds(&self) -> Rect {
        let first = self.vertices[0];
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.vertices[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        // convex CCW polygon: the point must lie left of (or on) every edge
        let p = Point2D::new(x, y);
        let n = self.vertices.len();
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            if cross(&a, &b, &p) < -EDGE_EPS {
                return false;
            }
        }
        true
    }
}

fn signed_area(vertices: &[Point2D]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut acc = 0.0;
    for i in 0..n {
        let p = vertices[i];
        let q = vertices[(i + 1) % n];
        acc += p.x * q.y - q.x * p.y;
    }
    0.5 * acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(side: f64) -> BoundaryPolygon {
        BoundaryPolygon::from_vertices(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(side, 0.0),
            Point2D::new(side, side),
            Point2D::new(0.0, side),
        ])
        .unwrap()
    }

    #[test]
    fn area_bounds_and_centroid() {
        let sq = square(4.0);
        assert!((sq.area() - 16.0).abs() < 1e-12);
        let b = sq.bounds();
        assert_eq!((b.width, b.height), (4.0, 4.0));
        let c = sq.centroid();
        assert!((c.x - 2.0).abs() < 1e-12 && (c.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn winding_is_normalized() {
        let cw = BoundaryPolygon::from_vertices(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 2.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(2.0, 0.0),
        ])
        .unwrap();
        assert!((cw.area() - 4.0).abs() < 1e-12);
        assert!(cw.contains(1.0, 1.0));
    }

    #[test]
    fn containment_includes_boundary() {
        let sq = square(4.0);
        assert!(sq.contains(2.0, 2.0));
        assert!(sq.contains(0.0, 0.0));
        assert!(sq.contains(4.0, 2.0));
        assert!(!sq.contains(4.1, 2.0));
        assert!(!sq.contains(-0.1, 2.0));
    }

    #[test]
    fn offset_shrinks_and_grows() {
        let sq = square(4.0);
        let shrunk = sq.offset(-1.0).unwrap();
        assert!((shrunk.area() - 4.0).abs() < 1e-9);
        let grown = sq.offset(1.0).unwrap();
        assert!((grown.area() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn offset_past_inradius_collapses() {
        let sq = square(4.0);
        assert!(sq.offset(-2.5).is_none());
    }

    #[test]
    fn degenerate_vertex_sets_are_rejected() {
        assert!(BoundaryPolygon::from_vertices(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
        ])
        .is_none());
        // collinear
        assert!(BoundaryPolygon::from_vertices(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 2.0),
        ])
        .is_none());
    }
}
