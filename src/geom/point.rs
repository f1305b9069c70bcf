//! Immutable 2D point value type.

use serde::Serialize;

/// A point in pixel coordinates. Constructed fresh per computation; running
/// accumulations return new values instead of mutating shared state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[inline]
    pub fn distance(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Polar angle of `other` about this point, normalized to [0, 2π).
    #[inline]
    pub fn polar_angle_to(&self, other: &Point2D) -> f64 {
        let a = (other.y - self.y).atan2(other.x - self.x);
        if a >= 0.0 {
            a
        } else {
            a + 2.0 * std::f64::consts::PI
        }
    }
}

/// Twice the signed area of triangle a → b → c.
///
/// Positive when the turn is counterclockwise in a y-up frame.
#[inline]
pub fn cross(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Whether the angle formed by a → b → c turns counterclockwise.
#[inline]
pub fn is_counterclockwise(a: &Point2D, b: &Point2D, c: &Point2D) -> bool {
    cross(a, b, c) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_and_angle() {
        let o = Point2D::new(0.0, 0.0);
        let p = Point2D::new(3.0, 4.0);
        assert!((o.distance(&p) - 5.0).abs() < 1e-12);
        let q = Point2D::new(0.0, -1.0);
        let a = o.polar_angle_to(&q);
        assert!((a - 1.5 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn orientation_test() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(1.0, 0.0);
        let c = Point2D::new(1.0, 1.0);
        assert!(is_counterclockwise(&a, &b, &c));
        assert!(!is_counterclockwise(&a, &c, &b));
        // collinear is not a left turn
        let d = Point2D::new(2.0, 0.0);
        assert!(!is_counterclockwise(&a, &b, &d));
    }
}
