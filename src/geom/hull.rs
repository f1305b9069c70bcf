//! Graham-scan convex hull.

use super::point::{cross, Point2D};

/// Compute the convex hull of a point set.
///
/// Pivot selection: lowest y-coordinate, ties broken by highest x. Remaining
/// points are sorted by polar angle about the pivot (nearer point first on
/// equal angles), then swept keeping only left turns, so collinear interior
/// points are discarded. The result is in counterclockwise order starting at
/// the pivot.
///
/// Degenerate inputs collapse: fewer than three points pass through
/// unchanged, and fully collinear sets reduce to their extreme points.
/// Whether that constitutes a usable region is decided at the
/// boundary-extraction level.
pub fn convex_hull(points: &[Point2D]) -> Vec<Point2D> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let pivot = *points
        .iter()
        .reduce(|best, p| {
            if p.y < best.y || (p.y == best.y && p.x > best.x) {
                p
            } else {
                best
            }
        })
        .expect("non-empty by the length check above");

    let mut rest: Vec<Point2D> = points
        .iter()
        .copied()
        .filter(|p| *p != pivot)
        .collect();
    rest.sort_by(|a, b| {
        let aa = pivot.polar_angle_to(a);
        let ab = pivot.polar_angle_to(b);
        aa.partial_cmp(&ab)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                pivot
                    .distance(a)
                    .partial_cmp(&pivot.distance(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });

    let mut hull: Vec<Point2D> = vec![pivot];
    for p in rest {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    hull
}
