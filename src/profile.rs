//! 1D intensity profile sampling over image regions.
//!
//! A profile aggregates pixel intensities along one axis of a region by
//! summing a band of pixels in the orthogonal direction and dividing by the
//! number of band pixels actually inside the region per bin, so irregular
//! (non-rectangular) regions do not bias the profile. Bin order equals
//! spatial order.
//!
//! Linearity-style analyses re-bin the orthogonal axis to a fixed physical
//! bin size first (see [`rebin_bin_count`]) and sample one profile per
//! coarse bin by passing the corresponding sub-rectangle.

use crate::geom::Region;
use crate::image::ImageF32;

/// An ordered 1D intensity profile with its physical bin pitch in mm.
#[derive(Clone, Debug)]
pub struct Profile {
    /// One intensity sample per spatial bin, in spatial order.
    pub values: Vec<f64>,
    /// Physical distance between adjacent bins, millimetres.
    pub pixel_pitch: f64,
}

impl Profile {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum sample value, 0 for an empty profile.
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0f64, f64::max)
    }
}

/// Sampling axis: `Row` walks bins along x (summing columns of the band),
/// `Column` walks bins along y.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

/// Orthogonal extent to aggregate per bin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Band {
    /// The region's full orthogonal extent.
    Full,
    /// A band of the given pixel width centered on the region; clipped to
    /// the region when it is narrower than the band.
    Centered(usize),
}

/// Errors raised while sampling a profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// A centered band of zero pixels was requested.
    InvalidBandWidth,
    /// The region does not cover a single pixel along the sampling axis.
    EmptyRegion,
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBandWidth => write!(f, "band width must be at least one pixel"),
            Self::EmptyRegion => write!(f, "region covers no pixels along the sampling axis"),
        }
    }
}

impl std::error::Error for ProfileError {}

/// Aggregate the region into one profile along `axis`.
///
/// `pixel_pitch` is the physical pitch along the sampling axis in mm and is
/// recorded on the returned profile unchanged.
pub fn sample<R: Region>(
    pixels: &ImageF32,
    region: &R,
    axis: Axis,
    band: Band,
    pixel_pitch: f64,
) -> Result<Profile, ProfileError> {
    let b = region.bounds();
    // integer pixel window clipped to the image
    let x0 = (b.x.floor().max(0.0)) as usize;
    let y0 = (b.y.floor().max(0.0)) as usize;
    let x1 = ((b.x + b.width).ceil().min(pixels.w as f64)).max(0.0) as usize;
    let y1 = ((b.y + b.height).ceil().min(pixels.h as f64)).max(0.0) as usize;
    if x1 <= x0 || y1 <= y0 {
        return Err(ProfileError::EmptyRegion);
    }

    let (nbins, ortho_extent) = match axis {
        Axis::Row => (x1 - x0, y1 - y0),
        Axis::Column => (y1 - y0, x1 - x0),
    };

    let (o0, o1) = match band {
        Band::Full => (0usize, ortho_extent),
        Band::Centered(0) => return Err(ProfileError::InvalidBandWidth),
        Band::Centered(w) => {
            if ortho_extent > w {
                let init = (ortho_extent - w) / 2;
                (init, init + w)
            } else {
                (0, ortho_extent)
            }
        }
    };

    let mut values = vec![0.0f64; nbins];
    for (bin, value) in values.iter_mut().enumerate() {
        let mut acc = 0.0f64;
        let mut inside = 0usize;
        for o in o0..o1 {
            let (x, y) = match axis {
                Axis::Row => (x0 + bin, y0 + o),
                Axis::Column => (x0 + o, y0 + bin),
            };
            if region.contains(x as f64, y as f64) {
                acc += pixels.get(x, y) as f64;
                inside += 1;
            }
        }
        // a bin with no interior band pixels contributes zero, not NaN
        if inside > 0 {
            *value = acc / inside as f64;
        }
    }

    Ok(Profile {
        values,
        pixel_pitch,
    })
}

/// Number of coarse bins when re-binning an extent to a target physical bin
/// size (≈30 mm for NEMA linearity rows).
#[inline]
pub fn rebin_bin_count(extent_px: f64, pitch_mm: f64, target_bin_mm: f64) -> usize {
    if target_bin_mm <= 0.0 {
        return 0;
    }
    (extent_px * pitch_mm / target_bin_mm).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::{BoundaryPolygon, Point2D, Rect};

    fn gradient_image(w: usize, h: usize) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, x as f32);
            }
        }
        img
    }

    #[test]
    fn row_profile_over_rect() {
        let img = gradient_image(8, 8);
        let roi = Rect::new(2.0, 2.0, 4.0, 4.0);
        let p = sample(&img, &roi, Axis::Row, Band::Full, 1.0).unwrap();
        assert_eq!(p.len(), 4);
        // column x has constant intensity x
        for (i, v) in p.values.iter().enumerate() {
            assert!((v - (i as f64 + 2.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn centered_band_clips_to_region() {
        let img = gradient_image(8, 8);
        let roi = Rect::new(0.0, 0.0, 8.0, 4.0);
        let wide = sample(&img, &roi, Axis::Row, Band::Centered(100), 1.0).unwrap();
        let full = sample(&img, &roi, Axis::Row, Band::Full, 1.0).unwrap();
        assert_eq!(wide.values, full.values);
    }

    #[test]
    fn zero_band_width_is_invalid() {
        let img = gradient_image(4, 4);
        let roi = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert_eq!(
            sample(&img, &roi, Axis::Row, Band::Centered(0), 1.0).unwrap_err(),
            ProfileError::InvalidBandWidth
        );
    }

    #[test]
    fn polygon_region_normalizes_by_inside_count() {
        // right triangle: fewer interior pixels per bin toward the apex,
        // but a flat field must still yield a flat profile
        let mut img = ImageF32::new(8, 8);
        for v in img.data.iter_mut() {
            *v = 10.0;
        }
        let tri = BoundaryPolygon::from_vertices(vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(7.0, 0.0),
            Point2D::new(0.0, 7.0),
        ])
        .unwrap();
        let p = sample(&img, &tri, Axis::Row, Band::Full, 1.0).unwrap();
        for v in &p.values {
            assert!((v - 10.0).abs() < 1e-9, "profile bin {v} not normalized");
        }
    }

    #[test]
    fn rebin_count_matches_physical_target() {
        assert_eq!(rebin_bin_count(256.0, 2.4, 30.0), 20);
        assert_eq!(rebin_bin_count(64.0, 1.0, 30.0), 2);
        assert_eq!(rebin_bin_count(10.0, 1.0, 0.0), 0);
    }
}
