//! Owned float image buffer, physical calibration and I/O helpers.

pub mod f32;
pub mod io;

pub use self::f32::ImageF32;

use serde::{Deserialize, Serialize};

/// Physical pixel calibration in millimetres, supplied by the caller along
/// with the pixel data (the core never reads image headers itself).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Calibration {
    /// Pixel width in mm.
    pub pixel_width: f64,
    /// Pixel height in mm.
    pub pixel_height: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
        }
    }
}
