#![doc = include_str!("../README.md")]

// Core numerical engine
pub mod boundary;
pub mod fit;
pub mod geom;
pub mod metrics;
pub mod peaks;
pub mod profile;
pub mod stats;

// Image support + configuration for the demo layer
pub mod config;
pub mod image;

// One pure function per QC test
pub mod analyses;

// --- High-level re-exports -------------------------------------------------

pub use crate::analyses::AnalysisError;
pub use crate::boundary::{extract_boundary, BoundaryError};
pub use crate::fit::{fit_gaussian, fit_linear, fit_sine, FitResult};
pub use crate::geom::{BoundaryPolygon, Point2D, Rect, Region};
pub use crate::image::{Calibration, ImageF32};
pub use crate::peaks::{find_peaks, segment, Peak, PeakAlignment, Segment};
pub use crate::profile::{sample, Axis, Band, Profile};

/// Small prelude for quick experiments.
///
/// ```no_run
/// use phantom_qc::prelude::*;
///
/// # fn main() {
/// let image = ImageF32::new(256, 256);
/// let cal = Calibration { pixel_width: 2.0, pixel_height: 2.0 };
///
/// match extract_boundary(&image, 10.0, 0.95) {
///     Ok(fov) => println!("UFOV area: {:.1} px²", fov.area()),
///     Err(err) => eprintln!("no field of view: {err}"),
/// }
/// let _ = cal;
/// # }
/// ```
pub mod prelude {
    pub use crate::analyses::{
        bar_quadrant, center_of_rotation, four_bar, intrinsic_linearity, planar_uniformity,
        spatial_resolution,
    };
    pub use crate::boundary::extract_boundary;
    pub use crate::geom::{BoundaryPolygon, Point2D, Rect, Region};
    pub use crate::image::{Calibration, ImageF32};
    pub use crate::profile::{Axis, Band};
}
