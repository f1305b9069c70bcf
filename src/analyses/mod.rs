//! Phantom QC analyses.
//!
//! One pure function per test: each takes an explicit input struct (pixel
//! data, calibration, region, thresholds) and returns an explicit,
//! serializable metrics struct. No test reaches into global state, and each
//! call is an independent, idempotent computation.
//!
//! Validation failures abort the one analysis that saw them via
//! [`AnalysisError`]; numerical failures (non-converged fits) are carried
//! inside the returned metrics and counted, never thrown.

pub mod bar_quadrant;
pub mod cor;
pub mod linearity;
pub mod planar_uniformity;
pub mod resolution;
pub mod tomographic;

pub use self::bar_quadrant::{bar_quadrant, BarQuadrantInput, BarQuadrantMetrics};
pub use self::cor::{center_of_rotation, CorInput, CorMetrics, CorMethod, RotationDirection};
pub use self::linearity::{intrinsic_linearity, LinearityInput, LinearityOutput};
pub use self::planar_uniformity::{planar_uniformity, PlanarUniformityMetrics};
pub use self::resolution::{
    four_bar, spatial_resolution, FourBarMetrics, ResolutionInput, ResolutionMetrics,
};
pub use self::tomographic::{
    tomographic_contrast, tomographic_uniformity, TomoContrastInput, TomoContrastMetrics,
    TomoUniformityMetrics,
};

use crate::boundary::BoundaryError;
use crate::peaks::PeakError;
use crate::profile::ProfileError;

/// Validation failure that aborts a single analysis invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    Boundary(BoundaryError),
    Profile(ProfileError),
    Peaks(PeakError),
    /// A precondition on the supplied inputs does not hold (wrong frame
    /// range, scan arc, slice count, ...).
    InvalidInput(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boundary(e) => write!(f, "boundary extraction failed: {e}"),
            Self::Profile(e) => write!(f, "profile sampling failed: {e}"),
            Self::Peaks(e) => write!(f, "peak detection failed: {e}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<BoundaryError> for AnalysisError {
    fn from(e: BoundaryError) -> Self {
        Self::Boundary(e)
    }
}

impl From<ProfileError> for AnalysisError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

impl From<PeakError> for AnalysisError {
    fn from(e: PeakError) -> Self {
        Self::Peaks(e)
    }
}

/// Default boundary threshold as a fraction of the image maximum.
pub const DEFAULT_THRESHOLD_FRACTION: f64 = 0.1;
/// Linear-dimension cutoff of the useful field of view.
pub const UFOV_CUTOFF: f64 = 0.95;
/// Linear-dimension cutoff of the central field of view.
pub const CFOV_CUTOFF: f64 = 0.75;
/// NEMA slit band width in pixels for two-bar resolution profiles.
pub const NEMA_BAND_WIDTH: usize = 8;
