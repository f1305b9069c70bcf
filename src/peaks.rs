//! Peak detection and profile segmentation.
//!
//! `find_peaks` locates interior local maxima that protrude from the
//! surrounding terrain by at least a noise tolerance of 10% of the profile
//! maximum; profile endpoints are never peaks and plateau ties resolve to
//! the first sample. `segment` then splits the profile into contiguous
//! peak-centered ranges at inter-peak midpoints, feeding one Gaussian fit
//! per range.
//!
//! Multi-row analyses (linearity grids) reconcile per-row peak sets against
//! a reference row via [`align_to_reference`]; how a disagreeing row is
//! treated is an explicit [`PeakAlignment`] policy, not a hard-wired rule.

use crate::profile::Profile;

/// A local maximum of a profile. The index is valid only within the profile
/// the peak was derived from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub height: f64,
}

/// A contiguous sub-range of a profile, with x re-based to absolute bin
/// indices. Length ≥ 4 is required for a stable Gaussian fit.
#[derive(Clone, Debug, Default)]
pub struct Segment {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Segment {
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Errors raised by peak-based preprocessing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeakError {
    /// The phantom requires more peaks than the profile shows.
    InsufficientPeaks { needed: usize, got: usize },
    /// Strict alignment saw a row whose peak count disagrees with the
    /// reference.
    PeakCountMismatch { expected: usize, got: usize },
}

impl std::fmt::Display for PeakError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientPeaks { needed, got } => {
                write!(f, "insufficient peaks: need {}, got {}", needed, got)
            }
            Self::PeakCountMismatch { expected, got } => {
                write!(f, "peak count mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for PeakError {}

/// How a profile whose peak count disagrees with the reference peak set is
/// reconciled. Historical implementations disagree here, so the policy is a
/// caller decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PeakAlignment {
    /// Any disagreement is an error.
    Strict,
    /// Disagreeing profiles are dropped from aggregation.
    DropMismatched,
    /// Peaks are matched to the reference by nearest index within a
    /// tolerance window; unmatched peaks are dropped.
    #[default]
    AlignByTolerance,
}

/// Fraction of the profile maximum used as the peak noise tolerance.
const NOISE_TOLERANCE_FRACTION: f64 = 0.1;

/// Find the profile's peaks in ascending index order.
///
/// A candidate maximum is accepted when the profile descends at least the
/// tolerance below it on both flanks before climbing above it again (or
/// reaching an end). Endpoints are excluded; a plateau reports its first
/// index.
pub fn find_peaks(profile: &Profile) -> Vec<Peak> {
    let values = &profile.values;
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }
    let tolerance = NOISE_TOLERANCE_FRACTION * profile.max_value();

    // interior local maxima, plateau ties to the first sample
    let mut candidates: Vec<usize> = Vec::new();
    let mut i = 1;
    while i < n - 1 {
        if values[i] > values[i - 1] {
            let mut j = i;
            while j + 1 < n && values[j + 1] == values[i] {
                j += 1;
            }
            if j < n - 1 && values[j + 1] < values[i] {
                candidates.push(i);
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    let mut accepted: Vec<Peak> = Vec::new();
    for &c in &candidates {
        let h = values[c];
        // deepest valley on each flank before the terrain climbs above h
        let mut min_left = h;
        let mut k = c;
        while k > 0 {
            k -= 1;
            if values[k] > h {
                break;
            }
            min_left = min_left.min(values[k]);
        }
        let mut min_right = h;
        let mut k = c;
        while k + 1 < n {
            k += 1;
            if values[k] > h {
                break;
            }
            min_right = min_right.min(values[k]);
        }
        if h - min_left >= tolerance && h - min_right >= tolerance {
            accepted.push(Peak {
                index: c,
                height: h,
            });
        }
    }
    accepted
}

/// Find peaks and fail unless at least `needed` are present.
pub fn require_peaks(profile: &Profile, needed: usize) -> Result<Vec<Peak>, PeakError> {
    let peaks = find_peaks(profile);
    if peaks.len() < needed {
        return Err(PeakError::InsufficientPeaks {
            needed,
            got: peaks.len(),
        });
    }
    Ok(peaks)
}

/// Midpoint bin between the two tallest peaks of a two-bar profile.
pub fn middle_of_two_tallest(profile: &Profile) -> Result<usize, PeakError> {
    let peaks = require_peaks(profile, 2)?;
    let mut tallest = (0usize, f64::MIN);
    let mut second = (0usize, f64::MIN);
    for p in &peaks {
        if p.height > tallest.1 {
            second = tallest;
            tallest = (p.index, p.height);
        } else if p.height > second.1 {
            second = (p.index, p.height);
        }
    }
    Ok((0.5 * (tallest.0 as f64 + second.0 as f64)) as usize)
}

/// Partition the profile into one segment per peak.
///
/// Adjacent peaks split at `floor(0.5 (p_j + p_{j+1}))`; the first segment
/// starts at the array start and the last runs to the array end. With fewer
/// than two peaks the whole profile is a single segment.
pub fn segment(profile: &Profile, peaks: &[Peak]) -> Vec<Segment> {
    let n = profile.values.len();
    let mut segments = Vec::with_capacity(peaks.len().max(1));
    let mut start = 0usize;
    for pair in peaks.windows(2) {
        let split = (0.5 * (pair[0].index as f64 + pair[1].index as f64)).floor() as usize;
        segments.push(slice_segment(profile, start, split));
        start = split;
    }
    segments.push(slice_segment(profile, start, n));
    segments
}

fn slice_segment(profile: &Profile, start: usize, end: usize) -> Segment {
    let x = (start..end).map(|i| i as f64).collect();
    let y = profile.values[start..end].to_vec();
    Segment { x, y }
}

/// Match detected peaks to a reference peak set by nearest index.
///
/// Each reference slot takes the closest unused detected peak within
/// `tolerance` bins (half the expected phantom line spacing); detected
/// peaks matching no slot are dropped. The result has one entry per
/// reference peak, `None` where nothing matched.
pub fn align_to_reference(
    detected: &[Peak],
    reference: &[Peak],
    tolerance: f64,
) -> Vec<Option<Peak>> {
    let mut used = vec![false; detected.len()];
    reference
        .iter()
        .map(|r| {
            let mut best: Option<(usize, f64)> = None;
            for (i, d) in detected.iter().enumerate() {
                if used[i] {
                    continue;
                }
                let dist = (d.index as f64 - r.index as f64).abs();
                if dist <= tolerance && best.map_or(true, |(_, bd)| dist < bd) {
                    best = Some((i, dist));
                }
            }
            best.map(|(i, _)| {
                used[i] = true;
                detected[i]
            })
        })
        .collect()
}
