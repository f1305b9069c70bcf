mod common;

use common::synthetic_image::{flood_disc, line_grid, two_bar_phantom};
use phantom_qc::analyses::{
    intrinsic_linearity, planar_uniformity, spatial_resolution, LinearityInput, ResolutionInput,
};
use phantom_qc::fit::FWHM_PER_SIGMA;
use phantom_qc::metrics::resolution_summary;
use phantom_qc::prelude::*;
use phantom_qc::{find_peaks, fit_gaussian, sample, segment};

#[test]
fn two_bar_phantom_calibrates_pixel_size_and_resolution() {
    // bars 50 px apart with a 2.5 px blur; true pitch 2 mm, so the known
    // physical separation is 100 mm
    let sigma = 2.5;
    let image = two_bar_phantom(128, 64, 39.0, 89.0, sigma);
    let cal = Calibration {
        pixel_width: 2.0,
        pixel_height: 2.0,
    };
    let input = ResolutionInput::new(
        &image,
        Rect::new(0.0, 0.0, 128.0, 64.0),
        Axis::Row,
        cal,
        100.0,
    );
    let m = spatial_resolution(&input).expect("two clean bars");
    assert!(m.converged);
    assert!(
        (m.pixel_size_mm - 2.0).abs() / 2.0 < 0.01,
        "pixel size {:.4} mm not within 1% of 2 mm",
        m.pixel_size_mm
    );
    let expected_fwhm = sigma * FWHM_PER_SIGMA * 2.0;
    assert!(
        (m.fwhm_mm - expected_fwhm).abs() / expected_fwhm < 0.05,
        "FWHM {:.3} mm not within 5% of {:.3} mm",
        m.fwhm_mm,
        expected_fwhm
    );
}

#[test]
fn core_pipeline_composes_over_a_flood_region() {
    // boundary → profile → peaks → segments → fits → aggregate, composed
    // from the public pieces the analyses are built on; the bars sit on a
    // flood pedestal so the threshold mask is one connected region
    let mut image = two_bar_phantom(128, 64, 39.0, 89.0, 2.0);
    for v in image.data.iter_mut() {
        *v += 200.0;
    }
    let fov = extract_boundary(&image, 0.1 * image.max_value(), 1.0).expect("bars form a region");
    assert!(fov.area() > 0.0);

    let profile = sample(&image, &fov, Axis::Row, Band::Full, 2.0).unwrap();
    let peaks = find_peaks(&profile);
    assert_eq!(peaks.len(), 2, "two bars expected, got {peaks:?}");

    let fits: Vec<_> = segment(&profile, &peaks)
        .iter()
        .map(|s| fit_gaussian(&s.x, &s.y))
        .collect();
    let summary = resolution_summary(&fits, profile.pixel_pitch);
    assert_eq!(summary.fitted_segments, 2);
    assert_eq!(summary.skipped_segments, 0);
    let expected = 2.0 * FWHM_PER_SIGMA * 2.0;
    assert!(
        (summary.mean_fwhm_mm - expected).abs() / expected < 0.05,
        "mean FWHM {:.3} vs {:.3}",
        summary.mean_fwhm_mm,
        expected
    );
}

#[test]
fn flood_uniformity_degrades_with_a_hot_spot() {
    let clean = planar_uniformity(&flood_disc(128, 56.0, 100.0)).expect("clean flood");

    let mut hot = flood_disc(128, 56.0, 100.0);
    for y in 58..70 {
        for x in 58..70 {
            hot.set(x, y, 140.0);
        }
    }
    let degraded = planar_uniformity(&hot).expect("hot flood");

    assert!(degraded.cfov.integral_pct > clean.cfov.integral_pct + 1.0);
    assert!(degraded.ufov.integral_pct > clean.ufov.integral_pct + 1.0);
    assert!(degraded.cfov.differential_pct > clean.cfov.differential_pct);
}

#[test]
fn straight_line_grid_reports_negligible_nonlinearity() {
    let image = line_grid(128, 128, 16, 1.8);
    let cal = Calibration {
        pixel_width: 2.0,
        pixel_height: 2.0,
    };
    let input = LinearityInput::new(&image, Rect::new(0.0, 0.0, 128.0, 128.0), Axis::Row, cal);
    let out = intrinsic_linearity(&input).expect("clean grid");
    assert_eq!(out.strips_excluded, 0);
    assert!(
        out.linearity.absolute_mm < 0.05,
        "absolute linearity {:.4} mm should be negligible",
        out.linearity.absolute_mm
    );
    assert!(out.linearity.differential_mm < 0.05);
    assert!(out.resolution.worst_fwhm_mm >= out.resolution.mean_fwhm_mm);
}
