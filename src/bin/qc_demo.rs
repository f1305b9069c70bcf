use phantom_qc::analyses::{
    bar_quadrant, four_bar, intrinsic_linearity, planar_uniformity, spatial_resolution,
    BarQuadrantInput, LinearityInput, ResolutionInput,
};
use phantom_qc::config::{load_config, AnalysisKind, RuntimeConfig};
use phantom_qc::image::io::{load_grayscale_f32, write_json_file};
use phantom_qc::{Axis, ImageF32, Rect};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = parse_cli()?;
    let config = load_config(Path::new(&config_path))?;

    let image = load_grayscale_f32(&config.input_path)?;
    let report = run_analysis(&config, &image)?;

    match &config.output.json_out {
        Some(path) => {
            write_json_file(path, &report)?;
            println!("JSON report written to {}", path.display());
        }
        None => {
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| format!("Failed to serialize JSON: {e}"))?;
            println!("{json}");
        }
    }
    Ok(())
}

fn parse_cli() -> Result<String, String> {
    let mut args = env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (Some("--config"), Some(path)) => Ok(path),
        (Some(path), None) => Ok(path.to_string()),
        _ => {
            let program = env::args().next().unwrap_or_else(|| "qc_demo".into());
            Err(format!("Usage: {program} [--config] <config.json>"))
        }
    }
}

/// A tagged metrics report for JSON output.
#[derive(Serialize)]
#[serde(tag = "analysis", rename_all = "snake_case")]
enum Report {
    PlanarUniformity(phantom_qc::analyses::PlanarUniformityMetrics),
    BarQuadrant(phantom_qc::analyses::BarQuadrantMetrics),
    SpatialResolution(phantom_qc::analyses::ResolutionMetrics),
    FourBar(phantom_qc::analyses::FourBarMetrics),
    Linearity(phantom_qc::analyses::LinearityOutput),
}

fn run_analysis(config: &RuntimeConfig, image: &ImageF32) -> Result<Report, String> {
    let full = Rect::new(0.0, 0.0, image.w as f64, image.h as f64);
    let p = &config.params;
    let report = match config.analysis {
        AnalysisKind::PlanarUniformity => {
            Report::PlanarUniformity(planar_uniformity(image).map_err(stringify)?)
        }
        AnalysisKind::BarQuadrant => {
            Report::BarQuadrant(bar_quadrant(&BarQuadrantInput::new(image)).map_err(stringify)?)
        }
        AnalysisKind::SpatialResolution => Report::SpatialResolution(
            spatial_resolution(&ResolutionInput::new(
                image,
                full,
                Axis::Row,
                p.calibration,
                p.known_distance_mm,
            ))
            .map_err(stringify)?,
        ),
        AnalysisKind::FourBar => Report::FourBar(
            four_bar(image, p.calibration, p.known_distance_mm).map_err(stringify)?,
        ),
        AnalysisKind::Linearity => {
            let mut input = LinearityInput::new(image, full, Axis::Row, p.calibration);
            input.line_spacing_mm = p.line_spacing_mm;
            Report::Linearity(intrinsic_linearity(&input).map_err(stringify)?)
        }
    };
    Ok(report)
}

fn stringify(err: phantom_qc::AnalysisError) -> String {
    err.to_string()
}
