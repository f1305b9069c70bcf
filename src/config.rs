//! JSON runtime configuration for the demo binaries.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::image::Calibration;

/// Which analysis the demo binary should run.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    PlanarUniformity,
    BarQuadrant,
    SpatialResolution,
    FourBar,
    Linearity,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Write the metrics as pretty JSON here; print to stdout otherwise.
    pub json_out: Option<PathBuf>,
}

/// Analysis parameters with the NEMA defaults.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AnalysisParams {
    pub calibration: Calibration,
    /// Known bar separation for the resolution tests, mm.
    pub known_distance_mm: f64,
    /// Expected line spacing for the linearity test, mm.
    pub line_spacing_mm: f64,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            known_distance_mm: 100.0,
            line_spacing_mm: 30.0,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RuntimeConfig {
    pub input_path: PathBuf,
    pub analysis: AnalysisKind,
    #[serde(default)]
    pub params: AnalysisParams,
    #[serde(default)]
    pub output: OutputConfig,
}

pub fn load_config(path: &Path) -> Result<RuntimeConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RuntimeConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_parses_with_defaults() {
        let json = r#"{
            "input_path": "flood.png",
            "analysis": "planar_uniformity"
        }"#;
        let cfg: RuntimeConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.analysis, AnalysisKind::PlanarUniformity);
        assert_eq!(cfg.params.known_distance_mm, 100.0);
        assert!(cfg.output.json_out.is_none());
    }
}
