use crate::common::error::{CascadeError, Result};
use crate::core::anchors::{GridResolution, BLAZEFACE_RESOLUTIONS};
use crate::core::crop::{EyeCorners, CROP_MARGIN_FRACTION, LEFT_EYE_CORNERS, RIGHT_EYE_CORNERS};
use crate::core::detector::DETECTION_THRESHOLD;
use crate::core::landmarks::FACE_MESH_POINTS;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_DIMENSION: u32 = 8192;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub frame: FrameConfig,
    #[serde(default)]
    pub detector: DetectorConfig,
    #[serde(default)]
    pub landmark: LandmarkConfig,
    #[serde(default)]
    pub iris: IrisConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DetectorConfig {
    #[serde(default = "default_detector_input")]
    pub input_size: u32,
    #[serde(default = "default_detection_threshold")]
    pub confidence_threshold: f32,
    #[serde(default = "default_resolutions")]
    pub resolutions: Vec<GridResolution>,
    #[serde(default = "default_margin")]
    pub margin_fraction: f32,
}

fn default_detector_input() -> u32 { 128 }
fn default_detection_threshold() -> f32 { DETECTION_THRESHOLD }
fn default_resolutions() -> Vec<GridResolution> { BLAZEFACE_RESOLUTIONS.to_vec() }
fn default_margin() -> f32 { CROP_MARGIN_FRACTION }

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            input_size: default_detector_input(),
            confidence_threshold: default_detection_threshold(),
            resolutions: default_resolutions(),
            margin_fraction: default_margin(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LandmarkConfig {
    #[serde(default = "default_landmark_input")]
    pub input_size: u32,
}

fn default_landmark_input() -> u32 { 192 }

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            input_size: default_landmark_input(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IrisConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_iris_input")]
    pub input_size: u32,
    #[serde(default = "default_left_eye")]
    pub left_eye: EyeCorners,
    #[serde(default = "default_right_eye")]
    pub right_eye: EyeCorners,
}

fn default_true() -> bool { true }
fn default_iris_input() -> u32 { 64 }
fn default_left_eye() -> EyeCorners { LEFT_EYE_CORNERS }
fn default_right_eye() -> EyeCorners { RIGHT_EYE_CORNERS }

impl Default for IrisConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            input_size: default_iris_input(),
            left_eye: default_left_eye(),
            right_eye: default_right_eye(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame: FrameConfig {
                width: 640,
                height: 480,
            },
            detector: DetectorConfig::default(),
            landmark: LandmarkConfig::default(),
            iris: IrisConfig::default(),
        }
    }
}

fn invalid(message: String) -> CascadeError {
    CascadeError::Config(message)
}

fn check_dimension(name: &str, value: u32) -> Result<()> {
    if value == 0 || value > MAX_DIMENSION {
        return Err(invalid(format!(
            "{} must be between 1 and {}, got {}",
            name, MAX_DIMENSION, value
        )));
    }
    Ok(())
}

impl Config {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(invalid(format!("Config file not found: {}", path.display())));
        }

        tracing::debug!("Loading config from: {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).map_err(|e| invalid(format!("Config parse error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        check_dimension("Frame width", self.frame.width)?;
        check_dimension("Frame height", self.frame.height)?;
        check_dimension("Detector input size", self.detector.input_size)?;
        check_dimension("Landmark input size", self.landmark.input_size)?;
        check_dimension("Iris input size", self.iris.input_size)?;

        let threshold = self.detector.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid(format!(
                "Detection confidence threshold must be between 0.0 and 1.0, got {}",
                threshold
            )));
        }

        // A half-frame margin would swallow the whole frame.
        let margin = self.detector.margin_fraction;
        if !(0.0..0.5).contains(&margin) {
            return Err(invalid(format!(
                "Crop margin fraction must be in [0.0, 0.5), got {}",
                margin
            )));
        }

        if self.detector.resolutions.is_empty() {
            return Err(invalid("Detector needs at least one grid resolution".into()));
        }
        for res in &self.detector.resolutions {
            if res.grid_size == 0 || res.anchors_per_cell == 0 {
                return Err(invalid(format!(
                    "Grid resolution {}x{} with {} anchors per cell is empty",
                    res.grid_size, res.grid_size, res.anchors_per_cell
                )));
            }
        }

        for (eye, corners) in [("left", &self.iris.left_eye), ("right", &self.iris.right_eye)] {
            if let Some(index) = corners.indices().iter().find(|&&i| i >= FACE_MESH_POINTS) {
                return Err(invalid(format!(
                    "The {} eye landmark index {} is outside the {}-point face mesh",
                    eye, index, FACE_MESH_POINTS
                )));
            }
        }

        Ok(())
    }
}
