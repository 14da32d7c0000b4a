use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::camera::FacingMode;
use super::decode::{Capabilities, Symbology};
use super::error::ScanError;

/// How frames are taken from an open camera session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// One frame per `capture_and_decode` request.
    #[default]
    SingleShot,
    /// Sample frames until the first successful decode.
    Continuous,
}

/// Configuration for a scan controller.
///
/// Loadable from JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfiguration {
    /// Candidate symbologies, tried together on every attempt.
    pub symbologies: Vec<Symbology>,

    /// Spend extra passes (contrast stretch, inversion) before giving up on a raster.
    pub try_harder: bool,

    /// Integer upscale applied to captured camera frames (default: 2). Valid: 1..=4.
    pub upscale_factor: u32,

    /// Longest edge an uploaded photo is reduced to before decoding (default: 1200).
    pub max_input_edge: Option<u32>,

    pub mode: CaptureMode,

    /// Tear the camera session down after a successful camera decode (default: true).
    pub close_on_decode: bool,

    pub facing: FacingMode,

    /// Delay between sampled frames in continuous mode, in milliseconds.
    pub frame_interval_ms: u64,
}

impl ScanConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.symbologies.is_empty() {
            return Err("at least one symbology must be enabled".into());
        }
        if !(1..=4).contains(&self.upscale_factor) {
            return Err(format!("unsupported upscale factor: {}", self.upscale_factor));
        }
        if let Some(edge) = self.max_input_edge {
            if edge < 64 {
                return Err(format!("max input edge too small: {}", edge));
            }
        }
        if self.frame_interval_ms == 0 {
            return Err("frame interval must be positive".into());
        }
        Ok(())
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            symbologies: self.symbologies.clone(),
            try_harder: self.try_harder,
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ScanError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ScanError::ConfigurationFailed(format!("failed to parse configuration: {}", e)))?;
        config.validate().map_err(ScanError::ConfigurationFailed)?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScanError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ScanError::ConfigurationFailed(format!("failed to read configuration: {}", e)))?;
        Self::from_json(&json)
    }
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            symbologies: Symbology::BALLOT_DEFAULTS.to_vec(),
            try_harder: true,
            upscale_factor: 2,
            max_input_edge: Some(1200),
            mode: CaptureMode::SingleShot,
            close_on_decode: true,
            facing: FacingMode::Environment,
            frame_interval_ms: 100,
        }
    }
}
