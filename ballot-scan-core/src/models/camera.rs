use serde::{Deserialize, Serialize};

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera, pointed away from the operator. Preferred for ballots.
    #[default]
    Environment,
    /// Front camera.
    User,
    /// Whatever device the platform offers first.
    Any,
}

/// Description of a live video stream bound to a preview surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub device_id: String,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
}
