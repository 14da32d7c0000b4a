use serde::{Deserialize, Serialize};

use super::decode::Symbology;

/// How an identifier reached the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquisitionSource {
    Camera,
    File,
    Manual,
}

/// A successful acquisition, handed to the delegate and presentation layer.
///
/// Never persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub id: String,
    pub text: String,
    pub symbology: Option<Symbology>,
    pub source: AcquisitionSource,
    /// Camera session that produced the frame, for camera acquisitions.
    pub session_id: Option<String>,
    pub decoded_at: String,
}

impl ScanOutcome {
    pub fn new(
        text: &str,
        symbology: Option<Symbology>,
        source: AcquisitionSource,
        session_id: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            symbology,
            source,
            session_id,
            decoded_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn from_camera(text: &str, symbology: Symbology, session_id: &str) -> Self {
        Self::new(text, Some(symbology), AcquisitionSource::Camera, Some(session_id.to_string()))
    }

    pub fn from_file(text: &str, symbology: Symbology) -> Self {
        Self::new(text, Some(symbology), AcquisitionSource::File, None)
    }

    pub fn manual(text: &str) -> Self {
        Self::new(text, None, AcquisitionSource::Manual, None)
    }
}
