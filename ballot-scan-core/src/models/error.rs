use thiserror::Error;

use crate::ballot::validator::IdentifierError;

use super::messages;

/// Errors that can occur while acquiring a ballot identifier.
///
/// `Display` is for logs; use [`ScanError::friendly_message`] for the operator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// Camera permission denied or no capture device present.
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    /// A decode attempt found nothing. Expected and recoverable.
    #[error("no barcode detected")]
    NoBarcodeDetected,

    /// Rendering a frame to an off-screen raster failed.
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),

    /// Text that is not a ballot identifier. Operations that accept text
    /// (`ScanController::edit_text`) report this through `ScanView` instead.
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] IdentifierError),

    /// The uploaded file could not be read or decoded as an image.
    #[error("unreadable image: {0}")]
    UnreadableImage(String),

    /// The recognition library reported an error, with its raw text.
    #[error("decoder failed: {0}")]
    DecoderFailed(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),
}

impl ScanError {
    /// Whether this is the ordinary "nothing in this frame" outcome.
    pub fn is_no_barcode(&self) -> bool {
        matches!(self, Self::NoBarcodeDetected)
    }

    /// Human-readable operator phrase.
    pub fn friendly_message(&self) -> String {
        messages::friendly_message(self)
    }
}
