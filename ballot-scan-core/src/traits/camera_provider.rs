use image::RgbImage;

use crate::models::camera::{FacingMode, StreamInfo};
use crate::models::error::ScanError;

/// Interface for platform-specific video capture sources.
///
/// Implemented by:
/// - `NokhwaCameraProvider` (ballot-scan-native, feature `nokhwa`)
pub trait CameraProvider: Send + Sync {
    /// Whether any capture device is present.
    fn is_available(&self) -> bool;

    /// Acquire a device facing `facing` (falling back to any device).
    ///
    /// Fails with `ScanError::DeviceUnavailable` when no device grants access.
    fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraDevice>, ScanError>;
}

/// One acquired capture device.
pub trait CameraDevice: Send {
    fn stream_info(&self) -> StreamInfo;

    /// Begin delivering frames.
    fn start(&mut self) -> Result<(), ScanError>;

    /// The most recent frame at native resolution.
    fn grab_frame(&mut self) -> Result<RgbImage, ScanError>;

    /// Stop every track and release the hardware. Must be idempotent.
    fn stop(&mut self);
}
