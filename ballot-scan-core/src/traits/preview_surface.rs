use image::RgbImage;

use crate::models::camera::StreamInfo;

/// Display surface a live camera stream is bound to.
///
/// The core only attaches, detaches and pushes sampled frames; layout and
/// rendering are the surface's business.
pub trait PreviewSurface: Send + Sync {
    fn attach(&self, stream: &StreamInfo);

    fn detach(&self);

    /// Called with each frame sampled during continuous scanning.
    fn present(&self, _frame: &RgbImage) {}
}
