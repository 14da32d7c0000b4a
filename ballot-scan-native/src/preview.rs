//! Headless preview surface.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use image::RgbImage;

use ballot_scan_core::models::camera::StreamInfo;
use ballot_scan_core::traits::preview_surface::PreviewSurface;

/// How often a presented frame is logged.
const LOG_EVERY_FRAMES: u64 = 30;

/// Preview surface for terminals: logs the bound stream instead of drawing it.
#[derive(Default)]
pub struct LoggingSurface {
    attached: AtomicBool,
    frames: AtomicU64,
}

impl LoggingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Frames presented since the last attach.
    pub fn frames_presented(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

impl PreviewSurface for LoggingSurface {
    fn attach(&self, stream: &StreamInfo) {
        self.frames.store(0, Ordering::SeqCst);
        self.attached.store(true, Ordering::SeqCst);
        log::info!(
            "preview attached to {} [{}] {}x{} ({:?})",
            stream.label,
            stream.device_id,
            stream.width,
            stream.height,
            stream.facing
        );
    }

    fn detach(&self) {
        if self.attached.swap(false, Ordering::SeqCst) {
            log::info!("preview detached after {} frames", self.frames_presented());
        }
    }

    fn present(&self, frame: &RgbImage) {
        let n = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        if n % LOG_EVERY_FRAMES == 0 {
            log::trace!("preview frame {} ({}x{})", n, frame.width(), frame.height());
        }
    }
}
