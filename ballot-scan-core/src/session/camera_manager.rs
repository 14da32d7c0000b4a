use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use image::RgbImage;
use parking_lot::Mutex;

use crate::models::camera::{FacingMode, StreamInfo};
use crate::models::error::ScanError;
use crate::traits::camera_provider::{CameraDevice, CameraProvider};
use crate::traits::preview_surface::PreviewSurface;

/// One live camera acquisition bound to a preview surface.
///
/// Owns the device handle exclusively. Resources are released exactly once,
/// by [`CameraSessionManager::close`] or, failing that, on drop.
pub struct CameraSession {
    id: String,
    generation: u64,
    stream: StreamInfo,
    device: Mutex<Box<dyn CameraDevice>>,
    surface: Arc<dyn PreviewSurface>,
    attached: AtomicBool,
    released: AtomicBool,
}

impl CameraSession {
    fn new(generation: u64, device: Box<dyn CameraDevice>, surface: Arc<dyn PreviewSurface>) -> Self {
        let stream = device.stream_info();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            generation,
            stream,
            device: Mutex::new(device),
            surface,
            attached: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Monotonic per-manager counter; newer sessions have larger values.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stream_info(&self) -> &StreamInfo {
        &self.stream
    }

    pub fn surface(&self) -> &Arc<dyn PreviewSurface> {
        &self.surface
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// Grab the current frame at native resolution.
    pub fn grab_frame(&self) -> Result<RgbImage, ScanError> {
        if self.is_released() {
            return Err(ScanError::CaptureFailed("camera session is closed".into()));
        }
        self.device.lock().grab_frame()
    }

    fn start(&self) -> Result<(), ScanError> {
        self.device.lock().start()?;
        self.surface.attach(&self.stream);
        self.attached.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop every track and detach the surface. Idempotent.
    fn release(&self) {
        if self.released.swap(true, Ordering::SeqCst) {
            return;
        }
        self.device.lock().stop();
        if self.attached.swap(false, Ordering::SeqCst) {
            self.surface.detach();
        }
        log::info!("camera session {} (generation {}) released", self.id, self.generation);
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Acquires capture devices and guarantees at most one live session.
pub struct CameraSessionManager {
    provider: Arc<dyn CameraProvider>,
    facing: FacingMode,
    generation: AtomicU64,
    active: Mutex<Option<Arc<CameraSession>>>,
}

impl CameraSessionManager {
    pub fn new(provider: Arc<dyn CameraProvider>, facing: FacingMode) -> Self {
        Self {
            provider,
            facing,
            generation: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Open a camera and bind it to `surface`, closing any previous session first.
    ///
    /// On failure nothing stays acquired: a device that was obtained but could
    /// not start is released before the error is returned.
    pub fn open(&self, surface: Arc<dyn PreviewSurface>) -> Result<Arc<CameraSession>, ScanError> {
        self.close_active();

        if !self.provider.is_available() {
            return Err(ScanError::DeviceUnavailable("no camera device found".into()));
        }

        let device = self.provider.open(self.facing)?;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let session = Arc::new(CameraSession::new(generation, device, surface));

        if let Err(e) = session.start() {
            log::warn!("camera failed to start: {}", e);
            session.release();
            return Err(e);
        }

        log::info!(
            "camera session {} opened: {} ({}x{}, generation {})",
            session.id(),
            session.stream_info().label,
            session.stream_info().width,
            session.stream_info().height,
            generation
        );

        *self.active.lock() = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Release `session`. Closing an already-closed session is a no-op.
    pub fn close(&self, session: &CameraSession) {
        session.release();
        let mut active = self.active.lock();
        if active.as_ref().is_some_and(|s| s.generation() == session.generation()) {
            *active = None;
        }
    }

    /// Release whatever session is live, if any.
    pub fn close_active(&self) {
        let previous = self.active.lock().take();
        if let Some(session) = previous {
            session.release();
        }
    }

    pub fn active(&self) -> Option<Arc<CameraSession>> {
        self.active.lock().clone()
    }

    pub fn has_active(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Whether `generation` still names the live, unreleased session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|s| s.generation() == generation && !s.is_released())
    }
}
