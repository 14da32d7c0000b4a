//! Camera capture provider backed by nokhwa.
//!
//! nokhwa camera handles are not `Send` on every platform, so each acquired
//! device lives on its own pump thread. The pump keeps the most recent frame
//! in a shared slot; `grab_frame` hands out a copy of it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, CameraInfo, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use parking_lot::Mutex;

use ballot_scan_core::models::camera::{FacingMode, StreamInfo};
use ballot_scan_core::models::error::ScanError;
use ballot_scan_core::traits::camera_provider::{CameraDevice, CameraProvider};

const OPEN_TIMEOUT: Duration = Duration::from_secs(10);
const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);
/// Consecutive frame errors after which the device is considered lost.
const MAX_FRAME_ERRORS: u32 = 50;

/// Enumerates cameras through the platform's native backend.
pub struct NokhwaCameraProvider {
    backend: ApiBackend,
}

impl NokhwaCameraProvider {
    pub fn new() -> Self {
        Self {
            backend: ApiBackend::Auto,
        }
    }

    fn cameras(&self) -> Result<Vec<CameraInfo>, ScanError> {
        nokhwa::query(self.backend)
            .map_err(|e| ScanError::DeviceUnavailable(format!("camera query failed: {}", e)))
    }
}

impl Default for NokhwaCameraProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraProvider for NokhwaCameraProvider {
    fn is_available(&self) -> bool {
        self.cameras().map(|c| !c.is_empty()).unwrap_or(false)
    }

    fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraDevice>, ScanError> {
        let cameras = self.cameras()?;
        let names: Vec<String> = cameras.iter().map(CameraInfo::human_name).collect();
        let Some((pick, actual_facing)) = pick_camera(&names, facing) else {
            return Err(ScanError::DeviceUnavailable("no camera device found".into()));
        };

        let info = &cameras[pick];
        log::info!("opening camera {} ({:?})", info.human_name(), actual_facing);
        let device = NokhwaCamera::spawn(info.index().clone(), info.human_name(), actual_facing)?;
        Ok(Box::new(device))
    }
}

/// One nokhwa camera running on a dedicated pump thread.
struct NokhwaCamera {
    stream: StreamInfo,
    running: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<RgbImage>>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl NokhwaCamera {
    fn spawn(index: CameraIndex, label: String, facing: FacingMode) -> Result<Self, ScanError> {
        let running = Arc::new(AtomicBool::new(true));
        let alive = Arc::new(AtomicBool::new(true));
        let latest = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let device_id = index.to_string();
        let pump_running = Arc::clone(&running);
        let pump_alive = Arc::clone(&alive);
        let pump_latest = Arc::clone(&latest);

        let handle = thread::Builder::new()
            .name("nokhwa-camera".into())
            .spawn(move || {
                if let Err(e) = pump(index, &pump_running, &pump_latest, ready_tx) {
                    log::error!("camera pump stopped: {}", e);
                }
                pump_alive.store(false, Ordering::SeqCst);
            })
            .map_err(|e| ScanError::DeviceUnavailable(format!("failed to spawn camera thread: {}", e)))?;

        let mut camera = Self {
            stream: StreamInfo {
                device_id,
                label,
                width: 0,
                height: 0,
                facing,
            },
            running,
            alive,
            latest,
            handle: Some(handle),
        };

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok((width, height))) => {
                camera.stream.width = width;
                camera.stream.height = height;
                Ok(camera)
            }
            Ok(Err(reason)) => {
                camera.stop();
                Err(ScanError::DeviceUnavailable(reason))
            }
            Err(_) => {
                camera.stop();
                Err(ScanError::DeviceUnavailable("camera did not open in time".into()))
            }
        }
    }
}

impl CameraDevice for NokhwaCamera {
    fn stream_info(&self) -> StreamInfo {
        self.stream.clone()
    }

    fn start(&mut self) -> Result<(), ScanError> {
        let deadline = Instant::now() + FIRST_FRAME_TIMEOUT;
        while Instant::now() < deadline {
            if self.latest.lock().is_some() {
                return Ok(());
            }
            if !self.alive.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }
        Err(ScanError::DeviceUnavailable("camera delivered no frames".into()))
    }

    fn grab_frame(&mut self) -> Result<RgbImage, ScanError> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(ScanError::DeviceUnavailable("camera stream ended".into()));
        }
        self.latest
            .lock()
            .clone()
            .ok_or_else(|| ScanError::CaptureFailed("no frame received yet".into()))
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        *self.latest.lock() = None;
    }
}

impl Drop for NokhwaCamera {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open the camera, report its resolution, then keep the newest frame in `latest`.
fn pump(
    index: CameraIndex,
    running: &AtomicBool,
    latest: &Mutex<Option<RgbImage>>,
    ready: mpsc::SyncSender<Result<(u32, u32), String>>,
) -> Result<(), String> {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
    let mut camera = match Camera::new(index, requested) {
        Ok(camera) => camera,
        Err(e) => {
            let _ = ready.send(Err(format!("failed to open camera: {}", e)));
            return Ok(());
        }
    };
    if let Err(e) = camera.open_stream() {
        let _ = ready.send(Err(format!("failed to start camera stream: {}", e)));
        return Ok(());
    }

    let resolution = camera.resolution();
    let _ = ready.send(Ok((resolution.width(), resolution.height())));

    let mut failures = 0;
    while running.load(Ordering::SeqCst) {
        let buffer = match camera.frame() {
            Ok(buffer) => buffer,
            Err(e) => {
                failures += 1;
                if failures >= MAX_FRAME_ERRORS {
                    let _ = camera.stop_stream();
                    return Err(format!("camera lost after {} frame errors: {}", failures, e));
                }
                log::warn!("frame capture error: {}", e);
                thread::sleep(Duration::from_millis(20));
                continue;
            }
        };

        match buffer.decode_image::<RgbFormat>() {
            Ok(decoded) => {
                failures = 0;
                let (width, height) = (decoded.width(), decoded.height());
                // nokhwa may pin a different `image` release; move the bytes across.
                if let Some(frame) = RgbImage::from_raw(width, height, decoded.into_raw()) {
                    *latest.lock() = Some(frame);
                }
            }
            Err(e) => log::warn!("frame decode error: {}", e),
        }
    }

    if let Err(e) = camera.stop_stream() {
        log::warn!("failed to stop camera stream: {}", e);
    }
    Ok(())
}

/// Guess which way a camera faces from its name.
fn facing_from_name(name: &str) -> Option<FacingMode> {
    let name = name.to_lowercase();
    if ["back", "rear", "environment"].iter().any(|k| name.contains(k)) {
        Some(FacingMode::Environment)
    } else if ["front", "user", "facetime"].iter().any(|k| name.contains(k)) {
        Some(FacingMode::User)
    } else {
        None
    }
}

/// Index of the camera to open and the facing it is believed to have.
///
/// Prefers a camera whose name matches `facing`; otherwise the first one.
fn pick_camera(names: &[String], facing: FacingMode) -> Option<(usize, FacingMode)> {
    if facing != FacingMode::Any {
        if let Some(i) = names.iter().position(|n| facing_from_name(n) == Some(facing)) {
            return Some((i, facing));
        }
    }
    names
        .first()
        .map(|n| (0, facing_from_name(n).unwrap_or(FacingMode::Any)))
}
