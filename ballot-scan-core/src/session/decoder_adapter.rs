use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use image::GrayImage;

use crate::models::decode::{Capabilities, DecodeRequest, DecodeResult};
use crate::models::error::ScanError;
use crate::models::messages;
use crate::processing::raster;
use crate::session::camera_manager::CameraSession;
use crate::traits::barcode_reader::BarcodeReader;

/// Callback invoked after each continuous decode attempt.
///
/// Fires on the sampling thread. A `Decoded` result is always the last one a
/// subscription delivers.
pub type AttemptCallback = Arc<dyn Fn(&DecodeResult) + Send + Sync + 'static>;

/// Handle to a running continuous decode. Cancelling stops the sampler.
pub struct Subscription {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Subscription {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop sampling and wait for the sampler to exit.
    ///
    /// Safe to call from inside the attempt callback; the sampler is then
    /// left to finish on its own instead of joining itself.
    pub fn cancel(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Library-neutral front for a [`BarcodeReader`].
///
/// Runs the configured symbologies in one call, adds the extra passes of
/// "try harder" mode, and folds known "nothing found" reader errors into
/// `NoBarcodeDetected`. Never touches controller state.
#[derive(Clone)]
pub struct DecoderAdapter {
    reader: Arc<dyn BarcodeReader>,
    capabilities: Capabilities,
}

impl DecoderAdapter {
    pub fn new(reader: Arc<dyn BarcodeReader>, capabilities: Capabilities) -> Self {
        Self { reader, capabilities }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Decode a still image (file, upload or captured raster).
    pub fn decode_still(&self, request: &DecodeRequest) -> DecodeResult {
        match raster::prepare(request) {
            Ok(prepared) => self.decode_raster(&prepared, request.capabilities()),
            Err(e) => DecodeResult::failed(e),
        }
    }

    /// Decode an already-rendered raster.
    pub fn decode_raster(&self, prepared: &GrayImage, capabilities: &Capabilities) -> DecodeResult {
        let mut result = self.read_pass(prepared, capabilities);
        if !capabilities.try_harder || !is_miss(&result) {
            return result;
        }

        log::trace!(
            "no barcode on plain pass (contrast {:.2}), trying stretched and inverted",
            raster::contrast_ratio(prepared)
        );
        let stretched = raster::stretch_contrast(prepared);
        result = self.read_pass(&stretched, capabilities);
        if !is_miss(&result) {
            return result;
        }
        self.read_pass(&raster::invert(&stretched), capabilities)
    }

    /// Start sampling `session` every `interval` on a dedicated thread.
    ///
    /// Each frame is rendered `upscale` times its native size and decoded.
    /// Failed attempts are reported and sampling continues. The first success,
    /// or losing the device, stops sampling before `on_attempt` sees it.
    pub fn start_continuous(
        &self,
        session: Arc<CameraSession>,
        interval: Duration,
        upscale: u32,
        on_attempt: AttemptCallback,
    ) -> Result<Subscription, ScanError> {
        let running = Arc::new(AtomicBool::new(true));
        let adapter = self.clone();
        let flag = Arc::clone(&running);

        let handle = thread::Builder::new()
            .name("barcode-sampler".into())
            .spawn(move || {
                adapter.sample_loop(&session, interval, upscale, &flag, &on_attempt);
                flag.store(false, Ordering::SeqCst);
            })
            .map_err(|e| ScanError::ConfigurationFailed(format!("failed to spawn sampler thread: {}", e)))?;

        Ok(Subscription {
            running,
            handle: Some(handle),
        })
    }

    /// Stop a continuous subscription.
    pub fn cancel(&self, subscription: &mut Subscription) {
        subscription.cancel();
    }

    fn sample_loop(
        &self,
        session: &CameraSession,
        interval: Duration,
        upscale: u32,
        running: &AtomicBool,
        on_attempt: &AttemptCallback,
    ) {
        let mut frames: u64 = 0;
        while running.load(Ordering::SeqCst) {
            if session.is_released() {
                break;
            }

            let frame = match session.grab_frame() {
                Ok(frame) => frame,
                Err(ScanError::CaptureFailed(reason)) => {
                    log::warn!("skipping frame: {}", reason);
                    thread::sleep(interval);
                    continue;
                }
                Err(e) => {
                    running.store(false, Ordering::SeqCst);
                    log::error!("camera fault during continuous scan: {}", e);
                    on_attempt(&DecodeResult::failed(e));
                    break;
                }
            };
            frames += 1;
            session.surface().present(&frame);

            let result = match raster::render_frame(&frame, upscale) {
                Ok(prepared) => self.decode_raster(&prepared, &self.capabilities),
                Err(e) => DecodeResult::failed(e),
            };

            match &result {
                DecodeResult::Decoded { .. } => {
                    // No later frame may win.
                    running.store(false, Ordering::SeqCst);
                    log::debug!("continuous scan hit after {} frames", frames);
                    on_attempt(&result);
                    break;
                }
                DecodeResult::Failed { reason } if reason.is_no_barcode() => {
                    log::trace!("frame {}: no barcode yet", frames);
                    on_attempt(&result);
                }
                DecodeResult::Failed { reason } => {
                    log::warn!("frame {}: attempt failed: {}", frames, reason);
                    on_attempt(&result);
                }
            }

            thread::sleep(interval);
        }
    }

    fn read_pass(&self, prepared: &GrayImage, capabilities: &Capabilities) -> DecodeResult {
        match self.reader.read(prepared, capabilities) {
            Ok(Some(barcode)) if capabilities.accepts(barcode.symbology) => barcode.into(),
            Ok(Some(barcode)) => {
                log::debug!(
                    "{} ignored {} barcode outside the configured set",
                    self.reader.name(),
                    barcode.symbology
                );
                DecodeResult::failed(ScanError::NoBarcodeDetected)
            }
            Ok(None) => DecodeResult::failed(ScanError::NoBarcodeDetected),
            Err(e) => DecodeResult::failed(messages::normalize_decoder_error(e)),
        }
    }
}

fn is_miss(result: &DecodeResult) -> bool {
    matches!(result, DecodeResult::Failed { reason } if reason.is_no_barcode())
}
