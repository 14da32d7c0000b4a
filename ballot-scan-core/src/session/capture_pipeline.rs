use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::imageops;
use parking_lot::Mutex;

use crate::models::config::ScanConfiguration;
use crate::models::decode::{DecodeRequest, DecodeResult, ImageSource};
use crate::models::error::ScanError;
use crate::session::camera_manager::CameraSession;
use crate::session::decoder_adapter::{AttemptCallback, DecoderAdapter, Subscription};
use crate::traits::barcode_reader::BarcodeReader;

/// Marks a single-shot capture as in flight. Clears the mark on drop.
pub struct CaptureFlight<'a> {
    in_flight: &'a AtomicBool,
}

impl Drop for CaptureFlight<'_> {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Turns a live camera session or a still image into decode attempts.
///
/// Single-shot captures are single flight: while one is running, further
/// requests are refused. Continuous sampling owns at most one subscription.
pub struct CapturePipeline {
    adapter: DecoderAdapter,
    upscale: u32,
    max_input_edge: Option<u32>,
    frame_interval: Duration,
    in_flight: AtomicBool,
    subscription: Mutex<Option<Subscription>>,
}

impl CapturePipeline {
    pub fn new(reader: Arc<dyn BarcodeReader>, config: &ScanConfiguration) -> Self {
        Self {
            adapter: DecoderAdapter::new(reader, config.capabilities()),
            upscale: config.upscale_factor,
            max_input_edge: config.max_input_edge,
            frame_interval: config.frame_interval(),
            in_flight: AtomicBool::new(false),
            subscription: Mutex::new(None),
        }
    }

    /// Claim the single-shot slot, or `None` if a capture is already running.
    pub fn try_begin(&self) -> Option<CaptureFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| CaptureFlight {
                in_flight: &self.in_flight,
            })
    }

    pub fn is_capturing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Grab one frame from `session` and decode it through the still path.
    ///
    /// Callers hold a [`CaptureFlight`] for the duration.
    pub fn capture(&self, session: &CameraSession) -> DecodeResult {
        let frame = match session.grab_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("single-shot capture failed: {}", e);
                return DecodeResult::failed(e);
            }
        };

        let request = DecodeRequest::new(
            ImageSource::Raster(imageops::grayscale(&frame)),
            self.adapter.capabilities().clone(),
        )
        .with_upscale(self.upscale);
        self.adapter.decode_still(&request)
    }

    /// Decode an uploaded image, reduced to the configured maximum edge.
    pub fn decode_still(&self, source: ImageSource) -> DecodeResult {
        let mut request = DecodeRequest::new(source, self.adapter.capabilities().clone());
        if let Some(edge) = self.max_input_edge {
            request = request.with_max_edge(edge);
        }
        self.adapter.decode_still(&request)
    }

    /// Start sampling `session`, replacing any earlier subscription.
    pub fn start_continuous(
        &self,
        session: Arc<CameraSession>,
        on_attempt: AttemptCallback,
    ) -> Result<(), ScanError> {
        self.stop_continuous();
        let subscription =
            self.adapter
                .start_continuous(session, self.frame_interval, self.upscale, on_attempt)?;
        *self.subscription.lock() = Some(subscription);
        Ok(())
    }

    /// Cancel continuous sampling and wait for the sampler to exit.
    pub fn stop_continuous(&self) {
        let subscription = self.subscription.lock().take();
        if let Some(mut subscription) = subscription {
            self.adapter.cancel(&mut subscription);
            log::debug!("continuous sampling stopped");
        }
    }

    pub fn is_sampling(&self) -> bool {
        self.subscription.lock().as_ref().is_some_and(Subscription::is_running)
    }
}
