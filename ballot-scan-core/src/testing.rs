//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::{GrayImage, Rgb, RgbImage};
use parking_lot::Mutex;

use crate::models::camera::{FacingMode, StreamInfo};
use crate::models::decode::{Barcode, Capabilities, DecodeResult, Symbology};
use crate::models::error::ScanError;
use crate::models::outcome::ScanOutcome;
use crate::models::state::ScanState;
use crate::traits::barcode_reader::BarcodeReader;
use crate::traits::camera_provider::{CameraDevice, CameraProvider};
use crate::traits::preview_surface::PreviewSurface;
use crate::traits::scan_delegate::ScanDelegate;

pub const FRAME_WIDTH: u32 = 64;
pub const FRAME_HEIGHT: u32 = 48;

pub fn barcode(text: &str) -> Barcode {
    Barcode {
        text: text.to_string(),
        symbology: Symbology::Code128,
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

// -- Camera --

#[derive(Default)]
struct CameraCounters {
    unavailable: AtomicBool,
    deny: AtomicBool,
    fail_start: AtomicBool,
    fail_grab: AtomicBool,
    opens: AtomicUsize,
    held: AtomicUsize,
    max_held: AtomicUsize,
    grabs: AtomicUsize,
}

/// Fake camera that counts how many devices are held at once.
#[derive(Clone)]
pub struct FakeCamera {
    counters: Arc<CameraCounters>,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(CameraCounters::default()),
        }
    }

    pub fn unavailable(self) -> Self {
        self.counters.unavailable.store(true, Ordering::SeqCst);
        self
    }

    pub fn deny_permission(self) -> Self {
        self.counters.deny.store(true, Ordering::SeqCst);
        self
    }

    pub fn fail_start(self) -> Self {
        self.counters.fail_start.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_fail_grab(&self, fail: bool) {
        self.counters.fail_grab.store(fail, Ordering::SeqCst);
    }

    pub fn provider(&self) -> Arc<dyn CameraProvider> {
        Arc::new(self.clone())
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn held(&self) -> usize {
        self.counters.held.load(Ordering::SeqCst)
    }

    pub fn max_held(&self) -> usize {
        self.counters.max_held.load(Ordering::SeqCst)
    }

    pub fn grabs(&self) -> usize {
        self.counters.grabs.load(Ordering::SeqCst)
    }
}

impl CameraProvider for FakeCamera {
    fn is_available(&self) -> bool {
        !self.counters.unavailable.load(Ordering::SeqCst)
    }

    fn open(&self, facing: FacingMode) -> Result<Box<dyn CameraDevice>, ScanError> {
        if self.counters.deny.load(Ordering::SeqCst) {
            return Err(ScanError::DeviceUnavailable("Permission denied".into()));
        }
        let n = self.counters.opens.fetch_add(1, Ordering::SeqCst) + 1;
        let held = self.counters.held.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_held.fetch_max(held, Ordering::SeqCst);
        Ok(Box::new(FakeDevice {
            counters: Arc::clone(&self.counters),
            stream: StreamInfo {
                device_id: format!("fake-{}", n),
                label: "Fake Camera".into(),
                width: FRAME_WIDTH,
                height: FRAME_HEIGHT,
                facing,
            },
            stopped: false,
        }))
    }
}

struct FakeDevice {
    counters: Arc<CameraCounters>,
    stream: StreamInfo,
    stopped: bool,
}

impl CameraDevice for FakeDevice {
    fn stream_info(&self) -> StreamInfo {
        self.stream.clone()
    }

    fn start(&mut self) -> Result<(), ScanError> {
        if self.counters.fail_start.load(Ordering::SeqCst) {
            return Err(ScanError::DeviceUnavailable("could not start video source".into()));
        }
        Ok(())
    }

    fn grab_frame(&mut self) -> Result<RgbImage, ScanError> {
        if self.stopped {
            return Err(ScanError::CaptureFailed("device stopped".into()));
        }
        self.counters.grabs.fetch_add(1, Ordering::SeqCst);
        if self.counters.fail_grab.load(Ordering::SeqCst) {
            return Err(ScanError::CaptureFailed("no drawing context".into()));
        }
        Ok(RgbImage::from_pixel(FRAME_WIDTH, FRAME_HEIGHT, Rgb([180, 180, 180])))
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.counters.held.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// -- Preview surface --

#[derive(Default)]
pub struct FakeSurface {
    attached: AtomicUsize,
    detached: AtomicUsize,
    presented: AtomicUsize,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attach_count(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn detach_count(&self) -> usize {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn present_count(&self) -> usize {
        self.presented.load(Ordering::SeqCst)
    }
}

impl PreviewSurface for FakeSurface {
    fn attach(&self, _stream: &StreamInfo) {
        self.attached.fetch_add(1, Ordering::SeqCst);
    }

    fn detach(&self) {
        self.detached.fetch_add(1, Ordering::SeqCst);
    }

    fn present(&self, _frame: &RgbImage) {
        self.presented.fetch_add(1, Ordering::SeqCst);
    }
}

// -- Readers --

type ReadOutcome = Result<Option<Barcode>, ScanError>;

/// Reader that replays a script, then reports nothing found.
#[derive(Default)]
pub struct ScriptedReader {
    script: Mutex<VecDeque<ReadOutcome>>,
    fallback: Mutex<Option<ReadOutcome>>,
    calls: AtomicUsize,
    sizes: Mutex<Vec<(u32, u32)>>,
}

impl ScriptedReader {
    pub fn new(script: Vec<ReadOutcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Default::default()
        })
    }

    /// Reader that finds `text` on every call.
    pub fn always(text: &str) -> Arc<Self> {
        let reader = Self::new(Vec::new());
        *reader.fallback.lock() = Some(Ok(Some(barcode(text))));
        reader
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Raster dimensions seen, in call order.
    pub fn sizes(&self) -> Vec<(u32, u32)> {
        self.sizes.lock().clone()
    }
}

impl BarcodeReader for ScriptedReader {
    fn name(&self) -> &str {
        "scripted"
    }

    fn read(&self, raster: &GrayImage, _capabilities: &Capabilities) -> ReadOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sizes.lock().push(raster.dimensions());
        if let Some(next) = self.script.lock().pop_front() {
            return next;
        }
        self.fallback.lock().clone().unwrap_or(Ok(None))
    }
}

/// Reader that blocks inside `read` until the test releases it.
pub struct GatedReader {
    outcome: ReadOutcome,
    calls: AtomicUsize,
    entered_tx: Mutex<Sender<()>>,
    entered_rx: Mutex<Receiver<()>>,
    release_tx: Mutex<Sender<()>>,
    release_rx: Mutex<Receiver<()>>,
}

impl GatedReader {
    pub fn new(outcome: ReadOutcome) -> Arc<Self> {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            entered_tx: Mutex::new(entered_tx),
            entered_rx: Mutex::new(entered_rx),
            release_tx: Mutex::new(release_tx),
            release_rx: Mutex::new(release_rx),
        })
    }

    pub fn wait_entered(&self, timeout: Duration) -> bool {
        self.entered_rx.lock().recv_timeout(timeout).is_ok()
    }

    pub fn release(&self) {
        let _ = self.release_tx.lock().send(());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BarcodeReader for GatedReader {
    fn name(&self) -> &str {
        "gated"
    }

    fn read(&self, _raster: &GrayImage, _capabilities: &Capabilities) -> ReadOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.entered_tx.lock().send(());
        let _ = self.release_rx.lock().recv_timeout(Duration::from_secs(5));
        self.outcome.clone()
    }
}

// -- Delegate --

#[derive(Default)]
pub struct RecordingDelegate {
    states: Mutex<Vec<ScanState>>,
    errors: Mutex<Vec<ScanError>>,
    outcomes: Mutex<Vec<ScanOutcome>>,
    attempts: AtomicUsize,
}

impl RecordingDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn states(&self) -> Vec<ScanState> {
        self.states.lock().clone()
    }

    pub fn errors(&self) -> Vec<ScanError> {
        self.errors.lock().clone()
    }

    pub fn outcomes(&self) -> Vec<ScanOutcome> {
        self.outcomes.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ScanDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &ScanState) {
        self.states.lock().push(state.clone());
    }

    fn on_attempt(&self, _result: &DecodeResult) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, error: &ScanError) {
        self.errors.lock().push(error.clone());
    }

    fn on_decoded(&self, outcome: &ScanOutcome) {
        self.outcomes.lock().push(outcome.clone());
    }
}
