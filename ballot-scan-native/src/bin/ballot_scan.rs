//! Command-line ballot identifier scanner.
//!
//! Resolves a ballot identifier typed on the command line, read from a photo,
//! or scanned from a camera, and prints the ballot book it belongs to.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;
use parking_lot::Mutex;
use thiserror::Error;

use ballot_scan_core::{
    validate, BarcodeReader, CameraProvider, CaptureMode, ImageSource, ScanConfiguration, ScanController,
    ScanDelegate, ScanError, ScanOutcome, ScanState, ScanView,
};

/// Resolve a ballot identifier to its ballot book
#[derive(Parser)]
#[command(name = "ballot-scan")]
#[command(version)]
#[command(about = "Resolve a ballot identifier to its ballot book", long_about = None)]
struct Args {
    /// Identifier typed by the operator, e.g. A0000025
    #[arg(long, conflicts_with_all = ["image", "camera"])]
    id: Option<String>,

    /// Photo of the ballot barcode
    #[arg(long, conflicts_with = "camera")]
    image: Option<PathBuf>,

    /// Scan from the camera
    #[arg(long)]
    camera: bool,

    /// Sample frames until the first decode instead of single shots
    #[arg(long, requires = "camera")]
    continuous: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Give up on the camera after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Print the view as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{}", .0.friendly_message())]
    Scan(#[from] ScanError),

    #[error("{0} support was not compiled in; rebuild with --features {0}")]
    MissingBackend(&'static str),

    #[error("no barcode read within {0} seconds")]
    TimedOut(u64),

    #[error("failed to encode view: {0}")]
    Json(#[from] serde_json::Error),

    #[error("nothing to do; pass --id, --image or --camera")]
    NoInput,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(view) => match print_view(&view, args.json) {
            Ok(()) if view.computed_result.is_some() => ExitCode::SUCCESS,
            Ok(()) => ExitCode::FAILURE,
            Err(e) => fail(&e),
        },
        Err(e) => fail(&e),
    }
}

fn fail(error: &CliError) -> ExitCode {
    if let CliError::Scan(inner) = error {
        log::error!("{}", inner);
    }
    eprintln!("{}", error);
    ExitCode::FAILURE
}

fn run(args: &Args) -> Result<ScanView, CliError> {
    let mut config = match &args.config {
        Some(path) => ScanConfiguration::from_path(path)?,
        None => ScanConfiguration::default(),
    };
    if args.continuous {
        config.mode = CaptureMode::Continuous;
    }

    if let Some(id) = &args.id {
        return Ok(resolve_typed(id)?);
    }

    let controller = ScanController::new(config, camera_provider()?, barcode_reader()?)?;

    if let Some(path) = &args.image {
        // A failed decode still leaves a view to print.
        if let Err(e) = controller.decode_from_file(ImageSource::Path(path.clone())) {
            log::warn!("{}: {}", path.display(), e);
        }
        return Ok(controller.view());
    }

    if args.camera {
        let timeout = Duration::from_secs(args.timeout);
        let outcome = match controller.configuration().mode {
            CaptureMode::Continuous => scan_continuous(&controller, timeout)?,
            CaptureMode::SingleShot => scan_single_shot(&controller, timeout)?,
        };
        log::info!("acquired {} from camera at {}", outcome.text, outcome.decoded_at);
        return Ok(controller.view());
    }

    Err(CliError::NoInput)
}

/// View for an identifier typed on the command line.
fn resolve_typed(id: &str) -> Result<ScanView, ScanError> {
    validate(id)?;
    Ok(ScanView::compose(&ScanState::Idle, Some(id.trim())))
}

/// Retry single-shot captures until one decodes.
fn scan_single_shot(controller: &ScanController, timeout: Duration) -> Result<ScanOutcome, CliError> {
    controller.start_camera(Arc::new(ballot_scan_native::LoggingSurface::new()))?;
    let interval = controller.configuration().frame_interval();
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        match controller.capture_and_decode() {
            Ok(Some(outcome)) => return Ok(outcome),
            Ok(None) => {}
            Err(ScanError::DeviceUnavailable(reason)) => {
                return Err(ScanError::DeviceUnavailable(reason).into());
            }
            Err(e) => log::debug!("capture attempt failed: {}", e),
        }
        thread::sleep(interval);
    }
    controller.stop_camera();
    Err(CliError::TimedOut(timeout.as_secs()))
}

/// Let the sampler run and wait for its first hit.
fn scan_continuous(controller: &ScanController, timeout: Duration) -> Result<ScanOutcome, CliError> {
    let (tx, rx) = mpsc::channel();
    controller.set_delegate(Arc::new(ChannelDelegate { tx: Mutex::new(tx) }));
    controller.start_camera(Arc::new(ballot_scan_native::LoggingSurface::new()))?;

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(Ok(outcome)) => return Ok(outcome),
            Ok(Err(ScanError::DeviceUnavailable(reason))) => {
                return Err(ScanError::DeviceUnavailable(reason).into());
            }
            Ok(Err(e)) => log::debug!("sampled frame failed: {}", e),
            Err(_) => {
                controller.stop_camera();
                return Err(CliError::TimedOut(timeout.as_secs()));
            }
        }
    }
}

fn print_view(view: &ScanView, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }
    if let Some(text) = &view.acquired_text {
        println!("{}", text);
    }
    if let Some(book) = &view.computed_result {
        println!("{}", book);
    }
    if let Some(message) = &view.error_message {
        eprintln!("{}", message);
    }
    Ok(())
}

/// Forwards decoded outcomes and surfaced errors to the waiting CLI thread.
struct ChannelDelegate {
    tx: Mutex<mpsc::Sender<Result<ScanOutcome, ScanError>>>,
}

impl ScanDelegate for ChannelDelegate {
    fn on_state_changed(&self, state: &ScanState) {
        log::debug!("state: {:?}", state);
    }

    fn on_error(&self, error: &ScanError) {
        let _ = self.tx.lock().send(Err(error.clone()));
    }

    fn on_decoded(&self, outcome: &ScanOutcome) {
        let _ = self.tx.lock().send(Ok(outcome.clone()));
    }
}

#[cfg(feature = "nokhwa")]
fn camera_provider() -> Result<Arc<dyn CameraProvider>, CliError> {
    Ok(Arc::new(ballot_scan_native::NokhwaCameraProvider::new()))
}

#[cfg(not(feature = "nokhwa"))]
fn camera_provider() -> Result<Arc<dyn CameraProvider>, CliError> {
    Ok(Arc::new(NoCamera))
}

/// Stand-in provider for builds without a camera backend.
#[cfg(not(feature = "nokhwa"))]
struct NoCamera;

#[cfg(not(feature = "nokhwa"))]
impl CameraProvider for NoCamera {
    fn is_available(&self) -> bool {
        false
    }

    fn open(
        &self,
        _facing: ballot_scan_core::FacingMode,
    ) -> Result<Box<dyn ballot_scan_core::CameraDevice>, ScanError> {
        Err(ScanError::DeviceUnavailable(
            "built without a camera backend (enable feature nokhwa)".into(),
        ))
    }
}

#[cfg(feature = "rxing")]
fn barcode_reader() -> Result<Arc<dyn BarcodeReader>, CliError> {
    Ok(Arc::new(ballot_scan_native::RxingReader::new()))
}

#[cfg(not(feature = "rxing"))]
fn barcode_reader() -> Result<Arc<dyn BarcodeReader>, CliError> {
    Err(CliError::MissingBackend("rxing"))
}
