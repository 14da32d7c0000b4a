use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::ballot::validator::validate;
use crate::models::config::{CaptureMode, ScanConfiguration};
use crate::models::decode::{DecodeResult, ImageSource};
use crate::models::error::ScanError;
use crate::models::outcome::ScanOutcome;
use crate::models::state::ScanState;
use crate::models::view::ScanView;
use crate::session::camera_manager::{CameraSession, CameraSessionManager};
use crate::session::capture_pipeline::CapturePipeline;
use crate::session::decoder_adapter::AttemptCallback;
use crate::traits::barcode_reader::BarcodeReader;
use crate::traits::camera_provider::CameraProvider;
use crate::traits::preview_surface::PreviewSurface;
use crate::traits::scan_delegate::ScanDelegate;

/// Mutable controller state, protected by `parking_lot::Mutex`.
struct ControllerState {
    state: ScanState,
    acquired: Option<String>,
    last_outcome: Option<ScanOutcome>,
}

/// Delegate notifications collected under the lock, delivered after it.
enum Notice {
    State(ScanState),
    Attempt(DecodeResult),
    Error(ScanError),
    Decoded(ScanOutcome),
}

struct Shared {
    config: ScanConfiguration,
    cameras: CameraSessionManager,
    pipeline: CapturePipeline,
    inner: Mutex<ControllerState>,
    delegate: RwLock<Option<Arc<dyn ScanDelegate>>>,
}

/// Ballot identifier acquisition state machine.
///
/// Owns the camera session manager and the capture pipeline. Every operation
/// takes `&self`; the controller can be shared across threads. Results from a
/// camera session that has since been stopped or replaced are discarded.
///
/// ```text
/// ScanController → CapturePipeline → { CameraSessionManager, DecoderAdapter }
/// ```
pub struct ScanController {
    shared: Arc<Shared>,
}

impl ScanController {
    pub fn new(
        config: ScanConfiguration,
        camera: Arc<dyn CameraProvider>,
        reader: Arc<dyn BarcodeReader>,
    ) -> Result<Self, ScanError> {
        config.validate().map_err(ScanError::ConfigurationFailed)?;

        let cameras = CameraSessionManager::new(camera, config.facing);
        let pipeline = CapturePipeline::new(reader, &config);
        log::debug!(
            "scan controller ready: mode {:?}, {} symbologies, upscale {}x",
            config.mode,
            config.symbologies.len(),
            config.upscale_factor
        );

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                cameras,
                pipeline,
                inner: Mutex::new(ControllerState {
                    state: ScanState::Idle,
                    acquired: None,
                    last_outcome: None,
                }),
                delegate: RwLock::new(None),
            }),
        })
    }

    pub fn set_delegate(&self, delegate: Arc<dyn ScanDelegate>) {
        *self.shared.delegate.write() = Some(delegate);
    }

    pub fn configuration(&self) -> &ScanConfiguration {
        &self.shared.config
    }

    pub fn state(&self) -> ScanState {
        self.shared.inner.lock().state.clone()
    }

    /// What the presentation surface should render right now.
    pub fn view(&self) -> ScanView {
        let inner = self.shared.inner.lock();
        ScanView::compose(&inner.state, inner.acquired.as_deref())
    }

    pub fn last_outcome(&self) -> Option<ScanOutcome> {
        self.shared.inner.lock().last_outcome.clone()
    }

    pub fn has_active_session(&self) -> bool {
        self.shared.cameras.has_active()
    }

    /// Open the camera and bind it to `surface`. Transitions: any → preview_active.
    ///
    /// A live session is closed first. In continuous mode sampling starts
    /// immediately. On failure the state becomes `Error` and nothing stays
    /// acquired.
    pub fn start_camera(&self, surface: Arc<dyn PreviewSurface>) -> Result<(), ScanError> {
        let shared = &self.shared;
        shared.pipeline.stop_continuous();

        let session = match shared.cameras.open(surface) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("failed to start camera: {}", e);
                let mut notices = Vec::new();
                {
                    let mut inner = shared.inner.lock();
                    transition(&mut inner, ScanState::Error(e.friendly_message()), &mut notices);
                }
                notices.push(Notice::Error(e.clone()));
                shared.dispatch(notices);
                return Err(e);
            }
        };

        let mut notices = Vec::new();
        {
            let mut inner = shared.inner.lock();
            if !shared.cameras.is_current(session.generation()) {
                log::debug!("camera session {} superseded while opening", session.id());
                return Ok(());
            }
            inner.acquired = None;
            transition(&mut inner, ScanState::PreviewActive, &mut notices);
        }
        shared.dispatch(notices);

        if shared.config.mode == CaptureMode::Continuous {
            if let Err(e) = self.start_sampling(&session) {
                log::error!("failed to start continuous sampling: {}", e);
                shared.abandon_session(&session, e.clone());
                return Err(e);
            }
        }
        Ok(())
    }

    /// Release the camera. Transitions: preview_active/capturing → idle.
    ///
    /// A settled `decoded` or `error` state is left as is.
    pub fn stop_camera(&self) {
        let shared = &self.shared;
        let mut notices = Vec::new();
        {
            let mut inner = shared.inner.lock();
            shared.cameras.close_active();
            if inner.state.is_preview_active() || inner.state.is_capturing() {
                transition(&mut inner, ScanState::Idle, &mut notices);
            }
        }
        shared.pipeline.stop_continuous();
        shared.dispatch(notices);
    }

    /// Capture one frame from the live session and decode it.
    ///
    /// Returns `Ok(None)` without side effects when no session is open or a
    /// capture is already in flight, and also when the session was stopped
    /// before the decode finished. A failed decode keeps the preview open.
    pub fn capture_and_decode(&self) -> Result<Option<ScanOutcome>, ScanError> {
        let shared = &self.shared;
        let Some(_flight) = shared.pipeline.try_begin() else {
            log::debug!("capture already in flight, ignoring request");
            return Ok(None);
        };

        let mut notices = Vec::new();
        let session = {
            let mut inner = shared.inner.lock();
            let Some(session) = shared.cameras.active() else {
                log::debug!("no camera session open, ignoring capture request");
                return Ok(None);
            };
            transition(&mut inner, ScanState::Capturing, &mut notices);
            session
        };
        shared.dispatch(notices);

        let result = shared.pipeline.capture(&session);

        let mut notices = Vec::new();
        let applied = {
            let mut inner = shared.inner.lock();
            if !shared.cameras.is_current(session.generation()) {
                log::debug!("discarding capture from closed session {}", session.id());
                return Ok(None);
            }
            shared.apply_camera_result(&mut inner, &session, result, &mut notices)
        };
        if applied.is_ok() && !shared.cameras.has_active() {
            shared.pipeline.stop_continuous();
        }
        shared.dispatch(notices);
        applied
    }

    /// Decode an uploaded image. Transitions: any → decoded/error.
    ///
    /// The camera session, if any, is not touched.
    pub fn decode_from_file(&self, source: ImageSource) -> Result<ScanOutcome, ScanError> {
        let shared = &self.shared;
        let result = shared.pipeline.decode_still(source);

        let mut notices = Vec::new();
        let applied = {
            let mut inner = shared.inner.lock();
            match result {
                DecodeResult::Decoded { text, symbology } => {
                    let outcome = ScanOutcome::from_file(&text, symbology);
                    log::info!("decoded {} from file ({})", text, symbology);
                    inner.acquired = Some(text.clone());
                    inner.last_outcome = Some(outcome.clone());
                    transition(&mut inner, ScanState::Decoded(text), &mut notices);
                    notices.push(Notice::Decoded(outcome.clone()));
                    Ok(outcome)
                }
                DecodeResult::Failed { reason } => {
                    log::warn!("file decode failed: {}", reason);
                    transition(&mut inner, ScanState::Error(reason.friendly_message()), &mut notices);
                    notices.push(Notice::Error(reason.clone()));
                    Err(reason)
                }
            }
        };
        shared.dispatch(notices);
        applied
    }

    /// Replace the acquired text with operator input.
    ///
    /// A valid identifier becomes the last outcome, tagged as manual entry;
    /// anything else clears it. Leaves a settled `decoded` / `error` state for
    /// `preview_active` when a camera session is still open, `idle` otherwise.
    /// In continuous mode the preview goes back to sampling.
    pub fn edit_text(&self, text: &str) {
        let shared = &self.shared;
        let mut notices = Vec::new();
        let resume = {
            let mut inner = shared.inner.lock();
            inner.acquired = (!text.is_empty()).then(|| text.to_string());
            inner.last_outcome = match validate(text) {
                Ok(id) => Some(ScanOutcome::manual(&id.to_string())),
                Err(e) => {
                    log::trace!("typed text is not an identifier: {}", e);
                    None
                }
            };

            let mut resume = None;
            if inner.state.is_settled() {
                let active = shared.cameras.active();
                let next = if active.is_some() {
                    ScanState::PreviewActive
                } else {
                    ScanState::Idle
                };
                transition(&mut inner, next, &mut notices);
                if shared.config.mode == CaptureMode::Continuous && !shared.pipeline.is_sampling() {
                    resume = active;
                }
            }
            resume
        };
        shared.dispatch(notices);

        if let Some(session) = resume {
            log::debug!("resuming continuous sampling on session {}", session.id());
            if let Err(e) = self.start_sampling(&session) {
                log::error!("failed to resume continuous sampling: {}", e);
                shared.abandon_session(&session, e);
            }
        }
    }

    fn start_sampling(&self, session: &Arc<CameraSession>) -> Result<(), ScanError> {
        let weak: Weak<Shared> = Arc::downgrade(&self.shared);
        let sampled = Arc::clone(session);
        let on_attempt: AttemptCallback = Arc::new(move |result: &DecodeResult| {
            if let Some(shared) = weak.upgrade() {
                shared.handle_sampled(&sampled, result);
            }
        });
        self.shared.pipeline.start_continuous(Arc::clone(session), on_attempt)
    }
}

impl Shared {
    /// Apply one continuous-mode attempt. Runs on the sampler thread.
    fn handle_sampled(&self, session: &CameraSession, result: &DecodeResult) {
        let mut notices = Vec::new();
        {
            let mut inner = self.inner.lock();
            if !self.cameras.is_current(session.generation()) {
                log::debug!("discarding sampled result from closed session {}", session.id());
                return;
            }
            notices.push(Notice::Attempt(result.clone()));

            match result {
                DecodeResult::Failed { reason } if reason.is_no_barcode() => {}
                DecodeResult::Failed { reason: ScanError::DeviceUnavailable(_) } => {
                    self.cameras.close(session);
                    let _ = self.apply_camera_result(&mut inner, session, result.clone(), &mut notices);
                }
                DecodeResult::Failed { reason } => {
                    let message = reason.friendly_message();
                    if inner.state.error_message() != Some(message.as_str()) {
                        transition(&mut inner, ScanState::Error(message), &mut notices);
                        notices.push(Notice::Error(reason.clone()));
                    }
                }
                DecodeResult::Decoded { .. } => {
                    let _ = self.apply_camera_result(&mut inner, session, result.clone(), &mut notices);
                }
            }
        }
        self.dispatch(notices);
    }

    /// Fold a camera decode into the state. Caller holds the state lock and
    /// has checked that `session` is still current.
    fn apply_camera_result(
        &self,
        inner: &mut ControllerState,
        session: &CameraSession,
        result: DecodeResult,
        notices: &mut Vec<Notice>,
    ) -> Result<Option<ScanOutcome>, ScanError> {
        match result {
            DecodeResult::Decoded { text, symbology } => {
                let outcome = ScanOutcome::from_camera(&text, symbology, session.id());
                log::info!("decoded {} from camera ({})", text, symbology);
                if self.config.close_on_decode {
                    self.cameras.close(session);
                }
                inner.acquired = Some(text.clone());
                inner.last_outcome = Some(outcome.clone());
                transition(inner, ScanState::Decoded(text), notices);
                notices.push(Notice::Decoded(outcome.clone()));
                Ok(Some(outcome))
            }
            DecodeResult::Failed { reason } => {
                log::warn!("camera decode failed: {}", reason);
                transition(inner, ScanState::Error(reason.friendly_message()), notices);
                notices.push(Notice::Error(reason.clone()));
                Err(reason)
            }
        }
    }

    /// Close `session` and surface `error` after sampling could not start.
    fn abandon_session(&self, session: &CameraSession, error: ScanError) {
        let mut notices = Vec::new();
        {
            let mut inner = self.inner.lock();
            self.cameras.close(session);
            transition(&mut inner, ScanState::Error(error.friendly_message()), &mut notices);
        }
        notices.push(Notice::Error(error));
        self.dispatch(notices);
    }

    fn dispatch(&self, notices: Vec<Notice>) {
        if notices.is_empty() {
            return;
        }
        let Some(delegate) = self.delegate.read().clone() else {
            return;
        };
        for notice in notices {
            match notice {
                Notice::State(state) => delegate.on_state_changed(&state),
                Notice::Attempt(result) => delegate.on_attempt(&result),
                Notice::Error(error) => delegate.on_error(&error),
                Notice::Decoded(outcome) => delegate.on_decoded(&outcome),
            }
        }
    }
}

fn transition(inner: &mut ControllerState, next: ScanState, notices: &mut Vec<Notice>) {
    if inner.state == next {
        return;
    }
    log::info!("scan state: {:?} → {:?}", inner.state, next);
    inner.state = next.clone();
    notices.push(Notice::State(next));
}

impl Drop for ScanController {
    fn drop(&mut self) {
        self.stop_camera();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use image::{GrayImage, Luma};

    use super::*;
    use crate::models::messages;
    use crate::models::outcome::AcquisitionSource;
    use crate::testing::{
        barcode, wait_until, FakeCamera, FakeSurface, GatedReader, RecordingDelegate, ScriptedReader,
    };

    const WAIT: Duration = Duration::from_secs(2);

    fn config() -> ScanConfiguration {
        ScanConfiguration {
            try_harder: false,
            frame_interval_ms: 1,
            ..Default::default()
        }
    }

    fn continuous() -> ScanConfiguration {
        ScanConfiguration {
            mode: CaptureMode::Continuous,
            ..config()
        }
    }

    fn controller(
        config: ScanConfiguration,
        camera: &FakeCamera,
        reader: Arc<dyn BarcodeReader>,
    ) -> (ScanController, Arc<RecordingDelegate>) {
        let controller = ScanController::new(config, camera.provider(), reader).unwrap();
        let delegate = RecordingDelegate::new();
        controller.set_delegate(delegate.clone());
        (controller, delegate)
    }

    fn photo() -> ImageSource {
        ImageSource::Raster(GrayImage::from_pixel(200, 80, Luma([255])))
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let config = ScanConfiguration {
            upscale_factor: 9,
            ..Default::default()
        };
        let result = ScanController::new(config, FakeCamera::new().provider(), ScriptedReader::new(Vec::new()));
        assert!(matches!(result, Err(ScanError::ConfigurationFailed(_))));
    }

    #[test]
    fn start_and_stop_camera() {
        let camera = FakeCamera::new();
        let (controller, delegate) = controller(config(), &camera, ScriptedReader::new(Vec::new()));

        controller.start_camera(FakeSurface::new()).unwrap();
        assert_eq!(controller.state(), ScanState::PreviewActive);
        assert!(controller.has_active_session());

        controller.stop_camera();
        assert_eq!(controller.state(), ScanState::Idle);
        assert!(!controller.has_active_session());
        assert_eq!(camera.held(), 0);
        assert_eq!(delegate.states(), vec![ScanState::PreviewActive, ScanState::Idle]);
    }

    #[test]
    fn camera_failure_sets_friendly_error() {
        let camera = FakeCamera::new().deny_permission();
        let (controller, delegate) = controller(config(), &camera, ScriptedReader::new(Vec::new()));

        let err = controller.start_camera(FakeSurface::new()).unwrap_err();

        assert!(matches!(err, ScanError::DeviceUnavailable(_)));
        assert_eq!(controller.state(), ScanState::Error(messages::CAMERA_UNAVAILABLE.into()));
        assert_eq!(controller.view().error_message.as_deref(), Some(messages::CAMERA_UNAVAILABLE));
        assert_eq!(delegate.errors().len(), 1);
        assert!(!controller.has_active_session());
    }

    #[test]
    fn capture_decodes_and_closes_session() {
        let camera = FakeCamera::new();
        let surface = FakeSurface::new();
        let (controller, delegate) = controller(config(), &camera, ScriptedReader::always("A0000025"));
        controller.start_camera(surface.clone()).unwrap();

        let outcome = controller.capture_and_decode().unwrap().unwrap();

        assert_eq!(outcome.text, "A0000025");
        assert_eq!(outcome.source, AcquisitionSource::Camera);
        assert_eq!(controller.state(), ScanState::Decoded("A0000025".into()));
        assert_eq!(controller.view().computed_result.as_deref(), Some("เล่มที่ : A0000002"));
        assert_eq!(controller.last_outcome(), Some(outcome));
        assert!(!controller.has_active_session());
        assert_eq!(camera.held(), 0);
        assert_eq!(surface.detach_count(), 1);
        assert_eq!(
            delegate.states(),
            vec![
                ScanState::PreviewActive,
                ScanState::Capturing,
                ScanState::Decoded("A0000025".into())
            ]
        );
        assert_eq!(delegate.outcomes().len(), 1);
    }

    #[test]
    fn failed_capture_keeps_preview_open() {
        let camera = FakeCamera::new();
        let reader = ScriptedReader::new(vec![Ok(None), Ok(Some(barcode("B40")))]);
        let (controller, _delegate) = controller(config(), &camera, reader);
        controller.start_camera(FakeSurface::new()).unwrap();

        let err = controller.capture_and_decode().unwrap_err();
        assert_eq!(err, ScanError::NoBarcodeDetected);
        assert_eq!(controller.state(), ScanState::Error(messages::NO_BARCODE_FOUND.into()));
        assert!(controller.has_active_session());

        let outcome = controller.capture_and_decode().unwrap().unwrap();
        assert_eq!(outcome.text, "B40");
    }

    #[test]
    fn capture_without_session_is_a_no_op() {
        let camera = FakeCamera::new();
        let reader = ScriptedReader::always("A1");
        let (controller, delegate) = controller(config(), &camera, reader.clone());

        assert_eq!(controller.capture_and_decode(), Ok(None));
        assert_eq!(controller.state(), ScanState::Idle);
        assert_eq!(reader.calls(), 0);
        assert!(delegate.states().is_empty());
    }

    #[test]
    fn concurrent_capture_is_single_flight() {
        let camera = FakeCamera::new();
        let reader = GatedReader::new(Ok(Some(barcode("A0000001"))));
        let (controller, _delegate) = controller(config(), &camera, reader.clone());
        controller.start_camera(FakeSurface::new()).unwrap();

        thread::scope(|s| {
            let first = s.spawn(|| controller.capture_and_decode());
            assert!(reader.wait_entered(WAIT));

            assert_eq!(controller.capture_and_decode(), Ok(None));
            assert_eq!(controller.state(), ScanState::Capturing);

            reader.release();
            let outcome = first.join().unwrap().unwrap().unwrap();
            assert_eq!(outcome.text, "A0000001");
        });

        assert_eq!(reader.calls(), 1);
        assert_eq!(camera.grabs(), 1);
    }

    #[test]
    fn capture_finishing_after_stop_is_discarded() {
        let camera = FakeCamera::new();
        let reader = GatedReader::new(Ok(Some(barcode("A0000001"))));
        let (controller, delegate) = controller(config(), &camera, reader.clone());
        controller.start_camera(FakeSurface::new()).unwrap();

        thread::scope(|s| {
            let capture = s.spawn(|| controller.capture_and_decode());
            assert!(reader.wait_entered(WAIT));

            controller.stop_camera();
            reader.release();
            assert_eq!(capture.join().unwrap(), Ok(None));
        });

        assert_eq!(controller.state(), ScanState::Idle);
        assert_eq!(controller.last_outcome(), None);
        assert!(delegate.outcomes().is_empty());
    }

    #[test]
    fn restarting_camera_never_holds_two_devices() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(continuous(), &camera, ScriptedReader::new(Vec::new()));

        controller.start_camera(FakeSurface::new()).unwrap();
        controller.stop_camera();
        controller.start_camera(FakeSurface::new()).unwrap();
        controller.start_camera(FakeSurface::new()).unwrap();

        assert_eq!(camera.max_held(), 1);
        assert_eq!(camera.held(), 1);
        assert_eq!(camera.opens(), 3);

        controller.stop_camera();
        assert_eq!(camera.held(), 0);
    }

    #[test]
    fn continuous_first_hit_stops_sampling_and_closes_session() {
        let camera = FakeCamera::new();
        let reader = ScriptedReader::new(vec![Ok(None), Ok(None), Ok(Some(barcode("A0000040")))]);
        let (controller, delegate) = controller(continuous(), &camera, reader.clone());

        controller.start_camera(FakeSurface::new()).unwrap();
        assert!(wait_until(WAIT, || !delegate.outcomes().is_empty()));

        assert_eq!(controller.state(), ScanState::Decoded("A0000040".into()));
        assert_eq!(controller.view().computed_result.as_deref(), Some("เล่มที่ : A0000003"));
        assert!(!controller.has_active_session());
        assert_eq!(delegate.attempts(), 3);
        assert_eq!(delegate.outcomes().len(), 1);

        thread::sleep(Duration::from_millis(20));
        assert_eq!(reader.calls(), 3);
        assert_eq!(camera.held(), 0);
    }

    #[test]
    fn continuous_result_after_stop_is_discarded() {
        let camera = FakeCamera::new();
        let reader = GatedReader::new(Ok(Some(barcode("A0000001"))));
        let (controller, delegate) = controller(continuous(), &camera, reader.clone());
        controller.start_camera(FakeSurface::new()).unwrap();
        assert!(reader.wait_entered(WAIT));

        thread::scope(|s| {
            // Joins the sampler, which is parked inside the reader.
            let stopper = s.spawn(|| controller.stop_camera());
            assert!(wait_until(WAIT, || controller.state().is_idle()));
            reader.release();
            stopper.join().unwrap();
        });

        assert_eq!(controller.state(), ScanState::Idle);
        assert_eq!(controller.last_outcome(), None);
        assert!(delegate.outcomes().is_empty());
        assert_eq!(delegate.attempts(), 0);
        assert_eq!(camera.held(), 0);
    }

    #[test]
    fn continuous_keeps_session_when_configured() {
        let camera = FakeCamera::new();
        let config = ScanConfiguration {
            close_on_decode: false,
            ..continuous()
        };
        let reader = ScriptedReader::new(vec![Ok(Some(barcode("A0000001")))]);
        let (controller, _delegate) = controller(config, &camera, reader);

        controller.start_camera(FakeSurface::new()).unwrap();
        assert!(wait_until(WAIT, || controller.state().is_settled()));
        assert!(controller.has_active_session());

        controller.edit_text("A0000021");
        assert_eq!(controller.state(), ScanState::PreviewActive);
        assert_eq!(controller.view().computed_result.as_deref(), Some("เล่มที่ : A0000002"));
    }

    #[test]
    fn editing_after_a_hit_resumes_sampling_on_open_session() {
        let camera = FakeCamera::new();
        let config = ScanConfiguration {
            close_on_decode: false,
            ..continuous()
        };
        let reader = ScriptedReader::new(vec![
            Ok(Some(barcode("A0000001"))),
            Ok(None),
            Ok(Some(barcode("A0000041"))),
        ]);
        let (controller, delegate) = controller(config, &camera, reader.clone());

        controller.start_camera(FakeSurface::new()).unwrap();
        assert!(wait_until(WAIT, || delegate.outcomes().len() == 1));
        assert_eq!(reader.calls(), 1);

        controller.edit_text("");
        assert!(wait_until(WAIT, || delegate.outcomes().len() == 2));

        assert_eq!(controller.state(), ScanState::Decoded("A0000041".into()));
        assert_eq!(reader.calls(), 3);
        assert!(controller.has_active_session());
        assert_eq!(camera.max_held(), 1);

        controller.stop_camera();
        assert_eq!(camera.held(), 0);
    }

    #[test]
    fn single_shot_edit_does_not_start_sampling() {
        let camera = FakeCamera::new();
        let config = ScanConfiguration {
            close_on_decode: false,
            ..config()
        };
        let reader = ScriptedReader::always("A0000001");
        let (controller, _delegate) = controller(config, &camera, reader.clone());
        controller.start_camera(FakeSurface::new()).unwrap();
        controller.capture_and_decode().unwrap().unwrap();

        controller.edit_text("");
        thread::sleep(Duration::from_millis(20));

        assert_eq!(controller.state(), ScanState::PreviewActive);
        assert_eq!(reader.calls(), 1);
    }

    #[test]
    fn typed_identifier_replaces_camera_outcome() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(config(), &camera, ScriptedReader::always("A0000025"));
        controller.start_camera(FakeSurface::new()).unwrap();
        controller.capture_and_decode().unwrap().unwrap();

        controller.edit_text(" A0000021 ");
        let outcome = controller.last_outcome().unwrap();
        assert_eq!(outcome.source, AcquisitionSource::Manual);
        assert_eq!(outcome.text, "A0000021");
        assert_eq!(outcome.symbology, None);
        assert_eq!(outcome.session_id, None);

        controller.edit_text("A12B");
        assert_eq!(controller.last_outcome(), None);
    }

    #[test]
    fn file_decode_leaves_camera_alone() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(config(), &camera, ScriptedReader::always("C0000019"));
        controller.start_camera(FakeSurface::new()).unwrap();

        let outcome = controller.decode_from_file(photo()).unwrap();

        assert_eq!(outcome.source, AcquisitionSource::File);
        assert_eq!(outcome.session_id, None);
        assert_eq!(controller.state(), ScanState::Decoded("C0000019".into()));
        assert!(controller.has_active_session());
        assert_eq!(camera.held(), 1);
        assert_eq!(camera.grabs(), 0);
    }

    #[test]
    fn unreadable_file_sets_friendly_error() {
        let camera = FakeCamera::new();
        let (controller, delegate) = controller(config(), &camera, ScriptedReader::always("A1"));

        let err = controller
            .decode_from_file(ImageSource::Bytes(b"definitely not a jpeg".to_vec()))
            .unwrap_err();

        assert!(matches!(err, ScanError::UnreadableImage(_)));
        assert_eq!(controller.state(), ScanState::Error(messages::UNREADABLE_IMAGE.into()));
        assert_eq!(delegate.errors(), vec![err]);
    }

    #[test]
    fn not_found_decoder_text_shows_one_phrase() {
        let camera = FakeCamera::new();
        let reader = ScriptedReader::new(vec![Err(ScanError::DecoderFailed(
            "No MultiFormat Readers were able to detect the code.".into(),
        ))]);
        let (controller, _delegate) = controller(config(), &camera, reader);

        let err = controller.decode_from_file(photo()).unwrap_err();

        assert_eq!(err, ScanError::NoBarcodeDetected);
        assert_eq!(controller.view().error_message.as_deref(), Some(messages::NO_BARCODE_FOUND));
    }

    #[test]
    fn edit_text_clears_error() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(config(), &camera, ScriptedReader::new(Vec::new()));
        assert!(controller.decode_from_file(photo()).is_err());

        controller.edit_text("A0000025");

        assert_eq!(controller.state(), ScanState::Idle);
        let view = controller.view();
        assert_eq!(view.error_message, None);
        assert_eq!(view.computed_result.as_deref(), Some("เล่มที่ : A0000002"));
    }

    #[test]
    fn invalid_typed_text_shows_validator_message() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(config(), &camera, ScriptedReader::new(Vec::new()));

        controller.edit_text("A12B");
        assert_eq!(controller.view().error_message.as_deref(), Some(messages::IDENTIFIER_MALFORMED));

        controller.edit_text("");
        assert_eq!(controller.view(), ScanView::default());
    }

    #[test]
    fn start_camera_clears_previous_text() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(config(), &camera, ScriptedReader::new(Vec::new()));
        controller.edit_text("A0000001");

        controller.start_camera(FakeSurface::new()).unwrap();

        assert_eq!(controller.view().acquired_text, None);
    }

    #[test]
    fn dropping_controller_releases_camera() {
        let camera = FakeCamera::new();
        let (controller, _delegate) = controller(continuous(), &camera, ScriptedReader::new(Vec::new()));
        controller.start_camera(FakeSurface::new()).unwrap();
        assert!(wait_until(WAIT, || camera.grabs() >= 1));

        drop(controller);

        assert_eq!(camera.held(), 0);
    }
}
