use crate::models::decode::DecodeResult;
use crate::models::error::ScanError;
use crate::models::outcome::ScanOutcome;
use crate::models::state::ScanState;

/// Event delegate for scan controller notifications.
///
/// Continuous-mode callbacks arrive on the sampling thread, the rest on the
/// thread that invoked the operation. Implementations should marshal to the
/// UI thread if needed. Never called with the controller's lock held.
pub trait ScanDelegate: Send + Sync {
    /// Called when the controller state changes.
    fn on_state_changed(&self, state: &ScanState);

    /// Called after every continuous-mode attempt, including misses.
    fn on_attempt(&self, _result: &DecodeResult) {}

    /// Called when an error is surfaced to the operator.
    fn on_error(&self, error: &ScanError);

    /// Called when an identifier has been acquired from the camera or a file.
    fn on_decoded(&self, outcome: &ScanOutcome);
}
