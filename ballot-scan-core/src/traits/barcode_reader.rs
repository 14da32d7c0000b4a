use image::GrayImage;

use crate::models::decode::{Barcode, Capabilities};
use crate::models::error::ScanError;

/// Opaque 1D barcode recognition capability.
///
/// Implemented by:
/// - `RxingReader` (ballot-scan-native, feature `rxing`)
/// - test doubles in this crate
pub trait BarcodeReader: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Attempt one decode of `raster`.
    ///
    /// `Ok(None)` means nothing was found, which is the ordinary outcome for
    /// most live frames. Library errors go in `ScanError::DecoderFailed` with
    /// their raw text; known "not found" texts are folded back into a miss
    /// by the caller.
    fn read(&self, raster: &GrayImage, capabilities: &Capabilities) -> Result<Option<Barcode>, ScanError>;
}
