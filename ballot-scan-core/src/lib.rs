//! # ballot-scan-core
//!
//! Platform-agnostic ballot barcode acquisition.
//!
//! Turns a printed ballot identifier into text from one of three sources
//! (manual entry, an uploaded photo, or a live camera) and maps that text to
//! the ballot book it belongs to. Platform backends (camera devices, barcode
//! recognition libraries) implement the `CameraProvider` and `BarcodeReader`
//! traits and plug into the generic `ScanController`.
//!
//! ## Architecture
//!
//! ```text
//! ballot-scan-core (this crate)
//! ├── ballot/       ← identifier validation, book-number arithmetic
//! ├── models/       ← ScanError, ScanState, ScanConfiguration, DecodeRequest, ScanView, etc.
//! ├── processing/   ← frame-to-raster rendering, upscaling, contrast passes
//! ├── session/      ← DecoderAdapter, CameraSessionManager, CapturePipeline, ScanController
//! └── traits/       ← BarcodeReader, CameraProvider, PreviewSurface, ScanDelegate
//! ```
//!
//! Control flows one way only:
//!
//! ```text
//! ScanController → CapturePipeline → { CameraSessionManager, DecoderAdapter }
//! ```

pub mod ballot;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use ballot::book::{book_id_for, BOOK_SIZE};
pub use ballot::validator::{validate, BallotId, IdentifierError};
pub use models::camera::{FacingMode, StreamInfo};
pub use models::config::{CaptureMode, ScanConfiguration};
pub use models::decode::{Barcode, Capabilities, DecodeRequest, DecodeResult, ImageSource, Symbology};
pub use models::error::ScanError;
pub use models::outcome::{AcquisitionSource, ScanOutcome};
pub use models::state::ScanState;
pub use models::view::ScanView;
pub use session::camera_manager::{CameraSession, CameraSessionManager};
pub use session::capture_pipeline::CapturePipeline;
pub use session::controller::ScanController;
pub use session::decoder_adapter::{AttemptCallback, DecoderAdapter, Subscription};
pub use traits::barcode_reader::BarcodeReader;
pub use traits::camera_provider::{CameraDevice, CameraProvider};
pub use traits::preview_surface::PreviewSurface;
pub use traits::scan_delegate::ScanDelegate;
