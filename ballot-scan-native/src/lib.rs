//! # ballot-scan-native
//!
//! Native backends for ballot-scan.
//!
//! Provides:
//! - `RxingReader`: 1D barcode recognition via rxing (feature `rxing`)
//! - `NokhwaCameraProvider`: camera capture via nokhwa (feature `nokhwa`)
//! - `LoggingSurface`: headless preview surface that logs stream events
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use ballot_scan_core::{ScanConfiguration, ScanController};
//! use ballot_scan_native::{LoggingSurface, NokhwaCameraProvider, RxingReader};
//!
//! let controller = ScanController::new(
//!     ScanConfiguration::default(),
//!     Arc::new(NokhwaCameraProvider::new()),
//!     Arc::new(RxingReader::new()),
//! )?;
//! controller.start_camera(Arc::new(LoggingSurface::new()))?;
//! let outcome = controller.capture_and_decode()?;
//! ```

pub mod preview;

#[cfg(feature = "nokhwa")]
pub mod nokhwa_camera;
#[cfg(feature = "rxing")]
pub mod rxing_reader;

pub use preview::LoggingSurface;

#[cfg(feature = "nokhwa")]
pub use nokhwa_camera::NokhwaCameraProvider;
#[cfg(feature = "rxing")]
pub use rxing_reader::RxingReader;
