use std::fmt;
use std::path::PathBuf;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use super::error::ScanError;

/// One-dimensional barcode symbologies a ballot may be printed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symbology {
    Code128,
    Code39,
    Code93,
    Codabar,
    Ean13,
    Ean8,
    UpcA,
    UpcE,
    Interleaved2of5,
    Standard2of5,
}

impl Symbology {
    /// Candidate set tried for ballots; printers are not consistent.
    pub const BALLOT_DEFAULTS: [Symbology; 10] = [
        Symbology::Code128,
        Symbology::Code39,
        Symbology::Ean13,
        Symbology::Ean8,
        Symbology::UpcA,
        Symbology::UpcE,
        Symbology::Codabar,
        Symbology::Interleaved2of5,
        Symbology::Standard2of5,
        Symbology::Code93,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Code128 => "Code 128",
            Self::Code39 => "Code 39",
            Self::Code93 => "Code 93",
            Self::Codabar => "Codabar",
            Self::Ean13 => "EAN-13",
            Self::Ean8 => "EAN-8",
            Self::UpcA => "UPC-A",
            Self::UpcE => "UPC-E",
            Self::Interleaved2of5 => "Interleaved 2 of 5",
            Self::Standard2of5 => "Standard 2 of 5",
        }
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Library-neutral description of what a reader should look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub symbologies: Vec<Symbology>,
    /// Trade latency for detection rate.
    pub try_harder: bool,
}

impl Capabilities {
    pub fn accepts(&self, symbology: Symbology) -> bool {
        self.symbologies.contains(&symbology)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            symbologies: Symbology::BALLOT_DEFAULTS.to_vec(),
            try_harder: true,
        }
    }
}

/// Where the pixels of a still decode come from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// An image file on disk.
    Path(PathBuf),
    /// An encoded image (PNG, JPEG, ...) held in memory, e.g. an upload.
    Bytes(Vec<u8>),
    /// An already-rendered 8-bit grayscale raster.
    Raster(GrayImage),
}

/// A single still-image decode job. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeRequest {
    source: ImageSource,
    capabilities: Capabilities,
    upscale_factor: Option<u32>,
    max_edge: Option<u32>,
}

impl DecodeRequest {
    pub fn new(source: ImageSource, capabilities: Capabilities) -> Self {
        Self {
            source,
            capabilities,
            upscale_factor: None,
            max_edge: None,
        }
    }

    /// Scale the raster up by an integer factor before decoding.
    pub fn with_upscale(mut self, factor: u32) -> Self {
        self.upscale_factor = Some(factor);
        self
    }

    /// Shrink the raster so its longer side is at most `edge` pixels.
    pub fn with_max_edge(mut self, edge: u32) -> Self {
        self.max_edge = Some(edge);
        self
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn upscale_factor(&self) -> Option<u32> {
        self.upscale_factor
    }

    pub fn max_edge(&self) -> Option<u32> {
        self.max_edge
    }
}

/// A barcode reported by a reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub text: String,
    pub symbology: Symbology,
}

/// Outcome of one decode attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    Decoded { text: String, symbology: Symbology },
    Failed { reason: ScanError },
}

impl DecodeResult {
    pub fn failed(reason: ScanError) -> Self {
        Self::Failed { reason }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Decoded { text, .. } => Some(text),
            Self::Failed { .. } => None,
        }
    }
}

impl From<Barcode> for DecodeResult {
    fn from(barcode: Barcode) -> Self {
        Self::Decoded {
            text: barcode.text,
            symbology: barcode.symbology,
        }
    }
}
