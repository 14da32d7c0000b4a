//! 1D barcode recognition backed by rxing, a Rust port of ZXing.
//!
//! rxing has no Standard 2 of 5 reader; that symbology is dropped from the
//! hints and never reported.

use std::collections::HashSet;

use image::GrayImage;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintValue, DecodeHints, Exceptions, Luma8LuminanceSource,
    MultiFormatReader, Reader,
};

use ballot_scan_core::models::decode::{Barcode, Capabilities, Symbology};
use ballot_scan_core::models::error::ScanError;
use ballot_scan_core::traits::barcode_reader::BarcodeReader;

/// rxing multi-format reader over a hybrid-binarized luminance raster.
#[derive(Debug, Default)]
pub struct RxingReader;

impl RxingReader {
    pub fn new() -> Self {
        Self
    }
}

impl BarcodeReader for RxingReader {
    fn name(&self) -> &str {
        "rxing"
    }

    fn read(&self, raster: &GrayImage, capabilities: &Capabilities) -> Result<Option<Barcode>, ScanError> {
        let formats = possible_formats(&capabilities.symbologies);
        if formats.is_empty() {
            log::debug!("no configured symbology is readable by rxing");
            return Ok(None);
        }
        let hints = DecodeHints::default()
            .with(DecodeHintValue::PossibleFormats(formats))
            .with(DecodeHintValue::TryHarder(capabilities.try_harder));

        let (width, height) = raster.dimensions();
        let source = Luma8LuminanceSource::new(raster.as_raw().clone(), width, height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(source));
        let mut reader = MultiFormatReader::default();

        match reader.decode_with_hints(&mut bitmap, &hints) {
            Ok(result) => {
                let format = result.getBarcodeFormat();
                let Some(symbology) = symbology_for(format) else {
                    log::debug!("rxing found unsupported format {:?}", format);
                    return Ok(None);
                };
                Ok(Some(Barcode {
                    text: result.getText().to_string(),
                    symbology,
                }))
            }
            Err(Exceptions::NotFoundException(_)) => Ok(None),
            Err(e) if is_partial_read(&e) => {
                log::trace!("rxing partial read: {:?}", e);
                Ok(None)
            }
            Err(e) => Err(ScanError::DecoderFailed(format!("{:?}", e))),
        }
    }
}

/// A symbol was located but its payload did not verify.
fn is_partial_read(error: &Exceptions) -> bool {
    matches!(
        error,
        Exceptions::FormatException(_) | Exceptions::ChecksumException(_)
    )
}

fn possible_formats(symbologies: &[Symbology]) -> HashSet<BarcodeFormat> {
    symbologies.iter().copied().filter_map(format_for).collect()
}

fn format_for(symbology: Symbology) -> Option<BarcodeFormat> {
    match symbology {
        Symbology::Code128 => Some(BarcodeFormat::CODE_128),
        Symbology::Code39 => Some(BarcodeFormat::CODE_39),
        Symbology::Code93 => Some(BarcodeFormat::CODE_93),
        Symbology::Codabar => Some(BarcodeFormat::CODABAR),
        Symbology::Ean8 => Some(BarcodeFormat::EAN_8),
        Symbology::Ean13 => Some(BarcodeFormat::EAN_13),
        Symbology::Interleaved2of5 => Some(BarcodeFormat::ITF),
        Symbology::UpcA => Some(BarcodeFormat::UPC_A),
        Symbology::UpcE => Some(BarcodeFormat::UPC_E),
        Symbology::Standard2of5 => None,
    }
}

fn symbology_for(format: &BarcodeFormat) -> Option<Symbology> {
    match format {
        BarcodeFormat::CODE_128 => Some(Symbology::Code128),
        BarcodeFormat::CODE_39 => Some(Symbology::Code39),
        BarcodeFormat::CODE_93 => Some(Symbology::Code93),
        BarcodeFormat::CODABAR => Some(Symbology::Codabar),
        BarcodeFormat::EAN_8 => Some(Symbology::Ean8),
        BarcodeFormat::EAN_13 => Some(Symbology::Ean13),
        BarcodeFormat::ITF => Some(Symbology::Interleaved2of5),
        BarcodeFormat::UPC_A => Some(Symbology::UpcA),
        BarcodeFormat::UPC_E => Some(Symbology::UpcE),
        _ => None,
    }
}
