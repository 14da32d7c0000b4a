//! Operator-facing phrases and normalization of low-level decoder text.
//!
//! The operator UI is Thai; `ScanError`'s `Display` stays English for logs.

use super::error::ScanError;

pub const NO_BARCODE_FOUND: &str =
    "ไม่พบบาร์โค้ดในรูป ลองจัดให้บาร์โค้ดชัดเจนหรือใช้รูปจากอัลบั้ม";
pub const CAMERA_UNAVAILABLE: &str = "ไม่สามารถเปิดกล้องได้";
pub const CAPTURE_FAILED: &str = "ไม่สามารถถ่ายรูปได้";
pub const UNREADABLE_IMAGE: &str = "ไม่สามารถอ่านไฟล์รูปได้ กรุณาเลือกรูปใหม่";
pub const DECODER_FAILED: &str = "สแกนบาร์โค้ดไม่สำเร็จ กรุณาลองใหม่อีกครั้ง";
pub const SCANNER_MISCONFIGURED: &str = "การตั้งค่าเครื่องสแกนไม่ถูกต้อง";
pub const IDENTIFIER_TOO_SHORT: &str = "กรอกเลขบัตรเลือกตั้งให้ถูกต้อง";
pub const IDENTIFIER_MALFORMED: &str = "รูปแบบบัตรเลือกตั้งไม่ถูกต้อง";

/// Texts recognition libraries raise when a frame simply holds no barcode yet.
const NOT_FOUND_SIGNATURES: [&str; 2] = [
    "NotFoundException",
    "No MultiFormat Readers were able to detect the code",
];

/// Whether raw decoder text is one of the known "nothing found" exceptions.
pub fn is_not_found_message(raw: &str) -> bool {
    NOT_FOUND_SIGNATURES.iter().any(|sig| raw.contains(sig))
}

/// Reclassify a reader error whose text is a known "nothing found" exception.
pub fn normalize_decoder_error(error: ScanError) -> ScanError {
    match error {
        ScanError::DecoderFailed(ref raw) if is_not_found_message(raw) => ScanError::NoBarcodeDetected,
        other => other,
    }
}

/// The phrase shown to the operator for an error.
pub fn friendly_message(error: &ScanError) -> String {
    let phrase = match error {
        ScanError::DeviceUnavailable(_) => CAMERA_UNAVAILABLE,
        ScanError::NoBarcodeDetected => NO_BARCODE_FOUND,
        ScanError::CaptureFailed(_) => CAPTURE_FAILED,
        ScanError::MalformedIdentifier(reason) => reason.message(),
        ScanError::UnreadableImage(_) => UNREADABLE_IMAGE,
        ScanError::DecoderFailed(raw) if is_not_found_message(raw) => NO_BARCODE_FOUND,
        ScanError::DecoderFailed(_) => DECODER_FAILED,
        ScanError::ConfigurationFailed(_) => SCANNER_MISCONFIGURED,
    };
    phrase.to_string()
}
