pub mod barcode_reader;
pub mod camera_provider;
pub mod preview_surface;
pub mod scan_delegate;
