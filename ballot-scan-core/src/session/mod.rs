pub mod camera_manager;
pub mod capture_pipeline;
pub mod controller;
pub mod decoder_adapter;
