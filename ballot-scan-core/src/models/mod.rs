pub mod camera;
pub mod config;
pub mod decode;
pub mod error;
pub mod messages;
pub mod outcome;
pub mod state;
pub mod view;
