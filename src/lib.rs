//! Hoa Van - fabric pattern digitizer
//!
//! Turns a photo of patterned fabric into a seamless, print-ready repeat
//! tile by way of a single generative vision model call.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
pub mod ui_text;
