//! SwatchKeep Application
//!
//! The browser extension contexts (popup, background worker and page
//! picker) on WASM, and a command-line shell on native.

#[cfg(not(target_arch = "wasm32"))]
pub mod config;

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub mod cli;

#[cfg(not(target_arch = "wasm32"))]
pub use config::AppConfig;

#[cfg(target_arch = "wasm32")]
mod background;
#[cfg(target_arch = "wasm32")]
mod chrome;
#[cfg(target_arch = "wasm32")]
mod content;
#[cfg(target_arch = "wasm32")]
mod popup;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{handle_background_message, start_content, start_popup};
