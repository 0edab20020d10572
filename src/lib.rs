//! # Osrview - Off-Screen Browser Embedding Demo
//!
//! A minimal host application that embeds a web-browser rendering engine,
//! forwards windowing input to it, and composites its off-screen BGRA paint
//! output onto a textured quad.
//!
//! ## Architecture
//!
//! The host is organized into the following modules:
//!
//! - **engine**: the embedded-browser collaborator boundary — the
//!   [`engine::BrowserHost`] event vocabulary, the browser lifecycle
//!   registry, and a software demo paint source
//! - **input**: translation of winit callbacks into engine input events,
//!   delivered to every live browser
//! - **compositor**: dirty-region texture synchronization and the
//!   textured-quad render pass (wgpu)
//! - **ui**: the winit application shell owning all of the above
//! - **utils**: shared error types

pub mod compositor;
pub mod engine;
pub mod input;
pub mod ui;
pub mod utils;

// Re-export main types for convenience
pub use utils::error::{OsrError, Result};

/// Host version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Osrview";
