//! Application glue module
//!
//! Configuration and clipboard access.

mod clipboard;
mod config;

#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{open_clipboard, ClipboardBridge, ClipboardError, MemoryClipboard};
pub use config::{Config, ConfigError, Monitor};
