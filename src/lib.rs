//! Retro Video Library
//!
//! Emulation of the CGA, EGA, Tandy/PCjr and MDA display adapters for a
//! BASIC runtime. Programs that PEEK and POKE video memory or draw with
//! primitives see the same results as on the original hardware.
//!
//! - `core`: Mode catalog, screen buffer, palette, cursor and the `Screen` facade
//! - `codec`: Translation between video memory bytes and cells or pixels
//! - `render`: Event channel, render thread and display backends
//! - `app`: Configuration and clipboard access
//! - `headless`: Scripted screen operations for testing and automation

pub mod app;
pub mod codec;
pub mod core;
pub mod headless;
pub mod render;
