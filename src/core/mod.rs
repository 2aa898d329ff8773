//! Video core
//!
//! Platform-independent display state. This module contains:
//! - Mode descriptors and the per-adapter catalog
//! - Text cells, rows and pages with DBCS markers
//! - Pixel pages
//! - Palette and cursor state
//! - The [`Screen`] facade and display snapshots
//!
//! Nothing in here draws. Changes leave through the render channel.

mod buffer;
mod cell;
mod cursor;
mod dbcs;
mod error;
mod font;
mod grid;
mod line;
mod mode;
mod palette;
mod pixels;
mod screen;
mod snapshot;

pub use buffer::ScreenBuffer;
pub use cell::{AttrParts, DbcsMarker, TextCell};
pub use cursor::{BlinkPhase, Cursor, CursorVisibility, CURSOR_BLINK_HALF_PERIOD, TEXT_BLINK_HALF_PERIOD};
pub use dbcs::{connects, refresh_markers, BoxProtect, BoxState, BoxStyle, Charset, Fed};
pub use error::ModeError;
pub use font::Font;
pub use grid::TextPage;
pub use line::TextRow;
pub use mode::{Adapter, CodecFamily, ErasePolicy, ModeCatalog, ModeKey, PaletteAccess, VideoModeDescriptor};
pub use palette::{ColourSource, Palette, Rgb};
pub use pixels::{PixelPage, Rect};
pub use screen::{Screen, ScreenSettings};
pub use snapshot::{CursorSnapshot, ScreenSnapshot, SnapshotError, SNAPSHOT_VERSION};
