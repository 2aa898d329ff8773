//! Render events
//!
//! Everything a backend needs to mirror the display, sent one way from the
//! interpreter thread. Page arguments name the page the change applies to;
//! backends only show the visible page but keep all of them.

use std::sync::Arc;

use crate::core::{CursorVisibility, Rgb, VideoModeDescriptor};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// New mode; all pages are blank
    SetMode(Arc<VideoModeDescriptor>),
    /// One or two glyph bytes (a double-width character) at a cell
    PutGlyph {
        page: usize,
        row: usize,
        col: usize,
        glyph: Vec<u8>,
        fg: u8,
        bg: u8,
        blink: bool,
        underline: bool,
    },
    PutPixel {
        page: usize,
        x: usize,
        y: usize,
        attr: u8,
    },
    PutInterval {
        page: usize,
        x: usize,
        y: usize,
        colours: Vec<u8>,
    },
    FillInterval {
        page: usize,
        x0: usize,
        x1: usize,
        y: usize,
        attr: u8,
    },
    PutRect {
        page: usize,
        x0: usize,
        y0: usize,
        rows: Vec<Vec<u8>>,
    },
    FillRect {
        page: usize,
        x0: usize,
        y0: usize,
        x1: usize,
        y1: usize,
        attr: u8,
    },
    /// Rows `from..height` move up one row; row `height-1` is filled
    ScrollUp {
        page: usize,
        from: usize,
        height: usize,
        fill: u8,
    },
    /// Rows `from..height` move down one row; row `from` is filled
    ScrollDown {
        page: usize,
        from: usize,
        height: usize,
        fill: u8,
    },
    /// Rows `start..stop` are blanked
    ClearRows {
        page: usize,
        fill: u8,
        start: usize,
        stop: usize,
    },
    SetPage {
        visible: usize,
        active: usize,
    },
    CopyPage {
        src: usize,
        dst: usize,
    },
    /// RGB of every attribute for blink phase 0 and phase 1
    SetPalette {
        rgb0: Vec<Rgb>,
        rgb1: Vec<Rgb>,
    },
    SetBorderAttr(u8),
    SetCursorShape {
        from: usize,
        to: usize,
        width: usize,
    },
    SetCursorAttr(u8),
    SetCursorVisibility(CursorVisibility),
    MoveCursor {
        row: usize,
        col: usize,
    },
    Quit,
}

impl RenderEvent {
    /// Short tag for logs
    pub fn kind(&self) -> &'static str {
        match self {
            RenderEvent::SetMode(_) => "set_mode",
            RenderEvent::PutGlyph { .. } => "put_glyph",
            RenderEvent::PutPixel { .. } => "put_pixel",
            RenderEvent::PutInterval { .. } => "put_interval",
            RenderEvent::FillInterval { .. } => "fill_interval",
            RenderEvent::PutRect { .. } => "put_rect",
            RenderEvent::FillRect { .. } => "fill_rect",
            RenderEvent::ScrollUp { .. } => "scroll_up",
            RenderEvent::ScrollDown { .. } => "scroll_down",
            RenderEvent::ClearRows { .. } => "clear_rows",
            RenderEvent::SetPage { .. } => "set_page",
            RenderEvent::CopyPage { .. } => "copy_page",
            RenderEvent::SetPalette { .. } => "set_palette",
            RenderEvent::SetBorderAttr(_) => "set_border_attr",
            RenderEvent::SetCursorShape { .. } => "set_cursor_shape",
            RenderEvent::SetCursorAttr(_) => "set_cursor_attr",
            RenderEvent::SetCursorVisibility(_) => "set_cursor_visibility",
            RenderEvent::MoveCursor { .. } => "move_cursor",
            RenderEvent::Quit => "quit",
        }
    }
}
