//! Headless shadow backend
//!
//! Rebuilds the display purely from render events into its own
//! [`ScreenBuffer`] and renders the visible page as text. Used by the
//! `video-headless` runner and by tests that check what a backend sees.

use std::sync::{Arc, Mutex};

use tracing::trace;

use super::backend::{Backend, BackendError};
use super::event::RenderEvent;
use crate::app::{ClipboardBridge, Config, MemoryClipboard};
use crate::core::{AttrParts, BlinkPhase, Charset, CursorVisibility, Rect, Rgb, ScreenBuffer};

/// What the shadow backend has drawn so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowOutput {
    /// Events handled
    pub events: usize,
    /// Frames painted
    pub frames: usize,
    /// Text of the visible page at the last frame
    pub last_frame: Vec<String>,
    pub shut_down: bool,
}

/// Backend that keeps a shadow copy of the display in memory
#[derive(Debug)]
pub struct HeadlessBackend {
    buffer: Option<ScreenBuffer>,
    rgb: [Vec<Rgb>; 2],
    border: u8,
    visible_page: usize,
    active_page: usize,
    cursor: (usize, usize),
    cursor_visibility: CursorVisibility,
    clipboard: MemoryClipboard,
    output: Arc<Mutex<ShadowOutput>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            buffer: None,
            rgb: [Vec::new(), Vec::new()],
            border: 0,
            visible_page: 0,
            active_page: 0,
            cursor: (0, 0),
            cursor_visibility: CursorVisibility::Hidden,
            clipboard: MemoryClipboard::default(),
            output: Arc::new(Mutex::new(ShadowOutput::default())),
        }
    }

    pub fn factory(_config: &Config) -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(Self::new()))
    }

    /// Handle on the output, readable from other threads
    pub fn output(&self) -> Arc<Mutex<ShadowOutput>> {
        Arc::clone(&self.output)
    }

    pub fn buffer(&self) -> Option<&ScreenBuffer> {
        self.buffer.as_ref()
    }

    pub fn visible_page(&self) -> usize {
        self.visible_page
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn border(&self) -> u8 {
        self.border
    }

    pub fn palette(&self) -> (&[Rgb], &[Rgb]) {
        (&self.rgb[0], &self.rgb[1])
    }

    /// Text of the visible page as it looks in the given blink phase
    pub fn render_lines(&self, phase: BlinkPhase) -> Vec<String> {
        let Some(buffer) = &self.buffer else {
            return Vec::new();
        };
        let Some(page) = buffer.text_page(self.visible_page) else {
            return Vec::new();
        };
        let blink = buffer.mode().is_text() && buffer.mode().has_blink;
        page.rows()
            .iter()
            .map(|row| {
                let line: String = row
                    .cells()
                    .iter()
                    .map(|cell| {
                        if blink && cell.attr & 0x80 != 0 && !phase.text_on {
                            ' '
                        } else if cell.glyph.is_ascii_graphic() {
                            char::from(cell.glyph)
                        } else if cell.is_blank() {
                            ' '
                        } else {
                            '.'
                        }
                    })
                    .collect();
                line.trim_end().to_string()
            })
            .collect()
    }

    fn apply(&mut self, event: &RenderEvent) {
        if let RenderEvent::SetMode(mode) = event {
            self.buffer = Some(ScreenBuffer::new(Arc::clone(mode), Charset::Sbcs, false));
            self.visible_page = 0;
            self.active_page = 0;
            return;
        }
        let Some(buffer) = self.buffer.as_mut() else {
            trace!(event = event.kind(), "event before first mode");
            return;
        };
        match event {
            RenderEvent::SetMode(_) => {}
            RenderEvent::PutGlyph {
                page,
                row,
                col,
                glyph,
                fg,
                bg,
                blink,
                underline,
            } => {
                let attr = if buffer.mode().is_text() {
                    AttrParts {
                        fg: *fg,
                        bg: *bg,
                        blink: *blink,
                        underline: *underline,
                    }
                    .join()
                } else {
                    *fg
                };
                for (i, &byte) in glyph.iter().enumerate() {
                    buffer.put_char_attr(*page, *row, col + i, byte, attr);
                }
            }
            RenderEvent::PutPixel { page, x, y, attr } => buffer.put_pixel(*page, *x, *y, *attr),
            RenderEvent::PutInterval { page, x, y, colours } => {
                buffer.put_interval(*page, *x, *y, colours)
            }
            RenderEvent::FillInterval {
                page,
                x0,
                x1,
                y,
                attr,
            } => buffer.fill_interval(*page, *x0, *x1, *y, *attr),
            RenderEvent::PutRect { page, x0, y0, rows } => buffer.put_rect(*page, *x0, *y0, rows),
            RenderEvent::FillRect {
                page,
                x0,
                y0,
                x1,
                y1,
                attr,
            } => buffer.fill_rect(*page, Rect::new(*x0, *y0, *x1, *y1), *attr),
            RenderEvent::ScrollUp {
                page,
                from,
                height,
                fill,
            } => buffer.scroll_up(*page, *from, *height, *fill),
            RenderEvent::ScrollDown {
                page,
                from,
                height,
                fill,
            } => buffer.scroll_down(*page, *from, *height, *fill),
            RenderEvent::ClearRows {
                page,
                fill,
                start,
                stop,
            } => buffer.clear_rows(*page, *start, *stop, *fill),
            RenderEvent::SetPage { visible, active } => {
                self.visible_page = *visible;
                self.active_page = *active;
            }
            RenderEvent::CopyPage { src, dst } => buffer.copy_page(*src, *dst),
            RenderEvent::SetPalette { rgb0, rgb1 } => {
                self.rgb = [rgb0.clone(), rgb1.clone()];
            }
            RenderEvent::SetBorderAttr(attr) => self.border = *attr,
            RenderEvent::MoveCursor { row, col } => self.cursor = (*row, *col),
            RenderEvent::SetCursorVisibility(visibility) => self.cursor_visibility = *visibility,
            RenderEvent::SetCursorShape { .. } | RenderEvent::SetCursorAttr(_) | RenderEvent::Quit => {}
        }
    }
}

impl Backend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn handle(&mut self, event: &RenderEvent) {
        self.apply(event);
        if let Ok(mut output) = self.output.lock() {
            output.events += 1;
        }
    }

    fn repaint(&mut self, phase: BlinkPhase) {
        let lines = self.render_lines(phase);
        if let Ok(mut output) = self.output.lock() {
            output.frames += 1;
            output.last_frame = lines;
        }
    }

    fn clipboard(&mut self) -> Option<&mut dyn ClipboardBridge> {
        Some(&mut self.clipboard)
    }

    fn shutdown(&mut self) {
        if let Ok(mut output) = self.output.lock() {
            output.shut_down = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Adapter, ModeCatalog};

    fn glyph(row: usize, col: usize, text: &[u8], blink: bool) -> RenderEvent {
        RenderEvent::PutGlyph {
            page: 0,
            row,
            col,
            glyph: text.to_vec(),
            fg: 7,
            bg: 0,
            blink,
            underline: false,
        }
    }

    #[test]
    fn test_rebuilds_text_from_events() {
        let mode = ModeCatalog::new(Adapter::Cga, 0).find(0, Some(40)).unwrap();
        let mut backend = HeadlessBackend::new();
        backend.handle(&RenderEvent::SetMode(mode));
        backend.handle(&glyph(0, 0, b"H", false));
        backend.handle(&glyph(0, 1, b"i", true));
        backend.handle(&RenderEvent::ScrollDown {
            page: 0,
            from: 0,
            height: 25,
            fill: 7,
        });

        let on = BlinkPhase {
            cursor_on: true,
            text_on: true,
        };
        assert_eq!(backend.render_lines(on)[1], "Hi");
        assert_eq!(backend.render_lines(BlinkPhase::default())[1], "H");

        backend.repaint(on);
        let output = backend.output();
        let output = output.lock().unwrap();
        assert_eq!(output.frames, 1);
        assert_eq!(output.events, 4);
    }

    #[test]
    fn test_events_before_mode_are_ignored() {
        let mut backend = HeadlessBackend::new();
        backend.handle(&glyph(0, 0, b"x", false));
        assert!(backend.buffer().is_none());
        assert!(backend.render_lines(BlinkPhase::default()).is_empty());
    }

    #[test]
    fn test_pages_and_palette() {
        let mode = ModeCatalog::new(Adapter::Ega, 0).find(7, None).unwrap();
        let mut backend = HeadlessBackend::new();
        backend.handle(&RenderEvent::SetMode(mode));
        backend.handle(&RenderEvent::FillRect {
            page: 2,
            x0: 0,
            y0: 0,
            x1: 9,
            y1: 9,
            attr: 4,
        });
        backend.handle(&RenderEvent::CopyPage { src: 2, dst: 3 });
        backend.handle(&RenderEvent::SetPage {
            visible: 3,
            active: 1,
        });
        backend.handle(&RenderEvent::SetPalette {
            rgb0: vec![(1, 2, 3)],
            rgb1: vec![(4, 5, 6)],
        });
        let buffer = backend.buffer().unwrap();
        assert_eq!(buffer.get_pixel(3, 9, 9), 4);
        assert_eq!(backend.visible_page(), 3);
        assert_eq!(backend.palette().1, &[(4, 5, 6)]);
        assert!(backend.clipboard().is_some());
    }
}
