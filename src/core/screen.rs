//! Screen facade
//!
//! The single entry point the interpreter uses for everything it shows:
//! mode switches, pages, text, pixels, direct memory access, palette and
//! cursor. Every change is applied to the [`ScreenBuffer`] first and then
//! mirrored to the backend as [`RenderEvent`]s.

use std::ops::Range;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use tracing::{debug, trace};

use super::buffer::ScreenBuffer;
use super::cell::{AttrParts, DbcsMarker, TextCell};
use super::cursor::{Cursor, CursorVisibility};
use super::dbcs::Charset;
use super::error::ModeError;
use super::font::Font;
use super::mode::{Adapter, CodecFamily, ErasePolicy, ModeCatalog, VideoModeDescriptor};
use super::palette::Palette;
use super::pixels::Rect;
use super::snapshot::{ScreenSnapshot, SnapshotError};
use crate::codec::{Codec, MemoryCodec};
use crate::render::{RenderEvent, RenderSender};

/// Size of the video memory window seen through PEEK and POKE
const WINDOW_SIZE: u64 = 0x10000;

/// Machine setup a screen is built for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSettings {
    pub adapter: Adapter,
    /// Memory reserved for video on Tandy and PCjr machines
    pub video_memory: usize,
    /// Columns of the initial text mode
    pub text_width: usize,
    pub charset: Charset,
    /// Keep box-drawing runs from pairing into double-byte characters
    pub box_protect: bool,
}

impl ScreenSettings {
    /// The text mode a new screen starts in.
    ///
    /// Adapters without the configured width fall back to their only text
    /// mode.
    pub fn start_mode(&self) -> Result<Arc<VideoModeDescriptor>, ModeError> {
        let catalog = ModeCatalog::new(self.adapter, self.video_memory);
        catalog
            .find(0, Some(self.text_width))
            .or_else(|_| catalog.find(0, None))
    }
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            adapter: Adapter::Cga,
            video_memory: 0x10000,
            text_width: 80,
            charset: Charset::Sbcs,
            box_protect: false,
        }
    }
}

/// The display as the interpreter sees it
#[derive(Debug)]
pub struct Screen {
    catalog: ModeCatalog,
    mode: Arc<VideoModeDescriptor>,
    buffer: ScreenBuffer,
    codec: Codec,
    palette: Palette,
    cursor: Cursor,
    active_page: usize,
    visible_page: usize,
    /// Scroll region, rows `top..stop`
    view: (usize, usize),
    /// Graphics clip rectangle; `None` clips to the page
    clip: Option<Rect>,
    border: u8,
    font: Option<Font>,
    charset: Charset,
    box_protect: bool,
    sender: RenderSender,
}

impl Screen {
    /// Start in the mode given by [`ScreenSettings::start_mode`].
    pub fn new(settings: ScreenSettings, sender: RenderSender) -> Result<Self, ModeError> {
        let catalog = ModeCatalog::new(settings.adapter, settings.video_memory);
        let mode = settings.start_mode()?;
        let mut screen = Self {
            buffer: ScreenBuffer::new(Arc::clone(&mode), settings.charset, settings.box_protect),
            codec: Codec::for_mode(&mode),
            palette: Palette::new(&mode),
            cursor: Cursor::new(&mode),
            active_page: 0,
            visible_page: 0,
            view: (0, mode.text_height),
            clip: None,
            border: 0,
            font: None,
            charset: settings.charset,
            box_protect: settings.box_protect,
            catalog,
            mode,
            sender,
        };
        screen.emit_state();
        Ok(screen)
    }

    pub fn catalog(&self) -> &ModeCatalog {
        &self.catalog
    }

    pub fn mode(&self) -> &Arc<VideoModeDescriptor> {
        &self.mode
    }

    pub fn buffer(&self) -> &ScreenBuffer {
        &self.buffer
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn active_page(&self) -> usize {
        self.active_page
    }

    pub fn visible_page(&self) -> usize {
        self.visible_page
    }

    /// Scroll region as rows `top..stop`
    pub fn view(&self) -> (usize, usize) {
        self.view
    }

    pub fn clip(&self) -> Option<Rect> {
        self.clip
    }

    pub fn border(&self) -> u8 {
        self.border
    }

    /// Receive a copy of every event sent from now on
    pub fn subscribe(&mut self) -> Receiver<RenderEvent> {
        self.sender.subscribe()
    }

    // modes and pages

    /// SCREEN: switch to a catalog mode by number and optional text width.
    pub fn screen(
        &mut self,
        number: u8,
        width: Option<usize>,
        active_page: usize,
        visible_page: usize,
        erase: ErasePolicy,
    ) -> Result<(), ModeError> {
        let mode = self.catalog.find(number, width)?;
        self.set_mode(mode, active_page, visible_page, erase)
    }

    /// Switch modes.
    ///
    /// Pages are checked against the new mode before anything changes. With
    /// [`ErasePolicy::Preserve`] and a shared video segment the old memory
    /// contents are carried over through the codecs.
    pub fn set_mode(
        &mut self,
        mode: Arc<VideoModeDescriptor>,
        active_page: usize,
        visible_page: usize,
        erase: ErasePolicy,
    ) -> Result<(), ModeError> {
        let preserved = self.switch_mode(mode, active_page, visible_page, erase)?;
        self.emit_state();
        if preserved {
            self.emit_contents();
        }
        Ok(())
    }

    /// WIDTH: switch to the mode of the same kind with another text width.
    pub fn set_width(&mut self, width: usize) -> Result<(), ModeError> {
        let mode = self.catalog.with_width(&self.mode, width)?;
        self.set_mode(mode, 0, 0, ErasePolicy::Erase)
    }

    pub fn set_page(&mut self, active_page: usize, visible_page: usize) -> Result<(), ModeError> {
        check_page(&self.mode, active_page)?;
        check_page(&self.mode, visible_page)?;
        self.active_page = active_page;
        self.visible_page = visible_page;
        debug!(active = active_page, visible = visible_page, "page change");
        self.sender.send(RenderEvent::SetPage {
            visible: visible_page,
            active: active_page,
        });
        self.update_cursor();
        Ok(())
    }

    /// PCOPY
    pub fn copy_page(&mut self, src: usize, dst: usize) -> Result<(), ModeError> {
        check_page(&self.mode, src)?;
        check_page(&self.mode, dst)?;
        self.buffer.copy_page(src, dst);
        self.sender.send(RenderEvent::CopyPage { src, dst });
        Ok(())
    }

    /// Apply a mode switch without telling the backend. Returns whether
    /// memory was carried over.
    fn switch_mode(
        &mut self,
        mode: Arc<VideoModeDescriptor>,
        active_page: usize,
        visible_page: usize,
        erase: ErasePolicy,
    ) -> Result<bool, ModeError> {
        check_page(&mode, active_page)?;
        check_page(&mode, visible_page)?;

        let preserved = (erase == ErasePolicy::Preserve && mode.video_segment == self.mode.video_segment)
            .then(|| self.codec.dump(&self.buffer));
        let keep_colours = self.mode.shares_colours_with(&mode);
        debug!(
            from = self.mode.name,
            to = mode.name,
            preserve = preserved.is_some(),
            keep_colours,
            "mode switch"
        );

        self.buffer = ScreenBuffer::new(Arc::clone(&mode), self.charset, self.box_protect);
        self.codec = Codec::for_mode(&mode);
        if !keep_colours {
            self.palette.reset(&mode);
            self.cursor.reset(&mode);
        }
        self.cursor.row = 0;
        self.cursor.col = 0;
        self.cursor.set_double_width(false);
        self.active_page = active_page;
        self.visible_page = visible_page;
        self.view = (0, mode.text_height);
        self.clip = None;
        self.mode = mode;

        if let Some(dump) = &preserved {
            self.codec.load(&mut self.buffer, dump);
        }
        let attr = self.cursor_cell_attr();
        self.cursor.set_attr(attr);
        Ok(preserved.is_some())
    }

    // scroll region and clipping

    /// VIEW PRINT: rows `top..=bottom` become the scroll region.
    pub fn set_view(&mut self, top: usize, bottom: usize) -> Result<(), ModeError> {
        let height = self.mode.text_height;
        if top > bottom || bottom >= height {
            return Err(ModeError::InvalidView { top, bottom, height });
        }
        self.view = (top, bottom + 1);
        Ok(())
    }

    pub fn unset_view(&mut self) {
        self.view = (0, self.mode.text_height);
    }

    /// Limit pixel operations to a rectangle; `None` lifts the limit.
    pub fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }

    /// Move rows `from..height` of the active page up one row; row
    /// `height-1` is blanked with `fill`. Both ends are clamped to the view.
    pub fn scroll_up(&mut self, from: usize, height: usize, fill: u8) {
        let (from, height) = (from.max(self.view.0), height.min(self.view.1));
        if from >= height {
            return;
        }
        let page = self.active_page;
        self.buffer.scroll_up(page, from, height, fill);
        self.sender.send(RenderEvent::ScrollUp {
            page,
            from,
            height,
            fill,
        });
    }

    /// Move rows `from..height` of the active page down one row; row
    /// `from` is blanked with `fill`.
    pub fn scroll_down(&mut self, from: usize, height: usize, fill: u8) {
        let (from, height) = (from.max(self.view.0), height.min(self.view.1));
        if from >= height {
            return;
        }
        let page = self.active_page;
        self.buffer.scroll_down(page, from, height, fill);
        self.sender.send(RenderEvent::ScrollDown {
            page,
            from,
            height,
            fill,
        });
    }

    /// Blank rows `start..stop` of the active page
    pub fn clear_rows(&mut self, start: usize, stop: usize, fill: u8) {
        let stop = stop.min(self.mode.text_height);
        if start >= stop {
            return;
        }
        let page = self.active_page;
        self.buffer.clear_rows(page, start, stop, fill);
        self.sender.send(RenderEvent::ClearRows {
            page,
            fill,
            start,
            stop,
        });
    }

    /// CLS: blank the scroll region
    pub fn clear_view(&mut self, fill: u8) {
        let (top, stop) = self.view;
        self.clear_rows(top, stop, fill);
    }

    // text

    /// Store a character on the active page and show it.
    pub fn put_char(&mut self, row: usize, col: usize, glyph: u8, attr: u8) {
        let page = self.active_page;
        let touched = self.buffer.put_char_attr(page, row, col, glyph, attr);
        self.show_cells(page, row, touched);
        if row == self.cursor.row {
            self.update_cursor();
        }
    }

    /// Store a run of characters on one row, clipped at the right edge.
    pub fn put_text(&mut self, row: usize, col: usize, text: &[u8], attr: u8) {
        let page = self.active_page;
        let cells: Vec<TextCell> = text.iter().map(|&glyph| TextCell::new(glyph, attr)).collect();
        let touched = self.buffer.put_cells(page, row, col, &cells);
        self.show_cells(page, row, touched);
        if row == self.cursor.row {
            self.update_cursor();
        }
    }

    pub fn get_char_attr(&self, page: usize, row: usize, col: usize) -> TextCell {
        self.buffer.get_char_attr(page, row, col)
    }

    /// Set the bitmaps used to draw text in graphics modes
    pub fn set_font(&mut self, font: Option<Font>) {
        self.font = font;
    }

    pub fn font(&self) -> Option<&Font> {
        self.font.as_ref()
    }

    /// Text of a page, trailing blanks trimmed
    pub fn text_lines(&self, page: usize) -> Vec<String> {
        self.buffer.page_text(page)
    }

    /// Text between two cells of a page, both inclusive, one line per row
    pub fn copy_text(&self, page: usize, start: (usize, usize), stop: (usize, usize)) -> String {
        let (start, stop) = if start <= stop { (start, stop) } else { (stop, start) };
        (start.0..=stop.0)
            .filter_map(|row| {
                let text_row = self.buffer.row(page, row)?;
                let from = if row == start.0 { start.1 } else { 0 };
                let to = if row == stop.0 { stop.1.saturating_add(1) } else { text_row.width() };
                Some(text_row.text_range(from, to))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    // pixels

    pub fn get_pixel(&self, x: usize, y: usize) -> u8 {
        self.buffer.get_pixel(self.active_page, x, y)
    }

    pub fn put_pixel(&mut self, x: usize, y: usize, attr: u8) {
        if self.clip_rect(Rect::new(x, y, x, y)).is_none() {
            return;
        }
        let page = self.active_page;
        let attr = attr & self.mode.max_attr();
        self.buffer.put_pixel(page, x, y, attr);
        self.sender.send(RenderEvent::PutPixel { page, x, y, attr });
    }

    pub fn get_interval(&self, x: usize, y: usize, len: usize) -> Vec<u8> {
        self.buffer.get_interval(self.active_page, x, y, len)
    }

    pub fn put_interval(&mut self, x: usize, y: usize, colours: &[u8]) {
        let Some(r) = Rect::sized(x, y, colours.len(), 1).and_then(|r| self.clip_rect(r)) else {
            return;
        };
        let max = self.mode.max_attr();
        let colours: Vec<u8> = colours[r.x0 - x..=r.x1 - x].iter().map(|&c| c & max).collect();
        let page = self.active_page;
        self.buffer.put_interval(page, r.x0, y, &colours);
        self.sender.send(RenderEvent::PutInterval {
            page,
            x: r.x0,
            y,
            colours,
        });
    }

    pub fn fill_interval(&mut self, x0: usize, x1: usize, y: usize, attr: u8) {
        let Some(r) = self.clip_rect(Rect::new(x0, y, x1, y)) else {
            return;
        };
        let page = self.active_page;
        let attr = attr & self.mode.max_attr();
        self.buffer.fill_interval(page, r.x0, r.x1, y, attr);
        self.sender.send(RenderEvent::FillInterval {
            page,
            x0: r.x0,
            x1: r.x1,
            y,
            attr,
        });
    }

    pub fn get_rect(&self, rect: Rect) -> Vec<Vec<u8>> {
        self.buffer.get_rect(self.active_page, rect)
    }

    /// Draw rows of pixels with their top left corner at `(x0, y0)`
    pub fn put_rect(&mut self, x0: usize, y0: usize, rows: &[Vec<u8>]) {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let Some(r) = Rect::sized(x0, y0, width, rows.len()).and_then(|r| self.clip_rect(r)) else {
            return;
        };
        let max = self.mode.max_attr();
        let clipped: Vec<Vec<u8>> = rows[r.y0 - y0..=r.y1 - y0]
            .iter()
            .map(|row| {
                let stop = (r.x1 - x0 + 1).min(row.len());
                row.get(r.x0 - x0..stop)
                    .map(|part| part.iter().map(|&c| c & max).collect())
                    .unwrap_or_default()
            })
            .collect();
        let page = self.active_page;
        self.buffer.put_rect(page, r.x0, r.y0, &clipped);
        self.sender.send(RenderEvent::PutRect {
            page,
            x0: r.x0,
            y0: r.y0,
            rows: clipped,
        });
    }

    pub fn fill_rect(&mut self, rect: Rect, attr: u8) {
        let Some(r) = self.clip_rect(rect) else {
            return;
        };
        let page = self.active_page;
        let attr = attr & self.mode.max_attr();
        self.buffer.fill_rect(page, r, attr);
        self.sender.send(RenderEvent::FillRect {
            page,
            x0: r.x0,
            y0: r.y0,
            x1: r.x1,
            y1: r.y1,
            attr,
        });
    }

    /// Copy a pixel rectangle to `(dst_x, dst_y)`; only the part of the
    /// destination inside the clip changes.
    pub fn move_rect(&mut self, src: Rect, dst_x: usize, dst_y: usize) {
        let Some(d) = Rect::sized(dst_x, dst_y, src.width(), src.height()).and_then(|r| self.clip_rect(r)) else {
            return;
        };
        let from = Rect::new(
            src.x0 + (d.x0 - dst_x),
            src.y0 + (d.y0 - dst_y),
            src.x0 + (d.x1 - dst_x),
            src.y0 + (d.y1 - dst_y),
        );
        let page = self.active_page;
        self.buffer.move_rect(page, from, d.x0, d.y0);
        let rows = self.buffer.get_rect(page, d);
        self.sender.send(RenderEvent::PutRect {
            page,
            x0: d.x0,
            y0: d.y0,
            rows,
        });
    }

    /// Part of `rect` inside the active page and the clip. Always `None`
    /// in text modes.
    fn clip_rect(&self, rect: Rect) -> Option<Rect> {
        if self.mode.is_text() {
            return None;
        }
        let bounds = self.buffer.pixel_page(self.active_page)?.bounds()?;
        let visible = match self.clip {
            Some(clip) => bounds.intersect(&clip)?,
            None => bounds,
        };
        visible.intersect(&rect)
    }

    // memory

    /// PEEK at a linear address; 0 outside the video window
    pub fn peek(&self, address: u32) -> u8 {
        self.read_memory(address, 1).first().copied().unwrap_or(0)
    }

    /// POKE at a linear address; dropped outside the video window
    pub fn poke(&mut self, address: u32, value: u8) {
        self.write_memory(address, &[value]);
    }

    /// Read `len` bytes from `address` on, 0 for bytes outside the window
    pub fn read_memory(&self, address: u32, len: usize) -> Vec<u8> {
        let mut out = vec![0; len];
        if let Some((offset, skip, n)) = self.window(address, len) {
            out[skip..skip + n].copy_from_slice(&self.codec.decode(&self.buffer, offset, n));
        }
        out
    }

    /// Write bytes from `address` on and show what they changed
    pub fn write_memory(&mut self, address: u32, bytes: &[u8]) {
        let Some((offset, skip, n)) = self.window(address, bytes.len()) else {
            trace!(address, len = bytes.len(), "write outside video window");
            return;
        };
        self.codec.encode(&mut self.buffer, offset, &bytes[skip..skip + n]);
        for span in self.codec.spans(offset, n) {
            if self.mode.is_text() {
                let cols = if self.buffer.has_dbcs() {
                    0..self.mode.text_width
                } else {
                    span.cols
                };
                self.show_cells(span.page, span.row, cols);
            } else {
                let colours = self.buffer.get_interval(span.page, span.cols.start, span.row, span.cols.len());
                self.sender.send(RenderEvent::PutInterval {
                    page: span.page,
                    x: span.cols.start,
                    y: span.row,
                    colours,
                });
            }
        }
        if self.mode.is_text() {
            self.update_cursor();
        }
    }

    /// Offset into the window, bytes skipped before it and bytes inside it
    fn window(&self, address: u32, len: usize) -> Option<(usize, usize, usize)> {
        let base = u64::from(self.mode.base_address());
        let start = u64::from(address);
        let end = start + len as u64;
        let lo = start.max(base);
        let hi = end.min(base + WINDOW_SIZE);
        (lo < hi).then(|| ((lo - base) as usize, (lo - start) as usize, (hi - lo) as usize))
    }

    /// EGA read map select; ignored by other layouts
    pub fn set_read_plane(&mut self, plane: u8) {
        self.codec.set_read_plane(plane);
    }

    /// EGA map mask; ignored by other layouts
    pub fn set_write_mask(&mut self, mask: u8) {
        self.codec.set_write_mask(mask);
    }

    pub fn plane_registers(&self) -> Option<(u8, u8)> {
        self.codec.plane_registers()
    }

    // palette

    /// PALETTE attr, colour
    pub fn set_palette_entry(&mut self, attr: usize, colour: u8) -> Result<(), ModeError> {
        if self.palette.set_entry(attr, colour)? {
            self.emit_palette();
        }
        Ok(())
    }

    /// PALETTE USING
    pub fn set_palette(&mut self, colours: &[u8]) -> Result<(), ModeError> {
        if self.palette.set_all(colours)? {
            self.emit_palette();
        }
        Ok(())
    }

    /// PALETTE without arguments
    pub fn reset_palette(&mut self) {
        self.palette.reset(&self.mode);
        self.emit_palette();
    }

    /// COLOR ,palette in 4-colour modes
    pub fn set_cga4_palette(&mut self, palette: u8, intensity: bool) {
        self.palette.set_cga4_palette(palette, intensity);
        self.emit_palette();
    }

    /// COLOR background in 4-colour modes
    pub fn set_background(&mut self, cga: u8) {
        self.palette.set_cga_background(cga);
        self.emit_palette();
    }

    pub fn set_border(&mut self, attr: u8) {
        self.border = attr;
        self.sender.send(RenderEvent::SetBorderAttr(attr));
    }

    // cursor

    /// LOCATE row, col (0-based, clamped to the screen)
    pub fn locate(&mut self, row: usize, col: usize) {
        self.cursor.row = row.min(self.mode.text_height.saturating_sub(1));
        self.cursor.col = col.min(self.mode.text_width.saturating_sub(1));
        self.sender.send(RenderEvent::MoveCursor {
            row: self.cursor.row,
            col: self.cursor.col,
        });
        self.update_cursor();
    }

    /// LOCATE ,,,start, stop. Returns the shape actually used.
    pub fn set_cursor_shape(&mut self, from: i32, to: i32) -> (usize, usize) {
        let shape = self.cursor.set_shape(from, to);
        self.emit_cursor_shape();
        shape
    }

    pub fn show_cursor(&mut self, visibility: CursorVisibility) {
        self.cursor.set_visibility(visibility);
        self.sender.send(RenderEvent::SetCursorVisibility(visibility));
    }

    /// Follow the cell under the cursor: its colour in text modes and its
    /// width over a double-width character.
    fn update_cursor(&mut self) {
        let (page, row, col) = (self.active_page, self.cursor.row, self.cursor.col);
        let attr = self.cursor_cell_attr();
        if self.cursor.set_attr(attr) {
            self.sender.send(RenderEvent::SetCursorAttr(attr));
        }
        let lead = self.buffer.marker(page, row, col) == DbcsMarker::Lead;
        if self.cursor.set_double_width(lead) {
            self.emit_cursor_shape();
        }
    }

    fn cursor_cell_attr(&self) -> u8 {
        if self.mode.is_text() {
            let cell = self.buffer.get_char_attr(self.active_page, self.cursor.row, self.cursor.col);
            cell.attr & 0x0F
        } else {
            self.mode.cursor_index.unwrap_or(self.mode.default_attr)
        }
    }

    // lifecycle

    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot::from_screen(self)
    }

    /// Go back to a saved state and show it from scratch.
    pub fn restore(&mut self, snapshot: &ScreenSnapshot) -> Result<(), SnapshotError> {
        snapshot.check_version()?;
        let mode = self.catalog.by_key(snapshot.mode)?;
        let expected = if mode.family == CodecFamily::Ega {
            mode.planes.len()
        } else {
            1
        };
        if snapshot.memory.len() != expected {
            return Err(SnapshotError::MemoryLayout {
                mode: mode.name.to_string(),
                found: snapshot.memory.len(),
                expected,
            });
        }

        self.switch_mode(mode, snapshot.active_page, snapshot.visible_page, ErasePolicy::Erase)?;
        self.codec.load(&mut self.buffer, &snapshot.memory);
        if let Some((read_plane, write_mask)) = snapshot.plane_registers {
            self.codec.set_read_plane(read_plane);
            self.codec.set_write_mask(write_mask);
        }
        self.palette.restore_entries(&snapshot.palette);
        self.cursor.restore_shape(snapshot.cursor.from_line, snapshot.cursor.to_line);
        self.cursor.set_visibility(snapshot.cursor.visibility);
        self.cursor.row = snapshot.cursor.row.min(self.mode.text_height.saturating_sub(1));
        self.cursor.col = snapshot.cursor.col.min(self.mode.text_width.saturating_sub(1));
        let (top, stop) = snapshot.view;
        if top < stop && stop <= self.mode.text_height {
            self.view = (top, stop);
        }
        self.border = snapshot.border;
        let attr = self.cursor_cell_attr();
        self.cursor.set_attr(attr);

        self.rebuild();
        self.update_cursor();
        Ok(())
    }

    /// Send the whole display again, for a backend that starts late.
    pub fn rebuild(&mut self) {
        self.emit_state();
        self.emit_contents();
    }

    /// Ask the backend to paint a last frame and stop.
    pub fn shutdown(&mut self) {
        debug!(mode = self.mode.name, "screen shutdown");
        self.sender.quit();
    }

    // events

    fn emit_state(&mut self) {
        self.sender.send(RenderEvent::SetMode(Arc::clone(&self.mode)));
        self.emit_palette();
        self.sender.send(RenderEvent::SetBorderAttr(self.border));
        self.emit_cursor_shape();
        self.sender.send(RenderEvent::SetCursorAttr(self.cursor.attr()));
        self.sender
            .send(RenderEvent::SetCursorVisibility(self.cursor.visibility()));
        self.sender.send(RenderEvent::MoveCursor {
            row: self.cursor.row,
            col: self.cursor.col,
        });
        self.sender.send(RenderEvent::SetPage {
            visible: self.visible_page,
            active: self.active_page,
        });
    }

    /// Every page's pixels and text that differ from a fresh mode
    fn emit_contents(&mut self) {
        let graphics = !self.mode.is_text();
        let blank = TextCell::blank(if graphics { 0 } else { self.mode.default_attr });
        for page in 0..self.buffer.num_pages() {
            if graphics {
                let Some(bounds) = self
                    .buffer
                    .pixel_page(page)
                    .filter(|p| p.data().iter().any(|&c| c != 0))
                    .and_then(|p| p.bounds())
                else {
                    continue;
                };
                let rows = self.buffer.get_rect(page, bounds);
                self.sender.send(RenderEvent::PutRect {
                    page,
                    x0: 0,
                    y0: 0,
                    rows,
                });
                if self.font.is_some() {
                    continue;
                }
            }
            for row in 0..self.mode.text_height {
                let mut col = 0;
                while col < self.mode.text_width {
                    let cell = self.buffer.get_char_attr(page, row, col);
                    let marker = self.buffer.marker(page, row, col);
                    if marker != DbcsMarker::Trail && cell != blank {
                        self.show_cells(page, row, col..col + 1);
                    }
                    col += 1;
                }
            }
        }
    }

    /// Send the cells in `cols`, widened to whole double-width characters.
    fn show_cells(&mut self, page: usize, row: usize, cols: Range<usize>) {
        let width = self.mode.text_width;
        let mut col = cols.start;
        if col > 0 && self.buffer.marker(page, row, col) == DbcsMarker::Trail {
            col -= 1;
        }
        while col < cols.end.min(width) {
            let cell = self.buffer.get_char_attr(page, row, col);
            let mut glyph = vec![cell.glyph];
            if self.buffer.marker(page, row, col) == DbcsMarker::Lead && col + 1 < width {
                glyph.push(self.buffer.get_char_attr(page, row, col + 1).glyph);
            }
            let step = glyph.len();
            if !self.draw_text(page, row, col, &glyph, cell.attr) {
                let parts = AttrParts::split(cell.attr, &self.mode);
                self.sender.send(RenderEvent::PutGlyph {
                    page,
                    row,
                    col,
                    glyph,
                    fg: parts.fg,
                    bg: parts.bg,
                    blink: parts.blink,
                    underline: parts.underline,
                });
            }
            col += step;
        }
    }

    /// Rasterise text into the pixel page of a graphics mode. Returns false
    /// when no font of the mode's cell height is set.
    fn draw_text(&mut self, page: usize, row: usize, col: usize, glyph: &[u8], attr: u8) -> bool {
        if self.mode.is_text() {
            return false;
        }
        let font_height = self.mode.font_height;
        let Some(font) = self.font.as_ref().filter(|f| f.height() == font_height) else {
            return false;
        };
        let fg = attr & self.mode.max_attr();
        for (i, &byte) in glyph.iter().enumerate() {
            self.buffer.draw_glyph(page, row, col + i, font.glyph(byte), fg, 0);
        }
        let first = self.buffer.cell_rect(row, col);
        let rect = Rect::new(
            first.x0,
            first.y0,
            first.x1 + (glyph.len() - 1) * self.mode.font_width,
            first.y1,
        );
        let rows = self.buffer.get_rect(page, rect);
        self.sender.send(RenderEvent::PutRect {
            page,
            x0: rect.x0,
            y0: rect.y0,
            rows,
        });
        true
    }

    fn emit_palette(&mut self) {
        let (rgb0, rgb1) = self.palette.rgb_tables();
        let event = RenderEvent::SetPalette {
            rgb0: rgb0.to_vec(),
            rgb1: rgb1.to_vec(),
        };
        self.sender.send(event);
    }

    fn emit_cursor_shape(&mut self) {
        let (from, to) = self.cursor.shape();
        self.sender.send(RenderEvent::SetCursorShape {
            from,
            to,
            width: self.cursor.width(),
        });
    }
}

fn check_page(mode: &VideoModeDescriptor, page: usize) -> Result<(), ModeError> {
    if page >= mode.num_pages {
        return Err(ModeError::PageOutOfRange {
            page,
            num_pages: mode.num_pages,
        });
    }
    Ok(())
}
