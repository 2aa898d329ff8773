//! Screen buffer
//!
//! Page-indexed text and pixel storage for the active mode. Text and pixel
//! pages exist for every mode; in graphics modes a pixel write blanks the
//! text cells it overlaps, so the cell layer never claims a character that
//! has been drawn over.

use std::ops::Range;
use std::sync::Arc;

use super::cell::{DbcsMarker, TextCell};
use super::dbcs::{refresh_markers, Charset};
use super::grid::TextPage;
use super::line::TextRow;
use super::mode::VideoModeDescriptor;
use super::pixels::{PixelPage, Rect};

/// Text and pixel contents of all pages of one mode
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    mode: Arc<VideoModeDescriptor>,
    text: Vec<TextPage>,
    pixels: Vec<PixelPage>,
    /// Charset used for DBCS markers; `None` when markers are not kept
    dbcs: Option<Charset>,
    box_protect: bool,
}

impl ScreenBuffer {
    pub fn new(mode: Arc<VideoModeDescriptor>, charset: Charset, box_protect: bool) -> Self {
        let attr = if mode.is_text() { mode.default_attr } else { 0 };
        let text = (0..mode.num_pages)
            .map(|_| TextPage::new(mode.text_width, mode.text_height, attr))
            .collect();
        let pixels = (0..mode.num_pages)
            .map(|_| PixelPage::new(mode.pixel_width, mode.pixel_height))
            .collect();
        let dbcs = (charset.is_dbcs() && mode.text_width == 80).then_some(charset);
        Self {
            mode,
            text,
            pixels,
            dbcs,
            box_protect,
        }
    }

    pub fn mode(&self) -> &Arc<VideoModeDescriptor> {
        &self.mode
    }

    pub fn num_pages(&self) -> usize {
        self.text.len()
    }

    pub fn has_dbcs(&self) -> bool {
        self.dbcs.is_some()
    }

    pub fn text_page(&self, page: usize) -> Option<&TextPage> {
        self.text.get(page)
    }

    pub fn pixel_page(&self, page: usize) -> Option<&PixelPage> {
        self.pixels.get(page)
    }

    pub fn row(&self, page: usize, row: usize) -> Option<&TextRow> {
        self.text.get(page).and_then(|p| p.row(row))
    }

    // text

    /// Cell at a position; a blank for positions outside the buffer
    pub fn get_char_attr(&self, page: usize, row: usize, col: usize) -> TextCell {
        self.text.get(page).map_or(TextCell::BLANK, |p| p.cell(row, col))
    }

    pub fn marker(&self, page: usize, row: usize, col: usize) -> DbcsMarker {
        self.row(page, row).map_or(DbcsMarker::Single, |r| r.marker(col))
    }

    /// Store one cell. Returns the columns whose DBCS markers were
    /// recomputed, which always include `col` itself.
    pub fn put_char_attr(
        &mut self,
        page: usize,
        row: usize,
        col: usize,
        glyph: u8,
        attr: u8,
    ) -> Range<usize> {
        self.put_cells(page, row, col, &[TextCell::new(glyph, attr)])
    }

    /// Store consecutive cells of one row, clipped at the right edge.
    pub fn put_cells(&mut self, page: usize, row: usize, col: usize, cells: &[TextCell]) -> Range<usize> {
        let dbcs = self.dbcs;
        let box_protect = self.box_protect;
        let Some(text_row) = self.text.get_mut(page).and_then(|p| p.row_mut(row)) else {
            return col..col;
        };
        let stop = col.saturating_add(cells.len()).min(text_row.width());
        if col >= stop {
            return col..col;
        }
        for (i, cell) in cells.iter().take(stop - col).enumerate() {
            text_row.set(col + i, *cell);
        }
        match dbcs {
            Some(charset) => {
                let touched = refresh_markers(text_row, charset, box_protect, col, stop);
                touched.start.min(col)..touched.end.max(stop)
            }
            None => col..stop,
        }
    }

    pub fn set_wrap(&mut self, page: usize, row: usize, wrap: bool) {
        if let Some(r) = self.text.get_mut(page).and_then(|p| p.row_mut(row)) {
            r.set_wrapped(wrap);
        }
    }

    /// Blank rows `start..stop`, including their pixels in graphics modes.
    pub fn clear_rows(&mut self, page: usize, start: usize, stop: usize, fill: u8) {
        let Some(text) = self.text.get_mut(page) else {
            return;
        };
        let stop = stop.min(text.height());
        if start >= stop {
            return;
        }
        text.clear_rows(start, stop, fill);
        if !self.mode.is_text() {
            let fh = self.mode.font_height;
            let band = Rect::new(0, start * fh, self.mode.pixel_width.saturating_sub(1), stop * fh - 1);
            let fill = self.pixel_fill(fill);
            if let Some(pixels) = self.pixels.get_mut(page) {
                pixels.fill_rect(band, fill);
            }
        }
    }

    /// Scroll rows `from..to` up by one row; row `to-1` is blanked.
    pub fn scroll_up(&mut self, page: usize, from: usize, to: usize, fill: u8) {
        let Some(text) = self.text.get_mut(page) else {
            return;
        };
        let to = to.min(text.height());
        if from >= to {
            return;
        }
        text.scroll_up(from, to, fill);
        if !self.mode.is_text() {
            let fh = self.mode.font_height;
            let right = self.mode.pixel_width.saturating_sub(1);
            let fill = self.pixel_fill(fill);
            if let Some(pixels) = self.pixels.get_mut(page) {
                if to - from > 1 {
                    pixels.move_rect(Rect::new(0, (from + 1) * fh, right, to * fh - 1), 0, from * fh);
                }
                pixels.fill_rect(Rect::new(0, (to - 1) * fh, right, to * fh - 1), fill);
            }
        }
    }

    /// Scroll rows `from..to` down by one row; row `from` is blanked.
    pub fn scroll_down(&mut self, page: usize, from: usize, to: usize, fill: u8) {
        let Some(text) = self.text.get_mut(page) else {
            return;
        };
        let to = to.min(text.height());
        if from >= to {
            return;
        }
        text.scroll_down(from, to, fill);
        if !self.mode.is_text() {
            let fh = self.mode.font_height;
            let right = self.mode.pixel_width.saturating_sub(1);
            let fill = self.pixel_fill(fill);
            if let Some(pixels) = self.pixels.get_mut(page) {
                if to - from > 1 {
                    pixels.move_rect(Rect::new(0, from * fh, right, (to - 1) * fh - 1), 0, (from + 1) * fh);
                }
                pixels.fill_rect(Rect::new(0, from * fh, right, (from + 1) * fh - 1), fill);
            }
        }
    }

    /// Pixel attribute used when a text fill blanks graphics rows
    fn pixel_fill(&self, fill: u8) -> u8 {
        fill & self.mode.max_attr()
    }

    // pixels

    pub fn get_pixel(&self, page: usize, x: usize, y: usize) -> u8 {
        self.pixels.get(page).map_or(0, |p| p.get_pixel(x, y))
    }

    pub fn put_pixel(&mut self, page: usize, x: usize, y: usize, attr: u8) {
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        pixels.put_pixel(x, y, attr);
        if let Some(touched) = pixels.clip(Rect::new(x, y, x, y)) {
            self.invalidate(page, touched);
        }
    }

    pub fn get_interval(&self, page: usize, x: usize, y: usize, len: usize) -> Vec<u8> {
        match self.pixels.get(page) {
            Some(p) => p.get_interval(x, y, len),
            None => vec![0; len],
        }
    }

    pub fn put_interval(&mut self, page: usize, x: usize, y: usize, colours: &[u8]) {
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        pixels.put_interval(x, y, colours);
        if let Some(touched) = Rect::sized(x, y, colours.len(), 1).and_then(|r| pixels.clip(r)) {
            self.invalidate(page, touched);
        }
    }

    pub fn fill_interval(&mut self, page: usize, x0: usize, x1: usize, y: usize, attr: u8) {
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        pixels.fill_interval(x0, x1, y, attr);
        if let Some(touched) = pixels.clip(Rect::new(x0, y, x1, y)) {
            self.invalidate(page, touched);
        }
    }

    pub fn get_rect(&self, page: usize, rect: Rect) -> Vec<Vec<u8>> {
        match self.pixels.get(page) {
            Some(p) => p.get_rect(rect),
            None => vec![vec![0; rect.width()]; rect.height()],
        }
    }

    pub fn put_rect(&mut self, page: usize, x0: usize, y0: usize, rows: &[Vec<u8>]) {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        pixels.put_rect(x0, y0, rows);
        if let Some(touched) = Rect::sized(x0, y0, width, rows.len()).and_then(|r| pixels.clip(r)) {
            self.invalidate(page, touched);
        }
    }

    pub fn fill_rect(&mut self, page: usize, rect: Rect, attr: u8) {
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        pixels.fill_rect(rect, attr);
        if let Some(touched) = pixels.clip(rect) {
            self.invalidate(page, touched);
        }
    }

    /// Copy a pixel rectangle within a page
    pub fn move_rect(&mut self, page: usize, src: Rect, dst_x: usize, dst_y: usize) {
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        let Some(dst) = Rect::sized(dst_x, dst_y, src.width(), src.height()).and_then(|r| pixels.clip(r)) else {
            return;
        };
        let Some(src) = Rect::sized(src.x0, src.y0, dst.width(), dst.height()) else {
            return;
        };
        pixels.move_rect(src, dst.x0, dst.y0);
        self.invalidate(page, dst);
    }

    /// Draw a character bitmap into a cell without touching the text layer.
    ///
    /// Each bitmap row holds up to 8 pixels, most significant bit leftmost.
    pub fn draw_glyph(&mut self, page: usize, row: usize, col: usize, bitmap: &[u8], fg: u8, bg: u8) {
        let fw = self.mode.font_width;
        let fh = self.mode.font_height;
        let Some(pixels) = self.pixels.get_mut(page) else {
            return;
        };
        for (dy, bits) in bitmap.iter().take(fh).enumerate() {
            let line: Vec<u8> = (0..fw.min(8))
                .map(|dx| if bits & (0x80 >> dx) != 0 { fg } else { bg })
                .collect();
            pixels.put_interval(col * fw, row * fh + dy, &line);
        }
    }

    /// Pixel rectangle covered by a text cell
    pub fn cell_rect(&self, row: usize, col: usize) -> Rect {
        let fw = self.mode.font_width;
        let fh = self.mode.font_height;
        Rect::new(col * fw, row * fh, (col + 1) * fw - 1, (row + 1) * fh - 1)
    }

    /// Copy every cell and pixel of one page onto another.
    pub fn copy_page(&mut self, src: usize, dst: usize) {
        if src == dst || src >= self.num_pages() || dst >= self.num_pages() {
            return;
        }
        self.text[dst] = self.text[src].clone();
        self.pixels[dst] = self.pixels[src].clone();
    }

    /// Blank the text cells a pixel write covered.
    fn invalidate(&mut self, page: usize, rect: Rect) {
        if self.mode.is_text() {
            return;
        }
        let fw = self.mode.font_width.max(1);
        let fh = self.mode.font_height.max(1);
        let Some(text) = self.text.get_mut(page) else {
            return;
        };
        let last_row = (rect.y1 / fh).min(text.height().saturating_sub(1));
        for row in rect.y0 / fh..=last_row {
            if let Some(text_row) = text.row_mut(row) {
                let start = rect.x0 / fw;
                let stop = rect.x1 / fw + 1;
                text_row.clear_range(start, stop, 0);
            }
        }
    }

    /// Text of one page, trailing blanks trimmed
    pub fn page_text(&self, page: usize) -> Vec<String> {
        self.text.get(page).map(TextPage::to_lines).unwrap_or_default()
    }
}
