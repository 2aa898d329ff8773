//! Text rows
//!
//! A row is the cells of one text line together with the DBCS marker of
//! every cell and the logical-line wrap flag.

use super::cell::{DbcsMarker, TextCell};

/// A row of cells on a text page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRow {
    cells: Vec<TextCell>,
    markers: Vec<DbcsMarker>,
    /// True if the logical line continues on the next row
    wrap: bool,
}

impl TextRow {
    /// Create a row of blanks in the given attribute
    pub fn new(width: usize, attr: u8) -> Self {
        Self {
            cells: vec![TextCell::blank(attr); width],
            markers: vec![DbcsMarker::Single; width],
            wrap: false,
        }
    }

    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Cell at a column; a blank for columns past the end
    pub fn cell(&self, col: usize) -> TextCell {
        self.cells.get(col).copied().unwrap_or(TextCell::BLANK)
    }

    pub fn cells(&self) -> &[TextCell] {
        &self.cells
    }

    /// Overwrite one cell. Returns false if the column is out of range.
    pub fn set(&mut self, col: usize, cell: TextCell) -> bool {
        match self.cells.get_mut(col) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn marker(&self, col: usize) -> DbcsMarker {
        self.markers.get(col).copied().unwrap_or_default()
    }

    pub fn markers(&self) -> &[DbcsMarker] {
        &self.markers
    }

    pub(crate) fn set_marker(&mut self, col: usize, marker: DbcsMarker) {
        if let Some(slot) = self.markers.get_mut(col) {
            *slot = marker;
        }
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrap
    }

    pub fn set_wrapped(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    /// Glyph bytes of the row
    pub fn glyphs(&self) -> Vec<u8> {
        self.cells.iter().map(|c| c.glyph).collect()
    }

    /// Blank every cell with the given attribute
    pub fn clear(&mut self, attr: u8) {
        self.cells.fill(TextCell::blank(attr));
        self.markers.fill(DbcsMarker::Single);
        self.wrap = false;
    }

    /// Blank the cells in `start..stop`
    pub fn clear_range(&mut self, start: usize, stop: usize, attr: u8) {
        let stop = stop.min(self.cells.len());
        if start >= stop {
            return;
        }
        self.cells[start..stop].fill(TextCell::blank(attr));
        self.markers[start..stop].fill(DbcsMarker::Single);
    }

    /// Printable rendition of the row, trailing blanks trimmed
    pub fn to_text(&self) -> String {
        self.text_range(0, self.cells.len())
    }

    /// Printable rendition of columns `start..stop`, trailing blanks trimmed
    pub fn text_range(&self, start: usize, stop: usize) -> String {
        let stop = stop.min(self.cells.len());
        let start = start.min(stop);
        let text: String = self.cells[start..stop]
            .iter()
            .map(|c| match c.glyph {
                0 => ' ',
                g if g.is_ascii_graphic() || g == b' ' => char::from(g),
                _ => '.',
            })
            .collect();
        text.trim_end().to_string()
    }
}
