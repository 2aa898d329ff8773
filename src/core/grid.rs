//! Text pages
//!
//! A 2D grid of cells for one video page. Row arguments are 0-based and
//! ranges are half-open; anything outside the page is ignored.

use super::cell::TextCell;
use super::line::TextRow;

/// One page of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPage {
    rows: Vec<TextRow>,
    width: usize,
}

impl TextPage {
    pub fn new(width: usize, height: usize, attr: u8) -> Self {
        Self {
            rows: (0..height).map(|_| TextRow::new(width, attr)).collect(),
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> Option<&TextRow> {
        self.rows.get(row)
    }

    pub fn row_mut(&mut self, row: usize) -> Option<&mut TextRow> {
        self.rows.get_mut(row)
    }

    pub fn rows(&self) -> &[TextRow] {
        &self.rows
    }

    pub fn cell(&self, row: usize, col: usize) -> TextCell {
        self.rows.get(row).map_or(TextCell::BLANK, |r| r.cell(col))
    }

    /// Move rows `from+1..to` up by one and blank row `to-1`.
    pub fn scroll_up(&mut self, from: usize, to: usize, attr: u8) {
        let to = to.min(self.rows.len());
        if from >= to {
            return;
        }
        self.rows[from..to].rotate_left(1);
        self.rows[to - 1].clear(attr);
    }

    /// Move rows `from..to-1` down by one and blank row `from`.
    pub fn scroll_down(&mut self, from: usize, to: usize, attr: u8) {
        let to = to.min(self.rows.len());
        if from >= to {
            return;
        }
        self.rows[from..to].rotate_right(1);
        self.rows[from].clear(attr);
    }

    /// Blank rows `start..stop`
    pub fn clear_rows(&mut self, start: usize, stop: usize, attr: u8) {
        let stop = stop.min(self.rows.len());
        for row in self.rows.iter_mut().take(stop).skip(start) {
            row.clear(attr);
        }
    }

    /// Text of every row, trailing blanks trimmed
    pub fn to_lines(&self) -> Vec<String> {
        self.rows.iter().map(TextRow::to_text).collect()
    }
}
