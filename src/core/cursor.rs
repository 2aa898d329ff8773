//! Cursor state
//!
//! Tracks the cursor position, its scanline shape within the character
//! cell, visibility and the attribute it is drawn in. Blink phases are pure
//! functions of elapsed monotonic time so that every backend agrees.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::mode::VideoModeDescriptor;

/// Half-period of the cursor blink
pub const CURSOR_BLINK_HALF_PERIOD: Duration = Duration::from_millis(133);
/// Half-period of blinking text attributes
pub const TEXT_BLINK_HALF_PERIOD: Duration = Duration::from_millis(266);

/// Cursor visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorVisibility {
    #[default]
    Hidden,
    /// Shown and blinking, as while the interpreter waits for input
    VisibleBlinking,
    /// Shown at all times
    VisibleForced,
}

impl CursorVisibility {
    pub fn is_visible(self) -> bool {
        self != CursorVisibility::Hidden
    }
}

/// Blink state of cursor and text at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlinkPhase {
    pub cursor_on: bool,
    pub text_on: bool,
}

impl BlinkPhase {
    /// Phase after `elapsed` time since the blink clock started
    pub fn at(elapsed: Duration) -> Self {
        Self {
            cursor_on: Cursor::blink_on(elapsed),
            text_on: Cursor::text_blink_on(elapsed),
        }
    }
}

/// Cursor position, shape and visibility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
    from_line: usize,
    to_line: usize,
    /// Width in pixels
    width: usize,
    font_width: usize,
    font_height: usize,
    ega_transform: bool,
    visibility: CursorVisibility,
    attr: u8,
}

impl Cursor {
    /// Cursor in the default shape of a mode
    pub fn new(mode: &VideoModeDescriptor) -> Self {
        let mut cursor = Self {
            row: 0,
            col: 0,
            from_line: 0,
            to_line: 0,
            width: 0,
            font_width: 0,
            font_height: 0,
            ega_transform: false,
            visibility: CursorVisibility::Hidden,
            attr: 0,
        };
        cursor.reset(mode);
        cursor
    }

    /// Reset shape and attribute to the mode defaults; position and
    /// visibility are kept.
    pub fn reset(&mut self, mode: &VideoModeDescriptor) {
        self.font_width = mode.font_width;
        self.font_height = mode.font_height.max(1);
        self.ega_transform = mode.adapter.has_ega_cursor();
        self.from_line = self.font_height.saturating_sub(2);
        self.to_line = self.font_height - 1;
        self.width = mode.font_width;
        self.attr = mode.cursor_index.unwrap_or(mode.default_attr);
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.from_line, self.to_line)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn attr(&self) -> u8 {
        self.attr
    }

    pub fn visibility(&self) -> CursorVisibility {
        self.visibility
    }

    pub fn set_visibility(&mut self, visibility: CursorVisibility) {
        self.visibility = visibility;
    }

    /// Set the attribute; returns whether it changed
    pub fn set_attr(&mut self, attr: u8) -> bool {
        let changed = self.attr != attr;
        self.attr = attr;
        changed
    }

    /// Double the width over a double-width character; returns whether the
    /// width changed.
    pub fn set_double_width(&mut self, double: bool) -> bool {
        let width = if double { 2 * self.font_width } else { self.font_width };
        let changed = self.width != width;
        self.width = width;
        changed
    }

    /// Set the scanline shape (LOCATE ,,, start, stop).
    ///
    /// Never fails: inputs are transformed as EGA BIOSes do for
    /// CGA-compatible values, clamped into the character cell and ordered.
    pub fn set_shape(&mut self, from: i32, to: i32) -> (usize, usize) {
        let (from, to) = if self.ega_transform {
            ega_cursor_shape(from, to, self.font_height)
        } else {
            (from, to)
        };
        let max_line = self.font_height as i32 - 1;
        let from = from.clamp(0, max_line) as usize;
        let to = to.clamp(0, max_line) as usize;
        self.from_line = from.min(to);
        self.to_line = from.max(to);
        self.shape()
    }

    /// Set the shape as saved earlier, without the EGA transform
    pub(crate) fn restore_shape(&mut self, from: usize, to: usize) {
        let max_line = self.font_height - 1;
        let (from, to) = (from.min(max_line), to.min(max_line));
        self.from_line = from.min(to);
        self.to_line = from.max(to);
    }

    /// Whether the cursor is lit `elapsed` after the blink clock started
    pub fn blink_on(elapsed: Duration) -> bool {
        (elapsed.as_millis() / CURSOR_BLINK_HALF_PERIOD.as_millis()) % 2 == 0
    }

    /// Whether blinking text is shown `elapsed` after the clock started
    pub fn text_blink_on(elapsed: Duration) -> bool {
        (elapsed.as_millis() / TEXT_BLINK_HALF_PERIOD.as_millis()) % 2 == 0
    }
}

/// Cursor start/stop emulation of EGA and VGA BIOSes.
///
/// Values that only make sense for an 8-line CGA cell are mapped onto the
/// taller EGA cell. Only applies when both values fit in 5 bits.
fn ega_cursor_shape(from: i32, to: i32, font_height: usize) -> (i32, i32) {
    let fits = |v: i32| (0..0x20).contains(&v);
    if !fits(from) || !fits(to) {
        return (from, to);
    }
    let max_line = font_height as i32 - 1;
    let (mut from, mut to) = (from, to);
    if to < from {
        if to != 0 {
            from = to;
            to = max_line;
        }
    } else if ((from | to) >= max_line || to != max_line - 1 || from != max_line) && to > 3 {
        if from + 2 < to {
            if from > 2 {
                from = (max_line + 1) / 2;
            }
            to = max_line;
        } else {
            from = from - to + max_line;
            to = max_line;
            if max_line > 0x0C {
                from -= 1;
                to -= 1;
            }
        }
    }
    (from, to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::{Adapter, ModeCatalog};

    fn cursor(adapter: Adapter, number: u8) -> Cursor {
        let mode = ModeCatalog::new(adapter, 0).find(number, None).unwrap();
        Cursor::new(&mode)
    }

    #[test]
    fn test_default_shape() {
        assert_eq!(cursor(Adapter::Cga, 0).shape(), (6, 7));
        assert_eq!(cursor(Adapter::Ega, 0).shape(), (12, 13));
        assert_eq!(cursor(Adapter::Ega, 9).attr(), 15);
    }

    #[test]
    fn test_shape_clamped() {
        let mut c = cursor(Adapter::Cga, 0);
        assert_eq!(c.set_shape(-3, 999), (0, 7));
        assert_eq!(c.set_shape(5, 2), (2, 5));
    }

    #[test]
    fn test_ega_transform() {
        let mut c = cursor(Adapter::Ega, 0);
        // CGA underline cursor maps to the bottom of the 14-line cell
        assert_eq!(c.set_shape(6, 7), (11, 12));
        // full block stays a full block
        assert_eq!(c.set_shape(0, 7), (0, 13));
        // large values are only clamped
        assert_eq!(c.set_shape(-3, 999), (0, 13));
        // small values are left alone
        assert_eq!(c.set_shape(0, 2), (0, 2));
    }

    #[test]
    fn test_double_width() {
        let mut c = cursor(Adapter::Cga, 0);
        assert_eq!(c.width(), 8);
        assert!(c.set_double_width(true));
        assert_eq!(c.width(), 16);
        assert!(!c.set_double_width(true));
    }

    #[test]
    fn test_blink_phases() {
        assert!(Cursor::blink_on(Duration::from_millis(0)));
        assert!(!Cursor::blink_on(Duration::from_millis(133)));
        assert!(Cursor::blink_on(Duration::from_millis(266)));
        assert!(Cursor::text_blink_on(Duration::from_millis(265)));
        assert!(!Cursor::text_blink_on(Duration::from_millis(266)));
        let phase = BlinkPhase::at(Duration::from_millis(140));
        assert!(!phase.cursor_on);
        assert!(phase.text_on);
    }
}
