//! Text cells
//!
//! A cell is one character position of a text page: a glyph byte in the
//! active codepage plus an attribute byte, exactly as stored in video RAM.

use serde::{Deserialize, Serialize};

use super::mode::VideoModeDescriptor;
use super::palette::ColourSource;

/// A single character position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextCell {
    pub glyph: u8,
    pub attr: u8,
}

impl Default for TextCell {
    fn default() -> Self {
        Self::BLANK
    }
}

impl TextCell {
    /// What a cell holds after its pixels were overdrawn in a graphics mode.
    pub const BLANK: TextCell = TextCell {
        glyph: b' ',
        attr: 0,
    };

    pub fn new(glyph: u8, attr: u8) -> Self {
        Self { glyph, attr }
    }

    /// A space in the given attribute
    pub fn blank(attr: u8) -> Self {
        Self { glyph: b' ', attr }
    }

    pub fn is_blank(&self) -> bool {
        self.glyph == b' ' || self.glyph == 0
    }

    /// Split the attribute byte into the colours a renderer needs.
    pub fn split_attr(&self, mode: &VideoModeDescriptor) -> AttrParts {
        AttrParts::split(self.attr, mode)
    }
}

/// An attribute byte decoded for the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttrParts {
    pub fg: u8,
    pub bg: u8,
    pub blink: bool,
    pub underline: bool,
}

impl AttrParts {
    pub fn split(attr: u8, mode: &VideoModeDescriptor) -> Self {
        if !mode.is_text() {
            // graphics modes print in a pixel attribute on background 0
            return Self {
                fg: attr & mode.max_attr(),
                ..Self::default()
            };
        }
        let fg = attr & 0x0F;
        let (bg, blink) = if mode.has_blink {
            ((attr >> 4) & 0x07, attr & 0x80 != 0)
        } else {
            (attr >> 4, false)
        };
        let underline = mode.colours == ColourSource::Mono && fg & 0x07 == 1 && bg == 0;
        Self {
            fg,
            bg,
            blink,
            underline,
        }
    }

    /// Inverse of [`AttrParts::split`] for text modes.
    pub fn join(&self) -> u8 {
        (self.fg & 0x0F) | ((self.bg & 0x0F) << 4) | if self.blink { 0x80 } else { 0 }
    }
}

/// Double-byte character set role of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DbcsMarker {
    #[default]
    Single,
    /// First byte of a double-width character; always followed by `Trail`
    Lead,
    Trail,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::{Adapter, ModeCatalog};

    #[test]
    fn test_blank_cell() {
        let cell = TextCell::default();
        assert_eq!(cell, TextCell::BLANK);
        assert!(cell.is_blank());
        assert!(!TextCell::new(b'A', 7).is_blank());
    }

    #[test]
    fn test_split_colour_attr() {
        let catalog = ModeCatalog::new(Adapter::Cga, 0);
        let text = catalog.find(0, Some(80)).unwrap();
        let parts = AttrParts::split(0x9E, &text);
        assert_eq!(parts.fg, 0x0E);
        assert_eq!(parts.bg, 0x01);
        assert!(parts.blink);
        assert!(!parts.underline);
        assert_eq!(parts.join(), 0x9E);
    }

    #[test]
    fn test_split_mono_underline() {
        let catalog = ModeCatalog::new(Adapter::Mda, 0);
        let text = catalog.find(0, None).unwrap();
        assert!(AttrParts::split(0x01, &text).underline);
        assert!(AttrParts::split(0x09, &text).underline);
        assert!(!AttrParts::split(0x07, &text).underline);
    }

    #[test]
    fn test_split_graphics_attr() {
        let catalog = ModeCatalog::new(Adapter::Cga, 0);
        let screen1 = catalog.find(1, None).unwrap();
        let parts = AttrParts::split(0x17, &screen1);
        assert_eq!(parts.fg, 3);
        assert_eq!(parts.bg, 0);
    }
}
