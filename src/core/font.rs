//! Character bitmaps for graphics-mode text
//!
//! Glyph rasterisation happens outside this crate; a `Font` only carries
//! the resulting bitmaps, one byte per scanline, most significant bit left.

/// 256 glyph bitmaps of one cell height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Font {
    height: usize,
    data: Vec<u8>,
}

impl Font {
    /// Build a font from `256 * height` bytes. Missing glyphs are blank.
    pub fn new(height: usize, mut data: Vec<u8>) -> Self {
        data.resize(256 * height, 0);
        Self { height, data }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Bitmap of a glyph
    pub fn glyph(&self, code: u8) -> &[u8] {
        let start = usize::from(code) * self.height;
        &self.data[start..start + self.height]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_pads_missing_glyphs() {
        let font = Font::new(8, vec![0xFF; 16]);
        assert_eq!(font.glyph(1), &[0xFF; 8]);
        assert_eq!(font.glyph(2), &[0; 8]);
        assert_eq!(font.glyph(255).len(), 8);
    }
}
