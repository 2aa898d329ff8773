//! Text mode layout
//!
//! Two bytes per cell: the glyph at even offsets and the attribute at odd
//! offsets. The bytes between the end of one page's text and the start of
//! the next page are not backed by any cell.

use std::ops::Range;

use super::{row_codec_impl, Layout, RowCodec, RowRun};
use crate::core::{ScreenBuffer, TextCell};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextCodec {
    layout: Layout,
}

impl TextCodec {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }
}

impl RowCodec for TextCodec {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn decode_run(&self, buf: &ScreenBuffer, run: &RowRun, out: &mut [u8]) {
        for (i, byte) in out.iter_mut().enumerate() {
            let col_byte = run.col_byte + i;
            let cell = buf.get_char_attr(run.page, run.y, col_byte / 2);
            *byte = if col_byte % 2 == 0 { cell.glyph } else { cell.attr };
        }
    }

    fn encode_run(&self, buf: &mut ScreenBuffer, run: &RowRun, bytes: &[u8]) {
        let cols = self.columns(run);
        let mut cells: Vec<TextCell> = cols
            .clone()
            .map(|col| buf.get_char_attr(run.page, run.y, col))
            .collect();
        for (i, &byte) in bytes.iter().enumerate() {
            let col_byte = run.col_byte + i;
            let cell = &mut cells[col_byte / 2 - cols.start];
            if col_byte % 2 == 0 {
                cell.glyph = byte;
            } else {
                cell.attr = byte;
            }
        }
        buf.put_cells(run.page, run.y, cols.start, &cells);
    }

    fn columns(&self, run: &RowRun) -> Range<usize> {
        run.col_byte / 2..(run.col_byte + run.len - 1) / 2 + 1
    }
}

row_codec_impl!(TextCodec);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, MemoryCodec};
    use crate::core::{Adapter, Charset, ModeCatalog};

    fn setup(adapter: Adapter, width: usize) -> (Codec, ScreenBuffer) {
        let mode = ModeCatalog::new(adapter, 0).find(0, Some(width)).unwrap();
        (Codec::for_mode(&mode), ScreenBuffer::new(mode, Charset::Sbcs, false))
    }

    #[test]
    fn test_glyph_and_attr_bytes() {
        let (codec, mut buf) = setup(Adapter::Cga, 80);
        codec.encode(&mut buf, 160 + 4, b"A\x1Fb");
        assert_eq!(buf.get_char_attr(0, 1, 2), TextCell::new(b'A', 0x1F));
        assert_eq!(buf.get_char_attr(0, 1, 3), TextCell::new(b'b', 7));
        assert_eq!(codec.decode(&buf, 160 + 4, 4), b"A\x1Fb\x07".to_vec());
    }

    #[test]
    fn test_second_page() {
        let (codec, mut buf) = setup(Adapter::Cga, 40);
        codec.encode(&mut buf, 0x800 + 80, b"Z");
        assert_eq!(buf.get_char_attr(1, 1, 0).glyph, b'Z');
    }

    #[test]
    fn test_page_gap_is_not_stored() {
        let (codec, mut buf) = setup(Adapter::Cga, 80);
        // 80x25 uses 4000 of the 4096 bytes of a page
        codec.encode(&mut buf, 4000, &[b'X'; 96]);
        assert_eq!(codec.decode(&buf, 4000, 96), vec![0; 96]);
        assert_eq!(buf.get_char_attr(1, 0, 0), TextCell::blank(7));
    }

    #[test]
    fn test_mda_segment_layout() {
        let (codec, mut buf) = setup(Adapter::Mda, 80);
        codec.encode(&mut buf, 24 * 160 + 158, b"!\x70");
        assert_eq!(buf.get_char_attr(0, 24, 79), TextCell::new(b'!', 0x70));
    }
}
