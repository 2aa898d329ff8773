//! CGA packed-pixel layout
//!
//! Scanlines are interleaved over banks (even lines in the first bank, odd
//! lines in the second, and four banks for the 32K Tandy modes). Within a
//! byte the leftmost pixel occupies the most significant bits.

use std::ops::Range;

use super::{pack, row_codec_impl, unpack, Layout, RowCodec, RowRun};
use crate::core::ScreenBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CgaCodec {
    layout: Layout,
    bits_per_pixel: usize,
}

impl CgaCodec {
    pub fn new(layout: Layout, bits_per_pixel: u8) -> Self {
        Self {
            layout,
            bits_per_pixel: usize::from(bits_per_pixel.clamp(1, 8)),
        }
    }

    fn pixels_per_byte(&self) -> usize {
        8 / self.bits_per_pixel
    }
}

impl RowCodec for CgaCodec {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn decode_run(&self, buf: &ScreenBuffer, run: &RowRun, out: &mut [u8]) {
        let ppb = self.pixels_per_byte();
        let pixels = buf.get_interval(run.page, run.col_byte * ppb, run.y, run.len * ppb);
        for (byte, chunk) in out.iter_mut().zip(pixels.chunks(ppb)) {
            *byte = pack(chunk, self.bits_per_pixel);
        }
    }

    fn encode_run(&self, buf: &mut ScreenBuffer, run: &RowRun, bytes: &[u8]) {
        let pixels: Vec<u8> = bytes
            .iter()
            .flat_map(|&b| unpack(b, self.bits_per_pixel))
            .collect();
        buf.put_interval(run.page, run.col_byte * self.pixels_per_byte(), run.y, &pixels);
    }

    fn columns(&self, run: &RowRun) -> Range<usize> {
        let ppb = self.pixels_per_byte();
        run.col_byte * ppb..(run.col_byte + run.len) * ppb
    }
}

row_codec_impl!(CgaCodec);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, MemoryCodec};
    use crate::core::{Adapter, Charset, ModeCatalog};

    fn setup(adapter: Adapter, number: u8) -> (Codec, ScreenBuffer) {
        let mode = ModeCatalog::new(adapter, 0x10000).find(number, None).unwrap();
        (Codec::for_mode(&mode), ScreenBuffer::new(mode, Charset::Sbcs, false))
    }

    #[test]
    fn test_screen1_packs_msb_first() {
        let (codec, mut buf) = setup(Adapter::Cga, 1);
        codec.encode(&mut buf, 0, &[0xF0]);
        assert_eq!(buf.get_interval(0, 0, 0, 4), vec![3, 3, 0, 0]);
        assert_eq!(codec.decode(&buf, 0, 1), vec![0xF0]);
    }

    #[test]
    fn test_screen2_one_bit_per_pixel() {
        let (codec, mut buf) = setup(Adapter::Cga, 2);
        codec.encode(&mut buf, 0, &[0xF0]);
        assert_eq!(buf.get_interval(0, 0, 0, 8), vec![1, 1, 1, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_odd_scanlines_in_second_bank() {
        let (codec, mut buf) = setup(Adapter::Cga, 1);
        buf.put_pixel(0, 4, 1, 2);
        buf.put_pixel(0, 319, 199, 1);
        assert_eq!(codec.decode(&buf, 0x2001, 1), vec![0x80]);
        assert_eq!(codec.decode(&buf, 0x2000 + 99 * 80 + 79, 1), vec![0x01]);
    }

    #[test]
    fn test_tandy_four_banks() {
        let (codec, mut buf) = setup(Adapter::Tandy, 5);
        // scanline 3 lives in the fourth bank
        codec.encode(&mut buf, 3 * 0x2000, &[0x12]);
        assert_eq!(buf.get_interval(0, 0, 3, 2), vec![1, 2]);
        // second page
        codec.encode(&mut buf, 0x8000 + 160, &[0xAB]);
        assert_eq!(buf.get_interval(1, 0, 4, 2), vec![0xA, 0xB]);
    }
}
