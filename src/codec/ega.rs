//! EGA planar layout
//!
//! Each plane holds one bit of every pixel, eight pixels per byte. The CPU
//! reads one plane at a time (the read plane) and writes to every plane
//! selected by the write mask at once.

use std::ops::Range;

use super::{row_codec_impl, Layout, RowCodec, RowRun};
use crate::core::ScreenBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EgaCodec {
    layout: Layout,
    /// Pixel bit `i` is stored in plane `planes[i]`
    pub(super) planes: &'static [u8],
    pub(super) read_plane: u8,
    pub(super) write_mask: u8,
}

impl EgaCodec {
    pub fn new(layout: Layout, planes: &'static [u8]) -> Self {
        Self {
            layout,
            planes,
            read_plane: 0,
            write_mask: 0x0F,
        }
    }

    /// Copy with different plane registers
    pub fn with_registers(&self, read_plane: u8, write_mask: u8) -> Self {
        Self {
            read_plane,
            write_mask,
            ..self.clone()
        }
    }

    /// Pixel bit returned by reads, if the read plane is in use
    fn read_bit(&self) -> Option<usize> {
        self.planes.iter().position(|&p| p == self.read_plane)
    }

    /// Pixel bits changed by writes
    fn write_bits(&self) -> Vec<usize> {
        self.planes
            .iter()
            .enumerate()
            .filter(|&(_, &plane)| self.write_mask & (1 << plane) != 0)
            .map(|(bit, _)| bit)
            .collect()
    }
}

impl RowCodec for EgaCodec {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn decode_run(&self, buf: &ScreenBuffer, run: &RowRun, out: &mut [u8]) {
        let Some(bit) = self.read_bit() else {
            return;
        };
        let pixels = buf.get_interval(run.page, run.col_byte * 8, run.y, run.len * 8);
        for (byte, chunk) in out.iter_mut().zip(pixels.chunks(8)) {
            *byte = chunk.iter().fold(0, |acc, &p| (acc << 1) | ((p >> bit) & 1));
        }
    }

    fn encode_run(&self, buf: &mut ScreenBuffer, run: &RowRun, bytes: &[u8]) {
        let bits = self.write_bits();
        if bits.is_empty() {
            return;
        }
        let x = run.col_byte * 8;
        let mut pixels = buf.get_interval(run.page, x, run.y, run.len * 8);
        for (chunk, &byte) in pixels.chunks_mut(8).zip(bytes) {
            for (k, pixel) in chunk.iter_mut().enumerate() {
                let on = (byte >> (7 - k)) & 1;
                for &bit in &bits {
                    *pixel = (*pixel & !(1 << bit)) | (on << bit);
                }
            }
        }
        buf.put_interval(run.page, x, run.y, &pixels);
    }

    fn columns(&self, run: &RowRun) -> Range<usize> {
        run.col_byte * 8..(run.col_byte + run.len) * 8
    }
}

row_codec_impl!(EgaCodec);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{Codec, MemoryCodec};
    use crate::core::{Adapter, Charset, ModeCatalog};

    fn setup(adapter: Adapter, number: u8) -> (Codec, ScreenBuffer) {
        let mode = ModeCatalog::new(adapter, 0).find(number, None).unwrap();
        (Codec::for_mode(&mode), ScreenBuffer::new(mode, Charset::Sbcs, false))
    }

    #[test]
    fn test_write_mask_isolates_planes() {
        let (mut codec, mut buf) = setup(Adapter::Ega, 9);
        codec.set_write_mask(0b0100);
        codec.encode(&mut buf, 0, &[0xFF]);
        assert_eq!(buf.get_interval(0, 0, 0, 8), vec![4; 8]);

        codec.set_write_mask(0b0001);
        codec.encode(&mut buf, 0, &[0x0F]);
        assert_eq!(buf.get_interval(0, 0, 0, 8), vec![4, 4, 4, 4, 5, 5, 5, 5]);
    }

    #[test]
    fn test_read_plane_selects_bit() {
        let (mut codec, mut buf) = setup(Adapter::Ega, 7);
        buf.put_interval(0, 8, 1, &[0x0A, 0, 0, 0, 0, 0, 0, 0x05]);
        let offset = 40 + 1;
        codec.set_read_plane(1);
        assert_eq!(codec.decode(&buf, offset, 1), vec![0x80]);
        codec.set_read_plane(0);
        assert_eq!(codec.decode(&buf, offset, 1), vec![0x01]);
        codec.set_read_plane(2);
        assert_eq!(codec.decode(&buf, offset, 1), vec![0x01]);
        codec.set_read_plane(3);
        assert_eq!(codec.decode(&buf, offset, 1), vec![0x80]);
    }

    #[test]
    fn test_mono_planes_zero_and_two() {
        let (mut codec, mut buf) = setup(Adapter::EgaMono, 10);
        codec.set_write_mask(0b0100);
        codec.encode(&mut buf, 0, &[0x80]);
        assert_eq!(buf.get_pixel(0, 0, 0), 2);

        // planes 1 and 3 are not wired
        codec.set_read_plane(1);
        assert_eq!(codec.decode(&buf, 0, 1), vec![0]);
        codec.set_write_mask(0b1010);
        codec.encode(&mut buf, 0, &[0xFF]);
        assert_eq!(buf.get_pixel(0, 1, 0), 0);
    }
}
