//! Tandy/PCjr 640x200x4 layout
//!
//! Banked like CGA, but each pair of bytes covers eight pixels: the even
//! byte carries bit 0 of every pixel and the odd byte carries bit 1.

use std::ops::Range;

use super::{row_codec_impl, Layout, RowCodec, RowRun};
use crate::core::ScreenBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tandy6Codec {
    layout: Layout,
}

impl Tandy6Codec {
    pub fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// First pixel and pixel count of the byte pairs a run touches
    fn pixel_span(run: &RowRun) -> (usize, usize) {
        let first_pair = run.col_byte / 2;
        let last_pair = (run.col_byte + run.len - 1) / 2;
        (first_pair * 8, (last_pair - first_pair + 1) * 8)
    }
}

impl RowCodec for Tandy6Codec {
    fn layout(&self) -> &Layout {
        &self.layout
    }

    fn decode_run(&self, buf: &ScreenBuffer, run: &RowRun, out: &mut [u8]) {
        let (x0, len) = Self::pixel_span(run);
        let pixels = buf.get_interval(run.page, x0, run.y, len);
        for (i, byte) in out.iter_mut().enumerate() {
            let col_byte = run.col_byte + i;
            let group = &pixels[col_byte / 2 * 8 - x0..][..8];
            let bit = col_byte % 2;
            *byte = group.iter().fold(0, |acc, &p| (acc << 1) | ((p >> bit) & 1));
        }
    }

    fn encode_run(&self, buf: &mut ScreenBuffer, run: &RowRun, bytes: &[u8]) {
        let (x0, len) = Self::pixel_span(run);
        let mut pixels = buf.get_interval(run.page, x0, run.y, len);
        for (i, &byte) in bytes.iter().enumerate() {
            let col_byte = run.col_byte + i;
            let bit = col_byte % 2;
            let start = col_byte / 2 * 8 - x0;
            for (k, pixel) in pixels[start..start + 8].iter_mut().enumerate() {
                let on = (byte >> (7 - k)) & 1;
                *pixel = (*pixel & !(1 << bit)) | (on << bit);
            }
        }
        buf.put_interval(run.page, x0, run.y, &pixels);
    }

    fn columns(&self, run: &RowRun) -> Range<usize> {
        let (x0, len) = Self::pixel_span(run);
        x0..x0 + len
    }
}

row_codec_impl!(Tandy6Codec);
