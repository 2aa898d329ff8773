//! Video memory codecs
//!
//! Translate between byte ranges of the video memory window and the
//! logical cells and pixels of a [`ScreenBuffer`]. Offsets are relative to
//! the start of the mode's video segment. Bytes that fall outside every
//! page, or into the unused tail of a page, read as zero and are dropped on
//! write.
//!
//! All layouts share one addressing scheme:
//!
//! ```text
//! page     = offset / page_size
//! bank     = (offset % page_size) / bank_size
//! row      = (offset % bank_size) / bytes_per_row
//! y        = bank + interleave * row
//! col_byte = (offset % bank_size) % bytes_per_row
//! ```
//!
//! Unbanked layouts use `bank_size == page_size` and an interleave of 1.

mod cga;
mod ega;
mod tandy;
mod text;

use std::ops::Range;

use tracing::trace;

use crate::core::{CodecFamily, ScreenBuffer, VideoModeDescriptor};

pub use cga::CgaCodec;
pub use ega::EgaCodec;
pub use tandy::Tandy6Codec;
pub use text::TextCodec;

/// Conversion between video memory bytes and screen contents
pub trait MemoryCodec {
    /// Read `len` bytes starting at `offset`
    fn decode(&self, buf: &ScreenBuffer, offset: usize, len: usize) -> Vec<u8>;
    /// Write `bytes` starting at `offset`
    fn encode(&self, buf: &mut ScreenBuffer, offset: usize, bytes: &[u8]);
}

/// Address geometry of one mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub page_size: usize,
    pub bank_size: usize,
    pub bytes_per_row: usize,
    pub interleave: usize,
    pub num_pages: usize,
    /// Text rows (text modes) or scanlines (graphics modes) per page
    pub rows: usize,
}

impl Layout {
    pub fn for_mode(mode: &VideoModeDescriptor) -> Self {
        let bank_size = if mode.bank_size == 0 {
            mode.page_size
        } else {
            mode.bank_size
        };
        Self {
            page_size: mode.page_size,
            bank_size,
            bytes_per_row: mode.bytes_per_row().max(1),
            interleave: mode.interleave_times.max(1),
            num_pages: mode.num_pages,
            rows: if mode.is_text() {
                mode.text_height
            } else {
                mode.pixel_height
            },
        }
    }

    /// Size of the addressable range across all pages
    pub fn memory_size(&self) -> usize {
        self.num_pages * self.page_size
    }

    /// Split a byte range into runs that each stay on one row.
    pub fn runs(&self, offset: usize, len: usize) -> Vec<RowRun> {
        let mut runs = Vec::new();
        let mut pos = 0;
        while pos < len {
            let addr = offset + pos;
            let page = addr / self.page_size;
            let in_page = addr % self.page_size;
            let bank = in_page / self.bank_size;
            let in_bank = in_page % self.bank_size;
            let row = in_bank / self.bytes_per_row;
            let col_byte = in_bank % self.bytes_per_row;
            let y = bank + self.interleave * row;
            let n = (len - pos)
                .min(self.bytes_per_row - col_byte)
                .min(self.bank_size - in_bank);
            runs.push(RowRun {
                start: pos,
                page,
                y,
                col_byte,
                len: n,
                valid: page < self.num_pages && y < self.rows && bank < self.interleave,
            });
            pos += n;
        }
        runs
    }
}

/// Consecutive bytes that map onto a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRun {
    /// Index of the first byte within the caller's range
    pub start: usize,
    pub page: usize,
    /// Text row or scanline
    pub y: usize,
    /// Byte offset of the first byte within the row
    pub col_byte: usize,
    pub len: usize,
    /// False for bytes outside every page or row
    pub valid: bool,
}

/// A region of one row touched by a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub page: usize,
    /// Text row or scanline
    pub row: usize,
    /// Columns (text) or pixels (graphics)
    pub cols: Range<usize>,
}

/// A codec that works one row run at a time
trait RowCodec {
    fn layout(&self) -> &Layout;
    fn decode_run(&self, buf: &ScreenBuffer, run: &RowRun, out: &mut [u8]);
    fn encode_run(&self, buf: &mut ScreenBuffer, run: &RowRun, bytes: &[u8]);
    /// Columns or pixels a run covers
    fn columns(&self, run: &RowRun) -> Range<usize>;
}

fn decode_runs<C: RowCodec>(codec: &C, buf: &ScreenBuffer, offset: usize, len: usize) -> Vec<u8> {
    let mut out = vec![0; len];
    for run in codec.layout().runs(offset, len).iter().filter(|r| r.valid) {
        codec.decode_run(buf, run, &mut out[run.start..run.start + run.len]);
    }
    out
}

fn encode_runs<C: RowCodec>(codec: &C, buf: &mut ScreenBuffer, offset: usize, bytes: &[u8]) {
    for run in codec.layout().runs(offset, bytes.len()) {
        if run.valid {
            codec.encode_run(buf, &run, &bytes[run.start..run.start + run.len]);
        } else {
            trace!(offset = offset + run.start, len = run.len, "dropped write outside video pages");
        }
    }
}

macro_rules! row_codec_impl {
    ($codec:ty) => {
        impl $crate::codec::MemoryCodec for $codec {
            fn decode(&self, buf: &$crate::core::ScreenBuffer, offset: usize, len: usize) -> Vec<u8> {
                $crate::codec::decode_runs(self, buf, offset, len)
            }

            fn encode(&self, buf: &mut $crate::core::ScreenBuffer, offset: usize, bytes: &[u8]) {
                $crate::codec::encode_runs(self, buf, offset, bytes)
            }
        }
    };
}
use row_codec_impl;

/// The codec of the active mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Codec {
    Text(TextCodec),
    Cga(CgaCodec),
    Ega(EgaCodec),
    Tandy6(Tandy6Codec),
}

impl Codec {
    pub fn for_mode(mode: &VideoModeDescriptor) -> Self {
        let layout = Layout::for_mode(mode);
        match mode.family {
            CodecFamily::Text => Codec::Text(TextCodec::new(layout)),
            CodecFamily::Cga => Codec::Cga(CgaCodec::new(layout, mode.bits_per_pixel)),
            CodecFamily::Ega => Codec::Ega(EgaCodec::new(layout, mode.planes)),
            CodecFamily::Tandy6 => Codec::Tandy6(Tandy6Codec::new(layout)),
        }
    }

    pub fn layout(&self) -> &Layout {
        match self {
            Codec::Text(c) => c.layout(),
            Codec::Cga(c) => c.layout(),
            Codec::Ega(c) => c.layout(),
            Codec::Tandy6(c) => c.layout(),
        }
    }

    /// Select the EGA plane that reads return. No effect on other layouts.
    pub fn set_read_plane(&mut self, plane: u8) {
        if let Codec::Ega(c) = self {
            c.read_plane = plane & 0x03;
        }
    }

    /// Select the EGA planes that writes go to. No effect on other layouts.
    pub fn set_write_mask(&mut self, mask: u8) {
        if let Codec::Ega(c) = self {
            c.write_mask = mask & 0x0F;
        }
    }

    /// Read plane and write mask, for EGA layouts
    pub fn plane_registers(&self) -> Option<(u8, u8)> {
        match self {
            Codec::Ega(c) => Some((c.read_plane, c.write_mask)),
            _ => None,
        }
    }

    /// Rows and columns a write to `offset..offset+len` touches
    pub fn spans(&self, offset: usize, len: usize) -> Vec<Span> {
        self.layout()
            .runs(offset, len)
            .into_iter()
            .filter(|run| run.valid)
            .map(|run| Span {
                page: run.page,
                row: run.y,
                cols: self.columns(&run),
            })
            .collect()
    }

    /// Whole video memory, one buffer per EGA plane in use (a single
    /// buffer for other layouts).
    pub fn dump(&self, buf: &ScreenBuffer) -> Vec<Vec<u8>> {
        let size = self.layout().memory_size();
        match self {
            Codec::Ega(ega) => ega
                .planes
                .iter()
                .map(|&plane| ega.with_registers(plane, 0).decode(buf, 0, size))
                .collect(),
            _ => vec![self.decode(buf, 0, size)],
        }
    }

    /// Inverse of [`Codec::dump`]
    pub fn load(&self, buf: &mut ScreenBuffer, dump: &[Vec<u8>]) {
        match self {
            Codec::Ega(ega) => {
                for (&plane, data) in ega.planes.iter().zip(dump) {
                    ega.with_registers(0, 1 << plane).encode(buf, 0, data);
                }
            }
            _ => {
                if let Some(data) = dump.first() {
                    self.encode(buf, 0, data);
                }
            }
        }
    }

    fn columns(&self, run: &RowRun) -> Range<usize> {
        match self {
            Codec::Text(c) => c.columns(run),
            Codec::Cga(c) => c.columns(run),
            Codec::Ega(c) => c.columns(run),
            Codec::Tandy6(c) => c.columns(run),
        }
    }
}

impl MemoryCodec for Codec {
    fn decode(&self, buf: &ScreenBuffer, offset: usize, len: usize) -> Vec<u8> {
        match self {
            Codec::Text(c) => c.decode(buf, offset, len),
            Codec::Cga(c) => c.decode(buf, offset, len),
            Codec::Ega(c) => c.decode(buf, offset, len),
            Codec::Tandy6(c) => c.decode(buf, offset, len),
        }
    }

    fn encode(&self, buf: &mut ScreenBuffer, offset: usize, bytes: &[u8]) {
        match self {
            Codec::Text(c) => c.encode(buf, offset, bytes),
            Codec::Cga(c) => c.encode(buf, offset, bytes),
            Codec::Ega(c) => c.encode(buf, offset, bytes),
            Codec::Tandy6(c) => c.encode(buf, offset, bytes),
        }
    }
}

/// Pack pixels into a byte, leftmost pixel in the most significant bits.
fn pack(pixels: &[u8], bits: usize) -> u8 {
    let mask = (1u8 << bits) - 1;
    pixels.iter().fold(0u8, |acc, &p| (acc << bits) | (p & mask))
}

/// Inverse of [`pack`]
fn unpack(byte: u8, bits: usize) -> impl Iterator<Item = u8> {
    let mask = (1u8 << bits) - 1;
    (0..8 / bits).map(move |k| (byte >> (8 - bits * (k + 1))) & mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Adapter, Charset, ModeCatalog};

    fn setup(adapter: Adapter, number: u8, width: Option<usize>) -> (Codec, ScreenBuffer) {
        let mode = ModeCatalog::new(adapter, 0x10000).find(number, width).unwrap();
        let buf = ScreenBuffer::new(mode.clone(), Charset::Sbcs, false);
        (Codec::for_mode(&mode), buf)
    }

    #[test]
    fn test_pack_unpack() {
        assert_eq!(pack(&[3, 3, 0, 0], 2), 0xF0);
        assert_eq!(unpack(0xF0, 2).collect::<Vec<_>>(), vec![3, 3, 0, 0]);
        assert_eq!(unpack(0xA5, 1).collect::<Vec<_>>(), vec![1, 0, 1, 0, 0, 1, 0, 1]);
        assert_eq!(pack(&[0x1F], 4), 0x0F);
    }

    #[test]
    fn test_runs_split_at_rows_and_banks() {
        let (codec, _) = setup(Adapter::Cga, 1, None);
        let runs = codec.layout().runs(70, 20);
        assert_eq!(runs.len(), 2);
        assert_eq!((runs[0].y, runs[0].col_byte, runs[0].len), (0, 70, 10));
        assert_eq!((runs[1].y, runs[1].col_byte, runs[1].len), (2, 0, 10));

        let odd = codec.layout().runs(0x2000, 1);
        assert_eq!(odd[0].y, 1);

        // tail of the even bank lies past the last scanline
        let tail = codec.layout().runs(0x1F40, 4);
        assert!(!tail[0].valid);
    }

    #[test]
    fn test_out_of_range_reads_zero() {
        let (codec, mut buf) = setup(Adapter::Cga, 2, None);
        codec.encode(&mut buf, 0x4000, &[0xFF; 8]);
        assert_eq!(codec.decode(&buf, 0x3FF0, 0x20), vec![0; 0x20]);
    }

    #[test]
    fn test_spans() {
        let (codec, _) = setup(Adapter::Cga, 0, Some(40));
        let spans = codec.spans(0x50 - 2, 5);
        assert_eq!(spans, vec![
            Span { page: 0, row: 0, cols: 39..40 },
            Span { page: 0, row: 1, cols: 0..2 },
        ]);
    }

    #[test]
    fn test_dump_and_load_planes() {
        let (codec, mut buf) = setup(Adapter::Ega, 9, None);
        buf.put_pixel(1, 5, 7, 0x0A);
        let dump = codec.dump(&buf);
        assert_eq!(dump.len(), 4);
        assert_eq!(dump[0].len(), 0x10000);

        let (codec2, mut restored) = setup(Adapter::Ega, 9, None);
        codec2.load(&mut restored, &dump);
        assert_eq!(restored.get_pixel(1, 5, 7), 0x0A);
    }
}
