//! Property tests for the video memory codecs
//!
//! Any byte range that lies inside the addressable pages reads back
//! exactly as written, and memory outside the video window is inert.

use proptest::prelude::*;
use retro_video::codec::{Codec, MemoryCodec};
use retro_video::core::{Adapter, Charset, ModeCatalog, Screen, ScreenBuffer, ScreenSettings};
use retro_video::render::RenderSender;

/// Modes whose every stored bit is visible through a single read
const MODES: &[(Adapter, u8, Option<usize>)] = &[
    (Adapter::Cga, 0, Some(40)),
    (Adapter::Cga, 0, Some(80)),
    (Adapter::Cga, 1, None),
    (Adapter::Cga, 2, None),
    (Adapter::Tandy, 3, None),
    (Adapter::Tandy, 5, None),
    (Adapter::Tandy, 6, None),
    (Adapter::Pcjr, 4, None),
    (Adapter::Ega, 7, None),
    (Adapter::Ega, 9, None),
    (Adapter::Mda, 0, None),
];

fn setup(index: usize) -> (Codec, ScreenBuffer) {
    let (adapter, number, width) = MODES[index];
    let mode = ModeCatalog::new(adapter, 0x10000).find(number, width).unwrap();
    (Codec::for_mode(&mode), ScreenBuffer::new(mode, Charset::Sbcs, false))
}

proptest! {
    #[test]
    fn decode_returns_what_encode_wrote(
        index in 0..MODES.len(),
        start in 0usize..0x10000,
        bytes in prop::collection::vec(any::<u8>(), 1..48),
    ) {
        let (codec, mut buf) = setup(index);
        let size = codec.layout().memory_size();
        let offset = start % size;
        prop_assume!(codec.layout().runs(offset, bytes.len()).iter().all(|r| r.valid));

        codec.encode(&mut buf, offset, &bytes);
        prop_assert_eq!(codec.decode(&buf, offset, bytes.len()), bytes);
    }

    #[test]
    fn writes_past_the_pages_change_nothing(
        index in 0..MODES.len(),
        extra in 0usize..0x1000,
        bytes in prop::collection::vec(any::<u8>(), 1..32),
    ) {
        let (codec, mut buf) = setup(index);
        let before = codec.dump(&buf);
        let offset = codec.layout().memory_size() + extra;
        codec.encode(&mut buf, offset, &bytes);
        prop_assert_eq!(codec.dump(&buf), before);
        prop_assert_eq!(codec.decode(&buf, offset, bytes.len()), vec![0; bytes.len()]);
    }

    #[test]
    fn peek_outside_window_is_zero(address in 0u32..0xA0000, value in any::<u8>()) {
        let mut screen = Screen::new(ScreenSettings::default(), RenderSender::detached()).unwrap();
        let before = screen.snapshot();
        screen.poke(address, value);
        prop_assert_eq!(screen.peek(address), 0);
        prop_assert_eq!(screen.snapshot(), before);
    }

    #[test]
    fn ega_write_mask_leaves_other_planes(mask in 0u8..16, value in any::<u8>(), x in 0usize..80) {
        let (mut codec, mut buf) = setup(9);
        // every pixel starts with all four bits set
        codec.set_write_mask(0x0F);
        codec.encode(&mut buf, x, &[0xFF]);

        codec.set_write_mask(mask);
        codec.encode(&mut buf, x, &[value]);
        for bit in 0..4u8 {
            codec.set_read_plane(bit);
            let expected = if mask & (1 << bit) != 0 { value } else { 0xFF };
            prop_assert_eq!(codec.decode(&buf, x, 1), vec![expected]);
        }
    }
}

/// Memory of the given size filled with a repeating non-trivial pattern
fn pattern(fill: &[u8], size: usize) -> Vec<u8> {
    (0..size).map(|i| fill[i % fill.len()] ^ (i as u8)).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn writing_back_a_read_leaves_memory_alone(
        index in 0..MODES.len(),
        fill in prop::collection::vec(any::<u8>(), 1..64),
        start in 0usize..0x10000,
        len in 1usize..96,
    ) {
        let (mut codec, mut buf) = setup(index);
        let size = codec.layout().memory_size();
        let planes = codec.dump(&buf).len();
        let dump: Vec<Vec<u8>> = (0..planes)
            .map(|plane| pattern(&fill, size).into_iter().map(|b| b.rotate_left(plane as u32)).collect())
            .collect();
        codec.load(&mut buf, &dump);
        let before = codec.dump(&buf);

        let offset = start % size;
        let len = len.min(size - offset);
        prop_assume!(codec.layout().runs(offset, len).iter().all(|r| r.valid));

        // a plane written back to itself, or to no plane at all
        for plane in 0..planes as u8 {
            for mask in [1 << plane, 0] {
                codec.set_read_plane(plane);
                codec.set_write_mask(mask);
                let bytes = codec.decode(&buf, offset, len);
                codec.encode(&mut buf, offset, &bytes);
                prop_assert_eq!(&codec.dump(&buf), &before);
            }
        }
    }
}
