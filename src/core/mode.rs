//! Video mode descriptors and the per-adapter mode catalog
//!
//! A [`VideoModeDescriptor`] is an immutable record of everything that
//! differs between screen modes: geometry, memory layout and colour rules.
//! The [`ModeCatalog`] is built once at startup for the configured adapter
//! and hands out shared descriptors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ModeError;
use super::palette::ColourSource;

/// Historical display adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adapter {
    #[default]
    Cga,
    Ega,
    /// EGA on a monochrome monitor
    EgaMono,
    Vga,
    Tandy,
    Pcjr,
    Mda,
}

impl Adapter {
    /// Adapters that apply the EGA cursor-shape compatibility transform.
    pub fn has_ega_cursor(self) -> bool {
        matches!(self, Adapter::Ega | Adapter::EgaMono | Adapter::Vga | Adapter::Mda)
    }

    /// Height of the ROM text font in scanlines.
    pub fn text_font_height(self) -> usize {
        match self {
            Adapter::Cga | Adapter::Tandy | Adapter::Pcjr => 8,
            Adapter::Ega | Adapter::EgaMono | Adapter::Mda => 14,
            Adapter::Vga => 16,
        }
    }

    fn is_tandy_class(self) -> bool {
        matches!(self, Adapter::Tandy | Adapter::Pcjr)
    }
}

/// Memory layout family, selects the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecFamily {
    Text,
    Cga,
    Ega,
    Tandy6,
}

/// Whether PALETTE may change the attribute table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteAccess {
    /// Changing the palette is an illegal function call
    Fixed,
    /// Palette writes are accepted and have no effect
    Ignored,
    Mutable,
}

/// What happens to video memory on a mode switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErasePolicy {
    #[default]
    Erase,
    /// Carry the old memory contents into the new mode
    Preserve,
}

/// Immutable description of one screen mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoModeDescriptor {
    pub name: &'static str,
    /// BASIC SCREEN number (0 for text)
    pub number: u8,
    pub adapter: Adapter,
    pub family: CodecFamily,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub text_width: usize,
    pub text_height: usize,
    pub font_width: usize,
    pub font_height: usize,
    pub bits_per_pixel: u8,
    pub num_pages: usize,
    /// Real-mode segment of the video memory window
    pub video_segment: u16,
    pub page_size: usize,
    pub bank_size: usize,
    pub interleave_times: usize,
    /// EGA planes in use; pixel bit `i` lives in plane `planes[i]`
    pub planes: &'static [u8],
    pub supports_artifacts: bool,
    pub has_blink: bool,
    /// Fixed attribute used to draw the cursor in graphics modes
    pub cursor_index: Option<u8>,
    pub num_attr: usize,
    pub default_attr: u8,
    pub default_palette: &'static [u8],
    pub colours: ColourSource,
    pub palette_access: PaletteAccess,
}

impl VideoModeDescriptor {
    pub fn is_text(&self) -> bool {
        self.family == CodecFamily::Text
    }

    /// Linear address of the start of the video window.
    pub fn base_address(&self) -> u32 {
        u32::from(self.video_segment) * 16
    }

    /// Bytes of addressable video memory across all pages.
    pub fn memory_size(&self) -> usize {
        self.num_pages * self.page_size
    }

    /// Bytes per scanline (graphics) or per text row (text).
    pub fn bytes_per_row(&self) -> usize {
        match self.family {
            CodecFamily::Text => self.text_width * 2,
            CodecFamily::Ega => self.pixel_width / 8,
            CodecFamily::Cga | CodecFamily::Tandy6 => {
                self.pixel_width * usize::from(self.bits_per_pixel) / 8
            }
        }
    }

    /// Largest attribute a pixel may hold.
    pub fn max_attr(&self) -> u8 {
        ((1u16 << self.bits_per_pixel) - 1) as u8
    }

    /// Key that identifies this mode within a catalog.
    pub fn key(&self) -> ModeKey {
        ModeKey {
            adapter: self.adapter,
            number: self.number,
            text_width: self.text_width,
        }
    }

    /// Whether palette and cursor survive a switch from `self` to `other`.
    pub fn shares_colours_with(&self, other: &VideoModeDescriptor) -> bool {
        self.num_attr == other.num_attr
            && self.colours == other.colours
            && self.palette_access == other.palette_access
            && self.font_height == other.font_height
    }
}

/// Serializable reference to a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModeKey {
    pub adapter: Adapter,
    pub number: u8,
    pub text_width: usize,
}

const CGA_TEXT_MEMORY: usize = 0x4000;
const EGA_PLANE_SIZE: usize = 0x10000;
const MAX_PAGES: usize = 8;

const EGA_DEFAULT_PALETTE: &[u8] = &[0, 1, 2, 3, 4, 5, 20, 7, 56, 57, 58, 59, 60, 61, 62, 63];
const CGA16_DEFAULT_PALETTE: &[u8] = &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const MONO_TEXT_PALETTE: &[u8] = &[0, 1, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 2, 2];
const CGA4_DEFAULT_PALETTE: &[u8] = &[0, 3, 5, 7];
const CGA2_DEFAULT_PALETTE: &[u8] = &[0, 15];
const EGA2_DEFAULT_PALETTE: &[u8] = &[0, 63];
const MONO_EGA_DEFAULT_PALETTE: &[u8] = &[0, 4, 6, 8];

const ALL_PLANES: &[u8] = &[0, 1, 2, 3];
const MONO_PLANES: &[u8] = &[0, 2];
const NO_PLANES: &[u8] = &[];

/// The fixed set of modes available on one adapter.
#[derive(Debug, Clone)]
pub struct ModeCatalog {
    adapter: Adapter,
    modes: Vec<Arc<VideoModeDescriptor>>,
}

impl ModeCatalog {
    /// Build the catalog for an adapter.
    ///
    /// `video_memory` only matters for Tandy and PCjr, whose page counts
    /// depend on how much system memory is set aside for video.
    pub fn new(adapter: Adapter, video_memory: usize) -> Self {
        let mut modes = Vec::new();
        match adapter {
            Adapter::Mda => {
                modes.push(mono_text(adapter, PaletteAccess::Fixed));
            }
            Adapter::EgaMono => {
                modes.push(mono_text(adapter, PaletteAccess::Ignored));
                modes.push(ega_mono_graphics());
            }
            Adapter::Cga => {
                modes.push(colour_text(adapter, 40, CGA_TEXT_MEMORY / 0x800));
                modes.push(colour_text(adapter, 80, CGA_TEXT_MEMORY / 0x1000));
                modes.push(cga_320(adapter, 1));
                modes.push(cga_640(adapter, 1));
            }
            Adapter::Ega | Adapter::Vga => {
                modes.push(colour_text(adapter, 40, MAX_PAGES));
                modes.push(colour_text(adapter, 80, MAX_PAGES));
                modes.push(cga_320(adapter, 1));
                modes.push(cga_640(adapter, 1));
                modes.extend(ega_graphics(adapter));
            }
            Adapter::Tandy | Adapter::Pcjr => {
                let pages = |page_size: usize| (video_memory / page_size).clamp(1, MAX_PAGES);
                modes.push(colour_text(adapter, 40, pages(0x800)));
                modes.push(colour_text(adapter, 80, pages(0x1000)));
                modes.push(cga_320(adapter, pages(0x4000)));
                modes.push(cga_640(adapter, pages(0x4000)));
                modes.extend(tandy_graphics(adapter, pages(0x4000), pages(0x8000)));
            }
        }
        Self {
            adapter,
            modes: modes.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn adapter(&self) -> Adapter {
        self.adapter
    }

    pub fn modes(&self) -> &[Arc<VideoModeDescriptor>] {
        &self.modes
    }

    /// Look up a mode by SCREEN number and, optionally, text width.
    pub fn find(&self, number: u8, width: Option<usize>) -> Result<Arc<VideoModeDescriptor>, ModeError> {
        self.modes
            .iter()
            .find(|m| m.number == number && width.map_or(true, |w| m.text_width == w))
            .cloned()
            .ok_or(ModeError::UnsupportedMode { number, width })
    }

    /// Look up a mode by its serialized key.
    pub fn by_key(&self, key: ModeKey) -> Result<Arc<VideoModeDescriptor>, ModeError> {
        if key.adapter != self.adapter {
            return Err(ModeError::UnsupportedMode {
                number: key.number,
                width: Some(key.text_width),
            });
        }
        self.find(key.number, Some(key.text_width))
    }

    /// The mode WIDTH switches to from `current`.
    ///
    /// Text modes switch between 40 and 80 columns; graphics modes switch to
    /// the mode of the same family and height with the requested width
    /// (SCREEN 1 <-> 2, SCREEN 7 <-> 8).
    pub fn with_width(
        &self,
        current: &VideoModeDescriptor,
        width: usize,
    ) -> Result<Arc<VideoModeDescriptor>, ModeError> {
        if current.text_width == width {
            return self.by_key(current.key());
        }
        self.modes
            .iter()
            .find(|m| {
                m.text_width == width
                    && m.is_text() == current.is_text()
                    && (m.is_text()
                        || (m.family == current.family && m.pixel_height == current.pixel_height))
            })
            .cloned()
            .ok_or(ModeError::UnsupportedWidth(width))
    }
}

fn colour_text(adapter: Adapter, width: usize, num_pages: usize) -> VideoModeDescriptor {
    let font_height = adapter.text_font_height();
    let (colours, default_palette) = match adapter {
        Adapter::Ega | Adapter::Vga => (ColourSource::Ega64, EGA_DEFAULT_PALETTE),
        _ => (ColourSource::Cga16, CGA16_DEFAULT_PALETTE),
    };
    let palette_access = if adapter == Adapter::Cga {
        PaletteAccess::Fixed
    } else {
        PaletteAccess::Mutable
    };
    VideoModeDescriptor {
        name: if width == 40 { "text 40x25" } else { "text 80x25" },
        number: 0,
        adapter,
        family: CodecFamily::Text,
        pixel_width: width * 8,
        pixel_height: 25 * font_height,
        text_width: width,
        text_height: 25,
        font_width: 8,
        font_height,
        bits_per_pixel: 4,
        num_pages,
        video_segment: 0xB800,
        page_size: if width == 40 { 0x800 } else { 0x1000 },
        bank_size: 0,
        interleave_times: 1,
        planes: NO_PLANES,
        supports_artifacts: false,
        has_blink: true,
        cursor_index: None,
        num_attr: 16,
        default_attr: 7,
        default_palette,
        colours,
        palette_access,
    }
}

fn mono_text(adapter: Adapter, palette_access: PaletteAccess) -> VideoModeDescriptor {
    VideoModeDescriptor {
        name: "mono text 80x25",
        number: 0,
        adapter,
        family: CodecFamily::Text,
        pixel_width: 640,
        pixel_height: 350,
        text_width: 80,
        text_height: 25,
        font_width: 8,
        font_height: 14,
        bits_per_pixel: 2,
        num_pages: if adapter == Adapter::Mda { 1 } else { MAX_PAGES },
        video_segment: 0xB000,
        page_size: 0x1000,
        bank_size: 0,
        interleave_times: 1,
        planes: NO_PLANES,
        supports_artifacts: false,
        has_blink: true,
        cursor_index: None,
        num_attr: 16,
        default_attr: 7,
        default_palette: MONO_TEXT_PALETTE,
        colours: ColourSource::Mono,
        palette_access,
    }
}

fn cga_320(adapter: Adapter, num_pages: usize) -> VideoModeDescriptor {
    let (colours, palette_access) = graphics_colours(adapter);
    VideoModeDescriptor {
        name: "320x200x4",
        number: 1,
        adapter,
        family: CodecFamily::Cga,
        pixel_width: 320,
        pixel_height: 200,
        text_width: 40,
        text_height: 25,
        font_width: 8,
        font_height: 8,
        bits_per_pixel: 2,
        num_pages,
        video_segment: 0xB800,
        page_size: 0x4000,
        bank_size: 0x2000,
        interleave_times: 2,
        planes: NO_PLANES,
        supports_artifacts: adapter == Adapter::Cga,
        has_blink: false,
        cursor_index: Some(3),
        num_attr: 4,
        default_attr: 3,
        default_palette: CGA4_DEFAULT_PALETTE,
        colours,
        palette_access,
    }
}

fn cga_640(adapter: Adapter, num_pages: usize) -> VideoModeDescriptor {
    let (colours, palette_access) = graphics_colours(adapter);
    VideoModeDescriptor {
        name: "640x200x2",
        number: 2,
        adapter,
        family: CodecFamily::Cga,
        pixel_width: 640,
        pixel_height: 200,
        text_width: 80,
        text_height: 25,
        font_width: 8,
        font_height: 8,
        bits_per_pixel: 1,
        num_pages,
        video_segment: 0xB800,
        page_size: 0x4000,
        bank_size: 0x2000,
        interleave_times: 2,
        planes: NO_PLANES,
        supports_artifacts: adapter == Adapter::Cga,
        has_blink: false,
        cursor_index: Some(1),
        num_attr: 2,
        default_attr: 1,
        default_palette: if colours == ColourSource::Ega64 {
            EGA2_DEFAULT_PALETTE
        } else {
            CGA2_DEFAULT_PALETTE
        },
        colours,
        palette_access,
    }
}

fn graphics_colours(adapter: Adapter) -> (ColourSource, PaletteAccess) {
    match adapter {
        Adapter::Ega | Adapter::Vga => (ColourSource::Ega64, PaletteAccess::Mutable),
        a if a.is_tandy_class() => (ColourSource::Cga16, PaletteAccess::Mutable),
        _ => (ColourSource::Cga16, PaletteAccess::Fixed),
    }
}

fn ega_graphics(adapter: Adapter) -> Vec<VideoModeDescriptor> {
    let ega = |name: &'static str,
               number: u8,
               pixel_width: usize,
               pixel_height: usize,
               text_width: usize,
               font_height: usize,
               page_size: usize| {
        VideoModeDescriptor {
            name,
            number,
            adapter,
            family: CodecFamily::Ega,
            pixel_width,
            pixel_height,
            text_width,
            text_height: 25,
            font_width: 8,
            font_height,
            bits_per_pixel: 4,
            num_pages: EGA_PLANE_SIZE / page_size,
            video_segment: 0xA000,
            page_size,
            bank_size: 0,
            interleave_times: 1,
            planes: ALL_PLANES,
            supports_artifacts: false,
            has_blink: false,
            cursor_index: Some(15),
            num_attr: 16,
            default_attr: 15,
            default_palette: EGA_DEFAULT_PALETTE,
            colours: ColourSource::Ega64,
            palette_access: PaletteAccess::Mutable,
        }
    };
    vec![
        ega("320x200x16", 7, 320, 200, 40, 8, 0x2000),
        ega("640x200x16", 8, 640, 200, 80, 8, 0x4000),
        ega("640x350x16", 9, 640, 350, 80, 14, 0x8000),
    ]
}

fn ega_mono_graphics() -> VideoModeDescriptor {
    VideoModeDescriptor {
        name: "640x350x4 mono",
        number: 10,
        adapter: Adapter::EgaMono,
        family: CodecFamily::Ega,
        pixel_width: 640,
        pixel_height: 350,
        text_width: 80,
        text_height: 25,
        font_width: 8,
        font_height: 14,
        bits_per_pixel: 2,
        num_pages: EGA_PLANE_SIZE / 0x8000,
        video_segment: 0xA000,
        page_size: 0x8000,
        bank_size: 0,
        interleave_times: 1,
        planes: MONO_PLANES,
        supports_artifacts: false,
        has_blink: true,
        cursor_index: Some(3),
        num_attr: 4,
        default_attr: 3,
        default_palette: MONO_EGA_DEFAULT_PALETTE,
        colours: ColourSource::MonoEga,
        palette_access: PaletteAccess::Mutable,
    }
}

fn tandy_graphics(adapter: Adapter, small_pages: usize, large_pages: usize) -> Vec<VideoModeDescriptor> {
    let packed = |name: &'static str,
                  number: u8,
                  pixel_width: usize,
                  text_width: usize,
                  bits_per_pixel: u8,
                  family: CodecFamily,
                  page_size: usize,
                  interleave_times: usize| {
        let num_attr = 1usize << bits_per_pixel;
        VideoModeDescriptor {
            name,
            number,
            adapter,
            family,
            pixel_width,
            pixel_height: 200,
            text_width,
            text_height: 25,
            font_width: 8,
            font_height: 8,
            bits_per_pixel,
            num_pages: if page_size == 0x4000 { small_pages } else { large_pages },
            video_segment: 0xB800,
            page_size,
            bank_size: 0x2000,
            interleave_times,
            planes: NO_PLANES,
            supports_artifacts: false,
            has_blink: false,
            cursor_index: Some((num_attr - 1) as u8),
            num_attr,
            default_attr: (num_attr - 1) as u8,
            default_palette: if num_attr == 16 {
                CGA16_DEFAULT_PALETTE
            } else {
                CGA4_DEFAULT_PALETTE
            },
            colours: ColourSource::Cga16,
            palette_access: PaletteAccess::Mutable,
        }
    };
    vec![
        packed("160x200x16", 3, 160, 20, 4, CodecFamily::Cga, 0x4000, 2),
        packed("320x200x4 pcjr", 4, 320, 40, 2, CodecFamily::Cga, 0x4000, 2),
        packed("320x200x16", 5, 320, 40, 4, CodecFamily::Cga, 0x8000, 4),
        packed("640x200x4", 6, 640, 80, 2, CodecFamily::Tandy6, 0x8000, 4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cga_catalog_constants() {
        let catalog = ModeCatalog::new(Adapter::Cga, 0);
        let text40 = catalog.find(0, Some(40)).unwrap();
        assert_eq!(text40.video_segment, 0xB800);
        assert_eq!(text40.page_size, 0x800);
        assert_eq!(text40.num_pages, 8);

        let text80 = catalog.find(0, Some(80)).unwrap();
        assert_eq!(text80.page_size, 0x1000);
        assert_eq!(text80.num_pages, 4);

        let screen1 = catalog.find(1, None).unwrap();
        assert_eq!(screen1.base_address(), 0xB8000);
        assert_eq!(screen1.bank_size, 0x2000);
        assert_eq!(screen1.interleave_times, 2);
        assert_eq!(screen1.bytes_per_row(), 80);
        assert_eq!(screen1.palette_access, PaletteAccess::Fixed);
    }

    #[test]
    fn test_ega_catalog_pages() {
        let catalog = ModeCatalog::new(Adapter::Ega, 0);
        assert_eq!(catalog.find(7, None).unwrap().num_pages, 8);
        assert_eq!(catalog.find(8, None).unwrap().num_pages, 4);
        let screen9 = catalog.find(9, None).unwrap();
        assert_eq!(screen9.num_pages, 2);
        assert_eq!(screen9.base_address(), 0xA0000);
        assert_eq!(screen9.font_height, 14);
        assert!(catalog.find(6, None).is_err());
        assert!(catalog.find(10, None).is_err());
    }

    #[test]
    fn test_tandy_pages_follow_video_memory() {
        let catalog = ModeCatalog::new(Adapter::Tandy, 0x10000);
        let screen6 = catalog.find(6, None).unwrap();
        assert_eq!(screen6.family, CodecFamily::Tandy6);
        assert_eq!(screen6.num_pages, 2);
        assert_eq!(screen6.bytes_per_row(), 160);
        assert_eq!(catalog.find(1, None).unwrap().num_pages, 4);
        assert_eq!(catalog.find(0, Some(40)).unwrap().num_pages, 8);
    }

    #[test]
    fn test_mono_adapters() {
        let mda = ModeCatalog::new(Adapter::Mda, 0);
        assert_eq!(mda.modes().len(), 1);
        assert_eq!(mda.find(0, None).unwrap().video_segment, 0xB000);
        assert!(mda.find(1, None).is_err());

        let mono = ModeCatalog::new(Adapter::EgaMono, 0);
        let screen10 = mono.find(10, None).unwrap();
        assert_eq!(screen10.planes, &[0, 2]);
        assert_eq!(mono.find(0, None).unwrap().palette_access, PaletteAccess::Ignored);
    }

    #[test]
    fn test_with_width() {
        let catalog = ModeCatalog::new(Adapter::Ega, 0);
        let screen1 = catalog.find(1, None).unwrap();
        assert_eq!(catalog.with_width(&screen1, 80).unwrap().number, 2);

        let screen7 = catalog.find(7, None).unwrap();
        assert_eq!(catalog.with_width(&screen7, 80).unwrap().number, 8);

        let text = catalog.find(0, Some(80)).unwrap();
        assert_eq!(catalog.with_width(&text, 40).unwrap().text_width, 40);

        let screen9 = catalog.find(9, None).unwrap();
        assert_eq!(
            catalog.with_width(&screen9, 40),
            Err(ModeError::UnsupportedWidth(40))
        );
    }

    #[test]
    fn test_key_lookup() {
        let catalog = ModeCatalog::new(Adapter::Cga, 0);
        let mode = catalog.find(2, None).unwrap();
        assert_eq!(catalog.by_key(mode.key()).unwrap(), mode);

        let other = ModeKey {
            adapter: Adapter::Ega,
            ..mode.key()
        };
        assert!(catalog.by_key(other).is_err());
    }
}
