//! Attribute palette
//!
//! Maps pixel/text attributes to indices in the adapter's colour table and
//! resolves them to RGB. Two RGB tables are kept, one per blink phase; they
//! only differ for the blinking colours of the EGA monochrome adapter.

use serde::{Deserialize, Serialize};

use super::error::ModeError;
use super::mode::{PaletteAccess, VideoModeDescriptor};

/// An RGB triple
pub type Rgb = (u8, u8, u8);

/// The hardware colour table a mode draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColourSource {
    /// 16 RGBI colours of CGA, Tandy and PCjr
    Cga16,
    /// 64 colours of the EGA (2 bits per channel)
    Ega64,
    /// MDA intensities: off, normal, bright
    Mono,
    /// EGA monochrome: every pair of (phase 0, phase 1) intensities
    MonoEga,
}

const CGA16: [Rgb; 16] = [
    (0x00, 0x00, 0x00),
    (0x00, 0x00, 0xAA),
    (0x00, 0xAA, 0x00),
    (0x00, 0xAA, 0xAA),
    (0xAA, 0x00, 0x00),
    (0xAA, 0x00, 0xAA),
    (0xAA, 0x55, 0x00),
    (0xAA, 0xAA, 0xAA),
    (0x55, 0x55, 0x55),
    (0x55, 0x55, 0xFF),
    (0x55, 0xFF, 0x55),
    (0x55, 0xFF, 0xFF),
    (0xFF, 0x55, 0x55),
    (0xFF, 0x55, 0xFF),
    (0xFF, 0xFF, 0x55),
    (0xFF, 0xFF, 0xFF),
];

const MONO_LEVELS: [Rgb; 3] = [(0x00, 0x00, 0x00), (0xAA, 0xAA, 0xAA), (0xFF, 0xFF, 0xFF)];

/// EGA colour numbers of the 16 CGA colours.
const CGA_TO_EGA: [u8; 16] = [0, 1, 2, 3, 4, 5, 20, 7, 56, 57, 58, 59, 60, 61, 62, 63];

impl ColourSource {
    /// Number of colours in the table.
    pub fn num_colours(self) -> usize {
        match self {
            ColourSource::Cga16 => 16,
            ColourSource::Ega64 => 64,
            ColourSource::Mono => 3,
            ColourSource::MonoEga => 9,
        }
    }

    /// RGB of a colour in blink phase 0 and phase 1.
    pub fn rgb(self, colour: u8) -> [Rgb; 2] {
        let colour = usize::from(colour) % self.num_colours();
        match self {
            ColourSource::Cga16 => [CGA16[colour]; 2],
            ColourSource::Ega64 => [ega64(colour as u8); 2],
            ColourSource::Mono => [MONO_LEVELS[colour]; 2],
            ColourSource::MonoEga => [MONO_LEVELS[colour / 3], MONO_LEVELS[colour % 3]],
        }
    }

    /// Translate a CGA colour number into this table.
    fn from_cga(self, cga: u8) -> u8 {
        let cga = cga & 0x0F;
        match self {
            ColourSource::Ega64 => CGA_TO_EGA[usize::from(cga)],
            _ => cga,
        }
    }
}

/// EGA colour byte `00rgbRGB` to RGB.
fn ega64(colour: u8) -> Rgb {
    let channel = |hi: u8, lo: u8| 0xAA * ((colour >> hi) & 1) + 0x55 * ((colour >> lo) & 1);
    (channel(2, 5), channel(1, 4), channel(0, 3))
}

/// Attribute-to-colour table for the active mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<u8>,
    colours: ColourSource,
    access: PaletteAccess,
    rgb: [Vec<Rgb>; 2],
}

impl Palette {
    /// Create the default palette of a mode.
    pub fn new(mode: &VideoModeDescriptor) -> Self {
        let mut palette = Self {
            entries: Vec::new(),
            colours: mode.colours,
            access: mode.palette_access,
            rgb: [Vec::new(), Vec::new()],
        };
        palette.reset(mode);
        palette
    }

    /// Restore the mode's default palette.
    pub fn reset(&mut self, mode: &VideoModeDescriptor) {
        self.colours = mode.colours;
        self.access = mode.palette_access;
        self.entries = (0..mode.num_attr)
            .map(|attr| mode.default_palette.get(attr).copied().unwrap_or(0))
            .collect();
        self.resolve();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[u8] {
        &self.entries
    }

    /// Colour assigned to an attribute; 0 for attributes the mode lacks.
    pub fn get_entry(&self, attr: usize) -> u8 {
        self.entries.get(attr).copied().unwrap_or(0)
    }

    /// Assign a colour to one attribute (PALETTE attr, colour).
    ///
    /// Returns whether the visible palette changed.
    pub fn set_entry(&mut self, attr: usize, colour: u8) -> Result<bool, ModeError> {
        if !self.check_access()? {
            return Ok(false);
        }
        self.check_attr(attr)?;
        self.check_colour(colour)?;
        self.entries[attr] = colour;
        self.resolve();
        Ok(true)
    }

    /// Replace every entry at once (PALETTE USING).
    pub fn set_all(&mut self, colours: &[u8]) -> Result<bool, ModeError> {
        if !self.check_access()? {
            return Ok(false);
        }
        if colours.len() != self.entries.len() {
            return Err(ModeError::AttributeOutOfRange {
                attr: colours.len(),
                num_attr: self.entries.len(),
            });
        }
        for &colour in colours {
            self.check_colour(colour)?;
        }
        self.entries.copy_from_slice(colours);
        self.resolve();
        Ok(true)
    }

    /// Put back entries saved from this mode, whatever the access rule.
    pub(crate) fn restore_entries(&mut self, colours: &[u8]) {
        let max = (self.colours.num_colours() - 1) as u8;
        for (entry, &colour) in self.entries.iter_mut().zip(colours) {
            *entry = colour.min(max);
        }
        self.resolve();
    }

    /// Select CGA palette 0 (green/red/brown) or 1 (cyan/magenta/white).
    ///
    /// This is the COLOR statement of 4-colour modes and works on every
    /// adapter, including those whose PALETTE is fixed.
    pub fn set_cga4_palette(&mut self, palette: u8, intensity: bool) {
        if self.entries.len() != 4 {
            return;
        }
        let base: [u8; 3] = if palette % 2 == 0 { [2, 4, 6] } else { [3, 5, 7] };
        let bright = if intensity { 8 } else { 0 };
        for (entry, cga) in self.entries[1..].iter_mut().zip(base) {
            *entry = self.colours.from_cga(cga + bright);
        }
        self.resolve();
    }

    /// Set attribute 0 to a CGA colour (background of 4-colour modes).
    pub fn set_cga_background(&mut self, cga: u8) {
        if let Some(entry) = self.entries.first_mut() {
            *entry = self.colours.from_cga(cga);
            self.resolve();
        }
    }

    /// RGB tables for blink phase 0 and phase 1.
    pub fn rgb_tables(&self) -> (&[Rgb], &[Rgb]) {
        (&self.rgb[0], &self.rgb[1])
    }

    /// RGB of an attribute in the given blink phase.
    pub fn rgb(&self, attr: usize, phase: bool) -> Rgb {
        self.rgb[usize::from(phase)]
            .get(attr)
            .copied()
            .unwrap_or((0, 0, 0))
    }

    /// Returns Ok(false) when writes are silently ignored.
    fn check_access(&self) -> Result<bool, ModeError> {
        match self.access {
            PaletteAccess::Fixed => Err(ModeError::FixedPalette),
            PaletteAccess::Ignored => Ok(false),
            PaletteAccess::Mutable => Ok(true),
        }
    }

    fn check_attr(&self, attr: usize) -> Result<(), ModeError> {
        if attr >= self.entries.len() {
            return Err(ModeError::AttributeOutOfRange {
                attr,
                num_attr: self.entries.len(),
            });
        }
        Ok(())
    }

    fn check_colour(&self, colour: u8) -> Result<(), ModeError> {
        let num_colours = self.colours.num_colours();
        if usize::from(colour) >= num_colours {
            return Err(ModeError::ColourOutOfRange {
                colour: usize::from(colour),
                num_colours,
            });
        }
        Ok(())
    }

    fn resolve(&mut self) {
        let (phase0, phase1): (Vec<Rgb>, Vec<Rgb>) = self
            .entries
            .iter()
            .map(|&colour| {
                let [a, b] = self.colours.rgb(colour);
                (a, b)
            })
            .unzip();
        self.rgb = [phase0, phase1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mode::{Adapter, ModeCatalog};

    fn mode(adapter: Adapter, number: u8) -> std::sync::Arc<VideoModeDescriptor> {
        ModeCatalog::new(adapter, 0x10000).find(number, None).unwrap()
    }

    #[test]
    fn test_ega64_rgb() {
        assert_eq!(ega64(0), (0, 0, 0));
        assert_eq!(ega64(1), (0, 0, 0xAA));
        assert_eq!(ega64(20), (0xAA, 0x55, 0x00));
        assert_eq!(ega64(63), (0xFF, 0xFF, 0xFF));
    }

    #[test]
    fn test_fixed_palette_rejects_writes() {
        let mut palette = Palette::new(&mode(Adapter::Cga, 1));
        assert_eq!(palette.set_entry(1, 2), Err(ModeError::FixedPalette));
        assert_eq!(palette.get_entry(1), 3);
    }

    #[test]
    fn test_mutable_palette_visible_immediately() {
        let mut palette = Palette::new(&mode(Adapter::Ega, 9));
        assert_eq!(palette.set_entry(1, 36), Ok(true));
        assert_eq!(palette.get_entry(1), 36);
        assert_eq!(palette.rgb(1, false), ega64(36));
    }

    #[test]
    fn test_ignored_palette_is_noop() {
        let mut palette = Palette::new(&mode(Adapter::EgaMono, 0));
        let before = palette.clone();
        assert_eq!(palette.set_entry(1, 2), Ok(false));
        assert_eq!(palette, before);
    }

    #[test]
    fn test_palette_range_checks() {
        let mut palette = Palette::new(&mode(Adapter::Ega, 7));
        assert!(matches!(
            palette.set_entry(16, 1),
            Err(ModeError::AttributeOutOfRange { attr: 16, .. })
        ));
        assert!(matches!(
            palette.set_entry(1, 64),
            Err(ModeError::ColourOutOfRange { colour: 64, .. })
        ));
        assert!(palette.set_all(&[0; 4]).is_err());
        assert_eq!(palette.set_all(&[9; 16]), Ok(true));
        assert!(palette.entries().iter().all(|&c| c == 9));
    }

    #[test]
    fn test_cga4_palette_select() {
        let mut palette = Palette::new(&mode(Adapter::Cga, 1));
        palette.set_cga4_palette(0, true);
        assert_eq!(palette.entries(), &[0, 10, 12, 14]);
        palette.set_cga4_palette(1, false);
        assert_eq!(palette.entries(), &[0, 3, 5, 7]);

        let mut ega = Palette::new(&mode(Adapter::Ega, 1));
        ega.set_cga4_palette(0, false);
        assert_eq!(ega.entries(), &[0, 2, 4, 20]);
    }

    #[test]
    fn test_mono_ega_blink_tables_differ() {
        let palette = Palette::new(&mode(Adapter::EgaMono, 10));
        let (phase0, phase1) = palette.rgb_tables();
        assert_eq!(phase0.len(), 4);
        // attribute 2 blinks between bright and off
        assert_eq!(phase0[2], (0xFF, 0xFF, 0xFF));
        assert_eq!(phase1[2], (0, 0, 0));
        assert_eq!(phase0[1], phase1[1]);
    }
}
