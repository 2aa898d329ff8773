//! Double-byte character sets and box-drawing protection
//!
//! In DBCS codepages a lead byte and the byte after it form one
//! double-width character. The same bytes double as CP437 box-drawing
//! characters, so with box protection enabled a run of connecting line
//! characters is kept as single-width cells instead of being paired up.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::cell::DbcsMarker;
use super::line::TextRow;

/// Supported character sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// Single-byte codepages such as 437 and 850
    #[default]
    Sbcs,
    /// Codepage 932
    ShiftJis,
    /// Codepage 936
    Gbk,
    /// Codepage 950
    Big5,
    /// Codepage 949
    Uhc,
}

impl Charset {
    pub fn from_codepage(codepage: u16) -> Self {
        match codepage {
            932 => Charset::ShiftJis,
            936 => Charset::Gbk,
            949 => Charset::Uhc,
            950 => Charset::Big5,
            _ => Charset::Sbcs,
        }
    }

    pub fn is_dbcs(self) -> bool {
        self != Charset::Sbcs
    }

    pub fn is_lead(self, byte: u8) -> bool {
        match self {
            Charset::Sbcs => false,
            Charset::ShiftJis => matches!(byte, 0x81..=0x9F | 0xE0..=0xFC),
            Charset::Gbk | Charset::Big5 | Charset::Uhc => matches!(byte, 0x81..=0xFE),
        }
    }

    pub fn is_trail(self, byte: u8) -> bool {
        match self {
            Charset::Sbcs => false,
            Charset::ShiftJis => matches!(byte, 0x40..=0x7E | 0x80..=0xFC),
            Charset::Gbk => matches!(byte, 0x40..=0xFE) && byte != 0x7F,
            Charset::Big5 => matches!(byte, 0x40..=0x7E | 0xA1..=0xFE),
            Charset::Uhc => matches!(byte, 0x41..=0x5A | 0x61..=0x7A | 0x81..=0xFE),
        }
    }
}

/// Line style of a box-drawing run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxStyle {
    Single,
    Double,
}

const BOX_STYLES: [BoxStyle; 2] = [BoxStyle::Single, BoxStyle::Double];

// CP437 box characters with a horizontal stroke leaving to the right, and
// those with a horizontal stroke entering from the left.
const SINGLE_EXITS_RIGHT: &[u8] = &[
    0xC4, 0xDA, 0xC0, 0xC3, 0xC2, 0xC1, 0xC5, 0xD6, 0xD3, 0xC7, 0xD2, 0xD0, 0xD7,
];
const SINGLE_ENTERS_LEFT: &[u8] = &[
    0xC4, 0xBF, 0xD9, 0xB4, 0xC2, 0xC1, 0xC5, 0xB7, 0xBD, 0xB6, 0xD2, 0xD0, 0xD7,
];
const DOUBLE_EXITS_RIGHT: &[u8] = &[
    0xCD, 0xC9, 0xC8, 0xCC, 0xCB, 0xCA, 0xCE, 0xD5, 0xD4, 0xC6, 0xD1, 0xCF, 0xD8,
];
const DOUBLE_ENTERS_LEFT: &[u8] = &[
    0xCD, 0xBB, 0xBC, 0xB9, 0xCB, 0xCA, 0xCE, 0xB8, 0xBE, 0xB5, 0xD1, 0xCF, 0xD8,
];

/// Whether `left` followed by `right` continues a horizontal line.
pub fn connects(left: u8, right: u8, style: BoxStyle) -> bool {
    let (exits, enters) = match style {
        BoxStyle::Single => (SINGLE_EXITS_RIGHT, SINGLE_ENTERS_LEFT),
        BoxStyle::Double => (DOUBLE_EXITS_RIGHT, DOUBLE_ENTERS_LEFT),
    };
    exits.contains(&left) && enters.contains(&right)
}

/// State of the box-protection machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxState {
    NoBox,
    /// A lead byte is waiting for the next byte
    LeadFound(u8),
    /// A would-be pair was split to keep a line intact
    Connected(BoxStyle),
    Continuing(BoxStyle),
}

/// Markers produced by feeding one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Fed {
    /// Marker for the previously fed byte, if it was held back
    pub pending: Option<DbcsMarker>,
    /// Marker for the byte just fed, unless it is held back as a lead
    pub current: Option<DbcsMarker>,
}

/// Assigns DBCS markers to a stream of bytes left to right.
#[derive(Debug, Clone)]
pub struct BoxProtect {
    charset: Charset,
    enabled: bool,
    state: BoxState,
    /// Glyph of the last cell emitted as single-width
    prev_single: Option<u8>,
}

impl BoxProtect {
    pub fn new(charset: Charset, enabled: bool) -> Self {
        Self::with_context(charset, enabled, None)
    }

    /// Start after a cell already known to be single-width
    pub fn with_context(charset: Charset, enabled: bool, prev_single: Option<u8>) -> Self {
        Self {
            charset,
            enabled,
            state: BoxState::NoBox,
            prev_single,
        }
    }

    pub fn state(&self) -> BoxState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == BoxState::NoBox
    }

    pub fn feed(&mut self, byte: u8) -> Fed {
        let mut fed = Fed::default();
        self.step(byte, &mut fed);
        fed
    }

    /// End of row: a lead still waiting is single-width.
    pub fn finish(&mut self) -> Option<DbcsMarker> {
        let pending = matches!(self.state, BoxState::LeadFound(_)).then_some(DbcsMarker::Single);
        self.state = BoxState::NoBox;
        pending
    }

    fn step(&mut self, byte: u8, fed: &mut Fed) {
        match self.state {
            BoxState::NoBox => {
                if self.charset.is_lead(byte) {
                    self.state = BoxState::LeadFound(byte);
                } else {
                    self.emit_single(byte, fed);
                }
            }
            BoxState::LeadFound(lead) => {
                if !self.charset.is_trail(byte) {
                    fed.pending = Some(DbcsMarker::Single);
                    self.prev_single = Some(lead);
                    self.state = BoxState::NoBox;
                    self.step(byte, fed);
                } else if let Some(style) = self.protected_style(lead, byte) {
                    fed.pending = Some(DbcsMarker::Single);
                    self.prev_single = Some(lead);
                    self.state = BoxState::Connected(style);
                    self.step(byte, fed);
                } else {
                    fed.pending = Some(DbcsMarker::Lead);
                    fed.current = Some(DbcsMarker::Trail);
                    self.prev_single = None;
                    self.state = BoxState::NoBox;
                }
            }
            BoxState::Connected(style) | BoxState::Continuing(style) => {
                if self.prev_single.is_some_and(|prev| connects(prev, byte, style)) {
                    self.emit_single(byte, fed);
                    self.state = BoxState::Continuing(style);
                } else {
                    self.state = BoxState::NoBox;
                    self.step(byte, fed);
                }
            }
        }
    }

    fn emit_single(&mut self, byte: u8, fed: &mut Fed) {
        fed.current = Some(DbcsMarker::Single);
        self.prev_single = Some(byte);
    }

    /// Style in which a lead/trail candidate belongs to a line.
    fn protected_style(&self, lead: u8, trail: u8) -> Option<BoxStyle> {
        if !self.enabled {
            return None;
        }
        BOX_STYLES.into_iter().find(|&style| {
            self.prev_single.is_some_and(|prev| connects(prev, lead, style))
                || connects(lead, trail, style)
        })
    }
}

/// Recompute the markers of `row` after the cells in `start..stop` changed.
///
/// The scan starts at most two cells left of the write and stops at the
/// first cell past it whose marker comes out unchanged while the machine is
/// idle. Returns the columns whose markers were recomputed.
pub fn refresh_markers(
    row: &mut TextRow,
    charset: Charset,
    box_protect: bool,
    start: usize,
    stop: usize,
) -> Range<usize> {
    let width = row.width();
    let mut begin = start.saturating_sub(2).min(width);
    if begin > 0 && row.marker(begin) == DbcsMarker::Trail {
        begin -= 1;
    }
    let prev_single = (begin > 0 && row.marker(begin - 1) == DbcsMarker::Single)
        .then(|| row.cell(begin - 1).glyph);
    let mut machine = BoxProtect::with_context(charset, box_protect, prev_single);

    for col in begin..width {
        let fed = machine.feed(row.cell(col).glyph);
        let mut unchanged = true;
        if let Some(marker) = fed.pending {
            unchanged &= row.marker(col - 1) == marker;
            row.set_marker(col - 1, marker);
        }
        match fed.current {
            Some(marker) => {
                unchanged &= row.marker(col) == marker;
                row.set_marker(col, marker);
            }
            None => unchanged = false,
        }
        if col >= stop && unchanged && machine.is_idle() {
            return begin..col + 1;
        }
    }
    if let Some(marker) = machine.finish() {
        row.set_marker(width - 1, marker);
    }
    begin..width
}
