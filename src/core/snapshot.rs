//! Display state snapshots
//!
//! A snapshot holds everything needed to put the display back exactly as
//! it was: the mode, a dump of video memory (every page, and every plane on
//! EGA), palette, cursor, pages, view and border. Restoring switches to the
//! saved mode and writes the memory back through the mode's codec.

use serde::{Deserialize, Serialize};

use super::cursor::CursorVisibility;
use super::error::ModeError;
use super::mode::ModeKey;
use super::screen::Screen;

/// Format version written into every snapshot
pub const SNAPSHOT_VERSION: u32 = 1;

/// Snapshot errors
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("snapshot mode not available: {0}")]
    Mode(#[from] ModeError),
    #[error("snapshot of mode {mode} holds {found} memory planes, expected {expected}")]
    MemoryLayout {
        mode: String,
        found: usize,
        expected: usize,
    },
}

/// Saved display state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSnapshot {
    pub version: u32,
    pub mode: ModeKey,
    /// Video memory, one buffer per EGA plane in use
    #[serde(with = "hex_planes")]
    pub memory: Vec<Vec<u8>>,
    /// EGA read plane and write mask
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plane_registers: Option<(u8, u8)>,
    pub palette: Vec<u8>,
    pub cursor: CursorSnapshot,
    pub active_page: usize,
    pub visible_page: usize,
    /// Scroll region rows `top..stop`
    pub view: (usize, usize),
    pub border: u8,
    /// Text of the visible page, for reading the snapshot by eye
    #[serde(default)]
    pub text: Vec<String>,
}

/// Snapshot of cursor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorSnapshot {
    pub row: usize,
    pub col: usize,
    pub from_line: usize,
    pub to_line: usize,
    pub visibility: CursorVisibility,
}

impl ScreenSnapshot {
    /// Capture the current state of a screen
    pub fn from_screen(screen: &Screen) -> Self {
        let cursor = screen.cursor();
        let (from_line, to_line) = cursor.shape();
        ScreenSnapshot {
            version: SNAPSHOT_VERSION,
            mode: screen.mode().key(),
            memory: screen.codec().dump(screen.buffer()),
            plane_registers: screen.plane_registers(),
            palette: screen.palette().entries().to_vec(),
            cursor: CursorSnapshot {
                row: cursor.row,
                col: cursor.col,
                from_line,
                to_line,
                visibility: cursor.visibility(),
            },
            active_page: screen.active_page(),
            visible_page: screen.visible_page(),
            view: screen.view(),
            border: screen.border(),
            text: screen.text_lines(screen.visible_page()),
        }
    }

    pub fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }

    /// Convert snapshot to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse snapshot from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Visible page text with trailing empty lines removed
    pub fn to_text(&self) -> String {
        let last = self
            .text
            .iter()
            .rposition(|line| !line.is_empty())
            .map_or(0, |i| i + 1);
        let mut result = self.text[..last].join("\n");
        result.push('\n');
        result
    }
}

/// Memory planes as hex strings, so a 64 KiB plane stays one JSON value.
mod hex_planes {
    use std::fmt::Write;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(planes: &Vec<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(planes.iter().map(|plane| encode(plane)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let planes = Vec::<String>::deserialize(deserializer)?;
        planes.iter().map(|hex| decode(hex).map_err(D::Error::custom)).collect()
    }

    fn encode(bytes: &[u8]) -> String {
        let mut hex = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            let _ = write!(hex, "{byte:02x}");
        }
        hex
    }

    fn decode(hex: &str) -> Result<Vec<u8>, String> {
        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return Err(format!("bad hex plane of length {}", hex.len()));
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Adapter, ErasePolicy, ScreenSettings};
    use crate::render::RenderSender;

    fn screen(adapter: Adapter) -> Screen {
        let settings = ScreenSettings {
            adapter,
            ..ScreenSettings::default()
        };
        Screen::new(settings, RenderSender::detached()).unwrap()
    }

    #[test]
    fn test_snapshot_from_screen() {
        let mut screen = screen(Adapter::Cga);
        screen.put_text(0, 0, b"Hi", 0x1F);
        screen.locate(0, 2);

        let snapshot = ScreenSnapshot::from_screen(&screen);
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
        assert_eq!(snapshot.mode.number, 0);
        assert_eq!(snapshot.memory.len(), 1);
        assert_eq!(snapshot.memory[0].len(), 0x4000);
        assert_eq!(&snapshot.memory[0][..4], b"H\x1Fi\x1F");
        assert_eq!(snapshot.cursor.col, 2);
        assert_eq!(snapshot.to_text(), "Hi\n");
    }

    #[test]
    fn test_ega_snapshot_has_all_planes() {
        let mut screen = screen(Adapter::Ega);
        screen.screen(7, None, 0, 0, ErasePolicy::Erase).unwrap();
        let snapshot = screen.snapshot();
        assert_eq!(snapshot.memory.len(), 4);
        assert_eq!(snapshot.plane_registers, Some((0, 0x0F)));
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut screen = screen(Adapter::Cga);
        screen.put_text(5, 5, b"json", 7);
        let snapshot = screen.snapshot();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"memory\""));
        let restored = ScreenSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_restore_rejects_other_versions() {
        let mut screen = screen(Adapter::Cga);
        let mut snapshot = screen.snapshot();
        snapshot.version = 99;
        assert!(matches!(
            screen.restore(&snapshot),
            Err(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_restore_rejects_wrong_plane_count() {
        let mut screen = screen(Adapter::Cga);
        let mut snapshot = screen.snapshot();
        snapshot.memory.push(Vec::new());
        assert!(matches!(
            screen.restore(&snapshot),
            Err(SnapshotError::MemoryLayout { found: 2, expected: 1, .. })
        ));
    }

    #[test]
    fn test_restore_rejects_foreign_adapter() {
        let snapshot = screen(Adapter::Ega).snapshot();
        let mut cga = screen(Adapter::Cga);
        assert!(matches!(cga.restore(&snapshot), Err(SnapshotError::Mode(_))));
    }

    #[test]
    fn test_bad_hex_is_an_error() {
        let snapshot = screen(Adapter::Cga).snapshot();
        let json = snapshot.to_json().unwrap();
        let broken = json.replacen("\"2007", "\"zz07", 1);
        assert!(ScreenSnapshot::from_json(&broken).is_err());
    }
}
