//! Scripted screen operations
//!
//! A script is a JSON array of operations, each an object tagged by `op`,
//! that drives a [`Screen`] without an interpreter. The `video-headless`
//! binary and the golden tests run scripts through [`run_script`].
//!
//! ```json
//! [
//!   {"op": "screen", "number": 1},
//!   {"op": "pset", "x": 10, "y": 10, "attr": 3},
//!   {"op": "print", "row": 0, "col": 0, "text": "HELLO"}
//! ]
//! ```

use serde::{Deserialize, Serialize};

use crate::app::{ClipboardBridge, ClipboardError};
use crate::core::{CursorVisibility, ErasePolicy, ModeError, Rect, Screen};

/// One scripted operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    Screen {
        number: u8,
        #[serde(default)]
        width: Option<usize>,
        #[serde(default)]
        active_page: usize,
        #[serde(default)]
        visible_page: usize,
        /// Keep video memory across the switch
        #[serde(default)]
        preserve: bool,
    },
    Width {
        width: usize,
    },
    Page {
        active: usize,
        visible: usize,
    },
    Pcopy {
        src: usize,
        dst: usize,
    },
    Print {
        row: usize,
        col: usize,
        text: String,
        #[serde(default = "default_attr")]
        attr: u8,
    },
    Locate {
        row: usize,
        col: usize,
    },
    CursorShape {
        from: i32,
        to: i32,
    },
    ShowCursor {
        visibility: CursorVisibility,
    },
    Pset {
        x: usize,
        y: usize,
        attr: u8,
    },
    FillRect {
        rect: Rect,
        attr: u8,
    },
    Clip {
        #[serde(default)]
        rect: Option<Rect>,
    },
    View {
        top: usize,
        bottom: usize,
    },
    Unview,
    ScrollUp {
        from: usize,
        height: usize,
        #[serde(default)]
        fill: u8,
    },
    ScrollDown {
        from: usize,
        height: usize,
        #[serde(default)]
        fill: u8,
    },
    Cls {
        #[serde(default)]
        fill: u8,
    },
    Poke {
        address: u32,
        value: u8,
    },
    Palette {
        attr: usize,
        colour: u8,
    },
    PaletteUsing {
        colours: Vec<u8>,
    },
    ResetPalette,
    /// COLOR for 4-colour modes
    CgaPalette {
        palette: u8,
        #[serde(default)]
        intensity: bool,
    },
    Border {
        attr: u8,
    },
    ReadPlane {
        plane: u8,
    },
    WriteMask {
        mask: u8,
    },
    /// Put the text between two cells of a page on the clipboard
    Copy {
        page: usize,
        start: (usize, usize),
        stop: (usize, usize),
    },
}

fn default_attr() -> u8 {
    7
}

/// Script errors
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("step {step}: {source}")]
    Mode { step: usize, source: ModeError },
    #[error("step {step}: {source}")]
    Clipboard { step: usize, source: ClipboardError },
    #[error("invalid script: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse a script from JSON
pub fn parse_script(json: &str) -> Result<Vec<ScriptOp>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

/// Run every operation in order, stopping at the first error.
pub fn run_script(
    screen: &mut Screen,
    ops: &[ScriptOp],
    clipboard: &mut dyn ClipboardBridge,
) -> Result<(), ScriptError> {
    for (step, op) in ops.iter().enumerate() {
        tracing::trace!(step, ?op, "script step");
        match op {
            ScriptOp::Copy { page, start, stop } => {
                let text = screen.copy_text(*page, *start, *stop);
                clipboard
                    .set_text(&text)
                    .map_err(|source| ScriptError::Clipboard { step, source })?;
            }
            op => apply(screen, op).map_err(|source| ScriptError::Mode { step, source })?,
        }
    }
    Ok(())
}

fn apply(screen: &mut Screen, op: &ScriptOp) -> Result<(), ModeError> {
    match op {
        ScriptOp::Screen {
            number,
            width,
            active_page,
            visible_page,
            preserve,
        } => {
            let erase = if *preserve {
                ErasePolicy::Preserve
            } else {
                ErasePolicy::Erase
            };
            screen.screen(*number, *width, *active_page, *visible_page, erase)?;
        }
        ScriptOp::Width { width } => screen.set_width(*width)?,
        ScriptOp::Page { active, visible } => screen.set_page(*active, *visible)?,
        ScriptOp::Pcopy { src, dst } => screen.copy_page(*src, *dst)?,
        ScriptOp::Print { row, col, text, attr } => screen.put_text(*row, *col, text.as_bytes(), *attr),
        ScriptOp::Locate { row, col } => screen.locate(*row, *col),
        ScriptOp::CursorShape { from, to } => {
            screen.set_cursor_shape(*from, *to);
        }
        ScriptOp::ShowCursor { visibility } => screen.show_cursor(*visibility),
        ScriptOp::Pset { x, y, attr } => screen.put_pixel(*x, *y, *attr),
        ScriptOp::FillRect { rect, attr } => screen.fill_rect(*rect, *attr),
        ScriptOp::Clip { rect } => screen.set_clip(*rect),
        ScriptOp::View { top, bottom } => screen.set_view(*top, *bottom)?,
        ScriptOp::Unview => screen.unset_view(),
        ScriptOp::ScrollUp { from, height, fill } => screen.scroll_up(*from, *height, *fill),
        ScriptOp::ScrollDown { from, height, fill } => screen.scroll_down(*from, *height, *fill),
        ScriptOp::Cls { fill } => screen.clear_view(*fill),
        ScriptOp::Poke { address, value } => screen.poke(*address, *value),
        ScriptOp::Palette { attr, colour } => screen.set_palette_entry(*attr, *colour)?,
        ScriptOp::PaletteUsing { colours } => screen.set_palette(colours)?,
        ScriptOp::ResetPalette => screen.reset_palette(),
        ScriptOp::CgaPalette { palette, intensity } => screen.set_cga4_palette(*palette, *intensity),
        ScriptOp::Border { attr } => screen.set_border(*attr),
        ScriptOp::ReadPlane { plane } => screen.set_read_plane(*plane),
        ScriptOp::WriteMask { mask } => screen.set_write_mask(*mask),
        ScriptOp::Copy { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::MemoryClipboard;
    use crate::core::{Adapter, ScreenSettings};
    use crate::render::RenderSender;

    fn screen(adapter: Adapter) -> Screen {
        let settings = ScreenSettings {
            adapter,
            ..ScreenSettings::default()
        };
        Screen::new(settings, RenderSender::detached()).unwrap()
    }

    #[test]
    fn test_parse_and_run() {
        let ops = parse_script(
            r#"[
                {"op": "print", "row": 0, "col": 0, "text": "READY"},
                {"op": "locate", "row": 1, "col": 0},
                {"op": "poke", "address": 753666, "value": 79},
                {"op": "copy", "page": 0, "start": [0, 0], "stop": [0, 4]}
            ]"#,
        )
        .unwrap();
        let mut screen = screen(Adapter::Cga);
        let mut clipboard = MemoryClipboard::default();
        run_script(&mut screen, &ops, &mut clipboard).unwrap();
        // 753666 = 0xB8002, the second cell
        assert_eq!(screen.text_lines(0)[0], "ROADY");
        assert_eq!(clipboard.contents(), "ROADY");
    }

    #[test]
    fn test_error_names_step() {
        let ops = vec![
            ScriptOp::Cls { fill: 0 },
            ScriptOp::Palette { attr: 1, colour: 2 },
        ];
        let mut clipboard = MemoryClipboard::default();
        let err = run_script(&mut screen(Adapter::Cga), &ops, &mut clipboard).unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Mode {
                step: 1,
                source: ModeError::FixedPalette
            }
        ));
        assert_eq!(err.to_string(), "step 1: the palette of this adapter cannot be changed");
    }

    #[test]
    fn test_unknown_op_is_parse_error() {
        let err = parse_script(r#"[{"op": "beep"}]"#).unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }

    #[test]
    fn test_script_serializes_tagged() {
        let json = serde_json::to_string(&ScriptOp::Unview).unwrap();
        assert_eq!(json, r#"{"op":"unview"}"#);
    }
}
