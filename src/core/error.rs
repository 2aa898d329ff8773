//! Errors raised by the video core
//!
//! Only mode-level problems are errors. Out-of-range memory access, pixel
//! operations outside the page and clipped draws degrade silently instead.

/// An illegal request against the current adapter or mode.
///
/// Every variant is raised before any state is touched, so a failed call
/// leaves the screen exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModeError {
    #[error("screen mode {number} (width {width:?}) is not available on this adapter")]
    UnsupportedMode { number: u8, width: Option<usize> },

    #[error("width {0} is not available in the current screen mode")]
    UnsupportedWidth(usize),

    #[error("page {page} out of range: mode has {num_pages} pages")]
    PageOutOfRange { page: usize, num_pages: usize },

    #[error("the palette of this adapter cannot be changed")]
    FixedPalette,

    #[error("attribute {attr} out of range: mode has {num_attr} attributes")]
    AttributeOutOfRange { attr: usize, num_attr: usize },

    #[error("colour {colour} out of range: adapter has {num_colours} colours")]
    ColourOutOfRange { colour: usize, num_colours: usize },

    #[error("view rows {top}..={bottom} do not fit a screen of {height} rows")]
    InvalidView { top: usize, bottom: usize, height: usize },
}

impl ModeError {
    /// All mode errors surface as BASIC's "Illegal function call".
    pub fn is_illegal_function_call(&self) -> bool {
        true
    }
}
