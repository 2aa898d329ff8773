//! Clipboard bridge
//!
//! Backends that can reach a clipboard hand it out through
//! [`ClipboardBridge`]. The system clipboard needs the `clipboard` feature;
//! [`open_clipboard`] falls back to memory without it.

/// Clipboard errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard not available: {0}")]
    Unavailable(String),
    #[error("clipboard access failed: {0}")]
    Access(String),
}

/// Text access to a clipboard
pub trait ClipboardBridge {
    fn get_text(&mut self) -> Result<String, ClipboardError>;
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Clipboard that lives in memory, for headless runs and tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryClipboard {
    contents: String,
}

impl MemoryClipboard {
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

impl ClipboardBridge for MemoryClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.contents.clone())
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = text.to_string();
        Ok(())
    }
}

/// The desktop clipboard
#[cfg(feature = "clipboard")]
pub struct SystemClipboard {
    context: copypasta::ClipboardContext,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Result<Self, ClipboardError> {
        use copypasta::ClipboardContext;
        let context = ClipboardContext::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
        Ok(Self { context })
    }
}

#[cfg(feature = "clipboard")]
impl std::fmt::Debug for SystemClipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemClipboard").finish_non_exhaustive()
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardBridge for SystemClipboard {
    fn get_text(&mut self) -> Result<String, ClipboardError> {
        use copypasta::ClipboardProvider;
        self.context
            .get_contents()
            .map_err(|e| ClipboardError::Access(e.to_string()))
    }

    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        use copypasta::ClipboardProvider;
        self.context
            .set_contents(text.to_string())
            .map_err(|e| ClipboardError::Access(e.to_string()))
    }
}

/// Open the desktop clipboard when asked for and available, otherwise a
/// clipboard in memory.
pub fn open_clipboard(system: bool) -> Box<dyn ClipboardBridge> {
    if system {
        #[cfg(feature = "clipboard")]
        match SystemClipboard::new() {
            Ok(clipboard) => return Box::new(clipboard),
            Err(err) => tracing::warn!(error = %err, "using in-memory clipboard"),
        }
        #[cfg(not(feature = "clipboard"))]
        tracing::warn!("built without the clipboard feature, using in-memory clipboard");
    }
    Box::new(MemoryClipboard::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        assert_eq!(clipboard.get_text().unwrap(), "");
        clipboard.set_text("PRINT 1").unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "PRINT 1");
        assert_eq!(clipboard.contents(), "PRINT 1");
    }

    #[test]
    fn test_bridge_as_trait_object() {
        let mut clipboard = MemoryClipboard::default();
        let bridge: &mut dyn ClipboardBridge = &mut clipboard;
        bridge.set_text("x").unwrap();
        assert_eq!(bridge.get_text().unwrap(), "x");
    }

    #[test]
    fn test_open_memory_clipboard() {
        let mut clipboard = open_clipboard(false);
        clipboard.set_text("LIST").unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "LIST");
    }

    #[cfg(not(feature = "clipboard"))]
    #[test]
    fn test_system_clipboard_falls_back_without_feature() {
        let mut clipboard = open_clipboard(true);
        assert_eq!(clipboard.get_text().unwrap(), "");
        clipboard.set_text("RUN").unwrap();
        assert_eq!(clipboard.get_text().unwrap(), "RUN");
    }
}
