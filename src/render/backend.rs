//! Backend contract
//!
//! A backend turns render events into something visible. It lives on the
//! render thread and never calls back into the screen. Backends are tried
//! in priority order at startup; the first one that initialises wins.

use tracing::{debug, warn};

use super::event::RenderEvent;
use crate::app::{ClipboardBridge, Config};
use crate::core::{BlinkPhase, VideoModeDescriptor};

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend {name} failed to start: {reason}")]
    Init { name: String, reason: String },
    #[error("no display backend available (tried: {})", .tried.join(", "))]
    NoneAvailable { tried: Vec<String> },
    #[error("failed to start render thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("render thread panicked")]
    Panicked,
}

/// A display backend
pub trait Backend: Send {
    fn name(&self) -> &str;

    /// Whether the backend can show a mode
    fn supports(&self, _mode: &VideoModeDescriptor) -> bool {
        true
    }

    /// Apply one event to the backend's copy of the display
    fn handle(&mut self, event: &RenderEvent);

    /// Draw a frame
    fn repaint(&mut self, phase: BlinkPhase);

    fn clipboard(&mut self) -> Option<&mut dyn ClipboardBridge> {
        None
    }

    fn shutdown(&mut self) {}
}

/// Constructor of a backend
pub type BackendFactory = fn(&Config) -> Result<Box<dyn Backend>, BackendError>;

/// A named backend constructor
#[derive(Clone, Copy)]
pub struct BackendEntry {
    pub name: &'static str,
    pub factory: BackendFactory,
}

impl std::fmt::Debug for BackendEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendEntry").field("name", &self.name).finish()
    }
}

/// Backends built into this crate
pub fn builtin_backends() -> Vec<BackendEntry> {
    vec![BackendEntry {
        name: "headless",
        factory: super::shadow::HeadlessBackend::factory,
    }]
}

/// Order the available backends by the configured priority list.
///
/// Names the configuration lists but nobody provides are skipped with a
/// warning. An empty list keeps the available order.
pub fn backend_chain(available: &[BackendEntry], priority: &[String]) -> Vec<BackendEntry> {
    if priority.is_empty() {
        return available.to_vec();
    }
    priority
        .iter()
        .filter_map(|name| {
            let entry = available.iter().find(|e| e.name == name.as_str()).copied();
            if entry.is_none() {
                warn!(backend = %name, "unknown display backend");
            }
            entry
        })
        .collect()
}

/// Start the first backend in `chain` that initialises and can show the
/// mode the screen starts in.
pub fn init_backend(
    chain: &[BackendEntry],
    config: &Config,
    start_mode: &VideoModeDescriptor,
) -> Result<Box<dyn Backend>, BackendError> {
    let mut tried = Vec::new();
    for entry in chain {
        match (entry.factory)(config) {
            Ok(backend) if backend.supports(start_mode) => {
                debug!(backend = entry.name, "display backend started");
                return Ok(backend);
            }
            Ok(mut backend) => {
                warn!(
                    backend = entry.name,
                    mode = start_mode.name,
                    "display backend cannot show start mode, trying next"
                );
                backend.shutdown();
                tried.push(entry.name.to_string());
            }
            Err(err) => {
                warn!(backend = entry.name, error = %err, "display backend unavailable, trying next");
                tried.push(entry.name.to_string());
            }
        }
    }
    Err(BackendError::NoneAvailable { tried })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Adapter, ModeCatalog};
    use std::sync::Arc;

    /// Accepts graphics modes only
    struct GraphicsOnly;

    impl Backend for GraphicsOnly {
        fn name(&self) -> &str {
            "graphics"
        }

        fn supports(&self, mode: &VideoModeDescriptor) -> bool {
            !mode.is_text()
        }

        fn handle(&mut self, _event: &RenderEvent) {}

        fn repaint(&mut self, _phase: BlinkPhase) {}
    }

    fn graphics_only(_: &Config) -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(GraphicsOnly))
    }

    fn mode(number: u8) -> Arc<VideoModeDescriptor> {
        ModeCatalog::new(Adapter::Cga, 0x10000).find(number, None).unwrap()
    }

    fn failing(_: &Config) -> Result<Box<dyn Backend>, BackendError> {
        Err(BackendError::Init {
            name: "broken".into(),
            reason: "no display".into(),
        })
    }

    fn broken() -> BackendEntry {
        BackendEntry {
            name: "broken",
            factory: failing,
        }
    }

    #[test]
    fn test_fallback_to_next_backend() {
        let mut chain = vec![broken()];
        chain.extend(builtin_backends());
        let backend = init_backend(&chain, &Config::default(), &mode(0)).unwrap();
        assert_eq!(backend.name(), "headless");
    }

    #[test]
    fn test_none_available() {
        let err = init_backend(&[broken(), broken()], &Config::default(), &mode(0))
            .err()
            .unwrap();
        assert!(matches!(&err, BackendError::NoneAvailable { tried } if tried.len() == 2));
        assert_eq!(err.to_string(), "no display backend available (tried: broken, broken)");
    }

    #[test]
    fn test_skips_backend_without_start_mode() {
        let mut chain = vec![BackendEntry {
            name: "graphics",
            factory: graphics_only,
        }];
        chain.extend(builtin_backends());
        let backend = init_backend(&chain, &Config::default(), &mode(0)).unwrap();
        assert_eq!(backend.name(), "headless");
        let backend = init_backend(&chain, &Config::default(), &mode(1)).unwrap();
        assert_eq!(backend.name(), "graphics");

        let err = init_backend(&chain[..1], &Config::default(), &mode(0)).err().unwrap();
        assert!(matches!(&err, BackendError::NoneAvailable { tried } if tried == &["graphics"]));
    }

    #[test]
    fn test_chain_follows_priority() {
        let mut available = vec![broken()];
        available.extend(builtin_backends());
        let chain = backend_chain(&available, &["headless".into(), "missing".into(), "broken".into()]);
        let names: Vec<_> = chain.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["headless", "broken"]);
        assert_eq!(backend_chain(&available, &[]).len(), 2);
    }
}
