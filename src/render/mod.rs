//! Rendering side of the video subsystem
//!
//! The screen sends [`RenderEvent`]s one way over a channel; a backend on
//! its own thread mirrors them and paints. Nothing here calls back into
//! the screen.

mod backend;
mod channel;
mod event;
mod runner;
mod shadow;

pub use backend::{backend_chain, builtin_backends, init_backend, Backend, BackendEntry, BackendError, BackendFactory};
pub use channel::{render_channel, RenderReceiver, RenderSender, RepaintScheduler, RepaintSignal};
pub use event::RenderEvent;
pub use runner::RenderThread;
pub use shadow::{HeadlessBackend, ShadowOutput};
