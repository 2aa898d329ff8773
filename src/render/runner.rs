//! Render thread
//!
//! Owns the backend for its whole life. Each tick it applies every queued
//! event, then repaints if something was sent or the blink phase moved on.
//! A `Quit` event ends the loop after one final frame.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use super::backend::{Backend, BackendError};
use super::channel::{RenderReceiver, RepaintScheduler};
use super::event::RenderEvent;
use crate::core::BlinkPhase;

/// Handle on a running render thread
#[derive(Debug)]
pub struct RenderThread {
    handle: JoinHandle<()>,
}

impl RenderThread {
    /// Move `backend` onto a new thread fed by `receiver`.
    pub fn spawn(
        backend: Box<dyn Backend>,
        receiver: RenderReceiver,
        tick: Duration,
    ) -> Result<Self, BackendError> {
        let name = format!("render-{}", backend.name());
        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || run(backend, receiver, tick))?;
        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the thread to exit
    pub fn join(self) -> Result<(), BackendError> {
        self.handle.join().map_err(|_| BackendError::Panicked)
    }
}

fn run(mut backend: Box<dyn Backend>, receiver: RenderReceiver, tick: Duration) {
    let tick = tick.max(Duration::from_millis(1));
    let start = Instant::now();
    let mut scheduler = RepaintScheduler::new(receiver.signal().clone(), tick);
    let mut last_phase = None;

    loop {
        let stop = match receiver.recv_timeout(tick) {
            Ok(Some(event)) => apply(backend.as_mut(), event, &receiver),
            Ok(None) => false,
            Err(_) => {
                debug!(backend = backend.name(), "render channel closed");
                true
            }
        };
        if stop {
            break;
        }

        let now = Instant::now();
        let phase = BlinkPhase::at(now.saturating_duration_since(start));
        if scheduler.poll(now) || last_phase != Some(phase) {
            backend.repaint(phase);
            last_phase = Some(phase);
        }
    }

    backend.repaint(BlinkPhase::at(start.elapsed()));
    backend.shutdown();
    debug!(backend = backend.name(), "render thread stopped");
}

/// Apply `first` and everything queued behind it. Returns true at `Quit`;
/// events after it are dropped.
fn apply(backend: &mut dyn Backend, first: RenderEvent, receiver: &RenderReceiver) -> bool {
    for event in std::iter::once(first).chain(receiver.drain()) {
        if event == RenderEvent::Quit {
            return true;
        }
        backend.handle(&event);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::channel::render_channel;
    use crate::render::shadow::HeadlessBackend;

    #[test]
    fn test_quit_paints_final_frame() {
        let backend = HeadlessBackend::new();
        let output = backend.output();
        let (mut tx, rx) = render_channel();
        let thread = RenderThread::spawn(Box::new(backend), rx, Duration::from_millis(5)).unwrap();

        for x in 0..100 {
            tx.send(RenderEvent::PutPixel {
                page: 0,
                x,
                y: 0,
                attr: 1,
            });
        }
        tx.quit();
        tx.send(RenderEvent::SetBorderAttr(3));
        thread.join().unwrap();

        let output = output.lock().unwrap();
        assert_eq!(output.events, 100);
        assert!(output.frames >= 1);
        assert!(output.shut_down);
    }

    #[test]
    fn test_stops_when_sender_dropped() {
        let backend = HeadlessBackend::new();
        let output = backend.output();
        let (tx, rx) = render_channel();
        let thread = RenderThread::spawn(Box::new(backend), rx, Duration::from_millis(5)).unwrap();
        drop(tx);
        thread.join().unwrap();
        assert!(output.lock().unwrap().shut_down);
    }
}
