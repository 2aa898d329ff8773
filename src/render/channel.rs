//! Event channel between the interpreter and a backend
//!
//! Events travel over an unbounded channel so that sending never blocks.
//! Every send also raises a shared repaint flag; the backend checks that
//! flag once per tick, so any number of events between two ticks cost a
//! single repaint.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::event::RenderEvent;

/// Coalescing "something changed" flag
#[derive(Debug, Clone, Default)]
pub struct RepaintSignal(Arc<AtomicBool>);

impl RepaintSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag, returning whether it was set
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

/// Create a connected sender/receiver pair
pub fn render_channel() -> (RenderSender, RenderReceiver) {
    let (tx, rx) = mpsc::channel();
    let signal = RepaintSignal::new();
    (
        RenderSender {
            tx,
            subscribers: Vec::new(),
            signal: signal.clone(),
        },
        RenderReceiver { rx, signal },
    )
}

/// Interpreter side of the channel
#[derive(Debug)]
pub struct RenderSender {
    tx: Sender<RenderEvent>,
    subscribers: Vec<Sender<RenderEvent>>,
    signal: RepaintSignal,
}

impl RenderSender {
    /// A sender whose events go nowhere, for screens without a backend
    pub fn detached() -> Self {
        render_channel().0
    }

    /// Queue an event. A backend that has gone away is not an error.
    pub fn send(&mut self, event: RenderEvent) {
        if !self.subscribers.is_empty() {
            self.subscribers.retain(|s| s.send(event.clone()).is_ok());
        }
        let _ = self.tx.send(event);
        self.signal.set();
    }

    /// Receive a copy of every event sent from now on
    pub fn subscribe(&mut self) -> Receiver<RenderEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Ask the backend to paint a last frame and stop
    pub fn quit(&mut self) {
        self.send(RenderEvent::Quit);
    }

    pub fn signal(&self) -> &RepaintSignal {
        &self.signal
    }
}

/// Backend side of the channel
#[derive(Debug)]
pub struct RenderReceiver {
    rx: Receiver<RenderEvent>,
    signal: RepaintSignal,
}

impl RenderReceiver {
    /// Wait up to `timeout` for the next event.
    ///
    /// `Ok(None)` means the timeout passed; `Err` means every sender is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<RenderEvent>, RecvTimeoutError> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Ok(Some(event)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Every event queued right now, in order
    pub fn drain(&self) -> Vec<RenderEvent> {
        self.rx.try_iter().collect()
    }

    pub fn signal(&self) -> &RepaintSignal {
        &self.signal
    }
}

/// Decides on which ticks to repaint.
#[derive(Debug)]
pub struct RepaintScheduler {
    signal: RepaintSignal,
    interval: Duration,
    last: Option<Instant>,
}

impl RepaintScheduler {
    pub fn new(signal: RepaintSignal, interval: Duration) -> Self {
        Self {
            signal,
            interval,
            last: None,
        }
    }

    /// Whether to repaint at `now`: at most once per interval, and only if
    /// something was sent since the last repaint.
    pub fn poll(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last {
            if now.saturating_duration_since(last) < self.interval {
                return false;
            }
        }
        if self.signal.take() {
            self.last = Some(now);
            true
        } else {
            false
        }
    }
}
