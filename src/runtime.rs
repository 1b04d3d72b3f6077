use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the reader loop
#[derive(Clone, Debug)]
pub enum ReaderEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait ReaderEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<ReaderEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) => ReaderEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => ReaderEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    log::warn!("terminal event reader stopped: {}", e);
                    break;
                }
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests and headless runs
pub struct TestEventSource {
    rx: Receiver<ReaderEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ReaderEvent>) -> Self {
        Self { rx }
    }
}

impl ReaderEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ReaderEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the reader one event/tick at a time
pub struct Runner<E: ReaderEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: ReaderEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> ReaderEvent {
        self.wait(self.ticker.interval())
    }

    /// Like `step`, but wakes no later than `deadline` so a pending word
    /// is shown on time instead of at the next tick boundary.
    pub fn step_until(&self, deadline: Option<Instant>) -> ReaderEvent {
        let mut timeout = self.ticker.interval();
        if let Some(deadline) = deadline {
            timeout = timeout.min(deadline.saturating_duration_since(Instant::now()));
        }
        self.wait(timeout)
    }

    fn wait(&self, timeout: Duration) -> ReaderEvent {
        match self.event_source.recv_timeout(timeout) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                ReaderEvent::Tick
            }
        }
    }
}
