use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};
use serde::Deserialize;
use tracing::warn;

use crate::language_stats::EditEvent;
use crate::tracker::Command;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq)]
pub enum TrackerEvent {
    Edit(EditEvent),
    Focus(bool),
    Command(Command),
    Key(KeyEvent),
    /// Bracketed paste from the terminal
    Paste(String),
    Resize,
    Tick,
    /// The source has no more events
    Closed,
}

/// Source of host events (edits, focus changes, commands, keys)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<TrackerEvent, RecvTimeoutError>;
}

/// Terminal event source using crossterm. Focus and paste events need
/// `EnableFocusChange` and `EnableBracketedPaste` on the terminal.
pub struct CrosstermEventSource {
    rx: Receiver<TrackerEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    Some(TrackerEvent::Key(key))
                }
                Ok(CtEvent::Paste(text)) => Some(TrackerEvent::Paste(text)),
                Ok(CtEvent::Resize(_, _)) => Some(TrackerEvent::Resize),
                Ok(CtEvent::FocusLost) => Some(TrackerEvent::Focus(false)),
                Ok(CtEvent::FocusGained) => Some(TrackerEvent::Focus(true)),
                Ok(_) => None,
                Err(_) => {
                    let _ = tx.send(TrackerEvent::Closed);
                    break;
                }
            };

            if let Some(evt) = evt {
                if tx.send(evt).is_err() {
                    break;
                }
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

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrackerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// One JSON object per line, as written by an editor plugin:
///
/// ```text
/// {"type":"edit","language":"rust","scheme":"file","changes":[{"text":"fn"}]}
/// {"type":"focus","focused":false}
/// {"type":"command","command":"show-time"}
/// ```
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostMessage {
    Edit(EditEvent),
    Focus { focused: bool },
    Command { command: Command },
}

impl From<HostMessage> for TrackerEvent {
    fn from(msg: HostMessage) -> Self {
        match msg {
            HostMessage::Edit(edit) => TrackerEvent::Edit(edit),
            HostMessage::Focus { focused } => TrackerEvent::Focus(focused),
            HostMessage::Command { command } => TrackerEvent::Command(command),
        }
    }
}

pub fn parse_line(line: &str) -> Option<TrackerEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<HostMessage>(line) {
        Ok(msg) => Some(msg.into()),
        Err(e) => {
            warn!(error = %e, line, "skipping malformed event");
            None
        }
    }
}

/// Reads JSON-line events from any reader (usually stdin) on a background thread
pub struct LineEventSource {
    rx: Receiver<TrackerEvent>,
}

impl LineEventSource {
    pub fn new<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if let Some(evt) = parse_line(&line) {
                    if tx.send(evt).is_err() {
                        return;
                    }
                }
            }
            let _ = tx.send(TrackerEvent::Closed);
        });

        Self { rx }
    }
}

impl EventSource for LineEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrackerEvent, RecvTimeoutError> {
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

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<TrackerEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<TrackerEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<TrackerEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> TrackerEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => TrackerEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => TrackerEvent::Closed,
        }
    }
}
