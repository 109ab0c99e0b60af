//! Operator log: the session transcript shown to the person driving.
//!
//! Append-only and unbounded for the lifetime of a session; only
//! [`OperatorLog::clear`] removes entries. Live viewers tail it through a
//! broadcast channel; a slow viewer misses lines but never blocks the link.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the live-tail channel.
const LIVE_CAPACITY: usize = 256;

/// Where a log line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Frame received from the device
    Inbound,
    /// Command written to the device
    Outbound,
    /// Link lifecycle and errors
    System,
}

impl Direction {
    fn arrow(self) -> &'static str {
        match self {
            Self::Inbound => "<-",
            Self::Outbound => "->",
            Self::System => "--",
        }
    }
}

/// One line of the operator log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Milliseconds since the Unix epoch
    pub at_ms: u64,
    pub direction: Direction,
    pub text: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.direction.arrow(), self.text)
    }
}

struct LogInner {
    entries: Mutex<Vec<LogEntry>>,
    live: broadcast::Sender<LogEntry>,
}

/// Shared handle to the session log. Cloning shares the same log.
#[derive(Clone)]
pub struct OperatorLog {
    inner: Arc<LogInner>,
}

impl OperatorLog {
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            inner: Arc::new(LogInner {
                entries: Mutex::new(Vec::new()),
                live,
            }),
        }
    }

    /// Append a line and publish it to live viewers.
    pub fn append(&self, direction: Direction, text: impl Into<String>) {
        let entry = LogEntry {
            at_ms: heatscape_protocol::now_ms(),
            direction,
            text: text.into(),
        };
        self.lock().push(entry.clone());
        // No receivers is fine
        let _ = self.inner.live.send(entry);
    }

    /// Snapshot of every entry so far.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop all entries (operator action).
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Tail new entries as they are appended.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.live.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        // A panic while holding the lock cannot leave a Vec half-pushed
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for OperatorLog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OperatorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorLog")
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_clear() {
        let log = OperatorLog::new();
        assert!(log.is_empty());

        log.append(Direction::System, "Connected");
        log.append(Direction::Inbound, "CAM_IP:10.0.0.2");
        log.append(Direction::Outbound, "forward");

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].text, "CAM_IP:10.0.0.2");
        assert_eq!(entries[2].to_string(), "-> forward");

        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn clones_share_entries() {
        let log = OperatorLog::new();
        let other = log.clone();
        other.append(Direction::System, "shared");
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn live_tail_receives_new_entries() {
        let log = OperatorLog::new();
        log.append(Direction::System, "before subscribe");

        let mut rx = log.subscribe();
        log.append(Direction::Inbound, "TEMP_DATA:[1,2]");

        let entry = rx.recv().await.unwrap();
        assert_eq!(entry.direction, Direction::Inbound);
        assert_eq!(entry.text, "TEMP_DATA:[1,2]");
    }
}
