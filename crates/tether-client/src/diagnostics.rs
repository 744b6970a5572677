//! Bounded log of every frame that crosses the router.
//!
//! Pure observational sink: consuming it (filtering, virtualization,
//! pause/resume of capture) is external to the protocol core and never feeds
//! back into protocol behavior. Time is passed in by the caller so pruning is
//! deterministic under test.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tether_proto::Frame;

/// Which way a frame crossed the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Produced locally and handed to the transport.
    Sent,
    /// Delivered by the transport.
    Received,
}

/// What was captured for one log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameRecord {
    /// A well-formed frame.
    Frame(Frame),
    /// Inbound text that failed to decode; recorded, then dropped by the
    /// router.
    Malformed {
        /// The raw message text.
        raw: String,
        /// Why decoding failed.
        error: String,
    },
}

/// One captured crossing.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Direction of travel.
    pub direction: Direction,
    /// When the crossing was observed.
    pub at: Instant,
    /// The frame, or the malformed text.
    pub record: FrameRecord,
}

/// Pruning bounds for the diagnostics buffer.
#[derive(Debug, Clone)]
pub struct DiagnosticsConfig {
    /// Maximum retained entries; the oldest are pruned first.
    pub max_entries: usize,
    /// Maximum entry age relative to the latest recording.
    pub max_age: Duration,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { max_entries: 1024, max_age: Duration::from_secs(300) }
    }
}

/// Append-only, bounded frame log.
#[derive(Debug)]
pub struct DiagnosticsBuffer {
    config: DiagnosticsConfig,
    entries: VecDeque<LogEntry>,
}

impl DiagnosticsBuffer {
    /// Create an empty buffer with the given bounds.
    pub fn new(config: DiagnosticsConfig) -> Self {
        Self { config, entries: VecDeque::new() }
    }

    /// Append one crossing and prune to the configured bounds.
    pub fn record(&mut self, direction: Direction, record: FrameRecord, now: Instant) {
        self.entries.push_back(LogEntry { direction, at: now, record });
        self.prune(now);
    }

    fn prune(&mut self, now: Instant) {
        while self.entries.len() > self.config.max_entries {
            self.entries.pop_front();
        }
        while let Some(front) = self.entries.front() {
            if now.duration_since(front.at) > self.config.max_age {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }

    /// Copy of the retained entries, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the buffer holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
