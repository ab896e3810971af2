//! Log sink service
//!
//! Bounded, process-wide activity log shown to the operator. The job runner,
//! the connection store and the single-operation path all append to it;
//! observers read the most recent entries at will.

use parking_lot::Mutex;
use std::collections::VecDeque;
use uidmap_core::domain::log::{LogEntry, LogLevel};

/// Service for the shared activity log
///
/// Appends are thread-safe. Reads are snapshots: each call re-evaluates
/// against the current contents.
pub trait LogSink: Send + Sync {
    /// Adds a log entry, evicting the oldest one when full
    fn append(&self, entry: LogEntry);

    /// Returns up to `n` entries, most recent first
    fn recent(&self, n: usize) -> Vec<LogEntry>;

    /// Number of entries currently retained
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn info(&self, message: String) {
        self.append(LogEntry::new(LogLevel::Info, message));
    }

    fn warning(&self, message: String) {
        self.append(LogEntry::new(LogLevel::Warning, message));
    }

    fn error(&self, message: String) {
        self.append(LogEntry::new(LogLevel::Error, message));
    }

    fn success(&self, message: String) {
        self.append(LogEntry::new(LogLevel::Success, message));
    }
}

/// In-memory implementation of LogSink
///
/// FIFO ring over a `VecDeque`. The lock is only held for a push or a copy,
/// so writers are never stalled behind a slow reader.
pub struct BoundedLogSink {
    capacity: usize,
    entries: Mutex<VecDeque<LogEntry>>,
}

impl BoundedLogSink {
    /// Creates a sink retaining at most `capacity` entries (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl LogSink for BoundedLogSink {
    fn append(&self, entry: LogEntry) {
        match entry.level {
            LogLevel::Error => tracing::error!("{}", entry.message),
            LogLevel::Warning => tracing::warn!("{}", entry.message),
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", entry.message),
        }

        let mut entries = self.entries.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    fn recent(&self, n: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        entries.iter().rev().take(n).cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
