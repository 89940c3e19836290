//! Concrete [`Logger`] sinks.

use core::fmt::Arguments;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use heapless::HistoryBuffer;
use serde::Serialize;

use super::{LogLevel, Logger};

/// Number of entries kept by [`RingBufferLogger`].
pub const LOG_BUFFER_SIZE: usize = 100;

// ============================================================================
// Tracing
// ============================================================================

/// Logger that delegates to the `tracing` crate.
///
/// Output format and filtering are decided by whichever subscriber is
/// installed (see [`crate::logging::init_logging`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!("{}", args),
            LogLevel::Debug => tracing::debug!("{}", args),
            LogLevel::Info => tracing::info!("{}", args),
            LogLevel::Warn => tracing::warn!("{}", args),
            LogLevel::Error => tracing::error!("{}", args),
        }
    }
}

// ============================================================================
// No-op
// ============================================================================

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    #[inline]
    fn log(&self, _level: LogLevel, _args: Arguments<'_>) {}
}

// ============================================================================
// Ring buffer
// ============================================================================

/// A captured log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Milliseconds since the logger was created.
    pub timestamp_ms: u64,
    /// Severity.
    pub level: LogLevel,
    /// Formatted message.
    pub message: String,
}

/// Keeps the most recent [`LOG_BUFFER_SIZE`] entries, overwriting the oldest.
///
/// Entries below `min_level` are ignored so debug chatter does not push
/// warnings out of the buffer.
pub struct RingBufferLogger {
    entries: Mutex<HistoryBuffer<LogEntry, LOG_BUFFER_SIZE>>,
    min_level: LogLevel,
    start_time: Instant,
}

impl Default for RingBufferLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBufferLogger {
    /// Creates a buffer that keeps `Info` and above.
    pub fn new() -> Self {
        Self::with_min_level(LogLevel::Info)
    }

    /// Creates a buffer with a custom minimum level.
    pub fn with_min_level(min_level: LogLevel) -> Self {
        Self {
            entries: Mutex::new(HistoryBuffer::new()),
            min_level,
            start_time: Instant::now(),
        }
    }

    /// Up to `max` of the newest entries, oldest first.
    ///
    /// `max == 0` returns everything held.
    pub fn entries(&self, max: usize) -> Vec<LogEntry> {
        let Ok(buffer) = self.entries.lock() else {
            return Vec::new();
        };
        let held = buffer.len();
        let take = if max == 0 { held } else { max.min(held) };
        buffer
            .oldest_ordered()
            .skip(held - take)
            .cloned()
            .collect()
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|b| b.len()).unwrap_or(0)
    }

    /// Returns true if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every captured entry.
    pub fn clear(&self) {
        if let Ok(mut buffer) = self.entries.lock() {
            *buffer = HistoryBuffer::new();
        }
    }
}

impl Logger for RingBufferLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        if level < self.min_level {
            return;
        }
        let entry = LogEntry {
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            level,
            message: args.to_string(),
        };
        // A poisoned lock only loses this entry
        if let Ok(mut buffer) = self.entries.lock() {
            buffer.write(entry);
        }
    }
}

// ============================================================================
// Fan-out
// ============================================================================

/// Forwards each message to every registered sink, in registration order.
#[derive(Default, Clone)]
pub struct FanoutLogger {
    sinks: Vec<Arc<dyn Logger>>,
}

impl FanoutLogger {
    /// Creates a fan-out with no sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with_sink(mut self, sink: Arc<dyn Logger>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks.
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

impl Logger for FanoutLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        for sink in &self.sinks {
            sink.log(level, args);
        }
    }
}
