//! Logging interface with pluggable sinks.
//!
//! Components log through an `Arc<dyn Logger>` and never name a concrete
//! sink. The binary decides where messages go by composing sinks:
//!
//! - [`TracingLogger`]: console output through `tracing`
//! - [`RingBufferLogger`]: the last [`LOG_BUFFER_SIZE`] entries, served by `/api/logs`
//! - [`NoOpLogger`]: silence, for tests
//! - [`FanoutLogger`]: forwards every message to a list of sinks
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use linklight::log::{FanoutLogger, LogLevel, Logger, NoOpLogger, RingBufferLogger};
//! use linklight::log_warn;
//!
//! let ring = Arc::new(RingBufferLogger::new());
//! let logger: Arc<dyn Logger> = Arc::new(
//!     FanoutLogger::new()
//!         .with_sink(Arc::new(NoOpLogger))
//!         .with_sink(ring.clone()),
//! );
//!
//! log_warn!(logger, "station '{}' not in topology", "Tukwila");
//! let entries = ring.entries(10);
//! assert_eq!(entries[0].level, LogLevel::Warn);
//! assert_eq!(entries[0].message, "station 'Tukwila' not in topology");
//! ```

mod logger;
mod sinks;

pub use logger::{LogLevel, Logger};
pub use sinks::{FanoutLogger, LogEntry, NoOpLogger, RingBufferLogger, TracingLogger, LOG_BUFFER_SIZE};
