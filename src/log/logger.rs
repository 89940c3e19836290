//! Logger trait definition.

use core::fmt::Arguments;

use serde::{Deserialize, Serialize};

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose debugging information
    Trace,
    /// Debugging information
    Debug,
    /// General information
    Info,
    /// Warning messages
    Warn,
    /// Error messages
    Error,
}

impl LogLevel {
    /// Single-letter tag as shown in the dashboard log view.
    #[inline]
    pub const fn letter(&self) -> char {
        match self {
            LogLevel::Trace => 'V',
            LogLevel::Debug => 'D',
            LogLevel::Info => 'I',
            LogLevel::Warn => 'W',
            LogLevel::Error => 'E',
        }
    }
}

/// Logging interface for engine components.
///
/// Implementations must be `Send + Sync`; the fetcher, renderer and web
/// handlers share one logger across tasks.
pub trait Logger: Send + Sync {
    /// Log a message at the specified level.
    fn log(&self, level: LogLevel, args: Arguments<'_>);

    /// Log a trace-level message.
    fn trace(&self, args: Arguments<'_>) {
        self.log(LogLevel::Trace, args);
    }

    /// Log a debug-level message.
    fn debug(&self, args: Arguments<'_>) {
        self.log(LogLevel::Debug, args);
    }

    /// Log an info-level message.
    fn info(&self, args: Arguments<'_>) {
        self.log(LogLevel::Info, args);
    }

    /// Log a warning-level message.
    fn warn(&self, args: Arguments<'_>) {
        self.log(LogLevel::Warn, args);
    }

    /// Log an error-level message.
    fn error(&self, args: Arguments<'_>) {
        self.log(LogLevel::Error, args);
    }
}

/// Log a trace-level message through a [`Logger`].
#[macro_export]
macro_rules! log_trace {
    ($logger:expr, $($arg:tt)*) => {{
        #[allow(unused_imports)]
        use $crate::log::Logger as _;
        $logger.trace(format_args!($($arg)*))
    }};
}

/// Log a debug-level message through a [`Logger`].
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {{
        #[allow(unused_imports)]
        use $crate::log::Logger as _;
        $logger.debug(format_args!($($arg)*))
    }};
}

/// Log an info-level message through a [`Logger`].
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {{
        #[allow(unused_imports)]
        use $crate::log::Logger as _;
        $logger.info(format_args!($($arg)*))
    }};
}

/// Log a warning through a [`Logger`].
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {{
        #[allow(unused_imports)]
        use $crate::log::Logger as _;
        $logger.warn(format_args!($($arg)*))
    }};
}

/// Log an error through a [`Logger`].
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {{
        #[allow(unused_imports)]
        use $crate::log::Logger as _;
        $logger.error(format_args!($($arg)*))
    }};
}
