//! Structured logging boundary contract.

use std::collections::BTreeMap;

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug.
    Debug,
    /// Info.
    Info,
    /// Warn.
    Warn,
    /// Error.
    Error,
}

impl LogLevel {
    /// Lower-case level name as written to log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Additional event fields.
pub type LogFields = BTreeMap<Box<str>, serde_json::Value>;

/// Structured log event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    /// Stable event name, e.g. `service.initialized`.
    pub event: Box<str>,
    /// Severity.
    pub level: LogLevel,
    /// Human-readable message (safe, redacted).
    pub message: Box<str>,
    /// Optional structured fields.
    pub fields: Option<LogFields>,
    /// Optional error payload (a serialized `ErrorEnvelope`).
    pub error: Option<serde_json::Value>,
}

impl LogEvent {
    /// Event without fields.
    pub fn new(event: &str, level: LogLevel, message: &str) -> Self {
        Self {
            event: event.into(),
            level,
            message: message.into(),
            fields: None,
            error: None,
        }
    }

    /// Attach one structured field.
    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Attach an error payload.
    #[must_use]
    pub fn with_error(mut self, error: serde_json::Value) -> Self {
        self.error = Some(error);
        self
    }
}

/// Boundary contract for structured logging.
pub trait LoggerPort: Send + Sync {
    /// Emit a structured event.
    fn log(&self, event: LogEvent);

    /// Create a child logger with base fields applied to every event.
    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort>;

    /// Convenience: debug event.
    fn debug(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(event, LogLevel::Debug, message)
        });
    }

    /// Convenience: info event.
    fn info(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(event, LogLevel::Info, message)
        });
    }

    /// Convenience: warn event.
    fn warn(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(event, LogLevel::Warn, message)
        });
    }

    /// Convenience: error event.
    fn error(&self, event: &str, message: &str, fields: Option<LogFields>) {
        self.log(LogEvent {
            fields,
            ..LogEvent::new(event, LogLevel::Error, message)
        });
    }
}

/// Logger that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}
