//! CLI failures and the process exit codes they map to.

use notify_url_ports::ServiceError;
use notify_url_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidInput = 2,
    Io = 3,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

#[derive(Debug)]
pub enum CliError {
    /// A service URL, scheme or per-message parameter was rejected.
    Service(ServiceError),
    /// Malformed command-line arguments the parser let through.
    InvalidInput(String),
    Io(std::io::Error),
    Serialization(serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Service(error) if error.is_invalid_input() => ExitCode::InvalidInput,
            Self::InvalidInput(_) => ExitCode::InvalidInput,
            Self::Io(_) => ExitCode::Io,
            Self::Service(_) | Self::Serialization(_) => ExitCode::Internal,
        }
    }

    /// Failures reported on stdout as a `status: error` document rather
    /// than a bare stderr line.
    #[must_use]
    pub const fn is_reportable(&self) -> bool {
        matches!(self, Self::Service(_))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service(error) => error.fmt(formatter),
            Self::InvalidInput(message) => write!(formatter, "invalid input: {message}"),
            Self::Io(error) => write!(formatter, "io error: {error}"),
            Self::Serialization(error) => write!(formatter, "serialization error: {error}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ServiceError> for CliError {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

impl From<std::io::Error> for CliError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error)
    }
}

impl From<CliError> for ErrorEnvelope {
    fn from(error: CliError) -> Self {
        let message = error.to_string();
        match error {
            CliError::Service(error) => error.into(),
            CliError::InvalidInput(_) => Self::expected(ErrorCode::invalid_input(), message),
            CliError::Io(_) => Self::unexpected(ErrorCode::new("cli", "io"), message),
            CliError::Serialization(_) => Self::unexpected(ErrorCode::internal(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_failures_are_invalid_input() {
        let unknown = CliError::from(ServiceError::UnknownScheme {
            scheme: "smtp".to_string(),
        });
        assert_eq!(unknown.exit_code(), ExitCode::InvalidInput);
        assert!(unknown.is_reportable());

        let payload = CliError::from(ServiceError::Payload {
            reason: "unserializable".to_string(),
        });
        assert_eq!(payload.exit_code(), ExitCode::Internal);
    }

    #[test]
    fn envelopes_keep_service_metadata() {
        let envelope = ErrorEnvelope::from(CliError::from(ServiceError::UnknownScheme {
            scheme: "smtp".to_string(),
        }));
        assert_eq!(envelope.metadata.get("scheme").map(String::as_str), Some("smtp"));

        let envelope = ErrorEnvelope::from(CliError::InvalidInput("title".to_string()));
        assert_eq!(envelope.code, ErrorCode::invalid_input());
    }
}
