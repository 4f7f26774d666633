//! Notification service boundary contract.

use notify_url_format::{ConfigError, Params, SchemaError};
use notify_url_shared::{ErrorCode, ErrorEnvelope, REDACTED, is_secret_key};
use serde::Serialize;
use std::fmt;
use url::Url;

/// HTTP method of a prepared request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

impl HttpMethod {
    /// Method name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request a service would send for one message. Nothing is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target API URL.
    pub url: String,
    /// Request headers in send order.
    pub headers: Vec<(String, String)>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl PreparedRequest {
    /// Request without headers or body.
    pub fn new(method: HttpMethod, url: &Url) -> Self {
        Self {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Set a JSON body and its content type.
    pub fn json<T: Serialize>(self, body: &T) -> Result<Self, ServiceError> {
        let body = serde_json::to_string(body)?;
        Ok(Self {
            body: Some(body),
            ..self.header("Content-Type", "application/json")
        })
    }

    /// Set a plain text body.
    #[must_use]
    pub fn text(self, body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            ..self
        }
    }

    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Copy safe to print: secret-looking query values, headers and JSON
    /// body keys are masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let url = Url::parse(&self.url).map_or_else(|_| self.url.clone(), |url| redact_query(&url));
        let headers = self
            .headers
            .iter()
            .map(|(name, value)| {
                let value = if is_secret_key(name) {
                    REDACTED.to_string()
                } else {
                    value.clone()
                };
                (name.clone(), value)
            })
            .collect();
        let body = self.body.as_deref().map(redact_body);
        Self {
            method: self.method,
            url,
            headers,
            body,
        }
    }
}

fn redact_query(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if is_secret_key(&key) {
                REDACTED.to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

fn redact_body(body: &str) -> String {
    let Ok(serde_json::Value::Object(mut object)) = serde_json::from_str(body) else {
        return body.to_string();
    };
    for (key, value) in &mut object {
        if is_secret_key(key) {
            *value = serde_json::Value::String(REDACTED.to_string());
        }
    }
    serde_json::Value::Object(object).to_string()
}

/// A configured notification service.
///
/// Implementations are built once from a configuration URL and are then
/// immutable; per-message overrides go through [`Params`] and never touch the
/// stored configuration.
pub trait NotificationService: Send + Sync {
    /// URL scheme identifying the service.
    fn id(&self) -> &'static str;

    /// Canonical configuration URL.
    fn config_url(&self) -> Result<Url, ConfigError>;

    /// Build the requests for one message (one per target, in send order).
    fn prepare(&self, message: &str, params: &Params)
    -> Result<Vec<PreparedRequest>, ServiceError>;
}

/// Service-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Configuration or per-message parameters were rejected.
    Config(ConfigError),
    /// No service handles the URL scheme.
    UnknownScheme {
        /// Scheme as supplied.
        scheme: String,
    },
    /// The input was not a URL.
    InvalidUrl {
        /// Parser message.
        reason: String,
    },
    /// The request payload could not be encoded.
    Payload {
        /// Encoder message.
        reason: String,
    },
}

impl ServiceError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::invalid_input(),
            Self::UnknownScheme { .. } => ErrorCode::new("service", "unknown_scheme"),
            Self::InvalidUrl { .. } => ErrorCode::new("service", "invalid_url"),
            Self::Payload { .. } => ErrorCode::new("service", "payload"),
        }
    }

    /// Whether the failure is caused by user input.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        match self {
            Self::Config(ConfigError::Schema(_) | ConfigError::UnboundField { .. })
            | Self::Payload { .. } => false,
            Self::Config(_) | Self::UnknownScheme { .. } | Self::InvalidUrl { .. } => true,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(error) => error.fmt(formatter),
            Self::UnknownScheme { scheme } => {
                write!(formatter, "no service is registered for scheme `{scheme}`")
            },
            Self::InvalidUrl { reason } => write!(formatter, "invalid URL: {reason}"),
            Self::Payload { reason } => write!(formatter, "failed to encode payload: {reason}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            _ => None,
        }
    }
}

impl From<ConfigError> for ServiceError {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}

impl From<SchemaError> for ServiceError {
    fn from(error: SchemaError) -> Self {
        Self::Config(ConfigError::Schema(error))
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(error: url::ParseError) -> Self {
        Self::InvalidUrl {
            reason: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(error: serde_json::Error) -> Self {
        Self::Payload {
            reason: error.to_string(),
        }
    }
}

impl From<ServiceError> for ErrorEnvelope {
    fn from(error: ServiceError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        match error {
            ServiceError::Config(error) => error.into(),
            ServiceError::UnknownScheme { scheme } => {
                Self::expected(code, message).with_metadata("scheme", scheme)
            },
            ServiceError::InvalidUrl { .. } => Self::expected(code, message),
            ServiceError::Payload { .. } => Self::unexpected(code, message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify_url_shared::ErrorKind;

    #[test]
    fn redaction_masks_secret_query_values_and_body_keys() -> Result<(), Box<dyn std::error::Error>> {
        let url = Url::parse("https://joinjoaomgcd.appspot.com/_ah/api/messaging/v1/sendPush?apikey=abc&text=hi")?;
        let request = PreparedRequest::new(HttpMethod::Get, &url)
            .header("Authorization", "Bearer abc")
            .json(&serde_json::json!({"device_key": "k1", "body": "hello"}))?;

        let redacted = request.redacted();
        assert!(redacted.url.contains("apikey=%5BREDACTED%5D"));
        assert!(redacted.url.contains("text=hi"));
        assert_eq!(redacted.header_value("authorization"), Some(REDACTED));
        let body = redacted.body.unwrap_or_default();
        assert!(!body.contains("k1"));
        assert!(body.contains("hello"));
        Ok(())
    }

    #[test]
    fn json_sets_content_type() -> Result<(), ServiceError> {
        let url = Url::parse("https://api.day.app/push")?;
        let request = PreparedRequest::new(HttpMethod::Post, &url).json(&["a"])?;
        assert_eq!(request.header_value("content-type"), Some("application/json"));
        assert_eq!(request.body.as_deref(), Some("[\"a\"]"));
        Ok(())
    }

    #[test]
    fn unknown_scheme_is_expected() {
        let error = ServiceError::UnknownScheme {
            scheme: "smoke".to_string(),
        };
        assert!(error.is_invalid_input());
        let envelope: ErrorEnvelope = error.into();
        assert_eq!(envelope.kind, ErrorKind::Expected);
        assert_eq!(envelope.code, ErrorCode::new("service", "unknown_scheme"));
    }

    #[test]
    fn config_errors_keep_their_codes() {
        let envelope: ErrorEnvelope =
            ServiceError::from(ConfigError::MissingField { field: "topic" }).into();
        assert_eq!(envelope.code, ErrorCode::new("config", "missing_field"));
    }
}
