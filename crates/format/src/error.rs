//! Error taxonomy for the configuration codec.
//!
//! - [`SchemaError`]: a defect in a record type's field declarations.
//! - [`ConfigError`]: a problem with one URL or record instance.
//! - [`NotFoundError`]: a single-field lookup named no known key.

use crate::descriptor::FieldKind;
use notify_url_shared::{ErrorCode, ErrorEnvelope, REDACTED, is_secret_key};
use std::fmt;

/// Defects in a record type's field declarations, detected on first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two fields (or a key and an alias) resolve to the same query key.
    DuplicateKey {
        /// Record type name.
        record: &'static str,
        /// Lower-cased query key.
        key: String,
    },
    /// A field declares both an explicit key and a URL part.
    ConflictingBinding {
        /// Record type name.
        record: &'static str,
        /// Offending field.
        field: &'static str,
    },
    /// Two fields are bound to the same URL slot.
    DuplicateUrlPart {
        /// Record type name.
        record: &'static str,
        /// Second field claiming the slot.
        field: &'static str,
        /// Slot name (`host`, `path`, `user`, `password`).
        part: &'static str,
    },
    /// An enum field has no formatter attached.
    MissingFormatter {
        /// Record type name.
        record: &'static str,
        /// Offending field.
        field: &'static str,
    },
    /// A declared default does not coerce to the field's kind.
    InvalidDefault {
        /// Record type name.
        record: &'static str,
        /// Offending field.
        field: &'static str,
        /// Declared default.
        value: &'static str,
    },
}

impl SchemaError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::DuplicateKey { .. } => ErrorCode::new("schema", "duplicate_key"),
            Self::ConflictingBinding { .. } => ErrorCode::new("schema", "conflicting_binding"),
            Self::DuplicateUrlPart { .. } => ErrorCode::new("schema", "duplicate_url_part"),
            Self::MissingFormatter { .. } => ErrorCode::new("schema", "missing_formatter"),
            Self::InvalidDefault { .. } => ErrorCode::new("schema", "invalid_default"),
        }
    }

    /// Record type the defect belongs to.
    #[must_use]
    pub const fn record(&self) -> &'static str {
        match self {
            Self::DuplicateKey { record, .. }
            | Self::ConflictingBinding { record, .. }
            | Self::DuplicateUrlPart { record, .. }
            | Self::MissingFormatter { record, .. }
            | Self::InvalidDefault { record, .. } => *record,
        }
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { record, key } => {
                write!(formatter, "{record}: query key `{key}` is declared twice")
            },
            Self::ConflictingBinding { record, field } => write!(
                formatter,
                "{record}.{field}: a field cannot bind both a query key and a URL part"
            ),
            Self::DuplicateUrlPart {
                record,
                field,
                part,
            } => write!(
                formatter,
                "{record}.{field}: URL part `{part}` is already bound by another field"
            ),
            Self::MissingFormatter { record, field } => {
                write!(formatter, "{record}.{field}: enum field has no formatter")
            },
            Self::InvalidDefault {
                record,
                field,
                value,
            } => write!(
                formatter,
                "{record}.{field}: default {value:?} is not valid for the field"
            ),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<SchemaError> for ErrorEnvelope {
    fn from(error: SchemaError) -> Self {
        let envelope = Self::invariant(error.error_code(), error.to_string())
            .with_metadata("record", error.record());
        match error {
            SchemaError::DuplicateKey { key, .. } => envelope.with_metadata("key", key),
            SchemaError::ConflictingBinding { field, .. }
            | SchemaError::MissingFormatter { field, .. } => envelope.with_metadata("field", field),
            SchemaError::DuplicateUrlPart { field, part, .. } => envelope
                .with_metadata("field", field)
                .with_metadata("part", part),
            SchemaError::InvalidDefault { field, value, .. } => envelope
                .with_metadata("field", field)
                .with_metadata("value", value),
        }
    }
}

/// A problem with a specific URL or record instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required field was absent or empty.
    MissingField {
        /// Field name.
        field: &'static str,
    },
    /// A raw value could not be coerced to the field's kind.
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Raw value as supplied.
        raw: String,
        /// Kind the field expects.
        expected: FieldKind,
    },
    /// An enum token is outside the declared set.
    InvalidEnumToken {
        /// Field name.
        field: &'static str,
        /// Token as supplied.
        token: String,
        /// Declared tokens.
        allowed: &'static [&'static str],
    },
    /// A query parameter matched no field.
    UnrecognizedParameter {
        /// Parameter key as supplied.
        key: String,
    },
    /// A record-declared cross-field check failed.
    Validation {
        /// Field the check is about.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },
    /// The URL could not be built or is structurally unusable.
    InvalidUrl {
        /// Human readable reason.
        reason: String,
    },
    /// A described field is not handled by the record's accessors.
    UnboundField {
        /// Field name.
        field: &'static str,
    },
    /// The record type's declarations are defective.
    Schema(SchemaError),
}

impl ConfigError {
    /// Build a cross-field validation error.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Field the error is about, when there is one.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField { field }
            | Self::InvalidValue { field, .. }
            | Self::InvalidEnumToken { field, .. }
            | Self::Validation { field, .. }
            | Self::UnboundField { field } => Some(*field),
            Self::UnrecognizedParameter { key } => Some(key.as_str()),
            Self::InvalidUrl { .. } | Self::Schema(_) => None,
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } => ErrorCode::new("config", "missing_field"),
            Self::InvalidValue { .. } => ErrorCode::new("config", "invalid_value"),
            Self::InvalidEnumToken { .. } => ErrorCode::new("config", "invalid_enum_token"),
            Self::UnrecognizedParameter { .. } => {
                ErrorCode::new("config", "unrecognized_parameter")
            },
            Self::Validation { .. } => ErrorCode::new("config", "validation_failed"),
            Self::InvalidUrl { .. } => ErrorCode::new("config", "invalid_url"),
            Self::UnboundField { .. } => ErrorCode::new("config", "unbound_field"),
            Self::Schema(error) => error.error_code(),
        }
    }
}

fn shown(field: &str, raw: &str) -> String {
    if is_secret_key(field) {
        REDACTED.to_string()
    } else {
        format!("{raw:?}")
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(formatter, "missing required field `{field}`"),
            Self::InvalidValue {
                field,
                raw,
                expected,
            } => write!(
                formatter,
                "invalid value {} for field `{field}`: expected {expected}",
                shown(field, raw)
            ),
            Self::InvalidEnumToken {
                field,
                token,
                allowed,
            } => write!(
                formatter,
                "invalid value {} for field `{field}`: expected one of {}",
                shown(field, token),
                allowed.join(", ")
            ),
            Self::UnrecognizedParameter { key } => {
                write!(formatter, "unrecognized parameter `{key}`")
            },
            Self::Validation { field, reason } => write!(formatter, "invalid `{field}`: {reason}"),
            Self::InvalidUrl { reason } => write!(formatter, "invalid URL: {reason}"),
            Self::UnboundField { field } => write!(
                formatter,
                "field `{field}` is described but not handled by the record"
            ),
            Self::Schema(error) => error.fmt(formatter),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Schema(error) => Some(error),
            _ => None,
        }
    }
}

impl From<SchemaError> for ConfigError {
    fn from(error: SchemaError) -> Self {
        Self::Schema(error)
    }
}

impl From<ConfigError> for ErrorEnvelope {
    fn from(error: ConfigError) -> Self {
        let code = error.error_code();
        let message = error.to_string();
        match error {
            ConfigError::Schema(error) => error.into(),
            ConfigError::UnboundField { field } => {
                Self::invariant(code, message).with_metadata("field", field)
            },
            ConfigError::MissingField { field } => {
                Self::expected(code, message).with_metadata("field", field)
            },
            ConfigError::InvalidValue {
                field,
                raw,
                expected,
            } => Self::expected(code, message)
                .with_metadata("field", field)
                .with_metadata("expected", expected.to_string())
                .with_field_value(field, raw),
            ConfigError::InvalidEnumToken {
                field,
                token,
                allowed,
            } => Self::expected(code, message)
                .with_metadata("field", field)
                .with_metadata("allowed", allowed.join(","))
                .with_field_value(field, token),
            ConfigError::UnrecognizedParameter { key } => {
                Self::expected(code, message).with_metadata("key", key)
            },
            ConfigError::Validation { field, .. } => {
                Self::expected(code, message).with_metadata("field", field)
            },
            ConfigError::InvalidUrl { .. } => Self::expected(code, message),
        }
    }
}

/// A single-field accessor was given a key that matches no field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundError {
    /// Key as requested.
    pub key: String,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "no field is bound to key `{}`", self.key)
    }
}

impl std::error::Error for NotFoundError {}

impl From<NotFoundError> for ErrorEnvelope {
    fn from(error: NotFoundError) -> Self {
        let message = error.to_string();
        Self::expected(ErrorCode::not_found(), message).with_metadata("key", error.key)
    }
}

/// Failure of a single-field `set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropError {
    /// No field is bound to the key.
    NotFound(NotFoundError),
    /// The value failed coercion or validation.
    Invalid(ConfigError),
}

impl fmt::Display for PropError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(error) => error.fmt(formatter),
            Self::Invalid(error) => error.fmt(formatter),
        }
    }
}

impl std::error::Error for PropError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(error) => Some(error),
            Self::Invalid(error) => Some(error),
        }
    }
}

impl From<NotFoundError> for PropError {
    fn from(error: NotFoundError) -> Self {
        Self::NotFound(error)
    }
}

impl From<ConfigError> for PropError {
    fn from(error: ConfigError) -> Self {
        Self::Invalid(error)
    }
}

impl From<PropError> for ErrorEnvelope {
    fn from(error: PropError) -> Self {
        match error {
            PropError::NotFound(error) => error.into(),
            PropError::Invalid(error) => error.into(),
        }
    }
}

/// Why a raw string could not become a field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercionError {
    /// The string does not parse as the expected kind.
    Invalid {
        /// Kind the field expects.
        expected: FieldKind,
    },
    /// The string is not one of the declared enum tokens.
    UnknownToken {
        /// Declared tokens.
        allowed: &'static [&'static str],
    },
}

impl CoercionError {
    /// Attach the field and raw value, producing a [`ConfigError`].
    #[must_use]
    pub fn for_field(self, field: &'static str, raw: &str) -> ConfigError {
        match self {
            Self::Invalid { expected } => ConfigError::InvalidValue {
                field,
                raw: raw.to_string(),
                expected,
            },
            Self::UnknownToken { allowed } => ConfigError::InvalidEnumToken {
                field,
                token: raw.to_string(),
                allowed,
            },
        }
    }
}
