//! Field value coercion between Rust types and their string forms.

use crate::descriptor::{FieldDescriptor, FieldKind, FieldSpec};
use crate::enums::{EnumFormatter, PropEnum};
use crate::error::CoercionError;
use notify_url_shared::SecretString;

const TRUTHY: [&str; 5] = ["1", "true", "yes", "y", "on"];
const FALSY: [&str; 5] = ["0", "false", "no", "n", "off"];

/// A Rust type usable as a configurable field.
///
/// `to_prop` and `from_prop` are inverses over canonical strings:
/// `from_prop(&v.to_prop(f), f) == Ok(v)` for every value `v`.
pub trait PropValue: Sized {
    /// Kind reported in field descriptors.
    const KIND: FieldKind;

    /// Formatter for enum-kind values.
    const FORMATTER: Option<&'static dyn EnumFormatter> = None;

    /// Canonical string form.
    fn to_prop(&self, field: &FieldDescriptor) -> String;

    /// Parse a raw string.
    fn from_prop(raw: &str, field: &FieldDescriptor) -> Result<Self, CoercionError>;
}

/// Canonical string form of `raw` for the declared kind of `spec`.
pub(crate) fn canonicalize(spec: &FieldSpec, raw: &str) -> Result<String, CoercionError> {
    match spec.kind() {
        FieldKind::String | FieldKind::List => Ok(raw.to_string()),
        FieldKind::Int => raw
            .parse::<i128>()
            .map(|value| value.to_string())
            .map_err(|_| CoercionError::Invalid {
                expected: FieldKind::Int,
            }),
        FieldKind::Bool => {
            let tokens = spec.boolean_tokens();
            parse_bool(raw, tokens).map(|value| format_bool(value, tokens))
        },
        FieldKind::Enum => {
            let formatter = spec.enum_formatter().ok_or(CoercionError::Invalid {
                expected: FieldKind::Enum,
            })?;
            let ordinal = formatter
                .parse(raw)
                .map_err(|error| CoercionError::UnknownToken {
                    allowed: error.allowed,
                })?;
            formatter
                .format(ordinal)
                .map(str::to_string)
                .ok_or(CoercionError::Invalid {
                    expected: FieldKind::Enum,
                })
        },
    }
}

fn parse_bool(raw: &str, tokens: Option<(&str, &str)>) -> Result<bool, CoercionError> {
    if let Some((truthy, falsy)) = tokens {
        if raw.eq_ignore_ascii_case(truthy) {
            return Ok(true);
        }
        if raw.eq_ignore_ascii_case(falsy) {
            return Ok(false);
        }
    }
    if TRUTHY.iter().any(|token| raw.eq_ignore_ascii_case(token)) {
        Ok(true)
    } else if FALSY.iter().any(|token| raw.eq_ignore_ascii_case(token)) {
        Ok(false)
    } else {
        Err(CoercionError::Invalid {
            expected: FieldKind::Bool,
        })
    }
}

fn format_bool(value: bool, tokens: Option<(&str, &str)>) -> String {
    let (truthy, falsy) = tokens.unwrap_or(("1", "0"));
    let token = if value { truthy } else { falsy };
    token.to_string()
}

impl PropValue for String {
    const KIND: FieldKind = FieldKind::String;

    fn to_prop(&self, _field: &FieldDescriptor) -> String {
        self.clone()
    }

    fn from_prop(raw: &str, field: &FieldDescriptor) -> Result<Self, CoercionError> {
        canonicalize(field.spec(), raw)
    }
}

impl PropValue for SecretString {
    const KIND: FieldKind = FieldKind::String;

    fn to_prop(&self, _field: &FieldDescriptor) -> String {
        self.expose().to_string()
    }

    fn from_prop(raw: &str, _field: &FieldDescriptor) -> Result<Self, CoercionError> {
        Ok(Self::from(raw))
    }
}

impl PropValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_prop(&self, field: &FieldDescriptor) -> String {
        format_bool(*self, field.spec().boolean_tokens())
    }

    fn from_prop(raw: &str, field: &FieldDescriptor) -> Result<Self, CoercionError> {
        parse_bool(raw, field.spec().boolean_tokens())
    }
}

macro_rules! impl_int_prop {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PropValue for $ty {
                const KIND: FieldKind = FieldKind::Int;

                fn to_prop(&self, _field: &FieldDescriptor) -> String {
                    self.to_string()
                }

                fn from_prop(raw: &str, _field: &FieldDescriptor) -> Result<Self, CoercionError> {
                    raw.parse::<$ty>().map_err(|_| CoercionError::Invalid {
                        expected: FieldKind::Int,
                    })
                }
            }
        )*
    };
}

impl_int_prop!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl PropValue for Vec<String> {
    const KIND: FieldKind = FieldKind::List;

    fn to_prop(&self, field: &FieldDescriptor) -> String {
        self.join(field.spec().list_separator())
    }

    fn from_prop(raw: &str, field: &FieldDescriptor) -> Result<Self, CoercionError> {
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        Ok(raw
            .split(field.spec().list_separator())
            .map(str::to_string)
            .collect())
    }
}

/// `to_prop` for [`PropEnum`] types.
pub fn enum_to_prop<E: PropEnum>(value: &E) -> String {
    value.token().to_string()
}

/// `from_prop` for [`PropEnum`] types.
pub fn enum_from_prop<E: PropEnum>(raw: &str) -> Result<E, CoercionError> {
    E::from_token(raw).map_err(|error| CoercionError::UnknownToken {
        allowed: error.allowed,
    })
}
