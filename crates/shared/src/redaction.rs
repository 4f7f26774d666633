//! Secret detection and redaction utilities.
//!
//! Credentials travel inside configuration URLs (device keys, API tokens,
//! passwords). These helpers keep them out of error messages and logs.

/// The redacted placeholder string.
pub const REDACTED: &str = "[REDACTED]";

/// Checks if a field or key name likely refers to a secret.
///
/// Uses case-insensitive pattern matching on common naming conventions.
///
/// # Examples
///
/// ```
/// use notify_url_shared::is_secret_key;
///
/// assert!(is_secret_key("api_key"));
/// assert!(is_secret_key("password"));
/// assert!(is_secret_key("DeviceKey"));
/// assert!(!is_secret_key("title"));
/// ```
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("KEY")
        || key.contains("TOKEN")
        || key.contains("SECRET")
        || key.contains("PASS")
        || key.contains("CREDENTIAL")
        || key.contains("AUTH")
}

/// Redacts a value if the key is likely a secret.
///
/// # Examples
///
/// ```
/// use notify_url_shared::redact_if_secret;
///
/// assert_eq!(redact_if_secret("api_key", "abc123"), "[REDACTED]");
/// assert_eq!(redact_if_secret("title", "Hello"), "Hello");
/// ```
pub fn redact_if_secret(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

/// A secret string wrapper that redacts on Display/Debug.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SecretString(Box<str>);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(value: impl Into<Box<str>>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true when no secret is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl std::fmt::Display for SecretString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(REDACTED)
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        Self(value.into())
    }
}

impl From<String> for SecretString {
    fn from(value: String) -> Self {
        Self(value.into_boxed_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_credential_field_names() {
        assert!(is_secret_key("device_key"));
        assert!(is_secret_key("APIKey"));
        assert!(is_secret_key("token"));
        assert!(is_secret_key("password"));
        assert!(is_secret_key("pass"));
        assert!(is_secret_key("client_secret"));
        assert!(is_secret_key("basic_auth"));
    }

    #[test]
    fn ignores_plain_field_names() {
        assert!(!is_secret_key("title"));
        assert!(!is_secret_key("priority"));
        assert!(!is_secret_key("devices"));
        assert!(!is_secret_key("host"));
    }

    #[test]
    fn secret_string_redacts_display_and_debug() {
        let secret = SecretString::new("shh");
        assert_eq!(secret.to_string(), REDACTED);
        assert_eq!(format!("{secret:?}"), REDACTED);
        assert_eq!(secret.expose(), "shh");
    }

    #[test]
    fn default_secret_is_empty() {
        assert!(SecretString::default().is_empty());
    }
}
