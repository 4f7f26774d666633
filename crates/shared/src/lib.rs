//! # notify-url-shared
//!
//! Shared result types, error envelopes, and redaction helpers for the
//! notify-url workspace.
//!
//! ## Design Principles
//!
//! 1. **No workspace dependencies** - This crate only depends on external crates
//! 2. **Serde-compatible** - Error envelopes serialize for machine-readable output

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod errors;
pub mod redaction;
pub mod result;

pub use errors::{ErrorCode, ErrorEnvelope, ErrorKind, ErrorMetadata};
pub use redaction::{REDACTED, SecretString, is_secret_key, redact_if_secret};
pub use result::Result;

/// Returns the shared crate version.
#[must_use]
pub const fn shared_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
