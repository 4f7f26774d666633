//! # notify-url-format
//!
//! Bidirectional codec between typed service configurations and URLs.
//!
//! A record type derives [`ConfigRecord`]; its field table is validated once
//! into a [`Schema`], and a [`PropertyResolver`] then moves values between the
//! record, its URL form and ad-hoc parameter maps.
//!
//! ```
//! use notify_url_format::{ConfigRecord, PropEnum};
//! use url::Url;
//!
//! #[derive(Debug, Clone, Copy, Default, PartialEq, PropEnum)]
//! enum Level {
//!     Low,
//!     #[default]
//!     Default,
//!     High,
//! }
//!
//! #[derive(Debug, Clone, Default, ConfigRecord)]
//! #[config(scheme = "demo")]
//! struct Demo {
//!     #[config(url = "host")]
//!     host: String,
//!     #[config(default = "default")]
//!     level: Level,
//! }
//!
//! let demo = Demo::from_url(&Url::parse("demo://example.com?level=HIGH")?)?;
//! assert_eq!(demo.level, Level::High);
//! assert_eq!(demo.to_url()?.as_str(), "demo://example.com?level=high");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

extern crate self as notify_url_format;

pub mod descriptor;
pub mod docs;
pub mod enums;
pub mod error;
pub mod query;
pub mod record;
pub mod redact;
pub mod resolver;
pub mod value;

pub use descriptor::{FieldDescriptor, FieldKind, FieldSpec, RecordMeta, Schema, UrlPart, schema_of};
pub use docs::{ConfigDocs, FieldDoc};
pub use enums::{EnumFormatter, EnumTokens, PropEnum, TokenNotFound};
pub use error::{CoercionError, ConfigError, NotFoundError, PropError, SchemaError};
pub use notify_url_derive::{ConfigRecord, PropEnum};
pub use query::build_query;
pub use record::{ConfigRecord, UrlContext};
pub use redact::redact_url;
pub use resolver::{Params, PropertyResolver};
pub use value::{PropValue, enum_from_prop, enum_to_prop};
