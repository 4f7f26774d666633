//! Configuration record capability.

use crate::descriptor::{FieldDescriptor, RecordMeta, Schema, schema_of};
use crate::error::{CoercionError, ConfigError, SchemaError};
use crate::resolver::PropertyResolver;
use std::collections::BTreeSet;
use url::Url;

/// A typed service configuration that can be encoded as a URL.
///
/// Implement it with `#[derive(ConfigRecord)]`; the derive emits the field
/// table and the by-name accessors. Records with cross-field rules declare a
/// validation hook with `#[config(validate = "path::to::fn")]`.
pub trait ConfigRecord: Clone + Default + Send + Sync + 'static {
    /// Static field table.
    const META: RecordMeta;

    /// Canonical string form of a field, or `None` if the record does not
    /// handle it.
    fn read_prop(&self, field: &FieldDescriptor) -> Option<String>;

    /// Coerce and store a raw value, or `None` if the record does not handle
    /// the field.
    fn write_prop(
        &mut self,
        field: &FieldDescriptor,
        raw: &str,
    ) -> Option<Result<(), CoercionError>>;

    /// Cross-field checks run after a URL has been fully applied.
    fn validate(&self, _context: &UrlContext<'_>) -> Result<(), ConfigError> {
        Ok(())
    }

    /// Validated schema, derived once per process.
    fn schema() -> Result<&'static Schema, SchemaError> {
        schema_of::<Self>()
    }

    /// Encode as a URL.
    fn to_url(&self) -> Result<Url, ConfigError> {
        PropertyResolver::<Self>::new()?.get_url(self)
    }

    /// Apply a URL to this record. Leaves it untouched on failure.
    fn update_from_url(&mut self, url: &Url) -> Result<(), ConfigError> {
        PropertyResolver::<Self>::new()?.set_url(self, url)
    }

    /// Decode a fresh record from a URL.
    fn from_url(url: &Url) -> Result<Self, ConfigError> {
        let mut record = Self::default();
        record.update_from_url(url)?;
        Ok(record)
    }
}

/// What a URL supplied, for cross-field validation.
#[derive(Debug, Clone)]
pub struct UrlContext<'a> {
    url: &'a Url,
    supplied: BTreeSet<&'static str>,
}

impl<'a> UrlContext<'a> {
    pub(crate) const fn new(url: &'a Url, supplied: BTreeSet<&'static str>) -> Self {
        Self { url, supplied }
    }

    /// The URL being applied.
    #[must_use]
    pub const fn url(&self) -> &'a Url {
        self.url
    }

    /// Whether the URL carries a userinfo section at all.
    #[must_use]
    pub fn has_userinfo(&self) -> bool {
        !self.url.username().is_empty() || self.url.password().is_some()
    }

    /// Whether the query supplied the field (under its key or any alias).
    #[must_use]
    pub fn supplied(&self, field: &str) -> bool {
        self.supplied.contains(field)
    }
}
