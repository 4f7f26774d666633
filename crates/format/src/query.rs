//! Query string construction.
//!
//! Output is deterministic: pairs are sorted by key and encoded with
//! `application/x-www-form-urlencoded` rules, so equal records always
//! produce byte-identical queries.

use crate::descriptor::{FieldDescriptor, Schema};
use crate::error::ConfigError;
use crate::record::ConfigRecord;
use url::form_urlencoded;

impl Schema {
    /// Encode the query-bound fields of `record`.
    ///
    /// A field is emitted when it is force-emitted or required, when its
    /// value differs from its declared default, or (for optional fields
    /// without a default) when it differs from the zero value.
    pub fn build_query<R: ConfigRecord>(&self, record: &R) -> Result<String, ConfigError> {
        let zero = R::default();
        let mut pairs: Vec<(&str, String)> = Vec::new();

        for field in self.query_fields() {
            let Some(key) = field.key() else {
                continue;
            };
            let value = read(record, field)?;
            let emit = if field.always_emit() || field.is_required() {
                true
            } else if let Some(default) = field.canonical_default() {
                value != default
            } else {
                value != read(&zero, field)?
            };
            if emit {
                pairs.push((key, value));
            }
        }

        pairs.sort_by(|left, right| left.0.cmp(right.0));
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        Ok(serializer.finish())
    }
}

/// Encode the query-bound fields of `record` using its cached schema.
pub fn build_query<R: ConfigRecord>(record: &R) -> Result<String, ConfigError> {
    R::schema()?.build_query(record)
}

pub(crate) fn read<R: ConfigRecord>(
    record: &R,
    field: &FieldDescriptor,
) -> Result<String, ConfigError> {
    record.read_prop(field).ok_or(ConfigError::UnboundField {
        field: field.name(),
    })
}
