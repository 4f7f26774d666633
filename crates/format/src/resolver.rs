//! Property resolver: moves values between URLs, parameter maps and records.

use crate::descriptor::{FieldDescriptor, Schema, UrlPart};
use crate::error::{ConfigError, NotFoundError, PropError, SchemaError};
use crate::query::read;
use crate::record::{ConfigRecord, UrlContext};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use url::Url;

/// Userinfo values are escaped down to RFC 3986 unreserved characters.
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Path values keep `/` as the segment separator.
const PATH: &AsciiSet = &USERINFO.remove(b'/');

/// Ad-hoc per-message overrides, keyed by query key.
pub type Params = BTreeMap<String, String>;

/// Schema-driven accessor for records of type `R`.
pub struct PropertyResolver<R> {
    schema: &'static Schema,
    record: PhantomData<fn() -> R>,
}

impl<R> Clone for PropertyResolver<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for PropertyResolver<R> {}

impl<R> fmt::Debug for PropertyResolver<R> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("PropertyResolver")
            .field("record", &self.schema.record_name())
            .finish()
    }
}

impl<R: ConfigRecord> PropertyResolver<R> {
    /// Resolver over the cached schema of `R`.
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            schema: R::schema()?,
            record: PhantomData,
        })
    }

    /// Schema the resolver works from.
    #[must_use]
    pub const fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// Read one query-bound field by key or alias.
    pub fn get(&self, record: &R, key: &str) -> Result<String, NotFoundError> {
        self.schema
            .field_by_key(key)
            .and_then(|field| record.read_prop(field))
            .ok_or_else(|| NotFoundError {
                key: key.to_string(),
            })
    }

    /// Write one query-bound field by key or alias.
    pub fn set(&self, record: &mut R, key: &str, value: &str) -> Result<(), PropError> {
        let field = self.schema.field_by_key(key).ok_or_else(|| NotFoundError {
            key: key.to_string(),
        })?;
        let mut scratch = record.clone();
        write(&mut scratch, field, value)?;
        *record = scratch;
        Ok(())
    }

    /// Canonical query string of the record.
    pub fn query(&self, record: &R) -> Result<String, ConfigError> {
        self.schema.build_query(record)
    }

    /// Encode the record as a URL.
    pub fn get_url(&self, record: &R) -> Result<Url, ConfigError> {
        let schema = self.schema;
        let host = match schema.url_field(UrlPart::Host) {
            Some(field) => read(record, field)?,
            None => schema.fixed_host().unwrap_or_default().to_string(),
        };
        if host.contains(['/', '?', '#', '@']) {
            return Err(ConfigError::InvalidUrl {
                reason: format!("host {host:?} contains reserved characters"),
            });
        }
        let mut url = Url::parse(&format!("{}://{host}", schema.scheme())).map_err(|error| {
            ConfigError::InvalidUrl {
                reason: error.to_string(),
            }
        })?;

        let user = schema
            .url_field(UrlPart::User)
            .map(|field| read(record, field))
            .transpose()?;
        let password = schema
            .url_field(UrlPart::Password)
            .map(|field| read(record, field))
            .transpose()?
            .unwrap_or_default();

        if !password.is_empty() {
            match user.as_deref().or(schema.credential_user()) {
                Some(user) => {
                    url.set_username(&escape(user, USERINFO))
                        .map_err(|()| userinfo_rejected())?;
                    url.set_password(Some(&escape(&password, USERINFO)))
                        .map_err(|()| userinfo_rejected())?;
                },
                None => url
                    .set_username(&escape(&password, USERINFO))
                    .map_err(|()| userinfo_rejected())?,
            }
        } else if let Some(user) = user.filter(|user| !user.is_empty()) {
            url.set_username(&escape(&user, USERINFO))
                .map_err(|()| userinfo_rejected())?;
        }

        if let Some(field) = schema.url_field(UrlPart::Path) {
            let path = read(record, field)?;
            if !path.is_empty() {
                url.set_path(&format!("/{}", escape(&path, PATH)));
            }
        }

        let query = schema.build_query(record)?;
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Apply a URL to the record.
    ///
    /// URL slots are read first, then query parameters; absent fields take
    /// their default (or the zero value when optional), and the record's
    /// validation hook runs last. The record is only replaced on success.
    pub fn set_url(&self, record: &mut R, url: &Url) -> Result<(), ConfigError> {
        let schema = self.schema;
        let zero = R::default();
        let mut scratch = record.clone();

        for field in schema.url_fields() {
            let raw = match field.url_part() {
                Some(part) => url_slot(schema, url, part)?,
                None => continue,
            };
            if raw.is_empty() {
                fill_absent(&mut scratch, &zero, field)?;
            } else {
                write(&mut scratch, field, &raw)?;
            }
        }

        let mut supplied: BTreeMap<usize, String> = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            let index = schema
                .index_of_key(&key)
                .ok_or_else(|| ConfigError::UnrecognizedParameter {
                    key: key.clone().into_owned(),
                })?;
            supplied.entry(index).or_insert_with(|| value.into_owned());
        }

        let mut supplied_names = BTreeSet::new();
        for (index, field) in schema.fields().iter().enumerate() {
            if field.key().is_none() {
                continue;
            }
            match supplied.get(&index) {
                Some(raw) => {
                    write(&mut scratch, field, raw)?;
                    supplied_names.insert(field.name());
                },
                None => fill_absent(&mut scratch, &zero, field)?,
            }
        }

        scratch.validate(&UrlContext::new(url, supplied_names))?;
        *record = scratch;
        Ok(())
    }

    /// Reset every field to its default, or its zero value when it has none.
    pub fn reset_defaults(&self, record: &mut R) -> Result<(), ConfigError> {
        let zero = R::default();
        let mut scratch = record.clone();
        for field in self.schema.fields() {
            match field.canonical_default() {
                Some(default) => store(&mut scratch, field, default)?,
                None => store(&mut scratch, field, &read(&zero, field)?)?,
            }
        }
        *record = scratch;
        Ok(())
    }

    /// Apply per-message overrides in place. Leaves the record untouched on
    /// failure.
    pub fn apply_params(&self, record: &mut R, params: &Params) -> Result<(), ConfigError> {
        let mut scratch = record.clone();
        for (key, value) in params {
            let field = self.schema.field_by_key(key).ok_or_else(|| {
                ConfigError::UnrecognizedParameter { key: key.clone() }
            })?;
            write(&mut scratch, field, value)?;
        }
        *record = scratch;
        Ok(())
    }

    /// Copy of the record with per-message overrides applied.
    pub fn with_params(&self, record: &R, params: &Params) -> Result<R, ConfigError> {
        let mut copy = record.clone();
        self.apply_params(&mut copy, params)?;
        Ok(copy)
    }
}

fn userinfo_rejected() -> ConfigError {
    ConfigError::InvalidUrl {
        reason: "credentials require a non-empty host".to_string(),
    }
}

fn escape(raw: &str, set: &'static AsciiSet) -> String {
    utf8_percent_encode(raw, set).to_string()
}

fn decode(raw: &str) -> Result<String, ConfigError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|error| ConfigError::InvalidUrl {
            reason: error.to_string(),
        })
}

fn url_slot(schema: &Schema, url: &Url, part: UrlPart) -> Result<String, ConfigError> {
    match part {
        UrlPart::Host => {
            let host = url.host_str().unwrap_or_default();
            Ok(match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        },
        UrlPart::Path => {
            let path = url.path();
            decode(path.strip_prefix('/').unwrap_or(path))
        },
        UrlPart::User => decode(url.username()),
        UrlPart::Password => match url.password() {
            Some(password) => decode(password),
            None if schema.url_field(UrlPart::User).is_none()
                && schema.credential_user().is_none() =>
            {
                decode(url.username())
            },
            None => Ok(String::new()),
        },
    }
}

/// Coerce and store without the emptiness check.
fn store<R: ConfigRecord>(
    record: &mut R,
    field: &FieldDescriptor,
    raw: &str,
) -> Result<(), ConfigError> {
    match record.write_prop(field, raw) {
        Some(result) => result.map_err(|error| error.for_field(field.name(), raw)),
        None => Err(ConfigError::UnboundField {
            field: field.name(),
        }),
    }
}

/// Coerce and store a supplied value; required fields must end up non-empty.
fn write<R: ConfigRecord>(
    record: &mut R,
    field: &FieldDescriptor,
    raw: &str,
) -> Result<(), ConfigError> {
    store(record, field, raw)?;
    if field.is_required() && read(record, field)?.is_empty() {
        return Err(ConfigError::MissingField {
            field: field.name(),
        });
    }
    Ok(())
}

fn fill_absent<R: ConfigRecord>(
    record: &mut R,
    zero: &R,
    field: &FieldDescriptor,
) -> Result<(), ConfigError> {
    if let Some(default) = field.canonical_default() {
        store(record, field, default)
    } else if field.is_optional() {
        store(record, field, &read(zero, field)?)
    } else {
        Err(ConfigError::MissingField {
            field: field.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldKind, FieldSpec, RecordMeta};
    use crate::error::CoercionError;
    use crate::value::PropValue;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Webhook {
        host: String,
        token: String,
        channel: String,
        retries: u32,
        silent: bool,
    }

    impl ConfigRecord for Webhook {
        const META: RecordMeta = RecordMeta {
            name: "Webhook",
            scheme: "hook",
            credential_user: None,
            fixed_host: None,
            fields: &[
                FieldSpec::new("host", FieldKind::String).url_part(UrlPart::Host),
                FieldSpec::new("token", FieldKind::String).url_part(UrlPart::Password),
                FieldSpec::new("channel", FieldKind::String)
                    .aliases(&["room"])
                    .optional(),
                FieldSpec::new("retries", FieldKind::Int).default("3"),
                FieldSpec::new("silent", FieldKind::Bool)
                    .bool_tokens("yes", "no")
                    .default("no"),
            ],
        };

        fn read_prop(&self, field: &FieldDescriptor) -> Option<String> {
            match field.name() {
                "host" => Some(self.host.to_prop(field)),
                "token" => Some(self.token.to_prop(field)),
                "channel" => Some(self.channel.to_prop(field)),
                "retries" => Some(self.retries.to_prop(field)),
                "silent" => Some(self.silent.to_prop(field)),
                _ => None,
            }
        }

        fn write_prop(
            &mut self,
            field: &FieldDescriptor,
            raw: &str,
        ) -> Option<Result<(), CoercionError>> {
            fn assign<T: PropValue>(
                slot: &mut T,
                raw: &str,
                field: &FieldDescriptor,
            ) -> Result<(), CoercionError> {
                *slot = T::from_prop(raw, field)?;
                Ok(())
            }
            match field.name() {
                "host" => Some(assign(&mut self.host, raw, field)),
                "token" => Some(assign(&mut self.token, raw, field)),
                "channel" => Some(assign(&mut self.channel, raw, field)),
                "retries" => Some(assign(&mut self.retries, raw, field)),
                "silent" => Some(assign(&mut self.silent, raw, field)),
                _ => None,
            }
        }
    }

    fn resolver() -> Result<PropertyResolver<Webhook>, SchemaError> {
        PropertyResolver::new()
    }

    #[test]
    fn lone_credential_is_written_as_userinfo() -> Result<(), Box<dyn std::error::Error>> {
        let record = Webhook {
            host: "hooks.example.com".to_string(),
            token: "s3cret".to_string(),
            retries: 3,
            ..Webhook::default()
        };
        let url = resolver()?.get_url(&record)?;
        assert_eq!(url.as_str(), "hook://s3cret@hooks.example.com");
        Ok(())
    }

    #[test]
    fn reserved_characters_in_credentials_survive_a_round_trip()
    -> Result<(), Box<dyn std::error::Error>> {
        let record = Webhook {
            host: "h".to_string(),
            token: "ab%41cd:x@y/z w".to_string(),
            retries: 3,
            ..Webhook::default()
        };
        let resolver = resolver()?;
        let url = resolver.get_url(&record)?;
        assert_eq!(url.as_str(), "hook://ab%2541cd%3Ax%40y%2Fz%20w@h");

        let mut decoded = Webhook::default();
        resolver.set_url(&mut decoded, &url)?;
        assert_eq!(decoded, record);
        Ok(())
    }

    #[test]
    fn url_round_trip_keeps_every_field() -> Result<(), Box<dyn std::error::Error>> {
        let record = Webhook {
            host: "hooks.example.com:8443".to_string(),
            token: "s3cret".to_string(),
            channel: "ops".to_string(),
            retries: 5,
            silent: true,
        };
        let resolver = resolver()?;
        let url = resolver.get_url(&record)?;
        assert_eq!(
            url.as_str(),
            "hook://s3cret@hooks.example.com:8443?channel=ops&retries=5&silent=yes"
        );

        let mut decoded = Webhook::default();
        resolver.set_url(&mut decoded, &url)?;
        assert_eq!(decoded, record);
        Ok(())
    }

    #[test]
    fn absent_fields_take_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let mut record = Webhook {
            retries: 9,
            silent: true,
            channel: "stale".to_string(),
            ..Webhook::default()
        };
        resolver()?.set_url(&mut record, &Url::parse("hook://t@h")?)?;
        assert_eq!(record.retries, 3);
        assert!(!record.silent);
        assert_eq!(record.channel, "");
        Ok(())
    }

    #[test]
    fn missing_credential_is_reported() -> Result<(), Box<dyn std::error::Error>> {
        let mut record = Webhook::default();
        let error = resolver()?
            .set_url(&mut record, &Url::parse("hook://h?retries=1")?)
            .err();
        assert_eq!(error, Some(ConfigError::MissingField { field: "token" }));
        Ok(())
    }

    #[test]
    fn failed_apply_leaves_record_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let resolver = resolver()?;
        let mut record = Webhook::default();
        resolver.set_url(&mut record, &Url::parse("hook://t@h?retries=4")?)?;
        let before = record.clone();

        let error = resolver
            .set_url(&mut record, &Url::parse("hook://t2@h2?retries=x1")?)
            .err();
        assert!(matches!(
            error,
            Some(ConfigError::InvalidValue {
                field: "retries",
                ..
            })
        ));
        assert_eq!(record, before);
        Ok(())
    }

    #[test]
    fn unknown_parameters_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let mut record = Webhook::default();
        let error = resolver()?
            .set_url(&mut record, &Url::parse("hook://t@h?volume=11")?)
            .err();
        assert_eq!(
            error,
            Some(ConfigError::UnrecognizedParameter {
                key: "volume".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn first_occurrence_of_a_key_wins() -> Result<(), Box<dyn std::error::Error>> {
        let mut record = Webhook::default();
        resolver()?.set_url(
            &mut record,
            &Url::parse("hook://t@h?Retries=7&retries=8&ROOM=a&channel=b")?,
        )?;
        assert_eq!(record.retries, 7);
        assert_eq!(record.channel, "a");
        Ok(())
    }

    #[test]
    fn single_field_access_uses_keys_and_aliases() -> Result<(), Box<dyn std::error::Error>> {
        let resolver = resolver()?;
        let mut record = Webhook::default();
        resolver.set(&mut record, "ROOM", "alerts")?;
        assert_eq!(resolver.get(&record, "channel")?, "alerts");
        assert_eq!(
            resolver.get(&record, "host"),
            Err(NotFoundError {
                key: "host".to_string()
            })
        );
        assert!(matches!(
            resolver.set(&mut record, "retries", "many"),
            Err(PropError::Invalid(ConfigError::InvalidValue { .. }))
        ));
        assert_eq!(record.channel, "alerts");
        Ok(())
    }

    #[test]
    fn params_override_a_copy() -> Result<(), Box<dyn std::error::Error>> {
        let resolver = resolver()?;
        let record = Webhook::default();
        let params = Params::from([("silent".to_string(), "yes".to_string())]);
        let overridden = resolver.with_params(&record, &params)?;
        assert!(overridden.silent);
        assert!(!record.silent);

        let bad = Params::from([("nope".to_string(), "1".to_string())]);
        assert!(resolver.with_params(&record, &bad).is_err());
        Ok(())
    }

    #[test]
    fn reset_restores_defaults_and_zero_values() -> Result<(), Box<dyn std::error::Error>> {
        let mut record = Webhook {
            host: "h".to_string(),
            channel: "c".to_string(),
            retries: 0,
            silent: true,
            ..Webhook::default()
        };
        resolver()?.reset_defaults(&mut record)?;
        assert_eq!(
            record,
            Webhook {
                retries: 3,
                ..Webhook::default()
            }
        );
        Ok(())
    }

    #[test]
    fn hosts_with_reserved_characters_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let record = Webhook {
            host: "a/b".to_string(),
            token: "t".to_string(),
            ..Webhook::default()
        };
        assert!(matches!(
            resolver()?.get_url(&record),
            Err(ConfigError::InvalidUrl { .. })
        ));
        Ok(())
    }
}
