//! Field metadata model: static field tables and their validated schemas.
//!
//! A record type declares a [`RecordMeta`] constant (usually generated by
//! `#[derive(ConfigRecord)]`). On first use it is validated into a
//! [`Schema`] of [`FieldDescriptor`]s, which is cached for the lifetime of the
//! process and shared read-only afterwards.

use crate::enums::EnumFormatter;
use crate::error::SchemaError;
use crate::record::ConfigRecord;
use crate::value::canonicalize;
use serde::Serialize;
use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};

/// Semantic kind of a configurable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// Free-form text.
    String,
    /// Signed or unsigned integer.
    Int,
    /// Boolean flag.
    Bool,
    /// Separator-joined list of strings.
    List,
    /// One token of a closed set.
    Enum,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::String => "string",
            Self::Int => "integer",
            Self::Bool => "boolean",
            Self::List => "list",
            Self::Enum => "enum",
        })
    }
}

/// Structural URL slot a field can bind to instead of a query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlPart {
    /// `host[:port]`.
    Host,
    /// Path without its leading `/`.
    Path,
    /// Userinfo user name.
    User,
    /// Userinfo password, treated as one opaque credential.
    Password,
}

impl UrlPart {
    /// Slot name as used in declarations.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Path => "path",
            Self::User => "user",
            Self::Password => "password",
        }
    }
}

/// Static declaration of one configurable field.
///
/// Built with `const` builder calls so tables can live in constants:
///
/// ```
/// use notify_url_format::{FieldKind, FieldSpec, UrlPart};
///
/// const TITLE: FieldSpec = FieldSpec::new("title", FieldKind::String)
///     .default("")
///     .description("Notification title");
/// const HOST: FieldSpec = FieldSpec::new("host", FieldKind::String).url_part(UrlPart::Host);
/// # let _ = (TITLE, HOST);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    name: &'static str,
    key: Option<&'static str>,
    aliases: &'static [&'static str],
    url_part: Option<UrlPart>,
    kind: FieldKind,
    default: Option<&'static str>,
    optional: bool,
    always_emit: bool,
    description: &'static str,
    formatter: Option<&'static dyn EnumFormatter>,
    bool_tokens: Option<(&'static str, &'static str)>,
    separator: &'static str,
}

impl FieldSpec {
    /// Declare a field bound to the query key `lower(name)`.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            key: None,
            aliases: &[],
            url_part: None,
            kind,
            default: None,
            optional: false,
            always_emit: false,
            description: "",
            formatter: None,
            bool_tokens: None,
            separator: ",",
        }
    }

    /// Bind to an explicit query key.
    #[must_use]
    pub const fn key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    /// Extra query keys accepted when parsing.
    #[must_use]
    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    /// Bind to a URL slot instead of a query key.
    #[must_use]
    pub const fn url_part(mut self, part: UrlPart) -> Self {
        self.url_part = Some(part);
        self
    }

    /// Default value in string form.
    #[must_use]
    pub const fn default(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    /// Tolerate absence without a default.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Emit in queries even when equal to the default.
    #[must_use]
    pub const fn always_emit(mut self) -> Self {
        self.always_emit = true;
        self
    }

    /// Documentation text.
    #[must_use]
    pub const fn description(mut self, text: &'static str) -> Self {
        self.description = text;
        self
    }

    /// Enum formatter for enum-kind fields.
    #[must_use]
    pub const fn formatter(mut self, formatter: Option<&'static dyn EnumFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Serialize booleans with a custom true/false token pair.
    #[must_use]
    pub const fn bool_tokens(mut self, truthy: &'static str, falsy: &'static str) -> Self {
        self.bool_tokens = Some((truthy, falsy));
        self
    }

    /// Separator for list-kind fields.
    #[must_use]
    pub const fn separator(mut self, separator: &'static str) -> Self {
        self.separator = separator;
        self
    }

    /// Field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Attached enum formatter.
    #[must_use]
    pub const fn enum_formatter(&self) -> Option<&'static dyn EnumFormatter> {
        self.formatter
    }

    /// Boolean token pair, if customised.
    #[must_use]
    pub const fn boolean_tokens(&self) -> Option<(&'static str, &'static str)> {
        self.bool_tokens
    }

    /// List separator.
    #[must_use]
    pub const fn list_separator(&self) -> &'static str {
        self.separator
    }
}

/// Static declaration of a configuration record type.
#[derive(Debug, Clone, Copy)]
pub struct RecordMeta {
    /// Record type name, used in diagnostics.
    pub name: &'static str,
    /// URL scheme identifying the service.
    pub scheme: &'static str,
    /// User name paired with the password slot when no field binds the user.
    ///
    /// `None` writes a lone credential as the whole userinfo (`secret@host`).
    pub credential_user: Option<&'static str>,
    /// Host written when no field binds the host.
    pub fixed_host: Option<&'static str>,
    /// Fields in declaration order.
    pub fields: &'static [FieldSpec],
}

/// Validated, runtime view of one field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    spec: FieldSpec,
    key: Option<String>,
    aliases: Vec<String>,
    canonical_default: Option<String>,
}

impl FieldDescriptor {
    /// Underlying declaration.
    #[must_use]
    pub const fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    /// Field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.spec.name
    }

    /// Lower-cased query key, or `None` for URL-part fields.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Lower-cased alias keys.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Bound URL slot.
    #[must_use]
    pub const fn url_part(&self) -> Option<UrlPart> {
        self.spec.url_part
    }

    /// Field kind.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.spec.kind
    }

    /// Declared default as written.
    #[must_use]
    pub const fn default_value(&self) -> Option<&'static str> {
        self.spec.default
    }

    /// Declared default in canonical form.
    #[must_use]
    pub fn canonical_default(&self) -> Option<&str> {
        self.canonical_default.as_deref()
    }

    /// Whether absence is tolerated without a default.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.spec.optional
    }

    /// No default and not optional.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.spec.default.is_none() && !self.spec.optional
    }

    /// Force-emit flag.
    #[must_use]
    pub const fn always_emit(&self) -> bool {
        self.spec.always_emit
    }

    /// Documentation text.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.spec.description
    }

    /// Enum formatter, for enum-kind fields.
    #[must_use]
    pub const fn formatter(&self) -> Option<&'static dyn EnumFormatter> {
        self.spec.formatter
    }
}

/// Validated field table of one record type.
#[derive(Debug)]
pub struct Schema {
    record: &'static str,
    scheme: &'static str,
    credential_user: Option<&'static str>,
    fixed_host: Option<&'static str>,
    fields: Vec<FieldDescriptor>,
    keys: BTreeMap<String, usize>,
}

impl Schema {
    /// Validate a record declaration.
    pub fn derive(meta: &RecordMeta) -> Result<Self, SchemaError> {
        let record = meta.name;
        let mut fields = Vec::with_capacity(meta.fields.len());
        let mut keys = BTreeMap::new();
        let mut parts = BTreeSet::new();

        for spec in meta.fields {
            let key = match (spec.key, spec.url_part) {
                (Some(_), Some(_)) => {
                    return Err(SchemaError::ConflictingBinding {
                        record,
                        field: spec.name,
                    });
                },
                (None, Some(part)) => {
                    if !spec.aliases.is_empty() {
                        return Err(SchemaError::ConflictingBinding {
                            record,
                            field: spec.name,
                        });
                    }
                    if !parts.insert(part) {
                        return Err(SchemaError::DuplicateUrlPart {
                            record,
                            field: spec.name,
                            part: part.as_str(),
                        });
                    }
                    None
                },
                (Some(key), None) => Some(key.to_ascii_lowercase()),
                (None, None) => Some(spec.name.to_ascii_lowercase()),
            };

            if spec.kind == FieldKind::Enum && spec.formatter.is_none() {
                return Err(SchemaError::MissingFormatter {
                    record,
                    field: spec.name,
                });
            }

            let canonical_default = match spec.default {
                Some(value) => Some(canonicalize(spec, value).map_err(|_| {
                    SchemaError::InvalidDefault {
                        record,
                        field: spec.name,
                        value,
                    }
                })?),
                None => None,
            };

            let aliases: Vec<String> = spec
                .aliases
                .iter()
                .map(|alias| alias.to_ascii_lowercase())
                .collect();
            let index = fields.len();
            for lookup in key.iter().chain(aliases.iter()) {
                if keys.insert(lookup.clone(), index).is_some() {
                    return Err(SchemaError::DuplicateKey {
                        record,
                        key: lookup.clone(),
                    });
                }
            }

            fields.push(FieldDescriptor {
                spec: *spec,
                key,
                aliases,
                canonical_default,
            });
        }

        Ok(Self {
            record,
            scheme: meta.scheme,
            credential_user: meta.credential_user,
            fixed_host: meta.fixed_host,
            fields,
            keys,
        })
    }

    /// Record type name.
    #[must_use]
    pub const fn record_name(&self) -> &'static str {
        self.record
    }

    /// Service scheme.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        self.scheme
    }

    /// Fixed user paired with the password slot.
    #[must_use]
    pub const fn credential_user(&self) -> Option<&'static str> {
        self.credential_user
    }

    /// Host used when no field binds the host.
    #[must_use]
    pub const fn fixed_host(&self) -> Option<&'static str> {
        self.fixed_host
    }

    /// All descriptors in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Descriptor by field name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Descriptors bound to query keys, in declaration order.
    pub fn query_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.key.is_some())
    }

    /// Descriptors bound to URL slots, in declaration order.
    pub fn url_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|field| field.url_part().is_some())
    }

    /// Descriptor bound to a URL slot.
    #[must_use]
    pub fn url_field(&self, part: UrlPart) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.url_part() == Some(part))
    }

    /// Index of the descriptor bound to a query key or alias (case-insensitive).
    #[must_use]
    pub fn index_of_key(&self, key: &str) -> Option<usize> {
        self.keys.get(&key.to_ascii_lowercase()).copied()
    }

    /// Descriptor bound to a query key or alias (case-insensitive).
    #[must_use]
    pub fn field_by_key(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index_of_key(key)
            .and_then(|index| self.fields.get(index))
    }

    /// Primary query keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.query_fields().filter_map(FieldDescriptor::key).collect();
        keys.sort_unstable();
        keys
    }
}

type CachedSchema = Result<&'static Schema, SchemaError>;

static REGISTRY: LazyLock<RwLock<HashMap<TypeId, CachedSchema>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Validated schema of `R`, derived once per process.
///
/// Concurrent first use is race-free: the entry is re-checked under the
/// write lock, so exactly one derivation is stored. Failures are cached too.
pub fn schema_of<R: ConfigRecord>() -> Result<&'static Schema, SchemaError> {
    let id = TypeId::of::<R>();
    if let Some(cached) = REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
    {
        return cached.clone();
    }

    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    registry
        .entry(id)
        .or_insert_with(|| {
            Schema::derive(&R::META).map(|schema| {
                let leaked: &'static Schema = Box::leak(Box::new(schema));
                leaked
            })
        })
        .clone()
}
