//! Enum formatting: closed sets of named tokens for enumerated fields.
//!
//! Each enumerated field type carries its own [`EnumTokens`] constant,
//! usually generated by `#[derive(PropEnum)]`. The object-safe
//! [`EnumFormatter`] view of it is what field descriptors hold.

use std::fmt;

/// Converts between enum ordinals and their canonical tokens.
pub trait EnumFormatter: Send + Sync + fmt::Debug {
    /// All valid tokens, in declaration order.
    fn names(&self) -> &'static [&'static str];

    /// Canonical token for an ordinal. Total over valid ordinals.
    fn format(&self, ordinal: usize) -> Option<&'static str> {
        self.names().get(ordinal).copied()
    }

    /// Ordinal for a token, rejecting anything outside the declared set.
    fn parse(&self, token: &str) -> Result<usize, TokenNotFound>;
}

/// Token outside an enum's declared set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenNotFound {
    /// Token as supplied.
    pub token: String,
    /// Declared tokens.
    pub allowed: &'static [&'static str],
}

impl fmt::Display for TokenNotFound {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{:?} is not one of {}",
            self.token,
            self.allowed.join(", ")
        )
    }
}

impl std::error::Error for TokenNotFound {}

/// Token table for one enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumTokens {
    names: &'static [&'static str],
    case_sensitive: bool,
}

impl EnumTokens {
    /// Create a token table. Tokens must be unique.
    #[must_use]
    pub const fn new(names: &'static [&'static str], case_sensitive: bool) -> Self {
        Self {
            names,
            case_sensitive,
        }
    }

    /// Whether token comparison is case-sensitive.
    #[must_use]
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }
}

impl EnumFormatter for EnumTokens {
    fn names(&self) -> &'static [&'static str] {
        self.names
    }

    fn parse(&self, token: &str) -> Result<usize, TokenNotFound> {
        self.names
            .iter()
            .position(|name| {
                if self.case_sensitive {
                    *name == token
                } else {
                    name.eq_ignore_ascii_case(token)
                }
            })
            .ok_or_else(|| TokenNotFound {
                token: token.to_string(),
                allowed: self.names,
            })
    }
}

/// A Rust enum whose variants map one-to-one onto string tokens.
///
/// Derive it with `#[derive(PropEnum)]`; variant tokens default to the
/// lower-cased variant name and can be renamed with `#[prop(rename = "...")]`.
pub trait PropEnum: Sized + 'static {
    /// Token table, indexed by ordinal.
    const TOKENS: &'static EnumTokens;

    /// Declaration index of this variant.
    fn ordinal(&self) -> usize;

    /// Variant for a declaration index.
    fn from_ordinal(ordinal: usize) -> Option<Self>;

    /// Canonical token of this variant.
    fn token(&self) -> &'static str {
        Self::TOKENS.format(self.ordinal()).unwrap_or_default()
    }

    /// Parse a token into a variant.
    fn from_token(token: &str) -> Result<Self, TokenNotFound> {
        let ordinal = Self::TOKENS.parse(token)?;
        Self::from_ordinal(ordinal).ok_or_else(|| TokenNotFound {
            token: token.to_string(),
            allowed: Self::TOKENS.names(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVELS: EnumTokens = EnumTokens::new(&["low", "default", "high"], false);

    #[test]
    fn parse_is_case_insensitive_by_default() -> Result<(), TokenNotFound> {
        assert_eq!(LEVELS.parse("HIGH")?, 2);
        assert_eq!(LEVELS.parse("Default")?, 1);
        Ok(())
    }

    #[test]
    fn case_sensitive_tables_reject_other_cases() {
        let strict = EnumTokens::new(&["Low", "High"], true);
        assert!(strict.parse("low").is_err());
        assert_eq!(strict.parse("Low").ok(), Some(0));
    }

    #[test]
    fn unknown_tokens_report_the_declared_set() {
        let error = LEVELS.parse("urgent").err();
        assert_eq!(
            error,
            Some(TokenNotFound {
                token: "urgent".to_string(),
                allowed: &["low", "default", "high"],
            })
        );
    }

    #[test]
    fn format_covers_every_ordinal() {
        for (ordinal, name) in LEVELS.names().iter().enumerate() {
            assert_eq!(LEVELS.format(ordinal), Some(*name));
        }
        assert_eq!(LEVELS.format(3), None);
    }
}
