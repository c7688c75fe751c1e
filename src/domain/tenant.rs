//! Type-safe tenant identifier.
//!
//! Every tenant lives in its own PostgreSQL schema whose name is spliced
//! into SQL text, so a [`Tenant`] can only be built from a validated
//! identifier. Once constructed it is safe to quote into a statement.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Maximum identifier length accepted by PostgreSQL.
pub const MAX_TENANT_LEN: usize = 63;

/// Schemas owned by PostgreSQL itself. Names starting with `pg_` are
/// reserved as well.
const RESERVED_SCHEMAS: [&str; 2] = ["public", "information_schema"];

/// Name of a tenant, which is also the name of its database schema.
///
/// Lower-case ASCII letters, digits and underscores only, not starting
/// with a digit, at most [`MAX_TENANT_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tenant(String);

impl Tenant {
    /// Validates and normalizes a raw tenant name (trimmed, lower-cased).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] if the name is empty, too
    /// long, contains characters outside `[a-z0-9_]`, or names a system
    /// schema (`pg_*`, `public`, `information_schema`).
    pub fn parse(raw: &str) -> Result<Self, LedgerError> {
        let name = raw.trim().to_ascii_lowercase();
        if name.is_empty() || name.len() > MAX_TENANT_LEN {
            return Err(LedgerError::InvalidInput(format!(
                "tenant name must have 1 to {MAX_TENANT_LEN} characters"
            )));
        }
        let mut chars = name.chars();
        let starts_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !(starts_ok && rest_ok) {
            return Err(LedgerError::InvalidInput(format!(
                "invalid tenant name: {raw}"
            )));
        }
        if name.starts_with("pg_") || RESERVED_SCHEMAS.contains(&name.as_str()) {
            return Err(LedgerError::InvalidInput(format!(
                "tenant name is reserved: {name}"
            )));
        }
        Ok(Self(name))
    }

    /// Returns the tenant name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `"<tenant>".<table>`, a schema-qualified table reference.
    #[must_use]
    pub fn qualified(&self, table: &str) -> String {
        format!("\"{}\".{table}", self.0)
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tenant {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Tenant {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Tenant> for String {
    fn from(tenant: Tenant) -> Self {
        tenant.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let Ok(tenant) = Tenant::parse("  Casona ") else {
            panic!("valid tenant");
        };
        assert_eq!(tenant.as_str(), "casona");
    }

    #[test]
    fn parse_accepts_underscores_and_digits() {
        assert!(Tenant::parse("loja_42").is_ok());
        assert!(Tenant::parse("_internal").is_ok());
    }

    #[test]
    fn parse_rejects_sql_metacharacters() {
        assert!(Tenant::parse("casona\".clientes; --").is_err());
        assert!(Tenant::parse("a-b").is_err());
        assert!(Tenant::parse("a b").is_err());
    }

    #[test]
    fn parse_rejects_leading_digit_empty_and_long_names() {
        assert!(Tenant::parse("1loja").is_err());
        assert!(Tenant::parse("   ").is_err());
        assert!(Tenant::parse(&"x".repeat(MAX_TENANT_LEN + 1)).is_err());
        assert!(Tenant::parse(&"x".repeat(MAX_TENANT_LEN)).is_ok());
    }

    #[test]
    fn parse_rejects_system_schemas() {
        for reserved in ["public", "PUBLIC", "information_schema", "pg_catalog", "pg_x"] {
            assert!(
                matches!(Tenant::parse(reserved), Err(LedgerError::InvalidInput(_))),
                "{reserved} should be rejected"
            );
        }
        assert!(Tenant::parse("pgx_loja").is_ok());
    }

    #[test]
    fn qualified_quotes_schema() {
        let Ok(tenant) = Tenant::parse("casona") else {
            panic!("valid tenant");
        };
        assert_eq!(tenant.qualified("clientes"), "\"casona\".clientes");
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<Tenant, _> = serde_json::from_str("\"casona\"");
        assert!(ok.is_ok());
        let bad: Result<Tenant, _> = serde_json::from_str("\"bad name\"");
        assert!(bad.is_err());
    }
}
