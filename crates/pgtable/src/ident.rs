//! Validated SQL identifiers.
//!
//! Schema, table and column names are restricted to `[A-Za-z0-9_]+` and are
//! always emitted double-quoted, so a name is never interpreted as a keyword
//! and never needs escaping.
//!
//! # Example
//! ```ignore
//! use pgtable::Ident;
//!
//! let t = Ident::new("user_purchase")?;
//! assert_eq!(t.to_sql(), r#""user_purchase""#);
//! # Ok::<(), pgtable::OrmError>(())
//! ```

use crate::error::{OrmError, OrmResult};
use std::fmt;
use std::sync::Arc;

/// A single validated identifier (schema, table, or column name).
///
/// Cloning is cheap: the name is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ident(Arc<str>);

impl Ident {
    /// Validate `name` against `[A-Za-z0-9_]+`.
    pub fn new(name: &str) -> OrmResult<Self> {
        if name.is_empty() {
            return Err(OrmError::configuration("Identifier cannot be empty"));
        }
        if let Some(c) = name.chars().find(|c| !(*c == '_' || c.is_ascii_alphanumeric())) {
            return Err(OrmError::configuration(format!(
                "Invalid character '{c}' in identifier {name:?}"
            )));
        }
        Ok(Self(Arc::from(name)))
    }

    /// The bare name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the identifier double-quoted.
    pub fn to_sql(&self) -> String {
        let mut out = String::with_capacity(self.0.len() + 2);
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        out.push('"');
        out.push_str(&self.0);
        out.push('"');
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of a table: `"<schema>"."<table>"`.
///
/// This is what queries track in their table set; two columns belong to the
/// same table exactly when their `TableRef`s are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    schema: Ident,
    table: Ident,
}

impl TableRef {
    /// Create a table reference from validated parts.
    pub fn new(schema: Ident, table: Ident) -> Self {
        Self { schema, table }
    }

    /// Schema name.
    pub fn schema(&self) -> &Ident {
        &self.schema
    }

    /// Table name.
    pub fn table(&self) -> &Ident {
        &self.table
    }

    /// Render as `"<schema>"."<table>"`.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        self.write_sql(&mut out);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String) {
        self.schema.write_sql(out);
        out.push('.');
        self.table.write_sql(out);
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::new("users").unwrap();
        assert_eq!(ident.to_sql(), r#""users""#);
        assert_eq!(ident.as_str(), "users");
    }

    #[test]
    fn ident_allows_digits_and_underscore() {
        assert!(Ident::new("user_2").is_ok());
        assert!(Ident::new("2fa_codes").is_ok());
        assert!(Ident::new("_hidden").is_ok());
    }

    #[test]
    fn ident_rejects_empty() {
        assert!(Ident::new("").unwrap_err().is_configuration());
    }

    #[test]
    fn ident_rejects_space() {
        assert!(Ident::new("my table").is_err());
    }

    #[test]
    fn ident_rejects_quote_and_dot() {
        assert!(Ident::new(r#"na"me"#).is_err());
        assert!(Ident::new("public.users").is_err());
    }

    #[test]
    fn ident_rejects_dollar() {
        assert!(Ident::new("my_var$1").is_err());
    }

    #[test]
    fn table_ref_renders_qualified() {
        let t = TableRef::new(Ident::new("gamers").unwrap(), Ident::new("game").unwrap());
        assert_eq!(t.to_sql(), r#""gamers"."game""#);
        assert_eq!(t.to_string(), r#""gamers"."game""#);
    }
}
