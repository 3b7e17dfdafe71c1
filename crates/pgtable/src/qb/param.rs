//! Named parameters and rendered statements.

use crate::error::{OrmError, OrmResult};
use crate::types::Value;
use std::collections::BTreeMap;
use std::fmt;
use tokio_postgres::types::ToSql;

/// Parameter map keyed by placeholder name.
pub type Params = BTreeMap<String, Value>;

/// Rendered SQL text with its named parameters.
///
/// Fixed once a query is built; executing the same statement twice sends the
/// same text and values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    params: Params,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement with no text; executing it does nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Rewrite `:name` placeholders to `$1, $2, ...` in order of first
    /// appearance and collect the matching values.
    ///
    /// Text inside single-quoted literals and double-quoted identifiers is left
    /// alone, as are `::` casts.
    pub fn to_positional(&self) -> OrmResult<(String, Vec<&Value>)> {
        let mut sql = String::with_capacity(self.sql.len());
        let mut order: Vec<&str> = Vec::new();
        let mut values: Vec<&Value> = Vec::new();
        let mut quote: Option<char> = None;
        let mut chars = self.sql.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            if let Some(q) = quote {
                if c == q {
                    quote = None;
                }
                sql.push(c);
                continue;
            }

            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    sql.push(c);
                }
                ':' => match chars.peek() {
                    Some(&(_, ':')) => {
                        chars.next();
                        sql.push_str("::");
                    }
                    Some(&(_, next)) if next == '_' || next.is_ascii_alphanumeric() => {
                        let start = i + 1;
                        let mut end = start;
                        while let Some(&(j, n)) = chars.peek() {
                            if n == '_' || n.is_ascii_alphanumeric() {
                                end = j + n.len_utf8();
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        let name = &self.sql[start..end];
                        let index = match order.iter().position(|seen| *seen == name) {
                            Some(pos) => pos + 1,
                            None => {
                                let value = self.params.get(name).ok_or_else(|| {
                                    OrmError::reference(format!(
                                        "no value bound for placeholder :{name}"
                                    ))
                                })?;
                                order.push(name);
                                values.push(value);
                                order.len()
                            }
                        };
                        sql.push('$');
                        sql.push_str(&index.to_string());
                    }
                    _ => sql.push(c),
                },
                _ => sql.push(c),
            }
        }

        Ok((sql, values))
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Borrow positional values in the form tokio-postgres expects.
pub(crate) fn as_refs<'a>(values: &[&'a Value]) -> Vec<&'a (dyn ToSql + Sync)> {
    values.iter().map(|v| *v as &(dyn ToSql + Sync)).collect()
}
