//! Filter expressions and logical combinators.
//!
//! An [`Expression`] is a SQL fragment plus the named parameters it refers to.
//! Fragments reference parameters as `:name`; the names are rewritten to
//! positional placeholders only when a statement is executed, so expressions
//! can be combined freely without renumbering.

use crate::qb::param::Params;
use std::fmt;

/// A SQL predicate fragment with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    sql: String,
    params: Params,
}

impl Expression {
    /// Create an expression from a fragment and its parameters.
    pub fn new(sql: impl Into<String>, params: Params) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A parameterless fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Params::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn into_parts(self) -> (String, Params) {
        (self.sql, self.params)
    }

    /// `(self AND other)`
    pub fn and(self, other: Expression) -> Expression {
        and([self, other])
    }

    /// `(self OR other)`
    pub fn or(self, other: Expression) -> Expression {
        or([self, other])
    }

    /// `(NOT self)`
    pub fn not(self) -> Expression {
        not(self)
    }
}

impl<S: Into<String>> From<(S, Params)> for Expression {
    fn from((sql, params): (S, Params)) -> Self {
        Self::new(sql, params)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Join every expression with `AND`. An empty conjunction is `(TRUE)`.
///
/// Parameter maps are merged in order; a later expression overwrites an
/// earlier parameter of the same name.
pub fn and(exprs: impl IntoIterator<Item = Expression>) -> Expression {
    combine("AND", "(TRUE)", exprs)
}

/// Join every expression with `OR`. An empty disjunction is `(FALSE)`.
pub fn or(exprs: impl IntoIterator<Item = Expression>) -> Expression {
    combine("OR", "(FALSE)", exprs)
}

/// Negate an expression.
pub fn not(expr: Expression) -> Expression {
    Expression {
        sql: format!("(NOT {})", expr.sql),
        params: expr.params,
    }
}

fn combine(op: &str, empty: &str, exprs: impl IntoIterator<Item = Expression>) -> Expression {
    let mut params = Params::new();
    let mut parts = Vec::new();
    for expr in exprs {
        parts.push(expr.sql);
        params.extend(expr.params);
    }
    if parts.is_empty() {
        return Expression::new(empty, params);
    }
    let separator = format!(" {op} ");
    Expression {
        sql: format!("({})", parts.join(&separator)),
        params,
    }
}

/// Raw SQL computed by the server, spliced into statements without binding.
///
/// Produced by column randomizers; the text is built from type metadata only,
/// never from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RandomExpression(String);

impl RandomExpression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn sql(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RandomExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
