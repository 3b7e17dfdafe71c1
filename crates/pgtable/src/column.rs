//! Column declarations and table-bound columns.
//!
//! A [`ColumnDef`] is what host code writes; it has no table yet and therefore
//! no SQL text form. Building a [`Schema`](crate::Schema) turns every definition
//! into a [`Column`] bound to that table, which renders as
//! `"<schema>"."<table>"."<name>"` and produces filter expressions.
//!
//! # Example
//! ```ignore
//! let game = Schema::builder("gamers", "game")
//!     .column(ColumnDef::new("id", SqlType::serial()).primary_key())
//!     .column(ColumnDef::new("price", SqlType::numeric(6, 2)?).not_null())
//!     .build()?;
//!
//! let cheap = game.col("price")?.lt(10)?;
//! ```

use crate::error::{OrmError, OrmResult, ValidationError};
use crate::ident::{Ident, TableRef};
use crate::qb::{Expression, Params, RandomExpression};
use crate::types::{SqlType, Value};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide suffix keeping comparator parameter names unique.
static NEXT_PARAM: AtomicUsize = AtomicUsize::new(0);

/// Computed default, evaluated each time a value is needed.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Client-side default for a column.
#[derive(Clone)]
pub enum ColumnDefault {
    Value(Value),
    Computed(DefaultFn),
}

impl ColumnDefault {
    /// Produce the default value.
    pub fn resolve(&self) -> Value {
        match self {
            ColumnDefault::Value(value) => value.clone(),
            ColumnDefault::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnDefault::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ColumnDefault::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

/// Column declaration, not yet bound to a table.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    name: String,
    sql_type: SqlType,
    primary_key: bool,
    unique: bool,
    not_null: bool,
    default: Option<ColumnDefault>,
    foreign_key: Option<Column>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            primary_key: false,
            unique: false,
            not_null: false,
            default: None,
            foreign_key: None,
        }
    }

    /// Mark as part of the primary key. Implies `UNIQUE` and `NOT NULL`.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Static default used when an instance leaves this column unset.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(ColumnDefault::Value(value.into()));
        self
    }

    /// Computed default used when an instance leaves this column unset.
    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(ColumnDefault::Computed(Arc::new(f)));
        self
    }

    /// Reference another table's column.
    pub fn foreign_key(mut self, target: &Column) -> Self {
        self.foreign_key = Some(target.clone());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
struct ColumnData {
    table: TableRef,
    name: Ident,
    qualified: String,
    sql_type: SqlType,
    primary_key: bool,
    unique: bool,
    not_null: bool,
    default: Option<ColumnDefault>,
    foreign_key: Option<Column>,
}

/// A column bound to its table.
///
/// Cloning is cheap; clones compare equal.
#[derive(Clone)]
pub struct Column(Arc<ColumnData>);

/// Comparison operators available on columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Like,
}

impl Operator {
    fn sql(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Like => "LIKE",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Gt => "gt",
            Operator::Le => "le",
            Operator::Ge => "ge",
            Operator::Like => "like",
        }
    }
}

/// Right-hand side of a column comparison.
pub enum Operand<'a> {
    Column(&'a Column),
    Value(Value),
}

/// Anything a column can be compared against.
pub trait IntoOperand<'a> {
    fn into_operand(self) -> Operand<'a>;
}

impl<'a> IntoOperand<'a> for &'a Column {
    fn into_operand(self) -> Operand<'a> {
        Operand::Column(self)
    }
}

impl<'a, T: Into<Value>> IntoOperand<'a> for Option<T> {
    fn into_operand(self) -> Operand<'a> {
        Operand::Value(self.into())
    }
}

macro_rules! value_operand {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'a> IntoOperand<'a> for $ty {
                fn into_operand(self) -> Operand<'a> {
                    Operand::Value(self.into())
                }
            }
        )*
    };
}

value_operand!(
    Value,
    bool,
    i16,
    i32,
    i64,
    f64,
    Decimal,
    &str,
    String,
    &String,
    NaiveDate,
    NaiveDateTime,
    DateTime<Utc>,
    DateTime<FixedOffset>,
    RandomExpression,
);

impl Column {
    pub(crate) fn bind(def: ColumnDef, table: &TableRef) -> OrmResult<Self> {
        let name = Ident::new(&def.name)?;
        let mut qualified = String::new();
        table.write_sql(&mut qualified);
        qualified.push('.');
        name.write_sql(&mut qualified);

        Ok(Self(Arc::new(ColumnData {
            table: table.clone(),
            name,
            qualified,
            sql_type: def.sql_type,
            primary_key: def.primary_key,
            unique: def.unique,
            not_null: def.not_null,
            default: def.default,
            foreign_key: def.foreign_key,
        })))
    }

    pub fn name(&self) -> &str {
        self.0.name.as_str()
    }

    pub fn ident(&self) -> &Ident {
        &self.0.name
    }

    /// The owning table.
    pub fn table_ref(&self) -> &TableRef {
        &self.0.table
    }

    pub fn sql_type(&self) -> &SqlType {
        &self.0.sql_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.0.primary_key
    }

    pub fn is_unique(&self) -> bool {
        self.0.unique
    }

    /// Whether the column carries a NOT NULL constraint.
    pub fn not_null(&self) -> bool {
        self.0.not_null
    }

    pub fn default(&self) -> Option<&ColumnDefault> {
        self.0.default.as_ref()
    }

    /// The default value, if one is declared, converted to this column's type
    /// when possible.
    pub fn default_value(&self) -> Option<Value> {
        let value = self.0.default.as_ref()?.resolve();
        Some(self.0.sql_type.convert(value.clone()).unwrap_or(value))
    }

    pub fn foreign_key(&self) -> Option<&Column> {
        self.0.foreign_key.as_ref()
    }

    /// Fully qualified form: `"<schema>"."<table>"."<name>"`.
    pub fn to_sql(&self) -> &str {
        &self.0.qualified
    }

    /// Unqualified quoted name, as used in column lists.
    pub fn quoted_name(&self) -> String {
        self.0.name.to_sql()
    }

    /// Convert a value with this column's type rules.
    pub fn convert(&self, value: impl Into<Value>) -> OrmResult<Value> {
        self.0.sql_type.convert(value)
    }

    /// Convert and check a value against this column's constraints.
    pub fn validate(&self, value: impl Into<Value>) -> Result<Value, ValidationError> {
        self.0
            .sql_type
            .validate(self.name(), self.0.not_null, value)
    }

    /// Random value expression for generated rows.
    ///
    /// A foreign-key column picks an existing value from the referenced table.
    pub fn random(&self) -> OrmResult<RandomExpression> {
        match &self.0.foreign_key {
            Some(target) => Ok(RandomExpression::new(format!(
                "(SELECT {} FROM {} ORDER BY RANDOM() LIMIT 1)",
                target.to_sql(),
                target.table_ref()
            ))),
            None => self.0.sql_type.random(),
        }
    }

    /// Column DDL fragment for `CREATE TABLE`.
    pub fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.quoted_name(), self.0.sql_type.name());
        if self.0.unique && !self.0.primary_key {
            sql.push_str(" UNIQUE");
        }
        if self.0.not_null {
            sql.push_str(" NOT NULL");
        }
        if let Some(target) = &self.0.foreign_key {
            sql.push_str(&format!(
                " REFERENCES {} ({})",
                target.table_ref(),
                target.quoted_name()
            ));
        }
        sql
    }

    // ===== comparators =====

    pub fn eq<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        self.compare(Operator::Eq, rhs)
    }

    pub fn ne<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        self.compare(Operator::Ne, rhs)
    }

    pub fn lt<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        self.compare(Operator::Lt, rhs)
    }

    pub fn gt<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        self.compare(Operator::Gt, rhs)
    }

    pub fn le<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        self.compare(Operator::Le, rhs)
    }

    pub fn ge<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        self.compare(Operator::Ge, rhs)
    }

    /// `LIKE` pattern match; text columns only.
    pub fn like<'a>(&self, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        if !self.0.sql_type.is_text() {
            return Err(OrmError::configuration(format!(
                "LIKE is not available on column {} of type {}",
                self.to_sql(),
                self.0.sql_type.name()
            )));
        }
        self.compare(Operator::Like, rhs)
    }

    pub fn is_null(&self) -> Expression {
        Expression::raw(format!("{} IS NULL", self.to_sql()))
    }

    pub fn is_not_null(&self) -> Expression {
        Expression::raw(format!("{} IS NOT NULL", self.to_sql()))
    }

    fn compare<'a>(&self, op: Operator, rhs: impl IntoOperand<'a>) -> OrmResult<Expression> {
        let value = match rhs.into_operand() {
            Operand::Column(other) => {
                return Ok(Expression::raw(format!(
                    "{} {} {}",
                    self.to_sql(),
                    op.sql(),
                    other.to_sql()
                )));
            }
            Operand::Value(value) => self.validate(value)?,
        };

        if let Value::Random(expr) = &value {
            return Ok(Expression::raw(format!(
                "{} {} {}",
                self.to_sql(),
                op.sql(),
                expr.sql()
            )));
        }

        let name = format!(
            "{}_{}_{}_{}",
            self.0.table.table(),
            self.name(),
            op.name(),
            NEXT_PARAM.fetch_add(1, Ordering::Relaxed)
        );
        let sql = format!("{} {} :{name}", self.to_sql(), op.sql());
        Ok(Expression::new(sql, Params::from([(name, value)])))
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.table == other.0.table && self.0.name == other.0.name)
    }
}

impl Eq for Column {}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("column", &self.0.qualified)
            .field("type", &self.0.sql_type.name())
            .field("primary_key", &self.0.primary_key)
            .field("not_null", &self.0.not_null)
            .finish()
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.qualified)
    }
}
