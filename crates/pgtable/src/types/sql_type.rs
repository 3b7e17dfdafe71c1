//! Column type descriptors.
//!
//! A [`SqlType`] is built once (parametrized types through the `numeric` and
//! `varchar` factories) and carries everything a column needs: the DDL name,
//! the accepted value range, the conversion rules and the server-side random
//! expression.

use super::Value;
use crate::error::{OrmError, OrmResult, ValidationError};
use crate::qb::RandomExpression;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Largest `precision` a NUMERIC column may declare; bounds must fit a `Decimal`.
const MAX_NUMERIC_PRECISION: u32 = 28;

/// Span used by date and timestamp randomizers.
const RANDOM_INTERVAL: &str = "INTERVAL '20 years'";

/// Timestamp text forms carrying an explicit offset, tried after RFC 3339.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%#z"];

/// Timestamp text forms without offset; these are read as UTC.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// The family a [`SqlType`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Boolean,
    SmallInt,
    Integer,
    SmallSerial,
    Serial,
    Numeric,
    Date,
    TimestampTz,
    VarChar,
    Text,
}

/// Descriptor of a PostgreSQL column type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlType {
    kind: TypeKind,
    name: String,
    min: Option<Decimal>,
    max: Option<Decimal>,
    precision: Option<u32>,
    scale: Option<u32>,
    len: Option<u32>,
}

/// Why a value was not accepted.
enum Rejected {
    OutOfRange(Decimal),
    Unsupported,
}

impl SqlType {
    fn simple(kind: TypeKind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            min: None,
            max: None,
            precision: None,
            scale: None,
            len: None,
        }
    }

    fn bounded(kind: TypeKind, name: &str, min: i64, max: i64) -> Self {
        Self {
            min: Some(Decimal::from(min)),
            max: Some(Decimal::from(max)),
            ..Self::simple(kind, name)
        }
    }

    pub fn boolean() -> Self {
        Self::simple(TypeKind::Boolean, "BOOLEAN")
    }

    pub fn small_int() -> Self {
        Self::bounded(
            TypeKind::SmallInt,
            "SMALLINT",
            i64::from(i16::MIN),
            i64::from(i16::MAX),
        )
    }

    pub fn integer() -> Self {
        Self::bounded(
            TypeKind::Integer,
            "INTEGER",
            i64::from(i32::MIN),
            i64::from(i32::MAX),
        )
    }

    pub fn small_serial() -> Self {
        Self::bounded(TypeKind::SmallSerial, "SMALLSERIAL", 0, i64::from(i16::MAX))
    }

    pub fn serial() -> Self {
        Self::bounded(TypeKind::Serial, "SERIAL", 0, i64::from(i32::MAX))
    }

    /// `NUMERIC(precision, scale)`.
    ///
    /// Values are rounded to `scale` digits and must lie within
    /// `±(10^(precision - scale) - 10^-scale)`.
    pub fn numeric(precision: u32, scale: u32) -> OrmResult<Self> {
        if precision == 0 {
            return Err(OrmError::configuration(
                "NUMERIC precision must be positive",
            ));
        }
        if precision < scale {
            return Err(OrmError::configuration(format!(
                "NUMERIC precision ({precision}) cannot be less than scale ({scale})"
            )));
        }
        if precision > MAX_NUMERIC_PRECISION {
            return Err(OrmError::configuration(format!(
                "NUMERIC precision above {MAX_NUMERIC_PRECISION} is not supported"
            )));
        }

        let max = Decimal::from_i128_with_scale(10_i128.pow(precision) - 1, scale);
        Ok(Self {
            min: Some(-max),
            max: Some(max),
            precision: Some(precision),
            scale: Some(scale),
            ..Self::simple(TypeKind::Numeric, &format!("NUMERIC({precision}, {scale})"))
        })
    }

    pub fn date() -> Self {
        Self::simple(TypeKind::Date, "DATE")
    }

    pub fn timestamptz() -> Self {
        Self::simple(TypeKind::TimestampTz, "TIMESTAMP WITH TIME ZONE")
    }

    /// `VARCHAR(len)`.
    pub fn varchar(len: u32) -> OrmResult<Self> {
        if len == 0 {
            return Err(OrmError::configuration("VARCHAR length must be positive"));
        }
        Ok(Self {
            len: Some(len),
            ..Self::simple(TypeKind::VarChar, &format!("VARCHAR({len})"))
        })
    }

    /// Unbounded `TEXT`.
    pub fn text() -> Self {
        Self::simple(TypeKind::Text, "TEXT")
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// DDL name, parameters included (`NUMERIC(6, 2)`).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> Option<Decimal> {
        self.min
    }

    pub fn max(&self) -> Option<Decimal> {
        self.max
    }

    pub fn precision(&self) -> Option<u32> {
        self.precision
    }

    pub fn scale(&self) -> Option<u32> {
        self.scale
    }

    /// Declared VARCHAR length.
    pub fn len(&self) -> Option<u32> {
        self.len
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::SmallInt | TypeKind::Integer | TypeKind::SmallSerial | TypeKind::Serial
        )
    }

    pub fn is_serial(&self) -> bool {
        matches!(self.kind, TypeKind::SmallSerial | TypeKind::Serial)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, TypeKind::VarChar | TypeKind::Text)
    }

    /// Convert `value` to this type's representation.
    pub fn convert(&self, value: impl Into<Value>) -> OrmResult<Value> {
        let value = value.into();
        self.coerce(&value)
            .map_err(|_| OrmError::conversion(&self.name, &value))
    }

    /// Convert `value` and check it against the column's constraints.
    pub fn validate(
        &self,
        column: &str,
        not_null: bool,
        value: impl Into<Value>,
    ) -> Result<Value, ValidationError> {
        let value = value.into();
        if value.is_null() {
            if not_null {
                return Err(ValidationError::NotNull {
                    column: column.to_string(),
                });
            }
            return Ok(Value::Null);
        }

        self.coerce(&value).map_err(|rejected| match rejected {
            Rejected::OutOfRange(number) => ValidationError::OutOfRange {
                column: column.to_string(),
                sql_type: self.name.clone(),
                value: number.to_string(),
                min: display_bound(self.min),
                max: display_bound(self.max),
            },
            Rejected::Unsupported => ValidationError::InvalidType {
                column: column.to_string(),
                sql_type: self.name.clone(),
                value: value.to_string(),
            },
        })
    }

    /// Server-side expression producing a random value of this type.
    pub fn random(&self) -> OrmResult<RandomExpression> {
        let sql = match self.kind {
            TypeKind::Boolean => "RANDOM() > 0.5".to_string(),
            TypeKind::SmallInt | TypeKind::SmallSerial => self.random_integer("SMALLINT"),
            TypeKind::Integer | TypeKind::Serial => self.random_integer("INTEGER"),
            TypeKind::Numeric => {
                let scale = self.scale.unwrap_or(0);
                let digits = self.precision.unwrap_or(0) - scale;
                // truncated so rounding never reaches 10^digits
                format!("TRUNC(CAST(RANDOM() * {} AS NUMERIC), {scale})", 10_i128.pow(digits))
            }
            TypeKind::Date => format!("CAST(NOW() - RANDOM() * {RANDOM_INTERVAL} AS DATE)"),
            TypeKind::TimestampTz => format!("NOW() - RANDOM() * {RANDOM_INTERVAL}"),
            TypeKind::VarChar => format!(
                "SUBSTRING(MD5(CAST(RANDOM() AS TEXT)) FROM 1 FOR {})",
                self.len.unwrap_or(32)
            ),
            TypeKind::Text => {
                return Err(OrmError::configuration(
                    "unbounded TEXT has no random value generator",
                ));
            }
        };
        Ok(RandomExpression::new(sql))
    }

    fn random_integer(&self, cast: &str) -> String {
        let min = self.min.unwrap_or_default();
        let max = self.max.unwrap_or_default();
        let span = max - min + Decimal::ONE;
        if min.is_sign_negative() {
            format!("CAST(FLOOR(RANDOM() * {span}) - {} AS {cast})", min.abs())
        } else {
            format!("CAST(FLOOR(RANDOM() * {span}) + {min} AS {cast})")
        }
    }

    // ===== conversion =====

    fn coerce(&self, value: &Value) -> Result<Value, Rejected> {
        match value {
            Value::Null => return Ok(Value::Null),
            Value::Random(_) => return Ok(value.clone()),
            _ => {}
        }

        match self.kind {
            TypeKind::Boolean => to_bool(value).map(Value::Bool),
            TypeKind::SmallInt | TypeKind::SmallSerial => {
                let n = self.in_range(to_decimal(value)?.trunc())?;
                n.to_i16().map(Value::SmallInt).ok_or(Rejected::OutOfRange(n))
            }
            TypeKind::Integer | TypeKind::Serial => {
                let n = self.in_range(to_decimal(value)?.trunc())?;
                n.to_i32().map(Value::Integer).ok_or(Rejected::OutOfRange(n))
            }
            TypeKind::Numeric => {
                let scale = self.scale.unwrap_or(0);
                let n = to_decimal(value)?
                    .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
                self.in_range(n).map(Value::Numeric)
            }
            TypeKind::Date => match value {
                Value::Date(d) => Ok(Value::Date(*d)),
                Value::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|_| Rejected::Unsupported),
                _ => Err(Rejected::Unsupported),
            },
            TypeKind::TimestampTz => match value {
                Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
                Value::Text(s) => parse_timestamp(s.trim())
                    .map(Value::Timestamp)
                    .ok_or(Rejected::Unsupported),
                _ => Err(Rejected::Unsupported),
            },
            TypeKind::VarChar | TypeKind::Text => match value {
                Value::Text(s) => Ok(Value::Text(s.clone())),
                other => Ok(Value::Text(other.to_string())),
            },
        }
    }

    fn in_range(&self, n: Decimal) -> Result<Decimal, Rejected> {
        let below = self.min.is_some_and(|min| n < min);
        let above = self.max.is_some_and(|max| n > max);
        if below || above {
            Err(Rejected::OutOfRange(n))
        } else {
            Ok(n)
        }
    }
}

fn display_bound(bound: Option<Decimal>) -> String {
    bound.map(|b| b.to_string()).unwrap_or_default()
}

fn to_bool(value: &Value) -> Result<bool, Rejected> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::SmallInt(_) | Value::Integer(_) | Value::BigInt(_) => {
            Ok(value.as_i64().unwrap_or(0) != 0)
        }
        Value::Double(f) => Ok(*f != 0.0),
        Value::Numeric(d) => Ok(!d.is_zero()),
        Value::Text(s) => Ok(!matches!(
            s.to_ascii_lowercase().as_str(),
            "0" | "f" | "false"
        )),
        _ => Err(Rejected::Unsupported),
    }
}

fn to_decimal(value: &Value) -> Result<Decimal, Rejected> {
    match value {
        Value::Bool(b) => Ok(Decimal::from(u8::from(*b))),
        Value::SmallInt(n) => Ok(Decimal::from(*n)),
        Value::Integer(n) => Ok(Decimal::from(*n)),
        Value::BigInt(n) => Ok(Decimal::from(*n)),
        Value::Double(f) => Decimal::try_from(*f).map_err(|_| Rejected::Unsupported),
        Value::Numeric(d) => Ok(*d),
        Value::Text(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .map_err(|_| Rejected::Unsupported)
        }
        _ => Err(Rejected::Unsupported),
    }
}

/// Parse a timestamp, first match wins.
fn parse_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts);
    }
    for format in OFFSET_FORMATS {
        if let Ok(ts) = DateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ts| ts.and_utc().fixed_offset())
}
