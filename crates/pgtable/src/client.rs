//! Execution boundary: run a rendered statement, get rows back.

use crate::error::{OrmError, OrmResult};
use crate::qb::param::as_refs;
use crate::qb::Statement;
use crate::types::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// One result row, cells in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Anything that can execute a [`Statement`].
///
/// Implemented for `tokio_postgres::Client` and [`Database`](crate::Database);
/// tests provide in-memory implementations.
pub trait GenericClient: Send + Sync {
    /// Execute a statement and return all rows.
    fn query(
        &self,
        statement: &Statement,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Record>>> + Send;
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, statement: &Statement) -> OrmResult<Vec<Record>> {
        let (sql, values) = statement.to_positional()?;
        let params = as_refs(&values);
        let rows = tokio_postgres::Client::query(self, sql.as_str(), &params).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Decode every cell of a row by its column type.
pub(crate) fn decode_row(row: &Row) -> OrmResult<Record> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    let value: Value = match *ty {
        Type::BOOL => get::<bool>(row, idx)?.into(),
        Type::INT2 => get::<i16>(row, idx)?.into(),
        Type::INT4 => get::<i32>(row, idx)?.into(),
        Type::INT8 => get::<i64>(row, idx)?.into(),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(f64::from).into(),
        Type::FLOAT8 => get::<f64>(row, idx)?.into(),
        Type::NUMERIC => get::<Decimal>(row, idx)?.into(),
        Type::DATE => get::<NaiveDate>(row, idx)?.into(),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.into(),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, idx)?.into()
        }
        _ => {
            return Err(OrmError::decode(
                column.name(),
                format!("unsupported column type {ty}"),
            ));
        }
    };
    Ok(value)
}

fn get<T>(row: &Row, idx: usize) -> OrmResult<Option<T>>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get::<_, Option<T>>(idx)
        .map_err(|e| OrmError::decode(row.columns()[idx].name(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accessors() {
        let record: Record = vec![Value::Integer(1), Value::Null].into_iter().collect();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get(0), Some(&Value::Integer(1)));
        assert_eq!(record.get(2), None);
        assert!(!record.is_empty());
    }
}
