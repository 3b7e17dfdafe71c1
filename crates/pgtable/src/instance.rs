//! Records of a schema.

use crate::client::Record;
use crate::error::{OrmError, OrmResult};
use crate::schema::Schema;
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

/// One row of a table, with a slot per column.
///
/// A slot is either unset or holds a value already converted to the column's
/// type. Unset slots read as the column default (or NULL) and are written as
/// `DEFAULT` on insert.
#[derive(Clone)]
pub struct Instance {
    schema: Arc<Schema>,
    values: Vec<Option<Value>>,
}

impl Instance {
    /// An instance with every slot unset.
    pub fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: vec![None; schema.columns().len()],
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Whether this instance belongs to `schema`: the same declaration, or one
    /// of the same table with the same columns in the same order.
    pub fn is_of(&self, schema: &Schema) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.schema), schema)
            || (self.schema.table_ref() == schema.table_ref()
                && self.schema.columns() == schema.columns())
    }

    /// Set a column through its conversion rule.
    pub fn set(&mut self, column: &str, value: impl Into<Value>) -> OrmResult<&mut Self> {
        let index = self.schema.position(column)?;
        let converted = self.schema.columns()[index].convert(value)?;
        self.values[index] = Some(converted);
        Ok(self)
    }

    /// Builder form of [`Instance::set`].
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> OrmResult<Self> {
        self.set(column, value)?;
        Ok(self)
    }

    /// Clear a slot back to unset.
    pub fn unset(&mut self, column: &str) -> OrmResult<&mut Self> {
        let index = self.schema.position(column)?;
        self.values[index] = None;
        Ok(self)
    }

    /// The stored value, else the column default, else NULL.
    pub fn get(&self, column: &str) -> OrmResult<Value> {
        let index = self.schema.position(column)?;
        Ok(self.get_at(index))
    }

    /// The stored value only.
    pub fn value(&self, column: &str) -> OrmResult<Option<&Value>> {
        let index = self.schema.position(column)?;
        Ok(self.values[index].as_ref())
    }

    pub fn is_set(&self, column: &str) -> OrmResult<bool> {
        Ok(self.value(column)?.is_some())
    }

    pub(crate) fn get_at(&self, index: usize) -> Value {
        match &self.values[index] {
            Some(value) => value.clone(),
            None => self.schema.columns()[index]
                .default_value()
                .unwrap_or(Value::Null),
        }
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&Value> {
        self.values[index].as_ref()
    }

    pub(crate) fn set_at(&mut self, index: usize, value: Value) {
        self.values[index] = Some(value);
    }

    /// Build an instance from a result row whose cells line up with `columns`
    /// (positions into the schema's column list).
    pub(crate) fn from_record(
        schema: &Arc<Schema>,
        columns: &[usize],
        record: &Record,
    ) -> OrmResult<Self> {
        if record.len() != columns.len() {
            return Err(OrmError::decode(
                schema.table_name(),
                format!(
                    "expected {} columns, got {}",
                    columns.len(),
                    record.len()
                ),
            ));
        }
        let mut instance = Self::new(schema);
        for (&index, value) in columns.iter().zip(record.values()) {
            let converted = schema.columns()[index].convert(value.clone())?;
            instance.values[index] = Some(converted);
        }
        Ok(instance)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (column, value) in self.schema.columns().iter().zip(&self.values) {
            map.entry(&column.name(), value);
        }
        map.finish()
    }
}
