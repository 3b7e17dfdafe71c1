//! Table declarations.

use crate::client::GenericClient;
use crate::column::{Column, ColumnDef};
use crate::error::{OrmError, OrmResult};
use crate::ident::{Ident, TableRef};
use crate::instance::Instance;
use crate::qb::{DeleteQb, InsertQb, SelectQb, UpdateQb};
use std::sync::Arc;

/// Collects column definitions for one table.
#[derive(Debug)]
pub struct SchemaBuilder {
    schema: String,
    table: String,
    columns: Vec<ColumnDef>,
}

impl SchemaBuilder {
    /// Append a column; declaration order is kept everywhere.
    pub fn column(mut self, def: ColumnDef) -> Self {
        self.columns.push(def);
        self
    }

    /// Validate names and bind every column to this table.
    pub fn build(self) -> OrmResult<Arc<Schema>> {
        let table = TableRef::new(Ident::new(&self.schema)?, Ident::new(&self.table)?);

        let mut columns: Vec<Column> = Vec::with_capacity(self.columns.len());
        for def in self.columns {
            if columns.iter().any(|c| c.name() == def.name()) {
                return Err(OrmError::configuration(format!(
                    "duplicate column {:?} in table {table}",
                    def.name()
                )));
            }
            columns.push(Column::bind(def, &table)?);
        }

        let primary_keys = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_primary_key())
            .map(|(i, _)| i)
            .collect();

        Ok(Arc::new(Schema {
            table,
            columns,
            primary_keys,
        }))
    }
}

/// An immutable table description: identity plus ordered columns.
///
/// Shared as `Arc<Schema>`; instances and queries keep a handle to it.
#[derive(Debug)]
pub struct Schema {
    table: TableRef,
    columns: Vec<Column>,
    primary_keys: Vec<usize>,
}

impl Schema {
    /// Start declaring `"<schema>"."<table>"`.
    pub fn builder(schema: impl Into<String>, table: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            schema: schema.into(),
            table: table.into(),
            columns: Vec::new(),
        }
    }

    pub fn table_ref(&self) -> &TableRef {
        &self.table
    }

    pub fn schema_name(&self) -> &str {
        self.table.schema().as_str()
    }

    pub fn table_name(&self) -> &str {
        self.table.table().as_str()
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Primary-key columns in declaration order.
    pub fn primary_keys(&self) -> impl Iterator<Item = &Column> + '_ {
        self.primary_keys.iter().map(|&i| &self.columns[i])
    }

    pub fn has_primary_key(&self) -> bool {
        !self.primary_keys.is_empty()
    }

    pub(crate) fn primary_key_positions(&self) -> &[usize] {
        &self.primary_keys
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Like [`Schema::column`], failing with a reference error.
    pub fn col(&self, name: &str) -> OrmResult<&Column> {
        self.column(name).ok_or_else(|| {
            OrmError::reference(format!("table {} has no column {name:?}", self.table))
        })
    }

    pub(crate) fn position(&self, name: &str) -> OrmResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name() == name)
            .ok_or_else(|| {
                OrmError::reference(format!("table {} has no column {name:?}", self.table))
            })
    }

    /// Position of a column of this table.
    pub(crate) fn position_of(&self, column: &Column) -> Option<usize> {
        if column.table_ref() != &self.table {
            return None;
        }
        self.columns.iter().position(|c| c == column)
    }

    /// `CREATE SCHEMA IF NOT EXISTS "<schema>"`
    pub fn create_schema_sql(&self) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {}", self.table.schema().to_sql())
    }

    /// `CREATE TABLE IF NOT EXISTS` for this table.
    pub fn create_table_sql(&self) -> String {
        let mut parts: Vec<String> = self.columns.iter().map(Column::definition).collect();
        if self.has_primary_key() {
            let keys: Vec<String> = self.primary_keys().map(Column::quoted_name).collect();
            parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            parts.join(", ")
        )
    }

    // ===== queries =====

    /// SELECT from this table.
    pub fn select(self: &Arc<Self>) -> SelectQb {
        SelectQb::new(self)
    }

    /// INSERT `values`; returned rows are copied back into them.
    pub fn insert<'a>(self: &Arc<Self>, values: &'a mut [Instance]) -> InsertQb<'a> {
        InsertQb::new(self, values)
    }

    /// UPDATE rows of this table.
    pub fn update(self: &Arc<Self>) -> UpdateQb {
        UpdateQb::new(self)
    }

    /// DELETE rows of this table.
    pub fn delete(self: &Arc<Self>) -> DeleteQb {
        DeleteQb::new(self)
    }

    /// Insert `count` server-generated rows and return them.
    ///
    /// Serial columns without a foreign key are left to their sequence; every
    /// other column gets its random expression.
    pub async fn random(
        self: &Arc<Self>,
        conn: &impl GenericClient,
        count: usize,
    ) -> OrmResult<Vec<Instance>> {
        let mut rows = Vec::with_capacity(count);
        for _ in 0..count {
            let mut instance = Instance::new(self);
            for column in &self.columns {
                if column.sql_type().is_serial() && column.foreign_key().is_none() {
                    continue;
                }
                instance.set(column.name(), column.random()?)?;
            }
            rows.push(instance);
        }

        self.insert(&mut rows).build()?.execute(conn).await?;
        Ok(rows)
    }
}
