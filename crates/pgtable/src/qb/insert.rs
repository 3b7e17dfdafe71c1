//! INSERT queries with conflict handling and back-fill.

use crate::client::{GenericClient, Record};
use crate::error::{OrmError, OrmResult};
use crate::ident::TableRef;
use crate::instance::Instance;
use crate::qb::param::{Params, Statement};
use crate::qb::traits::SqlQuery;
use crate::schema::Schema;
use crate::types::Value;
use std::sync::Arc;

/// What to do when a row collides with an existing key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Skip conflicting rows.
    #[default]
    DoNothing,
    /// Overwrite every column of the existing row.
    Upsert,
}

/// INSERT builder.
///
/// Holds the instances mutably so the executed query can copy server-side
/// values (serials, defaults, random expressions) back into them.
#[derive(Debug)]
pub struct InsertQb<'a> {
    schema: Arc<Schema>,
    values: &'a mut [Instance],
    conflict: ConflictPolicy,
}

impl<'a> InsertQb<'a> {
    pub(crate) fn new(schema: &Arc<Schema>, values: &'a mut [Instance]) -> Self {
        Self {
            schema: Arc::clone(schema),
            values,
            conflict: ConflictPolicy::DoNothing,
        }
    }

    /// Upsert on primary-key conflict instead of skipping.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.conflict = if upsert {
            ConflictPolicy::Upsert
        } else {
            ConflictPolicy::DoNothing
        };
        self
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.conflict = policy;
        self
    }

    /// Validate every row and render the statement.
    pub fn build(self) -> OrmResult<InsertQuery<'a>> {
        let schema = self.schema;
        let table = schema.table_ref().clone();

        if let Some(stranger) = self.values.iter().find(|i| !i.is_of(&schema)) {
            return Err(OrmError::reference(format!(
                "cannot insert an instance of {} into {table}",
                stranger.schema().table_ref()
            )));
        }
        if self.conflict == ConflictPolicy::Upsert && !schema.has_primary_key() {
            return Err(OrmError::configuration(format!(
                "upsert into {table} needs a primary key"
            )));
        }

        let statement = if self.values.is_empty() || schema.columns().is_empty() {
            Statement::empty()
        } else {
            render_insert(&schema, self.values, self.conflict)?
        };

        Ok(InsertQuery {
            schema,
            values: self.values,
            conflict: self.conflict,
            tables: vec![table],
            statement,
        })
    }

    /// Build and execute in one step, returning the number of rows written.
    pub async fn execute(self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.build()?.execute(conn).await
    }
}

fn render_insert(
    schema: &Schema,
    values: &[Instance],
    conflict: ConflictPolicy,
) -> OrmResult<Statement> {
    let columns = schema.columns();
    let names: Vec<String> = columns.iter().map(|c| c.quoted_name()).collect();
    let mut params = Params::new();
    let mut tuples = Vec::with_capacity(values.len());

    // One statement cannot upsert the same key twice; the last instance wins.
    let superseded = match conflict {
        ConflictPolicy::Upsert => superseded_rows(schema, values),
        ConflictPolicy::DoNothing => vec![false; values.len()],
    };

    for (row, instance) in values.iter().enumerate() {
        if superseded[row] {
            continue;
        }
        let mut cells = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let value = match instance.slot(index) {
                Some(value) => value.clone(),
                None => match column.default_value() {
                    Some(default) => default,
                    None => {
                        cells.push("DEFAULT".to_string());
                        continue;
                    }
                },
            };
            match column.validate(value)? {
                Value::Random(expr) => cells.push(expr.sql().to_string()),
                value => {
                    let param = format!("{}_{}_{row}", schema.table_name(), column.name());
                    cells.push(format!(":{param}"));
                    params.insert(param, value);
                }
            }
        }
        tuples.push(format!("({})", cells.join(", ")));
    }

    let column_list = names.join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({column_list}) VALUES {}",
        schema.table_ref(),
        tuples.join(", ")
    );

    let keys: Vec<String> = schema.primary_keys().map(|c| c.quoted_name()).collect();
    match conflict {
        ConflictPolicy::DoNothing if keys.is_empty() => {
            sql.push_str(" ON CONFLICT DO NOTHING");
        }
        ConflictPolicy::DoNothing => {
            sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", keys.join(", ")));
        }
        ConflictPolicy::Upsert => {
            let updates: Vec<String> = names
                .iter()
                .map(|name| format!("{name} = EXCLUDED.{name}"))
                .collect();
            sql.push_str(&format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                keys.join(", "),
                updates.join(", ")
            ));
        }
    }

    sql.push_str(" RETURNING ");
    sql.push_str(&column_list);
    Ok(Statement::new(sql, params))
}

/// Primary-key values an instance will be written with, when they are known
/// before execution.
fn conflict_key(schema: &Schema, instance: &Instance) -> Option<Vec<Value>> {
    schema
        .primary_key_positions()
        .iter()
        .map(|&k| {
            let value = match instance.slot(k) {
                Some(value) => value.clone(),
                None => schema.columns()[k].default_value()?,
            };
            match value {
                Value::Null | Value::Random(_) => None,
                value => Some(value),
            }
        })
        .collect()
}

/// Rows whose key reappears later in the batch.
fn superseded_rows(schema: &Schema, values: &[Instance]) -> Vec<bool> {
    let keys: Vec<Option<Vec<Value>>> =
        values.iter().map(|i| conflict_key(schema, i)).collect();
    keys.iter()
        .enumerate()
        .map(|(row, key)| match key {
            Some(key) => keys[row + 1..].iter().any(|later| later.as_ref() == Some(key)),
            None => false,
        })
        .collect()
}

/// A rendered INSERT bound to the instances it writes.
#[derive(Debug)]
pub struct InsertQuery<'a> {
    schema: Arc<Schema>,
    values: &'a mut [Instance],
    conflict: ConflictPolicy,
    tables: Vec<TableRef>,
    statement: Statement,
}

impl InsertQuery<'_> {
    /// Execute, copy returned rows back into the instances, and return the
    /// number of rows written.
    pub async fn execute(&mut self, conn: &impl GenericClient) -> OrmResult<u64> {
        let records = self.query(conn).await?;
        self.back_fill(&records)?;
        Ok(records.len() as u64)
    }

    /// Copy returned rows into the input instances.
    ///
    /// With one row per instance rows are matched by order. When fewer rows
    /// come back, rows are matched by primary-key values and unmatched
    /// instances are left as they were. A skipped conflict fills only the first
    /// instance with the key; an upsert fills every instance sharing it.
    fn back_fill(&mut self, records: &[Record]) -> OrmResult<()> {
        let positions: Vec<usize> = (0..self.schema.columns().len()).collect();
        let returned = records
            .iter()
            .map(|record| Instance::from_record(&self.schema, &positions, record))
            .collect::<OrmResult<Vec<_>>>()?;

        if returned.len() == self.values.len() {
            for (target, row) in self.values.iter_mut().zip(&returned) {
                copy_slots(row, target);
            }
            return Ok(());
        }

        let keys = self.schema.primary_key_positions();
        if keys.is_empty() {
            return Ok(());
        }
        for row in &returned {
            let key: Vec<Value> = keys.iter().map(|&k| row.get_at(k)).collect();
            let mut matched = self.values.iter_mut().filter(|target| {
                keys.iter()
                    .zip(&key)
                    .all(|(&k, v)| !v.is_null() && target.slot(k) == Some(v))
            });
            match self.conflict {
                ConflictPolicy::DoNothing => {
                    if let Some(target) = matched.next() {
                        copy_slots(row, target);
                    }
                }
                ConflictPolicy::Upsert => {
                    for target in matched {
                        copy_slots(row, target);
                    }
                }
            }
        }
        Ok(())
    }
}

fn copy_slots(from: &Instance, to: &mut Instance) {
    for index in 0..from.schema().columns().len() {
        if let Some(value) = from.slot(index) {
            to.set_at(index, value.clone());
        }
    }
}

impl SqlQuery for InsertQuery<'_> {
    fn statement(&self) -> &Statement {
        &self.statement
    }

    fn tables(&self) -> &[TableRef] {
        &self.tables
    }
}
