//! UPDATE queries.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::ident::TableRef;
use crate::qb::clause::{FilterClauses, filter_clause_methods};
use crate::qb::param::{Params, Statement};
use crate::qb::traits::{MutationQuery, SqlQuery};
use crate::schema::Schema;
use crate::types::Value;
use std::sync::Arc;

/// UPDATE builder.
#[derive(Debug)]
pub struct UpdateQb {
    schema: Arc<Schema>,
    sets: Vec<(String, Value)>,
    clauses: FilterClauses,
}

impl UpdateQb {
    pub(crate) fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            sets: Vec::new(),
            clauses: FilterClauses::default(),
        }
    }

    /// Set `column` to `value`. Setting the same column twice keeps the last value.
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        match self.sets.iter_mut().find(|(name, _)| name == column) {
            Some(slot) => slot.1 = value,
            None => self.sets.push((column.to_string(), value)),
        }
        self
    }

    filter_clause_methods!();

    /// Validate every value and render the statement.
    pub fn build(mut self) -> OrmResult<UpdateQuery> {
        self.clauses.take_error()?;
        if self.sets.is_empty() {
            return Err(OrmError::configuration(format!(
                "UPDATE of {} sets no columns",
                self.schema.table_ref()
            )));
        }

        let mut params = Params::new();
        let mut assignments = Vec::with_capacity(self.sets.len());
        for (name, value) in self.sets {
            let column = self.schema.col(&name)?;
            let value = column.validate(value)?;
            match value {
                Value::Random(expr) => {
                    assignments.push(format!("{} = {}", column.quoted_name(), expr.sql()));
                }
                value => {
                    let param = format!("{}_{}", self.schema.table_name(), column.name());
                    assignments.push(format!("{} = :{param}", column.quoted_name()));
                    params.insert(param, value);
                }
            }
        }

        let table = self.schema.table_ref().clone();
        let mut tables = vec![table.clone()];
        let clauses = self.clauses.render(&mut tables, &mut params)?;

        let mut sql = format!("UPDATE {table} SET {}", assignments.join(", "));
        if clauses.needs_row_subquery() {
            clauses.write_row_subquery(&table, &mut sql);
        } else {
            clauses.write_filter(&mut sql);
        }
        sql.push_str(" RETURNING *");

        Ok(UpdateQuery {
            tables,
            statement: Statement::new(sql, params),
        })
    }

    /// Build and execute in one step, returning the affected row count.
    pub async fn execute(self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.build()?.execute(conn).await
    }
}

/// A rendered UPDATE.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    tables: Vec<TableRef>,
    statement: Statement,
}

impl SqlQuery for UpdateQuery {
    fn statement(&self) -> &Statement {
        &self.statement
    }

    fn tables(&self) -> &[TableRef] {
        &self.tables
    }
}

impl MutationQuery for UpdateQuery {}
