//! DELETE queries.

use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::ident::TableRef;
use crate::qb::clause::{FilterClauses, filter_clause_methods};
use crate::qb::param::{Params, Statement};
use crate::qb::traits::{MutationQuery, SqlQuery};
use crate::schema::Schema;
use std::sync::Arc;

/// DELETE builder.
///
/// A DELETE without filters removes every row of the table; it is logged at
/// `WARN` when built.
#[derive(Debug)]
pub struct DeleteQb {
    schema: Arc<Schema>,
    clauses: FilterClauses,
}

impl DeleteQb {
    pub(crate) fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            clauses: FilterClauses::default(),
        }
    }

    filter_clause_methods!();

    /// Render the statement.
    pub fn build(mut self) -> OrmResult<DeleteQuery> {
        self.clauses.take_error()?;

        let table = self.schema.table_ref().clone();
        let mut tables = vec![table.clone()];
        let mut params = Params::new();
        let clauses = self.clauses.render(&mut tables, &mut params)?;

        if !self.clauses.has_filters() {
            tracing::warn!(table = %table, "DELETE without filters affects every row");
        }

        let mut sql = format!("DELETE FROM {table}");
        if clauses.needs_row_subquery() {
            clauses.write_row_subquery(&table, &mut sql);
        } else {
            clauses.write_filter(&mut sql);
        }
        sql.push_str(" RETURNING *");

        Ok(DeleteQuery {
            tables,
            statement: Statement::new(sql, params),
        })
    }

    /// Build and execute in one step, returning the affected row count.
    pub async fn execute(self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.build()?.execute(conn).await
    }
}

/// A rendered DELETE.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    tables: Vec<TableRef>,
    statement: Statement,
}

impl SqlQuery for DeleteQuery {
    fn statement(&self) -> &Statement {
        &self.statement
    }

    fn tables(&self) -> &[TableRef] {
        &self.tables
    }
}

impl MutationQuery for DeleteQuery {}
