//! SELECT queries.

use crate::client::GenericClient;
use crate::column::Column;
use crate::error::{OrmError, OrmResult};
use crate::ident::TableRef;
use crate::instance::Instance;
use crate::qb::clause::{FilterClauses, filter_clause_methods};
use crate::qb::param::{Params, Statement};
use crate::qb::traits::SqlQuery;
use crate::schema::Schema;
use std::sync::Arc;

/// SELECT builder over one primary table.
#[derive(Debug)]
pub struct SelectQb {
    schema: Arc<Schema>,
    columns: Vec<Column>,
    clauses: FilterClauses,
}

impl SelectQb {
    pub(crate) fn new(schema: &Arc<Schema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            columns: Vec::new(),
            clauses: FilterClauses::default(),
        }
    }

    /// Select only these columns of the primary table; all columns otherwise.
    pub fn columns<'c>(mut self, columns: impl IntoIterator<Item = &'c Column>) -> Self {
        self.columns.extend(columns.into_iter().cloned());
        self
    }

    pub fn column(mut self, column: &Column) -> Self {
        self.columns.push(column.clone());
        self
    }

    filter_clause_methods!();

    /// Render the statement.
    pub fn build(mut self) -> OrmResult<SelectQuery> {
        self.clauses.take_error()?;

        let positions: Vec<usize> = if self.columns.is_empty() {
            (0..self.schema.columns().len()).collect()
        } else {
            self.columns
                .iter()
                .map(|column| {
                    self.schema.position_of(column).ok_or_else(|| {
                        OrmError::reference(format!(
                            "cannot select {column}: not a column of {}",
                            self.schema.table_ref()
                        ))
                    })
                })
                .collect::<OrmResult<_>>()?
        };

        let mut tables = vec![self.schema.table_ref().clone()];
        let mut params = Params::new();
        let clauses = self.clauses.render(&mut tables, &mut params)?;

        let statement = if positions.is_empty() {
            Statement::empty()
        } else {
            let select_list: Vec<&str> = positions
                .iter()
                .map(|&i| self.schema.columns()[i].to_sql())
                .collect();
            let mut sql = format!(
                "SELECT {} FROM {}",
                select_list.join(", "),
                self.schema.table_ref()
            );
            clauses.write_all(&mut sql);
            Statement::new(sql, params)
        };

        Ok(SelectQuery {
            schema: self.schema,
            positions,
            tables,
            statement,
        })
    }

    /// Build and fetch in one step.
    pub async fn fetch(self, conn: &impl GenericClient) -> OrmResult<Vec<Instance>> {
        self.build()?.fetch(conn).await
    }
}

/// A rendered SELECT.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    schema: Arc<Schema>,
    positions: Vec<usize>,
    tables: Vec<TableRef>,
    statement: Statement,
}

impl SelectQuery {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Execute and zip each row into a fresh instance of the primary table.
    pub async fn fetch(&self, conn: &impl GenericClient) -> OrmResult<Vec<Instance>> {
        let records = self.query(conn).await?;
        records
            .iter()
            .map(|record| Instance::from_record(&self.schema, &self.positions, record))
            .collect()
    }
}

impl SqlQuery for SelectQuery {
    fn statement(&self) -> &Statement {
        &self.statement
    }

    fn tables(&self) -> &[TableRef] {
        &self.tables
    }
}
