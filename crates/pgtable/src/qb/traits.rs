//! Trait definitions for built queries.

use crate::client::{GenericClient, Record};
use crate::error::OrmResult;
use crate::ident::TableRef;
use crate::qb::param::{Params, Statement};

/// A rendered query.
///
/// Text and parameters are fixed when the query is built; these methods only
/// read them.
pub trait SqlQuery: Sync {
    /// The rendered statement.
    fn statement(&self) -> &Statement;

    /// Tables in scope, primary table first.
    fn tables(&self) -> &[TableRef];

    /// The SQL text with named placeholders.
    fn to_sql(&self) -> &str {
        self.statement().sql()
    }

    fn params(&self) -> &Params {
        self.statement().params()
    }

    /// Whether executing would send nothing.
    fn is_noop(&self) -> bool {
        self.statement().is_empty()
    }

    /// Execute and return the raw rows.
    fn query(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<Vec<Record>>> + Send {
        async move {
            if self.is_noop() {
                return Ok(Vec::new());
            }
            conn.query(self.statement()).await
        }
    }
}

/// Queries that change rows (UPDATE/DELETE).
pub trait MutationQuery: SqlQuery {
    /// Execute and return the affected row count, counted from `RETURNING`.
    fn execute(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        async move {
            let rows = self.query(conn).await?;
            Ok(rows.len() as u64)
        }
    }
}
