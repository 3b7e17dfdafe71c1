//! Query builders.
//!
//! Every query is rendered exactly once, by its builder's `build()`: the
//! resulting query owns fixed SQL text (with `:name` placeholders) and a
//! parameter map, and can be executed any number of times.
//!
//! # Usage
//!
//! ```ignore
//! use pgtable::qb::{and, inner_join};
//!
//! // SELECT
//! let cheap = game
//!     .select()
//!     .join(inner_join(game.col("developer_id")?, developer.col("id")?))
//!     .filter(and([game.col("price")?.lt(10)?, developer.col("name")?.like("%Games%")?]))
//!     .order_by(game.col("price")?)
//!     .limit(20)
//!     .fetch(&db)
//!     .await?;
//!
//! // INSERT, back-filling generated ids
//! let mut rows = vec![Instance::new(&game).with("name", "Portal")?.with("price", 9.99)?];
//! game.insert(&mut rows).upsert(true).execute(&db).await?;
//!
//! // UPDATE
//! let n = game.update().set("price", 4.99).filter(game.col("id")?.eq(1)).execute(&db).await?;
//!
//! // DELETE
//! let n = game.delete().filter(game.col("price")?.gt(100)).execute(&db).await?;
//! ```

mod clause;
mod delete;
mod expr;
mod insert;
mod join;
pub(crate) mod param;
mod select;
mod traits;
mod update;

pub use clause::IntoFilter;
pub use delete::{DeleteQb, DeleteQuery};
pub use expr::{Expression, RandomExpression, and, not, or};
pub use insert::{ConflictPolicy, InsertQb, InsertQuery};
pub use join::{Join, JoinKind, full_join, inner_join, join, left_join, right_join};
pub use param::{Params, Statement};
pub use select::{SelectQb, SelectQuery};
pub use traits::{MutationQuery, SqlQuery};
pub use update::{UpdateQb, UpdateQuery};

/// Any built query.
#[derive(Debug)]
pub enum Query<'a> {
    Select(SelectQuery),
    Insert(InsertQuery<'a>),
    Update(UpdateQuery),
    Delete(DeleteQuery),
}

impl SqlQuery for Query<'_> {
    fn statement(&self) -> &Statement {
        match self {
            Query::Select(q) => q.statement(),
            Query::Insert(q) => q.statement(),
            Query::Update(q) => q.statement(),
            Query::Delete(q) => q.statement(),
        }
    }

    fn tables(&self) -> &[crate::ident::TableRef] {
        match self {
            Query::Select(q) => q.tables(),
            Query::Insert(q) => q.tables(),
            Query::Update(q) => q.tables(),
            Query::Delete(q) => q.tables(),
        }
    }
}

impl From<SelectQuery> for Query<'_> {
    fn from(q: SelectQuery) -> Self {
        Query::Select(q)
    }
}

impl<'a> From<InsertQuery<'a>> for Query<'a> {
    fn from(q: InsertQuery<'a>) -> Self {
        Query::Insert(q)
    }
}

impl From<UpdateQuery> for Query<'_> {
    fn from(q: UpdateQuery) -> Self {
        Query::Update(q)
    }
}

impl From<DeleteQuery> for Query<'_> {
    fn from(q: DeleteQuery) -> Self {
        Query::Delete(q)
    }
}

#[cfg(test)]
mod tests;
