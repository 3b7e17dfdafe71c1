//! Convenient imports for typical `pgtable` usage.
//!
//! ```ignore
//! use pgtable::prelude::*;
//! ```

pub use crate::qb::{and, full_join, inner_join, join, left_join, not, or, right_join};
pub use crate::{
    Column, ColumnDef, ConflictPolicy, ConnectConfig, Database, Expression, GenericClient,
    Instance, MutationQuery, OrmError, OrmResult, Schema, SqlQuery, SqlType, Value,
    render_table,
};
