//! Column types and cell values.
//!
//! [`SqlType`] describes a PostgreSQL column type together with its conversion,
//! range and randomization rules; [`Value`] is the dynamic value stored in an
//! instance and bound to statements.

mod sql_type;
mod value;

pub use sql_type::{SqlType, TypeKind};
pub use value::Value;
