//! # pgtable
//!
//! Typed table declarations and a render-once query builder for PostgreSQL.
//!
//! ## Features
//!
//! - **Typed columns**: each column carries a [`SqlType`] with conversion, range
//!   validation and a server-side random value generator
//! - **Explicit schemas**: tables are declared with [`Schema::builder`] and shared as `Arc<Schema>`
//! - **Render once**: builders validate everything and render SQL exactly once in `build()`
//! - **Named parameters**: fragments bind values as `:name`; combining filters never renumbers
//! - **Back-fill**: INSERT copies generated ids and defaults back into the input instances
//!
//! ## Declaring tables
//!
//! ```ignore
//! use pgtable::prelude::*;
//!
//! let developer = Schema::builder("gamers", "game_developer")
//!     .column(ColumnDef::new("id", SqlType::serial()).primary_key())
//!     .column(ColumnDef::new("name", SqlType::varchar(128)?).unique().not_null())
//!     .build()?;
//!
//! let game = Schema::builder("gamers", "game")
//!     .column(ColumnDef::new("id", SqlType::serial()).primary_key())
//!     .column(ColumnDef::new("name", SqlType::varchar(128)?).not_null())
//!     .column(ColumnDef::new("price", SqlType::numeric(6, 2)?).not_null().default(0))
//!     .column(ColumnDef::new("developer_id", SqlType::integer()).foreign_key(developer.col("id")?))
//!     .build()?;
//! ```
//!
//! ## Querying
//!
//! ```ignore
//! let db = Database::connect(&ConnectConfig::from_env()?).await?;
//!
//! let mut rows = vec![Instance::new(&game).with("name", "Portal")?.with("price", "9.99")?];
//! game.insert(&mut rows).execute(&db).await?;
//! println!("new id: {}", rows[0].get("id")?);
//!
//! let cheap = game
//!     .select()
//!     .join(inner_join(game.col("developer_id")?, developer.col("id")?))
//!     .filter(game.col("price")?.lt(10))
//!     .order_by(game.col("price")?)
//!     .fetch(&db)
//!     .await?;
//! println!("{}", render_table(&game, &cheap)?);
//! ```

pub mod client;
pub mod column;
pub mod config;
pub mod database;
pub mod display;
pub mod error;
pub mod ident;
pub mod instance;
pub mod prelude;
pub mod qb;
pub mod schema;
pub mod types;

pub use client::{GenericClient, Record};
pub use column::{Column, ColumnDef, ColumnDefault, IntoOperand, Operand};
pub use config::ConnectConfig;
pub use database::Database;
pub use display::render_table;
pub use error::{OrmError, OrmResult, ValidationError};
pub use ident::{Ident, TableRef};
pub use instance::Instance;
pub use qb::{
    ConflictPolicy, Expression, MutationQuery, Query, RandomExpression, SqlQuery, Statement,
};
pub use schema::{Schema, SchemaBuilder};
pub use types::{SqlType, TypeKind, Value};
