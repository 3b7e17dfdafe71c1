//! The game-store tables.

use chrono::Utc;
use pgtable::{ColumnDef, OrmResult, Schema, SqlType, Value};
use std::sync::Arc;

pub struct Gamers {
    pub category: Arc<Schema>,
    pub developer: Arc<Schema>,
    pub game: Arc<Schema>,
    pub user: Arc<Schema>,
    pub purchase: Arc<Schema>,
    pub relations: Arc<Schema>,
}

impl Gamers {
    pub fn declare() -> OrmResult<Self> {
        let category = Schema::builder("gamers", "game_category")
            .column(ColumnDef::new("id", SqlType::small_serial()).primary_key())
            .column(ColumnDef::new("name", SqlType::varchar(64)?))
            .build()?;

        let developer = Schema::builder("gamers", "game_developer")
            .column(ColumnDef::new("id", SqlType::serial()).primary_key())
            .column(ColumnDef::new("name", SqlType::varchar(128)?))
            .build()?;

        let game = Schema::builder("gamers", "game")
            .column(ColumnDef::new("id", SqlType::serial()).primary_key())
            .column(
                ColumnDef::new("category_id", SqlType::small_int())
                    .not_null()
                    .foreign_key(category.col("id")?),
            )
            .column(
                ColumnDef::new("developer_id", SqlType::integer())
                    .not_null()
                    .foreign_key(developer.col("id")?),
            )
            .column(
                ColumnDef::new("name", SqlType::varchar(128)?)
                    .unique()
                    .not_null()
                    .default(""),
            )
            .column(ColumnDef::new("price", SqlType::numeric(6, 2)?))
            .column(ColumnDef::new("created_at", SqlType::date()))
            .build()?;

        let user = Schema::builder("gamers", "user")
            .column(ColumnDef::new("id", SqlType::serial()).primary_key())
            .column(ColumnDef::new("email", SqlType::varchar(128)?).unique().not_null())
            .column(ColumnDef::new("password_hash", SqlType::varchar(128)?).not_null())
            .column(ColumnDef::new("created_at", SqlType::timestamptz()))
            .column(ColumnDef::new("is_banned", SqlType::boolean()).default(false))
            .build()?;

        let purchase = Schema::builder("gamers", "user_purchase")
            .column(
                ColumnDef::new("user_id", SqlType::integer())
                    .primary_key()
                    .foreign_key(user.col("id")?),
            )
            .column(
                ColumnDef::new("game_id", SqlType::integer())
                    .primary_key()
                    .foreign_key(game.col("id")?),
            )
            .column(
                ColumnDef::new("created_at", SqlType::timestamptz())
                    .default_with(|| Value::from(Utc::now())),
            )
            .build()?;

        // is_friends: true for friends, false for a block
        let relations = Schema::builder("gamers", "user_relations")
            .column(
                ColumnDef::new("owner_id", SqlType::integer())
                    .primary_key()
                    .foreign_key(user.col("id")?),
            )
            .column(
                ColumnDef::new("user_id", SqlType::integer())
                    .primary_key()
                    .foreign_key(user.col("id")?),
            )
            .column(ColumnDef::new("is_friends", SqlType::boolean()).not_null())
            .build()?;

        Ok(Self {
            category,
            developer,
            game,
            user,
            purchase,
            relations,
        })
    }

    /// Tables in dependency order.
    pub fn tables(&self) -> [&Arc<Schema>; 6] {
        [
            &self.category,
            &self.developer,
            &self.game,
            &self.user,
            &self.purchase,
            &self.relations,
        ]
    }
}
