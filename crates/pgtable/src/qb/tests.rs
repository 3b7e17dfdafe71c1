//! Cross-builder tests for the qb module.

use crate::client::{GenericClient, Record};
use crate::column::ColumnDef;
use crate::error::{OrmResult, ValidationError};
use crate::instance::Instance;
use crate::qb::{
    MutationQuery, Query, SqlQuery, Statement, and, inner_join, left_join, or,
};
use crate::schema::Schema;
use crate::types::{SqlType, Value};
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Records every statement and answers with queued rows.
#[derive(Default)]
struct MockClient {
    statements: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<Vec<Record>>>,
}

impl MockClient {
    fn respond(&self, rows: Vec<Record>) {
        self.responses.lock().unwrap().push_back(rows);
    }

    fn sent(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }
}

impl GenericClient for MockClient {
    async fn query(&self, statement: &Statement) -> OrmResult<Vec<Record>> {
        statement.to_positional()?;
        self.statements.lock().unwrap().push(statement.clone());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }
}

struct Store {
    developer: Arc<Schema>,
    game: Arc<Schema>,
    tag: Arc<Schema>,
}

fn store() -> Store {
    let developer = Schema::builder("gamers", "developer")
        .column(ColumnDef::new("id", SqlType::serial()).primary_key())
        .column(ColumnDef::new("name", SqlType::varchar(64).unwrap()).not_null())
        .build()
        .unwrap();
    let game = Schema::builder("gamers", "game")
        .column(ColumnDef::new("id", SqlType::serial()).primary_key())
        .column(ColumnDef::new("name", SqlType::varchar(128).unwrap()).not_null())
        .column(ColumnDef::new("price", SqlType::numeric(6, 2).unwrap()).not_null())
        .column(
            ColumnDef::new("developer_id", SqlType::integer())
                .foreign_key(developer.col("id").unwrap()),
        )
        .column(ColumnDef::new("released", SqlType::date()))
        .build()
        .unwrap();
    let tag = Schema::builder("gamers", "tag")
        .column(ColumnDef::new("label", SqlType::text()).not_null())
        .build()
        .unwrap();
    Store {
        developer,
        game,
        tag,
    }
}

fn only_param(statement: &Statement) -> (&String, &Value) {
    assert_eq!(statement.params().len(), 1);
    statement.params().iter().next().unwrap()
}

// ===== SELECT =====

#[test]
fn test_select_all_columns() {
    let s = store();
    let q = s.developer.select().build().unwrap();
    assert_eq!(
        q.to_sql(),
        r#"SELECT "gamers"."developer"."id", "gamers"."developer"."name" FROM "gamers"."developer""#
    );
    assert!(q.params().is_empty());
    assert_eq!(q.tables(), [s.developer.table_ref().clone()]);
}

#[test]
fn test_select_full_clause_order() {
    let s = store();
    let q = s
        .game
        .select()
        .column(s.game.col("name").unwrap())
        .join(inner_join(
            s.game.col("developer_id").unwrap(),
            s.developer.col("id").unwrap(),
        ))
        .filter(s.developer.col("name").unwrap().like("%Valve%"))
        .order_by(s.developer.col("name").unwrap())
        .ascending(false)
        .limit(10)
        .offset(20)
        .build()
        .unwrap();

    let (param, value) = only_param(q.statement());
    assert!(param.starts_with("developer_name_like_"));
    assert_eq!(value, &Value::from("%Valve%"));
    assert_eq!(
        q.to_sql(),
        format!(
            r#"SELECT "gamers"."game"."name" FROM "gamers"."game" INNER JOIN "gamers"."developer" ON "gamers"."game"."developer_id" = "gamers"."developer"."id" WHERE "gamers"."developer"."name" LIKE :{param} ORDER BY "gamers"."developer"."name" DESC LIMIT 10 OFFSET 20"#
        )
    );
    assert_eq!(q.tables().len(), 2);
}

#[test]
fn test_select_filters_are_anded() {
    let s = store();
    let price = s.game.col("price").unwrap();
    let q = s
        .game
        .select()
        .filter(price.gt(5))
        .filter(or([price.lt(1).unwrap(), s.game.col("released").unwrap().is_null()]))
        .build()
        .unwrap();
    assert_eq!(q.params().len(), 2);
    let sql = q.to_sql();
    let where_clause = &sql[sql.find(" WHERE ").unwrap()..];
    assert!(where_clause.contains(r#""gamers"."game"."price" > :game_price_gt_"#));
    assert!(where_clause.contains(" AND ("));
    assert!(where_clause.contains(r#" OR "gamers"."game"."released" IS NULL)"#));
}

#[test]
fn test_select_order_by_out_of_scope() {
    let s = store();
    let err = s
        .game
        .select()
        .order_by(s.developer.col("name").unwrap())
        .build()
        .unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn test_select_foreign_column_rejected() {
    let s = store();
    let err = s
        .game
        .select()
        .column(s.developer.col("name").unwrap())
        .build()
        .unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn test_select_limit_bounds() {
    let s = store();
    let q = s.developer.select().limit(0).build().unwrap();
    assert!(q.to_sql().ends_with(" LIMIT 0"));

    assert!(s.developer.select().limit(-1).build().unwrap_err().is_configuration());
    assert!(s.developer.select().offset(-5).build().unwrap_err().is_configuration());
}

#[test]
fn test_select_unresolvable_join() {
    let s = store();
    let err = s
        .tag
        .select()
        .join(left_join(
            s.game.col("developer_id").unwrap(),
            s.developer.col("id").unwrap(),
        ))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_select_deferred_filter_error() {
    let s = store();
    let err = s
        .game
        .select()
        .filter(s.game.col("price").unwrap().like("1%"))
        .build()
        .unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_select_fetch_hydrates_instances() {
    let s = store();
    let db = MockClient::default();
    db.respond(vec![
        Record::new(vec![Value::Integer(1), Value::from("Valve")]),
        Record::new(vec![Value::Integer(2), Value::from("id Software")]),
    ]);

    let rows = s.developer.select().fetch(&db).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("name").unwrap(), Value::from("id Software"));
    assert_eq!(db.sent().len(), 1);
}

// ===== INSERT =====

fn portal(game: &Arc<Schema>) -> Instance {
    Instance::new(game)
        .with("name", "Portal")
        .unwrap()
        .with("price", 9.99)
        .unwrap()
}

#[test]
fn test_insert_render() {
    let s = store();
    let mut rows = vec![portal(&s.game)];
    let q = s.game.insert(&mut rows).build().unwrap();
    assert_eq!(
        q.to_sql(),
        r#"INSERT INTO "gamers"."game" ("id", "name", "price", "developer_id", "released") VALUES (DEFAULT, :game_name_0, :game_price_0, DEFAULT, DEFAULT) ON CONFLICT ("id") DO NOTHING RETURNING "id", "name", "price", "developer_id", "released""#
    );
    assert_eq!(q.params()["game_name_0"], Value::from("Portal"));
    assert_eq!(q.params()["game_price_0"], Value::Numeric(Decimal::new(999, 2)));
}

#[test]
fn test_insert_upsert() {
    let s = store();
    let mut rows = vec![Instance::new(&s.developer)
        .with("id", 1)
        .unwrap()
        .with("name", "Valve")
        .unwrap()];
    let q = s.developer.insert(&mut rows).upsert(true).build().unwrap();
    assert_eq!(
        q.to_sql(),
        r#"INSERT INTO "gamers"."developer" ("id", "name") VALUES (:developer_id_0, :developer_name_0) ON CONFLICT ("id") DO UPDATE SET "id" = EXCLUDED."id", "name" = EXCLUDED."name" RETURNING "id", "name""#
    );
}

#[test]
fn test_insert_without_primary_key() {
    let s = store();
    let mut rows = vec![Instance::new(&s.tag).with("label", "co-op").unwrap()];
    let q = s.tag.insert(&mut rows).build().unwrap();
    assert!(q.to_sql().contains(" ON CONFLICT DO NOTHING RETURNING "));

    let mut rows = vec![Instance::new(&s.tag).with("label", "co-op").unwrap()];
    let err = s.tag.insert(&mut rows).upsert(true).build().unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_insert_validates_rows() {
    let s = store();
    // Unset NOT NULL columns are left to the server default.
    let mut rows = vec![Instance::new(&s.game).with("price", 1).unwrap()];
    let q = s.game.insert(&mut rows).build().unwrap();
    assert!(q.to_sql().contains("VALUES (DEFAULT, DEFAULT, :game_price_0, DEFAULT, DEFAULT)"));

    let mut rows = vec![portal(&s.game).with("name", Value::Null).unwrap()];
    let err = s.game.insert(&mut rows).build().unwrap_err();
    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::NotNull { column }) if column == "name"
    ));
}

#[test]
fn test_insert_rejects_foreign_instances() {
    let s = store();
    let mut rows = vec![portal(&s.game), Instance::new(&s.developer)];
    let err = s.game.insert(&mut rows).build().unwrap_err();
    assert!(err.is_reference());
}

#[test]
fn test_insert_random_values_are_spliced() {
    let s = store();
    let mut row = Instance::new(&s.developer);
    row.set("name", s.developer.col("name").unwrap().random().unwrap())
        .unwrap();
    let mut rows = vec![row];
    let q = s.developer.insert(&mut rows).build().unwrap();
    assert!(q
        .to_sql()
        .contains("VALUES (DEFAULT, SUBSTRING(MD5(CAST(RANDOM() AS TEXT)) FROM 1 FOR 64))"));
    assert!(q.params().is_empty());
}

#[tokio::test]
async fn test_insert_empty_is_noop() {
    let s = store();
    let db = MockClient::default();
    let mut rows: Vec<Instance> = Vec::new();
    let n = s.game.insert(&mut rows).execute(&db).await.unwrap();
    assert_eq!(n, 0);
    assert!(db.sent().is_empty());
}

#[tokio::test]
async fn test_insert_back_fill_by_order() {
    let s = store();
    let db = MockClient::default();
    db.respond(vec![
        Record::new(vec![Value::Integer(7), Value::from("Valve")]),
        Record::new(vec![Value::Integer(8), Value::from("Bethesda")]),
    ]);

    let mut rows = vec![
        Instance::new(&s.developer).with("name", "Valve").unwrap(),
        Instance::new(&s.developer).with("name", "Bethesda").unwrap(),
    ];
    let n = s.developer.insert(&mut rows).execute(&db).await.unwrap();
    assert_eq!(n, 2);
    assert_eq!(rows[0].get("id").unwrap(), Value::Integer(7));
    assert_eq!(rows[1].get("id").unwrap(), Value::Integer(8));
}

#[tokio::test]
async fn test_insert_back_fill_by_primary_key() {
    let s = store();
    let db = MockClient::default();
    // The first row conflicted and was skipped.
    db.respond(vec![Record::new(vec![
        Value::Integer(2),
        Value::from("Bethesda Softworks"),
    ])]);

    let mut rows = vec![
        Instance::new(&s.developer)
            .with("id", 1)
            .unwrap()
            .with("name", "Valve")
            .unwrap(),
        Instance::new(&s.developer)
            .with("id", 2)
            .unwrap()
            .with("name", "Bethesda")
            .unwrap(),
    ];
    let n = s.developer.insert(&mut rows).execute(&db).await.unwrap();
    assert_eq!(n, 1);
    assert_eq!(rows[0].get("name").unwrap(), Value::from("Valve"));
    assert_eq!(rows[1].get("name").unwrap(), Value::from("Bethesda Softworks"));
}

#[test]
fn test_insert_rejects_same_table_with_other_columns() {
    let narrow = Schema::builder("public", "t")
        .column(ColumnDef::new("a", SqlType::integer()))
        .build()
        .unwrap();
    let wide = Schema::builder("public", "t")
        .column(ColumnDef::new("a", SqlType::integer()))
        .column(ColumnDef::new("b", SqlType::integer()))
        .build()
        .unwrap();
    let mut rows = vec![Instance::new(&narrow).with("a", 1).unwrap()];
    let err = wide.insert(&mut rows).build().unwrap_err();
    assert!(err.is_reference());
}

fn developer(s: &Store, id: i32, name: &str) -> Instance {
    Instance::new(&s.developer)
        .with("id", id)
        .unwrap()
        .with("name", name)
        .unwrap()
}

#[test]
fn test_insert_upsert_collapses_repeated_keys() {
    let s = store();
    let mut rows = vec![
        developer(&s, 1, "first"),
        developer(&s, 2, "other"),
        developer(&s, 1, "second"),
    ];
    let q = s.developer.insert(&mut rows).upsert(true).build().unwrap();
    assert!(q.to_sql().contains(
        "VALUES (:developer_id_1, :developer_name_1), (:developer_id_2, :developer_name_2) ON CONFLICT"
    ));
    assert_eq!(q.params()["developer_name_2"], Value::from("second"));
    assert!(!q.params().contains_key("developer_name_0"));

    // Without upsert every row is sent and the server skips the repeat.
    let mut rows = vec![developer(&s, 1, "first"), developer(&s, 1, "second")];
    let q = s.developer.insert(&mut rows).build().unwrap();
    assert!(q.params().contains_key("developer_name_0"));
    assert!(q.params().contains_key("developer_name_1"));
}

#[tokio::test]
async fn test_insert_upsert_back_fills_every_instance_of_a_key() {
    let s = store();
    let db = MockClient::default();
    db.respond(vec![Record::new(vec![Value::Integer(1), Value::from("second")])]);

    let mut rows = vec![developer(&s, 1, "first"), developer(&s, 1, "second")];
    let n = s.developer.insert(&mut rows).upsert(true).execute(&db).await.unwrap();
    assert_eq!(n, 1);
    assert_eq!(rows[0].get("name").unwrap(), Value::from("second"));
    assert_eq!(rows[1].get("name").unwrap(), Value::from("second"));
}

#[tokio::test]
async fn test_insert_skipped_repeat_keeps_its_fields() {
    let s = store();
    let db = MockClient::default();
    db.respond(vec![Record::new(vec![Value::Integer(1), Value::from("first")])]);

    let mut rows = vec![developer(&s, 1, "first"), developer(&s, 1, "second")];
    let n = s.developer.insert(&mut rows).execute(&db).await.unwrap();
    assert_eq!(n, 1);
    assert_eq!(rows[0].get("name").unwrap(), Value::from("first"));
    assert_eq!(rows[1].get("name").unwrap(), Value::from("second"));
}

// ===== UPDATE =====

#[test]
fn test_update_render() {
    let s = store();
    let q = s
        .game
        .update()
        .set("price", "4.999")
        .set("name", "Portal 2")
        .filter(s.game.col("id").unwrap().eq(3))
        .build()
        .unwrap();
    let filter_param = q
        .params()
        .keys()
        .find(|k| k.starts_with("game_id_eq_"))
        .unwrap()
        .clone();
    assert_eq!(
        q.to_sql(),
        format!(
            r#"UPDATE "gamers"."game" SET "price" = :game_price, "name" = :game_name WHERE "gamers"."game"."id" = :{filter_param} RETURNING *"#
        )
    );
    assert_eq!(q.params()["game_price"], Value::Numeric(Decimal::new(500, 2)));
}

#[test]
fn test_update_errors() {
    let s = store();
    assert!(s.game.update().build().unwrap_err().is_configuration());
    assert!(s
        .game
        .update()
        .set("rating", 5)
        .build()
        .unwrap_err()
        .is_reference());
    assert!(s
        .game
        .update()
        .set("price", 1_000_000)
        .build()
        .unwrap_err()
        .is_validation());
    assert!(s
        .game
        .update()
        .set("name", Value::Null)
        .build()
        .unwrap_err()
        .is_validation());
}

#[test]
fn test_update_with_limit_uses_row_subquery() {
    let s = store();
    let q = s
        .game
        .update()
        .set("price", 0)
        .order_by(s.game.col("price").unwrap())
        .limit(5)
        .build()
        .unwrap();
    assert_eq!(
        q.to_sql(),
        r#"UPDATE "gamers"."game" SET "price" = :game_price WHERE ctid IN (SELECT "gamers"."game".ctid FROM "gamers"."game" ORDER BY "gamers"."game"."price" ASC LIMIT 5) RETURNING *"#
    );
}

#[tokio::test]
async fn test_update_counts_returned_rows() {
    let s = store();
    let db = MockClient::default();
    db.respond(vec![Record::default(), Record::default(), Record::default()]);
    let n = s
        .game
        .update()
        .set("released", "2011-04-19")
        .filter(s.game.col("name").unwrap().like("Portal%"))
        .execute(&db)
        .await
        .unwrap();
    assert_eq!(n, 3);

    let sent = db.sent();
    let (sql, values) = sent[0].to_positional().unwrap();
    assert!(sql.contains(r#"SET "released" = $1"#));
    assert_eq!(values.len(), 2);
}

// ===== DELETE =====

#[test]
fn test_delete_render() {
    let s = store();
    let q = s
        .developer
        .delete()
        .filter(s.developer.col("name").unwrap().eq("Valve"))
        .build()
        .unwrap();
    let (param, _) = only_param(q.statement());
    assert_eq!(
        q.to_sql(),
        format!(
            r#"DELETE FROM "gamers"."developer" WHERE "gamers"."developer"."name" = :{param} RETURNING *"#
        )
    );
}

#[test]
fn test_delete_without_filters() {
    let s = store();
    let q = s.developer.delete().build().unwrap();
    assert_eq!(q.to_sql(), r#"DELETE FROM "gamers"."developer" RETURNING *"#);
}

#[test]
fn test_delete_with_join_uses_row_subquery() {
    let s = store();
    let q = s
        .game
        .delete()
        .join(inner_join(
            s.game.col("developer_id").unwrap(),
            s.developer.col("id").unwrap(),
        ))
        .filter(s.developer.col("name").unwrap().eq("Defunct"))
        .build()
        .unwrap();
    let sql = q.to_sql();
    assert!(sql.starts_with(
        r#"DELETE FROM "gamers"."game" WHERE ctid IN (SELECT "gamers"."game".ctid FROM "gamers"."game" INNER JOIN "gamers"."developer" ON "#
    ));
    assert!(sql.ends_with(") RETURNING *"));
}

#[tokio::test]
async fn test_delete_counts_returned_rows() {
    let s = store();
    let db = MockClient::default();
    db.respond(vec![Record::default()]);
    let q = s
        .game
        .delete()
        .filter(s.game.col("id").unwrap().eq(1))
        .build()
        .unwrap();
    assert_eq!(q.execute(&db).await.unwrap(), 1);
    assert_eq!(q.execute(&db).await.unwrap(), 0);
    assert_eq!(db.sent()[0], db.sent()[1]);
}

// ===== Query =====

#[test]
fn test_query_union_delegates() {
    let s = store();
    let select: Query = s.developer.select().build().unwrap().into();
    let delete: Query = s.developer.delete().build().unwrap().into();
    assert!(select.to_sql().starts_with("SELECT "));
    assert!(delete.to_sql().starts_with("DELETE "));
    assert!(!select.is_noop());
}

#[test]
fn test_combined_filters_keep_all_params() {
    let s = store();
    let price = s.game.col("price").unwrap();
    let q = s
        .game
        .select()
        .filter(and([price.ge(1).unwrap(), price.le(60).unwrap()]))
        .build()
        .unwrap();
    assert_eq!(q.params().len(), 2);
    let (sql, values) = q.statement().to_positional().unwrap();
    assert!(sql.contains(" >= $1 AND "));
    assert!(sql.contains(" <= $2)"));
    assert_eq!(values.len(), 2);
}

#[tokio::test]
async fn test_schema_random_inserts_generated_rows() {
    let s = store();
    let db = MockClient::default();
    let rows = s.game.random(&db, 2).await.unwrap();
    assert_eq!(rows.len(), 2);

    let sent = db.sent();
    assert_eq!(sent.len(), 1);
    let sql = sent[0].sql();
    assert!(sql.contains("VALUES (DEFAULT, SUBSTRING("));
    assert!(sql.contains(
        r#"(SELECT "gamers"."developer"."id" FROM "gamers"."developer" ORDER BY RANDOM() LIMIT 1)"#
    ));
    assert!(sent[0].params().is_empty());
}
