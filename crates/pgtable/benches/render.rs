use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgtable::qb::{and, inner_join};
use pgtable::{ColumnDef, Instance, Schema, SqlQuery, SqlType};
use std::sync::Arc;

fn schemas() -> (Arc<Schema>, Arc<Schema>) {
    let developer = Schema::builder("bench", "developer")
        .column(ColumnDef::new("id", SqlType::serial()).primary_key())
        .column(ColumnDef::new("name", SqlType::varchar(64).unwrap()).not_null())
        .build()
        .unwrap();
    let game = Schema::builder("bench", "game")
        .column(ColumnDef::new("id", SqlType::serial()).primary_key())
        .column(ColumnDef::new("name", SqlType::varchar(128).unwrap()).not_null())
        .column(ColumnDef::new("price", SqlType::numeric(6, 2).unwrap()).default(0))
        .column(
            ColumnDef::new("developer_id", SqlType::integer())
                .foreign_key(developer.col("id").unwrap()),
        )
        .build()
        .unwrap();
    (developer, game)
}

fn bench_select(c: &mut Criterion) {
    let (developer, game) = schemas();
    let mut group = c.benchmark_group("render/select");

    for n in [1, 5, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let filters = (0..n).map(|i| game.col("price").unwrap().gt(i).unwrap());
                let query = game
                    .select()
                    .join(inner_join(
                        game.col("developer_id").unwrap(),
                        developer.col("id").unwrap(),
                    ))
                    .filter(and(filters))
                    .order_by(game.col("name").unwrap())
                    .limit(20)
                    .build()
                    .unwrap();
                black_box(query.to_sql().len());
            });
        });
    }

    group.finish();
}

fn bench_insert(c: &mut Criterion) {
    let (_, game) = schemas();
    let mut group = c.benchmark_group("render/insert");

    for n in [1, 10, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut rows: Vec<Instance> = (0..n)
                    .map(|i| {
                        Instance::new(&game)
                            .with("name", format!("game {i}"))
                            .unwrap()
                            .with("price", "9.99")
                            .unwrap()
                    })
                    .collect();
                let query = game.insert(&mut rows).upsert(true).build().unwrap();
                black_box(query.params().len());
            });
        });
    }

    group.finish();
}

fn bench_to_positional(c: &mut Criterion) {
    let (_, game) = schemas();
    let mut group = c.benchmark_group("render/to_positional");

    for n in [1, 10, 100] {
        let filters = (0..n).map(|i| game.col("price").unwrap().gt(i).unwrap());
        let query = game.select().filter(and(filters)).build().unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &query, |b, query| {
            b.iter(|| black_box(query.statement().to_positional().unwrap().1.len()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select, bench_insert, bench_to_positional);
criterion_main!(benches);
