use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use modelspec::{ClassId, EntityStore, PropertyOptions, PropertyType};
use modelspec_mapper::{DeserializeOptions, Instance, JsonMapper, Value};
use serde_json::{json, Value as JsonValue};
use std::hint::black_box;
use std::sync::Arc;

fn order_mapper() -> (JsonMapper, ClassId) {
    let mut store = EntityStore::new();
    let line = store
        .define("Line")
        .property("sku", PropertyOptions::new().string().required().pattern("^[A-Z]{3}-[0-9]+$"))
        .property("quantity", PropertyOptions::new().integer().minimum(1.0))
        .property("price", PropertyOptions::new().number().minimum(0.0))
        .build()
        .unwrap();
    let order = store
        .define("Order")
        .property("id", PropertyOptions::new().string().required())
        .property("placedAt", PropertyOptions::new().date().alias("placed_at"))
        .property("lines", PropertyOptions::new().array_of(PropertyType::Model(line)).min_items(1))
        .build()
        .unwrap();
    (JsonMapper::new(Arc::new(store)), order)
}

fn order_json(lines: usize) -> JsonValue {
    let lines: Vec<JsonValue> = (0..lines)
        .map(|i| json!({"sku": format!("ABC-{i}"), "quantity": i + 1, "price": 9.5}))
        .collect();
    json!({"id": "o-1", "placed_at": "2020-01-01T00:00:00.000Z", "lines": lines})
}

fn bench_deserialize(c: &mut Criterion) {
    let (mapper, order) = order_mapper();
    let mut group = c.benchmark_group("deserialize");

    for lines in [1usize, 10, 100] {
        let input = order_json(lines);
        group.bench_with_input(BenchmarkId::new("plain", lines), &input, |b, input| {
            b.iter(|| {
                mapper
                    .deserialize(black_box(input), order, &DeserializeOptions::new())
                    .unwrap()
            });
        });
        let validating = DeserializeOptions::new().with_validate(true);
        group.bench_with_input(BenchmarkId::new("validated", lines), &input, |b, input| {
            b.iter(|| mapper.deserialize(black_box(input), order, &validating).unwrap());
        });
    }

    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let (mapper, order) = order_mapper();
    let value: Value = mapper
        .deserialize(&order_json(100), order, &DeserializeOptions::new())
        .unwrap();
    let empty = Value::Object(Instance::new(order));

    c.bench_function("serialize_order_100", |b| {
        b.iter(|| mapper.serialize(black_box(&value), order).unwrap());
    });
    c.bench_function("serialize_empty", |b| {
        b.iter(|| mapper.serialize(black_box(&empty), order).unwrap());
    });
}

criterion_group!(benches, bench_deserialize, bench_serialize);
criterion_main!(benches);
