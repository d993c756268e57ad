//! Benchmarks of schema construction and access.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use trellis4rs_core::schema::prelude::{
    INTEGER, LengthTrait, RequiredTrait, STRING, SensitiveTrait,
};
use trellis4rs_core::schema::{Schema, ShapeId};
use trellis4rs_core::{lazy_schema, traits};

lazy_schema!(
    BENCH_SCHEMA,
    Schema::structure_builder(ShapeId::from("bench#Shape"), traits![])
        .put_member("a", &STRING, traits![RequiredTrait])
        .put_member("b", &INTEGER, traits![])
        .put_member(
            "c",
            &STRING,
            traits![SensitiveTrait::new(), LengthTrait::builder().max(10).build()]
        )
        .build()
);

fn build_schema(c: &mut Criterion) {
    c.bench_function("Build structure schema", |b| {
        b.iter(|| {
            let schema = Schema::structure_builder(ShapeId::from("bench#Shape"), traits![])
                .put_member("a", &STRING, traits![RequiredTrait])
                .put_member("b", &INTEGER, traits![])
                .put_member("c", &STRING, traits![])
                .build();
            black_box(schema)
        })
    });
}

fn member_access(c: &mut Criterion) {
    c.bench_function("Member lookup", |b| {
        b.iter(|| black_box(BENCH_SCHEMA.get_member("c")))
    });
}

fn trait_lookup(c: &mut Criterion) {
    let member = BENCH_SCHEMA.expect_member("c").clone();
    c.bench_function("Trait lookup", |b| {
        b.iter(|| black_box(member.contains_type::<SensitiveTrait>()))
    });
}

criterion_group!(schema, build_schema, member_access, trait_lookup);
criterion_main!(schema);
