//! Benchmarks of document conversion.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use trellis4rs_core::IndexMap;
use trellis4rs_core::schema::{Document, DocumentEquality};

fn scalar_documents(c: &mut Criterion) {
    c.bench_function("Wrap scalar", |b| {
        b.iter(|| black_box(Document::of(42i32)))
    });
}

fn aggregate_documents(c: &mut Criterion) {
    let values: Vec<&str> = (0..16).map(|_| "value").collect();
    c.bench_function("Wrap list", |b| {
        b.iter(|| black_box(Document::of(values.clone())))
    });

    let mut map: IndexMap<String, i32> = IndexMap::new();
    for i in 0..16 {
        map.insert(format!("key-{i}"), i);
    }
    c.bench_function("Wrap map", |b| {
        b.iter(|| black_box(Document::of(map.clone())))
    });
}

fn document_equality(c: &mut Criterion) {
    let left = Document::of(vec![1i32, 2, 3, 4]);
    let right = Document::of(vec![1i64, 2, 3, 4]);
    c.bench_function("Promoted equality", |b| {
        b.iter(|| black_box(left.eq_with_flags(&right, DocumentEquality::NUMERIC_PROMOTION)))
    });
}

criterion_group!(documents, scalar_documents, aggregate_documents, document_equality);
criterion_main!(documents);
