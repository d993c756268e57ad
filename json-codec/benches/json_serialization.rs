//! Benchmarks of JSON serialization and deserialization.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use trellis4rs_json_codec::{from_str, to_string};
use trellis4rs_test_utils::shapes::{PERSON_SCHEMA, Person};

fn person() -> Person {
    Person {
        name: "Ada".to_string(),
        age: 36,
        email: Some("ada@example.com".to_string()),
    }
}

fn serialize_person(c: &mut Criterion) {
    let value = person();
    c.bench_function("Serialize person", |b| {
        b.iter(|| black_box(to_string(&PERSON_SCHEMA, &value)))
    });
}

fn deserialize_person(c: &mut Criterion) {
    let json = to_string(&PERSON_SCHEMA, &person()).unwrap();
    c.bench_function("Deserialize person", |b| {
        b.iter(|| black_box(from_str::<Person>(&PERSON_SCHEMA, &json)))
    });
}

criterion_group!(json, serialize_person, deserialize_person);
criterion_main!(json);
