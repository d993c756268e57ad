//! Benchmarks of streaming validation.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use trellis4rs_core::schema::prelude::{
    INTEGER, LengthTrait, RangeTrait, RequiredTrait, STRING, UniqueItemsTrait,
};
use trellis4rs_core::schema::{Schema, SchemaRef, ShapeId};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::serde::validation::Validator;
use trellis4rs_core::{BigDecimal, lazy_member_schema, lazy_schema, traits};

lazy_schema!(
    VALIDATED_SCHEMA,
    Schema::structure_builder(ShapeId::from("bench#Validated"), traits![])
        .put_member(
            "string",
            &STRING,
            traits![LengthTrait::builder().min(1).max(100).build()]
        )
        .put_member(
            "required_int",
            &INTEGER,
            traits![
                RequiredTrait,
                RangeTrait::builder().max(BigDecimal::from(100)).build()
            ]
        )
        .put_member("integer", &INTEGER, traits![])
        .build()
);
lazy_member_schema!(VALIDATED_STRING, VALIDATED_SCHEMA, "string");
lazy_member_schema!(VALIDATED_REQUIRED_INT, VALIDATED_SCHEMA, "required_int");
lazy_member_schema!(VALIDATED_INTEGER, VALIDATED_SCHEMA, "integer");

#[derive(Clone)]
struct ValidatedStruct {
    string: String,
    required_int: i32,
    integer: Option<i32>,
}

impl SerializeWithSchema for ValidatedStruct {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 3)?;
        ser.serialize_member(&VALIDATED_STRING, &self.string)?;
        ser.serialize_member(&VALIDATED_REQUIRED_INT, &self.required_int)?;
        ser.serialize_optional_member(&VALIDATED_INTEGER, &self.integer)?;
        ser.end(schema)
    }
}

lazy_schema!(
    UNVALIDATED_SCHEMA,
    Schema::structure_builder(ShapeId::from("bench#Unvalidated"), traits![])
        .put_member("string", &STRING, traits![])
        .put_member("required_int", &INTEGER, traits![])
        .put_member("integer", &INTEGER, traits![])
        .build()
);

lazy_schema!(
    SET_SCHEMA,
    Schema::list_builder(ShapeId::from("bench#Set"), traits![UniqueItemsTrait::new()])
        .put_member("member", &STRING, traits![])
        .build()
);
lazy_schema!(
    LIST_SCHEMA,
    Schema::list_builder(ShapeId::from("bench#List"), traits![])
        .put_member("member", &STRING, traits![])
        .build()
);

fn shape() -> ValidatedStruct {
    ValidatedStruct {
        string: "string".to_string(),
        required_int: 1,
        integer: None,
    }
}

fn validate_shape(c: &mut Criterion) {
    let validator = Validator::new();
    let value = shape();
    c.bench_function("Validate shape", |b| {
        b.iter(|| black_box(validator.validate(&VALIDATED_SCHEMA, &value)))
    });
}

fn unvalidated_shape(c: &mut Criterion) {
    let validator = Validator::new();
    let value = shape();
    c.bench_function("Shape with no constraints", |b| {
        b.iter(|| black_box(validator.validate(&UNVALIDATED_SCHEMA, &value)))
    });
}

fn validate_list(c: &mut Criterion) {
    let validator = Validator::new();
    let value: Vec<String> = (0..32).map(|i| format!("item-{i}")).collect();
    c.bench_function("List of strings", |b| {
        b.iter(|| black_box(validator.validate(&LIST_SCHEMA, &value)))
    });
}

fn validate_set(c: &mut Criterion) {
    let validator = Validator::new();
    let value: Vec<String> = (0..32).map(|i| format!("item-{i}")).collect();
    c.bench_function("Set of strings", |b| {
        b.iter(|| black_box(validator.validate(&SET_SCHEMA, &value)))
    });
}

criterion_group!(basic, validate_shape, unvalidated_shape);
criterion_group!(collections, validate_list, validate_set);
criterion_main!(basic, collections);
