use trellis4rs_core::schema::prelude::{BLOB, DOUBLE, FLOAT, JsonNameTrait, STRING, TIMESTAMP};
use trellis4rs_core::schema::{Schema, SchemaRef, ShapeId};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::{ByteBuffer, Instant, lazy_member_schema, lazy_schema, traits};
use trellis4rs_json_codec::to_string;
use trellis4rs_test_utils::shapes::{PERSON_SCHEMA, Person};

#[test]
fn serializes_structs_in_member_order() {
    let person = Person {
        name: "Ada".to_string(),
        age: 36,
        email: Some("ada@example.com".to_string()),
    };
    let json = to_string(&PERSON_SCHEMA, &person).unwrap();
    assert_eq!(
        json,
        r#"{"name":"Ada","age":36,"email":"ada@example.com"}"#
    );
}

#[test]
fn omits_absent_optional_members() {
    let person = Person {
        name: "Ada".to_string(),
        age: 36,
        email: None,
    };
    let json = to_string(&PERSON_SCHEMA, &person).unwrap();
    assert_eq!(json, r#"{"name":"Ada","age":36}"#);
}

#[test]
fn escapes_strings() {
    let json = to_string(&STRING, "a\"b\\c\nd").unwrap();
    assert_eq!(json, r#""a\"b\\c\nd""#);
}

#[test]
fn blobs_encode_as_base64() {
    let blob = ByteBuffer::from_bytes(b"abc");
    let json = to_string(&BLOB, &blob).unwrap();
    assert_eq!(json, r#""YWJj""#);
}

#[test]
fn non_finite_floats_serialize_as_strings() {
    assert_eq!(to_string(&DOUBLE, &f64::NAN).unwrap(), r#""NaN""#);
    assert_eq!(to_string(&DOUBLE, &f64::INFINITY).unwrap(), r#""Infinity""#);
    assert_eq!(
        to_string(&DOUBLE, &f64::NEG_INFINITY).unwrap(),
        r#""-Infinity""#
    );
    assert_eq!(to_string(&FLOAT, &f32::NAN).unwrap(), r#""NaN""#);
}

#[test]
fn whole_floats_serialize_without_fraction() {
    assert_eq!(to_string(&DOUBLE, &1.0f64).unwrap(), "1");
    assert_eq!(to_string(&DOUBLE, &-2.0f64).unwrap(), "-2");
    assert_eq!(to_string(&DOUBLE, &1.5f64).unwrap(), "1.5");
}

#[test]
fn timestamps_serialize_as_epoch_seconds() {
    let instant = Instant::from_epoch_milliseconds(1_700_000_000_000).unwrap();
    assert_eq!(to_string(&TIMESTAMP, &instant).unwrap(), "1700000000");
    let fractional = Instant::from_epoch_milliseconds(1_500).unwrap();
    assert_eq!(to_string(&TIMESTAMP, &fractional).unwrap(), "1.5");
}

lazy_schema!(
    RENAMED_SCHEMA,
    Schema::structure_builder(ShapeId::from("test#Renamed"), traits![])
        .put_member("snake_name", &STRING, traits![JsonNameTrait::new("camelName")])
        .build()
);
lazy_member_schema!(RENAMED_MEMBER, RENAMED_SCHEMA, "snake_name");

struct Renamed {
    snake_name: String,
}

impl SerializeWithSchema for Renamed {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 1)?;
        ser.serialize_member(&RENAMED_MEMBER, &self.snake_name)?;
        ser.end(schema)
    }
}

#[test]
fn defaulted_members_serialize_like_any_other() {
    use trellis4rs_test_utils::defaults::{DEFAULTED_STRUCT_SCHEMA, DefaultedStruct};
    let value = DefaultedStruct {
        id: "d-1".to_string(),
        count: 0,
    };
    let json = to_string(&DEFAULTED_STRUCT_SCHEMA, &value).unwrap();
    assert_eq!(json, r#"{"id":"d-1","count":0}"#);
}

#[test]
fn json_name_overrides_member_names() {
    let value = Renamed {
        snake_name: "x".to_string(),
    };
    let json = to_string(&RENAMED_SCHEMA, &value).unwrap();
    assert_eq!(json, r#"{"camelName":"x"}"#);
}
