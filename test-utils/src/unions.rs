use trellis4rs_core::schema::prelude::{INTEGER, STRING};
use trellis4rs_core::schema::{Schema, SchemaRef, ShapeId};
use trellis4rs_core::serde::de::{DeserializeWithSchema, Deserializer, Error};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::serde::{SchemaShape, SerializableShape};
use trellis4rs_core::{lazy_member_schema, lazy_schema, traits};

lazy_schema!(
    STRING_OR_NUMBER_SCHEMA,
    Schema::union_builder(ShapeId::from("test#StringOrNumber"), traits![])
        .put_member("text", &STRING, traits![])
        .put_member("number", &INTEGER, traits![])
        .build()
);
lazy_member_schema!(UNION_TEXT, STRING_OR_NUMBER_SCHEMA, "text");
lazy_member_schema!(UNION_NUMBER, STRING_OR_NUMBER_SCHEMA, "number");

/// Union with exactly one member set.
#[derive(Debug, Clone, PartialEq)]
pub enum StringOrNumber {
    Text(String),
    Number(i32),
}

impl SchemaShape for StringOrNumber {
    fn schema(&self) -> &SchemaRef {
        &STRING_OR_NUMBER_SCHEMA
    }
}

impl SerializableShape for StringOrNumber {}

impl SerializeWithSchema for StringOrNumber {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 1)?;
        match self {
            StringOrNumber::Text(value) => ser.serialize_member(&UNION_TEXT, value)?,
            StringOrNumber::Number(value) => ser.serialize_member(&UNION_NUMBER, value)?,
        }
        ser.end(schema)
    }
}

impl<'de> DeserializeWithSchema<'de> for StringOrNumber {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        let variant = deserializer.read_struct(schema, None, |variant, member_schema, de| {
            *variant = match member_schema.as_member().map(|m| m.name.as_str()) {
                Some("text") => Some(StringOrNumber::Text(String::deserialize_with_schema(
                    member_schema,
                    de,
                )?)),
                Some("number") => Some(StringOrNumber::Number(i32::deserialize_with_schema(
                    member_schema,
                    de,
                )?)),
                _ => None,
            };
            Ok(())
        })?;
        variant.ok_or_else(|| D::Error::custom("No member is set in the union"))
    }
}
