use trellis4rs_core::schema::prelude::{DefaultTrait, INTEGER, RequiredTrait, STRING};
use trellis4rs_core::schema::{
    DocumentValue, NumberInteger, NumberValue, Schema, SchemaRef, ShapeId,
};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::serde::{SchemaShape, SerializableShape};
use trellis4rs_core::{lazy_member_schema, lazy_schema, traits};

// `count` is required but defaulted, so it does not participate in
// required-member presence tracking.
lazy_schema!(
    DEFAULTED_STRUCT_SCHEMA,
    Schema::structure_builder(ShapeId::from("test#DefaultedStruct"), traits![])
        .put_member("id", &STRING, traits![RequiredTrait])
        .put_member(
            "count",
            &INTEGER,
            traits![
                RequiredTrait,
                DefaultTrait::new(DocumentValue::Number(NumberValue::Integer(
                    NumberInteger::Integer(0)
                )))
            ]
        )
        .build()
);
lazy_member_schema!(DEFAULTED_ID, DEFAULTED_STRUCT_SCHEMA, "id");
lazy_member_schema!(DEFAULTED_COUNT, DEFAULTED_STRUCT_SCHEMA, "count");

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultedStruct {
    pub id: String,
    pub count: i32,
}

impl SchemaShape for DefaultedStruct {
    fn schema(&self) -> &SchemaRef {
        &DEFAULTED_STRUCT_SCHEMA
    }
}

impl SerializableShape for DefaultedStruct {}

impl SerializeWithSchema for DefaultedStruct {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 2)?;
        ser.serialize_member(&DEFAULTED_ID, &self.id)?;
        ser.serialize_member(&DEFAULTED_COUNT, &self.count)?;
        ser.end(schema)
    }
}
