use trellis4rs_core::schema::prelude::{INTEGER, STRING};
use trellis4rs_core::schema::{Schema, SchemaRef, ShapeId};
use trellis4rs_core::serde::de::{DeserializeWithSchema, Deserializer, Error};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::serde::{SchemaShape, SerializableShape};
use trellis4rs_core::{IndexMap, lazy_member_schema, lazy_schema, traits};

lazy_schema!(
    INNER_STRUCT_SCHEMA,
    Schema::structure_builder(ShapeId::from("test#InnerStruct"), traits![])
        .put_member("field_a", &STRING, traits![])
        .put_member("field_b", &STRING, traits![])
        .put_member("field_c", &STRING, traits![])
        .build()
);
lazy_member_schema!(INNER_A, INNER_STRUCT_SCHEMA, "field_a");
lazy_member_schema!(INNER_B, INNER_STRUCT_SCHEMA, "field_b");
lazy_member_schema!(INNER_C, INNER_STRUCT_SCHEMA, "field_c");

#[derive(Debug, Clone, PartialEq)]
pub struct InnerStruct {
    pub field_a: String,
    pub field_b: String,
    pub field_c: String,
}

impl SchemaShape for InnerStruct {
    fn schema(&self) -> &SchemaRef {
        &INNER_STRUCT_SCHEMA
    }
}

impl SerializableShape for InnerStruct {}

impl SerializeWithSchema for InnerStruct {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 3)?;
        ser.serialize_member(&INNER_A, &self.field_a)?;
        ser.serialize_member(&INNER_B, &self.field_b)?;
        ser.serialize_member(&INNER_C, &self.field_c)?;
        ser.end(schema)
    }
}

impl<'de> DeserializeWithSchema<'de> for InnerStruct {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        #[derive(Default)]
        struct Parts {
            field_a: Option<String>,
            field_b: Option<String>,
            field_c: Option<String>,
        }
        let parts =
            deserializer.read_struct(schema, Parts::default(), |parts, member_schema, de| {
                match member_schema.as_member().map(|m| m.name.as_str()) {
                    Some("field_a") => {
                        parts.field_a = Some(String::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("field_b") => {
                        parts.field_b = Some(String::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("field_c") => {
                        parts.field_c = Some(String::deserialize_with_schema(member_schema, de)?);
                    }
                    _ => {}
                }
                Ok(())
            })?;
        Ok(InnerStruct {
            field_a: parts
                .field_a
                .ok_or_else(|| D::Error::custom("Missing required member: field_a"))?,
            field_b: parts
                .field_b
                .ok_or_else(|| D::Error::custom("Missing required member: field_b"))?,
            field_c: parts
                .field_c
                .ok_or_else(|| D::Error::custom("Missing required member: field_c"))?,
        })
    }
}

lazy_schema!(
    INNER_STRUCT_LIST_SCHEMA,
    Schema::list_builder(ShapeId::from("test#InnerStructList"), traits![])
        .put_member("member", &INNER_STRUCT_SCHEMA, traits![])
        .build()
);
lazy_schema!(
    INNER_STRUCT_MAP_SCHEMA,
    Schema::map_builder(ShapeId::from("test#InnerStructMap"), traits![])
        .put_member("key", &STRING, traits![])
        .put_member("value", &INNER_STRUCT_SCHEMA, traits![])
        .build()
);
lazy_schema!(
    NESTED_COLLECTIONS_STRUCT_SCHEMA,
    Schema::structure_builder(ShapeId::from("test#NestedCollectionsStruct"), traits![])
        .put_member("name", &STRING, traits![])
        .put_member("count", &INTEGER, traits![])
        .put_member("single_nested", &INNER_STRUCT_SCHEMA, traits![])
        .put_member("optional_nested", &INNER_STRUCT_SCHEMA, traits![])
        .put_member("list_nested", &INNER_STRUCT_LIST_SCHEMA, traits![])
        .put_member("map_nested", &INNER_STRUCT_MAP_SCHEMA, traits![])
        .build()
);
lazy_member_schema!(NESTED_NAME, NESTED_COLLECTIONS_STRUCT_SCHEMA, "name");
lazy_member_schema!(NESTED_COUNT, NESTED_COLLECTIONS_STRUCT_SCHEMA, "count");
lazy_member_schema!(NESTED_SINGLE, NESTED_COLLECTIONS_STRUCT_SCHEMA, "single_nested");
lazy_member_schema!(
    NESTED_OPTIONAL,
    NESTED_COLLECTIONS_STRUCT_SCHEMA,
    "optional_nested"
);
lazy_member_schema!(NESTED_LIST, NESTED_COLLECTIONS_STRUCT_SCHEMA, "list_nested");
lazy_member_schema!(NESTED_MAP, NESTED_COLLECTIONS_STRUCT_SCHEMA, "map_nested");

#[derive(Debug, Clone, PartialEq)]
pub struct NestedCollectionsStruct {
    pub name: String,
    pub count: i32,
    pub single_nested: InnerStruct,
    pub optional_nested: Option<InnerStruct>,
    pub list_nested: Vec<InnerStruct>,
    pub map_nested: IndexMap<String, InnerStruct>,
}

impl SchemaShape for NestedCollectionsStruct {
    fn schema(&self) -> &SchemaRef {
        &NESTED_COLLECTIONS_STRUCT_SCHEMA
    }
}

impl SerializableShape for NestedCollectionsStruct {}

impl SerializeWithSchema for NestedCollectionsStruct {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 6)?;
        ser.serialize_member(&NESTED_NAME, &self.name)?;
        ser.serialize_member(&NESTED_COUNT, &self.count)?;
        ser.serialize_member(&NESTED_SINGLE, &self.single_nested)?;
        ser.serialize_optional_member(&NESTED_OPTIONAL, &self.optional_nested)?;
        ser.serialize_member(&NESTED_LIST, &self.list_nested)?;
        ser.serialize_member(&NESTED_MAP, &self.map_nested)?;
        ser.end(schema)
    }
}

impl<'de> DeserializeWithSchema<'de> for NestedCollectionsStruct {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        #[derive(Default)]
        struct Parts {
            name: Option<String>,
            count: Option<i32>,
            single_nested: Option<InnerStruct>,
            optional_nested: Option<InnerStruct>,
            list_nested: Option<Vec<InnerStruct>>,
            map_nested: Option<IndexMap<String, InnerStruct>>,
        }
        let parts =
            deserializer.read_struct(schema, Parts::default(), |parts, member_schema, de| {
                match member_schema.as_member().map(|m| m.name.as_str()) {
                    Some("name") => {
                        parts.name = Some(String::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("count") => {
                        parts.count = Some(i32::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("single_nested") => {
                        parts.single_nested =
                            Some(InnerStruct::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("optional_nested") => {
                        parts.optional_nested =
                            Option::<InnerStruct>::deserialize_with_schema(member_schema, de)?;
                    }
                    Some("list_nested") => {
                        parts.list_nested =
                            Some(Vec::<InnerStruct>::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("map_nested") => {
                        parts.map_nested = Some(
                            IndexMap::<String, InnerStruct>::deserialize_with_schema(
                                member_schema,
                                de,
                            )?,
                        );
                    }
                    _ => {}
                }
                Ok(())
            })?;
        Ok(NestedCollectionsStruct {
            name: parts
                .name
                .ok_or_else(|| D::Error::custom("Missing required member: name"))?,
            count: parts
                .count
                .ok_or_else(|| D::Error::custom("Missing required member: count"))?,
            single_nested: parts
                .single_nested
                .ok_or_else(|| D::Error::custom("Missing required member: single_nested"))?,
            optional_nested: parts.optional_nested,
            list_nested: parts.list_nested.unwrap_or_default(),
            map_nested: parts.map_nested.unwrap_or_default(),
        })
    }
}
