use std::sync::{Arc, LazyLock};

use trellis4rs_core::schema::prelude::STRING;
use trellis4rs_core::schema::{Schema, SchemaRef, ShapeId};
use trellis4rs_core::serde::de::{DeserializeWithSchema, Deserializer, Error};
use trellis4rs_core::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use trellis4rs_core::serde::{SchemaShape, SerializableShape};
use trellis4rs_core::{lazy_member_schema, traits};

// Self-referential schema: a linked-list node whose `next` member targets
// the node schema itself through a deferred builder reference.
pub static NODE_SCHEMA: LazyLock<SchemaRef> = LazyLock::new(|| {
    let builder = Arc::new(Schema::structure_builder(
        ShapeId::from("test#Node"),
        traits![],
    ));
    builder
        .put_member("value", &STRING, traits![])
        .put_member("next", &builder, traits![])
        .build()
});
lazy_member_schema!(NODE_VALUE, NODE_SCHEMA, "value");
lazy_member_schema!(NODE_NEXT, NODE_SCHEMA, "next");

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub value: String,
    pub next: Option<Box<Node>>,
}

impl Node {
    #[must_use]
    pub fn chain(values: &[&str]) -> Option<Box<Node>> {
        values.iter().rev().fold(None, |next, value| {
            Some(Box::new(Node {
                value: (*value).to_string(),
                next,
            }))
        })
    }
}

impl SchemaShape for Node {
    fn schema(&self) -> &SchemaRef {
        &NODE_SCHEMA
    }
}

impl SerializableShape for Node {}

impl SerializeWithSchema for Node {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut ser = serializer.write_struct(schema, 2)?;
        ser.serialize_member(&NODE_VALUE, &self.value)?;
        if let Some(next) = &self.next {
            ser.serialize_member(&NODE_NEXT, next.as_ref())?;
        }
        ser.end(schema)
    }
}

impl<'de> DeserializeWithSchema<'de> for Node {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        #[derive(Default)]
        struct Parts {
            value: Option<String>,
            next: Option<Box<Node>>,
        }
        let parts =
            deserializer.read_struct(schema, Parts::default(), |parts, member_schema, de| {
                match member_schema.as_member().map(|m| m.name.as_str()) {
                    Some("value") => {
                        parts.value = Some(String::deserialize_with_schema(member_schema, de)?);
                    }
                    Some("next") => {
                        parts.next =
                            Some(Box::new(Node::deserialize_with_schema(member_schema, de)?));
                    }
                    _ => {}
                }
                Ok(())
            })?;
        Ok(Node {
            value: parts
                .value
                .ok_or_else(|| D::Error::custom("Missing required member: value"))?,
            next: parts.next,
        })
    }
}
