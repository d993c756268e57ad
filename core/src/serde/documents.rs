//! Serialization of documents and capture of shapes into documents.

use log::debug;

use crate::schema::{
    Document, DocumentError, DocumentValue, NumberFloat, NumberInteger, NumberValue, SchemaRef,
    ShapeType,
};
use crate::serde::se::{
    Error, ListSerializer, MapSerializer, SerializeWithSchema, Serializer, StructSerializer,
};
use crate::serde::shapes::SerializableShape;
use crate::serde::utils::KeySerializer;
use crate::{BigDecimal, BigInt, ByteBuffer, IndexMap, Instant};

impl Error for DocumentError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        DocumentError::Serialization(msg.to_string())
    }
}

/// Documents serialize themselves as `write_document` so codecs can
/// intercept them (e.g. to add a discriminator); codecs then call
/// [`Document::serialize_contents`] to emit the underlying value.
impl SerializeWithSchema for Document {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_document(schema, self)
    }
}

impl SerializableShape for Document {}

impl Document {
    /// Capture a modeled shape as a typed document.
    ///
    /// The document keeps the shape's schema and discriminator so it can
    /// be re-serialized faithfully through any codec.
    pub fn of_shape<T: SerializableShape + ?Sized>(shape: &T) -> Result<Document, DocumentError> {
        shape.serialize(DocumentParser)
    }

    /// Emit the document's underlying value through a serializer.
    ///
    /// This writes the value's actual kind (string for enum documents,
    /// integer for int-enum documents) and must not re-enter
    /// `write_document` for this document's own schema.
    pub fn serialize_contents<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let schema = &self.schema;
        match &self.value {
            DocumentValue::Null => serializer.write_null(schema),
            DocumentValue::Boolean(value) => serializer.write_boolean(schema, *value),
            DocumentValue::Blob(value) => serializer.write_blob(schema, value),
            DocumentValue::String(value) => serializer.write_string(schema, value),
            DocumentValue::Timestamp(value) => serializer.write_timestamp(schema, value),
            DocumentValue::Number(NumberValue::Integer(value)) => match value {
                NumberInteger::Byte(v) => serializer.write_byte(schema, *v),
                NumberInteger::Short(v) => serializer.write_short(schema, *v),
                NumberInteger::Integer(v) => serializer.write_integer(schema, *v),
                NumberInteger::Long(v) => serializer.write_long(schema, *v),
                NumberInteger::BigInt(v) => serializer.write_big_integer(schema, v),
            },
            DocumentValue::Number(NumberValue::Float(value)) => match value {
                NumberFloat::Float(v) => serializer.write_float(schema, *v),
                NumberFloat::Double(v) => serializer.write_double(schema, *v),
                NumberFloat::BigDecimal(v) => serializer.write_big_decimal(schema, v),
            },
            DocumentValue::List(elements) => {
                let element_schema = schema.get_member("member").cloned().unwrap_or_else(|| {
                    crate::schema::prelude::DOCUMENT.clone()
                });
                let mut ser = serializer.write_list(schema, elements.len())?;
                for element in elements {
                    ser.serialize_element(&element_schema, element)?;
                }
                ser.end(schema)
            }
            DocumentValue::Map(members) => match schema.shape_type() {
                ShapeType::Structure | ShapeType::Union => {
                    let mut ser = serializer.write_struct(schema, members.len())?;
                    for (name, value) in members {
                        if let Some(member_schema) = schema.get_member(name) {
                            ser.serialize_member(member_schema, value)?;
                        } else {
                            debug!("Dropping unknown member `{name}` of `{}`", schema.id());
                        }
                    }
                    ser.end(schema)
                }
                _ => {
                    let key_schema = schema
                        .get_member("key")
                        .cloned()
                        .unwrap_or_else(|| crate::schema::prelude::STRING.clone());
                    let value_schema = schema
                        .get_member("value")
                        .cloned()
                        .unwrap_or_else(|| crate::schema::prelude::DOCUMENT.clone());
                    let mut ser = serializer.write_map(schema, members.len())?;
                    for (key, value) in members {
                        ser.serialize_entry(&key_schema, &value_schema, key, value)?;
                    }
                    ser.end(schema)
                }
            },
        }
    }
}

// ============================================================================
// Document parser
// ============================================================================

/// Serializer that materializes whatever is written into a [`Document`].
///
/// Used to build typed documents from modeled shapes and to normalize
/// values for uniqueness checks.
pub(crate) struct DocumentParser;

impl Serializer for DocumentParser {
    type Ok = Document;
    type Error = DocumentError;
    type SerializeList = DocumentListParser;
    type SerializeMap = DocumentMapParser;
    type SerializeStruct = DocumentStructParser;

    fn write_struct(self, _: &SchemaRef, len: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(DocumentStructParser {
            members: IndexMap::with_capacity(len),
        })
    }

    fn write_map(self, _: &SchemaRef, len: usize) -> Result<Self::SerializeMap, Self::Error> {
        Ok(DocumentMapParser {
            entries: IndexMap::with_capacity(len),
        })
    }

    fn write_list(self, _: &SchemaRef, len: usize) -> Result<Self::SerializeList, Self::Error> {
        Ok(DocumentListParser {
            elements: Vec::with_capacity(len),
        })
    }

    fn write_boolean(self, schema: &SchemaRef, value: bool) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::Boolean(value)))
    }

    fn write_byte(self, schema: &SchemaRef, value: i8) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Integer(NumberInteger::Byte(value))),
        ))
    }

    fn write_short(self, schema: &SchemaRef, value: i16) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Integer(NumberInteger::Short(value))),
        ))
    }

    fn write_integer(self, schema: &SchemaRef, value: i32) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Integer(NumberInteger::Integer(value))),
        ))
    }

    fn write_long(self, schema: &SchemaRef, value: i64) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Integer(NumberInteger::Long(value))),
        ))
    }

    fn write_float(self, schema: &SchemaRef, value: f32) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Float(NumberFloat::Float(value))),
        ))
    }

    fn write_double(self, schema: &SchemaRef, value: f64) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Float(NumberFloat::Double(value))),
        ))
    }

    fn write_big_integer(self, schema: &SchemaRef, value: &BigInt) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Integer(NumberInteger::BigInt(value.clone()))),
        ))
    }

    fn write_big_decimal(
        self,
        schema: &SchemaRef,
        value: &BigDecimal,
    ) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(
            schema,
            DocumentValue::Number(NumberValue::Float(NumberFloat::BigDecimal(value.clone()))),
        ))
    }

    fn write_string(self, schema: &SchemaRef, value: &str) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::String(value.to_string())))
    }

    fn write_blob(self, schema: &SchemaRef, value: &ByteBuffer) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::Blob(value.clone())))
    }

    fn write_timestamp(self, schema: &SchemaRef, value: &Instant) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::Timestamp(*value)))
    }

    fn write_document(self, _: &SchemaRef, value: &Document) -> Result<Self::Ok, Self::Error> {
        Ok(value.clone())
    }

    fn write_null(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::Null))
    }

    fn skip(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::Null))
    }
}

fn parsed(schema: &SchemaRef, value: DocumentValue) -> Document {
    Document {
        schema: schema.clone(),
        value,
        discriminator: None,
    }
}

pub(crate) struct DocumentListParser {
    elements: Vec<Document>,
}

impl ListSerializer for DocumentListParser {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_element<T>(
        &mut self,
        element_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        self.elements
            .push(value.serialize_with_schema(element_schema, DocumentParser)?);
        Ok(())
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::List(self.elements)))
    }
}

pub(crate) struct DocumentMapParser {
    entries: IndexMap<String, Document>,
}

impl MapSerializer for DocumentMapParser {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_entry<K, V>(
        &mut self,
        key_schema: &SchemaRef,
        value_schema: &SchemaRef,
        key: &K,
        value: &V,
    ) -> Result<(), Self::Error>
    where
        K: ?Sized + SerializeWithSchema,
        V: ?Sized + SerializeWithSchema,
    {
        let key = key.serialize_with_schema(key_schema, KeySerializer::new())?;
        let value = value.serialize_with_schema(value_schema, DocumentParser)?;
        self.entries.insert(key, value);
        Ok(())
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(parsed(schema, DocumentValue::Map(self.entries)))
    }
}

pub(crate) struct DocumentStructParser {
    members: IndexMap<String, Document>,
}

impl StructSerializer for DocumentStructParser {
    type Ok = Document;
    type Error = DocumentError;

    fn serialize_member<T>(
        &mut self,
        member_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        let Some(member) = member_schema.as_member() else {
            return Err(DocumentError::Serialization(format!(
                "Expected member schema, found {}",
                member_schema.id()
            )));
        };
        let value = value.serialize_with_schema(member_schema, DocumentParser)?;
        self.members.insert(member.name.clone(), value);
        Ok(())
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        let discriminator = match schema.shape_type() {
            ShapeType::Structure | ShapeType::Union => Some(schema.id().clone()),
            _ => None,
        };
        Ok(Document {
            schema: schema.clone(),
            value: DocumentValue::Map(self.members),
            discriminator,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prelude::STRING;
    use crate::schema::{Schema, ShapeId};
    use crate::serde::SchemaShape;
    use crate::{lazy_member_schema, lazy_schema, traits};

    lazy_schema!(
        MAP_SCHEMA,
        Schema::map_builder(ShapeId::from("com.example#Map"), traits![])
            .put_member("key", &STRING, traits![])
            .put_member("value", &STRING, traits![])
            .build()
    );
    lazy_schema!(
        LIST_SCHEMA,
        Schema::list_builder(ShapeId::from("com.example#List"), traits![])
            .put_member("member", &STRING, traits![])
            .build()
    );
    lazy_schema!(
        SCHEMA,
        Schema::structure_builder(ShapeId::from("com.example#Shape"), traits![])
            .put_member("a", &STRING, traits![])
            .put_member("b", &STRING, traits![])
            .put_member("c", &STRING, traits![])
            .put_member("list", &LIST_SCHEMA, traits![])
            .put_member("map", &MAP_SCHEMA, traits![])
            .build()
    );
    lazy_member_schema!(MEMBER_A, SCHEMA, "a");
    lazy_member_schema!(MEMBER_B, SCHEMA, "b");
    lazy_member_schema!(MEMBER_C, SCHEMA, "c");
    lazy_member_schema!(MEMBER_LIST, SCHEMA, "list");
    lazy_member_schema!(MEMBER_MAP, SCHEMA, "map");

    pub(crate) struct SerializeMe {
        pub member_a: String,
        pub member_b: String,
        pub member_optional: Option<String>,
        pub member_list: Vec<String>,
        pub member_map: IndexMap<String, String>,
    }

    impl SchemaShape for SerializeMe {
        fn schema(&self) -> &SchemaRef {
            &SCHEMA
        }
    }

    impl SerializableShape for SerializeMe {}

    impl SerializeWithSchema for SerializeMe {
        fn serialize_with_schema<S: Serializer>(
            &self,
            schema: &SchemaRef,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut ser = serializer.write_struct(schema, 5)?;
            ser.serialize_member(&MEMBER_A, &self.member_a)?;
            ser.serialize_member(&MEMBER_B, &self.member_b)?;
            ser.serialize_optional_member(&MEMBER_C, &self.member_optional)?;
            ser.serialize_member(&MEMBER_LIST, &self.member_list)?;
            ser.serialize_member(&MEMBER_MAP, &self.member_map)?;
            ser.end(schema)
        }
    }

    #[test]
    fn struct_to_document() {
        let mut map = IndexMap::new();
        map.insert(String::from("a"), String::from("b"));
        let list = vec!["a".to_string(), "b".to_string()];
        let struct_to_convert = SerializeMe {
            member_a: "a".to_string(),
            member_b: "b".to_string(),
            member_optional: Some("c".to_string()),
            member_map: map,
            member_list: list,
        };
        let document = Document::of_shape(&struct_to_convert).expect("conversion failed");
        assert_eq!(document.discriminator(), Some(SCHEMA.id()));
        assert_eq!(document.schema(), &*SCHEMA);
        let members = document.as_map().expect("Expected a structure document");
        assert_eq!(
            members.get("a").and_then(Document::as_string),
            Some("a")
        );
        assert_eq!(
            members.get("b").and_then(Document::as_string),
            Some("b")
        );
        assert_eq!(
            members.get("c").and_then(Document::as_string),
            Some("c")
        );
        assert!(members.contains_key("list"));
        assert!(members.contains_key("map"));
        assert_eq!(members.get("list").unwrap().size(), 2);
    }

    #[test]
    fn typed_document_round_trips_through_parser() {
        let document = Document::of_shape(&SerializeMe {
            member_a: "a".to_string(),
            member_b: "b".to_string(),
            member_optional: None,
            member_list: Vec::new(),
            member_map: IndexMap::new(),
        })
        .expect("conversion failed");
        // Re-capturing the document's contents produces an equal document.
        let recaptured = document
            .serialize_contents(DocumentParser)
            .expect("recapture failed");
        assert_eq!(recaptured.as_map(), document.as_map());
    }
}
