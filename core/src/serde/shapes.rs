use crate::schema::SchemaRef;
use crate::serde::se::{SerializeWithSchema, Serializer};

/// Returns the schema for a shape instance.
///
/// This schema is typically statically defined in generated code.
pub trait SchemaShape {
    /// Schema of this shape.
    fn schema(&self) -> &SchemaRef;
}

/// Shapes whose schema is known without an instance.
pub trait StaticSchemaShape {
    /// Schema of this shape type.
    fn schema() -> &'static SchemaRef;
}

/// A self-describing, self-serializing shape.
///
/// Implemented by modeled shapes (as opposed to [`crate::schema::Document`]s);
/// used as the boundary for typed documents and registry deserialization.
pub trait SerializableShape: SchemaShape + SerializeWithSchema {
    /// Serialize this shape using its own schema.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.serialize_with_schema(self.schema(), serializer)
    }
}
