use std::sync::LazyLock;

use crate::schema::prelude::UnitTypeTrait;
use crate::schema::{Schema, SchemaRef};
use crate::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
use crate::serde::{SchemaShape, SerializableShape, StaticSchemaShape};
use crate::traits;

/// # Unit type
///
/// This structure represents a member without a meaningful value. It is
/// used by operations to represent an empty input/output and by unions to
/// represent a variant that contains no value.
///
/// **NOTE**: Units are always serialized and deserialized as empty
/// structs, so in a JSON protocol a unit is represented as `{}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unit;

pub static UNIT: LazyLock<SchemaRef> = LazyLock::new(|| {
    Schema::structure_builder("trellis.api#Unit", traits![UnitTypeTrait::new()]).build()
});

impl StaticSchemaShape for Unit {
    fn schema() -> &'static SchemaRef {
        &UNIT
    }
}

impl SchemaShape for Unit {
    fn schema(&self) -> &SchemaRef {
        &UNIT
    }
}

impl SerializableShape for Unit {}

impl SerializeWithSchema for Unit {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        // Writes an empty structure
        serializer.write_struct(schema, 0usize)?.end(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ShapeType;

    #[test]
    fn unit_schema_is_an_empty_structure() {
        assert_eq!(UNIT.shape_type(), ShapeType::Structure);
        assert!(UNIT.members().is_empty());
        assert!(UNIT.contains_type::<UnitTypeTrait>());
    }
}
