//! Prelude schemas and traits for the base data model.

use std::sync::LazyLock;

use crate::schema::{Schema, SchemaRef, ShapeType};
use crate::traits;

// Re-export the pre-defined trait implementations.
pub use crate::schema::traits::prelude::{
    DefaultTrait, ErrorFault, ErrorTrait, HttpErrorTrait, IdempotencyTokenTrait, InternalTrait,
    JsonNameTrait, LengthTrait, LengthTraitBuilder, MediaTypeTrait, PatternTrait, RangeTrait,
    RangeTraitBuilder, RequiredTrait, SensitiveTrait, SparseTrait, StreamingTrait,
    UniqueItemsTrait, UnitTypeTrait,
};

pub static BLOB: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_blob("trellis.api#Blob", traits![]));
pub static BOOLEAN: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_boolean("trellis.api#Boolean", traits![]));
pub static STRING: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_string("trellis.api#String", traits![]));
pub static TIMESTAMP: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_timestamp("trellis.api#Timestamp", traits![]));
pub static BYTE: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_byte("trellis.api#Byte", traits![]));
pub static SHORT: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_short("trellis.api#Short", traits![]));
pub static INTEGER: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_integer("trellis.api#Integer", traits![]));
pub static LONG: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_long("trellis.api#Long", traits![]));
pub static FLOAT: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_float("trellis.api#Float", traits![]));
pub static DOUBLE: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_double("trellis.api#Double", traits![]));
pub static BIG_INTEGER: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_big_integer("trellis.api#BigInteger", traits![]));
pub static BIG_DECIMAL: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_big_decimal("trellis.api#BigDecimal", traits![]));
pub static DOCUMENT: LazyLock<SchemaRef> =
    LazyLock::new(|| Schema::create_document("trellis.api#Document", traits![]));

/// Returns the most appropriate prelude schema reference for a shape type.
///
/// Types with no corresponding prelude schema (e.g., lists, structures,
/// unions) are returned as document schemas.
#[must_use]
pub fn prelude_schema(shape_type: ShapeType) -> &'static SchemaRef {
    match shape_type {
        ShapeType::Blob => &BLOB,
        ShapeType::Byte => &BYTE,
        ShapeType::Boolean => &BOOLEAN,
        ShapeType::String | ShapeType::Enum => &STRING,
        ShapeType::Timestamp => &TIMESTAMP,
        ShapeType::Short => &SHORT,
        ShapeType::Integer | ShapeType::IntEnum => &INTEGER,
        ShapeType::Long => &LONG,
        ShapeType::Float => &FLOAT,
        ShapeType::Double => &DOUBLE,
        ShapeType::BigInteger => &BIG_INTEGER,
        ShapeType::BigDecimal => &BIG_DECIMAL,
        _ => &DOCUMENT,
    }
}
