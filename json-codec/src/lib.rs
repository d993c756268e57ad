//! JSON codec for the trellis4rs serde protocol.
//!
//! Serialization writes JSON bytes directly; deserialization reads with
//! `jiter`. Wire behavior:
//!
//! - blobs encode as base64 strings and decoding accepts base64;
//! - non-finite floats serialize as the strings `"NaN"`, `"Infinity"`,
//!   and `"-Infinity"`; whole-valued floats are emitted without a
//!   fractional part;
//! - timestamps are epoch-seconds numbers; RFC 3339 strings are accepted
//!   on read;
//! - structure documents are wrapped with a `__type` member carrying the
//!   shape identifier;
//! - `@jsonName` overrides member names.

mod errors;
pub use errors::JsonSerdeError;

mod deserialization;
mod serialization;

pub use deserialization::JsonDeserializer;
pub use serialization::JsonSerializer;

use jiter::Jiter;
use trellis4rs_core::schema::prelude::JsonNameTrait;
use trellis4rs_core::schema::SchemaRef;
use trellis4rs_core::serde::de::DeserializeWithSchema;
use trellis4rs_core::serde::se::SerializeWithSchema;

/// Codec behavior knobs.
#[derive(Debug, Clone)]
pub struct JsonSettings {
    /// Name of the structure member carrying a document discriminator.
    pub type_field: String,
    /// Forward unknown union members to the caller instead of failing.
    pub forward_unknown_members: bool,
}

impl Default for JsonSettings {
    fn default() -> Self {
        JsonSettings {
            type_field: "__type".to_string(),
            forward_unknown_members: false,
        }
    }
}

/// Serialize a value to JSON bytes.
pub fn to_bytes<T: SerializeWithSchema + ?Sized>(
    schema: &SchemaRef,
    value: &T,
) -> Result<Vec<u8>, JsonSerdeError> {
    let mut serializer = JsonSerializer::new();
    value.serialize_with_schema(schema, &mut serializer)?;
    Ok(serializer.into_bytes())
}

/// Serialize a value to a JSON string.
pub fn to_string<T: SerializeWithSchema + ?Sized>(
    schema: &SchemaRef,
    value: &T,
) -> Result<String, JsonSerdeError> {
    let bytes = to_bytes(schema, value)?;
    String::from_utf8(bytes).map_err(|e| JsonSerdeError::Serialization(e.to_string()))
}

/// Deserialize a value from JSON bytes.
pub fn from_slice<T: for<'de> DeserializeWithSchema<'de>>(
    schema: &SchemaRef,
    data: &[u8],
) -> Result<T, JsonSerdeError> {
    let mut jiter = Jiter::new(data);
    let mut deserializer = JsonDeserializer::new(&mut jiter);
    T::deserialize_with_schema(schema, &mut deserializer)
}

/// Deserialize a value from a JSON string.
pub fn from_str<T: for<'de> DeserializeWithSchema<'de>>(
    schema: &SchemaRef,
    data: &str,
) -> Result<T, JsonSerdeError> {
    from_slice(schema, data.as_bytes())
}

/// The wire name of a member, honoring `@jsonName`.
pub(crate) fn member_name(schema: &SchemaRef) -> Result<&str, JsonSerdeError> {
    let member = schema.as_member().ok_or_else(|| {
        JsonSerdeError::Serialization(format!("Expected member schema, found `{}`", schema.id()))
    })?;
    Ok(schema
        .get_trait_as::<JsonNameTrait>()
        .map_or(member.name.as_str(), JsonNameTrait::name))
}
