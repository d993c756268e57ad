//! Read side of the serde visitor protocol.

use log::debug;

use crate::schema::{Document, SchemaRef};
use crate::{BigDecimal, BigInt, ByteBuffer, IndexMap, Instant};

pub use crate::serde::serializers::Error;

/// Visitor interface for reading data-model values with an attached schema.
///
/// Aggregate reads drive a caller-supplied consumer once per present
/// member/element/entry, in input order. Readers are synchronous and
/// single-threaded per call chain.
pub trait Deserializer<'de>: Sized {
    type Error: Error;

    /// Read a structure or union, invoking `consumer` once per present
    /// member with that member's schema. Unrecognized members are skipped.
    fn read_struct<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        consumer: impl FnMut(&mut T, &SchemaRef, &mut Self) -> Result<(), Self::Error>,
    ) -> Result<T, Self::Error> {
        self.read_struct_with_unknown(schema, state, consumer, |_, name| {
            debug!("Skipping unknown member `{name}`");
        })
    }

    /// Read a structure or union, surfacing unrecognized member names to
    /// `on_unknown` (their values are always skipped).
    fn read_struct_with_unknown<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        consumer: impl FnMut(&mut T, &SchemaRef, &mut Self) -> Result<(), Self::Error>,
        on_unknown: impl FnMut(&mut T, &str),
    ) -> Result<T, Self::Error>;

    /// Read a list, invoking `consumer` once per element with the list's
    /// element schema.
    fn read_list<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        consumer: impl FnMut(&mut T, &SchemaRef, &mut Self) -> Result<(), Self::Error>,
    ) -> Result<T, Self::Error>;

    /// Read a string-keyed map, invoking `consumer` once per entry with
    /// the map's value schema and the entry key.
    fn read_string_map<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        consumer: impl FnMut(&mut T, &SchemaRef, &str, &mut Self) -> Result<(), Self::Error>,
    ) -> Result<T, Self::Error>;

    fn read_boolean(&mut self, schema: &SchemaRef) -> Result<bool, Self::Error>;

    fn read_blob(&mut self, schema: &SchemaRef) -> Result<ByteBuffer, Self::Error>;

    fn read_byte(&mut self, schema: &SchemaRef) -> Result<i8, Self::Error>;

    fn read_short(&mut self, schema: &SchemaRef) -> Result<i16, Self::Error>;

    fn read_integer(&mut self, schema: &SchemaRef) -> Result<i32, Self::Error>;

    fn read_long(&mut self, schema: &SchemaRef) -> Result<i64, Self::Error>;

    fn read_float(&mut self, schema: &SchemaRef) -> Result<f32, Self::Error>;

    fn read_double(&mut self, schema: &SchemaRef) -> Result<f64, Self::Error>;

    fn read_big_integer(&mut self, schema: &SchemaRef) -> Result<BigInt, Self::Error>;

    fn read_big_decimal(&mut self, schema: &SchemaRef) -> Result<BigDecimal, Self::Error>;

    fn read_string(&mut self, schema: &SchemaRef) -> Result<String, Self::Error>;

    fn read_timestamp(&mut self, schema: &SchemaRef) -> Result<Instant, Self::Error>;

    /// Materialize the next value as an untyped document.
    fn read_document(&mut self, schema: &SchemaRef) -> Result<Document, Self::Error>;

    /// Peek at the next value to determine if it is null without consuming it.
    ///
    /// Only meaningful for codecs whose format can represent explicit nulls.
    fn is_null(&mut self) -> bool;

    /// Consume a null value. Only makes sense after [`Deserializer::is_null`].
    fn read_null(&mut self) -> Result<(), Self::Error>;

    /// Finish reading, failing if data remains.
    fn finish(&mut self) -> Result<(), Self::Error>;
}

/// A value that can read itself from a [`Deserializer`] given a schema.
pub trait DeserializeWithSchema<'de>: Sized {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error>;
}

macro_rules! deserialize_scalar {
    ($t:ty, $method:ident) => {
        impl<'de> DeserializeWithSchema<'de> for $t {
            #[inline]
            fn deserialize_with_schema<D: Deserializer<'de>>(
                schema: &SchemaRef,
                deserializer: &mut D,
            ) -> Result<Self, D::Error> {
                deserializer.$method(schema)
            }
        }
    };
}

deserialize_scalar!(bool, read_boolean);
deserialize_scalar!(i8, read_byte);
deserialize_scalar!(i16, read_short);
deserialize_scalar!(i32, read_integer);
deserialize_scalar!(i64, read_long);
deserialize_scalar!(f32, read_float);
deserialize_scalar!(f64, read_double);
deserialize_scalar!(String, read_string);
deserialize_scalar!(BigInt, read_big_integer);
deserialize_scalar!(BigDecimal, read_big_decimal);
deserialize_scalar!(ByteBuffer, read_blob);
deserialize_scalar!(Instant, read_timestamp);
deserialize_scalar!(Document, read_document);

impl<'de, T: DeserializeWithSchema<'de>> DeserializeWithSchema<'de> for Option<T> {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        if deserializer.is_null() {
            deserializer.read_null()?;
            Ok(None)
        } else {
            T::deserialize_with_schema(schema, deserializer).map(Some)
        }
    }
}

impl<'de, T: DeserializeWithSchema<'de>> DeserializeWithSchema<'de> for Vec<T> {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        deserializer.read_list(schema, Vec::new(), |list, element_schema, de| {
            list.push(T::deserialize_with_schema(element_schema, de)?);
            Ok(())
        })
    }
}

impl<'de, T: DeserializeWithSchema<'de>> DeserializeWithSchema<'de> for IndexMap<String, T> {
    fn deserialize_with_schema<D: Deserializer<'de>>(
        schema: &SchemaRef,
        deserializer: &mut D,
    ) -> Result<Self, D::Error> {
        deserializer.read_string_map(schema, IndexMap::new(), |map, value_schema, key, de| {
            let value = T::deserialize_with_schema(value_schema, de)?;
            map.insert(key.to_string(), value);
            Ok(())
        })
    }
}
