//! Serializer building blocks shared across the runtime.

use std::marker::PhantomData;

use crate::schema::{Document, SchemaRef};
use crate::serde::se::{
    Error, ListSerializer, MapSerializer, SerializeWithSchema, Serializer, StructSerializer,
};
use crate::{BigDecimal, BigInt, ByteBuffer, Instant};

// ============================================================================
// Null serializer
// ============================================================================

/// Serializer that discards everything written to it.
///
/// Useful for exercising serialization logic without producing output and
/// as the delegate for decorators under test.
pub struct NullSerializer<E: Error>(PhantomData<E>);

impl<E: Error> NullSerializer<E> {
    #[must_use]
    pub const fn new() -> Self {
        NullSerializer(PhantomData)
    }
}

impl<E: Error> Default for NullSerializer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Error> Serializer for NullSerializer<E> {
    type Ok = ();
    type Error = E;
    type SerializeList = NullAggregateSerializer<E>;
    type SerializeMap = NullAggregateSerializer<E>;
    type SerializeStruct = NullAggregateSerializer<E>;

    fn write_struct(self, _: &SchemaRef, _: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(NullAggregateSerializer(PhantomData))
    }

    fn write_map(self, _: &SchemaRef, _: usize) -> Result<Self::SerializeMap, Self::Error> {
        Ok(NullAggregateSerializer(PhantomData))
    }

    fn write_list(self, _: &SchemaRef, _: usize) -> Result<Self::SerializeList, Self::Error> {
        Ok(NullAggregateSerializer(PhantomData))
    }

    fn write_boolean(self, _: &SchemaRef, _: bool) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_byte(self, _: &SchemaRef, _: i8) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_short(self, _: &SchemaRef, _: i16) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_integer(self, _: &SchemaRef, _: i32) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_long(self, _: &SchemaRef, _: i64) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_float(self, _: &SchemaRef, _: f32) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_double(self, _: &SchemaRef, _: f64) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_big_integer(self, _: &SchemaRef, _: &BigInt) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_big_decimal(self, _: &SchemaRef, _: &BigDecimal) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_string(self, _: &SchemaRef, _: &str) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_blob(self, _: &SchemaRef, _: &ByteBuffer) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_timestamp(self, _: &SchemaRef, _: &Instant) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_document(self, _: &SchemaRef, _: &Document) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn write_null(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }

    fn skip(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }
}

/// Aggregate serializer for [`NullSerializer`]; contents are discarded
/// without being visited.
#[doc(hidden)]
pub struct NullAggregateSerializer<E: Error>(PhantomData<E>);

impl<E: Error> ListSerializer for NullAggregateSerializer<E> {
    type Ok = ();
    type Error = E;

    fn serialize_element<T>(&mut self, _: &SchemaRef, _: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        Ok(())
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }
}

impl<E: Error> MapSerializer for NullAggregateSerializer<E> {
    type Ok = ();
    type Error = E;

    fn serialize_entry<K, V>(
        &mut self,
        _: &SchemaRef,
        _: &SchemaRef,
        _: &K,
        _: &V,
    ) -> Result<(), Self::Error>
    where
        K: ?Sized + SerializeWithSchema,
        V: ?Sized + SerializeWithSchema,
    {
        Ok(())
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }
}

impl<E: Error> StructSerializer for NullAggregateSerializer<E> {
    type Ok = ();
    type Error = E;

    fn serialize_member<T>(&mut self, _: &SchemaRef, _: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        Ok(())
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(())
    }
}

// ============================================================================
// Key converter
// ============================================================================

/// Converts a key value to a String if possible.
///
/// A specific-shape serializer: everything except strings and integral
/// numbers is rejected. Used to support validation paths and string-map
/// document key conversions.
pub struct KeySerializer<E: Error>(PhantomData<E>);

impl<E: Error> KeySerializer<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<E: Error> Default for KeySerializer<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Error> Serializer for KeySerializer<E> {
    type Ok = String;
    type Error = E;
    type SerializeList = UnsupportedKeySerializer<E>;
    type SerializeMap = UnsupportedKeySerializer<E>;
    type SerializeStruct = UnsupportedKeySerializer<E>;

    #[cold]
    fn write_struct(
        self,
        schema: &SchemaRef,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_map(self, schema: &SchemaRef, _len: usize) -> Result<Self::SerializeMap, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_list(
        self,
        schema: &SchemaRef,
        _len: usize,
    ) -> Result<Self::SerializeList, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_boolean(self, schema: &SchemaRef, _value: bool) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[inline]
    fn write_byte(self, _schema: &SchemaRef, value: i8) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    #[inline]
    fn write_short(self, _schema: &SchemaRef, value: i16) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    #[inline]
    fn write_integer(self, _schema: &SchemaRef, value: i32) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    #[inline]
    fn write_long(self, _schema: &SchemaRef, value: i64) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    #[cold]
    fn write_float(self, schema: &SchemaRef, _value: f32) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_double(self, schema: &SchemaRef, _value: f64) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_big_integer(self, schema: &SchemaRef, _value: &BigInt) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_big_decimal(
        self,
        schema: &SchemaRef,
        _value: &BigDecimal,
    ) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[inline]
    fn write_string(self, _schema: &SchemaRef, value: &str) -> Result<Self::Ok, Self::Error> {
        Ok(value.to_string())
    }

    #[cold]
    fn write_blob(self, schema: &SchemaRef, _value: &ByteBuffer) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_timestamp(
        self,
        schema: &SchemaRef,
        _value: &Instant,
    ) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_document(
        self,
        schema: &SchemaRef,
        _value: &Document,
    ) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn write_null(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }

    #[cold]
    fn skip(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Err(invalid_key_error(schema))
    }
}

fn invalid_key_error<E: Error>(schema: &SchemaRef) -> E {
    E::custom(format!("Invalid key type: {}", schema.shape_type()))
}

// Structures, maps, and lists cannot be used as map keys so these
// implementations will never actually be called.
#[doc(hidden)]
pub struct UnsupportedKeySerializer<E: Error>(PhantomData<E>);

impl<E: Error> ListSerializer for UnsupportedKeySerializer<E> {
    type Ok = String;
    type Error = E;

    #[cold]
    fn serialize_element<T>(&mut self, _: &SchemaRef, _: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        unreachable!()
    }

    #[cold]
    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        unreachable!()
    }
}

impl<E: Error> MapSerializer for UnsupportedKeySerializer<E> {
    type Ok = String;
    type Error = E;

    #[cold]
    fn serialize_entry<K, V>(
        &mut self,
        _: &SchemaRef,
        _: &SchemaRef,
        _: &K,
        _: &V,
    ) -> Result<(), Self::Error>
    where
        K: ?Sized + SerializeWithSchema,
        V: ?Sized + SerializeWithSchema,
    {
        unreachable!()
    }

    #[cold]
    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        unreachable!()
    }
}

impl<E: Error> StructSerializer for UnsupportedKeySerializer<E> {
    type Ok = String;
    type Error = E;

    #[cold]
    fn serialize_member<T>(&mut self, _: &SchemaRef, _: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        unreachable!()
    }

    #[cold]
    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        unreachable!()
    }
}
