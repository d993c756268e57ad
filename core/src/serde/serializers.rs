//! Write side of the serde visitor protocol.

use std::fmt::Display;
use std::hash::BuildHasher;

use crate::schema::{Document, SchemaRef};
use crate::stream::{DataStream, EventStreamRef};
use crate::{BigDecimal, BigInt, ByteBuffer, IndexMap, Instant};

/// Error type usable by the serde protocol.
///
/// Codec error types implement this so generic serialization code can
/// raise its own failures through whatever serializer is in use.
pub trait Error: std::error::Error + Sized {
    /// Create a new error with a custom message.
    fn custom<T: Display>(msg: T) -> Self;
}

/// Visitor interface for writing data-model values with an attached schema.
///
/// A serializer is consumed by each write; aggregate writes return a
/// nested serializer that accepts the aggregate's contents and is closed
/// with `end`. Writers are synchronous and single-threaded per call chain
/// and must not retain the schema or value beyond the call.
pub trait Serializer: Sized {
    /// Output produced by a completed write.
    type Ok;
    type Error: Error;

    type SerializeList: ListSerializer<Ok = Self::Ok, Error = Self::Error>;
    type SerializeMap: MapSerializer<Ok = Self::Ok, Error = Self::Error>;
    type SerializeStruct: StructSerializer<Ok = Self::Ok, Error = Self::Error>;

    fn write_struct(
        self,
        schema: &SchemaRef,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error>;

    fn write_map(self, schema: &SchemaRef, len: usize) -> Result<Self::SerializeMap, Self::Error>;

    fn write_list(self, schema: &SchemaRef, len: usize)
    -> Result<Self::SerializeList, Self::Error>;

    fn write_boolean(self, schema: &SchemaRef, value: bool) -> Result<Self::Ok, Self::Error>;

    fn write_byte(self, schema: &SchemaRef, value: i8) -> Result<Self::Ok, Self::Error>;

    fn write_short(self, schema: &SchemaRef, value: i16) -> Result<Self::Ok, Self::Error>;

    fn write_integer(self, schema: &SchemaRef, value: i32) -> Result<Self::Ok, Self::Error>;

    fn write_long(self, schema: &SchemaRef, value: i64) -> Result<Self::Ok, Self::Error>;

    fn write_float(self, schema: &SchemaRef, value: f32) -> Result<Self::Ok, Self::Error>;

    fn write_double(self, schema: &SchemaRef, value: f64) -> Result<Self::Ok, Self::Error>;

    fn write_big_integer(self, schema: &SchemaRef, value: &BigInt)
    -> Result<Self::Ok, Self::Error>;

    fn write_big_decimal(
        self,
        schema: &SchemaRef,
        value: &BigDecimal,
    ) -> Result<Self::Ok, Self::Error>;

    fn write_string(self, schema: &SchemaRef, value: &str) -> Result<Self::Ok, Self::Error>;

    fn write_blob(self, schema: &SchemaRef, value: &ByteBuffer) -> Result<Self::Ok, Self::Error>;

    fn write_timestamp(self, schema: &SchemaRef, value: &Instant)
    -> Result<Self::Ok, Self::Error>;

    fn write_document(self, schema: &SchemaRef, value: &Document)
    -> Result<Self::Ok, Self::Error>;

    fn write_null(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error>;

    /// Write a data stream. Serializers without streaming support reject this.
    fn write_data_stream(
        self,
        schema: &SchemaRef,
        _value: &DataStream,
    ) -> Result<Self::Ok, Self::Error> {
        Err(Self::Error::custom(format!(
            "Data streams are not supported by this serializer (schema: {})",
            schema.id()
        )))
    }

    /// Write an event stream. Serializers without streaming support reject this.
    fn write_event_stream(
        self,
        schema: &SchemaRef,
        _value: &EventStreamRef,
    ) -> Result<Self::Ok, Self::Error> {
        Err(Self::Error::custom(format!(
            "Event streams are not supported by this serializer (schema: {})",
            schema.id()
        )))
    }

    /// Called for members that are not present; most serializers write nothing.
    fn skip(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error>;

    /// Flush any buffered output.
    fn flush(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Nested serializer accepting list elements.
pub trait ListSerializer {
    type Ok;
    type Error: Error;

    fn serialize_element<T>(
        &mut self,
        element_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema;

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error>;
}

/// Nested serializer accepting map entries.
pub trait MapSerializer {
    type Ok;
    type Error: Error;

    fn serialize_entry<K, V>(
        &mut self,
        key_schema: &SchemaRef,
        value_schema: &SchemaRef,
        key: &K,
        value: &V,
    ) -> Result<(), Self::Error>
    where
        K: ?Sized + SerializeWithSchema,
        V: ?Sized + SerializeWithSchema;

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error>;
}

/// Nested serializer accepting structure and union members.
pub trait StructSerializer {
    type Ok;
    type Error: Error;

    fn serialize_member<T>(
        &mut self,
        member_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema;

    /// Serialize an optional member, writing nothing when absent.
    fn serialize_optional_member<T>(
        &mut self,
        member_schema: &SchemaRef,
        value: &Option<T>,
    ) -> Result<(), Self::Error>
    where
        T: SerializeWithSchema,
    {
        match value {
            Some(value) => self.serialize_member(member_schema, value),
            None => Ok(()),
        }
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error>;
}

/// A value that can write itself through a [`Serializer`] given a schema.
pub trait SerializeWithSchema {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error>;
}

// ============================================================================
// SerializeWithSchema implementations for host types
// ============================================================================

macro_rules! serialize_scalar {
    ($t:ty, $method:ident) => {
        impl SerializeWithSchema for $t {
            #[inline]
            fn serialize_with_schema<S: Serializer>(
                &self,
                schema: &SchemaRef,
                serializer: S,
            ) -> Result<S::Ok, S::Error> {
                serializer.$method(schema, *self)
            }
        }
    };
}

serialize_scalar!(bool, write_boolean);
serialize_scalar!(i8, write_byte);
serialize_scalar!(i16, write_short);
serialize_scalar!(i32, write_integer);
serialize_scalar!(i64, write_long);
serialize_scalar!(f32, write_float);
serialize_scalar!(f64, write_double);

impl SerializeWithSchema for str {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_string(schema, self)
    }
}

impl SerializeWithSchema for String {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_string(schema, self)
    }
}

impl SerializeWithSchema for BigInt {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_big_integer(schema, self)
    }
}

impl SerializeWithSchema for BigDecimal {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_big_decimal(schema, self)
    }
}

impl SerializeWithSchema for ByteBuffer {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_blob(schema, self)
    }
}

impl SerializeWithSchema for Instant {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.write_timestamp(schema, self)
    }
}

/// Absent values skip; null values inside aggregates are written through
/// explicit `Option` elements.
impl<T: SerializeWithSchema> SerializeWithSchema for Option<T> {
    #[inline]
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match self {
            Some(value) => value.serialize_with_schema(schema, serializer),
            None => serializer.write_null(schema),
        }
    }
}

impl<T: SerializeWithSchema> SerializeWithSchema for Vec<T> {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let Some(element_schema) = schema.get_member("member") else {
            return Err(S::Error::custom(format!(
                "List schema `{}` is missing its `member` member",
                schema.id()
            )));
        };
        let mut ser = serializer.write_list(schema, self.len())?;
        for value in self {
            ser.serialize_element(element_schema, value)?;
        }
        ser.end(schema)
    }
}

impl<T: SerializeWithSchema, H: BuildHasher> SerializeWithSchema for IndexMap<String, T, H> {
    fn serialize_with_schema<S: Serializer>(
        &self,
        schema: &SchemaRef,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let Some(key_schema) = schema.get_member("key") else {
            return Err(S::Error::custom(format!(
                "Map schema `{}` is missing its `key` member",
                schema.id()
            )));
        };
        let Some(value_schema) = schema.get_member("value") else {
            return Err(S::Error::custom(format!(
                "Map schema `{}` is missing its `value` member",
                schema.id()
            )));
        };
        let mut ser = serializer.write_map(schema, self.len())?;
        for (key, value) in self {
            ser.serialize_entry(key_schema, value_schema, key, value)?;
        }
        ser.end(schema)
    }
}

// ============================================================================
// Intercepting serializer
// ============================================================================

/// Hooks invoked around each write of an [`InterceptingSerializer`].
#[allow(unused_variables)]
pub trait Interceptor {
    /// Called before a value with the given schema is written.
    fn before(&mut self, schema: &SchemaRef) {
        /* Do nothing by default */
    }

    /// Called after a value with the given schema has been written.
    fn after(&mut self, schema: &SchemaRef) {
        /* Do nothing by default */
    }
}

/// Serializer decorator that surrounds every write with [`Interceptor`]
/// hooks.
///
/// The hooks observe the schema of each value written to the delegate;
/// aggregate writes call `before` on entry and `after` once the aggregate
/// is closed. Used as a building block for filtering and path
/// maintenance.
pub struct InterceptingSerializer<'i, S, I> {
    inner: S,
    interceptor: &'i mut I,
}

impl<'i, S: Serializer, I: Interceptor> InterceptingSerializer<'i, S, I> {
    pub fn new(inner: S, interceptor: &'i mut I) -> Self {
        InterceptingSerializer { inner, interceptor }
    }
}

macro_rules! intercept {
    ($self:ident, $schema:ident, $write:expr) => {{
        $self.interceptor.before($schema);
        let result = $write;
        if result.is_ok() {
            $self.interceptor.after($schema);
        }
        result
    }};
}

impl<'i, S: Serializer, I: Interceptor> Serializer for InterceptingSerializer<'i, S, I> {
    type Ok = S::Ok;
    type Error = S::Error;
    type SerializeList = InterceptingAggregate<'i, S::SerializeList, I>;
    type SerializeMap = InterceptingAggregate<'i, S::SerializeMap, I>;
    type SerializeStruct = InterceptingAggregate<'i, S::SerializeStruct, I>;

    fn write_struct(
        self,
        schema: &SchemaRef,
        len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.interceptor.before(schema);
        Ok(InterceptingAggregate {
            inner: self.inner.write_struct(schema, len)?,
            interceptor: self.interceptor,
        })
    }

    fn write_map(self, schema: &SchemaRef, len: usize) -> Result<Self::SerializeMap, Self::Error> {
        self.interceptor.before(schema);
        Ok(InterceptingAggregate {
            inner: self.inner.write_map(schema, len)?,
            interceptor: self.interceptor,
        })
    }

    fn write_list(
        self,
        schema: &SchemaRef,
        len: usize,
    ) -> Result<Self::SerializeList, Self::Error> {
        self.interceptor.before(schema);
        Ok(InterceptingAggregate {
            inner: self.inner.write_list(schema, len)?,
            interceptor: self.interceptor,
        })
    }

    fn write_boolean(self, schema: &SchemaRef, value: bool) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_boolean(schema, value))
    }

    fn write_byte(self, schema: &SchemaRef, value: i8) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_byte(schema, value))
    }

    fn write_short(self, schema: &SchemaRef, value: i16) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_short(schema, value))
    }

    fn write_integer(self, schema: &SchemaRef, value: i32) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_integer(schema, value))
    }

    fn write_long(self, schema: &SchemaRef, value: i64) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_long(schema, value))
    }

    fn write_float(self, schema: &SchemaRef, value: f32) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_float(schema, value))
    }

    fn write_double(self, schema: &SchemaRef, value: f64) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_double(schema, value))
    }

    fn write_big_integer(
        self,
        schema: &SchemaRef,
        value: &BigInt,
    ) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_big_integer(schema, value))
    }

    fn write_big_decimal(
        self,
        schema: &SchemaRef,
        value: &BigDecimal,
    ) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_big_decimal(schema, value))
    }

    fn write_string(self, schema: &SchemaRef, value: &str) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_string(schema, value))
    }

    fn write_blob(self, schema: &SchemaRef, value: &ByteBuffer) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_blob(schema, value))
    }

    fn write_timestamp(
        self,
        schema: &SchemaRef,
        value: &Instant,
    ) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_timestamp(schema, value))
    }

    fn write_document(
        self,
        schema: &SchemaRef,
        value: &Document,
    ) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_document(schema, value))
    }

    fn write_null(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        intercept!(self, schema, self.inner.write_null(schema))
    }

    fn skip(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        self.inner.skip(schema)
    }

    fn flush(self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

/// Aggregate wrapper for [`InterceptingSerializer`].
///
/// Values nested inside the aggregate are written to the delegate
/// directly; `after` fires once the aggregate is closed.
#[doc(hidden)]
pub struct InterceptingAggregate<'i, A, I> {
    inner: A,
    interceptor: &'i mut I,
}

impl<A: ListSerializer, I: Interceptor> ListSerializer for InterceptingAggregate<'_, A, I> {
    type Ok = A::Ok;
    type Error = A::Error;

    fn serialize_element<T>(
        &mut self,
        element_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        self.inner.serialize_element(element_schema, value)
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        let result = self.inner.end(schema)?;
        self.interceptor.after(schema);
        Ok(result)
    }
}

impl<A: MapSerializer, I: Interceptor> MapSerializer for InterceptingAggregate<'_, A, I> {
    type Ok = A::Ok;
    type Error = A::Error;

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
        self.inner.serialize_entry(key_schema, value_schema, key, value)
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        let result = self.inner.end(schema)?;
        self.interceptor.after(schema);
        Ok(result)
    }
}

impl<A: StructSerializer, I: Interceptor> StructSerializer for InterceptingAggregate<'_, A, I> {
    type Ok = A::Ok;
    type Error = A::Error;

    fn serialize_member<T>(
        &mut self,
        member_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        self.inner.serialize_member(member_schema, value)
    }

    fn end(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        let result = self.inner.end(schema)?;
        self.interceptor.after(schema);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prelude::STRING;
    use crate::schema::{Schema, ShapeId};
    use crate::serde::NullSerializer;
    use crate::serde::fmt::FmtError;
    use crate::{lazy_schema, traits};

    struct SchemaCounter {
        before: usize,
        after: usize,
    }

    impl Interceptor for SchemaCounter {
        fn before(&mut self, _: &SchemaRef) {
            self.before += 1;
        }

        fn after(&mut self, _: &SchemaRef) {
            self.after += 1;
        }
    }

    lazy_schema!(
        LIST_SCHEMA,
        Schema::list_builder(ShapeId::from("com.example#List"), traits![])
            .put_member("member", &STRING, traits![])
            .build()
    );

    #[test]
    fn interceptor_fires_around_aggregates() {
        let values = vec!["a".to_string(), "b".to_string()];
        let mut counter = SchemaCounter {
            before: 0,
            after: 0,
        };
        let serializer =
            InterceptingSerializer::new(NullSerializer::<FmtError>::new(), &mut counter);
        values
            .serialize_with_schema(&LIST_SCHEMA, serializer)
            .expect("serialization failed");
        // One hook pair for the list itself; elements go to the delegate.
        assert_eq!(counter.before, 1);
        assert_eq!(counter.after, 1);
    }
}
