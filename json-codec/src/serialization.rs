//! JSON serialization.

use trellis4rs_core::schema::{Document, SchemaRef, ShapeType};
use trellis4rs_core::serde::se::{
    ListSerializer, MapSerializer, SerializeWithSchema, Serializer, StructSerializer,
};
use trellis4rs_core::{BigDecimal, BigInt, ByteBuffer, Instant};

use crate::errors::JsonSerdeError;
use crate::{JsonSettings, member_name};

/// Serializer producing JSON bytes directly into a growable buffer.
pub struct JsonSerializer {
    buffer: Vec<u8>,
    settings: JsonSettings,
    // Discriminator queued for injection into the next structure opened
    // by a typed document.
    pending_type: Option<String>,
}

impl Default for JsonSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonSerializer {
    #[must_use]
    pub fn new() -> JsonSerializer {
        Self::with_settings(JsonSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: JsonSettings) -> JsonSerializer {
        JsonSerializer {
            buffer: Vec::with_capacity(128),
            settings,
            pending_type: None,
        }
    }

    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    fn push_escaped(&mut self, value: &str) {
        push_json_string(&mut self.buffer, value);
    }

    fn push_long(&mut self, value: i64) {
        let mut formatted = itoa::Buffer::new();
        self.buffer.extend_from_slice(formatted.format(value).as_bytes());
    }

    fn push_double(&mut self, value: f64) {
        if value.is_nan() {
            self.buffer.extend_from_slice(b"\"NaN\"");
        } else if value.is_infinite() {
            if value.is_sign_positive() {
                self.buffer.extend_from_slice(b"\"Infinity\"");
            } else {
                self.buffer.extend_from_slice(b"\"-Infinity\"");
            }
        } else if value == value.trunc()
            && value >= i64::MIN as f64
            && value <= i64::MAX as f64
        {
            // Whole-valued floats are emitted without a fractional part.
            self.push_long(value as i64);
        } else {
            let mut formatted = ryu::Buffer::new();
            self.buffer
                .extend_from_slice(formatted.format_finite(value).as_bytes());
        }
    }
}

fn push_json_string(buffer: &mut Vec<u8>, value: &str) {
    buffer.push(b'"');
    for byte in value.bytes() {
        match byte {
            b'"' => buffer.extend_from_slice(b"\\\""),
            b'\\' => buffer.extend_from_slice(b"\\\\"),
            b'\n' => buffer.extend_from_slice(b"\\n"),
            b'\r' => buffer.extend_from_slice(b"\\r"),
            b'\t' => buffer.extend_from_slice(b"\\t"),
            0x08 => buffer.extend_from_slice(b"\\b"),
            0x0C => buffer.extend_from_slice(b"\\f"),
            byte if byte < 0x20 => {
                buffer.extend_from_slice(format!("\\u{byte:04x}").as_bytes());
            }
            byte => buffer.push(byte),
        }
    }
    buffer.push(b'"');
}

impl<'a> Serializer for &'a mut JsonSerializer {
    type Ok = ();
    type Error = JsonSerdeError;

    type SerializeList = JsonAggregateSerializer<'a>;
    type SerializeMap = JsonAggregateSerializer<'a>;
    type SerializeStruct = JsonAggregateSerializer<'a>;

    fn write_struct(
        self,
        _schema: &SchemaRef,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.buffer.push(b'{');
        let mut state = State::First;
        if let Some(type_name) = self.pending_type.take() {
            let field = self.settings.type_field.clone();
            self.push_escaped(&field);
            self.buffer.push(b':');
            self.push_escaped(&type_name);
            state = State::Rest;
        }
        Ok(JsonAggregateSerializer { ser: self, state })
    }

    fn write_map(self, _schema: &SchemaRef, _len: usize) -> Result<Self::SerializeMap, Self::Error> {
        self.buffer.push(b'{');
        Ok(JsonAggregateSerializer {
            ser: self,
            state: State::First,
        })
    }

    fn write_list(
        self,
        _schema: &SchemaRef,
        _len: usize,
    ) -> Result<Self::SerializeList, Self::Error> {
        self.buffer.push(b'[');
        Ok(JsonAggregateSerializer {
            ser: self,
            state: State::First,
        })
    }

    fn write_boolean(self, _: &SchemaRef, value: bool) -> Result<(), Self::Error> {
        self.buffer
            .extend_from_slice(if value { b"true" } else { b"false" });
        Ok(())
    }

    fn write_byte(self, _: &SchemaRef, value: i8) -> Result<(), Self::Error> {
        self.push_long(i64::from(value));
        Ok(())
    }

    fn write_short(self, _: &SchemaRef, value: i16) -> Result<(), Self::Error> {
        self.push_long(i64::from(value));
        Ok(())
    }

    fn write_integer(self, _: &SchemaRef, value: i32) -> Result<(), Self::Error> {
        self.push_long(i64::from(value));
        Ok(())
    }

    fn write_long(self, _: &SchemaRef, value: i64) -> Result<(), Self::Error> {
        self.push_long(value);
        Ok(())
    }

    fn write_float(self, _: &SchemaRef, value: f32) -> Result<(), Self::Error> {
        self.push_double(f64::from(value));
        Ok(())
    }

    fn write_double(self, _: &SchemaRef, value: f64) -> Result<(), Self::Error> {
        self.push_double(value);
        Ok(())
    }

    fn write_big_integer(self, _: &SchemaRef, value: &BigInt) -> Result<(), Self::Error> {
        self.buffer.extend_from_slice(value.to_string().as_bytes());
        Ok(())
    }

    fn write_big_decimal(self, _: &SchemaRef, value: &BigDecimal) -> Result<(), Self::Error> {
        self.buffer.extend_from_slice(value.to_string().as_bytes());
        Ok(())
    }

    fn write_string(self, _: &SchemaRef, value: &str) -> Result<(), Self::Error> {
        self.push_escaped(value);
        Ok(())
    }

    fn write_blob(self, _: &SchemaRef, value: &ByteBuffer) -> Result<(), Self::Error> {
        let encoded = base64::encode(value.as_bytes());
        self.push_escaped(&encoded);
        Ok(())
    }

    fn write_timestamp(self, _: &SchemaRef, value: &Instant) -> Result<(), Self::Error> {
        let millis = value.epoch_milliseconds();
        if millis % 1000 == 0 {
            self.push_long(millis / 1000);
        } else {
            self.push_double(millis as f64 / 1000.0);
        }
        Ok(())
    }

    fn write_document(self, _schema: &SchemaRef, value: &Document) -> Result<(), Self::Error> {
        if matches!(
            value.schema().shape_type(),
            ShapeType::Structure | ShapeType::Union
        ) {
            let id = value
                .discriminator()
                .unwrap_or_else(|| value.schema().id());
            self.pending_type = Some(id.id().to_string());
        }
        value.serialize_contents(self)
    }

    fn write_null(self, _: &SchemaRef) -> Result<(), Self::Error> {
        self.buffer.extend_from_slice(b"null");
        Ok(())
    }

    fn skip(self, _: &SchemaRef) -> Result<(), Self::Error> {
        /* Non-present members are not written */
        Ok(())
    }
}

#[derive(PartialEq, Eq)]
enum State {
    First,
    Rest,
}

/// Writes commas between aggregate entries.
#[doc(hidden)]
pub struct JsonAggregateSerializer<'a> {
    ser: &'a mut JsonSerializer,
    state: State,
}

impl JsonAggregateSerializer<'_> {
    fn separate(&mut self) {
        if self.state == State::First {
            self.state = State::Rest;
        } else {
            self.ser.buffer.push(b',');
        }
    }
}

impl ListSerializer for JsonAggregateSerializer<'_> {
    type Ok = ();
    type Error = JsonSerdeError;

    fn serialize_element<T>(
        &mut self,
        element_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        self.separate();
        value.serialize_with_schema(element_schema, &mut *self.ser)
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        self.ser.buffer.push(b']');
        Ok(())
    }
}

impl MapSerializer for JsonAggregateSerializer<'_> {
    type Ok = ();
    type Error = JsonSerdeError;

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
        self.separate();
        // Keys serialize as JSON object keys regardless of their own kind.
        let key = key.serialize_with_schema(
            key_schema,
            trellis4rs_core::serde::KeySerializer::<JsonSerdeError>::new(),
        )?;
        self.ser.push_escaped(&key);
        self.ser.buffer.push(b':');
        value.serialize_with_schema(value_schema, &mut *self.ser)
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        self.ser.buffer.push(b'}');
        Ok(())
    }
}

impl StructSerializer for JsonAggregateSerializer<'_> {
    type Ok = ();
    type Error = JsonSerdeError;

    fn serialize_member<T>(
        &mut self,
        member_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        self.separate();
        let name = member_name(member_schema)?.to_string();
        self.ser.push_escaped(&name);
        self.ser.buffer.push(b':');
        value.serialize_with_schema(member_schema, &mut *self.ser)
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        self.ser.buffer.push(b'}');
        Ok(())
    }
}
