//! JSON deserialization built on `jiter`.

use std::str::FromStr;

use jiter::{Jiter, NumberAny, NumberInt, Peek};
use trellis4rs_core::schema::{Document, SchemaRef, ShapeType};
use trellis4rs_core::serde::de::Deserializer;
use trellis4rs_core::{BigDecimal, BigInt, ByteBuffer, IndexMap, Instant};

use crate::errors::JsonSerdeError;
use crate::JsonSettings;

pub struct JsonDeserializer<'de> {
    jiter: &'de mut Jiter<'de>,
    settings: JsonSettings,
}

impl<'de> JsonDeserializer<'de> {
    pub fn new(jiter: &'de mut Jiter<'de>) -> Self {
        Self::with_settings(jiter, JsonSettings::default())
    }

    pub fn with_settings(jiter: &'de mut Jiter<'de>, settings: JsonSettings) -> Self {
        JsonDeserializer { jiter, settings }
    }

    fn known_int(&mut self) -> Result<i64, JsonSerdeError> {
        let peek = self.jiter.peek()?;
        match self.jiter.known_number(peek)? {
            NumberAny::Int(NumberInt::Int(value)) => Ok(value),
            NumberAny::Int(NumberInt::BigInt(_)) => Err(JsonSerdeError::Deserialization(
                "Unexpected big integer value".to_string(),
            )),
            NumberAny::Float(_) => Err(JsonSerdeError::Deserialization(
                "Unexpected float value".to_string(),
            )),
        }
    }

    fn known_float(&mut self) -> Result<f64, JsonSerdeError> {
        let peek = self.jiter.peek()?;
        match self.jiter.known_number(peek)? {
            NumberAny::Int(NumberInt::Int(value)) => Ok(value as f64),
            NumberAny::Int(NumberInt::BigInt(_)) => Err(JsonSerdeError::Deserialization(
                "Unexpected big integer value".to_string(),
            )),
            NumberAny::Float(value) => Ok(value),
        }
    }

    /// Consume and discard the next value, whatever it is.
    fn skip_value(&mut self) -> Result<(), JsonSerdeError> {
        let peek = self.jiter.peek()?;
        if peek == Peek::Null {
            self.jiter.known_null()?;
        } else if peek == Peek::True || peek == Peek::False {
            self.jiter.known_bool(peek)?;
        } else if peek == Peek::String {
            self.jiter.known_str()?;
        } else if peek == Peek::Array {
            let mut next = self.jiter.next_array()?;
            while next.is_some() {
                self.skip_value()?;
                next = self.jiter.array_step()?;
            }
        } else if peek == Peek::Object {
            let mut key = self.jiter.next_object()?.map(str::to_string);
            while key.is_some() {
                self.skip_value()?;
                key = self.jiter.next_key()?.map(str::to_string);
            }
        } else {
            self.jiter.known_number(peek)?;
        }
        Ok(())
    }

    /// Materialize the next value as an untyped document.
    fn read_any_document(&mut self) -> Result<Document, JsonSerdeError> {
        let peek = self.jiter.peek()?;
        if peek == Peek::Null {
            self.jiter.known_null()?;
            Ok(Document::null())
        } else if peek == Peek::True || peek == Peek::False {
            Ok(Document::of(self.jiter.known_bool(peek)?))
        } else if peek == Peek::String {
            Ok(Document::of(self.jiter.known_str()?.to_string()))
        } else if peek == Peek::Array {
            let mut elements: Vec<Document> = Vec::new();
            let mut next = self.jiter.next_array()?;
            while next.is_some() {
                elements.push(self.read_any_document()?);
                next = self.jiter.array_step()?;
            }
            Ok(Document::of(elements))
        } else if peek == Peek::Object {
            let mut members: IndexMap<String, Document> = IndexMap::new();
            let mut key = self.jiter.next_object()?.map(str::to_string);
            while let Some(name) = key {
                members.insert(name, self.read_any_document()?);
                key = self.jiter.next_key()?.map(str::to_string);
            }
            // Structure documents carry their discriminator in the data;
            // `Document::extract_discriminator` parses it on demand.
            Ok(Document::of(members))
        } else {
            match self.jiter.known_number(peek)? {
                NumberAny::Int(NumberInt::Int(value)) => Ok(Document::of(value)),
                NumberAny::Int(NumberInt::BigInt(value)) => Ok(Document::of(value)),
                NumberAny::Float(value) => Ok(Document::of(value)),
            }
        }
    }
}

impl<'de> Deserializer<'de> for JsonDeserializer<'de> {
    type Error = JsonSerdeError;

    fn read_struct_with_unknown<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        mut consumer: impl FnMut(&mut T, &SchemaRef, &mut Self) -> Result<(), Self::Error>,
        mut on_unknown: impl FnMut(&mut T, &str),
    ) -> Result<T, Self::Error> {
        let is_union = schema.shape_type() == ShapeType::Union;
        let mut state = state;
        let mut key = self.jiter.next_object()?.map(str::to_string);
        while let Some(name) = key {
            match find_member(schema, &name) {
                Some(member_schema) => {
                    let member_schema = member_schema.clone();
                    consumer(&mut state, &member_schema, self)?;
                }
                None if name == self.settings.type_field => {
                    // Discriminators are protocol plumbing, not members.
                    self.skip_value()?;
                }
                None => {
                    if is_union && !self.settings.forward_unknown_members {
                        return Err(JsonSerdeError::UnknownUnionMember(name));
                    }
                    on_unknown(&mut state, &name);
                    self.skip_value()?;
                }
            }
            key = self.jiter.next_key()?.map(str::to_string);
        }
        Ok(state)
    }

    fn read_list<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        mut consumer: impl FnMut(&mut T, &SchemaRef, &mut Self) -> Result<(), Self::Error>,
    ) -> Result<T, Self::Error> {
        let element_schema = schema
            .get_member("member")
            .ok_or_else(|| {
                JsonSerdeError::Deserialization(format!(
                    "List schema `{}` is missing its `member` member",
                    schema.id()
                ))
            })?
            .clone();
        let mut state = state;
        let mut next = self.jiter.next_array()?;
        while next.is_some() {
            consumer(&mut state, &element_schema, self)?;
            next = self.jiter.array_step()?;
        }
        Ok(state)
    }

    fn read_string_map<T>(
        &mut self,
        schema: &SchemaRef,
        state: T,
        mut consumer: impl FnMut(&mut T, &SchemaRef, &str, &mut Self) -> Result<(), Self::Error>,
    ) -> Result<T, Self::Error> {
        let value_schema = schema
            .get_member("value")
            .ok_or_else(|| {
                JsonSerdeError::Deserialization(format!(
                    "Map schema `{}` is missing its `value` member",
                    schema.id()
                ))
            })?
            .clone();
        let mut state = state;
        let mut key = self.jiter.next_object()?.map(str::to_string);
        while let Some(name) = key {
            consumer(&mut state, &value_schema, &name, self)?;
            key = self.jiter.next_key()?.map(str::to_string);
        }
        Ok(state)
    }

    fn read_boolean(&mut self, _: &SchemaRef) -> Result<bool, Self::Error> {
        let peek = self.jiter.peek()?;
        Ok(self.jiter.known_bool(peek)?)
    }

    fn read_blob(&mut self, _: &SchemaRef) -> Result<ByteBuffer, Self::Error> {
        let encoded = self.jiter.known_str()?;
        let decoded = base64::decode(encoded)
            .map_err(|e| JsonSerdeError::Deserialization(format!("Invalid base64 blob: {e}")))?;
        Ok(ByteBuffer::from_bytes(&decoded))
    }

    fn read_byte(&mut self, _: &SchemaRef) -> Result<i8, Self::Error> {
        Ok(i8::try_from(self.known_int()?)?)
    }

    fn read_short(&mut self, _: &SchemaRef) -> Result<i16, Self::Error> {
        Ok(i16::try_from(self.known_int()?)?)
    }

    fn read_integer(&mut self, _: &SchemaRef) -> Result<i32, Self::Error> {
        Ok(i32::try_from(self.known_int()?)?)
    }

    fn read_long(&mut self, _: &SchemaRef) -> Result<i64, Self::Error> {
        self.known_int()
    }

    fn read_float(&mut self, _: &SchemaRef) -> Result<f32, Self::Error> {
        Ok(self.read_nonfinite_or_float()? as f32)
    }

    fn read_double(&mut self, _: &SchemaRef) -> Result<f64, Self::Error> {
        self.read_nonfinite_or_float()
    }

    fn read_big_integer(&mut self, _: &SchemaRef) -> Result<BigInt, Self::Error> {
        let peek = self.jiter.peek()?;
        match self.jiter.known_number(peek)? {
            NumberAny::Int(NumberInt::Int(value)) => Ok(BigInt::from(value)),
            NumberAny::Int(NumberInt::BigInt(value)) => Ok(value),
            NumberAny::Float(_) => Err(JsonSerdeError::Deserialization(
                "Unexpected float value".to_string(),
            )),
        }
    }

    fn read_big_decimal(&mut self, _: &SchemaRef) -> Result<BigDecimal, Self::Error> {
        let peek = self.jiter.peek()?;
        match self.jiter.known_number(peek)? {
            NumberAny::Int(NumberInt::Int(value)) => Ok(BigDecimal::from(value)),
            NumberAny::Int(NumberInt::BigInt(value)) => Ok(BigDecimal::from(value)),
            NumberAny::Float(value) => BigDecimal::try_from(value)
                .map_err(|e| JsonSerdeError::Deserialization(e.to_string())),
        }
    }

    fn read_string(&mut self, _: &SchemaRef) -> Result<String, Self::Error> {
        Ok(self.jiter.known_str()?.to_string())
    }

    fn read_timestamp(&mut self, _: &SchemaRef) -> Result<Instant, Self::Error> {
        let peek = self.jiter.peek()?;
        if peek == Peek::String {
            let value = self.jiter.known_str()?;
            return Instant::from_str(value)
                .map_err(|e| JsonSerdeError::Deserialization(format!("Invalid timestamp: {e}")));
        }
        let seconds = match self.jiter.known_number(peek)? {
            NumberAny::Int(NumberInt::Int(value)) => value as f64,
            NumberAny::Int(NumberInt::BigInt(_)) => {
                return Err(JsonSerdeError::Deserialization(
                    "Timestamp out of range".to_string(),
                ));
            }
            NumberAny::Float(value) => value,
        };
        Instant::from_epoch_milliseconds((seconds * 1000.0) as i64)
            .map_err(|e| JsonSerdeError::Deserialization(format!("Invalid timestamp: {e}")))
    }

    fn read_document(&mut self, _: &SchemaRef) -> Result<Document, Self::Error> {
        self.read_any_document()
    }

    fn is_null(&mut self) -> bool {
        matches!(self.jiter.peek(), Ok(Peek::Null))
    }

    fn read_null(&mut self) -> Result<(), Self::Error> {
        self.jiter.known_null()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        self.jiter.finish()?;
        Ok(())
    }
}

/// Look up a structure member by wire name, honoring `@jsonName`.
fn find_member<'s>(schema: &'s SchemaRef, name: &str) -> Option<&'s SchemaRef> {
    if let Some(member) = schema.get_member(name) {
        return Some(member);
    }
    schema.members().values().find(|member| {
        member
            .get_trait_as::<trellis4rs_core::schema::prelude::JsonNameTrait>()
            .is_some_and(|json_name| json_name.name() == name)
    })
}

impl JsonDeserializer<'_> {
    /// Floats additionally accept the strings `"NaN"`, `"Infinity"`, and
    /// `"-Infinity"`.
    fn read_nonfinite_or_float(&mut self) -> Result<f64, JsonSerdeError> {
        let peek = self.jiter.peek()?;
        if peek == Peek::String {
            return match self.jiter.known_str()? {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => Err(JsonSerdeError::Deserialization(format!(
                    "Unexpected string in number position: {other}"
                ))),
            };
        }
        self.known_float()
    }
}
