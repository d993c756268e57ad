use std::cmp::Ordering;

use bigdecimal::{FromPrimitive, ToPrimitive};
use thiserror::Error;

use crate::schema::prelude::{
    BIG_DECIMAL, BIG_INTEGER, BLOB, BOOLEAN, BYTE, DOCUMENT, DOUBLE, FLOAT, INTEGER, LONG, SHORT,
    STRING, TIMESTAMP,
};
use crate::schema::{Schema, SchemaRef, ShapeId, ShapeType};
use crate::serde::SchemaShape;
use crate::{BigDecimal, BigInt, ByteBuffer, IndexMap, Instant};
use crate::{lazy_schema, traits};

/// Name of the structure member codecs use to carry a document's
/// discriminator on the wire.
pub(crate) const TYPE_FIELD: &str = "__type";

/// A dynamically typed value from the Trellis data model.
///
/// Documents are a protocol-agnostic view of untyped data. Untyped
/// documents carry a prelude schema matching their kind; typed documents
/// (built from a modeled shape) carry the model's schema and a
/// discriminator so they can round-trip through any codec faithfully.
#[derive(Clone, PartialEq, Debug)]
pub struct Document {
    pub(crate) schema: SchemaRef,
    pub(crate) value: DocumentValue,
    pub(crate) discriminator: Option<ShapeId>,
}

/// The data stored inside a [`Document`].
#[derive(Clone, PartialEq, Debug)]
pub enum DocumentValue {
    Null,
    Number(NumberValue),
    Boolean(bool),
    Blob(ByteBuffer),
    String(String),
    Timestamp(Instant),
    List(Vec<Document>),
    Map(IndexMap<String, Document>),
}

/// Numbers in the Trellis data model.
///
/// *Note*: int-enum values are represented as integers.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberValue {
    Integer(NumberInteger),
    Float(NumberFloat),
}

/// Integer numeric types in the data model.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberInteger {
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInt(BigInt),
}

/// Floating-point numeric types in the data model.
#[derive(Debug, Clone, PartialEq)]
pub enum NumberFloat {
    Float(f32),
    Double(f64),
    BigDecimal(BigDecimal),
}

/// Errors raised by document conversions and comparisons.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Failed to convert document to {0}")]
    Conversion(&'static str),
    #[error("Malformed document discriminator: {0}")]
    Discriminator(String),
    #[error("Documents of type {0} cannot be compared")]
    Comparison(ShapeType),
    #[error("Failed to serialize document: {0}")]
    Serialization(String),
}

/// Flags controlling document equality.
///
/// Equality is strict by default; numeric promotion must be opted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocumentEquality(u32);

impl DocumentEquality {
    /// Values are equal only when their kinds match exactly.
    pub const STRICT: DocumentEquality = DocumentEquality(0);
    /// Numbers compare equal across numeric kinds when their promoted
    /// values are equal (e.g. `byte 1 == long 1`).
    pub const NUMERIC_PROMOTION: DocumentEquality = DocumentEquality(1);

    #[must_use]
    pub const fn contains(self, other: DocumentEquality) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for DocumentEquality {
    type Output = DocumentEquality;

    fn bitor(self, rhs: DocumentEquality) -> DocumentEquality {
        DocumentEquality(self.0 | rhs.0)
    }
}

impl Document {
    /// Wrap a host value in a document.
    ///
    /// Wrapping is a fixed point: `Document::of(document)` returns the
    /// document unchanged.
    #[must_use]
    pub fn of(value: impl Into<Document>) -> Document {
        value.into()
    }

    /// The null document.
    #[must_use]
    pub fn null() -> Document {
        Document {
            schema: DOCUMENT.clone(),
            value: DocumentValue::Null,
            discriminator: None,
        }
    }

    /// Get the schema of the document.
    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Get the value of the document.
    #[must_use]
    pub const fn value(&self) -> &DocumentValue {
        &self.value
    }

    /// The underlying data-model kind of the document.
    ///
    /// Enum documents report `String` and int-enum documents report
    /// `Integer`; the attached schema still carries the enum type for
    /// serialization.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        match self.schema.shape_type() {
            ShapeType::Enum => ShapeType::String,
            ShapeType::IntEnum => ShapeType::Integer,
            other => other,
        }
    }

    /// Get the discriminator (type ID) of a typed document.
    ///
    /// The discriminator is primarily used to implement polymorphism in
    /// deserialization; protocols set it when decoding typed documents.
    #[must_use]
    pub const fn discriminator(&self) -> Option<&ShapeId> {
        self.discriminator.as_ref()
    }

    /// Extract and parse the discriminator carried in the document data.
    ///
    /// Structure documents carry their discriminator in the `__type`
    /// member. Absence yields `None`; a malformed value is an error.
    pub fn extract_discriminator(&self) -> Result<Option<ShapeId>, DocumentError> {
        if let Some(id) = &self.discriminator {
            return Ok(Some(id.clone()));
        }
        let DocumentValue::Map(members) = &self.value else {
            return Ok(None);
        };
        let Some(type_member) = members.get(TYPE_FIELD) else {
            return Ok(None);
        };
        let Some(name) = type_member.as_string() else {
            return Err(DocumentError::Discriminator(
                "discriminator member is not a string".to_string(),
            ));
        };
        ShapeId::parse(name)
            .map(Some)
            .map_err(|error| DocumentError::Discriminator(error.to_string()))
    }

    /// Get the size of the document.
    ///
    /// **NOTE**: Scalar documents always return a size of 1.
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.value {
            DocumentValue::List(array) => array.len(),
            DocumentValue::Map(map) => map.len(),
            DocumentValue::Null => 0,
            _ => 1,
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self.value, DocumentValue::Null)
    }

    /// Compare two documents with the given equality flags.
    #[must_use]
    pub fn eq_with_flags(&self, other: &Document, flags: DocumentEquality) -> bool {
        if !flags.contains(DocumentEquality::NUMERIC_PROMOTION) {
            return self == other;
        }
        match (&self.value, &other.value) {
            (DocumentValue::Number(a), DocumentValue::Number(b)) => number_eq(a, b),
            (DocumentValue::List(a), DocumentValue::List(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(left, right)| left.eq_with_flags(right, flags))
            }
            (DocumentValue::Map(a), DocumentValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, left)| {
                        b.get(key)
                            .is_some_and(|right| left.eq_with_flags(right, flags))
                    })
            }
            _ => self.value == other.value,
        }
    }

    /// Order two documents.
    ///
    /// Ordering is defined only over numbers (with numeric promotion),
    /// strings, and timestamps; all other kinds error.
    pub fn compare(a: &Document, b: &Document) -> Result<Ordering, DocumentError> {
        match (&a.value, &b.value) {
            (DocumentValue::Number(left), DocumentValue::Number(right)) => number_cmp(left, right),
            (DocumentValue::String(left), DocumentValue::String(right)) => Ok(left.cmp(right)),
            (DocumentValue::Timestamp(left), DocumentValue::Timestamp(right)) => Ok(left
                .epoch_milliseconds()
                .cmp(&right.epoch_milliseconds())),
            _ => Err(DocumentError::Comparison(a.shape_type())),
        }
    }
}

impl SchemaShape for Document {
    fn schema(&self) -> &SchemaRef {
        &self.schema
    }
}

//////////////////////////////////////////////////////////////////
// Numeric promotion
//////////////////////////////////////////////////////////////////

fn integer_as_big(value: &NumberInteger) -> BigInt {
    match value {
        NumberInteger::Byte(v) => BigInt::from(*v),
        NumberInteger::Short(v) => BigInt::from(*v),
        NumberInteger::Integer(v) => BigInt::from(*v),
        NumberInteger::Long(v) => BigInt::from(*v),
        NumberInteger::BigInt(v) => v.clone(),
    }
}

fn float_as_f64(value: &NumberFloat) -> Option<f64> {
    match value {
        NumberFloat::Float(v) => Some(f64::from(*v)),
        NumberFloat::Double(v) => Some(*v),
        NumberFloat::BigDecimal(v) => v.to_f64(),
    }
}

fn number_eq(a: &NumberValue, b: &NumberValue) -> bool {
    match (a, b) {
        (NumberValue::Integer(left), NumberValue::Integer(right)) => {
            integer_as_big(left) == integer_as_big(right)
        }
        (NumberValue::Float(left), NumberValue::Float(right)) => {
            match (left, right) {
                // Big decimals compare without precision loss.
                (NumberFloat::BigDecimal(l), NumberFloat::BigDecimal(r)) => l == r,
                _ => float_as_f64(left)
                    .zip(float_as_f64(right))
                    .is_some_and(|(l, r)| l == r),
            }
        }
        (NumberValue::Integer(int), NumberValue::Float(float))
        | (NumberValue::Float(float), NumberValue::Integer(int)) => {
            let promoted = integer_as_big(int).to_f64();
            promoted
                .zip(float_as_f64(float))
                .is_some_and(|(l, r)| l == r)
        }
    }
}

fn number_cmp(a: &NumberValue, b: &NumberValue) -> Result<Ordering, DocumentError> {
    match (a, b) {
        (NumberValue::Integer(left), NumberValue::Integer(right)) => {
            Ok(integer_as_big(left).cmp(&integer_as_big(right)))
        }
        _ => {
            let left = match a {
                NumberValue::Integer(int) => integer_as_big(int).to_f64(),
                NumberValue::Float(float) => float_as_f64(float),
            };
            let right = match b {
                NumberValue::Integer(int) => integer_as_big(int).to_f64(),
                NumberValue::Float(float) => float_as_f64(float),
            };
            left.zip(right)
                .and_then(|(l, r)| l.partial_cmp(&r))
                .ok_or(DocumentError::Comparison(ShapeType::Double))
        }
    }
}

//////////////////////////////////////////////////////////////////
// AS-ers to borrow the document value as a type if possible
//////////////////////////////////////////////////////////////////

impl Document {
    /// Get the blob value of the document if it is a blob.
    #[must_use]
    pub const fn as_blob(&self) -> Option<&ByteBuffer> {
        if let DocumentValue::Blob(b) = &self.value {
            Some(b)
        } else {
            None
        }
    }

    /// Get the boolean value of the document if it is a boolean.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let DocumentValue::Boolean(b) = self.value {
            Some(b)
        } else {
            None
        }
    }

    /// Get the string value of the document if it is a string.
    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        if let DocumentValue::String(s) = &self.value {
            Some(s)
        } else {
            None
        }
    }

    /// Get the timestamp value of the document if it is a timestamp.
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&Instant> {
        if let DocumentValue::Timestamp(ts) = &self.value {
            Some(ts)
        } else {
            None
        }
    }

    /// Get the byte value of the document if it can be converted into one.
    #[must_use]
    pub fn as_byte(&self) -> Option<i8> {
        self.as_long().and_then(|value| value.try_into().ok())
    }

    /// Get the short value of the document if it can be converted into one.
    #[must_use]
    pub fn as_short(&self) -> Option<i16> {
        self.as_long().and_then(|value| value.try_into().ok())
    }

    /// Get the integer value of the document if it can be converted into one.
    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        self.as_long().and_then(|value| value.try_into().ok())
    }

    /// Get the long value of the document if it can be converted into one.
    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match &self.value {
            DocumentValue::Number(NumberValue::Integer(ni)) => match ni {
                NumberInteger::Byte(b) => Some(i64::from(*b)),
                NumberInteger::Short(s) => Some(i64::from(*s)),
                NumberInteger::Integer(i) => Some(i64::from(*i)),
                NumberInteger::Long(l) => Some(*l),
                NumberInteger::BigInt(big) => big.to_i64(),
            },
            _ => None,
        }
    }

    /// Get the float value of the document if it can be converted into one.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        self.as_double().map(|value| value as f32)
    }

    /// Get the double value of the document if it can be converted into one.
    ///
    /// Integer documents smooth over to their floating-point value.
    #[must_use]
    pub fn as_double(&self) -> Option<f64> {
        match &self.value {
            DocumentValue::Number(NumberValue::Float(nf)) => float_as_f64(nf),
            DocumentValue::Number(NumberValue::Integer(ni)) => integer_as_big(ni).to_f64(),
            _ => None,
        }
    }

    /// Get the big-integer value of the document if it can be converted
    /// into one.
    #[must_use]
    pub fn as_big_integer(&self) -> Option<BigInt> {
        match &self.value {
            DocumentValue::Number(NumberValue::Integer(ni)) => Some(integer_as_big(ni)),
            _ => None,
        }
    }

    /// Get the big-decimal value of the document if it can be converted
    /// into one.
    #[must_use]
    pub fn as_big_decimal(&self) -> Option<BigDecimal> {
        match &self.value {
            DocumentValue::Number(NumberValue::Float(NumberFloat::BigDecimal(big))) => {
                Some(big.clone())
            }
            DocumentValue::Number(NumberValue::Float(nf)) => {
                float_as_f64(nf).and_then(BigDecimal::from_f64)
            }
            DocumentValue::Number(NumberValue::Integer(ni)) => {
                Some(BigDecimal::from(integer_as_big(ni)))
            }
            _ => None,
        }
    }

    /// Get the list value of the document if it is a list.
    #[must_use]
    pub const fn as_list(&self) -> Option<&Vec<Document>> {
        if let DocumentValue::List(document_list) = &self.value {
            Some(document_list)
        } else {
            None
        }
    }

    /// Get the map value of the document if it is a map or a structure
    /// document.
    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Document>> {
        if let DocumentValue::Map(document_map) = &self.value {
            Some(document_map)
        } else {
            None
        }
    }

    /// Get a member of a map or structure document by name.
    #[must_use]
    pub fn get_member(&self, member_name: &str) -> Option<&Document> {
        self.as_map().and_then(|map| map.get(member_name))
    }
}

//////////////////////////////////////////////////////////////////
// Conversions of documents to host types
//////////////////////////////////////////////////////////////////

macro_rules! document_try_from {
    ($t:ty, $accessor:ident, $expected:literal) => {
        impl TryFrom<Document> for $t {
            type Error = DocumentError;

            fn try_from(value: Document) -> Result<Self, Self::Error> {
                value
                    .$accessor()
                    .ok_or(DocumentError::Conversion($expected))
            }
        }
    };
}

document_try_from!(bool, as_bool, "boolean");
document_try_from!(i8, as_byte, "i8");
document_try_from!(i16, as_short, "i16");
document_try_from!(i32, as_integer, "i32");
document_try_from!(i64, as_long, "i64");
document_try_from!(f32, as_float, "f32");
document_try_from!(f64, as_double, "f64");
document_try_from!(BigInt, as_big_integer, "BigInt");
document_try_from!(BigDecimal, as_big_decimal, "BigDecimal");

impl TryFrom<Document> for String {
    type Error = DocumentError;

    fn try_from(value: Document) -> Result<Self, Self::Error> {
        if let DocumentValue::String(s) = value.value {
            Ok(s)
        } else {
            Err(DocumentError::Conversion("string"))
        }
    }
}

impl TryFrom<Document> for ByteBuffer {
    type Error = DocumentError;

    fn try_from(value: Document) -> Result<Self, Self::Error> {
        if let DocumentValue::Blob(b) = value.value {
            Ok(b)
        } else {
            Err(DocumentError::Conversion("blob"))
        }
    }
}

impl TryFrom<Document> for Instant {
    type Error = DocumentError;

    fn try_from(value: Document) -> Result<Self, Self::Error> {
        if let DocumentValue::Timestamp(ts) = value.value {
            Ok(ts)
        } else {
            Err(DocumentError::Conversion("timestamp"))
        }
    }
}

impl<T: TryFrom<Document, Error = DocumentError>> TryFrom<Document> for Vec<T> {
    type Error = DocumentError;

    fn try_from(value: Document) -> Result<Self, Self::Error> {
        let DocumentValue::List(list) = value.value else {
            return Err(DocumentError::Conversion("list"));
        };
        let mut result = Vec::with_capacity(list.len());
        for document in list {
            result.push(T::try_from(document)?);
        }
        Ok(result)
    }
}

impl<T: TryFrom<Document, Error = DocumentError>> TryFrom<Document> for IndexMap<String, T> {
    type Error = DocumentError;

    fn try_from(value: Document) -> Result<Self, Self::Error> {
        let DocumentValue::Map(map) = value.value else {
            return Err(DocumentError::Conversion("map"));
        };
        let mut result = IndexMap::with_capacity(map.len());
        for (key, document) in map {
            result.insert(key, T::try_from(document)?);
        }
        Ok(result)
    }
}

//////////////////////////////////////////////////////////////////
// Conversions INTO document types
//////////////////////////////////////////////////////////////////

macro_rules! document_from {
    ($t:ty, $schema:ident, $value:expr) => {
        impl From<$t> for Document {
            fn from(value: $t) -> Self {
                Document {
                    schema: $schema.clone(),
                    value: $value(value),
                    discriminator: None,
                }
            }
        }
    };
}

document_from!(bool, BOOLEAN, DocumentValue::Boolean);
document_from!(String, STRING, DocumentValue::String);
document_from!(ByteBuffer, BLOB, DocumentValue::Blob);
document_from!(Instant, TIMESTAMP, DocumentValue::Timestamp);

impl From<&str> for Document {
    fn from(value: &str) -> Self {
        Document::of(value.to_string())
    }
}

macro_rules! number_document_from {
    ($t:ty, $schema:ident, $variant:expr) => {
        impl From<$t> for Document {
            fn from(value: $t) -> Self {
                Document {
                    schema: $schema.clone(),
                    value: DocumentValue::Number($variant(value)),
                    discriminator: None,
                }
            }
        }
    };
}

number_document_from!(i8, BYTE, |v| NumberValue::Integer(NumberInteger::Byte(v)));
number_document_from!(i16, SHORT, |v| NumberValue::Integer(NumberInteger::Short(
    v
)));
number_document_from!(i32, INTEGER, |v| NumberValue::Integer(
    NumberInteger::Integer(v)
));
number_document_from!(i64, LONG, |v| NumberValue::Integer(NumberInteger::Long(v)));
number_document_from!(BigInt, BIG_INTEGER, |v| NumberValue::Integer(
    NumberInteger::BigInt(v)
));
number_document_from!(f32, FLOAT, |v| NumberValue::Float(NumberFloat::Float(v)));
number_document_from!(f64, DOUBLE, |v| NumberValue::Float(NumberFloat::Double(v)));
number_document_from!(BigDecimal, BIG_DECIMAL, |v| NumberValue::Float(
    NumberFloat::BigDecimal(v)
));

lazy_schema!(
    LIST_DOCUMENT_SCHEMA,
    Schema::list_builder(DOCUMENT.id().clone(), traits![])
        .put_member("member", &DOCUMENT, traits![])
        .build()
);

impl<T: Into<Document>> From<Vec<T>> for Document {
    fn from(value: Vec<T>) -> Self {
        let result = value.into_iter().map(Into::into).collect();
        Document {
            schema: LIST_DOCUMENT_SCHEMA.clone(),
            value: DocumentValue::List(result),
            discriminator: None,
        }
    }
}

lazy_schema!(
    MAP_DOCUMENT_SCHEMA,
    Schema::map_builder(DOCUMENT.id().clone(), traits![])
        .put_member("key", &STRING, traits![])
        .put_member("value", &DOCUMENT, traits![])
        .build()
);

impl<T: Into<Document>> From<IndexMap<String, T>> for Document {
    fn from(value: IndexMap<String, T>) -> Self {
        let mut result = IndexMap::with_capacity(value.len());
        for (key, entry) in value {
            result.insert(key, entry.into());
        }
        Document {
            schema: MAP_DOCUMENT_SCHEMA.clone(),
            value: DocumentValue::Map(result),
            discriminator: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_document_value() {
        let document_str = Document::of("MyStr");
        assert_eq!(document_str.schema(), &*STRING);
        let output_str: String = document_str.try_into().unwrap();
        assert_eq!(output_str, "MyStr".to_string());
    }

    #[test]
    fn document_wrapping_is_a_fixed_point() {
        let document = Document::of(42i32);
        let rewrapped = Document::of(document.clone());
        assert_eq!(document, rewrapped);
    }

    #[test]
    fn list_document_value() {
        let document_list = Document::of(vec!["a", "b", "c"]);
        assert_eq!(document_list.schema(), &*LIST_DOCUMENT_SCHEMA);
        assert_eq!(document_list.size(), 3);
        let vec_out: Vec<String> = document_list.try_into().unwrap();
        assert_eq!(vec_out, ["a", "b", "c"]);
    }

    #[test]
    fn map_document_value() {
        let mut map_in: IndexMap<String, String> = IndexMap::new();
        map_in.insert("a".to_string(), "b".to_string());
        let map_doc = Document::of(map_in);
        assert_eq!(map_doc.schema(), &*MAP_DOCUMENT_SCHEMA);
        assert_eq!(map_doc.size(), 1);
        assert_eq!(map_doc.get_member("a").and_then(Document::as_string), Some("b"));

        let map_out: IndexMap<String, String> = map_doc.try_into().unwrap();
        assert_eq!(map_out["a"], "b");
    }

    #[test]
    fn integer_document_values() {
        let byte = Document::of(1i8);
        assert_eq!(byte.schema(), &*BYTE);
        let short = Document::of(1i16);
        assert_eq!(short.schema(), &*SHORT);
        let integer = Document::of(1i32);
        assert_eq!(integer.schema(), &*INTEGER);
        let long = Document::of(1i64);
        assert_eq!(long.schema(), &*LONG);

        let byte_value: i8 = byte.try_into().unwrap();
        assert_eq!(byte_value, 1i8);
        let short_value: i16 = short.try_into().unwrap();
        assert_eq!(short_value, 1i16);
        let integer_value: i32 = integer.try_into().unwrap();
        assert_eq!(integer_value, 1i32);
        let long_value: i64 = long.try_into().unwrap();
        assert_eq!(long_value, 1i64);
    }

    #[test]
    fn strict_equality_distinguishes_numeric_kinds() {
        let byte = Document::of(1i8);
        let long = Document::of(1i64);
        assert_ne!(byte, long);
        assert!(byte.eq_with_flags(&long, DocumentEquality::NUMERIC_PROMOTION));
        assert!(!byte.eq_with_flags(&long, DocumentEquality::STRICT));
    }

    #[test]
    fn promoted_equality_across_int_and_float() {
        let int = Document::of(2i32);
        let double = Document::of(2.0f64);
        assert!(int.eq_with_flags(&double, DocumentEquality::NUMERIC_PROMOTION));
        let not_equal = Document::of(2.5f64);
        assert!(!int.eq_with_flags(&not_equal, DocumentEquality::NUMERIC_PROMOTION));
    }

    #[test]
    fn map_equality_ignores_order() {
        let mut a: IndexMap<String, i32> = IndexMap::new();
        a.insert("x".into(), 1);
        a.insert("y".into(), 2);
        let mut b: IndexMap<String, i32> = IndexMap::new();
        b.insert("y".into(), 2);
        b.insert("x".into(), 1);
        assert_eq!(Document::of(a), Document::of(b));
    }

    #[test]
    fn compares_numbers_and_strings() {
        let small = Document::of(1i32);
        let large = Document::of(2i64);
        assert_eq!(Document::compare(&small, &large).unwrap(), Ordering::Less);

        let a = Document::of("a");
        let b = Document::of("b");
        assert_eq!(Document::compare(&a, &b).unwrap(), Ordering::Less);

        let boolean = Document::of(true);
        assert!(Document::compare(&boolean, &a).is_err());
    }

    #[test]
    fn discriminator_extraction() {
        let mut members: IndexMap<String, Document> = IndexMap::new();
        members.insert(TYPE_FIELD.to_string(), Document::of("com.example#Shape"));
        let document = Document::of(members);
        let id = document.extract_discriminator().unwrap();
        assert_eq!(id, Some(ShapeId::from("com.example#Shape")));
    }

    #[test]
    fn malformed_discriminator_is_an_error() {
        let mut members: IndexMap<String, Document> = IndexMap::new();
        members.insert(TYPE_FIELD.to_string(), Document::of("not-a-shape-id"));
        let document = Document::of(members);
        assert!(document.extract_discriminator().is_err());
    }

    #[test]
    fn missing_discriminator_is_none() {
        let document = Document::of(5i32);
        assert_eq!(document.extract_discriminator().unwrap(), None);
    }
}
