//! Pre-defined trait implementations for the base model.

use std::fmt::{self, Display, Formatter};

use bigdecimal::BigDecimal;
use regex::Regex;

use crate::annotation_trait;
use crate::lazy_shape_id;
use crate::schema::{
    DocumentValue, NumberInteger, NumberValue, ShapeId, ShapeTrait, StaticTraitId,
};

macro_rules! static_id {
    ($trait_struct:ident, $id_var:ident, $id_name:literal) => {
        lazy_shape_id!($id_var, $id_name);
        impl StaticTraitId for $trait_struct {
            fn trait_id() -> &'static ShapeId {
                &$id_var
            }
        }
    };
}

// ==== Annotation traits ====
annotation_trait!(RequiredTrait, REQUIRED_TRAIT_ID, "trellis.api#required");
annotation_trait!(SensitiveTrait, SENSITIVE_TRAIT_ID, "trellis.api#sensitive");
annotation_trait!(SparseTrait, SPARSE_TRAIT_ID, "trellis.api#sparse");
annotation_trait!(StreamingTrait, STREAMING_TRAIT_ID, "trellis.api#streaming");
annotation_trait!(InternalTrait, INTERNAL_TRAIT_ID, "trellis.api#internal");
annotation_trait!(
    UniqueItemsTrait,
    UNIQUE_ITEMS_TRAIT_ID,
    "trellis.api#uniqueItems"
);
annotation_trait!(
    IdempotencyTokenTrait,
    IDEMPOTENCY_TOKEN_TRAIT_ID,
    "trellis.api#idempotencyToken"
);
annotation_trait!(UnitTypeTrait, UNIT_TYPE_TRAIT_ID, "trellis.api#unitType");

// ==== Traits with values ====

/// Gives a member a default value, making it non-nullable without
/// requiring the caller to provide it.
#[derive(Debug)]
pub struct DefaultTrait(DocumentValue);
static_id!(DefaultTrait, DEFAULT_TRAIT_ID, "trellis.api#default");
impl DefaultTrait {
    #[must_use]
    pub const fn new(value: DocumentValue) -> Self {
        DefaultTrait(value)
    }

    /// The modeled default value.
    #[must_use]
    pub const fn default_value(&self) -> &DocumentValue {
        &self.0
    }
}
impl ShapeTrait for DefaultTrait {
    fn id(&self) -> &ShapeId {
        DefaultTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.0
    }
}

/// Constrains the length of strings (in characters), blobs (in bytes),
/// and lists/maps (in entries).
#[derive(Debug)]
pub struct LengthTrait {
    min: Option<usize>,
    max: Option<usize>,
    value: DocumentValue,
}
static_id!(LengthTrait, LENGTH_TRAIT_ID, "trellis.api#length");
impl LengthTrait {
    #[must_use]
    pub fn builder() -> LengthTraitBuilder {
        LengthTraitBuilder::default()
    }

    #[must_use]
    pub const fn min(&self) -> Option<usize> {
        self.min
    }

    #[must_use]
    pub const fn max(&self) -> Option<usize> {
        self.max
    }
}
impl ShapeTrait for LengthTrait {
    fn id(&self) -> &ShapeId {
        LengthTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

#[derive(Debug, Default)]
pub struct LengthTraitBuilder {
    min: Option<usize>,
    max: Option<usize>,
}
impl LengthTraitBuilder {
    #[must_use]
    pub const fn min(mut self, min: usize) -> Self {
        self.min = Some(min);
        self
    }

    #[must_use]
    pub const fn max(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn build(self) -> LengthTrait {
        let mut bounds = crate::IndexMap::new();
        if let Some(min) = self.min {
            bounds.insert("min".to_string(), (min as i64).into());
        }
        if let Some(max) = self.max {
            bounds.insert("max".to_string(), (max as i64).into());
        }
        LengthTrait {
            min: self.min,
            max: self.max,
            value: DocumentValue::Map(bounds),
        }
    }
}

/// Constrains numeric values to an inclusive, arbitrary-precision range.
#[derive(Debug)]
pub struct RangeTrait {
    min: Option<BigDecimal>,
    max: Option<BigDecimal>,
    value: DocumentValue,
}
static_id!(RangeTrait, RANGE_TRAIT_ID, "trellis.api#range");
impl RangeTrait {
    #[must_use]
    pub fn builder() -> RangeTraitBuilder {
        RangeTraitBuilder::default()
    }

    #[must_use]
    pub const fn min(&self) -> Option<&BigDecimal> {
        self.min.as_ref()
    }

    #[must_use]
    pub const fn max(&self) -> Option<&BigDecimal> {
        self.max.as_ref()
    }
}
impl ShapeTrait for RangeTrait {
    fn id(&self) -> &ShapeId {
        RangeTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

#[derive(Debug, Default)]
pub struct RangeTraitBuilder {
    min: Option<BigDecimal>,
    max: Option<BigDecimal>,
}
impl RangeTraitBuilder {
    #[must_use]
    pub fn min(mut self, min: impl Into<BigDecimal>) -> Self {
        self.min = Some(min.into());
        self
    }

    #[must_use]
    pub fn max(mut self, max: impl Into<BigDecimal>) -> Self {
        self.max = Some(max.into());
        self
    }

    #[must_use]
    pub fn build(self) -> RangeTrait {
        let mut bounds = crate::IndexMap::new();
        if let Some(min) = &self.min {
            bounds.insert("min".to_string(), min.to_string().into());
        }
        if let Some(max) = &self.max {
            bounds.insert("max".to_string(), max.to_string().into());
        }
        RangeTrait {
            min: self.min,
            max: self.max,
            value: DocumentValue::Map(bounds),
        }
    }
}

/// Constrains string values to a regular expression.
#[derive(Debug)]
pub struct PatternTrait {
    pattern: Regex,
    value: DocumentValue,
}
static_id!(PatternTrait, PATTERN_TRAIT_ID, "trellis.api#pattern");
impl PatternTrait {
    /// Compile a pattern trait.
    ///
    /// Patterns come from static model definitions, so an invalid regular
    /// expression is a startup bug.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        let compiled = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(error) => panic!("Invalid @pattern regular expression `{pattern}`: {error}"),
        };
        PatternTrait {
            pattern: compiled,
            value: DocumentValue::String(pattern.to_string()),
        }
    }

    #[must_use]
    pub const fn pattern(&self) -> &Regex {
        &self.pattern
    }
}
impl ShapeTrait for PatternTrait {
    fn id(&self) -> &ShapeId {
        PatternTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

/// Fault classification carried by the `@error` trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFault {
    Client,
    Server,
}
impl Display for ErrorFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ErrorFault::Client => write!(f, "client"),
            ErrorFault::Server => write!(f, "server"),
        }
    }
}

/// Marks a structure as an error shape with a default fault.
#[derive(Debug)]
pub struct ErrorTrait {
    fault: ErrorFault,
    value: DocumentValue,
}
static_id!(ErrorTrait, ERROR_TRAIT_ID, "trellis.api#error");
impl ErrorTrait {
    #[must_use]
    pub fn new(fault: ErrorFault) -> Self {
        ErrorTrait {
            value: DocumentValue::String(fault.to_string()),
            fault,
        }
    }

    #[must_use]
    pub const fn fault(&self) -> ErrorFault {
        self.fault
    }
}
impl ShapeTrait for ErrorTrait {
    fn id(&self) -> &ShapeId {
        ErrorTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

/// Customizes the HTTP status code of an error shape.
#[derive(Debug)]
pub struct HttpErrorTrait {
    code: u16,
    value: DocumentValue,
}
static_id!(HttpErrorTrait, HTTP_ERROR_TRAIT_ID, "trellis.api#httpError");
impl HttpErrorTrait {
    #[must_use]
    pub fn new(code: u16) -> Self {
        assert!(
            (200..600).contains(&code),
            "@httpError code out of range: {code}"
        );
        HttpErrorTrait {
            code,
            value: DocumentValue::Number(NumberValue::Integer(NumberInteger::Integer(i32::from(
                code,
            )))),
        }
    }

    #[must_use]
    pub const fn code(&self) -> u16 {
        self.code
    }
}
impl ShapeTrait for HttpErrorTrait {
    fn id(&self) -> &ShapeId {
        HttpErrorTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

/// Customizes the name of a member when serialized by a JSON protocol.
#[derive(Debug)]
pub struct JsonNameTrait {
    name: String,
    value: DocumentValue,
}
static_id!(JsonNameTrait, JSON_NAME_TRAIT_ID, "trellis.api#jsonName");
impl JsonNameTrait {
    #[must_use]
    pub fn new(name: &str) -> Self {
        JsonNameTrait {
            name: name.to_string(),
            value: DocumentValue::String(name.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl ShapeTrait for JsonNameTrait {
    fn id(&self) -> &ShapeId {
        JsonNameTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

/// Declares the media type of blob or string content.
#[derive(Debug)]
pub struct MediaTypeTrait {
    media_type: String,
    value: DocumentValue,
}
static_id!(MediaTypeTrait, MEDIA_TYPE_TRAIT_ID, "trellis.api#mediaType");
impl MediaTypeTrait {
    #[must_use]
    pub fn new(media_type: &str) -> Self {
        MediaTypeTrait {
            media_type: media_type.to_string(),
            value: DocumentValue::String(media_type.to_string()),
        }
    }

    #[must_use]
    pub fn media_type(&self) -> &str {
        &self.media_type
    }
}
impl ShapeTrait for MediaTypeTrait {
    fn id(&self) -> &ShapeId {
        MediaTypeTrait::trait_id()
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}
