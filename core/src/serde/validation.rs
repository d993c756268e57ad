//! # Streaming validation
//!
//! The validator decorates the write side of the serde protocol: a value
//! is "written" into a validating serializer, and every write is checked
//! against the attached schema. Validation is best-effort and
//! accumulates; it never panics and never throws past the caller.
//! Callers inspect the resulting error list — an empty list means the
//! value is schema-valid.
//!
//! Validation is bounded in two ways:
//! - `max_depth` (default 100): exceeding it records one error at the
//!   offending path and rejects further descent on that branch;
//! - `max_allowed_errors` (default unbounded): reaching it stops all
//!   subsequent checks for the current top-level call.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::schema::prelude::{SparseTrait, UniqueItemsTrait};
use crate::schema::{Document, SchemaRef, ShapeType, ValidationState};
use crate::serde::presence::PresenceTracker;
use crate::serde::se::{
    Error as SerdeError, ListSerializer, MapSerializer, SerializeWithSchema, Serializer,
    StructSerializer,
};
use crate::serde::utils::KeySerializer;
use crate::stream::{DataStream, EventStreamRef};
use crate::{BigDecimal, BigInt, ByteBuffer, Instant};

/// Default maximum nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 100;

// ============================================================================
// Errors
// ============================================================================

/// A single validation failure at a path within the validated value.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    path: String,
    error: ValidationErrorKind,
}

impl ValidationError {
    /// Slash-delimited path of the offending value (`/` for the root).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn kind(&self) -> &ValidationErrorKind {
        &self.error
    }

    #[must_use]
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// The taxonomy of validation failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationErrorKind {
    #[error("Expected a {expected} value, but found {found}")]
    Type {
        expected: ShapeType,
        found: ShapeType,
    },
    #[error("Missing required member: {0}")]
    Required(String),
    #[error("Value must satisfy regular expression pattern: {0}")]
    Pattern(String),
    #[error("Value is not a member of the enum")]
    Enum,
    #[error("Value is not a member of the int enum")]
    IntEnum,
    #[error("{0}")]
    Range(String),
    #[error("{0}")]
    Length(String),
    #[error("Value is too deeply nested")]
    Depth,
    #[error("No member is set in the union")]
    UnionNoMember,
    #[error("Union member conflicts with '{0}'")]
    UnionConflict(String),
    #[error("Null values are not allowed in a non-sparse container")]
    Sparse,
    #[error("{0}")]
    UniqueItemConflict(String),
    #[error("{0}")]
    Custom(String),
}

/// Accumulated list of validation failures.
#[derive(Error, Debug)]
#[error("Validation failed with {} error(s)", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl SerdeError for ValidationErrors {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        ValidationErrors {
            errors: vec![ValidationError {
                path: "/".to_string(),
                error: ValidationErrorKind::Custom(msg.to_string()),
            }],
        }
    }
}

// ============================================================================
// Validator
// ============================================================================

/// Streaming validator configuration.
#[derive(Debug, Clone)]
pub struct Validator {
    max_depth: usize,
    max_allowed_errors: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::default()
    }

    /// Validate a single value against a schema.
    pub fn validate<T: SerializeWithSchema + ?Sized>(
        &self,
        schema: &SchemaRef,
        value: &T,
    ) -> Result<(), ValidationErrors> {
        let mut session = self.start();
        session.write(schema, value);
        session.finish()
    }

    /// Start a validation session accepting multiple top-level writes.
    #[must_use]
    pub fn start(&self) -> ValidationSession {
        ValidationSession {
            ctx: ValidatorContext {
                errors: Vec::new(),
                path: Vec::new(),
                depth: 0,
                max_depth: self.max_depth,
                max_errors: self.max_allowed_errors,
                overflowed: false,
                last_was_null: false,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidatorBuilder {
    max_depth: usize,
    max_allowed_errors: usize,
}

impl Default for ValidatorBuilder {
    fn default() -> Self {
        ValidatorBuilder {
            max_depth: DEFAULT_MAX_DEPTH,
            max_allowed_errors: usize::MAX,
        }
    }
}

impl ValidatorBuilder {
    #[must_use]
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub const fn max_allowed_errors(mut self, max_allowed_errors: usize) -> Self {
        self.max_allowed_errors = max_allowed_errors;
        self
    }

    #[must_use]
    pub const fn build(self) -> Validator {
        Validator {
            max_depth: self.max_depth,
            max_allowed_errors: self.max_allowed_errors,
        }
    }
}

/// An in-flight validation accepting one or more top-level writes.
pub struct ValidationSession {
    ctx: ValidatorContext,
}

impl ValidationSession {
    /// Validate one value; failures accumulate in the session.
    pub fn write<T: SerializeWithSchema + ?Sized>(&mut self, schema: &SchemaRef, value: &T) {
        let result = value.serialize_with_schema(
            schema,
            ValidatorSerializer {
                ctx: &mut self.ctx,
                container: None,
            },
        );
        if let Err(mut raised) = result {
            self.ctx.errors.append(&mut raised.errors);
        }
    }

    /// Finish the session, returning all accumulated failures.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.ctx.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.ctx.errors,
            })
        }
    }
}

// ============================================================================
// Internal state
// ============================================================================

#[derive(Debug)]
enum PathSegment {
    Member(String),
    Index(usize),
    Key(String),
}

struct ValidatorContext {
    errors: Vec<ValidationError>,
    // Path segments are pushed and popped as validation descends; the
    // buffer grows geometrically with the deepest branch seen.
    path: Vec<PathSegment>,
    depth: usize,
    max_depth: usize,
    max_errors: usize,
    overflowed: bool,
    last_was_null: bool,
}

impl ValidatorContext {
    fn path_string(&self) -> String {
        if self.path.is_empty() {
            return "/".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            out.push('/');
            match segment {
                PathSegment::Member(name) | PathSegment::Key(name) => out.push_str(name),
                PathSegment::Index(index) => {
                    let _ = write!(out, "{index}");
                }
            }
        }
        out
    }

    fn record(&mut self, error: ValidationErrorKind) {
        if self.overflowed {
            return;
        }
        self.errors.push(ValidationError {
            path: self.path_string(),
            error,
        });
        if self.errors.len() >= self.max_errors {
            self.overflowed = true;
        }
    }

    /// Check the written kind against the schema type. Document-typed
    /// schemas accept any value (and skip constraint checks).
    fn check_type(&mut self, schema: &SchemaRef, found: ShapeType, allowed: &[ShapeType]) -> Kind {
        let schema_type = schema.shape_type();
        if schema_type == ShapeType::Document {
            return Kind::Unconstrained;
        }
        if allowed.contains(&schema_type) {
            Kind::Checked
        } else {
            self.record(ValidationErrorKind::Type {
                expected: schema_type,
                found,
            });
            Kind::Mismatch
        }
    }

    fn check_length(&mut self, state: &ValidationState, size: usize) {
        if state.has_length && (size < state.min_length || size > state.max_length) {
            self.record(ValidationErrorKind::Length(length_message(state)));
        }
    }

    fn check_long_range(&mut self, state: &ValidationState, value: i64) {
        if state.range.is_some() && (value < state.min_long || value > state.max_long) {
            self.record(ValidationErrorKind::Range(range_message(state)));
        }
    }

    fn check_double_range(&mut self, state: &ValidationState, value: f64) {
        if state.range.is_some() && (value < state.min_double || value > state.max_double) {
            self.record(ValidationErrorKind::Range(range_message(state)));
        }
    }

    fn check_big_range(&mut self, state: &ValidationState, value: &BigDecimal) {
        let Some((min, max)) = &state.range else {
            return;
        };
        let below = min.as_ref().is_some_and(|min| value < min);
        let above = max.as_ref().is_some_and(|max| value > max);
        if below || above {
            self.record(ValidationErrorKind::Range(range_message(state)));
        }
    }

    fn check_string(&mut self, schema: &SchemaRef, value: &str) {
        if let Some(enum_schema) = schema.as_enum()
            && !enum_schema.values.contains(value)
        {
            self.record(ValidationErrorKind::Enum);
        }
        let state = schema.validation_state();
        if state.has_length {
            self.check_length(state, value.chars().count());
        }
        if let Some(pattern) = &state.pattern
            && !pattern.is_match(value)
        {
            self.record(ValidationErrorKind::Pattern(pattern.as_str().to_string()));
        }
    }

    /// Enter an aggregate, enforcing the depth cap. Returns false when the
    /// branch is rejected (the error is recorded at the current path).
    fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.record(ValidationErrorKind::Depth);
            false
        } else {
            self.depth += 1;
            true
        }
    }

    fn exit(&mut self) {
        self.depth -= 1;
    }
}

enum Kind {
    /// Schema type matches; apply constraint checks.
    Checked,
    /// Document-typed schema; accept without checks.
    Unconstrained,
    /// Mismatch recorded; skip the value.
    Mismatch,
}

fn range_message(state: &ValidationState) -> String {
    match &state.range {
        Some((Some(min), Some(max))) => {
            format!("Value must be between {min} and {max}, inclusive")
        }
        Some((Some(min), None)) => format!("Value must be greater than or equal to {min}"),
        Some((None, Some(max))) => format!("Value must be less than or equal to {max}"),
        _ => "Value is out of range".to_string(),
    }
}

fn length_message(state: &ValidationState) -> String {
    match (state.min_length > 0, state.max_length < usize::MAX) {
        (true, true) => format!(
            "Value must have length between {} and {}, inclusive",
            state.min_length, state.max_length
        ),
        (true, false) => format!("Value must have length of at least {}", state.min_length),
        _ => format!("Value must have length of at most {}", state.max_length),
    }
}

// ============================================================================
// Validating serializer
// ============================================================================

/// The serializer decorator that performs the checks.
pub struct ValidatorSerializer<'a> {
    ctx: &'a mut ValidatorContext,
    /// Aggregate schema the value is nested in; `None` at the top level.
    container: Option<SchemaRef>,
}

impl<'a> Serializer for ValidatorSerializer<'a> {
    type Ok = ();
    type Error = ValidationErrors;
    type SerializeList = ValidatorListSerializer<'a>;
    type SerializeMap = ValidatorMapSerializer<'a>;
    type SerializeStruct = ValidatorStructSerializer<'a>;

    fn write_struct(
        self,
        schema: &SchemaRef,
        _len: usize,
    ) -> Result<Self::SerializeStruct, Self::Error> {
        self.ctx.last_was_null = false;
        let shape_type = schema.shape_type();
        let mut skip_all = self.ctx.overflowed;
        let mut entered = false;
        if !skip_all {
            match self.ctx.check_type(
                schema,
                ShapeType::Structure,
                &[ShapeType::Structure, ShapeType::Union],
            ) {
                Kind::Checked => {
                    entered = self.ctx.enter();
                    skip_all = !entered;
                }
                Kind::Unconstrained | Kind::Mismatch => skip_all = true,
            }
        }
        Ok(ValidatorStructSerializer {
            tracker: if skip_all {
                PresenceTracker::NoOp
            } else {
                PresenceTracker::of(schema)
            },
            is_union: shape_type == ShapeType::Union,
            schema: schema.clone(),
            set_count: 0,
            first_set: None,
            skip_all,
            entered,
            ctx: self.ctx,
        })
    }

    fn write_map(self, schema: &SchemaRef, _len: usize) -> Result<Self::SerializeMap, Self::Error> {
        self.ctx.last_was_null = false;
        let mut skip_all = self.ctx.overflowed;
        let mut entered = false;
        if !skip_all {
            match self.ctx.check_type(schema, ShapeType::Map, &[ShapeType::Map]) {
                Kind::Checked => {
                    entered = self.ctx.enter();
                    skip_all = !entered;
                }
                Kind::Unconstrained | Kind::Mismatch => skip_all = true,
            }
        }
        Ok(ValidatorMapSerializer {
            schema: schema.clone(),
            size: 0,
            skip_all,
            entered,
            ctx: self.ctx,
        })
    }

    fn write_list(
        self,
        schema: &SchemaRef,
        _len: usize,
    ) -> Result<Self::SerializeList, Self::Error> {
        self.ctx.last_was_null = false;
        let mut skip_all = self.ctx.overflowed;
        let mut entered = false;
        if !skip_all {
            match self
                .ctx
                .check_type(schema, ShapeType::List, &[ShapeType::List])
            {
                Kind::Checked => {
                    entered = self.ctx.enter();
                    skip_all = !entered;
                }
                Kind::Unconstrained | Kind::Mismatch => skip_all = true,
            }
        }
        let unique = !skip_all && schema.contains_type::<UniqueItemsTrait>();
        Ok(ValidatorListSerializer {
            schema: schema.clone(),
            index: 0,
            seen: unique.then(FxHashSet::default),
            skip_all,
            entered,
            ctx: self.ctx,
        })
    }

    fn write_boolean(self, schema: &SchemaRef, _value: bool) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if !self.ctx.overflowed {
            let _ = self
                .ctx
                .check_type(schema, ShapeType::Boolean, &[ShapeType::Boolean]);
        }
        Ok(())
    }

    fn write_byte(self, schema: &SchemaRef, value: i8) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self
            .ctx
            .check_type(schema, ShapeType::Byte, &[ShapeType::Byte])
        {
            self.ctx
                .check_long_range(schema.validation_state(), i64::from(value));
        }
        Ok(())
    }

    fn write_short(self, schema: &SchemaRef, value: i16) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self
            .ctx
            .check_type(schema, ShapeType::Short, &[ShapeType::Short])
        {
            self.ctx
                .check_long_range(schema.validation_state(), i64::from(value));
        }
        Ok(())
    }

    fn write_integer(self, schema: &SchemaRef, value: i32) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        match self.ctx.check_type(
            schema,
            ShapeType::Integer,
            &[ShapeType::Integer, ShapeType::IntEnum],
        ) {
            Kind::Checked => {
                if let Some(int_enum) = schema.as_int_enum() {
                    if !int_enum.values.contains(&value) {
                        self.ctx.record(ValidationErrorKind::IntEnum);
                    }
                } else {
                    self.ctx
                        .check_long_range(schema.validation_state(), i64::from(value));
                }
            }
            Kind::Unconstrained | Kind::Mismatch => {}
        }
        Ok(())
    }

    fn write_long(self, schema: &SchemaRef, value: i64) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self
            .ctx
            .check_type(schema, ShapeType::Long, &[ShapeType::Long])
        {
            self.ctx.check_long_range(schema.validation_state(), value);
        }
        Ok(())
    }

    fn write_float(self, schema: &SchemaRef, value: f32) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self
            .ctx
            .check_type(schema, ShapeType::Float, &[ShapeType::Float])
        {
            self.ctx
                .check_double_range(schema.validation_state(), f64::from(value));
        }
        Ok(())
    }

    fn write_double(self, schema: &SchemaRef, value: f64) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self
            .ctx
            .check_type(schema, ShapeType::Double, &[ShapeType::Double])
        {
            self.ctx.check_double_range(schema.validation_state(), value);
        }
        Ok(())
    }

    fn write_big_integer(
        self,
        schema: &SchemaRef,
        value: &BigInt,
    ) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked =
            self.ctx
                .check_type(schema, ShapeType::BigInteger, &[ShapeType::BigInteger])
        {
            self.ctx
                .check_big_range(schema.validation_state(), &BigDecimal::from(value.clone()));
        }
        Ok(())
    }

    fn write_big_decimal(
        self,
        schema: &SchemaRef,
        value: &BigDecimal,
    ) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked =
            self.ctx
                .check_type(schema, ShapeType::BigDecimal, &[ShapeType::BigDecimal])
        {
            self.ctx.check_big_range(schema.validation_state(), value);
        }
        Ok(())
    }

    fn write_string(self, schema: &SchemaRef, value: &str) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self.ctx.check_type(
            schema,
            ShapeType::String,
            &[ShapeType::String, ShapeType::Enum],
        ) {
            self.ctx.check_string(schema, value);
        }
        Ok(())
    }

    fn write_blob(self, schema: &SchemaRef, value: &ByteBuffer) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if self.ctx.overflowed {
            return Ok(());
        }
        if let Kind::Checked = self
            .ctx
            .check_type(schema, ShapeType::Blob, &[ShapeType::Blob])
        {
            let state = schema.validation_state();
            self.ctx.check_length(state, value.len());
        }
        Ok(())
    }

    fn write_timestamp(self, schema: &SchemaRef, _value: &Instant) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if !self.ctx.overflowed {
            let _ = self
                .ctx
                .check_type(schema, ShapeType::Timestamp, &[ShapeType::Timestamp]);
        }
        Ok(())
    }

    fn write_document(self, schema: &SchemaRef, _value: &Document) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        if !self.ctx.overflowed {
            let _ = self
                .ctx
                .check_type(schema, ShapeType::Document, &[ShapeType::Document]);
        }
        Ok(())
    }

    fn write_null(self, schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        let _ = schema;
        self.ctx.last_was_null = true;
        if self.ctx.overflowed {
            return Ok(());
        }
        match &self.container {
            // Top-level nulls have no container context and are ignored.
            None => {}
            Some(container) => {
                if !container.contains_type::<SparseTrait>() {
                    self.ctx.record(ValidationErrorKind::Sparse);
                }
            }
        }
        Ok(())
    }

    fn write_data_stream(
        self,
        _schema: &SchemaRef,
        _value: &DataStream,
    ) -> Result<Self::Ok, Self::Error> {
        // Streams carry no validatable value.
        self.ctx.last_was_null = false;
        Ok(())
    }

    fn write_event_stream(
        self,
        _schema: &SchemaRef,
        _value: &EventStreamRef,
    ) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        Ok(())
    }

    fn skip(self, _schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        self.ctx.last_was_null = false;
        Ok(())
    }
}

// ============================================================================
// Aggregate validators
// ============================================================================

pub struct ValidatorStructSerializer<'a> {
    ctx: &'a mut ValidatorContext,
    schema: SchemaRef,
    tracker: PresenceTracker,
    is_union: bool,
    set_count: usize,
    first_set: Option<String>,
    skip_all: bool,
    entered: bool,
}

impl StructSerializer for ValidatorStructSerializer<'_> {
    type Ok = ();
    type Error = ValidationErrors;

    fn serialize_member<T>(
        &mut self,
        member_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        if self.skip_all || self.ctx.overflowed {
            return Ok(());
        }
        let Some(member) = member_schema.as_member() else {
            self.ctx.record(ValidationErrorKind::Custom(format!(
                "Expected a member of `{}`, found `{}`",
                self.schema.id(),
                member_schema.id()
            )));
            return Ok(());
        };
        if self.is_union && self.set_count > 0 {
            // A second member in a union conflicts with whichever member
            // was set first; its value is not validated further.
            self.ctx
                .path
                .push(PathSegment::Member(member.name.clone()));
            let conflict = self
                .first_set
                .clone()
                .unwrap_or_default();
            self.ctx
                .record(ValidationErrorKind::UnionConflict(conflict));
            self.ctx.path.pop();
            return Ok(());
        }
        self.tracker.mark(member);
        self.ctx.last_was_null = false;
        self.ctx
            .path
            .push(PathSegment::Member(member.name.clone()));
        let result = value.serialize_with_schema(
            member_schema,
            ValidatorSerializer {
                ctx: &mut *self.ctx,
                container: Some(self.schema.clone()),
            },
        );
        self.ctx.path.pop();
        result?;
        if self.is_union && !self.ctx.last_was_null {
            if self.set_count == 0 {
                self.first_set = Some(member.name.clone());
            }
            self.set_count += 1;
        }
        Ok(())
    }

    fn end(self, _schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        if !self.skip_all {
            if self.is_union {
                if self.set_count == 0 {
                    self.ctx.record(ValidationErrorKind::UnionNoMember);
                }
            } else if !self.tracker.all_set() {
                for name in self.tracker.missing_members() {
                    self.ctx.path.push(PathSegment::Member(name.clone()));
                    self.ctx.record(ValidationErrorKind::Required(name));
                    self.ctx.path.pop();
                }
            }
        }
        if self.entered {
            self.ctx.exit();
        }
        self.ctx.last_was_null = false;
        Ok(())
    }
}

pub struct ValidatorListSerializer<'a> {
    ctx: &'a mut ValidatorContext,
    schema: SchemaRef,
    index: usize,
    seen: Option<FxHashSet<UniqueValue>>,
    skip_all: bool,
    entered: bool,
}

impl ListSerializer for ValidatorListSerializer<'_> {
    type Ok = ();
    type Error = ValidationErrors;

    fn serialize_element<T>(
        &mut self,
        element_schema: &SchemaRef,
        value: &T,
    ) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        if self.skip_all || self.ctx.overflowed {
            self.index += 1;
            return Ok(());
        }
        self.ctx.path.push(PathSegment::Index(self.index));
        if let Some(seen) = &mut self.seen {
            match value.serialize_with_schema(element_schema, UniqueValueParser) {
                Ok(unique_value) => {
                    if !seen.insert(unique_value) {
                        self.ctx.record(ValidationErrorKind::UniqueItemConflict(
                            "Value is a duplicate of a previous list item".to_string(),
                        ));
                    }
                }
                Err(error) => {
                    self.ctx
                        .record(ValidationErrorKind::UniqueItemConflict(error.to_string()));
                }
            }
        }
        let result = value.serialize_with_schema(
            element_schema,
            ValidatorSerializer {
                ctx: &mut *self.ctx,
                container: Some(self.schema.clone()),
            },
        );
        self.ctx.path.pop();
        self.index += 1;
        result?;
        Ok(())
    }

    fn end(self, _schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        if !self.skip_all {
            self.ctx
                .check_length(self.schema.validation_state(), self.index);
        }
        if self.entered {
            self.ctx.exit();
        }
        self.ctx.last_was_null = false;
        Ok(())
    }
}

pub struct ValidatorMapSerializer<'a> {
    ctx: &'a mut ValidatorContext,
    schema: SchemaRef,
    size: usize,
    skip_all: bool,
    entered: bool,
}

impl MapSerializer for ValidatorMapSerializer<'_> {
    type Ok = ();
    type Error = ValidationErrors;

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
        self.size += 1;
        if self.skip_all || self.ctx.overflowed {
            return Ok(());
        }
        let key_string = match key.serialize_with_schema(key_schema, KeySerializer::<ValidationErrors>::new()) {
            Ok(key_string) => key_string,
            Err(error) => {
                self.ctx
                    .record(ValidationErrorKind::Custom(format!("Invalid map key: {error}")));
                return Ok(());
            }
        };
        self.ctx.path.push(PathSegment::Key(key_string.clone()));
        self.ctx.check_string(key_schema, &key_string);
        let result = value.serialize_with_schema(
            value_schema,
            ValidatorSerializer {
                ctx: &mut *self.ctx,
                container: Some(self.schema.clone()),
            },
        );
        self.ctx.path.pop();
        result?;
        Ok(())
    }

    fn end(self, _schema: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        if !self.skip_all {
            self.ctx
                .check_length(self.schema.validation_state(), self.size);
        }
        if self.entered {
            self.ctx.exit();
        }
        self.ctx.last_was_null = false;
        Ok(())
    }
}

// ============================================================================
// Unique item capture
// ============================================================================

/// Normalized, hashable form of a list element for `@uniqueItems` checks.
///
/// Floats, doubles, nulls, documents, and streams cannot be normalized
/// and are rejected with a descriptive message.
#[derive(Debug, PartialEq, Eq, Hash)]
enum UniqueValue {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Integer(i32),
    Long(i64),
    BigInteger(BigInt),
    // Stored normalized so trailing zeros hash identically.
    BigDecimal(String),
    String(String),
    Blob(Vec<u8>),
    Timestamp(i64),
    List(Vec<UniqueValue>),
    Map(BTreeMap<String, UniqueValue>),
}

#[derive(Error, Debug)]
#[error("{0}")]
struct UniqueCaptureError(String);

impl SerdeError for UniqueCaptureError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        UniqueCaptureError(msg.to_string())
    }
}

struct UniqueValueParser;

impl Serializer for UniqueValueParser {
    type Ok = UniqueValue;
    type Error = UniqueCaptureError;
    type SerializeList = UniqueListCapture;
    type SerializeMap = UniqueMapCapture;
    type SerializeStruct = UniqueStructCapture;

    fn write_struct(self, _: &SchemaRef, _: usize) -> Result<Self::SerializeStruct, Self::Error> {
        Ok(UniqueStructCapture {
            members: BTreeMap::new(),
        })
    }

    fn write_map(self, _: &SchemaRef, _: usize) -> Result<Self::SerializeMap, Self::Error> {
        Ok(UniqueMapCapture {
            entries: BTreeMap::new(),
        })
    }

    fn write_list(self, _: &SchemaRef, _: usize) -> Result<Self::SerializeList, Self::Error> {
        Ok(UniqueListCapture { items: Vec::new() })
    }

    fn write_boolean(self, _: &SchemaRef, value: bool) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Boolean(value))
    }

    fn write_byte(self, _: &SchemaRef, value: i8) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Byte(value))
    }

    fn write_short(self, _: &SchemaRef, value: i16) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Short(value))
    }

    fn write_integer(self, _: &SchemaRef, value: i32) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Integer(value))
    }

    fn write_long(self, _: &SchemaRef, value: i64) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Long(value))
    }

    fn write_float(self, _: &SchemaRef, _: f32) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Float values are not allowed in lists with unique items".to_string(),
        ))
    }

    fn write_double(self, _: &SchemaRef, _: f64) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Double values are not allowed in lists with unique items".to_string(),
        ))
    }

    fn write_big_integer(self, _: &SchemaRef, value: &BigInt) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::BigInteger(value.clone()))
    }

    fn write_big_decimal(self, _: &SchemaRef, value: &BigDecimal) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::BigDecimal(value.normalized().to_string()))
    }

    fn write_string(self, _: &SchemaRef, value: &str) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::String(value.to_string()))
    }

    fn write_blob(self, _: &SchemaRef, value: &ByteBuffer) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Blob(value.as_bytes().to_vec()))
    }

    fn write_timestamp(self, _: &SchemaRef, value: &Instant) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Timestamp(value.epoch_milliseconds()))
    }

    fn write_document(self, _: &SchemaRef, _: &Document) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Document values are not allowed in lists with unique items".to_string(),
        ))
    }

    fn write_null(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Null values are not allowed in lists with unique items".to_string(),
        ))
    }

    fn write_data_stream(
        self,
        _: &SchemaRef,
        _: &DataStream,
    ) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Data streams are not allowed in lists with unique items".to_string(),
        ))
    }

    fn write_event_stream(
        self,
        _: &SchemaRef,
        _: &EventStreamRef,
    ) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Event streams are not allowed in lists with unique items".to_string(),
        ))
    }

    fn skip(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Err(UniqueCaptureError(
            "Null values are not allowed in lists with unique items".to_string(),
        ))
    }
}

struct UniqueListCapture {
    items: Vec<UniqueValue>,
}

impl ListSerializer for UniqueListCapture {
    type Ok = UniqueValue;
    type Error = UniqueCaptureError;

    fn serialize_element<T>(&mut self, element_schema: &SchemaRef, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        self.items
            .push(value.serialize_with_schema(element_schema, UniqueValueParser)?);
        Ok(())
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::List(self.items))
    }
}

struct UniqueMapCapture {
    entries: BTreeMap<String, UniqueValue>,
}

impl MapSerializer for UniqueMapCapture {
    type Ok = UniqueValue;
    type Error = UniqueCaptureError;

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
        let key = key.serialize_with_schema(key_schema, KeySerializer::new())?;
        let value = value.serialize_with_schema(value_schema, UniqueValueParser)?;
        self.entries.insert(key, value);
        Ok(())
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Map(self.entries))
    }
}

struct UniqueStructCapture {
    members: BTreeMap<String, UniqueValue>,
}

impl StructSerializer for UniqueStructCapture {
    type Ok = UniqueValue;
    type Error = UniqueCaptureError;

    fn serialize_member<T>(&mut self, member_schema: &SchemaRef, value: &T) -> Result<(), Self::Error>
    where
        T: ?Sized + SerializeWithSchema,
    {
        let Some(member) = member_schema.as_member() else {
            return Err(UniqueCaptureError(format!(
                "Expected member schema, found {}",
                member_schema.id()
            )));
        };
        let value = value.serialize_with_schema(member_schema, UniqueValueParser)?;
        self.members.insert(member.name.clone(), value);
        Ok(())
    }

    fn end(self, _: &SchemaRef) -> Result<Self::Ok, Self::Error> {
        Ok(UniqueValue::Map(self.members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prelude::{
        DefaultTrait, LengthTrait, PatternTrait, RangeTrait, RequiredTrait, STRING, SparseTrait,
    };
    use crate::schema::{DocumentValue, Schema, ShapeId};
    use crate::{lazy_schema, traits};

    lazy_schema!(
        BYTE_MIN_TWO,
        Schema::create_byte(
            ShapeId::from("test#LimitedByte"),
            traits![RangeTrait::builder().min(BigDecimal::from(2)).build()]
        )
    );

    #[test]
    fn validator_stops_at_error_cap() {
        let validator = Validator::builder().max_allowed_errors(2).build();
        let mut session = validator.start();
        session.write(&BYTE_MIN_TWO, &1i8);
        session.write(&BYTE_MIN_TWO, &1i8);
        session.write(&BYTE_MIN_TWO, &1i8);
        let errors = session.finish().unwrap_err();
        assert_eq!(errors.errors().len(), 2);
        for error in errors.errors() {
            assert!(matches!(error.kind(), ValidationErrorKind::Range(_)));
            assert_eq!(error.path(), "/");
            assert_eq!(
                error.message(),
                "Value must be greater than or equal to 2"
            );
        }
    }

    lazy_schema!(
        STRING_LIST,
        Schema::list_builder(ShapeId::from("test#Strings"), traits![])
            .put_member("member", &STRING, traits![])
            .build()
    );
    lazy_schema!(
        NESTED_2,
        Schema::list_builder(ShapeId::from("test#Nested2"), traits![])
            .put_member("member", &STRING_LIST, traits![])
            .build()
    );
    lazy_schema!(
        NESTED_3,
        Schema::list_builder(ShapeId::from("test#Nested3"), traits![])
            .put_member("member", &NESTED_2, traits![])
            .build()
    );
    lazy_schema!(
        NESTED_4,
        Schema::list_builder(ShapeId::from("test#Nested4"), traits![])
            .put_member("member", &NESTED_3, traits![])
            .build()
    );

    #[test]
    fn validator_stops_at_depth_cap() {
        let validator = Validator::builder().max_depth(3).build();
        let value = vec![vec![vec![vec!["too deep".to_string()]]]];
        let errors = validator.validate(&NESTED_4, &value).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        let error = &errors.errors()[0];
        assert_eq!(error.kind(), &ValidationErrorKind::Depth);
        assert_eq!(error.path(), "/0/0/0");
        assert_eq!(error.message(), "Value is too deeply nested");
    }

    lazy_schema!(
        REQUIRED_STRUCT,
        Schema::structure_builder(ShapeId::from("test#Required"), traits![])
            .put_member("a", &STRING, traits![RequiredTrait])
            .put_member("b", &STRING, traits![RequiredTrait])
            .put_member("c", &STRING, traits![RequiredTrait])
            .put_member(
                "d",
                &STRING,
                traits![
                    RequiredTrait,
                    DefaultTrait::new(DocumentValue::String("d".into()))
                ]
            )
            .put_member(
                "e",
                &STRING,
                traits![DefaultTrait::new(DocumentValue::String("e".into()))]
            )
            .put_member("f", &STRING, traits![])
            .build()
    );

    struct OnlyA;
    impl SerializeWithSchema for OnlyA {
        fn serialize_with_schema<S: Serializer>(
            &self,
            schema: &SchemaRef,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut ser = serializer.write_struct(schema, 1)?;
            ser.serialize_member(schema.expect_member("a"), "hi")?;
            ser.end(schema)
        }
    }

    #[test]
    fn reports_missing_required_members_in_order() {
        let errors = Validator::new()
            .validate(&REQUIRED_STRUCT, &OnlyA)
            .unwrap_err();
        assert_eq!(errors.errors().len(), 2);
        assert_eq!(
            errors.errors()[0].kind(),
            &ValidationErrorKind::Required("b".to_string())
        );
        assert_eq!(errors.errors()[0].path(), "/b");
        assert_eq!(
            errors.errors()[1].kind(),
            &ValidationErrorKind::Required("c".to_string())
        );
        assert_eq!(errors.errors()[1].path(), "/c");
    }

    lazy_schema!(
        UNION_SCHEMA,
        Schema::union_builder(ShapeId::from("test#Union"), traits![])
            .put_member(
                "a",
                &STRING,
                traits![LengthTrait::builder().max(3).build()]
            )
            .put_member("b", &STRING, traits![])
            .put_member("c", &STRING, traits![])
            .build()
    );

    struct UnionMembers(Vec<(&'static str, &'static str)>);
    impl SerializeWithSchema for UnionMembers {
        fn serialize_with_schema<S: Serializer>(
            &self,
            schema: &SchemaRef,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut ser = serializer.write_struct(schema, self.0.len())?;
            for (name, value) in &self.0 {
                ser.serialize_member(schema.expect_member(name), *value)?;
            }
            ser.end(schema)
        }
    }

    #[test]
    fn union_with_no_member_set() {
        let errors = Validator::new()
            .validate(&UNION_SCHEMA, &UnionMembers(Vec::new()))
            .unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].kind(), &ValidationErrorKind::UnionNoMember);
        assert_eq!(errors.errors()[0].message(), "No member is set in the union");
    }

    #[test]
    fn union_with_conflicting_members() {
        let errors = Validator::new()
            .validate(&UNION_SCHEMA, &UnionMembers(vec![("a", "hi"), ("b", "byte")]))
            .unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        let error = &errors.errors()[0];
        assert_eq!(error.path(), "/b");
        assert_eq!(error.message(), "Union member conflicts with 'a'");
    }

    #[test]
    fn union_member_constraints_still_apply() {
        let errors = Validator::new()
            .validate(
                &UNION_SCHEMA,
                &UnionMembers(vec![("a", "this is too long!")]),
            )
            .unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        let error = &errors.errors()[0];
        assert_eq!(error.path(), "/a");
        assert!(matches!(error.kind(), ValidationErrorKind::Length(_)));
    }

    lazy_schema!(
        UNIQUE_LIST,
        Schema::list_builder(
            ShapeId::from("test#UniqueStrings"),
            traits![UniqueItemsTrait::new()]
        )
        .put_member("member", &STRING, traits![])
        .build()
    );

    #[test]
    fn duplicate_unique_items_conflict() {
        let value = vec!["x".to_string(), "y".to_string(), "x".to_string()];
        let errors = Validator::new().validate(&UNIQUE_LIST, &value).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        let error = &errors.errors()[0];
        assert_eq!(error.path(), "/2");
        assert!(matches!(
            error.kind(),
            ValidationErrorKind::UniqueItemConflict(_)
        ));
    }

    lazy_schema!(
        UNIQUE_DOUBLE_LIST,
        Schema::list_builder(
            ShapeId::from("test#UniqueDoubles"),
            traits![UniqueItemsTrait::new()]
        )
        .put_member("member", &crate::schema::prelude::DOUBLE, traits![])
        .build()
    );

    #[test]
    fn doubles_are_rejected_in_unique_lists() {
        let errors = Validator::new()
            .validate(&UNIQUE_DOUBLE_LIST, &vec![1.0f64])
            .unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        let ValidationErrorKind::UniqueItemConflict(message) = errors.errors()[0].kind() else {
            panic!("Expected unique item conflict");
        };
        assert!(message.contains("Double values are not allowed"));
    }

    lazy_schema!(
        PATTERNED_STRING,
        Schema::create_string(
            ShapeId::from("test#Patterned"),
            traits![
                PatternTrait::new("^[a-z]+$"),
                LengthTrait::builder().min(2).max(4).build()
            ]
        )
    );

    #[test]
    fn string_constraints_compose() {
        let validator = Validator::new();
        assert!(validator.validate(&PATTERNED_STRING, "abc").is_ok());

        let errors = validator.validate(&PATTERNED_STRING, "ABC").unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(matches!(
            errors.errors()[0].kind(),
            ValidationErrorKind::Pattern(_)
        ));

        let errors = validator.validate(&PATTERNED_STRING, "a").unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(
            errors.errors()[0].message(),
            "Value must have length between 2 and 4, inclusive"
        );
    }

    lazy_schema!(
        SUIT_ENUM,
        Schema::create_enum(
            ShapeId::from("test#Suit"),
            Box::new(["hearts", "spades", "clubs", "diamonds"]),
            traits![]
        )
    );

    #[test]
    fn enum_membership() {
        let validator = Validator::new();
        assert!(validator.validate(&SUIT_ENUM, "hearts").is_ok());
        let errors = validator.validate(&SUIT_ENUM, "jokers").unwrap_err();
        assert_eq!(errors.errors()[0].kind(), &ValidationErrorKind::Enum);
    }

    lazy_schema!(
        FACE_INT_ENUM,
        Schema::create_int_enum(ShapeId::from("test#Face"), Box::new([1, 2, 3]), traits![])
    );

    #[test]
    fn int_enum_membership() {
        let validator = Validator::new();
        assert!(validator.validate(&FACE_INT_ENUM, &1i32).is_ok());
        let errors = validator.validate(&FACE_INT_ENUM, &9i32).unwrap_err();
        assert_eq!(errors.errors()[0].kind(), &ValidationErrorKind::IntEnum);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let errors = Validator::new().validate(&STRING, &5i32).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(
            errors.errors()[0].kind(),
            &ValidationErrorKind::Type {
                expected: ShapeType::String,
                found: ShapeType::Integer,
            }
        );
    }

    #[test]
    fn null_in_non_sparse_list() {
        let value = vec![Some("a".to_string()), None];
        let errors = Validator::new().validate(&STRING_LIST, &value).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].kind(), &ValidationErrorKind::Sparse);
        assert_eq!(errors.errors()[0].path(), "/1");
    }

    lazy_schema!(
        SPARSE_LIST,
        Schema::list_builder(ShapeId::from("test#SparseStrings"), traits![SparseTrait::new()])
            .put_member("member", &STRING, traits![])
            .build()
    );

    #[test]
    fn null_in_sparse_list_is_allowed() {
        let value = vec![Some("a".to_string()), None];
        assert!(Validator::new().validate(&SPARSE_LIST, &value).is_ok());
    }

    lazy_schema!(
        SIZED_LIST,
        Schema::list_builder(
            ShapeId::from("test#Sized"),
            traits![LengthTrait::builder().min(1).max(2).build()]
        )
        .put_member("member", &STRING, traits![])
        .build()
    );

    #[test]
    fn list_length_bounds() {
        let validator = Validator::new();
        assert!(validator
            .validate(&SIZED_LIST, &vec!["a".to_string()])
            .is_ok());
        let too_long = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let errors = validator.validate(&SIZED_LIST, &too_long).unwrap_err();
        assert_eq!(errors.errors().len(), 1);
        assert!(matches!(
            errors.errors()[0].kind(),
            ValidationErrorKind::Length(_)
        ));
        assert_eq!(errors.errors()[0].path(), "/");
    }

    #[test]
    fn valid_nested_value_has_no_errors() {
        let value = vec![vec![vec![vec!["fine".to_string()]]]];
        assert!(Validator::new().validate(&NESTED_4, &value).is_ok());
    }
}
