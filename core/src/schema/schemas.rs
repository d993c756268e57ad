use std::{
    cmp::Ordering,
    fmt::{Debug, Formatter},
    hash::Hash,
    ops::Deref,
    sync::{Arc, LazyLock, OnceLock, RwLock},
};

use bigdecimal::{BigDecimal, ToPrimitive};
use regex::Regex;
use rustc_hash::FxBuildHasher;

use crate::{
    FxIndexMap, FxIndexSet, Ref,
    schema::prelude::{DefaultTrait, LengthTrait, PatternTrait, RangeTrait, RequiredTrait},
    schema::{ShapeId, ShapeTrait, ShapeType, StaticTraitId, TraitMap, TraitRef},
};

/// Reference to a [`Schema`].
///
/// Allows for cheap copying and read-only access to schema data. This type
/// is primarily used to handle the indirection required to build aggregate
/// and potentially recursive schemas.
pub type SchemaRef = Ref<Schema>;

/// Convenience type representing a list of trait implementations.
pub type TraitList = Vec<TraitRef>;

/// Describes a shape with metadata from a Trellis model.
#[derive(Debug, PartialEq)]
pub enum Schema {
    Scalar(ScalarSchema),
    Struct(StructSchema),
    Enum(EnumSchema<&'static str>),
    IntEnum(EnumSchema<i32>),
    List(ListSchema),
    Map(MapSchema),
    Member(MemberSchema),
}

/// Schema for simple data with no members.
#[derive(Debug, PartialEq)]
pub struct ScalarSchema {
    id: ShapeId,
    shape_type: ShapeType,
    traits: TraitMap,
    state: ValidationState,
}

/// Schema for a structure or union shape.
#[derive(PartialEq)]
pub struct StructSchema {
    id: ShapeId,
    shape_type: ShapeType,
    pub members: FxIndexMap<String, SchemaRef>,
    traits: TraitMap,
    state: ValidationState,
    pub(crate) required_member_count: usize,
    /// OR of the required-by-validation masks of all members; zero when
    /// more than 64 members are required (the bitset strategy takes over).
    pub(crate) required_bitfield: u64,
}

impl Debug for StructSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StructSchema {{")?;
        write!(f, "id: {:?}, ", self.id.name())?;
        write!(f, "shape_type: {:?}, ", self.shape_type)?;
        write!(f, "traits: {:?}, ", self.traits)?;
        for (key, value) in &self.members {
            if let Schema::Member(member) = &**value {
                write!(f, "[name: {}, type: {:?}]", key, member.target.id().name())?;
            }
        }
        write!(f, "}}")
    }
}

/// Schema for a list shape.
#[derive(Debug, PartialEq)]
pub struct ListSchema {
    id: ShapeId,
    pub member: SchemaRef,
    traits: TraitMap,
    state: ValidationState,
}

/// Schema for a map shape.
#[derive(Debug, PartialEq)]
pub struct MapSchema {
    id: ShapeId,
    pub key: SchemaRef,
    pub value: SchemaRef,
    traits: TraitMap,
    state: ValidationState,
}

/// Schema for enum and int-enum shapes.
#[derive(Debug, PartialEq)]
pub struct EnumSchema<T: PartialEq + Hash + Eq> {
    id: ShapeId,
    pub values: FxIndexSet<T>,
    traits: TraitMap,
    state: ValidationState,
}

/// Member of an aggregate shape.
#[derive(Debug, PartialEq)]
pub struct MemberSchema {
    id: ShapeId,
    pub target: MemberTarget,
    pub name: String,
    /// 0-based position of this member within the parent, assigned after
    /// members are sorted at build time.
    pub index: usize,
    /// True when the member is `@required` without a usable `@default`.
    pub(crate) required_by_validation: bool,
    /// `1 << index` when required-by-validation and `index < 64`, else 0.
    pub(crate) required_mask: u64,
    traits: TraitMap,
    flattened_traits: OnceLock<TraitMap>,
    state: OnceLock<ValidationState>,
}

impl MemberSchema {
    /// Member traits merged with the traits of the member target.
    ///
    /// Resolved lazily so recursive member targets are only touched once
    /// the whole graph has been built.
    #[inline]
    fn traits(&self) -> &TraitMap {
        self.flattened_traits.get_or_init(|| {
            let mut flattened = TraitMap::new();
            flattened.extend(&self.traits);
            flattened.extend(self.target.traits());
            flattened
        })
    }
}

// =======  FACTORY METHODS ==========
impl Schema {
    fn scalar(shape_type: ShapeType, id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        let traits = TraitMap::of(traits);
        let state = ValidationState::of(shape_type, &traits);
        Ref::new(Schema::Scalar(ScalarSchema {
            id: id.into(),
            shape_type,
            traits,
            state,
        }))
    }

    /// Create a Schema for a boolean shape.
    pub fn create_boolean(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Boolean, id, traits)
    }

    /// Create a Schema for a byte shape.
    pub fn create_byte(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Byte, id, traits)
    }

    /// Create a Schema for a short shape.
    pub fn create_short(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Short, id, traits)
    }

    /// Create a Schema for an integer shape.
    pub fn create_integer(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Integer, id, traits)
    }

    /// Create a Schema for an int-enum shape.
    pub fn create_int_enum(
        id: impl Into<ShapeId>,
        values: Box<[i32]>,
        traits: TraitList,
    ) -> SchemaRef {
        let traits = TraitMap::of(traits);
        let state = ValidationState::of(ShapeType::IntEnum, &traits);
        Ref::new(Self::IntEnum(EnumSchema {
            id: id.into(),
            values: FxIndexSet::from_iter(values),
            traits,
            state,
        }))
    }

    /// Create a Schema for a long shape.
    pub fn create_long(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Long, id, traits)
    }

    /// Create a Schema for a float shape.
    pub fn create_float(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Float, id, traits)
    }

    /// Create a Schema for a double shape.
    pub fn create_double(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Double, id, traits)
    }

    /// Create a Schema for a big-integer shape.
    pub fn create_big_integer(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::BigInteger, id, traits)
    }

    /// Create a Schema for a big-decimal shape.
    pub fn create_big_decimal(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::BigDecimal, id, traits)
    }

    /// Create a Schema for a string shape.
    pub fn create_string(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::String, id, traits)
    }

    /// Create a Schema for a string enum shape.
    pub fn create_enum(
        id: impl Into<ShapeId>,
        values: Box<[&'static str]>,
        traits: TraitList,
    ) -> SchemaRef {
        let traits = TraitMap::of(traits);
        let state = ValidationState::of(ShapeType::Enum, &traits);
        Ref::new(Self::Enum(EnumSchema {
            id: id.into(),
            values: FxIndexSet::from_iter(values),
            traits,
            state,
        }))
    }

    /// Create a Schema for a blob shape.
    pub fn create_blob(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Blob, id, traits)
    }

    /// Create a Schema for a document shape.
    pub fn create_document(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Document, id, traits)
    }

    /// Create a Schema for a timestamp shape.
    pub fn create_timestamp(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Timestamp, id, traits)
    }

    /// Create a Schema for an operation shape.
    pub fn create_operation(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Operation, id, traits)
    }

    /// Create a Schema for a resource shape.
    pub fn create_resource(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Resource, id, traits)
    }

    /// Create a Schema for a service shape.
    pub fn create_service(id: impl Into<ShapeId>, traits: TraitList) -> SchemaRef {
        Self::scalar(ShapeType::Service, id, traits)
    }
}

// BUILDER FACTORIES
impl Schema {
    /// Create a new [`SchemaBuilder`] for a structure shape.
    #[must_use]
    pub fn structure_builder<I: Into<ShapeId>>(id: I, traits: TraitList) -> SchemaBuilder {
        SchemaBuilder::new(id, ShapeType::Structure, traits)
    }

    /// Create a new [`SchemaBuilder`] for a union shape.
    #[must_use]
    pub fn union_builder<I: Into<ShapeId>>(id: I, traits: TraitList) -> SchemaBuilder {
        SchemaBuilder::new(id, ShapeType::Union, traits)
    }

    /// Create a new [`SchemaBuilder`] for a list shape.
    #[must_use]
    pub fn list_builder<I: Into<ShapeId>>(id: I, traits: TraitList) -> SchemaBuilder {
        SchemaBuilder::new(id, ShapeType::List, traits)
    }

    /// Create a new [`SchemaBuilder`] for a map shape.
    #[must_use]
    pub fn map_builder<I: Into<ShapeId>>(id: I, traits: TraitList) -> SchemaBuilder {
        SchemaBuilder::new(id, ShapeType::Map, traits)
    }
}

static EMPTY: LazyLock<FxIndexMap<String, SchemaRef>> = LazyLock::new(FxIndexMap::default);

// GETTERS
impl Schema {
    /// Get the [`ShapeType`] of the schema.
    ///
    /// Members report the shape type of their target.
    #[must_use]
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Schema::Scalar(ScalarSchema { shape_type, .. })
            | Schema::Struct(StructSchema { shape_type, .. }) => *shape_type,
            Schema::Enum(_) => ShapeType::Enum,
            Schema::IntEnum(_) => ShapeType::IntEnum,
            Schema::List(_) => ShapeType::List,
            Schema::Map(_) => ShapeType::Map,
            Schema::Member(member) => member.target.shape_type(),
        }
    }

    /// Get the [`ShapeId`] of the schema.
    #[must_use]
    pub const fn id(&self) -> &ShapeId {
        match self {
            Schema::Scalar(ScalarSchema { id, .. })
            | Schema::Struct(StructSchema { id, .. })
            | Schema::List(ListSchema { id, .. })
            | Schema::Enum(EnumSchema { id, .. })
            | Schema::IntEnum(EnumSchema { id, .. })
            | Schema::Map(MapSchema { id, .. })
            | Schema::Member(MemberSchema { id, .. }) => id,
        }
    }

    #[inline]
    fn traits(&self) -> &TraitMap {
        match self {
            Schema::Scalar(ScalarSchema { traits, .. })
            | Schema::Struct(StructSchema { traits, .. })
            | Schema::List(ListSchema { traits, .. })
            | Schema::Map(MapSchema { traits, .. })
            | Schema::Enum(EnumSchema { traits, .. })
            | Schema::IntEnum(EnumSchema { traits, .. }) => traits,
            Schema::Member(member) => member.traits(),
        }
    }

    /// Precomputed constraint state used by the streaming validator.
    ///
    /// Members resolve their state lazily (one-shot) because the member
    /// target may itself be a deferred recursive schema at build time.
    #[inline]
    pub(crate) fn validation_state(&self) -> &ValidationState {
        match self {
            Schema::Scalar(ScalarSchema { state, .. })
            | Schema::Struct(StructSchema { state, .. })
            | Schema::List(ListSchema { state, .. })
            | Schema::Map(MapSchema { state, .. })
            | Schema::Enum(EnumSchema { state, .. })
            | Schema::IntEnum(EnumSchema { state, .. }) => state,
            Schema::Member(member) => member
                .state
                .get_or_init(|| ValidationState::of(member.target.shape_type(), member.traits())),
        }
    }

    /// Get a map of all members attached to this schema.
    ///
    /// **NOTE**: Schemas with no members return an empty map.
    #[must_use]
    pub fn members(&self) -> &FxIndexMap<String, SchemaRef> {
        match self {
            Schema::Struct(StructSchema { members, .. }) => members,
            Schema::Member(member) => member.target.members(),
            _ => &EMPTY,
        }
    }

    /// Get the schema for a specific member by member name.
    #[must_use]
    pub fn get_member(&self, member_name: &str) -> Option<&SchemaRef> {
        match self {
            Schema::Struct(schema) => schema.members.get(member_name),
            Schema::List(schema) => match member_name {
                "member" => Some(&schema.member),
                _ => None,
            },
            Schema::Map(schema) => match member_name {
                "key" => Some(&schema.key),
                "value" => Some(&schema.value),
                _ => None,
            },
            Schema::Member(member) => member.target.get_member(member_name),
            _ => None,
        }
    }

    /// Returns a member schema reference or *panics*.
    ///
    /// **WARNING**: In general this should only be used with statically
    /// defined schemas.
    #[must_use]
    pub fn expect_member(&self, member_name: &str) -> &SchemaRef {
        self.get_member(member_name)
            .unwrap_or_else(|| panic!("Schema `{}` is missing expected member `{member_name}`", self.id()))
    }

    /// Returns true if the schema has a trait with the given ID.
    #[must_use]
    pub fn contains_trait(&self, id: &ShapeId) -> bool {
        self.traits().contains(id)
    }

    /// Returns true if the schema has a trait of type `T`.
    #[must_use]
    pub fn contains_type<T: StaticTraitId>(&self) -> bool {
        self.traits().contains_type::<T>()
    }

    /// Gets a trait as a specific implementation if it exists.
    #[must_use]
    #[inline]
    pub fn get_trait_as<T: ShapeTrait + StaticTraitId>(&self) -> Option<&T> {
        self.traits().get_as::<T>()
    }

    /// Get a dynamic implementation of a trait by shape ID.
    #[must_use]
    #[inline]
    pub fn get_trait(&self, id: &ShapeId) -> Option<&TraitRef> {
        self.traits().get(id)
    }
}

// AS-ers
impl Schema {
    /// Get as a [`MemberSchema`] type if possible, otherwise `None`.
    #[must_use]
    pub fn as_member(&self) -> Option<&MemberSchema> {
        if let Schema::Member(member) = self {
            Some(member)
        } else {
            None
        }
    }

    /// Get as a [`ListSchema`] type if possible, otherwise `None`.
    ///
    /// Members resolve through to their target.
    #[must_use]
    pub fn as_list(&self) -> Option<&ListSchema> {
        match self {
            Schema::List(list) => Some(list),
            Schema::Member(member) => member.target.as_list(),
            _ => None,
        }
    }

    /// Get as a [`StructSchema`] type if possible, otherwise `None`.
    ///
    /// Members resolve through to their target.
    #[must_use]
    pub fn as_struct(&self) -> Option<&StructSchema> {
        match self {
            Schema::Struct(s) => Some(s),
            Schema::Member(member) => member.target.as_struct(),
            _ => None,
        }
    }

    /// Get as a [`ScalarSchema`] type if possible, otherwise `None`.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&ScalarSchema> {
        if let Schema::Scalar(schema) = self {
            Some(schema)
        } else {
            None
        }
    }

    /// Get as a [`MapSchema`] type if possible, otherwise `None`.
    ///
    /// Members resolve through to their target.
    #[must_use]
    pub fn as_map(&self) -> Option<&MapSchema> {
        match self {
            Schema::Map(map) => Some(map),
            Schema::Member(member) => member.target.as_map(),
            _ => None,
        }
    }

    /// Get as an [`EnumSchema`] with string values if possible, otherwise `None`.
    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumSchema<&'static str>> {
        match self {
            Schema::Enum(enum_schema) => Some(enum_schema),
            Schema::Member(member) => member.target.as_enum(),
            _ => None,
        }
    }

    /// Get as an [`EnumSchema`] with `i32` values if possible, otherwise `None`.
    #[must_use]
    pub fn as_int_enum(&self) -> Option<&EnumSchema<i32>> {
        match self {
            Schema::IntEnum(enum_schema) => Some(enum_schema),
            Schema::Member(member) => member.target.as_int_enum(),
            _ => None,
        }
    }
}

/// Builder for aggregate [`Schema`] types.
///
/// Builders are confined to their constructing task until [`SchemaBuilder::build`]
/// is called; the built schema is immutable and freely shareable.
pub struct SchemaBuilder {
    id: ShapeId,
    shape_type: ShapeType,
    members: RwLock<Vec<MemberSchemaBuilder>>,
    traits: TraitMap,
    // Caches the built value when constructing recursive shapes so that
    // resolution happens exactly once per root.
    built: OnceLock<SchemaRef>,
}

impl SchemaBuilder {
    fn new(id: impl Into<ShapeId>, shape_type: ShapeType, traits: TraitList) -> Self {
        SchemaBuilder {
            id: id.into(),
            members: match shape_type {
                ShapeType::List => RwLock::new(Vec::with_capacity(1)),
                ShapeType::Map => RwLock::new(Vec::with_capacity(2)),
                _ => RwLock::new(Vec::new()),
            },
            shape_type,
            traits: TraitMap::of(traits),
            built: OnceLock::new(),
        }
    }

    /// Add a member to the builder.
    ///
    /// The target may be a built schema or another builder; builder
    /// targets enable forward references for recursive shapes.
    #[must_use]
    pub fn put_member<M: Into<MemberTarget>>(
        &self,
        name: &str,
        target: M,
        traits: TraitList,
    ) -> &Self {
        self.validate_member_name(name);
        self.members
            .write()
            .expect("Lock poisoned")
            .push(MemberSchemaBuilder::new(
                name.into(),
                self.id.with_member(name),
                target.into(),
                traits,
            ));
        self
    }

    fn validate_member_name(&self, name: &str) {
        match self.shape_type {
            ShapeType::List => {
                assert_eq!(
                    name, "member",
                    "Lists can only have members named `member`. Found `{name}`"
                );
            }
            ShapeType::Map => {
                assert!(
                    name == "key" || name == "value",
                    "Maps can only have members named `key` or `value`. Found `{name}`"
                );
            }
            _ => { /* fall through otherwise */ }
        }
    }

    /// Build a [`Schema`] and return a [`SchemaRef`] to it.
    ///
    /// Building is idempotent: repeated calls (including re-entrant calls
    /// made while resolving recursive member targets) return the same
    /// schema reference.
    #[must_use]
    pub fn build(&self) -> SchemaRef {
        if let Some(schema) = self.built.get() {
            return schema.clone();
        }

        let mut traits = TraitMap::new();
        traits.extend(&self.traits);
        let output = match self.shape_type {
            ShapeType::Structure | ShapeType::Union => {
                let mut members_mut = self.members.write().expect("Lock poisoned");
                assert!(
                    self.shape_type != ShapeType::Union || !members_mut.is_empty(),
                    "Union schema `{}` must have at least one member",
                    self.id
                );
                // Required members with no default sort first; the sort is
                // stable so all other members keep their declared order.
                members_mut.sort();
                let required_member_count = members_mut
                    .iter()
                    .filter(|member| member.required_by_validation())
                    .count();
                let mut members =
                    FxIndexMap::with_capacity_and_hasher(members_mut.len(), FxBuildHasher);
                let mut required_bitfield = 0u64;
                for (idx, member_builder) in members_mut.iter_mut().enumerate() {
                    member_builder.set_index(idx);
                    let member = member_builder.build();
                    if let Schema::Member(member_schema) = &*member {
                        required_bitfield |= member_schema.required_mask;
                    }
                    members.insert(member_builder.name.clone(), member);
                }
                if required_member_count > 64 {
                    required_bitfield = 0;
                }
                let state = ValidationState::of(self.shape_type, &traits);
                Ref::new(Schema::Struct(StructSchema {
                    id: self.id.clone(),
                    shape_type: self.shape_type,
                    members,
                    traits,
                    state,
                    required_member_count,
                    required_bitfield,
                }))
            }
            ShapeType::List => {
                let members = self.members.read().expect("Lock poisoned");
                assert_eq!(
                    members.len(),
                    1,
                    "List schema `{}` must have exactly one `member` member",
                    self.id
                );
                let state = ValidationState::of(self.shape_type, &traits);
                Ref::new(Schema::List(ListSchema {
                    id: self.id.clone(),
                    member: members
                        .first()
                        .expect("Expected `member` member for list schema")
                        .build(),
                    traits,
                    state,
                }))
            }
            ShapeType::Map => {
                let members = self.members.read().expect("Lock poisoned");
                assert!(
                    members.len() == 2 && members[0].name == "key" && members[1].name == "value",
                    "Map schema `{}` must have a `key` member followed by a `value` member",
                    self.id
                );
                let state = ValidationState::of(self.shape_type, &traits);
                Ref::new(Schema::Map(MapSchema {
                    id: self.id.clone(),
                    key: members
                        .first()
                        .expect("Expected `key` member for map schema")
                        .build(),
                    value: members
                        .get(1)
                        .expect("Expected `value` member for map schema")
                        .build(),
                    traits,
                    state,
                }))
            }
            _ => unreachable!("Builder can only be created for aggregate types."),
        };
        self.built.set(output.clone()).expect("Lock poisoned");
        output
    }
}

/// Target of a member: either an already built schema or a forward
/// reference to a builder that has not finished building yet.
#[derive(Clone)]
pub enum MemberTarget {
    Resolved(SchemaRef),
    Deferred {
        builder: Arc<SchemaBuilder>,
        value: OnceLock<SchemaRef>,
    },
}

impl Deref for MemberTarget {
    type Target = SchemaRef;

    fn deref(&self) -> &Self::Target {
        match self {
            MemberTarget::Resolved(target) => target,
            MemberTarget::Deferred { builder, value } => value.get().unwrap_or_else(|| {
                // One-shot resolution; `build` is idempotent, so losing a
                // race to another thread publishes the same schema.
                let _ = value.set(builder.build());
                value.get().expect("Deferred member target resolved")
            }),
        }
    }
}

impl Debug for MemberTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemberTarget({})", self.id())
    }
}

impl PartialEq for MemberTarget {
    fn eq(&self, other: &Self) -> bool {
        // Compare by ID so recursive schema graphs terminate.
        self.deref().id() == other.deref().id()
    }
}
impl Eq for MemberTarget {}

impl From<&SchemaRef> for MemberTarget {
    fn from(schema: &SchemaRef) -> Self {
        MemberTarget::Resolved(schema.clone())
    }
}

impl From<&LazyLock<SchemaRef>> for MemberTarget {
    fn from(schema: &LazyLock<SchemaRef>) -> Self {
        MemberTarget::Resolved(schema.deref().clone())
    }
}

impl From<&Arc<SchemaBuilder>> for MemberTarget {
    fn from(builder_ref: &Arc<SchemaBuilder>) -> Self {
        MemberTarget::Deferred {
            builder: builder_ref.clone(),
            value: OnceLock::new(),
        }
    }
}

struct MemberSchemaBuilder {
    name: String,
    id: ShapeId,
    member_target: MemberTarget,
    traits: TraitMap,
    member_index: Option<usize>,
}

impl PartialEq for MemberSchemaBuilder {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.id == other.id
    }
}
impl Eq for MemberSchemaBuilder {}
impl PartialOrd for MemberSchemaBuilder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for MemberSchemaBuilder {
    fn cmp(&self, other: &Self) -> Ordering {
        // Sort members so that required members with no default come before other members.
        match (
            self.required_by_validation(),
            other.required_by_validation(),
        ) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

impl MemberSchemaBuilder {
    fn new(name: String, id: ShapeId, member_target: MemberTarget, traits: TraitList) -> Self {
        MemberSchemaBuilder {
            name,
            id,
            member_target,
            traits: TraitMap::of(traits),
            member_index: None,
        }
    }

    const fn set_index(&mut self, index: usize) {
        self.member_index = Some(index);
    }

    fn required_by_validation(&self) -> bool {
        self.traits.contains_type::<RequiredTrait>() && !self.traits.contains_type::<DefaultTrait>()
    }

    fn build(&self) -> SchemaRef {
        let index = self.member_index.unwrap_or_default();
        let required_by_validation = self.required_by_validation();
        let required_mask = if required_by_validation && index < 64 {
            1u64 << index
        } else {
            0
        };
        Ref::new(Schema::Member(MemberSchema {
            id: self.id.clone(),
            target: self.member_target.clone(),
            name: self.name.clone(),
            index,
            required_by_validation,
            required_mask,
            traits: self.traits.clone(),
            flattened_traits: OnceLock::new(),
            state: OnceLock::new(),
        }))
    }
}

// ============================================================================
// Precomputed validation state
// ============================================================================

/// Constraint state computed once per schema node so the streaming
/// validator never re-parses traits on the hot path.
///
/// Numeric bounds are widened to the native range of the shape type when
/// no `@range` trait is present; length bounds widen to `0..usize::MAX`.
#[derive(Debug)]
pub(crate) struct ValidationState {
    pub(crate) min_long: i64,
    pub(crate) max_long: i64,
    pub(crate) min_double: f64,
    pub(crate) max_double: f64,
    /// Raw `@range` bounds, kept in arbitrary precision for big number
    /// checks and for error messages.
    pub(crate) range: Option<(Option<BigDecimal>, Option<BigDecimal>)>,
    pub(crate) min_length: usize,
    pub(crate) max_length: usize,
    pub(crate) has_length: bool,
    pub(crate) pattern: Option<Regex>,
}

impl PartialEq for ValidationState {
    fn eq(&self, other: &Self) -> bool {
        self.min_long == other.min_long
            && self.max_long == other.max_long
            && self.min_double == other.min_double
            && self.max_double == other.max_double
            && self.range == other.range
            && self.min_length == other.min_length
            && self.max_length == other.max_length
            && self.has_length == other.has_length
            && self.pattern.as_ref().map(Regex::as_str) == other.pattern.as_ref().map(Regex::as_str)
    }
}

impl ValidationState {
    pub(crate) fn of(shape_type: ShapeType, traits: &TraitMap) -> Self {
        let (native_min, native_max) = native_long_range(shape_type);
        let range = traits
            .get_as::<RangeTrait>()
            .map(|range| (range.min().cloned(), range.max().cloned()));
        let (min_long, max_long) = match &range {
            Some((min, max)) => (
                min.as_ref()
                    .and_then(ToPrimitive::to_i64)
                    .unwrap_or(native_min),
                max.as_ref()
                    .and_then(ToPrimitive::to_i64)
                    .unwrap_or(native_max),
            ),
            None => (native_min, native_max),
        };
        let (min_double, max_double) = match &range {
            Some((min, max)) => (
                min.as_ref()
                    .and_then(ToPrimitive::to_f64)
                    .unwrap_or(f64::NEG_INFINITY),
                max.as_ref()
                    .and_then(ToPrimitive::to_f64)
                    .unwrap_or(f64::INFINITY),
            ),
            None => (f64::NEG_INFINITY, f64::INFINITY),
        };
        let length = traits.get_as::<LengthTrait>();
        ValidationState {
            min_long,
            max_long,
            min_double,
            max_double,
            range,
            min_length: length.and_then(LengthTrait::min).unwrap_or(0),
            max_length: length.and_then(LengthTrait::max).unwrap_or(usize::MAX),
            has_length: length.is_some(),
            pattern: traits
                .get_as::<PatternTrait>()
                .map(|pattern| pattern.pattern().clone()),
        }
    }
}

const fn native_long_range(shape_type: ShapeType) -> (i64, i64) {
    match shape_type {
        ShapeType::Byte => (i8::MIN as i64, i8::MAX as i64),
        ShapeType::Short => (i16::MIN as i64, i16::MAX as i64),
        ShapeType::Integer | ShapeType::IntEnum => (i32::MIN as i64, i32::MAX as i64),
        _ => (i64::MIN, i64::MAX),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::DocumentValue,
        schema::prelude::{JsonNameTrait, STRING},
        traits,
    };

    #[test]
    fn scalar_schemas() {
        let schema = Schema::create_integer(ShapeId::from("api.example#Integer"), traits![]);
        assert_eq!(schema.shape_type(), ShapeType::Integer);
        assert_eq!(schema.id(), &ShapeId::from("api.example#Integer"));
    }

    #[test]
    fn structure_schema() {
        let target = Schema::create_integer(ShapeId::from("api.example#Target"), traits![]);
        let schema = Schema::structure_builder(ShapeId::from("api.example#Example"), traits![])
            .put_member("target_a", &target, traits![])
            .put_member("target_b", &STRING, traits![])
            .build();
        assert_eq!(schema.shape_type(), ShapeType::Structure);
        assert_eq!(schema.id(), &ShapeId::from("api.example#Example"));
        let member = schema.get_member("target_a").unwrap();
        assert_eq!(member.shape_type(), ShapeType::Integer);
        assert_eq!(member.id(), &ShapeId::from("api.example#Example$target_a"));
        let Some(member_schema) = member.as_member() else {
            panic!("Should be member schema!")
        };
        assert_eq!(member_schema.target.id(), target.id());
    }

    #[test]
    #[should_panic(expected = "Lists can only have members named `member`. Found `bad`")]
    fn disallowed_list_schema() {
        let _schema = Schema::list_builder(ShapeId::from("api.example#List"), traits![])
            .put_member("bad", &STRING, traits![])
            .build();
    }

    #[test]
    #[should_panic(expected = "must have exactly one `member` member")]
    fn empty_list_schema() {
        let _schema = Schema::list_builder(ShapeId::from("api.example#List"), traits![]).build();
    }

    #[test]
    #[should_panic(expected = "must have at least one member")]
    fn empty_union_schema() {
        let _schema = Schema::union_builder(ShapeId::from("api.example#Union"), traits![]).build();
    }

    #[test]
    fn list_schema() {
        let schema = Schema::list_builder(ShapeId::from("api.example#List"), traits![])
            .put_member("member", &STRING, traits![])
            .build();
        assert_eq!(schema.shape_type(), ShapeType::List);
        let Some(list_schema) = schema.as_list() else {
            panic!("Should be list!")
        };
        let member = &list_schema.member;
        assert_eq!(member.shape_type(), ShapeType::String);
        assert_eq!(member.id(), &ShapeId::from("api.example#List$member"));
    }

    #[test]
    fn map_schema() {
        let schema = Schema::map_builder(ShapeId::from("api.example#Map"), traits![])
            .put_member("key", &STRING, traits![])
            .put_member("value", &STRING, traits![])
            .build();
        assert_eq!(schema.shape_type(), ShapeType::Map);
        let Some(map_schema) = schema.as_map() else {
            panic!("Should be map!")
        };
        assert_eq!(map_schema.key.id(), &ShapeId::from("api.example#Map$key"));
        assert_eq!(
            map_schema.value.id(),
            &ShapeId::from("api.example#Map$value")
        );
    }

    #[test]
    fn single_trait() {
        let schema = Schema::create_double(
            ShapeId::from("api.example#Example"),
            traits![JsonNameTrait::new("other")],
        );
        assert!(schema.contains_type::<JsonNameTrait>());
        let json_name_value = schema
            .get_trait_as::<JsonNameTrait>()
            .expect("No JSON name trait present");
        assert_eq!(json_name_value.name(), "other")
    }

    #[test]
    fn flattened_trait() {
        let target = Schema::create_integer(
            ShapeId::from("api.example#Target"),
            traits![JsonNameTrait::new("other")],
        );
        let schema = Schema::structure_builder(ShapeId::from("api.example#Example"), traits![])
            .put_member("target_a", &target, traits![])
            .build();
        let member = schema.get_member("target_a").expect("No such member");
        assert!(member.contains_type::<JsonNameTrait>());
        let json_name_value = member
            .get_trait_as::<JsonNameTrait>()
            .expect("No JSON name trait present");
        assert_eq!(json_name_value.name(), "other");
    }

    #[test]
    fn self_referential_schema() {
        let builder = Arc::new(Schema::structure_builder("api.example#Example", traits![]));
        let output = builder
            .put_member("name", &STRING, traits![])
            .put_member("self", &builder, traits![])
            .build();
        assert_eq!(output.id(), &ShapeId::from("api.example#Example"));
        let member = output.get_member("self").expect("No `self` member");
        let Schema::Member(self_member) = &**member else {
            panic!("Expected `self` member");
        };
        assert_eq!(
            self_member.target.id(),
            &ShapeId::from("api.example#Example")
        );
    }

    #[test]
    fn mutually_recursive_schemas() {
        let builder_a = Arc::new(Schema::structure_builder("api.example#ExampleA", traits![]));
        let builder_b = Arc::new(Schema::structure_builder("api.example#ExampleB", traits![]));

        let output_a = builder_a
            .put_member("other_b", &builder_b, traits![])
            .build();
        let output_b = builder_b
            .put_member("other_a", &builder_a, traits![])
            .build();

        let member_b = output_a.get_member("other_b").expect("No `other_b` member");
        let Schema::Member(rec_member_b) = &**member_b else {
            panic!("Expected member");
        };
        assert_eq!(
            rec_member_b.target.id(),
            &ShapeId::from("api.example#ExampleB")
        );

        let member_a = output_b.get_member("other_a").expect("No `other_a` member");
        let Schema::Member(rec_member_a) = &**member_a else {
            panic!("Expected member");
        };
        assert_eq!(
            rec_member_a.target.id(),
            &ShapeId::from("api.example#ExampleA")
        );
    }

    #[test]
    fn recursive_via_list() {
        let intermediate_builder = Arc::new(Schema::structure_builder(
            "api.example#Intermediate",
            traits![],
        ));
        let list_builder = Arc::new(Schema::list_builder("api.example#RecursiveList", traits![]));
        let intermediate_struct = intermediate_builder
            .put_member("list", &list_builder, traits![])
            .build();
        let recursive_list = list_builder
            .put_member("member", &intermediate_struct, traits![])
            .build();

        let list_member = intermediate_struct
            .get_member("list")
            .expect("No `list` member");
        let Schema::Member(rec_list) = &**list_member else {
            panic!("Expected `list` member");
        };
        assert_eq!(
            rec_list.target.id(),
            &ShapeId::from("api.example#RecursiveList")
        );

        let list_member = recursive_list.get_member("member").expect("No `member`");
        let Schema::Member(rec_struct) = &**list_member else {
            panic!("Expected `member` member");
        };
        assert_eq!(
            rec_struct.target.id(),
            &ShapeId::from("api.example#Intermediate")
        );
    }

    #[test]
    fn build_is_idempotent() {
        let builder = Schema::structure_builder(ShapeId::from("api.example#Once"), traits![]);
        let _ = builder.put_member("a", &STRING, traits![]);
        let first = builder.build();
        let second = builder.build();
        assert!(Ref::ptr_eq(&first, &second));
    }

    #[test]
    fn sorts_members() {
        let schema = Schema::structure_builder(ShapeId::from("api.example#Example"), traits![])
            .put_member(
                "target_b",
                &STRING,
                traits![
                    RequiredTrait,
                    DefaultTrait::new(DocumentValue::String("Woo".into()))
                ],
            )
            .put_member("target_a", &STRING, traits![RequiredTrait])
            .put_member("target_c", &STRING, traits![])
            .put_member("target_d", &STRING, traits![RequiredTrait])
            .put_member("target_e", &STRING, traits![])
            .build();
        assert_eq!(schema.members().len(), 5);
        let names: Vec<&String> = schema.members().keys().collect();
        assert_eq!(names, ["target_a", "target_d", "target_b", "target_c", "target_e"]);
    }

    #[test]
    fn member_indexes_and_masks() {
        let schema = Schema::structure_builder(ShapeId::from("api.example#Example"), traits![])
            .put_member("a", &STRING, traits![RequiredTrait])
            .put_member("b", &STRING, traits![RequiredTrait])
            .put_member("c", &STRING, traits![])
            .build();
        let Some(struct_schema) = schema.as_struct() else {
            panic!("Expected struct schema");
        };
        assert_eq!(struct_schema.required_member_count, 2);
        assert_eq!(struct_schema.required_bitfield, 0b11);
        for (expected_index, (name, member)) in schema.members().iter().enumerate() {
            let member = member.as_member().expect("member schema");
            assert_eq!(member.index, expected_index);
            if name == "c" {
                assert!(!member.required_by_validation);
                assert_eq!(member.required_mask, 0);
            } else {
                assert_eq!(member.required_mask, 1 << expected_index);
            }
        }
    }

    #[test]
    fn required_with_default_is_not_required_by_validation() {
        let schema = Schema::structure_builder(ShapeId::from("api.example#Example"), traits![])
            .put_member(
                "a",
                &STRING,
                traits![
                    RequiredTrait,
                    DefaultTrait::new(DocumentValue::String("dflt".into()))
                ],
            )
            .build();
        let struct_schema = schema.as_struct().expect("struct");
        assert_eq!(struct_schema.required_member_count, 0);
        assert_eq!(struct_schema.required_bitfield, 0);
    }

    #[test]
    fn precomputes_range_bounds() {
        let schema = Schema::create_byte(
            ShapeId::from("api.example#Limited"),
            traits![RangeTrait::builder().min(BigDecimal::from(2)).build()],
        );
        let state = schema.validation_state();
        assert_eq!(state.min_long, 2);
        assert_eq!(state.max_long, i64::from(i8::MAX));
    }
}
