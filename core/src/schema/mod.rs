//! Core shape, trait, and schema definitions.

/// Prelude schema and trait definitions for the base data model.
pub mod prelude;

mod traits;
pub use traits::{DynamicTrait, ShapeTrait, StaticTraitId, TraitRef};
pub(crate) use traits::TraitMap;

mod documents;
pub use documents::{
    Document, DocumentEquality, DocumentError, DocumentValue, NumberFloat, NumberInteger,
    NumberValue,
};

mod shapes;
pub use shapes::{SchemaError, ShapeId, ShapeType};

mod schemas;
pub use schemas::{
    EnumSchema, ListSchema, MapSchema, MemberSchema, MemberTarget, SchemaBuilder, SchemaRef,
    ScalarSchema, Schema, StructSchema, TraitList,
};
pub(crate) use schemas::ValidationState;

mod registry;
pub use registry::{
    AnyShape, BuilderSupplier, DynShapeBuilder, RegistryError, TypeRegistry, TypeRegistryBuilder,
};

mod unit;
pub use unit::{UNIT, Unit};
