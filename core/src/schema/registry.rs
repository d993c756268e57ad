//! Type registry for discriminated deserialization.
//!
//! Maps shape IDs to builder suppliers so that dynamically typed
//! documents can be turned back into concrete shapes. Entries are either
//! eager (the supplier is known up front) or lazy (materialized on first
//! access, avoiding eager setup cost for large registries). Registries
//! are immutable after `build()`.

use std::any::TypeId;
use std::sync::OnceLock;

use downcast_rs::{DowncastSync, impl_downcast};
use log::debug;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::schema::documents::TYPE_FIELD;
use crate::schema::{Document, DocumentError, SchemaRef, ShapeId};
use crate::serde::{PresenceTracker, SchemaShape, SerializableShape};

/// Errors raised by registry lookups and discriminated deserialization.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No builder registered for shape `{0}`")]
    UnsupportedShape(ShapeId),
    #[error("Builder registered for `{0}` does not produce the expected type")]
    TypeMismatch(ShapeId),
    #[error("Document has no discriminator")]
    MissingDiscriminator,
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Missing required members on `{id}`: {members:?}")]
    MissingRequiredMembers { id: ShapeId, members: Vec<String> },
    #[error("Failed to build shape: {0}")]
    Build(String),
}

/// A deserialized shape of erased concrete type.
///
/// Callers downcast to the concrete shape they expect:
///
/// ```rust,ignore
/// let shape = registry.deserialize(&document)?;
/// let concrete = shape.downcast_ref::<MyShape>().expect("wrong shape");
/// ```
pub trait AnyShape: DowncastSync {
    fn schema(&self) -> &SchemaRef;
}
impl_downcast!(sync AnyShape);

impl<T: SerializableShape + Send + Sync + 'static> AnyShape for T {
    fn schema(&self) -> &SchemaRef {
        SchemaShape::schema(self)
    }
}

/// Object-safe shape builder driven member-by-member from documents.
pub trait DynShapeBuilder: Send {
    /// Schema of the shape under construction.
    fn schema(&self) -> &SchemaRef;

    /// Set a member from a document value.
    fn set_member(&mut self, member_name: &str, value: &Document) -> Result<(), RegistryError>;

    /// Fill missing required members with their zero values.
    fn error_correction(&mut self);

    /// Build the shape.
    fn build(self: Box<Self>) -> Result<Box<dyn AnyShape>, RegistryError>;
}

/// Supplier of fresh builders for one shape.
pub type BuilderSupplier = fn() -> Box<dyn DynShapeBuilder>;

#[derive(Clone)]
enum RegistryEntry {
    Eager {
        type_id: TypeId,
        supplier: BuilderSupplier,
    },
    // Lazy entries hold the initializer and materialize the class token
    // and supplier on first access.
    Lazy {
        cell: OnceLock<(TypeId, BuilderSupplier)>,
        init: fn() -> (TypeId, BuilderSupplier),
    },
}

impl RegistryEntry {
    fn resolve(&self) -> (TypeId, BuilderSupplier) {
        match self {
            RegistryEntry::Eager { type_id, supplier } => (*type_id, *supplier),
            RegistryEntry::Lazy { cell, init } => *cell.get_or_init(*init),
        }
    }
}

/// Immutable mapping from shape IDs to shape builder suppliers.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    map: FxHashMap<ShapeId, RegistryEntry>,
}

impl TypeRegistry {
    #[must_use]
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::default()
    }

    /// A registry with no entries.
    #[must_use]
    pub fn empty() -> TypeRegistry {
        TypeRegistry::default()
    }

    #[must_use]
    pub fn contains(&self, shape_id: &ShapeId) -> bool {
        self.map.contains_key(shape_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Create a fresh builder for a shape, or `None` when the shape is
    /// not registered.
    #[must_use]
    pub fn create_builder(&self, shape_id: &ShapeId) -> Option<Box<dyn DynShapeBuilder>> {
        self.map.get(shape_id).map(|entry| {
            let (_, supplier) = entry.resolve();
            supplier()
        })
    }

    /// Create a fresh builder for a shape, checking that the registered
    /// builder produces the expected concrete type.
    pub fn create_builder_of<T: 'static>(
        &self,
        shape_id: &ShapeId,
    ) -> Result<Box<dyn DynShapeBuilder>, RegistryError> {
        let entry = self
            .map
            .get(shape_id)
            .ok_or_else(|| RegistryError::UnsupportedShape(shape_id.clone()))?;
        let (type_id, supplier) = entry.resolve();
        if type_id != TypeId::of::<T>() {
            return Err(RegistryError::TypeMismatch(shape_id.clone()));
        }
        Ok(supplier())
    }

    /// Deserialize a document into its modeled shape with client error
    /// correction: missing required members are zero-filled.
    pub fn deserialize(&self, document: &Document) -> Result<Box<dyn AnyShape>, RegistryError> {
        self.deserialize_mode(document, false)
    }

    /// Deserialize a document into its modeled shape, failing when
    /// required members are missing. For authoritative consumers.
    pub fn deserialize_strict(
        &self,
        document: &Document,
    ) -> Result<Box<dyn AnyShape>, RegistryError> {
        self.deserialize_mode(document, true)
    }

    fn deserialize_mode(
        &self,
        document: &Document,
        strict: bool,
    ) -> Result<Box<dyn AnyShape>, RegistryError> {
        let id = document
            .extract_discriminator()?
            .ok_or(RegistryError::MissingDiscriminator)?;
        let mut builder = self
            .create_builder(&id)
            .ok_or_else(|| RegistryError::UnsupportedShape(id.clone()))?;
        let schema = builder.schema().clone();
        // The registry tracks presence itself so strict mode works even
        // for builders that do not enforce required members.
        let mut tracker = PresenceTracker::of(&schema);
        if let Some(members) = document.as_map() {
            for (name, value) in members {
                if name == TYPE_FIELD {
                    continue;
                }
                match schema.get_member(name) {
                    Some(member_schema) => {
                        builder.set_member(name, value)?;
                        if let Some(member) = member_schema.as_member() {
                            tracker.mark(member);
                        }
                    }
                    None => debug!("Dropping unknown member `{name}` of `{id}`"),
                }
            }
        }
        if !tracker.all_set() {
            if strict {
                return Err(RegistryError::MissingRequiredMembers {
                    id,
                    members: tracker.missing_members(),
                });
            }
            builder.error_correction();
        }
        builder.build()
    }

    /// Compose two registries. `first` wins on shape ID collisions;
    /// composing with an empty registry collapses to the other registry.
    #[must_use]
    pub fn compose(first: &TypeRegistry, second: &TypeRegistry) -> TypeRegistry {
        if first.map.is_empty() {
            return second.clone();
        }
        if second.map.is_empty() {
            return first.clone();
        }
        let mut map = second.map.clone();
        map.extend(first.map.clone());
        TypeRegistry { map }
    }
}

/// Builder for [`TypeRegistry`].
#[derive(Default)]
pub struct TypeRegistryBuilder {
    map: FxHashMap<ShapeId, RegistryEntry>,
}

impl TypeRegistryBuilder {
    /// Register an eager entry for shape type `T`.
    #[must_use]
    pub fn put<T: 'static>(mut self, shape_id: ShapeId, supplier: BuilderSupplier) -> Self {
        self.map.insert(
            shape_id,
            RegistryEntry::Eager {
                type_id: TypeId::of::<T>(),
                supplier,
            },
        );
        self
    }

    /// Register a lazy entry; the initializer runs on first access.
    #[must_use]
    pub fn put_lazy(
        mut self,
        shape_id: ShapeId,
        init: fn() -> (TypeId, BuilderSupplier),
    ) -> Self {
        self.map.insert(
            shape_id,
            RegistryEntry::Lazy {
                cell: OnceLock::new(),
                init,
            },
        );
        self
    }

    #[must_use]
    pub fn build(self) -> TypeRegistry {
        TypeRegistry { map: self.map }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::prelude::{INTEGER, RequiredTrait, STRING};
    use crate::schema::{Schema, ShapeId};
    use crate::serde::correction::ErrorCorrectionDefault;
    use crate::serde::se::{SerializeWithSchema, Serializer, StructSerializer};
    use crate::{IndexMap, lazy_member_schema, lazy_schema, traits};

    lazy_schema!(
        PERSON_SCHEMA,
        Schema::structure_builder(ShapeId::from("test#Person"), traits![])
            .put_member("name", &STRING, traits![RequiredTrait])
            .put_member("age", &INTEGER, traits![])
            .build()
    );
    lazy_member_schema!(PERSON_NAME, PERSON_SCHEMA, "name");
    lazy_member_schema!(PERSON_AGE, PERSON_SCHEMA, "age");

    #[derive(Debug, PartialEq)]
    struct Person {
        name: String,
        age: Option<i32>,
    }

    impl SchemaShape for Person {
        fn schema(&self) -> &SchemaRef {
            &PERSON_SCHEMA
        }
    }

    impl SerializableShape for Person {}

    impl SerializeWithSchema for Person {
        fn serialize_with_schema<S: Serializer>(
            &self,
            schema: &SchemaRef,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut ser = serializer.write_struct(schema, 2)?;
            ser.serialize_member(&PERSON_NAME, &self.name)?;
            ser.serialize_optional_member(&PERSON_AGE, &self.age)?;
            ser.end(schema)
        }
    }

    #[derive(Default)]
    struct PersonBuilder {
        name: Option<String>,
        age: Option<i32>,
    }

    impl PersonBuilder {
        fn supplier() -> Box<dyn DynShapeBuilder> {
            Box::new(PersonBuilder::default())
        }
    }

    impl DynShapeBuilder for PersonBuilder {
        fn schema(&self) -> &SchemaRef {
            &PERSON_SCHEMA
        }

        fn set_member(&mut self, member_name: &str, value: &Document) -> Result<(), RegistryError> {
            match member_name {
                "name" => {
                    self.name = Some(
                        value
                            .as_string()
                            .ok_or(DocumentError::Conversion("string"))?
                            .to_string(),
                    );
                }
                "age" => self.age = value.as_integer(),
                _ => debug!("Ignoring unknown member `{member_name}`"),
            }
            Ok(())
        }

        fn error_correction(&mut self) {
            if self.name.is_none() {
                self.name = Some(String::correction_default());
            }
        }

        fn build(self: Box<Self>) -> Result<Box<dyn AnyShape>, RegistryError> {
            let name = self
                .name
                .ok_or_else(|| RegistryError::Build("name is required".to_string()))?;
            Ok(Box::new(Person {
                name,
                age: self.age,
            }))
        }
    }

    fn person_registry() -> TypeRegistry {
        TypeRegistry::builder()
            .put::<Person>(ShapeId::from("test#Person"), PersonBuilder::supplier)
            .build()
    }

    fn person_document(with_name: bool) -> Document {
        let mut members: IndexMap<String, Document> = IndexMap::new();
        members.insert("__type".to_string(), Document::of("test#Person"));
        if with_name {
            members.insert("name".to_string(), Document::of("Ada"));
        }
        members.insert("age".to_string(), Document::of(36i32));
        Document::of(members)
    }

    #[test]
    fn contains_and_create_builder() {
        let registry = person_registry();
        assert!(registry.contains(&ShapeId::from("test#Person")));
        assert!(!registry.contains(&ShapeId::from("test#Unknown")));
        assert!(registry.create_builder(&ShapeId::from("test#Person")).is_some());
        assert!(registry.create_builder(&ShapeId::from("test#Unknown")).is_none());
    }

    #[test]
    fn type_checked_builder_creation() {
        let registry = person_registry();
        assert!(registry
            .create_builder_of::<Person>(&ShapeId::from("test#Person"))
            .is_ok());
        let mismatch = registry.create_builder_of::<String>(&ShapeId::from("test#Person"));
        assert!(matches!(mismatch, Err(RegistryError::TypeMismatch(_))));
    }

    #[test]
    fn deserializes_discriminated_documents() {
        let registry = person_registry();
        let shape = registry.deserialize(&person_document(true)).unwrap();
        let person = shape.downcast_ref::<Person>().expect("wrong type");
        assert_eq!(
            person,
            &Person {
                name: "Ada".to_string(),
                age: Some(36),
            }
        );
    }

    #[test]
    fn error_correction_fills_missing_required_members() {
        let registry = person_registry();
        let shape = registry.deserialize(&person_document(false)).unwrap();
        let person = shape.downcast_ref::<Person>().expect("wrong type");
        assert_eq!(person.name, "");
        assert_eq!(person.age, Some(36));
    }

    #[test]
    fn strict_deserialization_requires_all_members() {
        let registry = person_registry();
        let result = registry.deserialize_strict(&person_document(false));
        let Err(RegistryError::MissingRequiredMembers { members, .. }) = result else {
            panic!("Expected missing required members");
        };
        assert_eq!(members, ["name"]);

        assert!(registry.deserialize_strict(&person_document(true)).is_ok());
    }

    #[test]
    fn unknown_discriminator_is_unsupported() {
        let registry = person_registry();
        let mut members: IndexMap<String, Document> = IndexMap::new();
        members.insert("__type".to_string(), Document::of("test#Unknown"));
        let document = Document::of(members);
        assert!(matches!(
            registry.deserialize(&document),
            Err(RegistryError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn document_without_discriminator_is_rejected() {
        let registry = person_registry();
        let document = Document::of(5i32);
        assert!(matches!(
            registry.deserialize(&document),
            Err(RegistryError::MissingDiscriminator)
        ));
    }

    #[test]
    fn lazy_entries_materialize_on_first_access() {
        let registry = TypeRegistry::builder()
            .put_lazy(ShapeId::from("test#Person"), || {
                (TypeId::of::<Person>(), PersonBuilder::supplier)
            })
            .build();
        assert!(registry.contains(&ShapeId::from("test#Person")));
        assert!(registry
            .create_builder_of::<Person>(&ShapeId::from("test#Person"))
            .is_ok());
    }

    #[test]
    fn compose_prefers_the_first_registry_and_collapses_empties() {
        let registry = person_registry();
        let empty = TypeRegistry::empty();

        let left = TypeRegistry::compose(&empty, &registry);
        assert!(left.contains(&ShapeId::from("test#Person")));
        let right = TypeRegistry::compose(&registry, &empty);
        assert!(right.contains(&ShapeId::from("test#Person")));

        // On collision the first registry's entry wins.
        let other = TypeRegistry::builder()
            .put::<String>(ShapeId::from("test#Person"), PersonBuilder::supplier)
            .build();
        let composed = TypeRegistry::compose(&registry, &other);
        assert!(composed
            .create_builder_of::<Person>(&ShapeId::from("test#Person"))
            .is_ok());
    }
}
