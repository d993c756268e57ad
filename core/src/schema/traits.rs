//! # Shape traits
//!
//! Traits attach structured metadata to a [`Schema`] and are the primary
//! mechanism to customize runtime and serde behavior of shapes modeled in
//! the IDL. For example, [`crate::schema::prelude::LengthTrait`] constrains
//! the length of strings, blobs, lists, and maps.
//!
//! Traits on a [`Schema`] can be accessed with [`Schema::get_trait`] (as a
//! dynamic trait object) or [`Schema::get_trait_as`] (downcast to a
//! concrete implementation). Implementations without a [`StaticTraitId`]
//! cannot be downcast into and can only be inspected through their
//! document value.
//!
//! [`Schema`]: crate::schema::Schema
//! [`Schema::get_trait`]: crate::schema::Schema::get_trait
//! [`Schema::get_trait_as`]: crate::schema::Schema::get_trait_as

pub(crate) mod prelude;

use std::{collections::BTreeMap, fmt::Debug, ops::Deref};

use downcast_rs::{DowncastSync, impl_downcast};

use crate::{
    Ref,
    schema::{DocumentValue, ShapeId},
};

/// Base trait for all shape trait implementations.
///
/// Implementations can be downcast into a specific trait type:
///
/// ```rust,ignore
/// my_trait.downcast_ref::<SpecificTraitImpl>()
/// ```
pub trait ShapeTrait: DowncastSync {
    /// The ID of the trait as expressed in the model.
    fn id(&self) -> &ShapeId;

    /// The data stored inside the trait as a document value.
    fn value(&self) -> &DocumentValue;
}
impl_downcast!(sync ShapeTrait);

impl Debug for dyn ShapeTrait {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "dyn ShapeTrait {{ id: {:?}, value: {:?} }}",
            self.id(),
            self.value()
        )
    }
}

/// Trait implementations with a statically known ID.
///
/// Pre-defined trait implementations implement this so schemas can look
/// them up by type rather than by ID string.
pub trait StaticTraitId: ShapeTrait {
    /// Static trait ID as found in the model definition of the trait.
    fn trait_id() -> &'static ShapeId;
}

/// Cheaply cloneable reference to a dynamic trait.
///
/// A thin wrapper used primarily to allow blanket conversion
/// implementations from concrete trait values.
#[derive(Debug, Clone)]
#[repr(transparent)]
pub struct TraitRef(Ref<dyn ShapeTrait>);

impl PartialEq for TraitRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id() && self.value() == other.value()
    }
}

impl Deref for TraitRef {
    type Target = dyn ShapeTrait;

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}

impl From<Ref<dyn ShapeTrait>> for TraitRef {
    #[inline]
    fn from(value: Ref<dyn ShapeTrait>) -> Self {
        Self(value)
    }
}

impl<T: ShapeTrait> From<T> for TraitRef {
    #[inline]
    fn from(value: T) -> Self {
        Self(Ref::new(value))
    }
}

/// Representation of a trait with no pre-defined Rust implementation.
///
/// Allows user-defined traits in a model to be read by runtime code. The
/// trait data is only accessible as a document value; dynamic traits
/// cannot be downcast into a concrete implementation.
#[derive(Debug, Clone)]
pub struct DynamicTrait {
    id: ShapeId,
    value: DocumentValue,
}

impl DynamicTrait {
    pub fn new<I: Into<ShapeId>>(id: I, value: DocumentValue) -> Self {
        Self {
            id: id.into(),
            value,
        }
    }
}

impl ShapeTrait for DynamicTrait {
    fn id(&self) -> &ShapeId {
        &self.id
    }

    fn value(&self) -> &DocumentValue {
        &self.value
    }
}

/// Map used to track the traits applied to a schema.
#[derive(Clone, Debug, PartialEq, Default)]
pub(crate) struct TraitMap {
    // NOTE: BTreeMap is used here b/c it outperforms HashMap for access and memory usage
    //       when the collection size is small. Schemas typically have very few traits.
    map: BTreeMap<ShapeId, TraitRef>,
}

impl TraitMap {
    /// Creates a new, empty map.
    ///
    /// Created with 0 capacity so it does not allocate until first insert.
    pub fn new() -> TraitMap {
        TraitMap {
            map: BTreeMap::new(),
        }
    }

    /// Returns true if the map contains a value for the specified trait ID.
    #[must_use]
    #[inline]
    pub fn contains(&self, id: &ShapeId) -> bool {
        self.map.contains_key(id)
    }

    /// Returns true if the map contains a trait of type `T`.
    #[must_use]
    #[inline]
    pub fn contains_type<T: StaticTraitId>(&self) -> bool {
        self.contains(T::trait_id())
    }

    /// Returns a reference to the trait corresponding to the ID, if any.
    #[must_use]
    #[inline]
    pub fn get(&self, id: &ShapeId) -> Option<&TraitRef> {
        self.map.get(id)
    }

    /// Gets a trait as a specific implementation if it exists.
    #[must_use]
    #[inline]
    pub fn get_as<T: ShapeTrait + StaticTraitId>(&self) -> Option<&T> {
        self.get(T::trait_id())
            .and_then(|dyn_trait| dyn_trait.downcast_ref::<T>())
    }

    /// Extends this map with the contents of another map.
    pub fn extend(&mut self, trait_map: &TraitMap) {
        self.map.extend(trait_map.map.clone());
    }

    /// Create a map from a list of traits; used when constructing schemas.
    pub(crate) fn of(traits: Vec<TraitRef>) -> Self {
        let mut map = TraitMap::new();
        for shape_trait in traits {
            map.map.insert(shape_trait.id().clone(), shape_trait);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::prelude::{HttpErrorTrait, LengthTrait, SensitiveTrait},
        traits,
    };

    #[test]
    fn basic_map_functionality() {
        let dyn_id: ShapeId = "trellis.test#Dynamic".into();
        let map = TraitMap::of(traits![
            SensitiveTrait::new(),
            DynamicTrait::new(dyn_id.clone(), DocumentValue::String("b".to_string()))
        ]);
        assert!(map.contains(&dyn_id));
        assert!(map.contains(SensitiveTrait::trait_id()));
        assert!(map.contains_type::<SensitiveTrait>());
        assert!(!map.contains_type::<HttpErrorTrait>());
    }

    #[test]
    fn map_extension() {
        let mut map_a = TraitMap::of(traits![SensitiveTrait::new()]);
        let map_b = TraitMap::of(traits![HttpErrorTrait::new(404)]);

        map_a.extend(&map_b);
        assert!(map_a.contains(HttpErrorTrait::trait_id()));
        assert!(map_a.contains_type::<HttpErrorTrait>());
        assert!(map_a.contains_type::<SensitiveTrait>());
    }

    #[test]
    fn trait_conversion_to_type() {
        let map = TraitMap::of(traits![HttpErrorTrait::new(404)]);
        let Some(cast_value) = map.get_as::<HttpErrorTrait>() else {
            panic!("Could not find expected trait")
        };
        assert_eq!(cast_value.code(), 404);
    }

    #[test]
    fn dynamic_traits_cannot_downcast() {
        let map = TraitMap::of(traits![DynamicTrait::new(
            LengthTrait::trait_id().clone(),
            DocumentValue::Null
        )]);
        assert!(map.contains_type::<LengthTrait>());
        assert!(map.get_as::<LengthTrait>().is_none());
    }
}
