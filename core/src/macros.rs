/// Create a list of traits for use in Schema builders.
#[macro_export]
macro_rules! traits {
    () => { Vec::new() };
    ($($x:expr),+ $(,)?) => (
        vec![$($crate::schema::TraitRef::from($x)),*]
    );
}

/// Create a lazy, static schema definition.
///
/// The two-argument form stores the result of an arbitrary builder
/// expression. The member-list form additionally defines a lazy static for
/// every declared member so generated or hand-written shapes can reference
/// member schemas directly.
#[macro_export]
macro_rules! lazy_schema {
    ($schema_name:ident, $builder:expr) => {
        pub static $schema_name: std::sync::LazyLock<$crate::schema::SchemaRef> =
            std::sync::LazyLock::new(|| $builder);
    };
    ($schema_name:ident, $builder:expr, $(($member_name:ident, $member_ident:literal, $target:expr, $traits:expr)),+ $(,)?) => {
        pub static $schema_name: std::sync::LazyLock<$crate::schema::SchemaRef> =
            std::sync::LazyLock::new(|| {
                let builder = $builder;
                $(let builder = builder.put_member($member_ident, $target, $traits);)+
                builder.build()
            });
        $(
            pub static $member_name: std::sync::LazyLock<$crate::schema::SchemaRef> =
                std::sync::LazyLock::new(|| $schema_name.expect_member($member_ident).clone());
        )+
    };
}

/// Create a lazy, static member schema definition.
#[macro_export]
macro_rules! lazy_member_schema {
    ($member_schema_name:ident, $parent_schema:ident, $identifier:literal) => {
        pub static $member_schema_name: std::sync::LazyLock<$crate::schema::SchemaRef> =
            std::sync::LazyLock::new(|| $parent_schema.expect_member($identifier).clone());
    };
}

/// Create a lazy, static Shape ID.
#[macro_export]
macro_rules! lazy_shape_id {
    ($id_name:ident, $identifier:literal) => {
        static $id_name: std::sync::LazyLock<$crate::schema::ShapeId> =
            std::sync::LazyLock::new(|| $crate::schema::ShapeId::from($identifier));
    };
}

/// Define a valueless (annotation) trait implementation.
///
/// Annotation traits carry no data; their presence on a schema is the
/// entire signal.
#[macro_export]
macro_rules! annotation_trait {
    ($trait_struct:ident, $id_var:ident, $id_name:literal) => {
        #[derive(Debug, Default)]
        pub struct $trait_struct;
        impl $trait_struct {
            #[must_use]
            pub const fn new() -> Self {
                Self
            }
        }
        $crate::lazy_shape_id!($id_var, $id_name);
        impl $crate::schema::StaticTraitId for $trait_struct {
            fn trait_id() -> &'static $crate::schema::ShapeId {
                &$id_var
            }
        }
        impl $crate::schema::ShapeTrait for $trait_struct {
            fn id(&self) -> &$crate::schema::ShapeId {
                &$id_var
            }

            fn value(&self) -> &$crate::schema::DocumentValue {
                &$crate::schema::DocumentValue::Null
            }
        }
    };
}
