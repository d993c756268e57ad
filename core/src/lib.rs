//! # trellis4rs core
//!
//! Schema-driven, protocol-agnostic serialization, validation, and
//! dynamic-data runtime. Schemas model shapes from a Trellis IDL model
//! (scalars, lists, maps, structures, unions, enums, documents, streams)
//! annotated with traits, and the serde visitor protocol in
//! [`crate::serde`] moves data-model values between shapes and codecs
//! without committing to any wire format.

mod errors;
pub use errors::{ApiError, Fault, ModeledApiError, RetrySafety, capture_stack_traces};

pub mod schema;
pub mod serde;
pub mod stream;

mod macros;

use std::sync::Arc;

use rustc_hash::FxBuildHasher;

/// Cheaply cloneable shared reference used throughout the runtime.
///
/// Schemas, traits, and registries are immutable after construction, so a
/// shared pointer is all that is ever needed to hand them around.
pub type Ref<T> = Arc<T>;

/// Insertion-ordered map with a fast, non-cryptographic hasher.
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, FxBuildHasher>;

/// Insertion-ordered set with a fast, non-cryptographic hasher.
pub type FxIndexSet<T> = indexmap::IndexSet<T, FxBuildHasher>;

// Re-export core data types
pub use bigdecimal::BigDecimal;
pub use bytebuffer::ByteBuffer;
pub use indexmap::IndexMap;
pub use num_bigint::BigInt;
pub use temporal_rs::Instant;
