//! Visitor-style serializer/deserializer protocol.
//!
//! The protocol is a uniform pull/push interface over shape values with an
//! attached schema, independent of any wire format. Codecs implement
//! [`se::Serializer`] and [`de::Deserializer`]; shapes implement
//! [`se::SerializeWithSchema`] and [`de::DeserializeWithSchema`].

pub mod correction;
pub mod deserializers;
pub mod fmt;
pub mod serializers;
pub mod validation;

mod documents;
mod presence;
mod shapes;
mod utils;

pub use presence::PresenceTracker;
pub use shapes::{SchemaShape, SerializableShape, StaticSchemaShape};
pub use utils::{KeySerializer, NullSerializer};

pub use deserializers as de;
pub use serializers as se;
