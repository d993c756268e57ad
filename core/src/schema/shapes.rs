use std::fmt::{self, Display, Formatter};

use thiserror::Error;

/// Errors raised while constructing schemas or parsing shape identifiers.
///
/// Schemas are built at process startup from static definitions, so these
/// errors are fatal to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Invalid shape ID `{0}`: {1}")]
    InvalidShapeId(String, &'static str),
    #[error("Schema `{0}` is missing expected member `{1}`")]
    MissingMember(String, String),
}

/// Namespaced identifier of a shape in a Trellis model.
///
/// Rendered as `namespace#Name` or `namespace#Name$member`. Identifiers
/// are immutable values: equality and hashing work on the full rendered
/// form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeId {
    id: String,
    namespace_len: usize,
    name_len: usize,
    has_member: bool,
}

impl ShapeId {
    /// Parse a shape ID, failing on malformed input.
    pub fn parse(value: &str) -> Result<ShapeId, SchemaError> {
        let Some((namespace, rest)) = value.split_once('#') else {
            return Err(SchemaError::InvalidShapeId(
                value.to_string(),
                "missing `#` separator",
            ));
        };
        let (name, member) = match rest.split_once('$') {
            Some((name, member)) => (name, Some(member)),
            None => (rest, None),
        };
        if !namespace.split('.').all(valid_identifier) {
            return Err(SchemaError::InvalidShapeId(
                value.to_string(),
                "invalid namespace",
            ));
        }
        if !valid_identifier(name) {
            return Err(SchemaError::InvalidShapeId(
                value.to_string(),
                "invalid shape name",
            ));
        }
        if let Some(member) = member
            && !valid_identifier(member)
        {
            return Err(SchemaError::InvalidShapeId(
                value.to_string(),
                "invalid member name",
            ));
        }
        Ok(ShapeId {
            id: value.to_string(),
            namespace_len: namespace.len(),
            name_len: name.len(),
            has_member: member.is_some(),
        })
    }

    /// Build a shape ID from its parts.
    #[must_use]
    pub fn from_parts(namespace: &str, name: &str, member: Option<&str>) -> ShapeId {
        let mut id = String::with_capacity(
            namespace.len() + name.len() + member.map_or(0, |m| m.len() + 1) + 1,
        );
        id.push_str(namespace);
        id.push('#');
        id.push_str(name);
        if let Some(member) = member {
            id.push('$');
            id.push_str(member);
        }
        ShapeId {
            id,
            namespace_len: namespace.len(),
            name_len: name.len(),
            has_member: member.is_some(),
        }
    }

    /// Derive the ID of a member of this shape.
    #[must_use]
    pub fn with_member(&self, member: &str) -> ShapeId {
        Self::from_parts(self.namespace(), self.name(), Some(member))
    }

    /// The full rendered identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.id[..self.namespace_len]
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.id[self.namespace_len + 1..self.namespace_len + 1 + self.name_len]
    }

    #[must_use]
    pub fn member(&self) -> Option<&str> {
        self.has_member
            .then(|| &self.id[self.namespace_len + self.name_len + 2..])
    }
}

impl Display for ShapeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl From<&str> for ShapeId {
    /// Parse a shape ID from a literal, panicking on malformed input.
    ///
    /// Shape IDs in code come from static model definitions, so a parse
    /// failure here is a startup bug.
    fn from(value: &str) -> Self {
        match Self::parse(value) {
            Ok(id) => id,
            Err(error) => panic!("{error}"),
        }
    }
}

fn valid_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The type of a shape in the Trellis data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeType {
    Blob,
    Boolean,
    String,
    Timestamp,
    Byte,
    Short,
    Integer,
    Long,
    Float,
    Double,
    BigInteger,
    BigDecimal,
    Document,
    Enum,
    IntEnum,
    List,
    Map,
    Structure,
    Union,
    Member,
    Service,
    Resource,
    Operation,
    Unit,
}

impl Display for ShapeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeType::Blob => "blob",
            ShapeType::Boolean => "boolean",
            ShapeType::String => "string",
            ShapeType::Timestamp => "timestamp",
            ShapeType::Byte => "byte",
            ShapeType::Short => "short",
            ShapeType::Integer => "integer",
            ShapeType::Long => "long",
            ShapeType::Float => "float",
            ShapeType::Double => "double",
            ShapeType::BigInteger => "bigInteger",
            ShapeType::BigDecimal => "bigDecimal",
            ShapeType::Document => "document",
            ShapeType::Enum => "enum",
            ShapeType::IntEnum => "intEnum",
            ShapeType::List => "list",
            ShapeType::Map => "map",
            ShapeType::Structure => "structure",
            ShapeType::Union => "union",
            ShapeType::Member => "member",
            ShapeType::Service => "service",
            ShapeType::Resource => "resource",
            ShapeType::Operation => "operation",
            ShapeType::Unit => "unit",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_id_from_str() {
        let shape_id = ShapeId::from("com.example#MyShape");
        assert_eq!(shape_id.namespace(), "com.example");
        assert_eq!(shape_id.name(), "MyShape");
        assert_eq!(shape_id.member(), None);
        assert_eq!(shape_id.id(), "com.example#MyShape");
    }

    #[test]
    fn shape_id_from_str_with_member() {
        let shape_id = ShapeId::from("com.example#MyShape$member");
        assert_eq!(shape_id.namespace(), "com.example");
        assert_eq!(shape_id.name(), "MyShape");
        assert_eq!(shape_id.member(), Some("member"));
    }

    #[test]
    fn invalid_id_missing_separator() {
        assert!(ShapeId::parse("com.example.no.shape").is_err());
    }

    #[test]
    fn invalid_id_bad_segments() {
        assert!(ShapeId::parse("com.#Shape").is_err());
        assert!(ShapeId::parse("com.example#1Shape").is_err());
        assert!(ShapeId::parse("com.example#Shape$").is_err());
        assert!(ShapeId::parse("com.example#Shape$1bad").is_err());
    }

    #[test]
    #[should_panic(expected = "Invalid shape ID")]
    fn invalid_id_from_str() {
        let _ = ShapeId::from("com.example.no.shape");
    }

    #[test]
    fn shape_id_from_parts() {
        let shape_id = ShapeId::from_parts("com.example", "MyShape", Some("member"));
        assert_eq!(shape_id.namespace(), "com.example");
        assert_eq!(shape_id.name(), "MyShape");
        assert_eq!(shape_id.member(), Some("member"));
        assert_eq!(shape_id.id(), "com.example#MyShape$member");
    }

    #[test]
    fn shape_id_with_member() {
        let base = ShapeId::from_parts("com.example", "MyShape", None);
        let shape_id = base.with_member("member");
        assert_eq!(shape_id.id(), "com.example#MyShape$member");
    }
}
