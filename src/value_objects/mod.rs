//! Object graph value objects
//!
//! Value objects are immutable types compared by value: arena keys, property
//! values and their kinds, and cardinality bounds.

pub mod vocabulary;

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use vocabulary::{XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING};

/// Arena key of an entity inside a [`Document`](crate::Document)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Create a fresh entity id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying uuid
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The object position of a stored triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// A reference to another resource
    Uri(String),
    /// A plain string literal
    Text(String),
    /// An `xsd:integer` literal
    Integer(i64),
    /// An `xsd:double` literal
    Float(f64),
    /// An `xsd:boolean` literal
    Boolean(bool),
}

impl PropertyValue {
    /// Build a URI value
    pub fn uri(value: impl Into<String>) -> Self {
        PropertyValue::Uri(value.into())
    }

    /// Build a text literal
    pub fn text(value: impl Into<String>) -> Self {
        PropertyValue::Text(value.into())
    }

    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Uri(_) => ValueKind::Uri,
            PropertyValue::Text(_) => ValueKind::Text,
            PropertyValue::Integer(_) => ValueKind::Integer,
            PropertyValue::Float(_) => ValueKind::Float,
            PropertyValue::Boolean(_) => ValueKind::Boolean,
        }
    }

    /// The URI, if this is a URI value
    pub fn as_uri(&self) -> Option<&str> {
        match self {
            PropertyValue::Uri(uri) => Some(uri),
            _ => None,
        }
    }

    /// The string, if this is a text literal
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Lexical form as written in a literal or IRI
    pub fn lexical(&self) -> String {
        match self {
            PropertyValue::Uri(s) | PropertyValue::Text(s) => s.clone(),
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Float(x) => format!("{x:?}"),
            PropertyValue::Boolean(b) => b.to_string(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Uri(uri) => write!(f, "<{uri}>"),
            PropertyValue::Text(text) => write!(f, "\"{text}\""),
            other => write!(f, "{}", other.lexical()),
        }
    }
}

/// The declared type of a property's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Uri,
    Text,
    Integer,
    Float,
    Boolean,
}

impl ValueKind {
    /// XSD datatype used for literals of this kind
    pub fn datatype(&self) -> Option<&'static str> {
        match self {
            ValueKind::Uri => None,
            ValueKind::Text => Some(XSD_STRING),
            ValueKind::Integer => Some(XSD_INTEGER),
            ValueKind::Float => Some(XSD_DOUBLE),
            ValueKind::Boolean => Some(XSD_BOOLEAN),
        }
    }

    /// Literal kind for an XSD datatype
    pub fn from_datatype(datatype: &str) -> Option<Self> {
        match datatype {
            XSD_STRING => Some(ValueKind::Text),
            XSD_INTEGER => Some(ValueKind::Integer),
            XSD_DOUBLE => Some(ValueKind::Float),
            XSD_BOOLEAN => Some(ValueKind::Boolean),
            _ => None,
        }
    }

    /// Short name used in diagnostics and schema rendering
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Uri => "uri",
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bounds on the number of values a property may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cardinality {
    pub lower: usize,
    /// `None` means unbounded
    pub upper: Option<usize>,
}

impl Cardinality {
    /// `0..1`
    pub const OPTIONAL: Cardinality = Cardinality { lower: 0, upper: Some(1) };
    /// `1..1`
    pub const REQUIRED: Cardinality = Cardinality { lower: 1, upper: Some(1) };
    /// `0..*`
    pub const MANY: Cardinality = Cardinality { lower: 0, upper: None };
    /// `1..*`
    pub const AT_LEAST_ONE: Cardinality = Cardinality { lower: 1, upper: None };

    /// Whether `count` values satisfy these bounds
    pub fn allows(&self, count: usize) -> bool {
        count >= self.lower && self.upper.map_or(true, |upper| count <= upper)
    }

    /// Scalar properties hold at most one value
    pub fn is_scalar(&self) -> bool {
        self.upper == Some(1)
    }

    /// Upper bound as written in schemas (`1`, `*`)
    pub fn upper_label(&self) -> String {
        match self.upper {
            Some(upper) => upper.to_string(),
            None => "*".to_string(),
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lower, self.upper_label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test Coverage
    ///
    /// ```mermaid
    /// graph TD
    ///     VO[Value Objects] --> ID[EntityId]
    ///     VO --> PV[PropertyValue]
    ///     VO --> VK[ValueKind]
    ///     VO --> C[Cardinality]
    /// ```

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn test_cardinality_bounds() {
        assert!(Cardinality::OPTIONAL.allows(0));
        assert!(Cardinality::OPTIONAL.allows(1));
        assert!(!Cardinality::OPTIONAL.allows(2));
        assert!(!Cardinality::REQUIRED.allows(0));
        assert!(Cardinality::MANY.allows(1000));
        assert!(!Cardinality::AT_LEAST_ONE.allows(0));
        assert_eq!(Cardinality::AT_LEAST_ONE.to_string(), "1..*");
    }

    #[test]
    fn test_value_kind_datatypes() {
        assert_eq!(ValueKind::from_datatype(XSD_DOUBLE), Some(ValueKind::Float));
        assert_eq!(ValueKind::Uri.datatype(), None);
        assert_eq!(ValueKind::from_datatype("http://example.com/custom"), None);
    }

    #[test]
    fn test_float_lexical_keeps_fraction() {
        assert_eq!(PropertyValue::Float(2.0).lexical(), "2.0");
        assert_eq!(PropertyValue::Integer(-3).lexical(), "-3");
    }

    #[test]
    fn test_serialization() {
        let value = PropertyValue::uri("http://sbols.org/v2#mergeRoles");
        let serialized = serde_json::to_string(&value).unwrap();
        let deserialized: PropertyValue = serde_json::from_str(&serialized).unwrap();
        assert_eq!(value, deserialized);
    }
}
