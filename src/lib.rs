//! SBOL object graph core
//!
//! Identified entities with typed, cardinality-bounded properties, owned child
//! objects and per-type validation rules, held in a [`Document`] that indexes
//! every entity by URI and reads and writes the graph as triples.

pub mod aggregate;
pub mod config;
pub mod entities;
pub mod error;
pub mod events;
pub mod identity;
pub mod property;
pub mod repository;
pub mod schema;
pub mod triples;
pub mod validation;
pub mod value_objects;

// Re-export main types
pub use aggregate::{Document, Entity, EntityMut, Owner, SharedDocument};
pub use config::Config;
pub use error::{SbolError, SbolResult};
pub use events::DocumentEvent;
pub use identity::Namespace;

// Re-export property accessors
pub use property::{
    BooleanValue, FloatValue, IntegerValue, List, OwnedObject, PropertyHost, Scalar, TextValue,
    UriValue, ValueType,
};

// Re-export schema and validation types
pub use schema::{ContainerDescriptor, PropertyDescriptor, SchemaRegistry, TypeSchema};
pub use validation::{RuleOutcome, ValidationReport, ValidationRule};

// Re-export serialization and repository access
pub use repository::{DocumentRepository, InMemoryRepository, SubmitMode};
pub use triples::{read_triples, write_triples, Triple};

pub use value_objects::{Cardinality, EntityId, PropertyValue, ValueKind};
