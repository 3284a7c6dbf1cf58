//! Type schemas
//!
//! Each entity type registers its property descriptors, owned-object
//! containers and validation rules once, at first use. The resulting
//! [`TypeSchema`] is static and can be inspected without an instance.

pub mod graph;

use indexmap::IndexMap;
use std::fmt;

use crate::error::{SbolError, SbolResult};
use crate::identity;
use crate::validation::ValidationRule;
use crate::value_objects::vocabulary::*;
use crate::value_objects::{Cardinality, PropertyValue, ValueKind};

/// Per-value format check; the error message names what is wrong
pub type FormatCheck = fn(&PropertyValue) -> Result<(), String>;

/// A typed, cardinality-bounded slot on an entity type
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    /// Accessor name (e.g. `roles`)
    pub name: &'static str,
    /// Predicate URI of the backing triples
    pub predicate: &'static str,
    /// Declared value kind
    pub kind: ValueKind,
    /// Allowed number of values
    pub cardinality: Cardinality,
    /// Values an entity starts with
    pub defaults: Vec<PropertyValue>,
    /// Optional per-value format check
    pub format: Option<FormatCheck>,
}

impl PropertyDescriptor {
    /// Declare a property
    pub fn new(
        name: &'static str,
        predicate: &'static str,
        kind: ValueKind,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name,
            predicate,
            kind,
            cardinality,
            defaults: Vec::new(),
            format: None,
        }
    }

    /// URI-valued property
    pub fn uri(name: &'static str, predicate: &'static str, cardinality: Cardinality) -> Self {
        Self::new(name, predicate, ValueKind::Uri, cardinality)
    }

    /// Text-valued property
    pub fn text(name: &'static str, predicate: &'static str, cardinality: Cardinality) -> Self {
        Self::new(name, predicate, ValueKind::Text, cardinality)
    }

    /// Add a default value
    pub fn with_default(mut self, value: PropertyValue) -> Self {
        self.defaults.push(value);
        self
    }

    /// Attach a per-value format check
    pub fn with_format(mut self, format: FormatCheck) -> Self {
        self.format = Some(format);
        self
    }

    /// Check an incoming value list against cardinality, kind and format
    pub fn check(&self, values: &[PropertyValue]) -> SbolResult<()> {
        if !self.cardinality.allows(values.len()) {
            return Err(self.cardinality_violation(values.len()));
        }
        for value in values {
            self.check_value(value)?;
        }
        Ok(())
    }

    /// Check a single value against kind and format
    pub fn check_value(&self, value: &PropertyValue) -> SbolResult<()> {
        if value.kind() != self.kind {
            return Err(SbolError::invalid(format!(
                "{} is not a {} value for <{}>",
                value, self.kind, self.predicate
            )));
        }
        if let PropertyValue::Uri(uri) = value {
            if !identity::is_absolute(uri) {
                return Err(SbolError::invalid(format!(
                    "{} is not an absolute URI for <{}>",
                    value, self.predicate
                )));
            }
        }
        if let Some(format) = self.format {
            format(value).map_err(|reason| {
                SbolError::invalid(format!("{} rejected for <{}>: {}", value, self.predicate, reason))
            })?;
        }
        Ok(())
    }

    pub(crate) fn cardinality_violation(&self, count: usize) -> SbolError {
        SbolError::CardinalityViolation {
            predicate: self.predicate.to_string(),
            count,
            lower: self.cardinality.lower,
            upper: self.cardinality.upper_label(),
        }
    }
}

/// A property whose values are owned child entities
#[derive(Debug, Clone)]
pub struct ContainerDescriptor {
    /// Accessor name (e.g. `participations`)
    pub name: &'static str,
    /// Predicate linking owner to child
    pub predicate: &'static str,
    /// Capability URI every child must satisfy
    pub accepts: &'static str,
    /// Maximum number of children; `None` is unbounded
    pub upper: Option<usize>,
}

impl ContainerDescriptor {
    pub fn cardinality(&self) -> Cardinality {
        Cardinality { lower: 0, upper: self.upper }
    }
}

/// The static schema of one entity type
#[derive(Debug)]
pub struct TypeSchema {
    /// Type name (e.g. `Interaction`)
    pub name: &'static str,
    /// `rdf:type` of instances
    pub type_uri: &'static str,
    /// Capability URIs this type satisfies, its own type first
    pub capabilities: Vec<&'static str>,
    /// Whether instances may be owned directly by a document
    pub top_level: bool,
    /// Property descriptors, Identified base properties first
    pub properties: Vec<PropertyDescriptor>,
    /// Owned-object containers
    pub containers: Vec<ContainerDescriptor>,
    /// Validation rules in declaration order
    pub rules: Vec<ValidationRule>,
}

impl TypeSchema {
    /// Start declaring a type; the Identified base properties are included
    pub fn builder(name: &'static str, type_uri: &'static str) -> TypeSchemaBuilder {
        TypeSchemaBuilder {
            schema: TypeSchema {
                name,
                type_uri,
                capabilities: vec![type_uri, SBOL_IDENTIFIED],
                top_level: false,
                properties: identified_properties(),
                containers: Vec::new(),
                rules: Vec::new(),
            },
        }
    }

    pub fn property(&self, predicate: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.predicate == predicate)
    }

    pub fn container(&self, predicate: &str) -> Option<&ContainerDescriptor> {
        self.containers.iter().find(|c| c.predicate == predicate)
    }

    /// Look a property up and fail if this type does not declare it
    pub fn require_property(&self, predicate: &str) -> SbolResult<&PropertyDescriptor> {
        self.property(predicate).ok_or_else(|| {
            SbolError::invalid(format!("{} declares no property <{}>", self.name, predicate))
        })
    }

    /// Look a container up and fail if this type does not declare it
    pub fn require_container(&self, predicate: &str) -> SbolResult<&ContainerDescriptor> {
        self.container(predicate).ok_or_else(|| {
            SbolError::invalid(format!("{} declares no container <{}>", self.name, predicate))
        })
    }

    /// Whether instances satisfy `capability`
    pub fn satisfies(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| *c == capability)
    }

    /// Rules that watch `predicate`, in declaration order
    pub fn rules_watching<'a>(&'a self, predicate: &'a str) -> impl Iterator<Item = &'a ValidationRule> + 'a {
        self.rules.iter().filter(move |rule| rule.watches(predicate))
    }
}

impl fmt::Display for TypeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.type_uri)
    }
}

/// Builder used by entity types to register their schema
pub struct TypeSchemaBuilder {
    schema: TypeSchema,
}

impl TypeSchemaBuilder {
    /// Instances may be owned directly by a document
    pub fn top_level(mut self) -> Self {
        self.schema.top_level = true;
        self.schema.capabilities.push(SBOL_TOP_LEVEL);
        self
    }

    /// Declare an additional capability
    pub fn capability(mut self, capability: &'static str) -> Self {
        if !self.schema.capabilities.contains(&capability) {
            self.schema.capabilities.push(capability);
        }
        self
    }

    /// Declare a property; a redeclared predicate replaces the earlier one
    pub fn property(mut self, descriptor: PropertyDescriptor) -> Self {
        match self
            .schema
            .properties
            .iter_mut()
            .find(|p| p.predicate == descriptor.predicate)
        {
            Some(existing) => *existing = descriptor,
            None => self.schema.properties.push(descriptor),
        }
        self
    }

    /// Declare an owned-object container
    pub fn container(
        mut self,
        name: &'static str,
        predicate: &'static str,
        accepts: &'static str,
        upper: Option<usize>,
    ) -> Self {
        self.schema.containers.push(ContainerDescriptor {
            name,
            predicate,
            accepts,
            upper,
        });
        self
    }

    /// Declare a validation rule
    pub fn rule(mut self, rule: ValidationRule) -> Self {
        self.schema.rules.push(rule);
        self
    }

    pub fn build(self) -> TypeSchema {
        self.schema
    }
}

fn check_display_id(value: &PropertyValue) -> Result<(), String> {
    match value.as_text() {
        Some(display_id) => identity::validate_display_id(display_id).map_err(|e| e.to_string()),
        None => Ok(()),
    }
}

/// Properties shared by every Identified entity
pub fn identified_properties() -> Vec<PropertyDescriptor> {
    vec![
        PropertyDescriptor::text("displayId", SBOL_DISPLAY_ID, Cardinality::OPTIONAL)
            .with_format(check_display_id),
        PropertyDescriptor::uri("persistentIdentity", SBOL_PERSISTENT_IDENTITY, Cardinality::OPTIONAL),
        PropertyDescriptor::text("version", SBOL_VERSION, Cardinality::OPTIONAL),
        PropertyDescriptor::text("name", DCTERMS_TITLE, Cardinality::OPTIONAL),
        PropertyDescriptor::text("description", DCTERMS_DESCRIPTION, Cardinality::OPTIONAL),
        PropertyDescriptor::uri("wasDerivedFrom", PROV_WAS_DERIVED_FROM, Cardinality::MANY),
    ]
}

/// Lookup of schemas by `rdf:type`, used when reading triples
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<&'static str, &'static TypeSchema>,
}

impl SchemaRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in SBOL type
    pub fn sbol() -> Self {
        let mut registry = Self::new();
        for schema in crate::entities::all_schemas() {
            registry.register(schema);
        }
        registry
    }

    /// Register a schema; a later registration for the same type wins
    pub fn register(&mut self, schema: &'static TypeSchema) {
        self.schemas.insert(schema.type_uri, schema);
    }

    pub fn get(&self, type_uri: &str) -> Option<&'static TypeSchema> {
        self.schemas.get(type_uri).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static TypeSchema> + '_ {
        self.schemas.values().copied()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_includes_identified_base() {
        let schema = TypeSchema::builder("Thing", "http://examples.org/Thing").build();

        assert!(schema.property(SBOL_DISPLAY_ID).is_some());
        assert!(schema.property(PROV_WAS_DERIVED_FROM).is_some());
        assert!(schema.satisfies(SBOL_IDENTIFIED));
        assert!(!schema.satisfies(SBOL_TOP_LEVEL));
    }

    #[test]
    fn test_redeclared_property_replaces_base() {
        let schema = TypeSchema::builder("Thing", "http://examples.org/Thing")
            .property(PropertyDescriptor::text("version", SBOL_VERSION, Cardinality::REQUIRED)
                .with_default(PropertyValue::text("1")))
            .build();

        let versions: Vec<_> = schema
            .properties
            .iter()
            .filter(|p| p.predicate == SBOL_VERSION)
            .collect();
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].cardinality, Cardinality::REQUIRED);
    }

    #[test]
    fn test_descriptor_check() {
        let roles = PropertyDescriptor::uri("roles", SBOL_ROLES, Cardinality::MANY);
        assert!(roles.check(&[PropertyValue::uri(SO_PROMOTER)]).is_ok());

        let err = roles.check(&[PropertyValue::text("promoter")]).unwrap_err();
        assert!(matches!(err, SbolError::InvalidArgument(msg) if msg.contains("promoter")));

        let err = roles.check(&[PropertyValue::uri("promoter")]).unwrap_err();
        assert!(matches!(err, SbolError::InvalidArgument(_)));
    }

    #[test]
    fn test_descriptor_cardinality() {
        let scalar = PropertyDescriptor::uri("definition", SBOL_DEFINITION, Cardinality::OPTIONAL);
        let err = scalar
            .check(&[PropertyValue::uri(SO_CDS), PropertyValue::uri(SO_PROMOTER)])
            .unwrap_err();
        assert!(matches!(err, SbolError::CardinalityViolation { count: 2, .. }));
    }

    #[test]
    fn test_display_id_format() {
        let descriptor = &identified_properties()[0];
        assert!(descriptor.check(&[PropertyValue::text("c1")]).is_ok());
        assert!(descriptor.check(&[PropertyValue::text("1c")]).is_err());
    }

    #[test]
    fn test_sbol_registry() {
        let registry = SchemaRegistry::sbol();
        assert!(registry.get(SBOL_INTERACTION).is_some());
        assert!(registry.get(SBOL_PARTICIPATION).is_some());
        assert!(registry.get("http://examples.org/Unknown").is_none());
    }
}
