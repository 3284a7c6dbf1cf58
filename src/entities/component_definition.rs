//! ComponentDefinition: a top-level description of a genetic part

use std::sync::OnceLock;

use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{List, OwnedObject, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::value_objects::vocabulary::*;
use crate::value_objects::{Cardinality, PropertyValue};

pub const TYPES: List<UriValue> = List::new(SBOL_TYPES);
pub const ROLES: List<UriValue> = List::new(SBOL_ROLES);
pub const COMPONENTS: OwnedObject = OwnedObject::new(SBOL_COMPONENTS);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("ComponentDefinition", SBOL_COMPONENT_DEFINITION)
            .top_level()
            .property(
                PropertyDescriptor::uri("types", SBOL_TYPES, Cardinality::AT_LEAST_ONE)
                    .with_default(PropertyValue::uri(BIOPAX_DNA)),
            )
            .property(PropertyDescriptor::uri("roles", SBOL_ROLES, Cardinality::MANY))
            .container("components", SBOL_COMPONENTS, SBOL_COMPONENT, None)
            .build()
    })
}

/// Create a detached component definition; its type defaults to DNA
pub fn new(config: &Config, display_id: &str) -> SbolResult<Entity> {
    Entity::new(schema(), config, display_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SbolError;

    #[test]
    fn test_types_cannot_be_emptied() {
        let config = Config::default();
        let mut cd = new(&config, "lacI").unwrap();

        TYPES.set(&mut cd, [BIOPAX_PROTEIN]).unwrap();
        let err = TYPES.remove(&mut cd, BIOPAX_PROTEIN).unwrap_err();

        assert!(matches!(err, SbolError::CardinalityViolation { count: 0, lower: 1, .. }));
        assert_eq!(TYPES.get(&cd).unwrap(), vec![BIOPAX_PROTEIN.to_string()]);
    }
}
