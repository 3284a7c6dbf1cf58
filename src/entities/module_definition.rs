//! ModuleDefinition: a top-level grouping of functional components and their interactions

use std::sync::OnceLock;

use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{List, OwnedObject, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::value_objects::vocabulary::*;
use crate::value_objects::Cardinality;

pub const ROLES: List<UriValue> = List::new(SBOL_ROLES);
pub const FUNCTIONAL_COMPONENTS: OwnedObject = OwnedObject::new(SBOL_FUNCTIONAL_COMPONENTS);
pub const INTERACTIONS: OwnedObject = OwnedObject::new(SBOL_INTERACTIONS);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("ModuleDefinition", SBOL_MODULE_DEFINITION)
            .top_level()
            .property(PropertyDescriptor::uri("roles", SBOL_ROLES, Cardinality::MANY))
            .container(
                "functionalComponents",
                SBOL_FUNCTIONAL_COMPONENTS,
                SBOL_FUNCTIONAL_COMPONENT,
                None,
            )
            .container("interactions", SBOL_INTERACTIONS, SBOL_INTERACTION, None)
            .build()
    })
}

pub fn new(config: &Config, display_id: &str) -> SbolResult<Entity> {
    Entity::new(schema(), config, display_id)
}
