//! FunctionalComponent: a component instance with a direction inside a ModuleDefinition

use std::sync::OnceLock;

use super::component::check_access;
use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{Scalar, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::value_objects::vocabulary::*;
use crate::value_objects::{Cardinality, PropertyValue};

pub const DEFINITION: Scalar<UriValue> = Scalar::new(SBOL_DEFINITION);
pub const ACCESS: Scalar<UriValue> = Scalar::new(SBOL_ACCESS);
pub const DIRECTION: Scalar<UriValue> = Scalar::new(SBOL_DIRECTION);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("FunctionalComponent", SBOL_FUNCTIONAL_COMPONENT)
            .capability(SBOL_COMPONENT_INSTANCE)
            .property(PropertyDescriptor::uri("definition", SBOL_DEFINITION, Cardinality::OPTIONAL))
            .property(
                PropertyDescriptor::uri("access", SBOL_ACCESS, Cardinality::REQUIRED)
                    .with_default(PropertyValue::uri(SBOL_ACCESS_PUBLIC))
                    .with_format(check_access),
            )
            .property(
                PropertyDescriptor::uri("direction", SBOL_DIRECTION, Cardinality::REQUIRED)
                    .with_default(PropertyValue::uri(SBOL_DIRECTION_NONE))
                    .with_format(check_direction),
            )
            .build()
    })
}

pub fn new(config: &Config, display_id: &str) -> SbolResult<Entity> {
    Entity::new(schema(), config, display_id)
}

fn check_direction(value: &PropertyValue) -> Result<(), String> {
    match value.as_uri() {
        Some(SBOL_DIRECTION_IN) | Some(SBOL_DIRECTION_OUT) | Some(SBOL_DIRECTION_IN_OUT)
        | Some(SBOL_DIRECTION_NONE) => Ok(()),
        _ => Err("expected in, out, inout or none".to_string()),
    }
}
