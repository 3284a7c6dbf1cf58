//! Participation: the role a functional component plays in an interaction

use std::sync::OnceLock;

use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{List, OwnedObject, Scalar, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::value_objects::vocabulary::*;
use crate::value_objects::Cardinality;

pub const ROLES: List<UriValue> = List::new(SBOL_ROLES);
pub const PARTICIPANT: Scalar<UriValue> = Scalar::new(SBOL_PARTICIPANT);
pub const MEASUREMENTS: OwnedObject = OwnedObject::new(SBOL_MEASUREMENTS);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("Participation", SBOL_PARTICIPATION)
            .property(PropertyDescriptor::uri("roles", SBOL_ROLES, Cardinality::MANY))
            .property(PropertyDescriptor::uri("participant", SBOL_PARTICIPANT, Cardinality::OPTIONAL))
            .container("measurements", SBOL_MEASUREMENTS, OM_MEASURE, None)
            .build()
    })
}

pub fn new(config: &Config, display_id: &str) -> SbolResult<Entity> {
    Entity::new(schema(), config, display_id)
}
