//! SBOL entity types
//!
//! Each module declares one type: its static [`TypeSchema`], typed accessor
//! constants for its properties and containers, and a constructor.

pub mod component;
pub mod component_definition;
pub mod functional_component;
pub mod identified;
pub mod interaction;
pub mod measurement;
pub mod module_definition;
pub mod participation;

use crate::schema::TypeSchema;

/// Every built-in type schema
pub fn all_schemas() -> Vec<&'static TypeSchema> {
    vec![
        component_definition::schema(),
        component::schema(),
        module_definition::schema(),
        functional_component::schema(),
        interaction::schema(),
        participation::schema(),
        measurement::schema(),
    ]
}
