//! Measurement: a numeric value with a unit of measure

use std::sync::OnceLock;

use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{FloatValue, List, Scalar, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::validation::{RuleOutcome, RuleSubject, ValidationRule};
use crate::value_objects::vocabulary::*;
use crate::value_objects::{Cardinality, PropertyValue, ValueKind};

pub const VALUE: Scalar<FloatValue> = Scalar::new(OM_HAS_NUMERICAL_VALUE);
pub const UNIT: Scalar<UriValue> = Scalar::new(OM_HAS_UNIT);
pub const TYPES: List<UriValue> = List::new(SBOL_TYPES);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("Measurement", OM_MEASURE)
            .property(PropertyDescriptor::new(
                "hasNumericalValue",
                OM_HAS_NUMERICAL_VALUE,
                ValueKind::Float,
                Cardinality::REQUIRED,
            ))
            .property(PropertyDescriptor::uri("hasUnit", OM_HAS_UNIT, Cardinality::REQUIRED))
            .property(PropertyDescriptor::uri("types", SBOL_TYPES, Cardinality::MANY))
            .rule(ValidationRule::new("finite-value", &[OM_HAS_NUMERICAL_VALUE], finite_value))
            .build()
    })
}

/// Create a detached measurement of `value` in `unit`
pub fn new(config: &Config, display_id: &str, value: f64, unit: &str) -> SbolResult<Entity> {
    Entity::with_values(
        schema(),
        config,
        display_id,
        vec![
            (OM_HAS_NUMERICAL_VALUE, vec![PropertyValue::Float(value)]),
            (OM_HAS_UNIT, vec![PropertyValue::uri(unit)]),
        ],
    )
}

fn finite_value(subject: &RuleSubject<'_>) -> RuleOutcome {
    match subject.values(OM_HAS_NUMERICAL_VALUE).first() {
        Some(PropertyValue::Float(x)) if !x.is_finite() => {
            RuleOutcome::Violated(format!("{x} is not a finite number"))
        }
        _ => RuleOutcome::Satisfied,
    }
}
