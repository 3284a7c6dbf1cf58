//! Interaction: a biochemical process between functional components

use std::sync::OnceLock;

use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{List, OwnedObject, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::validation::{RuleOutcome, RuleSubject, ValidationRule};
use crate::value_objects::vocabulary::*;
use crate::value_objects::{Cardinality, PropertyValue};

pub const TYPES: List<UriValue> = List::new(SBOL_TYPES);
pub const FUNCTIONAL_COMPONENTS: OwnedObject = OwnedObject::new(SBOL_FUNCTIONAL_COMPONENTS);
pub const PARTICIPATIONS: OwnedObject = OwnedObject::new(SBOL_PARTICIPATIONS);
pub const MEASUREMENTS: OwnedObject = OwnedObject::new(SBOL_MEASUREMENTS);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("Interaction", SBOL_INTERACTION)
            .property(
                PropertyDescriptor::uri("types", SBOL_TYPES, Cardinality::AT_LEAST_ONE)
                    .with_default(PropertyValue::uri(SBO_INTERACTION)),
            )
            .container(
                "functionalComponents",
                SBOL_FUNCTIONAL_COMPONENTS,
                SBOL_FUNCTIONAL_COMPONENT,
                None,
            )
            .container("participations", SBOL_PARTICIPATIONS, SBOL_PARTICIPATION, None)
            .container("measurements", SBOL_MEASUREMENTS, OM_MEASURE, None)
            .rule(ValidationRule::new(
                "owned-components-participate",
                &[SBOL_FUNCTIONAL_COMPONENTS, SBOL_PARTICIPATIONS],
                owned_components_participate,
            ))
            .build()
    })
}

pub fn new(config: &Config, display_id: &str) -> SbolResult<Entity> {
    Entity::new(schema(), config, display_id)
}

/// Each functional component an interaction owns needs a participation
fn owned_components_participate(subject: &RuleSubject<'_>) -> RuleOutcome {
    let components = subject.child_count(SBOL_FUNCTIONAL_COMPONENTS);
    let participations = subject.child_count(SBOL_PARTICIPATIONS);
    if components > participations {
        RuleOutcome::Violated(format!(
            "{components} owned functional components but only {participations} participations"
        ))
    } else {
        RuleOutcome::Satisfied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Document;
    use crate::entities::{functional_component, module_definition, participation};
    use crate::error::SbolError;

    fn inhibition(doc: &mut Document, config: &Config) -> crate::EntityId {
        let md = doc.add(module_definition::new(config, "toggle").unwrap()).unwrap();
        let i = module_definition::INTERACTIONS
            .add(doc, md, new(config, "laci_inhibits_tetr").unwrap())
            .unwrap();
        TYPES.set(&mut doc.entity_mut(i).unwrap(), [SBO_INHIBITION]).unwrap();
        i
    }

    #[test]
    fn test_owned_component_needs_participation() {
        let config = Config::default();
        let mut doc = Document::new(config.clone());
        let i = inhibition(&mut doc, &config);

        let err = FUNCTIONAL_COMPONENTS
            .add(&mut doc, i, functional_component::new(&config, "laci").unwrap())
            .unwrap_err();

        assert!(matches!(
            err,
            SbolError::ValidationError { ref rule, .. } if rule == "owned-components-participate"
        ));
        assert_eq!(FUNCTIONAL_COMPONENTS.len(&doc, i).unwrap(), 0);
        assert!(!doc.contains("http://examples.org/toggle/laci_inhibits_tetr/laci"));
    }

    #[test]
    fn test_removing_participation_checked_against_components() {
        let config = Config::default();
        let mut doc = Document::new(config.clone());
        let i = inhibition(&mut doc, &config);

        let inhibitor = PARTICIPATIONS
            .add(&mut doc, i, participation::new(&config, "inhibitor").unwrap())
            .unwrap();
        participation::ROLES
            .set(&mut doc.entity_mut(inhibitor).unwrap(), [SBO_INHIBITOR])
            .unwrap();
        let inhibited = PARTICIPATIONS
            .add(&mut doc, i, participation::new(&config, "inhibited").unwrap())
            .unwrap();
        participation::ROLES
            .set(&mut doc.entity_mut(inhibited).unwrap(), [SBO_INHIBITED])
            .unwrap();
        FUNCTIONAL_COMPONENTS
            .add(&mut doc, i, functional_component::new(&config, "laci").unwrap())
            .unwrap();
        FUNCTIONAL_COMPONENTS
            .add(&mut doc, i, functional_component::new(&config, "tetr").unwrap())
            .unwrap();

        let inhibited_uri = "http://examples.org/toggle/laci_inhibits_tetr/inhibited";
        let err = PARTICIPATIONS.remove(&mut doc, i, inhibited_uri).unwrap_err();
        assert!(matches!(err, SbolError::ValidationError { .. }));
        assert!(doc.contains(inhibited_uri));
        assert_eq!(PARTICIPATIONS.len(&doc, i).unwrap(), 2);

        FUNCTIONAL_COMPONENTS
            .remove(&mut doc, i, "http://examples.org/toggle/laci_inhibits_tetr/tetr")
            .unwrap();
        PARTICIPATIONS.remove(&mut doc, i, inhibited_uri).unwrap();
        assert_eq!(PARTICIPATIONS.len(&doc, i).unwrap(), 1);
        assert_eq!(
            participation::ROLES.get(doc.entity(inhibitor).unwrap()).unwrap(),
            vec![SBO_INHIBITOR.to_string()]
        );
    }
}
