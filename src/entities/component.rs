//! Component: a use of a ComponentDefinition inside another definition

use std::sync::OnceLock;

use crate::aggregate::Entity;
use crate::config::Config;
use crate::error::SbolResult;
use crate::property::{List, Scalar, UriValue};
use crate::schema::{PropertyDescriptor, TypeSchema};
use crate::validation::{Correction, RuleOutcome, RuleSubject, ValidationRule};
use crate::value_objects::vocabulary::*;
use crate::value_objects::{Cardinality, PropertyValue};

pub const ROLES: List<UriValue> = List::new(SBOL_ROLES);
pub const ROLE_INTEGRATION: Scalar<UriValue> = Scalar::new(SBOL_ROLE_INTEGRATION);
pub const DEFINITION: Scalar<UriValue> = Scalar::new(SBOL_DEFINITION);
pub const ACCESS: Scalar<UriValue> = Scalar::new(SBOL_ACCESS);

pub fn schema() -> &'static TypeSchema {
    static SCHEMA: OnceLock<TypeSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| {
        TypeSchema::builder("Component", SBOL_COMPONENT)
            .capability(SBOL_COMPONENT_INSTANCE)
            .property(PropertyDescriptor::uri("roles", SBOL_ROLES, Cardinality::MANY))
            .property(
                PropertyDescriptor::uri("roleIntegration", SBOL_ROLE_INTEGRATION, Cardinality::OPTIONAL)
                    .with_format(check_role_integration),
            )
            .property(PropertyDescriptor::uri("definition", SBOL_DEFINITION, Cardinality::OPTIONAL))
            .property(
                PropertyDescriptor::uri("access", SBOL_ACCESS, Cardinality::REQUIRED)
                    .with_default(PropertyValue::uri(SBOL_ACCESS_PUBLIC))
                    .with_format(check_access),
            )
            .rule(ValidationRule::new(
                "role-integration-default",
                &[SBOL_ROLES],
                default_role_integration,
            ))
            .build()
    })
}

/// Create a detached component
pub fn new(config: &Config, display_id: &str) -> SbolResult<Entity> {
    Entity::new(schema(), config, display_id)
}

/// Roles given without an integration policy merge with the definition's roles.
/// Emptying the roles leaves the policy alone.
fn default_role_integration(subject: &RuleSubject<'_>) -> RuleOutcome {
    if subject.is_set(SBOL_ROLES) && !subject.is_set(SBOL_ROLE_INTEGRATION) {
        RuleOutcome::Correct(vec![Correction::new(
            SBOL_ROLE_INTEGRATION,
            vec![PropertyValue::uri(SBOL_ROLE_INTEGRATION_MERGE)],
        )])
    } else {
        RuleOutcome::Satisfied
    }
}

fn check_role_integration(value: &PropertyValue) -> Result<(), String> {
    match value.as_uri() {
        Some(SBOL_ROLE_INTEGRATION_MERGE) | Some(SBOL_ROLE_INTEGRATION_OVERRIDE) => Ok(()),
        _ => Err("expected mergeRoles or overrideRoles".to_string()),
    }
}

pub(crate) fn check_access(value: &PropertyValue) -> Result<(), String> {
    match value.as_uri() {
        Some(SBOL_ACCESS_PUBLIC) | Some(SBOL_ACCESS_PRIVATE) => Ok(()),
        _ => Err("expected public or private".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SbolError;

    #[test]
    fn test_roles_set_merge_policy() {
        let config = Config::default();
        let mut c = new(&config, "c1").unwrap();
        assert_eq!(ROLE_INTEGRATION.get(&c).unwrap(), None);

        ROLES.set(&mut c, [SO_PROMOTER]).unwrap();
        assert_eq!(
            ROLE_INTEGRATION.get(&c).unwrap().as_deref(),
            Some(SBOL_ROLE_INTEGRATION_MERGE)
        );

        ROLES.set(&mut c, Vec::<String>::new()).unwrap();
        assert_eq!(
            ROLE_INTEGRATION.get(&c).unwrap().as_deref(),
            Some(SBOL_ROLE_INTEGRATION_MERGE)
        );
    }

    #[test]
    fn test_explicit_policy_kept() {
        let config = Config::default();
        let mut c = new(&config, "c1").unwrap();

        ROLE_INTEGRATION.set(&mut c, SBOL_ROLE_INTEGRATION_OVERRIDE).unwrap();
        ROLES.add(&mut c, SO_CDS).unwrap();

        assert_eq!(
            ROLE_INTEGRATION.get(&c).unwrap().as_deref(),
            Some(SBOL_ROLE_INTEGRATION_OVERRIDE)
        );
    }

    #[test]
    fn test_policy_required_without_auto_correct() {
        let mut config = Config::default();
        config.auto_correct = false;
        let mut c = new(&config, "c1").unwrap();

        let err = ROLES.add(&mut c, SO_CDS).unwrap_err();
        assert!(matches!(err, SbolError::ValidationError { ref rule, .. } if rule == "role-integration-default"));
        assert!(ROLES.get(&c).unwrap().is_empty());
    }

    #[test]
    fn test_access_values() {
        let config = Config::default();
        let mut c = new(&config, "c1").unwrap();

        ACCESS.set(&mut c, SBOL_ACCESS_PRIVATE).unwrap();
        let err = ACCESS.set(&mut c, "http://sbols.org/v2#protected").unwrap_err();

        assert!(matches!(err, SbolError::InvalidArgument(_)));
        assert_eq!(ACCESS.get(&c).unwrap().as_deref(), Some(SBOL_ACCESS_PRIVATE));
    }
}
