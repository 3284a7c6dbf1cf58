//! Validation rule engine
//!
//! A rule watches one or more properties of an entity type and is a pure
//! function of the entity's sibling properties. After a mutation, the rules
//! watching each changed property run in declaration order. A rule either
//! passes, asks for a correction (which is applied and re-triggers the rules
//! watching the corrected property), or reports a hard violation.
//!
//! All effects are staged on a copy of the entity's store; the caller commits
//! the staged store only when every rule succeeded.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SbolError, SbolResult};
use crate::schema::TypeSchema;
use crate::value_objects::{EntityId, PropertyValue};

/// Property values keyed by predicate, in schema order
pub type PropertyStore = IndexMap<&'static str, Vec<PropertyValue>>;

/// Owned children keyed by container predicate, in insertion order
pub type ChildStore = IndexMap<&'static str, Vec<EntityId>>;

/// Pure check run by a rule
pub type RuleCheck = fn(&RuleSubject<'_>) -> RuleOutcome;

/// A cross-field invariant bound to the properties it watches
#[derive(Debug, Clone)]
pub struct ValidationRule {
    /// Stable rule name used in errors and reports
    pub name: &'static str,
    /// Predicates whose mutation triggers this rule
    pub watched: Vec<&'static str>,
    pub check: RuleCheck,
}

impl ValidationRule {
    pub fn new(name: &'static str, watched: &[&'static str], check: RuleCheck) -> Self {
        Self {
            name,
            watched: watched.to_vec(),
            check,
        }
    }

    pub fn watches(&self, predicate: &str) -> bool {
        self.watched.iter().any(|w| *w == predicate)
    }
}

/// What a rule decided
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// The invariant holds
    Satisfied,
    /// The invariant holds once these writes are applied
    Correct(Vec<Correction>),
    /// The invariant is broken and cannot be repaired
    Violated(String),
}

/// A write requested by a rule
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub predicate: &'static str,
    pub values: Vec<PropertyValue>,
}

impl Correction {
    pub fn new(predicate: &'static str, values: Vec<PropertyValue>) -> Self {
        Self { predicate, values }
    }
}

/// Read-only view of the entity a rule inspects
pub struct RuleSubject<'a> {
    identity: &'a str,
    values: &'a PropertyStore,
    children: &'a ChildStore,
}

impl<'a> RuleSubject<'a> {
    pub fn identity(&self) -> &str {
        self.identity
    }

    /// Current values of `predicate`; empty when unset
    pub fn values(&self, predicate: &str) -> &[PropertyValue] {
        self.values.get(predicate).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_set(&self, predicate: &str) -> bool {
        !self.values(predicate).is_empty()
    }

    /// Number of children in the container `predicate`
    pub fn child_count(&self, predicate: &str) -> usize {
        self.children.get(predicate).map_or(0, Vec::len)
    }
}

/// How rules are allowed to behave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulePolicy {
    /// Apply corrections instead of failing
    pub auto_correct: bool,
    /// Bound on nested corrections
    pub max_depth: usize,
}

impl From<&crate::config::Config> for RulePolicy {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            auto_correct: config.auto_correct,
            max_depth: config.max_correction_depth,
        }
    }
}

/// A correction that was applied by a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedCorrection {
    /// Identity of the corrected entity
    pub entity: String,
    pub rule: String,
    pub predicate: String,
    pub values: Vec<PropertyValue>,
}

/// Outcome of validating a whole document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Number of entities inspected
    pub checked: usize,
    /// Corrections applied, in the order they happened
    pub corrections: Vec<AppliedCorrection>,
}

impl ValidationReport {
    /// True when nothing had to be corrected
    pub fn is_clean(&self) -> bool {
        self.corrections.is_empty()
    }
}

/// Run the rules watching `changed` against a staged store
///
/// Corrections are written into `values`; the returned list records them in
/// application order.
pub(crate) fn run_rules(
    schema: &TypeSchema,
    identity: &str,
    values: &mut PropertyStore,
    children: &ChildStore,
    changed: &[&'static str],
    policy: RulePolicy,
) -> SbolResult<Vec<AppliedCorrection>> {
    let mut applied = Vec::new();
    run_at_depth(schema, identity, values, children, changed, policy, 0, &mut applied)?;
    Ok(applied)
}

#[allow(clippy::too_many_arguments)]
fn run_at_depth(
    schema: &TypeSchema,
    identity: &str,
    values: &mut PropertyStore,
    children: &ChildStore,
    changed: &[&'static str],
    policy: RulePolicy,
    depth: usize,
    applied: &mut Vec<AppliedCorrection>,
) -> SbolResult<()> {
    for rule in schema
        .rules
        .iter()
        .filter(|rule| changed.iter().any(|p| rule.watches(p)))
    {
        let outcome = (rule.check)(&RuleSubject {
            identity,
            values,
            children,
        });

        match outcome {
            RuleOutcome::Satisfied => {}
            RuleOutcome::Violated(message) => {
                return Err(SbolError::ValidationError {
                    rule: rule.name.to_string(),
                    entity: identity.to_string(),
                    message,
                });
            }
            RuleOutcome::Correct(corrections) => {
                if !policy.auto_correct {
                    let targets: Vec<_> = corrections.iter().map(|c| c.predicate).collect();
                    return Err(SbolError::ValidationError {
                        rule: rule.name.to_string(),
                        entity: identity.to_string(),
                        message: format!("correction required on {targets:?}"),
                    });
                }
                if depth + 1 > policy.max_depth {
                    return Err(SbolError::ValidationCycle {
                        rule: rule.name.to_string(),
                        entity: identity.to_string(),
                        depth: policy.max_depth,
                    });
                }

                let mut corrected = Vec::with_capacity(corrections.len());
                for correction in corrections {
                    let descriptor = schema.require_property(correction.predicate)?;
                    descriptor.check(&correction.values)?;
                    debug!(
                        "Rule {} corrected <{}> on {}",
                        rule.name, descriptor.predicate, identity
                    );
                    values.insert(descriptor.predicate, correction.values.clone());
                    applied.push(AppliedCorrection {
                        entity: identity.to_string(),
                        rule: rule.name.to_string(),
                        predicate: descriptor.predicate.to_string(),
                        values: correction.values,
                    });
                    corrected.push(descriptor.predicate);
                }

                run_at_depth(schema, identity, values, children, &corrected, policy, depth + 1, applied)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyDescriptor;
    use crate::value_objects::Cardinality;

    const FLAG: &str = "http://examples.org/flag";
    const MIRROR: &str = "http://examples.org/mirror";
    const COUNT: &str = "http://examples.org/count";

    fn mirror_flag(subject: &RuleSubject<'_>) -> RuleOutcome {
        if subject.values(MIRROR) == subject.values(FLAG) {
            RuleOutcome::Satisfied
        } else {
            RuleOutcome::Correct(vec![Correction::new(MIRROR, subject.values(FLAG).to_vec())])
        }
    }

    fn flip_flag(subject: &RuleSubject<'_>) -> RuleOutcome {
        let current = subject.values(FLAG).first() == Some(&PropertyValue::Boolean(true));
        RuleOutcome::Correct(vec![Correction::new(FLAG, vec![PropertyValue::Boolean(!current)])])
    }

    fn non_negative(subject: &RuleSubject<'_>) -> RuleOutcome {
        match subject.values(COUNT).first() {
            Some(PropertyValue::Integer(n)) if *n < 0 => RuleOutcome::Violated(format!("{n} is negative")),
            _ => RuleOutcome::Satisfied,
        }
    }

    fn schema_with(rules: Vec<ValidationRule>) -> TypeSchema {
        let mut builder = TypeSchema::builder("Probe", "http://examples.org/Probe")
            .property(PropertyDescriptor::new("flag", FLAG, crate::ValueKind::Boolean, Cardinality::OPTIONAL))
            .property(PropertyDescriptor::new("mirror", MIRROR, crate::ValueKind::Boolean, Cardinality::OPTIONAL))
            .property(PropertyDescriptor::new("count", COUNT, crate::ValueKind::Integer, Cardinality::OPTIONAL));
        for rule in rules {
            builder = builder.rule(rule);
        }
        builder.build()
    }

    fn policy() -> RulePolicy {
        RulePolicy { auto_correct: true, max_depth: 4 }
    }

    #[test]
    fn test_correction_applied() {
        let schema = schema_with(vec![ValidationRule::new("mirror", &[FLAG], mirror_flag)]);
        let mut values = PropertyStore::new();
        values.insert(FLAG, vec![PropertyValue::Boolean(true)]);

        let applied = run_rules(&schema, "p1", &mut values, &ChildStore::new(), &[FLAG], policy()).unwrap();

        assert_eq!(applied.len(), 1);
        assert_eq!(values[MIRROR], vec![PropertyValue::Boolean(true)]);
    }

    #[test]
    fn test_satisfied_rule_is_noop() {
        let schema = schema_with(vec![ValidationRule::new("mirror", &[FLAG], mirror_flag)]);
        let mut values = PropertyStore::new();
        values.insert(FLAG, vec![PropertyValue::Boolean(true)]);
        values.insert(MIRROR, vec![PropertyValue::Boolean(true)]);
        let before = values.clone();

        let applied = run_rules(&schema, "p1", &mut values, &ChildStore::new(), &[FLAG], policy()).unwrap();

        assert!(applied.is_empty());
        assert_eq!(values, before);
    }

    #[test]
    fn test_unwatched_change_skips_rule() {
        let schema = schema_with(vec![ValidationRule::new("mirror", &[FLAG], mirror_flag)]);
        let mut values = PropertyStore::new();
        values.insert(FLAG, vec![PropertyValue::Boolean(true)]);

        let applied = run_rules(&schema, "p1", &mut values, &ChildStore::new(), &[COUNT], policy()).unwrap();
        assert!(applied.is_empty());
    }

    #[test]
    fn test_self_triggering_rule_hits_cycle_bound() {
        let schema = schema_with(vec![ValidationRule::new("flip", &[FLAG], flip_flag)]);
        let mut values = PropertyStore::new();

        let err = run_rules(&schema, "p1", &mut values, &ChildStore::new(), &[FLAG], policy()).unwrap_err();
        assert_eq!(
            err,
            SbolError::ValidationCycle {
                rule: "flip".to_string(),
                entity: "p1".to_string(),
                depth: 4,
            }
        );
    }

    #[test]
    fn test_hard_violation() {
        let schema = schema_with(vec![ValidationRule::new("non-negative", &[COUNT], non_negative)]);
        let mut values = PropertyStore::new();
        values.insert(COUNT, vec![PropertyValue::Integer(-1)]);

        let err = run_rules(&schema, "p1", &mut values, &ChildStore::new(), &[COUNT], policy()).unwrap_err();
        assert!(matches!(err, SbolError::ValidationError { ref rule, .. } if rule == "non-negative"));
    }

    #[test]
    fn test_correction_refused_without_auto_correct() {
        let schema = schema_with(vec![ValidationRule::new("mirror", &[FLAG], mirror_flag)]);
        let mut values = PropertyStore::new();
        values.insert(FLAG, vec![PropertyValue::Boolean(true)]);
        let strict = RulePolicy { auto_correct: false, max_depth: 4 };

        let err = run_rules(&schema, "p1", &mut values, &ChildStore::new(), &[FLAG], strict).unwrap_err();
        assert!(matches!(err, SbolError::ValidationError { .. }));
    }
}
