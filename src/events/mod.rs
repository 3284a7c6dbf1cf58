//! Document events
//!
//! Every committed mutation of a [`Document`](crate::Document) records one or
//! more events. Callers drain them with `take_events` to drive persistence or
//! change notification.

use serde::{Deserialize, Serialize};

use crate::value_objects::PropertyValue;

/// Entity attached to the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRegistered {
    /// Identity of the attached entity
    pub identity: String,
    /// The entity's `rdf:type`
    pub type_uri: String,
    /// Identity of the owner, `None` for top-level entities
    pub parent: Option<String>,
}

/// Entity detached from the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityUnregistered {
    pub identity: String,
}

/// Values of a declared property replaced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChanged {
    pub identity: String,
    pub predicate: String,
    /// Values after the change
    pub values: Vec<PropertyValue>,
}

/// A validation rule rewrote a property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCorrected {
    pub identity: String,
    pub rule: String,
    pub predicate: String,
}

/// Entity identity rewritten by a rename, clone re-base or move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRenamed {
    pub old_identity: String,
    pub new_identity: String,
}

/// Events raised by a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentEvent {
    EntityRegistered(EntityRegistered),
    EntityUnregistered(EntityUnregistered),
    PropertyChanged(PropertyChanged),
    RuleCorrected(RuleCorrected),
    EntityRenamed(EntityRenamed),
}

impl DocumentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::EntityRegistered(_) => "EntityRegistered",
            Self::EntityUnregistered(_) => "EntityUnregistered",
            Self::PropertyChanged(_) => "PropertyChanged",
            Self::RuleCorrected(_) => "RuleCorrected",
            Self::EntityRenamed(_) => "EntityRenamed",
        }
    }

    /// Routing subject, e.g. `sbol.entity.registered.v1`
    pub fn subject(&self) -> String {
        let action = match self {
            Self::EntityRegistered(_) => "entity.registered",
            Self::EntityUnregistered(_) => "entity.unregistered",
            Self::PropertyChanged(_) => "property.changed",
            Self::RuleCorrected(_) => "rule.corrected",
            Self::EntityRenamed(_) => "entity.renamed",
        };
        format!("sbol.{action}.v1")
    }

    /// Identity of the entity the event is about
    pub fn identity(&self) -> &str {
        match self {
            Self::EntityRegistered(e) => &e.identity,
            Self::EntityUnregistered(e) => &e.identity,
            Self::PropertyChanged(e) => &e.identity,
            Self::RuleCorrected(e) => &e.identity,
            Self::EntityRenamed(e) => &e.new_identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_and_type() {
        let event = DocumentEvent::EntityRenamed(EntityRenamed {
            old_identity: "http://examples.org/A".to_string(),
            new_identity: "http://examples.org/B".to_string(),
        });

        assert_eq!(event.event_type(), "EntityRenamed");
        assert_eq!(event.subject(), "sbol.entity.renamed.v1");
        assert_eq!(event.identity(), "http://examples.org/B");
    }

    #[test]
    fn test_event_serializes() {
        let event = DocumentEvent::PropertyChanged(PropertyChanged {
            identity: "http://examples.org/c1".to_string(),
            predicate: "http://sbols.org/v2#role".to_string(),
            values: vec![PropertyValue::uri("http://identifiers.org/so/SO:0000167")],
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: DocumentEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
