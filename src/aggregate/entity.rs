//! Identified base entity
//!
//! Every domain object is an [`Entity`]: a URI identity, the static schema of
//! its type, a triple-backed property store and, once attached to a
//! [`Document`](super::Document), the ids of its owned children.

use indexmap::IndexMap;
use std::collections::HashMap;

use crate::config::Config;
use crate::error::{SbolError, SbolResult};
use crate::identity::{self, Namespace};
use crate::property::PropertyHost;
use crate::schema::{ContainerDescriptor, PropertyDescriptor, TypeSchema};
use crate::triples::Triple;
use crate::validation::{run_rules, AppliedCorrection, ChildStore, PropertyStore, RulePolicy};
use crate::value_objects::vocabulary::*;
use crate::value_objects::{EntityId, PropertyValue};

/// The container an attached entity lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Owner {
    pub parent: EntityId,
    pub predicate: &'static str,
}

/// Property and child state validated but not yet committed
#[derive(Debug, Clone)]
pub(crate) struct Staged {
    values: PropertyStore,
    children: ChildStore,
    changed: Vec<&'static str>,
    corrections: Vec<AppliedCorrection>,
}

impl Staged {
    pub(crate) fn corrections(&self) -> &[AppliedCorrection] {
        &self.corrections
    }
}

/// What a commit changed
#[derive(Debug, Clone, Default)]
pub(crate) struct CommitSummary {
    pub changed: Vec<&'static str>,
    pub corrections: Vec<AppliedCorrection>,
}

/// An identified object with typed properties and owned children
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) id: EntityId,
    schema: &'static TypeSchema,
    identity: String,
    pub(crate) owner: Option<Owner>,
    values: PropertyStore,
    annotations: IndexMap<String, Vec<PropertyValue>>,
    pub(crate) children: ChildStore,
    policy: RulePolicy,
}

impl Entity {
    /// Create an entity from a display id or an absolute URI
    ///
    /// With compliant URIs a display id becomes `homespace/displayId[/version]`
    /// (with the type name inserted when typed URIs are on). An empty name gets a
    /// generated display id.
    pub fn new(schema: &'static TypeSchema, config: &Config, name: &str) -> SbolResult<Self> {
        Self::with_values(schema, config, name, Vec::new())
    }

    /// Create an entity and set initial property values in one staged write
    pub fn with_values(
        schema: &'static TypeSchema,
        config: &Config,
        name: &str,
        initial: Vec<(&str, Vec<PropertyValue>)>,
    ) -> SbolResult<Self> {
        let name = if name.is_empty() {
            identity::generate_display_id()
        } else {
            name.to_string()
        };
        let version = config.default_version.clone();

        let (identity, display_id, persistent) = if identity::is_absolute(&name) {
            let display_id = identity::display_id_from_uri(&name);
            (name, display_id, None)
        } else if config.compliant_uris {
            let namespace = if config.typed_uris {
                format!("{}/{}", config.homespace, schema.name)
            } else {
                config.homespace.clone()
            };
            let persistent = identity::generate_uri(&namespace, &name, None)?;
            let identity = identity::generate_uri(&namespace, &name, version.as_deref())?;
            (identity, Some(name), Some(persistent))
        } else {
            let identity = identity::resolve(&name, &[Namespace::new(config.homespace.clone())], true)?;
            let display_id = identity::display_id_from_uri(&identity);
            (identity, display_id, None)
        };

        let mut values = PropertyStore::new();
        for descriptor in &schema.properties {
            values.insert(descriptor.predicate, descriptor.defaults.clone());
        }
        if let Some(display_id) = display_id {
            values.insert(SBOL_DISPLAY_ID, vec![PropertyValue::Text(display_id)]);
        }
        if let Some(persistent) = persistent {
            values.insert(SBOL_PERSISTENT_IDENTITY, vec![PropertyValue::Uri(persistent)]);
        }
        if let Some(version) = version {
            values.insert(SBOL_VERSION, vec![PropertyValue::Text(version)]);
        }
        for (predicate, initial_values) in initial {
            let descriptor = schema.require_property(predicate)?;
            values.insert(descriptor.predicate, initial_values);
        }
        for descriptor in &schema.properties {
            descriptor.check(values.get(descriptor.predicate).map(Vec::as_slice).unwrap_or(&[]))?;
        }

        let children = schema
            .containers
            .iter()
            .map(|c| (c.predicate, Vec::new()))
            .collect::<ChildStore>();
        let policy = RulePolicy::from(config);
        let every_predicate: Vec<&'static str> = schema.properties.iter().map(|p| p.predicate).collect();
        run_rules(schema, &identity, &mut values, &children, &every_predicate, policy)?;

        Ok(Self {
            id: EntityId::new(),
            schema,
            identity,
            owner: None,
            values,
            annotations: IndexMap::new(),
            children,
            policy,
        })
    }

    /// Rebuild an entity from stored triples without running rules
    ///
    /// Required properties missing from `values` fall back to their defaults.
    pub(crate) fn from_stored(
        schema: &'static TypeSchema,
        identity: String,
        policy: RulePolicy,
        stored: Vec<(&'static str, Vec<PropertyValue>)>,
        annotations: IndexMap<String, Vec<PropertyValue>>,
    ) -> SbolResult<Self> {
        let mut values: PropertyStore = schema
            .properties
            .iter()
            .map(|d| (d.predicate, Vec::new()))
            .collect();
        for (predicate, stored_values) in stored {
            values.insert(predicate, stored_values);
        }
        for descriptor in &schema.properties {
            let current = values.entry(descriptor.predicate).or_default();
            if current.len() < descriptor.cardinality.lower {
                *current = descriptor.defaults.clone();
            }
            descriptor.check(current)?;
        }

        Ok(Self {
            id: EntityId::new(),
            schema,
            identity,
            owner: None,
            values,
            annotations,
            children: schema.containers.iter().map(|c| (c.predicate, Vec::new())).collect(),
            policy,
        })
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn schema(&self) -> &'static TypeSchema {
        self.schema
    }

    /// The `rdf:type` of this entity
    pub fn type_uri(&self) -> &'static str {
        self.schema.type_uri
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn display_id(&self) -> Option<&str> {
        self.first(SBOL_DISPLAY_ID).and_then(PropertyValue::as_text)
    }

    pub fn version(&self) -> Option<&str> {
        self.first(SBOL_VERSION).and_then(PropertyValue::as_text)
    }

    pub fn persistent_identity(&self) -> Option<&str> {
        self.first(SBOL_PERSISTENT_IDENTITY).and_then(PropertyValue::as_uri)
    }

    /// Id of the owning entity, if this entity is a child
    pub fn parent(&self) -> Option<EntityId> {
        self.owner.map(|owner| owner.parent)
    }

    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }

    /// Values of a declared property
    pub fn values(&self, predicate: &str) -> SbolResult<&[PropertyValue]> {
        let descriptor = self.schema.require_property(predicate)?;
        Ok(self
            .values
            .get(descriptor.predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Every declared property with its current values, in schema order
    pub fn properties(&self) -> impl Iterator<Item = (&'static PropertyDescriptor, &[PropertyValue])> + '_ {
        let schema: &'static TypeSchema = self.schema;
        schema.properties.iter().map(move |descriptor| {
            let values = self
                .values
                .get(descriptor.predicate)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            (descriptor, values)
        })
    }

    /// Every declared container with the ids of its children, in schema order
    pub fn containers(&self) -> impl Iterator<Item = (&'static ContainerDescriptor, &[EntityId])> + '_ {
        let schema: &'static TypeSchema = self.schema;
        schema.containers.iter().map(move |descriptor| {
            let ids = self
                .children
                .get(descriptor.predicate)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            (descriptor, ids)
        })
    }

    /// Ids of the children in a declared container
    pub fn child_ids(&self, predicate: &str) -> SbolResult<&[EntityId]> {
        let descriptor = self.schema.require_container(predicate)?;
        Ok(self
            .children
            .get(descriptor.predicate)
            .map(Vec::as_slice)
            .unwrap_or(&[]))
    }

    /// Values stored under predicates this type does not declare
    pub fn annotations(&self) -> impl Iterator<Item = (&str, &[PropertyValue])> + '_ {
        self.annotations
            .iter()
            .map(|(predicate, values)| (predicate.as_str(), values.as_slice()))
    }

    /// Attach a value under an undeclared predicate
    ///
    /// `rdf:type` is accepted for additional types: a URI other than the
    /// entity's own type.
    pub fn annotate(&mut self, predicate: &str, value: PropertyValue) -> SbolResult<()> {
        if !identity::is_absolute(predicate) {
            return Err(SbolError::invalid(format!("annotation predicate '{predicate}' is not absolute")));
        }
        if predicate == RDF_TYPE {
            match value.as_uri() {
                Some(type_uri) if type_uri != self.schema.type_uri => {}
                _ => {
                    return Err(SbolError::invalid(format!(
                        "{value} is not an additional type for {}",
                        self.schema.name
                    )))
                }
            }
        }
        if self.schema.property(predicate).is_some() || self.schema.container(predicate).is_some() {
            return Err(SbolError::invalid(format!(
                "<{predicate}> is declared by {} and cannot be used as an annotation",
                self.schema.name
            )));
        }
        if let PropertyValue::Uri(uri) = &value {
            if !identity::is_absolute(uri) {
                return Err(SbolError::invalid(format!("{value} is not an absolute URI")));
            }
        }
        self.annotations.entry(predicate.to_string()).or_default().push(value);
        Ok(())
    }

    /// Write several properties at once; rules run once over all of them
    pub fn set_many(&mut self, writes: Vec<(&str, Vec<PropertyValue>)>) -> SbolResult<Vec<AppliedCorrection>> {
        let staged = self.stage_writes(writes)?;
        Ok(self.commit(staged).corrections)
    }

    /// Triples for this entity's type, properties and annotations
    ///
    /// Ownership links to children are produced by the document, which knows
    /// the children's identities.
    pub fn triples(&self) -> Vec<Triple> {
        let mut triples = vec![Triple::new(
            &self.identity,
            RDF_TYPE,
            PropertyValue::uri(self.schema.type_uri),
        )];
        for (descriptor, values) in self.properties() {
            for value in values {
                triples.push(Triple::new(&self.identity, descriptor.predicate, value.clone()));
            }
        }
        for (predicate, values) in self.annotations() {
            for value in values {
                triples.push(Triple::new(&self.identity, predicate, value.clone()));
            }
        }
        triples
    }

    fn first(&self, predicate: &str) -> Option<&PropertyValue> {
        self.values.get(predicate).and_then(|values| values.first())
    }

    pub(crate) fn set_policy(&mut self, policy: RulePolicy) {
        self.policy = policy;
    }

    /// Drop owner and child links copied from an attached entity
    pub(crate) fn clear_links(&mut self) {
        self.owner = None;
        for ids in self.children.values_mut() {
            ids.clear();
        }
    }

    /// Replace child ids through `mapping`
    pub(crate) fn remap_children(&mut self, mapping: &HashMap<EntityId, EntityId>) {
        for ids in self.children.values_mut() {
            for id in ids.iter_mut() {
                if let Some(new_id) = mapping.get(id) {
                    *id = *new_id;
                }
            }
        }
    }

    /// Persistent identity this entity would have under `identity`
    ///
    /// `None` for entities that carry no persistent identity.
    pub(crate) fn persistent_for<'a>(&self, identity: &'a str) -> Option<&'a str> {
        self.persistent_identity()
            .map(|_| identity::strip_version(identity, self.version()))
    }

    /// Prefix under which this entity's children are named
    pub(crate) fn child_namespace(&self) -> &str {
        self.persistent_identity().unwrap_or(&self.identity)
    }

    /// Change identity, keeping persistent identity and display id in step
    ///
    /// Callers check with [`identity::display_id_for`] that `identity` names a
    /// valid display id before calling this on an entity that has one.
    pub(crate) fn reidentify(&mut self, identity: String) {
        if let Some(persistent) = self.persistent_for(&identity).map(str::to_string) {
            self.values
                .insert(SBOL_PERSISTENT_IDENTITY, vec![PropertyValue::Uri(persistent)]);
        }
        if self.display_id().is_some() {
            if let Some(display_id) = identity::display_id_for(&identity, self.version()) {
                self.values
                    .insert(SBOL_DISPLAY_ID, vec![PropertyValue::Text(display_id)]);
            }
        }
        self.identity = identity;
    }

    /// Rewrite URI values that point at renamed entities
    ///
    /// Returns the declared predicates whose values changed.
    pub(crate) fn rewrite_references(&mut self, renamed: &HashMap<String, String>) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for (predicate, values) in self.values.iter_mut() {
            if *predicate == SBOL_PERSISTENT_IDENTITY {
                continue;
            }
            let mut touched = false;
            for value in values.iter_mut() {
                if let PropertyValue::Uri(uri) = value {
                    if let Some(new_uri) = renamed.get(uri.as_str()) {
                        *uri = new_uri.clone();
                        touched = true;
                    }
                }
            }
            if touched {
                changed.push(*predicate);
            }
        }
        for values in self.annotations.values_mut() {
            for value in values.iter_mut() {
                if let PropertyValue::Uri(uri) = value {
                    if let Some(new_uri) = renamed.get(uri.as_str()) {
                        *uri = new_uri.clone();
                    }
                }
            }
        }
        changed
    }

    /// Current values of a list property with `value` appended
    pub(crate) fn appended(&self, predicate: &str, value: PropertyValue) -> SbolResult<Vec<PropertyValue>> {
        let descriptor = self.list_descriptor(predicate)?;
        let mut values = self.values(descriptor.predicate)?.to_vec();
        values.push(value);
        Ok(values)
    }

    /// Current values of a list property with the first `value` removed
    pub(crate) fn without(&self, predicate: &str, value: &PropertyValue) -> SbolResult<Vec<PropertyValue>> {
        let descriptor = self.list_descriptor(predicate)?;
        let mut values = self.values(descriptor.predicate)?.to_vec();
        let position = values.iter().position(|v| v == value).ok_or_else(|| {
            SbolError::not_found(format!("{value} in <{}> of {}", descriptor.predicate, self.identity))
        })?;
        values.remove(position);
        Ok(values)
    }

    fn list_descriptor(&self, predicate: &str) -> SbolResult<&'static PropertyDescriptor> {
        let schema: &'static TypeSchema = self.schema;
        let descriptor = schema.require_property(predicate)?;
        if descriptor.cardinality.is_scalar() {
            return Err(SbolError::invalid(format!(
                "<{}> is a scalar property; use set instead of add/remove",
                descriptor.predicate
            )));
        }
        Ok(descriptor)
    }

    /// Validate writes and run the rules they trigger, without committing
    pub(crate) fn stage_writes(&self, writes: Vec<(&str, Vec<PropertyValue>)>) -> SbolResult<Staged> {
        let mut values = self.values.clone();
        let mut changed: Vec<&'static str> = Vec::new();
        for (predicate, new_values) in writes {
            let descriptor = self.schema.require_property(predicate)?;
            descriptor.check(&new_values)?;
            values.insert(descriptor.predicate, new_values);
            if !changed.contains(&descriptor.predicate) {
                changed.push(descriptor.predicate);
            }
        }
        let corrections = run_rules(self.schema, &self.identity, &mut values, &self.children, &changed, self.policy)?;
        Ok(Staged {
            values,
            children: self.children.clone(),
            changed,
            corrections,
        })
    }

    /// Stage a new child list for a container and run the rules watching it
    pub(crate) fn stage_children(&self, predicate: &'static str, ids: Vec<EntityId>) -> SbolResult<Staged> {
        let mut children = self.children.clone();
        children.insert(predicate, ids);
        let mut values = self.values.clone();
        let corrections = run_rules(self.schema, &self.identity, &mut values, &children, &[predicate], self.policy)?;
        Ok(Staged {
            values,
            children,
            changed: Vec::new(),
            corrections,
        })
    }

    /// Stage a run of every rule on this entity
    pub(crate) fn stage_all(&self) -> SbolResult<Staged> {
        let mut watched: Vec<&'static str> = self.schema.properties.iter().map(|p| p.predicate).collect();
        watched.extend(self.schema.containers.iter().map(|c| c.predicate));
        let mut values = self.values.clone();
        let corrections = run_rules(self.schema, &self.identity, &mut values, &self.children, &watched, self.policy)?;
        Ok(Staged {
            values,
            children: self.children.clone(),
            changed: Vec::new(),
            corrections,
        })
    }

    pub(crate) fn commit(&mut self, staged: Staged) -> CommitSummary {
        let mut changed = staged.changed;
        for correction in &staged.corrections {
            if let Some(descriptor) = self.schema.property(&correction.predicate) {
                if !changed.contains(&descriptor.predicate) {
                    changed.push(descriptor.predicate);
                }
            }
        }
        self.values = staged.values;
        self.children = staged.children;
        CommitSummary {
            changed,
            corrections: staged.corrections,
        }
    }
}

impl PropertyHost for Entity {
    fn values(&self, predicate: &str) -> SbolResult<&[PropertyValue]> {
        Entity::values(self, predicate)
    }

    fn set_values(&mut self, predicate: &str, values: Vec<PropertyValue>) -> SbolResult<()> {
        self.set_many(vec![(predicate, values)]).map(|_| ())
    }

    fn add_value(&mut self, predicate: &str, value: PropertyValue) -> SbolResult<()> {
        let values = self.appended(predicate, value)?;
        self.set_values(predicate, values)
    }

    fn remove_value(&mut self, predicate: &str, value: &PropertyValue) -> SbolResult<()> {
        let values = self.without(predicate, value)?;
        self.set_values(predicate, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{component, interaction, measurement};

    fn config() -> Config {
        Config::default().with_homespace("http://sbols.org/test").unwrap()
    }

    #[test]
    fn test_compliant_identity() {
        let c = component::new(&config(), "c1").unwrap();

        assert_eq!(c.identity(), "http://sbols.org/test/c1");
        assert_eq!(c.display_id(), Some("c1"));
        assert_eq!(c.persistent_identity(), Some("http://sbols.org/test/c1"));
        assert_eq!(c.type_uri(), SBOL_COMPONENT);
    }

    #[test]
    fn test_versioned_and_typed_identity() {
        let mut config = config().with_version("1");
        config.typed_uris = true;
        let i = interaction::new(&config, "i1").unwrap();

        assert_eq!(i.identity(), "http://sbols.org/test/Interaction/i1/1");
        assert_eq!(i.persistent_identity(), Some("http://sbols.org/test/Interaction/i1"));
        assert_eq!(i.version(), Some("1"));
    }

    #[test]
    fn test_absolute_uri_kept() {
        let c = component::new(&config(), "http://other.org/parts/c9").unwrap();
        assert_eq!(c.identity(), "http://other.org/parts/c9");
        assert_eq!(c.display_id(), Some("c9"));
    }

    #[test]
    fn test_non_compliant_resolves_against_homespace() {
        let mut config = config();
        config.compliant_uris = false;
        let c = component::new(&config, "c1").unwrap();
        assert_eq!(c.identity(), "http://sbols.org/test/c1");
        assert_eq!(c.persistent_identity(), None);
    }

    #[test]
    fn test_generated_display_id() {
        let c = component::new(&config(), "").unwrap();
        assert!(c.display_id().unwrap().starts_with("id_"));
    }

    #[test]
    fn test_invalid_display_id() {
        let result = component::new(&config(), "9lives");
        assert!(matches!(result, Err(SbolError::InvalidArgument(_))));
    }

    #[test]
    fn test_defaults_applied() {
        let i = interaction::new(&config(), "i1").unwrap();
        assert_eq!(i.values(SBOL_TYPES).unwrap(), &[PropertyValue::uri(SBO_INTERACTION)]);
    }

    #[test]
    fn test_required_without_default_needs_initial_value() {
        let result = Entity::new(measurement::schema(), &config(), "m1");
        assert!(matches!(result, Err(SbolError::CardinalityViolation { .. })));
    }

    #[test]
    fn test_undeclared_property_rejected() {
        let c = component::new(&config(), "c1").unwrap();
        assert!(matches!(c.values(SBOL_PARTICIPANT), Err(SbolError::InvalidArgument(_))));
    }

    #[test]
    fn test_add_remove_preserve_order() {
        let mut c = component::new(&config(), "c1").unwrap();
        c.add_value(SBOL_ROLES, PropertyValue::uri(SO_PROMOTER)).unwrap();
        c.add_value(SBOL_ROLES, PropertyValue::uri(SO_CDS)).unwrap();
        c.add_value(SBOL_ROLES, PropertyValue::uri(SO_TERMINATOR)).unwrap();
        c.remove_value(SBOL_ROLES, &PropertyValue::uri(SO_CDS)).unwrap();

        assert_eq!(
            c.values(SBOL_ROLES).unwrap(),
            &[PropertyValue::uri(SO_PROMOTER), PropertyValue::uri(SO_TERMINATOR)]
        );
    }

    #[test]
    fn test_remove_absent_value() {
        let mut c = component::new(&config(), "c1").unwrap();
        let err = c.remove_value(SBOL_ROLES, &PropertyValue::uri(SO_CDS)).unwrap_err();
        assert!(matches!(err, SbolError::NotFound(_)));
    }

    #[test]
    fn test_add_on_scalar_rejected() {
        let mut c = component::new(&config(), "c1").unwrap();
        let err = c
            .add_value(SBOL_DEFINITION, PropertyValue::uri("http://sbols.org/test/cd1"))
            .unwrap_err();
        assert!(matches!(err, SbolError::InvalidArgument(_)));
    }

    #[test]
    fn test_failed_write_leaves_values() {
        let mut c = component::new(&config(), "c1").unwrap();
        c.set_values(SBOL_ROLES, vec![PropertyValue::uri(SO_PROMOTER)]).unwrap();

        let err = c
            .set_values(SBOL_ROLES, vec![PropertyValue::uri(SO_CDS), PropertyValue::text("bad")])
            .unwrap_err();

        assert!(matches!(err, SbolError::InvalidArgument(msg) if msg.contains("bad")));
        assert_eq!(c.values(SBOL_ROLES).unwrap(), &[PropertyValue::uri(SO_PROMOTER)]);
    }

    #[test]
    fn test_annotations() {
        let mut c = component::new(&config(), "c1").unwrap();
        c.annotate("http://examples.org/lab#owner", PropertyValue::text("bench 4")).unwrap();

        assert!(c.annotate(SBOL_ROLES, PropertyValue::uri(SO_CDS)).is_err());
        let triples = c.triples();
        assert!(triples.iter().any(|t| t.predicate == "http://examples.org/lab#owner"));
        assert_eq!(triples[0].predicate, RDF_TYPE);
    }

    #[test]
    fn test_additional_type_annotation() {
        let mut c = component::new(&config(), "c1").unwrap();

        assert!(c.annotate(RDF_TYPE, PropertyValue::uri(SBOL_COMPONENT)).is_err());
        assert!(c.annotate(RDF_TYPE, PropertyValue::text("Part")).is_err());
        c.annotate(RDF_TYPE, PropertyValue::uri("http://examples.org/lab#Part")).unwrap();

        let types: Vec<_> = c
            .triples()
            .into_iter()
            .filter(|t| t.predicate == RDF_TYPE)
            .map(|t| t.object)
            .collect();
        assert_eq!(
            types,
            vec![PropertyValue::uri(SBOL_COMPONENT), PropertyValue::uri("http://examples.org/lab#Part")]
        );
    }
}
