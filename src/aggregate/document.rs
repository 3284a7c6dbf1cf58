//! Document aggregate
//!
//! A `Document` owns every entity in an arena keyed by [`EntityId`] and keeps
//! a URI index over all of them, top-level and nested. Parents hold the ids
//! of their children; children hold an [`Owner`] link back. Every mutation
//! either commits completely or leaves the document as it was.

use chrono::{DateTime, Utc};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::entity::{CommitSummary, Entity, Owner, Staged};
use crate::config::Config;
use crate::error::{SbolError, SbolResult};
use crate::events::{
    DocumentEvent, EntityRegistered, EntityRenamed, EntityUnregistered, PropertyChanged, RuleCorrected,
};
use crate::identity::{self, Namespace};
use crate::property::PropertyHost;
use crate::schema::SchemaRegistry;
use crate::triples::Triple;
use crate::validation::{AppliedCorrection, RulePolicy, ValidationReport};
use crate::value_objects::vocabulary::{SBOL_TOP_LEVEL, STANDARD_PREFIXES};
use crate::value_objects::{EntityId, PropertyValue};

/// A document shared between threads; writers take the lock exclusively
pub type SharedDocument = Arc<RwLock<Document>>;

/// The root aggregate owning a graph of SBOL entities
#[derive(Debug, Clone)]
pub struct Document {
    config: Config,
    registry: SchemaRegistry,
    namespaces: Vec<Namespace>,
    entities: IndexMap<EntityId, Entity>,
    index: HashMap<String, EntityId>,
    top_level: IndexSet<EntityId>,
    events: Vec<DocumentEvent>,
    created_at: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    version: u64,
}

impl Document {
    /// Create an empty document with the built-in SBOL schemas
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, SchemaRegistry::sbol())
    }

    /// Create an empty document that reads types from `registry`
    pub fn with_registry(config: Config, registry: SchemaRegistry) -> Self {
        let now = Utc::now();
        let mut namespaces = vec![Namespace::new(config.homespace.clone())];
        namespaces.extend(
            STANDARD_PREFIXES
                .iter()
                .map(|(prefix, uri)| Namespace::prefixed(*prefix, *uri)),
        );
        Self {
            config,
            registry,
            namespaces,
            entities: IndexMap::new(),
            index: HashMap::new(),
            top_level: IndexSet::new(),
            events: Vec::new(),
            created_at: now,
            last_modified: now,
            version: 0,
        }
    }

    /// Wrap the document for shared access
    pub fn into_shared(self) -> SharedDocument {
        Arc::new(RwLock::new(self))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Known namespaces, the homespace first, then the standard prefixes
    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Register a namespace; re-adding an identical one is a no-op
    pub fn add_namespace(&mut self, namespace: Namespace) -> SbolResult<()> {
        if !identity::is_absolute(&namespace.uri) {
            return Err(SbolError::invalid(format!("namespace '{}' is not absolute", namespace.uri)));
        }
        if self.namespaces.contains(&namespace) {
            return Ok(());
        }
        if let Some(prefix) = &namespace.prefix {
            if self.namespaces.iter().any(|ns| ns.prefix.as_ref() == Some(prefix)) {
                return Err(SbolError::DuplicateIdentity(format!("namespace prefix '{prefix}'")));
            }
        }
        debug!("Added namespace {}", namespace.uri);
        self.namespaces.push(namespace);
        Ok(())
    }

    /// Resolve a possibly relative or prefixed reference to an absolute URI
    pub fn resolve(&self, uri: &str) -> SbolResult<String> {
        identity::resolve(uri, &self.namespaces, true)
    }

    /// Number of attached entities at every level
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.index.contains_key(uri)
    }

    /// Id of the entity registered under `uri`
    pub fn id_of(&self, uri: &str) -> SbolResult<EntityId> {
        self.index
            .get(uri)
            .copied()
            .ok_or_else(|| SbolError::not_found(uri))
    }

    /// Entity registered under `uri`, at any depth
    pub fn lookup(&self, uri: &str) -> SbolResult<&Entity> {
        self.entity(self.id_of(uri)?)
    }

    pub fn entity(&self, id: EntityId) -> SbolResult<&Entity> {
        self.entities
            .get(&id)
            .ok_or_else(|| SbolError::not_found(format!("entity {id}")))
    }

    /// Mutable handle to an attached entity
    pub fn entity_mut(&mut self, id: EntityId) -> SbolResult<EntityMut<'_>> {
        self.entity(id)?;
        Ok(EntityMut { doc: self, id })
    }

    /// The owning entity, `None` for top-level entities
    pub fn parent_of(&self, id: EntityId) -> SbolResult<Option<&Entity>> {
        match self.entity(id)?.parent() {
            Some(parent) => self.entity(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Top-level entities in insertion order
    pub fn top_level(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.top_level.iter().filter_map(|id| self.entities.get(id))
    }

    /// Every attached entity, parents before children
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.top_level
            .iter()
            .flat_map(|id| self.subtree(*id))
            .filter_map(|id| self.entities.get(&id))
    }

    /// Ids of `id` and everything it owns, in pre-order
    pub fn descendants(&self, id: EntityId) -> SbolResult<Vec<EntityId>> {
        self.entity(id)?;
        Ok(self.subtree(id))
    }

    fn subtree(&self, root: EntityId) -> Vec<EntityId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(entity) = self.entities.get(&id) {
                let children: Vec<EntityId> = entity
                    .containers()
                    .flat_map(|(_, ids)| ids.iter().copied())
                    .collect();
                stack.extend(children.into_iter().rev());
            }
        }
        order
    }

    /// Add a top-level entity
    pub fn add(&mut self, mut entity: Entity) -> SbolResult<EntityId> {
        if !entity.schema().top_level {
            return Err(SbolError::TypeMismatch {
                expected: SBOL_TOP_LEVEL.to_string(),
                found: entity.type_uri().to_string(),
            });
        }
        self.prepare_incoming(&mut entity);
        let id = self.insert_subtree(None, vec![entity])?;
        info!("Added top-level {}", self.entity(id)?.identity());
        Ok(id)
    }

    /// Detach a top-level entity and everything it owns
    pub fn remove(&mut self, uri: &str) -> SbolResult<Entity> {
        let id = self.id_of(uri)?;
        if !self.top_level.contains(&id) {
            return Err(SbolError::not_found(format!("{uri} as a top-level entity")));
        }
        let nodes = self.extract(id);
        let entity = Self::detached_root(nodes, uri)?;
        info!("Removed top-level {}", uri);
        Ok(entity)
    }

    /// Attach `child` to the container `predicate` of `parent`
    ///
    /// With compliant URIs the child's identity becomes
    /// `parentPersistentIdentity/displayId[/version]`.
    pub fn add_child(&mut self, parent: EntityId, predicate: &str, mut child: Entity) -> SbolResult<EntityId> {
        let owner = self.entity(parent)?;
        let container = owner.schema().require_container(predicate)?;
        if !child.schema().satisfies(container.accepts) {
            return Err(SbolError::TypeMismatch {
                expected: container.accepts.to_string(),
                found: child.type_uri().to_string(),
            });
        }
        if self.config.compliant_uris {
            let identity = derived_identity(owner.child_namespace(), &child)?;
            child.reidentify(identity);
        }
        let owner = Owner {
            parent,
            predicate: container.predicate,
        };
        self.prepare_incoming(&mut child);
        self.insert_subtree(Some(owner), vec![child])
    }

    /// Detach the child `uri` from the container `predicate` of `parent`
    pub fn remove_child(&mut self, parent: EntityId, predicate: &str, uri: &str) -> SbolResult<Entity> {
        let owner = self.entity(parent)?;
        let container = owner.schema().require_container(predicate)?;
        let ids = owner.child_ids(container.predicate)?;
        let id = self
            .index
            .get(uri)
            .copied()
            .filter(|id| ids.contains(id))
            .ok_or_else(|| {
                SbolError::not_found(format!("{uri} in <{}> of {}", container.predicate, owner.identity()))
            })?;

        let remaining: Vec<EntityId> = ids.iter().copied().filter(|c| *c != id).collect();
        let staged = owner.stage_children(container.predicate, remaining)?;

        let nodes = self.extract(id);
        self.commit_staged(parent, staged)?;
        Self::detached_root(nodes, uri)
    }

    /// Child `uri` in the container `predicate` of `parent`
    pub fn child(&self, parent: EntityId, predicate: &str, uri: &str) -> SbolResult<&Entity> {
        let owner = self.entity(parent)?;
        let ids = owner.child_ids(predicate)?;
        self.index
            .get(uri)
            .filter(|id| ids.contains(id))
            .and_then(|id| self.entities.get(id))
            .ok_or_else(|| SbolError::not_found(format!("{uri} in <{predicate}> of {}", owner.identity())))
    }

    /// Children in the container `predicate` of `parent`, in insertion order
    pub fn children(&self, parent: EntityId, predicate: &str) -> SbolResult<Vec<&Entity>> {
        self.entity(parent)?
            .child_ids(predicate)?
            .iter()
            .map(|id| self.entity(*id))
            .collect()
    }

    /// Replace the values of a declared property on an attached entity
    pub fn set_values(
        &mut self,
        id: EntityId,
        predicate: &str,
        values: Vec<PropertyValue>,
    ) -> SbolResult<Vec<AppliedCorrection>> {
        self.write(id, vec![(predicate, values)])
    }

    /// Write several properties of an attached entity in one staged step
    pub fn write(
        &mut self,
        id: EntityId,
        writes: Vec<(&str, Vec<PropertyValue>)>,
    ) -> SbolResult<Vec<AppliedCorrection>> {
        let staged = self.entity(id)?.stage_writes(writes)?;
        self.commit_staged(id, staged)
    }

    /// Change the identity of an entity
    ///
    /// Descendants whose identity lives under the old one are re-based, and
    /// every URI value in the document that pointed at a renamed entity is
    /// rewritten.
    pub fn rename(&mut self, id: EntityId, new_identity: &str) -> SbolResult<()> {
        let new_identity = self.resolve(new_identity)?;
        let old_identity = self.entity(id)?.identity().to_string();
        if old_identity == new_identity {
            return Ok(());
        }

        let order = self.subtree(id);
        let planned = self.plan_identities(&order, new_identity, false)?;
        self.check_display_ids(&planned)?;
        let renamed: Vec<(EntityId, String, String)> = order
            .iter()
            .filter_map(|entity_id| {
                let old = self.entities.get(entity_id)?.identity().to_string();
                let new = planned.get(entity_id)?.clone();
                (old != new).then_some((*entity_id, old, new))
            })
            .collect();

        let vacated: HashSet<&str> = renamed.iter().map(|(_, old, _)| old.as_str()).collect();
        let mut claimed = HashSet::new();
        for (_, _, new) in &renamed {
            if (self.index.contains_key(new) && !vacated.contains(new.as_str())) || !claimed.insert(new.as_str()) {
                return Err(SbolError::DuplicateIdentity(new.clone()));
            }
        }

        for (_, old, _) in &renamed {
            self.index.remove(old);
        }
        for (entity_id, old, new) in &renamed {
            if let Some(entity) = self.entities.get_mut(entity_id) {
                entity.reidentify(new.clone());
            }
            self.index.insert(new.clone(), *entity_id);
            self.events.push(DocumentEvent::EntityRenamed(EntityRenamed {
                old_identity: old.clone(),
                new_identity: new.clone(),
            }));
        }
        let mapping: HashMap<String, String> = renamed
            .into_iter()
            .map(|(_, old, new)| (old, new))
            .collect();
        self.rewrite_references(&mapping);

        info!("Renamed {} to {}", old_identity, self.entity(id)?.identity());
        self.touch();
        Ok(())
    }

    /// Deep-copy an entity under `new_identity`, next to the original
    ///
    /// Descendant identities are re-based onto the new identity; references
    /// inside the copied subtree are redirected to the copies.
    pub fn clone_entity(&mut self, id: EntityId, new_identity: &str) -> SbolResult<EntityId> {
        let new_identity = self.resolve(new_identity)?;
        let owner = self.entity(id)?.owner();
        let nodes = self.cloned_subtree(id, new_identity)?;
        let copy = self.insert_subtree(owner, nodes)?;
        info!("Cloned {} to {}", self.entity(id)?.identity(), self.entity(copy)?.identity());
        Ok(copy)
    }

    /// Deep-copy a top-level entity into another document
    pub fn copy_into(&self, id: EntityId, target: &mut Document, new_identity: &str) -> SbolResult<EntityId> {
        let new_identity = target.resolve(new_identity)?;
        let nodes = self.cloned_subtree(id, new_identity)?;
        let root = nodes
            .first()
            .ok_or_else(|| SbolError::not_found(format!("entity {id}")))?;
        if !root.schema().top_level {
            return Err(SbolError::TypeMismatch {
                expected: SBOL_TOP_LEVEL.to_string(),
                found: root.type_uri().to_string(),
            });
        }
        target.insert_subtree(None, nodes)
    }

    /// Move an attached entity into the container `predicate` of `new_parent`
    ///
    /// With compliant URIs the moved subtree is re-based under the new parent
    /// and references to it are rewritten.
    pub fn move_entity(&mut self, id: EntityId, new_parent: EntityId, predicate: &str) -> SbolResult<EntityId> {
        if self.subtree(id).contains(&new_parent) {
            return Err(SbolError::invalid(format!(
                "cannot move {} into its own subtree",
                self.entity(id)?.identity()
            )));
        }

        let mut staged = self.clone();
        let moved = staged.move_in_place(id, new_parent, predicate)?;
        *self = staged;
        Ok(moved)
    }

    fn move_in_place(&mut self, id: EntityId, new_parent: EntityId, predicate: &str) -> SbolResult<EntityId> {
        let entity = self.entity(id)?;
        let old_identity = entity.identity().to_string();
        let parent = self.entity(new_parent)?;
        let container = parent.schema().require_container(predicate)?;
        if !entity.schema().satisfies(container.accepts) {
            return Err(SbolError::TypeMismatch {
                expected: container.accepts.to_string(),
                found: entity.type_uri().to_string(),
            });
        }
        let container_predicate = container.predicate;
        let new_identity = if self.config.compliant_uris {
            derived_identity(parent.child_namespace(), entity)?
        } else {
            old_identity.clone()
        };

        let order = self.subtree(id);
        let planned = self.plan_identities(&order, new_identity, false)?;
        self.check_display_ids(&planned)?;
        let mut mapping = HashMap::new();

        match entity.owner() {
            Some(owner) => {
                let remaining: Vec<EntityId> = self
                    .entity(owner.parent)?
                    .child_ids(owner.predicate)?
                    .iter()
                    .copied()
                    .filter(|c| *c != id)
                    .collect();
                let staged = self.entity(owner.parent)?.stage_children(owner.predicate, remaining)?;
                self.commit_staged(owner.parent, staged)?;
            }
            None => {
                self.top_level.shift_remove(&id);
            }
        }

        let mut nodes = self.extract(id);
        for node in nodes.iter_mut() {
            if let Some(new) = planned.get(&node.id) {
                if new != node.identity() {
                    mapping.insert(node.identity().to_string(), new.clone());
                    self.events.push(DocumentEvent::EntityRenamed(EntityRenamed {
                        old_identity: node.identity().to_string(),
                        new_identity: new.clone(),
                    }));
                    node.reidentify(new.clone());
                }
            }
        }

        let moved = self.insert_subtree(
            Some(Owner {
                parent: new_parent,
                predicate: container_predicate,
            }),
            nodes,
        )?;
        self.rewrite_references(&mapping);
        info!("Moved {} to {}", old_identity, self.entity(moved)?.identity());
        Ok(moved)
    }

    /// Run every rule on every entity, applying corrections
    ///
    /// Either all corrections are committed or, if any rule fails, none are.
    pub fn validate(&mut self) -> SbolResult<ValidationReport> {
        let order: Vec<EntityId> = self.iter().map(Entity::id).collect();
        let mut staged = Vec::with_capacity(order.len());
        for id in &order {
            staged.push((*id, self.entity(*id)?.stage_all()?));
        }

        let mut report = ValidationReport {
            checked: order.len(),
            corrections: Vec::new(),
        };
        for (id, staged) in staged {
            if staged.corrections().is_empty() {
                continue;
            }
            let corrections = self.commit_staged(id, staged)?;
            for correction in &corrections {
                warn!(
                    "Rule {} corrected <{}> on {}",
                    correction.rule, correction.predicate, correction.entity
                );
            }
            report.corrections.extend(corrections);
        }
        debug!(
            "Validated {} entities, {} corrections",
            report.checked,
            report.corrections.len()
        );
        Ok(report)
    }

    /// Check every rule without modifying the document
    ///
    /// A rule that would need to correct something counts as a failure.
    pub fn check(&self) -> SbolResult<()> {
        for entity in self.iter() {
            let staged = entity.stage_all()?;
            if let Some(pending) = staged.corrections().first() {
                return Err(SbolError::ValidationError {
                    rule: pending.rule.clone(),
                    entity: pending.entity.clone(),
                    message: format!("correction pending on <{}>", pending.predicate),
                });
            }
        }
        Ok(())
    }

    /// Every triple in the document, parents before children
    pub fn triples(&self) -> Vec<Triple> {
        self.top_level
            .iter()
            .flat_map(|id| self.subtree_triples(*id))
            .collect()
    }

    /// Triples of `id` and everything it owns
    pub fn subtree_triples(&self, id: EntityId) -> Vec<Triple> {
        let mut triples = Vec::new();
        for entity in self.subtree(id).iter().filter_map(|id| self.entities.get(id)) {
            triples.extend(entity.triples());
            for (container, ids) in entity.containers() {
                for child in ids.iter().filter_map(|id| self.entities.get(id)) {
                    triples.push(Triple::new(
                        entity.identity(),
                        container.predicate,
                        PropertyValue::uri(child.identity()),
                    ));
                }
            }
        }
        triples
    }

    /// Whether events were recorded since the last drain
    pub fn is_dirty(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn events(&self) -> &[DocumentEvent] {
        &self.events
    }

    /// Drain the recorded events
    pub fn take_events(&mut self) -> Vec<DocumentEvent> {
        std::mem::take(&mut self.events)
    }

    /// Monotonic counter bumped by every committed mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.last_modified
    }

    fn touch(&mut self) {
        self.version += 1;
        self.last_modified = Utc::now();
    }

    fn policy(&self) -> RulePolicy {
        RulePolicy::from(&self.config)
    }

    /// Sanitize a detached entity before it enters the arena
    fn prepare_incoming(&self, entity: &mut Entity) {
        entity.clear_links();
        if self.entities.contains_key(&entity.id) {
            entity.id = EntityId::new();
        }
    }

    /// Register a pre-ordered subtree under `owner`
    ///
    /// `nodes[0]` is the root; the other nodes already carry owner links
    /// inside the subtree. Nothing is registered unless every check passes.
    pub(crate) fn insert_subtree(&mut self, owner: Option<Owner>, nodes: Vec<Entity>) -> SbolResult<EntityId> {
        let root_id = nodes
            .first()
            .map(Entity::id)
            .ok_or_else(|| SbolError::invalid("cannot insert an empty subtree"))?;

        let mut incoming = HashSet::new();
        for node in &nodes {
            if self.index.contains_key(node.identity()) || !incoming.insert(node.identity()) {
                return Err(SbolError::DuplicateIdentity(node.identity().to_string()));
            }
            if self.entities.contains_key(&node.id) {
                return Err(SbolError::invalid(format!("entity {} is already attached", node.id)));
            }
        }

        let staged_parent = match owner {
            Some(owner) => {
                let parent = self.entity(owner.parent)?;
                let container = parent.schema().require_container(owner.predicate)?;
                let mut ids = parent.child_ids(container.predicate)?.to_vec();
                ids.push(root_id);
                if !container.cardinality().allows(ids.len()) {
                    return Err(SbolError::CardinalityViolation {
                        predicate: container.predicate.to_string(),
                        count: ids.len(),
                        lower: 0,
                        upper: container.cardinality().upper_label(),
                    });
                }
                Some((owner.parent, parent.stage_children(container.predicate, ids)?))
            }
            None => None,
        };

        let policy = self.policy();
        for mut node in nodes {
            if node.id == root_id {
                node.owner = owner;
            }
            node.set_policy(policy);
            let parent = node
                .owner
                .and_then(|o| self.entities.get(&o.parent))
                .map(|p| p.identity().to_string());
            self.events.push(DocumentEvent::EntityRegistered(EntityRegistered {
                identity: node.identity().to_string(),
                type_uri: node.type_uri().to_string(),
                parent,
            }));
            debug!("Registered {}", node.identity());
            self.index.insert(node.identity().to_string(), node.id);
            self.entities.insert(node.id, node);
        }

        match staged_parent {
            Some((parent, staged)) => {
                self.commit_staged(parent, staged)?;
            }
            None => {
                self.top_level.insert(root_id);
                self.touch();
            }
        }
        Ok(root_id)
    }

    /// Unregister a subtree, children before their parent
    ///
    /// The caller is responsible for unlinking the root from its owner.
    fn extract(&mut self, id: EntityId) -> Vec<Entity> {
        let order = self.subtree(id);
        for entity_id in order.iter().rev() {
            if let Some(identity) = self.entities.get(entity_id).map(|e| e.identity().to_string()) {
                self.index.remove(&identity);
                debug!("Unregistered {}", identity);
                self.events
                    .push(DocumentEvent::EntityUnregistered(EntityUnregistered { identity }));
            }
        }
        self.top_level.shift_remove(&id);
        let nodes = order
            .iter()
            .filter_map(|entity_id| self.entities.swap_remove(entity_id))
            .collect();
        self.touch();
        nodes
    }

    fn detached_root(nodes: Vec<Entity>, uri: &str) -> SbolResult<Entity> {
        let mut root = nodes
            .into_iter()
            .next()
            .ok_or_else(|| SbolError::not_found(uri))?;
        root.clear_links();
        Ok(root)
    }

    fn commit_staged(&mut self, id: EntityId, staged: Staged) -> SbolResult<Vec<AppliedCorrection>> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or_else(|| SbolError::not_found(format!("entity {id}")))?;
        let CommitSummary { changed, corrections } = entity.commit(staged);
        let identity = entity.identity().to_string();
        for predicate in changed {
            let values = entity.values(predicate)?.to_vec();
            self.events.push(DocumentEvent::PropertyChanged(PropertyChanged {
                identity: identity.clone(),
                predicate: predicate.to_string(),
                values,
            }));
        }
        for correction in &corrections {
            self.events.push(DocumentEvent::RuleCorrected(RuleCorrected {
                identity: identity.clone(),
                rule: correction.rule.clone(),
                predicate: correction.predicate.clone(),
            }));
        }
        self.touch();
        Ok(corrections)
    }

    /// New identities for a pre-ordered subtree whose root becomes `root_identity`
    ///
    /// A descendant named under its parent's old persistent identity is
    /// re-based onto the parent's new one. Other descendants keep their
    /// identity, or get a freshly derived one when `derive` is set.
    fn plan_identities(
        &self,
        order: &[EntityId],
        root_identity: String,
        derive: bool,
    ) -> SbolResult<HashMap<EntityId, String>> {
        let mut planned: HashMap<EntityId, String> = HashMap::new();
        let Some(root) = order.first() else {
            return Ok(planned);
        };
        planned.insert(*root, root_identity);

        for id in order.iter().skip(1) {
            let entity = self.entity(*id)?;
            let Some(owner) = entity.owner() else {
                continue;
            };
            let parent = self.entity(owner.parent)?;
            let Some(parent_planned) = planned.get(&owner.parent) else {
                continue;
            };
            let parent_old = parent.child_namespace();
            let parent_new = parent.persistent_for(parent_planned).unwrap_or(parent_planned.as_str());
            let identity = match identity::rebase(entity.identity(), parent_old, parent_new) {
                Some(rebased) => rebased,
                None if derive => derived_identity(parent_new, entity)?,
                None => entity.identity().to_string(),
            };
            planned.insert(*id, identity);
        }
        Ok(planned)
    }

    /// Detached deep copy of a subtree with fresh ids and re-based identities
    fn cloned_subtree(&self, id: EntityId, root_identity: String) -> SbolResult<Vec<Entity>> {
        self.entity(id)?;
        let order = self.subtree(id);
        let planned = self.plan_identities(&order, root_identity, true)?;
        self.check_display_ids(&planned)?;
        let fresh: HashMap<EntityId, EntityId> = order.iter().map(|old| (*old, EntityId::new())).collect();
        let mut mapping = HashMap::new();
        for old in &order {
            if let Some(new) = planned.get(old) {
                mapping.insert(self.entity(*old)?.identity().to_string(), new.clone());
            }
        }

        let mut nodes = Vec::with_capacity(order.len());
        for old in &order {
            let mut copy = self.entity(*old)?.clone();
            if let Some(new_id) = fresh.get(old) {
                copy.id = *new_id;
            }
            if let Some(identity) = planned.get(old) {
                copy.reidentify(identity.clone());
            }
            copy.rewrite_references(&mapping);
            copy.remap_children(&fresh);
            copy.owner = match copy.owner {
                Some(owner) if *old != id => fresh.get(&owner.parent).map(|parent| Owner {
                    parent: *parent,
                    predicate: owner.predicate,
                }),
                _ => None,
            };
            nodes.push(copy);
        }
        Ok(nodes)
    }

    /// Every planned identity must end in a display id for entities that keep one
    fn check_display_ids(&self, planned: &HashMap<EntityId, String>) -> SbolResult<()> {
        for (id, new_identity) in planned {
            let entity = self.entity(*id)?;
            if entity.display_id().is_some()
                && identity::display_id_for(new_identity, entity.version()).is_none()
            {
                return Err(SbolError::invalid(format!(
                    "'{new_identity}' does not end in a valid display id for {}",
                    entity.identity()
                )));
            }
        }
        Ok(())
    }

    fn rewrite_references(&mut self, mapping: &HashMap<String, String>) {
        if mapping.is_empty() {
            return;
        }
        for entity in self.entities.values_mut() {
            for predicate in entity.rewrite_references(mapping) {
                if let Ok(values) = entity.values(predicate) {
                    self.events.push(DocumentEvent::PropertyChanged(PropertyChanged {
                        identity: entity.identity().to_string(),
                        predicate: predicate.to_string(),
                        values: values.to_vec(),
                    }));
                }
            }
        }
    }
}

/// `namespace/displayId[/version]` for a child entity; `namespace` is the
/// parent's persistent identity
fn derived_identity(namespace: &str, child: &Entity) -> SbolResult<String> {
    let display_id = child
        .display_id()
        .map(str::to_string)
        .or_else(|| identity::display_id_from_uri(child.identity()))
        .unwrap_or_else(identity::generate_display_id);
    identity::generate_uri(namespace, &display_id, child.version())
}

/// A mutable borrow of one attached entity
///
/// Writes go through the document so that events and the version counter
/// stay in step.
pub struct EntityMut<'a> {
    doc: &'a mut Document,
    id: EntityId,
}

impl EntityMut<'_> {
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn get(&self) -> SbolResult<&Entity> {
        self.doc.entity(self.id)
    }

    /// Write several properties in one staged step
    pub fn write(&mut self, writes: Vec<(&str, Vec<PropertyValue>)>) -> SbolResult<Vec<AppliedCorrection>> {
        self.doc.write(self.id, writes)
    }

    /// Attach a value under an undeclared predicate
    pub fn annotate(&mut self, predicate: &str, value: PropertyValue) -> SbolResult<()> {
        let entity = self
            .doc
            .entities
            .get_mut(&self.id)
            .ok_or_else(|| SbolError::not_found(format!("entity {}", self.id)))?;
        entity.annotate(predicate, value)?;
        let values = entity
            .annotations()
            .find(|(p, _)| *p == predicate)
            .map(|(_, values)| values.to_vec())
            .unwrap_or_default();
        let identity = entity.identity().to_string();
        self.doc.events.push(DocumentEvent::PropertyChanged(PropertyChanged {
            identity,
            predicate: predicate.to_string(),
            values,
        }));
        self.doc.touch();
        Ok(())
    }
}

impl PropertyHost for EntityMut<'_> {
    fn values(&self, predicate: &str) -> SbolResult<&[PropertyValue]> {
        self.doc.entity(self.id)?.values(predicate)
    }

    fn set_values(&mut self, predicate: &str, values: Vec<PropertyValue>) -> SbolResult<()> {
        self.doc.write(self.id, vec![(predicate, values)]).map(|_| ())
    }

    fn add_value(&mut self, predicate: &str, value: PropertyValue) -> SbolResult<()> {
        let values = self.doc.entity(self.id)?.appended(predicate, value)?;
        self.set_values(predicate, values)
    }

    fn remove_value(&mut self, predicate: &str, value: &PropertyValue) -> SbolResult<()> {
        let values = self.doc.entity(self.id)?.without(predicate, value)?;
        self.set_values(predicate, values)
    }
}
