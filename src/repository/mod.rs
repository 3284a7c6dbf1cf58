//! Repository client contract
//!
//! A repository stores top-level entities, each with everything it owns, and
//! groups them into named collections. Documents pull parts from it and
//! submit their top-level entities to it.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::{debug, info};

use crate::aggregate::Document;
use crate::error::{SbolError, SbolResult};
use crate::identity::{self, Namespace};
use crate::triples::{self, read_triples};
use crate::value_objects::PropertyValue;

/// What to do when a submitted collection or part already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitMode {
    /// Fail with `DuplicateIdentity`
    Prevent,
    /// Replace existing parts
    Overwrite,
    /// Keep existing parts and add the new ones
    Merge,
}

/// Storage for documents addressed by URI
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Base URL of the repository
    fn resource(&self) -> &str;

    /// Copy the part `uri` into `doc`
    ///
    /// With `recursive` set, parts referenced by the pulled triples are pulled
    /// as well. On success the repository namespace is registered with `doc`.
    async fn pull(&self, uri: &str, doc: &mut Document, recursive: bool) -> SbolResult<()>;

    /// Store every top-level entity of `doc` under `collection`
    async fn submit(&self, doc: &Document, collection: &str, mode: SubmitMode) -> SbolResult<()>;

    /// Whether the part `uri` is stored
    async fn exists(&self, uri: &str) -> SbolResult<bool>;
}

/// In-memory implementation of the document repository
pub struct InMemoryRepository {
    resource: String,
    parts: RwLock<HashMap<String, Vec<u8>>>,
    collections: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryRepository {
    /// Create an empty repository at `resource`
    pub fn new(resource: impl Into<String>) -> SbolResult<Self> {
        let resource = resource.into();
        if resource.ends_with('/') {
            return Err(SbolError::invalid(format!(
                "resource '{resource}' must not end with a path separator"
            )));
        }
        if !identity::is_absolute(&resource) {
            return Err(SbolError::invalid(format!("resource '{resource}' is not absolute")));
        }
        Ok(Self {
            resource,
            parts: RwLock::new(HashMap::new()),
            collections: RwLock::new(HashMap::new()),
        })
    }

    /// Identities stored in `collection`, in submission order
    pub fn collection(&self, collection: &str) -> SbolResult<Vec<String>> {
        self.collections
            .read()
            .get(collection)
            .cloned()
            .ok_or_else(|| SbolError::not_found(format!("collection '{collection}'")))
    }

    /// Number of stored parts
    pub fn len(&self) -> usize {
        self.parts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.read().is_empty()
    }

    fn resolve(&self, uri: &str) -> SbolResult<String> {
        identity::resolve(uri, &[Namespace::new(self.resource.clone())], true)
    }

    fn part(&self, uri: &str) -> Option<Vec<u8>> {
        self.parts.read().get(uri).cloned()
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    fn resource(&self) -> &str {
        &self.resource
    }

    async fn pull(&self, uri: &str, doc: &mut Document, recursive: bool) -> SbolResult<()> {
        let uri = self.resolve(uri)?;
        if self.part(&uri).is_none() {
            return Err(SbolError::not_found(uri));
        }

        let mut staged = doc.clone();
        let mut queue = VecDeque::from([uri.clone()]);
        let mut visited = HashSet::new();
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next.clone()) || (next != uri && staged.contains(&next)) {
                continue;
            }
            let Some(bytes) = self.part(&next) else {
                continue;
            };
            read_triples(&bytes, &mut staged)?;
            debug!("Pulled {}", next);

            if recursive {
                for triple in triples::parse(&bytes)? {
                    if let PropertyValue::Uri(reference) = triple.object {
                        if !visited.contains(&reference) && self.parts.read().contains_key(&reference) {
                            queue.push_back(reference);
                        }
                    }
                }
            }
        }

        staged.add_namespace(Namespace::new(self.resource.clone()))?;
        *doc = staged;
        info!("Pulled {} from {} ({} parts)", uri, self.resource, visited.len());
        Ok(())
    }

    async fn submit(&self, doc: &Document, collection: &str, mode: SubmitMode) -> SbolResult<()> {
        identity::validate_display_id(collection)?;
        if doc.config().validate_on_write {
            doc.check()?;
        }

        let submitted: Vec<(String, Vec<u8>)> = doc
            .top_level()
            .map(|entity| {
                (
                    entity.identity().to_string(),
                    triples::serialize(&doc.subtree_triples(entity.id())),
                )
            })
            .collect();

        let mut parts = self.parts.write();
        let mut collections = self.collections.write();
        if mode == SubmitMode::Prevent {
            if collections.contains_key(collection) {
                return Err(SbolError::DuplicateIdentity(format!("{}/{}", self.resource, collection)));
            }
            if let Some((identity, _)) = submitted.iter().find(|(identity, _)| parts.contains_key(identity)) {
                return Err(SbolError::DuplicateIdentity(identity.clone()));
            }
        }

        let members = collections.entry(collection.to_string()).or_default();
        for (identity, bytes) in submitted {
            if !members.contains(&identity) {
                members.push(identity.clone());
            }
            if mode == SubmitMode::Merge && parts.contains_key(&identity) {
                continue;
            }
            parts.insert(identity, bytes);
        }
        info!("Submitted {} parts to {}/{}", members.len(), self.resource, collection);
        Ok(())
    }

    async fn exists(&self, uri: &str) -> SbolResult<bool> {
        let uri = self.resolve(uri)?;
        Ok(self.parts.read().contains_key(&uri))
    }
}
