//! Schema graph rendering
//!
//! Builds a graph of the registered entity types: types and capabilities are
//! nodes, containers are `contains` edges and capabilities are `implements`
//! edges. The graph renders as Mermaid or GraphViz DOT.

use indexmap::IndexMap;
use std::fmt;

use super::{SchemaRegistry, TypeSchema};

/// Kind of node in the schema graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaNodeKind {
    /// A top-level entity type
    TopLevel,
    /// An entity type that lives in a container
    Owned,
    /// A capability that containers accept and types implement
    Capability,
}

/// A declared property, as shown on a node
#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: String,
    /// Value kind (e.g. `uri`, `float`)
    pub kind: String,
    /// Cardinality label (e.g. `0..1`, `1..*`)
    pub cardinality: String,
}

/// A node in the schema graph
#[derive(Debug, Clone)]
pub struct SchemaNode {
    /// Identifier used in the rendered output
    pub id: String,
    /// Type or capability URI
    pub uri: String,
    pub kind: SchemaNodeKind,
    pub fields: Vec<FieldInfo>,
}

/// Relationship between schema nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaRelationship {
    /// Owner type holds children of the target in a container
    Contains,
    /// Type satisfies the target capability
    Implements,
}

/// An edge in the schema graph
#[derive(Debug, Clone)]
pub struct SchemaEdge {
    pub from: String,
    pub to: String,
    pub relationship: SchemaRelationship,
    /// Container name for `Contains` edges
    pub label: Option<String>,
}

/// Graph of entity types and their ownership structure
#[derive(Debug, Clone, Default)]
pub struct SchemaGraph {
    /// Nodes indexed by id, types first
    pub nodes: IndexMap<String, SchemaNode>,
    pub edges: Vec<SchemaEdge>,
}

fn local_name(uri: &str) -> &str {
    uri.rsplit(|c| c == '#' || c == '/').next().unwrap_or(uri)
}

impl SchemaGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph of every schema in `registry`
    pub fn from_registry(registry: &SchemaRegistry) -> Self {
        let mut graph = Self::new();
        let schemas: Vec<&TypeSchema> = registry.iter().collect();

        for schema in &schemas {
            graph.add_node(SchemaNode {
                id: schema.name.to_string(),
                uri: schema.type_uri.to_string(),
                kind: if schema.top_level {
                    SchemaNodeKind::TopLevel
                } else {
                    SchemaNodeKind::Owned
                },
                fields: schema
                    .properties
                    .iter()
                    .map(|p| FieldInfo {
                        name: p.name.to_string(),
                        kind: p.kind.to_string(),
                        cardinality: p.cardinality.to_string(),
                    })
                    .collect(),
            });
        }

        for schema in &schemas {
            for capability in schema.capabilities.iter().filter(|c| **c != schema.type_uri) {
                let id = graph.capability_node(capability);
                graph.add_edge(SchemaEdge {
                    from: schema.name.to_string(),
                    to: id,
                    relationship: SchemaRelationship::Implements,
                    label: None,
                });
            }

            for container in &schema.containers {
                let target = match schemas.iter().find(|s| s.type_uri == container.accepts) {
                    Some(concrete) => concrete.name.to_string(),
                    None => graph.capability_node(container.accepts),
                };
                graph.add_edge(SchemaEdge {
                    from: schema.name.to_string(),
                    to: target,
                    relationship: SchemaRelationship::Contains,
                    label: Some(format!("{} {}", container.name, container.cardinality())),
                });
            }
        }

        graph
    }

    pub fn add_node(&mut self, node: SchemaNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn add_edge(&mut self, edge: SchemaEdge) {
        self.edges.push(edge);
    }

    fn capability_node(&mut self, uri: &str) -> String {
        if let Some(existing) = self.nodes.values().find(|n| n.uri == uri) {
            return existing.id.clone();
        }
        let id = local_name(uri).to_string();
        self.add_node(SchemaNode {
            id: id.clone(),
            uri: uri.to_string(),
            kind: SchemaNodeKind::Capability,
            fields: Vec::new(),
        });
        id
    }

    /// Owned types that no container can hold
    pub fn find_unreachable_types(&self) -> Vec<&SchemaNode> {
        self.nodes
            .values()
            .filter(|node| node.kind == SchemaNodeKind::Owned)
            .filter(|node| !self.is_contained(&node.id))
            .collect()
    }

    /// Capabilities accepted by a container but implemented by no type
    pub fn find_unsatisfied_capabilities(&self) -> Vec<&SchemaNode> {
        self.nodes
            .values()
            .filter(|node| node.kind == SchemaNodeKind::Capability)
            .filter(|node| {
                !self
                    .edges
                    .iter()
                    .any(|e| e.relationship == SchemaRelationship::Implements && e.to == node.id)
            })
            .collect()
    }

    fn is_contained(&self, id: &str) -> bool {
        self.edges.iter().any(|edge| {
            edge.relationship == SchemaRelationship::Contains
                && (edge.to == id
                    || self.edges.iter().any(|e| {
                        e.relationship == SchemaRelationship::Implements && e.from == id && e.to == edge.to
                    }))
        })
    }

    /// Render as a Mermaid flowchart
    pub fn to_mermaid(&self) -> String {
        Mermaid(self).to_string()
    }

    /// Render as GraphViz DOT
    pub fn to_dot(&self) -> String {
        Dot(self).to_string()
    }
}

struct Mermaid<'a>(&'a SchemaGraph);

impl fmt::Display for Mermaid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "graph TD")?;
        writeln!(f, "    %% SBOL schema graph")?;
        writeln!(f)?;
        writeln!(f, "    classDef topLevel fill:#f9f,stroke:#333,stroke-width:4px;")?;
        writeln!(f, "    classDef owned fill:#bbf,stroke:#333,stroke-width:2px;")?;
        writeln!(f, "    classDef capability fill:#ffb,stroke:#333,stroke-width:1px;")?;
        writeln!(f)?;

        for node in graph.nodes.values() {
            let mut label = node.id.clone();
            for field in &node.fields {
                label.push_str(&format!("<br/>{}: {} {}", field.name, field.kind, field.cardinality));
            }
            match node.kind {
                SchemaNodeKind::Capability => writeln!(f, "    {}([{}])", node.id, label)?,
                _ => writeln!(f, "    {}[\"{}\"]", node.id, label)?,
            }
        }
        writeln!(f)?;

        for edge in &graph.edges {
            let arrow = match edge.relationship {
                SchemaRelationship::Contains => "-->",
                SchemaRelationship::Implements => "-.->",
            };
            match &edge.label {
                Some(label) => writeln!(f, "    {} {}|{}| {}", edge.from, arrow, label, edge.to)?,
                None => writeln!(f, "    {} {} {}", edge.from, arrow, edge.to)?,
            }
        }
        writeln!(f)?;

        for node in graph.nodes.values() {
            let class = match node.kind {
                SchemaNodeKind::TopLevel => "topLevel",
                SchemaNodeKind::Owned => "owned",
                SchemaNodeKind::Capability => "capability",
            };
            writeln!(f, "    class {} {};", node.id, class)?;
        }
        Ok(())
    }
}

struct Dot<'a>(&'a SchemaGraph);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.0;
        writeln!(f, "digraph SbolSchema {{")?;
        writeln!(f, "    rankdir=TB;")?;
        writeln!(f, "    node [shape=record];")?;
        writeln!(f)?;

        for node in graph.nodes.values() {
            let color = match node.kind {
                SchemaNodeKind::TopLevel => "lightpink",
                SchemaNodeKind::Owned => "lightblue",
                SchemaNodeKind::Capability => "lightyellow",
            };
            let mut label = format!("{{{}", node.id);
            if !node.fields.is_empty() {
                label.push('|');
                for field in &node.fields {
                    label.push_str(&format!("{}:{} [{}]\\l", field.name, field.kind, field.cardinality));
                }
            }
            label.push('}');
            writeln!(f, "    {} [label=\"{}\" fillcolor={} style=filled];", node.id, label, color)?;
        }
        writeln!(f)?;

        for edge in &graph.edges {
            let style = match edge.relationship {
                SchemaRelationship::Contains => "style=bold",
                SchemaRelationship::Implements => "style=dotted",
            };
            let label = edge.label.as_deref().unwrap_or("");
            writeln!(f, "    {} -> {} [label=\"{}\" {}];", edge.from, edge.to, label, style)?;
        }
        writeln!(f, "}}")
    }
}
