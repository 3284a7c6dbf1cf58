//! Triple projection
//!
//! A document can be flattened to triples and written as N-Triples: one
//! triple per line, absolute IRIs, typed literals. Reading parses N-Triples
//! with `oxttl`, then rebuilds entities from their `rdf:type` and ownership
//! from container predicates.

use indexmap::IndexMap;
use oxrdf::{Literal, NamedOrBlankNode, Term};
use oxttl::NTriplesParser;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

use crate::aggregate::{Document, Entity, Owner};
use crate::error::{SbolError, SbolResult};
use crate::validation::RulePolicy;
use crate::value_objects::vocabulary::RDF_TYPE;
use crate::value_objects::{EntityId, PropertyValue, ValueKind};

/// A single subject / predicate / object statement
#[derive(Debug, Clone, PartialEq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: PropertyValue,
}

impl Triple {
    pub fn new(subject: &str, predicate: &str, object: PropertyValue) -> Self {
        Self {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", iri(&self.subject), iri(&self.predicate), object(&self.object))
    }
}

fn iri(s: &str) -> String {
    format!("<{}>", s)
}

fn lit(s: &str, datatype: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{}\"^^<{}>", escaped, datatype)
}

fn object(value: &PropertyValue) -> String {
    match value.kind().datatype() {
        None => iri(&value.lexical()),
        Some(datatype) => lit(&value.lexical(), datatype),
    }
}

/// Serialize every triple of `doc` as N-Triples
///
/// With `validate_on_write` set the document is checked first and a pending
/// correction or violation aborts the write.
pub fn write_triples(doc: &Document) -> SbolResult<Vec<u8>> {
    if doc.config().validate_on_write {
        doc.check()?;
    }
    let bytes = serialize(&doc.triples());
    debug!("Wrote {} entities as N-Triples", doc.len());
    Ok(bytes)
}

/// N-Triples text for `triples`, one per line
pub fn serialize(triples: &[Triple]) -> Vec<u8> {
    let mut out = String::new();
    for triple in triples {
        out.push_str(&triple.to_string());
        out.push('\n');
    }
    out.into_bytes()
}

/// Parse N-Triples and attach the described entities to `doc`
///
/// Subjects typed with an unregistered `rdf:type` are skipped. Either every
/// entity is attached or the document is left unchanged.
pub fn read_triples(input: &[u8], doc: &mut Document) -> SbolResult<()> {
    let triples = parse(input)?;
    let mut staged = doc.clone();
    let added = attach(triples, &mut staged)?;
    *doc = staged;
    debug!("Read {} entities from N-Triples", added);
    Ok(())
}

/// Parse N-Triples into triples, in document order
///
/// Blank nodes and literals whose datatype has no [`ValueKind`] are rejected.
/// Language-tagged literals become text.
pub fn parse(input: &[u8]) -> SbolResult<Vec<Triple>> {
    NTriplesParser::new()
        .for_slice(input)
        .map(|parsed| -> SbolResult<Triple> {
            let triple = parsed.map_err(|e| SbolError::invalid(format!("N-Triples: {e}")))?;
            let subject = match triple.subject {
                NamedOrBlankNode::NamedNode(node) => node.into_string(),
                other => return Err(SbolError::invalid(format!("unsupported subject {other}"))),
            };
            Ok(Triple {
                subject,
                predicate: triple.predicate.into_string(),
                object: object_value(triple.object)?,
            })
        })
        .collect()
}

fn object_value(term: Term) -> SbolResult<PropertyValue> {
    match term {
        Term::NamedNode(node) => Ok(PropertyValue::Uri(node.into_string())),
        Term::Literal(literal) => literal_value(&literal),
        other => Err(SbolError::invalid(format!("unsupported object {other}"))),
    }
}

fn literal_value(literal: &Literal) -> SbolResult<PropertyValue> {
    let lexical = literal.value();
    if literal.language().is_some() {
        return Ok(PropertyValue::text(lexical));
    }
    let datatype = literal.datatype();
    let kind = ValueKind::from_datatype(datatype.as_str())
        .ok_or_else(|| SbolError::invalid(format!("unsupported datatype {datatype}")))?;
    let value = match kind {
        ValueKind::Text => PropertyValue::text(lexical),
        ValueKind::Integer => PropertyValue::Integer(
            lexical
                .trim()
                .parse()
                .map_err(|_| SbolError::invalid(format!("'{lexical}' is not an integer")))?,
        ),
        ValueKind::Float => PropertyValue::Float(
            lexical
                .trim()
                .parse()
                .map_err(|_| SbolError::invalid(format!("'{lexical}' is not a double")))?,
        ),
        ValueKind::Boolean => match lexical.trim() {
            "true" | "1" => PropertyValue::Boolean(true),
            "false" | "0" => PropertyValue::Boolean(false),
            _ => return Err(SbolError::invalid(format!("'{lexical}' is not a boolean"))),
        },
        ValueKind::Uri => return Err(SbolError::invalid("IRIs cannot be typed literals")),
    };
    Ok(value)
}

#[derive(Default)]
struct Subject {
    types: Vec<String>,
    statements: Vec<(String, PropertyValue)>,
}

fn attach(triples: Vec<Triple>, doc: &mut Document) -> SbolResult<usize> {
    let mut subjects: IndexMap<String, Subject> = IndexMap::new();
    for triple in triples {
        let subject = subjects.entry(triple.subject).or_default();
        match triple.object {
            PropertyValue::Uri(type_uri) if triple.predicate == RDF_TYPE => subject.types.push(type_uri),
            object => subject.statements.push((triple.predicate, object)),
        }
    }

    let policy = RulePolicy::from(doc.config());
    let mut entities: IndexMap<String, Entity> = IndexMap::new();
    let mut links: Vec<(String, &'static str, String)> = Vec::new();

    for (identity, subject) in subjects {
        let Some(schema) = subject.types.iter().find_map(|t| doc.registry().get(t)) else {
            warn!(
                "Skipping {}: no registered type among {:?}",
                identity, subject.types
            );
            continue;
        };

        let mut stored: IndexMap<&'static str, Vec<PropertyValue>> = IndexMap::new();
        let mut annotations: IndexMap<String, Vec<PropertyValue>> = IndexMap::new();
        for type_uri in subject.types.into_iter().filter(|t| t != schema.type_uri) {
            annotations
                .entry(RDF_TYPE.to_string())
                .or_default()
                .push(PropertyValue::Uri(type_uri));
        }
        for (predicate, value) in subject.statements {
            if let Some(descriptor) = schema.property(&predicate) {
                let value = match (descriptor.kind, value) {
                    (ValueKind::Float, PropertyValue::Integer(n)) => PropertyValue::Float(n as f64),
                    (_, value) => value,
                };
                stored.entry(descriptor.predicate).or_default().push(value);
            } else if let Some(container) = schema.container(&predicate) {
                match value {
                    PropertyValue::Uri(child) => links.push((identity.clone(), container.predicate, child)),
                    other => {
                        return Err(SbolError::invalid(format!(
                            "{identity}: <{predicate}> must reference a child, found {other}"
                        )))
                    }
                }
            } else {
                annotations.entry(predicate).or_default().push(value);
            }
        }

        let entity = Entity::from_stored(schema, identity.clone(), policy, stored.into_iter().collect(), annotations)?;
        entities.insert(identity, entity);
    }

    let mut owned = HashSet::new();
    for (parent, predicate, child) in &links {
        let predicate: &'static str = *predicate;
        let (Some(parent_id), Some(child_id)) = (
            entities.get(parent).map(Entity::id),
            entities.get(child).map(Entity::id),
        ) else {
            warn!("Skipping <{}> link from {} to unknown {}", predicate, parent, child);
            continue;
        };
        if !owned.insert(child.clone()) {
            return Err(SbolError::invalid(format!("{child} is owned more than once")));
        }
        let child_entity = entities
            .get_mut(child)
            .ok_or_else(|| SbolError::not_found(child.clone()))?;
        child_entity.owner = Some(Owner {
            parent: parent_id,
            predicate,
        });
        let accepts = entities
            .get(parent)
            .and_then(|p| p.schema().container(predicate))
            .map(|c| c.accepts);
        let child_schema = entities
            .get(child)
            .map(Entity::schema)
            .ok_or_else(|| SbolError::not_found(child.clone()))?;
        if let Some(accepts) = accepts {
            if !child_schema.satisfies(accepts) {
                return Err(SbolError::TypeMismatch {
                    expected: accepts.to_string(),
                    found: child_schema.type_uri.to_string(),
                });
            }
        }
        let parent_entity = entities
            .get_mut(parent)
            .ok_or_else(|| SbolError::not_found(parent.clone()))?;
        parent_entity.children.entry(predicate).or_default().push(child_id);
    }

    for entity in entities.values() {
        for (container, ids) in entity.containers() {
            if !container.cardinality().allows(ids.len()) {
                return Err(SbolError::CardinalityViolation {
                    predicate: container.predicate.to_string(),
                    count: ids.len(),
                    lower: 0,
                    upper: container.cardinality().upper_label(),
                });
            }
        }
    }

    let by_id: HashMap<EntityId, String> = entities
        .iter()
        .map(|(identity, entity)| (entity.id(), identity.clone()))
        .collect();
    let roots: Vec<String> = entities
        .iter()
        .filter(|(identity, _)| !owned.contains(*identity))
        .map(|(identity, _)| identity.clone())
        .collect();

    let mut added = 0;
    for root in roots {
        let mut order = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(identity) = stack.pop() {
            let Some(entity) = entities.get(&identity) else {
                continue;
            };
            let children: Vec<String> = entity
                .containers()
                .flat_map(|(_, ids)| ids.iter().filter_map(|id| by_id.get(id).cloned()))
                .collect();
            stack.extend(children.into_iter().rev());
            order.push(identity);
        }

        let nodes: Vec<Entity> = order
            .iter()
            .filter_map(|identity| entities.swap_remove(identity))
            .collect();
        if let Some(first) = nodes.first() {
            if !first.schema().top_level {
                return Err(SbolError::invalid(format!("{} has no owner and is not top-level", root)));
            }
        }
        added += nodes.len();
        doc.insert_subtree(None, nodes)?;
    }

    if let Some(identity) = entities.keys().next() {
        return Err(SbolError::invalid(format!("{identity} is part of an ownership cycle")));
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entities::{component_definition, measurement, module_definition};
    use crate::value_objects::vocabulary::*;

    fn config() -> Config {
        Config::default().with_homespace("http://sbols.org/test").unwrap()
    }

    #[test]
    fn test_parse_escaped_literal() {
        let triples = parse(
            br#"<http://x.org/a> <http://purl.org/dc/terms/title> "say \"hi\"\n"^^<http://www.w3.org/2001/XMLSchema#string> ."#,
        )
        .unwrap();

        assert_eq!(triples[0].subject, "http://x.org/a");
        assert_eq!(triples[0].object, PropertyValue::text("say \"hi\"\n"));
    }

    #[test]
    fn test_parse_unicode_escapes_and_language_tags() {
        let input = concat!(
            r#"<http://x.org/a> <http://purl.org/dc/terms/title> "caf\u00E9" ."#,
            "\n",
            r#"<http://x.org/a> <http://purl.org/dc/terms/description> "gr\U000000FCn"@de ."#,
            "\n",
        );

        let triples = parse(input.as_bytes()).unwrap();

        assert_eq!(triples[0].object, PropertyValue::text("caf\u{e9}"));
        assert_eq!(triples[1].object, PropertyValue::text("gr\u{fc}n"));
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let triples = parse(b"# header\n\n<http://x.org/a> <http://x.org/p> <http://x.org/b> .\n").unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let err = parse(b"<http://x.org/a> <http://x.org/p> <http://x.org/b>\n").unwrap_err();
        assert!(matches!(err, SbolError::InvalidArgument(msg) if msg.starts_with("N-Triples")));

        assert!(parse(b"<a> <http://x.org/p> <http://x.org/b> .").is_err());
        assert!(parse(b"_:b0 <http://x.org/p> <http://x.org/b> .").is_err());
        assert!(parse(br#"<http://x.org/a> <http://x.org/p> "x"^^<http://x.org/dt> ."#).is_err());
        assert!(parse(br#"<http://x.org/a> <http://x.org/p> "x"^^<http://www.w3.org/2001/XMLSchema#integer> ."#).is_err());
    }

    #[test]
    fn test_triple_display() {
        let triple = Triple::new("http://x.org/a", OM_HAS_NUMERICAL_VALUE, PropertyValue::Float(2.0));
        assert_eq!(
            triple.to_string(),
            format!("<http://x.org/a> <{OM_HAS_NUMERICAL_VALUE}> \"2.0\"^^<{XSD_DOUBLE}> .")
        );
    }

    #[test]
    fn test_document_survives_write_and_read() {
        let config = config();
        let mut doc = Document::new(config.clone());
        let md = doc.add(module_definition::new(&config, "toggle").unwrap()).unwrap();
        let m = measurement::new(&config, "m1", 3.0, "http://www.ontology-of-units-of-measure.org/resource/om-2/molar")
            .unwrap();
        let interaction = doc
            .add_child(md, SBOL_INTERACTIONS, crate::entities::interaction::new(&config, "i1").unwrap())
            .unwrap();
        doc.add_child(interaction, SBOL_MEASUREMENTS, m).unwrap();
        doc.add(component_definition::new(&config, "lacI").unwrap()).unwrap();

        let bytes = write_triples(&doc).unwrap();
        let mut copy = Document::new(config);
        read_triples(&bytes, &mut copy).unwrap();

        assert_eq!(copy.len(), doc.len());
        assert_eq!(copy.triples(), doc.triples());
        let i1 = copy.lookup("http://sbols.org/test/toggle/i1").unwrap();
        assert_eq!(copy.parent_of(i1.id()).unwrap().unwrap().identity(), "http://sbols.org/test/toggle");
    }

    #[test]
    fn test_integer_literal_coerced_for_float_slot() {
        let input = format!(
            "<http://x.org/m> <{RDF_TYPE}> <{OM_MEASURE}> .\n\
             <http://x.org/m> <{OM_HAS_NUMERICAL_VALUE}> \"4\"^^<{XSD_INTEGER}> .\n\
             <http://x.org/m> <{OM_HAS_UNIT}> <http://x.org/unit> .\n\
             <http://x.org/md> <{RDF_TYPE}> <{SBOL_MODULE_DEFINITION}> .\n\
             <http://x.org/md> <{SBOL_INTERACTIONS}> <http://x.org/i> .\n\
             <http://x.org/i> <{RDF_TYPE}> <{SBOL_INTERACTION}> .\n\
             <http://x.org/i> <{SBOL_MEASUREMENTS}> <http://x.org/m> .\n"
        );
        let mut doc = Document::new(config());
        read_triples(input.as_bytes(), &mut doc).unwrap();

        let m = doc.lookup("http://x.org/m").unwrap();
        assert_eq!(m.values(OM_HAS_NUMERICAL_VALUE).unwrap(), &[PropertyValue::Float(4.0)]);
    }

    #[test]
    fn test_unknown_type_skipped_and_annotations_kept() {
        let input = format!(
            "<http://x.org/x> <{RDF_TYPE}> <http://x.org/Unknown> .\n\
             <http://x.org/cd> <{RDF_TYPE}> <{SBOL_COMPONENT_DEFINITION}> .\n\
             <http://x.org/cd> <http://x.org/lab#owner> \"bench\" .\n"
        );
        let mut doc = Document::new(config());
        read_triples(input.as_bytes(), &mut doc).unwrap();

        assert!(!doc.contains("http://x.org/x"));
        let cd = doc.lookup("http://x.org/cd").unwrap();
        let annotations: Vec<_> = cd.annotations().collect();
        assert_eq!(annotations, vec![("http://x.org/lab#owner", &[PropertyValue::text("bench")][..])]);
        assert_eq!(cd.values(SBOL_TYPES).unwrap(), &[PropertyValue::uri(BIOPAX_DNA)]);
    }

    #[test]
    fn test_first_registered_type_wins() {
        let input = format!(
            "<http://x.org/cd> <{RDF_TYPE}> <http://x.org/lab#Plasmid> .\n\
             <http://x.org/cd> <{RDF_TYPE}> <{SBOL_COMPONENT_DEFINITION}> .\n\
             <http://x.org/cd> <{RDF_TYPE}> <{SBOL_MODULE_DEFINITION}> .\n"
        );
        let mut doc = Document::new(config());
        read_triples(input.as_bytes(), &mut doc).unwrap();

        let cd = doc.lookup("http://x.org/cd").unwrap();
        assert_eq!(cd.type_uri(), SBOL_COMPONENT_DEFINITION);
        let annotations: Vec<_> = cd.annotations().collect();
        assert_eq!(
            annotations,
            vec![(
                RDF_TYPE,
                &[
                    PropertyValue::uri("http://x.org/lab#Plasmid"),
                    PropertyValue::uri(SBOL_MODULE_DEFINITION)
                ][..]
            )]
        );

        let mut copy = Document::new(config());
        read_triples(&write_triples(&doc).unwrap(), &mut copy).unwrap();
        assert_eq!(copy.triples(), doc.triples());
    }

    #[test]
    fn test_failed_read_leaves_document() {
        let config = config();
        let mut doc = Document::new(config.clone());
        doc.add(component_definition::new(&config, "cd").unwrap()).unwrap();
        let input = format!(
            "<http://x.org/a> <{RDF_TYPE}> <{SBOL_COMPONENT_DEFINITION}> .\n\
             <http://sbols.org/test/cd> <{RDF_TYPE}> <{SBOL_COMPONENT_DEFINITION}> .\n"
        );

        let err = read_triples(input.as_bytes(), &mut doc).unwrap_err();
        assert!(matches!(err, SbolError::DuplicateIdentity(_)));
        assert!(!doc.contains("http://x.org/a"));
        assert_eq!(doc.len(), 1);
    }
}
