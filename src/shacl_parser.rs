//! SHACL Turtle reader.
//!
//! Parses Turtle text into a [`ShaclSchema`] by loading the triples into a
//! small in-memory store (uses `oxttl`/`oxrdf`) and walking every
//! `sh:NodeShape` subject.

use std::collections::HashMap;
use std::fmt;

use oxrdf::{NamedOrBlankNode, Term};
use oxttl::TurtleParser;
use tracing::warn;

use crate::common::{
    Iri, Literal, NodeKind, Path, Prefix, RDF_FIRST, RDF_NIL, RDF_REST, RDF_TYPE, Value, sh,
};
use crate::shacl_model::{NodeShape, PropertyShape, ShaclSchema};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

// ── Error type ───────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ShaclParseError {
    /// Surfaced from the Turtle library as-is.
    Turtle(String),
    MissingField(String),
}

impl fmt::Display for ShaclParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaclParseError::Turtle(e) => write!(f, "Turtle parse error: {e}"),
            ShaclParseError::MissingField(msg) => write!(f, "Missing required field: {msg}"),
        }
    }
}

impl std::error::Error for ShaclParseError {}

// ── Triple store ─────────────────────────────────────────────────────

/// Simple in-memory triple store for walking parsed RDF.
struct TripleStore {
    /// All triples indexed by subject string.
    by_subject: HashMap<String, Vec<(String, Term)>>,
    /// Subjects in first-seen document order, so shape output is stable.
    subject_order: Vec<String>,
    prefixes: Vec<Prefix>,
}

impl TripleStore {
    fn parse(ttl: &str) -> Result<Self, ShaclParseError> {
        let mut by_subject: HashMap<String, Vec<(String, Term)>> = HashMap::new();
        let mut subject_order = Vec::new();
        let mut parser = TurtleParser::new().for_reader(ttl.as_bytes());
        for result in &mut parser {
            let triple = result.map_err(|e| ShaclParseError::Turtle(e.to_string()))?;
            let subj_key = subject_key(&triple.subject);
            by_subject
                .entry(subj_key.clone())
                .or_insert_with(|| {
                    subject_order.push(subj_key);
                    Vec::new()
                })
                .push((triple.predicate.as_str().to_owned(), triple.object));
        }
        let prefixes = parser
            .prefixes()
            .map(|(name, iri)| Prefix::new(name, iri))
            .collect();
        Ok(Self {
            by_subject,
            subject_order,
            prefixes,
        })
    }

    fn objects(&self, subject: &str, predicate: &str) -> Vec<&Term> {
        self.by_subject
            .get(subject)
            .map(|pairs| {
                pairs
                    .iter()
                    .filter(|(p, _)| p == predicate)
                    .map(|(_, o)| o)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn first_object(&self, subject: &str, predicate: &str) -> Option<&Term> {
        self.objects(subject, predicate).into_iter().next()
    }

    fn first_iri(&self, subject: &str, predicate: &str) -> Option<Iri> {
        self.first_object(subject, predicate).and_then(|t| match t {
            Term::NamedNode(n) => Some(Iri::new(n.as_str())),
            _ => None,
        })
    }

    fn first_literal(&self, subject: &str, predicate: &str) -> Option<String> {
        self.first_object(subject, predicate).and_then(|t| match t {
            Term::Literal(lit) => Some(lit.value().to_owned()),
            _ => None,
        })
    }

    /// Collect an RDF list (rdf:first/rdf:rest chain) starting from a term.
    fn collect_rdf_list<'a>(&'a self, head: &'a Term) -> Vec<&'a Term> {
        let mut result = Vec::new();
        let mut current = head;
        loop {
            let key = term_key(current);
            if key == RDF_NIL {
                break;
            }
            if let Some(first) = self.first_object(&key, RDF_FIRST) {
                result.push(first);
            } else {
                break;
            }
            if let Some(rest) = self.first_object(&key, RDF_REST) {
                current = rest;
            } else {
                break;
            }
        }
        result
    }
}

fn subject_key(s: &NamedOrBlankNode) -> String {
    match s {
        NamedOrBlankNode::NamedNode(n) => n.as_str().to_owned(),
        NamedOrBlankNode::BlankNode(b) => format!("_:{}", b.as_str()),
    }
}

#[allow(unreachable_patterns)]
fn term_key(t: &Term) -> String {
    match t {
        Term::NamedNode(n) => n.as_str().to_owned(),
        Term::BlankNode(b) => format!("_:{}", b.as_str()),
        Term::Literal(l) => l.value().to_owned(),
        _ => String::new(),
    }
}

#[allow(unreachable_patterns)]
fn term_to_value(t: &Term) -> Option<Value> {
    match t {
        Term::NamedNode(n) => Some(Value::Iri(Iri::new(n.as_str()))),
        Term::Literal(l) => {
            let language = l.language().map(str::to_owned);
            let datatype = if language.is_some() || l.datatype().as_str() == XSD_STRING {
                None
            } else {
                Some(Iri::new(l.datatype().as_str()))
            };
            Some(Value::Literal(Literal {
                value: l.value().to_owned(),
                datatype,
                language,
            }))
        }
        _ => None,
    }
}

// ── Public API ───────────────────────────────────────────────────────

/// Parse SHACL Turtle text into a [`ShaclSchema`].
pub fn parse_shacl(ttl: &str) -> Result<ShaclSchema, ShaclParseError> {
    let store = TripleStore::parse(ttl)?;
    let mut shapes = Vec::new();

    for subj in &store.subject_order {
        let is_node_shape = store
            .objects(subj, RDF_TYPE)
            .iter()
            .any(|o| term_key(o) == sh("NodeShape"));
        if !is_node_shape {
            continue;
        }

        let target_class = store.first_iri(subj, &sh("targetClass"));

        let closed = store
            .first_literal(subj, &sh("closed"))
            .map(|s| s == "true")
            .unwrap_or(false);

        let ignored_properties = store
            .first_object(subj, &sh("ignoredProperties"))
            .map(|head| {
                store
                    .collect_rdf_list(head)
                    .into_iter()
                    .filter_map(|t| match t {
                        Term::NamedNode(n) => Some(Iri::new(n.as_str())),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let mut properties = Vec::new();
        for prop_node in store.objects(subj, &sh("property")) {
            match parse_property_shape(&store, &term_key(prop_node))? {
                Some(ps) => properties.push(ps),
                None => warn!(shape = %subj, "skipped property shape with unsupported path"),
            }
        }

        shapes.push(NodeShape {
            iri: Iri::new(subj.clone()),
            target_class,
            properties,
            closed,
            ignored_properties,
        });
    }

    Ok(ShaclSchema {
        shapes,
        prefixes: store.prefixes,
    })
}

/// Parse one property shape node. Returns `None` for paths outside the
/// single-predicate subset (a structural warning, not an error).
fn parse_property_shape(
    store: &TripleStore,
    key: &str,
) -> Result<Option<PropertyShape>, ShaclParseError> {
    let path_term = store.first_object(key, &sh("path")).ok_or_else(|| {
        ShaclParseError::MissingField(format!("sh:path missing on property shape {key}"))
    })?;
    let path = match parse_path(store, path_term) {
        Some(path) => path,
        None => return Ok(None),
    };

    let mut ps = PropertyShape {
        path,
        ..PropertyShape::default()
    };

    ps.datatype = store.first_iri(key, &sh("datatype"));

    // sh:class — either a plain class IRI or a blank node carrying
    // sh:or ( class… ).
    match store.first_object(key, &sh("class")) {
        Some(Term::NamedNode(n)) => ps.class = Some(Iri::new(n.as_str())),
        Some(class_term @ Term::BlankNode(_)) => {
            let class_key = term_key(class_term);
            if let Some(or_head) = store.first_object(&class_key, &sh("or")) {
                let classes: Vec<Iri> = store
                    .collect_rdf_list(or_head)
                    .into_iter()
                    .filter_map(|t| match t {
                        Term::NamedNode(n) => Some(Iri::new(n.as_str())),
                        _ => None,
                    })
                    .collect();
                if !classes.is_empty() {
                    ps.or_classes = Some(classes);
                }
            }
        }
        _ => {}
    }

    ps.node_kind = store
        .first_object(key, &sh("nodeKind"))
        .and_then(node_kind_from_term);

    ps.min_count = store
        .first_literal(key, &sh("minCount"))
        .and_then(|s| s.parse::<u32>().ok());
    ps.max_count = store
        .first_literal(key, &sh("maxCount"))
        .and_then(|s| s.parse::<u32>().ok());

    ps.pattern = store.first_literal(key, &sh("pattern"));

    ps.has_value = store
        .first_object(key, &sh("hasValue"))
        .and_then(term_to_value);

    if let Some(in_head) = store.first_object(key, &sh("in")) {
        let values: Vec<Value> = store
            .collect_rdf_list(in_head)
            .into_iter()
            .filter_map(term_to_value)
            .collect();
        ps.in_values = Some(values);
    }

    ps.node = store.first_iri(key, &sh("node"));

    Ok(Some(ps))
}

/// A path IRI, or `[ sh:inversePath <iri> ]`. Anything else (sequences,
/// alternatives) is outside the subset.
fn parse_path(store: &TripleStore, term: &Term) -> Option<Path> {
    match term {
        Term::NamedNode(n) => Some(Path::direct(n.as_str())),
        Term::BlankNode(_) => {
            let key = term_key(term);
            match store.first_object(&key, &sh("inversePath")) {
                Some(Term::NamedNode(n)) => Some(Path {
                    iri: Iri::new(n.as_str()),
                    inverse: true,
                }),
                _ => None,
            }
        }
        _ => None,
    }
}

fn node_kind_from_term(term: &Term) -> Option<NodeKind> {
    let key = term_key(term);
    let local = key.strip_prefix(crate::common::SH)?;
    NodeKind::from_label(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MaxCard;

    const PERSON_TTL: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
@prefix schema: <http://schema.org/> .
@prefix shapes: <http://shaclshapes.org/> .

shapes:PersonShape
  a sh:NodeShape ;
  sh:targetClass schema:Person ;
  sh:property [
    sh:path rdf:type ;
    sh:hasValue schema:Person ;
    sh:minCount 1 ;
    sh:maxCount 1 ;
  ] ;
  sh:property [
    sh:path schema:name ;
    sh:datatype xsd:string ;
    sh:minCount 1 ;
  ] ;
  sh:property [
    sh:path schema:birthPlace ;
    sh:class schema:Place ;
  ] .
"#;

    const UNION_TTL: &str = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix shapes: <http://shaclshapes.org/> .

shapes:EventShape
  a sh:NodeShape ;
  sh:targetClass schema:Event ;
  sh:property [
    sh:path schema:organizer ;
    sh:class [ sh:or ( schema:Organization schema:Person ) ] ;
  ] .
"#;

    #[test]
    fn test_parse_node_shape() {
        let schema = parse_shacl(PERSON_TTL).unwrap();
        assert_eq!(schema.shapes.len(), 1);
        let shape = &schema.shapes[0];
        assert_eq!(shape.iri.as_str(), "http://shaclshapes.org/PersonShape");
        assert_eq!(
            shape.target_class.as_ref().unwrap().as_str(),
            "http://schema.org/Person"
        );
        assert!(!shape.closed);
        assert_eq!(shape.properties.len(), 3);
    }

    #[test]
    fn test_parse_property_constraints() {
        let schema = parse_shacl(PERSON_TTL).unwrap();
        let shape = &schema.shapes[0];

        let name = shape
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://schema.org/name")
            .unwrap();
        assert_eq!(
            name.datatype.as_ref().unwrap().as_str(),
            "http://www.w3.org/2001/XMLSchema#string"
        );
        assert_eq!(name.min_count, Some(1));
        assert_eq!(name.max_count, None);

        let birth = shape
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://schema.org/birthPlace")
            .unwrap();
        assert_eq!(
            birth.class.as_ref().unwrap().as_str(),
            "http://schema.org/Place"
        );
    }

    #[test]
    fn test_parse_has_value() {
        let schema = parse_shacl(PERSON_TTL).unwrap();
        let typing = &schema.shapes[0].properties[0];
        assert_eq!(typing.path.iri.as_str(), RDF_TYPE);
        assert_eq!(
            typing.has_value,
            Some(Value::Iri(Iri::new("http://schema.org/Person")))
        );
        assert_eq!(typing.cardinality().max, Some(MaxCard::Bounded(1)));
    }

    #[test]
    fn test_parse_class_union() {
        let schema = parse_shacl(UNION_TTL).unwrap();
        let prop = &schema.shapes[0].properties[0];
        let classes = prop.or_classes.as_ref().unwrap();
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].as_str(), "http://schema.org/Organization");
        assert_eq!(classes[1].as_str(), "http://schema.org/Person");
        assert!(prop.class.is_none());
    }

    #[test]
    fn test_parse_in_list() {
        let ttl = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix shapes: <http://shaclshapes.org/> .

shapes:GenderShape
  a sh:NodeShape ;
  sh:targetClass schema:Person ;
  sh:property [
    sh:path schema:gender ;
    sh:in ( schema:Male schema:Female ) ;
  ] .
"#;
        let schema = parse_shacl(ttl).unwrap();
        let prop = &schema.shapes[0].properties[0];
        let values = prop.in_values.as_ref().unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], Value::Iri(Iri::new("http://schema.org/Male")));
    }

    #[test]
    fn test_parse_prefixes() {
        let schema = parse_shacl(PERSON_TTL).unwrap();
        assert!(
            schema
                .prefixes
                .iter()
                .any(|p| p.name == "schema" && p.iri == "http://schema.org/")
        );
    }

    #[test]
    fn test_parse_inverse_path() {
        let ttl = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix schema: <http://schema.org/> .
@prefix shapes: <http://shaclshapes.org/> .

shapes:ChildShape
  a sh:NodeShape ;
  sh:property [
    sh:path [ sh:inversePath schema:parent ] ;
    sh:minCount 1 ;
  ] .
"#;
        let schema = parse_shacl(ttl).unwrap();
        let prop = &schema.shapes[0].properties[0];
        assert!(prop.path.inverse);
        assert_eq!(prop.path.iri.as_str(), "http://schema.org/parent");
    }

    #[test]
    fn test_bad_turtle_is_an_error() {
        let result = parse_shacl("@prefix sh: <http://www.w3.org/ns/shacl#> \nbroken");
        assert!(matches!(result, Err(ShaclParseError::Turtle(_))));
    }

    #[test]
    fn test_language_tagged_literal() {
        let ttl = r#"
@prefix sh: <http://www.w3.org/ns/shacl#> .
@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
@prefix shapes: <http://shaclshapes.org/> .

shapes:LabelShape
  a sh:NodeShape ;
  sh:property [
    sh:path rdfs:label ;
    sh:hasValue "hello"@en ;
  ] .
"#;
        let schema = parse_shacl(ttl).unwrap();
        match schema.shapes[0].properties[0].has_value.as_ref().unwrap() {
            Value::Literal(lit) => {
                assert_eq!(lit.value, "hello");
                assert_eq!(lit.language.as_deref(), Some("en"));
                assert!(lit.datatype.is_none());
            }
            other => panic!("expected literal, got {other:?}"),
        }
    }
}
