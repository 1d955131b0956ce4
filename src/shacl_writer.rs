//! SHACL Turtle writer.
//!
//! Materializes a [`ShaclSchema`] as triples and serializes them with
//! `oxttl` (uses `oxrdf` terms). The whole document is buffered into a
//! string; callers decide where it goes. Blank node labels are generated
//! sequentially so output is reproducible.

use std::fmt;

use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Literal as RdfLiteral, NamedNode, Term, Triple};
use oxttl::TurtleSerializer;

use crate::common::{Iri, NodeKind, Prefix, Value, sh, standard_shacl_prefixes};
use crate::shacl_model::{NodeShape, PropertyShape, ShaclSchema};

#[derive(Debug)]
pub enum ShaclWriteError {
    InvalidIri(String),
    InvalidLanguageTag(String),
    Io(std::io::Error),
}

impl fmt::Display for ShaclWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaclWriteError::InvalidIri(msg) => write!(f, "invalid IRI: {msg}"),
            ShaclWriteError::InvalidLanguageTag(msg) => {
                write!(f, "invalid language tag: {msg}")
            }
            ShaclWriteError::Io(e) => write!(f, "serialization I/O error: {e}"),
        }
    }
}

impl std::error::Error for ShaclWriteError {}

impl From<std::io::Error> for ShaclWriteError {
    fn from(e: std::io::Error) -> Self {
        ShaclWriteError::Io(e)
    }
}

/// Sequential blank node labels, for reproducible output.
struct BnodeGen {
    next: usize,
}

impl BnodeGen {
    fn new() -> Self {
        BnodeGen { next: 0 }
    }

    fn fresh(&mut self) -> BlankNode {
        let node = BlankNode::new_unchecked(format!("b{}", self.next));
        self.next += 1;
        node
    }
}

fn named(iri: &Iri) -> Result<NamedNode, ShaclWriteError> {
    NamedNode::new(iri.as_str())
        .map_err(|e| ShaclWriteError::InvalidIri(format!("{}: {e}", iri.as_str())))
}

fn sh_named(local: &str) -> NamedNode {
    NamedNode::new_unchecked(sh(local))
}

fn value_term(value: &Value) -> Result<Term, ShaclWriteError> {
    match value {
        Value::Iri(iri) => Ok(named(iri)?.into()),
        Value::Literal(lit) => {
            if let Some(language) = &lit.language {
                let literal = RdfLiteral::new_language_tagged_literal(&lit.value, language)
                    .map_err(|e| {
                        ShaclWriteError::InvalidLanguageTag(format!("{language}: {e}"))
                    })?;
                Ok(literal.into())
            } else if let Some(datatype) = &lit.datatype {
                Ok(RdfLiteral::new_typed_literal(&lit.value, named(datatype)?).into())
            } else {
                Ok(RdfLiteral::new_simple_literal(&lit.value).into())
            }
        }
    }
}

fn integer_literal(n: u32) -> Term {
    RdfLiteral::new_typed_literal(n.to_string(), xsd::INTEGER).into()
}

/// Materialize an RDF collection; returns the list head.
fn rdf_list(items: Vec<Term>, bnodes: &mut BnodeGen, triples: &mut Vec<Triple>) -> Term {
    let mut head: Term = NamedNode::from(rdf::NIL).into();
    for item in items.into_iter().rev() {
        let cell = bnodes.fresh();
        triples.push(Triple::new(cell.clone(), NamedNode::from(rdf::FIRST), item));
        triples.push(Triple::new(cell.clone(), NamedNode::from(rdf::REST), head));
        head = cell.into();
    }
    head
}

fn node_kind_term(kind: NodeKind) -> Term {
    sh_named(kind.label()).into()
}

fn add_property_shape(
    shape_node: &NamedNode,
    ps: &PropertyShape,
    bnodes: &mut BnodeGen,
    triples: &mut Vec<Triple>,
) -> Result<(), ShaclWriteError> {
    let prop = bnodes.fresh();
    triples.push(Triple::new(
        shape_node.clone(),
        sh_named("property"),
        prop.clone(),
    ));

    let path_term: Term = if ps.path.inverse {
        let inverse_node = bnodes.fresh();
        triples.push(Triple::new(
            inverse_node.clone(),
            sh_named("inversePath"),
            named(&ps.path.iri)?,
        ));
        inverse_node.into()
    } else {
        named(&ps.path.iri)?.into()
    };
    triples.push(Triple::new(prop.clone(), sh_named("path"), path_term));

    if let Some(datatype) = &ps.datatype {
        triples.push(Triple::new(
            prop.clone(),
            sh_named("datatype"),
            named(datatype)?,
        ));
    }

    if let Some(class) = &ps.class {
        triples.push(Triple::new(prop.clone(), sh_named("class"), named(class)?));
    }

    if let Some(kind) = ps.node_kind {
        triples.push(Triple::new(
            prop.clone(),
            sh_named("nodeKind"),
            node_kind_term(kind),
        ));
    }

    if let Some(min) = ps.min_count {
        triples.push(Triple::new(
            prop.clone(),
            sh_named("minCount"),
            integer_literal(min),
        ));
    }

    if let Some(max) = ps.max_count {
        triples.push(Triple::new(
            prop.clone(),
            sh_named("maxCount"),
            integer_literal(max),
        ));
    }

    if let Some(pattern) = &ps.pattern {
        triples.push(Triple::new(
            prop.clone(),
            sh_named("pattern"),
            RdfLiteral::new_simple_literal(pattern),
        ));
    }

    if let Some(value) = &ps.has_value {
        triples.push(Triple::new(
            prop.clone(),
            sh_named("hasValue"),
            value_term(value)?,
        ));
    }

    if let Some(values) = &ps.in_values {
        let items = values
            .iter()
            .map(value_term)
            .collect::<Result<Vec<_>, _>>()?;
        let head = rdf_list(items, bnodes, triples);
        triples.push(Triple::new(prop.clone(), sh_named("in"), head));
    }

    if let Some(node) = &ps.node {
        triples.push(Triple::new(prop.clone(), sh_named("node"), named(node)?));
    }

    if let Some(classes) = &ps.or_classes {
        let items = classes
            .iter()
            .map(|c| named(c).map(Term::from))
            .collect::<Result<Vec<_>, _>>()?;
        let list_head = rdf_list(items, bnodes, triples);
        let or_node = bnodes.fresh();
        triples.push(Triple::new(or_node.clone(), sh_named("or"), list_head));
        triples.push(Triple::new(prop.clone(), sh_named("class"), or_node));
    }

    Ok(())
}

fn add_node_shape(
    shape: &NodeShape,
    bnodes: &mut BnodeGen,
    triples: &mut Vec<Triple>,
) -> Result<(), ShaclWriteError> {
    let shape_node = named(&shape.iri)?;
    triples.push(Triple::new(
        shape_node.clone(),
        NamedNode::from(rdf::TYPE),
        sh_named("NodeShape"),
    ));

    if let Some(target) = &shape.target_class {
        triples.push(Triple::new(
            shape_node.clone(),
            sh_named("targetClass"),
            named(target)?,
        ));
    }

    if shape.closed {
        triples.push(Triple::new(
            shape_node.clone(),
            sh_named("closed"),
            RdfLiteral::new_typed_literal("true", xsd::BOOLEAN),
        ));
    }

    if !shape.ignored_properties.is_empty() {
        let items = shape
            .ignored_properties
            .iter()
            .map(|iri| named(iri).map(Term::from))
            .collect::<Result<Vec<_>, _>>()?;
        let head = rdf_list(items, bnodes, triples);
        triples.push(Triple::new(
            shape_node.clone(),
            sh_named("ignoredProperties"),
            head,
        ));
    }

    for ps in &shape.properties {
        add_property_shape(&shape_node, ps, bnodes, triples)?;
    }

    Ok(())
}

/// Prefixes to bind: the stable standard set first (so `schema` stays on
/// the HTTP form), then source prefixes with free names.
fn prefix_bindings(prefixes: &[Prefix]) -> Vec<Prefix> {
    let mut bindings = standard_shacl_prefixes();
    for prefix in prefixes {
        if !prefix.name.is_empty() && !bindings.iter().any(|b| b.name == prefix.name) {
            bindings.push(prefix.clone());
        }
    }
    bindings
}

/// Serialize a [`ShaclSchema`] to Turtle text.
pub fn serialize_shacl(schema: &ShaclSchema) -> Result<String, ShaclWriteError> {
    let mut triples: Vec<Triple> = Vec::new();
    let mut bnodes = BnodeGen::new();
    for shape in &schema.shapes {
        add_node_shape(shape, &mut bnodes, &mut triples)?;
    }

    let mut serializer = TurtleSerializer::new();
    for prefix in prefix_bindings(&schema.prefixes) {
        serializer = serializer
            .with_prefix(&prefix.name, &prefix.iri)
            .map_err(|e| ShaclWriteError::InvalidIri(format!("{}: {e}", prefix.iri)))?;
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in &triples {
        writer.serialize_triple(triple)?;
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Path;
    use crate::shacl_parser::parse_shacl;

    fn person_schema() -> ShaclSchema {
        let mut typing = PropertyShape::with_path(crate::common::RDF_TYPE);
        typing.has_value = Some(Value::Iri(Iri::new("http://schema.org/Person")));
        typing.min_count = Some(1);
        typing.max_count = Some(1);

        let mut name = PropertyShape::with_path("http://schema.org/name");
        name.datatype = Some(Iri::new("http://www.w3.org/2001/XMLSchema#string"));
        name.min_count = Some(1);

        let mut organizer = PropertyShape::with_path("http://schema.org/organizer");
        organizer.or_classes = Some(vec![
            Iri::new("http://schema.org/Organization"),
            Iri::new("http://schema.org/Person"),
        ]);

        ShaclSchema {
            shapes: vec![NodeShape {
                iri: Iri::new("http://shaclshapes.org/PersonShape"),
                target_class: Some(Iri::new("http://schema.org/Person")),
                properties: vec![typing, name, organizer],
                closed: false,
                ignored_properties: vec![],
            }],
            prefixes: vec![],
        }
    }

    #[test]
    fn test_output_round_trips_through_parser() {
        let schema = person_schema();
        let turtle = serialize_shacl(&schema).unwrap();
        let parsed = parse_shacl(&turtle).unwrap();

        assert_eq!(parsed.shapes.len(), 1);
        let shape = &parsed.shapes[0];
        assert_eq!(shape.iri, schema.shapes[0].iri);
        assert_eq!(shape.target_class, schema.shapes[0].target_class);
        assert_eq!(shape.properties.len(), 3);

        let organizer = shape
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://schema.org/organizer")
            .unwrap();
        assert_eq!(
            organizer.or_classes,
            Some(vec![
                Iri::new("http://schema.org/Organization"),
                Iri::new("http://schema.org/Person"),
            ])
        );
    }

    #[test]
    fn test_schema_prefix_is_http() {
        let turtle = serialize_shacl(&person_schema()).unwrap();
        assert!(turtle.contains("<http://schema.org/>"));
        assert!(!turtle.contains("<https://schema.org/>"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let schema = person_schema();
        let a = serialize_shacl(&schema).unwrap();
        let b = serialize_shacl(&schema).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_in_list_round_trips() {
        let mut gender = PropertyShape::with_path("http://schema.org/gender");
        gender.in_values = Some(vec![
            Value::Iri(Iri::new("http://schema.org/Male")),
            Value::Iri(Iri::new("http://schema.org/Female")),
        ]);
        let schema = ShaclSchema {
            shapes: vec![NodeShape {
                iri: Iri::new("http://shaclshapes.org/GenderShape"),
                target_class: None,
                properties: vec![gender],
                closed: false,
                ignored_properties: vec![],
            }],
            prefixes: vec![],
        };
        let turtle = serialize_shacl(&schema).unwrap();
        let parsed = parse_shacl(&turtle).unwrap();
        assert_eq!(
            parsed.shapes[0].properties[0].in_values,
            Some(vec![
                Value::Iri(Iri::new("http://schema.org/Male")),
                Value::Iri(Iri::new("http://schema.org/Female")),
            ])
        );
    }

    #[test]
    fn test_closed_flag_round_trips() {
        let schema = ShaclSchema {
            shapes: vec![NodeShape {
                iri: Iri::new("http://shaclshapes.org/ClosedShape"),
                target_class: None,
                properties: vec![],
                closed: true,
                ignored_properties: vec![Iri::new(crate::common::RDF_TYPE)],
            }],
            prefixes: vec![],
        };
        let turtle = serialize_shacl(&schema).unwrap();
        let parsed = parse_shacl(&turtle).unwrap();
        assert!(parsed.shapes[0].closed);
        assert_eq!(
            parsed.shapes[0].ignored_properties,
            vec![Iri::new(crate::common::RDF_TYPE)]
        );
    }

    #[test]
    fn test_inverse_path_round_trips() {
        let prop = PropertyShape {
            path: Path {
                iri: Iri::new("http://schema.org/parent"),
                inverse: true,
            },
            min_count: Some(1),
            ..PropertyShape::default()
        };
        let schema = ShaclSchema {
            shapes: vec![NodeShape {
                iri: Iri::new("http://shaclshapes.org/ChildShape"),
                target_class: None,
                properties: vec![prop],
                closed: false,
                ignored_properties: vec![],
            }],
            prefixes: vec![],
        };
        let turtle = serialize_shacl(&schema).unwrap();
        let parsed = parse_shacl(&turtle).unwrap();
        assert!(parsed.shapes[0].properties[0].path.inverse);
    }

    #[test]
    fn test_invalid_iri_is_an_error() {
        let schema = ShaclSchema {
            shapes: vec![NodeShape {
                iri: Iri::new("not an iri"),
                target_class: None,
                properties: vec![],
                closed: false,
                ignored_properties: vec![],
            }],
            prefixes: vec![],
        };
        assert!(matches!(
            serialize_shacl(&schema),
            Err(ShaclWriteError::InvalidIri(_))
        ));
    }
}
