//! Canonical model → SHACL model.
//!
//! Inverse of the SHACL normalization:
//! - `targetClass` re-materializes the typing triple (`sh:path rdf:type ;
//!   sh:hasValue <class>` with cardinality `{1,1}`) as the first property,
//!   which the forward mapper absorbs again on re-entry
//! - `classRef` → `sh:class`; `classRefOr` → `sh:class [ sh:or (…) ]`
//! - `iriStem` → `sh:pattern "^<stem>/"`
//! - counts matching the SHACL default on either end are omitted

use crate::canonical::{CanonicalProperty, CanonicalSchema, CanonicalShape, Constraint};
use crate::common::{Iri, MaxCard, Path, RDF_TYPE, SHACL_SHAPES_BASE, Value, standard_shacl_prefixes};
use crate::shacl_model::{NodeShape, PropertyShape, ShaclSchema};

/// SHACL shape IRI for a canonical shape name.
pub fn make_shape_iri(name: &str) -> Iri {
    Iri::new(format!("{SHACL_SHAPES_BASE}{name}Shape"))
}

fn typing_property(target_class: &str) -> PropertyShape {
    let mut ps = PropertyShape::with_path(RDF_TYPE);
    ps.has_value = Some(Value::Iri(Iri::new(target_class)));
    ps.min_count = Some(1);
    ps.max_count = Some(1);
    ps
}

fn convert_property(prop: &CanonicalProperty) -> PropertyShape {
    let mut ps = PropertyShape {
        path: Path::direct(prop.path.clone()),
        ..PropertyShape::default()
    };

    // SHACL defaults {0,*}: only write counts that differ.
    if prop.cardinality.min > 0 {
        ps.min_count = Some(prop.cardinality.min);
    }
    if let MaxCard::Bounded(max) = prop.cardinality.max {
        ps.max_count = Some(max);
    }

    match &prop.constraint {
        Some(Constraint::HasValue(value)) => ps.has_value = Some(value.to_value()),
        Some(Constraint::InValues(values)) => {
            ps.in_values = Some(values.iter().map(|v| v.to_value()).collect());
        }
        Some(Constraint::ClassRefOr(classes)) => {
            ps.or_classes = Some(classes.iter().map(Iri::new).collect());
        }
        Some(Constraint::ClassRef(class)) => ps.class = Some(Iri::new(class)),
        Some(Constraint::NodeKind(kind)) => ps.node_kind = Some(*kind),
        Some(Constraint::Datatype(datatype)) => ps.datatype = Some(Iri::new(datatype)),
        Some(Constraint::IriStem(stem)) => ps.pattern = Some(format!("^{stem}/")),
        Some(Constraint::Pattern(pattern)) => ps.pattern = Some(pattern.clone()),
        Some(Constraint::NodeRef(name)) => ps.node = Some(make_shape_iri(name)),
        None => {}
    }

    ps
}

fn convert_shape(shape: &CanonicalShape) -> NodeShape {
    let mut properties = Vec::with_capacity(shape.properties.len() + 1);
    if let Some(target) = &shape.target_class {
        properties.push(typing_property(target));
    }
    properties.extend(shape.properties.iter().map(convert_property));

    NodeShape {
        iri: make_shape_iri(&shape.name),
        target_class: shape.target_class.as_ref().map(Iri::new),
        properties,
        closed: shape.closed,
        ignored_properties: vec![],
    }
}

/// Denormalize a canonical schema into the SHACL model.
pub fn convert_canonical_to_shacl(canonical: &CanonicalSchema) -> ShaclSchema {
    ShaclSchema {
        shapes: canonical.shapes.iter().map(convert_shape).collect(),
        prefixes: standard_shacl_prefixes(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CanonicalCardinality, CanonicalValue};
    use crate::shacl_to_canonical::convert_shacl_to_canonical;

    fn person_schema() -> CanonicalSchema {
        CanonicalSchema {
            shapes: vec![CanonicalShape {
                name: "Person".into(),
                target_class: Some("http://schema.org/Person".into()),
                closed: false,
                properties: vec![
                    CanonicalProperty {
                        path: "http://schema.org/name".into(),
                        constraint: Some(Constraint::Datatype(
                            "http://www.w3.org/2001/XMLSchema#string".into(),
                        )),
                        cardinality: CanonicalCardinality::new(1, MaxCard::Bounded(1)),
                    },
                    CanonicalProperty {
                        path: "http://www.w3.org/2002/07/owl#sameAs".into(),
                        constraint: Some(Constraint::IriStem(
                            "http://www.wikidata.org/entity".into(),
                        )),
                        cardinality: CanonicalCardinality::new(0, MaxCard::Unbounded),
                    },
                ],
            }],
        }
    }

    #[test]
    fn test_typing_triple_rematerialized_first() {
        let shacl = convert_canonical_to_shacl(&person_schema());
        let shape = &shacl.shapes[0];
        assert_eq!(shape.iri.as_str(), "http://shaclshapes.org/PersonShape");
        assert_eq!(
            shape.target_class.as_ref().unwrap().as_str(),
            "http://schema.org/Person"
        );

        let typing = &shape.properties[0];
        assert_eq!(typing.path.iri.as_str(), RDF_TYPE);
        assert_eq!(
            typing.has_value,
            Some(Value::Iri(Iri::new("http://schema.org/Person")))
        );
        assert_eq!(typing.min_count, Some(1));
        assert_eq!(typing.max_count, Some(1));
    }

    #[test]
    fn test_default_counts_omitted() {
        let shacl = convert_canonical_to_shacl(&person_schema());
        let same_as = shacl.shapes[0]
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://www.w3.org/2002/07/owl#sameAs")
            .unwrap();
        assert_eq!(same_as.min_count, None);
        assert_eq!(same_as.max_count, None);
    }

    #[test]
    fn test_stem_becomes_anchored_pattern() {
        let shacl = convert_canonical_to_shacl(&person_schema());
        let same_as = shacl.shapes[0]
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://www.w3.org/2002/07/owl#sameAs")
            .unwrap();
        assert_eq!(
            same_as.pattern.as_deref(),
            Some("^http://www.wikidata.org/entity/")
        );
    }

    #[test]
    fn test_class_union_emitted() {
        let schema = CanonicalSchema {
            shapes: vec![CanonicalShape {
                name: "Event".into(),
                target_class: None,
                closed: false,
                properties: vec![CanonicalProperty {
                    path: "http://schema.org/organizer".into(),
                    constraint: Some(Constraint::ClassRefOr(vec![
                        "http://schema.org/Organization".into(),
                        "http://schema.org/Person".into(),
                    ])),
                    cardinality: CanonicalCardinality::new(0, MaxCard::Unbounded),
                }],
            }],
        };
        let shacl = convert_canonical_to_shacl(&schema);
        let organizer = &shacl.shapes[0].properties[0];
        assert_eq!(
            organizer.or_classes,
            Some(vec![
                Iri::new("http://schema.org/Organization"),
                Iri::new("http://schema.org/Person"),
            ])
        );
    }

    #[test]
    fn test_node_ref_links_shape_iri() {
        let schema = CanonicalSchema {
            shapes: vec![CanonicalShape {
                name: "Person".into(),
                target_class: None,
                closed: false,
                properties: vec![CanonicalProperty {
                    path: "http://schema.org/address".into(),
                    constraint: Some(Constraint::NodeRef("Address".into())),
                    cardinality: CanonicalCardinality::new(0, MaxCard::Unbounded),
                }],
            }],
        };
        let shacl = convert_canonical_to_shacl(&schema);
        assert_eq!(
            shacl.shapes[0].properties[0].node.as_ref().unwrap().as_str(),
            "http://shaclshapes.org/AddressShape"
        );
    }

    #[test]
    fn test_round_trip_through_shacl_model() {
        let canonical = person_schema();
        let shacl = convert_canonical_to_shacl(&canonical);
        let back = convert_shacl_to_canonical(&shacl);
        assert_eq!(back.to_json(), canonical.to_json());
    }

    #[test]
    fn test_has_value_literal_round_trip() {
        let schema = CanonicalSchema {
            shapes: vec![CanonicalShape {
                name: "S".into(),
                target_class: None,
                closed: false,
                properties: vec![CanonicalProperty {
                    path: "http://schema.org/status".into(),
                    constraint: Some(Constraint::HasValue(CanonicalValue::Literal {
                        value: "active".into(),
                        datatype: None,
                        language: None,
                    })),
                    cardinality: CanonicalCardinality::new(1, MaxCard::Bounded(1)),
                }],
            }],
        };
        let shacl = convert_canonical_to_shacl(&schema);
        let back = convert_shacl_to_canonical(&shacl);
        assert_eq!(back.to_json(), schema.to_json());
    }
}
