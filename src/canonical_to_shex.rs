//! Canonical model → ShEx model.
//!
//! Inverse of the ShEx normalization:
//! - `targetClass` becomes a leading `rdf:type [ <class> ]` constraint
//! - `classRef` / `classRefOr` are reified as auxiliary shapes referenced
//!   with `@<Name>`; each auxiliary body is a single typing-predicate
//!   triple over the class value set
//! - `iriStem` becomes a singleton stem value set
//!
//! Auxiliary shapes are compiler artifacts: they are created once per
//! distinct class, never collide with main or earlier auxiliary names, and
//! their names are not stable across round-trips.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::canonical::{CanonicalProperty, CanonicalSchema, CanonicalValue, Constraint};
use crate::common::{
    Cardinality, Iri, IriStem, RDF_TYPE, capitalized_local_name, iri_local_name,
    standard_shex_prefixes,
};
use crate::shex_model::{
    ConstraintAtom, NodeConstraint, Shape, ShapeRef, ShexSchema, TripleConstraint, ValueSetValue,
    expression_from_constraints,
};

/// Bookkeeping for auxiliary shape synthesis.
struct AuxShapes {
    /// Finished auxiliary shapes by name, ordered for stable output.
    shapes: BTreeMap<String, Shape>,
    /// Class IRI → auxiliary name, so one class reifies once.
    by_class: HashMap<String, String>,
    main_names: HashSet<String>,
}

impl AuxShapes {
    fn new(main_names: HashSet<String>) -> Self {
        AuxShapes {
            shapes: BTreeMap::new(),
            by_class: HashMap::new(),
            main_names,
        }
    }

    /// First free candidate: `N`, then `N_class`, then `N_class2`, …
    fn unique_name(&self, base: &str) -> String {
        let taken = |name: &String| {
            self.main_names.contains(name.as_str()) || self.shapes.contains_key(name.as_str())
        };
        let candidate = base.to_owned();
        if !taken(&candidate) {
            return candidate;
        }
        let candidate = format!("{base}_class");
        if !taken(&candidate) {
            return candidate;
        }
        let mut i = 2;
        loop {
            let candidate = format!("{base}_class{i}");
            if !taken(&candidate) {
                return candidate;
            }
            i += 1;
        }
    }

    fn typing_shape(name: &str, classes: &[String]) -> Shape {
        let values = classes
            .iter()
            .map(|c| ValueSetValue::Iri(Iri::new(c)))
            .collect();
        let tc = TripleConstraint {
            predicate: Iri::new(RDF_TYPE),
            atom: Some(ConstraintAtom::Node(NodeConstraint::value_set(values))),
            cardinality: Cardinality::default(),
            inverse: false,
        };
        Shape {
            name: Iri::new(name),
            expression: expression_from_constraints(vec![tc]),
            closed: false,
            extra: vec![Iri::new(RDF_TYPE)],
        }
    }

    /// Auxiliary shape for a single class, reused across properties.
    fn for_class(&mut self, class: &str) -> String {
        if let Some(existing) = self.by_class.get(class) {
            return existing.clone();
        }
        let name = self.unique_name(iri_local_name(class));
        self.shapes
            .insert(name.clone(), Self::typing_shape(&name, &[class.to_owned()]));
        self.by_class.insert(class.to_owned(), name.clone());
        name
    }

    /// Auxiliary shape for a class union, named after the owning property.
    fn for_union(&mut self, property_path: &str, classes: &[String]) -> String {
        let name = self.unique_name(&capitalized_local_name(property_path));
        self.shapes
            .insert(name.clone(), Self::typing_shape(&name, classes));
        name
    }
}

fn convert_cardinality(prop: &CanonicalProperty) -> Cardinality {
    Cardinality::exactly(prop.cardinality.min, prop.cardinality.max)
}

fn canonical_value_to_set_value(value: &CanonicalValue) -> ValueSetValue {
    match value.to_value() {
        crate::common::Value::Iri(iri) => ValueSetValue::Iri(iri),
        crate::common::Value::Literal(lit) => ValueSetValue::Literal(lit),
    }
}

fn convert_property(prop: &CanonicalProperty, aux: &mut AuxShapes) -> TripleConstraint {
    let atom = match &prop.constraint {
        Some(Constraint::HasValue(value)) => Some(ConstraintAtom::Node(
            NodeConstraint::value_set(vec![canonical_value_to_set_value(value)]),
        )),
        Some(Constraint::InValues(values)) => Some(ConstraintAtom::Node(
            NodeConstraint::value_set(values.iter().map(canonical_value_to_set_value).collect()),
        )),
        Some(Constraint::ClassRefOr(classes)) => {
            let name = aux.for_union(&prop.path, classes);
            Some(ConstraintAtom::Ref(ShapeRef::new(name)))
        }
        Some(Constraint::ClassRef(class)) => {
            let name = aux.for_class(class);
            Some(ConstraintAtom::Ref(ShapeRef::new(name)))
        }
        Some(Constraint::NodeKind(kind)) => {
            Some(ConstraintAtom::Node(NodeConstraint::node_kind(*kind)))
        }
        Some(Constraint::Datatype(datatype)) => Some(ConstraintAtom::Node(
            NodeConstraint::datatype(datatype.as_str()),
        )),
        Some(Constraint::IriStem(stem)) => Some(ConstraintAtom::Node(NodeConstraint::value_set(
            vec![ValueSetValue::Stem(IriStem::new(stem.clone()))],
        ))),
        Some(Constraint::Pattern(pattern)) => Some(ConstraintAtom::Node(NodeConstraint {
            pattern: Some(pattern.clone()),
            ..NodeConstraint::default()
        })),
        Some(Constraint::NodeRef(name)) => Some(ConstraintAtom::Ref(ShapeRef::new(name.as_str()))),
        None => None,
    };

    TripleConstraint {
        predicate: Iri::new(prop.path.clone()),
        atom,
        cardinality: convert_cardinality(prop),
        inverse: false,
    }
}

/// Denormalize a canonical schema into the ShEx model, synthesizing the
/// auxiliary shapes class references need.
pub fn convert_canonical_to_shex(canonical: &CanonicalSchema) -> ShexSchema {
    let main_names: HashSet<String> = canonical.shapes.iter().map(|s| s.name.clone()).collect();
    let mut aux = AuxShapes::new(main_names);
    let mut shapes: Vec<Shape> = Vec::new();
    let mut start: Option<Iri> = None;

    for cshape in &canonical.shapes {
        let mut constraints: Vec<TripleConstraint> = Vec::new();

        if let Some(target) = &cshape.target_class {
            constraints.push(TripleConstraint {
                predicate: Iri::new(RDF_TYPE),
                atom: Some(ConstraintAtom::Node(NodeConstraint::value_set(vec![
                    ValueSetValue::Iri(Iri::new(target)),
                ]))),
                cardinality: Cardinality::default(),
                inverse: false,
            });
        }

        for prop in &cshape.properties {
            constraints.push(convert_property(prop, &mut aux));
        }

        shapes.push(Shape {
            name: Iri::new(cshape.name.clone()),
            expression: expression_from_constraints(constraints),
            closed: cshape.closed,
            extra: vec![Iri::new(RDF_TYPE)],
        });

        if start.is_none() {
            start = Some(Iri::new(cshape.name.clone()));
        }
    }

    shapes.extend(aux.shapes.into_values());

    ShexSchema {
        shapes,
        prefixes: standard_shex_prefixes(),
        start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{CanonicalCardinality, CanonicalShape};
    use crate::common::MaxCard;
    use crate::shex_to_canonical::convert_shex_to_canonical;

    fn schema_with(name: &str, properties: Vec<CanonicalProperty>) -> CanonicalSchema {
        CanonicalSchema {
            shapes: vec![CanonicalShape {
                name: name.into(),
                target_class: Some(format!("http://schema.org/{name}")),
                closed: false,
                properties,
            }],
        }
    }

    fn class_ref_prop(path: &str, class: &str) -> CanonicalProperty {
        CanonicalProperty {
            path: path.into(),
            constraint: Some(Constraint::ClassRef(class.into())),
            cardinality: CanonicalCardinality::new(0, MaxCard::Bounded(1)),
        }
    }

    #[test]
    fn test_target_class_leads_the_body() {
        let canonical = schema_with("Person", vec![]);
        let shex = convert_canonical_to_shex(&canonical);
        let person = &shex.shapes[0];
        let tcs = person.triple_constraints();
        assert_eq!(tcs.len(), 1);
        assert_eq!(tcs[0].predicate.as_str(), RDF_TYPE);
        assert_eq!(person.extra, vec![Iri::new(RDF_TYPE)]);
        assert_eq!(shex.start.as_ref().unwrap().as_str(), "Person");
    }

    #[test]
    fn test_class_ref_synthesizes_aux_shape() {
        let canonical = schema_with(
            "Person",
            vec![class_ref_prop("http://schema.org/birthPlace", "http://schema.org/Place")],
        );
        let shex = convert_canonical_to_shex(&canonical);

        assert_eq!(shex.shapes.len(), 2);
        let place = shex.find_shape("Place").unwrap();
        let tcs = place.triple_constraints();
        assert_eq!(tcs.len(), 1);
        assert_eq!(tcs[0].predicate.as_str(), RDF_TYPE);
        match tcs[0].atom.as_ref().unwrap() {
            ConstraintAtom::Node(nc) => {
                assert_eq!(
                    nc.values.as_deref(),
                    Some(&[ValueSetValue::Iri(Iri::new("http://schema.org/Place"))][..])
                );
            }
            other => panic!("expected value set, got {other:?}"),
        }
    }

    #[test]
    fn test_same_class_reified_once() {
        let canonical = schema_with(
            "Person",
            vec![
                class_ref_prop("http://schema.org/birthPlace", "http://schema.org/Place"),
                class_ref_prop("http://schema.org/deathPlace", "http://schema.org/Place"),
            ],
        );
        let shex = convert_canonical_to_shex(&canonical);
        let aux_count = shex
            .shapes
            .iter()
            .filter(|s| s.name.as_str() == "Place")
            .count();
        assert_eq!(aux_count, 1);
        assert_eq!(shex.shapes.len(), 2);
    }

    #[test]
    fn test_aux_name_collision_disambiguated() {
        // A main shape already named Place: the aux for schema:Place must
        // step aside to Place_class.
        let canonical = CanonicalSchema {
            shapes: vec![
                CanonicalShape {
                    name: "Person".into(),
                    target_class: None,
                    closed: false,
                    properties: vec![class_ref_prop(
                        "http://schema.org/birthPlace",
                        "http://schema.org/Place",
                    )],
                },
                CanonicalShape {
                    name: "Place".into(),
                    target_class: Some("http://schema.org/Place".into()),
                    closed: false,
                    properties: vec![],
                },
            ],
        };
        let shex = convert_canonical_to_shex(&canonical);
        assert!(shex.find_shape("Place_class").is_some());

        let person = shex.find_shape("Person").unwrap();
        match person.triple_constraints()[0].atom.as_ref().unwrap() {
            ConstraintAtom::Ref(r) => assert_eq!(r.name.as_str(), "Place_class"),
            other => panic!("expected ref, got {other:?}"),
        }
    }

    #[test]
    fn test_union_aux_named_after_property() {
        let canonical = schema_with(
            "Event",
            vec![CanonicalProperty {
                path: "http://schema.org/organizer".into(),
                constraint: Some(Constraint::ClassRefOr(vec![
                    "http://schema.org/Organization".into(),
                    "http://schema.org/Person".into(),
                ])),
                cardinality: CanonicalCardinality::new(0, MaxCard::Unbounded),
            }],
        );
        let shex = convert_canonical_to_shex(&canonical);
        let organizer = shex.find_shape("Organizer").unwrap();
        let tcs = organizer.triple_constraints();
        match tcs[0].atom.as_ref().unwrap() {
            ConstraintAtom::Node(nc) => {
                assert_eq!(nc.values.as_ref().unwrap().len(), 2);
            }
            other => panic!("expected value set, got {other:?}"),
        }
    }

    #[test]
    fn test_stem_emitted_as_value_set() {
        let canonical = schema_with(
            "Thing",
            vec![CanonicalProperty {
                path: "http://www.w3.org/2002/07/owl#sameAs".into(),
                constraint: Some(Constraint::IriStem("http://www.wikidata.org/entity".into())),
                cardinality: CanonicalCardinality::new(0, MaxCard::Unbounded),
            }],
        );
        let shex = convert_canonical_to_shex(&canonical);
        let tcs = shex.shapes[0].triple_constraints();
        match tcs[1].atom.as_ref().unwrap() {
            ConstraintAtom::Node(nc) => match &nc.values.as_ref().unwrap()[0] {
                ValueSetValue::Stem(stem) => {
                    assert_eq!(stem.as_str(), "http://www.wikidata.org/entity");
                }
                other => panic!("expected stem, got {other:?}"),
            },
            other => panic!("expected value set, got {other:?}"),
        }
    }

    #[test]
    fn test_canonical_round_trip() {
        let canonical = schema_with(
            "Person",
            vec![
                class_ref_prop("http://schema.org/birthPlace", "http://schema.org/Place"),
                CanonicalProperty {
                    path: "http://schema.org/name".into(),
                    constraint: Some(Constraint::Datatype(
                        "http://www.w3.org/2001/XMLSchema#string".into(),
                    )),
                    cardinality: CanonicalCardinality::new(1, MaxCard::Bounded(1)),
                },
            ],
        );
        let shex = convert_canonical_to_shex(&canonical);
        let back = convert_shex_to_canonical(&shex);
        assert_eq!(back.to_json(), canonical.to_json());
    }
}
