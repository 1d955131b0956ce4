//! Direct ShEx model → SHACL model conversion.
//!
//! Auxiliary shapes are inlined as `sh:class` references. A referenced
//! shape too complex to dissolve contributes its own target class when it
//! has one, and an `sh:node` link otherwise.

use std::collections::HashSet;

use crate::canonical_to_shacl::make_shape_iri;
use crate::common::{Iri, MaxCard, Path, Prefix, Value, is_instance_of_predicate, standard_shacl_prefixes};
use crate::shacl_model::{NodeShape, PropertyShape, ShaclSchema};
use crate::shex_model::{
    ConstraintAtom, NodeConstraint, ShexSchema, TripleConstraint, ValueSetValue,
};
use crate::shex_to_canonical::{extract_target_class, identify_main_shapes};

/// An instance-of constraint over a singleton IRI value set.
fn is_instance_of_with_single_class(tc: &TripleConstraint) -> bool {
    if !is_instance_of_predicate(tc.predicate.as_str()) {
        return false;
    }
    let Some(ConstraintAtom::Node(nc)) = &tc.atom else {
        return false;
    };
    matches!(nc.values.as_deref(), Some([ValueSetValue::Iri(_)]))
}

fn set_value_to_value(value: &ValueSetValue) -> Option<Value> {
    match value {
        ValueSetValue::Iri(iri) => Some(Value::Iri(iri.clone())),
        ValueSetValue::Literal(lit) => Some(Value::Literal(lit.clone())),
        ValueSetValue::Stem(_) => None,
    }
}

fn convert_ref(name: &str, schema: &ShexSchema, ps: &mut PropertyShape) {
    let Some(ref_shape) = schema.find_shape(name) else {
        // Dangling reference: treat the name itself as the class.
        ps.class = Some(Iri::new(name));
        return;
    };

    let ref_tcs = ref_shape.triple_constraints();
    if let [tc] = ref_tcs.as_slice()
        && let Some(ConstraintAtom::Node(nc)) = &tc.atom
        && let Some(values) = &nc.values
        && !values.is_empty()
    {
        if let [ValueSetValue::Iri(class)] = values.as_slice() {
            ps.class = Some(class.clone());
            return;
        }
        let iris: Vec<Iri> = values
            .iter()
            .filter_map(|v| v.as_iri())
            .cloned()
            .collect();
        if !iris.is_empty() {
            ps.or_classes = Some(iris);
        } else {
            ps.node = Some(make_shape_iri(name));
        }
        return;
    }

    // Non-trivial referenced shape: use its own target class when present,
    // an sh:node link otherwise.
    match extract_target_class(&ref_tcs) {
        Some(target) => ps.class = Some(Iri::new(target)),
        None => ps.node = Some(make_shape_iri(name)),
    }
}

fn convert_triple_constraint(tc: &TripleConstraint, schema: &ShexSchema) -> PropertyShape {
    let mut ps = PropertyShape {
        path: Path {
            iri: tc.predicate.clone(),
            inverse: tc.inverse,
        },
        ..PropertyShape::default()
    };

    // ShEx defaults resolve to {1,1}; only counts that differ from the
    // SHACL default {0,*} are written.
    let min = tc.cardinality.effective_min();
    if min > 0 {
        ps.min_count = Some(min);
    }
    if let MaxCard::Bounded(max) = tc.cardinality.effective_max() {
        ps.max_count = Some(max);
    }

    match &tc.atom {
        Some(ConstraintAtom::Ref(shape_ref)) => {
            convert_ref(shape_ref.name.as_str(), schema, &mut ps);
        }
        Some(ConstraintAtom::Node(nc)) => {
            if let Some(datatype) = &nc.datatype {
                ps.datatype = Some(datatype.clone());
            } else if let Some(kind) = nc.node_kind {
                ps.node_kind = Some(kind);
            } else if let Some(values) = &nc.values {
                if let [ValueSetValue::Stem(stem)] = values.as_slice() {
                    ps.pattern = Some(format!("^{}/", stem.as_str()));
                } else {
                    let plain: Vec<Value> =
                        values.iter().filter_map(set_value_to_value).collect();
                    match plain.len() {
                        0 => {}
                        1 => ps.has_value = plain.into_iter().next(),
                        _ => ps.in_values = Some(plain),
                    }
                }
            }
        }
        None => {}
    }

    ps
}

/// Convert a ShEx schema directly to SHACL. Auxiliary shapes dissolve into
/// the constraints of the main shapes.
pub fn convert_shex_to_shacl(shex: &ShexSchema) -> ShaclSchema {
    let main = identify_main_shapes(shex);
    let mut shapes: Vec<NodeShape> = Vec::new();

    for shape in &shex.shapes {
        if !main.contains(shape.name.as_str()) {
            continue;
        }

        let tcs = shape.triple_constraints();
        let target_class = extract_target_class(&tcs);

        let properties = tcs
            .iter()
            .filter(|tc| !(is_instance_of_with_single_class(tc) && target_class.is_some()))
            .map(|tc| convert_triple_constraint(tc, shex))
            .collect();

        shapes.push(NodeShape {
            iri: make_shape_iri(shape.name.as_str()),
            target_class: target_class.map(Iri::new),
            properties,
            closed: shape.closed,
            ignored_properties: vec![],
        });
    }

    let mut prefixes = standard_shacl_prefixes();
    let standard_iris: HashSet<String> = prefixes.iter().map(|p| p.iri.clone()).collect();
    for pfx in &shex.prefixes {
        if !standard_iris.contains(&pfx.iri) && pfx.name != "sh" {
            prefixes.push(Prefix::new(pfx.name.clone(), pfx.iri.clone()));
        }
    }

    ShaclSchema { shapes, prefixes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RDF_TYPE;
    use crate::shacl_to_canonical::pattern_to_iri_stem;
    use crate::shex_parser::parse_shex;

    const PERSON_SHEX: &str = r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>

start = @<Person>

<Person> EXTRA rdf:type {
  rdf:type [ schema:Person ] ;
  schema:name xsd:string ;
  schema:birthPlace @<Place> ?
}

<Place> EXTRA rdf:type {
  rdf:type [ schema:Place ]
}
"#;

    #[test]
    fn test_main_shape_converted_aux_inlined() {
        let shex = parse_shex(PERSON_SHEX).unwrap();
        let shacl = convert_shex_to_shacl(&shex);

        assert_eq!(shacl.shapes.len(), 1);
        let person = &shacl.shapes[0];
        assert_eq!(person.iri.as_str(), "http://shaclshapes.org/PersonShape");
        assert_eq!(
            person.target_class.as_ref().unwrap().as_str(),
            "http://schema.org/Person"
        );

        let birth = person
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://schema.org/birthPlace")
            .unwrap();
        assert_eq!(
            birth.class.as_ref().unwrap().as_str(),
            "http://schema.org/Place"
        );
        assert_eq!(birth.min_count, None);
        assert_eq!(birth.max_count, Some(1));
    }

    #[test]
    fn test_typing_triple_dropped() {
        let shex = parse_shex(PERSON_SHEX).unwrap();
        let shacl = convert_shex_to_shacl(&shex);
        assert!(
            shacl.shapes[0]
                .properties
                .iter()
                .all(|p| p.path.iri.as_str() != RDF_TYPE)
        );
    }

    #[test]
    fn test_union_value_set_becomes_or_classes() {
        let shex_text = r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>
start = @<Event>
<Event> EXTRA rdf:type {
  rdf:type [ schema:Event ] ;
  schema:organizer @<Organizer> *
}
<Organizer> EXTRA rdf:type {
  rdf:type [ schema:Organization schema:Person ]
}
"#;
        let shex = parse_shex(shex_text).unwrap();
        let shacl = convert_shex_to_shacl(&shex);
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
    fn test_complex_ref_uses_its_target_class() {
        let shex_text = r#"
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX schema: <http://schema.org/>
start = @<Person>
<Person> EXTRA rdf:type {
  rdf:type [ schema:Person ] ;
  schema:address @<Address>
}
<Address> EXTRA rdf:type {
  rdf:type [ schema:PostalAddress ] ;
  schema:postalCode LITERAL
}
"#;
        let shex = parse_shex(shex_text).unwrap();
        let shacl = convert_shex_to_shacl(&shex);
        let address = &shacl.shapes[0].properties[0];
        assert_eq!(
            address.class.as_ref().unwrap().as_str(),
            "http://schema.org/PostalAddress"
        );
        assert!(address.node.is_none());
    }

    #[test]
    fn test_complex_ref_without_target_gets_node_link() {
        let shex_text = r#"
PREFIX schema: <http://schema.org/>
start = @<Person>
<Person> {
  schema:address @<Address> ;
  schema:name LITERAL
}
<Address> {
  schema:postalCode LITERAL ;
  schema:streetAddress LITERAL
}
"#;
        let shex = parse_shex(shex_text).unwrap();
        let shacl = convert_shex_to_shacl(&shex);
        let person = shacl
            .shapes
            .iter()
            .find(|s| s.iri.as_str() == "http://shaclshapes.org/PersonShape")
            .unwrap();
        let address = person
            .properties
            .iter()
            .find(|p| p.path.iri.as_str() == "http://schema.org/address")
            .unwrap();
        assert_eq!(
            address.node.as_ref().unwrap().as_str(),
            "http://shaclshapes.org/AddressShape"
        );
    }

    #[test]
    fn test_stem_becomes_pattern() {
        let shex_text = r#"
PREFIX owl: <http://www.w3.org/2002/07/owl#>
start = @<Thing>
<Thing> {
  owl:sameAs [ <http://www.wikidata.org/entity/>~ ] *
}
"#;
        let shex = parse_shex(shex_text).unwrap();
        let shacl = convert_shex_to_shacl(&shex);
        let same_as = &shacl.shapes[0].properties[0];
        assert_eq!(
            same_as.pattern.as_deref(),
            Some("^http://www.wikidata.org/entity/")
        );
        // And the emitted pattern is stem-shaped again.
        assert_eq!(
            pattern_to_iri_stem(same_as.pattern.as_ref().unwrap()).as_deref(),
            Some("http://www.wikidata.org/entity")
        );
    }

    #[test]
    fn test_dangling_ref_treated_as_class() {
        let shex_text = r#"
PREFIX schema: <http://schema.org/>
start = @<Person>
<Person> {
  schema:knows @<Friend>
}
"#;
        let shex = parse_shex(shex_text).unwrap();
        let shacl = convert_shex_to_shacl(&shex);
        let knows = &shacl.shapes[0].properties[0];
        assert_eq!(knows.class.as_ref().unwrap().as_str(), "Friend");
    }
}
