//! Direct SHACL model → ShEx model conversion.
//!
//! The file-to-file pipeline: class constraints reify into auxiliary
//! shapes, the target class leads the body as a typing triple, and source
//! prefixes are carried only when one of their IRIs is actually used.

use std::collections::{BTreeMap, HashSet};

use crate::common::{
    Cardinality, Iri, IriStem, MaxCard, Prefix, RDF_TYPE, Value, capitalized_local_name,
    iri_local_name, standard_shex_prefixes,
};
use crate::shacl_model::{PropertyShape, ShaclSchema};
use crate::shacl_to_canonical::{pattern_to_iri_stem, shape_name_from_iri};
use crate::shex_model::{
    ConstraintAtom, NodeConstraint, Shape, ShapeRef, ShexSchema, TripleConstraint, ValueSetValue,
    expression_from_constraints,
};

fn value_to_set_value(value: &Value) -> ValueSetValue {
    match value {
        Value::Iri(iri) => ValueSetValue::Iri(iri.clone()),
        Value::Literal(lit) => ValueSetValue::Literal(lit.clone()),
    }
}

fn convert_cardinality(ps: &PropertyShape) -> Cardinality {
    Cardinality::exactly(
        ps.min_count.unwrap_or(0),
        ps.max_count.map(MaxCard::Bounded).unwrap_or(MaxCard::Unbounded),
    )
}

fn typing_value_set_shape(name: &str, classes: &[Iri]) -> Shape {
    let values = classes
        .iter()
        .map(|c| ValueSetValue::Iri(c.clone()))
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

/// Union-shape name from the property local name, `N2`, `N3`, … on clash.
fn make_or_shape_name(ps: &PropertyShape, existing: &BTreeMap<String, Shape>) -> String {
    let base = capitalized_local_name(ps.path.iri.as_str());
    if !existing.contains_key(&base) {
        return base;
    }
    let mut i = 2;
    loop {
        let candidate = format!("{base}{i}");
        if !existing.contains_key(&candidate) {
            return candidate;
        }
        i += 1;
    }
}

fn convert_property(
    ps: &PropertyShape,
    aux: &mut BTreeMap<String, Shape>,
) -> TripleConstraint {
    let atom = if let Some(value) = &ps.has_value {
        Some(ConstraintAtom::Node(NodeConstraint::value_set(vec![
            value_to_set_value(value),
        ])))
    } else if let Some(values) = &ps.in_values {
        Some(ConstraintAtom::Node(NodeConstraint::value_set(
            values.iter().map(value_to_set_value).collect(),
        )))
    } else if let Some(classes) = &ps.or_classes {
        let name = make_or_shape_name(ps, aux);
        aux.entry(name.clone())
            .or_insert_with(|| typing_value_set_shape(&name, classes));
        Some(ConstraintAtom::Ref(ShapeRef::new(name)))
    } else if let Some(class) = &ps.class {
        let name = iri_local_name(class.as_str()).to_owned();
        aux.entry(name.clone())
            .or_insert_with(|| typing_value_set_shape(&name, std::slice::from_ref(class)));
        Some(ConstraintAtom::Ref(ShapeRef::new(name)))
    } else if let Some(kind) = ps.node_kind {
        Some(ConstraintAtom::Node(NodeConstraint::node_kind(kind)))
    } else if let Some(datatype) = &ps.datatype {
        Some(ConstraintAtom::Node(NodeConstraint::datatype(
            datatype.as_str(),
        )))
    } else if let Some(pattern) = &ps.pattern {
        // Only prefix patterns survive; ShExC has no pattern facet here.
        pattern_to_iri_stem(pattern).map(|stem| {
            ConstraintAtom::Node(NodeConstraint::value_set(vec![ValueSetValue::Stem(
                IriStem::new(stem),
            )]))
        })
    } else {
        ps.node
            .as_ref()
            .map(|node| ConstraintAtom::Ref(ShapeRef::new(node.as_str())))
    };

    TripleConstraint {
        predicate: ps.path.iri.clone(),
        atom,
        cardinality: convert_cardinality(ps),
        inverse: ps.path.inverse,
    }
}

/// All IRIs mentioned by the converted shapes, for prefix filtering.
fn collect_used_iris(shapes: &[Shape]) -> HashSet<String> {
    let mut iris = HashSet::new();
    for shape in shapes {
        iris.insert(shape.name.as_str().to_owned());
        for extra in &shape.extra {
            iris.insert(extra.as_str().to_owned());
        }
        for tc in shape.triple_constraints() {
            iris.insert(tc.predicate.as_str().to_owned());
            match &tc.atom {
                Some(ConstraintAtom::Node(nc)) => {
                    if let Some(dt) = &nc.datatype {
                        iris.insert(dt.as_str().to_owned());
                    }
                    for value in nc.values.iter().flatten() {
                        if let ValueSetValue::Iri(iri) = value {
                            iris.insert(iri.as_str().to_owned());
                        }
                    }
                }
                Some(ConstraintAtom::Ref(r)) => {
                    iris.insert(r.name.as_str().to_owned());
                }
                None => {}
            }
        }
    }
    iris
}

/// Convert a SHACL schema directly to ShEx.
pub fn convert_shacl_to_shex(shacl: &ShaclSchema) -> ShexSchema {
    let mut shapes: Vec<Shape> = Vec::new();
    let mut aux: BTreeMap<String, Shape> = BTreeMap::new();
    let mut start: Option<Iri> = None;

    for node_shape in &shacl.shapes {
        let shape_name = shape_name_from_iri(&node_shape.iri);

        let mut constraints: Vec<TripleConstraint> = Vec::new();

        // sh:targetClass leads the body as rdf:type [ <class> ].
        if let Some(target) = &node_shape.target_class {
            constraints.push(TripleConstraint {
                predicate: Iri::new(RDF_TYPE),
                atom: Some(ConstraintAtom::Node(NodeConstraint::value_set(vec![
                    ValueSetValue::Iri(target.clone()),
                ]))),
                cardinality: Cardinality::default(),
                inverse: false,
            });
        }

        for ps in &node_shape.properties {
            // The typing property is already covered by the targetClass
            // constraint above.
            if ps.path.iri.as_str() == RDF_TYPE
                && node_shape.target_class.is_some()
                && ps.has_value.is_some()
            {
                continue;
            }
            constraints.push(convert_property(ps, &mut aux));
        }

        shapes.push(Shape {
            name: Iri::new(shape_name.clone()),
            expression: expression_from_constraints(constraints),
            closed: node_shape.closed,
            extra: vec![Iri::new(RDF_TYPE)],
        });

        if start.is_none() {
            start = Some(Iri::new(shape_name));
        }
    }

    // Auxiliary shapes follow, sorted by name, unless a main shape already
    // claimed the name.
    let main_names: HashSet<String> = shapes
        .iter()
        .map(|s| s.name.as_str().to_owned())
        .collect();
    for (name, shape) in aux {
        if !main_names.contains(&name) {
            shapes.push(shape);
        }
    }

    // Standard ShEx prefixes, plus source prefixes that are actually used.
    let mut prefixes = standard_shex_prefixes();
    let standard_iris: HashSet<String> = prefixes.iter().map(|p| p.iri.clone()).collect();
    let used_iris = collect_used_iris(&shapes);
    for pfx in &shacl.prefixes {
        if !pfx.name.is_empty()
            && pfx.name != "sh"
            && !standard_iris.contains(&pfx.iri)
            && used_iris.iter().any(|iri| iri.starts_with(&pfx.iri))
        {
            prefixes.push(Prefix::new(pfx.name.clone(), pfx.iri.clone()));
        }
    }

    ShexSchema {
        shapes,
        prefixes,
        start,
    }
}
