//! ShEx model → canonical model.
//!
//! Normalization rules:
//! - cardinality: the ShEx default `{1,1}` becomes explicit integers
//! - an instance-of triple with a singleton IRI value set becomes the
//!   shape's `targetClass` and is dropped from the property list
//! - references to auxiliary class shapes dissolve back into `classRef`
//!   (or a sorted `classRefOr` for unions); unresolved references fall back
//!   to `nodeRef` without error
//! - a singleton IRI-stem value set becomes `iriStem`

use std::collections::HashSet;

use tracing::warn;

use crate::canonical::{
    CanonicalCardinality, CanonicalProperty, CanonicalSchema, CanonicalShape, CanonicalValue,
    Constraint,
};
use crate::common::{Value, is_instance_of_predicate};
use crate::shex_model::{
    ConstraintAtom, NodeConstraint, Shape, ShexSchema, TripleConstraint, ValueSetValue,
};

/// Main (non-auxiliary) shape names: the start shape when declared, else
/// every shape with two or more triple constraints, else the first shape.
pub fn identify_main_shapes(schema: &ShexSchema) -> HashSet<String> {
    let mut main: HashSet<String> = HashSet::new();
    if let Some(start) = &schema.start {
        main.insert(start.as_str().to_owned());
    } else {
        for shape in &schema.shapes {
            if shape.triple_constraints().len() > 1 {
                main.insert(shape.name.as_str().to_owned());
            }
        }
    }
    if main.is_empty()
        && let Some(first) = schema.shapes.first()
    {
        main.insert(first.name.as_str().to_owned());
    }
    main
}

/// Target class of a shape: the value of an instance-of constraint holding
/// a singleton IRI value set.
pub fn extract_target_class(constraints: &[&TripleConstraint]) -> Option<String> {
    for tc in constraints {
        if !is_instance_of_predicate(tc.predicate.as_str()) {
            continue;
        }
        let Some(ConstraintAtom::Node(nc)) = &tc.atom else {
            continue;
        };
        if let Some([ValueSetValue::Iri(iri)]) = nc.values.as_deref() {
            return Some(iri.as_str().to_owned());
        }
    }
    None
}

/// Whether this constraint is the typing triple absorbed into `targetClass`.
fn is_target_class_constraint(tc: &TripleConstraint, target_class: Option<&str>) -> bool {
    let Some(target) = target_class else {
        return false;
    };
    if !is_instance_of_predicate(tc.predicate.as_str()) {
        return false;
    }
    let Some(ConstraintAtom::Node(nc)) = &tc.atom else {
        return false;
    };
    matches!(nc.values.as_deref(), Some([ValueSetValue::Iri(iri)]) if iri.as_str() == target)
}

enum ResolvedRef {
    Class(String),
    ClassUnion(Vec<String>),
    Unresolved,
}

/// Dissolve a shape reference: a referenced shape with exactly one triple
/// constraint whose atom is a value set of only IRIs is a reified class
/// (one IRI) or class union (several).
fn resolve_shape_ref(name: &str, schema: &ShexSchema) -> ResolvedRef {
    let Some(shape) = schema.find_shape(name) else {
        return ResolvedRef::Unresolved;
    };
    let constraints = shape.triple_constraints();
    let [tc] = constraints.as_slice() else {
        return ResolvedRef::Unresolved;
    };
    let Some(ConstraintAtom::Node(nc)) = &tc.atom else {
        return ResolvedRef::Unresolved;
    };
    let Some(values) = &nc.values else {
        return ResolvedRef::Unresolved;
    };
    if values.is_empty() || !values.iter().all(|v| v.as_iri().is_some()) {
        return ResolvedRef::Unresolved;
    }
    let mut iris: Vec<String> = values
        .iter()
        .filter_map(|v| v.as_iri())
        .map(|iri| iri.as_str().to_owned())
        .collect();
    if iris.len() == 1 {
        ResolvedRef::Class(iris.remove(0))
    } else {
        iris.sort();
        ResolvedRef::ClassUnion(iris)
    }
}

fn node_constraint_to_canonical(nc: &NodeConstraint) -> Option<Constraint> {
    if let Some(datatype) = &nc.datatype {
        return Some(Constraint::Datatype(datatype.as_str().to_owned()));
    }
    if let Some(kind) = nc.node_kind {
        return Some(Constraint::NodeKind(kind));
    }
    if let Some(values) = &nc.values {
        if let [ValueSetValue::Stem(stem)] = values.as_slice() {
            return Some(Constraint::IriStem(stem.as_str().to_owned()));
        }
        let vals: Vec<CanonicalValue> = values
            .iter()
            .filter_map(|v| match v {
                ValueSetValue::Iri(iri) => {
                    Some(CanonicalValue::from_value(&Value::Iri(iri.clone())))
                }
                ValueSetValue::Literal(lit) => {
                    Some(CanonicalValue::from_value(&Value::Literal(lit.clone())))
                }
                ValueSetValue::Stem(_) => None,
            })
            .collect();
        return match vals.len() {
            0 => None,
            1 => Some(Constraint::HasValue(vals.into_iter().next().unwrap())),
            _ => Some(Constraint::InValues(vals)),
        };
    }
    nc.pattern.clone().map(Constraint::Pattern)
}

fn convert_cardinality(tc: &TripleConstraint) -> CanonicalCardinality {
    CanonicalCardinality::new(
        tc.cardinality.effective_min(),
        tc.cardinality.effective_max(),
    )
}

fn convert_constraint(tc: &TripleConstraint, schema: &ShexSchema) -> Option<Constraint> {
    match &tc.atom {
        Some(ConstraintAtom::Ref(shape_ref)) => {
            let name = shape_ref.name.as_str();
            match resolve_shape_ref(name, schema) {
                ResolvedRef::Class(class) => Some(Constraint::ClassRef(class)),
                ResolvedRef::ClassUnion(classes) => Some(Constraint::ClassRefOr(classes)),
                ResolvedRef::Unresolved => Some(Constraint::NodeRef(name.to_owned())),
            }
        }
        Some(ConstraintAtom::Node(nc)) => node_constraint_to_canonical(nc),
        None => None,
    }
}

fn convert_shape(shape: &Shape, schema: &ShexSchema) -> CanonicalShape {
    if shape
        .expression
        .as_ref()
        .is_some_and(|e| e.has_nested_groups())
    {
        warn!(
            shape = %shape.name,
            "nested triple expression groups are outside the supported subset; \
             using top-level triple constraints only"
        );
    }

    let constraints = shape.triple_constraints();
    let target_class = extract_target_class(&constraints);

    let properties = constraints
        .iter()
        .filter(|tc| !is_target_class_constraint(tc, target_class.as_deref()))
        .map(|tc| CanonicalProperty {
            path: tc.predicate.as_str().to_owned(),
            constraint: convert_constraint(tc, schema),
            cardinality: convert_cardinality(tc),
        })
        .collect();

    CanonicalShape {
        name: shape.name.as_str().to_owned(),
        target_class,
        closed: shape.closed,
        properties,
    }
}

/// Normalize a ShEx schema into the canonical form. Auxiliary shapes are
/// dissolved into the class references of the main shapes.
pub fn convert_shex_to_canonical(shex: &ShexSchema) -> CanonicalSchema {
    let main = identify_main_shapes(shex);
    CanonicalSchema {
        shapes: shex
            .shapes
            .iter()
            .filter(|shape| main.contains(shape.name.as_str()))
            .map(|shape| convert_shape(shape, shex))
            .collect(),
    }
}
