//! SHACL model → canonical model.
//!
//! Normalization rules:
//! - cardinality: the SHACL default `{0,*}` becomes explicit `min=0, max=-1`
//! - `rdf:type` + `sh:hasValue` equal to the target class is absorbed into
//!   `targetClass`
//! - `sh:class` becomes `classRef`; an `sh:or` class list becomes a sorted
//!   `classRefOr`
//! - `sh:pattern` anchored on an http(s) prefix becomes `iriStem`
//! - singleton `sh:in` collapses to `hasValue`, singleton unions to `classRef`

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::canonical::{
    CanonicalCardinality, CanonicalProperty, CanonicalSchema, CanonicalShape, CanonicalValue,
    Constraint,
};
use crate::common::{Iri, MaxCard, RDF_TYPE, Value};
use crate::shacl_model::{NodeShape, PropertyShape, ShaclSchema};

/// Anchored URL prefix patterns, e.g. `^http://www.wikidata.org/entity/`.
static STEM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\^(https?://[^$]*?)/?$").expect("stem pattern is valid"));

/// Shape name from a SHACL shape IRI: the final segment with a trailing
/// `Shape` stripped, e.g. `http://shaclshapes.org/LanguageShape` → `Language`.
pub fn shape_name_from_iri(iri: &Iri) -> String {
    let local = iri.local_name();
    local.strip_suffix("Shape").unwrap_or(local).to_owned()
}

/// Convert an anchored URL pattern to its stem, or `None` when the pattern
/// is not a pure prefix match.
pub fn pattern_to_iri_stem(pattern: &str) -> Option<String> {
    STEM_PATTERN
        .captures(pattern)
        .map(|caps| caps[1].to_owned())
}

fn value_to_canonical(value: &Value) -> CanonicalValue {
    CanonicalValue::from_value(value)
}

fn convert_cardinality(ps: &PropertyShape) -> CanonicalCardinality {
    CanonicalCardinality::new(
        ps.min_count.unwrap_or(0),
        ps.max_count.map(MaxCard::Bounded).unwrap_or(MaxCard::Unbounded),
    )
}

/// Pick the single canonical constraint with the discriminator priority:
/// hasValue, inValues, classRefOr, classRef, nodeKind, datatype, stem or
/// pattern, nodeRef. First match wins.
fn convert_constraint(ps: &PropertyShape) -> Option<Constraint> {
    let constraint = if let Some(value) = &ps.has_value {
        Some(Constraint::HasValue(value_to_canonical(value)))
    } else if let Some(values) = &ps.in_values {
        match values.as_slice() {
            [] => None,
            [single] => Some(Constraint::HasValue(value_to_canonical(single))),
            many => Some(Constraint::InValues(
                many.iter().map(value_to_canonical).collect(),
            )),
        }
    } else if let Some(classes) = &ps.or_classes {
        match classes.as_slice() {
            [] => None,
            [single] => Some(Constraint::ClassRef(single.as_str().to_owned())),
            many => Some(Constraint::ClassRefOr(
                many.iter().map(|c| c.as_str().to_owned()).collect(),
            )),
        }
    } else if let Some(class) = &ps.class {
        Some(Constraint::ClassRef(class.as_str().to_owned()))
    } else if let Some(kind) = ps.node_kind {
        Some(Constraint::NodeKind(kind))
    } else if let Some(datatype) = &ps.datatype {
        Some(Constraint::Datatype(datatype.as_str().to_owned()))
    } else if let Some(pattern) = &ps.pattern {
        match pattern_to_iri_stem(pattern) {
            Some(stem) => Some(Constraint::IriStem(stem)),
            None => Some(Constraint::Pattern(pattern.clone())),
        }
    } else {
        ps.node
            .as_ref()
            .map(|node| Constraint::NodeRef(shape_name_from_iri(node)))
    };

    // A pattern next to a primary constraint has no canonical slot; the
    // dataset never combines them, so it is dropped with a warning.
    if ps.pattern.is_some() && !matches!(constraint, Some(Constraint::IriStem(_) | Constraint::Pattern(_)))
    {
        warn!(
            path = %ps.path.iri,
            "sh:pattern alongside another constraint is discarded"
        );
    }

    constraint
}

fn convert_property(ps: &PropertyShape) -> CanonicalProperty {
    if ps.path.inverse {
        warn!(path = %ps.path.iri, "inverse path flattened to its predicate");
    }
    CanonicalProperty {
        path: ps.path.iri.as_str().to_owned(),
        constraint: convert_constraint(ps),
        cardinality: convert_cardinality(ps),
    }
}

/// Whether this property shape restates the target class as a typing triple
/// and should be absorbed.
fn is_absorbed_typing_property(ps: &PropertyShape, target_class: Option<&Iri>) -> bool {
    let Some(target) = target_class else {
        return false;
    };
    ps.path.iri.as_str() == RDF_TYPE
        && matches!(&ps.has_value, Some(Value::Iri(iri)) if iri == target)
}

fn convert_shape(shape: &NodeShape) -> CanonicalShape {
    let properties = shape
        .properties
        .iter()
        .filter(|ps| !is_absorbed_typing_property(ps, shape.target_class.as_ref()))
        .map(convert_property)
        .collect();

    CanonicalShape {
        name: shape_name_from_iri(&shape.iri),
        target_class: shape
            .target_class
            .as_ref()
            .map(|tc| tc.as_str().to_owned()),
        closed: shape.closed,
        properties,
    }
}

/// Normalize a SHACL schema into the canonical form.
pub fn convert_shacl_to_canonical(shacl: &ShaclSchema) -> CanonicalSchema {
    CanonicalSchema {
        shapes: shacl.shapes.iter().map(convert_shape).collect(),
    }
}
