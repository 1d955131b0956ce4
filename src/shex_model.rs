//! ShEx model: shapes over a triple-expression tree.
//!
//! The supported subset keeps the tree shallow: a shape body is a single
//! triple constraint or a conjunction of them. Disjunctions parse but are
//! flattened to their triple-constraint children during mapping.

use crate::common::{Cardinality, Iri, IriStem, Literal, NodeKind, Prefix};

/// A single entry of a value set `[ ... ]`.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueSetValue {
    Iri(Iri),
    Literal(Literal),
    Stem(IriStem),
}

impl ValueSetValue {
    pub fn as_iri(&self) -> Option<&Iri> {
        match self {
            ValueSetValue::Iri(iri) => Some(iri),
            _ => None,
        }
    }
}

/// A value-level constraint: datatype, node kind, value set, or pattern.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeConstraint {
    pub datatype: Option<Iri>,
    pub node_kind: Option<NodeKind>,
    pub values: Option<Vec<ValueSetValue>>,
    pub pattern: Option<String>,
}

impl NodeConstraint {
    pub fn datatype(iri: impl Into<Iri>) -> Self {
        NodeConstraint {
            datatype: Some(iri.into()),
            ..NodeConstraint::default()
        }
    }

    pub fn node_kind(kind: NodeKind) -> Self {
        NodeConstraint {
            node_kind: Some(kind),
            ..NodeConstraint::default()
        }
    }

    pub fn value_set(values: Vec<ValueSetValue>) -> Self {
        NodeConstraint {
            values: Some(values),
            ..NodeConstraint::default()
        }
    }
}

/// The atom of a triple constraint: a node constraint or a reference to
/// another shape (`@<Name>`).
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintAtom {
    Node(NodeConstraint),
    Ref(ShapeRef),
}

/// A reference to another shape by name.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeRef {
    pub name: Iri,
}

impl ShapeRef {
    pub fn new(name: impl Into<Iri>) -> Self {
        ShapeRef { name: name.into() }
    }
}

/// `predicate [constraint] [cardinality]`.
#[derive(Clone, Debug, PartialEq)]
pub struct TripleConstraint {
    pub predicate: Iri,
    pub atom: Option<ConstraintAtom>,
    pub cardinality: Cardinality,
    pub inverse: bool,
}

impl TripleConstraint {
    pub fn new(predicate: impl Into<Iri>, atom: Option<ConstraintAtom>) -> Self {
        TripleConstraint {
            predicate: predicate.into(),
            atom,
            cardinality: Cardinality::default(),
            inverse: false,
        }
    }
}

/// A triple expression: an atom, a `;`-conjunction, or a `|`-disjunction.
#[derive(Clone, Debug, PartialEq)]
pub enum TripleExpr {
    Constraint(TripleConstraint),
    EachOf(Vec<TripleExpr>),
    OneOf(Vec<TripleExpr>),
}

impl TripleExpr {
    /// Direct triple-constraint children, the only level the supported
    /// subset uses. Nested groups are not descended into.
    pub fn triple_constraints(&self) -> Vec<&TripleConstraint> {
        match self {
            TripleExpr::Constraint(tc) => vec![tc],
            TripleExpr::EachOf(exprs) | TripleExpr::OneOf(exprs) => exprs
                .iter()
                .filter_map(|e| match e {
                    TripleExpr::Constraint(tc) => Some(tc),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Whether this expression holds anything other than a flat list of
    /// triple constraints.
    pub fn has_nested_groups(&self) -> bool {
        match self {
            TripleExpr::Constraint(_) => false,
            TripleExpr::EachOf(exprs) | TripleExpr::OneOf(exprs) => exprs
                .iter()
                .any(|e| !matches!(e, TripleExpr::Constraint(_))),
        }
    }
}

/// A named shape with `EXTRA` / `CLOSED` modifiers.
#[derive(Clone, Debug, PartialEq)]
pub struct Shape {
    pub name: Iri,
    pub expression: Option<TripleExpr>,
    pub closed: bool,
    pub extra: Vec<Iri>,
}

impl Shape {
    pub fn new(name: impl Into<Iri>, expression: Option<TripleExpr>) -> Self {
        Shape {
            name: name.into(),
            expression,
            closed: false,
            extra: Vec::new(),
        }
    }

    pub fn triple_constraints(&self) -> Vec<&TripleConstraint> {
        self.expression
            .as_ref()
            .map(|e| e.triple_constraints())
            .unwrap_or_default()
    }
}

/// A parsed ShExC document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShexSchema {
    pub shapes: Vec<Shape>,
    pub prefixes: Vec<Prefix>,
    pub start: Option<Iri>,
}

impl ShexSchema {
    pub fn find_shape(&self, name: &str) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.name.as_str() == name)
    }
}

/// Wrap a list of triple constraints the way the parser does: a singleton
/// stays bare, several become a conjunction, none means an empty body.
pub fn expression_from_constraints(constraints: Vec<TripleConstraint>) -> Option<TripleExpr> {
    let mut constraints = constraints;
    match constraints.len() {
        0 => None,
        1 => Some(TripleExpr::Constraint(constraints.remove(0))),
        _ => Some(TripleExpr::EachOf(
            constraints.into_iter().map(TripleExpr::Constraint).collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::RDF_TYPE;

    #[test]
    fn test_expression_from_constraints() {
        assert_eq!(expression_from_constraints(vec![]), None);

        let tc = TripleConstraint::new(RDF_TYPE, None);
        match expression_from_constraints(vec![tc.clone()]) {
            Some(TripleExpr::Constraint(got)) => assert_eq!(got, tc),
            other => panic!("expected bare constraint, got {other:?}"),
        }

        match expression_from_constraints(vec![tc.clone(), tc.clone()]) {
            Some(TripleExpr::EachOf(children)) => assert_eq!(children.len(), 2),
            other => panic!("expected EachOf, got {other:?}"),
        }
    }

    #[test]
    fn test_triple_constraints_skips_nested_groups() {
        let tc = TripleConstraint::new("http://schema.org/name", None);
        let expr = TripleExpr::EachOf(vec![
            TripleExpr::Constraint(tc.clone()),
            TripleExpr::OneOf(vec![TripleExpr::Constraint(tc.clone())]),
        ]);
        assert_eq!(expr.triple_constraints().len(), 1);
        assert!(expr.has_nested_groups());
    }
}
