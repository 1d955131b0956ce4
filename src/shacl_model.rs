//! SHACL model: node shapes with blank-node property shapes.
//!
//! One record per property shape with optional constraint fields, mirroring
//! how the constraints sit side by side in the Turtle source. The canonical
//! mapper applies the discriminator priority when several could match.

use crate::common::{Cardinality, Iri, MaxCard, NodeKind, Path, Prefix, Value};

/// A `sh:property` blank node: a path plus whichever constraint fields the
/// source carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyShape {
    pub path: Path,
    pub datatype: Option<Iri>,
    pub class: Option<Iri>,
    pub node_kind: Option<NodeKind>,
    pub min_count: Option<u32>,
    pub max_count: Option<u32>,
    pub pattern: Option<String>,
    pub has_value: Option<Value>,
    pub in_values: Option<Vec<Value>>,
    /// `sh:node` reference to another shape.
    pub node: Option<Iri>,
    /// `sh:class [ sh:or ( ... ) ]` union of class IRIs.
    pub or_classes: Option<Vec<Iri>>,
}

impl PropertyShape {
    pub fn with_path(path: impl Into<Iri>) -> Self {
        PropertyShape {
            path: Path::direct(path),
            ..PropertyShape::default()
        }
    }

    /// Source cardinality; unset counts keep the SHACL default `{0,*}`.
    pub fn cardinality(&self) -> Cardinality {
        Cardinality {
            min: self.min_count,
            max: self.max_count.map(MaxCard::Bounded),
        }
    }
}

/// A `sh:NodeShape` with its target class and property shapes.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
    pub iri: Iri,
    pub target_class: Option<Iri>,
    pub properties: Vec<PropertyShape>,
    pub closed: bool,
    pub ignored_properties: Vec<Iri>,
}

/// A parsed SHACL document: shapes plus the prefix map of the source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShaclSchema {
    pub shapes: Vec<NodeShape>,
    pub prefixes: Vec<Prefix>,
}

impl ShaclSchema {
    pub fn find_shape(&self, iri: &str) -> Option<&NodeShape> {
        self.shapes.iter().find(|s| s.iri.as_str() == iri)
    }
}
