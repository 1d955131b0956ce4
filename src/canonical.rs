//! Canonical intermediate model and its JSON form.
//!
//! The equivalence oracle between the two dialects: two schemas are
//! semantically equal within the supported subset iff their canonical JSON
//! is byte-equal. Shapes are sorted by name, properties by path, value
//! lists ascending, and cardinalities are always explicit, so emission is
//! total-ordered and deterministic.
//!
//! Internally the constraint is a tagged enum; the wide one-record-many-
//! optional-fields shape exists only at the JSON boundary, for
//! compatibility with the published layout.

use serde::{Deserialize, Serialize};

use crate::common::{Iri, Literal, MaxCard, NodeKind, Value};

// ── Model ────────────────────────────────────────────────────────────

/// A value inside `hasValue` / `inValues`: an IRI as a bare string, a
/// literal as a small record.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum CanonicalValue {
    Iri(String),
    Literal {
        value: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
}

impl CanonicalValue {
    pub fn sort_key(&self) -> &str {
        match self {
            CanonicalValue::Iri(iri) => iri,
            CanonicalValue::Literal { value, .. } => value,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Iri(iri) => CanonicalValue::Iri(iri.as_str().to_owned()),
            Value::Literal(lit) => CanonicalValue::Literal {
                value: lit.value.clone(),
                datatype: lit.datatype.as_ref().map(|d| d.as_str().to_owned()),
                language: lit.language.clone(),
            },
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            CanonicalValue::Iri(iri) => Value::Iri(Iri::new(iri.clone())),
            CanonicalValue::Literal {
                value,
                datatype,
                language,
            } => Value::Literal(Literal {
                value: value.clone(),
                datatype: datatype.clone().map(Iri::new),
                language: language.clone(),
            }),
        }
    }
}

/// The single constraint a canonical property may carry. Variant order is
/// the discriminator priority used when mapping from the looser dialect
/// records.
#[derive(Clone, Debug, PartialEq)]
pub enum Constraint {
    /// Exactly this IRI or literal.
    HasValue(CanonicalValue),
    /// One of these values; sorted, length >= 2.
    InValues(Vec<CanonicalValue>),
    /// Instance of one of these classes; sorted, length >= 2.
    ClassRefOr(Vec<String>),
    /// Instance of this class.
    ClassRef(String),
    NodeKind(NodeKind),
    Datatype(String),
    /// All IRIs under this prefix (no trailing slash).
    IriStem(String),
    /// A regular expression, kept verbatim when no stem form fits.
    Pattern(String),
    /// A named shape reference that is not reducible to a class.
    NodeRef(String),
}

/// Resolved cardinality: source defaults never survive into this form.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CanonicalCardinality {
    pub min: u32,
    pub max: MaxCard,
}

impl CanonicalCardinality {
    pub fn new(min: u32, max: MaxCard) -> Self {
        CanonicalCardinality { min, max }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalProperty {
    pub path: String,
    pub constraint: Option<Constraint>,
    pub cardinality: CanonicalCardinality,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CanonicalShape {
    pub name: String,
    pub target_class: Option<String>,
    pub closed: bool,
    pub properties: Vec<CanonicalProperty>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalSchema {
    pub shapes: Vec<CanonicalShape>,
}

// ── JSON boundary (wide records) ─────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyRecord {
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_value: Option<CanonicalValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_values: Option<Vec<CanonicalValue>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_ref_or: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    class_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_kind: Option<NodeKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    datatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    iri_stem: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    node_ref: Option<String>,
    #[serde(default = "shacl_default_cardinality")]
    cardinality: CanonicalCardinality,
}

/// What an absent cardinality means: the SHACL default `{0,*}`.
fn shacl_default_cardinality() -> CanonicalCardinality {
    CanonicalCardinality::new(0, MaxCard::Unbounded)
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShapeRecord {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    target_class: Option<String>,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    properties: Vec<PropertyRecord>,
}

#[derive(Serialize, Deserialize)]
struct SchemaRecord {
    shapes: Vec<ShapeRecord>,
}

impl CanonicalProperty {
    fn to_record(&self) -> PropertyRecord {
        let mut record = PropertyRecord {
            path: self.path.clone(),
            has_value: None,
            in_values: None,
            class_ref_or: None,
            class_ref: None,
            node_kind: None,
            datatype: None,
            iri_stem: None,
            pattern: None,
            node_ref: None,
            cardinality: self.cardinality,
        };
        match &self.constraint {
            Some(Constraint::HasValue(v)) => record.has_value = Some(v.clone()),
            Some(Constraint::InValues(vs)) => {
                let mut vs = vs.clone();
                vs.sort_by(|a, b| a.sort_key().cmp(b.sort_key()));
                record.in_values = Some(vs);
            }
            Some(Constraint::ClassRefOr(cs)) => {
                let mut cs = cs.clone();
                cs.sort();
                record.class_ref_or = Some(cs);
            }
            Some(Constraint::ClassRef(c)) => record.class_ref = Some(c.clone()),
            Some(Constraint::NodeKind(nk)) => record.node_kind = Some(*nk),
            Some(Constraint::Datatype(dt)) => record.datatype = Some(dt.clone()),
            Some(Constraint::IriStem(stem)) => record.iri_stem = Some(stem.clone()),
            Some(Constraint::Pattern(p)) => record.pattern = Some(p.clone()),
            Some(Constraint::NodeRef(n)) => record.node_ref = Some(n.clone()),
            None => {}
        }
        record
    }

    fn from_record(record: PropertyRecord) -> Self {
        // First match in discriminator order wins when a foreign producer
        // set more than one field.
        let constraint = if let Some(v) = record.has_value {
            Some(Constraint::HasValue(v))
        } else if let Some(vs) = record.in_values {
            Some(Constraint::InValues(vs))
        } else if let Some(cs) = record.class_ref_or {
            Some(Constraint::ClassRefOr(cs))
        } else if let Some(c) = record.class_ref {
            Some(Constraint::ClassRef(c))
        } else if let Some(nk) = record.node_kind {
            Some(Constraint::NodeKind(nk))
        } else if let Some(dt) = record.datatype {
            Some(Constraint::Datatype(dt))
        } else if let Some(stem) = record.iri_stem {
            Some(Constraint::IriStem(stem))
        } else if let Some(p) = record.pattern {
            Some(Constraint::Pattern(p))
        } else {
            record.node_ref.map(Constraint::NodeRef)
        };
        CanonicalProperty {
            path: record.path,
            constraint,
            cardinality: record.cardinality,
        }
    }
}

impl CanonicalSchema {
    fn to_record(&self) -> SchemaRecord {
        let mut shapes: Vec<ShapeRecord> = self
            .shapes
            .iter()
            .map(|shape| {
                let mut properties: Vec<PropertyRecord> =
                    shape.properties.iter().map(|p| p.to_record()).collect();
                properties.sort_by(|a, b| a.path.cmp(&b.path));
                ShapeRecord {
                    name: shape.name.clone(),
                    target_class: shape.target_class.clone(),
                    closed: shape.closed,
                    properties,
                }
            })
            .collect();
        shapes.sort_by(|a, b| a.name.cmp(&b.name));
        SchemaRecord { shapes }
    }

    /// Deterministic canonical JSON: two-space indent, total ordering,
    /// non-ASCII preserved.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_record())
            .expect("canonical schema serialization cannot fail")
    }
}

/// Parse canonical JSON back into the model.
pub fn parse_canonical(json: &str) -> Result<CanonicalSchema, serde_json::Error> {
    let record: SchemaRecord = serde_json::from_str(json)?;
    Ok(CanonicalSchema {
        shapes: record
            .shapes
            .into_iter()
            .map(|shape| CanonicalShape {
                name: shape.name,
                target_class: shape.target_class,
                closed: shape.closed,
                properties: shape
                    .properties
                    .into_iter()
                    .map(CanonicalProperty::from_record)
                    .collect(),
            })
            .collect(),
    })
}
