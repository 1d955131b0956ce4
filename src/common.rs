//! Shared value model: IRIs, literals, prefixes, paths, cardinalities.
//!
//! Both dialect models (SHACL, ShEx) and the canonical form are built from
//! these types. Everything here is immutable once constructed.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Well-known IRIs ──────────────────────────────────────────────────

pub const SH: &str = "http://www.w3.org/ns/shacl#";
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
pub const RDF_REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
pub const RDF_NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";

/// Wikidata "instance of" direct property.
pub const WDT_P31: &str = "http://www.wikidata.org/prop/direct/P31";

/// Base IRI under which generated SHACL node shapes are named.
pub const SHACL_SHAPES_BASE: &str = "http://shaclshapes.org/";

pub fn sh(local: &str) -> String {
    format!("{SH}{local}")
}

/// `rdf:type` and `wdt:P31` are treated as equivalent typing predicates
/// when extracting a target class.
pub fn is_instance_of_predicate(iri: &str) -> bool {
    iri == RDF_TYPE || iri == WDT_P31
}

/// Extract the local name from an IRI (last segment after `#` or `/`).
pub fn iri_local_name(iri: &str) -> &str {
    iri.rsplit_once('#')
        .or_else(|| iri.rsplit_once('/'))
        .map(|(_, name)| name)
        .unwrap_or(iri)
}

/// Capitalized local name, used when naming union shapes after a property.
pub fn capitalized_local_name(iri: &str) -> String {
    let local = iri_local_name(iri);
    let mut chars = local.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => "OrShape".to_owned(),
    }
}

// ── IRI ──────────────────────────────────────────────────────────────

/// An IRI. Equality and hashing are by string value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Iri(pub String);

impl Iri {
    pub fn new(value: impl Into<String>) -> Self {
        Iri(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local_name(&self) -> &str {
        iri_local_name(&self.0)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Iri {
    fn from(value: &str) -> Self {
        Iri(value.to_owned())
    }
}

impl From<String> for Iri {
    fn from(value: String) -> Self {
        Iri(value)
    }
}

// ── Literal ──────────────────────────────────────────────────────────

/// An RDF literal: lexical value plus at most one of datatype / language.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<Iri>,
    pub language: Option<String>,
}

impl Literal {
    pub fn simple(value: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: Iri) -> Self {
        Literal {
            value: value.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    pub fn tagged(value: impl Into<String>, language: impl Into<String>) -> Self {
        Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

/// An IRI or a literal, as found in value sets and `sh:hasValue` / `sh:in`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Iri(Iri),
    Literal(Literal),
}

impl Value {
    /// Stable key used wherever value lists are sorted.
    pub fn sort_key(&self) -> &str {
        match self {
            Value::Iri(iri) => iri.as_str(),
            Value::Literal(lit) => &lit.value,
        }
    }
}

// ── IRI stem ─────────────────────────────────────────────────────────

/// The set of all IRIs starting with a given prefix. Stored without a
/// trailing slash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IriStem(String);

impl IriStem {
    pub fn new(stem: impl Into<String>) -> Self {
        let mut stem = stem.into();
        if stem.ends_with('/') {
            stem.pop();
        }
        IriStem(stem)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ── Prefixes ─────────────────────────────────────────────────────────

/// A (short name, namespace IRI) pair. The name may be empty for the
/// default prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
    pub name: String,
    pub iri: String,
}

impl Prefix {
    pub fn new(name: impl Into<String>, iri: impl Into<String>) -> Self {
        Prefix {
            name: name.into(),
            iri: iri.into(),
        }
    }
}

/// The prefix set bound on every emitted SHACL document. `schema` is the
/// HTTP form; some RDF toolchains reserve the name for HTTPS and must not
/// win over it.
pub fn standard_shacl_prefixes() -> Vec<Prefix> {
    vec![
        Prefix::new("sh", SH),
        Prefix::new("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        Prefix::new("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
        Prefix::new("xsd", "http://www.w3.org/2001/XMLSchema#"),
        Prefix::new("schema", "http://schema.org/"),
        Prefix::new("owl", "http://www.w3.org/2002/07/owl#"),
        Prefix::new("yago", "http://yago-knowledge.org/resource/"),
    ]
}

/// The prefix set emitted at the top of every generated ShExC document.
pub fn standard_shex_prefixes() -> Vec<Prefix> {
    vec![
        Prefix::new("geo", "http://www.opengis.net/ont/geosparql#"),
        Prefix::new("owl", "http://www.w3.org/2002/07/owl#"),
        Prefix::new("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
        Prefix::new("rdfs", "http://www.w3.org/2000/01/rdf-schema#"),
        Prefix::new("schema", "http://schema.org/"),
        Prefix::new("skos", "http://www.w3.org/2004/02/skos/core#"),
        Prefix::new("wd", "http://www.wikidata.org/entity/"),
        Prefix::new("wdt", "http://www.wikidata.org/prop/direct/"),
        Prefix::new("xsd", "http://www.w3.org/2001/XMLSchema#"),
        Prefix::new("yago", "http://yago-knowledge.org/resource/"),
    ]
}

/// IRI-to-prefixed-name resolution, longest namespace first so that e.g.
/// `schema1: <https://schema.org/>` cannot shadow `schema: <http://schema.org/>`.
pub struct PrefixMap {
    entries: Vec<(String, String)>,
}

impl PrefixMap {
    pub fn new(prefixes: &[Prefix]) -> Self {
        let mut entries: Vec<(String, String)> = prefixes
            .iter()
            .map(|p| (p.name.clone(), p.iri.clone()))
            .collect();
        entries.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
        PrefixMap { entries }
    }

    /// Compact a full IRI to `prefix:local`, or fall back to `<iri>`.
    pub fn compact(&self, iri: &str) -> String {
        for (name, namespace) in &self.entries {
            if let Some(local) = iri.strip_prefix(namespace.as_str()) {
                return format!("{name}:{local}");
            }
        }
        format!("<{iri}>")
    }

    pub fn compact_iri(&self, iri: &Iri) -> String {
        self.compact(iri.as_str())
    }
}

// ── Path ─────────────────────────────────────────────────────────────

/// A property path: a single predicate IRI, optionally inverted. Only
/// direct paths occur in the supported subset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    pub iri: Iri,
    pub inverse: bool,
}

impl Path {
    pub fn direct(iri: impl Into<Iri>) -> Self {
        Path {
            iri: iri.into(),
            inverse: false,
        }
    }
}

impl Default for Path {
    fn default() -> Self {
        Path::direct("")
    }
}

// ── Cardinality ──────────────────────────────────────────────────────

/// An upper cardinality bound: a finite count or unbounded.
///
/// Serialized in canonical JSON as the finite count, or `-1` for unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxCard {
    Bounded(u32),
    Unbounded,
}

impl Serialize for MaxCard {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxCard::Bounded(n) => serializer.serialize_i64(i64::from(*n)),
            MaxCard::Unbounded => serializer.serialize_i64(-1),
        }
    }
}

impl<'de> Deserialize<'de> for MaxCard {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        match raw {
            -1 => Ok(MaxCard::Unbounded),
            n if n >= 0 && n <= i64::from(u32::MAX) => Ok(MaxCard::Bounded(n as u32)),
            other => Err(serde::de::Error::custom(format!(
                "invalid max cardinality {other}: expected -1 or a non-negative count"
            ))),
        }
    }
}

/// A source-side cardinality where `None` means "not written down" and the
/// language default applies: `{0,*}` in SHACL, `{1,1}` in ShEx.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cardinality {
    pub min: Option<u32>,
    pub max: Option<MaxCard>,
}

impl Cardinality {
    pub fn exactly(min: u32, max: MaxCard) -> Self {
        Cardinality {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Minimum with the ShEx default of 1 applied.
    pub fn effective_min(&self) -> u32 {
        self.min.unwrap_or(1)
    }

    /// Maximum with the ShEx default of 1 applied.
    pub fn effective_max(&self) -> MaxCard {
        self.max.unwrap_or(MaxCard::Bounded(1))
    }

    /// Shortest equivalent ShExC form, with a leading space when non-empty.
    /// `{1,1}` is the ShEx default and is written as nothing at all.
    pub fn to_shexc(&self) -> String {
        match (self.effective_min(), self.effective_max()) {
            (0, MaxCard::Unbounded) => " *".to_owned(),
            (0, MaxCard::Bounded(1)) => " ?".to_owned(),
            (1, MaxCard::Unbounded) => " +".to_owned(),
            (1, MaxCard::Bounded(1)) => String::new(),
            (mn, MaxCard::Unbounded) => format!(" {{{mn},}}"),
            (mn, MaxCard::Bounded(mx)) if mn == mx => format!(" {{{mn}}}"),
            (mn, MaxCard::Bounded(mx)) => format!(" {{{mn},{mx}}}"),
        }
    }
}

// ── Node kind ────────────────────────────────────────────────────────

/// SHACL `sh:nodeKind` / ShEx node-kind labels.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    #[serde(rename = "IRI")]
    Iri,
    BlankNode,
    Literal,
    #[serde(rename = "BlankNodeOrIRI")]
    BlankNodeOrIri,
    BlankNodeOrLiteral,
    #[serde(rename = "IRIOrLiteral")]
    IriOrLiteral,
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Iri => "IRI",
            NodeKind::BlankNode => "BlankNode",
            NodeKind::Literal => "Literal",
            NodeKind::BlankNodeOrIri => "BlankNodeOrIRI",
            NodeKind::BlankNodeOrLiteral => "BlankNodeOrLiteral",
            NodeKind::IriOrLiteral => "IRIOrLiteral",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "IRI" => Some(NodeKind::Iri),
            "BlankNode" => Some(NodeKind::BlankNode),
            "Literal" => Some(NodeKind::Literal),
            "BlankNodeOrIRI" => Some(NodeKind::BlankNodeOrIri),
            "BlankNodeOrLiteral" => Some(NodeKind::BlankNodeOrLiteral),
            "IRIOrLiteral" => Some(NodeKind::IriOrLiteral),
            _ => None,
        }
    }
}
