//! Bidirectional SHACL ⇄ ShEx shape translator.
//!
//! Two readers (Turtle SHACL via `oxttl`/`oxrdf`, hand-parsed ShExC), a
//! canonical intermediate model used as the semantic-equivalence oracle,
//! mappers in all four directions plus direct dialect-to-dialect
//! conversion, and writers back to Turtle, ShExC and canonical JSON.
//!
//! Everything is pure and immutable: reader → mapper → writer pipelines
//! hold no shared state and buffer whole documents as strings.

pub mod canonical;
pub mod canonical_to_shacl;
pub mod canonical_to_shex;
pub mod common;
pub mod error;
pub mod shacl_model;
pub mod shacl_parser;
pub mod shacl_to_canonical;
pub mod shacl_to_shex;
pub mod shacl_writer;
pub mod shex_model;
pub mod shex_parser;
pub mod shex_to_canonical;
pub mod shex_to_shacl;
pub mod shex_writer;

pub use canonical::{CanonicalSchema, parse_canonical};
pub use canonical_to_shacl::convert_canonical_to_shacl;
pub use canonical_to_shex::convert_canonical_to_shex;
pub use error::Error;
pub use shacl_model::ShaclSchema;
pub use shacl_parser::parse_shacl;
pub use shacl_to_canonical::convert_shacl_to_canonical;
pub use shacl_to_shex::convert_shacl_to_shex;
pub use shacl_writer::serialize_shacl;
pub use shex_model::ShexSchema;
pub use shex_parser::parse_shex;
pub use shex_to_canonical::convert_shex_to_canonical;
pub use shex_to_shacl::convert_shex_to_shacl;
pub use shex_writer::serialize_shex;

/// SHACL Turtle text → ShExC text.
pub fn shacl_text_to_shex(ttl: &str) -> Result<String, Error> {
    let shacl = parse_shacl(ttl)?;
    let shex = convert_shacl_to_shex(&shacl);
    Ok(serialize_shex(&shex))
}

/// ShExC text → SHACL Turtle text.
pub fn shex_text_to_shacl(shex_text: &str) -> Result<String, Error> {
    let shex = parse_shex(shex_text)?;
    let shacl = convert_shex_to_shacl(&shex);
    Ok(serialize_shacl(&shacl)?)
}

/// SHACL Turtle text → canonical JSON.
pub fn shacl_text_to_canonical_json(ttl: &str) -> Result<String, Error> {
    let shacl = parse_shacl(ttl)?;
    Ok(convert_shacl_to_canonical(&shacl).to_json())
}

/// ShExC text → canonical JSON.
pub fn shex_text_to_canonical_json(shex_text: &str) -> Result<String, Error> {
    let shex = parse_shex(shex_text)?;
    Ok(convert_shex_to_canonical(&shex).to_json())
}
