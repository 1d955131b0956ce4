//! ShExC compact-syntax reader.
//!
//! A hand-written tokenizer and recursive-descent parser for the subset the
//! shape datasets use: `PREFIX`, `start`, shape declarations with
//! `EXTRA`/`CLOSED`, triple constraints with cardinalities, node constraints
//! (datatypes, node kinds, value sets, IRI stems) and shape references.
//!
//! The tokenizer tracks byte offsets; every error carries its position and
//! a short context window so problems in generated files can be localized.

use std::collections::HashMap;
use std::fmt;

use crate::common::{Cardinality, Iri, IriStem, Literal, MaxCard, NodeKind, Prefix};
use crate::shex_model::{
    ConstraintAtom, NodeConstraint, Shape, ShapeRef, ShexSchema, TripleConstraint, TripleExpr,
    ValueSetValue, expression_from_constraints,
};

/// Width of the context window reported with parse errors.
const CONTEXT_BEFORE: usize = 20;
const CONTEXT_AFTER: usize = 30;

#[derive(Debug)]
pub struct ShexParseError {
    pub pos: usize,
    pub message: String,
    pub context: String,
}

impl fmt::Display for ShexParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShEx parse error at byte {}: {} (near ...{}...)",
            self.pos, self.message, self.context
        )
    }
}

impl std::error::Error for ShexParseError {}

// ── Tokenizer ────────────────────────────────────────────────────────

struct Tokenizer<'a> {
    text: &'a str,
    pos: usize,
}

fn is_name_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_name_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'.' || c == b'-'
}

impl<'a> Tokenizer<'a> {
    fn new(text: &'a str) -> Self {
        Tokenizer { text, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn error(&self, message: impl Into<String>) -> ShexParseError {
        let start = clamp_to_char_boundary(self.text, self.pos.saturating_sub(CONTEXT_BEFORE));
        let end = clamp_to_char_boundary(
            self.text,
            (self.pos + CONTEXT_AFTER).min(self.text.len()),
        );
        ShexParseError {
            pos: self.pos,
            message: message.into(),
            context: self.text[start..end].to_owned(),
        }
    }

    /// Skip whitespace and `#` line comments.
    fn skip_trivia(&mut self) {
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'#' => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn at_end(&mut self) -> bool {
        self.skip_trivia();
        self.pos >= self.text.len()
    }

    /// Next significant byte, without consuming.
    fn peek(&mut self) -> Option<u8> {
        self.skip_trivia();
        self.bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn try_consume(&mut self, s: &str) -> bool {
        self.skip_trivia();
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, s: &str) -> Result<(), ShexParseError> {
        self.skip_trivia();
        if self.rest().starts_with(s) {
            self.pos += s.len();
            Ok(())
        } else {
            Err(self.error(format!("expected `{s}`")))
        }
    }

    /// Whether the rest starts with `kw` as a whole word.
    fn at_keyword(&mut self, kw: &str) -> bool {
        self.skip_trivia();
        self.rest().starts_with(kw)
            && !self
                .bytes()
                .get(self.pos + kw.len())
                .copied()
                .is_some_and(|c| c.is_ascii_alphabetic())
    }

    fn consume_keyword(&mut self, kw: &str) -> Result<(), ShexParseError> {
        if self.at_keyword(kw) {
            self.pos += kw.len();
            Ok(())
        } else {
            Err(self.error(format!("expected keyword `{kw}`")))
        }
    }

    /// Peek an uppercase keyword like `EXTRA`, `CLOSED`, `IRI`.
    fn peek_keyword(&mut self) -> Option<&'a str> {
        self.skip_trivia();
        let bytes = self.bytes();
        let first = *bytes.get(self.pos)?;
        if !first.is_ascii_uppercase() {
            return None;
        }
        let mut end = self.pos + 1;
        while end < bytes.len() && (bytes[end].is_ascii_alphabetic() || bytes[end] == b'_') {
            end += 1;
        }
        Some(&self.text[self.pos..end])
    }

    /// `<...>` IRI reference.
    fn read_iri_ref(&mut self) -> Result<String, ShexParseError> {
        self.skip_trivia();
        if self.bytes().get(self.pos) != Some(&b'<') {
            return Err(self.error("expected `<` opening an IRI reference"));
        }
        self.pos += 1;
        let start = self.pos;
        let bytes = self.bytes();
        while self.pos < bytes.len() && bytes[self.pos] != b'>' {
            self.pos += 1;
        }
        if self.pos >= self.text.len() {
            return Err(self.error("unterminated IRI reference, missing `>`"));
        }
        let iri = self.text[start..self.pos].to_owned();
        self.pos += 1; // skip '>'
        Ok(iri)
    }

    /// `prefix:local`, resolved against the prefix map.
    fn read_prefixed_name(
        &mut self,
        prefixes: &HashMap<String, String>,
    ) -> Result<String, ShexParseError> {
        self.skip_trivia();
        let bytes = self.bytes();
        let start = self.pos;

        let mut cursor = self.pos;
        if cursor < bytes.len() && is_name_start(bytes[cursor]) {
            cursor += 1;
            while cursor < bytes.len() && is_name_continue(bytes[cursor]) {
                cursor += 1;
            }
        }
        if bytes.get(cursor) != Some(&b':') {
            return Err(self.error("expected a prefixed name"));
        }
        let prefix = &self.text[start..cursor];
        cursor += 1; // skip ':'
        let local_start = cursor;
        while cursor < bytes.len() && is_name_continue(bytes[cursor]) {
            cursor += 1;
        }
        let local = &self.text[local_start..cursor];

        let Some(namespace) = prefixes.get(prefix) else {
            return Err(self.error(format!("unknown prefix `{prefix}`")));
        };
        let resolved = format!("{namespace}{local}");
        self.pos = cursor;
        Ok(resolved)
    }

    /// Either `<IRI>` or `prefix:local`.
    fn read_iri_or_prefixed(
        &mut self,
        prefixes: &HashMap<String, String>,
    ) -> Result<String, ShexParseError> {
        if self.peek() == Some(b'<') {
            self.read_iri_ref()
        } else {
            self.read_prefixed_name(prefixes)
        }
    }

    fn read_number(&mut self) -> Result<u32, ShexParseError> {
        self.skip_trivia();
        let bytes = self.bytes();
        let start = self.pos;
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a number"));
        }
        self.text[start..self.pos]
            .parse::<u32>()
            .map_err(|_| self.error("cardinality count out of range"))
    }
}

fn clamp_to_char_boundary(text: &str, mut pos: usize) -> usize {
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos.min(text.len())
}

// ── Grammar ──────────────────────────────────────────────────────────

/// Optional cardinality: `?`, `*`, `+`, `{m}`, `{m,}`, `{m,n}`.
fn parse_cardinality(tok: &mut Tokenizer<'_>) -> Result<Cardinality, ShexParseError> {
    match tok.peek() {
        Some(b'?') => {
            tok.pos += 1;
            Ok(Cardinality::exactly(0, MaxCard::Bounded(1)))
        }
        Some(b'*') => {
            tok.pos += 1;
            Ok(Cardinality::exactly(0, MaxCard::Unbounded))
        }
        Some(b'+') => {
            tok.pos += 1;
            Ok(Cardinality::exactly(1, MaxCard::Unbounded))
        }
        Some(b'{') => {
            tok.pos += 1;
            let min = tok.read_number()?;
            let max = if tok.try_consume(",") {
                match tok.peek() {
                    Some(c) if c.is_ascii_digit() => MaxCard::Bounded(tok.read_number()?),
                    _ => MaxCard::Unbounded,
                }
            } else {
                MaxCard::Bounded(min) // {n} means exactly n
            };
            tok.expect("}")?;
            Ok(Cardinality::exactly(min, max))
        }
        _ => Ok(Cardinality::default()),
    }
}

/// Literal: `"string"` with optional `^^datatype` or `@lang`. The lexical
/// form is kept raw, escapes included.
fn parse_literal(
    tok: &mut Tokenizer<'_>,
    prefixes: &HashMap<String, String>,
) -> Result<Literal, ShexParseError> {
    tok.skip_trivia();
    let quote = tok.bytes()[tok.pos];
    tok.pos += 1;
    let start = tok.pos;
    let bytes = tok.bytes();
    while tok.pos < bytes.len() && bytes[tok.pos] != quote {
        if bytes[tok.pos] == b'\\' {
            tok.pos += 1;
        }
        tok.pos += 1;
    }
    if tok.pos >= tok.text.len() {
        return Err(tok.error("unterminated literal, missing closing quote"));
    }
    let value = tok.text[start..tok.pos].to_owned();
    tok.pos += 1; // closing quote

    tok.skip_trivia();
    if tok.try_consume("^^") {
        let dt = tok.read_iri_or_prefixed(prefixes)?;
        return Ok(Literal::typed(value, Iri::new(dt)));
    }
    if tok.peek() == Some(b'@') {
        tok.pos += 1;
        let bytes = tok.bytes();
        let start = tok.pos;
        while tok.pos < bytes.len() && (bytes[tok.pos].is_ascii_alphabetic() || bytes[tok.pos] == b'-')
        {
            tok.pos += 1;
        }
        if start < tok.pos {
            let lang = tok.text[start..tok.pos].to_owned();
            return Ok(Literal::tagged(value, lang));
        }
    }
    Ok(Literal::simple(value))
}

/// Value set body: entries separated by whitespace up to the closing `]`.
/// Each entry is an IRI, an IRI followed by `~` (stem), or a literal.
fn parse_value_set(
    tok: &mut Tokenizer<'_>,
    prefixes: &HashMap<String, String>,
) -> Result<Vec<ValueSetValue>, ShexParseError> {
    tok.expect("[")?;
    let mut values = Vec::new();
    while !tok.try_consume("]") {
        match tok.peek() {
            None => return Err(tok.error("unterminated value set, missing `]`")),
            Some(b'"') | Some(b'\'') => {
                values.push(ValueSetValue::Literal(parse_literal(tok, prefixes)?));
            }
            _ => {
                let iri = tok.read_iri_or_prefixed(prefixes)?;
                if tok.peek() == Some(b'~') {
                    tok.pos += 1;
                    values.push(ValueSetValue::Stem(IriStem::new(iri)));
                } else {
                    values.push(ValueSetValue::Iri(Iri::new(iri)));
                }
            }
        }
    }
    Ok(values)
}

/// Constraint after the predicate: `@<shape>`, `[values]`, a node-kind
/// keyword, `.`, or a datatype IRI.
fn parse_constraint_atom(
    tok: &mut Tokenizer<'_>,
    prefixes: &HashMap<String, String>,
) -> Result<ConstraintAtom, ShexParseError> {
    match tok.peek() {
        Some(b'@') => {
            tok.pos += 1;
            let name = tok.read_iri_ref()?;
            return Ok(ConstraintAtom::Ref(ShapeRef::new(name)));
        }
        Some(b'[') => {
            let values = parse_value_set(tok, prefixes)?;
            return Ok(ConstraintAtom::Node(NodeConstraint::value_set(values)));
        }
        Some(b'.') => {
            tok.pos += 1;
            return Ok(ConstraintAtom::Node(NodeConstraint::default()));
        }
        _ => {}
    }

    if let Some(kw) = tok.peek_keyword() {
        let node_kind = match kw {
            "IRI" => Some(NodeKind::Iri),
            "LITERAL" => Some(NodeKind::Literal),
            "BNODE" => Some(NodeKind::BlankNode),
            "NONLITERAL" => Some(NodeKind::BlankNodeOrIri),
            _ => None,
        };
        if let Some(kind) = node_kind {
            tok.consume_keyword(kw)?;
            return Ok(ConstraintAtom::Node(NodeConstraint::node_kind(kind)));
        }
    }

    let datatype = tok.read_iri_or_prefixed(prefixes)?;
    Ok(ConstraintAtom::Node(NodeConstraint::datatype(datatype)))
}

/// `predicate [constraint] [cardinality]`.
fn parse_triple_constraint(
    tok: &mut Tokenizer<'_>,
    prefixes: &HashMap<String, String>,
) -> Result<TripleConstraint, ShexParseError> {
    let predicate = tok.read_iri_or_prefixed(prefixes)?;

    let atom = match tok.peek() {
        None | Some(b';') | Some(b'}') | Some(b'|') | Some(b'?') | Some(b'*') | Some(b'+')
        | Some(b'{') => None,
        _ => Some(parse_constraint_atom(tok, prefixes)?),
    };

    let cardinality = parse_cardinality(tok)?;

    Ok(TripleConstraint {
        predicate: Iri::new(predicate),
        atom,
        cardinality,
        inverse: false,
    })
}

fn parse_shape_body(
    tok: &mut Tokenizer<'_>,
    prefixes: &HashMap<String, String>,
) -> Result<Option<TripleExpr>, ShexParseError> {
    tok.expect("{")?;
    let mut constraints = Vec::new();
    let mut alternation = false;
    while !tok.try_consume("}") {
        if tok.at_end() {
            return Err(tok.error("unterminated shape body, missing `}`"));
        }
        constraints.push(parse_triple_constraint(tok, prefixes)?);
        tok.try_consume(";");
        // Disjunction is accepted; its branches are kept at this level.
        if tok.try_consume("|") {
            alternation = true;
        }
        tok.try_consume("."); // tolerate stray periods (data errors)
    }

    if alternation && constraints.len() > 1 {
        return Ok(Some(TripleExpr::OneOf(
            constraints.into_iter().map(TripleExpr::Constraint).collect(),
        )));
    }
    Ok(expression_from_constraints(constraints))
}

/// Parse ShExC text into a [`ShexSchema`].
pub fn parse_shex(text: &str) -> Result<ShexSchema, ShexParseError> {
    let mut tok = Tokenizer::new(text);
    let mut prefix_map: HashMap<String, String> = HashMap::new();
    let mut prefixes: Vec<Prefix> = Vec::new();
    let mut start: Option<Iri> = None;
    let mut shapes: Vec<Shape> = Vec::new();

    while !tok.at_end() {
        if tok.at_keyword("PREFIX") {
            tok.consume_keyword("PREFIX")?;
            tok.skip_trivia();
            let bytes = tok.bytes();
            let name_start = tok.pos;
            let mut cursor = tok.pos;
            if cursor < bytes.len() && is_name_start(bytes[cursor]) {
                cursor += 1;
                while cursor < bytes.len() && is_name_continue(bytes[cursor]) {
                    cursor += 1;
                }
            }
            if bytes.get(cursor) != Some(&b':') {
                return Err(tok.error("expected prefix name ending in `:`"));
            }
            let name = tok.text[name_start..cursor].to_owned();
            tok.pos = cursor + 1;
            let iri = tok.read_iri_ref()?;
            prefix_map.insert(name.clone(), iri.clone());
            prefixes.push(Prefix::new(name, iri));
            continue;
        }

        if tok.at_keyword("start") {
            tok.consume_keyword("start")?;
            tok.expect("=")?;
            tok.expect("@")?;
            start = Some(Iri::new(tok.read_iri_ref()?));
            continue;
        }

        if tok.peek() == Some(b'<') {
            let name = tok.read_iri_ref()?;

            let mut extra: Vec<Iri> = Vec::new();
            let mut closed = false;
            loop {
                if tok.at_keyword("EXTRA") {
                    tok.consume_keyword("EXTRA")?;
                    loop {
                        match tok.peek() {
                            Some(b'{') | None => break,
                            _ => {}
                        }
                        if tok.at_keyword("CLOSED") || tok.at_keyword("EXTRA") {
                            break;
                        }
                        extra.push(Iri::new(tok.read_iri_or_prefixed(&prefix_map)?));
                    }
                } else if tok.at_keyword("CLOSED") {
                    tok.consume_keyword("CLOSED")?;
                    closed = true;
                } else {
                    break;
                }
            }

            let expression = parse_shape_body(&mut tok, &prefix_map)?;
            shapes.push(Shape {
                name: Iri::new(name),
                expression,
                closed,
                extra,
            });
            continue;
        }

        return Err(tok.error("unexpected token"));
    }

    Ok(ShexSchema {
        shapes,
        prefixes,
        start,
    })
}
