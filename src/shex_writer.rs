//! ShExC writer.
//!
//! Pretty-prints a [`ShexSchema`]: `PREFIX` declarations in input order,
//! the `start` declaration, then each shape with its `EXTRA`/`CLOSED`
//! modifiers and `;`-separated triple constraints. Cardinalities use the
//! shortest equivalent form.

use crate::common::{NodeKind, PrefixMap};
use crate::shex_model::{
    ConstraintAtom, NodeConstraint, Shape, ShexSchema, TripleConstraint, TripleExpr, ValueSetValue,
};

fn node_kind_keyword(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Iri => "IRI",
        NodeKind::Literal => "LITERAL",
        NodeKind::BlankNode => "BNODE",
        NodeKind::BlankNodeOrIri => "NONLITERAL",
        // No ShExC keyword for the remaining combinations.
        NodeKind::BlankNodeOrLiteral | NodeKind::IriOrLiteral => ".",
    }
}

fn write_value_set_value(value: &ValueSetValue, pm: &PrefixMap) -> String {
    match value {
        ValueSetValue::Stem(stem) => format!("<{}>~", stem.as_str()),
        ValueSetValue::Iri(iri) => pm.compact_iri(iri),
        ValueSetValue::Literal(lit) => {
            let mut out = format!("\"{}\"", lit.value);
            if let Some(datatype) = &lit.datatype {
                out.push_str("^^");
                out.push_str(&pm.compact_iri(datatype));
            } else if let Some(language) = &lit.language {
                out.push('@');
                out.push_str(language);
            }
            out
        }
    }
}

fn write_node_constraint(nc: &NodeConstraint, pm: &PrefixMap) -> String {
    if let Some(values) = &nc.values {
        let items: Vec<String> = values.iter().map(|v| write_value_set_value(v, pm)).collect();
        return format!("[ {} ]", items.join(" "));
    }
    if let Some(kind) = nc.node_kind {
        return node_kind_keyword(kind).to_owned();
    }
    if let Some(datatype) = &nc.datatype {
        return pm.compact_iri(datatype);
    }
    // A bare pattern has no ShExC slot in this subset; the constraint
    // degrades to unconstrained.
    ".".to_owned()
}

fn write_constraint(atom: Option<&ConstraintAtom>, pm: &PrefixMap) -> String {
    match atom {
        None => ".".to_owned(),
        Some(ConstraintAtom::Ref(shape_ref)) => format!("@<{}>", shape_ref.name),
        Some(ConstraintAtom::Node(nc)) => write_node_constraint(nc, pm),
    }
}

fn write_triple_constraint(tc: &TripleConstraint, pm: &PrefixMap) -> String {
    format!(
        "  {} {}{}",
        pm.compact_iri(&tc.predicate),
        write_constraint(tc.atom.as_ref(), pm),
        tc.cardinality.to_shexc()
    )
}

fn write_expression(expr: &TripleExpr, pm: &PrefixMap) -> String {
    match expr {
        TripleExpr::Constraint(tc) => write_triple_constraint(tc, pm),
        TripleExpr::EachOf(exprs) => exprs
            .iter()
            .map(|e| write_expression(e, pm))
            .collect::<Vec<_>>()
            .join(" ;\n"),
        TripleExpr::OneOf(exprs) => exprs
            .iter()
            .map(|e| write_expression(e, pm))
            .collect::<Vec<_>>()
            .join(" |\n"),
    }
}

fn write_shape(shape: &Shape, pm: &PrefixMap, lines: &mut Vec<String>) {
    let mut header = format!("<{}>", shape.name);
    if !shape.extra.is_empty() {
        let extras: Vec<String> = shape.extra.iter().map(|e| pm.compact_iri(e)).collect();
        header.push_str(&format!(" EXTRA {}", extras.join(" ")));
    }
    if shape.closed {
        header.push_str(" CLOSED");
    }

    match &shape.expression {
        Some(expr) => {
            lines.push(format!("{header} {{"));
            lines.push(write_expression(expr, pm));
            lines.push("}".to_owned());
        }
        None => lines.push(format!("{header} {{}}")),
    }
    lines.push(String::new());
}

/// Serialize a [`ShexSchema`] to ShExC text.
pub fn serialize_shex(schema: &ShexSchema) -> String {
    let pm = PrefixMap::new(&schema.prefixes);
    let mut lines: Vec<String> = Vec::new();

    for prefix in &schema.prefixes {
        lines.push(format!("PREFIX {}: <{}>", prefix.name, prefix.iri));
    }
    if !schema.prefixes.is_empty() {
        lines.push(String::new());
    }

    if let Some(start) = &schema.start {
        lines.push(format!("start = @<{start}>"));
        lines.push(String::new());
    }

    for shape in &schema.shapes {
        write_shape(shape, &pm, &mut lines);
    }

    lines.join("\n")
}
