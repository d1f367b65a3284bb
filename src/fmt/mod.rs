//! Pretty printer for RPAL trees.
//!
//! One node per line in pre-order, prefixed by one `.` per depth level, the
//! format the `-ast` and `-st` flags print:
//!
//! ```text
//! let
//! .=
//! ..<ID:x>
//! ..<INT:5>
//! .<ID:x>
//! ```

use std::fmt::Write;

use crate::ast::{AstNode, NodeKind};

/// Render a tree in the dotted pre-order format.
pub fn format_ast(root: &AstNode) -> String {
    let mut out = String::new();
    write_node(root, 0, &mut out);
    out
}

fn write_node(node: &AstNode, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push('.');
    }
    let _ = writeln!(out, "{}", node_label(node));
    for child in &node.children {
        write_node(child, depth + 1, out);
    }
}

/// The one-line label of a node: payload-carrying leaves render with their
/// payload, everything else by its canonical name.
fn node_label(node: &AstNode) -> String {
    let value = node.value.as_deref().unwrap_or_default();
    match node.kind {
        NodeKind::Identifier => format!("<ID:{}>", value),
        NodeKind::Integer => format!("<INT:{}>", value),
        NodeKind::Str => format!("<STR:'{}'>", value),
        other => kind_name(other).to_string(),
    }
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Let => "let",
        NodeKind::Where => "where",
        NodeKind::FcnForm => "function_form",
        NodeKind::At => "@",
        NodeKind::Within => "within",
        NodeKind::Simultdef => "and",
        NodeKind::Rec => "rec",
        NodeKind::Lambda => "lambda",
        NodeKind::Gamma => "gamma",
        NodeKind::Equal => "=",
        NodeKind::Comma => ",",
        NodeKind::Tau => "tau",
        NodeKind::Ystar => "<Y*>",
        NodeKind::True => "<true>",
        NodeKind::False => "<false>",
        NodeKind::Nil => "<nil>",
        NodeKind::Dummy => "<dummy>",
        NodeKind::Conditional => "->",
        NodeKind::Or => "or",
        NodeKind::And => "&",
        NodeKind::Not => "not",
        NodeKind::Gr => "gr",
        NodeKind::Ge => "ge",
        NodeKind::Ls => "ls",
        NodeKind::Le => "le",
        NodeKind::Eq => "eq",
        NodeKind::Ne => "ne",
        NodeKind::Plus => "+",
        NodeKind::Minus => "-",
        NodeKind::Neg => "neg",
        NodeKind::Mult => "*",
        NodeKind::Div => "/",
        NodeKind::Exp => "**",
        NodeKind::Aug => "aug",
        // payload leaves are labelled by node_label
        NodeKind::Identifier => "<ID>",
        NodeKind::Integer => "<INT>",
        NodeKind::Str => "<STR>",
    }
}
