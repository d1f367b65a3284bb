//! Control structure generation: flattening the standardized tree into
//! numbered delta blocks.
//!
//! Each delta is the pre-order linearization of one lambda body. A `LAMBDA`
//! encountered during the walk does *not* contribute its body to the current
//! delta; it allocates a new one and leaves a single `Lambda(δ)` token
//! behind. Conditionals compile to two arm deltas selected by a `Beta`
//! token at evaluation time.

use std::rc::Rc;

use crate::ast::{AstNode, NodeKind};
use crate::standardize::StandardizeError;

use super::env::{EnvRef, Environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Gr,
    Ge,
    Ls,
    Le,
    Eq,
    Ne,
    Plus,
    Minus,
    Mult,
    Div,
    Exp,
    Aug,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Or => "or",
            BinOp::And => "&",
            BinOp::Gr => "gr",
            BinOp::Ge => "ge",
            BinOp::Ls => "ls",
            BinOp::Le => "le",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::Plus => "+",
            BinOp::Minus => "-",
            BinOp::Mult => "*",
            BinOp::Div => "/",
            BinOp::Exp => "**",
            BinOp::Aug => "aug",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Not,
    Neg,
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Not => "not",
            UnOp::Neg => "neg",
        }
    }
}

/// One compiled control token.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlItem {
    /// An identifier, resolved against the current environment (Rule 1).
    Name(String),
    Integer(i64),
    Str(String),
    True,
    False,
    Nil,
    Dummy,
    Ystar,
    /// Apply the rator beneath the top of stack to the rand (Rule 3).
    Gamma,
    BinOp(BinOp),
    UnOp(UnOp),
    /// Form a tuple from the top `n` stack values (Rule 9).
    Tau(usize),
    /// Push a closure over the referenced delta (Rule 2).
    Lambda(usize),
    /// Select one of two conditional arm deltas by the stacked boolean
    /// (Rule 8).
    Beta { then_arm: usize, else_arm: usize },
}

/// A compiled control block: one lambda body as a flat token sequence plus
/// its formal parameters.
///
/// `defining_env` is the placeholder environment allocated when the delta
/// was *constructed*; it stays empty until the machine populates bindings.
/// Only δ₀'s is consulted at startup (it is the machine's e₀, parented by
/// the primitive environment).
#[derive(Debug, Clone)]
pub struct Delta {
    pub index: usize,
    pub bound_vars: Vec<String>,
    pub body: Vec<ControlItem>,
    pub defining_env: EnvRef,
}

/// The full compiled program: δ₀ plus every nested δ, densely numbered in
/// creation order.
#[derive(Debug)]
pub struct ControlStructure {
    pub deltas: Vec<Delta>,
}

impl ControlStructure {
    /// The program entry block, δ₀.
    pub fn root(&self) -> &Delta {
        &self.deltas[0]
    }
}

/// Flatten a standardized tree into its control structure.
pub fn build(root: &AstNode) -> Result<ControlStructure, StandardizeError> {
    let mut builder = Builder {
        deltas: Vec::new(),
        pending: Vec::new(),
        current_env: Environment::primitive(),
    };
    builder.new_delta(root, Vec::new());

    while let Some(pending) = builder.pending.pop() {
        let mut body = Vec::new();
        builder.linearize(pending.start, &mut body)?;
        builder.deltas[pending.index].body = body;
    }

    Ok(ControlStructure {
        deltas: builder.deltas,
    })
}

struct Pending<'a> {
    index: usize,
    start: &'a AstNode,
}

struct Builder<'a> {
    deltas: Vec<Delta>,
    pending: Vec<Pending<'a>>,
    current_env: EnvRef,
}

impl<'a> Builder<'a> {
    /// Allocate the next delta, its placeholder environment, and queue its
    /// body for linearization.
    fn new_delta(&mut self, start: &'a AstNode, bound_vars: Vec<String>) -> usize {
        let env = Environment::child_of(&self.current_env);
        self.current_env = Rc::clone(&env);

        let index = self.deltas.len();
        self.deltas.push(Delta {
            index,
            bound_vars,
            body: Vec::new(),
            defining_env: env,
        });
        self.pending.push(Pending { index, start });
        index
    }

    /// Pre-order walk of one delta body.
    fn linearize(
        &mut self,
        node: &'a AstNode,
        body: &mut Vec<ControlItem>,
    ) -> Result<(), StandardizeError> {
        match node.kind {
            NodeKind::Lambda => {
                let [param, lambda_body] = node.children.as_slice() else {
                    return Err(StandardizeError::MalformedTree(
                        "LAMBDA: expected a parameter and a body".into(),
                    ));
                };
                let bound_vars = bound_vars_of(param)?;
                let index = self.new_delta(lambda_body, bound_vars);
                body.push(ControlItem::Lambda(index));
                Ok(())
            }
            NodeKind::Conditional => {
                let [guard, then_branch, else_branch] = node.children.as_slice() else {
                    return Err(StandardizeError::MalformedTree(
                        "CONDITIONAL: expected a guard and two arms".into(),
                    ));
                };
                let then_arm = self.new_delta(then_branch, Vec::new());
                let else_arm = self.new_delta(else_branch, Vec::new());
                body.push(ControlItem::Beta { then_arm, else_arm });
                self.linearize(guard, body)
            }
            _ => {
                body.push(leaf_item(node)?);
                for child in &node.children {
                    self.linearize(child, body)?;
                }
                Ok(())
            }
        }
    }
}

/// The names bound by a lambda parameter: one identifier, or the members of
/// a `COMMA` tuple pattern.
fn bound_vars_of(param: &AstNode) -> Result<Vec<String>, StandardizeError> {
    match param.kind {
        NodeKind::Identifier => Ok(vec![ident_name(param)?]),
        NodeKind::Comma => param.children.iter().map(ident_name).collect(),
        _ => Err(StandardizeError::MalformedTree(format!(
            "LAMBDA: parameter must be an identifier or a tuple pattern, got {:?}",
            param.kind
        ))),
    }
}

fn ident_name(node: &AstNode) -> Result<String, StandardizeError> {
    if node.kind != NodeKind::Identifier {
        return Err(StandardizeError::MalformedTree(format!(
            "expected an identifier, got {:?}",
            node.kind
        )));
    }
    node.value
        .clone()
        .ok_or_else(|| StandardizeError::MalformedTree("identifier without a name".into()))
}

fn leaf_item(node: &AstNode) -> Result<ControlItem, StandardizeError> {
    let item = match node.kind {
        NodeKind::Identifier => ControlItem::Name(ident_name(node)?),
        NodeKind::Integer => {
            let text = node.value.as_deref().unwrap_or_default();
            let parsed = text.parse::<i64>().map_err(|_| {
                StandardizeError::MalformedTree(format!("integer literal out of range: {text}"))
            })?;
            ControlItem::Integer(parsed)
        }
        NodeKind::Str => ControlItem::Str(node.value.clone().unwrap_or_default()),
        NodeKind::True => ControlItem::True,
        NodeKind::False => ControlItem::False,
        NodeKind::Nil => ControlItem::Nil,
        NodeKind::Dummy => ControlItem::Dummy,
        NodeKind::Ystar => ControlItem::Ystar,
        NodeKind::Gamma => ControlItem::Gamma,
        NodeKind::Tau => ControlItem::Tau(node.children.len()),
        NodeKind::Or => ControlItem::BinOp(BinOp::Or),
        NodeKind::And => ControlItem::BinOp(BinOp::And),
        NodeKind::Gr => ControlItem::BinOp(BinOp::Gr),
        NodeKind::Ge => ControlItem::BinOp(BinOp::Ge),
        NodeKind::Ls => ControlItem::BinOp(BinOp::Ls),
        NodeKind::Le => ControlItem::BinOp(BinOp::Le),
        NodeKind::Eq => ControlItem::BinOp(BinOp::Eq),
        NodeKind::Ne => ControlItem::BinOp(BinOp::Ne),
        NodeKind::Plus => ControlItem::BinOp(BinOp::Plus),
        NodeKind::Minus => ControlItem::BinOp(BinOp::Minus),
        NodeKind::Mult => ControlItem::BinOp(BinOp::Mult),
        NodeKind::Div => ControlItem::BinOp(BinOp::Div),
        NodeKind::Exp => ControlItem::BinOp(BinOp::Exp),
        NodeKind::Aug => ControlItem::BinOp(BinOp::Aug),
        NodeKind::Not => ControlItem::UnOp(UnOp::Not),
        NodeKind::Neg => ControlItem::UnOp(UnOp::Neg),
        other => {
            return Err(StandardizeError::MalformedTree(format!(
                "{other:?} node in a standardized tree"
            )))
        }
    };
    Ok(item)
}
