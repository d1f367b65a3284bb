//! Standardization - rewrite the surface tree into canonical form
//!
//! A bottom-up pass that eliminates every surface definition form, leaving
//! only lambdas, applications (`gamma`), tuple constructors, the recursion
//! combinator and operators:
//!
//! - `let X = E in P` becomes `(fn X. P) E`, and `P where X = E` is the
//!   same binding written the other way round
//! - function forms and multi-parameter lambdas become nested lambdas
//! - `within` nests one definition's scope inside another
//! - simultaneous definitions become one tuple-pattern binding
//! - `rec` introduces the `Y*` combinator
//! - `E1 @ n E2` becomes `(n E1) E2`
//!
//! Children are standardized before their parent, so every rule may assume
//! its operands are already canonical. Shapes the parser cannot emit fail
//! with [`StandardizeError`].

use std::fmt;

use crate::ast::{AstNode, NodeKind};

/// A structural invariant was violated; this denotes a parser bug rather
/// than a user mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardizeError {
    MalformedTree(String),
}

impl StandardizeError {
    fn malformed(msg: impl Into<String>) -> Self {
        StandardizeError::MalformedTree(msg.into())
    }
}

impl fmt::Display for StandardizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StandardizeError::MalformedTree(msg) => write!(f, "Malformed tree: {}", msg),
        }
    }
}

impl std::error::Error for StandardizeError {}

/// Standardize a tree bottom-up.
pub fn standardize(node: AstNode) -> Result<AstNode, StandardizeError> {
    let AstNode {
        kind,
        value,
        children,
    } = node;

    // standardize the children first
    let children = children
        .into_iter()
        .map(standardize)
        .collect::<Result<Vec<_>, _>>()?;

    match kind {
        // let X = E in P  becomes  (fn X. P) E
        NodeKind::Let => {
            let (equal, p) = take_two(children, "let-binding needs a definition and a body")?;
            let_to_gamma(equal, p)
        }
        // P where X = E  is  let X = E in P, then the let rule applies
        NodeKind::Where => {
            let (p, equal) = take_two(children, "where-clause needs a body and a definition")?;
            let_to_gamma(equal, p)
        }
        // F V1 .. Vn = E  becomes  F = fn V1. .. fn Vn. E
        NodeKind::FcnForm => {
            let mut rest = children.into_iter();
            let name = rest
                .next()
                .ok_or_else(|| StandardizeError::malformed("function form without a name"))?;
            let chain = lambda_chain(rest.collect())?;
            Ok(AstNode::branch(NodeKind::Equal, vec![name, chain]))
        }
        // fn V1 .. Vn. E  becomes  fn V1. .. fn Vn. E
        NodeKind::Lambda => {
            if children.len() > 2 {
                let mut rest = children.into_iter();
                let first = rest.next().unwrap();
                let chain = lambda_chain(rest.collect())?;
                Ok(AstNode::branch(NodeKind::Lambda, vec![first, chain]))
            } else {
                Ok(AstNode {
                    kind,
                    value,
                    children,
                })
            }
        }
        // E1 @ N E2  becomes  (N E1) E2
        NodeKind::At => {
            let (e1, n, e2) = take_three(children, "infix application needs two operands")?;
            Ok(AstNode::branch(
                NodeKind::Gamma,
                vec![AstNode::branch(NodeKind::Gamma, vec![n, e1]), e2],
            ))
        }
        // X1 = E1 within X2 = E2  becomes  X2 = (fn X1. E2) E1
        NodeKind::Within => {
            let (outer, inner) = take_two(children, "within needs two definitions")?;
            let (x1, e1) = split_equal(outer, "within: not a definition")?;
            let (x2, e2) = split_equal(inner, "within: not a definition")?;
            Ok(AstNode::branch(
                NodeKind::Equal,
                vec![
                    x2,
                    AstNode::branch(
                        NodeKind::Gamma,
                        vec![AstNode::branch(NodeKind::Lambda, vec![x1, e2]), e1],
                    ),
                ],
            ))
        }
        // X1 = E1 and .. and Xn = En  becomes  X1, .., Xn = E1, .., En
        NodeKind::Simultdef => {
            let mut names = Vec::with_capacity(children.len());
            let mut values = Vec::with_capacity(children.len());
            for child in children {
                let (x, e) = split_equal(child, "simultaneous definition: not a definition")?;
                names.push(x);
                values.push(e);
            }
            Ok(AstNode::branch(
                NodeKind::Equal,
                vec![
                    AstNode::branch(NodeKind::Comma, names),
                    AstNode::branch(NodeKind::Tau, values),
                ],
            ))
        }
        // rec X = E  becomes  X = Y* (fn X. E)
        NodeKind::Rec => {
            let equal = take_one(children, "rec needs a definition")?;
            let (x, e) = split_equal(equal, "rec: not a definition")?;
            // the bound name ends up in two places, as two structural copies
            let x_copy = x.clone();
            Ok(AstNode::branch(
                NodeKind::Equal,
                vec![
                    x_copy,
                    AstNode::branch(
                        NodeKind::Gamma,
                        vec![
                            AstNode::new(NodeKind::Ystar),
                            AstNode::branch(NodeKind::Lambda, vec![x, e]),
                        ],
                    ),
                ],
            ))
        }
        // Operators, conditionals, tuples and literals are already canonical.
        _ => Ok(AstNode {
            kind,
            value,
            children,
        }),
    }
}

/// The let rule, shared with `where`.
fn let_to_gamma(equal: AstNode, p: AstNode) -> Result<AstNode, StandardizeError> {
    let (x, e) = split_equal(equal, "binding is not a definition")?;
    Ok(AstNode::branch(
        NodeKind::Gamma,
        vec![AstNode::branch(NodeKind::Lambda, vec![x, p]), e],
    ))
}

/// Nest `V1, V2, .., Vn, E` into right-associated lambdas.
///
/// A single trailing item is returned unchanged; a comma parameter stays the
/// tuple pattern of one lambda rather than expanding into nested lambdas.
fn lambda_chain(mut items: Vec<AstNode>) -> Result<AstNode, StandardizeError> {
    match items.len() {
        0 => Err(StandardizeError::malformed("lambda chain without a body")),
        1 => Ok(items.pop().unwrap()),
        _ => {
            let first = items.remove(0);
            let rest = lambda_chain(items)?;
            Ok(AstNode::branch(NodeKind::Lambda, vec![first, rest]))
        }
    }
}

fn split_equal(node: AstNode, msg: &str) -> Result<(AstNode, AstNode), StandardizeError> {
    if node.kind != NodeKind::Equal {
        return Err(StandardizeError::malformed(msg));
    }
    take_two(node.children, msg)
}

fn take_one(children: Vec<AstNode>, msg: &str) -> Result<AstNode, StandardizeError> {
    let mut it = children.into_iter();
    match (it.next(), it.next()) {
        (Some(a), None) => Ok(a),
        _ => Err(StandardizeError::malformed(msg)),
    }
}

fn take_two(children: Vec<AstNode>, msg: &str) -> Result<(AstNode, AstNode), StandardizeError> {
    let mut it = children.into_iter();
    match (it.next(), it.next(), it.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        _ => Err(StandardizeError::malformed(msg)),
    }
}

fn take_three(
    children: Vec<AstNode>,
    msg: &str,
) -> Result<(AstNode, AstNode, AstNode), StandardizeError> {
    let mut it = children.into_iter();
    match (it.next(), it.next(), it.next(), it.next()) {
        (Some(a), Some(b), Some(c), None) => Ok((a, b, c)),
        _ => Err(StandardizeError::malformed(msg)),
    }
}
