//! Tests for AST standardization

use rpal::ast::{AstNode, NodeKind};
use rpal::lexer;
use rpal::parser::{parse, ParseState};
use rpal::standardize::{standardize, StandardizeError};

fn parse_source(source: &str) -> AstNode {
    let tokens = lexer::lex(source).expect("lexing failed");
    let mut state = ParseState::new(tokens);
    parse(&mut state).expect("parsing failed")
}

fn standardize_source(source: &str) -> AstNode {
    standardize(parse_source(source)).expect("standardization failed")
}

fn int(text: &str) -> AstNode {
    AstNode::leaf(NodeKind::Integer, text)
}

fn gamma(rator: AstNode, rand: AstNode) -> AstNode {
    AstNode::branch(NodeKind::Gamma, vec![rator, rand])
}

fn lambda(param: AstNode, body: AstNode) -> AstNode {
    AstNode::branch(NodeKind::Lambda, vec![param, body])
}

#[test]
fn let_becomes_applied_lambda() {
    let tree = standardize_source("let x = 5 in x");
    let expected = gamma(lambda(AstNode::ident("x"), AstNode::ident("x")), int("5"));
    assert_eq!(tree, expected);
}

#[test]
fn where_is_let_turned_inside_out() {
    assert_eq!(
        standardize_source("x where x = 5"),
        standardize_source("let x = 5 in x")
    );
}

#[test]
fn function_form_builds_a_lambda_chain() {
    // let f x y = x in f  =>  (fn f. f) (fn x. fn y. x)
    let tree = standardize_source("let f x y = x in f");
    let chain = lambda(
        AstNode::ident("x"),
        lambda(AstNode::ident("y"), AstNode::ident("x")),
    );
    let expected = gamma(lambda(AstNode::ident("f"), AstNode::ident("f")), chain);
    assert_eq!(tree, expected);
}

#[test]
fn multi_parameter_lambda_nests() {
    let tree = standardize_source("fn x y z . x");
    let expected = lambda(
        AstNode::ident("x"),
        lambda(
            AstNode::ident("y"),
            lambda(AstNode::ident("z"), AstNode::ident("x")),
        ),
    );
    assert_eq!(tree, expected);
}

#[test]
fn tuple_pattern_lambda_is_not_expanded() {
    let tree = standardize_source("fn (a, b) . a");
    let expected = lambda(
        AstNode::branch(
            NodeKind::Comma,
            vec![AstNode::ident("a"), AstNode::ident("b")],
        ),
        AstNode::ident("a"),
    );
    assert_eq!(tree, expected);
}

#[test]
fn at_becomes_nested_application() {
    let tree = standardize_source("2 @f 3");
    let expected = gamma(gamma(AstNode::ident("f"), int("2")), int("3"));
    assert_eq!(tree, expected);
}

#[test]
fn within_nests_the_first_definition() {
    // let x = 2 within y = x in y  =>  (fn y. y) ((fn x. x) 2)
    let tree = standardize_source("let x = 2 within y = x in y");
    let expected = gamma(
        lambda(AstNode::ident("y"), AstNode::ident("y")),
        gamma(lambda(AstNode::ident("x"), AstNode::ident("x")), int("2")),
    );
    assert_eq!(tree, expected);
}

#[test]
fn simultaneous_definitions_become_tuple_pattern() {
    let tree = standardize_source("let a = 1 and b = 2 in a");
    let expected = gamma(
        lambda(
            AstNode::branch(
                NodeKind::Comma,
                vec![AstNode::ident("a"), AstNode::ident("b")],
            ),
            AstNode::ident("a"),
        ),
        AstNode::branch(NodeKind::Tau, vec![int("1"), int("2")]),
    );
    assert_eq!(tree, expected);
}

#[test]
fn rec_introduces_the_y_combinator() {
    let tree = standardize_source("let rec f = f in f");
    let expected = gamma(
        lambda(AstNode::ident("f"), AstNode::ident("f")),
        gamma(
            AstNode::new(NodeKind::Ystar),
            lambda(AstNode::ident("f"), AstNode::ident("f")),
        ),
    );
    assert_eq!(tree, expected);
}

#[test]
fn standardization_is_a_fixed_point() {
    let sources = [
        "let x = 5 in x",
        "x where x = 5",
        "let Rec f n = n eq 0 -> 1 | n * f (n - 1) in Print (f 5)",
        "let a = 1 and b = 2 in a + b",
        "let x = 2 within y = x in y",
        "2 @f 3",
        "fn x y . x + y",
    ];
    for source in sources {
        let once = standardize_source(source);
        let twice = standardize(once.clone()).expect("second standardization failed");
        assert_eq!(once, twice, "source: {source}");
    }
}

#[test]
fn no_surface_kinds_survive() {
    let tree = standardize_source(
        "let Rec f n = n eq 0 -> 1 | n * f (n - 1) \
         in Print (f 3, 2 @f 3, x where x = f 1) \
         where x = 1",
    );
    for node in tree.pre_order() {
        assert!(
            !node.kind.is_surface(),
            "surface kind {:?} in standardized tree",
            node.kind
        );
    }
}

#[test]
fn every_lambda_has_parameter_and_body() {
    let tree = standardize_source(
        "let f x y = x in let g (a, b) c = a in fn u . f (g (1, 2) 3) u",
    );
    for node in tree.pre_order() {
        if node.kind == NodeKind::Lambda {
            assert_eq!(node.children.len(), 2);
            let param = &node.children[0];
            match param.kind {
                NodeKind::Identifier => {}
                NodeKind::Comma => {
                    assert!(param
                        .children
                        .iter()
                        .all(|c| c.kind == NodeKind::Identifier));
                }
                other => panic!("unexpected lambda parameter kind {other:?}"),
            }
        }
    }
}

#[test]
fn rec_copies_are_structural() {
    // the bound name appears in two distinct places with the same content
    let tree = standardize_source("let rec f = f in f");
    let rand = &tree.children[1]; // gamma(Y*, fn f. f)
    let copy_one = &rand.children[1].children[0];
    assert_eq!(copy_one, &AstNode::ident("f"));
}

#[test]
fn malformed_within_is_rejected() {
    let tree = AstNode::branch(
        NodeKind::Within,
        vec![AstNode::ident("x"), AstNode::ident("y")],
    );
    match standardize(tree) {
        Err(StandardizeError::MalformedTree(_)) => {}
        other => panic!("expected MalformedTree, got {other:?}"),
    }
}

#[test]
fn malformed_let_is_rejected() {
    let tree = AstNode::branch(
        NodeKind::Let,
        vec![AstNode::ident("x"), AstNode::ident("y")],
    );
    match standardize(tree) {
        Err(StandardizeError::MalformedTree(_)) => {}
        other => panic!("expected MalformedTree, got {other:?}"),
    }
}
