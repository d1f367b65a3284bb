//! Tests for control-structure generation

use rpal::cse::{build, BinOp, ControlItem, ControlStructure};
use rpal::lexer;
use rpal::parser::{parse, ParseState};
use rpal::standardize::standardize;

fn build_source(source: &str) -> ControlStructure {
    let tokens = lexer::lex(source).expect("lexing failed");
    let mut state = ParseState::new(tokens);
    let program = parse(&mut state).expect("parsing failed");
    let standardized = standardize(program).expect("standardization failed");
    build(&standardized).expect("control building failed")
}

#[test]
fn flat_program_is_one_delta() {
    let structure = build_source("Print 5");
    assert_eq!(structure.deltas.len(), 1);
    assert_eq!(
        structure.root().body,
        vec![
            ControlItem::Gamma,
            ControlItem::Name("Print".to_string()),
            ControlItem::Integer(5),
        ]
    );
}

#[test]
fn lambda_bodies_become_their_own_deltas() {
    // let x = 5 in x  =>  (fn x. x) 5
    let structure = build_source("let x = 5 in x");
    assert_eq!(structure.deltas.len(), 2);

    assert_eq!(
        structure.deltas[0].body,
        vec![
            ControlItem::Gamma,
            ControlItem::Lambda(1),
            ControlItem::Integer(5),
        ]
    );
    assert_eq!(structure.deltas[1].bound_vars, vec!["x".to_string()]);
    assert_eq!(
        structure.deltas[1].body,
        vec![ControlItem::Name("x".to_string())]
    );
}

#[test]
fn delta_indices_are_dense_and_ordered() {
    let structure = build_source("let f x y = x + y in f 2 (let g z = z in g 3)");
    for (position, delta) in structure.deltas.iter().enumerate() {
        assert_eq!(delta.index, position);
    }
}

#[test]
fn nested_lambdas_number_in_creation_order() {
    let structure = build_source("fn x . fn y . x");
    assert_eq!(structure.deltas.len(), 3);
    assert_eq!(structure.deltas[0].body, vec![ControlItem::Lambda(1)]);
    assert_eq!(structure.deltas[1].bound_vars, vec!["x".to_string()]);
    assert_eq!(structure.deltas[1].body, vec![ControlItem::Lambda(2)]);
    assert_eq!(structure.deltas[2].bound_vars, vec!["y".to_string()]);
    assert_eq!(
        structure.deltas[2].body,
        vec![ControlItem::Name("x".to_string())]
    );
}

#[test]
fn sibling_lambdas_number_left_to_right() {
    let structure = build_source("(fn x . x) (fn y . y)");
    assert_eq!(structure.deltas.len(), 3);
    assert_eq!(
        structure.deltas[0].body,
        vec![
            ControlItem::Gamma,
            ControlItem::Lambda(1),
            ControlItem::Lambda(2),
        ]
    );
    assert_eq!(structure.deltas[1].bound_vars, vec!["x".to_string()]);
    assert_eq!(structure.deltas[2].bound_vars, vec!["y".to_string()]);
}

#[test]
fn tuple_pattern_binds_every_name() {
    let structure = build_source("fn (a, b, c) . a");
    assert_eq!(
        structure.deltas[1].bound_vars,
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[test]
fn tau_records_its_arity() {
    let structure = build_source("1, 2, 3");
    assert_eq!(
        structure.root().body,
        vec![
            ControlItem::Tau(3),
            ControlItem::Integer(1),
            ControlItem::Integer(2),
            ControlItem::Integer(3),
        ]
    );
}

#[test]
fn conditional_compiles_to_two_arm_deltas() {
    let structure = build_source("true -> 1 | 2");
    assert_eq!(structure.deltas.len(), 3);
    assert_eq!(
        structure.root().body,
        vec![
            ControlItem::Beta {
                then_arm: 1,
                else_arm: 2,
            },
            ControlItem::True,
        ]
    );
    assert_eq!(structure.deltas[1].body, vec![ControlItem::Integer(1)]);
    assert_eq!(structure.deltas[2].body, vec![ControlItem::Integer(2)]);
    assert!(structure.deltas[1].bound_vars.is_empty());
    assert!(structure.deltas[2].bound_vars.is_empty());
}

#[test]
fn operators_linearize_in_pre_order() {
    let structure = build_source("2 + 3 * 4");
    assert_eq!(
        structure.root().body,
        vec![
            ControlItem::BinOp(BinOp::Plus),
            ControlItem::Integer(2),
            ControlItem::BinOp(BinOp::Mult),
            ControlItem::Integer(3),
            ControlItem::Integer(4),
        ]
    );
}

#[test]
fn lambda_body_is_not_inlined_into_the_outer_delta() {
    let structure = build_source("(fn x . x + 1) 5");
    // the addition lives in δ1, not δ0
    assert!(!structure.root().body.contains(&ControlItem::BinOp(BinOp::Plus)));
    assert!(structure.deltas[1]
        .body
        .contains(&ControlItem::BinOp(BinOp::Plus)));
}

#[test]
fn recursion_compiles_to_ystar() {
    let structure = build_source("let rec f n = f n in f");
    assert!(structure
        .deltas
        .iter()
        .any(|delta| delta.body.contains(&ControlItem::Ystar)));
}
