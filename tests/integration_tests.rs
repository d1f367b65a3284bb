//! End-to-end pipeline tests: whole programs through every phase, plus the
//! printed tree formats the CLI flags expose.

use rpal::ast::AstNode;
use rpal::cse::{build, evaluate};
use rpal::fmt::format_ast;
use rpal::lexer;
use rpal::parser::{parse, ParseState};
use rpal::standardize::standardize;

fn parse_source(source: &str) -> AstNode {
    let tokens = lexer::lex(source).expect("lexing failed");
    let mut state = ParseState::new(tokens);
    parse(&mut state).expect("parsing failed")
}

fn output(source: &str) -> String {
    let standardized = standardize(parse_source(source)).expect("standardization failed");
    let structure = build(&standardized).expect("control building failed");
    let mut out = Vec::new();
    evaluate(&structure, &mut out).expect("evaluation failed");
    String::from_utf8(out).expect("non-utf8 output")
}

#[test]
fn ast_print_format() {
    let tree = parse_source("let x = 5 in Print x");
    let expected = "\
let
.=
..<ID:x>
..<INT:5>
.gamma
..<ID:Print>
..<ID:x>
";
    assert_eq!(format_ast(&tree), expected);
}

#[test]
fn standardized_print_format() {
    let standardized =
        standardize(parse_source("let x = 5 in Print x")).expect("standardization failed");
    let expected = "\
gamma
.lambda
..<ID:x>
..gamma
...<ID:Print>
...<ID:x>
.<INT:5>
";
    assert_eq!(format_ast(&standardized), expected);
}

#[test]
fn literal_leaves_render_with_their_payload() {
    let tree = parse_source("'hi', 1, true, false, nil, dummy");
    let expected = "\
tau
.<STR:'hi'>
.<INT:1>
.<true>
.<false>
.<nil>
.<dummy>
";
    assert_eq!(format_ast(&tree), expected);
}

#[test]
fn factorial_with_comments_and_newlines() {
    let source = "\
// factorial, the classic
let Rec fact n =
    n eq 0 -> 1 | n * fact(n - 1)
in Print(fact 6)
";
    assert_eq!(output(source), "720");
}

#[test]
fn string_escapes_reach_the_output() {
    assert_eq!(output(r"Print('line1\nline2')"), "line1\nline2");
    assert_eq!(output(r"Print('a\tb')"), "a\tb");
}

#[test]
fn conc_chains() {
    assert_eq!(output("Print(Conc (Conc 'a' 'b') 'c')"), "abc");
}

#[test]
fn nested_lets_and_shadowing() {
    assert_eq!(output("let x = 1 in let y = 2 in Print(x + y)"), "3");
    assert_eq!(output("let x = 1 in let x = 2 in Print x"), "2");
}

#[test]
fn higher_order_functions() {
    assert_eq!(
        output("let twice f x = f (f x) in let inc n = n + 1 in Print(twice inc 5)"),
        "7"
    );
}

#[test]
fn closures_capture_their_environment() {
    assert_eq!(
        output("let make n = (fn x . x + n) in let add2 = make 2 in Print(add2 40)"),
        "42"
    );
}

#[test]
fn within_scopes_the_first_definition() {
    assert_eq!(output("let x = 2 within y = x + 1 in Print y"), "3");
}

#[test]
fn simultaneous_definitions_do_not_see_each_other() {
    // a and b bind simultaneously from the outer scope
    assert_eq!(
        output("let a = 1 in let a = 10 and b = a in Print(a + b)"),
        "11"
    );
}

#[test]
fn at_infix_application() {
    assert_eq!(output("let add x y = x + y in Print(2 @add 3)"), "5");
}

#[test]
fn empty_parameter_binds_nothing() {
    assert_eq!(output("let f () = 42 in Print(f dummy)"), "42");
}

#[test]
fn where_clause() {
    assert_eq!(output("Print(x * x) where x = 6"), "36");
}

#[test]
fn lambda_closures_print_their_first_binding() {
    assert_eq!(output("Print(fn x . x)"), "[lambda closure: x: 1]");
}

#[test]
fn tuple_of_mixed_values() {
    assert_eq!(
        output("Print(1, 'two', true, nil, (2, 3))"),
        "(1, two, true, nil, (2, 3))"
    );
}

#[test]
fn string_builder_loop() {
    let source = "\
let rec repeat s n = n eq 0 -> '' | Conc s (repeat s (n - 1))
in Print(repeat 'ab' 3)
";
    assert_eq!(output(source), "ababab");
}

#[test]
fn operands_evaluate_right_to_left() {
    // the control sequence is consumed from the right, so the rightmost
    // tuple element runs first even though it becomes element 2
    assert_eq!(output("let t = (Print 1, Print 2) in Print(Order t)"), "212");
}
