//! The RPAL grammar, one function per nonterminal.
//!
//! Precedence is encoded by the call chain: `expression` (let/fn) down
//! through tuples, `aug`, conditionals, boolean and arithmetic operators, to
//! application by juxtaposition and the atomic rands. Definitions (`D`
//! through `Vl`) hang off `let` and `where`.

use crate::ast::{AstNode, NodeKind};

use super::{
    expect_ampersand, expect_arrow, expect_at_sign, expect_bar, expect_comma, expect_dot,
    expect_double_star, expect_equals, expect_greater, expect_greater_equals, expect_less,
    expect_less_equals, expect_lparen, expect_minus, expect_plus, expect_rparen, expect_slash,
    expect_star, ident, integer, keyword, many1, optional, string_literal, BoxedParser,
    ParseError, ParseResult, ParseState, Parser,
};

/// Parse a whole program: one expression covering every token.
pub fn parse(state: &mut ParseState) -> ParseResult<AstNode> {
    let program = expression().parse(state)?;
    if let Some(tok) = state.peek() {
        return Err(ParseError::new("unexpected token after end of program").found(tok));
    }
    Ok(program)
}

/// e := "let" d "in" e | "fn" vb+ "." e | ew
pub fn expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();

        if keyword("let").parse(state).is_ok() {
            let def = definition().parse(state)?;
            keyword("in").parse(state)?;
            let body = expression().parse(state)?;
            return Ok(AstNode::branch(NodeKind::Let, vec![def, body]));
        }
        state.restore(pos);

        if keyword("fn").parse(state).is_ok() {
            let mut children = many1(var_binding()).parse(state)?;
            expect_dot().parse(state)?;
            children.push(expression().parse(state)?);
            return Ok(AstNode::branch(NodeKind::Lambda, children));
        }
        state.restore(pos);

        where_expression().parse(state)
    })
}

/// ew := t "where" dr | t
pub fn where_expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let expr = tuple_expression().parse(state)?;
        if optional(keyword("where")).parse(state)?.is_some() {
            let def = rec_definition().parse(state)?;
            return Ok(AstNode::branch(NodeKind::Where, vec![expr, def]));
        }
        Ok(expr)
    })
}

/// t := ta ("," ta)+ | ta
pub fn tuple_expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut items = vec![aug_expression().parse(state)?];
        while optional(expect_comma()).parse(state)?.is_some() {
            items.push(aug_expression().parse(state)?);
        }
        if items.len() > 1 {
            Ok(AstNode::branch(NodeKind::Tau, items))
        } else {
            Ok(items.into_iter().next().unwrap())
        }
    })
}

/// ta := ta "aug" tc | tc
pub fn aug_expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut left = conditional().parse(state)?;
        while optional(keyword("aug")).parse(state)?.is_some() {
            let right = conditional().parse(state)?;
            left = AstNode::branch(NodeKind::Aug, vec![left, right]);
        }
        Ok(left)
    })
}

/// tc := b "->" tc "|" tc | b
pub fn conditional() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let guard = or_expression().parse(state)?;
        if optional(expect_arrow()).parse(state)?.is_some() {
            let then_branch = conditional().parse(state)?;
            expect_bar().parse(state)?;
            let else_branch = conditional().parse(state)?;
            return Ok(AstNode::branch(
                NodeKind::Conditional,
                vec![guard, then_branch, else_branch],
            ));
        }
        Ok(guard)
    })
}

/// b := b "or" bt | bt
pub fn or_expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut left = and_expression().parse(state)?;
        while optional(keyword("or")).parse(state)?.is_some() {
            let right = and_expression().parse(state)?;
            left = AstNode::branch(NodeKind::Or, vec![left, right]);
        }
        Ok(left)
    })
}

/// bt := bt "&" bs | bs
pub fn and_expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut left = not_expression().parse(state)?;
        while optional(expect_ampersand()).parse(state)?.is_some() {
            let right = not_expression().parse(state)?;
            left = AstNode::branch(NodeKind::And, vec![left, right]);
        }
        Ok(left)
    })
}

/// bs := "not" bp | bp
pub fn not_expression() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        if optional(keyword("not")).parse(state)?.is_some() {
            let operand = comparison().parse(state)?;
            return Ok(AstNode::branch(NodeKind::Not, vec![operand]));
        }
        comparison().parse(state)
    })
}

/// bp := a ("gr"|">" | "ge"|">=" | "ls"|"<" | "le"|"<=" | "eq" | "ne") a | a
pub fn comparison() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let left = arithmetic().parse(state)?;
        let comparators = [
            (keyword("gr") | expect_greater(), NodeKind::Gr),
            (keyword("ge") | expect_greater_equals(), NodeKind::Ge),
            (keyword("ls") | expect_less(), NodeKind::Ls),
            (keyword("le") | expect_less_equals(), NodeKind::Le),
            (keyword("eq"), NodeKind::Eq),
            (keyword("ne"), NodeKind::Ne),
        ];
        for (comparator, kind) in comparators {
            if optional(comparator).parse(state)?.is_some() {
                let right = arithmetic().parse(state)?;
                return Ok(AstNode::branch(kind, vec![left, right]));
            }
        }
        Ok(left)
    })
}

/// a := a "+" at | a "-" at | "+" at | "-" at | at
pub fn arithmetic() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();
        let mut left = if expect_plus().parse(state).is_ok() {
            term().parse(state)?
        } else {
            state.restore(pos);
            if expect_minus().parse(state).is_ok() {
                AstNode::branch(NodeKind::Neg, vec![term().parse(state)?])
            } else {
                state.restore(pos);
                term().parse(state)?
            }
        };

        loop {
            let pos = state.position();
            if expect_plus().parse(state).is_ok() {
                left = AstNode::branch(NodeKind::Plus, vec![left, term().parse(state)?]);
                continue;
            }
            state.restore(pos);
            if expect_minus().parse(state).is_ok() {
                left = AstNode::branch(NodeKind::Minus, vec![left, term().parse(state)?]);
                continue;
            }
            state.restore(pos);
            break;
        }
        Ok(left)
    })
}

/// at := at "*" af | at "/" af | af
pub fn term() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut left = factor().parse(state)?;
        loop {
            let pos = state.position();
            if expect_star().parse(state).is_ok() {
                left = AstNode::branch(NodeKind::Mult, vec![left, factor().parse(state)?]);
                continue;
            }
            state.restore(pos);
            if expect_slash().parse(state).is_ok() {
                left = AstNode::branch(NodeKind::Div, vec![left, factor().parse(state)?]);
                continue;
            }
            state.restore(pos);
            break;
        }
        Ok(left)
    })
}

/// af := ap "**" af | ap
pub fn factor() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let base = infix_application().parse(state)?;
        if optional(expect_double_star()).parse(state)?.is_some() {
            let exponent = factor().parse(state)?;
            return Ok(AstNode::branch(NodeKind::Exp, vec![base, exponent]));
        }
        Ok(base)
    })
}

/// ap := ap "@" ident r | r
pub fn infix_application() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut left = application().parse(state)?;
        while optional(expect_at_sign()).parse(state)?.is_some() {
            let name = ident().parse(state)?;
            let right = application().parse(state)?;
            left = AstNode::branch(NodeKind::At, vec![left, AstNode::ident(name.value), right]);
        }
        Ok(left)
    })
}

/// r := r rn | rn
pub fn application() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut expr = rand().parse(state)?;
        loop {
            let pos = state.position();
            match rand().parse(state) {
                Ok(arg) => expr = AstNode::branch(NodeKind::Gamma, vec![expr, arg]),
                Err(_) => {
                    state.restore(pos);
                    break;
                }
            }
        }
        Ok(expr)
    })
}

/// rn := ident | integer | string | "true" | "false" | "nil" | "dummy" | "(" e ")"
pub fn rand() -> BoxedParser<AstNode> {
    let literal = (ident() >> |id| AstNode::ident(id.value))
        | (string_literal() >> |s| AstNode::leaf(NodeKind::Str, unescape(&s.value)))
        | (keyword("true") >> |_| AstNode::new(NodeKind::True))
        | (keyword("false") >> |_| AstNode::new(NodeKind::False))
        | (keyword("nil") >> |_| AstNode::new(NodeKind::Nil))
        | (keyword("dummy") >> |_| AstNode::new(NodeKind::Dummy));

    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();
        if let Ok(node) = literal.parse(state) {
            return Ok(node);
        }
        state.restore(pos);

        if let Ok(int) = integer().parse(state) {
            if int.value.parse::<i64>().is_err() {
                return Err(ParseError::new("integer literal out of range"));
            }
            return Ok(AstNode::leaf(NodeKind::Integer, int.value));
        }
        state.restore(pos);

        if expect_lparen().parse(state).is_ok() {
            let expr = expression().parse(state)?;
            expect_rparen().parse(state)?;
            return Ok(expr);
        }
        state.restore(pos);

        Err(match state.peek() {
            Some(tok) => ParseError::new("unexpected token")
                .expected("an expression")
                .found(tok),
            None => ParseError::new("unexpected end of input").expected("an expression"),
        })
    })
}

/// d := da "within" d | da
pub fn definition() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let def = simult_definition().parse(state)?;
        if optional(keyword("within")).parse(state)?.is_some() {
            let inner = definition().parse(state)?;
            return Ok(AstNode::branch(NodeKind::Within, vec![def, inner]));
        }
        Ok(def)
    })
}

/// da := dr ("and" dr)+ | dr
pub fn simult_definition() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut defs = vec![rec_definition().parse(state)?];
        while optional(keyword("and")).parse(state)?.is_some() {
            defs.push(rec_definition().parse(state)?);
        }
        if defs.len() > 1 {
            Ok(AstNode::branch(NodeKind::Simultdef, defs))
        } else {
            Ok(defs.into_iter().next().unwrap())
        }
    })
}

/// dr := "rec" db | db
pub fn rec_definition() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        if optional(keyword("rec") | keyword("Rec")).parse(state)?.is_some() {
            let def = basic_definition().parse(state)?;
            return Ok(AstNode::branch(NodeKind::Rec, vec![def]));
        }
        basic_definition().parse(state)
    })
}

/// db := "(" d ")" | ident vb+ "=" e | vl "=" e
pub fn basic_definition() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();

        if expect_lparen().parse(state).is_ok() {
            if let Ok(def) = definition().parse(state) {
                if expect_rparen().parse(state).is_ok() {
                    return Ok(def);
                }
            }
        }
        state.restore(pos);

        if let Ok(fcn) = fcn_form().parse(state) {
            return Ok(fcn);
        }
        state.restore(pos);

        let names = var_list().parse(state)?;
        expect_equals().parse(state)?;
        let value = expression().parse(state)?;
        Ok(AstNode::branch(NodeKind::Equal, vec![names, value]))
    })
}

/// fcn_form := ident vb+ "=" e
pub fn fcn_form() -> BoxedParser<AstNode> {
    ((ident() + many1(var_binding()) - expect_equals()) + expression())
        >> |((name, params), body)| {
            let mut children = vec![AstNode::ident(name.value)];
            children.extend(params);
            children.push(body);
            AstNode::branch(NodeKind::FcnForm, children)
        }
}

/// vb := ident | "(" vl ")" | "(" ")"
pub fn var_binding() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();
        if let Ok(id) = ident().parse(state) {
            return Ok(AstNode::ident(id.value));
        }
        state.restore(pos);

        expect_lparen().parse(state)?;
        let inner = state.position();
        if expect_rparen().parse(state).is_ok() {
            // an empty parameter: binds its argument to an unreferencable name
            return Ok(AstNode::ident("()"));
        }
        state.restore(inner);

        let names = var_list().parse(state)?;
        expect_rparen().parse(state)?;
        Ok(names)
    })
}

/// vl := ident ("," ident)*
pub fn var_list() -> BoxedParser<AstNode> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = ident().parse(state)?;
        let mut names = vec![AstNode::ident(first.value)];
        while optional(expect_comma()).parse(state)?.is_some() {
            names.push(AstNode::ident(ident().parse(state)?.value));
        }
        if names.len() > 1 {
            Ok(AstNode::branch(NodeKind::Comma, names))
        } else {
            Ok(names.into_iter().next().unwrap())
        }
    })
}

/// Decode the `\t \n \\ \'` escapes of a string literal and strip its quotes.
fn unescape(raw: &str) -> String {
    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}
