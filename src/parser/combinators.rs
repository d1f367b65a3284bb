use std::ops::{Add, BitOr, Shr, Sub};
use std::rc::Rc;

use crate::lexer::{Token, KEYWORDS};

use super::{ParseError, ParseResult, ParseState, Parser};

// === Boxed Parser for type erasure ===

pub struct BoxedParser<T> {
    parser: Rc<dyn Fn(&mut ParseState) -> ParseResult<T>>,
}

impl<T> Clone for BoxedParser<T> {
    fn clone(&self) -> Self {
        BoxedParser {
            parser: Rc::clone(&self.parser),
        }
    }
}

impl<T: 'static> BoxedParser<T> {
    pub fn new<P: Parser<T> + 'static>(parser: P) -> Self {
        BoxedParser {
            parser: Rc::new(move |state| parser.parse(state)),
        }
    }

    /// Sequence: parse self then other, return (T, U)
    pub fn seq<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<(T, U)> {
        BoxedParser::new(move |state: &mut ParseState| {
            let a = self.parse(state)?;
            let b = other.parse(state)?;
            Ok((a, b))
        })
    }

    /// Keep left: parse self then other, discard other's result
    pub fn skip<U: 'static>(self, other: BoxedParser<U>) -> BoxedParser<T> {
        BoxedParser::new(move |state: &mut ParseState| {
            let a = self.parse(state)?;
            let _ = other.parse(state)?;
            Ok(a)
        })
    }

    /// Map: transform result
    pub fn map<U: 'static, F: Fn(T) -> U + 'static>(self, f: F) -> BoxedParser<U> {
        BoxedParser::new(move |state: &mut ParseState| {
            let a = self.parse(state)?;
            Ok(f(a))
        })
    }

    /// Choice: try self, if fails try other
    pub fn or(self, other: BoxedParser<T>) -> BoxedParser<T> {
        BoxedParser::new(move |state: &mut ParseState| {
            let pos = state.position();
            match self.parse(state) {
                Ok(a) => Ok(a),
                Err(_) => {
                    state.restore(pos);
                    other.parse(state)
                }
            }
        })
    }
}

impl<T> Parser<T> for BoxedParser<T> {
    fn parse(&self, state: &mut ParseState) -> ParseResult<T> {
        (self.parser)(state)
    }
}

// === Operator Overloading ===

/// `+` for sequence: A + B -> (A, B)
impl<T: 'static, U: 'static> Add<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<(T, U)>;

    fn add(self, rhs: BoxedParser<U>) -> Self::Output {
        self.seq(rhs)
    }
}

/// `-` for keep left: A - B -> A (parse B, discard result)
impl<T: 'static, U: 'static> Sub<BoxedParser<U>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn sub(self, rhs: BoxedParser<U>) -> Self::Output {
        self.skip(rhs)
    }
}

/// `|` for choice: A | B -> A or B
impl<T: 'static> BitOr<BoxedParser<T>> for BoxedParser<T> {
    type Output = BoxedParser<T>;

    fn bitor(self, rhs: BoxedParser<T>) -> Self::Output {
        self.or(rhs)
    }
}

/// `>>` for map: A >> fn -> B
impl<T: 'static, U: 'static, F: Fn(T) -> U + 'static> Shr<F> for BoxedParser<T> {
    type Output = BoxedParser<U>;

    fn shr(self, f: F) -> Self::Output {
        self.map(f)
    }
}

// === Primitive Parsers ===

/// Match a single token by predicate; `expected` feeds the error message.
pub fn token<F: Fn(&Token) -> bool + 'static>(
    predicate: F,
    expected: &'static str,
) -> BoxedParser<Token> {
    BoxedParser::new(move |state: &mut ParseState| match state.peek() {
        Some(tok) if predicate(tok) => Ok(state.next().unwrap()),
        Some(tok) => Err(ParseError::new("unexpected token")
            .expected(expected)
            .found(tok)),
        None => Err(ParseError::new("unexpected end of input").expected(expected)),
    })
}

/// Match an identifier token whose value is the given keyword.
pub fn keyword(word: &'static str) -> BoxedParser<Token> {
    token(
        move |t| matches!(t, Token::Ident(inner) if inner.value == word),
        word,
    )
}

/// Match a non-keyword identifier.
pub fn ident() -> BoxedParser<crate::lexer::Ident> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Ident(inner)) if !KEYWORDS.contains(&inner.value.as_str()) => {
            if let Some(Token::Ident(id)) = state.next() {
                Ok(id)
            } else {
                unreachable!()
            }
        }
        Some(tok) => Err(ParseError::new("unexpected token")
            .expected("identifier")
            .found(tok)),
        None => Err(ParseError::new("unexpected end of input").expected("identifier")),
    })
}

pub fn integer() -> BoxedParser<crate::lexer::Integer> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Integer(_)) => {
            if let Some(Token::Integer(int)) = state.next() {
                Ok(int)
            } else {
                unreachable!()
            }
        }
        Some(tok) => Err(ParseError::new("unexpected token")
            .expected("integer")
            .found(tok)),
        None => Err(ParseError::new("unexpected end of input").expected("integer")),
    })
}

pub fn string_literal() -> BoxedParser<crate::lexer::Str> {
    BoxedParser::new(|state: &mut ParseState| match state.peek() {
        Some(Token::Str(_)) => {
            if let Some(Token::Str(s)) = state.next() {
                Ok(s)
            } else {
                unreachable!()
            }
        }
        Some(tok) => Err(ParseError::new("unexpected token")
            .expected("string")
            .found(tok)),
        None => Err(ParseError::new("unexpected end of input").expected("string")),
    })
}

pub fn expect_arrow() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Arrow(_)), "'->'")
}

pub fn expect_double_star() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::DoubleStar(_)), "'**'")
}

pub fn expect_greater_equals() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::GreaterEquals(_)), "'>='")
}

pub fn expect_less_equals() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::LessEquals(_)), "'<='")
}

pub fn expect_greater() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Greater(_)), "'>'")
}

pub fn expect_less() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Less(_)), "'<'")
}

pub fn expect_plus() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Plus(_)), "'+'")
}

pub fn expect_minus() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Minus(_)), "'-'")
}

pub fn expect_star() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Star(_)), "'*'")
}

pub fn expect_slash() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Slash(_)), "'/'")
}

pub fn expect_lparen() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::LParen(_)), "'('")
}

pub fn expect_rparen() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::RParen(_)), "')'")
}

pub fn expect_ampersand() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Ampersand(_)), "'&'")
}

pub fn expect_bar() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Bar(_)), "'|'")
}

pub fn expect_at_sign() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::AtSign(_)), "'@'")
}

pub fn expect_equals() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Equals(_)), "'='")
}

pub fn expect_comma() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Comma(_)), "','")
}

pub fn expect_dot() -> BoxedParser<Token> {
    token(|t| matches!(t, Token::Dot(_)), "'.'")
}

/// Parse zero or more occurrences
pub fn many<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let mut results = Vec::new();
        loop {
            let pos = state.position();
            match parser.parse(state) {
                Ok(item) => results.push(item),
                Err(_) => {
                    state.restore(pos);
                    break;
                }
            }
        }
        Ok(results)
    })
}

/// Parse one or more occurrences
pub fn many1<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Vec<T>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let first = parser.parse(state)?;
        let mut results = vec![first];
        loop {
            let pos = state.position();
            match parser.parse(state) {
                Ok(item) => results.push(item),
                Err(_) => {
                    state.restore(pos);
                    break;
                }
            }
        }
        Ok(results)
    })
}

/// Optional: parse zero or one
pub fn optional<T: 'static>(parser: BoxedParser<T>) -> BoxedParser<Option<T>> {
    BoxedParser::new(move |state: &mut ParseState| {
        let pos = state.position();
        match parser.parse(state) {
            Ok(item) => Ok(Some(item)),
            Err(_) => {
                state.restore(pos);
                Ok(None)
            }
        }
    })
}
