//! Lexer for RPAL source text.
//!
//! Keywords are deliberately *not* lexer terminals: `let`, `in`, `rec` and
//! friends lex as [`Token::Ident`] and the parser matches them by value.
//! This way `letx` is one identifier and never `let` followed by `x`.
//! Comments lex as [`Token::Comment`] and are filtered out by [`lex`].

use std::fmt;

use lachs::Span;

#[lachs::token]
pub enum Token {
    #[literal(r"//[^\n]*")]
    Comment,
    #[literal(r"'([^'\\]|\\.)*'")]
    Str,
    #[literal("[a-zA-Z][a-zA-Z0-9_]*")]
    Ident,
    #[literal("[0-9]+")]
    Integer,
    #[terminal("->")]
    Arrow,
    #[terminal("**")]
    DoubleStar,
    #[terminal(">=")]
    GreaterEquals,
    #[terminal("<=")]
    LessEquals,
    #[terminal(">")]
    Greater,
    #[terminal("<")]
    Less,
    #[terminal("+")]
    Plus,
    #[terminal("-")]
    Minus,
    #[terminal("*")]
    Star,
    #[terminal("/")]
    Slash,
    #[terminal("(")]
    LParen,
    #[terminal(")")]
    RParen,
    #[terminal("&")]
    Ampersand,
    #[terminal("|")]
    Bar,
    #[terminal("@")]
    AtSign,
    #[terminal("=")]
    Equals,
    #[terminal(",")]
    Comma,
    #[terminal(".")]
    Dot,
    #[terminal(";")]
    Semicolon,
}

/// Reserved words of the language. The parser refuses these as identifiers.
///
/// `Rec` is an accepted spelling of `rec`.
pub const KEYWORDS: &[&str] = &[
    "let", "in", "fn", "where", "aug", "or", "not", "gr", "ge", "ls", "le", "eq", "ne", "true",
    "false", "nil", "dummy", "within", "and", "rec", "Rec",
];

impl Token {
    pub fn pos(&self) -> Span {
        match self {
            Token::Comment(inner) => inner.position.clone(),
            Token::Str(inner) => inner.position.clone(),
            Token::Ident(inner) => inner.position.clone(),
            Token::Integer(inner) => inner.position.clone(),
            Token::Arrow(inner) => inner.position.clone(),
            Token::DoubleStar(inner) => inner.position.clone(),
            Token::GreaterEquals(inner) => inner.position.clone(),
            Token::LessEquals(inner) => inner.position.clone(),
            Token::Greater(inner) => inner.position.clone(),
            Token::Less(inner) => inner.position.clone(),
            Token::Plus(inner) => inner.position.clone(),
            Token::Minus(inner) => inner.position.clone(),
            Token::Star(inner) => inner.position.clone(),
            Token::Slash(inner) => inner.position.clone(),
            Token::LParen(inner) => inner.position.clone(),
            Token::RParen(inner) => inner.position.clone(),
            Token::Ampersand(inner) => inner.position.clone(),
            Token::Bar(inner) => inner.position.clone(),
            Token::AtSign(inner) => inner.position.clone(),
            Token::Equals(inner) => inner.position.clone(),
            Token::Comma(inner) => inner.position.clone(),
            Token::Dot(inner) => inner.position.clone(),
            Token::Semicolon(inner) => inner.position.clone(),
        }
    }

    /// Returns a human-readable description of the token
    pub fn describe(&self) -> String {
        match self {
            Token::Comment(_) => "comment".to_string(),
            Token::Str(inner) => format!("string {}", inner.value),
            Token::Ident(inner) => format!("identifier '{}'", inner.value),
            Token::Integer(inner) => format!("integer '{}'", inner.value),
            Token::Arrow(_) => "'->'".to_string(),
            Token::DoubleStar(_) => "'**'".to_string(),
            Token::GreaterEquals(_) => "'>='".to_string(),
            Token::LessEquals(_) => "'<='".to_string(),
            Token::Greater(_) => "'>'".to_string(),
            Token::Less(_) => "'<'".to_string(),
            Token::Plus(_) => "'+'".to_string(),
            Token::Minus(_) => "'-'".to_string(),
            Token::Star(_) => "'*'".to_string(),
            Token::Slash(_) => "'/'".to_string(),
            Token::LParen(_) => "'('".to_string(),
            Token::RParen(_) => "')'".to_string(),
            Token::Ampersand(_) => "'&'".to_string(),
            Token::Bar(_) => "'|'".to_string(),
            Token::AtSign(_) => "'@'".to_string(),
            Token::Equals(_) => "'='".to_string(),
            Token::Comma(_) => "','".to_string(),
            Token::Dot(_) => "'.'".to_string(),
            Token::Semicolon(_) => "';'".to_string(),
        }
    }
}

/// Lexing failure: an illegal character or an unterminated string literal.
#[derive(Debug, Clone)]
pub struct LexingError {
    pub message: String,
}

impl fmt::Display for LexingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lex error: {}", self.message)
    }
}

impl std::error::Error for LexingError {}

/// Tokenize `source`, dropping comments.
pub fn lex(source: &str) -> Result<Vec<Token>, LexingError> {
    let tokens = Token::lex(source).map_err(|e| LexingError {
        message: e.to_string(),
    })?;
    Ok(tokens
        .into_iter()
        .filter(|token| !matches!(token, Token::Comment(_)))
        .collect())
}
