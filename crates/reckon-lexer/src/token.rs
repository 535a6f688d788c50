//! Token definitions for Reckon.

use std::fmt;

use reckon_common::Span;

/// A token with its kind and span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Integer(i64),
    Float(f64),
    /// Single-quoted text with escapes already resolved.
    Text(String),
    /// Raw contents of a `#...#` date literal, validated by the parser.
    Date(String),

    // Identifiers
    Ident(String),
    /// `[any text]`
    BracketedIdent(String),

    // Keywords (case-insensitive)
    And,
    Or,
    Not,
    True,
    False,

    // Delimiters
    LParen, // (
    RParen, // )
    Comma,  // ,

    // Operators
    Plus,     // +
    Minus,    // -
    Star,     // *
    StarStar, // **
    Slash,    // /
    Percent,  // %
    Amp,      // &
    AndAnd,   // &&
    Pipe,     // |
    OrOr,     // ||
    Caret,    // ^
    Tilde,    // ~
    Bang,     // !
    Eq,       // =
    EqEq,     // ==
    BangEq,   // !=
    LtGt,     // <>
    Lt,       // <
    LtEq,     // <=
    LtLt,     // <<
    Gt,       // >
    GtEq,     // >=
    GtGt,     // >>
    Question, // ?
    Colon,    // :

    // Special
    Eof,
    Error,
}

impl TokenKind {
    /// Returns true if this token is a keyword.
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::And | TokenKind::Or | TokenKind::Not | TokenKind::True | TokenKind::False
        )
    }

    /// Returns the keyword for an identifier, if any. Keywords ignore case.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Integer(i) => return write!(f, "{}", i),
            TokenKind::Float(x) => return write!(f, "{}", x),
            TokenKind::Text(s) => return write!(f, "'{}'", s),
            TokenKind::Date(s) => return write!(f, "#{}#", s),
            TokenKind::Ident(s) => return f.write_str(s),
            TokenKind::BracketedIdent(s) => return write!(f, "[{}]", s),
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Comma => ",",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::AndAnd => "&&",
            TokenKind::Pipe => "|",
            TokenKind::OrOr => "||",
            TokenKind::Caret => "^",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::BangEq => "!=",
            TokenKind::LtGt => "<>",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::LtLt => "<<",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::GtGt => ">>",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Eof => "<EOF>",
            TokenKind::Error => "<error>",
        };
        f.write_str(text)
    }
}
