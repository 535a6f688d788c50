//! Error recovery strategies for the parser.
//!
//! This module provides utilities for recovering from parse errors
//! so the parser can continue and report multiple errors.

use reckon_common::Span;
use reckon_lexer::TokenKind;

/// Tokens that end an operand: recovery stops in front of them.
pub const SYNC_TOKENS: &[TokenKind] = &[
    TokenKind::RParen,
    TokenKind::Comma,
    TokenKind::Colon,
    TokenKind::Question,
    TokenKind::Eof,
];

/// Check if a token kind is in a set.
pub fn is_in_set(kind: &TokenKind, set: &[TokenKind]) -> bool {
    set.iter().any(|k| std::mem::discriminant(k) == std::mem::discriminant(kind))
}

/// Check if a token is a synchronization point.
pub fn is_sync_token(kind: &TokenKind) -> bool {
    is_in_set(kind, SYNC_TOKENS)
}

/// Check if a token can begin an operand.
pub fn starts_operand(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Integer(_)
            | TokenKind::Float(_)
            | TokenKind::Text(_)
            | TokenKind::Date(_)
            | TokenKind::Ident(_)
            | TokenKind::BracketedIdent(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::LParen
            | TokenKind::Not
            | TokenKind::Bang
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
    )
}

/// Tracks open parentheses so an unclosed one can be pointed at.
#[derive(Debug, Default)]
pub struct DelimiterStack {
    stack: Vec<Span>,
}

impl DelimiterStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, span: Span) {
        self.stack.push(span);
    }

    pub fn close(&mut self) -> Option<Span> {
        self.stack.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Span of the innermost open parenthesis.
    pub fn innermost(&self) -> Option<Span> {
        self.stack.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_tokens() {
        assert!(is_sync_token(&TokenKind::RParen));
        assert!(is_sync_token(&TokenKind::Eof));
        assert!(!is_sync_token(&TokenKind::Plus));
        assert!(starts_operand(&TokenKind::Integer(3)));
        assert!(!starts_operand(&TokenKind::Star));
    }

    #[test]
    fn test_delimiter_stack() {
        let mut stack = DelimiterStack::new();
        assert!(stack.is_empty());

        stack.open(Span::from_usize(0, 1));
        stack.open(Span::from_usize(4, 5));
        assert_eq!(stack.innermost(), Some(Span::from_usize(4, 5)));

        assert_eq!(stack.close(), Some(Span::from_usize(4, 5)));
        assert_eq!(stack.close(), Some(Span::from_usize(0, 1)));
        assert!(stack.is_empty());
    }
}
