//! The Reckon parser.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use reckon_common::Span;
use reckon_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};
use reckon_lexer::{Token, TokenKind};
use reckon_syntax::*;

use crate::recovery::{DelimiterStack, is_sync_token, starts_operand};

/// Date-time layouts accepted between `#` signs, tried in order.
const DATE_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

/// Date-only layouts; the time is midnight.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// The Reckon parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    diagnostics: Vec<Diagnostic>,
    /// Open parentheses, for pointing at the one left unclosed
    delimiter_stack: DelimiterStack,
    /// Current nesting, bounded by `MAX_NESTING`
    depth: usize,
    /// Set once nesting overflowed; the rest of the input is skipped
    /// and no further diagnostics are reported.
    abandoned: bool,
}

impl Parser {
    /// `tokens` must end with `Eof`, as `Lexer::tokenize` guarantees.
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = if tokens.last().is_some_and(|t| t.kind == TokenKind::Eof) {
            tokens
        } else {
            let end = tokens.last().map_or(Span::DUMMY, |t| Span::new(t.span.end, t.span.end));
            tokens.into_iter().chain([Token::new(TokenKind::Eof, end)]).collect()
        };
        Self {
            tokens,
            pos: 0,
            diagnostics: Vec::new(),
            delimiter_stack: DelimiterStack::new(),
            depth: 0,
            abandoned: false,
        }
    }

    pub fn diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Parse one complete expression; anything after it is an error.
    /// The returned tree is only meaningful when no diagnostics were produced.
    pub fn parse_expression(&mut self) -> Node {
        let expr = self.parse_expr();

        // Operator chains build depth without recursing, so the finished
        // tree is measured as well.
        if !self.abandoned && expr.depth() > MAX_NESTING {
            self.too_deep(expr.span);
        }

        if !self.at_end() {
            let span = self.current_span();
            let found = self.current_kind().to_string();
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::Parser,
                    span,
                    format!("extraneous input '{}' expecting <EOF>", found),
                )
                .with_code(ErrorCode::ExtraneousInput)
                .with_label(Label::new(span, "expected the expression to end here")),
            );
        }

        expr
    }

    // ========== Expressions ==========

    fn parse_expr(&mut self) -> Node {
        self.parse_ternary_expr()
    }

    /// `cond ? a : b`, right associative.
    fn parse_ternary_expr(&mut self) -> Node {
        let condition = self.parse_or_expr();

        if !self.eat(TokenKind::Question) {
            return condition;
        }

        let then_branch = self.nested(Self::parse_expr);
        self.expect(TokenKind::Colon);
        let else_branch = self.nested(Self::parse_expr);
        let span = condition.span.merge(else_branch.span);
        Node::new(
            NodeKind::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        )
    }

    fn parse_or_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_and_expr, |kind| match kind {
            TokenKind::OrOr | TokenKind::Or => Some(BinOp::Or),
            _ => None,
        })
    }

    fn parse_and_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_bit_or_expr, |kind| match kind {
            TokenKind::AndAnd | TokenKind::And => Some(BinOp::And),
            _ => None,
        })
    }

    fn parse_bit_or_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_bit_xor_expr, |kind| match kind {
            TokenKind::Pipe => Some(BinOp::BitOr),
            _ => None,
        })
    }

    fn parse_bit_xor_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_bit_and_expr, |kind| match kind {
            TokenKind::Caret => Some(BinOp::BitXor),
            _ => None,
        })
    }

    fn parse_bit_and_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_equality_expr, |kind| match kind {
            TokenKind::Amp => Some(BinOp::BitAnd),
            _ => None,
        })
    }

    fn parse_equality_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_relational_expr, |kind| match kind {
            TokenKind::EqEq | TokenKind::Eq => Some(BinOp::Eq),
            TokenKind::BangEq | TokenKind::LtGt => Some(BinOp::Ne),
            _ => None,
        })
    }

    fn parse_relational_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_shift_expr, |kind| match kind {
            TokenKind::Lt => Some(BinOp::Lt),
            TokenKind::LtEq => Some(BinOp::Le),
            TokenKind::Gt => Some(BinOp::Gt),
            TokenKind::GtEq => Some(BinOp::Ge),
            _ => None,
        })
    }

    fn parse_shift_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_additive_expr, |kind| match kind {
            TokenKind::LtLt => Some(BinOp::Shl),
            TokenKind::GtGt => Some(BinOp::Shr),
            _ => None,
        })
    }

    fn parse_additive_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_multiplicative_expr, |kind| match kind {
            TokenKind::Plus => Some(BinOp::Add),
            TokenKind::Minus => Some(BinOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative_expr(&mut self) -> Node {
        self.parse_left_assoc(Self::parse_unary_expr, |kind| match kind {
            TokenKind::Star => Some(BinOp::Mul),
            TokenKind::Slash => Some(BinOp::Div),
            TokenKind::Percent => Some(BinOp::Mod),
            _ => None,
        })
    }

    /// One left-associative precedence level.
    fn parse_left_assoc(
        &mut self,
        operand: fn(&mut Self) -> Node,
        operator: fn(&TokenKind) -> Option<BinOp>,
    ) -> Node {
        let mut left = operand(self);

        // Each operator adds a level above everything parsed so far.
        let mut chained = 0;
        while let Some(op) = operator(self.current_kind()) {
            if self.depth >= MAX_NESTING {
                self.too_deep(self.current_span());
                break;
            }
            self.depth += 1;
            chained += 1;

            self.advance();
            let right = operand(self);
            let span = left.span.merge(right.span);
            left = Node::new(
                NodeKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        self.depth -= chained;

        left
    }

    fn parse_unary_expr(&mut self) -> Node {
        let start = self.current_span();

        let op = match self.current_kind() {
            TokenKind::Bang | TokenKind::Not => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Tilde => UnaryOp::BitNot,
            _ => return self.parse_power_expr(),
        };
        self.advance();

        let operand = self.nested(Self::parse_unary_expr);
        let span = start.merge(operand.span);
        Node::new(
            NodeKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        )
    }

    /// `a ** b` binds tighter than a unary operator on its left and is
    /// right associative; its right operand may carry its own sign.
    fn parse_power_expr(&mut self) -> Node {
        let left = self.parse_primary_expr();

        if self.eat(TokenKind::StarStar) {
            let right = self.nested(Self::parse_unary_expr);
            let span = left.span.merge(right.span);
            Node::new(
                NodeKind::Binary {
                    op: BinOp::Pow,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            )
        } else {
            left
        }
    }

    fn parse_primary_expr(&mut self) -> Node {
        let start = self.current_span();

        match self.current_kind().clone() {
            TokenKind::Integer(n) => {
                self.advance();
                Node::new(NodeKind::Value(Literal::integer(n)), start)
            }
            TokenKind::Float(f) => {
                self.advance();
                Node::new(NodeKind::Value(Literal::Double(f)), start)
            }
            TokenKind::Text(s) => {
                self.advance();
                Node::new(NodeKind::Value(Literal::Text(s)), start)
            }
            TokenKind::Date(raw) => {
                self.advance();
                self.parse_date(&raw, start)
            }
            TokenKind::True => {
                self.advance();
                Node::new(NodeKind::Value(Literal::Bool(true)), start)
            }
            TokenKind::False => {
                self.advance();
                Node::new(NodeKind::Value(Literal::Bool(false)), start)
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(TokenKind::LParen) {
                    self.parse_call(name, start)
                } else {
                    Node::new(NodeKind::Identifier(name), start)
                }
            }
            TokenKind::BracketedIdent(name) => {
                self.advance();
                Node::new(NodeKind::Identifier(name), start)
            }
            TokenKind::LParen => self.parse_paren(),
            TokenKind::Error => {
                // Already reported by the lexer.
                self.advance();
                Self::placeholder(start)
            }
            _ => {
                let found = self.current_kind().to_string();
                self.error(
                    ErrorCode::ExpectedExpression,
                    format!("mismatched input '{}' expecting an expression", found),
                );
                self.recover_expr()
            }
        }
    }

    fn parse_paren(&mut self) -> Node {
        let open = self.current_span();
        self.advance(); // (
        self.delimiter_stack.open(open);

        let inner = self.nested(Self::parse_expr);
        self.expect(TokenKind::RParen);
        self.delimiter_stack.close();

        inner
    }

    fn parse_call(&mut self, name: String, start: Span) -> Node {
        let open = self.current_span();
        self.advance(); // (
        self.delimiter_stack.open(open);

        let args = self.parse_comma_list(TokenKind::RParen, |p| {
            if starts_operand(p.current_kind()) || matches!(p.current_kind(), TokenKind::Error) {
                Some(p.nested(Self::parse_expr))
            } else {
                let found = p.current_kind().to_string();
                p.error(
                    ErrorCode::ExpectedExpression,
                    format!("mismatched input '{}' expecting an expression", found),
                );
                None
            }
        });

        self.expect(TokenKind::RParen);
        self.delimiter_stack.close();

        let span = start.merge(self.previous_span());
        Node::new(
            NodeKind::Call {
                name,
                args: args.into_iter().map(std::sync::Arc::new).collect(),
            },
            span,
        )
    }

    fn parse_date(&mut self, raw: &str, span: Span) -> Node {
        let text = raw.trim();
        let parsed = DATE_TIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                DATE_FORMATS.iter().find_map(|format| {
                    NaiveDate::parse_from_str(text, format)
                        .ok()
                        .map(|date| date.and_time(NaiveTime::MIN))
                })
            });

        match parsed {
            Some(when) => Node::new(NodeKind::Value(Literal::DateTime(when)), span),
            None => {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::Parser,
                        span,
                        format!("invalid date literal '#{}#'", raw),
                    )
                    .with_code(ErrorCode::InvalidDate)
                    .with_help(ErrorCode::InvalidDate.suggestion().unwrap_or_default()),
                );
                Self::placeholder(span)
            }
        }
    }

    // ========== Token Helpers ==========

    fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof, so the list is never empty.
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_span(&self) -> Span {
        self.current().span
    }

    fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::DUMMY
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.current_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(&kind)
    }

    fn advance(&mut self) {
        if !self.at_end() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a closing token. A missing `)` also points at the `(` it
    /// would have closed.
    fn expect(&mut self, kind: TokenKind) {
        if self.eat(kind.clone()) || self.abandoned {
            return;
        }

        let span = self.current_span();
        let found = self.current_kind().to_string();
        let mut diagnostic = Diagnostic::error(
            DiagnosticKind::Parser,
            span,
            format!("missing '{}' at '{}'", kind, found),
        )
        .with_label(Label::new(span, format!("expected '{}' here", kind)));

        match (&kind, self.delimiter_stack.innermost()) {
            (TokenKind::RParen, Some(open)) => {
                diagnostic = diagnostic
                    .with_code(ErrorCode::UnclosedDelimiter)
                    .with_label(Label::new(open, "unclosed delimiter"));
            }
            _ => diagnostic = diagnostic.with_code(ErrorCode::UnexpectedToken),
        }

        self.diagnostics.push(diagnostic);
    }

    fn error(&mut self, code: ErrorCode, message: String) {
        if self.abandoned {
            return;
        }
        let span = self.current_span();
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Parser, span, message)
                .with_code(code)
                .with_label(Label::new(span, "here")),
        );
    }

    // ========== Nesting ==========

    /// Parse one level further down, or give up on the input once
    /// `MAX_NESTING` is reached.
    fn nested(&mut self, parse: fn(&mut Self) -> Node) -> Node {
        if self.depth >= MAX_NESTING {
            let span = self.current_span();
            self.too_deep(span);
            return Self::placeholder(span);
        }
        self.depth += 1;
        let node = parse(self);
        self.depth -= 1;
        node
    }

    /// Report the overflow once and skip to the end of the input, so every
    /// pending level unwinds without descending further.
    fn too_deep(&mut self, span: Span) {
        if !self.abandoned {
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::Parser,
                    span,
                    format!("expression nests deeper than {} levels", MAX_NESTING),
                )
                .with_code(ErrorCode::NestingTooDeep)
                .with_label(Label::new(span, "nesting limit reached here"))
                .with_help(ErrorCode::NestingTooDeep.suggestion().unwrap_or_default()),
            );
            self.abandoned = true;
        }
        self.pos = self.tokens.len() - 1;
    }

    // ========== Error Recovery ==========

    /// Skip the offending token unless it ends an operand, so the caller
    /// can keep going.
    fn recover_expr(&mut self) -> Node {
        let span = self.current_span();
        if !is_sync_token(self.current_kind()) {
            self.advance();
        }
        Self::placeholder(span)
    }

    /// Stand-in for an operand that failed to parse. Never evaluated:
    /// any diagnostic fails the parse.
    fn placeholder(span: Span) -> Node {
        Node::new(NodeKind::Identifier(String::new()), span)
    }

    /// Parse a comma-separated list with error recovery.
    fn parse_comma_list<T, F>(&mut self, closing: TokenKind, mut parse_item: F) -> Vec<T>
    where
        F: FnMut(&mut Self) -> Option<T>,
    {
        let mut items = Vec::new();

        while !self.check(closing.clone()) && !self.at_end() {
            if let Some(item) = parse_item(self) {
                items.push(item);
            } else {
                // Recovery: skip to comma or closing delimiter
                while !self.check(TokenKind::Comma)
                    && !self.check(closing.clone())
                    && !self.at_end()
                {
                    self.advance();
                }
            }

            if !self.eat(TokenKind::Comma) {
                break;
            }

            // A trailing comma leaves an empty argument behind.
            if self.check(closing.clone()) {
                self.error(
                    ErrorCode::ExpectedExpression,
                    format!("mismatched input '{}' expecting an expression", closing),
                );
            }
        }

        items
    }
}
