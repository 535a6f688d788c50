//! The Reckon lexer.
//! Reckon 词法分析器。

use crate::token::{Token, TokenKind};
use reckon_common::Span;
use reckon_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label};

/// The Reckon lexer.
/// Reckon 词法分析器。
///
/// Converts expression text into a sequence of tokens. Problems are recorded
/// as diagnostics and lexing continues, so one pass reports every bad
/// character.
/// 将表达式文本转换为 token 序列。遇到问题时记录诊断并继续分析。
pub struct Lexer<'src> {
    /// Character iterator with position info
    /// 带位置信息的字符迭代器
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    /// Current byte position in source
    /// 当前在源码中的字节位置
    pos: usize,
    /// Collected diagnostics
    /// 收集的诊断信息
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given expression text.
    /// 为给定的表达式文本创建新的词法分析器。
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            pos: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the entire source and return tokens and diagnostics.
    /// The token list always ends with `Eof`.
    /// 对整个源代码进行词法分析，返回 token 列表和诊断信息。
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, self.diagnostics)
    }

    fn next_token(&mut self) -> Token {
        loop {
            // Skip whitespace - 跳过空白字符
            self.skip_whitespace();

            let start = self.pos;

            let Some((_pos, ch)) = self.advance() else {
                return Token::new(TokenKind::Eof, Span::point(start));
            };

            if let Some(kind) = self.token_kind(ch, start) {
                return Token::new(kind, Span::from_usize(start, self.pos));
            }
            // The character was reported and dropped; keep going.
        }
    }

    /// Classify the token starting with `ch`. Returns `None` when the
    /// character cannot start any token.
    fn token_kind(&mut self, ch: char, start: usize) -> Option<TokenKind> {
        let kind = match ch {
            // Single character tokens - 单字符 token
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,

            // Star or power - 乘号或幂运算
            '*' => self.follow('*', TokenKind::StarStar, TokenKind::Star),

            // Bitwise or logical and - 按位与或逻辑与
            '&' => self.follow('&', TokenKind::AndAnd, TokenKind::Amp),

            // Bitwise or logical or - 按位或或逻辑或
            '|' => self.follow('|', TokenKind::OrOr, TokenKind::Pipe),

            // `=` and `==` are both equality - `=` 与 `==` 都表示相等
            '=' => self.follow('=', TokenKind::EqEq, TokenKind::Eq),

            // Bang (not) or inequality - 感叹号（逻辑非）或不等
            '!' => self.follow('=', TokenKind::BangEq, TokenKind::Bang),

            // Less than, `<=`, `<>` or left shift - 小于、小于等于、不等或左移
            '<' => match self.peek_char() {
                Some('=') => {
                    self.advance();
                    TokenKind::LtEq
                }
                Some('>') => {
                    self.advance();
                    TokenKind::LtGt
                }
                Some('<') => {
                    self.advance();
                    TokenKind::LtLt
                }
                _ => TokenKind::Lt,
            },

            // Greater than, `>=` or right shift - 大于、大于等于或右移
            '>' => match self.peek_char() {
                Some('=') => {
                    self.advance();
                    TokenKind::GtEq
                }
                Some('>') => {
                    self.advance();
                    TokenKind::GtGt
                }
                _ => TokenKind::Gt,
            },

            // Text literal - 文本字面量
            '\'' => self.text_literal(start),

            // Double quotes are not text delimiters: report the opening one
            // and drop the quoted run as a single error token.
            // 双引号不是文本定界符：只报告一次，整段作为错误 token。
            '"' => {
                self.error_unexpected_char(ch, start);
                self.skip_double_quoted();
                TokenKind::Error
            }

            // Date literal - 日期字面量
            '#' => self.date_literal(start),

            // Bracketed identifier - 方括号标识符
            '[' => self.bracketed_identifier(start),

            // Numbers, including `.5` - 数字，包括 `.5`
            '0'..='9' => self.number(ch, start),
            '.' if self.peek_char().is_some_and(|c| c.is_ascii_digit()) => {
                self.number(ch, start)
            }

            // Identifiers and keywords - 标识符和关键字
            c if c.is_alphabetic() || c == '_' => self.identifier(ch),

            _ => {
                self.error_unexpected_char(ch, start);
                return None;
            }
        };
        Some(kind)
    }

    /// Consume `next` if it follows, choosing between a two and one character token.
    fn follow(&mut self, next: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek_char() == Some(next) {
            self.advance();
            double
        } else {
            single
        }
    }

    /// Advance to the next character.
    /// 前进到下一个字符。
    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.pos = pos + ch.len_utf8();
        }
        result
    }

    /// Peek at the next character without consuming it.
    /// 查看下一个字符但不消耗它。
    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    /// Peek at the nth character ahead.
    /// 查看前方第 n 个字符。
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.chars.clone().nth(n).map(|(_, ch)| ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse a text literal (single-quoted); the opening quote is consumed.
    /// 解析文本字面量（单引号包围），起始引号已消耗。
    fn text_literal(&mut self, start: usize) -> TokenKind {
        let mut value = String::new();

        loop {
            match self.advance() {
                Some((_, '\'')) => break,
                Some((pos, '\\')) => {
                    if let Some(escaped) = self.escape_char(pos) {
                        value.push(escaped);
                    }
                }
                Some((_, ch)) => value.push(ch),
                None => {
                    let span = Span::from_usize(start, self.pos);
                    self.diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::Lexer,
                            span,
                            "unterminated text literal",
                        )
                        .with_code(ErrorCode::UnterminatedString)
                        .with_label(Label::new(span, "text starts here")),
                    );
                    return TokenKind::Error;
                }
            }
        }

        TokenKind::Text(value)
    }

    /// Parse an escape sequence; the backslash at `backslash` is consumed.
    /// 解析转义字符序列。
    fn escape_char(&mut self, backslash: usize) -> Option<char> {
        match self.advance() {
            Some((_, 'n')) => Some('\n'),  // newline - 换行
            Some((_, 'r')) => Some('\r'),  // carriage return - 回车
            Some((_, 't')) => Some('\t'),  // tab - 制表符
            Some((_, '\\')) => Some('\\'), // backslash - 反斜杠
            Some((_, '"')) => Some('"'),   // double quote - 双引号
            Some((_, '\'')) => Some('\''), // single quote - 单引号
            Some((_, 'u')) => self.unicode_escape(backslash),
            Some((_, ch)) => {
                self.invalid_escape(backslash, format!("invalid escape sequence: \\{}", ch));
                None
            }
            None => None,
        }
    }

    /// `\uXXXX` with exactly four hex digits.
    fn unicode_escape(&mut self, backslash: usize) -> Option<char> {
        let mut code = 0u32;
        for _ in 0..4 {
            match self.peek_char().and_then(|c| c.to_digit(16)) {
                Some(digit) => {
                    self.advance();
                    code = code * 16 + digit;
                }
                None => {
                    self.invalid_escape(backslash, "\\u must be followed by four hex digits");
                    return None;
                }
            }
        }
        match char::from_u32(code) {
            Some(c) => Some(c),
            None => {
                self.invalid_escape(backslash, format!("\\u{:04x} is not a valid character", code));
                None
            }
        }
    }

    fn invalid_escape(&mut self, backslash: usize, message: impl Into<String>) {
        let span = Span::from_usize(backslash, self.pos);
        self.diagnostics.push(
            Diagnostic::error(DiagnosticKind::Lexer, span, message)
                .with_code(ErrorCode::InvalidEscape),
        );
    }

    /// Parse a `#...#` date literal; the opening `#` is consumed.
    /// 解析 `#...#` 日期字面量。
    fn date_literal(&mut self, start: usize) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some((_, '#')) => return TokenKind::Date(value),
                Some((_, ch)) => value.push(ch),
                None => {
                    let span = Span::from_usize(start, self.pos);
                    self.diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::Lexer,
                            span,
                            "unterminated date literal",
                        )
                        .with_code(ErrorCode::UnterminatedDate),
                    );
                    return TokenKind::Error;
                }
            }
        }
    }

    /// Parse `[name with anything]`; the `[` is consumed.
    fn bracketed_identifier(&mut self, start: usize) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.advance() {
                Some((_, ']')) => return TokenKind::BracketedIdent(value),
                Some((_, ch)) => value.push(ch),
                None => {
                    let span = Span::from_usize(start, self.pos);
                    self.diagnostics.push(
                        Diagnostic::error(
                            DiagnosticKind::Lexer,
                            span,
                            "unterminated bracketed identifier",
                        )
                        .with_code(ErrorCode::UnterminatedIdentifier),
                    );
                    return TokenKind::Error;
                }
            }
        }
    }

    fn digits(&mut self, value: &mut String) {
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_digit() {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Parse a number literal. Integers are `Integer`; anything with a
    /// decimal point or exponent is `Float`.
    /// 解析数字字面量（整数或浮点数）。
    fn number(&mut self, first: char, start: usize) -> TokenKind {
        let mut value = String::from(first);
        let mut is_float = first == '.';

        // Integer part, or the fraction after a leading `.`
        // 整数部分，或以 `.` 开头时的小数部分
        self.digits(&mut value);

        // Decimal part; `123.` is a complete float - 小数部分；`123.` 也是合法浮点数
        if !is_float && self.peek_char() == Some('.') {
            self.advance();
            value.push('.');
            is_float = true;
            self.digits(&mut value);
        }

        // Exponent, only when digits follow - 指数部分，仅当后面有数字时
        if let Some('e' | 'E') = self.peek_char() {
            let digits_at = match self.peek_nth(1) {
                Some('+' | '-') => 2,
                _ => 1,
            };
            if self.peek_nth(digits_at).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                value.push('e');
                if digits_at == 2
                    && let Some((_, sign)) = self.advance()
                {
                    value.push(sign);
                }
                self.digits(&mut value);
                is_float = true;
            }
        }

        let parsed = if is_float {
            value.parse::<f64>().ok().map(TokenKind::Float)
        } else {
            value.parse::<i64>().ok().map(TokenKind::Integer)
        };

        parsed.unwrap_or_else(|| {
            let span = Span::from_usize(start, self.pos);
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::Lexer,
                    span,
                    format!("number literal '{}' is out of range", value),
                )
                .with_code(ErrorCode::InvalidNumber),
            );
            TokenKind::Error
        })
    }

    /// Parse an identifier or keyword.
    /// 解析标识符或关键字。
    fn identifier(&mut self, first: char) -> TokenKind {
        let mut value = String::from(first);

        while let Some(ch) = self.peek_char() {
            if ch.is_alphanumeric() || ch == '_' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Check for keywords - 检查是否为关键字
        TokenKind::keyword_from_str(&value).unwrap_or(TokenKind::Ident(value))
    }

    /// Skip past the closing `"` of a double-quoted run, or to the end.
    fn skip_double_quoted(&mut self) {
        while let Some((_, ch)) = self.advance() {
            if ch == '"' {
                break;
            }
        }
    }

    /// Report a character that cannot start a token.
    /// 报告无法开始任何 token 的字符。
    fn error_unexpected_char(&mut self, ch: char, pos: usize) {
        let span = Span::from_usize(pos, self.pos);
        let mut diagnostic = Diagnostic::error(
            DiagnosticKind::Lexer,
            span,
            format!("no viable alternative at character '{}'", ch),
        )
        .with_code(ErrorCode::UnexpectedCharacter)
        .with_label(Label::new(span, "unexpected character here"));
        if ch == '"' {
            diagnostic = diagnostic.with_help("text literals use single quotes: 'like this'");
        }
        self.diagnostics.push(diagnostic);
    }
}
