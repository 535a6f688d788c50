//! Error codes for Reckon diagnostics.

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Lexer errors (E0001 - E0099)
    UnexpectedCharacter,
    UnterminatedString,
    UnterminatedDate,
    UnterminatedIdentifier,
    InvalidEscape,
    InvalidNumber,

    // Parser errors (E0100 - E0199)
    UnexpectedToken,
    ExpectedExpression,
    UnclosedDelimiter,
    InvalidDate,
    ExtraneousInput,
    NestingTooDeep,

    // Eval errors (E0300 - E0399)
    UnknownParameter,
    UnknownFunction,
    WrongArity,
    TypeMismatch,
    DivisionByZero,
    Overflow,
    EvaluationTooDeep,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "E0001",
            ErrorCode::UnterminatedString => "E0002",
            ErrorCode::UnterminatedDate => "E0003",
            ErrorCode::UnterminatedIdentifier => "E0004",
            ErrorCode::InvalidEscape => "E0005",
            ErrorCode::InvalidNumber => "E0006",

            // Parser
            ErrorCode::UnexpectedToken => "E0100",
            ErrorCode::ExpectedExpression => "E0101",
            ErrorCode::UnclosedDelimiter => "E0102",
            ErrorCode::InvalidDate => "E0103",
            ErrorCode::ExtraneousInput => "E0104",
            ErrorCode::NestingTooDeep => "E0105",

            // Eval
            ErrorCode::UnknownParameter => "E0300",
            ErrorCode::UnknownFunction => "E0301",
            ErrorCode::WrongArity => "E0302",
            ErrorCode::TypeMismatch => "E0303",
            ErrorCode::DivisionByZero => "E0304",
            ErrorCode::Overflow => "E0305",
            ErrorCode::EvaluationTooDeep => "E0306",
        }
    }

    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            // Lexer
            ErrorCode::UnexpectedCharacter => "unexpected character in input",
            ErrorCode::UnterminatedString => "string literal is not terminated",
            ErrorCode::UnterminatedDate => "date literal is not terminated",
            ErrorCode::UnterminatedIdentifier => "bracketed identifier is not terminated",
            ErrorCode::InvalidEscape => "invalid escape sequence in string",
            ErrorCode::InvalidNumber => "invalid number literal",

            // Parser
            ErrorCode::UnexpectedToken => "unexpected token",
            ErrorCode::ExpectedExpression => "expected an expression",
            ErrorCode::UnclosedDelimiter => "unclosed delimiter",
            ErrorCode::InvalidDate => "date literal is not a valid date",
            ErrorCode::ExtraneousInput => "input continues after a complete expression",
            ErrorCode::NestingTooDeep => "expression is nested too deeply",

            // Eval
            ErrorCode::UnknownParameter => "parameter was not defined",
            ErrorCode::UnknownFunction => "function was not defined",
            ErrorCode::WrongArity => "wrong number of arguments",
            ErrorCode::TypeMismatch => "operator cannot be applied to these values",
            ErrorCode::DivisionByZero => "division by zero",
            ErrorCode::Overflow => "arithmetic overflow",
            ErrorCode::EvaluationTooDeep => "expression tree is too deep to evaluate",
        }
    }

    /// Get a suggested fix for the error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            ErrorCode::UnexpectedCharacter => {
                Some("text literals use single quotes: 'like this'")
            }
            ErrorCode::UnterminatedString => Some("add a closing quote `'` to terminate the string"),
            ErrorCode::UnterminatedDate => Some("add a closing `#` to terminate the date"),
            ErrorCode::UnterminatedIdentifier => Some("add a closing `]` to the identifier"),
            ErrorCode::UnclosedDelimiter => Some("add the matching closing delimiter"),
            ErrorCode::InvalidDate => Some("write dates as #M/D/YYYY# or #YYYY-MM-DD#"),
            ErrorCode::NestingTooDeep | ErrorCode::EvaluationTooDeep => {
                Some("flatten the expression or bind parts of it to parameters")
            }
            ErrorCode::UnknownParameter => {
                Some("bind the parameter or register a parameter handler")
            }
            ErrorCode::WrongArity => {
                Some("check the function signature for the expected number of arguments")
            }
            _ => None,
        }
    }
}
