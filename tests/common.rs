//! Integration tests for reckon-common and reckon-diagnostic crates.

use reckon_common::{BytePos, SourceMap, Span};
use reckon_diagnostic::{Diagnostic, DiagnosticKind, ErrorCode, Label, write};

// ============================================================================
// Spans
// ============================================================================

#[test]
fn test_span_merge() {
    let a = Span::from_usize(10, 20);
    let b = Span::from_usize(15, 30);
    let merged = a.merge(b);
    assert_eq!(merged.start.0, 10);
    assert_eq!(merged.end.0, 30);
}

#[test]
fn test_span_len_and_range() {
    let span = Span::from_usize(5, 15);
    assert_eq!(span.len(), 10);
    assert_eq!(span.range(), 5..15);
    assert!(Span::from_usize(5, 5).is_empty());
}

#[test]
fn test_span_text() {
    let source = "Abs(-1) + x";
    assert_eq!(Span::from_usize(0, 3).text(source), Some("Abs"));
    assert_eq!(Span::from_usize(10, 40).text(source), None);
}

#[test]
fn test_byte_pos_offset() {
    assert_eq!(BytePos(10).offset(5), BytePos(15));
}

// ============================================================================
// Source map
// ============================================================================

#[test]
fn test_line_col_single_line() {
    let map = SourceMap::new("(3 + 2");
    let at = map.line_col(BytePos(6));
    assert_eq!((at.line, at.column), (1, 7));
    assert_eq!(at.to_string(), "1:7");
}

#[test]
fn test_line_col_multi_line() {
    let map = SourceMap::new("1 +\n  [x] *\n  2");
    assert_eq!(map.line_count(), 3);
    let at = map.line_col(BytePos(6));
    assert_eq!((at.line, at.column), (2, 3));
}

#[test]
fn test_line_col_counts_chars() {
    // 'é' is two bytes but one column.
    let map = SourceMap::new("'é' + ?");
    let at = map.line_col(BytePos(7));
    assert_eq!(at.column, 7);
}

// ============================================================================
// Diagnostics
// ============================================================================

#[test]
fn test_error_code_strings() {
    assert_eq!(ErrorCode::UnterminatedString.as_str(), "E0002");
    assert_eq!(ErrorCode::UnclosedDelimiter.as_str(), "E0102");
    assert_eq!(ErrorCode::DivisionByZero.as_str(), "E0304");
}

#[test]
fn test_positioned_message() {
    let source = "1 +\n)";
    let diag = Diagnostic::error(DiagnosticKind::Parser, Span::from_usize(4, 5), "unexpected ')'");
    assert_eq!(diag.positioned(&SourceMap::new(source)), "line 2:1 unexpected ')'");
}

#[test]
fn test_write_renders_report() {
    let source = "(1 + 2";
    let span = Span::from_usize(6, 6);
    let diag = Diagnostic::error(DiagnosticKind::Parser, span, "missing ')' at '<EOF>'")
        .with_code(ErrorCode::UnclosedDelimiter)
        .with_label(Label::new(Span::from_usize(0, 1), "opened here"));

    let mut out = Vec::new();
    write(source, "<expr>", &diag, &mut out).expect("render");
    let rendered = String::from_utf8(out).expect("utf-8");
    assert!(rendered.contains("missing ')'"));
    assert!(rendered.contains("E0102"));
}
