//! Diagnostic and error reporting for Reckon.
//! Reckon 的诊断和错误报告。
//!
//! This crate renders lexer and parser diagnostics using ariadne.
//! 本 crate 使用 ariadne 库渲染词法和语法诊断。

mod codes;
mod diagnostic;

pub use codes::ErrorCode;
pub use diagnostic::{Diagnostic, DiagnosticKind, Label, Severity};

use std::io;

use ariadne::{ColorGenerator, Config, Label as AriadneLabel, Report, ReportKind, Source};

fn build<'a>(
    filename: &'a str,
    diagnostic: &Diagnostic,
    color: bool,
) -> Report<'a, (&'a str, std::ops::Range<usize>)> {
    let kind = match diagnostic.severity {
        Severity::Error => ReportKind::Error,
        Severity::Warning => ReportKind::Warning,
        Severity::Note => ReportKind::Advice,
    };

    let mut colors = ColorGenerator::new();
    let mut report = Report::build(kind, filename, diagnostic.span.start.0 as usize)
        .with_message(&diagnostic.message)
        .with_config(Config::default().with_color(color));

    if let Some(code) = &diagnostic.code {
        report = report.with_code(code.as_str());
    }

    for label in &diagnostic.labels {
        let color = colors.next();
        let ariadne_label = AriadneLabel::new((filename, label.span.range()))
            .with_message(&label.message)
            .with_color(color);
        report = report.with_label(ariadne_label);
    }

    for note in &diagnostic.notes {
        report = report.with_note(note);
    }

    if let Some(help) = &diagnostic.help {
        report = report.with_help(help);
    }

    report.finish()
}

/// Render a diagnostic to stderr.
/// 将诊断信息渲染到标准错误输出。
pub fn emit(source: &str, filename: &str, diagnostic: &Diagnostic) -> io::Result<()> {
    build(filename, diagnostic, true).eprint((filename, Source::from(source)))
}

/// Render a diagnostic into any writer, without colors.
/// 将诊断信息渲染到任意输出（无颜色）。
pub fn write<W: io::Write>(
    source: &str,
    filename: &str,
    diagnostic: &Diagnostic,
    out: W,
) -> io::Result<()> {
    let report = build(filename, diagnostic, false);
    report.write((filename, Source::from(source)), out)
}
