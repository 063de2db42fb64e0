use swc_core::common::{SourceMap, Span};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{messages:}")]
    JsParseError { messages: String },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{message:}")]
    JsGenerateError { message: String },
    #[error("invalid source map: {message:}")]
    SourceMapError { message: String },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid enum IIFE structure: {message:}")]
    InvalidEnumIife { message: String },
    #[error("invalid enum declaration: {message:}")]
    InvalidEnumDeclaration { message: String },
    #[error("{stage:} requires a symbol table")]
    MissingSymbols { stage: &'static str },
}

/// Renders `file:line:col` followed by the offending line and a caret.
pub fn code_frame(cm: &SourceMap, span: Span, message: &str) -> String {
    let loc = cm.lookup_char_pos(span.lo);
    let line = loc
        .file
        .get_line(loc.line.saturating_sub(1))
        .map(|line| line.to_string())
        .unwrap_or_default();
    format!(
        "{}:{}:{} - error: {}\n{}\n{}^",
        loc.file.name,
        loc.line,
        loc.col_display + 1,
        message,
        line,
        " ".repeat(loc.col_display)
    )
}
