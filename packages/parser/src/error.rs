use crate::ast::Span;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token at {}: expected {expected}, found {found}", span.start)]
    UnexpectedToken {
        span: Span,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of file at {pos}: expected {expected}")]
    UnexpectedEof { pos: usize, expected: String },

    #[error("Invalid syntax at {}: {message}", span.start)]
    InvalidSyntax { span: Span, message: String },

    #[error("Node '{label}' at {} has neither a token nor children", span.start)]
    EmptyNode { span: Span, label: String },
}

impl ParseError {
    pub fn unexpected_token(
        span: std::ops::Range<usize>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedToken {
            span: Span::new(span.start, span.end),
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn unexpected_eof(pos: usize, expected: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            pos,
            expected: expected.into(),
        }
    }

    pub fn invalid_syntax(span: std::ops::Range<usize>, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            span: Span::new(span.start, span.end),
            message: message.into(),
        }
    }

    pub fn empty_node(span: std::ops::Range<usize>, label: impl Into<String>) -> Self {
        Self::EmptyNode {
            span: Span::new(span.start, span.end),
            label: label.into(),
        }
    }

    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::EmptyNode { span, .. } => *span,
            ParseError::UnexpectedEof { pos, .. } => Span::new(*pos, *pos),
        }
    }

    fn label_message(&self) -> String {
        match self {
            ParseError::UnexpectedToken { expected, .. } => format!("expected {}", expected),
            ParseError::UnexpectedEof { expected, .. } => format!("expected {}", expected),
            ParseError::InvalidSyntax { message, .. } => message.clone(),
            ParseError::EmptyNode { .. } => "add a token or a child constituent".to_string(),
        }
    }
}

/// Pretty-print a parse error with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let span = error.span();
    // ariadne needs a non-empty range to draw a label
    let start = span.start.min(source.len().saturating_sub(1));
    let end = span.end.max(start + 1).min(source.len().max(start + 1));

    let mut output = Vec::new();
    let written = Report::build(ReportKind::Error, filename, start)
        .with_message(error.to_string())
        .with_label(
            Label::new((filename, start..end))
                .with_color(Color::Red)
                .with_message(error.label_message()),
        )
        .finish()
        .write((filename, Source::from(source)), &mut output);

    match written {
        Ok(()) => String::from_utf8(output).unwrap_or_else(|_| error.to_string()),
        Err(_) => error.to_string(),
    }
}

/// Plain rendering used when ariadne is compiled out
#[cfg(not(feature = "pretty-errors"))]
pub fn format_error(_source: &str, filename: &str, error: &ParseError) -> String {
    format!("{}: {} ({})", filename, error, error.label_message())
}
