use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at '{}')", self.message, self.span.text())
    }
}

impl std::error::Error for ParseError {}

impl From<ParseError> for crate::diagnostics::Error {
    fn from(e: ParseError) -> Self {
        crate::diagnostics::Error::new(e.message, e.span)
    }
}
