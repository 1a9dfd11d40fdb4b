//! The shared `Error` type threaded through every pipeline stage.
//!
//! An `Error` carries its own source text alongside the offending span, not
//! just the span, because a long-lived interpreter can hold errors from
//! more than one REPL fragment at a time.

use std::fmt;

use crate::span::Span;

#[derive(Debug, Clone)]
pub struct Error {
    pub message: String,
    pub span: Span,
}

impl Error {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at '{}')", self.message, self.span.text())
    }
}

impl std::error::Error for Error {}

/// An ordered, append-only collection of diagnostics for a single pipeline
/// stage run. Stages stop at their first error; this still supports more
/// than one because the checker is allowed to accumulate diagnostics (it
/// currently never does, since unresolved identifiers surface as runtime
/// errors instead, but the type doesn't assume that).
#[derive(Debug, Clone, Default)]
pub struct ErrorList(Vec<Error>);

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    pub fn has_errors(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Error> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Error> {
        self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

impl IntoIterator for ErrorList {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
