//! DDL parse errors.

use std::fmt;

use crate::lexer::{Span, TokenKind};

/// A parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// The error message.
    pub message: String,
    /// The location of the error.
    pub span: Span,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    /// Creates an error for `found` where `expected` was required.
    ///
    /// Lexer errors and the end of input get their own wording.
    #[must_use]
    pub fn unexpected(expected: &str, found: &TokenKind, span: Span) -> Self {
        match found {
            TokenKind::Eof => Self::new(
                format!("Unexpected end of input: expected {expected}"),
                span,
            ),
            TokenKind::Error(message) => Self::new(message.clone(), span),
            other => Self::new(
                format!("Unexpected token: expected {expected}, found {other:?}"),
                span,
            ),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at position {}..{}",
            self.message, self.span.start, self.span.end
        )
    }
}

impl std::error::Error for ParseError {}
