//! Error types for document operations.

use miette::Diagnostic;
use thiserror::Error;

use crate::format::TextFormat;

/// Errors returned to callers of the document API.
///
/// Malformed markup is never an error: the parser recovers locally and logs.
/// Only caller mistakes (bad offsets, formats that make no sense for the
/// current configuration) and tokenizer failures surface here.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RichTextError {
    /// Range is reversed or reaches past the end of the buffer.
    #[error("invalid range {start}..{end} for document of length {len}")]
    #[diagnostic(
        code(richtext::invalid_range),
        help("offsets are in chars and must satisfy start <= end <= document length")
    )]
    InvalidRange { start: usize, end: usize, len: usize },

    /// The format cannot be applied with the current document configuration.
    #[error("format {0:?} is not supported here")]
    #[diagnostic(code(richtext::unsupported_format))]
    UnsupportedFormat(TextFormat),

    /// The HTML tokenizer gave up on the input.
    #[error("tokenizer error: {0}")]
    #[diagnostic(code(richtext::tokenizer))]
    Tokenizer(String),
}

impl RichTextError {
    pub(crate) fn invalid_range(start: usize, end: usize, len: usize) -> Self {
        Self::InvalidRange { start, end, len }
    }
}
