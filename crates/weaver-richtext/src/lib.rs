//! weaver-richtext: styled-text document model with lossless HTML import and export.
//!
//! This crate provides:
//! - `Document<T>` - a text buffer plus range markers, generic over `TextBuffer`
//! - `HtmlParser` - streaming HTML → document conversion on top of the html5ever tokenizer
//! - `HtmlWriter` / `to_html` - document → HTML, the inverse of parsing
//! - `TextFormat` operations: apply, remove, toggle and query formatting over ranges
//!
//! Markup the model has no marker for (containers, comments, unknown elements)
//! is kept as hidden markers, so it comes back out unchanged.

pub mod attributes;
pub mod document;
pub mod error;
pub mod format;
pub mod hidden;
pub mod marker;
pub mod parser;
pub mod tags;
pub mod text;
pub mod writer;

pub use attributes::{Attribute, Attributes};
pub use document::Document;
pub use error::RichTextError;
pub use format::TextFormat;
pub use hidden::HiddenBlockTracker;
pub use marker::{
    Alignment, AlignmentApproach, HeadingLevel, HiddenTag, Marker, MarkerClass, MarkerId,
    MarkerKind, MarkerState, OBJECT_REPLACEMENT_CHAR,
};
pub use parser::{HtmlEvent, HtmlParser, ParseOptions, parse, parse_with, tokenize};
pub use smol_str::SmolStr;
pub use tags::{TagRole, TagRule, TagTable};
pub use text::{TextBuffer, TextRope};
pub use writer::{HtmlWriter, to_html};
