use smol_str::SmolStr;

use crate::attributes::Attributes;

/// A markup event as seen by the parser.
///
/// Tag names are lower-cased by the tokenizer. Text is already unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlEvent {
    OpenTag {
        name: SmolStr,
        attributes: Attributes,
        self_closing: bool,
    },
    CloseTag {
        name: SmolStr,
    },
    Text(String),
    Comment(String),
    /// Emitted before the open and the close of a block-level tag.
    ParagraphBreak,
}

impl HtmlEvent {
    pub fn open(name: impl Into<SmolStr>) -> Self {
        HtmlEvent::OpenTag {
            name: name.into(),
            attributes: Attributes::new(),
            self_closing: false,
        }
    }

    pub fn close(name: impl Into<SmolStr>) -> Self {
        HtmlEvent::CloseTag { name: name.into() }
    }

    pub fn text(text: impl Into<String>) -> Self {
        HtmlEvent::Text(text.into())
    }
}
