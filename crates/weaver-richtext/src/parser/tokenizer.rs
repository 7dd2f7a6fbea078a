//! Adapter from the html5ever tokenizer to [`HtmlEvent`]s.
//!
//! Only the tokenizer is used: no tree construction, so misnested and unknown
//! markup arrives exactly as written.

use std::cell::RefCell;

use html5ever::TokenizerResult;
use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use smol_str::SmolStr;

use super::events::HtmlEvent;
use crate::attributes::Attributes;
use crate::error::RichTextError;
use crate::tags::TagTable;

struct EventSink<'t> {
    table: &'t TagTable,
    events: RefCell<Vec<HtmlEvent>>,
}

impl EventSink<'_> {
    fn push(&self, event: HtmlEvent) {
        let mut events = self.events.borrow_mut();
        // Coalesce text split across tokenizer buffers.
        if let (HtmlEvent::Text(text), Some(HtmlEvent::Text(last))) = (&event, events.last_mut())
        {
            last.push_str(text);
            return;
        }
        events.push(event);
    }
}

impl TokenSink for EventSink<'_> {
    type Handle = ();

    fn process_token(&self, token: Token, line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = SmolStr::new(&*tag.name);
                if self.table.is_paragraph_boundary(&name) {
                    self.push(HtmlEvent::ParagraphBreak);
                }
                match tag.kind {
                    TagKind::StartTag => {
                        let attributes: Attributes = tag
                            .attrs
                            .iter()
                            .map(|attr| (&*attr.name.local, &*attr.value))
                            .collect();
                        self.push(HtmlEvent::OpenTag {
                            name,
                            attributes,
                            self_closing: tag.self_closing,
                        });
                    }
                    TagKind::EndTag => self.push(HtmlEvent::CloseTag { name }),
                }
            }
            Token::CharacterTokens(text) => self.push(HtmlEvent::Text(text.to_string())),
            Token::NullCharacterToken => {}
            Token::CommentToken(text) => self.push(HtmlEvent::Comment(text.to_string())),
            Token::ParseError(error) => {
                tracing::debug!(
                    target: "weaver::richtext::parse",
                    line = line_number,
                    %error,
                    "recovered from malformed markup"
                );
            }
            Token::DoctypeToken(_) | Token::EOFToken => {}
        }
        TokenSinkResult::Continue
    }
}

/// Tokenize a complete HTML fragment.
///
/// Paragraph breaks are inserted before the open and the close of every tag
/// `table` marks as a paragraph boundary.
pub fn tokenize(html: &str, table: &TagTable) -> Result<Vec<HtmlEvent>, RichTextError> {
    let sink = EventSink {
        table,
        events: RefCell::new(Vec::new()),
    };
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let input = BufferQueue::default();
    input.push_back(StrTendril::from_slice(html));

    if let TokenizerResult::Script(()) = tokenizer.feed(&input) {
        return Err(RichTextError::Tokenizer(
            "tokenizer suspended at a script boundary".to_owned(),
        ));
    }
    tokenizer.end();
    Ok(tokenizer.sink.events.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(html: &str) -> Vec<HtmlEvent> {
        tokenize(html, &TagTable::default()).unwrap()
    }

    #[test]
    fn tags_and_text() {
        assert_eq!(
            events("<B>bold</b> tail"),
            vec![
                HtmlEvent::open("b"),
                HtmlEvent::text("bold"),
                HtmlEvent::close("b"),
                HtmlEvent::text(" tail"),
            ]
        );
    }

    #[test]
    fn paragraph_breaks_surround_block_tags() {
        assert_eq!(
            events("<p>a</p>"),
            vec![
                HtmlEvent::ParagraphBreak,
                HtmlEvent::open("p"),
                HtmlEvent::text("a"),
                HtmlEvent::ParagraphBreak,
                HtmlEvent::close("p"),
            ]
        );
    }

    #[test]
    fn attributes_keep_order_and_are_unescaped() {
        let evs = events(r#"<a title="x &amp; y" href="/z">l</a>"#);
        let HtmlEvent::OpenTag { attributes, .. } = &evs[0] else {
            panic!("expected open tag, got {:?}", evs[0]);
        };
        let pairs: Vec<_> = attributes.iter().collect();
        assert_eq!(pairs, vec![("title", "x & y"), ("href", "/z")]);
    }

    #[test]
    fn comments_and_self_closing() {
        assert_eq!(
            events("<!-- c --><br/>"),
            vec![
                HtmlEvent::Comment(" c ".into()),
                HtmlEvent::OpenTag {
                    name: "br".into(),
                    attributes: Attributes::new(),
                    self_closing: true,
                },
            ]
        );
    }

    #[test]
    fn doctype_is_dropped() {
        assert_eq!(events("<!DOCTYPE html>x"), vec![HtmlEvent::text("x")]);
    }
}
