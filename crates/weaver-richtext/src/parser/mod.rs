//! HTML → [`Document`] conversion.
//!
//! The parser is a push-style state machine over [`HtmlEvent`]s. Known tags
//! open markers that are tracked on one stack per [`MarkerClass`], so a close
//! tag always freezes the innermost open marker of its class even when the
//! markup is misnested. Everything the tag table doesn't know goes to the
//! [`HiddenBlockTracker`].

mod events;
mod tokenizer;

pub use events::HtmlEvent;
pub use tokenizer::tokenize;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attributes::Attributes;
use crate::document::Document;
use crate::error::RichTextError;
use crate::hidden::HiddenBlockTracker;
use crate::marker::{AlignmentApproach, Marker, MarkerClass, MarkerId, MarkerKind};
use crate::tags::{TagRole, TagTable, is_void_element};
use crate::text::{TextBuffer, TextRope};

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Stamped on every block marker.
    pub alignment_approach: AlignmentApproach,
    /// Collapse whitespace runs outside `<pre>` the way a browser would.
    pub collapse_whitespace: bool,
    /// Freeze markers still open at end of input instead of dropping them.
    pub close_unterminated: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            alignment_approach: AlignmentApproach::ViewLevel,
            collapse_whitespace: true,
            close_unterminated: true,
        }
    }
}

impl ParseOptions {
    pub fn with_alignment_approach(mut self, approach: AlignmentApproach) -> Self {
        self.alignment_approach = approach;
        self
    }

    pub fn with_collapse_whitespace(mut self, collapse: bool) -> Self {
        self.collapse_whitespace = collapse;
        self
    }

    pub fn with_close_unterminated(mut self, close: bool) -> Self {
        self.close_unterminated = close;
        self
    }
}

/// An open marker waiting for its close tag.
#[derive(Debug, Clone)]
struct OpenEntry {
    id: MarkerId,
    replacements: Vec<MarkerKind>,
}

/// Event-driven HTML parser building a [`Document`].
#[derive(Debug)]
pub struct HtmlParser<T: TextBuffer = TextRope> {
    doc: Document<T>,
    table: TagTable,
    options: ParseOptions,
    open: HashMap<MarkerClass, Vec<OpenEntry>>,
    hidden: HiddenBlockTracker,
    /// `ordered` flag of each enclosing `<ul>`/`<ol>`.
    lists: Vec<bool>,
    pre_depth: usize,
}

impl HtmlParser<TextRope> {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self::with_buffer(TextRope::new(), options)
    }
}

impl Default for HtmlParser<TextRope> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TextBuffer> HtmlParser<T> {
    /// Parse into `buffer`, which should be empty.
    pub fn with_buffer(buffer: T, options: ParseOptions) -> Self {
        let doc = Document::with_buffer(buffer).with_alignment_approach(options.alignment_approach);
        Self {
            doc,
            table: TagTable::default(),
            options,
            open: HashMap::new(),
            hidden: HiddenBlockTracker::new(),
            lists: Vec::new(),
            pre_depth: 0,
        }
    }

    pub fn with_tag_table(mut self, table: TagTable) -> Self {
        self.table = table;
        self
    }

    pub fn tag_table(&self) -> &TagTable {
        &self.table
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Document built so far.
    pub fn document(&self) -> &Document<T> {
        &self.doc
    }

    /// Tokenize `html` and consume it as one complete input.
    pub fn parse(mut self, html: &str) -> Result<Document<T>, RichTextError> {
        let events = tokenize(html, &self.table)?;
        tracing::debug!(
            target: "weaver::richtext::parse",
            bytes = html.len(),
            events = events.len(),
            "parsing html"
        );
        for event in events {
            self.feed(event);
        }
        Ok(self.finish())
    }

    pub fn feed(&mut self, event: HtmlEvent) {
        tracing::trace!(target: "weaver::richtext::parse", ?event, at = self.doc.len_chars());
        match event {
            HtmlEvent::OpenTag {
                name,
                attributes,
                self_closing,
            } => self.open_tag(&name, attributes, self_closing),
            HtmlEvent::CloseTag { name } => self.close_tag(&name),
            HtmlEvent::Text(text) => self.text(&text),
            HtmlEvent::Comment(text) => self.hidden.on_comment(&mut self.doc, &text),
            HtmlEvent::ParagraphBreak => self.doc.paragraph_break(),
        }
    }

    /// Settle anything still open and hand over the document.
    pub fn finish(mut self) -> Document<T> {
        self.doc.settle_open(self.options.close_unterminated);
        self.doc
    }

    fn open_tag(&mut self, name: &SmolStr, attributes: Attributes, self_closing: bool) {
        let Some(rule) = self.table.lookup(name).cloned() else {
            if self_closing || is_void_element(name) {
                self.hidden.on_void(&mut self.doc, name, attributes);
            } else {
                self.hidden.on_open(&mut self.doc, name, attributes);
            }
            return;
        };

        match rule.role {
            TagRole::Marker { kind, replacements } => {
                // `<b/>` would only ever freeze empty.
                if self_closing {
                    return;
                }
                let (kind, level) = match kind {
                    MarkerKind::ListItem { .. } => {
                        self.doc.ensure_line_start();
                        let ordered = self.lists.last().copied().unwrap_or(false);
                        (MarkerKind::ListItem { ordered }, self.lists.len().max(1))
                    }
                    kind => {
                        let depth = self.open.get(&kind.class()).map_or(0, Vec::len);
                        (kind, depth)
                    }
                };
                if kind == MarkerKind::Preformat {
                    self.pre_depth += 1;
                }
                let class = kind.class();
                let marker = Marker::open(kind, 0, attributes)
                    .with_nesting_level(level)
                    .with_alignment_approach(self.options.alignment_approach);
                let id = self.doc.open(marker);
                self.open
                    .entry(class)
                    .or_default()
                    .push(OpenEntry { id, replacements });
            }
            TagRole::ListContainer { ordered } => {
                if !self_closing {
                    self.lists.push(ordered);
                }
            }
            TagRole::LineBreak => self.doc.append("\n"),
            TagRole::Object(kind) => {
                self.doc.append_object(kind, attributes);
                if rule.paragraph_boundary {
                    self.doc.paragraph_break();
                }
            }
        }
    }

    fn close_tag(&mut self, name: &SmolStr) {
        let Some(rule) = self.table.lookup(name).cloned() else {
            if !is_void_element(name) {
                self.hidden.on_close(&mut self.doc, name);
            }
            return;
        };

        match rule.role {
            TagRole::Marker { kind, .. } => {
                let class = kind.class();
                let Some(entry) = self.open.get_mut(&class).and_then(Vec::pop) else {
                    tracing::trace!(
                        target: "weaver::richtext::parse",
                        tag = %name,
                        "close tag without open marker"
                    );
                    return;
                };
                match class {
                    MarkerClass::ListItem => self.doc.ensure_line_start(),
                    MarkerClass::Preformat => self.pre_depth = self.pre_depth.saturating_sub(1),
                    _ => {}
                }
                self.doc.close_into(entry.id, entry.replacements);
            }
            TagRole::ListContainer { .. } => {
                if self.lists.pop().is_none() {
                    tracing::trace!(
                        target: "weaver::richtext::parse",
                        tag = %name,
                        "list close without open list"
                    );
                }
            }
            // Close tags of void elements carry nothing.
            TagRole::LineBreak | TagRole::Object(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if !self.options.collapse_whitespace || self.pre_depth > 0 {
            self.doc.append(text);
            return;
        }
        let mut prev = self.doc.text().last_char();
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c.is_ascii_whitespace() {
                if matches!(prev, None | Some(' ') | Some('\n')) {
                    continue;
                }
                out.push(' ');
                prev = Some(' ');
            } else {
                out.push(c);
                prev = Some(c);
            }
        }
        if !out.is_empty() {
            self.doc.append(&out);
        }
    }
}

/// Parse with default options.
pub fn parse(html: &str) -> Result<Document, RichTextError> {
    HtmlParser::new().parse(html)
}

pub fn parse_with(html: &str, options: ParseOptions) -> Result<Document, RichTextError> {
    HtmlParser::with_options(options).parse(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{Alignment, HeadingLevel, HiddenTag};

    fn spans(doc: &Document) -> Vec<(String, std::ops::Range<usize>)> {
        let mut out: Vec<_> = doc
            .markers()
            .iter()
            .map(|marker| (marker.kind.tag_name().to_owned(), marker.range()))
            .collect();
        out.sort_by(|a, b| a.1.start.cmp(&b.1.start).then(b.1.end.cmp(&a.1.end)));
        out
    }

    #[test]
    fn inline_markers() {
        let doc = parse("a <b>bold <i>both</i></b> c").unwrap();
        assert_eq!(doc.plain_text(), "a bold both c");
        assert_eq!(
            spans(&doc),
            vec![("b".into(), 2..11), ("i".into(), 7..11)]
        );
    }

    #[test]
    fn misnested_close_finds_innermost_of_class() {
        let doc = parse("<b>x<i>y</b>z</i>").unwrap();
        assert_eq!(doc.plain_text(), "xyz");
        assert_eq!(
            spans(&doc),
            vec![("b".into(), 0..2), ("i".into(), 1..3)]
        );
    }

    #[test]
    fn paragraphs_are_separated_by_one_blank_line() {
        let doc = parse("<p>one</p><p>two</p>").unwrap();
        assert_eq!(doc.plain_text(), "one\n\ntwo\n\n");
        assert_eq!(
            spans(&doc),
            vec![("p".into(), 0..5), ("p".into(), 5..10)]
        );
    }

    #[test]
    fn heading_close_matches_any_level() {
        let doc = parse("<h1>t</h2>").unwrap();
        assert_eq!(
            doc.markers()[0].kind,
            MarkerKind::Heading(HeadingLevel::new(1).unwrap())
        );
        assert_eq!(doc.open_markers().count(), 0);
    }

    #[test]
    fn empty_markup_leaves_no_marker() {
        let doc = parse("<b></b>").unwrap();
        assert!(doc.markers().is_empty());
        assert_eq!(doc.plain_text(), "");
    }

    #[test]
    fn unmatched_close_is_ignored() {
        let doc = parse("x</b>y</i>").unwrap();
        assert_eq!(doc.plain_text(), "xy");
        assert!(doc.markers().is_empty());
    }

    #[test]
    fn strike_aliases() {
        let doc = parse("<s>a</s><strike>b</strike><del>c</del>").unwrap();
        assert!(
            doc.markers()
                .iter()
                .all(|marker| marker.kind == MarkerKind::Strikethrough)
        );
        assert_eq!(doc.markers().len(), 3);
    }

    #[test]
    fn lists_carry_their_type() {
        let doc = parse("<ol><li>a</li><li>b</li></ol><ul><li>c</li></ul>").unwrap();
        assert_eq!(doc.plain_text(), "a\nb\nc\n");
        let items: Vec<_> = doc
            .markers()
            .iter()
            .map(|marker| (marker.kind.clone(), marker.range(), marker.nesting_level))
            .collect();
        assert_eq!(
            items,
            vec![
                (MarkerKind::ListItem { ordered: true }, 0..2, 1),
                (MarkerKind::ListItem { ordered: true }, 2..4, 1),
                (MarkerKind::ListItem { ordered: false }, 4..6, 1),
            ]
        );
    }

    #[test]
    fn hidden_blocks_nest() {
        let doc = parse(r#"<div class="a"><div class="b">text</div></div>"#).unwrap();
        assert_eq!(doc.plain_text(), "text");
        let hidden: Vec<_> = doc
            .markers()
            .iter()
            .map(|marker| match &marker.kind {
                MarkerKind::Hidden(HiddenTag::Element { raw_attributes, .. }) => {
                    (raw_attributes.clone(), marker.nesting_level, marker.range())
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            hidden,
            vec![
                (r#" class="b""#.to_owned(), 1, 0..4),
                (r#" class="a""#.to_owned(), 0, 0..4),
            ]
        );
    }

    #[test]
    fn unterminated_markers_close_at_end() {
        let doc = parse("<div>text").unwrap();
        assert_eq!(doc.markers().len(), 1);
        assert_eq!(doc.markers()[0].range(), 0..4);

        let doc = parse_with(
            "<div>text",
            ParseOptions::default().with_close_unterminated(false),
        )
        .unwrap();
        assert!(doc.markers().is_empty());
        assert_eq!(doc.plain_text(), "text");
    }

    #[test]
    fn whitespace_collapses_outside_pre() {
        let doc = parse("<p>  a \n  b </p>\n<pre>x\n  y</pre>").unwrap();
        assert_eq!(doc.plain_text(), "a b \n\nx\n  y\n\n");

        let doc = parse_with(
            "a  b",
            ParseOptions::default().with_collapse_whitespace(false),
        )
        .unwrap();
        assert_eq!(doc.plain_text(), "a  b");
    }

    #[test]
    fn objects_take_one_slot() {
        let doc = parse(r#"a<img src="x.png">b<hr>c<!--n--><input type="checkbox">"#).unwrap();
        assert_eq!(doc.plain_text(), "a\u{FFFC}b\n\n\u{FFFC}\n\nc\u{FFFC}\u{FFFC}");
        let kinds: Vec<_> = doc.markers().iter().map(|m| m.kind.tag_name().to_owned()).collect();
        assert_eq!(kinds, vec!["img", "hr", "!--", "input"]);
        assert_eq!(doc.markers()[0].attributes.get("src"), Some("x.png"));
    }

    #[test]
    fn line_breaks_append_newlines() {
        let doc = parse("a<br>b<br/>c").unwrap();
        assert_eq!(doc.plain_text(), "a\nb\nc");
        assert!(doc.markers().is_empty());
    }

    #[test]
    fn replacement_rules_fan_out_on_close() {
        let mut table = TagTable::default();
        table.register(
            "mark",
            crate::tags::TagRule::replacing(
                MarkerKind::Bold,
                vec![MarkerKind::Bold, MarkerKind::Underline],
            ),
        );
        let doc = HtmlParser::new().with_tag_table(table).parse("<mark>hi</mark>").unwrap();
        assert_eq!(
            spans(&doc),
            vec![("b".into(), 0..2), ("u".into(), 0..2)]
        );
    }

    #[test]
    fn span_level_alignment_from_style() {
        let doc = parse_with(
            r#"<p style="text-align: right">r</p>"#,
            ParseOptions::default().with_alignment_approach(AlignmentApproach::SpanLevel),
        )
        .unwrap();
        assert_eq!(doc.markers()[0].alignment, Some(Alignment::Right));
        assert_eq!(doc.markers()[0].alignment_approach, AlignmentApproach::SpanLevel);

        let doc = parse(r#"<p style="text-align: right">r</p>"#).unwrap();
        assert_eq!(doc.markers()[0].alignment, None);
        assert_eq!(doc.markers()[0].alignment_approach, AlignmentApproach::ViewLevel);
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ParseOptions = serde_json::from_str(r#"{"collapse_whitespace": false}"#).unwrap();
        assert!(!options.collapse_whitespace);
        assert!(options.close_unterminated);
        assert_eq!(options.alignment_approach, AlignmentApproach::ViewLevel);
    }
}
