//! Caller-facing formatting operations over document ranges.
//!
//! Inline formats operate on exact char ranges. Block formats are line
//! granular: the requested range is widened to whole lines, including the
//! newline run that ends the last line, so block markers line up with what
//! the parser produces for `<p>`, `<h1>` and friends.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::document::Document;
use crate::error::RichTextError;
use crate::marker::{
    Alignment, AlignmentApproach, HeadingLevel, Marker, MarkerKind, OBJECT_REPLACEMENT_CHAR,
};
use crate::text::TextBuffer;

/// A formatting intent a caller can apply, remove or toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    UnorderedList,
    OrderedList,
    Bold,
    Strong,
    Italic,
    Emphasis,
    Cite,
    Underline,
    Strikethrough,
    AlignLeft,
    AlignCenter,
    AlignRight,
    Quote,
    Link,
    HorizontalRule,
    Paragraph,
    Preformat,
    Big,
    Small,
    Superscript,
    Subscript,
    Font,
    Monospace,
    Code,
}

impl TextFormat {
    /// Marker kind this format produces. Alignment formats have none.
    pub fn marker_kind(self) -> Option<MarkerKind> {
        let heading = |level| HeadingLevel::new(level).map(MarkerKind::Heading);
        match self {
            TextFormat::Heading1 => heading(1),
            TextFormat::Heading2 => heading(2),
            TextFormat::Heading3 => heading(3),
            TextFormat::Heading4 => heading(4),
            TextFormat::Heading5 => heading(5),
            TextFormat::Heading6 => heading(6),
            TextFormat::UnorderedList => Some(MarkerKind::ListItem { ordered: false }),
            TextFormat::OrderedList => Some(MarkerKind::ListItem { ordered: true }),
            TextFormat::Bold => Some(MarkerKind::Bold),
            TextFormat::Strong => Some(MarkerKind::Strong),
            TextFormat::Italic => Some(MarkerKind::Italic),
            TextFormat::Emphasis => Some(MarkerKind::Emphasis),
            TextFormat::Cite => Some(MarkerKind::Cite),
            TextFormat::Underline => Some(MarkerKind::Underline),
            TextFormat::Strikethrough => Some(MarkerKind::Strikethrough),
            TextFormat::AlignLeft | TextFormat::AlignCenter | TextFormat::AlignRight => None,
            TextFormat::Quote => Some(MarkerKind::Quote),
            TextFormat::Link => Some(MarkerKind::Link),
            TextFormat::HorizontalRule => Some(MarkerKind::HorizontalRule),
            TextFormat::Paragraph => Some(MarkerKind::Paragraph),
            TextFormat::Preformat => Some(MarkerKind::Preformat),
            TextFormat::Big => Some(MarkerKind::Big),
            TextFormat::Small => Some(MarkerKind::Small),
            TextFormat::Superscript => Some(MarkerKind::Superscript),
            TextFormat::Subscript => Some(MarkerKind::Subscript),
            TextFormat::Font => Some(MarkerKind::Font),
            TextFormat::Monospace => Some(MarkerKind::Monospace),
            TextFormat::Code => Some(MarkerKind::Code),
        }
    }

    pub fn alignment(self) -> Option<Alignment> {
        match self {
            TextFormat::AlignLeft => Some(Alignment::Left),
            TextFormat::AlignCenter => Some(Alignment::Center),
            TextFormat::AlignRight => Some(Alignment::Right),
            _ => None,
        }
    }

    pub fn is_block(self) -> bool {
        self.marker_kind().is_some_and(|kind| kind.is_block())
    }

    fn matches(self, kind: &MarkerKind) -> bool {
        self.marker_kind().as_ref() == Some(kind)
    }
}

/// Headings, paragraphs and preformatted blocks replace each other on a line.
fn is_line_style(kind: &MarkerKind) -> bool {
    matches!(
        kind,
        MarkerKind::Heading(_) | MarkerKind::Paragraph | MarkerKind::Preformat
    )
}

/// Overlap, or for a caret, containment with an inclusive end.
fn touches(marker: &Marker, range: &Range<usize>) -> bool {
    if range.is_empty() {
        marker.start <= range.start && range.start <= marker.end
    } else {
        marker.overlaps(range)
    }
}

impl<T: TextBuffer> Document<T> {
    /// Apply `format` over `range`.
    ///
    /// `attributes` are attached to the new marker (e.g. `href` for links);
    /// when merging with an existing marker they override its values.
    pub fn apply_format(
        &mut self,
        format: TextFormat,
        range: Range<usize>,
        attributes: Option<Attributes>,
    ) -> Result<(), RichTextError> {
        self.check_range(&range)?;
        tracing::debug!(target: "weaver::richtext::format", ?format, ?range, "apply format");

        if format.alignment().is_some() {
            return self.align_blocks(format, &range, true);
        }
        let Some(kind) = format.marker_kind() else {
            return Err(RichTextError::UnsupportedFormat(format));
        };
        let attributes = attributes.unwrap_or_default();
        match kind {
            MarkerKind::HorizontalRule => self.insert_rule(range, attributes),
            MarkerKind::ListItem { .. } => {
                self.apply_list(kind, &range, attributes);
                Ok(())
            }
            kind if kind.is_block() => {
                self.apply_block(kind, &range, attributes);
                Ok(())
            }
            kind => {
                self.apply_inline(kind, range, attributes);
                Ok(())
            }
        }
    }

    /// Remove `format` from `range`, trimming or splitting markers.
    pub fn remove_format(
        &mut self,
        format: TextFormat,
        range: Range<usize>,
    ) -> Result<(), RichTextError> {
        self.check_range(&range)?;
        tracing::debug!(target: "weaver::richtext::format", ?format, ?range, "remove format");

        if format.alignment().is_some() {
            return self.align_blocks(format, &range, false);
        }
        match format.marker_kind() {
            Some(MarkerKind::HorizontalRule) => self.remove_rules(&range),
            Some(kind) if kind.is_block() => {
                let lines = self.line_bounds(&range);
                self.trim_markers(&lines, |marker| format.matches(&marker.kind));
                Ok(())
            }
            Some(_) => {
                self.trim_markers(&range, |marker| format.matches(&marker.kind));
                Ok(())
            }
            None => Err(RichTextError::UnsupportedFormat(format)),
        }
    }

    /// Whether `format` covers all of `range`.
    ///
    /// An empty range asks about the character before the caret, or the first
    /// character when the caret is at 0.
    pub fn has_format(
        &self,
        format: TextFormat,
        range: Range<usize>,
    ) -> Result<bool, RichTextError> {
        self.check_range(&range)?;

        if let Some(alignment) = format.alignment() {
            return Ok(self.markers().iter().any(|marker| {
                marker.kind.is_paragraph_block()
                    && touches(marker, &range)
                    && marker.alignment == Some(alignment)
            }));
        }

        let probe = if range.is_empty() {
            if self.is_empty() {
                return Ok(false);
            }
            let at = range.start.saturating_sub(1);
            at..at + 1
        } else {
            range
        };

        let mut spans: Vec<Range<usize>> = self
            .markers()
            .iter()
            .filter(|marker| format.matches(&marker.kind) && marker.overlaps(&probe))
            .map(Marker::range)
            .collect();
        spans.sort_by_key(|span| span.start);

        let mut covered = probe.start;
        for span in spans {
            if span.start > covered {
                break;
            }
            covered = covered.max(span.end);
            if covered >= probe.end {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Strip inline formatting from `range`. Blocks, hidden blocks and
    /// objects stay.
    pub fn clear_formats(&mut self, range: Range<usize>) -> Result<(), RichTextError> {
        self.check_range(&range)?;
        tracing::debug!(target: "weaver::richtext::format", ?range, "clear formats");
        self.trim_markers(&range, |marker| {
            marker.kind.is_inline() && !marker.kind.is_object()
        });
        Ok(())
    }

    /// Remove `format` if it already covers `range`, apply it otherwise.
    pub fn toggle_format(
        &mut self,
        format: TextFormat,
        range: Range<usize>,
        attributes: Option<Attributes>,
    ) -> Result<(), RichTextError> {
        if self.has_format(format, range.clone())? {
            self.remove_format(format, range)
        } else {
            self.apply_format(format, range, attributes)
        }
    }

    // === Helpers ===

    /// Widen `range` to whole lines plus the newline run after the last one.
    fn line_bounds(&self, range: &Range<usize>) -> Range<usize> {
        let text = self.text();
        let len = self.len_chars();

        let mut start = range.start;
        while start > 0 && text.char_at(start - 1) != Some('\n') {
            start -= 1;
        }
        let mut end = range.end;
        while end > range.start && text.char_at(end - 1) == Some('\n') {
            end -= 1;
        }
        while end < len && text.char_at(end) != Some('\n') {
            end += 1;
        }
        while end < len && text.char_at(end) == Some('\n') {
            end += 1;
        }
        start..end
    }

    /// Cut `range` out of every marker matching `pred`.
    fn trim_markers(&mut self, range: &Range<usize>, pred: impl Fn(&Marker) -> bool) {
        if range.is_empty() {
            return;
        }
        let mut tails = Vec::new();
        self.markers_mut().retain_mut(|marker| {
            if !pred(marker) || !marker.overlaps(range) {
                return true;
            }
            if range.start <= marker.start && marker.end <= range.end {
                return false;
            }
            if range.start <= marker.start {
                marker.start = range.end;
            } else if marker.end <= range.end {
                marker.end = range.start;
            } else {
                let mut tail = marker.clone();
                tail.start = range.end;
                tails.push(tail);
                marker.end = range.start;
            }
            true
        });
        for tail in tails {
            self.push_frozen(tail);
        }
    }

    fn apply_inline(&mut self, kind: MarkerKind, range: Range<usize>, attributes: Attributes) {
        if range.is_empty() {
            return;
        }
        let href = attributes.get("href").map(str::to_owned);
        let is_link = kind == MarkerKind::Link;
        if is_link {
            self.trim_markers(&range, |marker| {
                marker.kind == MarkerKind::Link && marker.attributes.get("href") != href.as_deref()
            });
        }

        let mut merged = range.clone();
        let mut merged_attributes: Option<Attributes> = None;
        self.markers_mut().retain(|marker| {
            let mergeable = marker.kind == kind
                && marker.start <= range.end
                && range.start <= marker.end
                && (!is_link || marker.attributes.get("href") == href.as_deref());
            if mergeable {
                merged.start = merged.start.min(marker.start);
                merged.end = merged.end.max(marker.end);
                merged_attributes.get_or_insert_with(|| marker.attributes.clone());
            }
            !mergeable
        });

        let mut merged_attributes = merged_attributes.unwrap_or_default();
        for (name, value) in attributes.iter() {
            merged_attributes.set(name, value);
        }
        tracing::trace!(
            target: "weaver::richtext::format",
            ?kind,
            range = ?merged,
            "inline marker"
        );
        self.push_frozen(Marker::frozen(kind, merged, merged_attributes));
    }

    fn apply_block(&mut self, kind: MarkerKind, range: &Range<usize>, attributes: Attributes) {
        let mut lines = self.line_bounds(range);
        if lines.is_empty() {
            return;
        }
        if is_line_style(&kind) {
            self.trim_markers(&lines, |marker| is_line_style(&marker.kind));
        } else {
            self.markers_mut().retain(|marker| {
                let mergeable = marker.kind == kind && marker.start <= lines.end && lines.start <= marker.end;
                if mergeable {
                    lines.start = lines.start.min(marker.start);
                    lines.end = lines.end.max(marker.end);
                }
                !mergeable
            });
        }
        let marker = Marker::frozen(kind, lines, attributes)
            .with_alignment_approach(self.alignment_approach());
        self.push_frozen(marker);
    }

    /// One item per non-empty line; switching list type replaces items.
    fn apply_list(&mut self, kind: MarkerKind, range: &Range<usize>, attributes: Attributes) {
        let lines = self.line_bounds(range);
        if lines.is_empty() {
            return;
        }
        self.markers_mut().retain(|marker| {
            !(matches!(marker.kind, MarkerKind::ListItem { .. }) && marker.overlaps(&lines))
        });

        let approach = self.alignment_approach();
        let mut items = Vec::new();
        let mut pos = lines.start;
        while pos < lines.end {
            let mut content_end = pos;
            while content_end < lines.end && self.text().char_at(content_end) != Some('\n') {
                content_end += 1;
            }
            let mut next = content_end;
            while next < lines.end && self.text().char_at(next) == Some('\n') {
                next += 1;
            }
            if content_end > pos {
                items.push(
                    Marker::frozen(kind.clone(), pos..next, attributes.clone())
                        .with_nesting_level(1)
                        .with_alignment_approach(approach),
                );
            }
            pos = next;
        }
        for item in items {
            self.push_frozen(item);
        }
    }

    /// Replace `range` with a horizontal rule on its own line.
    fn insert_rule(
        &mut self,
        range: Range<usize>,
        attributes: Attributes,
    ) -> Result<(), RichTextError> {
        self.delete(range.clone())?;
        let mut at = range.start;
        if at > 0 && self.text().char_at(at - 1) != Some('\n') {
            self.insert_text(at, "\n")?;
            at += 1;
        }
        let mut buf = [0u8; 4];
        self.insert_text(at, OBJECT_REPLACEMENT_CHAR.encode_utf8(&mut buf))?;
        if self.text().char_at(at + 1).is_some_and(|c| c != '\n') {
            self.insert_text(at + 1, "\n")?;
        }
        let marker = Marker::frozen(MarkerKind::HorizontalRule, at..at + 1, attributes)
            .with_alignment_approach(self.alignment_approach());
        self.push_frozen(marker);
        Ok(())
    }

    /// Drop rules touching `range` along with their object slots.
    fn remove_rules(&mut self, range: &Range<usize>) -> Result<(), RichTextError> {
        let mut slots: Vec<usize> = self
            .markers()
            .iter()
            .filter(|marker| marker.kind == MarkerKind::HorizontalRule && touches(marker, range))
            .map(|marker| marker.start)
            .collect();
        self.markers_mut().retain(|marker| {
            !(marker.kind == MarkerKind::HorizontalRule && touches(marker, range))
        });
        slots.sort_unstable();
        for slot in slots.into_iter().rev() {
            self.delete(slot..slot + 1)?;
        }
        Ok(())
    }

    /// Set or clear span-level alignment on blocks touching `range`.
    fn align_blocks(
        &mut self,
        format: TextFormat,
        range: &Range<usize>,
        set: bool,
    ) -> Result<(), RichTextError> {
        if self.alignment_approach() != AlignmentApproach::SpanLevel {
            return Err(RichTextError::UnsupportedFormat(format));
        }
        let alignment = format.alignment();
        let mut touched = 0usize;
        for marker in self.markers_mut().iter_mut() {
            if !marker.kind.is_paragraph_block() || !touches(marker, range) {
                continue;
            }
            if set {
                marker.alignment_approach = AlignmentApproach::SpanLevel;
                marker.set_alignment(alignment);
                touched += 1;
            } else if marker.alignment == alignment {
                marker.set_alignment(None);
                touched += 1;
            }
        }
        if set && touched == 0 {
            tracing::debug!(
                target: "weaver::richtext::format",
                ?format,
                ?range,
                "no block to align"
            );
            return Err(RichTextError::UnsupportedFormat(format));
        }
        Ok(())
    }
}
