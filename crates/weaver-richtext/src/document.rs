//! The styled-text document: a text buffer plus the markers over it.
//!
//! Markers live in two places. Open markers (seen an opening tag, still
//! waiting for the close) sit in `pending`, addressed by [`MarkerId`]; taking a
//! marker out of its slot is what freezes it, so a marker can't be frozen
//! twice. Frozen markers move to `markers` and are never open again.

use std::ops::Range;

use crate::attributes::Attributes;
use crate::error::RichTextError;
use crate::marker::{AlignmentApproach, Marker, MarkerId, MarkerKind, OBJECT_REPLACEMENT_CHAR};
use crate::text::{TextBuffer, TextRope};

/// Text buffer plus style markers.
#[derive(Debug, Clone)]
pub struct Document<T: TextBuffer = TextRope> {
    text: T,
    markers: Vec<Marker>,
    pending: Vec<Option<Marker>>,
    next_order: u64,
    alignment_approach: AlignmentApproach,
}

impl<T: TextBuffer + Default> Default for Document<T> {
    fn default() -> Self {
        Self::with_buffer(T::default())
    }
}

impl Document<TextRope> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unstyled document holding `text`.
    pub fn from_plain_text(text: &str) -> Self {
        Self::with_buffer(TextRope::from_str(text))
    }
}

impl<T: TextBuffer> Document<T> {
    pub fn with_buffer(text: T) -> Self {
        Self {
            text,
            markers: Vec::new(),
            pending: Vec::new(),
            next_order: 0,
            alignment_approach: AlignmentApproach::default(),
        }
    }

    pub fn with_alignment_approach(mut self, approach: AlignmentApproach) -> Self {
        self.alignment_approach = approach;
        self
    }

    pub fn alignment_approach(&self) -> AlignmentApproach {
        self.alignment_approach
    }

    // === Buffer access ===

    pub fn text(&self) -> &T {
        &self.text
    }

    pub fn plain_text(&self) -> String {
        self.text.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    // === Marker access ===

    /// Frozen markers, in the order they were frozen or added.
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub(crate) fn markers_mut(&mut self) -> &mut Vec<Marker> {
        &mut self.markers
    }

    /// Markers still waiting for their close.
    pub fn open_markers(&self) -> impl Iterator<Item = (MarkerId, &Marker)> {
        self.pending
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|marker| (MarkerId(idx), marker)))
    }

    pub fn open_marker(&self, id: MarkerId) -> Option<&Marker> {
        self.pending.get(id.0).and_then(Option::as_ref)
    }

    /// Frozen markers containing `offset`.
    pub fn markers_at(&self, offset: usize) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |marker| marker.contains(offset))
    }

    /// Frozen markers whose kind satisfies `pred`.
    pub fn markers_of<'a>(
        &'a self,
        pred: impl Fn(&MarkerKind) -> bool + 'a,
    ) -> impl Iterator<Item = &'a Marker> + 'a {
        self.markers.iter().filter(move |marker| pred(&marker.kind))
    }

    fn stamp(&mut self, marker: &mut Marker) {
        marker.order = self.next_order;
        self.next_order += 1;
    }

    /// Add an already-frozen marker. Empty ranges are dropped.
    pub(crate) fn push_frozen(&mut self, mut marker: Marker) -> bool {
        if marker.is_empty() || marker.end > self.len_chars() {
            return false;
        }
        self.stamp(&mut marker);
        self.markers.push(marker);
        true
    }

    // === Parse-time construction ===

    /// Append text at the end of the buffer. Open markers stay where they are.
    pub fn append(&mut self, text: &str) {
        self.text.push(text);
    }

    /// Pin `marker` at the current end of the buffer in the open state.
    pub fn open(&mut self, mut marker: Marker) -> MarkerId {
        let position = self.len_chars();
        marker.start = position;
        marker.end = position;
        self.stamp(&mut marker);
        self.pending.push(Some(marker));
        MarkerId(self.pending.len() - 1)
    }

    /// Freeze an open marker at the current end of the buffer.
    ///
    /// Returns `false` when the marker was already closed or turned out empty
    /// (empty markers are discarded).
    pub fn close(&mut self, id: MarkerId) -> bool {
        self.close_into(id, Vec::new())
    }

    /// Close an open marker, replacing it with `replacements` over its range.
    ///
    /// An empty replacement list freezes the marker itself. Replacements keep
    /// the original attributes, nesting level and alignment.
    pub fn close_into(&mut self, id: MarkerId, replacements: Vec<MarkerKind>) -> bool {
        let Some(mut marker) = self.pending.get_mut(id.0).and_then(Option::take) else {
            return false;
        };
        let end = self.len_chars();
        if !marker.freeze(end) || marker.is_empty() {
            tracing::trace!(
                target: "weaver::richtext::document",
                kind = ?marker.kind,
                at = end,
                "discarding empty marker"
            );
            return false;
        }
        if replacements.is_empty() {
            self.markers.push(marker);
        } else {
            for kind in replacements {
                // Replacements share the open order of the tag they stand for.
                let mut replacement = marker.clone();
                replacement.kind = kind;
                self.markers.push(replacement);
            }
        }
        true
    }

    /// Drop an open marker without attaching it.
    pub fn discard(&mut self, id: MarkerId) -> bool {
        self.pending
            .get_mut(id.0)
            .and_then(Option::take)
            .is_some()
    }

    /// Close (or drop) everything still open, innermost first.
    pub(crate) fn settle_open(&mut self, close: bool) {
        for idx in (0..self.pending.len()).rev() {
            if let Some(marker) = &self.pending[idx] {
                tracing::debug!(
                    target: "weaver::richtext::document",
                    kind = ?marker.kind,
                    start = marker.start,
                    close,
                    "unterminated marker at end of input"
                );
                if close {
                    self.close(MarkerId(idx));
                } else {
                    self.discard(MarkerId(idx));
                }
            }
        }
        self.pending.clear();
    }

    /// Append a single object slot covered by a frozen marker of `kind`.
    pub fn append_object(&mut self, kind: MarkerKind, attributes: Attributes) -> &Marker {
        let start = self.len_chars();
        let mut buf = [0u8; 4];
        self.text.push(OBJECT_REPLACEMENT_CHAR.encode_utf8(&mut buf));
        let mut marker = Marker::frozen(kind, start..start + 1, attributes)
            .with_alignment_approach(self.alignment_approach);
        self.stamp(&mut marker);
        self.markers.push(marker);
        &self.markers[self.markers.len() - 1]
    }

    /// Separate blocks by exactly one blank line.
    ///
    /// Two or more trailing newlines: nothing. One: add one. None on a
    /// non-empty buffer: add two. Empty buffer: nothing.
    pub fn paragraph_break(&mut self) {
        if self.text.is_empty() {
            return;
        }
        match self.text.trailing_newlines(2) {
            0 => self.text.push("\n\n"),
            1 => self.text.push("\n"),
            _ => {}
        }
    }

    /// Start a new line unless the buffer is empty or already on one.
    pub fn ensure_line_start(&mut self) {
        if !self.text.is_empty() && self.text.last_char() != Some('\n') {
            self.text.push("\n");
        }
    }

    // === Editing ===

    pub(crate) fn check_range(&self, range: &Range<usize>) -> Result<(), RichTextError> {
        let len = self.len_chars();
        if range.start > range.end || range.end > len {
            return Err(RichTextError::invalid_range(range.start, range.end, len));
        }
        Ok(())
    }

    /// Insert text, moving markers with it.
    ///
    /// Frozen markers are exclusive at both ends: inserting at a marker's start
    /// shifts it, at its end leaves it alone, strictly inside grows it. Open
    /// markers keep their offset when text lands exactly on them.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> Result<(), RichTextError> {
        self.check_range(&(offset..offset))?;
        let inserted = text.chars().count();
        if inserted == 0 {
            return Ok(());
        }
        self.text.insert(offset, text);

        for marker in &mut self.markers {
            if offset <= marker.start {
                marker.start += inserted;
                marker.end += inserted;
            } else if offset < marker.end {
                marker.end += inserted;
            }
        }
        for marker in self.pending.iter_mut().flatten() {
            if offset < marker.start {
                marker.start += inserted;
                marker.end += inserted;
            }
        }
        Ok(())
    }

    /// Delete a char range, shrinking markers and dropping emptied ones.
    pub fn delete(&mut self, range: Range<usize>) -> Result<(), RichTextError> {
        self.check_range(&range)?;
        if range.is_empty() {
            return Ok(());
        }
        self.text.delete(range.clone());

        let removed = range.len();
        let adjust = |pos: usize| {
            if pos <= range.start {
                pos
            } else if pos >= range.end {
                pos - removed
            } else {
                range.start
            }
        };
        for marker in &mut self.markers {
            marker.start = adjust(marker.start);
            marker.end = adjust(marker.end);
        }
        self.markers.retain(|marker| !marker.is_empty());
        for marker in self.pending.iter_mut().flatten() {
            marker.start = adjust(marker.start);
            marker.end = marker.start;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::MarkerState;

    fn with_text(text: &str) -> Document {
        let mut doc = Document::new();
        doc.append(text);
        doc
    }

    #[test]
    fn paragraph_break_normalization() {
        let mut doc = with_text("x\n");
        doc.paragraph_break();
        assert_eq!(doc.plain_text(), "x\n\n");

        doc.paragraph_break();
        assert_eq!(doc.plain_text(), "x\n\n");

        let mut doc = with_text("x");
        doc.paragraph_break();
        assert_eq!(doc.plain_text(), "x\n\n");

        let mut doc = Document::new();
        doc.paragraph_break();
        assert_eq!(doc.plain_text(), "");
    }

    #[test]
    fn ensure_line_start_adds_at_most_one_newline() {
        let mut doc = with_text("a");
        doc.ensure_line_start();
        doc.ensure_line_start();
        assert_eq!(doc.plain_text(), "a\n");

        let mut doc = Document::new();
        doc.ensure_line_start();
        assert_eq!(doc.plain_text(), "");
    }

    #[test]
    fn open_marker_stays_behind_appended_text() {
        let mut doc = with_text("ab");
        let id = doc.open(Marker::open(MarkerKind::Bold, 0, Attributes::new()));
        assert_eq!(doc.open_marker(id).map(Marker::range), Some(2..2));

        doc.append("cd");
        assert_eq!(doc.open_marker(id).map(Marker::range), Some(2..2));

        assert!(doc.close(id));
        assert_eq!(doc.markers()[0].range(), 2..4);
        assert_eq!(doc.markers()[0].state(), MarkerState::Frozen);
    }

    #[test]
    fn closing_twice_is_refused() {
        let mut doc = Document::new();
        let id = doc.open(Marker::open(MarkerKind::Italic, 0, Attributes::new()));
        doc.append("x");
        assert!(doc.close(id));
        assert!(!doc.close(id));
        assert_eq!(doc.markers().len(), 1);
    }

    #[test]
    fn empty_markers_are_discarded() {
        let mut doc = with_text("x");
        let id = doc.open(Marker::open(MarkerKind::Bold, 0, Attributes::new()));
        assert!(!doc.close(id));
        assert!(doc.markers().is_empty());
        assert_eq!(doc.open_markers().count(), 0);
    }

    #[test]
    fn close_into_replacements() {
        let mut doc = Document::new();
        let id = doc.open(Marker::open(MarkerKind::Bold, 0, Attributes::new()));
        doc.append("xy");
        assert!(doc.close_into(id, vec![MarkerKind::Bold, MarkerKind::Underline]));

        let kinds: Vec<_> = doc.markers().iter().map(|m| (m.kind.clone(), m.range())).collect();
        assert_eq!(
            kinds,
            vec![(MarkerKind::Bold, 0..2), (MarkerKind::Underline, 0..2)]
        );
    }

    #[test]
    fn insert_moves_frozen_markers_exclusively() {
        let mut doc = with_text("hello");
        doc.push_frozen(Marker::frozen(MarkerKind::Bold, 1..4, Attributes::new()));

        doc.insert_text(1, "X").unwrap(); // at start: shift
        assert_eq!(doc.markers()[0].range(), 2..5);

        doc.insert_text(5, "Y").unwrap(); // at end: no growth
        assert_eq!(doc.markers()[0].range(), 2..5);

        doc.insert_text(3, "Z").unwrap(); // inside: grow
        assert_eq!(doc.markers()[0].range(), 2..6);
        assert_eq!(doc.plain_text(), "hXeZllYo");
    }

    #[test]
    fn delete_shrinks_and_drops() {
        let mut doc = with_text("hello world");
        doc.push_frozen(Marker::frozen(MarkerKind::Bold, 0..5, Attributes::new()));
        doc.push_frozen(Marker::frozen(MarkerKind::Italic, 6..11, Attributes::new()));

        doc.delete(3..8).unwrap();
        assert_eq!(doc.plain_text(), "helrld");
        assert_eq!(doc.markers()[0].range(), 0..3);
        assert_eq!(doc.markers()[1].range(), 3..6);

        doc.delete(3..6).unwrap();
        assert_eq!(doc.markers().len(), 1);
    }

    #[test]
    fn invalid_ranges_leave_document_untouched() {
        let mut doc = with_text("abc");
        assert_eq!(
            doc.delete(2..5),
            Err(RichTextError::InvalidRange { start: 2, end: 5, len: 3 })
        );
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 2..1;
        assert!(doc.delete(reversed).is_err());
        assert!(doc.insert_text(4, "x").is_err());
        assert_eq!(doc.plain_text(), "abc");
    }

    #[test]
    fn settle_open_closes_or_discards() {
        let mut doc = Document::new();
        doc.open(Marker::open(MarkerKind::Bold, 0, Attributes::new()));
        doc.append("text");
        doc.settle_open(true);
        assert_eq!(doc.markers()[0].range(), 0..4);

        let mut doc = Document::new();
        doc.open(Marker::open(MarkerKind::Bold, 0, Attributes::new()));
        doc.append("text");
        doc.settle_open(false);
        assert!(doc.markers().is_empty());
    }

    #[test]
    fn objects_take_one_slot() {
        let mut doc = with_text("a");
        let attrs: Attributes = [("src", "x.png")].into_iter().collect();
        let marker = doc.append_object(MarkerKind::Media, attrs);
        assert_eq!(marker.range(), 1..2);
        assert_eq!(doc.text().char_at(1), Some(OBJECT_REPLACEMENT_CHAR));
    }
}
