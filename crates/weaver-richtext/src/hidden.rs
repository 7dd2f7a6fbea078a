//! Bookkeeping for markup the model has no dedicated marker for.
//!
//! Container tags (`div`, `span`, custom elements), comments and unknown void
//! elements are kept as hidden markers carrying their tag name and the
//! attributes serialized at open time, so the writer can echo them back
//! unchanged.
//!
//! Closing is not matched by name: a close tag freezes the innermost hidden
//! block that is still open, so `<div><span></div>` pairs positionally.

use smol_str::SmolStr;

use crate::attributes::Attributes;
use crate::document::Document;
use crate::marker::{HiddenTag, Marker, MarkerId, MarkerKind};
use crate::text::TextBuffer;

/// Stack of currently open hidden blocks.
#[derive(Debug, Clone, Default)]
pub struct HiddenBlockTracker {
    open: Vec<MarkerId>,
    depth: usize,
}

impl HiddenBlockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth; the next opened block is stamped with it.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open a hidden container at the end of the buffer.
    pub fn on_open<T: TextBuffer>(
        &mut self,
        doc: &mut Document<T>,
        name: &str,
        attributes: Attributes,
    ) -> MarkerId {
        let tag = HiddenTag::Element {
            name: SmolStr::new(name),
            raw_attributes: attributes.serialize(),
        };
        let marker = Marker::open(MarkerKind::Hidden(tag), 0, attributes)
            .with_nesting_level(self.depth)
            .with_alignment_approach(doc.alignment_approach());
        let id = doc.open(marker);
        self.depth += 1;
        self.open.push(id);
        id
    }

    /// Freeze the innermost open hidden block, whatever its tag name.
    ///
    /// Returns `false` if no hidden block was open. An empty block is
    /// discarded but still counts as closed.
    pub fn on_close<T: TextBuffer>(&mut self, doc: &mut Document<T>, name: &str) -> bool {
        while let Some(id) = self.open.pop() {
            let Some(marker) = doc.open_marker(id) else {
                continue;
            };
            if !marker.kind.tag_name().eq_ignore_ascii_case(name) {
                tracing::debug!(
                    target: "weaver::richtext::parse",
                    open = marker.kind.tag_name(),
                    close = name,
                    "hidden close tag paired with a differently named open tag"
                );
            }
            self.depth = self.depth.saturating_sub(1);
            doc.close(id);
            return true;
        }
        tracing::debug!(
            target: "weaver::richtext::parse",
            close = name,
            "close tag with no open hidden block"
        );
        false
    }

    /// Record a void or self-closed unknown element as a one-slot object.
    pub fn on_void<T: TextBuffer>(
        &mut self,
        doc: &mut Document<T>,
        name: &str,
        attributes: Attributes,
    ) {
        let tag = HiddenTag::Void {
            name: SmolStr::new(name),
            raw_attributes: attributes.serialize(),
        };
        self.append_object(doc, tag, attributes);
    }

    /// Record a comment as a one-slot object.
    pub fn on_comment<T: TextBuffer>(&mut self, doc: &mut Document<T>, text: &str) {
        let tag = HiddenTag::Comment {
            text: text.to_owned(),
        };
        self.append_object(doc, tag, Attributes::new());
    }

    fn append_object<T: TextBuffer>(
        &self,
        doc: &mut Document<T>,
        tag: HiddenTag,
        attributes: Attributes,
    ) {
        let depth = self.depth;
        doc.append_object(MarkerKind::Hidden(tag), attributes);
        if let Some(marker) = doc.markers_mut().last_mut() {
            marker.nesting_level = depth;
        }
    }
}
