//! HtmlWriter - serializes a [`Document`] back to HTML.
//!
//! One left-to-right walk over the buffer. At each offset the writer first
//! closes markers ending there, then opens markers starting there, then emits
//! the character. Tags are kept strictly nested: when a marker has to close
//! while markers opened after it are still running, those are closed too and
//! reopened right after.
//!
//! Newlines come in two flavours. Runs that only separate blocks (the trailing
//! newlines of a paragraph block, or the gap right before or after one) are
//! structural and dropped, since the block tags already carry them. Any other
//! newline was a `<br>` and is written back as one, or literally inside
//! `<pre>`.

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashSet};
use std::ops::Range;

use markdown_weaver_escape::{FmtWriter, StrWrite, escape_html_body_text};

use crate::document::Document;
use crate::marker::{HiddenTag, Marker, MarkerKind, OBJECT_REPLACEMENT_CHAR};
use crate::text::TextBuffer;

/// Put recognized kinds in priority order across the slots they hold in each
/// run of tied items. Hidden markers keep the place open order gave them.
fn settle_ties<I: Copy>(
    items: &mut [I],
    tied: impl Fn(I, I) -> bool,
    priority: impl Fn(I) -> Option<u8>,
) {
    let mut start = 0;
    while start < items.len() {
        let mut end = start + 1;
        while end < items.len() && tied(items[start], items[end]) {
            end += 1;
        }
        let run = &mut items[start..end];
        let slots: Vec<usize> = (0..run.len())
            .filter(|&slot| priority(run[slot]).is_some())
            .collect();
        let mut ranked: Vec<I> = slots.iter().map(|&slot| run[slot]).collect();
        ranked.sort_by_key(|&item| priority(item));
        for (slot, item) in slots.into_iter().zip(ranked) {
            run[slot] = item;
        }
        start = end;
    }
}

/// An `<ul>`/`<ol>` whose last item just closed.
#[derive(Debug, Clone, Copy)]
struct OpenList {
    ordered: bool,
    level: usize,
    depth: usize,
}

fn list_tag(ordered: bool) -> &'static str {
    if ordered { "ol" } else { "ul" }
}

/// HTML writer over a document's markers.
///
/// Generic over:
/// - `T`: text buffer of the document
/// - `W`: output sink
pub struct HtmlWriter<'a, T: TextBuffer, W: StrWrite> {
    doc: &'a Document<T>,
    writer: W,

    /// Frozen, non-empty markers sorted by start, widest first, then open
    /// order with recognized kinds ranked on ties.
    markers: Vec<&'a Marker>,
    /// Indices into `markers` of currently open tags, outermost first.
    stack: Vec<usize>,
    next: usize,
    /// List wrapper left open for a following sibling item.
    open_list: Option<OpenList>,

    /// Start offsets of paragraph blocks.
    block_starts: HashSet<usize>,
    /// End offset of paragraph blocks mapped to the earliest start ending there.
    block_ends: BTreeMap<usize, usize>,

    /// Body text not yet escaped and written.
    text: String,
    /// Current newline run and whether it is structural.
    newline_run: Option<(Range<usize>, bool)>,
}

impl<'a, T: TextBuffer, W: StrWrite> HtmlWriter<'a, T, W> {
    pub fn new(doc: &'a Document<T>, writer: W) -> Self {
        let len = doc.len_chars();
        let mut markers: Vec<&Marker> = doc
            .markers()
            .iter()
            .filter(|marker| {
                let in_bounds = marker.end <= len;
                if !in_bounds {
                    tracing::debug!(
                        target: "weaver::richtext::writer",
                        kind = ?marker.kind,
                        range = ?marker.range(),
                        len,
                        "skipping marker past end of buffer"
                    );
                }
                in_bounds && !marker.is_empty()
            })
            .collect();
        markers.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.order.cmp(&b.order))
        });
        settle_ties(
            &mut markers,
            |a, b| a.range() == b.range(),
            |marker| marker.kind.priority(),
        );

        let mut block_starts = HashSet::new();
        let mut block_ends = BTreeMap::new();
        for marker in markers.iter().filter(|marker| marker.kind.is_paragraph_block()) {
            block_starts.insert(marker.start);
            block_ends
                .entry(marker.end)
                .and_modify(|start: &mut usize| *start = (*start).min(marker.start))
                .or_insert(marker.start);
        }

        Self {
            doc,
            writer,
            markers,
            stack: Vec::new(),
            next: 0,
            open_list: None,
            block_starts,
            block_ends,
            text: String::new(),
            newline_run: None,
        }
    }

    /// Walk the document and write it out.
    pub fn run(mut self) -> Result<(), W::Error> {
        let source = self.doc.text().to_string();
        let len = self.doc.len_chars();
        tracing::trace!(
            target: "weaver::richtext::writer",
            chars = len,
            markers = self.markers.len(),
            "writing html"
        );

        let mut chars = source.char_indices();
        for pos in 0..=len {
            let reopen = self.close_at(pos)?;
            let Some((byte, c)) = chars.next() else {
                break;
            };
            let object_here = self.open_at(pos, reopen)?;
            match c {
                OBJECT_REPLACEMENT_CHAR if object_here => {}
                '\n' => self.newline(pos, &source[byte..])?,
                c => self.text.push(c),
            }
        }
        self.flush_text()?;
        self.close_list()
    }

    fn close_list(&mut self) -> Result<(), W::Error> {
        match self.open_list.take() {
            Some(list) => write!(self.writer, "</{}>", list_tag(list.ordered)),
            None => Ok(()),
        }
    }

    fn flush_text(&mut self) -> Result<(), W::Error> {
        if !self.text.is_empty() {
            self.close_list()?;
            escape_html_body_text(&mut self.writer, &self.text)?;
            self.text.clear();
        }
        Ok(())
    }

    /// Close everything ending at `pos`. Returns markers that had to be closed
    /// early and still need reopening.
    fn close_at(&mut self, pos: usize) -> Result<Vec<usize>, W::Error> {
        let markers = &self.markers;
        let Some(lowest) = self
            .stack
            .iter()
            .position(|&idx| markers[idx].end <= pos)
        else {
            return Ok(Vec::new());
        };
        self.flush_text()?;

        let closing = self.stack.split_off(lowest);
        let mut reopen = Vec::new();
        for (offset, &idx) in closing.iter().enumerate().rev() {
            self.close_tag(idx, lowest + offset)?;
            if self.markers[idx].end > pos {
                reopen.push(idx);
            }
        }
        Ok(reopen)
    }

    /// Open `reopen` plus every marker starting at `pos`. Returns whether an
    /// object was written for this position.
    fn open_at(&mut self, pos: usize, mut opening: Vec<usize>) -> Result<bool, W::Error> {
        while self.next < self.markers.len() && self.markers[self.next].start <= pos {
            opening.push(self.next);
            self.next += 1;
        }
        if opening.is_empty() {
            return Ok(false);
        }
        let markers = &self.markers;
        opening.sort_by(|&a, &b| {
            let (a, b) = (markers[a], markers[b]);
            b.end.cmp(&a.end).then(a.order.cmp(&b.order))
        });
        settle_ties(
            &mut opening,
            |a, b| markers[a].end == markers[b].end,
            |idx| markers[idx].kind.priority(),
        );
        self.flush_text()?;

        let mut object_here = false;
        for idx in opening {
            let marker = self.markers[idx];
            if marker.kind.is_object() {
                self.write_object(marker)?;
                object_here = true;
                continue;
            }
            self.open_tag(idx)?;
            self.stack.push(idx);
        }
        Ok(object_here)
    }

    fn open_tag(&mut self, idx: usize) -> Result<(), W::Error> {
        let marker = self.markers[idx];
        let depth = self.stack.len();
        if let MarkerKind::ListItem { ordered } = marker.kind {
            let sibling = self.open_list.take_if(|list| {
                list.ordered == ordered && list.level == marker.nesting_level && list.depth == depth
            });
            if sibling.is_none() {
                self.close_list()?;
                write!(self.writer, "<{}>", list_tag(ordered))?;
            }
        } else {
            self.close_list()?;
        }
        match &marker.kind {
            MarkerKind::Hidden(HiddenTag::Element {
                name,
                raw_attributes,
            }) => {
                write!(self.writer, "<{}", name)?;
                self.writer.write_str(raw_attributes)?;
            }
            kind => {
                write!(self.writer, "<{}", kind.tag_name())?;
                marker.attributes.write_to(&mut self.writer)?;
            }
        }
        self.writer.write_str(">")
    }

    /// Close the tag at `depth` in the stack. A list item leaves its wrapper
    /// open until something other than a sibling item is written.
    fn close_tag(&mut self, idx: usize, depth: usize) -> Result<(), W::Error> {
        self.close_list()?;
        let marker = self.markers[idx];
        write!(self.writer, "</{}>", marker.kind.tag_name())?;
        if let MarkerKind::ListItem { ordered } = marker.kind {
            self.open_list = Some(OpenList {
                ordered,
                level: marker.nesting_level,
                depth,
            });
        }
        Ok(())
    }

    fn write_object(&mut self, marker: &Marker) -> Result<(), W::Error> {
        self.close_list()?;
        match &marker.kind {
            MarkerKind::Hidden(HiddenTag::Comment { text }) => {
                write!(self.writer, "<!--{}-->", text)
            }
            MarkerKind::Hidden(HiddenTag::Void {
                name,
                raw_attributes,
            }) => write!(self.writer, "<{}{}/>", name, raw_attributes),
            kind => {
                write!(self.writer, "<{}", kind.tag_name())?;
                marker.attributes.write_to(&mut self.writer)?;
                self.writer.write_str("/>")
            }
        }
    }

    /// `rest` is the source text from `pos` on.
    fn newline(&mut self, pos: usize, rest: &str) -> Result<(), W::Error> {
        let structural = match &self.newline_run {
            Some((run, structural)) if run.contains(&pos) => *structural,
            _ => {
                let run = pos..pos + rest.bytes().take_while(|&b| b == b'\n').count();
                let structural = self.is_structural(&run);
                tracing::trace!(
                    target: "weaver::richtext::writer",
                    ?run,
                    structural,
                    "newline run"
                );
                self.newline_run = Some((run, structural));
                structural
            }
        };
        if structural {
            return Ok(());
        }
        if self.in_pre() {
            self.text.push('\n');
            Ok(())
        } else {
            self.flush_text()?;
            self.close_list()?;
            self.writer.write_str("<br>")
        }
    }

    /// A run is structural when a paragraph block ends inside it (having
    /// started before it), starts right after it or ends right before it.
    fn is_structural(&self, run: &Range<usize>) -> bool {
        self.block_starts.contains(&run.end)
            || self.block_ends.contains_key(&run.start)
            || self
                .block_ends
                .range(run.start + 1..=run.end)
                .any(|(_, &start)| start <= run.start)
    }

    fn in_pre(&self) -> bool {
        self.stack
            .iter()
            .any(|&idx| self.markers[idx].kind == MarkerKind::Preformat)
    }
}

/// Serialize `doc` to an HTML string.
pub fn to_html<T: TextBuffer>(doc: &Document<T>) -> String {
    let mut out = String::new();
    // fmt::Write into a String never errors.
    let _ = HtmlWriter::new(doc, FmtWriter(&mut out)).run();
    out
}
