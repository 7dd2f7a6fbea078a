//! Style markers: typed range annotations over the text buffer.
//!
//! A marker starts life `Open`, pinned at the buffer length when its opening
//! tag was seen, and is frozen to a concrete `[start, end)` range when the
//! matching close arrives. Frozen markers are plain range metadata; they hold
//! no reference back to the document.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::attributes::Attributes;

/// Placeholder character occupying the buffer slot of an object marker
/// (media, horizontal rule, comment, void hidden tag).
pub const OBJECT_REPLACEMENT_CHAR: char = '\u{FFFC}';

/// Index of a marker inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(pub(crate) usize);

/// How block alignment is expressed.
///
/// `SpanLevel` stores alignment on each block marker; `ViewLevel` leaves it to
/// the host view. Inline markers always carry `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentApproach {
    None,
    SpanLevel,
    #[default]
    ViewLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

impl Alignment {
    pub fn as_css(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" | "end" => Some(Alignment::Right),
            _ => None,
        }
    }

    /// Extract `text-align` from an inline `style` attribute value.
    pub fn from_style(style: &str) -> Option<Self> {
        style.split(';').find_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            if prop.trim().eq_ignore_ascii_case("text-align") {
                Alignment::from_css(value)
            } else {
                None
            }
        })
    }
}

/// Heading level, `h1` through `h6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub fn new(level: u8) -> Option<Self> {
        (1..=6).contains(&level).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

/// What a hidden marker stands for in the original markup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HiddenTag {
    /// A container element wrapping content, e.g. `<div>` or `<span>`.
    Element {
        name: SmolStr,
        raw_attributes: String,
    },
    /// A void or self-closed element, occupying one object slot.
    Void {
        name: SmolStr,
        raw_attributes: String,
    },
    /// An HTML comment, occupying one object slot.
    Comment { text: String },
}

impl HiddenTag {
    pub fn name(&self) -> &str {
        match self {
            HiddenTag::Element { name, .. } | HiddenTag::Void { name, .. } => name,
            HiddenTag::Comment { .. } => "!--",
        }
    }
}

/// Every formatting intent a marker can carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MarkerKind {
    // inline
    Bold,
    Strong,
    Italic,
    Emphasis,
    Cite,
    Underline,
    Strikethrough,
    Code,
    Monospace,
    Big,
    Small,
    Superscript,
    Subscript,
    Font,
    Link,
    Media,
    // block
    Heading(HeadingLevel),
    ListItem { ordered: bool },
    Quote,
    Paragraph,
    HorizontalRule,
    Preformat,
    Hidden(HiddenTag),
}

/// Kind discriminant used to pair a close tag with its open marker.
///
/// All heading levels share a class, as do the strikethrough aliases, so a
/// `</h2>` closes an open `<h1>` the same way a `</del>` closes `<s>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerClass {
    Bold,
    Strong,
    Italic,
    Emphasis,
    Cite,
    Underline,
    Strikethrough,
    Code,
    Monospace,
    Big,
    Small,
    Superscript,
    Subscript,
    Font,
    Link,
    Media,
    Heading,
    ListItem,
    Quote,
    Paragraph,
    HorizontalRule,
    Preformat,
    Hidden,
}

impl MarkerKind {
    pub fn class(&self) -> MarkerClass {
        match self {
            MarkerKind::Bold => MarkerClass::Bold,
            MarkerKind::Strong => MarkerClass::Strong,
            MarkerKind::Italic => MarkerClass::Italic,
            MarkerKind::Emphasis => MarkerClass::Emphasis,
            MarkerKind::Cite => MarkerClass::Cite,
            MarkerKind::Underline => MarkerClass::Underline,
            MarkerKind::Strikethrough => MarkerClass::Strikethrough,
            MarkerKind::Code => MarkerClass::Code,
            MarkerKind::Monospace => MarkerClass::Monospace,
            MarkerKind::Big => MarkerClass::Big,
            MarkerKind::Small => MarkerClass::Small,
            MarkerKind::Superscript => MarkerClass::Superscript,
            MarkerKind::Subscript => MarkerClass::Subscript,
            MarkerKind::Font => MarkerClass::Font,
            MarkerKind::Link => MarkerClass::Link,
            MarkerKind::Media => MarkerClass::Media,
            MarkerKind::Heading(_) => MarkerClass::Heading,
            MarkerKind::ListItem { .. } => MarkerClass::ListItem,
            MarkerKind::Quote => MarkerClass::Quote,
            MarkerKind::Paragraph => MarkerClass::Paragraph,
            MarkerKind::HorizontalRule => MarkerClass::HorizontalRule,
            MarkerKind::Preformat => MarkerClass::Preformat,
            MarkerKind::Hidden(_) => MarkerClass::Hidden,
        }
    }

    /// Block markers own whole lines and carry nesting and alignment.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            MarkerKind::Heading(_)
                | MarkerKind::ListItem { .. }
                | MarkerKind::Quote
                | MarkerKind::Paragraph
                | MarkerKind::HorizontalRule
                | MarkerKind::Preformat
                | MarkerKind::Hidden(_)
        )
    }

    pub fn is_inline(&self) -> bool {
        !self.is_block()
    }

    /// Blocks whose boundaries are expressed with newlines in the buffer.
    ///
    /// Hidden containers are blocks for ordering purposes but never insert
    /// newlines, so they are excluded.
    pub fn is_paragraph_block(&self) -> bool {
        self.is_block() && !matches!(self, MarkerKind::Hidden(_))
    }

    /// Markers that occupy exactly one object slot and serialize self-closed.
    pub fn is_object(&self) -> bool {
        matches!(
            self,
            MarkerKind::Media
                | MarkerKind::HorizontalRule
                | MarkerKind::Hidden(HiddenTag::Void { .. } | HiddenTag::Comment { .. })
        )
    }

    /// Canonical lower-case tag name used on output.
    pub fn tag_name(&self) -> &str {
        match self {
            MarkerKind::Bold => "b",
            MarkerKind::Strong => "strong",
            MarkerKind::Italic => "i",
            MarkerKind::Emphasis => "em",
            MarkerKind::Cite => "cite",
            MarkerKind::Underline => "u",
            MarkerKind::Strikethrough => "del",
            MarkerKind::Code => "code",
            MarkerKind::Monospace => "tt",
            MarkerKind::Big => "big",
            MarkerKind::Small => "small",
            MarkerKind::Superscript => "sup",
            MarkerKind::Subscript => "sub",
            MarkerKind::Font => "font",
            MarkerKind::Link => "a",
            MarkerKind::Media => "img",
            MarkerKind::Heading(level) => match level.get() {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            MarkerKind::ListItem { .. } => "li",
            MarkerKind::Quote => "blockquote",
            MarkerKind::Paragraph => "p",
            MarkerKind::HorizontalRule => "hr",
            MarkerKind::Preformat => "pre",
            MarkerKind::Hidden(tag) => tag.name(),
        }
    }

    /// Tie-break when two markers cover the same range: lower goes outside.
    ///
    /// Hidden markers have none; against them the open order decides.
    pub(crate) fn priority(&self) -> Option<u8> {
        match self {
            MarkerKind::Hidden(_) => None,
            kind if kind.is_block() => Some(0),
            MarkerKind::Link => Some(1),
            _ => Some(2),
        }
    }
}

/// Lifecycle state of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerState {
    /// Waiting for its close; `end` still equals `start`.
    Open,
    /// Range fixed.
    Frozen,
}

/// A formatting annotation over `[start, end)` of the buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub start: usize,
    pub end: usize,
    pub attributes: Attributes,
    /// Depth among markers of the same family when opened (blocks only).
    pub nesting_level: usize,
    pub alignment_approach: AlignmentApproach,
    /// Only meaningful under [`AlignmentApproach::SpanLevel`].
    pub alignment: Option<Alignment>,
    state: MarkerState,
    /// Creation sequence, used to keep equal ranges in open order.
    pub(crate) order: u64,
}

impl Marker {
    /// A zero-width marker pinned at `position`.
    pub fn open(kind: MarkerKind, position: usize, attributes: Attributes) -> Self {
        Self {
            kind,
            start: position,
            end: position,
            attributes,
            nesting_level: 0,
            alignment_approach: AlignmentApproach::None,
            alignment: None,
            state: MarkerState::Open,
            order: 0,
        }
    }

    /// A marker that is already frozen over `range`.
    pub fn frozen(kind: MarkerKind, range: Range<usize>, attributes: Attributes) -> Self {
        let mut marker = Self::open(kind, range.start, attributes);
        marker.end = range.end;
        marker.state = MarkerState::Frozen;
        marker
    }

    pub fn with_nesting_level(mut self, level: usize) -> Self {
        self.nesting_level = level;
        self
    }

    /// Stamp the alignment approach; inline kinds always keep `None`.
    pub fn with_alignment_approach(mut self, approach: AlignmentApproach) -> Self {
        if self.kind.is_block() {
            self.alignment_approach = approach;
            if approach == AlignmentApproach::SpanLevel {
                self.alignment = self.attributes.get("style").and_then(Alignment::from_style);
            }
        }
        self
    }

    pub fn state(&self) -> MarkerState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == MarkerState::Open
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    pub fn covers(&self, range: &Range<usize>) -> bool {
        self.start <= range.start && range.end <= self.end
    }

    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }

    /// Fix the end of an open marker. Returns `false` (and changes nothing) if
    /// the marker was already frozen.
    pub(crate) fn freeze(&mut self, end: usize) -> bool {
        if self.state == MarkerState::Frozen {
            return false;
        }
        self.end = end.max(self.start);
        self.state = MarkerState::Frozen;
        true
    }

    /// Set span-level alignment and mirror it into the `style` attribute.
    pub fn set_alignment(&mut self, alignment: Option<Alignment>) {
        self.alignment = alignment;
        let existing = self.attributes.get("style").unwrap_or_default();
        let mut decls: Vec<String> = existing
            .split(';')
            .map(str::trim)
            .filter(|decl| !decl.is_empty())
            .filter(|decl| {
                decl.split_once(':')
                    .map(|(prop, _)| !prop.trim().eq_ignore_ascii_case("text-align"))
                    .unwrap_or(true)
            })
            .map(str::to_owned)
            .collect();
        if let Some(alignment) = alignment {
            decls.push(format!("text-align: {}", alignment.as_css()));
        }
        if decls.is_empty() {
            self.attributes.remove("style");
        } else {
            self.attributes.set("style", format!("{};", decls.join("; ")));
        }
    }
}
