//! Tag name → marker kind table.
//!
//! Lookups are case-insensitive. Anything not in the table is handed to the
//! hidden-block tracker by the parser.

use std::collections::HashMap;

use smol_str::SmolStr;

use crate::marker::{HeadingLevel, MarkerKind};

/// What the parser does when it meets a tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRole {
    /// Open a marker of `kind`. On close the open marker is replaced by
    /// `replacements` over the same frozen range, or frozen as-is when the
    /// list is empty.
    Marker {
        kind: MarkerKind,
        replacements: Vec<MarkerKind>,
    },
    /// `<ul>` / `<ol>`: produces no marker, only list context for items.
    ListContainer { ordered: bool },
    /// `<br>`: a newline in the buffer.
    LineBreak,
    /// Void element occupying a single object slot (`<img>`, `<hr>`).
    Object(MarkerKind),
}

/// A table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRule {
    pub role: TagRole,
    /// Open and close of this tag sit on a paragraph boundary.
    pub paragraph_boundary: bool,
}

impl TagRule {
    pub fn marker(kind: MarkerKind) -> Self {
        Self {
            role: TagRole::Marker {
                kind,
                replacements: Vec::new(),
            },
            paragraph_boundary: false,
        }
    }

    /// A marker whose close emits `replacements` instead of itself.
    pub fn replacing(kind: MarkerKind, replacements: Vec<MarkerKind>) -> Self {
        Self {
            role: TagRole::Marker { kind, replacements },
            paragraph_boundary: false,
        }
    }

    pub fn paragraph(mut self) -> Self {
        self.paragraph_boundary = true;
        self
    }

    fn role(role: TagRole) -> Self {
        Self {
            role,
            paragraph_boundary: false,
        }
    }
}

/// Case-insensitive mapping from tag names to rules.
#[derive(Debug, Clone)]
pub struct TagTable {
    rules: HashMap<SmolStr, TagRule>,
}

impl Default for TagTable {
    fn default() -> Self {
        let mut table = Self::empty();

        table.register("b", TagRule::marker(MarkerKind::Bold));
        table.register("strong", TagRule::marker(MarkerKind::Strong));
        table.register("i", TagRule::marker(MarkerKind::Italic));
        table.register("em", TagRule::marker(MarkerKind::Emphasis));
        table.register("cite", TagRule::marker(MarkerKind::Cite));
        table.register("dfn", TagRule::marker(MarkerKind::Italic));
        table.register("u", TagRule::marker(MarkerKind::Underline));
        for alias in ["s", "strike", "del"] {
            table.register(alias, TagRule::marker(MarkerKind::Strikethrough));
        }
        table.register("code", TagRule::marker(MarkerKind::Code));
        table.register("tt", TagRule::marker(MarkerKind::Monospace));
        table.register("big", TagRule::marker(MarkerKind::Big));
        table.register("small", TagRule::marker(MarkerKind::Small));
        table.register("sup", TagRule::marker(MarkerKind::Superscript));
        table.register("sub", TagRule::marker(MarkerKind::Subscript));
        table.register("font", TagRule::marker(MarkerKind::Font));
        table.register("a", TagRule::marker(MarkerKind::Link));

        for level in 1..=6u8 {
            if let Some(level) = HeadingLevel::new(level) {
                let name = format!("h{}", level.get());
                table.register(name, TagRule::marker(MarkerKind::Heading(level)).paragraph());
            }
        }
        table.register("p", TagRule::marker(MarkerKind::Paragraph).paragraph());
        table.register("blockquote", TagRule::marker(MarkerKind::Quote).paragraph());
        table.register("pre", TagRule::marker(MarkerKind::Preformat).paragraph());
        // Items get their own single-newline normalization in the parser.
        table.register(
            "li",
            TagRule::marker(MarkerKind::ListItem { ordered: false }),
        );

        table.register("ul", TagRule::role(TagRole::ListContainer { ordered: false }));
        table.register("ol", TagRule::role(TagRole::ListContainer { ordered: true }));
        table.register("br", TagRule::role(TagRole::LineBreak));
        table.register("img", TagRule::role(TagRole::Object(MarkerKind::Media)));
        table.register(
            "hr",
            TagRule::role(TagRole::Object(MarkerKind::HorizontalRule)).paragraph(),
        );

        table
    }
}

impl TagTable {
    /// A table with no rules: every tag becomes a hidden block.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Add or replace the rule for `name`.
    pub fn register(&mut self, name: impl AsRef<str>, rule: TagRule) {
        let key = SmolStr::new(name.as_ref().to_ascii_lowercase());
        self.rules.insert(key, rule);
    }

    pub fn remove(&mut self, name: &str) -> Option<TagRule> {
        self.rules.remove(name.to_ascii_lowercase().as_str())
    }

    pub fn lookup(&self, name: &str) -> Option<&TagRule> {
        if name.bytes().any(|b| b.is_ascii_uppercase()) {
            self.rules.get(name.to_ascii_lowercase().as_str())
        } else {
            self.rules.get(name)
        }
    }

    pub fn is_paragraph_boundary(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|rule| rule.paragraph_boundary)
    }
}

/// HTML void elements. Unknown ones become self-closed hidden objects.
pub fn is_void_element(name: &str) -> bool {
    const VOID: &[&str] = &[
        "area", "base", "br", "col", "embed", "hr", "img", "input", "keygen", "link", "meta",
        "param", "source", "track", "wbr",
    ];
    VOID.iter().any(|void| void.eq_ignore_ascii_case(name))
}
