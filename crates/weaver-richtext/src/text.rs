//! Text buffer abstraction for document storage.
//!
//! The `TextBuffer` trait is the storage seam of a [`Document`](crate::Document):
//! markers only ever see char offsets, so any backend that can do char-indexed
//! edits can hold the text.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

/// A text buffer that supports efficient editing and offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in chars (Unicode scalar values).
    fn len_chars(&self) -> usize;

    /// Check if empty.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Append text at end.
    ///
    /// Default implementation calls insert at len_chars(). Override if
    /// the underlying buffer has a more efficient append operation.
    fn push(&mut self, text: &str) {
        self.insert(self.len_chars(), text);
    }

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    /// Convert entire buffer to String.
    fn to_string(&self) -> String;

    /// Last character, if any.
    fn last_char(&self) -> Option<char> {
        self.len_chars()
            .checked_sub(1)
            .and_then(|last| self.char_at(last))
    }

    /// Number of consecutive `\n` at the end of the buffer, capped at `max`.
    fn trailing_newlines(&self, max: usize) -> usize {
        let len = self.len_chars();
        (0..max.min(len))
            .take_while(|back| self.char_at(len - 1 - back) == Some('\n'))
            .count()
    }
}

/// Ropey-backed text buffer.
///
/// Provides O(log n) editing operations and offset conversions.
#[derive(Clone, Default)]
pub struct TextRope {
    rope: ropey::Rope,
}

impl TextRope {
    /// Create a new empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from string.
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }
}

impl std::fmt::Debug for TextRope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TextRope").field(&self.rope.to_string()).finish()
    }
}

impl TextBuffer for TextRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        self.rope.insert(char_offset, text);
    }

    // Ropey's insert is O(log n) regardless of position, so push is the same.
    // Override for consistency with trait.
    fn push(&mut self, text: &str) {
        self.insert(self.rope.len_chars(), text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        self.rope.remove(char_range);
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }
}

impl From<&str> for TextRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for TextRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_operations() {
        let mut rope = TextRope::from_str("hello world");
        assert_eq!(rope.len_chars(), 11);
        assert_eq!(rope.to_string(), "hello world");

        rope.insert(5, " beautiful");
        assert_eq!(rope.to_string(), "hello beautiful world");

        // " beautiful" is 10 chars at positions 5..15
        rope.delete(5..15);
        assert_eq!(rope.to_string(), "hello world");
    }

    #[test]
    fn test_char_at() {
        let rope = TextRope::from_str("hello");
        assert_eq!(rope.char_at(0), Some('h'));
        assert_eq!(rope.char_at(4), Some('o'));
        assert_eq!(rope.char_at(5), None);
        assert_eq!(rope.last_char(), Some('o'));
    }

    #[test]
    fn test_slice() {
        let rope = TextRope::from_str("hello world");
        assert_eq!(rope.slice(0..5).as_deref(), Some("hello"));
        assert_eq!(rope.slice(6..11).as_deref(), Some("world"));
        assert_eq!(rope.slice(0..100), None);
    }

    #[test]
    fn test_trailing_newlines() {
        assert_eq!(TextRope::from_str("").trailing_newlines(2), 0);
        assert_eq!(TextRope::from_str("x").trailing_newlines(2), 0);
        assert_eq!(TextRope::from_str("x\n").trailing_newlines(2), 1);
        assert_eq!(TextRope::from_str("x\n\n\n").trailing_newlines(2), 2);
        assert_eq!(TextRope::from_str("\n").trailing_newlines(2), 1);
    }

    #[test]
    fn test_multibyte_lengths() {
        // "héllo" - é is 2 bytes, 1 char
        let mut rope = TextRope::from_str("héllo");
        assert_eq!(rope.len_chars(), 5);
        rope.insert(2, "ü");
        assert_eq!(rope.char_at(2), Some('ü'));
        assert_eq!(rope.slice(1..3).as_deref(), Some("éü"));
    }
}
