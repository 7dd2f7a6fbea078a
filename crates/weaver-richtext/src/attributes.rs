//! Ordered attribute sets attached to markers.
//!
//! Attribute order is part of what makes the HTML round trip exact, so the set
//! is a small vector rather than a map. Names keep the case they were given.

use markdown_weaver_escape::{FmtWriter, StrWrite, escape_html};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A single `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    pub name: SmolStr,
    pub value: SmolStr,
}

/// Insertion-ordered attribute set with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes {
    entries: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a value by exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Overwrite in place if `name` exists, otherwise append.
    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.entries.push(Attribute { name, value }),
        }
    }

    /// Remove an attribute, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<SmolStr> {
        let idx = self.entries.iter().position(|attr| attr.name == name)?;
        Some(self.entries.remove(idx).value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|attr| (attr.name.as_str(), attr.value.as_str()))
    }

    /// Render as ` name="value"` pairs in insertion order, values escaped.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        // fmt::Write into a String never errors.
        let _ = self.write_to(&mut FmtWriter(&mut out));
        out
    }

    /// Stream the serialized form into any escape-aware writer.
    pub fn write_to<W: StrWrite>(&self, writer: &mut W) -> Result<(), W::Error> {
        for attr in &self.entries {
            writer.write_str(" ")?;
            writer.write_str(&attr.name)?;
            writer.write_str("=\"")?;
            escape_html(&mut *writer, &attr.value)?;
            writer.write_str("\"")?;
        }
        Ok(())
    }
}

impl<N, V> FromIterator<(N, V)> for Attributes
where
    N: Into<SmolStr>,
    V: Into<SmolStr>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut attrs = Attributes::new();
        for (name, value) in iter {
            attrs.set(name, value);
        }
        attrs
    }
}
