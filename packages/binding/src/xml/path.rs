//! Element path used for error context.

use std::fmt;

/// Root-first stack of open element names, e.g. `/rss/channel/item`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementPath(Vec<String>);

impl ElementPath {
    /// Create an empty path (document level).
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build a path from element names, root first.
    #[must_use]
    pub fn from_segments(segments: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Append an element name.
    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    /// Remove the innermost element name.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Name of the innermost element, if any.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Element names, root first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of open elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True at document level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
