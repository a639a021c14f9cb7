//! Streaming markup reader and writer.
//!
//! Both sides track the stack of open elements so every error can name the
//! element path where it happened.

mod path;
mod reader;
mod writer;

pub use path::ElementPath;
pub use reader::XmlReader;
pub use writer::XmlWriter;

/// A decoded attribute of a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    /// Create an attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// True for `xmlns` and `xmlns:*` declarations.
    #[must_use]
    pub fn is_namespace_declaration(&self) -> bool {
        is_namespace_declaration(&self.name)
    }
}

/// True for `xmlns` and `xmlns:*` attribute names.
#[must_use]
pub fn is_namespace_declaration(name: &str) -> bool {
    name == "xmlns" || name.starts_with("xmlns:")
}
