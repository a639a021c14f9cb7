//! Streaming markup writer, the mirror of [`XmlReader`](super::XmlReader).

use std::io::Write;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::ElementPath;
use crate::config::{XML_DECLARATION_ENCODING, XML_DECLARATION_VERSION};
use crate::error::{BindingError, Result};

/// Event writer that keeps track of open elements.
///
/// A start tag stays pending until content, a child or the end tag follows, so
/// attributes can be added after [`begin_element`](Self::begin_element) and
/// elements without content are written self-closed.
///
/// # Examples
/// ```
/// use regelrecht_binding::xml::XmlWriter;
///
/// let mut out = Vec::new();
/// let mut writer = XmlWriter::new(&mut out);
/// writer.begin_element("book").unwrap();
/// writer.attribute("id", "1").unwrap();
/// writer.text("Dune & Co").unwrap();
/// writer.end_element().unwrap();
/// writer.finish().unwrap();
///
/// assert_eq!(String::from_utf8(out).unwrap(), r#"<book id="1">Dune &amp; Co</book>"#);
/// ```
pub struct XmlWriter<'s> {
    inner: quick_xml::Writer<Box<dyn Write + 's>>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
    root_written: bool,
}

impl<'s> XmlWriter<'s> {
    /// Create a writer over a sink.
    pub fn new<W: Write + 's>(sink: W) -> Self {
        let boxed: Box<dyn Write + 's> = Box::new(sink);
        Self {
            inner: quick_xml::Writer::new(boxed),
            pending: None,
            open: Vec::new(),
            root_written: false,
        }
    }

    /// Write the XML declaration. Only allowed before the root element.
    pub fn declaration(&mut self) -> Result<()> {
        if self.root_written {
            return Err(BindingError::malformed(
                "declaration after the root element",
                self.path(),
            ));
        }
        self.emit(Event::Decl(BytesDecl::new(
            XML_DECLARATION_VERSION,
            Some(XML_DECLARATION_ENCODING),
            None,
        )))
    }

    /// Open an element. Its start tag is written lazily.
    pub fn begin_element(&mut self, name: &str) -> Result<()> {
        if self.open.is_empty() && self.root_written {
            return Err(BindingError::malformed(
                format!("second root element <{name}>"),
                self.path(),
            ));
        }
        self.flush_pending()?;
        self.pending = Some(BytesStart::new(name.to_string()));
        self.open.push(name.to_string());
        self.root_written = true;
        Ok(())
    }

    /// Add `xmlns:prefix="uri"` to the pending start tag.
    pub fn namespace(&mut self, prefix: &str, uri: &str) -> Result<()> {
        self.attribute(&format!("xmlns:{prefix}"), uri)
    }

    /// Add an attribute to the pending start tag. The value is escaped.
    pub fn attribute(&mut self, name: &str, value: &str) -> Result<()> {
        match self.pending.as_mut() {
            Some(start) => {
                start.push_attribute((name, value));
                Ok(())
            }
            None => Err(BindingError::malformed(
                format!("attribute '{name}' written after the start tag was closed"),
                self.path(),
            )),
        }
    }

    /// Write escaped character data.
    pub fn text(&mut self, text: &str) -> Result<()> {
        self.ensure_open("text")?;
        self.flush_pending()?;
        self.emit(Event::Text(BytesText::new(text)))
    }

    /// Write a CDATA section.
    ///
    /// Text containing `]]>` cannot be expressed as one section and is escaped instead.
    pub fn cdata(&mut self, text: &str) -> Result<()> {
        if text.contains("]]>") {
            return self.text(text);
        }
        self.ensure_open("CDATA")?;
        self.flush_pending()?;
        self.emit(Event::CData(BytesCData::new(text)))
    }

    /// Close the current element.
    pub fn end_element(&mut self) -> Result<()> {
        let Some(name) = self.open.pop() else {
            return Err(BindingError::unbalanced(
                "end_element without an open element",
                ElementPath::new(),
            ));
        };
        match self.pending.take() {
            Some(start) => self.emit(Event::Empty(start)),
            None => self.emit(Event::End(BytesEnd::new(name))),
        }
    }

    /// Root-first path of open elements.
    #[must_use]
    pub fn path(&self) -> ElementPath {
        ElementPath::from_segments(self.open.iter().cloned())
    }

    /// Number of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Check that every element was closed and flush the sink.
    pub fn finish(mut self) -> Result<()> {
        if !self.open.is_empty() {
            return Err(BindingError::unbalanced(
                format!("{} element(s) still open", self.open.len()),
                self.path(),
            ));
        }
        self.inner.get_mut().flush()?;
        Ok(())
    }

    fn ensure_open(&self, what: &str) -> Result<()> {
        if self.open.is_empty() {
            return Err(BindingError::malformed(
                format!("{what} outside the root element"),
                ElementPath::new(),
            ));
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(start) => self.emit(Event::Start(start)),
            None => Ok(()),
        }
    }

    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.inner
            .write_event(event)
            .map_err(std::io::Error::other)?;
        Ok(())
    }
}
