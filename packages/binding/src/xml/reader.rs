//! Pull-style document cursor.
//!
//! `XmlReader` wraps an incremental `quick_xml::Reader` and exposes the element
//! level operations the dispatch engine needs: enter an element, inspect its
//! attributes, ask whether a child element follows, collect text, and leave the
//! element again. Comments, processing instructions, the XML declaration and
//! DOCTYPE are skipped. CDATA sections are merged into the text of their element.

use std::io::BufRead;

use quick_xml::events::Event;

use super::{Attribute, ElementPath};
use crate::error::{BindingError, Result};

/// A token the cursor works with, owned so it can be held as lookahead.
#[derive(Debug)]
enum Token {
    Start {
        name: String,
        attributes: Vec<Attribute>,
    },
    End {
        name: String,
    },
    Text(String),
    Eof,
}

/// An open element on the cursor stack.
#[derive(Debug)]
struct Frame {
    name: String,
    attributes: Vec<Attribute>,
    text: String,
    text_read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    BeforeDocument,
    InElement,
    Closed,
}

/// Streaming cursor over a markup document.
///
/// The cursor only moves forward. It keeps one token of lookahead so that
/// [`has_element`](Self::has_element) and [`next_element_name`](Self::next_element_name)
/// can answer without consuming the child.
///
/// # Examples
/// ```
/// use regelrecht_binding::xml::XmlReader;
///
/// let mut reader = XmlReader::from_str("<catalog><book/><book/></catalog>");
/// reader.begin_element().unwrap();
///
/// let mut books = 0;
/// while reader.has_element().unwrap() {
///     assert_eq!(reader.next_element_name().unwrap(), "book");
///     reader.begin_element().unwrap();
///     reader.end_element().unwrap();
///     books += 1;
/// }
/// reader.end_element().unwrap();
/// assert_eq!(books, 2);
/// ```
pub struct XmlReader<'s> {
    inner: quick_xml::Reader<Box<dyn BufRead + 's>>,
    buf: Vec<u8>,
    peeked: Option<Token>,
    frames: Vec<Frame>,
    state: CursorState,
    strict: bool,
}

impl<'s> XmlReader<'s> {
    /// Create a strict cursor over a buffered source.
    pub fn new<R: BufRead + 's>(source: R) -> Self {
        let boxed: Box<dyn BufRead + 's> = Box::new(source);
        let mut inner = quick_xml::Reader::from_reader(boxed);
        let config = inner.config_mut();
        // `<a/>` arrives as a start tag followed by an end tag.
        config.expand_empty_elements = true;
        config.check_end_names = true;

        Self {
            inner,
            buf: Vec::new(),
            peeked: None,
            frames: Vec::new(),
            state: CursorState::BeforeDocument,
            strict: true,
        }
    }

    /// Create a strict cursor over an in-memory document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(text: &'s str) -> Self {
        Self::new(text.as_bytes())
    }

    /// Set whether unconsumed content fails [`end_element`](Self::end_element).
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether unconsumed content is an error.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Consume the next start tag and make it the current element.
    ///
    /// At document start the prolog (declaration, comments, DOCTYPE) is skipped.
    pub fn begin_element(&mut self) -> Result<()> {
        match self.state {
            CursorState::Closed => return Err(self.closed_error()),
            CursorState::BeforeDocument => self.skip_prolog()?,
            CursorState::InElement => self.absorb_text()?,
        }

        match self.next_token()? {
            Token::Start {
                name, attributes, ..
            } => {
                self.frames.push(Frame {
                    name,
                    attributes,
                    text: String::new(),
                    text_read: false,
                });
                self.state = CursorState::InElement;
                Ok(())
            }
            Token::End { name } => Err(BindingError::malformed(
                format!("expected a start tag but found </{name}>"),
                self.path(),
            )),
            Token::Text(_) => Err(BindingError::malformed(
                "text content outside the root element",
                self.path(),
            )),
            Token::Eof => Err(BindingError::malformed(
                "expected a start tag but reached the end of the document",
                self.path(),
            )),
        }
    }

    /// Name of the current element.
    #[must_use]
    pub fn element_name(&self) -> Option<&str> {
        self.frames.last().map(|frame| frame.name.as_str())
    }

    /// Attributes of the current element in document order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        self.frames
            .last()
            .map(|frame| frame.attributes.as_slice())
            .unwrap_or_default()
    }

    /// Attribute names of the current element in document order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes().iter().map(|attr| attr.name.as_str())
    }

    /// Decoded value of an attribute on the current element.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attributes()
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Decoded value of an attribute that must be present.
    pub fn required_attribute(&self, name: &str) -> Result<&str> {
        self.attribute_value(name)
            .ok_or_else(|| BindingError::UnknownAttribute {
                name: name.to_string(),
                path: self.path(),
            })
    }

    /// Whether another child element follows before the current element ends.
    ///
    /// Does not consume the child. Character data in front of it is added to the
    /// current element's text.
    pub fn has_element(&mut self) -> Result<bool> {
        self.ensure_in_element()?;
        self.absorb_text()?;
        Ok(matches!(self.peeked, Some(Token::Start { .. })))
    }

    /// Name of the next child element without consuming it.
    ///
    /// Before the document starts this is the name of the root element.
    pub fn next_element_name(&mut self) -> Result<&str> {
        match self.state {
            CursorState::Closed => return Err(self.closed_error()),
            CursorState::BeforeDocument => self.skip_prolog()?,
            CursorState::InElement => self.absorb_text()?,
        }

        match &self.peeked {
            Some(Token::Start { name, .. }) => Ok(name),
            _ => Err(BindingError::malformed(
                "no child element follows",
                self.path(),
            )),
        }
    }

    /// Character data of the current element up to its end tag.
    ///
    /// Calling this again before [`end_element`](Self::end_element) returns the same text.
    pub fn text(&mut self) -> Result<&str> {
        self.ensure_in_element()?;
        self.absorb_text()?;

        if let Some(Token::Start { name, .. }) = &self.peeked {
            return Err(BindingError::malformed(
                format!("text requested while child element <{name}> is unread"),
                self.path(),
            ));
        }

        let Some(frame) = self.frames.last_mut() else {
            return Err(BindingError::malformed("no open element", ElementPath::new()));
        };
        frame.text_read = true;
        Ok(&frame.text)
    }

    /// Consume the next child element and its whole subtree.
    pub fn skip_element(&mut self) -> Result<()> {
        self.ensure_in_element()?;
        self.absorb_text()?;

        let skipped = match self.next_token()? {
            Token::Start { name, .. } => name,
            _ => {
                return Err(BindingError::malformed(
                    "no child element to skip",
                    self.path(),
                ))
            }
        };
        tracing::trace!(element = %skipped, path = %self.path(), "skipping element");

        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                Token::Start { .. } => depth += 1,
                Token::End { .. } => depth -= 1,
                Token::Text(_) => {}
                Token::Eof => {
                    return Err(BindingError::malformed(
                        format!("unexpected end of document inside <{skipped}>"),
                        self.path(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Consume the end tag of the current element.
    ///
    /// In strict mode a remaining child element or non-whitespace text that was
    /// never read fails with `UnbalancedStructure`. In lenient mode it is skipped.
    /// Closing the root element checks that nothing but whitespace and comments
    /// follows it.
    pub fn end_element(&mut self) -> Result<()> {
        self.ensure_in_element()?;

        while self.has_element()? {
            if self.strict {
                let name = self.next_element_name()?.to_string();
                return Err(BindingError::unbalanced(
                    format!("child element <{name}> was not consumed"),
                    self.path(),
                ));
            }
            self.skip_element()?;
        }

        if self.strict {
            if let Some(frame) = self.frames.last() {
                if !frame.text_read && !frame.text.trim().is_empty() {
                    return Err(BindingError::unbalanced(
                        "text content was not consumed",
                        self.path(),
                    ));
                }
            }
        }

        let expected = self
            .frames
            .last()
            .map(|frame| frame.name.clone())
            .unwrap_or_default();
        match self.next_token()? {
            Token::End { name } if name == expected => {}
            Token::End { name } => {
                return Err(BindingError::malformed(
                    format!("expected </{expected}> but found </{name}>"),
                    self.path(),
                ))
            }
            _ => {
                return Err(BindingError::malformed(
                    format!("expected </{expected}>"),
                    self.path(),
                ))
            }
        }
        self.frames.pop();

        if self.frames.is_empty() {
            self.finish_document()?;
        }
        Ok(())
    }

    /// Root-first path of open elements.
    #[must_use]
    pub fn path(&self) -> ElementPath {
        ElementPath::from_segments(self.frames.iter().map(|frame| frame.name.clone()))
    }

    /// Number of open elements.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// True once the root element has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    fn closed_error(&self) -> BindingError {
        BindingError::malformed("document is already closed", self.path())
    }

    fn ensure_in_element(&self) -> Result<()> {
        match self.state {
            CursorState::InElement => Ok(()),
            CursorState::BeforeDocument => Err(BindingError::malformed(
                "no element has been entered yet",
                self.path(),
            )),
            CursorState::Closed => Err(self.closed_error()),
        }
    }

    /// Skip whitespace before the root element.
    fn skip_prolog(&mut self) -> Result<()> {
        loop {
            self.fill_lookahead()?;
            match &self.peeked {
                Some(Token::Text(text)) if text.trim().is_empty() => {
                    self.peeked = None;
                }
                Some(Token::Text(_)) => {
                    return Err(BindingError::malformed(
                        "text content before the root element",
                        self.path(),
                    ))
                }
                _ => return Ok(()),
            }
        }
    }

    /// Move character data from the lookahead into the current frame.
    fn absorb_text(&mut self) -> Result<()> {
        loop {
            self.fill_lookahead()?;
            match self.peeked.take() {
                Some(Token::Text(text)) => {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.text.push_str(&text);
                    }
                }
                Some(Token::Eof) => {
                    return Err(BindingError::malformed(
                        "unexpected end of document",
                        self.path(),
                    ))
                }
                other => {
                    self.peeked = other;
                    return Ok(());
                }
            }
        }
    }

    /// Check that only whitespace and comments follow the root element.
    fn finish_document(&mut self) -> Result<()> {
        loop {
            match self.next_token()? {
                Token::Eof => {
                    self.state = CursorState::Closed;
                    return Ok(());
                }
                Token::Text(text) if text.trim().is_empty() => {}
                _ => {
                    return Err(BindingError::malformed(
                        "content after the root element",
                        self.path(),
                    ))
                }
            }
        }
    }

    fn fill_lookahead(&mut self) -> Result<()> {
        if self.peeked.is_none() {
            self.peeked = Some(self.read_token()?);
        }
        Ok(())
    }

    fn next_token(&mut self) -> Result<Token> {
        match self.peeked.take() {
            Some(token) => Ok(token),
            None => self.read_token(),
        }
    }

    /// Read the next relevant token from the tokenizer.
    fn read_token(&mut self) -> Result<Token> {
        loop {
            let converted = match self.inner.read_event_into(&mut self.buf) {
                Ok(event) => convert_event(event),
                Err(err) => Err(err.to_string()),
            };
            self.buf.clear();

            match converted {
                Ok(Some(Token::Eof)) if !self.frames.is_empty() => {
                    return Err(BindingError::malformed(
                        "unexpected end of document",
                        self.path(),
                    ))
                }
                Ok(Some(token)) => return Ok(token),
                Ok(None) => {}
                Err(message) => return Err(BindingError::malformed(message, self.path())),
            }
        }
    }
}

/// Convert a tokenizer event into a cursor token; `None` for skipped events.
fn convert_event(event: Event<'_>) -> std::result::Result<Option<Token>, String> {
    let token = match event {
        // Empty never occurs with expand_empty_elements.
        Event::Start(start) | Event::Empty(start) => Token::Start {
            name: decode_name(start.name().as_ref())?,
            attributes: decode_attributes(&start)?,
        },
        Event::End(end) => Token::End {
            name: decode_name(end.name().as_ref())?,
        },
        Event::Text(text) => Token::Text(text.unescape().map_err(|e| e.to_string())?.into_owned()),
        Event::CData(cdata) => Token::Text(
            String::from_utf8(cdata.into_inner().into_owned()).map_err(|e| e.to_string())?,
        ),
        Event::Eof => Token::Eof,
        Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => return Ok(None),
    };
    Ok(Some(token))
}

fn decode_name(raw: &[u8]) -> std::result::Result<String, String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| format!("invalid UTF-8 in element name: {e}"))
}

fn decode_attributes(
    start: &quick_xml::events::BytesStart<'_>,
) -> std::result::Result<Vec<Attribute>, String> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let name = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| format!("invalid UTF-8 in attribute name: {e}"))?
            .to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attributes.push(Attribute { name, value });
    }
    Ok(attributes)
}
