//! Binding engine: reads documents into typed values and writes them back.
//!
//! # Example
//!
//! ```
//! use regelrecht_binding::binding::BindingTable;
//! use regelrecht_binding::engine::XmlBinder;
//! use regelrecht_binding::field;
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Catalog {
//!     books: Vec<Book>,
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Book {
//!     id: u32,
//! }
//!
//! let binder = XmlBinder::builder()
//!     .xml_declaration(false)
//!     .bind(BindingTable::<Catalog>::new("catalog").element_list("book", field!(Catalog, books)))
//!     .bind(BindingTable::<Book>::new("book").attribute("id", field!(Book, id)))
//!     .build()
//!     .unwrap();
//!
//! let catalog: Catalog = binder.read_str(r#"<catalog><book id="1"/><book id="2"/></catalog>"#).unwrap();
//! assert_eq!(catalog.books.len(), 2);
//! assert_eq!(
//!     binder.write_string(&catalog).unwrap(),
//!     r#"<catalog><book id="1"/><book id="2"/></catalog>"#
//! );
//! ```

mod read;
mod write;

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub(crate) use read::ReadContext;
pub(crate) use write::WriteContext;

use crate::binding::{BindingRegistry, BindingTable};
use crate::config::BindingConfig;
use crate::converter::{ConverterRegistry, TypeConverter};
use crate::error::{BindingError, Result};
use crate::xml::{XmlReader, XmlWriter};

/// Configured binding engine.
///
/// Immutable after [`XmlBinderBuilder::build`]; operations only borrow it, so
/// one binder can serve concurrent reads and writes on separate sources and sinks.
pub struct XmlBinder {
    config: BindingConfig,
    converters: ConverterRegistry,
    bindings: BindingRegistry,
}

impl XmlBinder {
    /// Start building a binder with the built-in converters.
    #[must_use]
    pub fn builder() -> XmlBinderBuilder {
        XmlBinderBuilder::new()
    }

    /// Engine settings.
    #[must_use]
    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    /// Registered converters.
    #[must_use]
    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Registered binding tables.
    #[must_use]
    pub fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    /// Read a document whose root element is bound to `T`.
    ///
    /// The source is consumed and dropped on every exit path.
    pub fn read<T: Default + 'static, R: BufRead>(&self, source: R) -> Result<T> {
        let root = self.bindings.get::<T>()?.element_name().to_string();
        tracing::debug!(root = %root, type_name = std::any::type_name::<T>(), "reading document");

        let mut reader = XmlReader::new(source).with_strict(self.config.strict);
        let value = self.read_context().read_root::<T>(&mut reader)?;

        tracing::debug!(root = %root, "document read");
        Ok(value)
    }

    /// Read a document from a string.
    pub fn read_str<T: Default + 'static>(&self, text: &str) -> Result<T> {
        self.read(text.as_bytes())
    }

    /// Read a document from a file.
    pub fn read_file<T: Default + 'static>(&self, path: &Path) -> Result<T> {
        let file = File::open(path)?;
        self.read(BufReader::new(file))
    }

    /// Write `value` as a document. The sink is flushed on success.
    pub fn write<T: 'static, W: Write>(&self, sink: W, value: &T) -> Result<()> {
        let root = self.bindings.get::<T>()?.element_name().to_string();
        tracing::debug!(root = %root, type_name = std::any::type_name::<T>(), "writing document");

        let mut writer = XmlWriter::new(sink);
        self.write_context().write_root(value, &mut writer)?;
        writer.finish()?;

        tracing::debug!(root = %root, "document written");
        Ok(())
    }

    /// Write `value` as a document string.
    pub fn write_string<T: 'static>(&self, value: &T) -> Result<String> {
        let mut out = Vec::new();
        self.write(&mut out, value)?;
        String::from_utf8(out).map_err(|err| {
            BindingError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })
    }

    /// Write `value` to a file, creating or truncating it.
    pub fn write_file<T: 'static>(&self, path: &Path, value: &T) -> Result<()> {
        let file = File::create(path)?;
        self.write(std::io::BufWriter::new(file), value)
    }

    fn read_context(&self) -> ReadContext<'_> {
        ReadContext::new(&self.bindings, &self.converters, &self.config)
    }

    fn write_context(&self) -> WriteContext<'_> {
        WriteContext::new(&self.bindings, &self.converters, &self.config)
    }
}

/// Builder for [`XmlBinder`].
///
/// Registration errors are kept and reported by [`build`](Self::build).
pub struct XmlBinderBuilder {
    config: BindingConfig,
    converters: ConverterRegistry,
    bindings: BindingRegistry,
    error: Option<BindingError>,
}

impl XmlBinderBuilder {
    /// Create a builder with default settings and the built-in converters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: BindingConfig::default(),
            converters: ConverterRegistry::with_defaults(),
            bindings: BindingRegistry::new(),
            error: None,
        }
    }

    /// Replace all settings.
    #[must_use]
    pub fn config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    /// Fail (`true`) or skip (`false`) on unmapped content.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Write the XML declaration.
    #[must_use]
    pub fn xml_declaration(mut self, enabled: bool) -> Self {
        self.config.xml_declaration = enabled;
        self
    }

    /// Declare a namespace on the root element of written documents.
    #[must_use]
    pub fn root_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.config = self.config.with_root_namespace(prefix, uri);
        self
    }

    /// Maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Register a converter for `T`, replacing the built-in one.
    #[must_use]
    pub fn add_type_converter<T: 'static>(
        mut self,
        converter: impl TypeConverter<T> + 'static,
    ) -> Self {
        self.converters.register::<T>(converter);
        self
    }

    /// Register the binding table for `T`.
    #[must_use]
    pub fn bind<T: 'static>(mut self, table: BindingTable<T>) -> Self {
        if let Err(err) = self.bindings.register(table) {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
        self
    }

    /// Use a prepared binding registry, replacing tables bound so far.
    #[must_use]
    pub fn bindings(mut self, bindings: BindingRegistry) -> Self {
        self.bindings = bindings;
        self
    }

    /// Validate settings and create the binder.
    ///
    /// Fails with `BindingNotFound` when a nested element type has no table.
    pub fn build(self) -> Result<XmlBinder> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.config.validate()?;
        self.bindings.check_complete()?;
        Ok(XmlBinder {
            config: self.config,
            converters: self.converters,
            bindings: self.bindings,
        })
    }
}

impl Default for XmlBinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Polymorphic;
    use crate::converter::{EnumConverter, StrictBooleanConverter};
    use crate::field;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Catalog {
        name: Option<String>,
        books: Vec<Book>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Book {
        id: u32,
        available: bool,
        title: String,
        tags: Vec<String>,
        note: Option<Note>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Note {
        lang: Option<String>,
        body: String,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Section {
        title: Option<String>,
        sections: Vec<Section>,
    }

    fn builder() -> XmlBinderBuilder {
        XmlBinder::builder()
            .xml_declaration(false)
            .bind(
                BindingTable::<Catalog>::new("catalog")
                    .optional_attribute("name", field!(Catalog, name))
                    .element_list("book", field!(Catalog, books)),
            )
            .bind(
                BindingTable::<Book>::new("book")
                    .attribute("id", field!(Book, id))
                    .attribute("available", field!(Book, available))
                    .property("title", field!(Book, title))
                    .property_list("tag", field!(Book, tags))
                    .element("note", field!(Book, note)),
            )
            .bind(
                BindingTable::<Note>::new("note")
                    .optional_attribute("lang", field!(Note, lang))
                    .text(field!(Note, body)),
            )
    }

    fn binder() -> XmlBinder {
        builder().build().unwrap()
    }

    #[test]
    fn test_nested_dispatch() {
        let catalog: Catalog = binder()
            .read_str("<catalog><book/><book/></catalog>")
            .unwrap();
        assert_eq!(catalog.books.len(), 2);
        assert_eq!(catalog.books[0], Book::default());
        assert_eq!(catalog.name, None);
    }

    #[test]
    fn test_read_full_document() {
        let xml = r#"
            <catalog name="Shelf">
                <book id="7" available="yes">
                    <title>Dune &amp; more</title>
                    <tag>sf</tag>
                    <tag>classic</tag>
                    <note lang="en">Worn cover</note>
                </book>
            </catalog>"#;
        let catalog: Catalog = binder().read_str(xml).unwrap();

        assert_eq!(
            catalog,
            Catalog {
                name: Some("Shelf".to_string()),
                books: vec![Book {
                    id: 7,
                    available: true,
                    title: "Dune & more".to_string(),
                    tags: vec!["sf".to_string(), "classic".to_string()],
                    note: Some(Note {
                        lang: Some("en".to_string()),
                        body: "Worn cover".to_string(),
                    }),
                }],
            }
        );
    }

    #[test]
    fn test_round_trip() {
        let catalog = Catalog {
            name: Some("A <b> & \"c\"".to_string()),
            books: vec![
                Book {
                    id: 1,
                    available: false,
                    title: "First".to_string(),
                    tags: vec!["x".to_string(), "y".to_string()],
                    note: None,
                },
                Book {
                    id: 2,
                    available: true,
                    title: String::new(),
                    tags: Vec::new(),
                    note: Some(Note {
                        lang: None,
                        body: "line".to_string(),
                    }),
                },
            ],
        };

        let binder = binder();
        let written = binder.write_string(&catalog).unwrap();
        let read_back: Catalog = binder.read_str(&written).unwrap();
        assert_eq!(read_back, catalog);
        assert_eq!(binder.write_string(&read_back).unwrap(), written);
    }

    #[test]
    fn test_write_order_and_omission() {
        let catalog = Catalog {
            name: None,
            books: vec![Book {
                id: 3,
                available: true,
                title: "T".to_string(),
                tags: vec!["b".to_string(), "a".to_string()],
                note: None,
            }],
        };
        assert_eq!(
            binder().write_string(&catalog).unwrap(),
            r#"<catalog><book id="3" available="true"><title>T</title><tag>b</tag><tag>a</tag></book></catalog>"#
        );
    }

    #[test]
    fn test_strict_rejects_unmapped_attribute() {
        let result = binder().read_str::<Catalog>(r#"<catalog foo="bar"/>"#);
        match result {
            Err(BindingError::UnreadAttribute { name, path }) => {
                assert_eq!(name, "foo");
                assert_eq!(path.to_string(), "/catalog");
            }
            other => panic!("expected UnreadAttribute, got {other:?}"),
        }
    }

    #[test]
    fn test_lenient_ignores_unmapped_attribute() {
        let binder = builder().strict(false).build().unwrap();
        let catalog: Catalog = binder.read_str(r#"<catalog foo="bar"/>"#).unwrap();
        assert_eq!(catalog, Catalog::default());
    }

    #[test]
    fn test_strict_rejects_unmapped_element() {
        let result = binder().read_str::<Catalog>("<catalog><magazine/></catalog>");
        assert!(matches!(
            result,
            Err(BindingError::UnreadElement { ref name, .. }) if name == "magazine"
        ));
    }

    #[test]
    fn test_lenient_skips_unmapped_subtree() {
        let binder = builder().strict(false).build().unwrap();
        let catalog: Catalog = binder
            .read_str(r#"<catalog><magazine><book id="9"/></magazine><book id="1"/></catalog>"#)
            .unwrap();
        assert_eq!(catalog.books.len(), 1);
        assert_eq!(catalog.books[0].id, 1);
    }

    #[test]
    fn test_namespace_declarations_are_not_unmapped() {
        let catalog: Catalog = binder()
            .read_str(r#"<catalog xmlns="urn:c" xmlns:x="urn:x"><book/></catalog>"#)
            .unwrap();
        assert_eq!(catalog.books.len(), 1);
    }

    #[test]
    fn test_unexpected_root() {
        let result = binder().read_str::<Catalog>("<library/>");
        assert!(matches!(
            result,
            Err(BindingError::UnexpectedElement { ref expected, ref actual, .. })
                if expected == "catalog" && actual == "library"
        ));
    }

    #[test]
    fn test_unbalanced_document() {
        let result = binder().read_str::<Catalog>("<catalog><book></book>");
        assert!(matches!(
            result,
            Err(BindingError::MalformedDocument { .. })
        ));
    }

    #[test]
    fn test_conversion_error_has_path() {
        let result = binder().read_str::<Catalog>(r#"<catalog><book id="seven"/></catalog>"#);
        match result {
            Err(BindingError::Conversion { source, path }) => {
                assert_eq!(source.text, "seven");
                assert_eq!(path.to_string(), "/catalog/book");
            }
            other => panic!("expected Conversion, got {other:?}"),
        }
    }

    #[test]
    fn test_lenient_boolean_boundary() {
        let binder = binder();
        for (text, expected) in [("yes", true), ("false", false), ("banana", false)] {
            let xml = format!(r#"<catalog><book available="{text}"/></catalog>"#);
            let catalog: Catalog = binder.read_str(&xml).unwrap();
            assert_eq!(catalog.books[0].available, expected, "input {text}");
        }
    }

    #[test]
    fn test_converter_override() {
        let binder = builder()
            .add_type_converter::<bool>(StrictBooleanConverter)
            .build()
            .unwrap();
        let result = binder.read_str::<Catalog>(r#"<catalog><book available="banana"/></catalog>"#);
        assert!(matches!(result, Err(BindingError::Conversion { .. })));
    }

    #[test]
    fn test_property_attribute_is_unmapped() {
        let result =
            binder().read_str::<Catalog>(r#"<catalog><book><title lang="en">T</title></book></catalog>"#);
        assert!(matches!(
            result,
            Err(BindingError::UnreadAttribute { ref name, .. }) if name == "lang"
        ));
    }

    #[test]
    fn test_unread_text_is_unbalanced() {
        let result = binder().read_str::<Catalog>("<catalog>stray</catalog>");
        assert!(matches!(
            result,
            Err(BindingError::UnbalancedStructure { .. })
        ));
    }

    #[test]
    fn test_required_attribute() {
        let binder = XmlBinder::builder()
            .bind(BindingTable::<Book>::new("book").required_attribute("id", field!(Book, id)))
            .build()
            .unwrap();
        assert_eq!(binder.read_str::<Book>(r#"<book id="4"/>"#).unwrap().id, 4);
        let result = binder.read_str::<Book>("<book/>");
        assert!(matches!(
            result,
            Err(BindingError::UnknownAttribute { ref name, .. }) if name == "id"
        ));
    }

    #[test]
    fn test_root_namespaces_once() {
        let binder = XmlBinder::builder()
            .xml_declaration(false)
            .root_namespace("media", "http://example/mrss")
            .bind(
                BindingTable::<Section>::new("section")
                    .namespace("media", "http://other")
                    .namespace("dc", "http://purl.org/dc/elements/1.1/")
                    .optional_property("title", field!(Section, title))
                    .element_list("section", field!(Section, sections)),
            )
            .build()
            .unwrap();
        let value = Section {
            title: None,
            sections: vec![Section::default()],
        };
        assert_eq!(
            binder.write_string(&value).unwrap(),
            r#"<section xmlns:media="http://example/mrss" xmlns:dc="http://purl.org/dc/elements/1.1/"><section/></section>"#
        );
    }

    #[test]
    fn test_self_nesting_and_depth_limit() {
        let binder = XmlBinder::builder()
            .max_depth(3)
            .bind(
                BindingTable::<Section>::new("section")
                    .optional_property("title", field!(Section, title))
                    .element_list("section", field!(Section, sections)),
            )
            .build()
            .unwrap();

        let section: Section = binder
            .read_str("<section><section><title>deep</title></section></section>")
            .unwrap();
        assert_eq!(section.sections[0].title.as_deref(), Some("deep"));

        let result =
            binder.read_str::<Section>("<section><section><section><section/></section></section></section>");
        assert!(matches!(
            result,
            Err(BindingError::DepthLimitExceeded { limit: 3, .. })
        ));
    }

    #[test]
    fn test_xml_declaration_written() {
        let binder = builder().xml_declaration(true).build().unwrap();
        let written = binder.write_string(&Catalog::default()).unwrap();
        assert_eq!(written, r#"<?xml version="1.0" encoding="UTF-8"?><catalog/>"#);
    }

    #[test]
    fn test_cdata_text() {
        let binder = XmlBinder::builder()
            .xml_declaration(false)
            .bind(BindingTable::<Note>::new("note").text(field!(Note, body)).cdata())
            .build()
            .unwrap();
        let note = Note {
            lang: None,
            body: "<p>hi</p>".to_string(),
        };
        let written = binder.write_string(&note).unwrap();
        assert_eq!(written, "<note><![CDATA[<p>hi</p>]]></note>");
        assert_eq!(binder.read_str::<Note>(&written).unwrap(), note);
    }

    #[test]
    fn test_missing_binding() {
        let result = binder().read_str::<Section>("<section/>");
        assert!(matches!(result, Err(BindingError::BindingNotFound { .. })));
    }

    #[test]
    fn test_invalid_table_fails_build() {
        let result = XmlBinder::builder()
            .bind(
                BindingTable::<Note>::new("note")
                    .optional_attribute("lang", field!(Note, lang))
                    .optional_attribute("lang", field!(Note, lang)),
            )
            .build();
        assert!(matches!(result, Err(BindingError::InvalidBinding { .. })));
    }

    #[test]
    fn test_binder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<XmlBinder>();

        let binder = std::sync::Arc::new(binder());
        let handles: Vec<_> = (0..4)
            .map(|id| {
                let binder = std::sync::Arc::clone(&binder);
                std::thread::spawn(move || {
                    let xml = format!(r#"<catalog><book id="{id}"/></catalog>"#);
                    binder.read_str::<Catalog>(&xml).unwrap().books[0].id
                })
            })
            .collect();
        let mut ids: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Record {
        title: Option<String>,
        count: Option<u32>,
        tags: Vec<String>,
        notes: Vec<Note>,
        remark: Option<Note>,
    }

    fn record_binder() -> XmlBinder {
        XmlBinder::builder()
            .xml_declaration(false)
            .bind(
                BindingTable::<Record>::new("record")
                    .optional_property("title", field!(Record, title))
                    .optional_property("count", field!(Record, count))
                    .property_list("tag", field!(Record, tags))
                    .element_list("note", field!(Record, notes))
                    .element("remark", field!(Record, remark)),
            )
            .bind(
                BindingTable::<Note>::new("note")
                    .optional_attribute("lang", field!(Note, lang))
                    .text(field!(Note, body)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_round_trip_empty_and_absent_values() {
        let binder = record_binder();
        let record = Record {
            title: Some(String::new()),
            count: None,
            tags: vec![String::new(), "x".to_string()],
            notes: Vec::new(),
            remark: Some(Note::default()),
        };

        let written = binder.write_string(&record).unwrap();
        assert_eq!(written, "<record><title/><tag/><tag>x</tag><remark/></record>");
        assert_eq!(binder.read_str::<Record>(&written).unwrap(), record);

        let empty = Record::default();
        let written = binder.write_string(&empty).unwrap();
        assert_eq!(written, "<record/>");
        assert_eq!(binder.read_str::<Record>(&written).unwrap(), empty);
    }

    #[test]
    fn test_blank_optional_number_is_absent() {
        let binder = record_binder();
        let record: Record = binder
            .read_str("<record>\n  <count>\n    </count>\n  <title>  </title>\n</record>")
            .unwrap();
        assert_eq!(record.count, None);
        assert_eq!(record.title.as_deref(), Some("  "));

        let result = binder.read_str::<Record>("<record><count>many</count></record>");
        assert!(matches!(
            result,
            Err(BindingError::Conversion { ref path, .. }) if path.to_string() == "/record/count"
        ));
    }

    #[test]
    fn test_blank_required_number_fails() {
        let result = binder().read_str::<Catalog>(r#"<catalog><book id=" "/></catalog>"#);
        assert!(matches!(result, Err(BindingError::Conversion { .. })));
    }

    #[test]
    fn test_text_content_keeps_whitespace() {
        let binder = record_binder();
        let record: Record = binder
            .read_str("<record>\n  <note lang=\"en\">\n    Worn cover\n  </note>\n  <note>  </note>\n</record>")
            .unwrap();
        assert_eq!(record.notes[0].body, "\n    Worn cover\n  ");
        assert_eq!(record.notes[0].lang.as_deref(), Some("en"));
        assert_eq!(record.notes[1].body, "  ");
    }

    #[derive(Debug, Default, PartialEq)]
    struct Para {
        text: String,
        emphasis: Vec<String>,
    }

    #[test]
    fn test_text_content_around_children() {
        let binder = XmlBinder::builder()
            .bind(
                BindingTable::<Para>::new("p")
                    .property_list("em", field!(Para, emphasis))
                    .text(field!(Para, text)),
            )
            .build()
            .unwrap();
        let para: Para = binder
            .read_str("<p>Read <em>this</em> and <em>that</em>.</p>")
            .unwrap();
        assert_eq!(para.text, "Read  and .");
        assert_eq!(para.emphasis, vec!["this", "that"]);
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Circle {
        radius: u32,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Square {
        side: u32,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Shape {
        Circle(Circle),
        Square(Square),
    }

    #[derive(Debug, Default, PartialEq)]
    struct Drawing {
        background: Option<Shape>,
        shapes: Vec<Shape>,
    }

    fn shapes(circle: &str, square: &str) -> Polymorphic<Shape> {
        Polymorphic::new()
            .variant(circle, Shape::Circle, |shape| match shape {
                Shape::Circle(circle) => Some(circle),
                Shape::Square(_) => None,
            })
            .variant(square, Shape::Square, |shape| match shape {
                Shape::Square(square) => Some(square),
                Shape::Circle(_) => None,
            })
    }

    fn drawing_binder() -> XmlBinder {
        XmlBinder::builder()
            .xml_declaration(false)
            .bind(
                BindingTable::<Drawing>::new("drawing")
                    .polymorphic_element(field!(Drawing, background), shapes("fill-circle", "fill-square"))
                    .polymorphic_list(field!(Drawing, shapes), shapes("circle", "square")),
            )
            .bind(BindingTable::<Circle>::new("circle").attribute("r", field!(Circle, radius)))
            .bind(BindingTable::<Square>::new("square").attribute("side", field!(Square, side)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_polymorphic_read_keeps_order() {
        let xml = r#"<drawing><square side="2"/><fill-circle r="9"/><circle r="1"/><square side="3"/></drawing>"#;
        let drawing: Drawing = drawing_binder().read_str(xml).unwrap();
        assert_eq!(
            drawing,
            Drawing {
                background: Some(Shape::Circle(Circle { radius: 9 })),
                shapes: vec![
                    Shape::Square(Square { side: 2 }),
                    Shape::Circle(Circle { radius: 1 }),
                    Shape::Square(Square { side: 3 }),
                ],
            }
        );
    }

    #[test]
    fn test_polymorphic_round_trip() {
        let binder = drawing_binder();
        let drawing = Drawing {
            background: Some(Shape::Square(Square { side: 5 })),
            shapes: vec![
                Shape::Circle(Circle { radius: 4 }),
                Shape::Square(Square { side: 6 }),
            ],
        };
        let written = binder.write_string(&drawing).unwrap();
        assert_eq!(
            written,
            r#"<drawing><fill-square side="5"/><circle r="4"/><square side="6"/></drawing>"#
        );
        assert_eq!(binder.read_str::<Drawing>(&written).unwrap(), drawing);
    }

    #[test]
    fn test_polymorphic_unknown_variant_on_write() {
        let binder = XmlBinder::builder()
            .bind(BindingTable::<Drawing>::new("drawing").polymorphic_list(
                field!(Drawing, shapes),
                Polymorphic::new().variant("circle", Shape::Circle, |shape| match shape {
                    Shape::Circle(circle) => Some(circle),
                    Shape::Square(_) => None,
                }),
            ))
            .bind(BindingTable::<Circle>::new("circle").attribute("r", field!(Circle, radius)))
            .build()
            .unwrap();
        let drawing = Drawing {
            background: None,
            shapes: vec![Shape::Square(Square { side: 1 })],
        };
        assert!(matches!(
            binder.write_string(&drawing),
            Err(BindingError::InvalidBinding { .. })
        ));
    }

    #[test]
    fn test_build_requires_nested_tables() {
        let result = XmlBinder::builder()
            .bind(
                BindingTable::<Drawing>::new("drawing")
                    .polymorphic_list(field!(Drawing, shapes), shapes("circle", "square")),
            )
            .bind(BindingTable::<Circle>::new("circle").attribute("r", field!(Circle, radius)))
            .build();
        match result {
            Err(BindingError::BindingNotFound { type_name }) => {
                assert!(type_name.ends_with("Square"), "{type_name}");
            }
            Ok(_) => panic!("build succeeded without a table for Square"),
            Err(other) => panic!("expected BindingNotFound, got {other:?}"),
        }

        let result = XmlBinder::builder()
            .bind(BindingTable::<Book>::new("book").element("note", field!(Book, note)))
            .build();
        assert!(matches!(result, Err(BindingError::BindingNotFound { .. })));
    }

    #[derive(Debug, Default, PartialEq)]
    struct Law {
        id: String,
        title: String,
        valid_from: Option<String>,
        articles: Vec<Note>,
    }

    fn law_binder() -> XmlBinder {
        XmlBinder::builder()
            .xml_declaration(false)
            .bind(
                BindingTable::<Law>::new("law")
                    .attribute("id", field!(Law, id))
                    .path("meta", |meta| meta.property("title", field!(Law, title)))
                    .path("meta/dates", |dates| {
                        dates.optional_property("validFrom", field!(Law, valid_from))
                    })
                    .path("body", |body| body.element_list("article", field!(Law, articles))),
            )
            .bind(
                BindingTable::<Note>::new("note")
                    .optional_attribute("lang", field!(Note, lang))
                    .text(field!(Note, body)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_path_bindings_read() {
        let xml = r#"
            <law id="BWBR0018451">
                <meta>
                    <title>Wet op de zorgtoeslag</title>
                    <dates><validFrom>2025-01-01</validFrom></dates>
                </meta>
                <body><article>Eerste</article><article lang="nl">Tweede</article></body>
            </law>"#;
        let law: Law = law_binder().read_str(xml).unwrap();
        assert_eq!(law.id, "BWBR0018451");
        assert_eq!(law.title, "Wet op de zorgtoeslag");
        assert_eq!(law.valid_from.as_deref(), Some("2025-01-01"));
        assert_eq!(law.articles.len(), 2);
        assert_eq!(law.articles[1].lang.as_deref(), Some("nl"));
    }

    #[test]
    fn test_path_bindings_write() {
        let binder = law_binder();
        let law = Law {
            id: "1".to_string(),
            title: "T".to_string(),
            valid_from: None,
            articles: Vec::new(),
        };
        let written = binder.write_string(&law).unwrap();
        assert_eq!(
            written,
            r#"<law id="1"><meta><title>T</title><dates/></meta><body/></law>"#
        );
        assert_eq!(binder.read_str::<Law>(&written).unwrap(), law);
    }

    #[test]
    fn test_path_unmapped_content_is_strict() {
        let result = law_binder().read_str::<Law>(r#"<law><meta><author>x</author></meta></law>"#);
        match result {
            Err(BindingError::UnreadElement { name, path }) => {
                assert_eq!(name, "author");
                assert_eq!(path.to_string(), "/law/meta");
            }
            other => panic!("expected UnreadElement, got {other:?}"),
        }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    enum Level {
        #[default]
        Low,
        High,
    }

    #[derive(Debug, Default, PartialEq)]
    struct Alarm {
        armed: bool,
        level: Level,
        silent: bool,
        message: Option<String>,
    }

    fn level_name(level: &Level) -> &'static str {
        match level {
            Level::Low => "low",
            Level::High => "high",
        }
    }

    #[test]
    fn test_field_converters() {
        let binder = XmlBinder::builder()
            .xml_declaration(false)
            .bind(
                BindingTable::<Alarm>::new("alarm")
                    .attribute_with("armed", field!(Alarm, armed), StrictBooleanConverter)
                    .attribute("silent", field!(Alarm, silent))
                    .property_with(
                        "level",
                        field!(Alarm, level),
                        EnumConverter::new([Level::Low, Level::High], level_name),
                    ),
            )
            .build()
            .unwrap();

        let alarm: Alarm = binder
            .read_str(r#"<alarm armed="yes" silent="banana"><level>high</level></alarm>"#)
            .unwrap();
        assert_eq!(
            alarm,
            Alarm {
                armed: true,
                level: Level::High,
                silent: false,
                message: None,
            }
        );
        assert_eq!(
            binder.write_string(&alarm).unwrap(),
            r#"<alarm armed="true" silent="false"><level>high</level></alarm>"#
        );

        // The field converter is strict, the registry's bool converter is not.
        let result = binder.read_str::<Alarm>(r#"<alarm armed="banana"/>"#);
        assert!(matches!(
            result,
            Err(BindingError::Conversion { ref source, .. }) if source.text == "banana"
        ));
    }

    #[test]
    fn test_cdata_property() {
        let binder = XmlBinder::builder()
            .xml_declaration(false)
            .bind(
                BindingTable::<Alarm>::new("alarm")
                    .optional_property("message", field!(Alarm, message))
                    .cdata()
                    .property("armed", field!(Alarm, armed)),
            )
            .build()
            .unwrap();
        let alarm = Alarm {
            armed: true,
            message: Some("<b>fire</b> & smoke".to_string()),
            ..Alarm::default()
        };
        let written = binder.write_string(&alarm).unwrap();
        assert_eq!(
            written,
            "<alarm><message><![CDATA[<b>fire</b> & smoke]]></message><armed>true</armed></alarm>"
        );
        assert_eq!(binder.read_str::<Alarm>(&written).unwrap(), alarm);
    }
}
