//! Binding tables: which element, attribute and text maps to which field.
//!
//! A [`BindingTable`] is supplied by the caller for every bound type and is
//! immutable once registered. Fields are addressed through [`Field`] accessor
//! pairs, usually built with the [`field!`](crate::field) macro:
//!
//! ```
//! use regelrecht_binding::binding::BindingTable;
//! use regelrecht_binding::field;
//!
//! #[derive(Debug, Default)]
//! struct Book {
//!     id: u32,
//!     title: String,
//!     available: bool,
//! }
//!
//! let table = BindingTable::<Book>::new("book")
//!     .attribute("id", field!(Book, id))
//!     .attribute("available", field!(Book, available))
//!     .property("title", field!(Book, title));
//!
//! assert_eq!(table.element_name(), "book");
//! assert_eq!(table.child_names().collect::<Vec<_>>(), vec!["title"]);
//! ```

mod registry;
mod slots;

use std::collections::HashSet;

pub use registry::BindingRegistry;
pub(crate) use slots::{ChildSlot, ElementType, ScalarSlot, VariantSlot};

use crate::config::{validate_namespace_prefix, NamespaceDeclaration};
use crate::converter::TypeConverter;
use crate::error::{BindingError, Result};
use slots::{
    ElementList, Optional, PolymorphicElement, PolymorphicList, PropertyElement, PropertyList,
    Required, SingleElement, Variant,
};

/// Accessor pair for a field of type `V` inside `T`.
pub struct Field<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

impl<T, V> Field<T, V> {
    /// Create a field accessor from a getter and a mutable getter.
    #[must_use]
    pub fn new(get: fn(&T) -> &V, get_mut: fn(&mut T) -> &mut V) -> Self {
        Self { get, get_mut }
    }

    /// Borrow the field.
    pub fn get<'a>(&self, owner: &'a T) -> &'a V {
        (self.get)(owner)
    }

    /// Borrow the field mutably.
    pub fn get_mut<'a>(&self, owner: &'a mut T) -> &'a mut V {
        (self.get_mut)(owner)
    }
}

impl<T, V> Clone for Field<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Field<T, V> {}

/// Build a [`Field`] for a named struct member.
///
/// `field!(Book, title)` expands to accessors for `book.title`.
#[macro_export]
macro_rules! field {
    ($ty:ty, $member:ident) => {
        $crate::binding::Field::<$ty, _>::new(|owner| &owner.$member, |owner| &mut owner.$member)
    };
}

/// How often a child element may occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most once; a later occurrence replaces an earlier one.
    Single,
    /// Any number of times, kept in document order.
    Repeated,
}

/// What a child element binds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildKind {
    /// A nested bound type with its own table.
    Element,
    /// A scalar read from the child's text content.
    Property,
    /// One of several bound types, chosen by element name.
    Polymorphic,
    /// A wrapper element without a type of its own, see [`BindingTable::path`].
    Path,
}

/// Element names and types of a polymorphic binding.
///
/// Each variant maps one element name to a bound type `U` and to the enum
/// variant `E` that holds it.
///
/// ```
/// use regelrecht_binding::binding::Polymorphic;
///
/// #[derive(Debug, Default)]
/// struct Circle {
///     radius: u32,
/// }
///
/// #[derive(Debug, Default)]
/// struct Square {
///     side: u32,
/// }
///
/// #[derive(Debug)]
/// enum Shape {
///     Circle(Circle),
///     Square(Square),
/// }
///
/// let shapes = Polymorphic::<Shape>::new()
///     .variant("circle", Shape::Circle, |shape| match shape {
///         Shape::Circle(circle) => Some(circle),
///         _ => None,
///     })
///     .variant("square", Shape::Square, |shape| match shape {
///         Shape::Square(square) => Some(square),
///         _ => None,
///     });
/// assert_eq!(shapes.names().collect::<Vec<_>>(), vec!["circle", "square"]);
/// ```
pub struct Polymorphic<E> {
    variants: Vec<Box<dyn VariantSlot<E>>>,
}

impl<E: 'static> Polymorphic<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            variants: Vec::new(),
        }
    }

    /// Map element `name` to `U`, wrapped into `E` by `wrap` and found again by `unwrap`.
    #[must_use]
    pub fn variant<U: Default + 'static>(
        mut self,
        name: impl Into<String>,
        wrap: fn(U) -> E,
        unwrap: fn(&E) -> Option<&U>,
    ) -> Self {
        self.variants
            .push(Box::new(Variant::new(name.into(), wrap, unwrap)));
        self
    }

    /// Element names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|variant| variant.name())
    }
}

impl<E: 'static> Default for Polymorphic<E> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct AttributeBinding<T> {
    pub(crate) name: String,
    pub(crate) required: bool,
    pub(crate) slot: Box<dyn ScalarSlot<T>>,
}

pub(crate) enum ChildTarget<T> {
    Slot(Box<dyn ChildSlot<T>>),
    /// Wrapper element whose content belongs to the same value.
    Path(BindingTable<T>),
}

pub(crate) struct ChildBinding<T> {
    /// Element names this binding accepts; the first is used for writing.
    pub(crate) names: Vec<String>,
    pub(crate) cardinality: Cardinality,
    pub(crate) kind: ChildKind,
    pub(crate) target: ChildTarget<T>,
}

impl<T> ChildBinding<T> {
    pub(crate) fn name(&self) -> &str {
        self.names.first().map_or("", String::as_str)
    }
}

pub(crate) struct TextBinding<T> {
    pub(crate) slot: Box<dyn ScalarSlot<T>>,
    pub(crate) cdata: bool,
}

/// Binding most recently added, the one [`BindingTable::cdata`] applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LastBinding {
    Text,
    Child,
}

/// Mapping between one element and the fields of `T`.
pub struct BindingTable<T> {
    element_name: String,
    namespaces: Vec<NamespaceDeclaration>,
    attributes: Vec<AttributeBinding<T>>,
    children: Vec<ChildBinding<T>>,
    text: Option<TextBinding<T>>,
    last: Option<LastBinding>,
}

impl<T: 'static> BindingTable<T> {
    /// Create a table for elements named `element_name`.
    #[must_use]
    pub fn new(element_name: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
            namespaces: Vec::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
            last: None,
        }
    }

    /// Declare a namespace written when `T` is the document root.
    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push(NamespaceDeclaration::new(prefix, uri));
        self
    }

    /// Bind an attribute. When absent the field keeps its default.
    #[must_use]
    pub fn attribute<V: 'static>(self, name: impl Into<String>, field: Field<T, V>) -> Self {
        self.push_attribute(name, false, Box::new(Required::new(field, None)))
    }

    /// Bind an attribute converted by `converter` instead of the registry.
    #[must_use]
    pub fn attribute_with<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, V>,
        converter: impl TypeConverter<V> + 'static,
    ) -> Self {
        let slot = Required::new(field, Some(Box::new(converter)));
        self.push_attribute(name, false, Box::new(slot))
    }

    /// Bind an attribute that must be present when reading.
    #[must_use]
    pub fn required_attribute<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, V>,
    ) -> Self {
        self.push_attribute(name, true, Box::new(Required::new(field, None)))
    }

    /// Bind an attribute to an `Option`. `None` is not written.
    #[must_use]
    pub fn optional_attribute<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, Option<V>>,
    ) -> Self {
        self.push_attribute(name, false, Box::new(Optional::new(field, None)))
    }

    /// Bind a child element whose text is a scalar, e.g. `<title>Dune</title>`.
    #[must_use]
    pub fn property<V: 'static>(self, name: impl Into<String>, field: Field<T, V>) -> Self {
        self.push_property(name, Box::new(Required::new(field, None)))
    }

    /// Bind a scalar child element converted by `converter` instead of the registry.
    ///
    /// ```
    /// use regelrecht_binding::converter::{DateTimeConverter, DateTimeFormat};
    /// use regelrecht_binding::{field, BindingTable, XmlBinder};
    ///
    /// #[derive(Debug, Default)]
    /// struct Entry {
    ///     updated: Option<chrono::DateTime<chrono::FixedOffset>>,
    /// }
    ///
    /// let binder = XmlBinder::builder()
    ///     .xml_declaration(false)
    ///     .bind(BindingTable::<Entry>::new("entry").optional_property_with(
    ///         "updated",
    ///         field!(Entry, updated),
    ///         DateTimeConverter::new(DateTimeFormat::Rfc2822),
    ///     ))
    ///     .build()
    ///     .unwrap();
    ///
    /// let entry: Entry = binder
    ///     .read_str("<entry><updated>2024-05-01T09:30:00+02:00</updated></entry>")
    ///     .unwrap();
    /// assert!(binder.write_string(&entry).unwrap().contains("01 May 2024 09:30:00 +0200"));
    /// ```
    #[must_use]
    pub fn property_with<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, V>,
        converter: impl TypeConverter<V> + 'static,
    ) -> Self {
        let slot = Required::new(field, Some(Box::new(converter)));
        self.push_property(name, Box::new(slot))
    }

    /// Bind an optional scalar child element. `None` is not written.
    ///
    /// A present element always reads as `Some`, so `Some(String::new())` is
    /// written as `<name/>` and reads back unchanged.
    #[must_use]
    pub fn optional_property<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, Option<V>>,
    ) -> Self {
        self.push_property(name, Box::new(Optional::new(field, None)))
    }

    /// Bind an optional scalar child element with its own converter.
    #[must_use]
    pub fn optional_property_with<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, Option<V>>,
        converter: impl TypeConverter<V> + 'static,
    ) -> Self {
        let slot = Optional::new(field, Some(Box::new(converter)));
        self.push_property(name, Box::new(slot))
    }

    /// Bind a repeated scalar child element.
    #[must_use]
    pub fn property_list<V: 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, Vec<V>>,
    ) -> Self {
        let slot = PropertyList::new(field);
        self.push_child(name, Cardinality::Repeated, ChildKind::Property, Box::new(slot))
    }

    /// Bind a nested element of a type with its own table.
    ///
    /// `name` is the element name used at this position, which may differ from
    /// the nested table's own element name.
    #[must_use]
    pub fn element<U: Default + 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, Option<U>>,
    ) -> Self {
        let slot = SingleElement::new(field);
        self.push_child(name, Cardinality::Single, ChildKind::Element, Box::new(slot))
    }

    /// Bind a repeated nested element, kept in document order.
    #[must_use]
    pub fn element_list<U: Default + 'static>(
        self,
        name: impl Into<String>,
        field: Field<T, Vec<U>>,
    ) -> Self {
        let slot = ElementList::new(field);
        self.push_child(name, Cardinality::Repeated, ChildKind::Element, Box::new(slot))
    }

    /// Bind one nested element whose type depends on its name.
    #[must_use]
    pub fn polymorphic_element<E: 'static>(
        self,
        field: Field<T, Option<E>>,
        variants: Polymorphic<E>,
    ) -> Self {
        let names = variants.names().map(String::from).collect();
        let slot = PolymorphicElement::new(field, variants.variants);
        self.push_binding(names, Cardinality::Single, ChildKind::Polymorphic, Box::new(slot))
    }

    /// Bind repeated nested elements whose types depend on their names.
    ///
    /// Elements of all variants share one list in document order.
    #[must_use]
    pub fn polymorphic_list<E: 'static>(
        self,
        field: Field<T, Vec<E>>,
        variants: Polymorphic<E>,
    ) -> Self {
        let names = variants.names().map(String::from).collect();
        let slot = PolymorphicList::new(field, variants.variants);
        self.push_binding(names, Cardinality::Repeated, ChildKind::Polymorphic, Box::new(slot))
    }

    /// Bind fields that sit inside wrapper elements without a type of their own.
    ///
    /// `path` is a `/`-separated list of element names. Bindings made by `build`
    /// apply inside the innermost one. Paths sharing a prefix share the wrapper
    /// elements, which are always written.
    ///
    /// ```
    /// use regelrecht_binding::{field, BindingTable, XmlBinder};
    ///
    /// #[derive(Debug, Default, PartialEq)]
    /// struct Law {
    ///     title: String,
    ///     valid_from: Option<String>,
    /// }
    ///
    /// let binder = XmlBinder::builder()
    ///     .xml_declaration(false)
    ///     .bind(
    ///         BindingTable::<Law>::new("law")
    ///             .path("meta/dates", |dates| {
    ///                 dates.optional_property("validFrom", field!(Law, valid_from))
    ///             })
    ///             .path("meta", |meta| meta.property("title", field!(Law, title))),
    ///     )
    ///     .build()
    ///     .unwrap();
    ///
    /// let xml = "<law><meta><dates><validFrom>2025-01-01</validFrom></dates><title>Wet</title></meta></law>";
    /// let law: Law = binder.read_str(xml).unwrap();
    /// assert_eq!(law.title, "Wet");
    /// assert_eq!(binder.write_string(&law).unwrap(), xml);
    /// ```
    #[must_use]
    pub fn path(
        mut self,
        path: &str,
        build: impl FnOnce(BindingTable<T>) -> BindingTable<T>,
    ) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
        let Some((first, rest)) = segments.split_first() else {
            return build(self);
        };

        let index = match self.children.iter().position(|child| {
            matches!(child.target, ChildTarget::Path(_)) && child.name() == *first
        }) {
            Some(index) => index,
            None => {
                self.children.push(ChildBinding {
                    names: vec![(*first).to_string()],
                    cardinality: Cardinality::Single,
                    kind: ChildKind::Path,
                    target: ChildTarget::Path(BindingTable::new(*first)),
                });
                self.children.len() - 1
            }
        };

        if let ChildTarget::Path(wrapper) = &mut self.children[index].target {
            let inner = std::mem::replace(wrapper, BindingTable::new(*first));
            *wrapper = inner.path(&rest.join("/"), build);
        }
        self.last = None;
        self
    }

    /// Bind the element's text content.
    #[must_use]
    pub fn text<V: 'static>(self, field: Field<T, V>) -> Self {
        self.push_text(Box::new(Required::new(field, None)))
    }

    /// Bind the element's text content to an `Option`.
    #[must_use]
    pub fn optional_text<V: 'static>(self, field: Field<T, Option<V>>) -> Self {
        self.push_text(Box::new(Optional::new(field, None)))
    }

    /// Write the binding added just before as a CDATA section.
    ///
    /// Applies to text content and to property elements.
    #[must_use]
    pub fn cdata(mut self) -> Self {
        let marked = match self.last {
            Some(LastBinding::Text) => match self.text.as_mut() {
                Some(text) => {
                    text.cdata = true;
                    true
                }
                None => false,
            },
            Some(LastBinding::Child) => match self.children.last_mut() {
                Some(ChildBinding {
                    target: ChildTarget::Slot(slot),
                    ..
                }) => slot.write_as_cdata(),
                _ => false,
            },
            None => false,
        };
        if !marked {
            tracing::warn!(
                element = %self.element_name,
                "cdata() follows neither text content nor a property element"
            );
        }
        self
    }

    /// Element name of `T` when it is the document root.
    #[must_use]
    pub fn element_name(&self) -> &str {
        &self.element_name
    }

    /// Namespace declarations for the document root.
    #[must_use]
    pub fn namespaces(&self) -> &[NamespaceDeclaration] {
        &self.namespaces
    }

    /// Bound attribute names in declaration order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|binding| binding.name.as_str())
    }

    /// Bound child element names in declaration order.
    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children
            .iter()
            .flat_map(|binding| binding.names.iter().map(String::as_str))
    }

    /// Cardinality and kind of a child binding.
    #[must_use]
    pub fn child_shape(&self, name: &str) -> Option<(Cardinality, ChildKind)> {
        self.child(name)
            .map(|binding| (binding.cardinality, binding.kind))
    }

    /// Whether text content is bound.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }

    pub(crate) fn attribute_binding(&self, name: &str) -> Option<&AttributeBinding<T>> {
        self.attributes.iter().find(|binding| binding.name == name)
    }

    pub(crate) fn attribute_bindings(&self) -> &[AttributeBinding<T>] {
        &self.attributes
    }

    pub(crate) fn child(&self, name: &str) -> Option<&ChildBinding<T>> {
        self.children
            .iter()
            .find(|binding| binding.names.iter().any(|candidate| candidate == name))
    }

    pub(crate) fn children(&self) -> &[ChildBinding<T>] {
        &self.children
    }

    pub(crate) fn text_binding(&self) -> Option<&TextBinding<T>> {
        self.text.as_ref()
    }

    /// Bound types of nested elements, including those inside wrapper paths.
    pub(crate) fn element_types(&self) -> Vec<ElementType> {
        self.children
            .iter()
            .flat_map(|child| match &child.target {
                ChildTarget::Slot(slot) => slot.element_types(),
                ChildTarget::Path(wrapper) => wrapper.element_types(),
            })
            .collect()
    }

    /// Check names for duplicates and namespace prefixes for validity.
    pub fn validate(&self) -> Result<()> {
        if self.element_name.is_empty() {
            return Err(self.invalid("element name is empty"));
        }

        let mut seen = HashSet::new();
        for binding in &self.attributes {
            if !seen.insert(binding.name.as_str()) {
                return Err(self.invalid(format!("attribute '{}' is bound twice", binding.name)));
            }
        }

        let mut seen = HashSet::new();
        for binding in &self.children {
            if binding.names.is_empty() {
                return Err(self.invalid("polymorphic binding has no variants"));
            }
            for name in &binding.names {
                if !seen.insert(name.as_str()) {
                    return Err(self.invalid(format!("element <{name}> is bound twice")));
                }
            }
            if let ChildTarget::Path(wrapper) = &binding.target {
                wrapper.validate()?;
            }
        }

        for namespace in &self.namespaces {
            validate_namespace_prefix(&namespace.prefix)?;
        }

        if self.text.is_some() && !self.children.is_empty() {
            tracing::warn!(
                element = %self.element_name,
                "binding maps both text content and child elements"
            );
        }
        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> BindingError {
        BindingError::InvalidBinding {
            element: self.element_name.clone(),
            message: message.into(),
        }
    }

    fn push_attribute(
        mut self,
        name: impl Into<String>,
        required: bool,
        slot: Box<dyn ScalarSlot<T>>,
    ) -> Self {
        self.attributes.push(AttributeBinding {
            name: name.into(),
            required,
            slot,
        });
        self
    }

    fn push_property(self, name: impl Into<String>, slot: Box<dyn ScalarSlot<T>>) -> Self {
        let slot = PropertyElement::new(slot);
        self.push_child(name, Cardinality::Single, ChildKind::Property, Box::new(slot))
    }

    fn push_child(
        self,
        name: impl Into<String>,
        cardinality: Cardinality,
        kind: ChildKind,
        slot: Box<dyn ChildSlot<T>>,
    ) -> Self {
        self.push_binding(vec![name.into()], cardinality, kind, slot)
    }

    fn push_binding(
        mut self,
        names: Vec<String>,
        cardinality: Cardinality,
        kind: ChildKind,
        slot: Box<dyn ChildSlot<T>>,
    ) -> Self {
        self.children.push(ChildBinding {
            names,
            cardinality,
            kind,
            target: ChildTarget::Slot(slot),
        });
        self.last = Some(LastBinding::Child);
        self
    }

    fn push_text(mut self, slot: Box<dyn ScalarSlot<T>>) -> Self {
        self.text = Some(TextBinding { slot, cdata: false });
        self.last = Some(LastBinding::Text);
        self
    }
}
