//! Type-erased destinations behind attribute, text and child bindings.

use std::any::TypeId;

use super::Field;
use crate::converter::{ConversionError, ConverterRegistry, TypeConverter};
use crate::engine::{ReadContext, WriteContext};
use crate::error::{BindingError, Result};
use crate::xml::{ElementPath, XmlReader, XmlWriter};

/// Identity of a bound type a child slot reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ElementType {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl ElementType {
    pub(crate) fn of<U: 'static>() -> Self {
        Self {
            id: TypeId::of::<U>(),
            name: std::any::type_name::<U>(),
        }
    }
}

/// A scalar destination converted through the converter registry.
pub(crate) trait ScalarSlot<T>: Send + Sync {
    /// Convert `text` and store it in `target`.
    fn read(&self, target: &mut T, text: &str, converters: &ConverterRegistry) -> Result<()>;

    /// Render the value, `None` when there is nothing to write.
    fn write(&self, source: &T, converters: &ConverterRegistry) -> Result<Option<String>>;
}

/// A destination filled from a child element.
pub(crate) trait ChildSlot<T>: Send + Sync {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()>;

    fn write_child(
        &self,
        source: &T,
        name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()>;

    /// Bound types this slot reads through their own tables.
    fn element_types(&self) -> Vec<ElementType> {
        Vec::new()
    }

    /// Write the text as CDATA. Returns `false` for slots without text.
    fn write_as_cdata(&mut self) -> bool {
        false
    }
}

/// Field-specific converter, or `None` to use the registry.
type OwnConverter<V> = Option<Box<dyn TypeConverter<V>>>;

fn resolve<'a, V: 'static>(
    own: &'a OwnConverter<V>,
    converters: &'a ConverterRegistry,
) -> Result<&'a dyn TypeConverter<V>> {
    match own {
        Some(converter) => Ok(converter.as_ref()),
        None => converters.get::<V>(),
    }
}

// The engine fills in the path.
fn conversion_error(source: ConversionError) -> BindingError {
    BindingError::Conversion {
        source,
        path: ElementPath::new(),
    }
}

pub(super) struct Required<T, V> {
    field: Field<T, V>,
    converter: OwnConverter<V>,
}

impl<T, V> Required<T, V> {
    pub(super) fn new(field: Field<T, V>, converter: OwnConverter<V>) -> Self {
        Self { field, converter }
    }
}

impl<T: 'static, V: 'static> ScalarSlot<T> for Required<T, V> {
    fn read(&self, target: &mut T, text: &str, converters: &ConverterRegistry) -> Result<()> {
        let value = resolve(&self.converter, converters)?
            .read(text)
            .map_err(conversion_error)?;
        *self.field.get_mut(target) = value;
        Ok(())
    }

    fn write(&self, source: &T, converters: &ConverterRegistry) -> Result<Option<String>> {
        let converter = resolve(&self.converter, converters)?;
        Ok(Some(converter.write(self.field.get(source))))
    }
}

/// `Option` destination.
///
/// Blank text that the converter rejects reads as absent, so a pretty-printed
/// `<count>\n</count>` leaves an `Option<u32>` at `None`. Text the converter
/// accepts, including the empty string for `String`, reads as `Some`.
pub(super) struct Optional<T, V> {
    field: Field<T, Option<V>>,
    converter: OwnConverter<V>,
}

impl<T, V> Optional<T, V> {
    pub(super) fn new(field: Field<T, Option<V>>, converter: OwnConverter<V>) -> Self {
        Self { field, converter }
    }
}

impl<T: 'static, V: 'static> ScalarSlot<T> for Optional<T, V> {
    fn read(&self, target: &mut T, text: &str, converters: &ConverterRegistry) -> Result<()> {
        match resolve(&self.converter, converters)?.read(text) {
            Ok(value) => *self.field.get_mut(target) = Some(value),
            Err(_) if text.trim().is_empty() => {
                tracing::trace!(type_name = std::any::type_name::<V>(), "blank value read as absent");
            }
            Err(source) => return Err(conversion_error(source)),
        }
        Ok(())
    }

    fn write(&self, source: &T, converters: &ConverterRegistry) -> Result<Option<String>> {
        match self.field.get(source) {
            Some(value) => Ok(Some(resolve(&self.converter, converters)?.write(value))),
            None => Ok(None),
        }
    }
}

pub(super) struct PropertyElement<T> {
    slot: Box<dyn ScalarSlot<T>>,
    cdata: bool,
}

impl<T> PropertyElement<T> {
    pub(super) fn new(slot: Box<dyn ScalarSlot<T>>) -> Self {
        Self { slot, cdata: false }
    }
}

impl<T: 'static> ChildSlot<T> for PropertyElement<T> {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        context.read_property(reader, name, |text| {
            self.slot.read(target, text, context.converters)
        })
    }

    fn write_child(
        &self,
        source: &T,
        name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        match self.slot.write(source, context.converters)? {
            Some(text) => context.write_property(writer, name, &text, self.cdata),
            None => Ok(()),
        }
    }

    fn write_as_cdata(&mut self) -> bool {
        self.cdata = true;
        true
    }
}

pub(super) struct PropertyList<T, V> {
    field: Field<T, Vec<V>>,
    cdata: bool,
}

impl<T, V> PropertyList<T, V> {
    pub(super) fn new(field: Field<T, Vec<V>>) -> Self {
        Self {
            field,
            cdata: false,
        }
    }
}

impl<T: 'static, V: 'static> ChildSlot<T> for PropertyList<T, V> {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        context.read_property(reader, name, |text| {
            let value = context
                .converters
                .get::<V>()?
                .read(text)
                .map_err(conversion_error)?;
            self.field.get_mut(target).push(value);
            Ok(())
        })
    }

    fn write_child(
        &self,
        source: &T,
        name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        let values = self.field.get(source);
        if values.is_empty() {
            return Ok(());
        }
        let converter = context.converters.get::<V>()?;
        for value in values {
            context.write_property(writer, name, &converter.write(value), self.cdata)?;
        }
        Ok(())
    }

    fn write_as_cdata(&mut self) -> bool {
        self.cdata = true;
        true
    }
}

pub(super) struct SingleElement<T, U> {
    field: Field<T, Option<U>>,
}

impl<T, U> SingleElement<T, U> {
    pub(super) fn new(field: Field<T, Option<U>>) -> Self {
        Self { field }
    }
}

impl<T: 'static, U: Default + 'static> ChildSlot<T> for SingleElement<T, U> {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        let value = context.read_element::<U>(reader, name)?;
        *self.field.get_mut(target) = Some(value);
        Ok(())
    }

    fn write_child(
        &self,
        source: &T,
        name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        match self.field.get(source) {
            Some(value) => context.write_element(value, name, writer),
            None => Ok(()),
        }
    }

    fn element_types(&self) -> Vec<ElementType> {
        vec![ElementType::of::<U>()]
    }
}

pub(super) struct ElementList<T, U> {
    field: Field<T, Vec<U>>,
}

impl<T, U> ElementList<T, U> {
    pub(super) fn new(field: Field<T, Vec<U>>) -> Self {
        Self { field }
    }
}

impl<T: 'static, U: Default + 'static> ChildSlot<T> for ElementList<T, U> {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        let value = context.read_element::<U>(reader, name)?;
        self.field.get_mut(target).push(value);
        Ok(())
    }

    fn write_child(
        &self,
        source: &T,
        name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        for value in self.field.get(source) {
            context.write_element(value, name, writer)?;
        }
        Ok(())
    }

    fn element_types(&self) -> Vec<ElementType> {
        vec![ElementType::of::<U>()]
    }
}

/// One element name of a polymorphic binding and the type behind it.
pub(crate) trait VariantSlot<E>: Send + Sync {
    fn name(&self) -> &str;

    fn read(&self, context: ReadContext<'_>, reader: &mut XmlReader<'_>) -> Result<E>;

    /// Write `value` if it holds this variant; `false` if it does not.
    fn write(&self, value: &E, context: WriteContext<'_>, writer: &mut XmlWriter<'_>)
        -> Result<bool>;

    fn element_type(&self) -> ElementType;
}

pub(super) struct Variant<E, U> {
    name: String,
    wrap: fn(U) -> E,
    unwrap: fn(&E) -> Option<&U>,
}

impl<E, U> Variant<E, U> {
    pub(super) fn new(name: String, wrap: fn(U) -> E, unwrap: fn(&E) -> Option<&U>) -> Self {
        Self { name, wrap, unwrap }
    }
}

impl<E: 'static, U: Default + 'static> VariantSlot<E> for Variant<E, U> {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, context: ReadContext<'_>, reader: &mut XmlReader<'_>) -> Result<E> {
        context.read_element::<U>(reader, &self.name).map(self.wrap)
    }

    fn write(
        &self,
        value: &E,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<bool> {
        match (self.unwrap)(value) {
            Some(inner) => {
                context.write_element(inner, &self.name, writer)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn element_type(&self) -> ElementType {
        ElementType::of::<U>()
    }
}

pub(super) type Variants<E> = Vec<Box<dyn VariantSlot<E>>>;

fn read_variant<E>(
    variants: &Variants<E>,
    name: &str,
    context: ReadContext<'_>,
    reader: &mut XmlReader<'_>,
) -> Result<E> {
    match variants.iter().find(|variant| variant.name() == name) {
        Some(variant) => variant.read(context, reader),
        None => Err(BindingError::UnreadElement {
            name: name.to_string(),
            path: reader.path(),
        }),
    }
}

fn write_variant<E>(
    variants: &Variants<E>,
    value: &E,
    context: WriteContext<'_>,
    writer: &mut XmlWriter<'_>,
) -> Result<()> {
    for variant in variants.iter() {
        if variant.write(value, context, writer)? {
            return Ok(());
        }
    }
    Err(BindingError::InvalidBinding {
        element: writer.path().to_string(),
        message: format!(
            "{} value matches no polymorphic variant",
            std::any::type_name::<E>()
        ),
    })
}

pub(super) struct PolymorphicElement<T, E> {
    field: Field<T, Option<E>>,
    variants: Variants<E>,
}

impl<T, E> PolymorphicElement<T, E> {
    pub(super) fn new(field: Field<T, Option<E>>, variants: Variants<E>) -> Self {
        Self { field, variants }
    }
}

impl<T: 'static, E: 'static> ChildSlot<T> for PolymorphicElement<T, E> {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        let value = read_variant(&self.variants, name, context, reader)?;
        *self.field.get_mut(target) = Some(value);
        Ok(())
    }

    fn write_child(
        &self,
        source: &T,
        _name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        match self.field.get(source) {
            Some(value) => write_variant(&self.variants, value, context, writer),
            None => Ok(()),
        }
    }

    fn element_types(&self) -> Vec<ElementType> {
        self.variants.iter().map(|variant| variant.element_type()).collect()
    }
}

pub(super) struct PolymorphicList<T, E> {
    field: Field<T, Vec<E>>,
    variants: Variants<E>,
}

impl<T, E> PolymorphicList<T, E> {
    pub(super) fn new(field: Field<T, Vec<E>>, variants: Variants<E>) -> Self {
        Self { field, variants }
    }
}

impl<T: 'static, E: 'static> ChildSlot<T> for PolymorphicList<T, E> {
    fn read_child(
        &self,
        target: &mut T,
        name: &str,
        context: ReadContext<'_>,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        let value = read_variant(&self.variants, name, context, reader)?;
        self.field.get_mut(target).push(value);
        Ok(())
    }

    fn write_child(
        &self,
        source: &T,
        _name: &str,
        context: WriteContext<'_>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        for value in self.field.get(source) {
            write_variant(&self.variants, value, context, writer)?;
        }
        Ok(())
    }

    fn element_types(&self) -> Vec<ElementType> {
        self.variants.iter().map(|variant| variant.element_type()).collect()
    }
}
