//! Read path: recursive dispatch from elements to bound fields.

use crate::binding::{BindingRegistry, BindingTable, ChildBinding, ChildTarget};
use crate::config::BindingConfig;
use crate::converter::ConverterRegistry;
use crate::error::{BindingError, Result};
use crate::xml::XmlReader;

/// Shared state of one read operation.
#[derive(Clone, Copy)]
pub(crate) struct ReadContext<'a> {
    pub(crate) bindings: &'a BindingRegistry,
    pub(crate) converters: &'a ConverterRegistry,
    pub(crate) config: &'a BindingConfig,
}

impl<'a> ReadContext<'a> {
    pub(crate) fn new(
        bindings: &'a BindingRegistry,
        converters: &'a ConverterRegistry,
        config: &'a BindingConfig,
    ) -> Self {
        Self {
            bindings,
            converters,
            config,
        }
    }

    /// Read the document root as `T`.
    pub(crate) fn read_root<T: Default + 'static>(self, reader: &mut XmlReader<'_>) -> Result<T> {
        let table = self.bindings.get::<T>()?;
        self.read_element(reader, table.element_name())
    }

    /// Read the next element, which must be named `expected`, as `T`.
    ///
    /// # Arguments
    /// * `reader` - Cursor positioned before the element's start tag
    /// * `expected` - Element name from the parent binding (or the root table)
    ///
    /// # Returns
    /// * `Ok(T)` with every bound field read and the rest left at its default
    pub(crate) fn read_element<T: Default + 'static>(
        self,
        reader: &mut XmlReader<'_>,
        expected: &str,
    ) -> Result<T> {
        let table = self.bindings.get::<T>()?;
        self.enter(reader, expected)?;

        let mut value = T::default();
        self.read_content(table, &mut value, reader)?;

        reader.end_element()?;
        Ok(value)
    }

    /// Read a scalar child element and hand its text to `apply`.
    ///
    /// Attributes and child elements of a property element are unmapped content.
    /// The text is handed over even when empty: a present element is a value.
    pub(crate) fn read_property(
        self,
        reader: &mut XmlReader<'_>,
        name: &str,
        apply: impl FnOnce(&str) -> Result<()>,
    ) -> Result<()> {
        self.enter(reader, name)?;

        if self.config.strict {
            if let Some(attribute) = reader
                .attributes()
                .iter()
                .find(|attribute| !attribute.is_namespace_declaration())
            {
                return Err(BindingError::UnreadAttribute {
                    name: attribute.name.clone(),
                    path: reader.path(),
                });
            }
        }

        while reader.has_element()? {
            if self.config.strict {
                let child = reader.next_element_name()?.to_string();
                return Err(BindingError::UnreadElement {
                    name: child,
                    path: reader.path(),
                });
            }
            reader.skip_element()?;
        }

        let content = reader.text()?.to_string();
        apply(&content).map_err(|err| err.with_path(reader.path()))?;

        reader.end_element()
    }

    /// Begin the next element and check its name and depth.
    fn enter(self, reader: &mut XmlReader<'_>, expected: &str) -> Result<()> {
        reader.begin_element()?;
        self.check_depth(reader)?;

        let actual = reader.element_name().unwrap_or_default();
        if actual != expected {
            return Err(BindingError::UnexpectedElement {
                expected: expected.to_string(),
                actual: actual.to_string(),
                path: reader.path(),
            });
        }
        Ok(())
    }

    /// Attributes, child elements and text of the current element.
    fn read_content<T: 'static>(
        self,
        table: &BindingTable<T>,
        value: &mut T,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        self.read_attributes(table, value, reader)?;

        while reader.has_element()? {
            let name = reader.next_element_name()?.to_string();
            match table.child(&name) {
                Some(child) => self.read_child(child, value, &name, reader)?,
                None if self.config.strict => {
                    return Err(BindingError::UnreadElement {
                        name,
                        path: reader.path(),
                    })
                }
                None => {
                    tracing::trace!(element = %name, path = %reader.path(), "ignoring unmapped element");
                    reader.skip_element()?;
                }
            }
        }

        // Empty text content leaves the field at its default.
        if let Some(text) = table.text_binding() {
            let content = reader.text()?.to_string();
            if !content.is_empty() {
                text.slot
                    .read(value, &content, self.converters)
                    .map_err(|err| err.with_path(reader.path()))?;
            }
        }
        Ok(())
    }

    fn read_child<T: 'static>(
        self,
        child: &ChildBinding<T>,
        value: &mut T,
        name: &str,
        reader: &mut XmlReader<'_>,
    ) -> Result<()> {
        match &child.target {
            ChildTarget::Slot(slot) => slot.read_child(value, name, self, reader),
            ChildTarget::Path(wrapper) => {
                self.enter(reader, name)?;
                self.read_content(wrapper, value, reader)?;
                reader.end_element()
            }
        }
    }

    fn read_attributes<T: 'static>(
        self,
        table: &BindingTable<T>,
        value: &mut T,
        reader: &XmlReader<'_>,
    ) -> Result<()> {
        for attribute in reader.attributes() {
            if attribute.is_namespace_declaration() {
                continue;
            }
            match table.attribute_binding(&attribute.name) {
                Some(binding) => binding
                    .slot
                    .read(value, &attribute.value, self.converters)
                    .map_err(|err| err.with_path(reader.path()))?,
                None if self.config.strict => {
                    return Err(BindingError::UnreadAttribute {
                        name: attribute.name.clone(),
                        path: reader.path(),
                    })
                }
                None => {
                    tracing::trace!(attribute = %attribute.name, path = %reader.path(), "ignoring unmapped attribute");
                }
            }
        }

        for binding in table.attribute_bindings() {
            if binding.required && reader.attribute_value(&binding.name).is_none() {
                return Err(BindingError::UnknownAttribute {
                    name: binding.name.clone(),
                    path: reader.path(),
                });
            }
        }
        Ok(())
    }

    fn check_depth(self, reader: &XmlReader<'_>) -> Result<()> {
        if reader.depth() > self.config.max_depth {
            return Err(BindingError::DepthLimitExceeded {
                limit: self.config.max_depth,
                path: reader.path(),
            });
        }
        Ok(())
    }
}
