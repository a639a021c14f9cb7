//! Write path: the mirror of the read path.

use std::collections::HashSet;

use crate::binding::{BindingRegistry, BindingTable, ChildBinding, ChildTarget};
use crate::config::BindingConfig;
use crate::converter::ConverterRegistry;
use crate::error::{BindingError, Result};
use crate::xml::XmlWriter;

/// Shared state of one write operation.
#[derive(Clone, Copy)]
pub(crate) struct WriteContext<'a> {
    pub(crate) bindings: &'a BindingRegistry,
    pub(crate) converters: &'a ConverterRegistry,
    pub(crate) config: &'a BindingConfig,
}

impl<'a> WriteContext<'a> {
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

    /// Write `value` as the document root, with declaration and namespaces.
    pub(crate) fn write_root<T: 'static>(self, value: &T, writer: &mut XmlWriter<'_>) -> Result<()> {
        let table = self.bindings.get::<T>()?;
        if self.config.xml_declaration {
            writer.declaration()?;
        }
        self.write_table(table, value, table.element_name(), writer, true)
    }

    /// Write `value` as a nested element named `name`.
    pub(crate) fn write_element<T: 'static>(
        self,
        value: &T,
        name: &str,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        let table = self.bindings.get::<T>()?;
        self.write_table(table, value, name, writer, false)
    }

    /// Write a scalar child element. Empty text gives a self-closed element.
    pub(crate) fn write_property(
        self,
        writer: &mut XmlWriter<'_>,
        name: &str,
        text: &str,
        cdata: bool,
    ) -> Result<()> {
        writer.begin_element(name)?;
        self.check_depth(writer)?;
        self.write_text(writer, text, cdata)?;
        writer.end_element()
    }

    fn write_table<T: 'static>(
        self,
        table: &BindingTable<T>,
        value: &T,
        name: &str,
        writer: &mut XmlWriter<'_>,
        root: bool,
    ) -> Result<()> {
        writer.begin_element(name)?;
        self.check_depth(writer)?;

        if root {
            self.write_namespaces(table, writer)?;
        }

        for binding in table.attribute_bindings() {
            if let Some(text) = binding.slot.write(value, self.converters)? {
                writer.attribute(&binding.name, &text)?;
            }
        }

        for child in table.children() {
            self.write_child(child, value, writer)?;
        }

        if let Some(text_binding) = table.text_binding() {
            if let Some(text) = text_binding.slot.write(value, self.converters)? {
                self.write_text(writer, &text, text_binding.cdata)?;
            }
        }

        writer.end_element()
    }

    fn write_child<T: 'static>(
        self,
        child: &ChildBinding<T>,
        value: &T,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        match &child.target {
            ChildTarget::Slot(slot) => slot.write_child(value, child.name(), self, writer),
            ChildTarget::Path(wrapper) => {
                self.write_table(wrapper, value, child.name(), writer, false)
            }
        }
    }

    /// Empty text is not written.
    fn write_text(self, writer: &mut XmlWriter<'_>, text: &str, cdata: bool) -> Result<()> {
        match (text.is_empty(), cdata) {
            (true, _) => Ok(()),
            (false, true) => writer.cdata(text),
            (false, false) => writer.text(text),
        }
    }

    /// Configured namespaces first, then the root table's own; each prefix once.
    fn write_namespaces<T: 'static>(
        self,
        table: &BindingTable<T>,
        writer: &mut XmlWriter<'_>,
    ) -> Result<()> {
        let mut written = HashSet::new();
        for namespace in self.config.root_namespaces.iter().chain(table.namespaces()) {
            if written.insert(namespace.prefix.as_str()) {
                writer.namespace(&namespace.prefix, &namespace.uri)?;
            }
        }
        Ok(())
    }

    fn check_depth(self, writer: &XmlWriter<'_>) -> Result<()> {
        if writer.depth() > self.config.max_depth {
            return Err(BindingError::DepthLimitExceeded {
                limit: self.config.max_depth,
                path: writer.path(),
            });
        }
        Ok(())
    }
}
