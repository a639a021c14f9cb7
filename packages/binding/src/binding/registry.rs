//! Lookup table from bound types to their binding tables.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use super::{BindingTable, ElementType};
use crate::error::{BindingError, Result};

struct Entry {
    element_name: String,
    table: Box<dyn Any + Send + Sync>,
    nested: Vec<ElementType>,
}

/// Registry mapping types to binding tables.
///
/// Nested elements find their table here by type identity, so a type may
/// contain itself (directly or through other types).
#[derive(Default)]
pub struct BindingRegistry {
    entries: HashMap<TypeId, Entry>,
}

impl BindingRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and register the table for `T`, replacing any previous one.
    pub fn register<T: 'static>(&mut self, table: BindingTable<T>) -> Result<()> {
        table.validate()?;
        self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                element_name: table.element_name().to_string(),
                nested: table.element_types(),
                table: Box::new(table),
            },
        );
        Ok(())
    }

    /// Get the table for `T`.
    pub fn get<T: 'static>(&self) -> Result<&BindingTable<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.table.downcast_ref::<BindingTable<T>>())
            .ok_or(BindingError::BindingNotFound {
                type_name: std::any::type_name::<T>(),
            })
    }

    /// Check if a table is registered for `T`.
    #[must_use]
    pub fn has_binding<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Check that every nested element type has a table.
    ///
    /// # Returns
    /// * `Err(BindingError::BindingNotFound)` naming the first missing type,
    ///   checked in element name order
    pub fn check_complete(&self) -> Result<()> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by(|a, b| a.element_name.cmp(&b.element_name));

        for entry in entries {
            if let Some(missing) = entry
                .nested
                .iter()
                .find(|nested| !self.entries.contains_key(&nested.id))
            {
                return Err(BindingError::BindingNotFound {
                    type_name: missing.name,
                });
            }
        }
        Ok(())
    }

    /// Element names of all registered tables, sorted.
    #[must_use]
    pub fn element_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .values()
            .map(|entry| entry.element_name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no table is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
