//! RegelRecht Binding - Stream XML documents into typed structs and back.
//!
//! This crate maps elements, attributes and text of a document onto the fields
//! of plain Rust types using caller-supplied binding tables, and writes those
//! values back as documents with the same structure.
//!
//! # Example
//!
//! ```
//! use regelrecht_binding::{field, BindingTable, XmlBinder};
//!
//! #[derive(Debug, Default)]
//! struct Guid {
//!     is_perma_link: bool,
//!     value: String,
//! }
//!
//! let binder = XmlBinder::builder()
//!     .strict(false)
//!     .bind(
//!         BindingTable::<Guid>::new("guid")
//!             .attribute("isPermaLink", field!(Guid, is_perma_link))
//!             .text(field!(Guid, value)),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let guid: Guid = binder
//!     .read_str(r#"<guid isPermaLink="yes" extra="ignored">urn:1</guid>"#)
//!     .unwrap();
//! assert!(guid.is_perma_link);
//! assert_eq!(guid.value, "urn:1");
//! ```
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`xml`]: Pull-style document cursor and event writer
//! - [`converter`]: Text to value conversion and the converter registry
//! - [`binding`]: Binding tables and the type to table registry
//! - [`engine`]: Recursive read and write paths behind [`XmlBinder`]
//! - [`config`]: Engine settings and validation
//! - [`error`]: Error types and Result alias
//! - [`rss`]: Ready-made bindings for RSS feeds
//! - [`cli`]: Command-line interface

pub mod binding;
pub mod cli;
pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod rss;
pub mod xml;

// Re-export commonly used items
pub use binding::{BindingRegistry, BindingTable, Field, Polymorphic};
pub use config::{BindingConfig, NamespaceDeclaration};
pub use converter::{ConversionError, ConverterRegistry, TypeConverter};
pub use engine::{XmlBinder, XmlBinderBuilder};
pub use error::{BindingError, Result};
pub use xml::{ElementPath, XmlReader, XmlWriter};
