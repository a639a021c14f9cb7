//! Error types for the binding engine.
//!
//! Uses the dual-error pattern: `BindingError` for library consumers with the
//! element path of every document failure, and `ConversionError` for converters
//! that know nothing about the document they are used in.

use thiserror::Error;

use crate::converter::ConversionError;
use crate::xml::ElementPath;

/// Main error type for the binding library.
#[derive(Debug, Error)]
pub enum BindingError {
    /// Input is not well-formed markup.
    #[error("Malformed document at {path}: {message}")]
    MalformedDocument { message: String, path: ElementPath },

    /// Element name differs from the one the binding expects.
    #[error("Expected element <{expected}> but found <{actual}> at {path}")]
    UnexpectedElement {
        expected: String,
        actual: String,
        path: ElementPath,
    },

    /// A required attribute is absent.
    #[error("Missing attribute '{name}' at {path}")]
    UnknownAttribute { name: String, path: ElementPath },

    /// An attribute has no binding (strict mode).
    #[error("Unread attribute '{name}' at {path}")]
    UnreadAttribute { name: String, path: ElementPath },

    /// A child element has no binding (strict mode).
    #[error("Unread element <{name}> at {path}")]
    UnreadElement { name: String, path: ElementPath },

    /// Element closed while unconsumed content remained (strict mode).
    #[error("Unbalanced structure at {path}: {message}")]
    UnbalancedStructure { message: String, path: ElementPath },

    /// A value could not be converted to its destination type.
    #[error("Conversion failed at {path}: {source}")]
    Conversion {
        #[source]
        source: ConversionError,
        path: ElementPath,
    },

    /// No converter is registered for a scalar type.
    #[error("No type converter registered for {type_name}")]
    ConverterNotFound { type_name: &'static str },

    /// No binding table is registered for a type.
    #[error("No binding registered for {type_name}")]
    BindingNotFound { type_name: &'static str },

    /// A binding table is inconsistent.
    #[error("Invalid binding for <{element}>: {message}")]
    InvalidBinding { element: String, message: String },

    /// Namespace prefix is not a valid XML name.
    #[error("Invalid namespace prefix: '{0}'")]
    InvalidNamespacePrefix(String),

    /// Nesting went beyond the configured maximum depth.
    #[error("Maximum nesting depth of {limit} exceeded at {path}")]
    DepthLimitExceeded { limit: usize, path: ElementPath },

    /// Configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml_ng::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BindingError {
    /// Element path of the failure, for errors tied to a document position.
    #[must_use]
    pub fn path(&self) -> Option<&ElementPath> {
        match self {
            Self::MalformedDocument { path, .. }
            | Self::UnexpectedElement { path, .. }
            | Self::UnknownAttribute { path, .. }
            | Self::UnreadAttribute { path, .. }
            | Self::UnreadElement { path, .. }
            | Self::UnbalancedStructure { path, .. }
            | Self::Conversion { path, .. }
            | Self::DepthLimitExceeded { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Attach a path to a conversion failure raised without one.
    pub(crate) fn with_path(self, path: ElementPath) -> Self {
        match self {
            Self::Conversion {
                source,
                path: existing,
            } if existing.is_empty() => Self::Conversion { source, path },
            other => other,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>, path: ElementPath) -> Self {
        Self::MalformedDocument {
            message: message.into(),
            path,
        }
    }

    pub(crate) fn unbalanced(message: impl Into<String>, path: ElementPath) -> Self {
        Self::UnbalancedStructure {
            message: message.into(),
            path,
        }
    }
}

/// Result type alias for binding operations.
pub type Result<T> = std::result::Result<T, BindingError>;
