//! Configuration constants, engine settings and validation functions.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BindingError, Result};

/// Default maximum element nesting depth for reading and writing.
///
/// Deeply nested input is rejected before it can exhaust the stack.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// XML declaration written at the start of a document.
pub const XML_DECLARATION_VERSION: &str = "1.0";

/// Encoding named in the XML declaration.
pub const XML_DECLARATION_ENCODING: &str = "UTF-8";

/// Namespace prefix pattern: an XML NCName.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static NAMESPACE_PREFIX_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9._-]*$").expect("valid regex"));

/// Validate a namespace prefix.
///
/// Prefixes starting with `xml` (any case) are reserved.
///
/// # Arguments
/// * `prefix` - The prefix to validate
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(BindingError::InvalidNamespacePrefix)` if invalid
///
/// # Examples
/// ```
/// use regelrecht_binding::config::validate_namespace_prefix;
///
/// assert!(validate_namespace_prefix("media").is_ok());
/// assert!(validate_namespace_prefix("1media").is_err());
/// assert!(validate_namespace_prefix("xmlns").is_err());
/// ```
pub fn validate_namespace_prefix(prefix: &str) -> Result<()> {
    let reserved = prefix
        .get(..3)
        .is_some_and(|head| head.eq_ignore_ascii_case("xml"));
    if NAMESPACE_PREFIX_PATTERN.is_match(prefix) && !reserved {
        Ok(())
    } else {
        Err(BindingError::InvalidNamespacePrefix(prefix.to_string()))
    }
}

/// A namespace declaration written as `xmlns:prefix="uri"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceDeclaration {
    pub prefix: String,
    pub uri: String,
}

impl NamespaceDeclaration {
    /// Create a namespace declaration.
    #[must_use]
    pub fn new(prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            uri: uri.into(),
        }
    }

    /// Attribute name used for this declaration.
    #[must_use]
    pub fn attribute_name(&self) -> String {
        format!("xmlns:{}", self.prefix)
    }
}

/// Engine settings.
///
/// Loaded from YAML or built in code:
///
/// ```yaml
/// strict: false
/// xml_declaration: true
/// root_namespaces:
///   - prefix: media
///     uri: http://search.yahoo.com/mrss/
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BindingConfig {
    /// Fail on attributes, elements or text that no binding consumes.
    pub strict: bool,

    /// Write `<?xml version="1.0" encoding="UTF-8"?>` before the root element.
    pub xml_declaration: bool,

    /// Namespace declarations written on the root start tag only.
    pub root_namespaces: Vec<NamespaceDeclaration>,

    /// Maximum element nesting depth.
    pub max_depth: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            strict: true,
            xml_declaration: true,
            root_namespaces: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BindingConfig {
    /// Parse and validate a configuration from YAML.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Check prefixes and limits.
    pub fn validate(&self) -> Result<()> {
        for namespace in &self.root_namespaces {
            validate_namespace_prefix(&namespace.prefix)?;
        }
        if self.max_depth == 0 {
            return Err(BindingError::DepthLimitExceeded {
                limit: 0,
                path: crate::xml::ElementPath::new(),
            });
        }
        Ok(())
    }

    /// Use lenient mode (skip unmapped content).
    #[must_use]
    pub fn lenient(mut self) -> Self {
        self.strict = false;
        self
    }

    /// Add a root namespace declaration.
    #[must_use]
    pub fn with_root_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.root_namespaces
            .push(NamespaceDeclaration::new(prefix, uri));
        self
    }
}
