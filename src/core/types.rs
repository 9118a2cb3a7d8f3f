//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Urn`] - Validated `<kind>:<domain-path>:<name>` entity identifier
//! - [`kinds`] - Well-known entity kinds, which double as file suffixes
//!
//! # Validation
//!
//! These types enforce validity at construction time. A malformed URN is a
//! caller error and never reaches the storage layer.
//!
//! # Examples
//!
//! ```
//! use datathread::core::types::Urn;
//!
//! let urn = Urn::new("element:sales/emea:order%20total").unwrap();
//! assert_eq!(urn.kind(), "element");
//! assert_eq!(urn.domain_segments(), vec!["sales", "emea"]);
//! assert_eq!(urn.file_stem(), "order total");
//!
//! assert!(Urn::new("element:sales").is_err());
//! assert!(Urn::new("element:a:b:c").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known entity kinds.
///
/// A kind names both the semantic entity and the file suffix used to locate
/// its document (`<name>.<kind>.json`).
pub mod kinds {
    pub const ELEMENT: &str = "element";
    pub const ELEMENT_INFO: &str = "element_info";
    pub const DATASET: &str = "dataset";
    pub const FIELD: &str = "field";

    /// File name suffix for documents of the given kind.
    ///
    /// # Example
    ///
    /// ```
    /// use datathread::core::types::kinds;
    ///
    /// assert_eq!(kinds::file_suffix(kinds::ELEMENT), ".element.json");
    /// ```
    pub fn file_suffix(kind: &str) -> String {
        format!(".{kind}.json")
    }
}

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid urn '{urn}': {reason}")]
    InvalidUrn { urn: String, reason: String },

    #[error("invalid entity kind '{0}'")]
    InvalidKind(String),
}

/// A validated entity URN.
///
/// The textual form is `<kind>:<domain-path>:<name>`:
/// - `kind` selects the entity kind and, by default, the file suffix
/// - `domain-path` is a `/`-separated folder path (may be empty)
/// - `name` is the entity name, optionally suffixed with `#<field>`
///
/// `%20` in the domain path or name stands for a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Urn(String);

impl Urn {
    const NIL: &'static str = "element:core:nil";

    /// Create a new validated URN.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidUrn` unless the string splits on `:` into
    /// exactly three components with a valid kind, safe domain segments and a
    /// non-empty name.
    pub fn new(urn: impl Into<String>) -> Result<Self, TypeError> {
        let urn = urn.into();
        Self::validate(&urn)?;
        Ok(Self(urn))
    }

    /// The built-in nil element, `element:core:nil`.
    ///
    /// # Example
    ///
    /// ```
    /// use datathread::core::types::Urn;
    ///
    /// assert_eq!(Urn::nil().as_str(), "element:core:nil");
    /// ```
    pub fn nil() -> Self {
        Self(Self::NIL.to_string())
    }

    /// Build a URN from its parts.
    pub fn from_parts(kind: &str, domain: &str, name: &str) -> Result<Self, TypeError> {
        Self::new(format!("{kind}:{domain}:{name}"))
    }

    fn validate(urn: &str) -> Result<(), TypeError> {
        let invalid = |reason: &str| TypeError::InvalidUrn {
            urn: urn.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = urn.split(':').collect();
        if parts.len() != 3 {
            return Err(invalid("expected exactly three ':'-separated components"));
        }

        validate_kind(parts[0]).map_err(|_| invalid("kind must be [A-Za-z0-9_-]+"))?;

        for segment in unescape(parts[1]).split('/') {
            if segment == "." || segment == ".." {
                return Err(invalid("domain segments cannot be '.' or '..'"));
            }
            if segment.contains('\\') || segment.contains('\0') {
                return Err(invalid("domain segments cannot contain '\\' or NUL"));
            }
        }

        let name = parts[2];
        if name.is_empty() || name.starts_with('#') {
            return Err(invalid("name cannot be empty"));
        }
        let stem = unescape(name);
        if stem == "." || stem == ".." || stem.contains(['/', '\\', '\0']) {
            return Err(invalid("name cannot contain path separators"));
        }
        if name.matches('#').count() > 1 {
            return Err(invalid("name can carry at most one '#' field suffix"));
        }

        Ok(())
    }

    fn parts(&self) -> (&str, &str, &str) {
        let mut parts = self.0.splitn(3, ':');
        // validated: exactly three components
        let kind = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        let name = parts.next().unwrap_or_default();
        (kind, domain, name)
    }

    /// The entity kind (first component).
    pub fn kind(&self) -> &str {
        self.parts().0
    }

    /// The raw, still escaped domain path.
    pub fn domain(&self) -> &str {
        self.parts().1
    }

    /// The raw name component, including any `#<field>` suffix.
    pub fn name(&self) -> &str {
        self.parts().2
    }

    /// The name without its `#<field>` suffix.
    pub fn base_name(&self) -> &str {
        let name = self.name();
        name.split_once('#').map_or(name, |(base, _)| base)
    }

    /// The field suffix, if this is a field-scoped URN.
    ///
    /// # Example
    ///
    /// ```
    /// use datathread::core::types::Urn;
    ///
    /// let urn = Urn::new("element:sales:orders#amount").unwrap();
    /// assert_eq!(urn.field(), Some("amount"));
    /// assert_eq!(urn.base_name(), "orders");
    /// ```
    pub fn field(&self) -> Option<&str> {
        self.name().split_once('#').map(|(_, field)| field)
    }

    /// Unescaped, non-empty domain path segments.
    pub fn domain_segments(&self) -> Vec<String> {
        unescape(self.domain())
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The unescaped name used as the file stem.
    pub fn file_stem(&self) -> String {
        unescape(self.name())
    }

    /// The same domain and name under a different kind.
    pub fn with_kind(&self, kind: &str) -> Result<Self, TypeError> {
        Self::from_parts(kind, self.domain(), self.name())
    }

    /// A field-scoped URN of the given kind under this entity.
    ///
    /// # Example
    ///
    /// ```
    /// use datathread::core::types::Urn;
    ///
    /// let dataset = Urn::new("dataset:sales:orders").unwrap();
    /// let field = dataset.field_urn("field", "amount").unwrap();
    /// assert_eq!(field.as_str(), "field:sales:orders#amount");
    /// ```
    pub fn field_urn(&self, kind: &str, field: &str) -> Result<Self, TypeError> {
        Self::from_parts(kind, self.domain(), &format!("{}#{field}", self.base_name()))
    }

    /// Get the URN as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate an entity kind used as a file suffix.
pub fn validate_kind(kind: &str) -> Result<(), TypeError> {
    let valid = !kind.is_empty()
        && kind
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TypeError::InvalidKind(kind.to_string()))
    }
}

fn unescape(s: &str) -> String {
    s.replace("%20", " ")
}

impl TryFrom<String> for Urn {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl std::str::FromStr for Urn {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<Urn> for String {
    fn from(urn: Urn) -> Self {
        urn.0
    }
}

impl AsRef<str> for Urn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Urn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
