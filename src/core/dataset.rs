//! core::dataset
//!
//! Dataset and field schema.
//!
//! Stored datasets ([`DatasetDocument`]) list fields whose `element` is
//! absent, a URN string, or an inline element object. Inflated datasets
//! ([`Dataset`]) carry a concrete [`Element`] on every field.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::element::{Element, SchemaError};
use crate::core::types::Urn;

/// A dataset as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDocument {
    pub id: Urn,

    #[serde(default)]
    pub fields: Vec<FieldDocument>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A field as stored in a dataset or a field override document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDocument {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<FieldElement>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// How a stored field names its element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldElement {
    /// Explicit reference by URN.
    Urn(String),
    /// Inline element object.
    Inline(Map<String, Value>),
}

/// An inflated dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Urn,

    pub fields: Vec<Field>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An inflated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    pub element: Element,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parse a stored dataset document.
pub fn parse_dataset(value: Value) -> Result<DatasetDocument, SchemaError> {
    if !value.is_object() {
        return Err(SchemaError::NotAnObject { what: "dataset" });
    }
    serde_json::from_value(value).map_err(|e| SchemaError::InvalidValue(e.to_string()))
}

/// Parse a stored field (override) document.
pub fn parse_field(value: Value) -> Result<FieldDocument, SchemaError> {
    if !value.is_object() {
        return Err(SchemaError::NotAnObject { what: "field" });
    }
    serde_json::from_value(value).map_err(|e| SchemaError::InvalidValue(e.to_string()))
}
