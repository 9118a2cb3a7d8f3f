//! core::element
//!
//! Element schema and the element type sum type.
//!
//! # Schema Design
//!
//! An element document is `{ id, element_type?, info?, ... }`. The stored
//! `element_type` is an object with exactly one variant key:
//!
//! ```json
//! { "element_type": { "Number": { "precision": 2 } } }
//! ```
//!
//! Parsing turns that object into an [`ElementType`] and rejects zero or
//! several variant keys at this boundary, so inflation code never inspects
//! raw keys. Serialization always writes the discriminant back:
//!
//! ```json
//! { "element_type": { "Number": { "precision": 2 }, "__typename": "NumberType" } }
//! ```
//!
//! Members the schema does not name are kept verbatim in `extra` maps and
//! written back unchanged. That includes unknown members next to the variant
//! key of a stored `element_type`, which an [`Element`] keeps in
//! `type_extra`.
//!
//! # Example
//!
//! ```
//! use datathread::core::element::{parse_element, TypeVariant};
//! use serde_json::json;
//!
//! let element = parse_element(json!({
//!     "id": "element:sales:amount",
//!     "element_type": { "Number": { "precision": 2 } }
//! }))
//! .unwrap();
//!
//! let ty = element.element_type.as_ref().unwrap();
//! assert_eq!(ty.variant(), TypeVariant::Number);
//! assert_eq!(ty.typename(), "NumberType");
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::types::{TypeError, Urn};

/// Free-form JSON object payload.
pub type Payload = Map<String, Value>;

/// Member carrying the explicit discriminant label.
pub const TYPENAME_KEY: &str = "__typename";

/// Member carrying the boolean-specific payload placeholder.
pub const BOOL_KEY: &str = "Bool";

/// Member of a `Reference` payload naming its target.
pub const REF_KEY: &str = "ref";

/// Errors from element, dataset and field schema parsing.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("{what} must be a JSON object")]
    NotAnObject { what: &'static str },

    #[error("{what} is missing required member '{member}'")]
    MissingMember {
        what: &'static str,
        member: &'static str,
    },

    #[error("element type has no recognized variant (members: {found:?})")]
    NoVariant { found: Vec<String> },

    #[error("element type has several variants: {found:?}")]
    MultipleVariants { found: Vec<String> },

    #[error("discriminant '{found}' does not match variant '{variant}'")]
    TypenameMismatch { variant: &'static str, found: String },

    #[error("invalid '{variant}' payload: {reason}")]
    InvalidPayload {
        variant: &'static str,
        reason: String,
    },

    #[error("invalid document: {0}")]
    InvalidValue(String),

    #[error("type validation failed: {0}")]
    TypeError(#[from] TypeError),
}

impl SchemaError {
    /// True when the error concerns the element type union itself.
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            SchemaError::NoVariant { .. }
                | SchemaError::MultipleVariants { .. }
                | SchemaError::TypenameMismatch { .. }
                | SchemaError::InvalidPayload { .. }
        )
    }
}

/// The variant keys an element type can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeVariant {
    Number,
    Text,
    Date,
    Time,
    DateTime,
    Boolean,
    Enum,
    Reference,
    Record,
}

impl TypeVariant {
    /// All variants in discriminant lookup order.
    pub const ALL: [TypeVariant; 9] = [
        TypeVariant::Number,
        TypeVariant::Reference,
        TypeVariant::Text,
        TypeVariant::Date,
        TypeVariant::Time,
        TypeVariant::DateTime,
        TypeVariant::Boolean,
        TypeVariant::Enum,
        TypeVariant::Record,
    ];

    /// The stored variant key.
    pub fn key(self) -> &'static str {
        match self {
            TypeVariant::Number => "Number",
            TypeVariant::Text => "Text",
            TypeVariant::Date => "Date",
            TypeVariant::Time => "Time",
            TypeVariant::DateTime => "DateTime",
            TypeVariant::Boolean => "Boolean",
            TypeVariant::Enum => "Enum",
            TypeVariant::Reference => "Reference",
            TypeVariant::Record => "Record",
        }
    }

    /// The explicit discriminant label.
    pub fn typename(self) -> &'static str {
        match self {
            TypeVariant::Number => "NumberType",
            TypeVariant::Text => "TextType",
            TypeVariant::Date => "DateType",
            TypeVariant::Time => "TimeType",
            TypeVariant::DateTime => "DateTimeType",
            TypeVariant::Boolean => "BooleanType",
            TypeVariant::Enum => "EnumType",
            TypeVariant::Reference => "ReferenceType",
            TypeVariant::Record => "RecordType",
        }
    }

    /// Look up a variant by its stored key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.key() == key)
    }
}

impl std::fmt::Display for TypeVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The element type tagged union.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Number(Payload),
    Text(Payload),
    Date(Payload),
    Time(Payload),
    DateTime(Payload),
    Boolean(BooleanType),
    Enum(Payload),
    Reference(ReferenceType),
    Record(Payload),
}

/// Boolean payload plus the placeholder attached during inflation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooleanType {
    pub payload: Payload,
    /// Boolean-specific payload, `Some` once inflated.
    pub bool: Option<Payload>,
}

/// A reference to another element.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceType {
    pub target: RefTarget,
    /// Payload members other than `ref`.
    pub extra: Payload,
}

impl ReferenceType {
    /// A reference to the given URN.
    pub fn to(target: Urn) -> Self {
        Self {
            target: RefTarget::Urn(target),
            extra: Payload::new(),
        }
    }
}

/// The target of a reference: a URN before inflation, an element after.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RefTarget {
    Urn(Urn),
    Element(Box<Element>),
}

impl RefTarget {
    /// The id of the referenced element.
    pub fn id(&self) -> &Urn {
        match self {
            RefTarget::Urn(urn) => urn,
            RefTarget::Element(element) => &element.id,
        }
    }

    /// The embedded element, if the reference has been inflated.
    pub fn element(&self) -> Option<&Element> {
        match self {
            RefTarget::Urn(_) => None,
            RefTarget::Element(element) => Some(element),
        }
    }
}

impl ElementType {
    /// The variant of this type.
    pub fn variant(&self) -> TypeVariant {
        match self {
            ElementType::Number(_) => TypeVariant::Number,
            ElementType::Text(_) => TypeVariant::Text,
            ElementType::Date(_) => TypeVariant::Date,
            ElementType::Time(_) => TypeVariant::Time,
            ElementType::DateTime(_) => TypeVariant::DateTime,
            ElementType::Boolean(_) => TypeVariant::Boolean,
            ElementType::Enum(_) => TypeVariant::Enum,
            ElementType::Reference(_) => TypeVariant::Reference,
            ElementType::Record(_) => TypeVariant::Record,
        }
    }

    /// The explicit discriminant label.
    pub fn typename(&self) -> &'static str {
        self.variant().typename()
    }

    /// The reference payload, if this is a `Reference`.
    pub fn as_reference(&self) -> Option<&ReferenceType> {
        match self {
            ElementType::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Parse a stored element type object, dropping unknown sibling members.
    ///
    /// # Errors
    ///
    /// Returns an error when the value is not an object, carries zero or
    /// several variant keys or a `__typename` for another variant, or when
    /// the payload is malformed.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        Self::parse_with_siblings(value).map(|(ty, _)| ty)
    }

    /// Parse a stored element type object, returning the members next to
    /// the variant key that the schema does not name.
    ///
    /// `Bool` is only part of the type next to `Boolean`; anywhere else it
    /// is an ordinary sibling.
    ///
    /// # Errors
    ///
    /// As [`from_value`](Self::from_value).
    pub fn parse_with_siblings(value: &Value) -> Result<(Self, Payload), SchemaError> {
        let map = value.as_object().ok_or(SchemaError::NotAnObject {
            what: "element type",
        })?;

        let found: Vec<TypeVariant> = map
            .keys()
            .filter_map(|key| TypeVariant::from_key(key))
            .collect();
        let variant = match found.as_slice() {
            [variant] => *variant,
            [] => {
                return Err(SchemaError::NoVariant {
                    found: map.keys().cloned().collect(),
                })
            }
            _ => {
                return Err(SchemaError::MultipleVariants {
                    found: found.iter().map(|v| v.key().to_string()).collect(),
                })
            }
        };

        let mut bool_payload = None;
        let mut siblings = Payload::new();
        for (key, member) in map {
            match key.as_str() {
                k if k == variant.key() => {}
                TYPENAME_KEY => {
                    if member.as_str() != Some(variant.typename()) {
                        return Err(SchemaError::TypenameMismatch {
                            variant: variant.key(),
                            found: member.to_string(),
                        });
                    }
                }
                BOOL_KEY if variant == TypeVariant::Boolean => {
                    bool_payload = Some(object_payload(variant, member)?);
                }
                _ => {
                    siblings.insert(key.clone(), member.clone());
                }
            }
        }

        let payload = object_payload(variant, &map[variant.key()])?;
        let ty = match variant {
            TypeVariant::Number => ElementType::Number(payload),
            TypeVariant::Text => ElementType::Text(payload),
            TypeVariant::Date => ElementType::Date(payload),
            TypeVariant::Time => ElementType::Time(payload),
            TypeVariant::DateTime => ElementType::DateTime(payload),
            TypeVariant::Enum => ElementType::Enum(payload),
            TypeVariant::Record => ElementType::Record(payload),
            TypeVariant::Boolean => ElementType::Boolean(BooleanType {
                payload,
                bool: bool_payload,
            }),
            TypeVariant::Reference => ElementType::Reference(parse_reference(payload)?),
        };

        Ok((ty, siblings))
    }

    fn serialize_entries<M: SerializeMap>(
        &self,
        map: &mut M,
        siblings: &Payload,
    ) -> Result<(), M::Error> {
        let key = self.variant().key();
        match self {
            ElementType::Number(p)
            | ElementType::Text(p)
            | ElementType::Date(p)
            | ElementType::Time(p)
            | ElementType::DateTime(p)
            | ElementType::Enum(p)
            | ElementType::Record(p) => map.serialize_entry(key, p)?,
            ElementType::Boolean(boolean) => {
                map.serialize_entry(key, &boolean.payload)?;
                if let Some(placeholder) = &boolean.bool {
                    map.serialize_entry(BOOL_KEY, placeholder)?;
                }
            }
            ElementType::Reference(reference) => map.serialize_entry(
                key,
                &ReferenceRepr {
                    target: &reference.target,
                    extra: &reference.extra,
                },
            )?,
        }
        for (member, value) in siblings {
            map.serialize_entry(member, value)?;
        }
        map.serialize_entry(TYPENAME_KEY, self.typename())
    }
}

fn object_payload(variant: TypeVariant, value: &Value) -> Result<Payload, SchemaError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Payload::new()),
        other => Err(SchemaError::InvalidPayload {
            variant: variant.key(),
            reason: format!("expected an object, found {other}"),
        }),
    }
}

fn parse_reference(mut payload: Payload) -> Result<ReferenceType, SchemaError> {
    let invalid = |reason: String| SchemaError::InvalidPayload {
        variant: TypeVariant::Reference.key(),
        reason,
    };

    let target = match payload.remove(REF_KEY) {
        Some(Value::String(urn)) => RefTarget::Urn(Urn::new(urn)?),
        Some(value @ Value::Object(_)) => RefTarget::Element(Box::new(
            parse_element(value).map_err(|e| invalid(format!("embedded element: {e}")))?,
        )),
        Some(other) => return Err(invalid(format!("'ref' must be a URN or element, found {other}"))),
        None => return Err(invalid("missing 'ref'".to_string())),
    };

    Ok(ReferenceType {
        target,
        extra: payload,
    })
}

#[derive(Serialize)]
struct ReferenceRepr<'a> {
    #[serde(rename = "ref")]
    target: &'a RefTarget,
    #[serde(flatten)]
    extra: &'a Payload,
}

impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.serialize_entries(&mut map, &Payload::new())?;
        map.end()
    }
}

/// An element type written together with its stored siblings.
struct TypeWithSiblings<'a> {
    ty: &'a ElementType,
    siblings: &'a Payload,
}

impl Serialize for TypeWithSiblings<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        self.ty.serialize_entries(&mut map, self.siblings)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for ElementType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ElementType::from_value(&value).map_err(D::Error::custom)
    }
}

/// A metadata element.
///
/// Use [`parse_element`] to parse a stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: Urn,

    pub element_type: Option<ElementType>,

    /// Unknown members stored next to the variant key of `element_type`.
    pub type_extra: Payload,

    /// External metadata, attached from the `element_info` document.
    pub info: Option<Value>,

    /// Reference lineage, attached at query level.
    pub lineage: Option<Vec<ElementType>>,

    /// Members not named by the schema, kept verbatim.
    pub extra: Map<String, Value>,
}

impl Element {
    /// Create an element with the given id and type.
    pub fn new(id: Urn, element_type: Option<ElementType>) -> Self {
        Self {
            id,
            element_type,
            type_extra: Payload::new(),
            info: None,
            lineage: None,
            extra: Map::new(),
        }
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        if let Some(ty) = &self.element_type {
            map.serialize_entry(
                "element_type",
                &TypeWithSiblings {
                    ty,
                    siblings: &self.type_extra,
                },
            )?;
        }
        if let Some(info) = &self.info {
            map.serialize_entry("info", info)?;
        }
        if let Some(lineage) = &self.lineage {
            map.serialize_entry("lineage", lineage)?;
        }
        for (member, value) in &self.extra {
            map.serialize_entry(member, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_element(value).map_err(D::Error::custom)
    }
}

/// Parse a stored element document.
///
/// An `element_type` that is not an object is not a type: it is kept
/// verbatim among the extra members and `element_type` is `None`. A `null`
/// `info` counts as absent.
///
/// # Errors
///
/// Returns an error if the document is not an object, has no valid `id`,
/// or carries a malformed element type.
pub fn parse_element(value: Value) -> Result<Element, SchemaError> {
    let Value::Object(mut map) = value else {
        return Err(SchemaError::NotAnObject { what: "element" });
    };

    let id = match map.remove("id") {
        Some(Value::String(id)) => Urn::new(id)?,
        Some(other) => {
            return Err(SchemaError::InvalidValue(format!(
                "element id must be a string, found {other}"
            )))
        }
        None => {
            return Err(SchemaError::MissingMember {
                what: "element",
                member: "id",
            })
        }
    };

    let (element_type, type_extra) = match map.remove("element_type") {
        Some(value @ Value::Object(_)) => {
            let (ty, siblings) = ElementType::parse_with_siblings(&value)?;
            (Some(ty), siblings)
        }
        Some(Value::Null) | None => (None, Payload::new()),
        Some(other) => {
            map.insert("element_type".to_string(), other);
            (None, Payload::new())
        }
    };

    let info = match map.remove("info") {
        Some(Value::Null) | None => None,
        Some(info) => Some(info),
    };

    let lineage = match map.remove("lineage") {
        Some(Value::Array(entries)) => Some(
            entries
                .iter()
                .map(ElementType::from_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(SchemaError::InvalidValue(format!(
                "lineage must be an array, found {other}"
            )))
        }
    };

    Ok(Element {
        id,
        element_type,
        type_extra,
        info,
        lineage,
        extra: map,
    })
}
