//! engine::dataset
//!
//! Dataset inflation: field overrides and field element resolution.
//!
//! For each field, in declaration order:
//! 1. A `field` document keyed `field:<domain>:<dataset>#<field>` replaces
//!    the stored field wholesale.
//! 2. The element is resolved by convention (`element:<domain>:<dataset>#<field>`)
//!    when absent, by id when it is a URN, or inflated in place when inline.
//! 3. A field still without an element gets the nil element.
//!
//! A field name that cannot form a URN has no override and no conventional
//! element; it still resolves through an explicit element or the nil element.

use serde_json::Value;
use tracing::{debug, warn};

use super::element::ElementEngine;
use super::ResolveError;
use crate::core::dataset::{
    parse_dataset, parse_field, Dataset, DatasetDocument, Field, FieldDocument, FieldElement,
};
use crate::core::element::{parse_element, Element};
use crate::core::types::{kinds, Urn};

/// Resolves and inflates datasets.
#[derive(Debug, Clone)]
pub struct DatasetEngine<'a> {
    elements: ElementEngine<'a>,
    nil_element: Urn,
}

impl<'a> DatasetEngine<'a> {
    /// Create an engine resolving field elements through `elements`.
    pub fn new(elements: ElementEngine<'a>) -> Self {
        Self {
            elements,
            nil_element: Urn::nil(),
        }
    }

    /// Use a different fallback element for untyped fields.
    pub fn with_nil_element(mut self, nil_element: Urn) -> Self {
        self.nil_element = nil_element;
        self
    }

    /// The fallback element id.
    pub fn nil_element(&self) -> &Urn {
        &self.nil_element
    }

    /// Parse a stored dataset document.
    pub fn parse(doc: Value) -> Result<DatasetDocument, ResolveError> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        parse_dataset(doc).map_err(|e| ResolveError::InvalidDocument {
            id,
            reason: e.to_string(),
        })
    }

    /// Resolve and inflate a dataset.
    ///
    /// Returns `Ok(None)` if no layer holds the dataset.
    pub fn get(&self, id: &Urn) -> Result<Option<Dataset>, ResolveError> {
        self.elements
            .store()
            .read(id, kinds::DATASET)?
            .map(|doc| self.inflate(Self::parse(doc)?))
            .transpose()
    }

    /// Inflate every stored dataset.
    pub fn get_all(&self) -> Result<Vec<Dataset>, ResolveError> {
        self.elements
            .store()
            .find_all(&kinds::file_suffix(kinds::DATASET))?
            .into_iter()
            .map(|doc| self.inflate(Self::parse(doc)?))
            .collect()
    }

    /// Inflate a stored dataset.
    ///
    /// Every field of the result carries an element.
    ///
    /// # Errors
    ///
    /// Any element resolution error, or `MissingNilElement` if a field
    /// needs the nil element and it does not exist.
    pub fn inflate(&self, dataset: DatasetDocument) -> Result<Dataset, ResolveError> {
        let fields = dataset
            .fields
            .into_iter()
            .map(|field| self.inflate_field(&dataset.id, field))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Dataset {
            id: dataset.id,
            fields,
            extra: dataset.extra,
        })
    }

    fn inflate_field(&self, dataset: &Urn, field: FieldDocument) -> Result<Field, ResolveError> {
        let field = self.apply_override(dataset, field)?;

        let element = match field.element {
            None => match dataset.field_urn(kinds::ELEMENT, &field.name) {
                Ok(implicit) => self.elements.get(&implicit)?,
                Err(e) => {
                    warn!(dataset = %dataset, field = %field.name, error = %e, "field name cannot form an element URN");
                    None
                }
            },
            Some(FieldElement::Urn(urn)) => self.elements.get(&Urn::new(urn)?)?,
            Some(FieldElement::Inline(mut inline)) => {
                if !inline.contains_key("id") {
                    let implicit = dataset.field_urn(kinds::ELEMENT, &field.name)?;
                    inline.insert("id".to_string(), Value::String(implicit.to_string()));
                }
                let id = inline
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or("<unknown>")
                    .to_string();
                let element = parse_element(Value::Object(inline))
                    .map_err(|e| ResolveError::from_schema(id, e))?;
                Some(self.elements.inflate(element)?)
            }
        };

        let element = match element {
            Some(element) => element,
            None => self.nil(dataset, &field.name)?,
        };

        Ok(Field {
            name: field.name,
            element,
            extra: field.extra,
        })
    }

    fn apply_override(
        &self,
        dataset: &Urn,
        field: FieldDocument,
    ) -> Result<FieldDocument, ResolveError> {
        let override_id = match dataset.field_urn(kinds::FIELD, &field.name) {
            Ok(id) => id,
            Err(e) => {
                warn!(dataset = %dataset, field = %field.name, error = %e, "field name cannot form an override URN");
                return Ok(field);
            }
        };
        let mut doc = match self.elements.store().read(&override_id, kinds::FIELD)? {
            Some(Value::Object(doc)) => doc,
            Some(_) => {
                warn!(id = %override_id, "ignoring field override that is not an object");
                return Ok(field);
            }
            None => return Ok(field),
        };

        debug!(dataset = %dataset, field = %field.name, "applying field override");
        doc.entry("name")
            .or_insert_with(|| Value::String(field.name.clone()));
        parse_field(Value::Object(doc)).map_err(|e| ResolveError::InvalidDocument {
            id: override_id.to_string(),
            reason: e.to_string(),
        })
    }

    fn nil(&self, dataset: &Urn, field: &str) -> Result<Element, ResolveError> {
        debug!(dataset = %dataset, field, nil = %self.nil_element, "using nil element");
        self.elements
            .get(&self.nil_element)?
            .ok_or_else(|| ResolveError::MissingNilElement {
                id: self.nil_element.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, FileStore};
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileStore::new("test", temp.path().to_path_buf());
        store
            .write(
                &Urn::nil(),
                "element",
                &json!({ "id": "element:core:nil", "element_type": { "Text": {} } }),
            )
            .unwrap();
        (temp, store)
    }

    fn put(store: &FileStore, id: &str, kind: &str, doc: Value) {
        store.write(&Urn::new(id).unwrap(), kind, &doc).unwrap();
    }

    fn orders(fields: Value) -> Value {
        json!({ "id": "dataset:sales:orders", "fields": fields })
    }

    fn inflate(store: &FileStore) -> Dataset {
        DatasetEngine::new(ElementEngine::new(store))
            .get(&Urn::new("dataset:sales:orders").unwrap())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn missing_dataset_is_none() {
        let (_temp, store) = setup();
        let engine = DatasetEngine::new(ElementEngine::new(&store));
        assert!(engine
            .get(&Urn::new("dataset:sales:nope").unwrap())
            .unwrap()
            .is_none());
    }

    #[test]
    fn implicit_element_by_convention() {
        let (_temp, store) = setup();
        put(&store, "dataset:sales:orders", "dataset", orders(json!([{ "name": "amount" }])));
        put(
            &store,
            "element:sales:orders#amount",
            "element",
            json!({ "id": "element:sales:orders#amount", "element_type": { "Number": {} } }),
        );

        let dataset = inflate(&store);
        assert_eq!(dataset.fields[0].element.id.as_str(), "element:sales:orders#amount");
    }

    #[test]
    fn urn_element_is_resolved() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([{ "name": "currency", "element": "element:core:currency" }])),
        );
        put(
            &store,
            "element:core:currency",
            "element",
            json!({ "id": "element:core:currency", "element_type": { "Enum": {} } }),
        );

        let dataset = inflate(&store);
        assert_eq!(dataset.fields[0].element.id.as_str(), "element:core:currency");
    }

    #[test]
    fn inline_element_is_inflated_with_implicit_id() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([{ "name": "paid", "element": { "element_type": { "Boolean": {} } } }])),
        );

        let dataset = inflate(&store);
        let element = &dataset.fields[0].element;
        assert_eq!(element.id.as_str(), "element:sales:orders#paid");
        let json = serde_json::to_value(element).unwrap();
        assert_eq!(json["element_type"]["Bool"], json!({}));
    }

    #[test]
    fn unresolved_field_falls_back_to_nil() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([
                { "name": "note" },
                { "name": "other", "element": "element:core:missing" }
            ])),
        );

        let dataset = inflate(&store);
        for field in &dataset.fields {
            assert_eq!(field.element.id, Urn::nil());
        }
    }

    #[test]
    fn override_replaces_field() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([{ "name": "amount", "description": "stored" }])),
        );
        put(
            &store,
            "field:sales:orders#amount",
            "field",
            json!({ "name": "amount", "element": "element:core:money", "description": "override" }),
        );
        put(
            &store,
            "element:core:money",
            "element",
            json!({ "id": "element:core:money", "element_type": { "Number": {} } }),
        );

        let dataset = inflate(&store);
        let field = &dataset.fields[0];
        assert_eq!(field.element.id.as_str(), "element:core:money");
        assert_eq!(field.extra["description"], "override");
    }

    #[test]
    fn non_object_override_is_ignored() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([{ "name": "amount", "element": "element:core:nil" }])),
        );
        put(&store, "field:sales:orders#amount", "field", json!("bogus"));

        let dataset = inflate(&store);
        assert_eq!(dataset.fields[0].name, "amount");
        assert_eq!(dataset.fields[0].element.id.as_str(), "element:core:nil");
    }

    #[test]
    fn override_without_name_keeps_declared_name() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([{ "name": "amount" }])),
        );
        put(
            &store,
            "field:sales:orders#amount",
            "field",
            json!({ "element": "element:core:nil" }),
        );

        let dataset = inflate(&store);
        assert_eq!(dataset.fields[0].name, "amount");
        assert_eq!(dataset.fields[0].element.id.as_str(), "element:core:nil");
    }

    #[test]
    fn unaddressable_field_names_still_resolve() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([
                { "name": "amount", "element": "element:core:money" },
                { "name": "price/unit", "element": "element:core:money" },
                { "name": "a/b" }
            ])),
        );
        put(
            &store,
            "element:core:money",
            "element",
            json!({ "id": "element:core:money", "element_type": { "Number": {} } }),
        );

        let dataset = inflate(&store);
        assert_eq!(dataset.fields.len(), 3);
        assert_eq!(dataset.fields[0].element.id.as_str(), "element:core:money");
        assert_eq!(dataset.fields[1].name, "price/unit");
        assert_eq!(dataset.fields[1].element.id.as_str(), "element:core:money");
        assert_eq!(dataset.fields[2].element.id, Urn::nil());
    }

    #[test]
    fn fields_keep_declaration_order() {
        let (_temp, store) = setup();
        put(
            &store,
            "dataset:sales:orders",
            "dataset",
            orders(json!([{ "name": "z" }, { "name": "a" }, { "name": "m" }])),
        );

        let names: Vec<String> = inflate(&store).fields.into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["z", "a", "m"]);
    }

    #[test]
    fn missing_nil_element_is_an_error() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new("test", temp.path().to_path_buf());
        put(&store, "dataset:sales:orders", "dataset", orders(json!([{ "name": "x" }])));

        let err = DatasetEngine::new(ElementEngine::new(&store))
            .get(&Urn::new("dataset:sales:orders").unwrap())
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingNilElement { .. }));
    }

    #[test]
    fn configured_nil_element() {
        let (_temp, store) = setup();
        put(&store, "dataset:sales:orders", "dataset", orders(json!([{ "name": "x" }])));
        put(
            &store,
            "element:core:unknown",
            "element",
            json!({ "id": "element:core:unknown" }),
        );

        let dataset = DatasetEngine::new(ElementEngine::new(&store))
            .with_nil_element(Urn::new("element:core:unknown").unwrap())
            .get(&Urn::new("dataset:sales:orders").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(dataset.fields[0].element.id.as_str(), "element:core:unknown");
    }

    #[test]
    fn get_all_inflates_every_dataset() {
        let (_temp, store) = setup();
        put(&store, "dataset:sales:orders", "dataset", orders(json!([{ "name": "x" }])));
        put(
            &store,
            "dataset:hr:staff",
            "dataset",
            json!({ "id": "dataset:hr:staff", "fields": [] }),
        );

        let all = DatasetEngine::new(ElementEngine::new(&store)).get_all().unwrap();
        assert_eq!(all.len(), 2);
    }
}
