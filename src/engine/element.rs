//! engine::element
//!
//! Element inflation.
//!
//! Inflating an element with a type:
//! - replaces every `Reference` target with the fully inflated element
//! - attaches the empty `Bool` placeholder to `Boolean` types
//! - attaches `info` from the `element_info` document when absent
//!
//! The discriminant label needs no work here: it is carried by the sum type
//! and written on serialization. An element without a type is returned
//! unchanged. Inflation is idempotent.

use serde_json::Value;
use tracing::debug;

use super::guard::ResolutionPath;
use super::{lineage, ResolveError};
use crate::core::config::DEFAULT_MAX_REFERENCE_DEPTH;
use crate::core::element::{
    parse_element, Element, ElementType, Payload, RefTarget, ReferenceType,
};
use crate::core::types::{kinds, Urn};
use crate::store::DocumentStore;

/// Resolves and inflates elements from a document store.
#[derive(Debug, Clone, Copy)]
pub struct ElementEngine<'a> {
    store: &'a dyn DocumentStore,
    max_depth: usize,
}

impl<'a> ElementEngine<'a> {
    /// Create an engine reading from `store`.
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            max_depth: DEFAULT_MAX_REFERENCE_DEPTH,
        }
    }

    /// Limit the length of reference chains.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &'a dyn DocumentStore {
        self.store
    }

    /// Maximum reference chain length.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Parse a stored element document.
    pub fn parse(doc: Value) -> Result<Element, ResolveError> {
        let id = doc
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();
        parse_element(doc).map_err(|e| ResolveError::from_schema(id, e))
    }

    /// Read an element without inflating it.
    ///
    /// A document without an `element_type` takes the type found by
    /// [`read_type`](Self::read_type), so every query sees the same type.
    pub fn read(&self, id: &Urn) -> Result<Option<Element>, ResolveError> {
        let Some(doc) = self.store.read(id, kinds::ELEMENT)? else {
            return Ok(None);
        };
        self.with_resolved_type(Self::parse(doc)?).map(Some)
    }

    /// Give an untyped element the type found by [`read_type`](Self::read_type).
    pub fn with_resolved_type(&self, mut element: Element) -> Result<Element, ResolveError> {
        if element.element_type.is_none() && !element.extra.contains_key("element_type") {
            element.element_type = self.read_type(&element.id)?;
        }
        Ok(element)
    }

    /// Resolve and inflate an element.
    ///
    /// Returns `Ok(None)` if no layer holds the element.
    pub fn get(&self, id: &Urn) -> Result<Option<Element>, ResolveError> {
        self.read(id)?.map(|element| self.inflate(element)).transpose()
    }

    /// Inflate every stored element.
    pub fn get_all(&self) -> Result<Vec<Element>, ResolveError> {
        self.store
            .find_all(&kinds::file_suffix(kinds::ELEMENT))?
            .into_iter()
            .map(|doc| self.inflate(self.with_resolved_type(Self::parse(doc)?)?))
            .collect()
    }

    /// Inflate an element.
    ///
    /// # Errors
    ///
    /// - `DanglingReference` if a reference target does not exist
    /// - `CyclicReference` if a reference chain loops back on itself
    /// - `DepthExceeded` if a reference chain is longer than the limit
    pub fn inflate(&self, element: Element) -> Result<Element, ResolveError> {
        let mut path = ResolutionPath::new(self.max_depth);
        self.inflate_within(element, &mut path)
    }

    fn inflate_within(
        &self,
        element: Element,
        path: &mut ResolutionPath,
    ) -> Result<Element, ResolveError> {
        let id = element.id.clone();
        path.scoped(&id, |path| self.inflate_body(element, path))
    }

    fn inflate_body(
        &self,
        mut element: Element,
        path: &mut ResolutionPath,
    ) -> Result<Element, ResolveError> {
        let Some(ty) = element.element_type.take() else {
            return Ok(element);
        };

        let ty = match ty {
            ElementType::Reference(reference) => {
                ElementType::Reference(self.inflate_reference(&element.id, reference, path)?)
            }
            ElementType::Boolean(mut boolean) => {
                boolean.bool.get_or_insert_with(Payload::new);
                ElementType::Boolean(boolean)
            }
            other => other,
        };
        element.element_type = Some(ty);

        if element.info.is_none() {
            element.info = self
                .store
                .read(&element.id, kinds::ELEMENT_INFO)?
                .filter(|info| !info.is_null());
        }

        Ok(element)
    }

    fn inflate_reference(
        &self,
        owner: &Urn,
        reference: ReferenceType,
        path: &mut ResolutionPath,
    ) -> Result<ReferenceType, ResolveError> {
        let target = match reference.target {
            RefTarget::Element(element) => *element,
            RefTarget::Urn(target) => {
                self.read(&target)?
                    .ok_or_else(|| ResolveError::DanglingReference {
                        id: owner.clone(),
                        target: target.clone(),
                    })?
            }
        };

        debug!(id = %owner, target = %target.id, "inflating reference");
        let target = self.inflate_within(target, path)?;

        Ok(ReferenceType {
            target: RefTarget::Element(Box::new(target)),
            extra: reference.extra,
        })
    }

    /// Type-only resolution: the stored `element_type` of `id`, if any.
    ///
    /// A stored type that is not an object counts as absent.
    pub fn read_type(&self, id: &Urn) -> Result<Option<ElementType>, ResolveError> {
        match self.store.read_member(id, kinds::ELEMENT, "element_type")? {
            Some(value @ Value::Object(_)) => ElementType::from_value(&value)
                .map(Some)
                .map_err(|e| ResolveError::from_schema(id.as_str(), e)),
            _ => Ok(None),
        }
    }

    /// Follow references from `id` to its terminal, non-reference type.
    ///
    /// Returns `Ok(None)` if the element is absent or untyped, or if the
    /// chain ends at an untyped element.
    ///
    /// # Errors
    ///
    /// `DanglingReference` if the chain ends at a missing element, plus the
    /// cycle and depth errors of [`inflate`](Self::inflate).
    pub fn find_base_type(&self, id: &Urn) -> Result<Option<ElementType>, ResolveError> {
        let Some(ty) = self.read_type(id)? else {
            return Ok(None);
        };
        let trace = lineage::trace(self, id, ty)?;
        if let Some(err) = trace.dangling {
            return Err(err);
        }
        Ok(trace
            .chain
            .into_iter()
            .last()
            .filter(|ty| ty.as_reference().is_none()))
    }

    /// The reference lineage of `element`.
    pub fn lineage(&self, element: &Element) -> Result<Vec<ElementType>, ResolveError> {
        lineage::lineage(self, element)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::element::TypeVariant;
    use super::*;
    use crate::store::FileStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, FileStore) {
        let temp = TempDir::new().expect("create temp dir");
        let store = FileStore::new("test", temp.path().to_path_buf());
        (temp, store)
    }

    fn put(store: &FileStore, kind: &str, doc: Value) {
        let id = Urn::new(doc["id"].as_str().unwrap()).unwrap();
        store.write(&id, kind, &doc).unwrap();
    }

    fn urn(s: &str) -> Urn {
        Urn::new(s).unwrap()
    }

    #[test]
    fn missing_element_is_none() {
        let (_temp, store) = setup();
        let engine = ElementEngine::new(&store);
        assert!(engine.get(&urn("element:d:nope")).unwrap().is_none());
    }

    #[test]
    fn untyped_element_is_unchanged() {
        let (_temp, store) = setup();
        put(&store, "element", json!({ "id": "element:d:a", "note": 1 }));
        put(&store, "element_info", json!({ "id": "element:d:a", "owner": "x" }));

        let element = ElementEngine::new(&store)
            .get(&urn("element:d:a"))
            .unwrap()
            .unwrap();
        assert!(element.element_type.is_none());
        assert!(element.info.is_none());
        assert_eq!(element.extra["note"], 1);
    }

    #[test]
    fn boolean_gets_placeholder() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:flag", "element_type": { "Boolean": {} } }),
        );

        let element = ElementEngine::new(&store)
            .get(&urn("element:d:flag"))
            .unwrap()
            .unwrap();
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["element_type"]["__typename"], "BooleanType");
        assert_eq!(json["element_type"]["Bool"], json!({}));
    }

    #[test]
    fn info_is_attached_only_when_absent() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Text": {} } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:d:b", "element_type": { "Text": {} }, "info": "kept" }),
        );
        put(&store, "element_info", json!({ "id": "element:d:a", "owner": "ops" }));
        put(&store, "element_info", json!({ "id": "element:d:b", "owner": "ops" }));

        let engine = ElementEngine::new(&store);
        let a = engine.get(&urn("element:d:a")).unwrap().unwrap();
        let b = engine.get(&urn("element:d:b")).unwrap().unwrap();
        assert_eq!(a.info.unwrap()["owner"], "ops");
        assert_eq!(b.info, Some(json!("kept")));
    }

    #[test]
    fn reference_is_replaced_by_target() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:b", "note": 1 } } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:d:b", "element_type": { "Number": {} } }),
        );

        let element = ElementEngine::new(&store)
            .get(&urn("element:d:a"))
            .unwrap()
            .unwrap();
        let reference = element.element_type.as_ref().unwrap().as_reference().unwrap();
        let target = reference.target.element().unwrap();
        assert_eq!(target.id, urn("element:d:b"));
        assert_eq!(
            target.element_type.as_ref().unwrap().variant(),
            TypeVariant::Number
        );
        assert_eq!(reference.extra["note"], 1);
    }

    #[test]
    fn dangling_reference_fails() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:gone" } } }),
        );

        let err = ElementEngine::new(&store)
            .get(&urn("element:d:a"))
            .unwrap_err();
        match err {
            ResolveError::DanglingReference { id, target } => {
                assert_eq!(id, urn("element:d:a"));
                assert_eq!(target, urn("element:d:gone"));
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:a" } } }),
        );

        let err = ElementEngine::new(&store)
            .get(&urn("element:d:a"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::CyclicReference { .. }));
    }

    #[test]
    fn long_chain_hits_depth_limit() {
        let (_temp, store) = setup();
        for i in 0..5 {
            put(
                &store,
                "element",
                json!({
                    "id": format!("element:d:e{i}"),
                    "element_type": { "Reference": { "ref": format!("element:d:e{}", i + 1) } }
                }),
            );
        }
        put(
            &store,
            "element",
            json!({ "id": "element:d:e5", "element_type": { "Number": {} } }),
        );

        let engine = ElementEngine::new(&store).with_max_depth(3);
        let err = engine.get(&urn("element:d:e0")).unwrap_err();
        assert!(matches!(err, ResolveError::DepthExceeded { limit: 3, .. }));

        let engine = ElementEngine::new(&store).with_max_depth(6);
        assert!(engine.get(&urn("element:d:e0")).is_ok());
    }

    #[test]
    fn inflate_is_idempotent() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:b" } } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:d:b", "element_type": { "Boolean": {} } }),
        );
        put(&store, "element_info", json!({ "id": "element:d:b", "owner": "ops" }));

        let engine = ElementEngine::new(&store);
        let once = engine.get(&urn("element:d:a")).unwrap().unwrap();
        let twice = engine.inflate(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn malformed_type_is_a_type_resolution_error() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Number": {}, "Text": {} } }),
        );

        let err = ElementEngine::new(&store)
            .get(&urn("element:d:a"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::TypeResolution { .. }));
    }

    #[test]
    fn base_type_follows_references() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:b" } } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:d:b", "element_type": { "Reference": { "ref": "element:d:c" } } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:d:c", "element_type": { "Date": {} } }),
        );

        let engine = ElementEngine::new(&store);
        let base = engine.find_base_type(&urn("element:d:a")).unwrap().unwrap();
        assert_eq!(base.variant(), TypeVariant::Date);
        assert!(engine.find_base_type(&urn("element:d:nope")).unwrap().is_none());
    }

    #[test]
    fn base_type_of_dangling_chain_fails() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:b" } } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:d:b", "element_type": { "Reference": { "ref": "element:d:gone" } } }),
        );

        let err = ElementEngine::new(&store)
            .find_base_type(&urn("element:d:a"))
            .unwrap_err();
        match err {
            ResolveError::DanglingReference { id, target } => {
                assert_eq!(id, urn("element:d:b"));
                assert_eq!(target, urn("element:d:gone"));
            }
            other => panic!("expected dangling reference, got {other:?}"),
        }
    }

    #[test]
    fn base_type_of_untyped_target_is_none() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Reference": { "ref": "element:d:b" } } }),
        );
        put(&store, "element", json!({ "id": "element:d:b" }));

        let engine = ElementEngine::new(&store);
        assert!(engine.find_base_type(&urn("element:d:a")).unwrap().is_none());
        assert!(engine.find_base_type(&urn("element:d:b")).unwrap().is_none());
    }

    #[test]
    fn get_all_inflates_every_element() {
        let (_temp, store) = setup();
        put(
            &store,
            "element",
            json!({ "id": "element:d:a", "element_type": { "Boolean": {} } }),
        );
        put(
            &store,
            "element",
            json!({ "id": "element:x/y:b", "element_type": { "Text": {} } }),
        );

        let all = ElementEngine::new(&store).get_all().unwrap();
        assert_eq!(all.len(), 2);
        let flag = all.iter().find(|e| e.id == urn("element:d:a")).unwrap();
        match flag.element_type.as_ref().unwrap() {
            ElementType::Boolean(b) => assert!(b.bool.is_some()),
            other => panic!("expected boolean, got {other:?}"),
        }
    }
}
