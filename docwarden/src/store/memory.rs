use crate::collection::Document;
use crate::common::{atomic, Atomic, ReadExecutor, Value, WriteExecutor};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::filter::{is_all_filter, Filter};
use crate::store::{
    apply_update_patch, run_pipeline, AggregateStage, DocumentCursor, FindOptions, StoreBinding,
    StoreBindingProvider, StoreProvider,
};
use dashmap::DashMap;
use indexmap::IndexMap;
use std::sync::Arc;

type DocumentMap = Atomic<IndexMap<Value, Document>>;

/// In-memory document store.
///
/// Holds any number of named collections, each an insertion-ordered map from
/// id to document. Suitable for tests and for data that does not need to
/// outlive the process. Cloning is cheap and clones share the same data.
///
/// # Usage
///
/// ```text
/// let store = MemoryStore::new();
/// let users: Collection<User> = Collection::builder().build(&store)?;
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            inner: Arc::new(MemoryStoreInner::new()),
        }
    }

    /// Names of every collection opened so far, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        self.inner.collection_names()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains_key(name)
    }

    /// Drops a collection and all of its documents. Returns whether it
    /// existed. Bindings already handed out keep working on the dropped data.
    pub fn drop_collection(&self, name: &str) -> bool {
        self.inner.collections.remove(name).is_some()
    }
}

impl StoreProvider for MemoryStore {
    fn open_binding(&self, name: &str, id_field: &str) -> WardenResult<StoreBinding> {
        self.inner.open_binding(name, id_field)
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    collections: DashMap<String, DocumentMap>,
}

impl MemoryStoreInner {
    fn new() -> Self {
        MemoryStoreInner {
            collections: DashMap::new(),
        }
    }

    fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    fn open_binding(&self, name: &str, id_field: &str) -> WardenResult<StoreBinding> {
        if name.is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(WardenError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        if id_field.is_empty() {
            log::error!("Id field of collection {} cannot be empty", name);
            return Err(WardenError::new(
                &format!("Id field of collection {} cannot be empty", name),
                ErrorKind::InvalidOperation,
            ));
        }

        let data = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| atomic(IndexMap::new()))
            .clone();

        Ok(StoreBinding::new(MemoryBinding {
            name: name.to_string(),
            id_field: id_field.to_string(),
            data,
        }))
    }
}

/// Binding of one in-memory collection.
///
/// Documents match in insertion order. Inserting a document without an id
/// assigns a random UUID string.
pub struct MemoryBinding {
    name: String,
    id_field: String,
    data: DocumentMap,
}

impl MemoryBinding {
    fn id_of(&self, document: &Document) -> WardenResult<Value> {
        let id = document.get(&self.id_field)?;
        if id.is_null() {
            log::error!("Document in {} has no {} field", self.name, self.id_field);
            return Err(WardenError::new(
                &format!("Document in {} has no {} field", self.name, self.id_field),
                ErrorKind::InvalidId,
            ));
        }
        Ok(id)
    }

    fn matching(&self, filter: &Filter) -> WardenResult<Vec<Document>> {
        // direct fetch when the filter pins the id
        if let Some(id) = filter.equality_on(&self.id_field) {
            return match self.data.read_with(|map| map.get(&id).cloned()) {
                Some(document) if filter.apply(&document)? => Ok(vec![document]),
                _ => Ok(vec![]),
            };
        }

        let snapshot: Vec<Document> = self.data.read_with(|map| map.values().cloned().collect());
        if is_all_filter(filter) {
            return Ok(snapshot);
        }

        let mut matched = Vec::new();
        for document in snapshot {
            if filter.apply(&document)? {
                matched.push(document);
            }
        }
        Ok(matched)
    }
}

impl StoreBindingProvider for MemoryBinding {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn id_field(&self) -> String {
        self.id_field.clone()
    }

    fn resolve_ids(&self, filter: &Filter, limit: Option<usize>) -> WardenResult<Vec<Value>> {
        let matched = self.matching(filter)?;
        let limit = limit.unwrap_or(usize::MAX);
        matched
            .iter()
            .take(limit)
            .map(|document| self.id_of(document))
            .collect()
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> WardenResult<DocumentCursor> {
        let skip = options.get_skip().unwrap_or(0);
        let limit = options.get_limit().unwrap_or(usize::MAX);
        let projection = options.get_projection().cloned();
        let id_field = self.id_field.clone();

        let project = move |document: Document| match &projection {
            Some(projection) => projection.apply(&document, &id_field),
            None => Ok(document),
        };

        if options.get_sort_by().is_empty() {
            // no sort, so filtering can stay lazy over a snapshot
            let snapshot: Vec<Document> =
                self.data.read_with(|map| map.values().cloned().collect());
            let filter = filter.clone();
            let cursor = snapshot
                .into_iter()
                .filter_map(move |document| match filter.apply(&document) {
                    Ok(true) => Some(Ok(document)),
                    Ok(false) => None,
                    Err(e) => Some(Err(e)),
                })
                .skip(skip)
                .take(limit)
                .map(move |result| result.and_then(&project));
            return Ok(Box::new(cursor));
        }

        let mut matched = self.matching(filter)?;
        options.sort(&mut matched)?;
        let cursor = matched.into_iter().skip(skip).take(limit).map(project);
        Ok(Box::new(cursor))
    }

    fn load_by_id(&self, id: &Value) -> WardenResult<Option<Document>> {
        Ok(self.data.read_with(|map| map.get(id).cloned()))
    }

    fn apply_patch(&self, document: &mut Document, patch: &Document) -> WardenResult<()> {
        let id = document.get(&self.id_field)?;
        apply_update_patch(document, patch)?;
        if document.get(&self.id_field)? != id {
            log::error!("Patch cannot change the {} of a document in {}", self.id_field, self.name);
            return Err(WardenError::new(
                &format!("Patch cannot change the {} of a document", self.id_field),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn persist_insert(&self, document: Document) -> WardenResult<Document> {
        let mut document = document;
        if document.get(&self.id_field)?.is_null() {
            document.put(&self.id_field, uuid::Uuid::new_v4().to_string())?;
        }
        let id = self.id_of(&document)?;

        self.data.write_with(|map| {
            if map.contains_key(&id) {
                log::error!("Duplicate id {} in collection {}", id, self.name);
                return Err(WardenError::new(
                    &format!("Document with id {} already exists in {}", id, self.name),
                    ErrorKind::StoreError,
                ));
            }
            map.insert(id, document.clone());
            Ok(document)
        })
    }

    fn persist_update(&self, document: Document) -> WardenResult<Document> {
        let id = self.id_of(&document)?;
        self.data.write_with(|map| match map.get_mut(&id) {
            Some(stored) => {
                *stored = document.clone();
                Ok(document)
            }
            None => {
                log::error!("No document with id {} to update in {}", id, self.name);
                Err(WardenError::new(
                    &format!("No document with id {} to update in {}", id, self.name),
                    ErrorKind::StoreError,
                ))
            }
        })
    }

    fn persist_delete(&self, id: &Value) -> WardenResult<()> {
        match self.data.write_with(|map| map.shift_remove(id)) {
            Some(_) => Ok(()),
            None => {
                log::error!("No document with id {} to delete in {}", id, self.name);
                Err(WardenError::new(
                    &format!("No document with id {} to delete in {}", id, self.name),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    fn run_aggregate(&self, stages: &[AggregateStage]) -> WardenResult<Vec<Document>> {
        let snapshot: Vec<Document> = self.data.read_with(|map| map.values().cloned().collect());
        run_pipeline(snapshot, stages, &self.id_field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SortOrder;
    use crate::doc;
    use crate::filter::{all, by_id, field};
    use crate::store::{find_options, Projection};

    fn binding() -> StoreBinding {
        MemoryStore::new().open_binding("people", "id").unwrap()
    }

    fn seeded() -> StoreBinding {
        let binding = binding();
        binding.persist_insert(doc! { id: "a", age: 30, city: "Paris" }).unwrap();
        binding.persist_insert(doc! { id: "b", age: 20, city: "Rome" }).unwrap();
        binding.persist_insert(doc! { id: "c", age: 40, city: "Paris" }).unwrap();
        binding
    }

    fn ids(cursor: DocumentCursor) -> Vec<Value> {
        cursor.map(|d| d.unwrap().get("id").unwrap()).collect()
    }

    #[test]
    fn test_open_binding_validates_names() {
        let store = MemoryStore::new();
        assert!(store.open_binding("", "id").is_err());
        assert!(store.open_binding("x", "").is_err());
    }

    #[test]
    fn test_bindings_share_collection_data() {
        let store = MemoryStore::new();
        let first = store.open_binding("people", "id").unwrap();
        let second = store.open_binding("people", "id").unwrap();
        first.persist_insert(doc! { id: 1 }).unwrap();
        assert!(second.load_by_id(&Value::from(1)).unwrap().is_some());
        assert_eq!(store.collection_names(), vec!["people".to_string()]);
    }

    #[test]
    fn test_drop_collection() {
        let store = MemoryStore::new();
        store.open_binding("people", "id").unwrap();
        assert!(store.has_collection("people"));
        assert!(store.drop_collection("people"));
        assert!(!store.drop_collection("people"));
        assert!(store.collection_names().is_empty());
    }

    #[test]
    fn test_insert_assigns_uuid_when_id_missing() {
        let binding = binding();
        let stored = binding.persist_insert(doc! { name: "x" }).unwrap();
        let id = stored.get("id").unwrap();
        assert!(uuid::Uuid::parse_str(id.as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_insert_duplicate_id_fails() {
        let binding = seeded();
        let err = binding.persist_insert(doc! { id: "a" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreError);
    }

    #[test]
    fn test_resolve_ids_in_insertion_order() {
        let binding = seeded();
        assert_eq!(
            binding.resolve_ids(&field("city").eq("Paris"), None).unwrap(),
            vec![Value::from("a"), Value::from("c")]
        );
        assert_eq!(binding.resolve_ids(&all(), Some(2)).unwrap().len(), 2);
        assert_eq!(
            binding.resolve_ids(&by_id("id", "b"), None).unwrap(),
            vec![Value::from("b")]
        );
        assert!(binding.resolve_ids(&by_id("id", "zz"), None).unwrap().is_empty());
    }

    #[test]
    fn test_id_lookup_still_applies_whole_filter() {
        let binding = seeded();
        let filter = by_id("id", "a").and(field("city").eq("Rome"));
        assert!(binding.resolve_ids(&filter, None).unwrap().is_empty());
    }

    #[test]
    fn test_find_with_options() {
        let binding = seeded();
        let options = find_options().sort_by("age", SortOrder::Descending).skip(1).limit(1);
        assert_eq!(ids(binding.find(&all(), &options).unwrap()), vec![Value::from("a")]);

        let options = find_options().skip(1);
        assert_eq!(
            ids(binding.find(&all(), &options).unwrap()),
            vec![Value::from("b"), Value::from("c")]
        );
    }

    #[test]
    fn test_find_applies_projection() {
        let binding = seeded();
        let options = find_options().projection(Projection::include(&["city"]));
        let docs: Vec<Document> = binding
            .find(&field("id").eq("a"), &options)
            .unwrap()
            .map(|d| d.unwrap())
            .collect();
        assert_eq!(docs, vec![doc! { id: "a", city: "Paris" }]);
    }

    #[test]
    fn test_find_surfaces_filter_errors_per_element() {
        let binding = seeded();
        let mut cursor = binding.find(&field("city").text_regex("("), &find_options()).unwrap();
        assert!(cursor.next().unwrap().is_err());
    }

    #[test]
    fn test_update_replaces_in_place() {
        let binding = seeded();
        binding.persist_update(doc! { id: "a", age: 31 }).unwrap();
        assert_eq!(
            binding.load_by_id(&Value::from("a")).unwrap(),
            Some(doc! { id: "a", age: 31 })
        );
        assert_eq!(
            binding.resolve_ids(&all(), None).unwrap(),
            vec![Value::from("a"), Value::from("b"), Value::from("c")]
        );
    }

    #[test]
    fn test_update_missing_fails() {
        let binding = seeded();
        let err = binding.persist_update(doc! { id: "zz" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreError);
        let err = binding.persist_update(doc! { age: 1 }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn test_delete() {
        let binding = seeded();
        binding.persist_delete(&Value::from("b")).unwrap();
        assert!(binding.load_by_id(&Value::from("b")).unwrap().is_none());
        let err = binding.persist_delete(&Value::from("b")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
    }

    #[test]
    fn test_patch_cannot_change_id() {
        let binding = seeded();
        let mut document = binding.load_by_id(&Value::from("a")).unwrap().unwrap();
        let err = binding
            .apply_patch(&mut document, &doc! { "$set": { id: "other" } })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_run_aggregate() {
        let binding = seeded();
        let result = binding
            .run_aggregate(&[
                AggregateStage::Match(field("city").eq("Paris")),
                AggregateStage::Count("n".to_string()),
            ])
            .unwrap();
        assert_eq!(result, vec![doc! { n: 2 }]);
    }
}
