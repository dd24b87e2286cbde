use crate::collection::{Document, Entity, EntityCursor, Hydrated};
use crate::common::Value;
use crate::errors::WardenResult;
use crate::filter::{by_id, Filter};
use crate::store::{AggregateStage, FindOptions, Projection, StoreBinding};
use crate::virtuals::VirtualComposer;
use std::sync::Arc;

/// Read path of a collection: store reads with virtuals composed on top.
pub(crate) struct ReadOperations<T> {
    inner: Arc<ReadOperationsInner<T>>,
}

impl<T> Clone for ReadOperations<T> {
    fn clone(&self) -> Self {
        ReadOperations {
            inner: self.inner.clone(),
        }
    }
}

struct ReadOperationsInner<T> {
    binding: StoreBinding,
    composer: VirtualComposer<T>,
}

impl<T: Entity> ReadOperations<T> {
    pub fn new(binding: StoreBinding, composer: VirtualComposer<T>) -> Self {
        ReadOperations {
            inner: Arc::new(ReadOperationsInner { binding, composer }),
        }
    }

    pub fn find(&self, query: &Filter, options: &FindOptions) -> WardenResult<EntityCursor<T>> {
        let cursor = self.inner.binding.find(query, options)?;
        Ok(EntityCursor::new(cursor, self.inner.composer.clone()))
    }

    /// First match of `query`; `Ok(None)` when nothing matches.
    pub fn find_one(&self, query: &Filter, projection: Option<Projection>) -> WardenResult<Option<Hydrated<T>>> {
        let mut options = FindOptions::new().limit(1);
        if let Some(projection) = projection {
            options = options.projection(projection);
        }
        self.find(query, &options)?.next().transpose()
    }

    pub fn find_by_id(&self, id: &Value, projection: Option<Projection>) -> WardenResult<Option<Hydrated<T>>> {
        let query = by_id(&self.inner.binding.id_field(), id.clone());
        self.find_one(&query, projection)
    }

    pub fn count(&self, query: &Filter) -> WardenResult<usize> {
        Ok(self.inner.binding.resolve_ids(query, None)?.len())
    }

    /// Runs `stages` in the store. The output is not mapped to `T` and no
    /// virtuals are composed.
    pub fn aggregate(&self, stages: &[AggregateStage]) -> WardenResult<Vec<Document>> {
        self.inner.binding.run_aggregate(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::{all, field};
    use crate::store::{Accumulator, MemoryStore, StoreProvider};
    use crate::virtuals::Virtual;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        id: String,
        first: String,
        #[serde(default)]
        last: Option<String>,
    }

    impl Entity for Person {}

    fn reads() -> ReadOperations<Person> {
        let binding = MemoryStore::new().open_binding("people", "id").unwrap();
        binding
            .persist_insert(doc! { id: "p1", first: "Ada", last: "Lovelace" })
            .unwrap();
        binding
            .persist_insert(doc! { id: "p2", first: "Alan", last: "Turing" })
            .unwrap();
        let composer = VirtualComposer::new(vec![Virtual::infallible("shout", |p: &Person| {
            p.first.to_uppercase()
        })])
        .unwrap();
        ReadOperations::new(binding, composer)
    }

    #[test]
    fn test_find_composes_virtuals() {
        let found: Vec<_> = reads()
            .find(&all(), &FindOptions::new())
            .unwrap()
            .map(|p| p.unwrap().virtual_value("shout"))
            .collect();
        assert_eq!(found, vec![Value::from("ADA"), Value::from("ALAN")]);
    }

    #[test]
    fn test_find_one_absent_is_none() {
        let found = reads().find_one(&field("first").eq("Grace"), None).unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_find_by_id_with_projection() {
        let found = reads()
            .find_by_id(&Value::from("p2"), Some(Projection::exclude(&["last"])))
            .unwrap()
            .unwrap();
        assert_eq!(found.first, "Alan");
        assert_eq!(found.last, None);
    }

    #[test]
    fn test_count() {
        assert_eq!(reads().count(&all()).unwrap(), 2);
        assert_eq!(reads().count(&field("first").eq("Ada")).unwrap(), 1);
    }

    #[test]
    fn test_aggregate_is_not_composed() {
        let rows = reads()
            .aggregate(&[AggregateStage::Group {
                key: None,
                accumulators: vec![Accumulator::Count("people".to_string())],
            }])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("people").unwrap(), Value::from(2));
        assert!(!rows[0].contains_key("shout"));
    }
}
