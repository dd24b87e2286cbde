use crate::collection::{from_document, Entity, Hydrated};
use crate::errors::WardenResult;
use crate::store::DocumentCursor;
use crate::virtuals::VirtualComposer;

/// Lazy stream of [Hydrated] entities returned by
/// [Collection::find](crate::collection::Collection::find).
///
/// Each element is mapped from its stored document and composed with the
/// collection's virtuals only when it is pulled. A mapping or virtual
/// failure turns that one element into an `Err`; later elements are still
/// yielded. The cursor is single pass: call `find` again to start over.
pub struct EntityCursor<T> {
    cursor: DocumentCursor,
    composer: VirtualComposer<T>,
}

impl<T: Entity> EntityCursor<T> {
    pub(crate) fn new(cursor: DocumentCursor, composer: VirtualComposer<T>) -> Self {
        EntityCursor { cursor, composer }
    }

    /// Pulls the next element, if any.
    pub fn first(&mut self) -> Option<WardenResult<Hydrated<T>>> {
        self.next()
    }

    /// Drains the cursor, stopping at the first failed element.
    pub fn try_collect(self) -> WardenResult<Vec<Hydrated<T>>> {
        self.collect()
    }

    /// Drains the cursor and returns the plain entities, dropping the
    /// composed virtuals.
    pub fn entities(self) -> WardenResult<Vec<T>> {
        self.map(|item| item.map(Hydrated::into_entity)).collect()
    }

    fn hydrate(&self, item: WardenResult<crate::collection::Document>) -> WardenResult<Hydrated<T>> {
        let entity = from_document::<T>(item?)?;
        self.composer.compose(entity)
    }
}

impl<T: Entity> Iterator for EntityCursor<T> {
    type Item = WardenResult<Hydrated<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.next()?;
        Some(self.hydrate(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Document;
    use crate::common::Value;
    use crate::doc;
    use crate::errors::{ErrorKind, WardenError};
    use crate::virtuals::Virtual;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: i64,
        name: String,
    }

    impl Entity for Item {}

    fn cursor_over(items: Vec<WardenResult<Document>>, composer: VirtualComposer<Item>) -> EntityCursor<Item> {
        EntityCursor::new(Box::new(items.into_iter()), composer)
    }

    fn upper() -> VirtualComposer<Item> {
        VirtualComposer::new(vec![Virtual::infallible("upper", |i: &Item| i.name.to_uppercase())]).unwrap()
    }

    #[test]
    fn test_elements_are_composed() {
        let mut cursor = cursor_over(vec![Ok(doc! { id: 1, name: "pen" })], upper());
        let first = cursor.first().unwrap().unwrap();
        assert_eq!(first.name, "pen");
        assert_eq!(first.virtual_value("upper"), Value::from("PEN"));
        assert!(cursor.next().is_none());
    }

    #[test]
    fn test_failed_element_does_not_stop_iteration() {
        let cursor = cursor_over(
            vec![
                Ok(doc! { id: 1, name: "pen" }),
                Ok(doc! { id: 2 }),
                Err(WardenError::new("read failed", ErrorKind::StoreError)),
                Ok(doc! { id: 3, name: "ink" }),
            ],
            upper(),
        );
        let results: Vec<_> = cursor.collect();
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind(), &ErrorKind::ObjectMappingError);
        assert_eq!(results[2].as_ref().unwrap_err().kind(), &ErrorKind::StoreError);
        assert_eq!(results[3].as_ref().unwrap().name, "ink");
    }

    #[test]
    fn test_virtual_failure_is_per_element() {
        let composer = VirtualComposer::new(vec![Virtual::new("odd", |i: &Item| {
            if i.id % 2 == 0 {
                Err(WardenError::new("even id", ErrorKind::InternalError))
            } else {
                Ok(Value::from(true))
            }
        })])
        .unwrap();
        let cursor = cursor_over(
            vec![
                Ok(doc! { id: 1, name: "a" }),
                Ok(doc! { id: 2, name: "b" }),
                Ok(doc! { id: 3, name: "c" }),
            ],
            composer,
        );
        let kinds: Vec<_> = cursor.map(|r| r.map_err(|e| e.kind().clone()).map(|h| h.id)).collect();
        assert_eq!(
            kinds,
            vec![Ok(1), Err(ErrorKind::VirtualEvaluationError), Ok(3)]
        );
    }

    #[test]
    fn test_entities_drops_virtuals() {
        let cursor = cursor_over(vec![Ok(doc! { id: 1, name: "pen" })], upper());
        let entities = cursor.entities().unwrap();
        assert_eq!(
            entities,
            vec![Item {
                id: 1,
                name: "pen".to_string()
            }]
        );
    }

    #[test]
    fn test_try_collect_stops_on_error() {
        let cursor = cursor_over(vec![Ok(doc! { id: 1 })], upper());
        assert!(cursor.try_collect().is_err());
    }
}
