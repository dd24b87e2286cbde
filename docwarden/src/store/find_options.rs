use crate::collection::Document;
use crate::common::SortOrder;
use crate::errors::WardenResult;
use crate::store::Projection;
use std::cmp::Ordering;

/// Options for a find: projection, pagination and sorting.
///
/// # Examples
///
/// ```rust,ignore
/// let options = find_options()
///     .sort_by("age", SortOrder::Descending)
///     .skip(10)
///     .limit(20);
/// let page = collection.find_with_options(all(), &options)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub(crate) projection: Option<Projection>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) sort_by: Vec<(String, SortOrder)>,
}

/// Creates empty `FindOptions`.
pub fn find_options() -> FindOptions {
    FindOptions::new()
}

/// Creates `FindOptions` carrying only a projection.
pub fn projected(projection: Projection) -> FindOptions {
    FindOptions::new().projection(projection)
}

/// Creates `FindOptions` sorted by one field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips the first `skip` matches.
pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` returning at most `limit` matches.
pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions {
            projection: None,
            skip: None,
            limit: None,
            sort_by: Vec::new(),
        }
    }

    pub fn projection(mut self, projection: Projection) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn skip(mut self, skip: usize) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Adds a sort key. Keys apply in the order they are added.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        self.sort_by.push((field_name.to_string(), sort_order));
        self
    }

    pub fn get_projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn get_skip(&self) -> Option<usize> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn get_sort_by(&self) -> &[(String, SortOrder)] {
        &self.sort_by
    }

    /// Sorts `documents` in place by the configured keys. The sort is
    /// stable, so ties keep their incoming order.
    pub(crate) fn sort(&self, documents: &mut [Document]) -> WardenResult<()> {
        if self.sort_by.is_empty() {
            return Ok(());
        }
        sort_documents(documents, &self.sort_by)
    }
}

pub(crate) fn sort_documents(
    documents: &mut [Document],
    keys: &[(String, SortOrder)],
) -> WardenResult<()> {
    // extract the keys up front, comparators cannot fail
    let mut keyed = Vec::with_capacity(documents.len());
    for (position, document) in documents.iter().enumerate() {
        let mut values = Vec::with_capacity(keys.len());
        for (field, _) in keys {
            values.push(document.get(field)?);
        }
        keyed.push((values, position));
    }

    keyed.sort_by(|(lhs, _), (rhs, _)| {
        for (index, (_, order)) in keys.iter().enumerate() {
            let ordering = order.apply(lhs[index].cmp(&rhs[index]));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });

    let sorted: Vec<Document> = keyed
        .into_iter()
        .map(|(_, position)| documents[position].clone())
        .collect();
    documents.clone_from_slice(&sorted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use crate::doc;

    #[test]
    fn test_find_options_new() {
        let options = FindOptions::new();
        assert!(options.get_projection().is_none());
        assert!(options.get_skip().is_none());
        assert!(options.get_limit().is_none());
        assert!(options.get_sort_by().is_empty());
    }

    #[test]
    fn test_builders() {
        assert_eq!(skip_by(3).get_skip(), Some(3));
        assert_eq!(limit_to(4).get_limit(), Some(4));
        assert_eq!(
            order_by("age", SortOrder::Descending).get_sort_by(),
            &[("age".to_string(), SortOrder::Descending)]
        );
        assert_eq!(
            projected(Projection::include(&["a"])).get_projection(),
            Some(&Projection::include(&["a"]))
        );
    }

    #[test]
    fn test_chaining() {
        let options = find_options()
            .sort_by("a", SortOrder::Ascending)
            .sort_by("b", SortOrder::Descending)
            .skip(1)
            .limit(2);
        assert_eq!(options.get_sort_by().len(), 2);
        assert_eq!(options.get_skip(), Some(1));
        assert_eq!(options.get_limit(), Some(2));
    }

    #[test]
    fn test_sort_multiple_keys() {
        let mut docs = vec![
            doc! { name: "b", age: 1 },
            doc! { name: "a", age: 2 },
            doc! { name: "a", age: 1 },
        ];
        order_by("name", SortOrder::Ascending)
            .sort_by("age", SortOrder::Descending)
            .sort(&mut docs)
            .unwrap();
        assert_eq!(docs[0], doc! { name: "a", age: 2 });
        assert_eq!(docs[1], doc! { name: "a", age: 1 });
        assert_eq!(docs[2], doc! { name: "b", age: 1 });
    }

    #[test]
    fn test_sort_is_stable() {
        let mut docs = vec![doc! { k: 1, n: 1 }, doc! { k: 1, n: 2 }, doc! { k: 0, n: 3 }];
        order_by("k", SortOrder::Ascending).sort(&mut docs).unwrap();
        let order: Vec<Value> = docs.iter().map(|d| d.get("n").unwrap()).collect();
        assert_eq!(order, vec![Value::from(3), Value::from(1), Value::from(2)]);
    }
}
