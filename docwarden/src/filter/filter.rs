use crate::collection::Document;
use crate::common::Value;
use crate::errors::WardenResult;
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, EqualsFilter, NotFilter, OrFilter};

/// Trait for implementing custom filters.
///
/// A `FilterProvider` decides whether a single document matches. Custom
/// providers can be wrapped with [Filter::new] and passed anywhere a filter
/// is accepted.
pub trait FilterProvider: Any + Send + Sync + Display {
    /// Applies the filter to a document and returns whether it matches.
    fn apply(&self, entry: &Document) -> WardenResult<bool>;

    /// Returns the value this filter pins `field` to, if it is a plain
    /// equality on that field.
    ///
    /// Store bindings use it to turn an id lookup into a direct fetch.
    fn equality_on(&self, field: &str) -> Option<Value> {
        let _ = field;
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// A query filter for selecting documents from a collection.
///
/// Filters are cheap to clone and can be composed:
/// - `and(other)` - both must match
/// - `or(other)` - either must match
/// - `not()` - negation
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    /// Creates a new filter from a filter provider implementation.
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    /// Combines this filter with another using logical AND.
    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    /// Combines this filter with another using logical OR.
    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    /// Negates this filter using logical NOT.
    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Filter{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// Creates a filter that matches all documents.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

/// Creates a filter that matches the document whose `id_field` equals `id`.
pub fn by_id<T: Into<Value>>(id_field: &str, id: T) -> Filter {
    Filter::new(EqualsFilter::new(id_field.to_string(), id.into()))
}

/// Combines multiple filters using logical AND.
///
/// An empty list matches every document.
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

/// Combines multiple filters using logical OR.
///
/// An empty list matches nothing.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

/// Negates a filter using logical NOT.
pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}

pub(crate) fn is_all_filter(filter: &Filter) -> bool {
    filter.as_any().is::<AllFilter>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::field;

    #[test]
    fn test_all_matches_everything() {
        let filter = all();
        assert!(filter.apply(&doc! {}).unwrap());
        assert!(filter.apply(&doc! { a: 1 }).unwrap());
        assert!(is_all_filter(&filter));
        assert!(!is_all_filter(&field("a").eq(1)));
    }

    #[test]
    fn test_by_id() {
        let filter = by_id("id", "u-1");
        assert!(filter.apply(&doc! { id: "u-1" }).unwrap());
        assert!(!filter.apply(&doc! { id: "u-2" }).unwrap());
        assert_eq!(filter.equality_on("id"), Some(Value::from("u-1")));
        assert_eq!(filter.equality_on("name"), None);
    }

    #[test]
    fn test_free_logical_functions() {
        let doc = doc! { a: 1, b: 2 };
        assert!(and(vec![field("a").eq(1), field("b").eq(2)]).apply(&doc).unwrap());
        assert!(!and(vec![field("a").eq(1), field("b").eq(3)]).apply(&doc).unwrap());
        assert!(or(vec![field("a").eq(5), field("b").eq(2)]).apply(&doc).unwrap());
        assert!(not(field("a").eq(5)).apply(&doc).unwrap());
    }

    #[test]
    fn test_method_composition() {
        let doc = doc! { status: "open", locked: false };
        let filter = field("status").eq("open").and(field("locked").eq(false));
        assert!(filter.apply(&doc).unwrap());
        assert!(!filter.not().apply(&doc).unwrap());
        assert!(field("status").eq("closed").or(field("locked").eq(false)).apply(&doc).unwrap());
    }

    #[test]
    fn test_display() {
        let filter = field("a").eq(1).and(field("b").gt(2));
        assert_eq!(filter.to_string(), "((a == 1) && (b > 2))");
    }
}
