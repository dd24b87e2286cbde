use crate::errors::{ErrorKind, WardenError, WardenResult};
use std::fmt::Debug;
use std::sync::Arc;

/// Settings of one collection, fixed once the collection is built.
#[derive(Clone)]
pub struct CollectionConfig {
    inner: Arc<CollectionConfigInner>,
}

#[derive(Clone)]
struct CollectionConfigInner {
    name: String,
    publish_events: bool,
    max_bulk_documents: Option<usize>,
}

impl CollectionConfig {
    pub(crate) fn new(name: String, publish_events: bool, max_bulk_documents: Option<usize>) -> Self {
        CollectionConfig {
            inner: Arc::new(CollectionConfigInner {
                name,
                publish_events,
                max_bulk_documents,
            }),
        }
    }

    /// Name of the collection in the store.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Whether writes publish collection events. Defaults to `true`.
    pub fn publish_events(&self) -> bool {
        self.inner.publish_events
    }

    /// Largest number of documents a bulk update or remove may touch.
    /// `None` (the default) means unbounded.
    pub fn max_bulk_documents(&self) -> Option<usize> {
        self.inner.max_bulk_documents
    }

    /// Fails with [ErrorKind::InvalidOperation] when `resolved` ids exceed the
    /// bulk limit.
    pub(crate) fn check_bulk_size(&self, resolved: usize) -> WardenResult<()> {
        match self.inner.max_bulk_documents {
            Some(limit) if resolved > limit => {
                log::error!(
                    "Bulk operation on {} matched {} documents, limit is {}",
                    self.inner.name,
                    resolved,
                    limit
                );
                Err(WardenError::new(
                    &format!(
                        "Bulk operation matched {} documents, more than the limit of {}",
                        resolved, limit
                    ),
                    ErrorKind::InvalidOperation,
                ))
            }
            _ => Ok(()),
        }
    }
}

impl Debug for CollectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionConfig")
            .field("name", &self.inner.name)
            .field("publish_events", &self.inner.publish_events)
            .field("max_bulk_documents", &self.inner.max_bulk_documents)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let config = CollectionConfig::new("users".to_string(), false, Some(10));
        assert_eq!(config.name(), "users");
        assert!(!config.publish_events());
        assert_eq!(config.max_bulk_documents(), Some(10));
    }

    #[test]
    fn test_check_bulk_size() {
        let unbounded = CollectionConfig::new("users".to_string(), true, None);
        assert!(unbounded.check_bulk_size(usize::MAX).is_ok());

        let bounded = CollectionConfig::new("users".to_string(), true, Some(2));
        assert!(bounded.check_bulk_size(2).is_ok());
        let err = bounded.check_bulk_size(3).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_clones_share_settings() {
        let config = CollectionConfig::new("users".to_string(), true, None);
        let clone = config.clone();
        assert_eq!(clone.name(), config.name());
        assert!(format!("{:?}", clone).contains("users"));
    }
}
