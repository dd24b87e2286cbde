use crate::collection::{Document, Entity, Hydrated};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::virtuals::Virtual;
use std::collections::HashSet;
use std::sync::Arc;

/// The virtuals of one collection, evaluated on every read.
///
/// Each virtual sees only the stored entity, never another virtual's
/// output, and virtuals run in registration order.
pub struct VirtualComposer<T> {
    inner: Arc<Vec<Virtual<T>>>,
}

impl<T> Clone for VirtualComposer<T> {
    fn clone(&self) -> Self {
        VirtualComposer {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Entity> Default for VirtualComposer<T> {
    fn default() -> Self {
        VirtualComposer {
            inner: Arc::new(Vec::new()),
        }
    }
}

impl<T: Entity> VirtualComposer<T> {
    /// Creates a composer over `virtuals`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::InvalidOperation] if a name is empty or used twice.
    pub fn new(virtuals: Vec<Virtual<T>>) -> WardenResult<Self> {
        let mut names = HashSet::new();
        for v in &virtuals {
            if v.name().is_empty() {
                log::error!("Virtual field name cannot be empty");
                return Err(WardenError::new(
                    "Virtual field name cannot be empty",
                    ErrorKind::InvalidOperation,
                ));
            }
            if !names.insert(v.name()) {
                log::error!("Virtual field {} is registered more than once", v.name());
                return Err(WardenError::new(
                    &format!("Virtual field {} is registered more than once", v.name()),
                    ErrorKind::InvalidOperation,
                ));
            }
        }
        Ok(VirtualComposer {
            inner: Arc::new(virtuals),
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.iter().map(|v| v.name().to_string()).collect()
    }

    /// Evaluates every virtual against `entity`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::VirtualEvaluationError] naming the first virtual that
    /// failed, with its error as the cause. Nothing is composed in that case.
    pub fn compose(&self, entity: T) -> WardenResult<Hydrated<T>> {
        let mut virtuals = Document::new();
        for v in self.inner.iter() {
            match v.evaluate(&entity) {
                Ok(value) => virtuals.put(v.name(), value)?,
                Err(e) => {
                    log::error!("Virtual field {} failed: {}", v.name(), e);
                    return Err(WardenError::new_with_cause(
                        &format!("Virtual field {} failed: {}", v.name(), e),
                        ErrorKind::VirtualEvaluationError,
                        e,
                    ));
                }
            }
        }
        Ok(Hydrated::new(entity, virtuals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Value;
    use parking_lot::Mutex;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Person {
        first: String,
        last: String,
    }

    impl Entity for Person {}

    fn ada() -> Person {
        Person {
            first: "Ada".to_string(),
            last: "Lovelace".to_string(),
        }
    }

    fn initials(p: &Person) -> String {
        p.first.chars().take(1).chain(p.last.chars().take(1)).collect()
    }

    #[test]
    fn test_compose_full_name_and_initials() {
        let composer = VirtualComposer::new(vec![
            Virtual::infallible("fullName", |p: &Person| format!("{} {}", p.first, p.last)),
            Virtual::infallible("initials", initials),
        ])
        .unwrap();

        let hydrated = composer.compose(ada()).unwrap();
        assert_eq!(hydrated.virtual_value("fullName"), Value::from("Ada Lovelace"));
        assert_eq!(hydrated.virtual_value("initials"), Value::from("AL"));
        assert_eq!(hydrated.entity(), &ada());
    }

    #[test]
    fn test_empty_composer() {
        let composer: VirtualComposer<Person> = VirtualComposer::default();
        assert!(composer.is_empty());
        assert!(composer.compose(ada()).unwrap().virtuals().is_empty());
    }

    #[test]
    fn test_registration_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let (a, b) = (order.clone(), order.clone());
        let composer = VirtualComposer::new(vec![
            Virtual::infallible("b", move |_: &Person| {
                a.lock().push("b");
                1
            }),
            Virtual::infallible("a", move |_: &Person| {
                b.lock().push("a");
                2
            }),
        ])
        .unwrap();
        composer.compose(ada()).unwrap();
        assert_eq!(*order.lock(), vec!["b", "a"]);
        assert_eq!(composer.names(), vec!["b", "a"]);
    }

    #[test]
    fn test_failure_names_virtual() {
        let composer = VirtualComposer::new(vec![Virtual::new("broken", |_: &Person| {
            Err(WardenError::new("division by zero", ErrorKind::InternalError))
        })])
        .unwrap();
        let err = composer.compose(ada()).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::VirtualEvaluationError);
        assert!(err.message().contains("broken"));
        assert_eq!(err.cause().map(|c| c.message()), Some("division by zero"));
    }

    #[test]
    fn test_duplicate_or_empty_names_rejected() {
        let duplicate = VirtualComposer::new(vec![
            Virtual::infallible("x", |_: &Person| 1),
            Virtual::infallible("x", |_: &Person| 2),
        ]);
        assert_eq!(duplicate.err().map(|e| e.kind().clone()), Some(ErrorKind::InvalidOperation));

        let empty = VirtualComposer::new(vec![Virtual::infallible("", |_: &Person| 1)]);
        assert!(empty.is_err());
    }
}
