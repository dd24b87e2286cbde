use crate::common::Value;
use crate::errors::WardenResult;
use std::fmt::Debug;
use std::sync::Arc;

type Compute<T> = Arc<dyn Fn(&T) -> WardenResult<Value> + Send + Sync>;

/// A derived field computed from an entity on every read and never stored.
///
/// ```rust,ignore
/// let full_name = Virtual::infallible("fullName", |p: &Person| format!("{} {}", p.first, p.last));
/// let age = Virtual::new("age", |p: &Person| {
///     let born = p.born.ok_or_else(|| WardenError::new("no birth date", ErrorKind::InvalidOperation))?;
///     Ok(Value::from(years_since(born)))
/// });
/// ```
pub struct Virtual<T> {
    name: String,
    compute: Compute<T>,
}

impl<T: 'static> Virtual<T> {
    /// Creates a virtual whose computation may fail.
    pub fn new<F>(name: &str, compute: F) -> Self
    where
        F: Fn(&T) -> WardenResult<Value> + Send + Sync + 'static,
    {
        Virtual {
            name: name.to_string(),
            compute: Arc::new(compute),
        }
    }

    /// Creates a virtual whose computation cannot fail.
    pub fn infallible<V, F>(name: &str, compute: F) -> Self
    where
        V: Into<Value> + 'static,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        Virtual {
            name: name.to_string(),
            compute: Arc::new(move |entity: &T| Ok(compute(entity).into())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn evaluate(&self, entity: &T) -> WardenResult<Value> {
        (self.compute)(entity)
    }
}

impl<T> Clone for Virtual<T> {
    fn clone(&self) -> Self {
        Virtual {
            name: self.name.clone(),
            compute: self.compute.clone(),
        }
    }
}

impl<T> Debug for Virtual<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Virtual").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, WardenError};

    #[test]
    fn test_infallible() {
        let len = Virtual::infallible("len", |s: &String| s.len());
        assert_eq!(len.name(), "len");
        assert_eq!(len.evaluate(&"abc".to_string()).unwrap(), Value::from(3));
    }

    #[test]
    fn test_fallible() {
        let first = Virtual::new("first", |s: &String| match s.chars().next() {
            Some(c) => Ok(Value::from(c.to_string())),
            None => Err(WardenError::new("empty", ErrorKind::InvalidOperation)),
        });
        assert_eq!(first.evaluate(&"xy".to_string()).unwrap(), Value::from("x"));
        assert!(first.evaluate(&String::new()).is_err());
    }

    #[test]
    fn test_debug_shows_name() {
        let v = Virtual::infallible("answer", |_: &i32| 42);
        assert_eq!(format!("{:?}", v), "Virtual { name: \"answer\" }");
    }
}
