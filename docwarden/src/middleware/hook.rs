use crate::errors::WardenResult;
use crate::middleware::Phase;
use std::marker::PhantomData;
use std::sync::Arc;

/// Contract for middleware hooks.
///
/// A hook receives the in-flight document and the phase it runs in and
/// returns the (possibly transformed) document, or an error to reject it.
/// Rejections in a before phase stop the document from being persisted.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; a collection and its hooks may be
/// shared between threads.
///
/// ```text
/// struct StampUpdatedAt;
///
/// impl HookProvider<Ticket> for StampUpdatedAt {
///     fn name(&self) -> String {
///         "stamp-updated-at".to_string()
///     }
///
///     fn handle(&self, mut ticket: Ticket, _phase: Phase) -> WardenResult<Ticket> {
///         ticket.updated_at = Some(Utc::now());
///         Ok(ticket)
///     }
/// }
/// ```
pub trait HookProvider<T>: Send + Sync {
    fn name(&self) -> String;

    fn handle(&self, document: T, phase: Phase) -> WardenResult<T>;

    /// Handles an update phase. `before` is the document as it is stored,
    /// `document` the in-flight value with the patch already applied.
    ///
    /// Defaults to [handle](Self::handle), ignoring `before`.
    fn handle_update(&self, _before: &T, document: T, phase: Phase) -> WardenResult<T> {
        self.handle(document, phase)
    }
}

/// Type-erased, cloneable wrapper over a [HookProvider].
pub struct Hook<T> {
    inner: Arc<dyn HookProvider<T>>,
}

impl<T: 'static> Hook<T> {
    pub fn new<H: HookProvider<T> + 'static>(inner: H) -> Self {
        Hook {
            inner: Arc::new(inner),
        }
    }

    /// Creates a hook from a closure.
    ///
    /// ```rust,ignore
    /// let reject_locked = Hook::from_fn("reject-locked", |ticket: Ticket, _| {
    ///     if ticket.status == "locked" {
    ///         return Err(WardenError::new("ticket is locked", ErrorKind::ValidationError));
    ///     }
    ///     Ok(ticket)
    /// });
    /// ```
    pub fn from_fn<F>(name: &str, handler: F) -> Self
    where
        F: Fn(T, Phase) -> WardenResult<T> + Send + Sync + 'static,
    {
        Hook::new(FnHook {
            name: name.to_string(),
            handler,
            phantom: PhantomData,
        })
    }

    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn handle(&self, document: T, phase: Phase) -> WardenResult<T> {
        self.inner.handle(document, phase)
    }

    pub fn handle_update(&self, before: &T, document: T, phase: Phase) -> WardenResult<T> {
        self.inner.handle_update(before, document, phase)
    }
}

impl<T: Clone + 'static> Hook<T> {
    /// Creates a hook from a closure that also receives the stored value
    /// an update replaces.
    ///
    /// ```rust,ignore
    /// let reject_locked = Hook::from_update_fn("reject-locked", |stored: &Ticket, ticket, _| {
    ///     if stored.status == "locked" {
    ///         return Err(WardenError::new("ticket is locked", ErrorKind::ValidationError));
    ///     }
    ///     Ok(ticket)
    /// });
    /// ```
    ///
    /// Registered for an insert or remove phase, the closure gets the
    /// in-flight document as both arguments.
    pub fn from_update_fn<F>(name: &str, handler: F) -> Self
    where
        F: Fn(&T, T, Phase) -> WardenResult<T> + Send + Sync + 'static,
    {
        Hook::new(FnUpdateHook {
            name: name.to_string(),
            handler,
            phantom: PhantomData,
        })
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Hook {
            inner: self.inner.clone(),
        }
    }
}

struct FnHook<T, F> {
    name: String,
    handler: F,
    phantom: PhantomData<fn(T) -> T>,
}

impl<T, F> HookProvider<T> for FnHook<T, F>
where
    F: Fn(T, Phase) -> WardenResult<T> + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn handle(&self, document: T, phase: Phase) -> WardenResult<T> {
        (self.handler)(document, phase)
    }
}

struct FnUpdateHook<T, F> {
    name: String,
    handler: F,
    phantom: PhantomData<fn(T) -> T>,
}

impl<T, F> HookProvider<T> for FnUpdateHook<T, F>
where
    T: Clone,
    F: Fn(&T, T, Phase) -> WardenResult<T> + Send + Sync,
{
    fn name(&self) -> String {
        self.name.clone()
    }

    fn handle(&self, document: T, phase: Phase) -> WardenResult<T> {
        let current = document.clone();
        (self.handler)(&current, document, phase)
    }

    fn handle_update(&self, before: &T, document: T, phase: Phase) -> WardenResult<T> {
        (self.handler)(before, document, phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ErrorKind, WardenError};

    struct Doubler;

    impl HookProvider<i64> for Doubler {
        fn name(&self) -> String {
            "doubler".to_string()
        }

        fn handle(&self, document: i64, _phase: Phase) -> WardenResult<i64> {
            Ok(document * 2)
        }
    }

    #[test]
    fn test_provider_hook() {
        let hook = Hook::new(Doubler);
        assert_eq!(hook.name(), "doubler");
        assert_eq!(hook.handle(4, Phase::BeforeInsert).unwrap(), 8);
    }

    #[test]
    fn test_closure_hook_sees_phase() {
        let hook = Hook::from_fn("phase-aware", |n: i64, phase| {
            if phase.is_before() {
                Ok(n + 1)
            } else {
                Err(WardenError::new("after", ErrorKind::InternalError))
            }
        });
        assert_eq!(hook.handle(1, Phase::BeforeUpdate).unwrap(), 2);
        assert!(hook.handle(1, Phase::AfterUpdate).is_err());
    }

    #[test]
    fn test_update_defaults_to_handle() {
        let hook = Hook::new(Doubler);
        assert_eq!(hook.handle_update(&100, 4, Phase::BeforeUpdate).unwrap(), 8);
    }

    #[test]
    fn test_update_closure_sees_stored_value() {
        let hook = Hook::from_update_fn("no-shrink", |stored: &i64, n: i64, _| {
            if n < *stored {
                return Err(WardenError::new("cannot shrink", ErrorKind::ValidationError));
            }
            Ok(n)
        });
        assert_eq!(hook.handle_update(&3, 5, Phase::BeforeUpdate).unwrap(), 5);
        assert!(hook.handle_update(&3, 2, Phase::BeforeUpdate).is_err());
        // outside an update both arguments are the in-flight value
        assert_eq!(hook.handle(2, Phase::BeforeInsert).unwrap(), 2);
    }

    #[test]
    fn test_clones_share_provider() {
        let hook = Hook::from_fn("id", |n: i64, _| Ok(n));
        let clone = hook.clone();
        assert_eq!(clone.name(), "id");
        assert_eq!(clone.handle(3, Phase::AfterRemove).unwrap(), 3);
    }
}
