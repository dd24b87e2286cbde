use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::middleware::{Hook, Phase};
use std::sync::Arc;

struct HookEntry<T> {
    phase: Phase,
    hook: Hook<T>,
}

impl<T> Clone for HookEntry<T> {
    fn clone(&self) -> Self {
        HookEntry {
            phase: self.phase,
            hook: self.hook.clone(),
        }
    }
}

/// An ordered, immutable set of hooks, each tagged with the phase it runs
/// in.
///
/// Built once with [MiddlewareBuilder] and captured by a collection at
/// construction; the set of hooks never changes afterwards. Hooks of one
/// phase run in registration order, each receiving the previous hook's
/// output.
///
/// ```rust,ignore
/// let middleware = Middleware::builder()
///     .before_update(Hook::from_update_fn("reject-locked", reject_locked))
///     .after_update(Hook::from_fn("audit", audit))
///     .build();
/// ```
pub struct Middleware<T> {
    inner: Arc<Vec<HookEntry<T>>>,
}

impl<T> Clone for Middleware<T> {
    fn clone(&self) -> Self {
        Middleware {
            inner: self.inner.clone(),
        }
    }
}

impl<T: 'static> Default for Middleware<T> {
    fn default() -> Self {
        Middleware::new()
    }
}

impl<T: 'static> Middleware<T> {
    /// Middleware without hooks; every phase passes documents through.
    pub fn new() -> Self {
        Middleware {
            inner: Arc::new(Vec::new()),
        }
    }

    pub fn builder() -> MiddlewareBuilder<T> {
        MiddlewareBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Names of the hooks registered for `phase`, in run order.
    pub fn hook_names(&self, phase: Phase) -> Vec<String> {
        self.hooks(phase).map(|hook| hook.name()).collect()
    }

    fn hooks(&self, phase: Phase) -> impl Iterator<Item = &Hook<T>> {
        self.inner
            .iter()
            .filter(move |entry| entry.phase == phase)
            .map(|entry| &entry.hook)
    }

    /// Runs every hook of `phase` over `document`.
    ///
    /// The first failing hook stops the phase. In a before phase the
    /// failure is reported as [ErrorKind::ValidationError], in an after phase
    /// as [ErrorKind::HookError]; the hook's own error is kept as the cause.
    pub fn run_phase(&self, phase: Phase, document: T) -> WardenResult<T> {
        self.run_hooks(phase, None, document)
    }

    /// Runs every hook of an update `phase`, giving each hook the stored
    /// value `before` next to the patched `document`.
    ///
    /// Failures are reported as in [run_phase](Self::run_phase).
    pub fn run_update_phase(&self, phase: Phase, before: &T, document: T) -> WardenResult<T> {
        self.run_hooks(phase, Some(before), document)
    }

    fn run_hooks(&self, phase: Phase, before: Option<&T>, document: T) -> WardenResult<T> {
        let mut current = document;
        for hook in self.hooks(phase) {
            log::debug!("Running {} hook {}", phase, hook.name());
            let handled = match before {
                Some(before) => hook.handle_update(before, current, phase),
                None => hook.handle(current, phase),
            };
            current = match handled {
                Ok(next) => next,
                Err(e) => return Err(Self::phase_error(phase, hook, e)),
            };
        }
        Ok(current)
    }

    fn phase_error(phase: Phase, hook: &Hook<T>, cause: WardenError) -> WardenError {
        let (kind, verb) = if phase.is_before() {
            (ErrorKind::ValidationError, "rejected the document")
        } else {
            (ErrorKind::HookError, "failed")
        };
        let message = format!("{} hook {} {}: {}", phase, hook.name(), verb, cause);
        if phase.is_before() {
            log::error!("{}", message);
        } else {
            log::warn!("{}", message);
        }
        WardenError::new_with_cause(&message, kind, cause)
    }
}

/// Collects `{phase, hook}` entries for a [Middleware].
pub struct MiddlewareBuilder<T> {
    entries: Vec<HookEntry<T>>,
}

impl<T: 'static> Default for MiddlewareBuilder<T> {
    fn default() -> Self {
        MiddlewareBuilder::new()
    }
}

impl<T: 'static> MiddlewareBuilder<T> {
    pub fn new() -> Self {
        MiddlewareBuilder {
            entries: Vec::new(),
        }
    }

    /// Registers `hook` for `phase`, after every hook registered so far.
    pub fn on(mut self, phase: Phase, hook: Hook<T>) -> Self {
        self.entries.push(HookEntry { phase, hook });
        self
    }

    pub fn before_insert(self, hook: Hook<T>) -> Self {
        self.on(Phase::BeforeInsert, hook)
    }

    pub fn after_insert(self, hook: Hook<T>) -> Self {
        self.on(Phase::AfterInsert, hook)
    }

    pub fn before_update(self, hook: Hook<T>) -> Self {
        self.on(Phase::BeforeUpdate, hook)
    }

    pub fn after_update(self, hook: Hook<T>) -> Self {
        self.on(Phase::AfterUpdate, hook)
    }

    pub fn before_remove(self, hook: Hook<T>) -> Self {
        self.on(Phase::BeforeRemove, hook)
    }

    pub fn after_remove(self, hook: Hook<T>) -> Self {
        self.on(Phase::AfterRemove, hook)
    }

    pub(crate) fn extend(mut self, middleware: &Middleware<T>) -> Self {
        self.entries.extend(middleware.inner.iter().cloned());
        self
    }

    pub fn build(self) -> Middleware<T> {
        Middleware {
            inner: Arc::new(self.entries),
        }
    }
}
