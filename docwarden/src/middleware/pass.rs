use crate::errors::{WardenError, WardenResult};
use crate::middleware::{Middleware, Operation, Phase};
use std::fmt::Display;

/// Where a single document stands in its write lifecycle.
///
/// ```text
/// Pending -> BeforePhase -> Rejected
///                        -> Persisting -> PersistFailed
///                                      -> Persisted -> AfterPhase -> Done
/// ```
///
/// `Rejected`, `PersistFailed` and `Done` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Pending,
    BeforePhase,
    Rejected,
    Persisting,
    PersistFailed,
    Persisted,
    AfterPhase,
    Done,
}

impl PassState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PassState::Rejected | PassState::PersistFailed | PassState::Done)
    }

    pub fn can_advance_to(&self, next: PassState) -> bool {
        matches!(
            (self, next),
            (PassState::Pending, PassState::BeforePhase)
                | (PassState::BeforePhase, PassState::Rejected)
                | (PassState::BeforePhase, PassState::Persisting)
                | (PassState::Persisting, PassState::PersistFailed)
                | (PassState::Persisting, PassState::Persisted)
                | (PassState::Persisted, PassState::AfterPhase)
                | (PassState::AfterPhase, PassState::Done)
        )
    }
}

impl Display for PassState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Result of one [DocumentPass].
#[derive(Debug)]
pub struct PassOutcome<T> {
    state: PassState,
    result: WardenResult<T>,
    after_hook_error: Option<WardenError>,
}

impl<T> PassOutcome<T> {
    /// Terminal state the pass ended in.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Whether the document reached the store.
    pub fn is_persisted(&self) -> bool {
        self.state == PassState::Done
    }

    pub fn result(&self) -> &WardenResult<T> {
        &self.result
    }

    /// The after-phase failure, if any. Its presence never means the write
    /// failed.
    pub fn after_hook_error(&self) -> Option<&WardenError> {
        self.after_hook_error.as_ref()
    }

    pub fn into_parts(self) -> (WardenResult<T>, Option<WardenError>) {
        (self.result, self.after_hook_error)
    }
}

/// Drives one document through `before hooks -> persist -> after hooks`.
///
/// The before phase may transform or reject the document. A rejection is
/// terminal: nothing is persisted and the outcome carries the
/// [ValidationError](crate::errors::ErrorKind::ValidationError). After
/// persistence the after phase sees the value the store returned; if it
/// fails, the persisted value is still the result and the failure is carried
/// separately as [PassOutcome::after_hook_error].
///
/// An update pass built [with_previous](DocumentPass::with_previous) hands the
/// stored value to every hook through
/// [HookProvider::handle_update](crate::middleware::HookProvider::handle_update).
pub struct DocumentPass<'a, T> {
    middleware: &'a Middleware<T>,
    operation: Operation,
    label: String,
    previous: Option<&'a T>,
    state: PassState,
}

impl<'a, T: Clone + 'static> DocumentPass<'a, T> {
    /// Creates a pass over `middleware` for `operation`. `label` names the
    /// document in log lines.
    pub fn new(middleware: &'a Middleware<T>, operation: Operation, label: String) -> Self {
        DocumentPass {
            middleware,
            operation,
            label,
            previous: None,
            state: PassState::Pending,
        }
    }

    /// Sets the stored value the document replaces.
    pub fn with_previous(mut self, previous: &'a T) -> Self {
        self.previous = Some(previous);
        self
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    /// Runs the pass, calling `persist` with the before phase's output.
    pub fn run<P>(mut self, document: T, persist: P) -> PassOutcome<T>
    where
        P: FnOnce(T) -> WardenResult<T>,
    {
        self.transition(PassState::BeforePhase);
        let document = match self.run_phase(self.operation.before(), document) {
            Ok(document) => document,
            Err(e) => {
                self.transition(PassState::Rejected);
                return self.finish(Err(e), None);
            }
        };

        self.transition(PassState::Persisting);
        let persisted = match persist(document) {
            Ok(persisted) => persisted,
            Err(e) => {
                log::debug!("{} of {} failed to persist: {}", self.operation, self.label, e);
                self.transition(PassState::PersistFailed);
                return self.finish(Err(e), None);
            }
        };
        self.transition(PassState::Persisted);

        self.transition(PassState::AfterPhase);
        let (result, after_hook_error) =
            match self.run_phase(self.operation.after(), persisted.clone()) {
                Ok(transformed) => (Ok(transformed), None),
                Err(e) => (Ok(persisted), Some(e)),
            };
        self.transition(PassState::Done);
        self.finish(result, after_hook_error)
    }

    fn run_phase(&self, phase: Phase, document: T) -> WardenResult<T> {
        match self.previous {
            Some(previous) => self.middleware.run_update_phase(phase, previous, document),
            None => self.middleware.run_phase(phase, document),
        }
    }

    fn transition(&mut self, next: PassState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid pass transition {} -> {}",
            self.state,
            next
        );
        log::debug!("{} of {}: {} -> {}", self.operation, self.label, self.state, next);
        self.state = next;
    }

    fn finish(self, result: WardenResult<T>, after_hook_error: Option<WardenError>) -> PassOutcome<T> {
        PassOutcome {
            state: self.state,
            result,
            after_hook_error,
        }
    }
}
