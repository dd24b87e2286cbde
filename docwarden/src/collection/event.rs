use crate::collection::Document;
use crate::common::Value;
use crate::errors::WardenResult;
use crate::middleware::Phase;
use anyhow::Error;
use basu::error::BasuError;
use basu::event::Event;
use basu::Handle;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;

/// Event types published by a collection.
///
/// - `Insert`, `Update`, `Remove`: a document was persisted, one event per
///   document, bulk operations included
/// - `HookFailure`: an after-phase hook failed on a document that had
///   already been persisted. The write stands; this event is how the failure
///   is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionEvents {
    Insert,
    Update,
    Remove,
    HookFailure,
}

/// Details of one collection event.
///
/// Cheap to clone; listeners receive their own handle.
///
/// ```ignore
/// collection.subscribe(CollectionEventListener::new(|event: CollectionEventInfo| {
///     if event.event_type() == CollectionEvents::HookFailure {
///         log::warn!("{} failed on {}: {:?}", event.phase().unwrap(), event.id(), event.error());
///     }
///     Ok(())
/// }))?;
/// ```
#[derive(Clone)]
pub struct CollectionEventInfo {
    inner: Arc<CollectionEventInner>,
}

struct CollectionEventInner {
    collection: String,
    event_type: CollectionEvents,
    id: Value,
    item: Option<Document>,
    phase: Option<Phase>,
    error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl CollectionEventInfo {
    /// Creates an event for a persisted document.
    pub fn new(collection: &str, event_type: CollectionEvents, id: Value, item: Option<Document>) -> Self {
        CollectionEventInfo {
            inner: Arc::new(CollectionEventInner {
                collection: collection.to_string(),
                event_type,
                id,
                item,
                phase: None,
                error: None,
                timestamp: Utc::now(),
            }),
        }
    }

    /// Creates a [CollectionEvents::HookFailure] event.
    pub fn hook_failure(collection: &str, id: Value, phase: Phase, error: String) -> Self {
        CollectionEventInfo {
            inner: Arc::new(CollectionEventInner {
                collection: collection.to_string(),
                event_type: CollectionEvents::HookFailure,
                id,
                item: None,
                phase: Some(phase),
                error: Some(error),
                timestamp: Utc::now(),
            }),
        }
    }

    pub fn collection(&self) -> &str {
        &self.inner.collection
    }

    pub fn event_type(&self) -> CollectionEvents {
        self.inner.event_type.clone()
    }

    /// Identifier of the affected document.
    pub fn id(&self) -> &Value {
        &self.inner.id
    }

    /// The document as persisted. `None` for removals and hook failures.
    pub fn item(&self) -> Option<&Document> {
        self.inner.item.as_ref()
    }

    /// The failing phase of a hook failure.
    pub fn phase(&self) -> Option<Phase> {
        self.inner.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.inner.error.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.inner.timestamp
    }
}

impl Debug for CollectionEventInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEventInfo")
            .field("collection", &self.collection())
            .field("event_type", &self.event_type())
            .field("id", self.id())
            .field("item", &self.item())
            .field("phase", &self.phase())
            .field("error", &self.error())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

/// Closure signature of a collection event handler.
pub trait CollectionEventCallback: Send + Sync + Fn(CollectionEventInfo) -> WardenResult<()> {}

impl<F> CollectionEventCallback for F where F: Send + Sync + Fn(CollectionEventInfo) -> WardenResult<()> {}

/// Listener for collection events, registered with
/// [EventAware::subscribe](crate::common::EventAware::subscribe).
///
/// A failing listener is logged and never fails the operation that
/// published the event.
#[derive(Clone)]
pub struct CollectionEventListener {
    on_event: Arc<dyn CollectionEventCallback>,
}

impl CollectionEventListener {
    pub fn new(on_event: impl CollectionEventCallback + 'static) -> Self {
        CollectionEventListener {
            on_event: Arc::new(on_event),
        }
    }
}

impl Handle<CollectionEventInfo> for CollectionEventListener {
    fn handle(&self, event: &Event<CollectionEventInfo>) -> Result<(), BasuError> {
        match (self.on_event)(event.data.clone()) {
            Ok(_) => Ok(()),
            Err(e) => Err(BasuError::HandlerError(Error::from(e))),
        }
    }
}

impl Debug for CollectionEventListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionEventListener").finish()
    }
}
