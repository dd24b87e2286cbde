use crate::collection::CollectionEventListener;
use crate::common::WARDEN_EVENT;
use crate::errors::{ErrorKind, WardenError, WardenResult};
use basu::error::BasuError;
use basu::event::Event;
use basu::{EventBus, Handle, HandlerId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Types that accept collection event listeners.
pub trait EventAware {
    fn subscribe(&self, listener: CollectionEventListener) -> WardenResult<Option<SubscriberRef>>;

    fn unsubscribe(&self, subscriber: SubscriberRef) -> WardenResult<()>;
}

/// Publishes events to registered listeners.
///
/// A thin PIMPL wrapper over a [`basu::EventBus`] bound to a single topic.
/// Publishing is a no-op when nobody listens, so collections can publish
/// unconditionally.
///
/// # Example
///
/// ```ignore
/// let event_bus: WardenEventBus<E, L> = WardenEventBus::new();
/// let subscriber = event_bus.register(listener)?;
/// event_bus.publish(event)?;
/// event_bus.deregister(subscriber.unwrap())?;
/// ```
#[derive(Clone)]
pub struct WardenEventBus<E, L> {
    inner: Arc<WardenEventBusInner<E, L>>,
}

impl<E, L> Default for WardenEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L> WardenEventBus<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    pub fn new() -> Self {
        WardenEventBus {
            inner: Arc::new(WardenEventBusInner::new()),
        }
    }

    /// Registers an event listener with the bus.
    pub fn register(&self, listener: L) -> WardenResult<Option<SubscriberRef>> {
        self.inner.register(listener)
    }

    /// Deregisters a previously registered event listener.
    pub fn deregister(&self, subscriber: SubscriberRef) -> WardenResult<()> {
        self.inner.deregister(subscriber)
    }

    /// Publishes an event to all registered listeners.
    pub fn publish(&self, event: E) -> WardenResult<()> {
        self.inner.publish(event)
    }
}

/// Handle returned by [`WardenEventBus::register`], used to deregister.
pub struct SubscriberRef {
    pub(crate) inner: HandlerId,
}

impl SubscriberRef {
    pub fn new(inner: HandlerId) -> Self {
        SubscriberRef { inner }
    }
}

struct WardenEventBusInner<E, L> {
    event_bus: EventBus<E>,
    phantom_data: PhantomData<L>,
}

impl<E, L> WardenEventBusInner<E, L>
where
    L: Handle<E> + 'static,
    E: Send + Sync,
{
    fn new() -> Self {
        WardenEventBusInner {
            event_bus: EventBus::new(),
            phantom_data: PhantomData,
        }
    }

    fn register(&self, listener: L) -> WardenResult<Option<SubscriberRef>> {
        match self.event_bus.subscribe(WARDEN_EVENT, Box::new(listener)) {
            Ok(subscriber) => Ok(Some(SubscriberRef::new(subscriber))),
            Err(e) => Err(Self::warden_error(e)),
        }
    }

    #[inline]
    fn deregister(&self, subscriber: SubscriberRef) -> WardenResult<()> {
        self.event_bus
            .unsubscribe(WARDEN_EVENT, &subscriber.inner)
            .map_err(Self::warden_error)
    }

    #[inline]
    fn publish(&self, event: E) -> WardenResult<()> {
        let handler_count = match self.event_bus.get_handler_count(WARDEN_EVENT) {
            Ok(count) => count,
            // nobody ever subscribed to the topic
            Err(BasuError::EventTypeNotFOUND) => return Ok(()),
            Err(e) => return Err(Self::warden_error(e)),
        };

        if handler_count == 0 {
            return Ok(());
        }

        let basu_event = Event::new(event);
        self.event_bus
            .publish(WARDEN_EVENT, &basu_event)
            .map_err(Self::warden_error)
    }

    fn warden_error(e: BasuError) -> WardenError {
        match e {
            BasuError::EventTypeNotFOUND => WardenError::new(
                "Event bus error: the requested event type is not registered",
                ErrorKind::EventError,
            ),
            BasuError::MutexPoisoned => WardenError::new(
                "Event bus error: internal mutex poisoned",
                ErrorKind::EventError,
            ),
            BasuError::HandlerError(e) => {
                let error_message = e
                    .source()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| e.to_string());
                WardenError::new(
                    &format!("Event handler error: {}", error_message),
                    ErrorKind::EventError,
                )
            }
        }
    }
}
