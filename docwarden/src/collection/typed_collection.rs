use crate::collection::operation::{CollectionEventBus, MutationSerializer, ReadOperations};
use crate::collection::{
    BulkResult, CollectionBuilder, CollectionConfig, CollectionEventListener, Document, Entity,
    EntityCursor, Hydrated,
};
use crate::common::{EventAware, SubscriberRef, Value};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::filter::{by_id, Filter};
use crate::middleware::Middleware;
use crate::store::{AggregateStage, FindOptions, Projection, StoreBinding};
use crate::virtuals::VirtualComposer;
use std::fmt::Debug;
use std::sync::Arc;

/// Typed access to one collection of a document store.
///
/// A collection owns the [Middleware] and [VirtualComposer] it was built
/// with. Every write goes through the middleware one document at a time,
/// bulk writes included, and every document returned by `find`,
/// `find_one`, `find_by_id` and `insert` carries its composed virtuals.
///
/// Cloning is cheap; clones share the same binding, hooks and listeners.
///
/// # Reads
///
/// ```rust,ignore
/// let open = tickets.find(field("status").eq("open"), None)?;
/// for ticket in open {
///     let ticket = ticket?;
///     println!("{} {}", ticket.title, ticket.virtual_value("age"));
/// }
/// let one = tickets.find_by_id("t-1", None)?;
/// ```
///
/// # Writes
///
/// `update` and `remove` resolve the matching ids once, then write the
/// documents one after the other, each through its own before hooks,
/// persistence and after hooks. A document a hook rejects is left out of
/// the result; the others are still written.
///
/// ```rust,ignore
/// let closed = tickets.update(field("status").eq("open"), &doc! { status: "closed" })?;
/// let outcomes = tickets.remove_with_outcomes(field("status").eq("closed"))?;
/// for (id, error) in outcomes.failures() {
///     log::warn!("{} was not removed: {}", id, error);
/// }
/// ```
pub struct Collection<T> {
    inner: Arc<CollectionInner<T>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn builder() -> CollectionBuilder<T> {
        CollectionBuilder::new()
    }

    pub(crate) fn new(
        binding: StoreBinding,
        middleware: Middleware<T>,
        composer: VirtualComposer<T>,
        config: CollectionConfig,
    ) -> Self {
        let event_bus = CollectionEventBus::new();
        let reads = ReadOperations::new(binding.clone(), composer.clone());
        let writes = MutationSerializer::new(
            binding.clone(),
            middleware.clone(),
            event_bus.clone(),
            config.clone(),
        );
        Collection {
            inner: Arc::new(CollectionInner {
                config,
                binding,
                middleware,
                composer,
                event_bus,
                reads,
                writes,
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.config.name()
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    pub fn middleware(&self) -> &Middleware<T> {
        &self.inner.middleware
    }

    pub fn virtuals(&self) -> &VirtualComposer<T> {
        &self.inner.composer
    }

    /// Lazily reads every document matching `query`.
    ///
    /// Fields left out by `projection` must be optional (or defaulted) in
    /// `T`, otherwise those elements fail to map.
    pub fn find(&self, query: Filter, projection: Option<Projection>) -> WardenResult<EntityCursor<T>> {
        let mut options = FindOptions::new();
        if let Some(projection) = projection {
            options = options.projection(projection);
        }
        self.inner.reads.find(&query, &options)
    }

    /// [find](Self::find) with sorting, paging and projection.
    pub fn find_with_options(&self, query: Filter, options: &FindOptions) -> WardenResult<EntityCursor<T>> {
        self.inner.reads.find(&query, options)
    }

    /// First document matching `query`. No match is `Ok(None)`.
    pub fn find_one(&self, query: Filter, projection: Option<Projection>) -> WardenResult<Option<Hydrated<T>>> {
        self.inner.reads.find_one(&query, projection)
    }

    /// The document with identifier `id`. No match is `Ok(None)`.
    pub fn find_by_id<I: Into<Value>>(
        &self,
        id: I,
        projection: Option<Projection>,
    ) -> WardenResult<Option<Hydrated<T>>> {
        self.inner.reads.find_by_id(&id.into(), projection)
    }

    /// Number of documents matching `query`.
    pub fn count(&self, query: Filter) -> WardenResult<usize> {
        self.inner.reads.count(&query)
    }

    /// Runs an aggregation pipeline in the store.
    ///
    /// The output may not resemble `T`, so it is returned as plain
    /// documents and no virtuals are composed.
    pub fn aggregate(&self, stages: &[AggregateStage]) -> WardenResult<Vec<Document>> {
        self.inner.reads.aggregate(stages)
    }

    /// Inserts `entity` and returns it as persisted, virtuals composed.
    ///
    /// # Errors
    ///
    /// - [ErrorKind::ValidationError] if a `beforeInsert` hook rejected it
    /// - [ErrorKind::StoreError] if the store could not write it
    /// - [ErrorKind::VirtualEvaluationError] if the entity was written but a
    ///   virtual failed on it
    pub fn insert(&self, entity: T) -> WardenResult<Hydrated<T>> {
        let inserted = self.inner.writes.insert_document(entity)?;
        self.inner.composer.compose(inserted)
    }

    /// Inserts each entity through its own hooks, in order. One failed
    /// insert does not stop the others.
    pub fn insert_many(&self, entities: Vec<T>) -> WardenResult<BulkResult<T>> {
        Ok(self.inner.writes.insert_many(entities))
    }

    /// Applies `patch` to every document matching `query`, one document at
    /// a time, and returns the documents that were written, in match order.
    ///
    /// Documents rejected by a `beforeUpdate` hook or whose write failed are
    /// left out; use [update_with_outcomes](Self::update_with_outcomes) to
    /// see why. Only a failure to resolve `query` fails the call.
    pub fn update(&self, query: Filter, patch: &Document) -> WardenResult<Vec<T>> {
        Ok(self.update_with_outcomes(query, patch)?.into_successes())
    }

    /// [update](Self::update), returning the outcome of every matched
    /// document.
    pub fn update_with_outcomes(&self, query: Filter, patch: &Document) -> WardenResult<BulkResult<T>> {
        self.inner.writes.update_matching(&query, patch, None)
    }

    /// Applies `patch` to the first document matching `query`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::NotFound] when nothing matches, otherwise the failure of
    /// that one document.
    pub fn update_one(&self, query: Filter, patch: &Document) -> WardenResult<T> {
        let result = self.inner.writes.update_matching(&query, patch, Some(1))?;
        self.single(result, &query)
    }

    /// Applies `patch` to the document with identifier `id`.
    pub fn update_by_id<I: Into<Value>>(&self, id: I, patch: &Document) -> WardenResult<T> {
        self.inner.writes.update_document(&id.into(), patch)
    }

    /// Removes every document matching `query`, one document at a time.
    ///
    /// Per-document failures are not reported here; see
    /// [remove_with_outcomes](Self::remove_with_outcomes).
    pub fn remove(&self, query: Filter) -> WardenResult<()> {
        let result = self.remove_with_outcomes(query)?;
        if result.failure_count() > 0 {
            log::debug!(
                "{} of {} documents were not removed from {}",
                result.failure_count(),
                result.len(),
                self.name()
            );
        }
        Ok(())
    }

    pub fn remove_with_outcomes(&self, query: Filter) -> WardenResult<BulkResult<T>> {
        self.inner.writes.remove_matching(&query, None)
    }

    /// Removes the first document matching `query` and returns it.
    pub fn remove_one(&self, query: Filter) -> WardenResult<T> {
        let result = self.inner.writes.remove_matching(&query, Some(1))?;
        self.single(result, &query)
    }

    /// Removes the document with identifier `id` and returns it.
    ///
    /// # Errors
    ///
    /// [ErrorKind::NotFound] when no such document exists.
    pub fn remove_by_id<I: Into<Value>>(&self, id: I) -> WardenResult<T> {
        self.inner.writes.remove_document(&id.into())
    }

    /// The binding this collection writes through.
    pub fn binding(&self) -> &StoreBinding {
        &self.inner.binding
    }

    /// Filter selecting the document with identifier `id`.
    pub fn id_filter<I: Into<Value>>(&self, id: I) -> Filter {
        by_id(T::id_field(), id)
    }

    fn single(&self, result: BulkResult<T>, query: &Filter) -> WardenResult<T> {
        match result.into_iter().next() {
            Some(outcome) => outcome.result,
            None => {
                log::error!("No document in {} matches {}", self.name(), query);
                Err(WardenError::new(
                    &format!("No document in {} matches {}", self.name(), query),
                    ErrorKind::NotFound,
                ))
            }
        }
    }
}

impl<T: Entity> EventAware for Collection<T> {
    fn subscribe(&self, listener: CollectionEventListener) -> WardenResult<Option<SubscriberRef>> {
        self.inner.event_bus.register(listener)
    }

    fn unsubscribe(&self, subscriber: SubscriberRef) -> WardenResult<()> {
        self.inner.event_bus.deregister(subscriber)
    }
}

impl<T> Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("config", &self.inner.config)
            .finish()
    }
}

struct CollectionInner<T> {
    config: CollectionConfig,
    binding: StoreBinding,
    middleware: Middleware<T>,
    composer: VirtualComposer<T>,
    event_bus: CollectionEventBus,
    reads: ReadOperations<T>,
    writes: MutationSerializer<T>,
}
