use super::CollectionEventBus;
use crate::collection::{
    from_document, id_of, to_document, BulkOutcome, BulkResult, CollectionConfig,
    CollectionEventInfo, CollectionEvents, Document, Entity,
};
use crate::common::Value;
use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::filter::Filter;
use crate::middleware::{DocumentPass, Middleware, Operation, PassOutcome};
use crate::store::StoreBinding;
use std::sync::Arc;

/// Turns bulk update and remove requests into a sequence of individually
/// hooked single-document writes.
///
/// A bulk request runs in two steps:
///
/// 1. **Resolution**: the query is resolved to an ordered list of ids with
///    a single [resolve_ids](crate::store::StoreBindingProvider::resolve_ids)
///    call. It is never re-evaluated while documents are processed.
/// 2. **Serial passes**: for each id, in resolution order, the current
///    document is loaded and sent through one [DocumentPass]: before hooks,
///    persistence, after hooks. A pass finishes completely, after hooks
///    included, before the next one starts.
///
/// An update applies the patch to the stored document first and maps the
/// result, so a patch that does not fit the entity fails before any hook
/// runs. Update hooks then see the patched value, with the stored value
/// next to it through
/// [HookProvider::handle_update](crate::middleware::HookProvider::handle_update).
/// Stored fields the entity type does not map are carried over into the
/// written document.
///
/// Only a failed resolution fails the whole request. Anything that goes
/// wrong with one document (a rejecting hook, a document that disappeared
/// after resolution, a failed write) is recorded in that document's
/// [BulkOutcome] and the remaining ids are still attempted.
///
/// The store's native multi-document writes are never used, since they
/// would bypass the hooks.
pub(crate) struct MutationSerializer<T> {
    inner: Arc<MutationSerializerInner<T>>,
}

impl<T> Clone for MutationSerializer<T> {
    fn clone(&self) -> Self {
        MutationSerializer {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Entity> MutationSerializer<T> {
    pub fn new(
        binding: StoreBinding,
        middleware: Middleware<T>,
        event_bus: CollectionEventBus,
        config: CollectionConfig,
    ) -> Self {
        MutationSerializer {
            inner: Arc::new(MutationSerializerInner {
                binding,
                middleware,
                event_bus,
                config,
            }),
        }
    }

    /// Inserts one entity: `beforeInsert`, persist, `afterInsert`.
    pub fn insert_document(&self, entity: T) -> WardenResult<T> {
        self.inner.insert_pass(entity).result
    }

    /// Inserts each entity in its own pass, in order.
    pub fn insert_many(&self, entities: Vec<T>) -> BulkResult<T> {
        let mut result = BulkResult::new();
        for entity in entities {
            result.push(self.inner.insert_pass(entity));
        }
        result
    }

    /// Updates every document matching `query`, at most `limit` of them.
    pub fn update_matching(
        &self,
        query: &Filter,
        patch: &Document,
        limit: Option<usize>,
    ) -> WardenResult<BulkResult<T>> {
        let ids = self.inner.resolve(query, limit)?;
        log::debug!(
            "Serializing update of {} documents in {}",
            ids.len(),
            self.inner.config.name()
        );

        let mut result = BulkResult::new();
        for id in ids {
            result.push(self.inner.update_pass(&id, patch));
        }
        Ok(result)
    }

    /// Removes every document matching `query`, at most `limit` of them.
    pub fn remove_matching(&self, query: &Filter, limit: Option<usize>) -> WardenResult<BulkResult<T>> {
        let ids = self.inner.resolve(query, limit)?;
        log::debug!(
            "Serializing removal of {} documents in {}",
            ids.len(),
            self.inner.config.name()
        );

        let mut result = BulkResult::new();
        for id in ids {
            result.push(self.inner.remove_pass(&id));
        }
        Ok(result)
    }

    /// Updates the document with `id`; [ErrorKind::NotFound] if there is none.
    pub fn update_document(&self, id: &Value, patch: &Document) -> WardenResult<T> {
        self.inner.update_pass(id, patch).result
    }

    /// Removes the document with `id`; [ErrorKind::NotFound] if there is none.
    pub fn remove_document(&self, id: &Value) -> WardenResult<T> {
        self.inner.remove_pass(id).result
    }
}

struct MutationSerializerInner<T> {
    binding: StoreBinding,
    middleware: Middleware<T>,
    event_bus: CollectionEventBus,
    config: CollectionConfig,
}

impl<T: Entity> MutationSerializerInner<T> {
    fn resolve(&self, query: &Filter, limit: Option<usize>) -> WardenResult<Vec<Value>> {
        let ids = match self.binding.resolve_ids(query, limit) {
            Ok(ids) => ids,
            Err(e) => {
                log::error!(
                    "Failed to resolve {} in {}: {}",
                    query,
                    self.config.name(),
                    e
                );
                return Err(store_error(
                    &format!("Failed to resolve {} in {}", query, self.config.name()),
                    e,
                ));
            }
        };
        self.config.check_bulk_size(ids.len())?;
        Ok(ids)
    }

    fn insert_pass(&self, entity: T) -> BulkOutcome<T> {
        let mut stored: Option<Document> = None;
        let outcome = DocumentPass::new(
            &self.middleware,
            Operation::Insert,
            format!("new document in {}", self.config.name()),
        )
        .run(entity, |entity| {
            let document = to_document(&entity)?;
            let persisted = self
                .binding
                .persist_insert(document)
                .map_err(|e| store_error("Failed to insert document", e))?;
            let entity = from_document::<T>(persisted.clone())?;
            stored = Some(persisted);
            Ok(entity)
        });

        let id = stored
            .as_ref()
            .and_then(|document| id_of(document, &self.binding.id_field()).ok())
            .unwrap_or(Value::Null);
        self.report(Operation::Insert, &id, stored, &outcome);
        bulk_outcome(id, outcome)
    }

    fn update_pass(&self, id: &Value, patch: &Document) -> BulkOutcome<T> {
        let prepared = self
            .load(id)
            .and_then(|stored| self.prepare_update(id, stored, patch));
        let (before, after, unmapped) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => return failed(id, e),
        };

        let mut stored: Option<Document> = None;
        let outcome = DocumentPass::new(&self.middleware, Operation::Update, self.label(id))
            .with_previous(&before)
            .run(after, |entity| {
                let mut document = unmapped.clone();
                document.merge(&to_document(&entity)?)?;
                self.pin_id(id, &mut document)?;
                from_document::<T>(document.clone())?;
                let persisted = self
                    .binding
                    .persist_update(document)
                    .map_err(|e| store_error(&format!("Failed to update document {}", id), e))?;
                let entity = from_document::<T>(persisted.clone())?;
                stored = Some(persisted);
                Ok(entity)
            });

        self.report(Operation::Update, id, stored, &outcome);
        bulk_outcome(id.clone(), outcome)
    }

    /// Applies `patch` to the stored document and maps both versions.
    ///
    /// Returns the stored entity, the patched entity and the stored fields
    /// the entity type does not map. A patch that leaves the document
    /// unmappable fails here, before any hook runs.
    fn prepare_update(
        &self,
        id: &Value,
        stored: Document,
        patch: &Document,
    ) -> WardenResult<(T, T, Document)> {
        let before = from_document::<T>(stored.clone())?;
        let mut patched = stored;
        self.binding.apply_patch(&mut patched, patch)?;
        self.pin_id(id, &mut patched)?;
        let after = from_document::<T>(patched.clone())?;
        let unmapped = unmapped_fields(&patched, &to_document(&after)?)?;
        Ok((before, after, unmapped))
    }

    fn remove_pass(&self, id: &Value) -> BulkOutcome<T> {
        let entity = match self.load(id).and_then(from_document::<T>) {
            Ok(entity) => entity,
            Err(e) => return failed(id, e),
        };

        let outcome = DocumentPass::new(&self.middleware, Operation::Remove, self.label(id)).run(
            entity,
            |entity| {
                self.binding
                    .persist_delete(id)
                    .map_err(|e| store_error(&format!("Failed to remove document {}", id), e))?;
                Ok(entity)
            },
        );

        self.report(Operation::Remove, id, None, &outcome);
        bulk_outcome(id.clone(), outcome)
    }

    /// Loads the current document. A resolved id whose document has since
    /// disappeared is [ErrorKind::NotFound].
    fn load(&self, id: &Value) -> WardenResult<Document> {
        let loaded = self
            .binding
            .load_by_id(id)
            .map_err(|e| store_error(&format!("Failed to load document {}", id), e))?;
        match loaded {
            Some(document) => Ok(document),
            None => {
                log::error!("Document {} not found in {}", id, self.config.name());
                Err(WardenError::new(
                    &format!("Document {} not found in {}", id, self.config.name()),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Keeps an update on the document it was loaded from. Hooks may drop
    /// the id (it is put back) but not change it.
    fn pin_id(&self, id: &Value, document: &mut Document) -> WardenResult<()> {
        let id_field = self.binding.id_field();
        let current = document.get(&id_field)?;
        if current.is_null() {
            return document.put(&id_field, id.clone());
        }
        if &current != id {
            log::error!("Update of document {} tried to change its id to {}", id, current);
            return Err(WardenError::new(
                &format!("Update of document {} tried to change its id to {}", id, current),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn label(&self, id: &Value) -> String {
        format!("document {} in {}", id, self.config.name())
    }

    /// Publishes the write event of a persisted document and reports an
    /// after-phase failure on the out-of-band channel.
    fn report(&self, operation: Operation, id: &Value, stored: Option<Document>, outcome: &PassOutcome<T>) {
        if let Some(e) = outcome.after_hook_error() {
            log::warn!(
                "{} hook failed on document {} in {} after it was persisted: {}",
                operation.after(),
                id,
                self.config.name(),
                e
            );
        }

        if !self.config.publish_events() {
            return;
        }

        if outcome.is_persisted() {
            let event_type = match operation {
                Operation::Insert => CollectionEvents::Insert,
                Operation::Update => CollectionEvents::Update,
                Operation::Remove => CollectionEvents::Remove,
            };
            self.publish(CollectionEventInfo::new(self.config.name(), event_type, id.clone(), stored));
        }

        if let Some(e) = outcome.after_hook_error() {
            self.publish(CollectionEventInfo::hook_failure(
                self.config.name(),
                id.clone(),
                operation.after(),
                e.to_string(),
            ));
        }
    }

    fn publish(&self, event: CollectionEventInfo) {
        let event_type = event.event_type();
        if let Err(e) = self.event_bus.publish(event) {
            log::warn!("Failed to publish {:?} event for {}: {}", event_type, self.config.name(), e);
        }
    }
}

fn bulk_outcome<T>(id: Value, outcome: PassOutcome<T>) -> BulkOutcome<T> {
    let (result, after_hook_error) = outcome.into_parts();
    BulkOutcome {
        id,
        result,
        after_hook_error,
    }
}

/// Top-level fields of `document` missing from its mapped form `mapped`.
fn unmapped_fields(document: &Document, mapped: &Document) -> WardenResult<Document> {
    let mut unmapped = Document::new();
    for (key, value) in document.iter() {
        if !mapped.contains_key(key) {
            unmapped.put(key, value.clone())?;
        }
    }
    Ok(unmapped)
}

fn failed<T>(id: &Value, error: WardenError) -> BulkOutcome<T> {
    BulkOutcome {
        id: id.clone(),
        result: Err(error),
        after_hook_error: None,
    }
}

/// Reports a failed store round trip as [ErrorKind::StoreError]. Errors that
/// already say what went wrong at the store (`StoreError`, `NotFound`) pass
/// through unchanged.
fn store_error(message: &str, cause: WardenError) -> WardenError {
    match cause.kind() {
        ErrorKind::StoreError | ErrorKind::NotFound => cause,
        _ => WardenError::new_with_cause(
            &format!("{}: {}", message, cause),
            ErrorKind::StoreError,
            cause,
        ),
    }
}
