use crate::collection::Document;
use crate::common::{Value, PATCH_INC, PATCH_SET, PATCH_UNSET};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::filter::Filter;
use crate::store::{AggregateStage, FindOptions};
use std::ops::Deref;
use std::sync::Arc;

/// Lazy stream of documents produced by a store read.
pub type DocumentCursor = Box<dyn Iterator<Item = WardenResult<Document>> + Send>;

/// The operations a collection needs from the underlying document store.
///
/// A binding serves one named collection. It works purely on [Document]s,
/// so it stays object safe and ignorant of the entity type. Every method is
/// a single round trip; the collection layers hooks, virtuals and the
/// per-document serialization of bulk writes on top.
///
/// Queries ([Filter]) and patches ([Document]) are opaque to the collection
/// and interpreted here.
pub trait StoreBindingProvider: Send + Sync {
    /// Name of the collection this binding serves.
    fn name(&self) -> String;

    /// Field under which documents carry their identifier.
    fn id_field(&self) -> String;

    /// Returns the ids of the documents matching `filter`, in the store's
    /// natural match order, truncated to `limit` when given.
    fn resolve_ids(&self, filter: &Filter, limit: Option<usize>) -> WardenResult<Vec<Value>>;

    /// Returns a lazy cursor over the documents matching `filter`.
    fn find(&self, filter: &Filter, options: &FindOptions) -> WardenResult<DocumentCursor>;

    /// Loads one document by id; `Ok(None)` when it does not exist.
    fn load_by_id(&self, id: &Value) -> WardenResult<Option<Document>>;

    /// Applies `patch` to `document` in memory.
    ///
    /// The default merges every field of the patch into the document.
    fn apply_patch(&self, document: &mut Document, patch: &Document) -> WardenResult<()> {
        document.merge(patch)
    }

    /// Inserts a new document and returns it as stored.
    fn persist_insert(&self, document: Document) -> WardenResult<Document>;

    /// Replaces the stored document carrying the same id and returns it as
    /// stored.
    fn persist_update(&self, document: Document) -> WardenResult<Document>;

    /// Deletes the document with the given id.
    fn persist_delete(&self, id: &Value) -> WardenResult<()>;

    /// Runs an aggregation pipeline over the collection.
    fn run_aggregate(&self, stages: &[AggregateStage]) -> WardenResult<Vec<Document>>;
}

/// Cloneable handle to a [StoreBindingProvider].
#[derive(Clone)]
pub struct StoreBinding {
    inner: Arc<dyn StoreBindingProvider>,
}

impl StoreBinding {
    pub fn new<T: StoreBindingProvider + 'static>(inner: T) -> Self {
        StoreBinding {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for StoreBinding {
    type Target = Arc<dyn StoreBindingProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

/// A document store able to hand out per-collection bindings.
pub trait StoreProvider: Send + Sync {
    /// Opens (creating if needed) the collection `name` whose documents are
    /// identified by `id_field`.
    fn open_binding(&self, name: &str, id_field: &str) -> WardenResult<StoreBinding>;
}

/// Applies an update patch the way the bundled bindings understand it.
///
/// Plain fields are merged into the document. The operator fields
/// `$set` (a document merged in), `$unset` (a field name or a list of
/// them, or a document whose keys are removed) and `$inc` (a document of
/// numeric deltas) are applied afterwards, in that order.
pub fn apply_update_patch(document: &mut Document, patch: &Document) -> WardenResult<()> {
    let mut plain = Document::new();
    for (key, value) in patch.iter() {
        if !key.starts_with('$') {
            plain.put(key, value.clone())?;
        } else if key != PATCH_SET && key != PATCH_UNSET && key != PATCH_INC {
            log::error!("Unsupported patch operator {}", key);
            return Err(WardenError::new(
                &format!("Unsupported patch operator {}", key),
                ErrorKind::InvalidOperation,
            ));
        }
    }
    document.merge(&plain)?;

    match patch.get(PATCH_SET)? {
        Value::Null => {}
        Value::Document(set) => document.merge(&set)?,
        other => return Err(operator_error(PATCH_SET, &other)),
    }

    match patch.get(PATCH_UNSET)? {
        Value::Null => {}
        Value::String(field) => document.remove(&field)?,
        Value::Array(fields) => {
            for field in fields {
                match field.as_str() {
                    Some(name) => document.remove(name)?,
                    None => return Err(operator_error(PATCH_UNSET, &field)),
                }
            }
        }
        Value::Document(fields) => {
            for name in fields.keys() {
                document.remove(name)?;
            }
        }
        other => return Err(operator_error(PATCH_UNSET, &other)),
    }

    match patch.get(PATCH_INC)? {
        Value::Null => {}
        Value::Document(deltas) => {
            for (field, delta) in deltas.iter() {
                let current = match document.get(field)? {
                    Value::Null => Value::I64(0),
                    value => value,
                };
                document.put(field, current.checked_add(delta)?)?;
            }
        }
        other => return Err(operator_error(PATCH_INC, &other)),
    }

    Ok(())
}

fn operator_error(operator: &str, operand: &Value) -> WardenError {
    log::error!("Invalid operand {} for patch operator {}", operand, operator);
    WardenError::new(
        &format!("Invalid operand {} for patch operator {}", operand, operator),
        ErrorKind::InvalidOperation,
    )
}
