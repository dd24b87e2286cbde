use docwarden::collection::{Document, Entity};
use docwarden::common::{Atomic, ReadExecutor, Value, WriteExecutor};
use docwarden::errors::{ErrorKind, WardenError, WardenResult};
use docwarden::filter::Filter;
use docwarden::middleware::{Hook, Phase};
use docwarden::store::{
    AggregateStage, DocumentCursor, FindOptions, MemoryStore, StoreBinding, StoreBindingProvider,
    StoreProvider,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs `test` against the context built by `before`, then `after`.
///
/// `after` also runs when the test fails. Failures and panics are reported
/// with the elapsed time and re-raised as a panic.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> WardenResult<()>,
    B: Fn() -> WardenResult<TestContext>,
    A: Fn(TestContext) -> WardenResult<()>,
{
    let start_time = Instant::now();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| match before() {
        Ok(ctx) => match test(ctx.clone()) {
            Ok(_) => after(ctx).map_err(|e| format!("After run failed: {:?}", e)),
            Err(e) => {
                let _ = after(ctx);
                Err(format!("Test failed: {:?}", e))
            }
        },
        Err(e) => Err(format!("Before run failed: {:?}", e)),
    }));

    let error = match result {
        Ok(Ok(_)) => return,
        Ok(Err(e)) => e,
        Err(panic_err) => {
            if let Some(s) = panic_err.downcast_ref::<&str>() {
                format!("Panic: {}", s)
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                format!("Panic: {}", s)
            } else {
                "Panic: unknown payload".to_string()
            }
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Took {:?}", start_time.elapsed());
    eprintln!("{}", error);
    eprintln!("=====================================================\n");
    panic!("{}", error);
}

/// Everything a test needs: an in-memory store behind a binding wrapper
/// that records writes and can be told to fail.
#[derive(Clone)]
pub struct TestContext {
    memory: MemoryStore,
    store: FaultyStore,
}

impl TestContext {
    pub fn new(memory: MemoryStore) -> Self {
        let store = FaultyStore {
            memory: memory.clone(),
            faults: Faults::default(),
        };
        TestContext { memory, store }
    }

    /// Store to build collections against.
    pub fn store(&self) -> &FaultyStore {
        &self.store
    }

    /// The underlying store, bypassing fault injection and recording.
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn faults(&self) -> &Faults {
        &self.store.faults
    }

    /// Direct binding to a collection, for reading what is really stored.
    pub fn raw(&self, name: &str, id_field: &str) -> WardenResult<StoreBinding> {
        self.memory.open_binding(name, id_field)
    }
}

pub fn create_test_context() -> WardenResult<TestContext> {
    Ok(TestContext::new(MemoryStore::new()))
}

pub fn cleanup(ctx: TestContext) -> WardenResult<()> {
    for name in ctx.memory().collection_names() {
        ctx.memory().drop_collection(&name);
    }
    Ok(())
}

/// Failures to inject and writes recorded by a [FaultyStore].
#[derive(Clone, Default)]
pub struct Faults {
    inner: Atomic<FaultState>,
}

#[derive(Default)]
struct FaultState {
    fail_resolve: bool,
    fail_writes_for: HashSet<Value>,
    inserted: Vec<Document>,
    updated: Vec<Document>,
}

impl Faults {
    pub fn fail_resolve(&self, fail: bool) {
        self.inner.write_with(|state| state.fail_resolve = fail);
    }

    /// Makes every update and delete of the document with `id` fail with
    /// a store error.
    pub fn fail_writes_for<I: Into<Value>>(&self, id: I) {
        let id = id.into();
        self.inner.write_with(|state| state.fail_writes_for.insert(id));
    }

    /// Documents handed to `persist_insert`, in call order.
    pub fn inserted(&self) -> Vec<Document> {
        self.inner.read_with(|state| state.inserted.clone())
    }

    /// Documents handed to `persist_update`, in call order.
    pub fn updated(&self) -> Vec<Document> {
        self.inner.read_with(|state| state.updated.clone())
    }

    fn should_fail_resolve(&self) -> bool {
        self.inner.read_with(|state| state.fail_resolve)
    }

    fn check_write(&self, id: &Value) -> WardenResult<()> {
        if self.inner.read_with(|state| state.fail_writes_for.contains(id)) {
            return Err(WardenError::new(
                &format!("Injected write failure for {}", id),
                ErrorKind::StoreError,
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct FaultyStore {
    memory: MemoryStore,
    faults: Faults,
}

impl StoreProvider for FaultyStore {
    fn open_binding(&self, name: &str, id_field: &str) -> WardenResult<StoreBinding> {
        let inner = self.memory.open_binding(name, id_field)?;
        Ok(StoreBinding::new(FaultyBinding {
            inner,
            faults: self.faults.clone(),
        }))
    }
}

struct FaultyBinding {
    inner: StoreBinding,
    faults: Faults,
}

impl StoreBindingProvider for FaultyBinding {
    fn name(&self) -> String {
        self.inner.name()
    }

    fn id_field(&self) -> String {
        self.inner.id_field()
    }

    fn resolve_ids(&self, filter: &Filter, limit: Option<usize>) -> WardenResult<Vec<Value>> {
        if self.faults.should_fail_resolve() {
            return Err(WardenError::new("Injected resolution failure", ErrorKind::StoreError));
        }
        self.inner.resolve_ids(filter, limit)
    }

    fn find(&self, filter: &Filter, options: &FindOptions) -> WardenResult<DocumentCursor> {
        self.inner.find(filter, options)
    }

    fn load_by_id(&self, id: &Value) -> WardenResult<Option<Document>> {
        self.inner.load_by_id(id)
    }

    fn apply_patch(&self, document: &mut Document, patch: &Document) -> WardenResult<()> {
        self.inner.apply_patch(document, patch)
    }

    fn persist_insert(&self, document: Document) -> WardenResult<Document> {
        self.faults
            .inner
            .write_with(|state| state.inserted.push(document.clone()));
        self.inner.persist_insert(document)
    }

    fn persist_update(&self, document: Document) -> WardenResult<Document> {
        self.faults.check_write(&document.get(&self.inner.id_field())?)?;
        self.faults
            .inner
            .write_with(|state| state.updated.push(document.clone()));
        self.inner.persist_update(document)
    }

    fn persist_delete(&self, id: &Value) -> WardenResult<()> {
        self.faults.check_write(id)?;
        self.inner.persist_delete(id)
    }

    fn run_aggregate(&self, stages: &[AggregateStage]) -> WardenResult<Vec<Document>> {
        self.inner.run_aggregate(stages)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub edits: i64,
}

impl Entity for Ticket {
    fn entity_name() -> String {
        "tickets".to_string()
    }
}

pub fn ticket(id: &str, title: &str, status: &str) -> Ticket {
    Ticket {
        id: Some(id.to_string()),
        title: title.to_string(),
        status: status.to_string(),
        edits: 0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub first: String,
    pub last: String,
}

impl Entity for Person {
    fn entity_name() -> String {
        "people".to_string()
    }
}

pub fn person(first: &str, last: &str) -> Person {
    Person {
        id: None,
        first: first.to_string(),
        last: last.to_string(),
    }
}

pub fn initials(p: &Person) -> String {
    p.first.chars().take(1).chain(p.last.chars().take(1)).collect()
}

/// Shared log of `phase:hook:label` lines written by [recorder] hooks.
pub type HookLog = Arc<Mutex<Vec<String>>>;

pub fn hook_log() -> HookLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A pass-through hook appending `phase:name:label(entity)` to `log`.
pub fn recorder<T, F>(name: &'static str, log: HookLog, label: F) -> Hook<T>
where
    T: Entity,
    F: Fn(&T) -> String + Send + Sync + 'static,
{
    Hook::from_fn(name, move |entity: T, phase: Phase| {
        log.lock().push(format!("{}:{}:{}", phase, name, label(&entity)));
        Ok(entity)
    })
}

/// Rejects writes to tickets whose stored status is `locked`. On insert the
/// incoming ticket is checked.
pub fn reject_locked() -> Hook<Ticket> {
    Hook::from_update_fn("reject-locked", |stored: &Ticket, t: Ticket, _| {
        if stored.status == "locked" {
            return Err(WardenError::new(
                &format!("ticket {} is locked", t.id.clone().unwrap_or_default()),
                ErrorKind::ValidationError,
            ));
        }
        Ok(t)
    })
}

pub fn wait_for<F: Fn() -> bool>(timeout_ms: u64, check: F) {
    awaitility::at_most(Duration::from_millis(timeout_ms)).until(check);
}

