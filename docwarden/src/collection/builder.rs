use crate::collection::{Collection, CollectionConfig, Entity};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use crate::middleware::{Hook, Middleware, MiddlewareBuilder, Phase};
use crate::store::StoreProvider;
use crate::virtuals::{Virtual, VirtualComposer};

/// Builder for a [Collection].
///
/// Hooks and virtuals are captured here and frozen by [build](Self::build);
/// a built collection's middleware and virtuals never change.
///
/// Configuration mistakes do not fail the chained calls. The first one is
/// kept and returned by `build`.
///
/// ```rust,ignore
/// let users = Collection::<User>::builder()
///     .name("users")
///     .hook(Phase::BeforeUpdate, Hook::from_fn("reject-locked", reject_locked))
///     .virtual_field(Virtual::infallible("fullName", |u: &User| format!("{} {}", u.first, u.last)))
///     .max_bulk_documents(500)
///     .build(&store)?;
/// ```
pub struct CollectionBuilder<T> {
    error: Option<WardenError>,
    name: String,
    middleware: MiddlewareBuilder<T>,
    virtuals: Vec<Virtual<T>>,
    publish_events: bool,
    max_bulk_documents: Option<usize>,
}

impl<T: Entity> Default for CollectionBuilder<T> {
    fn default() -> Self {
        CollectionBuilder::new()
    }
}

impl<T: Entity> CollectionBuilder<T> {
    pub fn new() -> Self {
        CollectionBuilder {
            error: None,
            name: T::entity_name(),
            middleware: MiddlewareBuilder::new(),
            virtuals: Vec::new(),
            publish_events: true,
            max_bulk_documents: None,
        }
    }

    /// Sets the store collection name. Defaults to [Entity::entity_name].
    pub fn name(mut self, name: &str) -> Self {
        if self.error.is_none() && name.trim().is_empty() {
            log::error!("Collection name cannot be empty");
            self.error = Some(WardenError::new(
                "Collection name cannot be empty",
                ErrorKind::InvalidOperation,
            ));
        }
        self.name = name.to_string();
        self
    }

    /// Appends every hook of `middleware`, keeping their order.
    pub fn middleware(mut self, middleware: Middleware<T>) -> Self {
        self.middleware = self.middleware.extend(&middleware);
        self
    }

    /// Appends one hook for `phase`.
    pub fn hook(mut self, phase: Phase, hook: Hook<T>) -> Self {
        self.middleware = self.middleware.on(phase, hook);
        self
    }

    /// Registers a virtual; it is evaluated after the ones registered
    /// before it.
    pub fn virtual_field(mut self, field: Virtual<T>) -> Self {
        if self.error.is_none() && self.virtuals.iter().any(|v| v.name() == field.name()) {
            log::error!("Virtual field {} is registered more than once", field.name());
            self.error = Some(WardenError::new(
                &format!("Virtual field {} is registered more than once", field.name()),
                ErrorKind::InvalidOperation,
            ));
        }
        self.virtuals.push(field);
        self
    }

    /// Whether writes publish collection events. Defaults to `true`.
    pub fn publish_events(mut self, publish_events: bool) -> Self {
        self.publish_events = publish_events;
        self
    }

    /// Caps the number of documents one bulk update or remove may touch.
    pub fn max_bulk_documents(mut self, limit: usize) -> Self {
        if self.error.is_none() && limit == 0 {
            log::error!("Bulk document limit must be greater than zero");
            self.error = Some(WardenError::new(
                "Bulk document limit must be greater than zero",
                ErrorKind::InvalidOperation,
            ));
        }
        self.max_bulk_documents = Some(limit);
        self
    }

    /// Opens the collection's binding in `store` and builds the collection.
    ///
    /// # Errors
    ///
    /// The first configuration error recorded by the builder, or the error
    /// of opening the binding.
    pub fn build(self, store: &dyn StoreProvider) -> WardenResult<Collection<T>> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let composer = VirtualComposer::new(self.virtuals)?;
        let binding = store.open_binding(&self.name, T::id_field())?;
        let config = CollectionConfig::new(self.name, self.publish_events, self.max_bulk_documents);
        log::debug!("Built collection {:?}", config);
        Ok(Collection::new(binding, self.middleware.build(), composer, config))
    }
}
