use crate::collection::{to_document, Document, Entity};
use crate::common::Value;
use crate::errors::WardenResult;
use std::fmt::Debug;
use std::ops::Deref;

/// An entity as returned by a read, together with its composed virtual
/// fields.
///
/// The virtuals live beside the entity, never inside it: passing
/// [`Hydrated::into_entity`] (or a clone of [`Hydrated::entity`]) back into
/// a write cannot persist a virtual value.
///
/// Derefs to the entity, so stored fields read as usual:
///
/// ```rust,ignore
/// let user = users.find_by_id("u-1", None)?.unwrap();
/// println!("{} {}", user.first, user.virtual_value("fullName"));
/// ```
#[derive(Clone, PartialEq)]
pub struct Hydrated<T> {
    entity: T,
    virtuals: Document,
}

impl<T: Entity> Hydrated<T> {
    pub(crate) fn new(entity: T, virtuals: Document) -> Self {
        Hydrated { entity, virtuals }
    }

    pub fn entity(&self) -> &T {
        &self.entity
    }

    pub fn into_entity(self) -> T {
        self.entity
    }

    /// Composed virtual values keyed by virtual name.
    pub fn virtuals(&self) -> &Document {
        &self.virtuals
    }

    /// Value of one virtual; [Value::Null] when no such virtual exists.
    pub fn virtual_value(&self, name: &str) -> Value {
        self.virtuals.get(name).unwrap_or(Value::Null)
    }

    /// Stored fields with the virtual values laid over them, for output
    /// such as API responses. Do not feed this back into a write.
    pub fn to_document(&self) -> WardenResult<Document> {
        let mut document = to_document(&self.entity)?;
        for (name, value) in self.virtuals.iter() {
            document.put(name, value.clone())?;
        }
        Ok(document)
    }
}

impl<T> Deref for Hydrated<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl<T: Debug> Debug for Hydrated<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hydrated")
            .field("entity", &self.entity)
            .field("virtuals", &self.virtuals)
            .finish()
    }
}
