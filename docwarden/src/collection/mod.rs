//! Typed collections over a document store.
//!
//! A [`Collection`] binds one [`Entity`] type to one named collection of a
//! store. It is built once with a [`CollectionBuilder`], which captures the
//! collection's hooks and virtuals; neither set changes afterwards.
//!
//! ```rust,ignore
//! use docwarden::collection::Collection;
//! use docwarden::filter::field;
//! use docwarden::middleware::{Hook, Phase};
//! use docwarden::store::MemoryStore;
//! use docwarden::virtuals::Virtual;
//!
//! let store = MemoryStore::new();
//! let users = Collection::<User>::builder()
//!     .hook(Phase::BeforeUpdate, Hook::from_fn("reject-locked", reject_locked))
//!     .virtual_field(Virtual::infallible("initials", initials))
//!     .build(&store)?;
//!
//! let ada = users.insert(User::new("Ada", "Lovelace"))?;
//! assert_eq!(ada.virtual_value("initials"), "AL".into());
//!
//! let closed = users.update(field("status").eq("open"), &doc! { status: "closed" })?;
//! ```
//!
//! # Documents
//!
//! Stores see entities as [`Document`]s, key-ordered maps of
//! [`Value`](crate::common::Value)s converted from and to `T` with serde.
//! Nested fields are addressed with dotted paths (`address.city`).
//!
//! # Events
//!
//! Every persisted insert, update and remove publishes a
//! [`CollectionEventInfo`] to the listeners subscribed through
//! [`EventAware`](crate::common::EventAware). An after hook that fails on a
//! document that was already written is published as
//! [`CollectionEvents::HookFailure`].

mod builder;
mod bulk_result;
mod config;
mod cursor;
mod document;
mod entity;
mod event;
mod hydrated;
pub(crate) mod operation;
mod typed_collection;

pub use builder::*;
pub use bulk_result::*;
pub use config::*;
pub use cursor::*;
pub use document::*;
pub use entity::*;
pub use event::*;
pub use hydrated::*;
pub use typed_collection::*;
