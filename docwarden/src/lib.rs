//! # docwarden - Typed Collections with Write Middleware
//!
//! docwarden puts a typed [`Collection<T>`](collection::Collection) in front
//! of a document store. Every document a collection writes, whether through
//! a single insert, update or remove or through a bulk update or remove,
//! passes through the collection's ordered middleware hooks. Reads come back
//! with computed virtual fields attached.
//!
//! ## Key Features
//!
//! - **Hooked writes**: `beforeInsert` … `afterRemove` hooks may transform or
//!   reject each document
//! - **Serialized bulk writes**: bulk `update`/`remove` resolve the matching
//!   ids once and write them one at a time, so hooks see every document
//! - **Partial failure**: a rejected document never stops its siblings
//! - **Virtual fields**: derived values computed on every read, never stored
//! - **Events**: listeners are told about every persisted write and about
//!   after-hook failures
//! - **Pluggable stores**: a small [`StoreBindingProvider`](store::StoreBindingProvider)
//!   trait, with an in-memory store bundled
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docwarden::collection::{Collection, Entity};
//! use docwarden::doc;
//! use docwarden::errors::{ErrorKind, WardenError};
//! use docwarden::filter::field;
//! use docwarden::middleware::{Hook, Middleware};
//! use docwarden::store::MemoryStore;
//! use docwarden::virtuals::Virtual;
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct Ticket {
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     id: Option<String>,
//!     title: String,
//!     status: String,
//! }
//!
//! impl Entity for Ticket {}
//!
//! let store = MemoryStore::new();
//! let tickets = Collection::<Ticket>::builder()
//!     .name("tickets")
//!     .middleware(
//!         Middleware::builder()
//!             .before_update(Hook::from_update_fn("reject-locked", |stored: &Ticket, t, _| {
//!                 if stored.status == "locked" {
//!                     return Err(WardenError::new("ticket is locked", ErrorKind::ValidationError));
//!                 }
//!                 Ok(t)
//!             }))
//!             .build(),
//!     )
//!     .virtual_field(Virtual::infallible("shout", |t: &Ticket| t.title.to_uppercase()))
//!     .build(&store)?;
//!
//! tickets.insert(Ticket { id: None, title: "printer".into(), status: "open".into() })?;
//! let closed = tickets.update(field("status").eq("open"), &doc! { status: "closed" })?;
//! ```
//!
//! ## Design Pattern
//!
//! Public handles (`Collection`, `CollectionConfig`, `StoreBinding`,
//! `Filter`, `Middleware`, …) follow the PIMPL pattern: a thin wrapper over
//! an `Arc` of the implementation. Clones are cheap and share state.
//!
//! ## Module Organization
//!
//! - [`collection`] - typed collections, documents, entities, events
//! - [`common`] - values, shared-state helpers, the event bus
//! - [`errors`] - error type and result alias
//! - [`filter`] - query filters
//! - [`middleware`] - hooks, phases and the per-document write pass
//! - [`store`] - store binding traits, find options, aggregation, the
//!   in-memory store
//! - [`virtuals`] - virtual fields and their composer

pub mod collection;
pub mod common;
pub mod errors;
pub mod filter;
pub mod middleware;
pub mod store;
pub mod virtuals;
