//! The boundary between typed collections and the document store.
//!
//! - [`StoreBindingProvider`] / [`StoreBinding`] - document-level operations
//!   of one collection
//! - [`StoreProvider`] - hands out bindings by collection name
//! - [`MemoryStore`] - the bundled in-memory store
//! - [`FindOptions`], [`Projection`] - read options
//! - [`AggregateStage`], [`Accumulator`] - aggregation pipelines

mod aggregate;
mod binding;
mod find_options;
mod memory;
mod projection;

pub use aggregate::*;
pub use binding::*;
pub use find_options::*;
pub use memory::*;
pub use projection::*;
