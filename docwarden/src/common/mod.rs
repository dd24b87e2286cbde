//! Common types shared by every docwarden module.
//!
//! - [`Value`] - the dynamically typed field value stored in documents
//! - [`Atomic`] - shared, lock-protected state used by the PIMPL wrappers
//! - [`WardenEventBus`] - the publish/subscribe bus behind collection events
//! - [`SortOrder`] - sort direction for find options and aggregate stages

mod constants;
mod event_bus;
mod sort_order;
mod type_utils;
mod value;

pub use constants::*;
pub use event_bus::*;
pub use sort_order::*;
pub use type_utils::*;
pub use value::*;
