//! Read-time derived fields.
//!
//! A [`Virtual`] computes one value from a stored entity; a
//! [`VirtualComposer`] evaluates a collection's virtuals on every
//! `find`, `find_one`, `find_by_id` and `insert` result.

mod composer;
mod virtual_field;

pub use composer::*;
pub use virtual_field::*;
