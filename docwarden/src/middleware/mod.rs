//! Hooks run around every document write.
//!
//! - [`Phase`] / [`Operation`] - where in a write a hook runs
//! - [`HookProvider`] / [`Hook`] - a single hook
//! - [`Middleware`] / [`MiddlewareBuilder`] - the ordered, immutable hook set
//!   a collection is built with
//! - [`DocumentPass`] - drives one document through before hooks, persistence
//!   and after hooks

mod hook;
mod pass;
mod phase;
mod pipeline;

pub use hook::*;
pub use pass::*;
pub use phase::*;
pub use pipeline::*;
