//! Query filters for selecting documents.
//!
//! A [Filter] is a predicate over a [Document](crate::collection::Document).
//! Collections never look inside a filter; they hand it to the store binding,
//! which decides how to evaluate it. The bundled in-memory binding simply
//! calls [FilterProvider::apply] on every stored document.
//!
//! # Examples
//!
//! ```rust,ignore
//! use docwarden::filter::{field, all, and};
//!
//! let adults = field("age").gte(18);
//! let open = field("status").eq("open").and(field("locked").ne(true));
//! let either = field("role").in_array(vec!["admin", "owner"]);
//! let named = field("name").text_regex("^Al");
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: `eq`, `ne`
//! - **Comparison**: `gt`, `gte`, `lt`, `lte`
//! - **Membership**: `in_array`, `not_in_array`
//! - **Pattern**: `text_regex`
//! - **Logical**: `and`, `or`, `not`
//! - **Special**: `all`, `by_id`

mod basic_filters;
mod filter;
mod fluent;
mod logical_filters;

pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
