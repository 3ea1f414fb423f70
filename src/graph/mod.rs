//! Join graph resolver (verb module)
//!
//! Builds a request-scoped graph over the model's relationships, finds the
//! shortest join path from the root table to every selected table and
//! assigns table aliases in traversal order.

mod arena;
mod resolve;

pub use arena::{BfsTree, JoinGraph};
pub use resolve::{assign_aliases, resolve_join_paths, JoinLayout, JoinPaths, JoinStep};
