//! SQL emitter (verb module)
//!
//! Transforms a SelectStatement into dialect-specific SQL text.

mod sql;

pub use sql::{emit_sql, EmittedSql};
