//! Query planner (verb module)
//!
//! Transforms a QueryRequest, a catalog snapshot and the requester's share
//! policy into a single-engine SQL plan.

mod build;
mod error;
mod filter;
mod projection;
mod scope;

pub use build::{build_statement, plan_query, PlanContext, PlannedStatement};
pub use error::PlanError;
pub use filter::{compile_filter, compile_filters, escape_like, is_null_sentinel};
pub use projection::{compile_projections, default_alias, AliasSet, CompiledProjections};
pub use scope::{Scope, ScopedColumn};
