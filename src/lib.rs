//! semsql - Plan semantic dashboard queries into single-engine SQL
//!
//! This library provides:
//! - Catalog types (DataModel, ModelTable, Relationship) and catalog sync
//! - Query request types, deserialized from the dashboard's camelCase JSON
//! - Share policy resolution: page scoping and row-level security
//! - Join path resolution over the relationship graph
//! - SQL generation for Postgres (bound parameters) and BigQuery (inlined literals)
//! - Execution of Postgres plans through sqlx
//!
//! # Architecture
//!
//! **Noun modules** (data structures):
//! - `catalog/` - data models, model tables, relationships, runtime descriptors
//! - `query/` - query request types (QueryRequest, Projection, FilterSpec)
//! - `policy/` - share grants, SharePolicy, RLS documents
//! - `plan/` - logical SQL tree (SelectStatement, Expr) and QueryPlan
//!
//! **Verb modules** (transformations):
//! - `parser/` - YAML → PlannerConfig / CatalogFixture
//! - `graph/` - relationships → shortest join paths and table aliases
//! - `planner/` - QueryRequest + CatalogSnapshot + SharePolicy → SelectStatement
//! - `emitter/` - SelectStatement → SQL text + parameters, via a `Dialect`
//!
//! **Adapters**:
//! - `store/` - catalog/policy stores and row executors (in-memory and Postgres)
//! - `engine` - `SemanticEngine` facade
//!
//! # Example
//!
//! ```ignore
//! use semsql::{MemoryExecutor, MemoryStore, QueryRequest, Requester, SemanticEngine, parser};
//!
//! let fixture = parser::parse_fixture_file("catalog.yaml")?;
//! let engine = SemanticEngine::new(MemoryStore::from_fixture(fixture), MemoryExecutor::new());
//! let request: QueryRequest = serde_json::from_str(body)?;
//! let plan = engine.plan("tenant-1", &Requester::new("user-1"), &request).await?;
//! println!("{}", plan.sql);
//! ```

pub mod catalog;
pub mod config;
pub mod dialect;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod graph;
pub mod parser;
pub mod plan;
pub mod planner;
pub mod policy;
pub mod query;
pub mod store;

// Re-export commonly used types
pub use catalog::{
    sync_catalog, CatalogError, CatalogSnapshot, DataModel, DataType, ModelColumn, ModelTable,
    PhysicalTable, Relationship,
};
pub use config::PlannerConfig;
pub use dialect::{Dialect, RuntimeEngine};
pub use emitter::{emit_sql, EmittedSql};
pub use engine::{check_read_only, QueryResult, SemanticEngine};
pub use error::{Error, ParseError};
pub use plan::{QueryPlan, SqlValue};
pub use planner::{plan_query, PlanContext, PlanError};
pub use policy::{resolve_policy, Requester, SharePolicy};
pub use query::{
    Aggregation, FilterOperator, FilterSpec, GroupKey, HierarchyPart, LogicalConnector, OrderKey,
    Projection, QueryRequest, SortDirection,
};
pub use store::{
    CatalogFixture, CatalogStore, MemoryExecutor, MemoryStore, PgExecutor, PgStore, PolicyStore,
    RowExecutor, StoreError,
};
