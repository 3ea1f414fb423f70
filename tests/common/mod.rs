//! Shared test utilities for integration tests

#![allow(dead_code)]

use semsql::planner::{plan_query, PlanContext, PlanError};
use semsql::{
    parser, sync_catalog, CatalogFixture, CatalogSnapshot, MemoryExecutor, MemoryStore,
    PlannerConfig, QueryPlan, QueryRequest, SemanticEngine, SharePolicy,
};

pub const TENANT: &str = "acme";

/// Load a test fixture from the tests/test_data directory
pub fn load_fixture(name: &str) -> CatalogFixture {
    let path = format!("tests/test_data/{}", name);
    parser::parse_fixture_file(&path)
        .unwrap_or_else(|e| panic!("Failed to load test data {}: {}", name, e))
}

/// In-memory store seeded with a fixture
pub fn load_store(name: &str) -> MemoryStore {
    MemoryStore::from_fixture(load_fixture(name))
}

/// Engine over a fixture, with an executor returning `rows`
pub fn load_engine(name: &str, rows: Vec<serde_json::Value>) -> SemanticEngine<MemoryStore, MemoryExecutor> {
    SemanticEngine::new(load_store(name), MemoryExecutor::with_rows(rows))
}

/// Synced catalog snapshot of the fixture's default data model
pub async fn load_snapshot(name: &str) -> CatalogSnapshot {
    let store = load_store(name);
    sync_catalog(&store, &PlannerConfig::default(), TENANT, None)
        .await
        .unwrap_or_else(|e| panic!("Failed to sync {}: {}", name, e))
}

/// Parse a request the way the dashboard sends it
pub fn request(json: &str) -> QueryRequest {
    serde_json::from_str(json).unwrap_or_else(|e| panic!("Invalid request JSON: {}", e))
}

/// Plan without a share policy and with default configuration
pub fn plan(catalog: &CatalogSnapshot, request: &QueryRequest) -> Result<QueryPlan, PlanError> {
    plan_with_policy(catalog, None, request)
}

pub fn plan_with_policy(
    catalog: &CatalogSnapshot,
    policy: Option<&SharePolicy>,
    request: &QueryRequest,
) -> Result<QueryPlan, PlanError> {
    let config = PlannerConfig::default();
    let ctx = PlanContext {
        catalog,
        policy,
        config: &config,
    };
    plan_query(&ctx, request)
}

// =============================================================================
// SQL Inspection Utilities
// =============================================================================

/// Number of INNER JOIN clauses in the statement
pub fn count_joins(sql: &str) -> usize {
    sql.lines().filter(|l| l.starts_with("INNER JOIN ")).count()
}

/// The clause line starting with `keyword`, if present
pub fn clause<'a>(sql: &'a str, keyword: &str) -> Option<&'a str> {
    sql.lines().find(|l| l.starts_with(keyword))
}

/// The WHERE clause body, panicking when the statement has none
pub fn where_clause(sql: &str) -> &str {
    clause(sql, "WHERE ")
        .map(|l| &l["WHERE ".len()..])
        .unwrap_or_else(|| panic!("no WHERE clause in:\n{}", sql))
}
