//! Tests for catalog loading through the engine facade

mod common;

use common::{load_engine, load_fixture, request, TENANT};
use semsql::{Requester, RuntimeEngine};

fn sorted_ids<'a>(ids: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut ids: Vec<String> = ids.map(String::from).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_sync_builds_runtime_descriptors() {
    let engine = load_engine("sales.yaml", vec![]);
    let catalog = engine.sync_catalog(TENANT, None).await.unwrap();

    assert_eq!(catalog.model.id, "dm-sales");
    assert_eq!(catalog.tables.len(), 7);

    let events = catalog.get_table("warehouse_events").unwrap();
    assert_eq!(events.engine, RuntimeEngine::BigQuery);
    assert_eq!(events.runtime_ref, "`acme-prod.analytics.events`");
    assert!(events.executable);

    let regions = catalog.get_table("regions").unwrap();
    assert_eq!(regions.engine, RuntimeEngine::Postgres);
    assert_eq!(regions.runtime_ref, "\"public\".\"regions\"");

    let pending = catalog.get_table("pending_uploads").unwrap();
    assert!(!pending.executable);
    assert!(pending.not_executable_reason.is_some());

    let relationship_ids: Vec<&str> = catalog.relationships.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        relationship_ids,
        vec!["r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8"]
    );
}

#[tokio::test]
async fn test_sync_is_idempotent() {
    let engine = load_engine("sales.yaml", vec![]);
    let first = engine.sync_catalog(TENANT, None).await.unwrap();
    let second = engine.sync_catalog(TENANT, Some("dm-sales")).await.unwrap();

    assert_eq!(
        sorted_ids(first.tables.iter().map(|t| t.id.as_str())),
        sorted_ids(second.tables.iter().map(|t| t.id.as_str()))
    );
    assert_eq!(first, second);
    assert_eq!(engine.store().snapshot().model_tables.len(), 7);
}

#[tokio::test]
async fn test_default_model_created_for_new_tenant() {
    let engine = load_engine("sales.yaml", vec![]);
    let catalog = engine.sync_catalog("globex", None).await.unwrap();

    assert!(catalog.model.is_default);
    assert_eq!(catalog.model.tenant_id, "globex");
    assert!(catalog.tables.is_empty());
    assert!(catalog.relationships.is_empty());

    let again = engine.sync_catalog("globex", None).await.unwrap();
    assert_eq!(again.model.id, catalog.model.id);
}

#[tokio::test]
async fn test_removed_source_table_stops_planning() {
    let engine = load_engine("sales.yaml", vec![]);
    let req = request(
        r#"{"projections": [
            {"tableRef": "orders", "column": "status"},
            {"tableRef": "products", "column": "category"}
        ]}"#,
    );
    engine.plan(TENANT, &Requester::new("u-1"), &req).await.unwrap();

    let mut products = load_fixture("sales.yaml")
        .physical_tables
        .into_iter()
        .find(|t| t.id == "products")
        .unwrap();
    products.is_active = false;
    assert!(engine.store().replace_physical_table(products));

    let err = engine.plan(TENANT, &Requester::new("u-1"), &req).await.unwrap_err();
    assert_eq!(err.code(), "TABLE_NOT_EXECUTABLE");
    assert!(err.to_string().contains("removed"), "{}", err);

    // The model table is kept so relationships to it stay valid
    let catalog = engine.sync_catalog(TENANT, None).await.unwrap();
    assert_eq!(catalog.tables.len(), 7);
}
