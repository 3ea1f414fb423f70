//! Tests for engine selection, executability and execution
//!
//! warehouse_events lives in BigQuery; every other sales table is served by
//! Postgres. pending_uploads has not finished its first sync.

mod common;

use common::{load_engine, load_snapshot, plan, request, where_clause, TENANT};
use semsql::{Requester, RuntimeEngine, SqlValue};
use serde_json::json;

#[tokio::test]
async fn test_tables_on_different_engines_are_blocked() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
            {"tableRef": "orders", "column": "status"},
            {"tableRef": "warehouse_events", "column": "event_type"}
        ]}"#,
    );
    let err = plan(&catalog, &req).unwrap_err();
    assert_eq!(err.code(), "CROSS_SOURCE_BLOCKED");
    assert!(err.to_string().contains("bigquery"), "{}", err);
}

#[tokio::test]
async fn test_filter_table_on_other_engine_is_blocked() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [{"tableRef": "orders", "column": "status"}],
            "filters": [
                {"tableRef": "warehouse_events", "column": "event_type", "operator": "equals", "value": "shipped"}
            ]}"#,
    );
    assert_eq!(plan(&catalog, &req).unwrap_err().code(), "CROSS_SOURCE_BLOCKED");
}

#[tokio::test]
async fn test_bigquery_plan_inlines_literals() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
                {"tableRef": "warehouse_events", "column": "event_type"},
                {"tableRef": "warehouse_events", "column": "id", "aggregation": "count"}
            ],
            "filters": [
                {"tableRef": "warehouse_events", "column": "event_type", "operator": "equals", "value": "O'Hara"}
            ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(plan.engine, RuntimeEngine::BigQuery);
    assert!(plan.params.is_empty());
    assert_eq!(
        plan.sql,
        "SELECT t0.`event_type` AS `event_type`, COUNT(t0.`id`) AS `count_id`\n\
         FROM `acme-prod.analytics.events` t0\n\
         WHERE t0.`event_type` = 'O\\'Hara'\n\
         GROUP BY t0.`event_type`\n\
         LIMIT 1000"
    );
}

#[tokio::test]
async fn test_bigquery_patterns_and_date_parts() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [{"tableRef": "warehouse_events", "column": "event_type"}],
            "filters": [
                {"tableRef": "warehouse_events", "column": "event_type", "operator": "contains", "value": "50%"},
                {"tableRef": "warehouse_events", "column": "occurred_at", "hierarchyPart": "year",
                 "operator": "equals", "value": 2024}
            ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(
        where_clause(&plan.sql),
        "(LOWER(CAST(t0.`event_type` AS STRING)) LIKE LOWER('%50\\\\%%') \
         AND EXTRACT(YEAR FROM CAST(t0.`occurred_at` AS TIMESTAMP)) = 2024)"
    );
    assert!(plan.params.is_empty());
}

#[tokio::test]
async fn test_unsynced_table_is_not_executable() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
            {"tableRef": "orders", "column": "status"},
            {"tableRef": "pending_uploads", "column": "id", "aggregation": "count"}
        ]}"#,
    );
    let err = plan(&catalog, &req).unwrap_err();
    assert_eq!(err.code(), "TABLE_NOT_EXECUTABLE");
    assert!(err.to_string().contains("not ready"), "{}", err);
}

#[tokio::test]
async fn test_execute_runs_postgres_plan() {
    let rows = vec![
        json!({"status": "open", "sum_revenue": 120.5}),
        json!({"status": "paid", "sum_revenue": 80}),
    ];
    let engine = load_engine("sales.yaml", rows.clone());
    let req = request(
        r#"{"projections": [
                {"tableRef": "orders", "column": "status"},
                {"tableRef": "orders", "column": "revenue", "aggregation": "sum"}
            ],
            "filters": [{"tableRef": "orders", "column": "quantity", "operator": "gt", "value": 1}]}"#,
    );

    let result = engine.execute(TENANT, &Requester::new("u-1"), &req).await.unwrap();
    assert_eq!(result.row_count, 2);
    assert_eq!(result.rows, rows);

    let executed = engine.executor().executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].sql, result.plan.sql);
    assert_eq!(executed[0].params, vec![SqlValue::Int(1)]);
}

#[tokio::test]
async fn test_execute_rejects_bigquery_plan() {
    let engine = load_engine("sales.yaml", vec![json!({"event_type": "x"})]);
    let req = request(r#"{"projections": [{"tableRef": "warehouse_events", "column": "event_type"}]}"#);

    let err = engine.execute(TENANT, &Requester::new("u-1"), &req).await.unwrap_err();
    assert_eq!(err.code(), "ENGINE_NOT_SUPPORTED");
    assert!(engine.executor().executed().is_empty());

    // Planning alone still succeeds
    let plan = engine.plan(TENANT, &Requester::new("u-1"), &req).await.unwrap();
    assert_eq!(plan.engine, RuntimeEngine::BigQuery);
}

#[tokio::test]
async fn test_execute_sql_read_only() {
    let engine = load_engine("sales.yaml", vec![json!({"n": 1})]);

    let rows = engine
        .execute_sql(RuntimeEngine::Postgres, "-- health check\nSELECT $1::int AS n;", &[SqlValue::Int(1)])
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"n": 1})]);
    assert_eq!(engine.executor().executed()[0].sql, "SELECT $1::int AS n");

    let err = engine
        .execute_sql(RuntimeEngine::Postgres, "UPDATE orders SET status = 'x'", &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), "UNSAFE_SQL");

    let err = engine
        .execute_sql(RuntimeEngine::BigQuery, "SELECT 1", &[])
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ENGINE_NOT_SUPPORTED");
    assert_eq!(engine.executor().executed().len(), 1);
}

#[tokio::test]
async fn test_unknown_data_model() {
    let engine = load_engine("sales.yaml", vec![]);
    let req = request(
        r#"{"dataModelId": "dm-missing",
            "projections": [{"tableRef": "orders", "column": "status"}]}"#,
    );
    let err = engine.plan(TENANT, &Requester::new("u-1"), &req).await.unwrap_err();
    assert_eq!(err.code(), "DATA_MODEL_NOT_FOUND");
}
