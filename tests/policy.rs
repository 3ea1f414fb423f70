//! Tests for page scoping and row-level security
//!
//! Grants on dashboard d-sales (tests/test_data/sales.yaml):
//!   u-viewer   view, page p1, region = EMEA AND (segment = smb OR segment = mid)
//!   u-analyst  view on p1 directly, admin through group g-admins
//!   u-editor   edit, every page, country = FR (no table has that column)

mod common;

use common::{load_engine, request, where_clause, TENANT};
use semsql::{resolve_policy, QueryRequest, Requester, SqlValue};

fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

/// Region revenue by segment on the sales dashboard
fn region_request(page: &str, filters: &str) -> QueryRequest {
    request(&format!(
        r#"{{"dashboardId": "d-sales", "pageId": "{}",
            "projections": [
                {{"tableRef": "regions", "column": "region"}},
                {{"tableRef": "customers", "column": "segment"}},
                {{"tableRef": "orders", "column": "revenue", "aggregation": "sum"}}
            ],
            "filters": {}}}"#,
        page, filters
    ))
}

#[tokio::test]
async fn test_page_outside_allow_list_is_denied() {
    let engine = load_engine("sales.yaml", vec![]);
    let viewer = Requester::new("u-viewer");

    let err = engine
        .plan(TENANT, &viewer, &region_request("p2", "[]"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RLS_PAGE_DENIED");

    let mut no_page = region_request("p1", "[]");
    no_page.page_id = None;
    let err = engine.plan(TENANT, &viewer, &no_page).await.unwrap_err();
    assert_eq!(err.code(), "RLS_PAGE_DENIED");
}

#[tokio::test]
async fn test_rls_groups_are_anded_and_bound_to_tables() {
    let engine = load_engine("sales.yaml", vec![]);
    let plan = engine
        .plan(TENANT, &Requester::new("u-viewer"), &region_request("p1", "[]"))
        .await
        .unwrap();

    assert_eq!(plan.root_table_id, "regions");
    assert!(plan
        .sql
        .contains("INNER JOIN \"public\".\"customers\" t1 ON t0.\"id\" = t1.\"region_id\""));
    assert!(plan
        .sql
        .contains("INNER JOIN \"public\".\"orders\" t2 ON t0.\"id\" = t2.\"region_id\""));
    assert_eq!(
        where_clause(&plan.sql),
        "(t0.\"region\" = $1 AND (t1.\"segment\" = $2 OR t1.\"segment\" = $3))"
    );
    assert_eq!(plan.params, vec![text("EMEA"), text("smb"), text("mid")]);
}

#[tokio::test]
async fn test_rls_applies_after_user_filters() {
    let engine = load_engine("sales.yaml", vec![]);
    let req = region_request(
        "p1",
        r#"[{"tableRef": "orders", "column": "status", "operator": "equals", "value": "open"}]"#,
    );
    let plan = engine.plan(TENANT, &Requester::new("u-viewer"), &req).await.unwrap();

    assert_eq!(
        where_clause(&plan.sql),
        "((t2.\"status\" = $1 AND t0.\"region\" = $2) AND (t1.\"segment\" = $3 OR t1.\"segment\" = $4))"
    );
    assert_eq!(
        plan.params,
        vec![text("open"), text("EMEA"), text("smb"), text("mid")]
    );
}

#[tokio::test]
async fn test_rls_binds_to_filter_tables() {
    let engine = load_engine("sales.yaml", vec![]);
    let req = request(
        r#"{"dashboardId": "d-sales", "pageId": "p1",
            "projections": [{"tableRef": "orders", "column": "status"}],
            "filters": [{"tableRef": "customers", "column": "name", "operator": "contains", "value": "a"}]}"#,
    );
    let plan = engine.plan(TENANT, &Requester::new("u-viewer"), &req).await.unwrap();

    // Neither orders nor customers has a region column
    assert_eq!(
        where_clause(&plan.sql),
        "(CAST(t1.\"name\" AS TEXT) ILIKE $1 AND (t1.\"segment\" = $2 OR t1.\"segment\" = $3))"
    );
    assert_eq!(plan.params, vec![text("%a%"), text("smb"), text("mid")]);
}

#[tokio::test]
async fn test_rls_does_not_join_extra_tables() {
    let engine = load_engine("sales.yaml", vec![]);
    let req = request(
        r#"{"dashboardId": "d-sales", "pageId": "p1",
            "projections": [{"tableRef": "orders", "column": "status"}]}"#,
    );
    let plan = engine.plan(TENANT, &Requester::new("u-viewer"), &req).await.unwrap();
    assert_eq!(plan.table_ids, vec!["orders"]);
    assert!(!plan.sql.contains("WHERE"));
}

#[tokio::test]
async fn test_group_admin_grant_is_unrestricted() {
    let engine = load_engine("sales.yaml", vec![]);
    let analyst = Requester::new("u-analyst").with_group("g-admins");

    let plan = engine
        .plan(TENANT, &analyst, &region_request("p9", "[]"))
        .await
        .unwrap();
    assert!(!plan.sql.contains("WHERE"));
    assert!(plan.params.is_empty());

    // Without the group only the page-scoped view grant applies
    let err = engine
        .plan(TENANT, &Requester::new("u-analyst"), &region_request("p9", "[]"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "RLS_PAGE_DENIED");
}

#[tokio::test]
async fn test_unbindable_rls_field_is_skipped() {
    let engine = load_engine("sales.yaml", vec![]);
    let plan = engine
        .plan(TENANT, &Requester::new("u-editor"), &region_request("p7", "[]"))
        .await
        .unwrap();
    assert!(!plan.sql.contains("WHERE"));
}

#[tokio::test]
async fn test_no_dashboard_or_no_grant_is_unrestricted() {
    let engine = load_engine("sales.yaml", vec![]);

    let mut no_dashboard = region_request("p2", "[]");
    no_dashboard.dashboard_id = None;
    let plan = engine
        .plan(TENANT, &Requester::new("u-viewer"), &no_dashboard)
        .await
        .unwrap();
    assert!(!plan.sql.contains("WHERE"));

    let plan = engine
        .plan(TENANT, &Requester::new("u-stranger"), &region_request("p2", "[]"))
        .await
        .unwrap();
    assert!(!plan.sql.contains("WHERE"));
}

#[tokio::test]
async fn test_resolve_policy_from_store() {
    let engine = load_engine("sales.yaml", vec![]);

    let policy = resolve_policy(engine.store(), TENANT, &Requester::new("u-viewer"), Some("d-sales"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(policy.grant_id, "s-viewer");
    assert_eq!(policy.allowed_page_ids, vec!["p1"]);
    assert_eq!(policy.rule_groups.len(), 2);

    let other_tenant = resolve_policy(engine.store(), "globex", &Requester::new("u-viewer"), Some("d-sales"))
        .await
        .unwrap();
    assert!(other_tenant.is_none());
}
