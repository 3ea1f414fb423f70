//! Tests for projections, grouping, ordering and limits

mod common;

use common::{clause, load_snapshot, plan, request};
use semsql::planner::plan_query;
use semsql::{PlanContext, PlannerConfig};

#[tokio::test]
async fn test_implicit_group_by_non_aggregated_columns() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
            {"tableRef": "orders", "column": "status"},
            {"tableRef": "orders", "column": "revenue", "aggregation": "sum"}
        ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(
        plan.sql,
        "SELECT t0.\"status\" AS \"status\", SUM(t0.\"revenue\") AS \"sum_revenue\"\n\
         FROM \"public\".\"orders\" t0\n\
         GROUP BY t0.\"status\"\n\
         LIMIT 1000"
    );
    assert_eq!(plan.columns, vec!["status", "sum_revenue"]);
}

#[tokio::test]
async fn test_no_group_by_without_aggregates() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
            {"tableRef": "orders", "column": "status"},
            {"tableRef": "orders", "column": "revenue", "aggregation": "raw"}
        ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert!(clause(&plan.sql, "GROUP BY").is_none());
}

#[tokio::test]
async fn test_group_by_hierarchy_part() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
            {"tableRef": "orders", "column": "created_at", "hierarchyPart": "month"},
            {"tableRef": "customers", "column": "id", "aggregation": "countDistinct"}
        ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    let month = "CAST(EXTRACT(MONTH FROM CAST(t0.\"created_at\" AS TIMESTAMP)) AS INTEGER)";
    assert_eq!(
        clause(&plan.sql, "SELECT").unwrap(),
        format!(
            "SELECT {} AS \"created_at_month\", COUNT(DISTINCT t1.\"id\") AS \"count_distinct_id\"",
            month
        )
    );
    assert_eq!(clause(&plan.sql, "GROUP BY").unwrap(), format!("GROUP BY {}", month));
}

#[tokio::test]
async fn test_explicit_group_by_replaces_implicit() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
                {"tableRef": "orders", "column": "status"},
                {"tableRef": "orders", "column": "revenue", "aggregation": "avg"}
            ],
            "groupBy": [
                {"tableRef": "orders", "column": "status"},
                {"tableRef": "orders", "column": "created_at", "hierarchyPart": "year"},
                {"tableRef": "orders", "column": "status"}
            ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(
        clause(&plan.sql, "GROUP BY").unwrap(),
        "GROUP BY t0.\"status\", CAST(EXTRACT(YEAR FROM CAST(t0.\"created_at\" AS TIMESTAMP)) AS INTEGER)"
    );
}

#[tokio::test]
async fn test_order_by_output_alias() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [
                {"tableRef": "orders", "column": "status"},
                {"tableRef": "orders", "column": "revenue", "aggregation": "sum", "alias": "Total Revenue"}
            ],
            "orderBy": [
                {"column": "total_revenue", "direction": "desc"},
                {"tableRef": "orders", "column": "status"},
                {"tableRef": "orders", "column": "quantity", "aggregation": "max"}
            ]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(plan.columns, vec!["status", "Total_Revenue"]);
    assert_eq!(
        clause(&plan.sql, "ORDER BY").unwrap(),
        "ORDER BY \"Total_Revenue\" DESC, \"status\" ASC, MAX(t0.\"quantity\") ASC"
    );
}

#[tokio::test]
async fn test_order_by_unknown_alias_fails() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [{"tableRef": "orders", "column": "status"}],
            "orderBy": [{"column": "revenue"}]}"#,
    );
    assert_eq!(plan(&catalog, &req).unwrap_err().code(), "COLUMN_NOT_FOUND");
}

#[tokio::test]
async fn test_order_by_table_joins_it() {
    let catalog = load_snapshot("sales.yaml").await;
    let req = request(
        r#"{"projections": [{"tableRef": "orders", "column": "status"}],
            "orderBy": [{"tableRef": "products", "column": "category", "direction": "desc"}]}"#,
    );
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(plan.table_ids, vec!["orders", "products"]);
    assert_eq!(clause(&plan.sql, "ORDER BY").unwrap(), "ORDER BY t1.\"category\" DESC");
}

#[tokio::test]
async fn test_limit_defaults_and_clamping() {
    let catalog = load_snapshot("sales.yaml").await;
    let cases = [
        (r#""#, "LIMIT 1000"),
        (r#", "limit": 0"#, "LIMIT 1000"),
        (r#", "limit": 50"#, "LIMIT 50"),
        (r#", "limit": 100000"#, "LIMIT 5000"),
    ];
    for (limit, expected) in cases {
        let req = request(&format!(
            r#"{{"projections": [{{"tableRef": "orders", "column": "status"}}]{}}}"#,
            limit
        ));
        let plan = plan(&catalog, &req).unwrap();
        assert_eq!(plan.sql.lines().last().unwrap(), expected, "{:?}", limit);
    }
}

#[tokio::test]
async fn test_limit_from_config() {
    let catalog = load_snapshot("sales.yaml").await;
    let config = semsql::parser::parse_config_str("defaultLimit: 25\nmaxLimit: 200\n").unwrap();
    let ctx = PlanContext {
        catalog: &catalog,
        policy: None,
        config: &config,
    };

    let req = request(r#"{"projections": [{"tableRef": "orders", "column": "status"}]}"#);
    assert!(plan_query(&ctx, &req).unwrap().sql.ends_with("\nLIMIT 25"));

    let req = request(r#"{"projections": [{"tableRef": "orders", "column": "status"}], "limit": 900}"#);
    assert!(plan_query(&ctx, &req).unwrap().sql.ends_with("\nLIMIT 200"));

    assert_eq!(PlannerConfig::default().max_alias_len, config.max_alias_len);
}

#[tokio::test]
async fn test_long_aliases_are_truncated() {
    let catalog = load_snapshot("sales.yaml").await;
    let long = "a".repeat(80);
    let req = request(&format!(
        r#"{{"projections": [
            {{"tableRef": "orders", "column": "status", "alias": "{0}"}},
            {{"tableRef": "orders", "column": "revenue", "alias": "{0}"}}
        ]}}"#,
        long
    ));
    let plan = plan(&catalog, &req).unwrap();
    assert_eq!(plan.columns[0].len(), 63);
    assert_eq!(plan.columns[1].len(), 63);
    assert!(plan.columns[1].ends_with("_2"));
}
