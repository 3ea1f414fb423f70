//! Query engine facade
//!
//! Loads the catalog and share policy for a call, plans the request, and runs
//! Postgres plans through the configured executor. Holds no state between
//! calls besides its stores.

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{sync_catalog, CatalogSnapshot};
use crate::config::PlannerConfig;
use crate::dialect::RuntimeEngine;
use crate::error::Error;
use crate::plan::{QueryPlan, SqlValue};
use crate::planner::{plan_query, PlanContext, PlanError};
use crate::policy::{resolve_policy, Requester};
use crate::query::QueryRequest;
use crate::store::{CatalogStore, PolicyStore, RowExecutor};

/// An executed plan and its rows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub plan: QueryPlan,
    pub rows: Vec<serde_json::Value>,
    pub row_count: usize,
}

/// Entry point tying stores, planner and executor together
#[derive(Debug)]
pub struct SemanticEngine<S, X> {
    store: S,
    executor: X,
    config: PlannerConfig,
}

impl<S, X> SemanticEngine<S, X>
where
    S: CatalogStore + PolicyStore,
    X: RowExecutor,
{
    pub fn new(store: S, executor: X) -> Self {
        Self {
            store,
            executor,
            config: PlannerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Refresh model tables from the registry and return the snapshot
    pub async fn sync_catalog(
        &self,
        tenant_id: &str,
        data_model_id: Option<&str>,
    ) -> Result<CatalogSnapshot, Error> {
        Ok(sync_catalog(&self.store, &self.config, tenant_id, data_model_id).await?)
    }

    /// Plan a request without running it
    pub async fn plan(
        &self,
        tenant_id: &str,
        requester: &Requester,
        request: &QueryRequest,
    ) -> Result<QueryPlan, Error> {
        let policy = resolve_policy(
            &self.store,
            tenant_id,
            requester,
            request.dashboard_id.as_deref(),
        )
        .await?;
        let catalog = self
            .sync_catalog(tenant_id, request.data_model_id.as_deref())
            .await?;

        let ctx = PlanContext {
            catalog: &catalog,
            policy: policy.as_ref(),
            config: &self.config,
        };
        Ok(plan_query(&ctx, request)?)
    }

    /// Plan a request and run it on the row store
    pub async fn execute(
        &self,
        tenant_id: &str,
        requester: &Requester,
        request: &QueryRequest,
    ) -> Result<QueryResult, Error> {
        let plan = self.plan(tenant_id, requester, request).await?;
        if plan.engine != RuntimeEngine::Postgres {
            return Err(PlanError::EngineNotSupported(plan.engine).into());
        }
        let rows = self.executor.fetch_rows(&plan.sql, &plan.params).await?;
        info!(
            tenant = %tenant_id,
            root = %plan.root_table_id,
            rows = rows.len(),
            "executed query"
        );
        Ok(QueryResult {
            row_count: rows.len(),
            plan,
            rows,
        })
    }

    /// Run caller-supplied SQL, restricted to a single read statement
    pub async fn execute_sql(
        &self,
        engine: RuntimeEngine,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<serde_json::Value>, Error> {
        let statement = check_read_only(sql)?;
        if engine != RuntimeEngine::Postgres {
            return Err(PlanError::EngineNotSupported(engine).into());
        }
        debug!(params = params.len(), "executing raw sql");
        Ok(self.executor.fetch_rows(statement, params).await?)
    }
}

/// Validate that `sql` is one `SELECT`/`WITH` statement.
///
/// Leading comments and whitespace and trailing semicolons are ignored;
/// returns the statement with those removed.
pub fn check_read_only(sql: &str) -> Result<&str, PlanError> {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(end) => after[end + 1..].trim_start(),
                None => "",
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(end) => after[end + 2..].trim_start(),
                None => return Err(PlanError::UnsafeSql("unterminated comment".to_string())),
            };
        } else {
            break;
        }
    }

    let statement = rest.trim_end().trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if statement.is_empty() {
        return Err(PlanError::UnsafeSql("empty statement".to_string()));
    }
    if statement.contains(';') {
        return Err(PlanError::UnsafeSql(
            "multiple statements are not allowed".to_string(),
        ));
    }

    let keyword: String = statement
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();
    if keyword != "SELECT" && keyword != "WITH" {
        return Err(PlanError::UnsafeSql(
            "only SELECT or WITH statements may be run".to_string(),
        ));
    }
    Ok(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_single_select() {
        assert_eq!(check_read_only("SELECT 1;").unwrap(), "SELECT 1");
        assert_eq!(check_read_only("  select 1 ;; \n").unwrap(), "select 1");
        assert_eq!(
            check_read_only("-- totals\n/* report */ WITH t AS (SELECT 1) SELECT * FROM t").unwrap(),
            "WITH t AS (SELECT 1) SELECT * FROM t"
        );
        assert_eq!(check_read_only("SELECT 1 -- note").unwrap(), "SELECT 1 -- note");
    }

    #[test]
    fn test_rejects_writes_and_batches() {
        for sql in [
            "DELETE FROM orders",
            "SELECT 1; DROP TABLE orders",
            "",
            "-- only a comment",
            "/* open comment SELECT 1",
            "SELECTED",
        ] {
            let err = check_read_only(sql).unwrap_err();
            assert_eq!(err.code(), "UNSAFE_SQL", "{:?}", sql);
        }
    }
}
