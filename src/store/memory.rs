//! In-memory stores for tests and embedding

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{DataModel, ModelTable, ModelTableUpsert, PhysicalTable, Relationship};
use crate::plan::SqlValue;
use crate::policy::{Requester, ShareGrant};
use super::{CatalogStore, PolicyStore, RowExecutor, StoreError};

/// Serializable contents of a [`MemoryStore`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogFixture {
    pub data_models: Vec<DataModel>,
    pub physical_tables: Vec<PhysicalTable>,
    pub model_tables: Vec<ModelTable>,
    pub relationships: Vec<Relationship>,
    pub shares: Vec<ShareGrant>,
}

/// Catalog and policy store backed by a mutex-guarded [`CatalogFixture`].
///
/// New model tables take their physical table's id when it is free, so
/// fixtures can declare relationships in terms of physical table ids.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<CatalogFixture>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: CatalogFixture) -> Self {
        Self {
            state: Mutex::new(fixture),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogFixture> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> CatalogFixture {
        self.lock().clone()
    }

    pub fn add_data_model(&self, model: DataModel) {
        self.lock().data_models.push(model);
    }

    pub fn add_physical_table(&self, table: PhysicalTable) {
        self.lock().physical_tables.push(table);
    }

    /// Replace the physical table with the same id, returning whether it existed
    pub fn replace_physical_table(&self, table: PhysicalTable) -> bool {
        let mut state = self.lock();
        match state.physical_tables.iter_mut().find(|t| t.id == table.id) {
            Some(existing) => {
                *existing = table;
                true
            }
            None => false,
        }
    }

    pub fn add_relationship(&self, relationship: Relationship) {
        self.lock().relationships.push(relationship);
    }

    pub fn add_share(&self, grant: ShareGrant) {
        self.lock().shares.push(grant);
    }
}

impl CatalogStore for MemoryStore {
    async fn find_data_model(
        &self,
        tenant_id: &str,
        data_model_id: &str,
    ) -> Result<Option<DataModel>, StoreError> {
        Ok(self
            .lock()
            .data_models
            .iter()
            .find(|m| m.id == data_model_id && m.tenant_id == tenant_id)
            .cloned())
    }

    async fn default_data_model(&self, tenant_id: &str) -> Result<Option<DataModel>, StoreError> {
        Ok(self
            .lock()
            .data_models
            .iter()
            .find(|m| m.tenant_id == tenant_id && m.is_default)
            .cloned())
    }

    async fn create_default_data_model(&self, tenant_id: &str) -> Result<DataModel, StoreError> {
        let mut state = self.lock();
        if let Some(existing) = state
            .data_models
            .iter()
            .find(|m| m.tenant_id == tenant_id && m.is_default)
        {
            return Ok(existing.clone());
        }
        let model = DataModel {
            id: Uuid::new_v4().to_string(),
            tenant_id: tenant_id.to_string(),
            name: "Default".to_string(),
            is_default: true,
            created_at: Utc::now(),
        };
        state.data_models.push(model.clone());
        Ok(model)
    }

    async fn active_physical_tables(&self, tenant_id: &str) -> Result<Vec<PhysicalTable>, StoreError> {
        Ok(self
            .lock()
            .physical_tables
            .iter()
            .filter(|t| t.tenant_id == tenant_id && t.is_active)
            .cloned()
            .collect())
    }

    async fn upsert_model_table(
        &self,
        data_model_id: &str,
        table: &ModelTableUpsert,
    ) -> Result<ModelTable, StoreError> {
        let mut state = self.lock();
        let existing = state.model_tables.iter_mut().find(|t| {
            t.data_model_id == data_model_id && t.physical_table_id == table.physical_table_id
        });
        if let Some(existing) = existing {
            let refreshed = table.clone().into_model_table(existing.id.clone(), data_model_id);
            *existing = refreshed.clone();
            return Ok(refreshed);
        }

        let id_taken = state
            .model_tables
            .iter()
            .any(|t| t.id == table.physical_table_id);
        let id = if id_taken {
            Uuid::new_v4().to_string()
        } else {
            table.physical_table_id.clone()
        };
        let created = table.clone().into_model_table(id, data_model_id);
        state.model_tables.push(created.clone());
        Ok(created)
    }

    async fn retire_model_tables(
        &self,
        data_model_id: &str,
        keep: &[String],
        reason: &str,
    ) -> Result<u64, StoreError> {
        let mut state = self.lock();
        let mut changed = 0;
        for table in state.model_tables.iter_mut() {
            if table.data_model_id != data_model_id || keep.contains(&table.physical_table_id) {
                continue;
            }
            if table.executable || table.not_executable_reason.as_deref() != Some(reason) {
                table.executable = false;
                table.not_executable_reason = Some(reason.to_string());
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn model_tables(&self, data_model_id: &str) -> Result<Vec<ModelTable>, StoreError> {
        Ok(self
            .lock()
            .model_tables
            .iter()
            .filter(|t| t.data_model_id == data_model_id)
            .cloned()
            .collect())
    }

    async fn relationships(&self, data_model_id: &str) -> Result<Vec<Relationship>, StoreError> {
        let mut relationships: Vec<Relationship> = self
            .lock()
            .relationships
            .iter()
            .filter(|r| r.data_model_id == data_model_id)
            .cloned()
            .collect();
        relationships.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(relationships)
    }
}

impl PolicyStore for MemoryStore {
    async fn share_grants(
        &self,
        tenant_id: &str,
        dashboard_id: &str,
        requester: &Requester,
    ) -> Result<Vec<ShareGrant>, StoreError> {
        Ok(self
            .lock()
            .shares
            .iter()
            .filter(|g| g.tenant_id == tenant_id && g.dashboard_id == dashboard_id)
            .filter(|g| g.applies_to(requester))
            .cloned()
            .collect())
    }
}

/// A statement received by [`MemoryExecutor`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Executor that records statements and answers with canned rows
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    rows: Vec<serde_json::Value>,
    executed: Mutex<Vec<ExecutedQuery>>,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<serde_json::Value>) -> Self {
        Self {
            rows,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Statements received so far, oldest first
    pub fn executed(&self) -> Vec<ExecutedQuery> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl RowExecutor for MemoryExecutor {
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(ExecutedQuery {
                sql: sql.to_string(),
                params: params.to_vec(),
            });
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ModelColumn, SyncStatus, DataType};
    use crate::config::PlannerConfig;

    fn physical(id: &str) -> PhysicalTable {
        PhysicalTable {
            id: id.into(),
            tenant_id: "acme".into(),
            table_name: id.into(),
            dataset_name: "public".into(),
            source_type: "postgres".into(),
            project_id: None,
            sync_status: SyncStatus::Ready,
            last_error: None,
            is_active: true,
            columns: vec![ModelColumn::new("id", DataType::I64)],
        }
    }

    #[tokio::test]
    async fn test_default_model_is_created_once() {
        let store = MemoryStore::new();
        let first = store.create_default_data_model("acme").await.unwrap();
        let second = store.create_default_data_model("acme").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.snapshot().data_models.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_identity() {
        let store = MemoryStore::new();
        let config = PlannerConfig::default();
        let upsert = ModelTableUpsert::from_physical(&physical("orders"), &config);
        let created = store.upsert_model_table("dm", &upsert).await.unwrap();
        assert_eq!(created.id, "orders");

        let mut renamed = physical("orders");
        renamed.table_name = "orders_v2".into();
        let upsert = ModelTableUpsert::from_physical(&renamed, &config);
        let refreshed = store.upsert_model_table("dm", &upsert).await.unwrap();
        assert_eq!(refreshed.id, "orders");
        assert_eq!(refreshed.table_name, "orders_v2");
        assert_eq!(store.snapshot().model_tables.len(), 1);
    }

    #[tokio::test]
    async fn test_share_grants_filter_by_requester() {
        let store = MemoryStore::new();
        let grant = |id: &str, user: Option<&str>, group: Option<&str>| ShareGrant {
            id: id.into(),
            tenant_id: "acme".into(),
            dashboard_id: "d1".into(),
            user_id: user.map(String::from),
            group_id: group.map(String::from),
            permission: crate::policy::SharePermission::View,
            allowed_page_ids: vec![],
            rls: Default::default(),
        };
        store.add_share(grant("s1", Some("u1"), None));
        store.add_share(grant("s2", None, Some("g1")));
        store.add_share(grant("s3", Some("u2"), None));

        let requester = Requester::new("u1").with_group("g1");
        let grants = store.share_grants("acme", "d1", &requester).await.unwrap();
        let ids: Vec<&str> = grants.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
    }

    #[tokio::test]
    async fn test_executor_records_statements() {
        let executor = MemoryExecutor::with_rows(vec![serde_json::json!({"n": 1})]);
        let rows = executor.fetch_rows("SELECT 1", &[SqlValue::Int(1)]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(executor.executed()[0].sql, "SELECT 1");
    }
}
