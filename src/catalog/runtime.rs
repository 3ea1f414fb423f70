//! Runtime descriptors: where and whether a physical table can be queried

use crate::config::PlannerConfig;
use crate::dialect::RuntimeEngine;
use super::model::{ModelColumn, ModelTable, PhysicalTable, SyncStatus};

/// Source type of tables that live in the warehouse rather than the row store
const WAREHOUSE_SOURCE: &str = "bigquery";

/// The fields of a model table that catalog sync refreshes from the registry
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTableUpsert {
    pub physical_table_id: String,
    pub table_name: String,
    pub dataset_name: String,
    pub source_type: String,
    pub engine: RuntimeEngine,
    pub runtime_ref: String,
    pub executable: bool,
    pub not_executable_reason: Option<String>,
    pub columns: Vec<ModelColumn>,
}

impl ModelTableUpsert {
    /// Derive the runtime descriptor of a registry row.
    ///
    /// Warehouse tables are referenced as `project.dataset.table`; every other
    /// source is replicated into the row store under its dataset schema.
    pub fn from_physical(table: &PhysicalTable, config: &PlannerConfig) -> Self {
        let engine = if table.source_type.eq_ignore_ascii_case(WAREHOUSE_SOURCE) {
            RuntimeEngine::BigQuery
        } else {
            RuntimeEngine::Postgres
        };
        let dataset = if table.dataset_name.is_empty() {
            config.default_schema.as_str()
        } else {
            table.dataset_name.as_str()
        };
        let project = table.project_id.as_deref().filter(|p| !p.is_empty());
        let runtime_ref = engine
            .dialect()
            .table_reference(project, dataset, &table.table_name);

        let not_executable_reason = match table.sync_status {
            SyncStatus::Pending | SyncStatus::Syncing => Some(format!(
                "Table snapshot is not ready yet (status: {})",
                table.sync_status
            )),
            SyncStatus::Failed => Some(match &table.last_error {
                Some(err) => format!("Last sync failed: {}", err),
                None => "Last sync failed".to_string(),
            }),
            SyncStatus::Ready if engine == RuntimeEngine::BigQuery && project.is_none() => {
                Some("BigQuery table has no project configured".to_string())
            }
            SyncStatus::Ready if table.columns.is_empty() => {
                Some("Table has no columns".to_string())
            }
            SyncStatus::Ready => None,
        };

        Self {
            physical_table_id: table.id.clone(),
            table_name: table.table_name.clone(),
            dataset_name: dataset.to_string(),
            source_type: table.source_type.clone(),
            engine,
            runtime_ref,
            executable: not_executable_reason.is_none(),
            not_executable_reason,
            columns: table.columns.clone(),
        }
    }

    pub fn into_model_table(self, id: impl Into<String>, data_model_id: impl Into<String>) -> ModelTable {
        ModelTable {
            id: id.into(),
            data_model_id: data_model_id.into(),
            physical_table_id: self.physical_table_id,
            table_name: self.table_name,
            dataset_name: self.dataset_name,
            source_type: self.source_type,
            engine: self.engine,
            runtime_ref: self.runtime_ref,
            executable: self.executable,
            not_executable_reason: self.not_executable_reason,
            columns: self.columns,
        }
    }
}

/// Reason recorded on model tables whose registry row disappeared
pub const REMOVED_SOURCE_REASON: &str = "Source table was removed from the registry";
