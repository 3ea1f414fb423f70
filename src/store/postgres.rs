//! Postgres-backed stores (sqlx)
//!
//! Pools are created by the caller and injected; nothing here retries or
//! applies timeouts.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};

use crate::catalog::{
    Cardinality, CrossFilter, DataModel, ModelColumn, ModelTable, ModelTableUpsert, PhysicalTable,
    Relationship, SyncStatus, ValidationStatus,
};
use crate::dialect::RuntimeEngine;
use crate::plan::SqlValue;
use crate::policy::{Requester, RlsDocument, SharePermission, ShareGrant};
use super::{CatalogStore, PolicyStore, RowExecutor, StoreError};

/// Metadata tables read and written by [`PgStore`]
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS data_models (
    id text PRIMARY KEY DEFAULT gen_random_uuid()::text,
    tenant_id text NOT NULL,
    name text NOT NULL,
    is_default boolean NOT NULL DEFAULT false,
    created_at timestamptz NOT NULL DEFAULT now()
);
CREATE UNIQUE INDEX IF NOT EXISTS data_models_one_default
    ON data_models (tenant_id) WHERE is_default;

CREATE TABLE IF NOT EXISTS physical_tables (
    id text PRIMARY KEY,
    tenant_id text NOT NULL,
    table_name text NOT NULL,
    dataset_name text NOT NULL DEFAULT '',
    source_type text NOT NULL,
    project_id text,
    sync_status text NOT NULL DEFAULT 'ready',
    last_error text,
    is_active boolean NOT NULL DEFAULT true,
    columns jsonb NOT NULL DEFAULT '[]',
    created_at timestamptz NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS model_tables (
    id text PRIMARY KEY DEFAULT gen_random_uuid()::text,
    data_model_id text NOT NULL REFERENCES data_models (id),
    physical_table_id text NOT NULL,
    table_name text NOT NULL,
    dataset_name text NOT NULL,
    source_type text NOT NULL,
    engine text NOT NULL,
    runtime_ref text NOT NULL,
    executable boolean NOT NULL,
    not_executable_reason text,
    columns jsonb NOT NULL DEFAULT '[]',
    updated_at timestamptz NOT NULL DEFAULT now(),
    UNIQUE (data_model_id, physical_table_id)
);

CREATE TABLE IF NOT EXISTS model_relationships (
    id text PRIMARY KEY DEFAULT gen_random_uuid()::text,
    data_model_id text NOT NULL REFERENCES data_models (id),
    from_table_id text NOT NULL,
    from_column text NOT NULL,
    to_table_id text NOT NULL,
    to_column text NOT NULL,
    cardinality text NOT NULL,
    cross_filter text NOT NULL DEFAULT 'single',
    validation_status text NOT NULL DEFAULT 'pending',
    created_at timestamptz NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS dashboard_shares (
    id text PRIMARY KEY DEFAULT gen_random_uuid()::text,
    tenant_id text NOT NULL,
    dashboard_id text NOT NULL,
    user_id text,
    group_id text,
    permission text NOT NULL,
    allowed_page_ids text[],
    rls jsonb
);
"#;

fn decode<T: FromStr<Err = String>>(entity: &'static str, raw: &str) -> Result<T, StoreError> {
    raw.parse::<T>()
        .map_err(|message| StoreError::Decode { entity, message })
}

// ----------------------------------------------------------------------------
// Row types
// ----------------------------------------------------------------------------

#[derive(FromRow)]
struct DataModelRow {
    id: String,
    tenant_id: String,
    name: String,
    is_default: bool,
    created_at: DateTime<Utc>,
}

impl From<DataModelRow> for DataModel {
    fn from(row: DataModelRow) -> Self {
        DataModel {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            is_default: row.is_default,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct PhysicalTableRow {
    id: String,
    tenant_id: String,
    table_name: String,
    dataset_name: String,
    source_type: String,
    project_id: Option<String>,
    sync_status: String,
    last_error: Option<String>,
    is_active: bool,
    columns: Json<Vec<ModelColumn>>,
}

impl TryFrom<PhysicalTableRow> for PhysicalTable {
    type Error = StoreError;

    fn try_from(row: PhysicalTableRow) -> Result<Self, Self::Error> {
        Ok(PhysicalTable {
            sync_status: decode::<SyncStatus>("physical table", &row.sync_status)?,
            id: row.id,
            tenant_id: row.tenant_id,
            table_name: row.table_name,
            dataset_name: row.dataset_name,
            source_type: row.source_type,
            project_id: row.project_id,
            last_error: row.last_error,
            is_active: row.is_active,
            columns: row.columns.0,
        })
    }
}

#[derive(FromRow)]
struct ModelTableRow {
    id: String,
    data_model_id: String,
    physical_table_id: String,
    table_name: String,
    dataset_name: String,
    source_type: String,
    engine: String,
    runtime_ref: String,
    executable: bool,
    not_executable_reason: Option<String>,
    columns: Json<Vec<ModelColumn>>,
}

impl TryFrom<ModelTableRow> for ModelTable {
    type Error = StoreError;

    fn try_from(row: ModelTableRow) -> Result<Self, Self::Error> {
        Ok(ModelTable {
            engine: decode::<RuntimeEngine>("model table", &row.engine)?,
            id: row.id,
            data_model_id: row.data_model_id,
            physical_table_id: row.physical_table_id,
            table_name: row.table_name,
            dataset_name: row.dataset_name,
            source_type: row.source_type,
            runtime_ref: row.runtime_ref,
            executable: row.executable,
            not_executable_reason: row.not_executable_reason,
            columns: row.columns.0,
        })
    }
}

#[derive(FromRow)]
struct RelationshipRow {
    id: String,
    data_model_id: String,
    from_table_id: String,
    from_column: String,
    to_table_id: String,
    to_column: String,
    cardinality: String,
    cross_filter: String,
    validation_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<RelationshipRow> for Relationship {
    type Error = StoreError;

    fn try_from(row: RelationshipRow) -> Result<Self, Self::Error> {
        Ok(Relationship {
            cardinality: decode::<Cardinality>("relationship", &row.cardinality)?,
            cross_filter: decode::<CrossFilter>("relationship", &row.cross_filter)?,
            validation_status: decode::<ValidationStatus>("relationship", &row.validation_status)?,
            id: row.id,
            data_model_id: row.data_model_id,
            from_table_id: row.from_table_id,
            from_column: row.from_column,
            to_table_id: row.to_table_id,
            to_column: row.to_column,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct ShareRow {
    id: String,
    tenant_id: String,
    dashboard_id: String,
    user_id: Option<String>,
    group_id: Option<String>,
    permission: String,
    allowed_page_ids: Option<Vec<String>>,
    rls: Option<serde_json::Value>,
}

impl TryFrom<ShareRow> for ShareGrant {
    type Error = StoreError;

    fn try_from(row: ShareRow) -> Result<Self, Self::Error> {
        let rls = match row.rls {
            None | Some(serde_json::Value::Null) => RlsDocument::default(),
            Some(doc) => serde_json::from_value(doc).map_err(|e| StoreError::Decode {
                entity: "share rls",
                message: e.to_string(),
            })?,
        };
        Ok(ShareGrant {
            permission: decode::<SharePermission>("share", &row.permission)?,
            id: row.id,
            tenant_id: row.tenant_id,
            dashboard_id: row.dashboard_id,
            user_id: row.user_id,
            group_id: row.group_id,
            allowed_page_ids: row.allowed_page_ids.unwrap_or_default(),
            rls,
        })
    }
}

const MODEL_TABLE_COLUMNS: &str = "id, data_model_id, physical_table_id, table_name, dataset_name, \
     source_type, engine, runtime_ref, executable, not_executable_reason, columns";

// ----------------------------------------------------------------------------
// Stores
// ----------------------------------------------------------------------------

/// Catalog and share store over the metadata tables in [`SCHEMA`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the metadata tables when missing
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

impl CatalogStore for PgStore {
    async fn find_data_model(
        &self,
        tenant_id: &str,
        data_model_id: &str,
    ) -> Result<Option<DataModel>, StoreError> {
        let row: Option<DataModelRow> = sqlx::query_as(
            "SELECT id, tenant_id, name, is_default, created_at FROM data_models \
             WHERE id = $1 AND tenant_id = $2",
        )
        .bind(data_model_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DataModel::from))
    }

    async fn default_data_model(&self, tenant_id: &str) -> Result<Option<DataModel>, StoreError> {
        let row: Option<DataModelRow> = sqlx::query_as(
            "SELECT id, tenant_id, name, is_default, created_at FROM data_models \
             WHERE tenant_id = $1 AND is_default",
        )
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(DataModel::from))
    }

    async fn create_default_data_model(&self, tenant_id: &str) -> Result<DataModel, StoreError> {
        // A concurrent creator wins the partial unique index; re-read either way.
        sqlx::query(
            "INSERT INTO data_models (tenant_id, name, is_default) VALUES ($1, 'Default', true) \
             ON CONFLICT (tenant_id) WHERE is_default DO NOTHING",
        )
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;
        self.default_data_model(tenant_id)
            .await?
            .ok_or_else(|| StoreError::Decode {
                entity: "data model",
                message: format!("no default data model for tenant '{}' after insert", tenant_id),
            })
    }

    async fn active_physical_tables(&self, tenant_id: &str) -> Result<Vec<PhysicalTable>, StoreError> {
        let rows: Vec<PhysicalTableRow> = sqlx::query_as(
            "SELECT id, tenant_id, table_name, dataset_name, source_type, project_id, sync_status, \
             last_error, is_active, columns FROM physical_tables \
             WHERE tenant_id = $1 AND is_active ORDER BY created_at, id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(PhysicalTable::try_from).collect()
    }

    async fn upsert_model_table(
        &self,
        data_model_id: &str,
        table: &ModelTableUpsert,
    ) -> Result<ModelTable, StoreError> {
        let sql = format!(
            "INSERT INTO model_tables (data_model_id, physical_table_id, table_name, dataset_name, \
             source_type, engine, runtime_ref, executable, not_executable_reason, columns) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (data_model_id, physical_table_id) DO UPDATE SET \
             table_name = excluded.table_name, dataset_name = excluded.dataset_name, \
             source_type = excluded.source_type, engine = excluded.engine, \
             runtime_ref = excluded.runtime_ref, executable = excluded.executable, \
             not_executable_reason = excluded.not_executable_reason, columns = excluded.columns, \
             updated_at = now() \
             RETURNING {}",
            MODEL_TABLE_COLUMNS
        );
        let row: ModelTableRow = sqlx::query_as(&sql)
            .bind(data_model_id)
            .bind(&table.physical_table_id)
            .bind(&table.table_name)
            .bind(&table.dataset_name)
            .bind(&table.source_type)
            .bind(table.engine.as_str())
            .bind(&table.runtime_ref)
            .bind(table.executable)
            .bind(&table.not_executable_reason)
            .bind(Json(&table.columns))
            .fetch_one(&self.pool)
            .await?;
        ModelTable::try_from(row)
    }

    async fn retire_model_tables(
        &self,
        data_model_id: &str,
        keep: &[String],
        reason: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE model_tables SET executable = false, not_executable_reason = $3, updated_at = now() \
             WHERE data_model_id = $1 AND NOT (physical_table_id = ANY($2)) \
             AND (executable OR not_executable_reason IS DISTINCT FROM $3)",
        )
        .bind(data_model_id)
        .bind(keep)
        .bind(reason)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn model_tables(&self, data_model_id: &str) -> Result<Vec<ModelTable>, StoreError> {
        let sql = format!(
            "SELECT {} FROM model_tables WHERE data_model_id = $1 ORDER BY table_name, id",
            MODEL_TABLE_COLUMNS
        );
        let rows: Vec<ModelTableRow> = sqlx::query_as(&sql)
            .bind(data_model_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ModelTable::try_from).collect()
    }

    async fn relationships(&self, data_model_id: &str) -> Result<Vec<Relationship>, StoreError> {
        let rows: Vec<RelationshipRow> = sqlx::query_as(
            "SELECT id, data_model_id, from_table_id, from_column, to_table_id, to_column, \
             cardinality, cross_filter, validation_status, created_at \
             FROM model_relationships WHERE data_model_id = $1 ORDER BY created_at, id",
        )
        .bind(data_model_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Relationship::try_from).collect()
    }
}

impl PolicyStore for PgStore {
    async fn share_grants(
        &self,
        tenant_id: &str,
        dashboard_id: &str,
        requester: &Requester,
    ) -> Result<Vec<ShareGrant>, StoreError> {
        let rows: Vec<ShareRow> = sqlx::query_as(
            "SELECT id, tenant_id, dashboard_id, user_id, group_id, permission, allowed_page_ids, rls \
             FROM dashboard_shares \
             WHERE tenant_id = $1 AND dashboard_id = $2 \
             AND (user_id = $3 OR ($4::text IS NOT NULL AND group_id = $4))",
        )
        .bind(tenant_id)
        .bind(dashboard_id)
        .bind(&requester.user_id)
        .bind(&requester.group_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(ShareGrant::try_from).collect()
    }
}

/// Wrap a statement so each row comes back as one JSON object.
///
/// The statement sits on its own lines so a trailing `--` comment cannot
/// swallow the closing parenthesis.
fn wrap_row_json(sql: &str) -> String {
    format!("SELECT row_to_json(q) AS row FROM (\n{}\n) AS q", sql)
}

/// Runs compiled Postgres plans and returns each row as a JSON object
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl RowExecutor for PgExecutor {
    async fn fetch_rows(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        let wrapped = wrap_row_json(sql);
        let mut query = sqlx::query(&wrapped);
        for param in params {
            query = match param {
                SqlValue::Null => query.bind(None::<String>),
                SqlValue::Bool(b) => query.bind(*b),
                SqlValue::Int(i) => query.bind(*i),
                SqlValue::Float(f) => query.bind(*f),
                SqlValue::Text(s) => query.bind(s.as_str()),
            };
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<serde_json::Value, _>("row").map_err(StoreError::from))
            .collect()
    }
}
