//! Metadata stores and execution backends
//!
//! The planner itself never touches storage. The facade reads the catalog and
//! share grants through these traits and runs compiled Postgres plans through
//! a [`RowExecutor`].

mod error;
mod memory;
mod postgres;

use std::future::Future;

use crate::catalog::{DataModel, ModelTable, ModelTableUpsert, PhysicalTable, Relationship};
use crate::plan::SqlValue;
use crate::policy::{Requester, ShareGrant};

pub use error::StoreError;
pub use memory::{CatalogFixture, ExecutedQuery, MemoryExecutor, MemoryStore};
pub use postgres::{PgExecutor, PgStore};

/// Catalog metadata: data models, physical and model tables, relationships
pub trait CatalogStore {
    /// Data model by id, only when it belongs to the tenant
    fn find_data_model(
        &self,
        tenant_id: &str,
        data_model_id: &str,
    ) -> impl Future<Output = Result<Option<DataModel>, StoreError>>;
    /// The tenant's default data model, if one exists
    fn default_data_model(
        &self,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Option<DataModel>, StoreError>>;
    /// Create the tenant's default data model.
    /// Returns the existing default when another caller created it first.
    fn create_default_data_model(
        &self,
        tenant_id: &str,
    ) -> impl Future<Output = Result<DataModel, StoreError>>;
    /// Active physical tables owned by the tenant, in registry order
    fn active_physical_tables(
        &self,
        tenant_id: &str,
    ) -> impl Future<Output = Result<Vec<PhysicalTable>, StoreError>>;
    /// Insert or refresh the model table for `(data_model_id, physical_table_id)`
    fn upsert_model_table(
        &self,
        data_model_id: &str,
        table: &ModelTableUpsert,
    ) -> impl Future<Output = Result<ModelTable, StoreError>>;
    /// Mark model tables whose physical table is not in `keep` as not executable.
    /// Returns the number of rows changed.
    fn retire_model_tables(
        &self,
        data_model_id: &str,
        keep: &[String],
        reason: &str,
    ) -> impl Future<Output = Result<u64, StoreError>>;
    fn model_tables(
        &self,
        data_model_id: &str,
    ) -> impl Future<Output = Result<Vec<ModelTable>, StoreError>>;
    /// Relationships ordered by creation time, then id
    fn relationships(
        &self,
        data_model_id: &str,
    ) -> impl Future<Output = Result<Vec<Relationship>, StoreError>>;
}

/// Dashboard share grants
pub trait PolicyStore {
    /// Grants on the dashboard for the requester's user id or group id
    fn share_grants(
        &self,
        tenant_id: &str,
        dashboard_id: &str,
        requester: &Requester,
    ) -> impl Future<Output = Result<Vec<ShareGrant>, StoreError>>;
}

/// Runs one read statement against the row store
pub trait RowExecutor {
    /// Rows as JSON objects keyed by output column
    fn fetch_rows(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, StoreError>>;
}
