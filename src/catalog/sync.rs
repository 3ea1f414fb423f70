//! Catalog loader: resolve the data model and refresh its model tables

use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::store::CatalogStore;
use super::error::CatalogError;
use super::model::{CatalogSnapshot, DataModel};
use super::runtime::{ModelTableUpsert, REMOVED_SOURCE_REASON};

/// Load a consistent catalog snapshot for one planning call.
///
/// Without a `data_model_id` the tenant's default model is used, and created
/// when missing. Every active physical table of the tenant is upserted as a
/// model table; model tables whose physical table disappeared are kept but
/// marked not executable. Model tables are never deleted.
pub async fn sync_catalog<S: CatalogStore>(
    store: &S,
    config: &PlannerConfig,
    tenant_id: &str,
    data_model_id: Option<&str>,
) -> Result<CatalogSnapshot, CatalogError> {
    let model = resolve_data_model(store, tenant_id, data_model_id).await?;

    let physical = store.active_physical_tables(tenant_id).await?;
    let mut kept = Vec::with_capacity(physical.len());
    for table in &physical {
        let upsert = ModelTableUpsert::from_physical(table, config);
        if !upsert.executable {
            debug!(
                table = %upsert.table_name,
                reason = upsert.not_executable_reason.as_deref().unwrap_or(""),
                "model table is not executable"
            );
        }
        store.upsert_model_table(&model.id, &upsert).await?;
        kept.push(table.id.clone());
    }
    let retired = store
        .retire_model_tables(&model.id, &kept, REMOVED_SOURCE_REASON)
        .await?;

    let tables = store.model_tables(&model.id).await?;
    let relationships = store.relationships(&model.id).await?;

    info!(
        tenant = %tenant_id,
        data_model = %model.id,
        upserted = kept.len(),
        retired,
        relationships = relationships.len(),
        "catalog synced"
    );

    Ok(CatalogSnapshot {
        model,
        tables,
        relationships,
    })
}

async fn resolve_data_model<S: CatalogStore>(
    store: &S,
    tenant_id: &str,
    data_model_id: Option<&str>,
) -> Result<DataModel, CatalogError> {
    match data_model_id {
        Some(id) => store
            .find_data_model(tenant_id, id)
            .await?
            .ok_or_else(|| CatalogError::DataModelNotFound {
                tenant_id: tenant_id.to_string(),
                data_model_id: id.to_string(),
            }),
        None => match store.default_data_model(tenant_id).await? {
            Some(model) => Ok(model),
            None => {
                debug!(tenant = %tenant_id, "creating default data model");
                Ok(store.create_default_data_model(tenant_id).await?)
            }
        },
    }
}
