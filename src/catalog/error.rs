//! Catalog errors

use std::fmt;

use crate::store::StoreError;

/// Errors that can occur while loading a catalog snapshot
#[derive(Debug)]
pub enum CatalogError {
    /// Named data model is unknown or owned by another tenant
    DataModelNotFound {
        tenant_id: String,
        data_model_id: String,
    },
    /// Metadata store failure
    Store(StoreError),
}

impl CatalogError {
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::DataModelNotFound { .. } => "DATA_MODEL_NOT_FOUND",
            CatalogError::Store(_) => "STORE_ERROR",
        }
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DataModelNotFound { tenant_id, data_model_id } => write!(
                f,
                "Data model '{}' not found for tenant '{}'",
                data_model_id, tenant_id
            ),
            CatalogError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Store(err) => Some(err),
            CatalogError::DataModelNotFound { .. } => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::Store(err)
    }
}
