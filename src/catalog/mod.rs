//! Catalog (noun + verb module)
//!
//! Data models, model tables and relationships, plus the loader that keeps
//! model tables in step with the physical table registry.

mod error;
mod model;
mod runtime;
mod sync;
mod types;

pub use error::CatalogError;
pub use model::{
    Cardinality, CatalogSnapshot, CrossFilter, DataModel, ModelColumn, ModelTable, PhysicalTable,
    Relationship, SyncStatus, ValidationStatus,
};
pub use runtime::{ModelTableUpsert, REMOVED_SOURCE_REASON};
pub use sync::sync_catalog;
pub use types::{DataType, ParseDataTypeError};
