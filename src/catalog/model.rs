//! Data models, model tables and relationships

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::dialect::RuntimeEngine;
use super::types::DataType;

/// Tenant-scoped namespace grouping queryable tables and their relationships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModel {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A column of a model or physical table with its declared type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelColumn {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: DataType,
}

impl ModelColumn {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Replication state of a physical table snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Ready,
    Pending,
    Syncing,
    Failed,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStatus::Ready => "ready",
            SyncStatus::Pending => "pending",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

impl FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ready" | "active" | "completed" => Ok(SyncStatus::Ready),
            "pending" => Ok(SyncStatus::Pending),
            "syncing" | "running" => Ok(SyncStatus::Syncing),
            "failed" | "error" => Ok(SyncStatus::Failed),
            other => Err(format!("unknown sync status '{}'", other)),
        }
    }
}

/// A row of the physical table registry owned by a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalTable {
    pub id: String,
    pub tenant_id: String,
    pub table_name: String,
    /// Schema (row store) or dataset (warehouse); empty for the default schema
    #[serde(default)]
    pub dataset_name: String,
    pub source_type: String,
    /// Warehouse project, required for BigQuery tables
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub last_error: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub columns: Vec<ModelColumn>,
}

fn default_true() -> bool {
    true
}

/// A queryable table inside a data model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTable {
    pub id: String,
    pub data_model_id: String,
    pub physical_table_id: String,
    pub table_name: String,
    pub dataset_name: String,
    pub source_type: String,
    pub engine: RuntimeEngine,
    /// Dialect-quoted name, used verbatim in FROM/JOIN
    pub runtime_ref: String,
    pub executable: bool,
    /// Why the table cannot be queried, set when `executable` is false
    #[serde(default)]
    pub not_executable_reason: Option<String>,
    #[serde(default)]
    pub columns: Vec<ModelColumn>,
}

impl ModelTable {
    /// Find a column by name (ASCII case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&ModelColumn> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)))
    }
}

/// Relationship cardinality between the two sides of a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cardinality {
    #[serde(rename = "1-1")]
    OneToOne,
    #[serde(rename = "1-n")]
    OneToMany,
    #[serde(rename = "n-1")]
    ManyToOne,
    #[serde(rename = "n-n")]
    ManyToMany,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Cardinality::OneToOne => "1-1",
            Cardinality::OneToMany => "1-n",
            Cardinality::ManyToOne => "n-1",
            Cardinality::ManyToMany => "n-n",
        };
        f.write_str(tag)
    }
}

impl FromStr for Cardinality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1-1" => Ok(Cardinality::OneToOne),
            "1-n" => Ok(Cardinality::OneToMany),
            "n-1" => Ok(Cardinality::ManyToOne),
            "n-n" => Ok(Cardinality::ManyToMany),
            other => Err(format!("unknown cardinality '{}'", other)),
        }
    }
}

/// Direction filters propagate across a relationship in the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossFilter {
    #[default]
    Single,
    Both,
}

impl FromStr for CrossFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(CrossFilter::Single),
            "both" => Ok(CrossFilter::Both),
            other => Err(format!("unknown cross filter direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    #[default]
    Pending,
}

impl FromStr for ValidationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "valid" => Ok(ValidationStatus::Valid),
            "invalid" => Ok(ValidationStatus::Invalid),
            "pending" => Ok(ValidationStatus::Pending),
            other => Err(format!("unknown validation status '{}'", other)),
        }
    }
}

/// A join definition: `from_table.from_column = to_table.to_column`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub data_model_id: String,
    pub from_table_id: String,
    pub from_column: String,
    pub to_table_id: String,
    pub to_column: String,
    pub cardinality: Cardinality,
    #[serde(default)]
    pub cross_filter: CrossFilter,
    #[serde(default)]
    pub validation_status: ValidationStatus,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// Whether this relationship may be used as a join edge.
    ///
    /// Many-to-many edges need a bridge table the model does not describe.
    pub fn is_joinable(&self) -> bool {
        self.validation_status == ValidationStatus::Valid
            && self.cardinality != Cardinality::ManyToMany
            && self.from_table_id != self.to_table_id
    }

    /// The column on `table_id`'s side of the relationship
    pub fn column_for(&self, table_id: &str) -> Option<&str> {
        if self.from_table_id == table_id {
            Some(&self.from_column)
        } else if self.to_table_id == table_id {
            Some(&self.to_column)
        } else {
            None
        }
    }
}

/// Everything the planner reads about one data model, loaded fresh per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSnapshot {
    pub model: DataModel,
    pub tables: Vec<ModelTable>,
    /// Ordered by creation; the join graph relies on this order for tie-breaks
    pub relationships: Vec<Relationship>,
}

impl CatalogSnapshot {
    pub fn get_table(&self, id: &str) -> Option<&ModelTable> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Resolve a table reference: model table id first, then table name
    pub fn find_table(&self, reference: &str) -> Option<&ModelTable> {
        self.get_table(reference).or_else(|| {
            self.tables
                .iter()
                .find(|t| t.table_name.eq_ignore_ascii_case(reference))
        })
    }

    pub fn get_relationship(&self, id: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }
}
