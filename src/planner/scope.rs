//! Aliased tables visible to expressions of one statement

use crate::catalog::{CatalogSnapshot, DataType, ModelTable};
use crate::graph::JoinLayout;
use crate::plan::ColumnRef;
use super::error::PlanError;

/// A column resolved against the statement's tables
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedColumn {
    pub column: ColumnRef,
    /// Declared type; `None` when the table declares no columns
    pub data_type: Option<DataType>,
}

#[derive(Debug)]
struct ScopeEntry<'a> {
    alias: String,
    table: &'a ModelTable,
}

/// Tables of the statement in alias order
#[derive(Debug)]
pub struct Scope<'a> {
    catalog: &'a CatalogSnapshot,
    entries: Vec<ScopeEntry<'a>>,
}

impl<'a> Scope<'a> {
    pub fn new(catalog: &'a CatalogSnapshot, layout: &JoinLayout<'_>) -> Result<Self, PlanError> {
        let entries = layout
            .aliases
            .iter()
            .map(|(table_id, alias)| {
                catalog
                    .get_table(table_id)
                    .map(|table| ScopeEntry {
                        alias: alias.clone(),
                        table,
                    })
                    .ok_or_else(|| PlanError::TableNotFound(table_id.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { catalog, entries })
    }

    pub fn tables(&self) -> impl Iterator<Item = &'a ModelTable> + '_ {
        self.entries.iter().map(|e| e.table)
    }

    pub fn root(&self) -> Option<(&'a ModelTable, &str)> {
        self.entries.first().map(|e| (e.table, e.alias.as_str()))
    }

    pub fn alias_of(&self, table_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.table.id == table_id)
            .map(|e| e.alias.as_str())
    }

    /// Look a table up the way the catalog resolves references, so a name
    /// shared by several tables maps to the same table that was joined
    fn entry(&self, table_ref: &str) -> Result<&ScopeEntry<'a>, PlanError> {
        let table = self
            .catalog
            .find_table(table_ref)
            .ok_or_else(|| PlanError::TableNotFound(table_ref.to_string()))?;
        self.entries
            .iter()
            .find(|e| e.table.id == table.id)
            .ok_or_else(|| PlanError::TableNotFound(table_ref.to_string()))
    }

    /// Resolve `table_ref.column`.
    ///
    /// Tables that declare columns must declare this one; the declared
    /// spelling is used in the SQL.
    pub fn column(&self, table_ref: &str, column: &str) -> Result<ScopedColumn, PlanError> {
        let entry = self.entry(table_ref)?;
        if entry.table.columns.is_empty() {
            return Ok(ScopedColumn {
                column: ColumnRef::new(&entry.alias, column),
                data_type: None,
            });
        }
        let declared = entry
            .table
            .get_column(column)
            .ok_or_else(|| PlanError::ColumnNotFound {
                table: entry.table.table_name.clone(),
                column: column.to_string(),
            })?;
        Ok(ScopedColumn {
            column: ColumnRef::new(&entry.alias, &declared.name),
            data_type: Some(declared.data_type.clone()),
        })
    }
}
