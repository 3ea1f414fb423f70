//! Planner errors

use std::fmt;

use crate::dialect::RuntimeEngine;

/// Errors that can occur while planning or admitting a query.
///
/// Every variant carries a short code (see [`PlanError::code`]) that callers
/// surface unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanError {
    /// The request references no table
    MissingTableScope,
    /// A table reference matches no model table
    TableNotFound(String),
    /// A column is not declared on its table
    ColumnNotFound { table: String, column: String },
    /// A filter is missing values its operator needs
    InvalidFilter { column: String, message: String },
    /// A required table is unreachable from the root
    NoRelationshipPath { root: String, target: String },
    /// Alias assignment cannot attach the remaining join edges
    JoinGraph(String),
    /// Selected tables span more than one runtime engine
    CrossSourceBlocked { engines: Vec<RuntimeEngine> },
    /// A selected table cannot be queried right now
    TableNotExecutable { table: String, reason: String },
    /// The requested page is outside the share's allowed pages
    RlsPageDenied { page_id: Option<String> },
    /// The engine cannot be executed by this crate
    EngineNotSupported(RuntimeEngine),
    /// Raw SQL that is not a single read statement
    UnsafeSql(String),
}

impl PlanError {
    pub fn code(&self) -> &'static str {
        match self {
            PlanError::MissingTableScope => "MISSING_TABLE_SCOPE",
            PlanError::TableNotFound(_) => "TABLE_NOT_FOUND",
            PlanError::ColumnNotFound { .. } => "COLUMN_NOT_FOUND",
            PlanError::InvalidFilter { .. } => "INVALID_FILTER",
            PlanError::NoRelationshipPath { .. } => "NO_RELATIONSHIP_PATH",
            PlanError::JoinGraph(_) => "JOIN_GRAPH_ERROR",
            PlanError::CrossSourceBlocked { .. } => "CROSS_SOURCE_BLOCKED",
            PlanError::TableNotExecutable { .. } => "TABLE_NOT_EXECUTABLE",
            PlanError::RlsPageDenied { .. } => "RLS_PAGE_DENIED",
            PlanError::EngineNotSupported(_) => "ENGINE_NOT_SUPPORTED",
            PlanError::UnsafeSql(_) => "UNSAFE_SQL",
        }
    }
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::MissingTableScope => {
                write!(f, "Query must select at least one table column")
            }
            PlanError::TableNotFound(reference) => {
                write!(f, "Table '{}' not found in data model", reference)
            }
            PlanError::ColumnNotFound { table, column } => {
                write!(f, "Column '{}' not found in table '{}'", column, table)
            }
            PlanError::InvalidFilter { column, message } => {
                write!(f, "Invalid filter on '{}': {}", column, message)
            }
            PlanError::NoRelationshipPath { root, target } => {
                write!(f, "No relationship path from '{}' to '{}'", root, target)
            }
            PlanError::JoinGraph(msg) => write!(f, "Cannot build join graph: {}", msg),
            PlanError::CrossSourceBlocked { engines } => {
                let names: Vec<&str> = engines.iter().map(|e| e.as_str()).collect();
                write!(
                    f,
                    "Query spans multiple engines [{}]; tables from different sources cannot be combined",
                    names.join(", ")
                )
            }
            PlanError::TableNotExecutable { table, reason } => {
                write!(f, "Table '{}' is not queryable: {}", table, reason)
            }
            PlanError::RlsPageDenied { page_id } => match page_id {
                Some(page) => write!(f, "Access to page '{}' is not allowed", page),
                None => write!(f, "A page must be specified for this shared dashboard"),
            },
            PlanError::EngineNotSupported(engine) => {
                write!(f, "Execution on engine '{}' is not supported", engine)
            }
            PlanError::UnsafeSql(msg) => write!(f, "Refusing to run SQL: {}", msg),
        }
    }
}

impl std::error::Error for PlanError {}
