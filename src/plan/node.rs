//! Statement nodes and the compiled query plan

use serde::{Deserialize, Serialize};

use crate::dialect::RuntimeEngine;
use crate::query::SortDirection;
use super::expr::{ColumnRef, Expr};
use super::value::SqlValue;

/// A table in the FROM/JOIN list
#[derive(Debug, Clone, PartialEq)]
pub struct TableSource {
    /// Dialect-quoted table reference
    pub reference: String,
    pub alias: String,
}

/// INNER JOIN <table> <alias> ON <left> = <right>
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: TableSource,
    /// Key on the already joined side
    pub left_key: ColumnRef,
    /// Key on the table being joined
    pub right_key: ColumnRef,
}

/// A projected expression with its output alias
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    /// Sanitized output column name
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderTarget {
    /// Order by an output alias
    Alias(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub target: OrderTarget,
    pub direction: SortDirection,
}

/// A single SELECT statement over joined model tables
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub projections: Vec<SelectItem>,
    pub from: TableSource,
    pub joins: Vec<JoinClause>,
    pub filter: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderItem>,
    pub limit: u32,
}

impl SelectStatement {
    pub fn output_columns(&self) -> Vec<String> {
        self.projections.iter().map(|p| p.alias.clone()).collect()
    }
}

/// The compiled, engine-specific artifact of a query request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPlan {
    pub root_table_id: String,
    /// Every table in the statement, in alias order (`t0` first)
    pub table_ids: Vec<String>,
    /// Relationships used as join edges, in join order
    pub relationship_ids: Vec<String>,
    pub engine: RuntimeEngine,
    pub sql: String,
    /// Positional parameters; empty when the dialect inlines values
    pub params: Vec<SqlValue>,
    /// Output column names in SELECT order
    pub columns: Vec<String>,
    /// Filter-only tables left out because no join path reaches them
    #[serde(default)]
    pub dropped_table_ids: Vec<String>,
}
