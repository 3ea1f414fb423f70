//! SQL dialects (strategy module)
//!
//! Every engine-specific piece of SQL text (identifier quoting, calendar
//! extraction, literal escaping, parameter placeholders) goes through the
//! [`Dialect`] returned by [`RuntimeEngine::dialect`].

mod bigquery;
mod postgres;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::DataType;
use crate::plan::SqlValue;
use crate::query::HierarchyPart;

pub use bigquery::BigQuery;
pub use postgres::Postgres;

/// Backend a model table executes on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEngine {
    /// Row store, executed by this crate
    Postgres,
    /// Warehouse, SQL is only emitted
    BigQuery,
}

impl RuntimeEngine {
    pub fn dialect(&self) -> &'static dyn Dialect {
        match self {
            RuntimeEngine::Postgres => &Postgres,
            RuntimeEngine::BigQuery => &BigQuery,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeEngine::Postgres => "postgres",
            RuntimeEngine::BigQuery => "bigquery",
        }
    }
}

impl fmt::Display for RuntimeEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(RuntimeEngine::Postgres),
            "bigquery" => Ok(RuntimeEngine::BigQuery),
            other => Err(format!("unknown runtime engine '{}'", other)),
        }
    }
}

/// SQL text generation for one engine
pub trait Dialect: Sync {
    fn engine(&self) -> RuntimeEngine;

    /// Quote a single identifier (column or alias)
    fn quote_ident(&self, ident: &str) -> String;

    /// Fully quoted table reference usable in FROM/JOIN
    fn table_reference(&self, project: Option<&str>, dataset: &str, table: &str) -> String;

    /// Integer calendar component of an already rendered date/time expression
    fn date_part(&self, part: HierarchyPart, expr: &str) -> String;

    /// Inline literal
    fn literal(&self, value: &SqlValue) -> String;

    /// Placeholder for the 1-based bound parameter, `None` when the dialect
    /// inlines values instead
    fn placeholder(&self, position: usize) -> Option<String>;

    /// Type name a textual value is cast to when compared against a column
    /// of `data_type`; `None` leaves the value as text
    fn cast_type(&self, data_type: &DataType) -> Option<&'static str>;

    /// Case-insensitive LIKE over the text form of `expr`
    fn text_like(&self, expr: &str, pattern: &str, negated: bool) -> String;
}
