//! Row-level security compilation
//!
//! Stored RLS conditions name a field, not a table. Each condition is bound
//! to the first candidate table that declares a column of that name.

use tracing::debug;

use crate::catalog::ModelTable;
use crate::query::{FilterSpec, LogicalConnector};
use super::grant::RlsRuleGroup;

/// Filters from one rule group, combined with the group's connector
#[derive(Debug, Clone, PartialEq)]
pub struct RlsFilterGroup {
    pub combinator: LogicalConnector,
    /// `table_ref` of every filter is the bound table's id
    pub filters: Vec<FilterSpec>,
}

impl RlsFilterGroup {
    pub fn table_ids(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.table_ref.as_str())
    }
}

/// Bind each rule group's conditions to `candidates`, in candidate order.
///
/// Conditions whose field matches no candidate column are skipped; groups
/// left without conditions are omitted.
pub fn compile_rls(groups: &[RlsRuleGroup], candidates: &[&ModelTable]) -> Vec<RlsFilterGroup> {
    let mut compiled = Vec::new();
    for group in groups {
        let mut filters = Vec::new();
        for condition in &group.conditions {
            let bound = candidates.iter().find_map(|table| {
                table
                    .columns
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(&condition.field))
                    .map(|c| (table.id.as_str(), c.name.as_str()))
            });
            let Some((table_id, column)) = bound else {
                debug!(field = %condition.field, "no selected table has the RLS field, skipping condition");
                continue;
            };

            let mut filter = FilterSpec::new(table_id, column, condition.operator, condition.value.clone())
                .with_connector(group.combinator);
            if let Some(value2) = &condition.value2 {
                filter = filter.with_value2(value2.clone());
            }
            filters.push(filter);
        }
        if !filters.is_empty() {
            compiled.push(RlsFilterGroup {
                combinator: group.combinator,
                filters,
            });
        }
    }
    compiled
}
