//! Projection, grouping and ordering compilation

use std::collections::HashSet;

use crate::config::PlannerConfig;
use crate::plan::{Expr, OrderItem, OrderTarget, SelectItem};
use crate::query::{Aggregation, HierarchyPart, OrderKey, QueryRequest};
use super::error::PlanError;
use super::scope::Scope;

/// SELECT list, GROUP BY keys and ORDER BY items of a statement
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledProjections {
    pub items: Vec<SelectItem>,
    pub group_by: Vec<Expr>,
    pub order_by: Vec<OrderItem>,
}

/// Column expression with an optional calendar extraction
fn base_expr(
    scope: &Scope<'_>,
    table_ref: &str,
    column: &str,
    part: Option<HierarchyPart>,
) -> Result<Expr, PlanError> {
    let scoped = scope.column(table_ref, column)?;
    let expr = Expr::Column(scoped.column);
    Ok(match part {
        Some(part) => Expr::DatePart {
            part,
            expr: Box::new(expr),
        },
        None => expr,
    })
}

fn aggregate(func: Aggregation, expr: Expr) -> Expr {
    if func.is_aggregate() {
        Expr::Aggregate {
            func,
            expr: Box::new(expr),
        }
    } else {
        expr
    }
}

/// Compile projections, grouping and ordering.
///
/// Without explicit group keys, a request with at least one aggregated
/// projection groups by every non-aggregated projection.
pub fn compile_projections(
    scope: &Scope<'_>,
    request: &QueryRequest,
    config: &PlannerConfig,
) -> Result<CompiledProjections, PlanError> {
    let mut aliases = AliasSet::new(config.max_alias_len);
    let mut items = Vec::with_capacity(request.projections.len());
    let mut plain = Vec::new();

    for (idx, projection) in request.projections.iter().enumerate() {
        let base = base_expr(
            scope,
            &projection.table_ref,
            &projection.column,
            projection.hierarchy_part,
        )?;
        if !projection.aggregation.is_aggregate() {
            plain.push(base.clone());
        }
        let requested = projection.alias.clone().unwrap_or_else(|| {
            default_alias(&projection.column, projection.aggregation, projection.hierarchy_part)
        });
        items.push(SelectItem {
            expr: aggregate(projection.aggregation, base),
            alias: aliases.assign(&requested, idx + 1),
        });
    }

    let has_aggregate = request.projections.iter().any(|p| p.aggregation.is_aggregate());
    let group_by = if !request.group_by.is_empty() {
        let mut keys = Vec::with_capacity(request.group_by.len());
        for key in &request.group_by {
            let expr = base_expr(scope, &key.table_ref, &key.column, key.hierarchy_part)?;
            if !keys.contains(&expr) {
                keys.push(expr);
            }
        }
        keys
    } else if has_aggregate {
        let mut keys: Vec<Expr> = Vec::with_capacity(plain.len());
        for expr in plain {
            if !keys.contains(&expr) {
                keys.push(expr);
            }
        }
        keys
    } else {
        Vec::new()
    };

    let order_by = request
        .order_by
        .iter()
        .map(|key| order_item(scope, request, &items, key))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CompiledProjections {
        items,
        group_by,
        order_by,
    })
}

fn order_item(
    scope: &Scope<'_>,
    request: &QueryRequest,
    items: &[SelectItem],
    key: &OrderKey,
) -> Result<OrderItem, PlanError> {
    let target = match &key.table_ref {
        None => {
            let alias = items
                .iter()
                .find(|item| item.alias == key.column)
                .or_else(|| items.iter().find(|item| item.alias.eq_ignore_ascii_case(&key.column)))
                .map(|item| item.alias.clone())
                .ok_or_else(|| PlanError::ColumnNotFound {
                    table: "(output)".to_string(),
                    column: key.column.clone(),
                })?;
            OrderTarget::Alias(alias)
        }
        Some(table_ref) => {
            // Reuse the output column when the same expression is projected
            let projected = request.projections.iter().position(|p| {
                p.table_ref == *table_ref
                    && p.column == key.column
                    && p.aggregation == key.aggregation
                    && p.hierarchy_part == key.hierarchy_part
            });
            match projected {
                Some(idx) => OrderTarget::Alias(items[idx].alias.clone()),
                None => {
                    let base = base_expr(scope, table_ref, &key.column, key.hierarchy_part)?;
                    OrderTarget::Expr(aggregate(key.aggregation, base))
                }
            }
        }
    };
    Ok(OrderItem {
        target,
        direction: key.direction,
    })
}

/// `<column>` or `<agg>_<column>`, suffixed with the hierarchy part
pub fn default_alias(column: &str, aggregation: Aggregation, part: Option<HierarchyPart>) -> String {
    let mut alias = if aggregation.is_aggregate() {
        format!("{}_{}", aggregation, column)
    } else {
        column.to_string()
    };
    if let Some(part) = part {
        alias.push('_');
        alias.push_str(&part.to_string());
    }
    alias
}

/// Output aliases already handed out in one statement
#[derive(Debug)]
pub struct AliasSet {
    max_len: usize,
    taken: HashSet<String>,
}

impl AliasSet {
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            taken: HashSet::new(),
        }
    }

    /// Sanitize `requested` and make it unique.
    ///
    /// `position` (1-based) names columns whose alias sanitizes to nothing.
    pub fn assign(&mut self, requested: &str, position: usize) -> String {
        let mut base: String = requested
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if base.trim_matches('_').is_empty() {
            base = format!("col_{}", position);
        }
        base.truncate(self.max_len);

        let mut candidate = base.clone();
        let mut n = 2;
        while self.taken.contains(&candidate) {
            let suffix = format!("_{}", n);
            let keep = self.max_len.saturating_sub(suffix.len());
            let mut stem = base.clone();
            stem.truncate(keep);
            candidate = format!("{}{}", stem, suffix);
            n += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
