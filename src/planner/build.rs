//! Plan assembly: request + catalog + policy -> QueryPlan

use std::collections::BTreeSet;

use tracing::debug;

use crate::catalog::{CatalogSnapshot, ModelTable};
use crate::config::PlannerConfig;
use crate::dialect::RuntimeEngine;
use crate::emitter::emit_sql;
use crate::graph::{assign_aliases, resolve_join_paths, JoinGraph, JoinLayout};
use crate::plan::{ColumnRef, JoinClause, QueryPlan, SelectStatement, TableSource};
use crate::policy::{compile_rls, SharePolicy};
use crate::query::{FilterSpec, QueryRequest};
use super::error::PlanError;
use super::filter::compile_filters;
use super::projection::compile_projections;
use super::scope::Scope;

/// Everything planning reads besides the request
#[derive(Debug, Clone, Copy)]
pub struct PlanContext<'a> {
    pub catalog: &'a CatalogSnapshot,
    /// Share policy of the requester; `None` means unrestricted
    pub policy: Option<&'a SharePolicy>,
    pub config: &'a PlannerConfig,
}

/// Compile a request into a single-engine SQL plan
pub fn plan_query(ctx: &PlanContext<'_>, request: &QueryRequest) -> Result<QueryPlan, PlanError> {
    let stmt = build_statement(ctx, request)?;
    let emitted = emit_sql(&stmt.select, stmt.engine.dialect());
    debug!(
        engine = %stmt.engine,
        root = %stmt.root_table_id,
        tables = stmt.layout_table_ids.len(),
        params = emitted.params.len(),
        "planned query"
    );

    Ok(QueryPlan {
        root_table_id: stmt.root_table_id,
        table_ids: stmt.layout_table_ids,
        relationship_ids: stmt.relationship_ids,
        engine: stmt.engine,
        sql: emitted.sql,
        params: emitted.params,
        columns: stmt.select.output_columns(),
        dropped_table_ids: stmt.dropped_table_ids,
    })
}

/// A statement before emission
#[derive(Debug, Clone)]
pub struct PlannedStatement {
    pub root_table_id: String,
    pub layout_table_ids: Vec<String>,
    pub relationship_ids: Vec<String>,
    pub dropped_table_ids: Vec<String>,
    pub engine: RuntimeEngine,
    pub select: SelectStatement,
}

/// Resolve tables, joins and predicates of a request into a SelectStatement
pub fn build_statement(
    ctx: &PlanContext<'_>,
    request: &QueryRequest,
) -> Result<PlannedStatement, PlanError> {
    if let Some(policy) = ctx.policy {
        policy.check_page(request.page_id.as_deref())?;
    }

    if request.projections.is_empty() {
        return Err(PlanError::MissingTableScope);
    }

    // Required tables: everything projected, grouped or ordered
    let mut required: Vec<String> = Vec::new();
    let table_refs = request
        .projections
        .iter()
        .map(|p| p.table_ref.as_str())
        .chain(request.group_by.iter().map(|g| g.table_ref.as_str()))
        .chain(request.order_by.iter().filter_map(|o| o.table_ref.as_deref()));
    for table_ref in table_refs {
        let table = find_table(ctx.catalog, table_ref)?;
        if !required.contains(&table.id) {
            required.push(table.id.clone());
        }
    }
    let root = required[0].clone();
    check_single_engine(ctx.catalog, &required)?;

    // Filter-only tables
    let mut user_filters: Vec<(String, &FilterSpec)> = Vec::with_capacity(request.filters.len());
    for filter in &request.filters {
        let table = find_table(ctx.catalog, &filter.table_ref)?;
        user_filters.push((table.id.clone(), filter));
    }

    let rls_groups = match ctx.policy {
        Some(policy) if policy.has_rls() => {
            let mut candidate_ids: Vec<&str> = required.iter().map(|s| s.as_str()).collect();
            for (id, _) in &user_filters {
                if !candidate_ids.contains(&id.as_str()) {
                    candidate_ids.push(id);
                }
            }
            let candidates: Vec<&ModelTable> = candidate_ids
                .iter()
                .filter_map(|id| ctx.catalog.get_table(id))
                .collect();
            compile_rls(&policy.rule_groups, &candidates)
        }
        _ => Vec::new(),
    };

    let mut optional: Vec<String> = Vec::new();
    let filter_table_ids = user_filters
        .iter()
        .map(|(id, _)| id.as_str())
        .chain(rls_groups.iter().flat_map(|g| g.table_ids()));
    for id in filter_table_ids {
        if !required.iter().any(|r| r == id) && !optional.iter().any(|o| o == id) {
            optional.push(id.to_string());
        }
    }

    // Join paths and aliases
    let graph = JoinGraph::build(&ctx.catalog.relationships);
    let paths = resolve_join_paths(&graph, &root, &required, &optional)?;
    let layout = assign_aliases(&root, &paths.edges)?;
    let dropped = paths.dropped_optional;

    let scope = Scope::new(ctx.catalog, &layout)?;
    let engine = check_layout(&scope)?;

    // Predicates: user filters first, then each RLS group ANDed on
    let active_user = user_filters
        .iter()
        .filter(|(id, _)| !dropped.contains(id))
        .map(|(_, f)| *f);
    let mut filter = compile_filters(&scope, active_user)?;
    for group in &rls_groups {
        let active = group.filters.iter().filter(|f| !dropped.contains(&f.table_ref));
        if let Some(expr) = compile_filters(&scope, active)? {
            filter = Some(match filter {
                None => expr,
                Some(prev) => prev.and(expr),
            });
        }
    }

    let projections = compile_projections(&scope, request, ctx.config)?;
    let select = SelectStatement {
        projections: projections.items,
        from: root_source(&scope)?,
        joins: join_clauses(&scope, &layout)?,
        filter,
        group_by: projections.group_by,
        order_by: projections.order_by,
        limit: ctx.config.effective_limit(request.limit),
    };

    Ok(PlannedStatement {
        root_table_id: root,
        layout_table_ids: layout.table_ids(),
        relationship_ids: layout.relationship_ids(),
        dropped_table_ids: dropped,
        engine,
        select,
    })
}

fn find_table<'a>(catalog: &'a CatalogSnapshot, table_ref: &str) -> Result<&'a ModelTable, PlanError> {
    catalog
        .find_table(table_ref)
        .ok_or_else(|| PlanError::TableNotFound(table_ref.to_string()))
}

/// Reject table sets spanning more than one engine
fn check_single_engine(catalog: &CatalogSnapshot, table_ids: &[String]) -> Result<(), PlanError> {
    let engines: BTreeSet<RuntimeEngine> = table_ids
        .iter()
        .filter_map(|id| catalog.get_table(id))
        .map(|t| t.engine)
        .collect();
    if engines.len() > 1 {
        return Err(PlanError::CrossSourceBlocked {
            engines: engines.into_iter().collect(),
        });
    }
    Ok(())
}

/// The statement's engine, once every aliased table agrees on it and can run
fn check_layout(scope: &Scope<'_>) -> Result<RuntimeEngine, PlanError> {
    let engines: BTreeSet<RuntimeEngine> = scope.tables().map(|t| t.engine).collect();
    if engines.len() > 1 {
        return Err(PlanError::CrossSourceBlocked {
            engines: engines.into_iter().collect(),
        });
    }
    for table in scope.tables() {
        if !table.executable {
            return Err(PlanError::TableNotExecutable {
                table: table.table_name.clone(),
                reason: table
                    .not_executable_reason
                    .clone()
                    .unwrap_or_else(|| "table is not executable".to_string()),
            });
        }
    }
    scope
        .root()
        .map(|(table, _)| table.engine)
        .ok_or(PlanError::MissingTableScope)
}

fn root_source(scope: &Scope<'_>) -> Result<TableSource, PlanError> {
    let (table, alias) = scope.root().ok_or(PlanError::MissingTableScope)?;
    Ok(TableSource {
        reference: table.runtime_ref.clone(),
        alias: alias.to_string(),
    })
}

fn join_clauses(scope: &Scope<'_>, layout: &JoinLayout<'_>) -> Result<Vec<JoinClause>, PlanError> {
    layout
        .steps
        .iter()
        .map(|step| {
            let table = scope
                .tables()
                .find(|t| t.id == step.table_id)
                .ok_or_else(|| PlanError::TableNotFound(step.table_id.clone()))?;
            let (left_alias, left_column) = &step.left;
            Ok(JoinClause {
                table: TableSource {
                    reference: table.runtime_ref.clone(),
                    alias: step.alias.clone(),
                },
                left_key: ColumnRef::new(left_alias, left_column),
                right_key: ColumnRef::new(&step.alias, &step.right_column),
            })
        })
        .collect()
}
