//! Join path resolution and alias assignment

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::catalog::Relationship;
use crate::planner::PlanError;
use super::arena::JoinGraph;

/// Relationships needed to reach every selected table from the root
#[derive(Debug, Clone)]
pub struct JoinPaths<'a> {
    /// Deduplicated edges in first-seen order
    pub edges: Vec<&'a Relationship>,
    /// Optional tables that have a path
    pub reachable_optional: Vec<String>,
    /// Optional tables with no path; their predicates are not applied
    pub dropped_optional: Vec<String>,
}

/// Resolve the shortest path from `root` to every required and optional table.
///
/// A required table without a path is an error. An optional table without a
/// path is dropped.
pub fn resolve_join_paths<'a>(
    graph: &JoinGraph<'a>,
    root: &str,
    required: &[String],
    optional: &[String],
) -> Result<JoinPaths<'a>, PlanError> {
    let tree = graph.bfs(root);
    let mut seen: HashSet<&str> = HashSet::new();
    let mut paths = JoinPaths {
        edges: Vec::new(),
        reachable_optional: Vec::new(),
        dropped_optional: Vec::new(),
    };

    let mut push_path = |path: Vec<&'a Relationship>, paths: &mut JoinPaths<'a>| {
        for rel in path {
            if seen.insert(rel.id.as_str()) {
                paths.edges.push(rel);
            }
        }
    };

    for target in required {
        let path = tree.path_to(target).ok_or_else(|| PlanError::NoRelationshipPath {
            root: root.to_string(),
            target: target.clone(),
        })?;
        push_path(path, &mut paths);
    }

    for target in optional {
        if required.contains(target) {
            continue;
        }
        match tree.path_to(target) {
            Some(path) => {
                push_path(path, &mut paths);
                paths.reachable_optional.push(target.clone());
            }
            None => {
                warn!(root = %root, table = %target, "dropping filter-only table with no relationship path");
                paths.dropped_optional.push(target.clone());
            }
        }
    }

    debug!(root = %root, joins = paths.edges.len(), "resolved join paths");
    Ok(paths)
}

/// One join attached during alias assignment
#[derive(Debug, Clone)]
pub struct JoinStep<'a> {
    pub relationship: &'a Relationship,
    /// Newly attached table
    pub table_id: String,
    pub alias: String,
    /// Alias and column on the already-attached side
    pub left: (String, String),
    /// Column on the newly attached side
    pub right_column: String,
}

/// Aliases for every table in traversal order, root first
#[derive(Debug, Clone)]
pub struct JoinLayout<'a> {
    pub aliases: Vec<(String, String)>,
    pub steps: Vec<JoinStep<'a>>,
}

impl JoinLayout<'_> {
    pub fn alias_of(&self, table_id: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|(id, _)| id == table_id)
            .map(|(_, alias)| alias.as_str())
    }

    pub fn table_ids(&self) -> Vec<String> {
        self.aliases.iter().map(|(id, _)| id.clone()).collect()
    }

    pub fn relationship_ids(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.relationship.id.clone()).collect()
    }
}

/// Assign `t0` to the root and `t1..` to tables as their edges attach.
///
/// Each round attaches the first pending edge with exactly one aliased
/// endpoint. Edges whose endpoints are both aliased are discarded.
pub fn assign_aliases<'a>(
    root: &str,
    edges: &[&'a Relationship],
) -> Result<JoinLayout<'a>, PlanError> {
    let mut layout = JoinLayout {
        aliases: vec![(root.to_string(), "t0".to_string())],
        steps: Vec::new(),
    };
    let mut pending: Vec<&'a Relationship> = edges.to_vec();

    while !pending.is_empty() {
        pending.retain(|rel| {
            !(layout.alias_of(&rel.from_table_id).is_some()
                && layout.alias_of(&rel.to_table_id).is_some())
        });
        if pending.is_empty() {
            break;
        }

        let position = pending.iter().position(|rel| {
            layout.alias_of(&rel.from_table_id).is_some()
                != layout.alias_of(&rel.to_table_id).is_some()
        });
        let Some(position) = position else {
            let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();
            return Err(PlanError::JoinGraph(format!(
                "relationships [{}] are not connected to table '{}'",
                ids.join(", "),
                root
            )));
        };

        let rel = pending.remove(position);
        let (known_id, known_column, new_id, new_column) =
            if layout.alias_of(&rel.from_table_id).is_some() {
                (&rel.from_table_id, &rel.from_column, &rel.to_table_id, &rel.to_column)
            } else {
                (&rel.to_table_id, &rel.to_column, &rel.from_table_id, &rel.from_column)
            };
        let known_alias = layout.alias_of(known_id).unwrap_or("t0").to_string();
        let alias = format!("t{}", layout.aliases.len());

        layout.aliases.push((new_id.clone(), alias.clone()));
        layout.steps.push(JoinStep {
            relationship: rel,
            table_id: new_id.clone(),
            alias,
            left: (known_alias, known_column.clone()),
            right_column: new_column.clone(),
        });
    }

    Ok(layout)
}
