//! Request-scoped join graph
//!
//! Built once per planning call from the relationship snapshot; never
//! mutated afterwards.

use std::collections::{HashMap, VecDeque};

use crate::catalog::Relationship;

#[derive(Debug, Clone, Copy)]
struct Edge {
    to: usize,
    relationship: usize,
}

/// Adjacency arena over joinable relationships
#[derive(Debug)]
pub struct JoinGraph<'a> {
    nodes: Vec<&'a str>,
    index: HashMap<&'a str, usize>,
    adjacency: Vec<Vec<Edge>>,
    relationships: Vec<&'a Relationship>,
}

impl<'a> JoinGraph<'a> {
    /// Build the graph from valid, non many-to-many relationships.
    ///
    /// Each relationship contributes one edge per direction. Edges are added
    /// in creation order, which is the BFS tie-break among equal-length paths.
    pub fn build(relationships: &'a [Relationship]) -> Self {
        let mut ordered: Vec<&'a Relationship> =
            relationships.iter().filter(|r| r.is_joinable()).collect();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let mut graph = JoinGraph {
            nodes: Vec::new(),
            index: HashMap::new(),
            adjacency: Vec::new(),
            relationships: Vec::with_capacity(ordered.len()),
        };

        for rel in ordered {
            let rel_idx = graph.relationships.len();
            graph.relationships.push(rel);
            let from = graph.node(&rel.from_table_id);
            let to = graph.node(&rel.to_table_id);
            graph.adjacency[from].push(Edge { to, relationship: rel_idx });
            graph.adjacency[to].push(Edge { to: from, relationship: rel_idx });
        }

        graph
    }

    fn node(&mut self, table_id: &'a str) -> usize {
        if let Some(&idx) = self.index.get(table_id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(table_id);
        self.index.insert(table_id, idx);
        self.adjacency.push(Vec::new());
        idx
    }

    pub fn edge_count(&self) -> usize {
        self.relationships.len()
    }

    /// Breadth-first search tree rooted at `root`
    pub fn bfs(&self, root: &str) -> BfsTree<'_, 'a> {
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let root_idx = self.index.get(root).copied();

        if let Some(start) = root_idx {
            let mut queue = VecDeque::new();
            visited[start] = true;
            queue.push_back(start);
            while let Some(current) = queue.pop_front() {
                for edge in &self.adjacency[current] {
                    if !visited[edge.to] {
                        visited[edge.to] = true;
                        parent[edge.to] = Some((current, edge.relationship));
                        queue.push_back(edge.to);
                    }
                }
            }
        }

        BfsTree {
            graph: self,
            root: root.to_string(),
            root_idx,
            parent,
        }
    }

    /// Shortest relationship sequence from `from` to `to`
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<&'a Relationship>> {
        self.bfs(from).path_to(to)
    }
}

/// Parent pointers of a BFS from one root
#[derive(Debug)]
pub struct BfsTree<'g, 'a> {
    graph: &'g JoinGraph<'a>,
    root: String,
    root_idx: Option<usize>,
    parent: Vec<Option<(usize, usize)>>,
}

impl<'a> BfsTree<'_, 'a> {
    /// Relationships from the root out to `target`, root side first.
    /// `None` when `target` is unreachable; empty when it is the root.
    pub fn path_to(&self, target: &str) -> Option<Vec<&'a Relationship>> {
        if target == self.root {
            return Some(Vec::new());
        }
        let root_idx = self.root_idx?;
        let mut current = *self.graph.index.get(target)?;
        let mut path = Vec::new();
        while current != root_idx {
            let (prev, rel) = self.parent[current]?;
            path.push(self.graph.relationships[rel]);
            current = prev;
        }
        path.reverse();
        Some(path)
    }

    /// Number of joins between the root and `target`
    pub fn distance(&self, target: &str) -> Option<usize> {
        self.path_to(target).map(|p| p.len())
    }
}
