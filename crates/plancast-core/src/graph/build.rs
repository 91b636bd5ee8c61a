//! Dependency graph construction from work items.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A **blocks** B": A must finish before B starts.
//! A work item `B` with `dependencies = {A}` therefore contributes `A → B`.
//!
//! ## Content Hash
//!
//! The graph carries a BLAKE3 hash of its sorted node and edge sets so that
//! simulation runs can record which plan shape they were computed from.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

use crate::error::InvalidInput;
use crate::model::WorkItem;

/// A directed dependency graph over the work items of one project.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Directed graph: nodes = work item ids, edges = blocking relationships.
    pub graph: DiGraph<String, ()>,
    /// Mapping from work item id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// BLAKE3 content hash of the node and edge sets.
    pub content_hash: String,
}

impl DependencyGraph {
    /// Build the graph for `items`, preserving input order for node indices.
    ///
    /// Cycles are kept; use [`crate::graph::cycles::find_all_cycles`] or
    /// [`crate::graph::plan::ExecutionPlan`] to reject them.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput::UnknownDependency`] when an item depends on an
    /// id that is not part of `items`.
    #[instrument(skip(items), fields(items = items.len()))]
    pub fn from_items(items: &[WorkItem]) -> Result<Self, InvalidInput> {
        let mut graph = DiGraph::<String, ()>::with_capacity(items.len(), items.len());
        let mut node_map: HashMap<String, NodeIndex> = HashMap::with_capacity(items.len());

        for item in items {
            let idx = graph.add_node(item.id.clone());
            node_map.insert(item.id.clone(), idx);
        }

        let mut edges: Vec<(String, String)> = Vec::new();
        for item in items {
            let blocked = node_map[&item.id];
            for dep in &item.dependencies {
                let Some(&blocker) = node_map.get(dep) else {
                    return Err(InvalidInput::UnknownDependency {
                        item: item.id.clone(),
                        dependency: dep.clone(),
                    });
                };
                if !graph.contains_edge(blocker, blocked) {
                    graph.add_edge(blocker, blocked, ());
                    edges.push((dep.clone(), item.id.clone()));
                }
            }
        }

        let mut nodes: Vec<&str> = items.iter().map(|item| item.id.as_str()).collect();
        nodes.sort_unstable();
        edges.sort_unstable();
        let content_hash = compute_content_hash(&nodes, &edges);

        Ok(Self {
            graph,
            node_map,
            content_hash,
        })
    }

    /// Return the number of nodes (work items) in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of edges (blocking relationships) in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Look up the `NodeIndex` for a work item id.
    #[must_use]
    pub fn node_index(&self, item_id: &str) -> Option<NodeIndex> {
        self.node_map.get(item_id).copied()
    }

    /// Return the work item id label for a node.
    #[must_use]
    pub fn item_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(String::as_str)
    }
}

fn compute_content_hash(nodes: &[&str], edges: &[(String, String)]) -> String {
    let mut hasher = blake3::Hasher::new();
    for node in nodes {
        hasher.update(node.as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(b"\x01");
    for (blocker, blocked) in edges {
        hasher.update(blocker.as_bytes());
        hasher.update(b"\x00");
        hasher.update(blocked.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn items_without_deps_are_nodes_only() {
        let items = [WorkItem::new("a", 1.0), WorkItem::new("b", 2.0)];
        let graph = DependencyGraph::from_items(&items).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.node_index("a").is_some());
        assert!(graph.content_hash.starts_with("blake3:"));
    }

    #[test]
    fn dependency_becomes_blocker_edge() {
        let items = [WorkItem::new("a", 1.0), WorkItem::new("b", 2.0).depends_on("a")];
        let graph = DependencyGraph::from_items(&items).unwrap();
        let a = graph.node_index("a").unwrap();
        let b = graph.node_index("b").unwrap();
        assert!(graph.graph.contains_edge(a, b));
        assert!(!graph.graph.contains_edge(b, a));
        assert_eq!(graph.item_id(b), Some("b"));
    }

    #[test]
    fn unknown_dependency_is_rejected() {
        let items = [WorkItem::new("b", 2.0).depends_on("ghost")];
        let err = DependencyGraph::from_items(&items).unwrap_err();
        assert_eq!(
            err,
            InvalidInput::UnknownDependency {
                item: "b".into(),
                dependency: "ghost".into()
            }
        );
    }

    #[test]
    fn hash_ignores_input_order_but_tracks_edges() {
        let forward = [WorkItem::new("a", 1.0), WorkItem::new("b", 2.0).depends_on("a")];
        let reversed = [WorkItem::new("b", 2.0).depends_on("a"), WorkItem::new("a", 1.0)];
        let unlinked = [WorkItem::new("a", 1.0), WorkItem::new("b", 2.0)];

        let h1 = DependencyGraph::from_items(&forward).unwrap().content_hash;
        let h2 = DependencyGraph::from_items(&reversed).unwrap().content_hash;
        let h3 = DependencyGraph::from_items(&unlinked).unwrap().content_hash;
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
