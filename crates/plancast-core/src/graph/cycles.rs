//! Cycle detection for work item dependency graphs.
//!
//! Edge direction is `blocker → blocked`. Any strongly connected component
//! with more than one member, or a node with a self-loop, is a cycle.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashSet;

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};

/// Find all cycles currently present in `graph`.
///
/// Each entry is a sorted list of item IDs in one strongly connected
/// component (SCC). Self-loops are reported as a one-element cycle.
#[must_use]
pub fn find_all_cycles(graph: &DiGraph<String, ()>) -> Vec<Vec<String>> {
    let mut cycles: Vec<Vec<String>> = cyclic_components(graph)
        .into_iter()
        .map(|component| sorted_ids(graph, &component))
        .collect();

    cycles.sort_unstable();
    cycles
}

/// A detected dependency cycle with suggested edges to remove to break it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Sorted item IDs that form this cycle (members of the SCC).
    pub members: Vec<String>,
    /// Suggested `(blocker, blocked)` edges to remove to break the cycle.
    ///
    /// These are DFS back-edges within the SCC; removing all of them makes
    /// the SCC acyclic.
    pub suggested_breaks: Vec<(String, String)>,
}

/// Detect all cycles and, for each, suggest edges to remove to break them.
#[must_use]
pub fn report_cycles_with_breaks(graph: &DiGraph<String, ()>) -> Vec<CycleReport> {
    let mut reports: Vec<CycleReport> = cyclic_components(graph)
        .into_iter()
        .map(|component| {
            let members = sorted_ids(graph, &component);

            if component.len() == 1 {
                let id = members[0].clone();
                return CycleReport {
                    members,
                    suggested_breaks: vec![(id.clone(), id)],
                };
            }

            let member_set: HashSet<NodeIndex> = component.iter().copied().collect();
            CycleReport {
                members,
                suggested_breaks: find_back_edges_in_scc(graph, &component, &member_set),
            }
        })
        .collect();

    reports.sort_unstable_by(|a, b| a.members.cmp(&b.members));
    reports
}

fn cyclic_components(graph: &DiGraph<String, ()>) -> Vec<Vec<NodeIndex>> {
    tarjan_scc(graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1
                || component
                    .first()
                    .is_some_and(|node| graph.find_edge(*node, *node).is_some())
        })
        .collect()
}

fn sorted_ids(graph: &DiGraph<String, ()>, component: &[NodeIndex]) -> Vec<String> {
    let mut ids: Vec<String> = component.iter().map(|&idx| node_id(graph, idx)).collect();
    ids.sort_unstable();
    ids
}

/// Iterative DFS inside one SCC collecting edges that point to an ancestor.
fn find_back_edges_in_scc(
    graph: &DiGraph<String, ()>,
    component: &[NodeIndex],
    member_set: &HashSet<NodeIndex>,
) -> Vec<(String, String)> {
    let mut starts: Vec<NodeIndex> = component.to_vec();
    starts.sort_unstable_by_key(|&idx| node_id(graph, idx));

    let successors = |node: NodeIndex| -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = graph
            .neighbors_directed(node, Direction::Outgoing)
            .filter(|n| member_set.contains(n))
            .collect();
        next.sort_unstable_by_key(|&idx| node_id(graph, idx));
        next
    };

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    let mut on_path: HashSet<NodeIndex> = HashSet::new();
    let mut back_edges: Vec<(String, String)> = Vec::new();

    for start in starts {
        if !visited.insert(start) {
            continue;
        }
        on_path.insert(start);
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>, usize)> = vec![(start, successors(start), 0)];

        while let Some(frame) = stack.last_mut() {
            let current = frame.0;
            if frame.2 < frame.1.len() {
                let neighbor = frame.1[frame.2];
                frame.2 += 1;

                if on_path.contains(&neighbor) {
                    back_edges.push((node_id(graph, current), node_id(graph, neighbor)));
                } else if visited.insert(neighbor) {
                    on_path.insert(neighbor);
                    stack.push((neighbor, successors(neighbor), 0));
                }
            } else {
                stack.pop();
                on_path.remove(&current);
            }
        }
    }

    back_edges.sort_unstable();
    back_edges
}

fn node_id(graph: &DiGraph<String, ()>, idx: NodeIndex) -> String {
    graph
        .node_weight(idx)
        .cloned()
        .unwrap_or_else(|| format!("#{}", idx.index()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn graph_with(nodes: &[&str], edges: &[(&str, &str)]) -> DiGraph<String, ()> {
        let mut graph = DiGraph::<String, ()>::new();
        let mut map: HashMap<&str, NodeIndex> = HashMap::new();

        for &node in nodes {
            map.insert(node, graph.add_node(node.to_string()));
        }
        for &(from, to) in edges {
            graph.add_edge(map[from], map[to], ());
        }
        graph
    }

    #[test]
    fn dag_has_no_cycles() {
        let graph = graph_with(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("A", "C")]);
        assert!(find_all_cycles(&graph).is_empty());
        assert!(report_cycles_with_breaks(&graph).is_empty());
    }

    #[test]
    fn two_node_cycle_is_found() {
        let graph = graph_with(&["A", "B", "C"], &[("A", "B"), ("B", "A"), ("B", "C")]);
        assert_eq!(find_all_cycles(&graph), vec![vec!["A".to_string(), "B".to_string()]]);
    }

    #[test]
    fn self_loop_is_reported_with_its_own_break() {
        let graph = graph_with(&["A"], &[("A", "A")]);
        let reports = report_cycles_with_breaks(&graph);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].suggested_breaks, vec![("A".to_string(), "A".to_string())]);
    }

    #[test]
    fn three_cycle_break_suggestion_is_a_cycle_edge() {
        let graph = graph_with(&["A", "B", "C"], &[("A", "B"), ("B", "C"), ("C", "A")]);
        let reports = report_cycles_with_breaks(&graph);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].members, vec!["A", "B", "C"]);
        assert_eq!(reports[0].suggested_breaks, vec![("C".to_string(), "A".to_string())]);
    }

    #[test]
    fn disjoint_cycles_are_sorted() {
        let graph = graph_with(
            &["X", "Y", "A", "B"],
            &[("X", "Y"), ("Y", "X"), ("A", "B"), ("B", "A")],
        );
        let cycles = find_all_cycles(&graph);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[0], vec!["A", "B"]);
        assert_eq!(cycles[1], vec!["X", "Y"]);
    }
}
