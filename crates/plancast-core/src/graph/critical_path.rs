//! Weighted critical path analysis.
//!
//! The critical path is the longest dependency chain through the plan when
//! each item takes its given duration. Items on it have zero slack: delaying
//! any of them delays the whole project.
//!
//! | Term              | Definition |
//! |-------------------|------------|
//! | `earliest_start`  | Latest earliest-finish among the item's dependencies (0 if none). |
//! | `earliest_finish` | `earliest_start + duration`. |
//! | `latest_finish`   | Smallest latest-start among the item's dependents (project finish if none). |
//! | `latest_start`    | `latest_finish - duration`. |
//! | `slack`           | `latest_start - earliest_start`. |
//!
//! Forward pass in topological order, backward pass in reverse order, then
//! walk back from the zero-slack item with the greatest earliest finish.

#![allow(clippy::module_name_repetitions)]

use std::collections::{HashMap, HashSet};

use crate::graph::plan::ExecutionPlan;
use crate::model::WorkItem;

/// Relative tolerance for zero slack, scaled by the project finish so long
/// chains of fractional hours keep their rounding inside it.
const SLACK_EPSILON: f64 = 1e-9;

fn slack_tolerance(project_finish: f64) -> f64 {
    SLACK_EPSILON * project_finish.max(1.0)
}

/// Per-item timing computed during critical path analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTiming {
    pub earliest_start: f64,
    pub earliest_finish: f64,
    pub latest_start: f64,
    pub latest_finish: f64,
    pub slack: f64,
}

/// Result of critical path analysis.
#[derive(Debug, Clone)]
pub struct CriticalPathResult {
    /// Item IDs on one critical path, in dependency order (sources first).
    pub critical_path: Vec<String>,
    /// All item IDs with zero slack.
    pub critical_items: HashSet<String>,
    /// Per-item timing information.
    pub item_timings: HashMap<String, ItemTiming>,
    /// Project duration: the largest earliest finish.
    pub total_duration: f64,
}

/// Compute the critical path of `plan` with `durations[i]` for `items[i]`.
///
/// `plan` must have been built from `items`, and `durations` must have the
/// same length.
#[must_use]
pub fn compute_critical_path(
    items: &[WorkItem],
    plan: &ExecutionPlan,
    durations: &[f64],
) -> CriticalPathResult {
    let n = plan.len();
    debug_assert_eq!(items.len(), n);
    debug_assert_eq!(durations.len(), n);

    let earliest_finish = plan.finish_offsets(|i| durations[i]);
    let project_finish = earliest_finish.iter().copied().fold(0.0_f64, f64::max);
    let tolerance = slack_tolerance(project_finish);

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for i in 0..n {
        for &d in plan.dependencies_of(i) {
            dependents[d].push(i);
        }
    }

    // Backward pass.
    let mut latest_finish = vec![project_finish; n];
    for &i in plan.order().iter().rev() {
        latest_finish[i] = dependents[i]
            .iter()
            .map(|&s| latest_finish[s] - durations[s])
            .fold(project_finish, f64::min);
    }

    let mut item_timings: HashMap<String, ItemTiming> = HashMap::with_capacity(n);
    let mut critical_items: HashSet<String> = HashSet::new();
    let mut slack = vec![0.0_f64; n];

    for i in 0..n {
        let es = earliest_finish[i] - durations[i];
        let ls = latest_finish[i] - durations[i];
        slack[i] = (ls - es).max(0.0);
        if slack[i] <= tolerance {
            critical_items.insert(items[i].id.clone());
        }
        item_timings.insert(
            items[i].id.clone(),
            ItemTiming {
                earliest_start: es,
                earliest_finish: earliest_finish[i],
                latest_start: ls,
                latest_finish: latest_finish[i],
                slack: slack[i],
            },
        );
    }

    let critical_path = reconstruct(plan, durations, &earliest_finish, &slack, tolerance)
        .into_iter()
        .map(|i| items[i].id.clone())
        .collect();

    CriticalPathResult {
        critical_path,
        critical_items,
        item_timings,
        total_duration: project_finish,
    }
}

fn reconstruct(
    plan: &ExecutionPlan,
    durations: &[f64],
    earliest_finish: &[f64],
    slack: &[f64],
    tolerance: f64,
) -> Vec<usize> {
    let Some(&sink) = plan
        .order()
        .iter()
        .filter(|&&i| slack[i] <= tolerance)
        .max_by(|&&a, &&b| earliest_finish[a].total_cmp(&earliest_finish[b]))
    else {
        return Vec::new();
    };

    let mut path = vec![sink];
    let mut current = sink;
    loop {
        let start = earliest_finish[current] - durations[current];
        let prev = plan
            .dependencies_of(current)
            .iter()
            .copied()
            .filter(|&d| slack[d] <= tolerance)
            .filter(|&d| (earliest_finish[d] - start).abs() <= tolerance)
            .max_by(|&a, &b| earliest_finish[a].total_cmp(&earliest_finish[b]));

        match prev {
            Some(d) => {
                path.push(d);
                current = d;
            }
            None => break,
        }
    }

    path.reverse();
    path
}
