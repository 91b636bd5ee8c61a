//! Validated execution order for repeated schedule evaluation.
//!
//! An [`ExecutionPlan`] is built once per simulation and then evaluated many
//! times with different per-item durations. All indices refer to positions
//! in the work item slice the plan was built from.

use petgraph::algo::toposort;
use tracing::debug;

use crate::error::InvalidInput;
use crate::graph::build::DependencyGraph;
use crate::graph::cycles::find_all_cycles;
use crate::model::{WorkItem, validate_items};

/// Topological visit order plus direct-dependency indices.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Item indices in an order where every dependency precedes its dependents.
    order: Vec<usize>,
    /// `dependencies[i]` holds the indices of item `i`'s direct dependencies.
    dependencies: Vec<Vec<usize>>,
    /// Content hash of the underlying dependency graph.
    content_hash: String,
}

impl ExecutionPlan {
    /// Validate `items` and derive a topological execution order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] for empty input, malformed items, unknown
    /// dependencies, or any dependency cycle (listing every cycle's members).
    pub fn build(items: &[WorkItem]) -> Result<Self, InvalidInput> {
        validate_items(items)?;
        let graph = DependencyGraph::from_items(items)?;

        // Node indices were assigned in input order, so they double as item indices.
        let Ok(topo) = toposort(&graph.graph, None) else {
            let cycles = find_all_cycles(&graph.graph);
            debug!(?cycles, "rejecting cyclic plan");
            return Err(InvalidInput::Cycle { cycles });
        };

        let order: Vec<usize> = topo.into_iter().map(|idx| idx.index()).collect();
        let dependencies: Vec<Vec<usize>> = items
            .iter()
            .map(|item| {
                item.dependencies
                    .iter()
                    .filter_map(|dep| graph.node_index(dep).map(|idx| idx.index()))
                    .collect()
            })
            .collect();

        Ok(Self {
            order,
            dependencies,
            content_hash: graph.content_hash,
        })
    }

    /// Number of work items covered by the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when the plan covers no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Item indices in dependency-respecting order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Direct dependency indices of item `index`.
    #[must_use]
    pub fn dependencies_of(&self, index: usize) -> &[usize] {
        &self.dependencies[index]
    }

    /// Content hash of the dependency graph the plan was built from.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Compute finish offsets by visiting items in topological order.
    ///
    /// `duration(i)` is called exactly once per item, after all of item `i`'s
    /// dependencies have finish offsets. Each offset is
    /// `max(dependency offsets, 0) + duration(i)`.
    pub fn finish_offsets(&self, mut duration: impl FnMut(usize) -> f64) -> Vec<f64> {
        let mut finish = vec![0.0_f64; self.order.len()];
        for &i in &self.order {
            let ready = self.dependencies[i]
                .iter()
                .map(|&d| finish[d])
                .fold(0.0_f64, f64::max);
            finish[i] = ready + duration(i);
        }
        finish
    }

    /// Project span: the maximum finish offset over all items.
    pub fn span(&self, duration: impl FnMut(usize) -> f64) -> f64 {
        self.finish_offsets(duration)
            .into_iter()
            .fold(0.0_f64, f64::max)
    }
}
