//! Dependency graph module for schedule computation.
//!
//! # Overview
//!
//! Work item dependency lists are turned into a petgraph directed graph,
//! checked for cycles, and flattened into an execution order that the
//! simulator evaluates many times.
//!
//! ## Pipeline
//!
//! ```text
//! &[WorkItem]
//!        ↓  build::DependencyGraph::from_items()
//! DependencyGraph (DiGraph, possibly cyclic)
//!        ↓  plan::ExecutionPlan::build()   (rejects cycles via cycles::find_all_cycles)
//! ExecutionPlan (topological order + dependency indices)
//!        ↓  ExecutionPlan::finish_offsets() / critical_path::compute_critical_path()
//! finish offsets, slack, critical path
//! ```

pub mod build;
pub mod critical_path;
pub mod cycles;
pub mod plan;

pub use build::DependencyGraph;
pub use critical_path::{CriticalPathResult, ItemTiming, compute_critical_path};
pub use cycles::{CycleReport, find_all_cycles, report_cycles_with_breaks};
pub use plan::ExecutionPlan;
