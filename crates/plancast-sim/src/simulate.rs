//! Dependency-aware Monte Carlo project simulation.
//!
//! Each iteration samples a processing time for every work item, schedules
//! the items in topological order (an item starts when its last dependency
//! finishes), and records the project span. Spans are converted to calendar
//! dates and summarized as a [`CompletionDistribution`].
//!
//! Iterations are independent: each one derives its own RNG from the run
//! seed and the iteration index, so a seeded run produces the same
//! distribution whether iterations execute sequentially or on the rayon pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use plancast_core::config::SimulationConfig;
use plancast_core::error::{ErrorCode, InvalidInput};
use plancast_core::graph::ExecutionPlan;
use plancast_core::model::{CompletionDistribution, DurationUnit, Project, WorkItem};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::predict::DurationModel;
use crate::rng::iteration_rng;
use crate::stats;

/// Cooperative cancellation flag shared between a caller and a running simulation.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error("simulation cancelled after {completed} of {requested} iterations")]
    Cancelled { completed: usize, requested: usize },

    #[error("completion date out of range: span {span} {unit} from {start}")]
    DateOutOfRange {
        start: DateTime<Utc>,
        span: f64,
        unit: DurationUnit,
    },
}

impl SimulationError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidInput(e) => e.code(),
            Self::Cancelled { .. } => ErrorCode::SimulationCancelled,
            Self::DateOutOfRange { .. } => ErrorCode::DateOutOfRange,
        }
    }
}

/// Knobs for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationOptions {
    pub iterations: usize,
    pub sample_cap: usize,
    pub duration_unit: DurationUnit,
    pub seed: u64,
    pub parallel: bool,
}

impl SimulationOptions {
    /// Options from project config, with the seed resolved by the caller.
    #[must_use]
    pub const fn from_config(config: &SimulationConfig, seed: u64) -> Self {
        Self {
            iterations: config.iterations,
            sample_cap: config.sample_cap,
            duration_unit: config.duration_unit,
            seed,
            parallel: config.parallel,
        }
    }
}

/// Result of a completed simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub distribution: CompletionDistribution,
    /// Content hash of the dependency graph that was simulated.
    pub plan_hash: String,
    /// Mean project span in `duration_unit`s.
    pub mean_span: f64,
}

#[derive(Debug, Clone)]
pub struct ProjectSimulator<M> {
    model: M,
    options: SimulationOptions,
}

impl<M: DurationModel> ProjectSimulator<M> {
    #[must_use]
    pub const fn new(model: M, options: SimulationOptions) -> Self {
        Self { model, options }
    }

    #[must_use]
    pub const fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Run the Monte Carlo simulation for `items` starting at the project's start date.
    ///
    /// All input is validated before any sampling happens.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::InvalidInput`] for zero iterations, an empty or
    ///   malformed item list, unknown dependencies, or dependency cycles.
    /// - [`SimulationError::Cancelled`] when `cancel` fires before all
    ///   iterations finish; partial results are discarded.
    /// - [`SimulationError::DateOutOfRange`] when a span cannot be represented
    ///   as a calendar date.
    pub fn simulate(
        &self,
        project: &Project,
        items: &[WorkItem],
        cancel: &CancellationToken,
    ) -> Result<SimulationReport, SimulationError> {
        let requested = self.options.iterations;
        if requested == 0 {
            return Err(InvalidInput::ZeroIterations.into());
        }
        let plan = ExecutionPlan::build(items)?;
        debug!(
            project = %project.id,
            items = plan.len(),
            iterations = requested,
            parallel = self.options.parallel,
            "simulating"
        );

        let spans = self.run_iterations(&plan, items, cancel);
        let completed = spans.iter().filter(|s| s.is_some()).count();
        if completed < requested {
            return Err(SimulationError::Cancelled {
                completed,
                requested,
            });
        }
        let mut spans: Vec<f64> = spans.into_iter().flatten().collect();
        spans.sort_by(f64::total_cmp);

        let distribution = self.summarize(project.start_date, &spans)?;
        let mean_span = stats::mean(&spans).unwrap_or(0.0);
        info!(
            project = %project.id,
            iterations = requested,
            p50 = %distribution.p50_completion,
            p95 = %distribution.p95_completion,
            "simulation complete"
        );

        Ok(SimulationReport {
            distribution,
            plan_hash: plan.content_hash().to_string(),
            mean_span,
        })
    }

    /// One span per iteration; `None` marks an iteration skipped after cancellation.
    fn run_iterations(
        &self,
        plan: &ExecutionPlan,
        items: &[WorkItem],
        cancel: &CancellationToken,
    ) -> Vec<Option<f64>> {
        let seed = self.options.seed;
        let one = |iteration: usize| -> Option<f64> {
            if cancel.is_cancelled() {
                return None;
            }
            let mut rng = iteration_rng(seed, iteration as u64);
            Some(plan.span(|i| self.model.duration_hours(&items[i], &mut rng)))
        };

        let n = self.options.iterations;
        if self.options.parallel {
            (0..n).into_par_iter().map(one).collect()
        } else {
            let mut spans = Vec::with_capacity(n);
            for iteration in 0..n {
                let span = one(iteration);
                let stop = span.is_none();
                spans.push(span);
                if stop {
                    break;
                }
            }
            spans.resize(n, None);
            spans
        }
    }

    fn summarize(
        &self,
        start: DateTime<Utc>,
        sorted_spans: &[f64],
    ) -> Result<CompletionDistribution, SimulationError> {
        let unit = self.options.duration_unit;
        let to_date = |span: f64| {
            unit.offset(start, span)
                .ok_or(SimulationError::DateOutOfRange { start, span, unit })
        };
        let percentile = |p: f64| {
            stats::percentile_sorted(sorted_spans, p)
                .ok_or(SimulationError::InvalidInput(InvalidInput::ZeroIterations))
                .and_then(to_date)
        };

        let mean = stats::mean(sorted_spans)
            .ok_or(SimulationError::InvalidInput(InvalidInput::ZeroIterations))?;
        let std = stats::population_std(sorted_spans).unwrap_or(0.0);

        let sample_completion_dates = sorted_spans
            .iter()
            .take(self.options.sample_cap)
            .map(|&span| to_date(span))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompletionDistribution {
            mean_completion: to_date(mean)?,
            std_completion_days: unit.to_days(std),
            p50_completion: percentile(50.0)?,
            p90_completion: percentile(90.0)?,
            p95_completion: percentile(95.0)?,
            iterations: sorted_spans.len(),
            sample_completion_dates,
        })
    }
}
