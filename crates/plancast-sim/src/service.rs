//! Request-scoped planning service.
//!
//! [`PlanningService`] bundles the project config, a history snapshot and a
//! run store. It is cheap to build and holds no global state, so callers
//! construct one per request.

use chrono::Utc;
use plancast_core::config::ProjectConfig;
use plancast_core::error::InvalidInput;
use plancast_core::graph::{CriticalPathResult, ExecutionPlan, compute_critical_path};
use plancast_core::model::{
    CompletionRecord, DurationUnit, Project, SimulationParameters, SimulationRun, WorkItem,
    validate_items,
};
use plancast_core::store::RunStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

use crate::predict::{DelayPrediction, DelayPredictor};
use crate::rng::fresh_seed;
use crate::simulate::{CancellationToken, ProjectSimulator, SimulationError, SimulationOptions};

/// Runs returned by [`PlanningService::history`] when no limit is given.
pub const DEFAULT_HISTORY_RUNS: usize = 10;

/// Per-request overrides of the configured simulation settings.
#[derive(Debug, Clone, Default)]
pub struct SimulationRequest {
    pub params: Option<SimulationParameters>,
    pub iterations: Option<usize>,
    pub seed: Option<u64>,
    pub duration_unit: Option<DurationUnit>,
    /// Skip appending the run to the store.
    pub dry_run: bool,
}

/// A finished simulation and what happened when it was stored.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub run: SimulationRun,
    pub persisted: bool,
    /// Store failure message; the distribution is still valid when set.
    pub persist_error: Option<String>,
}

pub struct PlanningService<S> {
    config: ProjectConfig,
    history: Vec<CompletionRecord>,
    store: S,
}

impl<S: RunStore> PlanningService<S> {
    #[must_use]
    pub const fn new(config: ProjectConfig, history: Vec<CompletionRecord>, store: S) -> Self {
        Self {
            config,
            history,
            store,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub fn history_records(&self) -> &[CompletionRecord] {
        &self.history
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    fn predictor(&self, params: SimulationParameters) -> DelayPredictor {
        DelayPredictor::with_config(&self.history, params, &self.config.prediction)
    }

    /// Predict the delay of a single work item.
    ///
    /// Dependencies are not resolved here; only the item's own fields are checked.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] for an empty id, a negative or non-finite
    /// estimate, or out-of-range parameters.
    #[instrument(skip_all, fields(item = %item.id))]
    pub fn predict(
        &self,
        item: &WorkItem,
        params: Option<SimulationParameters>,
        seed: Option<u64>,
    ) -> Result<DelayPrediction, InvalidInput> {
        let params = params.unwrap_or(self.config.params);
        params.validate()?;
        validate_items(std::slice::from_ref(item))?;

        let seed = seed.or(self.config.simulation.seed).unwrap_or_else(fresh_seed);
        let mut rng = StdRng::seed_from_u64(seed);
        let prediction = self.predictor(params).predict(item, &mut rng);
        info!(method = %prediction.method, hours = prediction.predicted_delay_hours, "predicted");
        Ok(prediction)
    }

    /// Simulate the project and append the resulting run to the store.
    ///
    /// A store failure is logged and reported on the outcome; it does not
    /// discard the computed distribution.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] for invalid input, cancellation, or
    /// unrepresentable completion dates.
    #[instrument(skip_all, fields(project = %project.id, items = items.len()))]
    pub fn simulate(
        &self,
        project: &Project,
        items: &[WorkItem],
        request: &SimulationRequest,
        cancel: &CancellationToken,
    ) -> Result<SimulationOutcome, SimulationError> {
        let params = request.params.unwrap_or(self.config.params);
        params.validate()?;

        let seed = request
            .seed
            .or(self.config.simulation.seed)
            .unwrap_or_else(fresh_seed);
        let mut options = SimulationOptions::from_config(&self.config.simulation, seed);
        if let Some(iterations) = request.iterations {
            options.iterations = iterations;
        }
        if let Some(unit) = request.duration_unit {
            options.duration_unit = unit;
        }

        let simulator = ProjectSimulator::new(self.predictor(params), options);
        let report = simulator.simulate(project, items, cancel)?;

        let created_at = Utc::now();
        let run = SimulationRun {
            id: SimulationRun::derive_id(
                &project.id,
                created_at,
                seed,
                options.iterations,
                &report.plan_hash,
            ),
            project_id: project.id.clone(),
            iterations: options.iterations,
            created_at,
            parameters: params,
            duration_unit: options.duration_unit,
            seed,
            plan_hash: report.plan_hash,
            distribution: report.distribution,
        };

        if request.dry_run {
            return Ok(SimulationOutcome {
                run,
                persisted: false,
                persist_error: None,
            });
        }

        let persist_error = match self.store.append(&run) {
            Ok(()) => None,
            Err(err) => {
                warn!(run = %run.id, error = %format!("{err:#}"), "failed to persist simulation run");
                Some(format!("{err:#}"))
            }
        };
        Ok(SimulationOutcome {
            persisted: persist_error.is_none(),
            run,
            persist_error,
        })
    }

    /// Most recent runs for a project, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    #[instrument(skip(self))]
    pub fn history(
        &self,
        project_id: &str,
        limit: Option<usize>,
    ) -> anyhow::Result<Vec<SimulationRun>> {
        self.store
            .recent(project_id, limit.unwrap_or(DEFAULT_HISTORY_RUNS))
    }

    /// Deterministic critical path using estimated hours as weights.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInput`] when the items do not form a valid plan.
    #[allow(clippy::unused_self)]
    pub fn critical_path(&self, items: &[WorkItem]) -> Result<CriticalPathResult, InvalidInput> {
        let plan = ExecutionPlan::build(items)?;
        let durations: Vec<f64> = items.iter().map(|i| i.estimated_hours).collect();
        Ok(compute_critical_path(items, &plan, &durations))
    }
}
